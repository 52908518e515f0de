use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use jan_sahayak::api::session_routes;
use jan_sahayak::catalog::Catalog;
use jan_sahayak::config::AssistantConfig;
use jan_sahayak::dialogue::{DialogueConfig, DialogueController, DialogueDeps, DialogueEvent};
use jan_sahayak::services::HttpBackend;
use jan_sahayak::session::Speaker;
use jan_sahayak::speech::{
    ProcessPlayer, ProcessVoice, SpeechInputManager, SpeechOutputManager, TypedInput,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let (config, catalog) = load()?;
    let catalog = Arc::new(catalog);

    eprintln!("🙏 Jan-Sahayak v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend_url);
    eprintln!("   Language: {}", config.language);
    eprintln!("   Scheme: {}", config.scheme.as_deref().unwrap_or("(triage)"));
    eprintln!("   Output: {}", config.output_dir.display());
    match config.api_port {
        Some(port) => {
            eprintln!("   Session API: http://0.0.0.0:{}/api/session", port);
            eprintln!("   Session WS: ws://0.0.0.0:{}/ws", port);
        }
        None => eprintln!("   Session API: disabled"),
    }
    eprintln!("   Type your answers and press Enter. Ctrl+C to exit.\n");

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    // ── Collaborators ───────────────────────────────────────────────────
    let backend = Arc::new(HttpBackend::new(&config.backend_url, config.request_timeout)?);

    let speech_out = Arc::new(SpeechOutputManager::new(
        backend.clone(),
        Arc::new(ProcessPlayer::new(
            &config.audio_player,
            config.output_dir.join("utterance.mp3"),
        )),
        Arc::new(ProcessVoice::new(&config.local_voice)),
    ));
    let speech_in = Arc::new(SpeechInputManager::new(Arc::new(TypedInput::stdin())));

    // ── Dialogue ────────────────────────────────────────────────────────
    let deps = DialogueDeps {
        catalog: Arc::clone(&catalog),
        backend,
        speech_out,
        speech_in,
    };
    let mut controller = DialogueController::new(deps, DialogueConfig::from(&config));
    let handle = controller.handle();

    // Queued events are printed before the printer honours `printer_stop`,
    // so a document finished on the way out is still written.
    let mut events = controller.subscribe();
    let output_dir = config.output_dir.clone();
    let printer_stop = CancellationToken::new();
    let printer = {
        let stop = printer_stop.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    result = events.recv() => match result {
                        Ok(event) => print_event(event, &output_dir).await,
                        Err(RecvError::Lagged(n)) => tracing::warn!(missed = n, "Event printer lagged"),
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
        })
    };

    if let Some(port) = config.api_port {
        let app = session_routes(handle.clone(), Arc::clone(&catalog));
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
                Ok(listener) => {
                    tracing::info!(port, "Session API server started");
                    axum::serve(listener, app).await.ok();
                }
                Err(e) => tracing::error!(port, error = %e, "Failed to bind session API port"),
            }
        });
    }

    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, shutting down...");
                handle.shutdown().await;
            }
        });
    }

    controller
        .start(config.scheme.as_deref(), config.language)
        .await?;
    controller.run().await;
    printer_stop.cancel();
    printer.await.ok();

    let snapshot = handle.snapshot();
    eprintln!(
        "\n   Session {} ended in mode {} with {} field(s) collected.",
        snapshot.session_id,
        snapshot.mode,
        snapshot.collected_fields.len()
    );

    Ok(())
}

/// Read the environment and validate the built-in catalog.
fn load() -> jan_sahayak::Result<(AssistantConfig, Catalog)> {
    Ok((AssistantConfig::from_env()?, Catalog::builtin()?))
}

async fn print_event(event: DialogueEvent, output_dir: &Path) {
    match event {
        DialogueEvent::Transcript { speaker, text } => match speaker {
            Speaker::Assistant => eprintln!("🤖 {}", text),
            Speaker::User => eprintln!("🧑 {}", text),
        },
        DialogueEvent::FieldUpdated { key, value } => eprintln!("   ✓ {}: {}", key, value),
        DialogueEvent::SchemeSwitched { form_id } => eprintln!("   → scheme: {}", form_id),
        DialogueEvent::DocumentReady { form_id, document } => {
            let path = output_dir.join(format!("{form_id}_official_form.pdf"));
            match tokio::fs::write(&path, &document).await {
                Ok(()) => eprintln!("   📄 Form saved to {}", path.display()),
                Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to write document"),
            }
        }
        DialogueEvent::DocumentFailed { form_id, reason } => {
            eprintln!("   ⚠ Could not generate the {} form: {}", form_id, reason)
        }
        DialogueEvent::VoiceUnavailable { reason } => {
            eprintln!("   ⚠ Voice unavailable ({}). Keep typing your answers.", reason)
        }
    }
}
