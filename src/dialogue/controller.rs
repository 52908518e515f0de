//! DialogueController: drives a conversation from triage to a filled form.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{DialogueEvent, SessionSnapshot, TurnOutcome};
use super::handle::SessionHandle;
use super::phrases;
use super::state::ControllerState;
use crate::catalog::{Catalog, FormDefinition, Language};
use crate::config::AssistantConfig;
use crate::error::{CatalogError, DialogueError, SessionError, SpeechError};
use crate::extract::{extract_field, FieldKind};
use crate::services::{
    AssistantBackend, Attachment, ChatAction, ChatRequest, FillFormRequest, RecommendRequest,
    SaveFormRequest,
};
use crate::session::{SessionMode, SessionState, Speaker};
use crate::speech::{ListenOutcome, SpeechInputManager, SpeechOutputManager, Utterance, UtteranceOutcome};

/// Event channel capacity.
const EVENT_CAPACITY: usize = 256;

/// Queued controller actions from outside the dialogue loop.
const COMMAND_CAPACITY: usize = 32;

/// Pause before listening again after a recognizer error.
const RECOGNITION_BACKOFF: Duration = Duration::from_millis(250);

/// Shared components the controller depends on.
pub struct DialogueDeps {
    pub catalog: Arc<Catalog>,
    pub backend: Arc<dyn AssistantBackend>,
    pub speech_out: Arc<SpeechOutputManager>,
    pub speech_in: Arc<SpeechInputManager>,
}

/// Controller tuning.
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    /// Pause between the completion message and document generation.
    pub document_delay: Duration,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            document_delay: Duration::from_millis(1500),
        }
    }
}

impl From<&AssistantConfig> for DialogueConfig {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            document_delay: config.document_delay,
        }
    }
}

/// Actions routed to the controller through a [`SessionHandle`].
pub(crate) enum Command {
    Start {
        form: Option<String>,
        language: Language,
        reply: oneshot::Sender<Result<SessionSnapshot, DialogueError>>,
    },
    Transcript {
        text: String,
        reply: oneshot::Sender<Result<TurnOutcome, DialogueError>>,
    },
    SwitchLanguage {
        language: Language,
        reply: oneshot::Sender<Result<(), DialogueError>>,
    },
}

/// Owns the session and decides what to say, when to listen, and how to
/// interpret each answer.
///
/// All mutation goes through `&mut self`, so two turns never interleave.
/// Outside code reads state through [`SessionSnapshot`]s and acts through a
/// [`SessionHandle`].
pub struct DialogueController {
    deps: DialogueDeps,
    config: DialogueConfig,
    state: ControllerState,
    session: SessionState,
    attachments: Vec<Attachment>,
    /// Cancelled when the current session ends. Replaced on every start.
    token: CancellationToken,
    token_tx: watch::Sender<CancellationToken>,
    /// Cancelled once, when the dialogue loop should stop for good.
    shutdown: CancellationToken,
    /// Save and document requests outliving the turn that issued them.
    background: JoinSet<()>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<DialogueEvent>,
    commands_tx: mpsc::Sender<Command>,
    commands: mpsc::Receiver<Command>,
    voice_input: bool,
    voice_reported: bool,
}

impl DialogueController {
    pub fn new(deps: DialogueDeps, config: DialogueConfig) -> Self {
        let session = SessionState::new(Language::default());
        let token = CancellationToken::new();
        let (token_tx, _) = watch::channel(token.clone());
        let (snapshot_tx, _) =
            watch::channel(SessionSnapshot::capture(ControllerState::Idle, &session));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (commands_tx, commands) = mpsc::channel(COMMAND_CAPACITY);

        Self {
            deps,
            config,
            state: ControllerState::Idle,
            session,
            attachments: Vec::new(),
            token,
            token_tx,
            shutdown: CancellationToken::new(),
            background: JoinSet::new(),
            snapshot_tx,
            events,
            commands_tx,
            commands,
            voice_input: true,
            voice_reported: false,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self.state, &self.session)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DialogueEvent> {
        self.events.subscribe()
    }

    /// A cloneable handle for driving this controller from other tasks.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(
            self.commands_tx.clone(),
            self.token_tx.subscribe(),
            self.shutdown.clone(),
            self.snapshot_tx.subscribe(),
            self.events.clone(),
            Arc::clone(&self.deps.speech_out),
            Arc::clone(&self.deps.speech_in),
        )
    }

    /// Add a supporting document sent along with `/fill-form`.
    pub fn attach(&mut self, attachment: Attachment) {
        debug!(kind = attachment.kind.part_name(), file = %attachment.file_name, "Attachment added");
        self.attachments.push(attachment);
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Start a conversation. With a pre-selected form the greeting and the
    /// first question are spoken; otherwise the session enters triage.
    ///
    /// A conversation already running is ended first.
    pub async fn start(
        &mut self,
        preselected: Option<&str>,
        language: Language,
    ) -> Result<(), DialogueError> {
        if self.state != ControllerState::Idle {
            self.end().await;
        }

        let catalog = Arc::clone(&self.deps.catalog);
        let form = match preselected {
            Some(id) => Some(
                catalog
                    .form(id)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownForm(id.to_string()))?,
            ),
            None => None,
        };

        self.session = SessionState::new(language);
        self.token = CancellationToken::new();
        self.token_tx.send_replace(self.token.clone());
        self.voice_input = true;
        self.voice_reported = false;

        info!(
            session_id = %self.session.id(),
            %language,
            form = preselected.unwrap_or("-"),
            "Conversation started"
        );

        match form {
            Some(form) => {
                let greeting = phrases::greeting(language, form.name.get(language));
                let question = self.first_question(&form, language)?;
                self.session.select_form(form)?;
                self.speak(&format!("{greeting} {question}")).await?;
            }
            None => {
                self.session.begin_triage()?;
                self.transition(ControllerState::Triage)?;
                self.speak(phrases::triage_intro(language)).await?;
            }
        }
        Ok(())
    }

    /// Tear the conversation down: stop audio and recognition and drop any
    /// response still in flight.
    pub async fn end(&mut self) {
        self.token.cancel();
        self.deps.speech_out.cancel().await;
        self.deps.speech_in.cancel().await;
        if self.state != ControllerState::Idle {
            info!(
                session_id = %self.session.id(),
                mode = %self.session.mode(),
                collected = self.session.collected_fields().len(),
                "Conversation ended"
            );
        }
        self.state = ControllerState::Idle;
        self.publish();
    }

    /// Run the dialogue loop until shutdown or until typed input closes.
    ///
    /// Listens whenever the state accepts input, and serves commands from
    /// [`SessionHandle`]s between turns. A command arriving while listening
    /// aborts that recognition session. Ending a session leaves the loop
    /// idle until the next start command.
    pub async fn run(&mut self) {
        info!("Dialogue loop running");
        let shutdown = self.shutdown.clone();

        loop {
            let token = self.token.clone();
            let active = self.state != ControllerState::Idle;
            let listening = self.voice_input && self.state.accepts_input();
            let language = self.session.language();
            let speech_in = Arc::clone(&self.deps.speech_in);

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = token.cancelled(), if active => self.end().await,
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    speech_in.cancel().await;
                    self.handle_command(command).await;
                }
                outcome = speech_in.listen(language), if listening => match outcome {
                    ListenOutcome::Transcript(text) => {
                        if let Err(e) = self.handle_transcript(&text).await {
                            warn!(error = %e, "Failed to process transcript");
                        }
                    }
                    ListenOutcome::Silence | ListenOutcome::Cancelled => {}
                    ListenOutcome::Failed(SpeechError::InputClosed) => {
                        info!(pending = self.background.len(), "Input closed, finishing pending requests");
                        self.settle_background().await;
                        break;
                    }
                    ListenOutcome::Failed(e @ SpeechError::Unsupported(_)) => {
                        self.report_voice_failure(&e);
                        self.voice_input = false;
                    }
                    ListenOutcome::Failed(e) => {
                        warn!(error = %e, "Recognition failed");
                        tokio::time::sleep(RECOGNITION_BACKOFF).await;
                    }
                },
            }
        }

        self.end().await;
        info!("Dialogue loop stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start {
                form,
                language,
                reply,
            } => {
                let result = self
                    .start(form.as_deref(), language)
                    .await
                    .map(|()| self.snapshot());
                let _ = reply.send(result);
            }
            Command::Transcript { text, reply } => {
                let result = self.handle_transcript(&text).await;
                let _ = reply.send(result);
            }
            Command::SwitchLanguage { language, reply } => {
                let result = self.switch_language(language).await;
                let _ = reply.send(result);
            }
        }
    }

    // ── Turns ───────────────────────────────────────────────────────

    /// Process one transcript, spoken or typed.
    pub async fn handle_transcript(&mut self, text: &str) -> Result<TurnOutcome, DialogueError> {
        if self.state == ControllerState::Idle {
            return Err(DialogueError::NotStarted);
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        self.transition(ControllerState::Processing)?;
        self.session.push_history(Speaker::User, text);
        self.emit(DialogueEvent::Transcript {
            speaker: Speaker::User,
            text: text.to_string(),
        });
        self.publish();

        let result = match self.session.mode() {
            SessionMode::Triage => self.triage_turn(text).await,
            SessionMode::Collecting => self.collect_turn(text).await,
            SessionMode::Completed => self.chat_turn(text).await,
            SessionMode::NoForm => Err(DialogueError::NotStarted),
        };

        if let Ok(outcome) = &result {
            info!(session_id = %self.session.id(), ?outcome, state = %self.state, "Turn processed");
        } else if !self.token.is_cancelled() {
            self.state = self.resting_state();
            self.publish();
        }
        result
    }

    /// Continue in another language. Collected fields are kept and the
    /// pending question is asked again.
    pub async fn switch_language(&mut self, language: Language) -> Result<(), DialogueError> {
        let previous = self.session.language();
        self.session.set_language(language);
        info!(session_id = %self.session.id(), from = %previous, to = %language, "Language switched");

        if self.state == ControllerState::Idle {
            self.publish();
            return Ok(());
        }

        self.transition(ControllerState::Processing)?;
        let follow_up = match self.session.mode() {
            SessionMode::Triage => phrases::triage_intro(language).to_string(),
            SessionMode::Collecting => match self.session.current_field() {
                Some(field) => self.question(field, language)?,
                None => String::new(),
            },
            SessionMode::Completed | SessionMode::NoForm => String::new(),
        };
        let text = format!("{} {}", phrases::language_switched(language), follow_up);
        self.speak(text.trim_end()).await?;
        Ok(())
    }

    async fn triage_turn(&mut self, text: &str) -> Result<TurnOutcome, DialogueError> {
        let language = self.session.language();
        let request = RecommendRequest {
            transcript: text.to_string(),
            language,
        };
        let Some(result) =
            unless_cancelled(&self.token, self.deps.backend.recommend_scheme(request)).await
        else {
            return Ok(self.cancelled_turn());
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Scheme recommendation failed");
                return self
                    .reply(phrases::triage_retry(language), TurnOutcome::TriageRetry)
                    .await;
            }
        };

        if !response.success {
            debug!(message = %response.message, "Triage asked for clarification");
            let text = non_empty_or(&response.message, phrases::triage_retry(language));
            return self.reply(&text, TurnOutcome::TriageRetry).await;
        }

        let catalog = Arc::clone(&self.deps.catalog);
        let Some(form) = response.scheme_id.as_deref().and_then(|id| catalog.form(id)) else {
            warn!(scheme_id = ?response.scheme_id, "Recommended scheme is not in the catalog");
            return self
                .reply(phrases::triage_retry(language), TurnOutcome::TriageRetry)
                .await;
        };

        let form = form.clone();
        let form_id = form.id.clone();
        let ack = non_empty_or(
            &response.message,
            &phrases::scheme_selected(language, form.name.get(language)),
        );
        let question = self.first_question(&form, language)?;

        self.session.select_form(form)?;
        info!(session_id = %self.session.id(), form = %form_id, "Scheme selected by triage");
        self.emit(DialogueEvent::SchemeSwitched {
            form_id: form_id.clone(),
        });
        self.publish();

        self.reply(
            &format!("{ack} {question}"),
            TurnOutcome::SchemeSelected { form_id },
        )
        .await
    }

    async fn collect_turn(&mut self, text: &str) -> Result<TurnOutcome, DialogueError> {
        let language = self.session.language();
        let field = self
            .session
            .current_field()
            .map(str::to_string)
            .ok_or(SessionError::NoFormSelected)?;

        let Some(value) = extract_field(text, FieldKind::for_field(&field), language) else {
            debug!(field = %field, "No value extracted, asking again");
            let question = self.question(&field, language)?;
            return self
                .reply(
                    &format!("{} {}", phrases::retry(language), question),
                    TurnOutcome::Retry { field },
                )
                .await;
        };

        let recorded = self.session.record_field(value)?;
        info!(
            session_id = %self.session.id(),
            field = %recorded.key,
            step = self.session.step_index(),
            "Field recorded"
        );
        self.emit(DialogueEvent::FieldUpdated {
            key: recorded.key.clone(),
            value: recorded.value.clone(),
        });
        self.publish();

        let outcome = TurnOutcome::FieldRecorded {
            key: recorded.key.clone(),
            value: recorded.value.clone(),
            completed: recorded.completed,
        };

        if recorded.completed {
            let utterance = self
                .begin_speaking(&phrases::completion(language, &recorded.value))
                .await?;
            self.submit();
            return self.finish_reply(utterance, outcome).await;
        }

        let next = self
            .session
            .current_field()
            .map(str::to_string)
            .ok_or(SessionError::NoFormSelected)?;
        let question = self.question(&next, language)?;
        self.reply(
            &format!("{} {}", phrases::ack(language, &recorded.value), question),
            outcome,
        )
        .await
    }

    /// Stray input after completion goes to the chat service.
    async fn chat_turn(&mut self, text: &str) -> Result<TurnOutcome, DialogueError> {
        let language = self.session.language();
        let request = ChatRequest {
            transcript: text.to_string(),
            language,
            scheme: self.session.selected_form().map(|f| f.id.clone()),
        };
        let Some(result) = unless_cancelled(&self.token, self.deps.backend.chat(request)).await
        else {
            return Ok(self.cancelled_turn());
        };

        match result {
            Ok(response) => {
                match response.action {
                    ChatAction::DownloadPdf => self.schedule_document(Duration::ZERO),
                    ChatAction::SwitchScheme => {
                        debug!(scheme = ?response.scheme, "Scheme switch ignored after completion");
                    }
                    ChatAction::None => {}
                }
                let text = non_empty_or(&response.text, phrases::chat_unavailable(language));
                self.reply(
                    &text,
                    TurnOutcome::ChatReply {
                        action: response.action,
                    },
                )
                .await
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                self.reply(phrases::chat_unavailable(language), TurnOutcome::ChatUnavailable)
                    .await
            }
        }
    }

    // ── Completion ──────────────────────────────────────────────────

    /// Fire the save request and schedule document generation.
    fn submit(&mut self) {
        let Some(form) = self.session.selected_form() else {
            return;
        };
        let request = SaveFormRequest::completed(&form.id, self.session.collected_fields().clone());
        let backend = Arc::clone(&self.deps.backend);
        let session_id = self.session.id();

        self.spawn_background(async move {
            match backend.save_form(request).await {
                Ok(()) => info!(%session_id, "Submission saved"),
                Err(e) => warn!(%session_id, error = %e, "Failed to save submission"),
            }
        });

        let delay = self.config.document_delay;
        self.schedule_document(delay);
    }

    /// Generate the document after `delay`. Dropped if the session ends first.
    fn schedule_document(&mut self, delay: Duration) {
        let Some(form) = self.session.selected_form() else {
            return;
        };
        let form_id = form.id.clone();
        let request = FillFormRequest {
            scheme: form_id.clone(),
            fields: self.session.collected_fields().clone(),
            attachments: self.attachments.clone(),
        };
        let backend = Arc::clone(&self.deps.backend);
        let events = self.events.clone();
        let token = self.token.clone();

        self.spawn_background(async move {
            if unless_cancelled(&token, tokio::time::sleep(delay)).await.is_none() {
                return;
            }
            debug!(form = %form_id, "Requesting filled document");
            let Some(result) = unless_cancelled(&token, backend.fill_form(request)).await else {
                return;
            };
            let event = match result {
                Ok(document) => {
                    info!(form = %form_id, bytes = document.len(), "Document ready");
                    DialogueEvent::DocumentReady { form_id, document }
                }
                Err(e) => {
                    warn!(form = %form_id, error = %e, "Document generation failed");
                    DialogueEvent::DocumentFailed {
                        form_id,
                        reason: e.to_string(),
                    }
                }
            };
            let _ = events.send(event);
        });
    }

    fn spawn_background<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        while self.background.try_join_next().is_some() {}
        self.background.spawn(task);
    }

    /// Wait for background requests to finish. Gives up on shutdown.
    async fn settle_background(&mut self) {
        let shutdown = self.shutdown.clone();
        while !self.background.is_empty() {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = self.background.join_next() => {}
            }
        }
    }

    // ── Speech ──────────────────────────────────────────────────────

    async fn begin_speaking(&mut self, text: &str) -> Result<Utterance, DialogueError> {
        self.transition(ControllerState::Speaking)?;
        let utterance = self.deps.speech_out.speak(&mut self.session, text).await;
        self.emit(DialogueEvent::Transcript {
            speaker: Speaker::Assistant,
            text: text.to_string(),
        });
        self.publish();
        Ok(utterance)
    }

    /// Wait for the utterance, then settle into the state the mode calls
    /// for. Returns `false` if the session ended meanwhile.
    async fn finish_speaking(&mut self, utterance: Utterance) -> Result<bool, DialogueError> {
        let token = self.token.clone();
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => UtteranceOutcome::Cancelled,
            outcome = utterance.finished() => outcome,
        };
        if token.is_cancelled() {
            self.cancelled_turn();
            return Ok(false);
        }
        if let UtteranceOutcome::Failed(e) = &outcome {
            self.report_voice_failure(e);
        }
        self.transition(self.resting_state())?;
        Ok(true)
    }

    async fn speak(&mut self, text: &str) -> Result<bool, DialogueError> {
        let utterance = self.begin_speaking(text).await?;
        self.finish_speaking(utterance).await
    }

    async fn reply(
        &mut self,
        text: &str,
        outcome: TurnOutcome,
    ) -> Result<TurnOutcome, DialogueError> {
        let utterance = self.begin_speaking(text).await?;
        self.finish_reply(utterance, outcome).await
    }

    async fn finish_reply(
        &mut self,
        utterance: Utterance,
        outcome: TurnOutcome,
    ) -> Result<TurnOutcome, DialogueError> {
        if self.finish_speaking(utterance).await? {
            Ok(outcome)
        } else {
            Ok(TurnOutcome::Cancelled)
        }
    }

    fn report_voice_failure(&mut self, error: &SpeechError) {
        match error {
            SpeechError::Unsupported(reason) => {
                if !self.voice_reported {
                    warn!(%reason, "Voice unavailable, typed input required");
                    self.voice_reported = true;
                    self.emit(DialogueEvent::VoiceUnavailable {
                        reason: reason.clone(),
                    });
                }
            }
            other => debug!(error = %other, "Utterance failed, continuing"),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn transition(&mut self, target: ControllerState) -> Result<(), DialogueError> {
        if !self.state.can_transition_to(target) {
            return Err(DialogueError::InvalidTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        debug!(session_id = %self.session.id(), from = %self.state, to = %target, "Controller state change");
        self.state = target;
        self.publish();
        Ok(())
    }

    /// Where the controller waits after speaking, given the session mode.
    fn resting_state(&self) -> ControllerState {
        match self.session.mode() {
            SessionMode::NoForm => ControllerState::Idle,
            SessionMode::Triage => ControllerState::Triage,
            SessionMode::Collecting => ControllerState::Listening,
            SessionMode::Completed => ControllerState::Completed,
        }
    }

    fn cancelled_turn(&mut self) -> TurnOutcome {
        debug!(session_id = %self.session.id(), "Turn abandoned, session ended");
        self.state = ControllerState::Idle;
        self.publish();
        TurnOutcome::Cancelled
    }

    fn question(&self, field: &str, language: Language) -> Result<String, DialogueError> {
        Ok(self.deps.catalog.question(field, language)?.to_string())
    }

    fn first_question(
        &self,
        form: &FormDefinition,
        language: Language,
    ) -> Result<String, DialogueError> {
        let field = form
            .fields
            .first()
            .ok_or_else(|| CatalogError::EmptyForm(form.id.clone()))?;
        self.question(field, language)
    }

    fn emit(&self, event: DialogueEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(SessionSnapshot::capture(self.state, &self.session));
    }
}

/// Run `fut` unless `token` fires first.
async fn unless_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = fut => Some(output),
    }
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}
