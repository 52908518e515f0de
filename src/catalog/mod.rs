//! Static form catalog of form layouts and their per-language prompts.
//!
//! The catalog is read-only configuration consumed by the dialogue
//! controller. It is validated once at startup so every field of every form
//! has a question in every supported language.

pub mod forms;
pub mod language;
pub mod prompts;

pub use forms::{FormDefinition, LocalizedText};
pub use language::Language;
pub use prompts::FieldPrompts;

use std::collections::HashSet;

use crate::error::CatalogError;

/// Validated set of forms plus the prompt table that drives them.
#[derive(Debug, Clone)]
pub struct Catalog {
    forms: Vec<FormDefinition>,
    prompts: FieldPrompts,
}

impl Catalog {
    /// Build a catalog, rejecting incomplete or inconsistent configuration.
    pub fn new(forms: Vec<FormDefinition>, prompts: FieldPrompts) -> Result<Self, CatalogError> {
        let catalog = Self { forms, prompts };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The built-in government scheme catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(forms::builtin_forms(), FieldPrompts::builtin())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut ids = HashSet::new();
        for form in &self.forms {
            if !ids.insert(form.id.as_str()) {
                return Err(CatalogError::DuplicateForm(form.id.clone()));
            }
            if form.fields.is_empty() {
                return Err(CatalogError::EmptyForm(form.id.clone()));
            }
            let mut seen = HashSet::new();
            for field in &form.fields {
                if !seen.insert(field.as_str()) {
                    return Err(CatalogError::DuplicateField {
                        form: form.id.clone(),
                        field: field.clone(),
                    });
                }
                for language in Language::ALL {
                    if self.prompts.get(field, language).is_none() {
                        return Err(CatalogError::MissingPrompt {
                            field: field.clone(),
                            language: language.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// All forms, in catalog order.
    pub fn forms(&self) -> &[FormDefinition] {
        &self.forms
    }

    /// Look up a form by id.
    pub fn form(&self, id: &str) -> Option<&FormDefinition> {
        self.forms.iter().find(|f| f.id == id)
    }

    /// The question asked for `field` in `language`.
    pub fn question(&self, field: &str, language: Language) -> Result<&str, CatalogError> {
        self.prompts
            .get(field, language)
            .ok_or_else(|| CatalogError::MissingPrompt {
                field: field.to_string(),
                language: language.to_string(),
            })
    }
}
