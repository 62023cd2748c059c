// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing error descriptors.
//!
//! An [`ApiError`] tells the UI what went wrong and what the user can do
//! about it. Titles, messages and remediation steps are carried as
//! translation keys, with built-in English and Spanish texts for surfaces
//! that do not ship their own catalog.

use std::time::Duration;

use larder_core::types::Locale;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

/// Error categories shown to the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PromptInjection,
    InvalidApiKey,
    ProviderNotFound,
    NetworkError,
    RateLimited,
    ProviderError,
    ParseFailure,
    UnknownError,
}

/// The single most useful next action for an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryAction {
    /// Retry on another provider.
    SwitchProvider(String),
    /// Open an in-app location.
    Navigate(String),
    /// Ask for a (new) API key.
    ShowApiKeyForm,
}

impl std::fmt::Display for PrimaryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryAction::SwitchProvider(id) => write!(f, "switch-provider:{id}"),
            PrimaryAction::Navigate(path) => write!(f, "navigate:{path}"),
            PrimaryAction::ShowApiKeyForm => write!(f, "show-api-key-form"),
        }
    }
}

impl Serialize for PrimaryAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct CodeText {
    icon: &'static str,
    title: [&'static str; 2],
    message: [&'static str; 2],
    steps: [&'static [&'static str]; 2],
}

fn code_text(code: ErrorCode) -> &'static CodeText {
    match code {
        ErrorCode::PromptInjection => &CodeText {
            icon: "🛡️",
            title: ["Request blocked", "Solicitud bloqueada"],
            message: [
                "Your message looks like an attempt to change how the assistant behaves.",
                "Tu mensaje parece un intento de cambiar el comportamiento del asistente.",
            ],
            steps: [
                &["Describe the dish or ingredients you want to cook with.", "Remove instructions aimed at the assistant."],
                &["Describe el plato o los ingredientes que quieres usar.", "Quita las instrucciones dirigidas al asistente."],
            ],
        },
        ErrorCode::InvalidApiKey => &CodeText {
            icon: "🔑",
            title: ["API key problem", "Problema con la clave de API"],
            message: [
                "The selected provider has no valid API key.",
                "El proveedor seleccionado no tiene una clave de API válida.",
            ],
            steps: [
                &["Check that the key was copied completely.", "Create a new key in the provider's console.", "Save the key in Larder."],
                &["Comprueba que la clave se copió completa.", "Crea una clave nueva en la consola del proveedor.", "Guarda la clave en Larder."],
            ],
        },
        ErrorCode::ProviderNotFound => &CodeText {
            icon: "🔍",
            title: ["Provider not available", "Proveedor no disponible"],
            message: [
                "The selected provider is not configured.",
                "El proveedor seleccionado no está configurado.",
            ],
            steps: [
                &["Pick another provider in settings."],
                &["Elige otro proveedor en la configuración."],
            ],
        },
        ErrorCode::NetworkError => &CodeText {
            icon: "📡",
            title: ["Connection problem", "Problema de conexión"],
            message: [
                "The provider could not be reached.",
                "No se pudo contactar con el proveedor.",
            ],
            steps: [
                &["Check your internet connection.", "Wait for the automatic retry."],
                &["Comprueba tu conexión a internet.", "Espera al reintento automático."],
            ],
        },
        ErrorCode::RateLimited => &CodeText {
            icon: "⏳",
            title: ["Too many requests", "Demasiadas solicitudes"],
            message: [
                "The provider is limiting requests for now.",
                "El proveedor está limitando las solicitudes por ahora.",
            ],
            steps: [
                &["Wait for the automatic retry.", "Switch to a free alternative provider."],
                &["Espera al reintento automático.", "Cambia a un proveedor gratuito alternativo."],
            ],
        },
        ErrorCode::ProviderError => &CodeText {
            icon: "⚠️",
            title: ["Provider error", "Error del proveedor"],
            message: [
                "The provider had an internal problem.",
                "El proveedor tuvo un problema interno.",
            ],
            steps: [
                &["Wait for the automatic retry.", "Switch to another provider."],
                &["Espera al reintento automático.", "Cambia a otro proveedor."],
            ],
        },
        ErrorCode::ParseFailure => &CodeText {
            icon: "🧩",
            title: ["Unexpected answer format", "Formato de respuesta inesperado"],
            message: [
                "The answer arrived but could not be turned into recipe ideas.",
                "La respuesta llegó pero no se pudo convertir en ideas de recetas.",
            ],
            steps: [
                &["Try generating again.", "Try a different model."],
                &["Vuelve a generar.", "Prueba con otro modelo."],
            ],
        },
        ErrorCode::UnknownError => &CodeText {
            icon: "❓",
            title: ["Something went wrong", "Algo salió mal"],
            message: [
                "An unexpected error occurred.",
                "Ocurrió un error inesperado.",
            ],
            steps: [
                &["Try again.", "Switch to another provider if it keeps happening."],
                &["Inténtalo de nuevo.", "Cambia de proveedor si sigue ocurriendo."],
            ],
        },
    }
}

fn locale_index(locale: Locale) -> usize {
    match locale {
        Locale::En => 0,
        Locale::Es => 1,
    }
}

impl ErrorCode {
    fn key_prefix(self) -> String {
        format!("errors.{}", self.to_string().to_lowercase())
    }

    pub fn icon(self) -> &'static str {
        code_text(self).icon
    }
}

/// A classified failure with everything needed to present it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub icon: &'static str,
    pub title_key: String,
    pub message_key: String,
    /// Ordered remediation step keys.
    pub steps: Vec<String>,
    pub auto_retry: bool,
    pub retry_delay: Option<Duration>,
    /// Free-tier providers to suggest, excluding the one that failed.
    pub free_alternatives: Vec<String>,
    pub primary_action: Option<PrimaryAction>,
}

impl ApiError {
    /// A non-retrying error of `code` with its keys filled in.
    pub fn new(code: ErrorCode) -> Self {
        let prefix = code.key_prefix();
        let step_count = code_text(code).steps[0].len();
        Self {
            code,
            icon: code.icon(),
            title_key: format!("{prefix}.title"),
            message_key: format!("{prefix}.message"),
            steps: (0..step_count).map(|i| format!("{prefix}.steps.{i}")).collect(),
            auto_retry: false,
            retry_delay: None,
            free_alternatives: Vec::new(),
            primary_action: None,
        }
    }

    /// Soft notice for a response whose structure could not be extracted.
    pub fn parse_failure() -> Self {
        Self::new(ErrorCode::ParseFailure)
    }

    pub fn with_retry(mut self, delay: Duration) -> Self {
        self.auto_retry = true;
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_action(mut self, action: PrimaryAction) -> Self {
        self.primary_action = Some(action);
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.free_alternatives = alternatives;
        self
    }

    /// Whether a countdown should be scheduled for this error.
    pub fn should_auto_retry(&self) -> bool {
        self.auto_retry && self.retry_delay.is_some()
    }

    pub fn title(&self, locale: Locale) -> &'static str {
        code_text(self.code).title[locale_index(locale)]
    }

    pub fn message(&self, locale: Locale) -> &'static str {
        code_text(self.code).message[locale_index(locale)]
    }

    /// Remediation steps, in order, as display text.
    pub fn step_texts(&self, locale: Locale) -> &'static [&'static str] {
        code_text(self.code).steps[locale_index(locale)]
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.icon, self.code, self.message(Locale::En))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn codes_render_screaming_snake_case() {
        assert_eq!(ErrorCode::RateLimited.to_string(), "RATE_LIMITED");
        assert_eq!(ErrorCode::InvalidApiKey.to_string(), "INVALID_API_KEY");
        assert_eq!("PARSE_FAILURE".parse::<ErrorCode>().unwrap(), ErrorCode::ParseFailure);
    }

    #[test]
    fn keys_follow_code() {
        let error = ApiError::new(ErrorCode::NetworkError);
        assert_eq!(error.title_key, "errors.network_error.title");
        assert_eq!(error.message_key, "errors.network_error.message");
        assert_eq!(error.steps, vec!["errors.network_error.steps.0", "errors.network_error.steps.1"]);
        assert!(!error.should_auto_retry());
    }

    #[test]
    fn every_code_has_matching_step_counts_per_locale() {
        for code in ErrorCode::iter() {
            let error = ApiError::new(code);
            assert_eq!(error.step_texts(Locale::En).len(), error.steps.len(), "{code}");
            assert_eq!(error.step_texts(Locale::Es).len(), error.steps.len(), "{code}");
            assert!(!error.title(Locale::Es).is_empty());
        }
    }

    #[test]
    fn primary_action_wire_form() {
        assert_eq!(PrimaryAction::SwitchProvider("groq".into()).to_string(), "switch-provider:groq");
        assert_eq!(PrimaryAction::Navigate("/settings/providers".into()).to_string(), "navigate:/settings/providers");
        assert_eq!(PrimaryAction::ShowApiKeyForm.to_string(), "show-api-key-form");
    }

    #[test]
    fn serializes_camel_case() {
        let error = ApiError::new(ErrorCode::RateLimited)
            .with_retry(Duration::from_secs(20))
            .with_action(PrimaryAction::SwitchProvider("groq".into()));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "RATE_LIMITED");
        assert_eq!(json["autoRetry"], true);
        assert_eq!(json["primaryAction"], "switch-provider:groq");
    }
}
