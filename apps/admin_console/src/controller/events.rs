//! UI notifications and error modeling for the admin console.

use client_core::{ResourceEvent, ResourceOperation};

use crate::controller::admin_settings::{SaveAllError, SaveSummary};

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    Saved(SaveSummary),
    Error(UiError),
}

impl UiEvent {
    pub fn from_resource_event(event: &ResourceEvent) -> Self {
        match event {
            ResourceEvent::Loaded { resource, items } => {
                Self::Info(format!("Loaded {resource} ({items})"))
            }
            ResourceEvent::Saved { resource, items } => {
                Self::Info(format!("Saved {resource} ({items})"))
            }
            ResourceEvent::Failed {
                resource,
                operation,
                message,
            } => {
                let (verb, context) = match operation {
                    ResourceOperation::Fetch => ("load", UiErrorContext::LoadSettings),
                    ResourceOperation::Save => ("save", UiErrorContext::SaveSettings),
                };
                Self::Error(UiError::from_message(
                    context,
                    format!("Failed to {verb} {resource}: {message}"),
                ))
            }
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Info(text) => text.clone(),
            Self::Saved(summary) => format!(
                "Settings saved: node and {} context(s)",
                summary.contexts
            ),
            Self::Error(error) if error.requires_reauth() => {
                format!("{} (sign in again and retry)", error.message())
            }
            Self::Error(error) => error.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Startup,
    LoadSettings,
    SaveSettings,
}

pub fn classify_connection_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("invalid admin base url") {
        "Admin server URL is invalid; use an http:// or https:// address.".to_string()
    } else if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Admin server unreachable; check URL/network and retry.".to_string()
    } else {
        format!("Admin API error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("notauthenticated")
            || message_lower.contains("session expired")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("not been loaded")
            || message_lower.contains("validation")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&SaveAllError> for UiError {
    fn from(error: &SaveAllError) -> Self {
        Self::from_message(UiErrorContext::SaveSettings, error.to_string())
    }
}
