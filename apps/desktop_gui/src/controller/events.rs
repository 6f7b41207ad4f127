//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{CollectionState, OperationFailure, OperationKind};
use shared::error::ErrorCode;

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    OperationStarted(OperationKind),
    CollectionChanged(CollectionState),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    NotFound,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Load,
    Create,
    Update,
    Delete,
}

impl From<OperationKind> for UiErrorContext {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Load => Self::Load,
            OperationKind::Create => Self::Create,
            OperationKind::Update => Self::Update,
            OperationKind::Delete => Self::Delete,
        }
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Auth => "Authentication",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::NotFound => "Not found",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
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
        let category = classify_message(&message);
        Self {
            category,
            context,
            message,
        }
    }

    /// Prefers the store's error code; falls back to the message text when the
    /// request never got a response.
    pub fn from_failure(failure: &OperationFailure) -> Self {
        let category = match failure.code {
            Some(ErrorCode::Unauthorized | ErrorCode::Forbidden) => UiErrorCategory::Auth,
            Some(ErrorCode::NotFound) => UiErrorCategory::NotFound,
            Some(ErrorCode::Validation) => UiErrorCategory::Validation,
            Some(ErrorCode::RateLimited) => UiErrorCategory::Transport,
            Some(ErrorCode::Internal) => UiErrorCategory::Unknown,
            None => classify_message(&failure.message),
        };
        Self {
            category,
            context: failure.kind.into(),
            message: failure.message.clone(),
        }
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

    /// Line shown in the status bar.
    pub fn status_line(&self) -> String {
        let action = match self.context {
            UiErrorContext::BackendStartup => "Startup",
            UiErrorContext::Load => "Loading records",
            UiErrorContext::Create => "Adding record",
            UiErrorContext::Update => "Saving record",
            UiErrorContext::Delete => "Deleting record",
        };
        format!(
            "{action} failed ({}): {}",
            err_label(self.category),
            self.message
        )
    }
}

fn classify_message(message: &str) -> UiErrorCategory {
    let message_lower = message.to_ascii_lowercase();
    if message_lower.contains("401")
        || message_lower.contains("403")
        || message_lower.contains("unauthorized")
        || message_lower.contains("forbidden")
        || message_lower.contains("invalid token")
    {
        UiErrorCategory::Auth
    } else if message_lower.contains("not found") {
        UiErrorCategory::NotFound
    } else if message_lower.contains("invalid")
        || message_lower.contains("missing")
        || message_lower.contains("malformed")
    {
        UiErrorCategory::Validation
    } else if message_lower.contains("timeout")
        || message_lower.contains("timed out")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("request failed")
        || message_lower.contains("unavailable")
        || message_lower.contains("disconnect")
    {
        UiErrorCategory::Transport
    } else {
        UiErrorCategory::Unknown
    }
}
