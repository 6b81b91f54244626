use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            400..=499 => ErrorCode::Validation,
            _ => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status,
            message: message.into(),
        }
    }
}

/// Field-keyed validation messages as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn for_field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Messages for keys that do not belong to a form field.
    pub fn general(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(key, _)| !is_form_field(key))
            .flat_map(|(key, messages)| messages.iter().map(move |m| humanize_entry(key, m)))
            .collect()
    }

    /// Every message prefixed by the human-readable label of its field.
    pub fn humanized(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(key, messages)| messages.iter().map(move |m| humanize_entry(key, m)))
            .collect()
    }

    pub fn combined(&self) -> String {
        self.humanized().join("; ")
    }
}

const FORM_FIELDS: [&str; 3] = ["cantidad_recibida", "notas", "fecha_recepcion"];

fn is_form_field(key: &str) -> bool {
    FORM_FIELDS.contains(&key)
}

/// Display label for a server-side field key.
pub fn field_label(key: &str) -> Option<&'static str> {
    match key {
        "cantidad_recibida" => Some("Received quantity"),
        "notas" => Some("Notes"),
        "fecha_recepcion" => Some("Reception time"),
        "estado" => Some("State"),
        "cantidad_enviada" => Some("Sent quantity"),
        _ => None,
    }
}

fn humanize_entry(key: &str, message: &str) -> String {
    match field_label(key) {
        Some(label) => format!("{label}: {message}"),
        None if matches!(key, "non_field_errors" | "detail" | "error") => message.to_string(),
        None => format!("{key}: {message}"),
    }
}

/// Outcome of a failed request against the transfer API.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestError {
    #[error("validation failed: {}", .0.combined())]
    Validation(FieldErrors),
    #[error("server rejected the request ({}): {}", .0.status, .0.message)]
    Api(ApiError),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl RequestError {
    /// Classifies a non-success response from its status code and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();

        if let Some(Value::Object(map)) = &parsed {
            if let Some(message) = ["detail", "error", "message"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
            {
                return RequestError::Api(ApiError::new(status, message));
            }

            if status == 400 {
                let mut fields = BTreeMap::new();
                for (key, value) in map {
                    let messages = match value {
                        Value::String(text) => vec![text.clone()],
                        Value::Array(items) => items
                            .iter()
                            .map(|item| match item {
                                Value::String(text) => text.clone(),
                                other => other.to_string(),
                            })
                            .collect(),
                        other => vec![other.to_string()],
                    };
                    fields.insert(key.clone(), messages);
                }
                if !fields.is_empty() {
                    return RequestError::Validation(FieldErrors(fields));
                }
            }
        }

        if let Some(Value::Array(items)) = &parsed {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            if !messages.is_empty() {
                return RequestError::Api(ApiError::new(status, messages.join("; ")));
            }
        }

        let trimmed = body.trim();
        let message = if trimmed.is_empty() || trimmed.starts_with('<') {
            default_status_message(status).to_string()
        } else {
            trimmed.to_string()
        };
        RequestError::Api(ApiError::new(status, message))
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            RequestError::Validation(fields) => Some(fields),
            _ => None,
        }
    }

    /// Single-line text suitable for a banner or a message-only failure path.
    pub fn user_message(&self) -> String {
        match self {
            RequestError::Validation(fields) => fields.combined(),
            RequestError::Api(api) => api.message.clone(),
            RequestError::Transport(_) => {
                "Could not reach the server; check the connection and retry.".to_string()
            }
            RequestError::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestError::Transport(_))
            || matches!(self, RequestError::Api(api) if api.code == ErrorCode::Internal)
    }
}

fn default_status_message(status: u16) -> &'static str {
    match status {
        400 => "The request was rejected.",
        401 => "Session expired; sign in again.",
        403 => "You are not allowed to perform this action.",
        404 => "The transfer no longer exists.",
        409 => "The transfer was modified by someone else.",
        500..=599 => "The server failed to process the request.",
        _ => "Unexpected server response.",
    }
}
