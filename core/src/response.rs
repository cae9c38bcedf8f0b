//! Classifies raw HTTP responses into a payload or an `ApiError`.
//!
//! # Design
//! `interpret` is total: every `HttpResponse` maps to exactly one of
//! `Ok(Payload)` or `Err(ApiError)`. Error bodies are reported as text and
//! never parsed, since a failing backend does not promise well-formed JSON.
//! The interpreter does not know about list envelopes; see
//! [`Payload::into_items`] for the caller-side helper.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, TransportError};
use crate::http::HttpResponse;

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Json(_) => None,
        }
    }

    /// Deserializes a JSON payload into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Payload::Json(value) => serde_json::from_value(value).map_err(|e| ApiError::Decode {
                message: e.to_string(),
                body: String::new(),
            }),
            Payload::Text(body) => Err(ApiError::Decode {
                message: "expected a JSON response".to_string(),
                body,
            }),
        }
    }

    /// Items of a list response, accepting a bare array or a
    /// `{"results": [...]}` envelope.
    pub fn into_items(self) -> Result<Vec<Value>, ApiError> {
        match self {
            Payload::Json(Value::Array(items)) => Ok(items),
            Payload::Json(Value::Object(mut map)) => match map.remove("results") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(ApiError::Decode {
                    message: "object response has no `results` array".to_string(),
                    body: Value::Object(map).to_string(),
                }),
            },
            Payload::Json(other) => Err(ApiError::Decode {
                message: "expected a list response".to_string(),
                body: other.to_string(),
            }),
            Payload::Text(body) => Err(ApiError::Decode {
                message: "expected a JSON list response".to_string(),
                body,
            }),
        }
    }
}

/// Classifies a received response.
pub fn interpret(response: HttpResponse) -> Result<Payload, ApiError> {
    if !response.is_success() {
        let message = match response.status_text() {
            "" => format!("{}: {}", response.status, response.body),
            reason => format!("{} {}: {}", response.status, reason, response.body),
        };
        tracing::debug!(status = response.status, "request failed");
        return Err(if response.status == 401 {
            ApiError::Unauthorized {
                message,
                body: response.body,
            }
        } else {
            ApiError::Http {
                status: response.status,
                message,
                body: response.body,
            }
        });
    }

    let is_json = response
        .header("content-type")
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

    if !is_json || response.body.trim().is_empty() {
        return Ok(Payload::Text(response.body));
    }

    match serde_json::from_str(&response.body) {
        Ok(value) => Ok(Payload::Json(value)),
        Err(e) => Err(ApiError::Decode {
            message: e.to_string(),
            body: response.body,
        }),
    }
}

/// Classifies the outcome of a transport call, including the case where no
/// response arrived at all.
pub fn interpret_outcome(
    outcome: Result<HttpResponse, TransportError>,
) -> Result<Payload, ApiError> {
    match outcome {
        Ok(response) => interpret(response),
        Err(err) => {
            tracing::debug!(error = %err, "no response received");
            Err(err.into())
        }
    }
}
