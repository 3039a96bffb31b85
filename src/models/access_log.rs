//! Access log models and request validation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::FieldErrors;

/// One recorded access event: a card presented at a door, granted or denied.
///
/// `id` and `timestamp` are assigned by the store at insert time and are
/// read-only thereafter; request types deliberately do not carry them, so any
/// value a caller submits for either is silently discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessLog {
    pub id: i64,
    pub card_id: String,
    pub door_name: String,
    pub access_granted: bool,
    pub timestamp: DateTime<Utc>,
}

impl AccessLog {
    /// Human-readable outcome label used in audit lines
    pub fn status_label(&self) -> &'static str {
        if self.access_granted {
            "GRANTED"
        } else {
            "DENIED"
        }
    }
}

impl fmt::Display for AccessLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.card_id,
            self.door_name,
            self.status_label()
        )
    }
}

/// Validated field values for a new access log row
#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub card_id: String,
    pub door_name: String,
    pub access_granted: bool,
}

/// Create request body. All fields optional at the serde level so that
/// missing ones surface as per-field validation errors rather than a
/// deserialization failure. Unknown keys (including `id` and `timestamp`)
/// are ignored.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateAccessLogRequest {
    pub card_id: Option<String>,
    pub door_name: Option<String>,
    pub access_granted: Option<bool>,
}

impl CreateAccessLogRequest {
    /// Validate the request, collecting per-field messages
    pub fn validate(self) -> Result<NewAccessLog, FieldErrors> {
        let mut errors = FieldErrors::new();

        let card_id = require_non_blank("card_id", self.card_id, &mut errors);
        let door_name = require_non_blank("door_name", self.door_name, &mut errors);
        if self.access_granted.is_none() {
            field_error(&mut errors, "access_granted", "This field is required.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewAccessLog {
            card_id: card_id.unwrap_or_default(),
            door_name: door_name.unwrap_or_default(),
            access_granted: self.access_granted.unwrap_or_default(),
        })
    }
}

/// Field changes produced by a validated update request. `None` means the
/// field was not supplied and keeps its stored value.
#[derive(Debug, Clone, Default)]
pub struct AccessLogChanges {
    pub card_id: Option<String>,
    pub door_name: Option<String>,
    pub access_granted: Option<bool>,
}

/// Update request body, shared by full (PUT) and partial (PATCH) updates
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateAccessLogRequest {
    pub card_id: Option<String>,
    pub door_name: Option<String>,
    pub access_granted: Option<bool>,
}

impl UpdateAccessLogRequest {
    /// Validate the request. For a full update every field is required; for
    /// a partial update only supplied fields are validated and applied.
    pub fn validate(self, partial: bool) -> Result<AccessLogChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        let card_id = match (self.card_id, partial) {
            (Some(v), _) => check_non_blank("card_id", v, &mut errors),
            (None, true) => None,
            (None, false) => {
                field_error(&mut errors, "card_id", "This field is required.");
                None
            }
        };
        let door_name = match (self.door_name, partial) {
            (Some(v), _) => check_non_blank("door_name", v, &mut errors),
            (None, true) => None,
            (None, false) => {
                field_error(&mut errors, "door_name", "This field is required.");
                None
            }
        };
        if self.access_granted.is_none() && !partial {
            field_error(&mut errors, "access_granted", "This field is required.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AccessLogChanges {
            card_id,
            door_name,
            access_granted: self.access_granted,
        })
    }
}

/// Declarative list filter: every supplied parameter constrains the result
/// conjunctively. Unrecognized query parameters are ignored.
///
/// Comparison strategies:
/// - `card_id`: exact match, case-insensitive
/// - `door_name`: substring match, case-insensitive
/// - `access_granted`: exact boolean match
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AccessLogFilter {
    pub card_id: Option<String>,
    pub door_name: Option<String>,
    pub access_granted: Option<bool>,
}

impl AccessLogFilter {
    /// True when no parameter constrains the listing
    pub fn is_empty(&self) -> bool {
        self.card_id.is_none() && self.door_name.is_none() && self.access_granted.is_none()
    }
}

fn field_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn require_non_blank(
    field: &str,
    value: Option<String>,
    errors: &mut FieldErrors,
) -> Option<String> {
    match value {
        Some(v) => check_non_blank(field, v, errors),
        None => {
            field_error(errors, field, "This field is required.");
            None
        }
    }
}

fn check_non_blank(field: &str, value: String, errors: &mut FieldErrors) -> Option<String> {
    if value.trim().is_empty() {
        field_error(errors, field, "This field may not be blank.");
        None
    } else {
        Some(value)
    }
}
