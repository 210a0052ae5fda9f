//! Payload validation.
//!
//! Request bodies are deserialized into loosely typed payloads and checked here.
//! Every rule is checked before returning, so a rejected payload reports all of
//! its violated fields at once and nothing is ever partially applied.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::ProjectStatus;

pub const COMMENT_TITLE_MAX: usize = 200;
pub const PROJECT_NAME_MAX: usize = 100;
pub const PRIORITY_MIN: i64 = 1;
pub const PRIORITY_MAX: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Aggregated field errors, serialized as a plain list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// State of an optional field in a payload.
///
/// Distinguishes a key that was left out from one explicitly set to `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// Value to store on insert: absent and null both mean "no value".
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Set(v) => Some(v),
            Patch::Keep | Patch::Clear => None,
        }
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Resolve against the currently stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(v) => Some(v),
        }
    }
}

/// Body of `POST /comments` and `PUT /comments/{id}`.
///
/// Optional ids are `Option<Option<_>>`: outer `None` when the key is absent,
/// `Some(None)` for an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub project_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub parent_comment_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub author_id: Option<Option<String>>,
}

/// Body of `POST /projects` and `PUT /projects/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
    pub priority: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Marks a key that is present in the body, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInput {
    pub title: String,
    pub content: String,
    pub project_id: Patch<Uuid>,
    pub parent_comment_id: Patch<Uuid>,
    pub author_id: Patch<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: ProjectStatus,
    pub priority: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub fn validate_comment(payload: CommentPayload) -> Result<CommentInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = required_string("title", payload.title, 1, Some(COMMENT_TITLE_MAX), &mut errors);
    let content = required_string("content", payload.content, 1, None, &mut errors);
    let project_id = optional_uuid("projectId", payload.project_id, &mut errors);
    let parent_comment_id = optional_uuid("parentCommentId", payload.parent_comment_id, &mut errors);

    // The key is mandatory; `null` or an empty string mean "no author".
    let author_id = match payload.author_id {
        None => {
            errors.add("authorId", "Required");
            Patch::Keep
        }
        Some(Some(raw)) if raw.is_empty() => Patch::Clear,
        other => optional_uuid("authorId", other, &mut errors),
    };

    errors.finish(CommentInput {
        title: title.unwrap_or_default(),
        content: content.unwrap_or_default(),
        project_id,
        parent_comment_id,
        author_id,
    })
}

pub fn validate_project(payload: ProjectPayload) -> Result<ProjectInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = required_string("name", payload.name, 1, Some(PROJECT_NAME_MAX), &mut errors);
    let description = non_empty(payload.description);
    let image = non_empty(payload.image);
    if let Some(image) = &image {
        if url::Url::parse(image).is_err() {
            errors.add("image", "Invalid url");
        }
    }
    let status = required_status(payload.status, &mut errors);
    let priority = required_priority(payload.priority, &mut errors);
    let start_date = optional_date("startDate", payload.start_date, &mut errors);
    let end_date = optional_date("endDate", payload.end_date, &mut errors);

    errors.finish(ProjectInput {
        name: name.unwrap_or_default(),
        description,
        image,
        status: status.unwrap_or_default(),
        priority: priority.unwrap_or(PRIORITY_MIN),
        start_date,
        end_date,
    })
}

/// Parse a single id coming from a query string.
pub fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, ValidationErrors> {
    Uuid::parse_str(raw).map_err(|_| {
        let mut errors = ValidationErrors::default();
        errors.add(field, "Invalid uuid");
        errors
    })
}

/// Length is counted in UTF-16 code units, matching what browser clients enforce.
fn required_string(
    field: &str,
    value: Option<String>,
    min: usize,
    max: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, "Required");
        return None;
    };

    let len = value.encode_utf16().count();
    if len < min {
        errors.add(
            field,
            format!("String must contain at least {} character(s)", min),
        );
        return None;
    }
    if let Some(max) = max.filter(|max| len > *max) {
        errors.add(
            field,
            format!("String must contain at most {} character(s)", max),
        );
        return None;
    }
    Some(value)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn optional_uuid(
    field: &str,
    value: Option<Option<String>>,
    errors: &mut ValidationErrors,
) -> Patch<Uuid> {
    match value {
        None => Patch::Keep,
        Some(None) => Patch::Clear,
        Some(Some(raw)) => match Uuid::parse_str(&raw) {
            Ok(id) => Patch::Set(id),
            Err(_) => {
                errors.add(field, "Invalid uuid");
                Patch::Keep
            }
        },
    }
}

fn optional_date(
    field: &str,
    value: Option<String>,
    errors: &mut ValidationErrors,
) -> Option<DateTime<Utc>> {
    let raw = non_empty(value)?;
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        errors.add(field, "Invalid date");
    }
    parsed
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn required_status(value: Option<String>, errors: &mut ValidationErrors) -> Option<ProjectStatus> {
    let Some(raw) = value else {
        errors.add("status", "Required");
        return None;
    };

    match raw.parse::<ProjectStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            let expected: Vec<String> = ProjectStatus::ALL
                .iter()
                .map(|s| format!("'{}'", s))
                .collect();
            errors.add(
                "status",
                format!(
                    "Invalid enum value. Expected {}, received '{}'",
                    expected.join(" | "),
                    raw
                ),
            );
            None
        }
    }
}

fn required_priority(value: Option<f64>, errors: &mut ValidationErrors) -> Option<i64> {
    let Some(value) = value else {
        errors.add("priority", "Required");
        return None;
    };

    if value.fract() != 0.0 {
        errors.add("priority", "Expected integer");
        return None;
    }

    let priority = value as i64;
    if priority < PRIORITY_MIN {
        errors.add(
            "priority",
            format!("Number must be greater than or equal to {}", PRIORITY_MIN),
        );
        None
    } else if priority > PRIORITY_MAX {
        errors.add(
            "priority",
            format!("Number must be less than or equal to {}", PRIORITY_MAX),
        );
        None
    } else {
        Some(priority)
    }
}
