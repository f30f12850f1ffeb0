//! Core data models for inkwell.
//!
//! Row types (`Account`, `Template`, `Field`, `Note`, `Section`) mirror the
//! relational tables. The `*View` and `*Summary` types are read-side
//! projections assembled by joins; they are never persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConstraintKind, Error};

// =============================================================================
// ACCOUNT TYPES
// =============================================================================

/// An owner identity created by OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub provider: String,
    pub provider_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Compact owner projection used inside template and note views.
    pub fn summary(&self) -> OwnerSummary {
        OwnerSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            thumbnail: self.thumbnail.clone(),
        }
    }
}

/// Profile data supplied by an OAuth provider on sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthAccountInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub provider: String,
    pub provider_account_id: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Owner display data joined into views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

// =============================================================================
// TEMPLATE TYPES
// =============================================================================

/// A field of a template. Order is 1-based and unique within the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: Uuid,
    pub template_id: Uuid,
    pub label: String,
    pub order: i32,
    pub is_required: bool,
}

/// A template with its fields sorted by `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub fields: Vec<Field>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Template read model: template + owner + derived `is_used`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: Template,
    pub owner: OwnerSummary,
    /// True iff at least one note references this template.
    pub is_used: bool,
}

/// Insert payload for a template row.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub owner_id: Uuid,
}

/// Mutable template columns. `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct TemplateUpdate {
    pub id: Uuid,
    pub name: Option<String>,
}

/// A field to insert during a wholesale field replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewField {
    pub label: String,
    pub order: i32,
    #[serde(default)]
    pub is_required: bool,
}

/// Optional, independently combinable template list filters.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilters {
    pub owner_id: Option<Uuid>,
    /// Case-insensitive substring match on the name.
    pub query: Option<String>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Publication state of a note. Both transitions are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoteStatus {
    #[default]
    Draft,
    Publish,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Draft => "Draft",
            NoteStatus::Publish => "Publish",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = Error;

    /// Parses the stored representation. Anything else is rejected the same
    /// way the table's CHECK constraint would reject it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(NoteStatus::Draft),
            "Publish" => Ok(NoteStatus::Publish),
            other => Err(Error::constraint(
                ConstraintKind::Check,
                format!("invalid note status '{}' (expected Draft or Publish)", other),
            )),
        }
    }
}

/// A note row. Template and owner are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub template_id: Uuid,
    pub owner_id: Uuid,
    pub status: NoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A section row: the content a note holds for one template field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub note_id: Uuid,
    pub field_id: Uuid,
    pub content: String,
}

/// A section enriched with its field's label and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    #[serde(flatten)]
    pub section: Section,
    pub field_label: String,
    pub field_order: i32,
    pub is_required: bool,
}

/// Full note read model, sections ordered by field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    pub template_name: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub sections: Vec<SectionView>,
}

/// List read model. Same joins as [`NoteView`] without section bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    #[serde(flatten)]
    pub note: Note,
    pub template_name: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
}

/// Insert payload for a note row. `status` defaults to Draft.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub template_id: Uuid,
    pub owner_id: Uuid,
    pub status: Option<NoteStatus>,
}

/// Partial note update. `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct NoteUpdate {
    pub id: Uuid,
    pub title: Option<String>,
}

/// A section to insert for a newly created note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    pub field_id: Uuid,
    #[serde(default)]
    pub content: String,
}

/// Content change for an existing section, addressed by section id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub content: String,
}

/// Optional note list filters, AND-combined.
#[derive(Debug, Clone, Default)]
pub struct NoteFilters {
    pub status: Option<NoteStatus>,
    pub owner_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    /// Case-insensitive substring match on the title.
    pub query: Option<String>,
}
