use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{DocumentSlot, GuardianDocumentKind};

/// Addresses one attachment point in the draft: a guardian document of a
/// given kind, an education certificate control, an award file control, or
/// one of the fixed other-document slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKey {
    GuardianDocument {
        guardian: usize,
        document: GuardianDocumentKind,
    },
    EducationCertificate {
        education: usize,
    },
    AwardFile {
        award: usize,
    },
    OtherDocument {
        slot: DocumentSlot,
    },
}

impl FieldKey {
    /// The backend document type tag sent alongside the raw file.
    pub fn document_tag(&self) -> &'static str {
        match self {
            FieldKey::GuardianDocument { document, .. } => document.tag(),
            FieldKey::EducationCertificate { .. } => "certificate",
            FieldKey::AwardFile { .. } => "olympic",
            FieldKey::OtherDocument { slot } => slot.tag(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::GuardianDocument { guardian, document } => {
                write!(f, "guardians[{guardian}].{document}")
            }
            FieldKey::EducationCertificate { education } => {
                write!(f, "educations[{education}].certificate")
            }
            FieldKey::AwardFile { award } => write!(f, "awards[{award}].file"),
            FieldKey::OtherDocument { slot } => write!(f, "documents.{slot}"),
        }
    }
}

/// Errors surfaced by the upload coordinator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("an upload is already in flight for {field}")]
    AlreadyInFlight { field: FieldKey },
    #[error("{field} does not address an attachment point in the draft")]
    UnknownField { field: FieldKey },
}

/// Reported lifecycle phase of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Empty,
    Uploading,
    Attached,
}

/// Proof that a particular upload attempt owns its field. Handed out by
/// [`UploadCoordinator::begin`] and presented back when the transfer
/// settles; a ticket whose epoch no longer matches the field is stale and
/// its result must be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    field: FieldKey,
    epoch: u64,
}

impl UploadTicket {
    pub fn field(&self) -> &FieldKey {
        &self.field
    }
}

#[derive(Debug, Default)]
struct FieldSlot {
    epoch: u64,
    uploading: bool,
}

/// Tracks the upload lifecycle per field. At most one transfer may be in
/// flight per field; different fields are fully independent. The
/// coordinator never stores file references itself; the draft store is
/// the only owner of attached data.
#[derive(Debug, Default)]
pub struct UploadCoordinator {
    fields: HashMap<FieldKey, FieldSlot>,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the field with a fresh epoch and mark it uploading.
    pub fn begin(&mut self, field: FieldKey) -> Result<UploadTicket, UploadError> {
        let slot = self.fields.entry(field.clone()).or_default();
        if slot.uploading {
            return Err(UploadError::AlreadyInFlight { field });
        }
        slot.epoch += 1;
        slot.uploading = true;
        Ok(UploadTicket {
            field,
            epoch: slot.epoch,
        })
    }

    /// Settle an in-flight transfer. Returns `true` when the ticket still
    /// owns the field; a stale ticket (the field was cleared or restarted
    /// since `begin`) returns `false` and leaves all state untouched.
    pub fn settle(&mut self, ticket: &UploadTicket) -> bool {
        match self.fields.get_mut(&ticket.field) {
            Some(slot) if slot.epoch == ticket.epoch => {
                slot.uploading = false;
                true
            }
            _ => false,
        }
    }

    /// Invalidate any in-flight transfer for the field. Responses carrying
    /// an older epoch will be discarded when they eventually arrive.
    pub fn invalidate(&mut self, field: &FieldKey) {
        let slot = self.fields.entry(field.clone()).or_default();
        slot.epoch += 1;
        slot.uploading = false;
    }

    pub fn is_uploading(&self, field: &FieldKey) -> bool {
        self.fields
            .get(field)
            .map(|slot| slot.uploading)
            .unwrap_or(false)
    }

    /// Invalidate every outstanding ticket at once. Used when the draft is
    /// reset after submission.
    pub fn reset(&mut self) {
        for slot in self.fields.values_mut() {
            slot.epoch += 1;
            slot.uploading = false;
        }
    }
}
