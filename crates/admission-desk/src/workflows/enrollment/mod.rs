//! Applicant intake wizard: degree, general information, guardians,
//! education, awards, and other documents, followed by submission.
//!
//! The draft store is the single owner of in-progress state; the upload
//! coordinator guards each attachment field against stale responses; the
//! step validator gates every forward transition; the navigator persists
//! step slices on advance; and the assembler turns the finished draft into
//! the backend's nested payload.

pub mod assemble;
pub mod domain;
pub mod gateway;
pub mod navigator;
pub mod router;
pub mod service;
pub mod store;
pub mod upload;
pub(crate) mod validate;

#[cfg(test)]
mod tests;

pub use assemble::{
    assemble, ApplicationPayload, AssembleError, DocumentPayload, GuardianPayload,
    InstitutionPayload, OlympicPayload, SavedApplication, SavedDocument, SavedGuardian,
    SavedInstitution, SavedOlympic, SavedUser, UserPayload,
};
pub use domain::{
    AwardInfo, AwardTier, Degree, DocumentSlot, Draft, EducationInfo, FileReference, Gender,
    GeneralInformation, Guardian, GuardianDocument, GuardianDocumentKind, GuardianRelation,
    OtherDocuments, SessionId, Step, ADDITIONAL_MAJOR_SLOTS,
};
pub use gateway::{ApplicationAck, ApplicationsGateway, FileGateway, GatewayError};
pub use navigator::{NavigationError, WizardNavigator, WizardState};
pub use router::enrollment_router;
pub use service::{
    SubmissionReceipt, UploadOutcome, WizardError, WizardService, WizardSnapshot,
};
pub use store::{
    AwardsPatch, CacheError, DegreePatch, DegreeSelection, DraftCache, DraftStore, EducationPatch,
    GeneralInfoPatch, GuardiansPatch, SectionPatch, SectionSlice,
};
pub use upload::{FieldKey, UploadCoordinator, UploadError, UploadPhase, UploadTicket};
pub use validate::{validate_all, validate_step, ValidationError};
