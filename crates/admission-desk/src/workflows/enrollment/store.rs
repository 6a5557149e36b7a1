use serde::{Deserialize, Serialize};

use super::assemble::SavedApplication;
use super::domain::{
    AwardInfo, Degree, Draft, EducationInfo, FileReference, GeneralInformation, Guardian,
    GuardianDocument, GuardianDocumentKind, GuardianRelation, SessionId, Step,
    ADDITIONAL_MAJOR_SLOTS,
};
use super::upload::{FieldKey, UploadError};

/// Session-scoped key-value cache used to persist step slices (and the
/// wizard position) between navigations. Writes are synchronous and
/// last-write-wins; the most recent successful write is what reads return.
pub trait DraftCache: Send + Sync {
    fn put_slice(&self, session: &SessionId, slice: &SectionSlice) -> Result<(), CacheError>;
    /// All cached slices for the session, in wizard step order.
    fn slices(&self, session: &SessionId) -> Result<Vec<SectionSlice>, CacheError>;
    fn put_position(&self, session: &SessionId, step: Step) -> Result<(), CacheError>;
    fn position(&self, session: &SessionId) -> Result<Option<Step>, CacheError>;
    /// Remember which saved application the session is editing, so a resumed
    /// session updates instead of creating.
    fn put_application(&self, session: &SessionId, application_id: i64) -> Result<(), CacheError>;
    fn application(&self, session: &SessionId) -> Result<Option<i64>, CacheError>;
    fn clear(&self, session: &SessionId) -> Result<(), CacheError>;
}

/// Error enumeration for cache failures.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("draft cache unavailable: {0}")]
    Unavailable(String),
}

/// One section of the draft in a self-describing, serializable form. This
/// is both the unit of persistence-on-advance and the unit of hydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "data", rename_all = "snake_case")]
pub enum SectionSlice {
    Degree(DegreeSelection),
    GeneralInfo(GeneralInformation),
    Guardians(Vec<Guardian>),
    Education(Vec<EducationInfo>),
    Awards(Vec<AwardInfo>),
    OtherDocuments(super::domain::OtherDocuments),
}

impl SectionSlice {
    pub fn step(&self) -> Step {
        match self {
            SectionSlice::Degree(_) => Step::Degree,
            SectionSlice::GeneralInfo(_) => Step::GeneralInfo,
            SectionSlice::Guardians(_) => Step::Guardians,
            SectionSlice::Education(_) => Step::Education,
            SectionSlice::Awards(_) => Step::Awards,
            SectionSlice::OtherDocuments(_) => Step::OtherDocuments,
        }
    }
}

/// Degree-step slice of the draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegreeSelection {
    pub degree: Option<Degree>,
    pub primary_major: Option<i64>,
    pub additional_majors: [Option<i64>; ADDITIONAL_MAJOR_SLOTS],
}

/// Partial update for a single section. Fields left out of the patch leave
/// the stored values untouched; sibling sections are never disturbed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "patch", rename_all = "snake_case")]
pub enum SectionPatch {
    Degree(DegreePatch),
    GeneralInfo(GeneralInfoPatch),
    Guardians(GuardiansPatch),
    Education(EducationPatch),
    Awards(AwardsPatch),
}

impl SectionPatch {
    pub fn step(&self) -> Step {
        match self {
            SectionPatch::Degree(_) => Step::Degree,
            SectionPatch::GeneralInfo(_) => Step::GeneralInfo,
            SectionPatch::Guardians(_) => Step::Guardians,
            SectionPatch::Education(_) => Step::Education,
            SectionPatch::Awards(_) => Step::Awards,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegreePatch {
    #[serde(default)]
    pub degree: Option<Degree>,
    #[serde(default)]
    pub primary_major: Option<i64>,
    #[serde(default)]
    pub additional_majors: Option<[Option<i64>; ADDITIONAL_MAJOR_SLOTS]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfoPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub gender: Option<super::domain::Gender>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub area: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub home_phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Whole-list replacement for the guardian entries. Attachments ride along
/// inside each entry, so callers echo back what they received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardiansPatch {
    pub entries: Vec<Guardian>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationPatch {
    pub entries: Vec<EducationInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwardsPatch {
    pub entries: Vec<AwardInfo>,
}

/// Single owner of the in-progress application. Every read and write of
/// draft state goes through this store; no collaborator keeps a second
/// copy. The store itself performs no network or cache I/O.
#[derive(Debug, Default)]
pub struct DraftStore {
    draft: Draft,
}

impl DraftStore {
    pub fn new() -> Self {
        Self {
            draft: Draft::empty(),
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Populate the draft from a previously saved application and/or cached
    /// step slices. Cached slices belong to the current editing session and
    /// therefore win over server data: the server record only seeds
    /// sections that no slice covers.
    pub fn hydrate(&mut self, server: Option<&SavedApplication>, cached: Vec<SectionSlice>) {
        self.draft = Draft::empty();
        if let Some(saved) = server {
            self.seed_from_saved(saved);
        }
        for slice in cached {
            self.apply_slice(slice);
        }
    }

    /// Restore every section to its documented empty default.
    pub fn reset(&mut self) {
        self.draft = Draft::empty();
    }

    pub fn slice(&self, step: Step) -> SectionSlice {
        match step {
            Step::Degree => SectionSlice::Degree(DegreeSelection {
                degree: self.draft.degree,
                primary_major: self.draft.primary_major,
                additional_majors: self.draft.additional_majors,
            }),
            Step::GeneralInfo => SectionSlice::GeneralInfo(self.draft.general.clone()),
            Step::Guardians => SectionSlice::Guardians(self.draft.guardians.clone()),
            Step::Education => SectionSlice::Education(self.draft.educations.clone()),
            Step::Awards => SectionSlice::Awards(self.draft.awards.clone()),
            Step::OtherDocuments => {
                SectionSlice::OtherDocuments(self.draft.other_documents.clone())
            }
        }
    }

    pub fn apply_slice(&mut self, slice: SectionSlice) {
        match slice {
            SectionSlice::Degree(selection) => {
                self.draft.degree = selection.degree;
                self.draft.primary_major = selection.primary_major;
                self.draft.additional_majors = selection.additional_majors;
            }
            SectionSlice::GeneralInfo(general) => self.draft.general = general,
            SectionSlice::Guardians(entries) => {
                self.draft.guardians = normalize_guardians(entries);
            }
            SectionSlice::Education(entries) => self.draft.educations = entries,
            SectionSlice::Awards(entries) => self.draft.awards = entries,
            SectionSlice::OtherDocuments(documents) => self.draft.other_documents = documents,
        }
    }

    pub fn apply_patch(&mut self, patch: SectionPatch) {
        match patch {
            SectionPatch::Degree(patch) => {
                if let Some(degree) = patch.degree {
                    self.draft.degree = Some(degree);
                    // additional choices only exist for bachelor applicants
                    if degree == Degree::Master {
                        self.draft.additional_majors = [None; ADDITIONAL_MAJOR_SLOTS];
                    }
                }
                if let Some(major) = patch.primary_major {
                    self.draft.primary_major = Some(major);
                }
                if let Some(majors) = patch.additional_majors {
                    if self.draft.degree != Some(Degree::Master) {
                        self.draft.additional_majors = majors;
                    }
                }
            }
            SectionPatch::GeneralInfo(patch) => {
                let general = &mut self.draft.general;
                merge_string(&mut general.first_name, patch.first_name);
                merge_string(&mut general.last_name, patch.last_name);
                merge_string(&mut general.father_name, patch.father_name);
                if let Some(gender) = patch.gender {
                    general.gender = Some(gender);
                }
                merge_string(&mut general.nationality, patch.nationality);
                if let Some(date_of_birth) = patch.date_of_birth {
                    general.date_of_birth = Some(date_of_birth);
                }
                if let Some(area) = patch.area {
                    general.area = Some(area);
                }
                merge_string(&mut general.address, patch.address);
                merge_string(&mut general.place_of_birth, patch.place_of_birth);
                merge_string(&mut general.phone, patch.phone);
                merge_string(&mut general.home_phone, patch.home_phone);
                merge_string(&mut general.email, patch.email);
            }
            SectionPatch::Guardians(patch) => {
                self.draft.guardians = normalize_guardians(patch.entries);
            }
            SectionPatch::Education(patch) => self.draft.educations = patch.entries,
            SectionPatch::Awards(patch) => self.draft.awards = patch.entries,
        }
    }

    pub fn attached(&self, field: &FieldKey) -> Option<&FileReference> {
        match field {
            FieldKey::GuardianDocument { guardian, document } => self
                .draft
                .guardians
                .get(*guardian)
                .and_then(|entry| entry.document(*document)),
            FieldKey::EducationCertificate { education } => self
                .draft
                .educations
                .get(*education)
                .and_then(|entry| entry.certificates.last()),
            FieldKey::AwardFile { award } => self
                .draft
                .awards
                .get(*award)
                .and_then(|entry| entry.files.last()),
            FieldKey::OtherDocument { slot } => self.draft.other_documents.get(*slot),
        }
    }

    /// Whether the field addresses an existing attachment point in the
    /// current draft shape.
    pub fn field_exists(&self, field: &FieldKey) -> bool {
        match field {
            FieldKey::GuardianDocument { guardian, .. } => {
                *guardian < self.draft.guardians.len()
            }
            FieldKey::EducationCertificate { education } => {
                *education < self.draft.educations.len()
            }
            FieldKey::AwardFile { award } => *award < self.draft.awards.len(),
            FieldKey::OtherDocument { .. } => true,
        }
    }

    /// Attach an uploaded reference at the addressed field. Guardian
    /// documents replace any previous document of the same kind; education
    /// and award fields accumulate; document slots hold at most one file.
    pub fn attach(&mut self, field: &FieldKey, file: FileReference) -> Result<(), UploadError> {
        match field {
            FieldKey::GuardianDocument { guardian, document } => {
                let entry = self
                    .draft
                    .guardians
                    .get_mut(*guardian)
                    .ok_or_else(|| UploadError::UnknownField {
                        field: field.clone(),
                    })?;
                entry.documents.retain(|doc| doc.kind != *document);
                entry.documents.push(GuardianDocument {
                    kind: *document,
                    file,
                });
            }
            FieldKey::EducationCertificate { education } => {
                let entry = self
                    .draft
                    .educations
                    .get_mut(*education)
                    .ok_or_else(|| UploadError::UnknownField {
                        field: field.clone(),
                    })?;
                entry.certificates.push(file);
            }
            FieldKey::AwardFile { award } => {
                let entry =
                    self.draft
                        .awards
                        .get_mut(*award)
                        .ok_or_else(|| UploadError::UnknownField {
                            field: field.clone(),
                        })?;
                entry.files.push(file);
            }
            FieldKey::OtherDocument { slot } => {
                self.draft.other_documents.set(*slot, Some(file));
            }
        }
        Ok(())
    }

    /// Detach whatever the field currently holds. No backend delete is
    /// issued; orphaned server files are outside this component's scope.
    pub fn detach(&mut self, field: &FieldKey) -> Result<(), UploadError> {
        match field {
            FieldKey::GuardianDocument { guardian, document } => {
                let entry = self
                    .draft
                    .guardians
                    .get_mut(*guardian)
                    .ok_or_else(|| UploadError::UnknownField {
                        field: field.clone(),
                    })?;
                entry.documents.retain(|doc| doc.kind != *document);
            }
            FieldKey::EducationCertificate { education } => {
                let entry = self
                    .draft
                    .educations
                    .get_mut(*education)
                    .ok_or_else(|| UploadError::UnknownField {
                        field: field.clone(),
                    })?;
                entry.certificates.clear();
            }
            FieldKey::AwardFile { award } => {
                let entry =
                    self.draft
                        .awards
                        .get_mut(*award)
                        .ok_or_else(|| UploadError::UnknownField {
                            field: field.clone(),
                        })?;
                entry.files.clear();
            }
            FieldKey::OtherDocument { slot } => {
                self.draft.other_documents.set(*slot, None);
            }
        }
        Ok(())
    }

    fn seed_from_saved(&mut self, saved: &SavedApplication) {
        let draft = &mut self.draft;
        draft.degree = Some(saved.degree);
        draft.primary_major = Some(saved.primary_major);
        draft.additional_majors = [None; ADDITIONAL_MAJOR_SLOTS];
        for (slot, major) in draft
            .additional_majors
            .iter_mut()
            .zip(saved.admission_major.iter())
        {
            *slot = Some(*major);
        }

        draft.general = GeneralInformation {
            first_name: saved.user.first_name.clone(),
            last_name: saved.user.last_name.clone(),
            father_name: saved.user.father_name.clone(),
            gender: Some(saved.user.gender),
            nationality: saved.user.nationality.clone(),
            date_of_birth: Some(saved.user.date_of_birth),
            area: Some(saved.user.area),
            address: saved.user.address.clone(),
            place_of_birth: saved.user.place_of_birth.clone(),
            phone: saved.user.phone.clone(),
            home_phone: saved.user.home_phone.clone(),
            email: saved.user.email.clone(),
        };

        if !saved.guardians.is_empty() {
            let entries = saved
                .guardians
                .iter()
                .map(|guardian| Guardian {
                    id: guardian.id,
                    relation: guardian.relation,
                    first_name: guardian.first_name.clone(),
                    last_name: guardian.last_name.clone(),
                    father_name: guardian.father_name.clone(),
                    date_of_birth: Some(guardian.date_of_birth),
                    place_of_birth: guardian.place_of_birth.clone(),
                    phone: guardian.phone.clone().unwrap_or_default(),
                    address: guardian.address.clone().unwrap_or_default(),
                    work_place: guardian.work_place.clone().unwrap_or_default(),
                    deceased: guardian.is_deceased,
                    documents: guardian
                        .documents
                        .iter()
                        .filter_map(|document| {
                            guardian_document_kind(&document.kind).map(|kind| GuardianDocument {
                                kind,
                                file: document.file.clone(),
                            })
                        })
                        .collect(),
                })
                .collect();
            draft.guardians = normalize_guardians(entries);
        }

        if !saved.institutions.is_empty() {
            draft.educations = saved
                .institutions
                .iter()
                .map(|institution| EducationInfo {
                    id: institution.id,
                    school_name: institution.name.clone(),
                    gpa: Some(institution.school_gpa),
                    graduated_year: institution.graduated_year,
                    certificates: institution.certificates.clone(),
                })
                .collect();
        }

        if !saved.olympics.is_empty() {
            draft.awards = saved
                .olympics
                .iter()
                .map(|olympic| AwardInfo {
                    id: olympic.id,
                    tier: Some(olympic.tier),
                    description: olympic.description.clone(),
                    files: olympic.files.clone(),
                })
                .collect();
        }

        for document in &saved.documents {
            if let Some(slot) = super::domain::DocumentSlot::from_tag(&document.kind) {
                draft.other_documents.set(slot, Some(document.file.clone()));
            }
        }
    }
}

fn merge_string(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn guardian_document_kind(tag: &str) -> Option<GuardianDocumentKind> {
    match tag {
        "passport" => Some(GuardianDocumentKind::Passport),
        "death_certificate" => Some(GuardianDocumentKind::DeathCertificate),
        _ => None,
    }
}

/// Canonical guardian order: the designated father entry first, mother
/// second, everyone else in insertion order. Display reordering beyond
/// this is a view concern and never mutates the list.
fn normalize_guardians(entries: Vec<Guardian>) -> Vec<Guardian> {
    let mut father = Vec::new();
    let mut mother = Vec::new();
    let mut rest = Vec::new();
    for entry in entries {
        match entry.relation {
            GuardianRelation::Father => father.push(entry),
            GuardianRelation::Mother => mother.push(entry),
            _ => rest.push(entry),
        }
    }
    let mut ordered = Vec::with_capacity(father.len() + mother.len() + rest.len());
    ordered.extend(father);
    ordered.extend(mother);
    ordered.extend(rest);
    ordered
}
