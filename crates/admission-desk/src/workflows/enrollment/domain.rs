use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for wizard sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Degree the applicant is applying for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degree {
    Bachelor,
    Master,
}

impl Degree {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bachelor => "bachelor",
            Self::Master => "master",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Relation of a guardian to the applicant. The first two draft slots are
/// reserved for the designated father and mother entries; every further
/// entry carries one of the free-form relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardianRelation {
    Father,
    Mother,
    Grandparent,
    Sibling,
    Uncle,
    Aunt,
}

impl GuardianRelation {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Father => "father",
            Self::Mother => "mother",
            Self::Grandparent => "grandparent",
            Self::Sibling => "sibling",
            Self::Uncle => "uncle",
            Self::Aunt => "aunt",
        }
    }

    pub const fn is_parent(self) -> bool {
        matches!(self, Self::Father | Self::Mother)
    }
}

/// Tier of a competition achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardTier {
    Area,
    Region,
    State,
    International,
    Other,
}

impl AwardTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Region => "region",
            Self::State => "state",
            Self::International => "international",
            Self::Other => "other",
        }
    }
}

/// Document kinds attachable to a guardian entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardianDocumentKind {
    Passport,
    DeathCertificate,
}

impl GuardianDocumentKind {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::DeathCertificate => "death_certificate",
        }
    }
}

impl fmt::Display for GuardianDocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Fixed named slots of the other-documents step, each holding at most one
/// uploaded file. The tag is the backend document type the slot maps to at
/// submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    MedicalRecord,
    RelationshipTree,
    InformationSheet,
    Autobiography,
    LaborBook,
    MilitaryDocument,
    MarriageCertificate,
}

impl DocumentSlot {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::MedicalRecord,
            Self::RelationshipTree,
            Self::InformationSheet,
            Self::Autobiography,
            Self::LaborBook,
            Self::MilitaryDocument,
            Self::MarriageCertificate,
        ]
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::MedicalRecord => "medical_record",
            Self::RelationshipTree => "relationship_tree",
            Self::InformationSheet => "information_sheet",
            Self::Autobiography => "autobiography",
            Self::LaborBook => "labor_book",
            Self::MilitaryDocument => "military_document",
            Self::MarriageCertificate => "marriage_certificate",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|slot| slot.tag() == tag)
    }

    /// Whether the slot participates in the required set. The military
    /// document is only collected for male applicants.
    pub fn required_for(self, gender: Option<Gender>) -> bool {
        match self {
            Self::MilitaryDocument => gender != Some(Gender::Female),
            _ => true,
        }
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Server-assigned handle for an uploaded file. Only the upload gateway
/// mints these; the wizard never fabricates one client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub id: i64,
    pub path: String,
    pub name: String,
}

/// Personal details collected on the general-information step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralInformation {
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub gender: Option<Gender>,
    pub nationality: String,
    pub date_of_birth: Option<NaiveDate>,
    pub area: Option<i64>,
    pub address: String,
    pub place_of_birth: String,
    pub phone: String,
    pub home_phone: String,
    pub email: String,
}

/// A document attached to a guardian entry, at most one per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianDocument {
    pub kind: GuardianDocumentKind,
    pub file: FileReference,
}

/// A parent or other responsible adult attached to the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub relation: GuardianRelation,
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: String,
    pub phone: String,
    pub address: String,
    pub work_place: String,
    /// Tri-state: `Some(true)` relaxes the contact requirements and demands
    /// a death certificate instead of a passport.
    pub deceased: Option<bool>,
    #[serde(default)]
    pub documents: Vec<GuardianDocument>,
}

impl Guardian {
    pub fn with_relation(relation: GuardianRelation) -> Self {
        Self {
            id: None,
            relation,
            first_name: String::new(),
            last_name: String::new(),
            father_name: String::new(),
            date_of_birth: None,
            place_of_birth: String::new(),
            phone: String::new(),
            address: String::new(),
            work_place: String::new(),
            deceased: None,
            documents: Vec::new(),
        }
    }

    pub fn is_deceased(&self) -> bool {
        self.deceased == Some(true)
    }

    pub fn document(&self, kind: GuardianDocumentKind) -> Option<&FileReference> {
        self.documents
            .iter()
            .find(|doc| doc.kind == kind)
            .map(|doc| &doc.file)
    }
}

/// One attended institution with its grade point average and certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub school_name: String,
    pub gpa: Option<f32>,
    /// Four-digit year; zero means not filled in yet.
    pub graduated_year: u16,
    #[serde(default)]
    pub certificates: Vec<FileReference>,
}

impl EducationInfo {
    pub fn blank() -> Self {
        Self {
            id: None,
            school_name: String::new(),
            gpa: None,
            graduated_year: 0,
            certificates: Vec::new(),
        }
    }
}

/// One competition achievement with its supporting files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub tier: Option<AwardTier>,
    pub description: String,
    #[serde(default)]
    pub files: Vec<FileReference>,
}

impl AwardInfo {
    pub fn blank() -> Self {
        Self {
            id: None,
            tier: None,
            description: String::new(),
            files: Vec::new(),
        }
    }
}

/// The fixed document slots of the final step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherDocuments {
    pub medical_record: Option<FileReference>,
    pub relationship_tree: Option<FileReference>,
    pub information_sheet: Option<FileReference>,
    pub autobiography: Option<FileReference>,
    pub labor_book: Option<FileReference>,
    pub military_document: Option<FileReference>,
    pub marriage_certificate: Option<FileReference>,
}

impl OtherDocuments {
    pub fn get(&self, slot: DocumentSlot) -> Option<&FileReference> {
        match slot {
            DocumentSlot::MedicalRecord => self.medical_record.as_ref(),
            DocumentSlot::RelationshipTree => self.relationship_tree.as_ref(),
            DocumentSlot::InformationSheet => self.information_sheet.as_ref(),
            DocumentSlot::Autobiography => self.autobiography.as_ref(),
            DocumentSlot::LaborBook => self.labor_book.as_ref(),
            DocumentSlot::MilitaryDocument => self.military_document.as_ref(),
            DocumentSlot::MarriageCertificate => self.marriage_certificate.as_ref(),
        }
    }

    pub fn set(&mut self, slot: DocumentSlot, file: Option<FileReference>) {
        let target = match slot {
            DocumentSlot::MedicalRecord => &mut self.medical_record,
            DocumentSlot::RelationshipTree => &mut self.relationship_tree,
            DocumentSlot::InformationSheet => &mut self.information_sheet,
            DocumentSlot::Autobiography => &mut self.autobiography,
            DocumentSlot::LaborBook => &mut self.labor_book,
            DocumentSlot::MilitaryDocument => &mut self.military_document,
            DocumentSlot::MarriageCertificate => &mut self.marriage_certificate,
        };
        *target = file;
    }

    pub fn attached(&self) -> impl Iterator<Item = (DocumentSlot, &FileReference)> {
        DocumentSlot::ordered()
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|file| (slot, file)))
    }
}

/// Number of optional additional-major slots offered to bachelor applicants.
pub const ADDITIONAL_MAJOR_SLOTS: usize = 3;

/// The in-progress application assembled across wizard steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub degree: Option<Degree>,
    pub primary_major: Option<i64>,
    /// Up to three extra major choices, position-keyed; only meaningful for
    /// bachelor applicants. Empty positions stay `None` until assembly
    /// filters them out.
    pub additional_majors: [Option<i64>; ADDITIONAL_MAJOR_SLOTS],
    pub general: GeneralInformation,
    pub guardians: Vec<Guardian>,
    pub educations: Vec<EducationInfo>,
    pub awards: Vec<AwardInfo>,
    pub other_documents: OtherDocuments,
}

impl Draft {
    /// The documented empty shape: father and mother guardian slots seeded,
    /// one blank education entry, one blank award entry, nothing attached.
    pub fn empty() -> Self {
        Self {
            degree: None,
            primary_major: None,
            additional_majors: [None; ADDITIONAL_MAJOR_SLOTS],
            general: GeneralInformation::default(),
            guardians: vec![
                Guardian::with_relation(GuardianRelation::Father),
                Guardian::with_relation(GuardianRelation::Mother),
            ],
            educations: vec![EducationInfo::blank()],
            awards: vec![AwardInfo::blank()],
            other_documents: OtherDocuments::default(),
        }
    }

    pub fn father(&self) -> Option<&Guardian> {
        self.guardians
            .iter()
            .find(|guardian| guardian.relation == GuardianRelation::Father)
    }

    pub fn mother(&self) -> Option<&Guardian> {
        self.guardians
            .iter()
            .find(|guardian| guardian.relation == GuardianRelation::Mother)
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::empty()
    }
}

/// Ordered steps of the intake wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Degree,
    GeneralInfo,
    Guardians,
    Education,
    Awards,
    OtherDocuments,
}

impl Step {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Degree,
            Self::GeneralInfo,
            Self::Guardians,
            Self::Education,
            Self::Awards,
            Self::OtherDocuments,
        ]
    }

    pub const fn first() -> Self {
        Self::Degree
    }

    pub const fn last() -> Self {
        Self::OtherDocuments
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::GeneralInfo => "general_info",
            Self::Guardians => "guardians",
            Self::Education => "education",
            Self::Awards => "awards",
            Self::OtherDocuments => "other_documents",
        }
    }

    pub fn next(self) -> Option<Self> {
        let ordered = Self::ordered();
        let index = ordered.iter().position(|step| *step == self)?;
        ordered.get(index + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        let ordered = Self::ordered();
        let index = ordered.iter().position(|step| *step == self)?;
        index.checked_sub(1).and_then(|prev| ordered.get(prev).copied())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
