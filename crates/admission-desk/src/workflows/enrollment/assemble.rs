use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    AwardTier, Degree, Draft, FileReference, Gender, Guardian, GuardianRelation,
};

/// Draft fields that must be present before a payload can be produced.
/// Step validation normally guarantees all of these; the assembler still
/// refuses to fabricate values when handed an incomplete draft.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssembleError {
    #[error("degree is not selected")]
    DegreeUnset,
    #[error("primary major is not selected")]
    PrimaryMajorUnset,
    #[error("gender is not selected")]
    GenderUnset,
    #[error("date of birth is not set")]
    DateOfBirthUnset,
    #[error("area is not selected")]
    AreaUnset,
    #[error("guardian #{index} has no date of birth")]
    GuardianDateOfBirthUnset { index: usize },
    #[error("education #{index} has no gpa")]
    GpaUnset { index: usize },
    #[error("award #{index} has no type")]
    AwardTierUnset { index: usize },
}

/// The nested shape the backend create/update endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub degree: Degree,
    pub primary_major: i64,
    pub admission_major: Vec<i64>,
    pub user: UserPayload,
    pub guardians: Vec<GuardianPayload>,
    pub institutions: Vec<InstitutionPayload>,
    pub olympics: Vec<OlympicPayload>,
    pub documents: Vec<DocumentPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub gender: Gender,
    pub nationality: String,
    pub date_of_birth: String,
    pub area: i64,
    pub address: String,
    pub place_of_birth: String,
    pub phone: String,
    pub home_phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub relation: GuardianRelation,
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub work_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_deceased: Option<bool>,
    pub documents: Vec<DocumentPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub name: String,
    pub school_gpa: f32,
    pub graduated_year: u16,
    pub certificates: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlympicPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub tier: AwardTier,
    pub description: String,
    pub files: Vec<i64>,
}

/// `{type, file-id}` pair the backend stores for every attached document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub file: i64,
}

/// A previously submitted application as the backend returns it. Unlike
/// the outbound payload, attachments come back as full file references so
/// the wizard can re-display them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedApplication {
    pub id: i64,
    pub degree: Degree,
    pub primary_major: i64,
    #[serde(default)]
    pub admission_major: Vec<i64>,
    pub user: SavedUser,
    #[serde(default)]
    pub guardians: Vec<SavedGuardian>,
    #[serde(default)]
    pub institutions: Vec<SavedInstitution>,
    #[serde(default)]
    pub olympics: Vec<SavedOlympic>,
    #[serde(default)]
    pub documents: Vec<SavedDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedUser {
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub gender: Gender,
    pub nationality: String,
    pub date_of_birth: NaiveDate,
    pub area: i64,
    pub address: String,
    pub place_of_birth: String,
    pub phone: String,
    pub home_phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGuardian {
    #[serde(default)]
    pub id: Option<i64>,
    pub relation: GuardianRelation,
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub date_of_birth: NaiveDate,
    pub place_of_birth: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub work_place: Option<String>,
    #[serde(default)]
    pub is_deceased: Option<bool>,
    #[serde(default)]
    pub documents: Vec<SavedDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInstitution {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub school_gpa: f32,
    pub graduated_year: u16,
    #[serde(default)]
    pub certificates: Vec<FileReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOlympic {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub tier: AwardTier,
    pub description: String,
    #[serde(default)]
    pub files: Vec<FileReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub file: FileReference,
}

/// Transform the accumulated draft into the backend payload shape.
///
/// `application_id` carries the id of a previously saved application so
/// the backend treats the save as an update instead of a create.
pub fn assemble(
    draft: &Draft,
    application_id: Option<i64>,
) -> Result<ApplicationPayload, AssembleError> {
    let degree = draft.degree.ok_or(AssembleError::DegreeUnset)?;
    let primary_major = draft.primary_major.ok_or(AssembleError::PrimaryMajorUnset)?;

    // extra major choices only apply to bachelor applicants; empty
    // positions are filtered out rather than sent as nulls
    let admission_major = match degree {
        Degree::Bachelor => draft.additional_majors.iter().flatten().copied().collect(),
        Degree::Master => Vec::new(),
    };

    let general = &draft.general;
    let user = UserPayload {
        first_name: general.first_name.clone(),
        last_name: general.last_name.clone(),
        father_name: general.father_name.clone(),
        gender: general.gender.ok_or(AssembleError::GenderUnset)?,
        nationality: general.nationality.clone(),
        date_of_birth: normalize_date(
            general.date_of_birth.ok_or(AssembleError::DateOfBirthUnset)?,
        ),
        area: general.area.ok_or(AssembleError::AreaUnset)?,
        address: general.address.clone(),
        place_of_birth: general.place_of_birth.clone(),
        phone: general.phone.clone(),
        home_phone: general.home_phone.clone(),
        email: general.email.clone(),
    };

    let guardians = draft
        .guardians
        .iter()
        .enumerate()
        .map(|(index, guardian)| assemble_guardian(index, guardian))
        .collect::<Result<Vec<_>, _>>()?;

    let institutions = draft
        .educations
        .iter()
        .enumerate()
        .map(|(index, education)| {
            Ok(InstitutionPayload {
                id: education.id,
                name: education.school_name.clone(),
                school_gpa: education.gpa.ok_or(AssembleError::GpaUnset { index })?,
                graduated_year: education.graduated_year,
                certificates: education
                    .certificates
                    .iter()
                    .map(|file| file.id)
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let olympics = draft
        .awards
        .iter()
        .enumerate()
        .map(|(index, award)| {
            Ok(OlympicPayload {
                id: award.id,
                tier: award.tier.ok_or(AssembleError::AwardTierUnset { index })?,
                description: award.description.clone(),
                files: award.files.iter().map(|file| file.id).collect(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let documents = draft
        .other_documents
        .attached()
        .map(|(slot, file)| DocumentPayload {
            kind: slot.tag().to_string(),
            file: file.id,
        })
        .collect();

    Ok(ApplicationPayload {
        id: application_id,
        degree,
        primary_major,
        admission_major,
        user,
        guardians,
        institutions,
        olympics,
        documents,
    })
}

fn assemble_guardian(index: usize, guardian: &Guardian) -> Result<GuardianPayload, AssembleError> {
    let deceased = guardian.is_deceased();
    Ok(GuardianPayload {
        id: guardian.id,
        relation: guardian.relation,
        first_name: guardian.first_name.clone(),
        last_name: guardian.last_name.clone(),
        father_name: guardian.father_name.clone(),
        date_of_birth: normalize_date(
            guardian
                .date_of_birth
                .ok_or(AssembleError::GuardianDateOfBirthUnset { index })?,
        ),
        place_of_birth: guardian.place_of_birth.clone(),
        phone: contact_field(&guardian.phone, deceased),
        address: contact_field(&guardian.address, deceased),
        work_place: contact_field(&guardian.work_place, deceased),
        is_deceased: guardian.deceased,
        documents: guardian
            .documents
            .iter()
            .map(|document| DocumentPayload {
                kind: document.kind.tag().to_string(),
                file: document.file.id,
            })
            .collect(),
    })
}

/// Deceased guardians carry no contact details; empty strings are dropped
/// rather than serialized.
fn contact_field(value: &str, deceased: bool) -> Option<String> {
    if deceased || value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn normalize_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
