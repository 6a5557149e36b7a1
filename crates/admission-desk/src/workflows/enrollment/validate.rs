use super::domain::{
    DocumentSlot, Draft, GeneralInformation, Guardian, GuardianDocumentKind, Step,
};

/// First violated rule for a step, in the documented check order. The
/// condition is the contract; presentation of the message is left to the
/// caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("degree must be selected")]
    DegreeMissing,
    #[error("primary major must be selected")]
    PrimaryMajorMissing,
    #[error("{field} is required")]
    GeneralFieldMissing { field: &'static str },
    #[error("phone must be +993 followed by 8 digits, got '{value}'")]
    PhoneInvalid { value: String },
    #[error("home phone must be 5 or 6 characters, got '{value}'")]
    HomePhoneInvalid { value: String },
    #[error("'{value}' is not a valid email address")]
    EmailInvalid { value: String },
    #[error("guardian #{index}: {field} is required")]
    GuardianFieldMissing { index: usize, field: &'static str },
    #[error("guardian #{index}: phone must be +993 followed by 8 digits, got '{value}'")]
    GuardianPhoneInvalid { index: usize, value: String },
    #[error("guardian #{index}: a {kind} document must be attached")]
    GuardianDocumentMissing {
        index: usize,
        kind: GuardianDocumentKind,
    },
    #[error("an additional guardian is required when both parents are deceased")]
    AdditionalGuardianRequired,
    #[error("education #{index}: school name is required")]
    SchoolNameMissing { index: usize },
    #[error("education #{index}: gpa is required")]
    GpaMissing { index: usize },
    #[error("education #{index}: gpa {gpa} is outside the 0 to 5 range")]
    GpaOutOfRange { index: usize, gpa: f32 },
    #[error("education #{index}: graduation year is required")]
    GraduationYearMissing { index: usize },
    #[error("education #{index}: a certificate must be attached")]
    CertificateMissing { index: usize },
    #[error("at least one award entry is required")]
    AwardRequired,
    #[error("award #{index}: type must be selected")]
    AwardTierMissing { index: usize },
    #[error("award #{index}: description is required")]
    AwardDescriptionMissing { index: usize },
    #[error("award #{index}: a supporting file must be attached")]
    AwardFileMissing { index: usize },
    #[error("document '{slot}' must be attached")]
    DocumentSlotMissing { slot: DocumentSlot },
}

/// Required general-information fields, in the order they are checked.
const REQUIRED_GENERAL_FIELDS: [(&str, fn(&GeneralInformation) -> bool); 9] = [
    ("first_name", |general| {
        !general.first_name.trim().is_empty()
    }),
    ("last_name", |general| !general.last_name.trim().is_empty()),
    ("father_name", |general| {
        !general.father_name.trim().is_empty()
    }),
    ("gender", |general| general.gender.is_some()),
    ("nationality", |general| {
        !general.nationality.trim().is_empty()
    }),
    ("date_of_birth", |general| general.date_of_birth.is_some()),
    ("area", |general| general.area.is_some()),
    ("address", |general| !general.address.trim().is_empty()),
    ("place_of_birth", |general| {
        !general.place_of_birth.trim().is_empty()
    }),
];

/// Required guardian name/date fields, in check order.
const REQUIRED_GUARDIAN_FIELDS: [(&str, fn(&Guardian) -> bool); 5] = [
    ("first_name", |guardian| {
        !guardian.first_name.trim().is_empty()
    }),
    ("last_name", |guardian| !guardian.last_name.trim().is_empty()),
    ("father_name", |guardian| {
        !guardian.father_name.trim().is_empty()
    }),
    ("date_of_birth", |guardian| guardian.date_of_birth.is_some()),
    ("place_of_birth", |guardian| {
        !guardian.place_of_birth.trim().is_empty()
    }),
];

/// Contact fields required for guardians who are not marked deceased.
const REQUIRED_GUARDIAN_CONTACT_FIELDS: [(&str, fn(&Guardian) -> bool); 3] = [
    ("address", |guardian| !guardian.address.trim().is_empty()),
    ("phone", |guardian| !guardian.phone.trim().is_empty()),
    ("work_place", |guardian| {
        !guardian.work_place.trim().is_empty()
    }),
];

/// Validate one step of the draft, stopping at the first violated rule.
pub fn validate_step(draft: &Draft, step: Step) -> Result<(), ValidationError> {
    match step {
        Step::Degree => validate_degree(draft),
        Step::GeneralInfo => validate_general_info(&draft.general),
        Step::Guardians => validate_guardians(draft),
        Step::Education => validate_education(draft),
        Step::Awards => validate_awards(draft),
        Step::OtherDocuments => validate_other_documents(draft),
    }
}

/// Validate every step in wizard order; used as the submission gate.
pub fn validate_all(draft: &Draft) -> Result<(), ValidationError> {
    for step in Step::ordered() {
        validate_step(draft, step)?;
    }
    Ok(())
}

fn validate_degree(draft: &Draft) -> Result<(), ValidationError> {
    if draft.degree.is_none() {
        return Err(ValidationError::DegreeMissing);
    }
    if draft.primary_major.is_none() {
        return Err(ValidationError::PrimaryMajorMissing);
    }
    Ok(())
}

fn validate_general_info(general: &GeneralInformation) -> Result<(), ValidationError> {
    for (field, filled) in REQUIRED_GENERAL_FIELDS {
        if !filled(general) {
            return Err(ValidationError::GeneralFieldMissing { field });
        }
    }
    if !is_intl_phone(&general.phone) {
        return Err(ValidationError::PhoneInvalid {
            value: general.phone.clone(),
        });
    }
    if !(5..=6).contains(&general.home_phone.chars().count()) {
        return Err(ValidationError::HomePhoneInvalid {
            value: general.home_phone.clone(),
        });
    }
    if !is_plausible_email(&general.email) {
        return Err(ValidationError::EmailInvalid {
            value: general.email.clone(),
        });
    }
    Ok(())
}

fn validate_guardians(draft: &Draft) -> Result<(), ValidationError> {
    for (index, guardian) in draft.guardians.iter().enumerate() {
        for (field, filled) in REQUIRED_GUARDIAN_FIELDS {
            if !filled(guardian) {
                return Err(ValidationError::GuardianFieldMissing { index, field });
            }
        }

        if guardian.is_deceased() {
            if guardian
                .document(GuardianDocumentKind::DeathCertificate)
                .is_none()
            {
                return Err(ValidationError::GuardianDocumentMissing {
                    index,
                    kind: GuardianDocumentKind::DeathCertificate,
                });
            }
        } else {
            for (field, filled) in REQUIRED_GUARDIAN_CONTACT_FIELDS {
                if !filled(guardian) {
                    return Err(ValidationError::GuardianFieldMissing { index, field });
                }
            }
            if !is_intl_phone(&guardian.phone) {
                return Err(ValidationError::GuardianPhoneInvalid {
                    index,
                    value: guardian.phone.clone(),
                });
            }
            if guardian.document(GuardianDocumentKind::Passport).is_none() {
                return Err(ValidationError::GuardianDocumentMissing {
                    index,
                    kind: GuardianDocumentKind::Passport,
                });
            }
        }
    }

    let father_deceased = draft.father().map(Guardian::is_deceased).unwrap_or(false);
    let mother_deceased = draft.mother().map(Guardian::is_deceased).unwrap_or(false);
    if father_deceased && mother_deceased {
        let has_additional = draft
            .guardians
            .iter()
            .any(|guardian| !guardian.relation.is_parent());
        if !has_additional {
            return Err(ValidationError::AdditionalGuardianRequired);
        }
    }

    Ok(())
}

fn validate_education(draft: &Draft) -> Result<(), ValidationError> {
    for (index, education) in draft.educations.iter().enumerate() {
        if education.school_name.trim().is_empty() {
            return Err(ValidationError::SchoolNameMissing { index });
        }
        match education.gpa {
            None => return Err(ValidationError::GpaMissing { index }),
            Some(gpa) if !(0.0..=5.0).contains(&gpa) => {
                return Err(ValidationError::GpaOutOfRange { index, gpa })
            }
            Some(_) => {}
        }
        if education.graduated_year == 0 {
            return Err(ValidationError::GraduationYearMissing { index });
        }
        if education.certificates.is_empty() {
            return Err(ValidationError::CertificateMissing { index });
        }
    }
    Ok(())
}

fn validate_awards(draft: &Draft) -> Result<(), ValidationError> {
    if draft.awards.is_empty() {
        return Err(ValidationError::AwardRequired);
    }
    for (index, award) in draft.awards.iter().enumerate() {
        if award.tier.is_none() {
            return Err(ValidationError::AwardTierMissing { index });
        }
        if award.description.trim().is_empty() {
            return Err(ValidationError::AwardDescriptionMissing { index });
        }
        if award.files.is_empty() {
            return Err(ValidationError::AwardFileMissing { index });
        }
    }
    Ok(())
}

fn validate_other_documents(draft: &Draft) -> Result<(), ValidationError> {
    for slot in DocumentSlot::ordered() {
        if !slot.required_for(draft.general.gender) {
            continue;
        }
        if draft.other_documents.get(slot).is_none() {
            return Err(ValidationError::DocumentSlotMissing { slot });
        }
    }
    Ok(())
}

/// `+993` followed by exactly eight ASCII digits.
pub fn is_intl_phone(value: &str) -> bool {
    value
        .strip_prefix("+993")
        .map(|rest| rest.len() == 8 && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// `local@domain.tld` with a non-empty local part and dotted domain labels.
pub fn is_plausible_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
