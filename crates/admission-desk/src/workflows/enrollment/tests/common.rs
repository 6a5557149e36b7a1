use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::workflows::enrollment::{
    ApplicationAck, ApplicationPayload, ApplicationsGateway, AwardInfo, AwardTier, CacheError,
    Degree, DocumentSlot, Draft, DraftCache, EducationInfo, FileGateway, FileReference, Gender,
    GeneralInformation, Guardian, GuardianDocument, GuardianDocumentKind, GuardianRelation,
    GatewayError, SavedApplication, SavedDocument, SavedGuardian, SavedInstitution, SavedOlympic,
    SavedUser, SectionSlice, SessionId, Step, WizardService,
};

pub(super) fn file(id: i64, name: &str) -> FileReference {
    FileReference {
        id,
        path: format!("uploads/{id}/{name}"),
        name: name.to_string(),
    }
}

pub(super) fn birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2007, 3, 12).expect("valid date")
}

pub(super) fn guardian_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1978, 11, 2).expect("valid date")
}

pub(super) fn filled_general() -> GeneralInformation {
    GeneralInformation {
        first_name: "Merdan".to_string(),
        last_name: "Annayev".to_string(),
        father_name: "Batyr".to_string(),
        gender: Some(Gender::Male),
        nationality: "Turkmen".to_string(),
        date_of_birth: Some(birth_date()),
        area: Some(2),
        address: "Ashgabat, Garashsyzlyk 12".to_string(),
        place_of_birth: "Ashgabat".to_string(),
        phone: "+99365123456".to_string(),
        home_phone: "12345".to_string(),
        email: "merdan.annayev@example.edu".to_string(),
    }
}

pub(super) fn filled_guardian(relation: GuardianRelation, passport_id: i64) -> Guardian {
    Guardian {
        id: None,
        relation,
        first_name: "Batyr".to_string(),
        last_name: "Annayev".to_string(),
        father_name: "Soltan".to_string(),
        date_of_birth: Some(guardian_birth_date()),
        place_of_birth: "Mary".to_string(),
        phone: "+99361234567".to_string(),
        address: "Ashgabat, Bitarap 4".to_string(),
        work_place: "Ashgabat textile complex".to_string(),
        deceased: Some(false),
        documents: vec![GuardianDocument {
            kind: GuardianDocumentKind::Passport,
            file: file(passport_id, "passport.pdf"),
        }],
    }
}

pub(super) fn deceased_guardian(relation: GuardianRelation, certificate_id: i64) -> Guardian {
    Guardian {
        id: None,
        relation,
        first_name: "Soltan".to_string(),
        last_name: "Annayev".to_string(),
        father_name: "Nury".to_string(),
        date_of_birth: Some(guardian_birth_date()),
        place_of_birth: "Mary".to_string(),
        phone: String::new(),
        address: String::new(),
        work_place: String::new(),
        deceased: Some(true),
        documents: vec![GuardianDocument {
            kind: GuardianDocumentKind::DeathCertificate,
            file: file(certificate_id, "death_certificate.pdf"),
        }],
    }
}

pub(super) fn filled_education(certificate_id: i64) -> EducationInfo {
    EducationInfo {
        id: None,
        school_name: "Ashgabat secondary school 27".to_string(),
        gpa: Some(4.3),
        graduated_year: 2024,
        certificates: vec![file(certificate_id, "certificate.pdf")],
    }
}

pub(super) fn filled_award(file_id: i64) -> AwardInfo {
    AwardInfo {
        id: None,
        tier: Some(AwardTier::State),
        description: "State mathematics olympiad, second place".to_string(),
        files: vec![file(file_id, "diploma.pdf")],
    }
}

/// A draft that passes every step's validation.
pub(super) fn complete_draft() -> Draft {
    let mut draft = Draft::empty();
    draft.degree = Some(Degree::Bachelor);
    draft.primary_major = Some(5);
    draft.additional_majors = [Some(7), None, None];
    draft.general = filled_general();
    draft.guardians = vec![
        filled_guardian(GuardianRelation::Father, 11),
        filled_guardian(GuardianRelation::Mother, 12),
    ];
    draft.educations = vec![filled_education(21)];
    draft.awards = vec![filled_award(31)];
    for (offset, slot) in DocumentSlot::ordered().into_iter().enumerate() {
        draft
            .other_documents
            .set(slot, Some(file(41 + offset as i64, slot.tag())));
    }
    draft
}

/// A previously submitted application mirroring [`complete_draft`], as the
/// backend would return it.
pub(super) fn saved_application() -> SavedApplication {
    SavedApplication {
        id: 900,
        degree: Degree::Bachelor,
        primary_major: 5,
        admission_major: vec![7],
        user: SavedUser {
            first_name: "Merdan".to_string(),
            last_name: "Annayev".to_string(),
            father_name: "Batyr".to_string(),
            gender: Gender::Male,
            nationality: "Turkmen".to_string(),
            date_of_birth: birth_date(),
            area: 2,
            address: "Ashgabat, Garashsyzlyk 12".to_string(),
            place_of_birth: "Ashgabat".to_string(),
            phone: "+99365123456".to_string(),
            home_phone: "12345".to_string(),
            email: "merdan.annayev@example.edu".to_string(),
        },
        guardians: vec![
            SavedGuardian {
                id: Some(71),
                relation: GuardianRelation::Father,
                first_name: "Batyr".to_string(),
                last_name: "Annayev".to_string(),
                father_name: "Soltan".to_string(),
                date_of_birth: guardian_birth_date(),
                place_of_birth: "Mary".to_string(),
                phone: Some("+99361234567".to_string()),
                address: Some("Ashgabat, Bitarap 4".to_string()),
                work_place: Some("Ashgabat textile complex".to_string()),
                is_deceased: Some(false),
                documents: vec![SavedDocument {
                    kind: "passport".to_string(),
                    file: file(11, "passport.pdf"),
                }],
            },
            SavedGuardian {
                id: Some(72),
                relation: GuardianRelation::Mother,
                first_name: "Aygul".to_string(),
                last_name: "Annayeva".to_string(),
                father_name: "Nury".to_string(),
                date_of_birth: guardian_birth_date(),
                place_of_birth: "Mary".to_string(),
                phone: Some("+99362345678".to_string()),
                address: Some("Ashgabat, Bitarap 4".to_string()),
                work_place: Some("City hospital 1".to_string()),
                is_deceased: Some(false),
                documents: vec![SavedDocument {
                    kind: "passport".to_string(),
                    file: file(12, "passport.pdf"),
                }],
            },
        ],
        institutions: vec![SavedInstitution {
            id: Some(81),
            name: "Ashgabat secondary school 27".to_string(),
            school_gpa: 4.3,
            graduated_year: 2024,
            certificates: vec![file(21, "certificate.pdf")],
        }],
        olympics: vec![SavedOlympic {
            id: Some(91),
            tier: AwardTier::State,
            description: "State mathematics olympiad, second place".to_string(),
            files: vec![file(31, "diploma.pdf")],
        }],
        documents: DocumentSlot::ordered()
            .into_iter()
            .enumerate()
            .map(|(offset, slot)| SavedDocument {
                kind: slot.tag().to_string(),
                file: file(41 + offset as i64, slot.tag()),
            })
            .collect(),
    }
}

#[derive(Default, Clone)]
struct CacheEntry {
    slices: HashMap<Step, SectionSlice>,
    position: Option<Step>,
    application_id: Option<i64>,
}

/// In-memory draft cache double mirroring browser session storage.
#[derive(Default)]
pub(super) struct MemoryCache {
    entries: Mutex<HashMap<SessionId, CacheEntry>>,
}

impl DraftCache for MemoryCache {
    fn put_slice(&self, session: &SessionId, slice: &SectionSlice) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let entry = entries.entry(session.clone()).or_default();
        entry.slices.insert(slice.step(), slice.clone());
        Ok(())
    }

    fn slices(&self, session: &SessionId) -> Result<Vec<SectionSlice>, CacheError> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        let Some(entry) = entries.get(session) else {
            return Ok(Vec::new());
        };
        Ok(Step::ordered()
            .into_iter()
            .filter_map(|step| entry.slices.get(&step).cloned())
            .collect())
    }

    fn put_position(&self, session: &SessionId, step: Step) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.entry(session.clone()).or_default().position = Some(step);
        Ok(())
    }

    fn position(&self, session: &SessionId) -> Result<Option<Step>, CacheError> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        Ok(entries.get(session).and_then(|entry| entry.position))
    }

    fn put_application(&self, session: &SessionId, application_id: i64) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.entry(session.clone()).or_default().application_id = Some(application_id);
        Ok(())
    }

    fn application(&self, session: &SessionId) -> Result<Option<i64>, CacheError> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        Ok(entries.get(session).and_then(|entry| entry.application_id))
    }

    fn clear(&self, session: &SessionId) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.remove(session);
        Ok(())
    }
}

impl MemoryCache {
    pub(super) fn slice_count(&self, session: &SessionId) -> usize {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries
            .get(session)
            .map(|entry| entry.slices.len())
            .unwrap_or(0)
    }
}

/// Upload gateway double minting deterministic file references.
#[derive(Default)]
pub(super) struct MemoryFiles {
    sequence: AtomicI64,
    fail_next: Mutex<bool>,
}

impl MemoryFiles {
    pub(super) fn fail_next(&self) {
        *self.fail_next.lock().expect("files mutex poisoned") = true;
    }
}

impl FileGateway for MemoryFiles {
    fn upload(
        &self,
        file_name: String,
        _bytes: Vec<u8>,
        document_tag: &'static str,
    ) -> impl std::future::Future<Output = Result<FileReference, GatewayError>> + Send {
        let fail = {
            let mut fail_next = self.fail_next.lock().expect("files mutex poisoned");
            std::mem::take(&mut *fail_next)
        };
        let result = if fail {
            Err(GatewayError::Transport("upload interrupted".to_string()))
        } else {
            let id = 1000 + self.sequence.fetch_add(1, Ordering::Relaxed);
            Ok(FileReference {
                id,
                path: format!("uploads/{document_tag}/{id}/{file_name}"),
                name: file_name,
            })
        };
        async move { result }
    }
}

/// Applications gateway double recording saved payloads.
#[derive(Default)]
pub(super) struct MemoryApplications {
    sequence: AtomicI64,
    records: Mutex<HashMap<i64, SavedApplication>>,
    saved: Mutex<Vec<ApplicationPayload>>,
    fail_next: Mutex<bool>,
}

impl MemoryApplications {
    pub(super) fn seed(&self, record: SavedApplication) {
        self.records
            .lock()
            .expect("applications mutex poisoned")
            .insert(record.id, record);
    }

    pub(super) fn saved_payloads(&self) -> Vec<ApplicationPayload> {
        self.saved
            .lock()
            .expect("applications mutex poisoned")
            .clone()
    }

    pub(super) fn fail_next(&self) {
        *self.fail_next.lock().expect("applications mutex poisoned") = true;
    }
}

impl ApplicationsGateway for MemoryApplications {
    fn save(
        &self,
        payload: &ApplicationPayload,
    ) -> impl std::future::Future<Output = Result<ApplicationAck, GatewayError>> + Send {
        let fail = {
            let mut fail_next = self.fail_next.lock().expect("applications mutex poisoned");
            std::mem::take(&mut *fail_next)
        };
        let result = if fail {
            Err(GatewayError::Transport("backend offline".to_string()))
        } else {
            let id = payload
                .id
                .unwrap_or_else(|| 500 + self.sequence.fetch_add(1, Ordering::Relaxed));
            self.saved
                .lock()
                .expect("applications mutex poisoned")
                .push(payload.clone());
            Ok(ApplicationAck { id })
        };
        async move { result }
    }

    fn fetch(
        &self,
        application_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<SavedApplication>, GatewayError>> + Send
    {
        let result = Ok(self
            .records
            .lock()
            .expect("applications mutex poisoned")
            .get(&application_id)
            .cloned());
        async move { result }
    }
}

pub(super) type TestService = WizardService<MemoryCache, MemoryFiles, MemoryApplications>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryCache>,
    Arc<MemoryFiles>,
    Arc<MemoryApplications>,
) {
    let cache = Arc::new(MemoryCache::default());
    let files = Arc::new(MemoryFiles::default());
    let applications = Arc::new(MemoryApplications::default());
    let service = Arc::new(WizardService::new(
        cache.clone(),
        files.clone(),
        applications.clone(),
    ));
    (service, cache, files, applications)
}
