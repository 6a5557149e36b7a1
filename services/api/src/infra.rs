use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use admission_desk::workflows::enrollment::{
    ApplicationAck, ApplicationPayload, ApplicationsGateway, CacheError, DraftCache, FileGateway,
    FileReference, GatewayError, SavedApplication, SavedDocument, SavedGuardian, SavedInstitution,
    SavedOlympic, SavedUser, SectionSlice, SessionId, Step,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
struct CacheEntry {
    slices: HashMap<Step, SectionSlice>,
    position: Option<Step>,
    application_id: Option<i64>,
}

/// Session-scoped draft cache held in process memory, standing in for the
/// browser session storage of the original intake flow.
#[derive(Default)]
pub(crate) struct InMemoryDraftCache {
    entries: Mutex<HashMap<SessionId, CacheEntry>>,
}

impl DraftCache for InMemoryDraftCache {
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

/// Upload endpoint double minting file references and remembering them so
/// the applications gateway can materialize saved records.
#[derive(Default)]
pub(crate) struct InMemoryFileGateway {
    sequence: AtomicI64,
    minted: Mutex<HashMap<i64, FileReference>>,
}

impl InMemoryFileGateway {
    pub(crate) fn resolve(&self, id: i64) -> Option<FileReference> {
        self.minted
            .lock()
            .expect("file registry mutex poisoned")
            .get(&id)
            .cloned()
    }
}

impl FileGateway for InMemoryFileGateway {
    fn upload(
        &self,
        file_name: String,
        bytes: Vec<u8>,
        document_tag: &'static str,
    ) -> impl std::future::Future<Output = Result<FileReference, GatewayError>> + Send {
        let result = if bytes.is_empty() {
            Err(GatewayError::Rejected("empty file".to_string()))
        } else {
            let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let reference = FileReference {
                id,
                path: format!("uploads/{document_tag}/{id}/{file_name}"),
                name: file_name,
            };
            self.minted
                .lock()
                .expect("file registry mutex poisoned")
                .insert(id, reference.clone());
            Ok(reference)
        };
        async move { result }
    }
}

/// Applications endpoint double storing materialized records so hydration
/// and round-trips work without a real backend.
pub(crate) struct InMemoryApplicationsGateway {
    sequence: AtomicI64,
    records: Mutex<HashMap<i64, SavedApplication>>,
    files: Arc<InMemoryFileGateway>,
}

impl InMemoryApplicationsGateway {
    pub(crate) fn new(files: Arc<InMemoryFileGateway>) -> Self {
        Self {
            sequence: AtomicI64::new(0),
            records: Mutex::new(HashMap::new()),
            files,
        }
    }

    fn store(&self, payload: &ApplicationPayload) -> Result<ApplicationAck, GatewayError> {
        let id = payload
            .id
            .unwrap_or_else(|| 1 + self.sequence.fetch_add(1, Ordering::Relaxed));
        let saved = self.materialize(payload, id)?;
        self.records
            .lock()
            .expect("records mutex poisoned")
            .insert(id, saved);
        Ok(ApplicationAck { id })
    }

    fn materialize(
        &self,
        payload: &ApplicationPayload,
        id: i64,
    ) -> Result<SavedApplication, GatewayError> {
        Ok(SavedApplication {
            id,
            degree: payload.degree,
            primary_major: payload.primary_major,
            admission_major: payload.admission_major.clone(),
            user: SavedUser {
                first_name: payload.user.first_name.clone(),
                last_name: payload.user.last_name.clone(),
                father_name: payload.user.father_name.clone(),
                gender: payload.user.gender,
                nationality: payload.user.nationality.clone(),
                date_of_birth: parse_payload_date(&payload.user.date_of_birth)?,
                area: payload.user.area,
                address: payload.user.address.clone(),
                place_of_birth: payload.user.place_of_birth.clone(),
                phone: payload.user.phone.clone(),
                home_phone: payload.user.home_phone.clone(),
                email: payload.user.email.clone(),
            },
            guardians: payload
                .guardians
                .iter()
                .map(|guardian| {
                    Ok(SavedGuardian {
                        id: guardian.id,
                        relation: guardian.relation,
                        first_name: guardian.first_name.clone(),
                        last_name: guardian.last_name.clone(),
                        father_name: guardian.father_name.clone(),
                        date_of_birth: parse_payload_date(&guardian.date_of_birth)?,
                        place_of_birth: guardian.place_of_birth.clone(),
                        phone: guardian.phone.clone(),
                        address: guardian.address.clone(),
                        work_place: guardian.work_place.clone(),
                        is_deceased: guardian.is_deceased,
                        documents: guardian
                            .documents
                            .iter()
                            .map(|document| SavedDocument {
                                kind: document.kind.clone(),
                                file: self.file_reference(document.file),
                            })
                            .collect(),
                    })
                })
                .collect::<Result<Vec<_>, GatewayError>>()?,
            institutions: payload
                .institutions
                .iter()
                .map(|institution| SavedInstitution {
                    id: institution.id,
                    name: institution.name.clone(),
                    school_gpa: institution.school_gpa,
                    graduated_year: institution.graduated_year,
                    certificates: institution
                        .certificates
                        .iter()
                        .map(|file_id| self.file_reference(*file_id))
                        .collect(),
                })
                .collect(),
            olympics: payload
                .olympics
                .iter()
                .map(|olympic| SavedOlympic {
                    id: olympic.id,
                    tier: olympic.tier,
                    description: olympic.description.clone(),
                    files: olympic
                        .files
                        .iter()
                        .map(|file_id| self.file_reference(*file_id))
                        .collect(),
                })
                .collect(),
            documents: payload
                .documents
                .iter()
                .map(|document| SavedDocument {
                    kind: document.kind.clone(),
                    file: self.file_reference(document.file),
                })
                .collect(),
        })
    }

    fn file_reference(&self, id: i64) -> FileReference {
        self.files.resolve(id).unwrap_or(FileReference {
            id,
            path: format!("uploads/{id}"),
            name: format!("file-{id}"),
        })
    }
}

impl ApplicationsGateway for InMemoryApplicationsGateway {
    fn save(
        &self,
        payload: &ApplicationPayload,
    ) -> impl std::future::Future<Output = Result<ApplicationAck, GatewayError>> + Send {
        let result = self.store(payload);
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
            .expect("records mutex poisoned")
            .get(&application_id)
            .cloned());
        async move { result }
    }
}

fn parse_payload_date(raw: &str) -> Result<NaiveDate, GatewayError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| GatewayError::Rejected(format!("invalid date '{raw}': {err}")))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
