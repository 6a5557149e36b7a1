use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

use super::assemble::{assemble, AssembleError};
use super::domain::{Draft, FileReference, SessionId, Step};
use super::gateway::{ApplicationsGateway, FileGateway, GatewayError};
use super::navigator::{NavigationError, WizardNavigator, WizardState};
use super::store::{CacheError, DraftCache, DraftStore, SectionPatch};
use super::upload::{FieldKey, UploadCoordinator, UploadError, UploadPhase, UploadTicket};
use super::validate::{validate_all, ValidationError};

/// Error raised by the wizard service.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("unknown session '{0}'")]
    UnknownSession(SessionId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error("the wizard has already been submitted")]
    AlreadySubmitted,
    #[error("already at the final step; submission completes the wizard")]
    AtFinalStep,
    #[error("submission is only available from the final step")]
    NotAtFinalStep,
}

impl From<NavigationError> for WizardError {
    fn from(value: NavigationError) -> Self {
        match value {
            NavigationError::Validation(err) => Self::Validation(err),
            NavigationError::Cache(err) => Self::Cache(err),
            NavigationError::AlreadySubmitted => Self::AlreadySubmitted,
            NavigationError::AtFinalStep => Self::AtFinalStep,
        }
    }
}

/// Serializable view of one session's state for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub session_id: SessionId,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<i64>,
    pub draft: Draft,
}

/// What happened to a settled upload response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The response belonged to the current attempt and was attached.
    Applied,
    /// The response arrived after its field moved on and was dropped.
    Discarded,
}

/// Returned once the backend acknowledges the final save.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub session_id: SessionId,
    pub application_id: i64,
}

struct WizardSession {
    store: DraftStore,
    navigator: WizardNavigator,
    uploads: UploadCoordinator,
    application_id: Option<i64>,
}

impl WizardSession {
    fn snapshot(&self, id: &SessionId) -> WizardSnapshot {
        let (state, step) = match self.navigator.state() {
            WizardState::Editing(step) => ("editing", Some(step)),
            WizardState::Submitted => ("submitted", None),
        };
        WizardSnapshot {
            session_id: id.clone(),
            state,
            step,
            application_id: self.application_id,
            draft: self.store.draft().clone(),
        }
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("wiz-{id:06}"))
}

/// Facade composing the draft store, upload coordinator, validator, and
/// navigator for any number of concurrent wizard sessions. All state
/// mutation happens under the session lock; the only awaits are gateway
/// calls, which run with the lock released so a late response re-enters
/// through the epoch guard like any other interleaved callback.
pub struct WizardService<C, F, A> {
    cache: Arc<C>,
    files: Arc<F>,
    applications: Arc<A>,
    sessions: Mutex<HashMap<SessionId, WizardSession>>,
}

impl<C, F, A> WizardService<C, F, A>
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    pub fn new(cache: Arc<C>, files: Arc<F>, applications: Arc<A>) -> Self {
        Self {
            cache,
            files,
            applications,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a fresh session, optionally seeded from a previously submitted
    /// application fetched from the backend.
    pub async fn open(&self, application_id: Option<i64>) -> Result<WizardSnapshot, WizardError> {
        let saved = match application_id {
            Some(id) => self.applications.fetch(id).await?,
            None => None,
        };

        let id = next_session_id();
        let mut store = DraftStore::new();
        store.hydrate(saved.as_ref(), Vec::new());
        let application_id = saved.as_ref().map(|application| application.id);
        if let Some(application_id) = application_id {
            self.cache.put_application(&id, application_id)?;
        }

        let session = WizardSession {
            store,
            navigator: WizardNavigator::new(),
            uploads: UploadCoordinator::new(),
            application_id,
        };
        let snapshot = session.snapshot(&id);
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(id, session);
        Ok(snapshot)
    }

    /// Return the live session, or rebuild it from the draft cache. Cached
    /// slices are the current editing session's own writes, so they take
    /// priority; nothing is re-fetched from the backend here.
    pub fn resume(&self, id: &SessionId) -> Result<WizardSnapshot, WizardError> {
        {
            let sessions = self.sessions.lock().expect("session mutex poisoned");
            if let Some(session) = sessions.get(id) {
                return Ok(session.snapshot(id));
            }
        }

        let slices = self.cache.slices(id)?;
        let position = self.cache.position(id)?;
        if slices.is_empty() && position.is_none() {
            return Err(WizardError::UnknownSession(id.clone()));
        }
        let application_id = self.cache.application(id)?;

        let mut store = DraftStore::new();
        store.hydrate(None, slices);
        let navigator = match position {
            Some(step) => WizardNavigator::at(step),
            None => WizardNavigator::new(),
        };
        let session = WizardSession {
            store,
            navigator,
            uploads: UploadCoordinator::new(),
            application_id,
        };
        let snapshot = session.snapshot(id);
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(id.clone(), session);
        Ok(snapshot)
    }

    pub fn snapshot(&self, id: &SessionId) -> Result<WizardSnapshot, WizardError> {
        self.with_session(id, |id, session| Ok(session.snapshot(id)))
    }

    /// Merge a partial update into one draft section.
    pub fn apply_patch(
        &self,
        id: &SessionId,
        patch: SectionPatch,
    ) -> Result<WizardSnapshot, WizardError> {
        self.with_session(id, |id, session| {
            if session.navigator.is_submitted() {
                return Err(WizardError::AlreadySubmitted);
            }
            session.store.apply_patch(patch);
            Ok(session.snapshot(id))
        })
    }

    /// Validate the current step and move forward, persisting the step's
    /// slice on success.
    pub fn advance(&self, id: &SessionId) -> Result<WizardSnapshot, WizardError> {
        self.with_session(id, |id, session| {
            session
                .navigator
                .advance(&session.store, self.cache.as_ref(), id)?;
            Ok(session.snapshot(id))
        })
    }

    pub fn back(&self, id: &SessionId) -> Result<WizardSnapshot, WizardError> {
        self.with_session(id, |id, session| {
            session.navigator.back(self.cache.as_ref(), id);
            Ok(session.snapshot(id))
        })
    }

    pub fn upload_state(
        &self,
        id: &SessionId,
        field: &FieldKey,
    ) -> Result<UploadPhase, WizardError> {
        self.with_session(id, |_, session| {
            if session.uploads.is_uploading(field) {
                Ok(UploadPhase::Uploading)
            } else if session.store.attached(field).is_some() {
                Ok(UploadPhase::Attached)
            } else {
                Ok(UploadPhase::Empty)
            }
        })
    }

    /// Stamp a field as uploading. Rejected when another transfer is in
    /// flight for the same field or the field does not exist in the draft.
    pub fn begin_upload(
        &self,
        id: &SessionId,
        field: FieldKey,
    ) -> Result<UploadTicket, WizardError> {
        self.with_session(id, |_, session| {
            if session.navigator.is_submitted() {
                return Err(WizardError::AlreadySubmitted);
            }
            if !session.store.field_exists(&field) {
                return Err(WizardError::Upload(UploadError::UnknownField { field }));
            }
            Ok(session.uploads.begin(field)?)
        })
    }

    /// Apply the outcome of a transfer started with [`Self::begin_upload`].
    /// A stale ticket is discarded without touching the draft; a failure
    /// settles the field back to empty so the user can retry.
    pub fn settle_upload(
        &self,
        id: &SessionId,
        ticket: &UploadTicket,
        result: Result<FileReference, GatewayError>,
    ) -> Result<UploadOutcome, WizardError> {
        self.with_session(id, |_, session| {
            if !session.uploads.settle(ticket) {
                return Ok(UploadOutcome::Discarded);
            }
            match result {
                Ok(file) => {
                    session.store.attach(ticket.field(), file)?;
                    Ok(UploadOutcome::Applied)
                }
                Err(err) => {
                    warn!(field = %ticket.field(), %err, "upload failed; field reverts to empty");
                    Err(WizardError::Gateway(err))
                }
            }
        })
    }

    /// Full upload flow: stamp the field, run the transfer through the file
    /// gateway without holding the session lock, then settle the result.
    pub async fn upload(
        &self,
        id: &SessionId,
        field: FieldKey,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, WizardError> {
        let ticket = self.begin_upload(id, field)?;
        let tag = ticket.field().document_tag();
        let result = self.files.upload(file_name, bytes, tag).await;
        self.settle_upload(id, &ticket, result)
    }

    /// Detach whatever the field holds and invalidate any in-flight
    /// transfer for it. No backend delete is issued.
    pub fn clear_field(
        &self,
        id: &SessionId,
        field: &FieldKey,
    ) -> Result<WizardSnapshot, WizardError> {
        self.with_session(id, |id, session| {
            session.uploads.invalidate(field);
            session.store.detach(field)?;
            Ok(session.snapshot(id))
        })
    }

    /// Validate the whole draft, assemble the backend payload, and save it.
    /// On acknowledgment the draft resets and the session becomes terminal;
    /// on failure the draft is left intact for another attempt.
    pub async fn submit(&self, id: &SessionId) -> Result<SubmissionReceipt, WizardError> {
        let payload = self.with_session(id, |_, session| {
            match session.navigator.state() {
                WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
                WizardState::Editing(step) if step != Step::last() => {
                    return Err(WizardError::NotAtFinalStep)
                }
                WizardState::Editing(_) => {}
            }
            validate_all(session.store.draft())?;
            Ok(assemble(session.store.draft(), session.application_id)?)
        })?;

        let ack = self.applications.save(&payload).await?;

        self.with_session(id, |id, session| {
            session.store.reset();
            session.uploads.reset();
            session.navigator.mark_submitted();
            if let Err(err) = self.cache.clear(id) {
                warn!(%id, %err, "failed to clear cached draft after submission");
            }
            info!(%id, application_id = ack.id, "application submitted");
            Ok(SubmissionReceipt {
                session_id: id.clone(),
                application_id: ack.id,
            })
        })
    }

    fn with_session<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&SessionId, &mut WizardSession) -> Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| WizardError::UnknownSession(id.clone()))?;
        f(id, session)
    }
}
