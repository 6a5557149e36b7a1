use std::future::Future;

use serde::{Deserialize, Serialize};

use super::assemble::{ApplicationPayload, SavedApplication};
use super::domain::FileReference;

/// Errors crossing the backend boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("session expired; authentication is required again")]
    SessionExpired,
    #[error("backend transport failure: {0}")]
    Transport(String),
}

/// Acknowledgment returned by the applications endpoint after a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationAck {
    pub id: i64,
}

/// Upload endpoint boundary: raw file bytes plus a document type tag in,
/// a server-minted [`FileReference`] out.
pub trait FileGateway: Send + Sync {
    fn upload(
        &self,
        file_name: String,
        bytes: Vec<u8>,
        document_tag: &'static str,
    ) -> impl Future<Output = Result<FileReference, GatewayError>> + Send;
}

/// Applications endpoint boundary: save (create or update) an assembled
/// payload, and fetch a previously submitted application for hydration.
pub trait ApplicationsGateway: Send + Sync {
    fn save(
        &self,
        payload: &ApplicationPayload,
    ) -> impl Future<Output = Result<ApplicationAck, GatewayError>> + Send;

    fn fetch(
        &self,
        application_id: i64,
    ) -> impl Future<Output = Result<Option<SavedApplication>, GatewayError>> + Send;
}
