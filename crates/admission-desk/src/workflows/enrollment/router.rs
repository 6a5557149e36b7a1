use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::SessionId;
use super::gateway::{ApplicationsGateway, FileGateway, GatewayError};
use super::service::{WizardError, WizardService};
use super::store::{DraftCache, SectionPatch};
use super::upload::{FieldKey, UploadError};

/// Router builder exposing the wizard to the surrounding UI layer.
pub fn enrollment_router<C, F, A>(service: Arc<WizardService<C, F, A>>) -> Router
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/enrollment/sessions",
            post(open_handler::<C, F, A>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id",
            get(snapshot_handler::<C, F, A>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/section",
            put(patch_handler::<C, F, A>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/advance",
            post(advance_handler::<C, F, A>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/back",
            post(back_handler::<C, F, A>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/documents",
            post(upload_handler::<C, F, A>).delete(clear_handler::<C, F, A>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/submit",
            post(submit_handler::<C, F, A>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenSessionRequest {
    #[serde(default)]
    application_id: Option<i64>,
}

pub(crate) async fn open_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    body: Option<Json<OpenSessionRequest>>,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    let request = body.map(|Json(request)| request).unwrap_or_default();
    match service.open(request.application_id).await {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn snapshot_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    match service.resume(&SessionId(session_id)) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn patch_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    Path(session_id): Path<String>,
    Json(patch): Json<SectionPatch>,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    match service.apply_patch(&SessionId(session_id), patch) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    match service.advance(&SessionId(session_id)) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn back_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    match service.back(&SessionId(session_id)) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn upload_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    let session = SessionId(session_id);
    let mut field_key: Option<FieldKey> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    loop {
        let part = match multipart.next_field().await {
            Ok(Some(part)) => part,
            Ok(None) => break,
            Err(err) => return bad_request(format!("malformed multipart body: {err}")),
        };
        let name = part.name().map(str::to_string);
        match name.as_deref() {
            Some("field") => {
                let text = match part.text().await {
                    Ok(text) => text,
                    Err(err) => return bad_request(format!("unreadable field part: {err}")),
                };
                match serde_json::from_str(&text) {
                    Ok(key) => field_key = Some(key),
                    Err(err) => return bad_request(format!("invalid field key: {err}")),
                }
            }
            Some("file") => {
                let file_name = part.file_name().unwrap_or("upload.bin").to_string();
                let bytes = match part.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => return bad_request(format!("unreadable file part: {err}")),
                };
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let Some(field_key) = field_key else {
        return bad_request("missing 'field' part".to_string());
    };
    let Some((file_name, bytes)) = file else {
        return bad_request("missing 'file' part".to_string());
    };

    match service.upload(&session, field_key, file_name, bytes).await {
        Ok(outcome) => (StatusCode::OK, Json(json!({ "outcome": outcome }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn clear_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    Path(session_id): Path<String>,
    Json(field): Json<FieldKey>,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    match service.clear_field(&SessionId(session_id), &field) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<C, F, A>(
    State(service): State<Arc<WizardService<C, F, A>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: DraftCache + 'static,
    F: FileGateway + 'static,
    A: ApplicationsGateway + 'static,
{
    match service.submit(&SessionId(session_id)).await {
        Ok(receipt) => (StatusCode::ACCEPTED, Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn error_response(error: WizardError) -> Response {
    let status = match &error {
        WizardError::UnknownSession(_) => StatusCode::NOT_FOUND,
        WizardError::Validation(_) | WizardError::Assemble(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::Upload(UploadError::AlreadyInFlight { .. }) => StatusCode::CONFLICT,
        WizardError::Upload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::Gateway(GatewayError::SessionExpired) => StatusCode::UNAUTHORIZED,
        WizardError::Gateway(_) => StatusCode::BAD_GATEWAY,
        WizardError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        WizardError::AlreadySubmitted
        | WizardError::AtFinalStep
        | WizardError::NotAtFinalStep => StatusCode::CONFLICT,
    };

    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
