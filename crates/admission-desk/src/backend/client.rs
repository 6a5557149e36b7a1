use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::workflows::enrollment::{
    ApplicationAck, ApplicationPayload, ApplicationsGateway, FileGateway, FileReference,
    GatewayError, SavedApplication,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Access/refresh token pair issued by the backend's auth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// HTTP client for the admissions backend.
///
/// Requests carry a bearer token; a 401 triggers one silent token refresh
/// followed by a single retry of the original request. When the refresh
/// itself fails the stored tokens are cleared and
/// [`GatewayError::SessionExpired`] is surfaced so the caller can route the
/// user back to login.
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Mutex<Option<AuthTokens>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: Mutex::new(None),
        })
    }

    pub fn set_tokens(&self, tokens: AuthTokens) {
        *self.tokens.lock().expect("token mutex poisoned") = Some(tokens);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn access_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
    }

    async fn refresh(&self) -> Result<(), GatewayError> {
        let refresh_token = self.refresh_token().ok_or(GatewayError::SessionExpired)?;

        let response = self
            .client
            .post(self.url("/api/auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            *self.tokens.lock().expect("token mutex poisoned") = None;
            return Err(GatewayError::SessionExpired);
        }

        let tokens: AuthTokens = response
            .json()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        self.set_tokens(tokens);
        debug!("access token refreshed");
        Ok(())
    }

    /// Send an authorized request, refreshing the access token once on 401.
    /// The builder closure is invoked per attempt because request bodies
    /// (multipart forms in particular) cannot be cloned.
    async fn send_authorized<B>(&self, build: B) -> Result<Response, GatewayError>
    where
        B: Fn(&Client) -> Result<RequestBuilder, GatewayError>,
    {
        let mut refreshed = false;
        loop {
            let mut request = build(&self.client)?;
            if let Some(token) = self.access_token() {
                request = request.bearer_auth(token);
            }
            let response = request
                .send()
                .await
                .map_err(|err| GatewayError::Transport(err.to_string()))?;

            if response.status() == StatusCode::UNAUTHORIZED && !refreshed {
                refreshed = true;
                self.refresh().await?;
                continue;
            }
            return Ok(response);
        }
    }
}

impl FileGateway for ApiClient {
    fn upload(
        &self,
        file_name: String,
        bytes: Vec<u8>,
        document_tag: &'static str,
    ) -> impl Future<Output = Result<FileReference, GatewayError>> + Send {
        async move {
            let response = self
                .send_authorized(|client| {
                    let part = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime::APPLICATION_OCTET_STREAM.as_ref())
                        .map_err(|err| GatewayError::Transport(err.to_string()))?;
                    let form = reqwest::multipart::Form::new()
                        .part("file", part)
                        .text("type", document_tag);
                    Ok(client.post(self.url("/api/files")).multipart(form))
                })
                .await?;

            if !response.status().is_success() {
                return Err(GatewayError::Rejected(format!(
                    "upload returned {}",
                    response.status()
                )));
            }
            response
                .json::<FileReference>()
                .await
                .map_err(|err| GatewayError::Transport(err.to_string()))
        }
    }
}

impl ApplicationsGateway for ApiClient {
    fn save(
        &self,
        payload: &ApplicationPayload,
    ) -> impl Future<Output = Result<ApplicationAck, GatewayError>> + Send {
        async move {
            let response = self
                .send_authorized(|client| {
                    // an id means the application already exists server-side
                    let request = match payload.id {
                        Some(id) => client.put(self.url(&format!("/api/applications/{id}"))),
                        None => client.post(self.url("/api/applications")),
                    };
                    Ok(request.json(payload))
                })
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GatewayError::Rejected(format!(
                    "save returned {status}: {body}"
                )));
            }
            response
                .json::<ApplicationAck>()
                .await
                .map_err(|err| GatewayError::Transport(err.to_string()))
        }
    }

    fn fetch(
        &self,
        application_id: i64,
    ) -> impl Future<Output = Result<Option<SavedApplication>, GatewayError>> + Send {
        async move {
            let response = self
                .send_authorized(|client| {
                    Ok(client.get(self.url(&format!("/api/applications/{application_id}"))))
                })
                .await?;

            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !response.status().is_success() {
                return Err(GatewayError::Rejected(format!(
                    "fetch returned {}",
                    response.status()
                )));
            }
            response
                .json::<SavedApplication>()
                .await
                .map(Some)
                .map_err(|err| GatewayError::Transport(err.to_string()))
        }
    }
}
