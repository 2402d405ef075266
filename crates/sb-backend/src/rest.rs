//! REST client for a hosted signing service.
//!
//! Wire format: JSON bodies with base64-encoded binary fields, bearer
//! token authentication. HTTP 4xx responses are backend rejections (the
//! request reached the service and was refused), 5xx responses are
//! protocol errors, and connection-level failures are transport errors.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use sb_core::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BackendError, BackendResult};
use crate::provider::SigningBackend;
use crate::types::{
    ArtifactRef, CompletedSignature, SignaturePolicy, SignatureReport, SignatureToken,
    StartSignatureRequest, StartedSignature, SignerCertificateInfo,
};
use async_trait::async_trait;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// REST implementation of [`SigningBackend`].
pub struct RestSigningBackend {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RestSigningBackend {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> BackendResult<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the HTTP client cannot be
    /// constructed.
    pub fn with_timeout(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> BackendResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Protocol(format!("invalid endpoint {path}: {e}")))
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> BackendResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "signing backend request");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(map_status(status, message));
        }

        Ok(response.json::<Resp>().await?)
    }
}

/// Maps an unsuccessful HTTP status to a backend error.
fn map_status(status: StatusCode, message: String) -> BackendError {
    if status.is_client_error() {
        BackendError::Rejected(message)
    } else {
        BackendError::Protocol(format!("{status}: {message}"))
    }
}

#[async_trait]
impl SigningBackend for RestSigningBackend {
    async fn start_signature(
        &self,
        request: &StartSignatureRequest,
    ) -> BackendResult<StartedSignature> {
        let response: StartResponseWire = self.post("signatures/start", request).await?;
        response.try_into()
    }

    async fn complete_signature(
        &self,
        token: &SignatureToken,
        raw_signature: &[u8],
    ) -> BackendResult<CompletedSignature> {
        let body = CompleteRequestWire {
            token: token.as_str().to_string(),
            raw_signature: BASE64.encode(raw_signature),
        };
        let response: CompleteResponseWire = self.post("signatures/complete", &body).await?;
        Ok(CompletedSignature {
            artifact: ArtifactRef(response.artifact),
            signer: response.signer,
        })
    }

    async fn open_signature(
        &self,
        artifact: &ArtifactRef,
        policy: SignaturePolicy,
    ) -> BackendResult<SignatureReport> {
        let body = OpenRequestWire {
            artifact: artifact.as_str().to_string(),
            policy,
        };
        self.post("signatures/open", &body).await
    }
}

/// Error body returned by the service on rejections.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StartResponseWire {
    token: String,
    data_to_sign: String,
    digest_algorithm: String,
}

impl TryFrom<StartResponseWire> for StartedSignature {
    type Error = BackendError;

    fn try_from(wire: StartResponseWire) -> BackendResult<Self> {
        let data_to_sign = BASE64
            .decode(&wire.data_to_sign)
            .map_err(|e| BackendError::Protocol(format!("invalid data-to-sign encoding: {e}")))?;
        let digest_algorithm: DigestAlgorithm = wire
            .digest_algorithm
            .parse()
            .map_err(BackendError::Protocol)?;
        Ok(Self {
            token: SignatureToken(wire.token),
            data_to_sign,
            digest_algorithm,
        })
    }
}

#[derive(Debug, Serialize)]
struct CompleteRequestWire {
    token: String,
    raw_signature: String,
}

#[derive(Debug, Deserialize)]
struct CompleteResponseWire {
    artifact: String,
    signer: SignerCertificateInfo,
}

#[derive(Debug, Serialize)]
struct OpenRequestWire {
    artifact: String,
    policy: SignaturePolicy,
}
