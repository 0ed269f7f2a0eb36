use std::time::Duration;

use neuroforge_core::engine::ProgressFn;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::time::Instant;

use crate::{
    adapter::LoadPolicy,
    api::{LoadingStatus, loading_progress},
    error::HfError,
};

pub(crate) const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Minimal HTTP client for the hosted Inference API.
///
/// * One `POST {base}/{model_id}` per call, JSON in, JSON out.
/// * HTTP 503 with an `estimated_time` is reported as
///   [`HfError::ModelLoading`] so callers can poll.
/// * Shares a single `reqwest::Client`, so cloning `HfClient` is cheap.
#[derive(Clone)]
pub struct HfClient {
    token: String,
    http: HttpClient,
    base: String,
}

impl HfClient {
    /// Default `reqwest` client with a 30 s timeout and Rustls TLS.
    pub fn new(token: impl Into<String>) -> Result<Self, HfError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_http(token, http, None))
    }

    /// Build with a custom `reqwest::Client` in case the caller needs proxy
    /// settings, custom TLS, etc.
    pub fn with_http(token: impl Into<String>, http: HttpClient, base_url: Option<String>) -> Self {
        Self {
            token: token.into(),
            http,
            base: base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        }
    }

    /// Point the client at another deployment, e.g. a dedicated endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Run `request` against `model_id` and decode the answer.
    pub async fn infer<Req, Resp>(&self, model_id: &str, request: &Req) -> Result<Resp, HfError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base, model_id);
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            let body = resp.text().await.unwrap_or_default();
            return match serde_json::from_str::<LoadingStatus>(&body) {
                Ok(LoadingStatus {
                    estimated_time: Some(estimated_time),
                }) => Err(HfError::ModelLoading { estimated_time }),
                _ => Err(HfError::Api { status, body }),
            };
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HfError::Api { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: Resp = serde_json::from_slice(&bytes)?;
        Ok(parsed)
    }

    /// Send `request` until the model answers, reporting warm-up progress.
    ///
    /// While the API reports the model as loading, progress is the elapsed
    /// share of its estimate (at most 99) and the request is repeated every
    /// `policy.poll_interval`. Gives up with [`HfError::LoadTimeout`] after
    /// `policy.max_wait`.
    pub async fn warm_up<Req>(
        &self,
        model_id: &str,
        request: &Req,
        policy: &LoadPolicy,
        on_progress: &ProgressFn,
    ) -> Result<(), HfError>
    where
        Req: Serialize + ?Sized,
    {
        let started = Instant::now();
        on_progress(0.0);

        loop {
            match self.infer::<Req, serde_json::Value>(model_id, request).await {
                Ok(_) => {
                    on_progress(100.0);
                    return Ok(());
                }
                Err(HfError::ModelLoading { estimated_time }) => {
                    let waited = started.elapsed();
                    if waited >= policy.max_wait {
                        return Err(HfError::LoadTimeout {
                            model_id: model_id.to_owned(),
                            waited,
                        });
                    }

                    tracing::debug!(
                        model_id,
                        estimated_time,
                        waited_ms = waited.as_millis() as u64,
                        "model still loading"
                    );
                    on_progress(loading_progress(waited, estimated_time));
                    tokio::time::sleep(policy.poll_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
