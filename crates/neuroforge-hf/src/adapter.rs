use std::{
    collections::HashMap,
    env,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use neuroforge_core::{
    InferenceEngine, NeuroError, Result, Task,
    analysis::CONFLICT_PROBE_LABELS,
    engine::{AnalysisInput, EngineFuture, GenerationConfig, LabelScore, ProgressFn},
};

use crate::{
    api::{
        ClassificationRequest, ClassificationResponse, GenerationRequest, GenerationResponse,
        ZeroShotRequest, ZeroShotResponse,
    },
    client::HfClient,
    error::HfError,
};

const WARM_UP_INPUT: &str = "Hello";

/// How long a cold model may take to come up on the hosted API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(120),
        }
    }
}

/// [`InferenceEngine`] talking to the hosted Inference API.
///
/// The API itself is stateless; "loading" a model means warming it up
/// until it answers and remembering which model serves which task.
pub struct HfEngine {
    pub(crate) client: Arc<HfClient>,
    pipelines: RwLock<HashMap<Task, String>>,
    policy: LoadPolicy,
}

impl HfEngine {
    pub fn new(client: HfClient, policy: LoadPolicy) -> Self {
        Self {
            client: Arc::new(client),
            pipelines: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Model currently serving `task`.
    pub fn model_for(&self, task: Task) -> Option<String> {
        self.pipelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&task)
            .cloned()
    }

    fn require(&self, task: Task) -> Result<String> {
        self.model_for(task).ok_or(NeuroError::ModelNotLoaded { task })
    }

    fn bind(&self, task: Task, model_id: &str) {
        self.pipelines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task, model_id.to_owned());
    }

    fn unbind(&self, task: Task) {
        self.pipelines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&task);
    }

    async fn warm_up(&self, task: Task, model_id: &str, on_progress: &ProgressFn) -> Result<()> {
        let client = Arc::clone(&self.client);
        let policy = &self.policy;

        let result = match task {
            Task::Generator => {
                let config = GenerationConfig {
                    temperature: 1.0,
                    max_tokens: 1,
                };
                let request = GenerationRequest::new(WARM_UP_INPUT, config);
                client.warm_up(model_id, &request, policy, on_progress).await
            }
            Task::Classifier => {
                let request = ClassificationRequest {
                    inputs: WARM_UP_INPUT,
                };
                client.warm_up(model_id, &request, policy, on_progress).await
            }
            Task::ConflictDetector => {
                let request = ZeroShotRequest::new(WARM_UP_INPUT, &CONFLICT_PROBE_LABELS);
                client.warm_up(model_id, &request, policy, on_progress).await
            }
        };

        result.map_err(|err| NeuroError::LoadFailed {
            task,
            model_id: model_id.to_owned(),
            reason: err.to_string(),
        })?;

        self.bind(task, model_id);
        tracing::debug!(%task, model_id, "model is warm");
        Ok(())
    }
}

impl InferenceEngine for HfEngine {
    fn is_model_loaded(&self, task: Task) -> bool {
        self.model_for(task).is_some()
    }

    fn load_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move { self.warm_up(task, model_id, &on_progress).await })
    }

    fn set_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            self.unbind(task);
            self.warm_up(task, model_id, &on_progress).await
        })
    }

    fn generate<'a>(&'a self, prompt: &'a str, config: GenerationConfig) -> EngineFuture<'a, String> {
        let client = Arc::clone(&self.client);

        Box::pin(async move {
            let model_id = self.require(Task::Generator)?;
            let request = GenerationRequest::new(prompt, config);

            let response: GenerationResponse = client
                .infer(&model_id, &request)
                .await
                .map_err(|err| err.for_task(Task::Generator))?;

            response
                .into_completion(prompt)
                .map_err(|err| err.for_task(Task::Generator))
        })
    }

    fn analyze<'a>(&'a self, task: Task, input: AnalysisInput<'a>) -> EngineFuture<'a, Vec<LabelScore>> {
        let client = Arc::clone(&self.client);

        Box::pin(async move {
            let model_id = self.require(task)?;

            let scores = match input {
                AnalysisInput::Text(text) => {
                    let request = ClassificationRequest { inputs: text };
                    client
                        .infer::<_, ClassificationResponse>(&model_id, &request)
                        .await
                        .and_then(ClassificationResponse::into_scores)
                }
                AnalysisInput::ZeroShot {
                    text,
                    candidate_labels,
                } => {
                    let request = ZeroShotRequest::new(text, candidate_labels);
                    client
                        .infer::<_, ZeroShotResponse>(&model_id, &request)
                        .await
                        .and_then(ZeroShotResponse::into_scores)
                }
            };

            scores.map_err(|err: HfError| err.for_task(task))
        })
    }
}

/// Builder for [`HfEngine`].
///
/// ```rust,no_run
/// use std::time::Duration;
/// use neuroforge_hf::{HfEngineBuilder, LoadPolicy};
///
/// let engine = HfEngineBuilder::new_from_env()
///     .with_load_policy(LoadPolicy {
///         poll_interval: Duration::from_secs(1),
///         max_wait: Duration::from_secs(60),
///     })
///     .build()
///     .expect("HF_API_TOKEN must be set");
/// ```
#[derive(Default)]
pub struct HfEngineBuilder {
    pub(crate) token: Option<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) policy: Option<LoadPolicy>,
}

impl HfEngineBuilder {
    /// Create an *empty* builder. Remember to supply a token manually.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `HF_API_TOKEN` and the optional `HF_INFERENCE_URL` from the
    /// environment.
    ///
    /// # Panics
    ///
    /// Never panics. A missing token only surfaces during [`Self::build`].
    pub fn new_from_env() -> Self {
        Self {
            token: env::var("HF_API_TOKEN").ok(),
            base_url: env::var("HF_INFERENCE_URL").ok(),
            policy: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_load_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// # Errors
    ///
    /// * [`NeuroError::InvalidSettings`] – if the token is missing.
    /// * [`NeuroError::Backend`] – if the HTTP client cannot be built.
    pub fn build(self) -> Result<HfEngine> {
        let token = self.token.ok_or(NeuroError::InvalidSettings(
            "missing env variable: `HF_API_TOKEN`".into(),
        ))?;

        let mut client = HfClient::new(token)?;
        if let Some(base_url) = self.base_url {
            client = client.with_base_url(base_url);
        }

        Ok(HfEngine::new(client, self.policy.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HfEngine {
        HfEngineBuilder::new()
            .with_token("hf_test")
            .with_base_url("http://127.0.0.1:9/models/")
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_a_token() {
        let err = HfEngineBuilder::new().build().err().unwrap();
        assert!(matches!(err, NeuroError::InvalidSettings(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_the_base_url() {
        assert_eq!(engine().client.base_url(), "http://127.0.0.1:9/models");
    }

    #[tokio::test]
    async fn inference_without_a_warm_model_is_rejected() {
        let engine = engine();
        assert!(!engine.is_model_loaded(Task::Classifier));

        let err = engine
            .analyze(Task::Classifier, AnalysisInput::Text("hello there"))
            .await
            .unwrap_err();
        assert!(matches!(err, NeuroError::ModelNotLoaded { task: Task::Classifier }));

        let config = GenerationConfig {
            temperature: 0.8,
            max_tokens: 50,
        };
        let err = engine.generate("hello", config).await.unwrap_err();
        assert!(matches!(err, NeuroError::ModelNotLoaded { task: Task::Generator }));
    }

    #[test]
    fn swapping_unbinds_the_previous_model() {
        let engine = engine();
        engine.bind(Task::Classifier, "unitary/toxic-bert");
        assert_eq!(engine.model_for(Task::Classifier).as_deref(), Some("unitary/toxic-bert"));

        engine.unbind(Task::Classifier);
        assert!(!engine.is_model_loaded(Task::Classifier));
    }
}
