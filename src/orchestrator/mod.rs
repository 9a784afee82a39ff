//! Remote job orchestration: submit, poll to a terminal state, extract.
//!
//! One [`JobOrchestrator::run`] call owns one remote prediction from creation
//! to terminal state. Nothing is shared between runs, so independent runs may
//! be driven concurrently.
pub mod job;
pub mod poll;

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::credential::Credential;
use crate::error::{AppError, AppResult};
use crate::image::ImagePayload;
use crate::prompt::{ProcessingParams, PromptComposer, RequestTemplate};
use crate::replicate::{Prediction, PredictionApi, PredictionStatus};

pub use job::{JobHandle, JobState};
pub use poll::{poll_until, PollOutcome, PollPolicy};

pub struct JobOrchestrator {
    api: Arc<dyn PredictionApi>,
    policy: PollPolicy,
    default_credential: Option<Credential>,
    composer: PromptComposer,
}

impl JobOrchestrator {
    pub fn new(api: Arc<dyn PredictionApi>, policy: PollPolicy, default_credential: Option<Credential>) -> Self {
        JobOrchestrator {
            api,
            policy,
            default_credential,
            composer: PromptComposer::new(),
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn api(&self) -> &Arc<dyn PredictionApi> {
        &self.api
    }

    pub fn default_credential(&self) -> Option<&Credential> {
        self.default_credential.as_ref()
    }

    /// Compose `params` and run the resulting job.
    pub async fn generate(
        &self,
        image: &ImagePayload,
        params: &ProcessingParams,
        credential: Option<&Credential>,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let template = self.composer.compose(params);
        self.run(image, &template, credential, cancel).await
    }

    /// Submit one job and drive it to a terminal state. Returns the URL of
    /// the first output on success.
    pub async fn run(
        &self,
        image: &ImagePayload,
        template: &RequestTemplate,
        credential: Option<&Credential>,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.run_tracked(image, template, credential, cancel).await.1
    }

    /// Same as [`run`](Self::run) but also hands back the job handle with the
    /// last observed state. The handle is `None` when nothing was submitted.
    pub async fn run_tracked(
        &self,
        image: &ImagePayload,
        template: &RequestTemplate,
        credential: Option<&Credential>,
        cancel: &CancellationToken,
    ) -> (Option<JobHandle>, AppResult<String>) {
        let credential = match Credential::resolve(credential, self.default_credential.as_ref()) {
            Ok(c) => c,
            Err(e) => return (None, Err(e)),
        };
        if cancel.is_cancelled() {
            return (None, Err(AppError::Cancelled));
        }

        let request = template.to_request(image);
        let created = match self.api.create_prediction(&credential, &request).await {
            Ok(p) => p,
            Err(e) => return (None, Err(e)),
        };
        let mut handle = JobHandle::new(created.id.clone());
        tracing::info!(job_id = %handle.id, style = template.style.key(), "Job submitted");

        let result = if created.status.is_terminal() {
            self.resolve(&mut handle, created)
        } else {
            self.poll_job(&mut handle, &credential, cancel).await
        };
        (Some(handle), result)
    }

    async fn poll_job(
        &self,
        handle: &mut JobHandle,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let api = self.api.as_ref();
        let job_id = handle.id.clone();
        let id = job_id.as_str();
        let outcome = {
            let tracked = Mutex::new(&mut *handle);
            let tracked = &tracked;
            poll_until(&self.policy, cancel, move |attempt| async move {
                let prediction = api.get_prediction(credential, id).await?;
                tracing::debug!(job_id = %id, attempt, status = ?prediction.status, "Polled job");
                if let Ok(mut h) = tracked.lock() {
                    h.transition(JobState::Polling { attempt });
                }
                Ok(if prediction.status.is_terminal() { Some(prediction) } else { None })
            })
            .await
        };

        match outcome {
            Ok(PollOutcome::Done { value, .. }) => self.resolve(handle, value),
            Ok(PollOutcome::Exhausted { attempts }) => {
                handle.transition(JobState::TimedOut);
                tracing::warn!(job_id = %handle.id, attempts, "Job timed out");
                Err(AppError::TimedOut { attempts })
            }
            Ok(PollOutcome::Cancelled { attempts }) => {
                handle.transition(JobState::Cancelled);
                tracing::info!(job_id = %handle.id, attempts, "Job cancelled");
                if let Err(e) = self.api.cancel_prediction(credential, &handle.id).await {
                    tracing::warn!(job_id = %handle.id, error = %e, "Remote cancel failed");
                }
                Err(AppError::Cancelled)
            }
            Err(e) => {
                handle.transition(JobState::TransportError);
                tracing::error!(job_id = %handle.id, error = %e, "Status query failed");
                Err(e)
            }
        }
    }

    fn resolve(&self, handle: &mut JobHandle, prediction: Prediction) -> AppResult<String> {
        match prediction.status {
            PredictionStatus::Succeeded => {
                handle.transition(JobState::Succeeded);
                let output = prediction
                    .first_output()
                    .ok_or_else(|| AppError::MissingOutput { job_id: handle.id.clone() })?;
                tracing::info!(job_id = %handle.id, %output, "Job succeeded");
                Ok(output)
            }
            _ => {
                handle.transition(JobState::Failed);
                let detail = prediction.error_detail();
                tracing::warn!(job_id = %handle.id, %detail, "Job failed");
                Err(AppError::RemoteFailure { detail })
            }
        }
    }
}
