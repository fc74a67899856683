//! The model run lifecycle: composing the request, calling the gateway and
//! routing the response into an outcome or a notice.

use crate::error::{GatewayError, RunnerError};
use crate::gateway::{BlockNumber, ModelGateway, RunError, RunRequest, RunResponse};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};

pub const RUN_FAILED_NOTICE: &str = "Error while running model";
const NOTICE_DURATION: Duration = Duration::from_secs(10);

/// Which version of a model to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelVersion {
    #[default]
    Latest,
    Pinned(String),
}

impl FromStr for ModelVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "latest" => ModelVersion::Latest,
            pinned => ModelVersion::Pinned(pinned.to_string()),
        })
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVersion::Latest => write!(f, "latest"),
            ModelVersion::Pinned(v) => write!(f, "{}", v),
        }
    }
}

/// Advanced run settings. A chain id of 0 is sent as chain 1 and block 0 as
/// the latest block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub chain_id: u64,
    pub block_number: BlockNumber,
    pub version: ModelVersion,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            block_number: BlockNumber::Latest,
            version: ModelVersion::Latest,
        }
    }
}

impl RunConfig {
    pub fn request(&self, slug: &str, input: Value) -> RunRequest {
        RunRequest {
            slug: slug.to_string(),
            chain_id: if self.chain_id == 0 { 1 } else { self.chain_id },
            block_number: match self.block_number {
                BlockNumber::Number(0) => BlockNumber::Latest,
                block => block,
            },
            version: match &self.version {
                ModelVersion::Latest => None,
                ModelVersion::Pinned(v) => Some(v.clone()),
            },
            input,
        }
    }
}

/// The result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success(Value),
    Failure(RunError),
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub duration: Duration,
}

impl Notice {
    fn run_failed() -> Self {
        Self {
            title: RUN_FAILED_NOTICE.to_string(),
            duration: NOTICE_DURATION,
        }
    }
}

#[derive(Debug, Default)]
struct RunState {
    config: RunConfig,
    outcome: Option<RunOutcome>,
    notices: Vec<Notice>,
}

/// Runs one model through a gateway.
///
/// Every run starts a new generation. A response belonging to an older
/// generation is dropped, so a slow response can never overwrite a newer one.
pub struct ModelRunner {
    gateway: Arc<dyn ModelGateway>,
    slug: String,
    generation: AtomicU64,
    state: Mutex<RunState>,
}

impl ModelRunner {
    pub fn new(gateway: Arc<dyn ModelGateway>, slug: impl Into<String>) -> Self {
        Self {
            gateway,
            slug: slug.into(),
            generation: AtomicU64::new(0),
            state: Mutex::new(RunState::default()),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn config(&self) -> RunConfig {
        self.state().config.clone()
    }

    pub fn set_config(&self, config: RunConfig) {
        self.state().config = config;
    }

    /// The outcome of the latest completed run, if it has not been cleared.
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.state().outcome.clone()
    }

    /// Drains pending notices.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state().notices)
    }

    /// Switches to another model: default config, no outcome, and any
    /// in-flight run is superseded.
    pub fn reset(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.config = RunConfig::default();
        state.outcome = None;
    }

    pub async fn run(&self, input: Value) -> Result<RunOutcome, RunnerError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let request = {
            let mut state = self.state();
            state.outcome = None;
            state.config.request(&self.slug, input)
        };
        info!(
            slug = %request.slug,
            chain_id = request.chain_id,
            block_number = %request.block_number,
            generation,
            "running model"
        );

        let response = self.gateway.run_model(&request).await;

        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            warn!(generation, current, "discarding response of a superseded run");
            return Err(RunnerError::Superseded {
                generation,
                current,
            });
        }
        self.settle(response)
    }

    fn settle(&self, response: Result<RunResponse, GatewayError>) -> Result<RunOutcome, RunnerError> {
        let mut state = self.state();
        let outcome = match response {
            Ok(RunResponse {
                error: Some(run_error),
                ..
            }) => {
                error!(
                    slug = %self.slug,
                    code = run_error.code.as_deref().unwrap_or("-"),
                    message = run_error.message.as_deref().unwrap_or(""),
                    "model run failed"
                );
                state.notices.push(Notice::run_failed());
                RunOutcome::Failure(run_error)
            }
            Ok(RunResponse { output, .. }) => {
                info!(slug = %self.slug, "model run succeeded");
                RunOutcome::Success(output)
            }
            Err(e) => {
                error!(slug = %self.slug, error = %e, "model run request failed");
                state.notices.push(Notice::run_failed());
                return Err(e.into());
            }
        };
        state.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
