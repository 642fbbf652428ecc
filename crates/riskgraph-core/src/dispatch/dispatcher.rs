//! Bounded fan-out of one subtask per category.
//!
//! Each category runs on tokio's blocking pool behind a semaphore sized by
//! [`DispatchConfig::workers`], so the pool size caps the number of external
//! calls in flight. Subtasks use the blocking retry mode with the per-category
//! policy. Results are collected in completion order; a failing category is
//! recorded and never cancels its siblings.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::capability::CapabilityResult;
use crate::dispatch::error::{CategoryFailure, DispatchError, DispatchResult};
use crate::metrics::METRICS;
use crate::retry::{retry_blocking, Pause, RetryPolicy, ThreadPause};

/// Work performed for one category. Runs on a blocking worker thread.
pub trait CategoryTask<C>: Send + Sync + 'static {
    type Output: Send + 'static;

    fn execute(&self, category: &C, entity: &str) -> CapabilityResult<Self::Output>;
}

/// Worker pool sizing and pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum number of concurrently running subtasks. Clamped to at least 1.
    pub workers: usize,
    /// Delay applied before every external call a subtask makes.
    pub pacing: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            pacing: Duration::ZERO,
        }
    }
}

impl DispatchConfig {
    pub const RISK_PACING: Duration = Duration::from_secs(7);

    /// Defaults for the risk domain: serial, paced at 7 s.
    pub fn risk() -> Self {
        Self {
            pacing: Self::RISK_PACING,
            ..Self::default()
        }
    }

    /// Defaults for the ESG domain: serial, unpaced.
    pub fn esg() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

/// A successful subtask.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCompletion<T> {
    pub category: String,
    pub payload: T,
    /// Wall-clock duration of the successful external call.
    pub elapsed: Duration,
}

/// Everything a dispatch produced, in completion order.
#[derive(Debug, Clone)]
pub struct DispatchReport<T> {
    pub completed: Vec<CategoryCompletion<T>>,
    pub failures: Vec<CategoryFailure>,
}

impl<T> DispatchReport<T> {
    pub fn payloads(&self) -> impl Iterator<Item = &T> {
        self.completed.iter().map(|c| &c.payload)
    }

    /// Successful payloads only, in completion order.
    pub fn into_payloads(self) -> Vec<T> {
        self.completed.into_iter().map(|c| c.payload).collect()
    }

    pub fn all_failed(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn failed_categories(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.category.as_str()).collect()
    }
}

/// Runs one subtask per category against a shared entity.
pub struct CategoryDispatcher {
    config: DispatchConfig,
    retry: RetryPolicy,
    pause: Arc<dyn Pause>,
}

impl CategoryDispatcher {
    pub fn new(config: DispatchConfig, retry: RetryPolicy) -> Self {
        Self {
            config,
            retry,
            pause: Arc::new(ThreadPause),
        }
    }

    /// Replace the blocking wait primitive used for back-off and pacing.
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Submit every category, wait for all of them, and return successes and
    /// failures in completion order.
    ///
    /// Fails only when the category list is empty or contains duplicates.
    /// If every subtask fails the report simply has no completions.
    #[instrument(skip(self, categories, task), fields(entity = %entity, categories = categories.len()))]
    pub async fn dispatch<C, K>(
        &self,
        categories: &[C],
        entity: &str,
        task: Arc<K>,
    ) -> DispatchResult<DispatchReport<K::Output>>
    where
        C: Clone + Display + Send + Sync + 'static,
        K: CategoryTask<C>,
    {
        validate_categories(categories)?;

        let sem = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();

        for category in categories.iter().cloned() {
            let sem = Arc::clone(&sem);
            let task = Arc::clone(&task);
            let pause = Arc::clone(&self.pause);
            let retry = self.retry.clone();
            let pacing = self.config.pacing;
            let entity = entity.to_string();

            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let label = category.to_string();

                let joined = tokio::task::spawn_blocking(move || {
                    run_category(
                        task.as_ref(),
                        &category,
                        &entity,
                        &retry,
                        pause.as_ref(),
                        pacing,
                    )
                })
                .await;

                joined.unwrap_or_else(|e| {
                    Err(CategoryFailure {
                        category: label,
                        error: format!("worker aborted: {e}"),
                    })
                })
            });
        }

        let mut completed = Vec::new();
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(completion)) => {
                    info!(
                        category = %completion.category,
                        elapsed_ms = completion.elapsed.as_millis() as u64,
                        "category completed"
                    );
                    completed.push(completion);
                }
                Ok(Err(failure)) => {
                    warn!(category = %failure.category, error = %failure.error, "category failed");
                    METRICS.inc_category_failures();
                    failures.push(failure);
                }
                Err(e) => error!(error = %e, "dispatch task aborted"),
            }
        }

        for failure in unreported(categories, &completed, &failures) {
            warn!(category = %failure.category, error = %failure.error, "category failed");
            METRICS.inc_category_failures();
            failures.push(failure);
        }

        info!(
            completed = completed.len(),
            failed = failures.len(),
            "dispatch finished"
        );

        Ok(DispatchReport {
            completed,
            failures,
        })
    }
}

fn validate_categories<C: Display>(categories: &[C]) -> DispatchResult<()> {
    if categories.is_empty() {
        return Err(DispatchError::NoCategories);
    }
    let mut seen = HashSet::new();
    for category in categories {
        let label = category.to_string();
        if !seen.insert(label.clone()) {
            return Err(DispatchError::DuplicateCategory { category: label });
        }
    }
    Ok(())
}

/// Failures for categories whose task ended without reporting, so every
/// submitted category shows up in the report exactly once.
fn unreported<C: Display, T>(
    categories: &[C],
    completed: &[CategoryCompletion<T>],
    failures: &[CategoryFailure],
) -> Vec<CategoryFailure> {
    let reported: HashSet<&str> = completed
        .iter()
        .map(|c| c.category.as_str())
        .chain(failures.iter().map(|f| f.category.as_str()))
        .collect();

    categories
        .iter()
        .map(ToString::to_string)
        .filter(|label| !reported.contains(label.as_str()))
        .map(|category| CategoryFailure {
            category,
            error: "dispatch task aborted".to_string(),
        })
        .collect()
}

fn run_category<C, K>(
    task: &K,
    category: &C,
    entity: &str,
    retry: &RetryPolicy,
    pause: &dyn Pause,
    pacing: Duration,
) -> Result<CategoryCompletion<K::Output>, CategoryFailure>
where
    C: Display,
    K: CategoryTask<C>,
{
    let label = category.to_string();
    let mut last_call = Duration::ZERO;

    let outcome = retry_blocking(retry, &label, pause, |_| {
        if !pacing.is_zero() {
            pause.pause(pacing);
        }
        let started = Instant::now();
        let result = task.execute(category, entity);
        last_call = started.elapsed();
        result
    });

    match outcome {
        Ok(payload) => Ok(CategoryCompletion {
            category: label,
            payload,
            elapsed: last_call,
        }),
        Err(e) => Err(CategoryFailure {
            category: label,
            error: e.to_string(),
        }),
    }
}
