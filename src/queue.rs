//! Batch generation queue.
//!
//! Drains one batch of scene jobs through the generation client with a
//! bounded set of worker tasks. The pending list lives behind a single
//! tokio mutex so no two workers can claim the same job; each worker marks
//! its job Running, waits the fixed inter-item spacing delay, then issues
//! the build+generate call and records the terminal outcome in the store.
//!
//! The spacing delay exists to stay under the external provider's rate
//! limit on image-generation calls, which is also why the documented safe
//! concurrency is 1. Progress is published on a watch channel as a
//! monotonically increasing completed count, and the aggregate completion
//! signal fires exactly once, when every job is terminal.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch, Mutex};
use tracing::{debug, info, warn};

use crate::batch::BatchSession;
use crate::error::GenerationError;
use crate::image::EncodedImage;
use crate::prompt::build_prompt;
use crate::provider::{GenerationClient, Sleeper, TokioSleeper};
use crate::scene::SceneRequest;
use crate::store::{BatchToken, JobStatus, ResultStore};

/// Worker-pool tuning for one queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Worker task count. The safe default is 1 (strictly sequential)
    /// because the provider rate-limits image generation aggressively.
    pub concurrency: usize,
    /// Fixed delay before each call, spacing requests under the rate limit.
    pub item_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            item_delay_ms: 2000,
        }
    }
}

/// Completed-count snapshot published while a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

/// Aggregate outcome delivered once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Caller-side view of a running batch.
pub struct BatchHandle {
    progress: watch::Receiver<BatchProgress>,
    done: oneshot::Receiver<BatchSummary>,
}

impl BatchHandle {
    /// Subscribe to completed-count updates.
    pub fn progress(&self) -> watch::Receiver<BatchProgress> {
        self.progress.clone()
    }

    /// Wait for the single aggregate completion signal.
    pub async fn wait(self) -> Result<BatchSummary, GenerationError> {
        self.done.await.map_err(|_| {
            GenerationError::Transport("batch workers stopped without completing".to_string())
        })
    }
}

struct WorkerContext {
    client: Arc<dyn GenerationClient>,
    store: Arc<ResultStore>,
    sleeper: Arc<dyn Sleeper>,
    token: BatchToken,
    image: EncodedImage,
    remove_background: bool,
    item_delay: Duration,
    total: usize,
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    progress_tx: watch::Sender<BatchProgress>,
}

/// Runs batches and ad-hoc single-job retries against one store.
pub struct BatchQueue {
    client: Arc<dyn GenerationClient>,
    store: Arc<ResultStore>,
    sleeper: Arc<dyn Sleeper>,
    config: QueueConfig,
}

impl BatchQueue {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<ResultStore>) -> Self {
        Self::with_config(client, store, QueueConfig::default())
    }

    pub fn with_config(
        client: Arc<dyn GenerationClient>,
        store: Arc<ResultStore>,
        config: QueueConfig,
    ) -> Self {
        Self {
            client,
            store,
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replace the suspension primitive, so tests run without real delays.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Initialize the store for the session and spawn the worker pool.
    ///
    /// Jobs start Pending in request order. Workers pull from a shared FIFO
    /// list; completion order follows call latency when concurrency > 1 and
    /// equals submission order at the default concurrency of 1.
    pub fn start_batch(&self, session: &BatchSession, source_image: &EncodedImage) -> BatchHandle {
        let requests = session.requests().to_vec();
        let total = requests.len();
        self.store.begin_batch(session.token(), &requests);

        let (progress_tx, progress_rx) = watch::channel(BatchProgress {
            completed: 0,
            total,
        });
        let (done_tx, done_rx) = oneshot::channel();

        let ctx = Arc::new(WorkerContext {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            sleeper: Arc::clone(&self.sleeper),
            token: session.token(),
            image: source_image.clone(),
            remove_background: session.remove_background(),
            item_delay: Duration::from_millis(self.config.item_delay_ms),
            total,
            completed: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            progress_tx,
        });

        let pending = Arc::new(Mutex::new(VecDeque::from(requests)));
        let worker_count = self.config.concurrency.max(1).min(total);

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let pending = Arc::clone(&pending);
            let ctx = Arc::clone(&ctx);
            workers.push(tokio::spawn(async move {
                Self::worker_loop(worker_id, pending, ctx).await;
            }));
        }

        info!(
            batch_token = session.token().as_u64(),
            total,
            worker_count,
            "Started mockup batch"
        );

        tokio::spawn(async move {
            for handle in workers {
                let _ = handle.await;
            }
            let summary = BatchSummary {
                total: ctx.total,
                succeeded: ctx.succeeded.load(Ordering::SeqCst),
                failed: ctx.failed.load(Ordering::SeqCst),
            };
            info!(
                batch_token = ctx.token.as_u64(),
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Batch complete"
            );
            let _ = done_tx.send(summary);
        });

        BatchHandle {
            progress: progress_rx,
            done: done_rx,
        }
    }

    /// Re-run exactly one terminal job through the same build+generate
    /// path, outside the worker pool. Records the new terminal state in
    /// the store; never touches other jobs and never re-fires the batch
    /// completion signal. The returned status is the job's new outcome.
    pub async fn retry_job(
        &self,
        session: &BatchSession,
        source_image: &EncodedImage,
        job_id: &str,
    ) -> Result<JobStatus, GenerationError> {
        let request = session.reconstruct_scene(job_id).ok_or_else(|| {
            GenerationError::Configuration(format!("cannot reconstruct scene for job id: {job_id}"))
        })?;
        let current = self.store.get(job_id).ok_or_else(|| {
            GenerationError::Configuration(format!("no job with id: {job_id}"))
        })?;
        if !current.status.is_terminal() {
            return Err(GenerationError::Configuration(format!(
                "job {job_id} is still in progress"
            )));
        }
        if !self.store.mark_running(session.token(), job_id) {
            return Err(GenerationError::Configuration(
                "batch was superseded; nothing to retry".to_string(),
            ));
        }

        debug!(job_id, "Retrying single job");
        let prompt = build_prompt(&request.prompt_text, session.remove_background());
        match self.client.generate(source_image, &prompt).await {
            Ok(image) => {
                self.store.complete_success(session.token(), job_id, image);
                info!(job_id, "Retry succeeded");
                Ok(JobStatus::Succeeded)
            }
            Err(err) => {
                warn!(job_id, error = %err, "Retry failed");
                self.store
                    .complete_failure(session.token(), job_id, err.user_message());
                Ok(JobStatus::Failed)
            }
        }
    }

    async fn worker_loop(
        worker_id: usize,
        pending: Arc<Mutex<VecDeque<SceneRequest>>>,
        ctx: Arc<WorkerContext>,
    ) {
        debug!(worker_id, "Worker started");
        loop {
            // Exclusive pop: no two workers can claim the same job.
            let request = {
                let mut queue = pending.lock().await;
                queue.pop_front()
            };
            let Some(request) = request else {
                break;
            };

            if !ctx.store.mark_running(ctx.token, &request.id) {
                // The batch was discarded while this worker was running.
                debug!(worker_id, job_id = %request.id, "Batch superseded, worker exiting");
                break;
            }

            ctx.sleeper.sleep(ctx.item_delay).await;

            let prompt = build_prompt(&request.prompt_text, ctx.remove_background);
            match ctx.client.generate(&ctx.image, &prompt).await {
                Ok(image) => {
                    ctx.store.complete_success(ctx.token, &request.id, image);
                    ctx.succeeded.fetch_add(1, Ordering::SeqCst);
                    info!(worker_id, job_id = %request.id, scene = %request.display_name, "Scene generated");
                }
                Err(err) => {
                    // A failed job never stops the rest of the batch.
                    ctx.store
                        .complete_failure(ctx.token, &request.id, err.user_message());
                    ctx.failed.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        worker_id,
                        job_id = %request.id,
                        kind = err.kind(),
                        error = %err,
                        "Scene generation failed"
                    );
                }
            }

            let completed = ctx.completed.fetch_add(1, Ordering::SeqCst) + 1;
            ctx.progress_tx.send_replace(BatchProgress {
                completed,
                total: ctx.total,
            });
        }
        debug!(worker_id, "Worker stopped");
    }
}
