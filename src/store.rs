//! Ordered per-job result store.
//!
//! The store holds the job list for the current batch and is the single
//! place job state is read by callers. Workers mutate jobs through
//! token-checked methods: every mutation carries the batch token it was
//! started under, and a mutation whose token no longer matches the current
//! batch is silently discarded. That is what makes "Start Over" safe while
//! jobs are still in flight.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::image::EncodedImage;
use crate::scene::SceneRequest;

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one batch generation. Stale tokens are ignored by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchToken(u64);

impl BatchToken {
    pub fn next() -> Self {
        BatchToken(TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// One unit of work bound to a scene request.
///
/// Invariant: `result_image` is set iff `status == Succeeded` and
/// `error_detail` is set iff `status == Failed`; neither is set while
/// Pending or Running.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: String,
    pub scene_name: String,
    pub status: JobStatus,
    pub result_image: Option<EncodedImage>,
    pub error_detail: Option<String>,
    pub is_favorite: bool,
}

impl Job {
    fn new(request: &SceneRequest) -> Self {
        Self {
            id: request.id.clone(),
            scene_name: request.display_name.clone(),
            status: JobStatus::Pending,
            result_image: None,
            error_detail: None,
            is_favorite: false,
        }
    }
}

struct StoreInner {
    token: Option<BatchToken>,
    jobs: Vec<Job>,
}

/// Thread-safe ordered job collection for the current batch.
pub struct ResultStore {
    inner: RwLock<StoreInner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                token: None,
                jobs: Vec::new(),
            }),
        }
    }

    /// Replace the job list with fresh Pending jobs for a new batch.
    /// Any in-flight update from a previous batch becomes a no-op.
    pub fn begin_batch(&self, token: BatchToken, requests: &[SceneRequest]) {
        let mut inner = self.inner.write();
        inner.token = Some(token);
        inner.jobs = requests.iter().map(Job::new).collect();
    }

    /// Drop the current batch entirely ("Start Over").
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.token = None;
        inner.jobs.clear();
    }

    pub fn current_token(&self) -> Option<BatchToken> {
        self.inner.read().token
    }

    /// Ordered snapshot of the current job list.
    pub fn snapshot(&self) -> Vec<Job> {
        self.inner.read().jobs.clone()
    }

    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.inner
            .read()
            .jobs
            .iter()
            .find(|job| job.id == job_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().jobs.is_empty()
    }

    /// True once every job in the batch is terminal.
    pub fn all_terminal(&self) -> bool {
        let inner = self.inner.read();
        !inner.jobs.is_empty() && inner.jobs.iter().all(|job| job.status.is_terminal())
    }

    /// Transition a job to Running, clearing any prior result or error.
    /// Returns false if the token is stale or the job is unknown.
    pub fn mark_running(&self, token: BatchToken, job_id: &str) -> bool {
        self.update(token, job_id, |job| {
            job.status = JobStatus::Running;
            job.result_image = None;
            job.error_detail = None;
        })
    }

    /// Terminal success: stores the image and clears any error detail.
    pub fn complete_success(&self, token: BatchToken, job_id: &str, image: EncodedImage) -> bool {
        self.update(token, job_id, |job| {
            job.status = JobStatus::Succeeded;
            job.result_image = Some(image);
            job.error_detail = None;
        })
    }

    /// Terminal failure: stores the human-readable detail and clears any image.
    pub fn complete_failure(&self, token: BatchToken, job_id: &str, detail: String) -> bool {
        self.update(token, job_id, |job| {
            job.status = JobStatus::Failed;
            job.result_image = None;
            job.error_detail = Some(detail);
        })
    }

    /// Flip the favorite flag for exactly one succeeded job. No-op for
    /// unknown ids and for jobs that are not terminal successes.
    pub fn toggle_favorite(&self, job_id: &str) {
        let mut inner = self.inner.write();
        if let Some(job) = inner.jobs.iter_mut().find(|job| job.id == job_id) {
            if job.status == JobStatus::Succeeded {
                job.is_favorite = !job.is_favorite;
            }
        }
    }

    /// Favorited jobs, defensively restricted to terminal successes.
    pub fn favorites(&self) -> Vec<Job> {
        self.inner
            .read()
            .jobs
            .iter()
            .filter(|job| {
                job.is_favorite
                    && job.status == JobStatus::Succeeded
                    && job.error_detail.is_none()
            })
            .cloned()
            .collect()
    }

    fn update<F: FnOnce(&mut Job)>(&self, token: BatchToken, job_id: &str, apply: F) -> bool {
        let mut inner = self.inner.write();
        if inner.token != Some(token) {
            // Update from a superseded batch; drop it silently.
            return false;
        }
        match inner.jobs.iter_mut().find(|job| job.id == job_id) {
            Some(job) => {
                apply(job);
                true
            }
            None => false,
        }
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PRESET_SCENES, MAX_BATCH_SIZE};
    use crate::scene::SceneSource;
    use proptest::prelude::*;

    fn requests(n: usize) -> Vec<SceneRequest> {
        PRESET_SCENES
            .iter()
            .take(n)
            .map(|scene| {
                SceneSource::Preset(scene.id.to_string())
                    .resolve()
                    .unwrap()
            })
            .collect()
    }

    fn image() -> EncodedImage {
        EncodedImage::from_provider_payload("QUJD".to_string(), Some("image/png"))
    }

    fn store_with(n: usize) -> (ResultStore, BatchToken) {
        let store = ResultStore::new();
        let token = BatchToken::next();
        store.begin_batch(token, &requests(n));
        (store, token)
    }

    #[test]
    fn begin_batch_creates_pending_jobs_in_order() {
        let (store, _) = store_with(3);
        let jobs = store.snapshot();
        assert_eq!(jobs.len(), 3);
        for (job, request) in jobs.iter().zip(requests(3)) {
            assert_eq!(job.id, request.id);
            assert_eq!(job.status, JobStatus::Pending);
            assert!(job.result_image.is_none());
            assert!(job.error_detail.is_none());
        }
    }

    #[test]
    fn terminal_states_hold_exactly_one_of_result_or_error() {
        let (store, token) = store_with(2);
        let jobs = store.snapshot();

        store.mark_running(token, &jobs[0].id);
        store.complete_success(token, &jobs[0].id, image());
        let succeeded = store.get(&jobs[0].id).unwrap();
        assert_eq!(succeeded.status, JobStatus::Succeeded);
        assert!(succeeded.result_image.is_some());
        assert!(succeeded.error_detail.is_none());

        store.mark_running(token, &jobs[1].id);
        store.complete_failure(token, &jobs[1].id, "boom".to_string());
        let failed = store.get(&jobs[1].id).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.result_image.is_none());
        assert_eq!(failed.error_detail.as_deref(), Some("boom"));
    }

    #[test]
    fn rerunning_a_terminal_job_clears_its_outcome() {
        let (store, token) = store_with(1);
        let id = store.snapshot()[0].id.clone();
        store.mark_running(token, &id);
        store.complete_failure(token, &id, "boom".to_string());
        store.mark_running(token, &id);
        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.result_image.is_none());
        assert!(job.error_detail.is_none());
    }

    #[test]
    fn stale_token_updates_are_ignored() {
        let (store, old_token) = store_with(1);
        let id = store.snapshot()[0].id.clone();

        let new_token = BatchToken::next();
        store.begin_batch(new_token, &requests(1));

        assert!(!store.complete_success(old_token, &id, image()));
        assert_eq!(store.get(&id).unwrap().status, JobStatus::Pending);
    }

    #[test]
    fn toggle_favorite_only_applies_to_succeeded_jobs() {
        let (store, token) = store_with(2);
        let jobs = store.snapshot();

        store.toggle_favorite(&jobs[0].id);
        assert!(!store.get(&jobs[0].id).unwrap().is_favorite, "pending job");

        store.mark_running(token, &jobs[0].id);
        store.complete_success(token, &jobs[0].id, image());
        store.toggle_favorite(&jobs[0].id);
        assert!(store.get(&jobs[0].id).unwrap().is_favorite);

        store.toggle_favorite("no-such-job");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn toggle_favorite_twice_is_the_identity() {
        let (store, token) = store_with(1);
        let id = store.snapshot()[0].id.clone();
        store.mark_running(token, &id);
        store.complete_success(token, &id, image());

        let before = store.get(&id).unwrap().is_favorite;
        store.toggle_favorite(&id);
        store.toggle_favorite(&id);
        assert_eq!(store.get(&id).unwrap().is_favorite, before);
    }

    #[test]
    fn favorites_filter_excludes_non_success_rows() {
        let (store, token) = store_with(3);
        let jobs = store.snapshot();

        store.mark_running(token, &jobs[0].id);
        store.complete_success(token, &jobs[0].id, image());
        store.toggle_favorite(&jobs[0].id);

        store.mark_running(token, &jobs[1].id);
        store.complete_failure(token, &jobs[1].id, "boom".to_string());

        let favorites = store.favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, jobs[0].id);
    }

    proptest! {
        #[test]
        fn any_selection_yields_one_job_per_request_with_unique_ids(n in 1usize..=MAX_BATCH_SIZE) {
            let (store, _) = store_with(n.min(PRESET_SCENES.len()));
            let jobs = store.snapshot();
            prop_assert_eq!(jobs.len(), n.min(PRESET_SCENES.len()));
            let ids: std::collections::HashSet<_> = jobs.iter().map(|j| j.id.clone()).collect();
            prop_assert_eq!(ids.len(), jobs.len());
        }
    }
}
