//! Repository traits implemented by the DynamoDB and in-memory backends.

use async_trait::async_trait;

use clipgen_models::{Job, JobId, JobSummary, Preset, User};

use crate::error::StoreResult;

/// Persistence for shorts generation jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Write a new job record.
    async fn create(&self, job: &Job) -> StoreResult<()>;

    /// Fetch a job by id. Shorts violating the output key invariant are normalised.
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// All jobs of a user, newest first.
    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<JobSummary>>;

    /// Mark a job FAILED with an error message.
    async fn mark_failed(&self, id: &JobId, message: &str) -> StoreResult<()>;

    /// Set the source video title and thumbnail.
    async fn update_video_metadata(
        &self,
        id: &JobId,
        video_title: &str,
        thumbnail_url: &str,
    ) -> StoreResult<()>;

    /// Check the backing table is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

/// Persistence for styling presets. No update or delete path exists.
#[async_trait]
pub trait PresetRepository: Send + Sync {
    async fn create(&self, preset: &Preset) -> StoreResult<()>;

    /// All presets of a user, newest first.
    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Preset>>;
}

/// Persistence for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Create a user. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, user: &User) -> StoreResult<()>;

    /// Credit balance; missing user or attribute reads as 0.
    async fn get_credits(&self, id: &str) -> StoreResult<i64>;
}
