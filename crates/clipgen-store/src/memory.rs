//! In-memory repositories for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use clipgen_models::{now_millis, Job, JobId, JobStatus, JobSummary, Preset, User};

use crate::error::{StoreError, StoreResult};
use crate::jobs::normalize_job;
use crate::repos::{JobRepository, PresetRepository, UserRepository};

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a stored job, as the external pipeline would.
    pub async fn put(&self, job: Job) {
        self.jobs.write().await.insert(job.id.to_string(), job);
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> StoreResult<()> {
        self.put(job.clone()).await;
        Ok(())
    }

    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let mut job = self.jobs.read().await.get(id.as_str()).cloned();
        if let Some(job) = job.as_mut() {
            normalize_job(job);
        }
        Ok(job)
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<JobSummary>> {
        let jobs = self.jobs.read().await;
        let mut owned: Vec<&Job> = jobs.values().filter(|j| j.user_id == user_id).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned.into_iter().map(Job::summary).collect())
    }

    async fn mark_failed(&self, id: &JobId, message: &str) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(id.to_string()))?;
        job.status = JobStatus::Failed;
        job.error_message = Some(message.to_string());
        job.updated_at = Some(now_millis());
        Ok(())
    }

    async fn update_video_metadata(
        &self,
        id: &JobId,
        video_title: &str,
        thumbnail_url: &str,
    ) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(id.to_string()))?;
        job.video_title = Some(video_title.to_string());
        job.thumbnail_url = Some(thumbnail_url.to_string());
        job.updated_at = Some(now_millis());
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPresetRepository {
    presets: RwLock<Vec<Preset>>,
}

impl InMemoryPresetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.presets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.presets.read().await.is_empty()
    }
}

#[async_trait]
impl PresetRepository for InMemoryPresetRepository {
    async fn create(&self, preset: &Preset) -> StoreResult<()> {
        self.presets.write().await.push(preset.clone());
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Preset>> {
        let mut presets: Vec<Preset> = self
            .presets
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        presets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(presets)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a credit balance, as billing reconciliation would.
    pub async fn set_credits(&self, id: &str, credits: i64) {
        if let Some(user) = self.users.write().await.get_mut(id) {
            user.credits = credits;
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StoreError::AlreadyExists(user.id.clone()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_credits(&self, id: &str) -> StoreResult<i64> {
        Ok(self.users.read().await.get(id).map(|u| u.credits).unwrap_or(0))
    }
}
