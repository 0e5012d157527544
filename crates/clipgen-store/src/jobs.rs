//! DynamoDB repository for shorts generation jobs.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{info, warn};

use clipgen_models::{
    effective_status, now_millis, Job, JobId, JobSettings, JobStatus, JobSummary, ProcessingTime,
    Short, ShortStatus,
};

use crate::attr::{get, require, Item, ToAttributeValue};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::metrics::observe;
use crate::repos::JobRepository;

/// Jobs table backed by DynamoDB.
#[derive(Clone)]
pub struct DynamoJobRepository {
    client: Client,
    table_name: String,
    user_index: String,
}

impl DynamoJobRepository {
    pub fn new(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            table_name: config.jobs_table.clone(),
            user_index: config.user_index.clone(),
        }
    }

    async fn query_user_items(&self, user_id: &str) -> StoreResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let resp = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.user_index)
                .key_condition_expression("userId = :uid")
                .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("Query", e))?;

            items.extend(resp.items.unwrap_or_default());

            match resp.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl JobRepository for DynamoJobRepository {
    async fn create(&self, job: &Job) -> StoreResult<()> {
        observe("jobs.create", async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(job_to_item(job)))
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("PutItem", e))?;
            info!(job_id = %job.id, user_id = %job.user_id, "Created job record");
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        observe("jobs.get", async {
            let resp = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("GetItem", e))?;

            match resp.item {
                Some(item) => {
                    let mut job = item_to_job(&item)?;
                    normalize_job(&mut job);
                    Ok(Some(job))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<JobSummary>> {
        observe("jobs.list_by_user", async {
            let items = self.query_user_items(user_id).await?;
            let mut jobs = Vec::with_capacity(items.len());
            for item in &items {
                match item_to_job(item) {
                    Ok(job) => jobs.push(job.summary()),
                    Err(e) => warn!(user_id = %user_id, "Skipping malformed job item: {}", e),
                }
            }
            Ok(jobs)
        })
        .await
    }

    async fn mark_failed(&self, id: &JobId, message: &str) -> StoreResult<()> {
        observe("jobs.mark_failed", async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .update_expression("SET #status = :status, errorMessage = :msg, updatedAt = :now")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(":status", JobStatus::Failed.as_str().to_attr())
                .expression_attribute_values(":msg", message.to_attr())
                .expression_attribute_values(":now", now_millis().to_attr())
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("UpdateItem", e))?;
            info!(job_id = %id, "Marked job failed: {}", message);
            Ok(())
        })
        .await
    }

    async fn update_video_metadata(
        &self,
        id: &JobId,
        video_title: &str,
        thumbnail_url: &str,
    ) -> StoreResult<()> {
        observe("jobs.update_video_metadata", async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .update_expression("SET videoTitle = :title, thumbnailUrl = :thumb, updatedAt = :now")
                .expression_attribute_values(":title", video_title.to_attr())
                .expression_attribute_values(":thumb", thumbnail_url.to_attr())
                .expression_attribute_values(":now", now_millis().to_attr())
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("UpdateItem", e))?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| StoreError::from_sdk("DescribeTable", e))?;
        Ok(())
    }
}

/// Drop output keys from shorts that are not completed.
pub fn normalize_job(job: &mut Job) {
    for short in &mut job.shorts {
        if short.normalize() {
            warn!(
                job_id = %job.id,
                short_id = %short.id,
                status = short.status.as_str(),
                "Dropped outputKey from unfinished short"
            );
        }
    }
}

fn settings_to_attr(settings: &JobSettings) -> AttributeValue {
    let mut fields = Item::new();
    fields.insert("captionStyle".into(), settings.caption_style.to_attr());
    fields.insert("backgroundColor".into(), settings.background_color.to_attr());
    fields.insert("backgroundStyle".into(), settings.background_style.to_attr());
    fields.insert("aspectRatio".into(), settings.aspect_ratio.to_attr());
    fields.insert("captionColor".into(), settings.caption_color.to_attr());
    fields.insert("captionSize".into(), settings.caption_size.to_attr());
    fields.insert("captionPosition".into(), settings.caption_position.to_attr());
    fields.insert("clipDuration".into(), settings.clip_duration.to_attr());
    fields.insert("presetId".into(), settings.preset_id.to_attr());
    AttributeValue::M(fields)
}

fn attr_to_settings(fields: &Item) -> JobSettings {
    JobSettings {
        caption_style: get(fields, "captionStyle"),
        background_color: get(fields, "backgroundColor"),
        background_style: get(fields, "backgroundStyle"),
        aspect_ratio: get(fields, "aspectRatio"),
        caption_color: get(fields, "captionColor"),
        caption_size: get(fields, "captionSize"),
        caption_position: get(fields, "captionPosition"),
        clip_duration: get(fields, "clipDuration"),
        preset_id: get(fields, "presetId"),
    }
}

fn short_to_attr(short: &Short) -> AttributeValue {
    let mut fields = Item::new();
    fields.insert("id".into(), short.id.to_attr());
    fields.insert("status".into(), short.status.as_str().to_attr());
    fields.insert("startTime".into(), short.start_time.to_attr());
    fields.insert("endTime".into(), short.end_time.to_attr());
    fields.insert("durationSeconds".into(), short.duration_seconds.to_attr());
    fields.insert("hook".into(), short.hook.to_attr());
    if let Some(key) = &short.output_key {
        fields.insert("outputKey".into(), key.to_attr());
    }
    if let Some(at) = &short.completed_at {
        fields.insert("completedAt".into(), at.to_attr());
    }
    if let Some(confidence) = short.confidence {
        fields.insert("confidence".into(), confidence.to_attr());
    }
    if let Some(t) = &short.processing_time {
        let mut timing = Item::new();
        timing.insert("ffmpeg".into(), t.ffmpeg.to_attr());
        timing.insert("upload".into(), t.upload.to_attr());
        timing.insert("total".into(), t.total.to_attr());
        fields.insert("processingTime".into(), AttributeValue::M(timing));
    }
    AttributeValue::M(fields)
}

fn attr_to_short(fields: &Item) -> StoreResult<Short> {
    let raw_status: Option<String> = get(fields, "status");
    let status = match raw_status.as_deref().map(ShortStatus::parse) {
        Some(Some(status)) => status,
        Some(None) => {
            warn!(status = ?raw_status, "Unknown short status, treating as processing");
            ShortStatus::Processing
        }
        None => ShortStatus::Processing,
    };

    let processing_time = fields
        .get("processingTime")
        .and_then(|v| v.as_m().ok())
        .map(|t| ProcessingTime {
            ffmpeg: get(t, "ffmpeg").unwrap_or_default(),
            upload: get(t, "upload").unwrap_or_default(),
            total: get(t, "total").unwrap_or_default(),
        });

    Ok(Short {
        id: require(fields, "id")?,
        status,
        start_time: get(fields, "startTime").unwrap_or_default(),
        end_time: get(fields, "endTime").unwrap_or_default(),
        duration_seconds: get(fields, "durationSeconds").unwrap_or_default(),
        hook: get(fields, "hook").unwrap_or_default(),
        output_key: get(fields, "outputKey"),
        completed_at: get(fields, "completedAt"),
        confidence: get(fields, "confidence"),
        processing_time,
    })
}

/// Convert a job into a DynamoDB item.
pub fn job_to_item(job: &Job) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), job.id.as_str().to_attr());
    item.insert("userId".into(), job.user_id.to_attr());
    item.insert("sourceUrl".into(), job.source_url.to_attr());
    if let Some(composition_id) = &job.composition_id {
        item.insert("compositionId".into(), composition_id.to_attr());
    }
    item.insert("status".into(), job.status.as_str().to_attr());
    item.insert(
        "settings".into(),
        job.settings
            .as_ref()
            .map(settings_to_attr)
            .unwrap_or(AttributeValue::Null(true)),
    );
    item.insert("createdAt".into(), job.created_at.to_attr());

    if let Some(title) = &job.video_title {
        item.insert("videoTitle".into(), title.to_attr());
    }
    if let Some(thumb) = &job.thumbnail_url {
        item.insert("thumbnailUrl".into(), thumb.to_attr());
    }
    if !job.shorts.is_empty() {
        item.insert(
            "shorts".into(),
            AttributeValue::L(job.shorts.iter().map(short_to_attr).collect()),
        );
    }
    if let Some(updated_at) = job.updated_at {
        item.insert("updatedAt".into(), updated_at.to_attr());
    }
    if let Some(completed_at) = &job.completed_at {
        item.insert("completedAt".into(), completed_at.to_attr());
    }
    if let Some(message) = &job.error_message {
        item.insert("errorMessage".into(), message.to_attr());
    }
    item
}

/// Convert a DynamoDB item into a job.
///
/// Items without a recognised `status` take the status derived from their shorts.
pub fn item_to_job(item: &Item) -> StoreResult<Job> {
    let shorts = match item.get("shorts").and_then(|v| v.as_l().ok()) {
        Some(list) => list
            .iter()
            .filter_map(|v| v.as_m().ok())
            .map(attr_to_short)
            .collect::<StoreResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    let status = get::<String>(item, "status")
        .as_deref()
        .and_then(JobStatus::parse)
        .or_else(|| JobStatus::parse(effective_status(None, &shorts)))
        .unwrap_or_default();

    let settings = item
        .get("settings")
        .and_then(|v| v.as_m().ok())
        .map(attr_to_settings);

    Ok(Job {
        id: JobId::from_string(require::<String>(item, "id")?),
        user_id: require(item, "userId")?,
        source_url: get(item, "sourceUrl").unwrap_or_default(),
        composition_id: get(item, "compositionId"),
        video_title: get(item, "videoTitle"),
        thumbnail_url: get(item, "thumbnailUrl"),
        status,
        settings,
        shorts,
        created_at: get(item, "createdAt").unwrap_or_default(),
        updated_at: get(item, "updatedAt"),
        completed_at: get(item, "completedAt"),
        error_message: get(item, "errorMessage"),
    })
}
