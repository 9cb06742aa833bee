//! Hand-written in-memory fakes for the application-layer ports.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;

use omr_domain::entities::template::TemplateConfigType;
use omr_domain::entities::{
    FileOrFolder, MarkingConfigJob, MarkingJob, NewFileOrFolder, Template, TemplateConfigJob,
};
use omr_domain::error::{Error, Result};
use omr_domain::events::DomainEvent;
use omr_domain::ports::{
    ArtifactStore, BrokerProvider, BubbleClass, DomainEventStream, EventBusProvider,
    FileRepository, IndexReading, IndexSectionDetector, JobControlRepository,
    MarkingConfigApplied, MarkingConfigJobRepository, MarkingJobApplied, MarkingJobRepository,
    MarkingVision, MessageHandler, NewMarkingConfigJob, NewMarkingJob, NewTemplateConfigJob,
    OcrProvider, ResultApplication, ResultSheetWriter, TemplateConfigApplied,
    TemplateConfigJobRepository, TemplateConfigOutput, TemplateVision, UploadMetadata,
};
use omr_domain::registry::messages::ImageDimensions;
use omr_domain::registry::JobKind;
use omr_domain::value_objects::{
    BubbleMark, ClusteringParams, ColumnStart, GridBubbleConfig, Homography, JobPriority,
    JobStatus, PointF, TemplateConfig, TemplateConfigMetadata,
};

// ============================================================================
// Broker
// ============================================================================

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub routing_key: String,
    pub body: Vec<u8>,
    pub priority: u8,
}

#[derive(Default)]
pub struct FakeBroker {
    published: Mutex<Vec<PublishedMessage>>,
    fail_publish: Mutex<bool>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_publishes(&self) {
        *self.fail_publish.lock().unwrap() = true;
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, routing_key: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.routing_key == routing_key)
            .collect()
    }
}

#[async_trait]
impl BrokerProvider for FakeBroker {
    async fn publish(&self, routing_key: &str, body: Vec<u8>, priority: u8) -> Result<()> {
        if *self.fail_publish.lock().unwrap() {
            return Err(Error::broker("simulated publish failure"));
        }
        self.published.lock().unwrap().push(PublishedMessage {
            routing_key: routing_key.to_owned(),
            body,
            priority,
        });
        Ok(())
    }

    async fn consume(&self, _queue: &str, _handler: std::sync::Arc<dyn MessageHandler>) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Artifact store
// ============================================================================

#[derive(Default)]
pub struct FakeStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_owned(), bytes.to_vec());
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ArtifactStore for FakeStore {
    async fn save(&self, rel_path: &str, bytes: &[u8]) -> Result<()> {
        self.put(rel_path, bytes);
        Ok(())
    }

    async fn get(&self, rel_path: &str) -> Result<Vec<u8>> {
        self.read(rel_path)
            .ok_or_else(|| Error::not_found(rel_path))
    }

    async fn exists(&self, rel_path: &str) -> Result<bool> {
        Ok(self.read(rel_path).is_some())
    }

    async fn size(&self, rel_path: &str) -> Result<u64> {
        Ok(self.get(rel_path).await?.len() as u64)
    }

    async fn delete(&self, rel_path: &str) -> Result<()> {
        self.files.lock().unwrap().remove(rel_path);
        Ok(())
    }

    async fn list(&self, prefix: &str, _pattern: &str) -> Result<Vec<String>> {
        let mut matches: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        matches.sort();
        Ok(matches)
    }

    async fn save_chunk(
        &self,
        _upload_id: &str,
        _chunk_index: u32,
        _total_chunks: u32,
        _final_path: &str,
        _bytes: &[u8],
    ) -> Result<()> {
        Err(Error::internal("chunked uploads not supported by fake"))
    }

    async fn upload_metadata(&self, _upload_id: &str) -> Result<Option<UploadMetadata>> {
        Ok(None)
    }

    async fn combine_chunks(
        &self,
        _upload_id: &str,
        _total_chunks: u32,
        _final_path: &str,
    ) -> Result<()> {
        Err(Error::internal("chunked uploads not supported by fake"))
    }

    async fn delete_upload(&self, _upload_id: &str) -> Result<()> {
        Ok(())
    }

    async fn extract_zip(&self, _rel_path: &str) -> Result<String> {
        Err(Error::internal("zip extraction not supported by fake"))
    }
}

// ============================================================================
// Event bus
// ============================================================================

#[derive(Default)]
pub struct FakeEventBus {
    events: Mutex<Vec<DomainEvent>>,
}

impl FakeEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBusProvider for FakeEventBus {
    async fn publish_event(&self, event: DomainEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<DomainEventStream> {
        Ok(futures::stream::empty().boxed())
    }

    fn has_subscribers(&self) -> bool {
        false
    }
}

// ============================================================================
// Entity builders
// ============================================================================

pub fn template(id: i64, status: JobStatus) -> Template {
    Template {
        id,
        name: format!("template-{id}"),
        description: None,
        config_type: TemplateConfigType::GridBased,
        status,
        num_questions: 0,
        options_per_question: 5,
        template_file_id: None,
        configuration_file_id: None,
        owner: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn template_config_job(id: i64, template_id: i64) -> TemplateConfigJob {
    TemplateConfigJob {
        id,
        template_id,
        name: format!("config-{id}"),
        description: None,
        config_type: TemplateConfigType::GridBased,
        status: JobStatus::Pending,
        priority: JobPriority::High,
        template_path: "uploads/templates/1/blank.jpg".to_owned(),
        clustering: None,
        save_intermediate_results: false,
        template_config_path: None,
        output_image_path: None,
        result_image_path: None,
        original_image_width: None,
        original_image_height: None,
        processed_image_width: None,
        processed_image_height: None,
        processing_started_at: None,
        processing_completed_at: None,
        error_message: None,
        owner: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn marking_config_job(id: i64, template_id: i64) -> MarkingConfigJob {
    MarkingConfigJob {
        id,
        template_id,
        name: format!("marking-config-{id}"),
        status: JobStatus::Pending,
        priority: JobPriority::Normal,
        template_path: "templates/1/9_ab_template.jpg".to_owned(),
        marking_scheme_path: "uploads/marking_schemes/1/key.jpg".to_owned(),
        template_config_path: "templates/1/9_ab_config.json".to_owned(),
        marking_config_path: None,
        processing_started_at: None,
        processing_completed_at: None,
        error_message: None,
        owner: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn marking_job(id: i64, template_id: i64) -> MarkingJob {
    MarkingJob {
        id,
        template_id,
        name: format!("marking-{id}"),
        description: None,
        status: JobStatus::Pending,
        priority: JobPriority::Urgent,
        marking_scheme_path: "uploads/marking_schemes/1/key.jpg".to_owned(),
        answer_sheets_folder_path: "uploads/answer_sheets/1/batch".to_owned(),
        output_path: "results/1/7_ab.xlsx".to_owned(),
        intermediate_results_path: None,
        save_intermediate_results: false,
        total_answer_sheets: 0,
        processed_answer_sheets: 0,
        failed_answer_sheets: 0,
        processing_started_at: None,
        processing_completed_at: None,
        error_message: None,
        results_summary: None,
        owner: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ============================================================================
// Repositories
// ============================================================================

#[derive(Default)]
pub struct FakeTemplateConfigJobs {
    pub jobs: Mutex<HashMap<i64, TemplateConfigJob>>,
    pub templates: Mutex<HashMap<i64, Template>>,
}

impl FakeTemplateConfigJobs {
    pub fn with(job: TemplateConfigJob, tpl: Template) -> Self {
        let fake = Self::default();
        fake.templates.lock().unwrap().insert(tpl.id, tpl);
        fake.jobs.lock().unwrap().insert(job.id, job);
        fake
    }

    pub fn job(&self, id: i64) -> TemplateConfigJob {
        self.jobs.lock().unwrap().get(&id).cloned().unwrap()
    }

    pub fn template(&self, id: i64) -> Template {
        self.templates.lock().unwrap().get(&id).cloned().unwrap()
    }
}

#[async_trait]
impl TemplateConfigJobRepository for FakeTemplateConfigJobs {
    async fn insert(&self, new: NewTemplateConfigJob) -> Result<TemplateConfigJob> {
        let mut jobs = self.jobs.lock().unwrap();
        let id = jobs.len() as i64 + 1;
        let mut job = template_config_job(id, new.template_id);
        job.name = new.name;
        job.priority = new.priority;
        job.template_path = new.template_path;
        job.clustering = new.clustering;
        jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: i64) -> Result<Option<TemplateConfigJob>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn get_with_template(&self, id: i64) -> Result<Option<(TemplateConfigJob, Template)>> {
        let job = self.jobs.lock().unwrap().get(&id).cloned();
        Ok(job.and_then(|j| {
            self.templates
                .lock()
                .unwrap()
                .get(&j.template_id)
                .cloned()
                .map(|t| (j, t))
        }))
    }

    async fn mark_queued(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Queued;
        job.processing_started_at = Some(at);
        Ok(())
    }

    async fn mark_processing(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Processing;
        job.processing_started_at.get_or_insert(at);
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_owned());
        Ok(())
    }

    async fn is_cancelled(&self, id: i64) -> Result<bool> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(&id)
            .is_some_and(|j| j.status == JobStatus::Cancelled))
    }

    async fn apply_completed(
        &self,
        id: i64,
        applied: &TemplateConfigApplied,
    ) -> Result<ResultApplication> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(ResultApplication::NotFound);
        };
        if job.status.is_terminal() {
            return Ok(ResultApplication::AlreadyTerminal);
        }
        job.status = JobStatus::Completed;
        job.template_config_path = Some(applied.template_config_path.clone());
        job.output_image_path = Some(applied.output_image_path.clone());
        job.result_image_path = applied.result_image_path.clone();
        job.processing_completed_at = Some(applied.completed_at);

        let mut templates = self.templates.lock().unwrap();
        if let Some(tpl) = templates.get_mut(&job.template_id) {
            tpl.status = JobStatus::Completed;
            tpl.configuration_file_id = applied.configuration_file_id;
            tpl.template_file_id = applied.template_file_id;
            if let Some(n) = applied.num_questions {
                tpl.num_questions = n as i32;
            }
            if let Some(n) = applied.options_per_question {
                tpl.options_per_question = n as i32;
            }
        }
        Ok(ResultApplication::Applied)
    }

    async fn apply_failed(
        &self,
        id: i64,
        error: &str,
        at: DateTime<Utc>,
    ) -> Result<ResultApplication> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(ResultApplication::NotFound);
        };
        if job.status.is_terminal() {
            return Ok(ResultApplication::AlreadyTerminal);
        }
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_owned());
        job.processing_completed_at = Some(at);
        if let Some(tpl) = self.templates.lock().unwrap().get_mut(&job.template_id) {
            tpl.status = JobStatus::Failed;
        }
        Ok(ResultApplication::Applied)
    }
}

#[derive(Default)]
pub struct FakeMarkingConfigJobs {
    pub jobs: Mutex<HashMap<i64, MarkingConfigJob>>,
    pub templates: Mutex<HashMap<i64, Template>>,
}

impl FakeMarkingConfigJobs {
    pub fn with(job: MarkingConfigJob, tpl: Template) -> Self {
        let fake = Self::default();
        fake.templates.lock().unwrap().insert(tpl.id, tpl);
        fake.jobs.lock().unwrap().insert(job.id, job);
        fake
    }

    pub fn job(&self, id: i64) -> MarkingConfigJob {
        self.jobs.lock().unwrap().get(&id).cloned().unwrap()
    }
}

#[async_trait]
impl MarkingConfigJobRepository for FakeMarkingConfigJobs {
    async fn insert(&self, new: NewMarkingConfigJob) -> Result<MarkingConfigJob> {
        let mut jobs = self.jobs.lock().unwrap();
        let id = jobs.len() as i64 + 1;
        let mut job = marking_config_job(id, new.template_id);
        job.name = new.name;
        jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: i64) -> Result<Option<MarkingConfigJob>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn get_with_template(&self, id: i64) -> Result<Option<(MarkingConfigJob, Template)>> {
        let job = self.jobs.lock().unwrap().get(&id).cloned();
        Ok(job.and_then(|j| {
            self.templates
                .lock()
                .unwrap()
                .get(&j.template_id)
                .cloned()
                .map(|t| (j, t))
        }))
    }

    async fn mark_queued(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Queued;
        job.processing_started_at = Some(at);
        Ok(())
    }

    async fn mark_processing(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Processing;
        job.processing_started_at.get_or_insert(at);
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_owned());
        Ok(())
    }

    async fn is_cancelled(&self, id: i64) -> Result<bool> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(&id)
            .is_some_and(|j| j.status == JobStatus::Cancelled))
    }

    async fn apply_completed(
        &self,
        id: i64,
        applied: &MarkingConfigApplied,
    ) -> Result<ResultApplication> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(ResultApplication::NotFound);
        };
        if job.status.is_terminal() {
            return Ok(ResultApplication::AlreadyTerminal);
        }
        job.status = JobStatus::Completed;
        job.marking_config_path = Some(applied.marking_config_path.clone());
        job.processing_completed_at = Some(applied.completed_at);
        Ok(ResultApplication::Applied)
    }

    async fn apply_failed(
        &self,
        id: i64,
        error: &str,
        at: DateTime<Utc>,
    ) -> Result<ResultApplication> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(ResultApplication::NotFound);
        };
        if job.status.is_terminal() {
            return Ok(ResultApplication::AlreadyTerminal);
        }
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_owned());
        job.processing_completed_at = Some(at);
        Ok(ResultApplication::Applied)
    }
}

#[derive(Default)]
pub struct FakeMarkingJobs {
    pub jobs: Mutex<HashMap<i64, MarkingJob>>,
    pub templates: Mutex<HashMap<i64, Template>>,
}

impl FakeMarkingJobs {
    pub fn with(job: MarkingJob, tpl: Template) -> Self {
        let fake = Self::default();
        fake.templates.lock().unwrap().insert(tpl.id, tpl);
        fake.jobs.lock().unwrap().insert(job.id, job);
        fake
    }

    pub fn job(&self, id: i64) -> MarkingJob {
        self.jobs.lock().unwrap().get(&id).cloned().unwrap()
    }
}

#[async_trait]
impl MarkingJobRepository for FakeMarkingJobs {
    async fn insert(&self, new: NewMarkingJob) -> Result<MarkingJob> {
        let mut jobs = self.jobs.lock().unwrap();
        let id = jobs.len() as i64 + 1;
        let mut job = marking_job(id, new.template_id);
        job.name = new.name;
        jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: i64) -> Result<Option<MarkingJob>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn get_with_template(&self, id: i64) -> Result<Option<(MarkingJob, Template)>> {
        let job = self.jobs.lock().unwrap().get(&id).cloned();
        Ok(job.and_then(|j| {
            self.templates
                .lock()
                .unwrap()
                .get(&j.template_id)
                .cloned()
                .map(|t| (j, t))
        }))
    }

    async fn mark_queued(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Queued;
        job.processing_started_at = Some(at);
        Ok(())
    }

    async fn mark_processing(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Processing;
        job.processing_started_at.get_or_insert(at);
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or_else(|| Error::not_found("job"))?;
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_owned());
        Ok(())
    }

    async fn is_cancelled(&self, id: i64) -> Result<bool> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(&id)
            .is_some_and(|j| j.status == JobStatus::Cancelled))
    }

    async fn apply_completed(
        &self,
        id: i64,
        applied: &MarkingJobApplied,
    ) -> Result<ResultApplication> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(ResultApplication::NotFound);
        };
        if job.status.is_terminal() {
            return Ok(ResultApplication::AlreadyTerminal);
        }
        job.status = applied.final_status;
        job.total_answer_sheets = applied.total_answer_sheets as i32;
        job.processed_answer_sheets = applied.processed_answer_sheets as i32;
        job.failed_answer_sheets = applied.failed_answer_sheets as i32;
        job.results_summary = Some(serde_json::to_value(&applied.results_summary).unwrap());
        job.processing_completed_at = Some(applied.completed_at);
        Ok(ResultApplication::Applied)
    }

    async fn apply_failed(
        &self,
        id: i64,
        error: &str,
        at: DateTime<Utc>,
    ) -> Result<ResultApplication> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(ResultApplication::NotFound);
        };
        if job.status.is_terminal() {
            return Ok(ResultApplication::AlreadyTerminal);
        }
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_owned());
        job.processing_completed_at = Some(at);
        Ok(ResultApplication::Applied)
    }
}

#[derive(Default)]
pub struct FakeFiles {
    pub records: Mutex<HashMap<i64, FileOrFolder>>,
}

impl FakeFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: i64, path: &str) {
        let record = FileOrFolder {
            id,
            name: path.to_owned(),
            original_name: path.to_owned(),
            path: path.to_owned(),
            size: 1,
            extension: None,
            file_type: omr_domain::entities::FileType::Other,
            status: omr_domain::entities::FileStatus::Uploaded,
            deletion_date: Utc::now(),
            owner: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.records.lock().unwrap().insert(id, record);
    }
}

#[async_trait]
impl FileRepository for FakeFiles {
    async fn insert(&self, file: NewFileOrFolder) -> Result<FileOrFolder> {
        let mut records = self.records.lock().unwrap();
        let id = records.len() as i64 + 1;
        let record = FileOrFolder {
            id,
            name: file.name,
            original_name: file.original_name,
            path: file.path,
            size: file.size,
            extension: file.extension,
            file_type: file.file_type,
            status: file.status,
            deletion_date: file.deletion_date,
            owner: file.owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<FileOrFolder>> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_owner(&self, owner: i64) -> Result<Vec<FileOrFolder>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.owner == owner)
            .cloned()
            .collect())
    }

    async fn mark_deleted(&self, id: i64) -> Result<()> {
        if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
            record.status = omr_domain::entities::FileStatus::Deleted;
        }
        Ok(())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileOrFolder>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.deletion_date < now)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Job control (worker's narrow repository slice)
// ============================================================================

#[derive(Default)]
pub struct FakeControl {
    pub processing: Mutex<Vec<(JobKind, i64)>>,
    pub cancelled: Mutex<HashSet<(JobKind, i64)>>,
}

impl FakeControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self, kind: JobKind, job_id: i64) {
        self.cancelled.lock().unwrap().insert((kind, job_id));
    }

    pub fn processing_marks(&self) -> Vec<(JobKind, i64)> {
        self.processing.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobControlRepository for FakeControl {
    async fn mark_processing(&self, kind: JobKind, job_id: i64, _at: DateTime<Utc>) -> Result<()> {
        self.processing.lock().unwrap().push((kind, job_id));
        Ok(())
    }

    async fn is_cancelled(&self, kind: JobKind, job_id: i64) -> Result<bool> {
        Ok(self.cancelled.lock().unwrap().contains(&(kind, job_id)))
    }
}

// ============================================================================
// Vision
// ============================================================================

/// Sheets are plain JSON arrays of 0/1 in the fake; a sheet whose bytes
/// equal `b"unalignable"` fails homography estimation.
#[derive(Default)]
pub struct FakeMarkingVision;

impl FakeMarkingVision {
    pub fn new() -> Self {
        Self
    }
}

impl MarkingVision for FakeMarkingVision {
    fn estimate_homography(&self, _reference: &[u8], target: &[u8]) -> Result<Option<Homography>> {
        if target == b"unalignable" {
            return Ok(None);
        }
        // Plain translation; distinct from identity.
        Ok(Some(Homography::from_row_major([
            1.0, 0.0, 10.0, 0.0, 1.0, 10.0, 0.0, 0.0, 1.0,
        ])))
    }

    fn read_marks(
        &self,
        image: &[u8],
        homography: &Homography,
        bubbles: &[PointF],
    ) -> Result<Vec<BubbleMark>> {
        let flags: Vec<u8> = serde_json::from_slice(image)
            .map_err(|e| Error::vision(format!("fake sheet not parseable: {e}")))?;
        if flags.len() != bubbles.len() {
            return Err(Error::vision(format!(
                "fake sheet has {} flags for {} bubbles",
                flags.len(),
                bubbles.len()
            )));
        }
        Ok(flags
            .iter()
            .zip(bubbles)
            .map(|(flag, b)| {
                let p = homography.apply(*b);
                BubbleMark(*flag, p.x as i32, p.y as i32)
            })
            .collect())
    }

    fn annotate(
        &self,
        _image: &[u8],
        _marks: &[BubbleMark],
        _classes: &[BubbleClass],
    ) -> Result<Vec<u8>> {
        Ok(b"annotated".to_vec())
    }
}

/// Canned grid output; an image of `b"bad"` fails detection.
pub struct FakeTemplateVision;

pub fn small_grid_config() -> TemplateConfig {
    let mut columns = std::collections::BTreeMap::new();
    columns.insert("1".to_owned(), ColumnStart { starting_x: 100, starting_y: 200 });
    TemplateConfig {
        metadata: TemplateConfigMetadata {
            num_questions: 3,
            column_row_distribution: vec![3],
            options_per_question: 2,
            num_columns: 1,
        },
        bubble_configs: Some(GridBubbleConfig {
            x_offset: 40,
            y_offset: 50,
            columns,
        }),
        bubbles: None,
    }
}

impl TemplateVision for FakeTemplateVision {
    fn detect_grid(&self, image: &[u8], want_annotated: bool) -> Result<TemplateConfigOutput> {
        if image == b"bad" {
            return Err(Error::validation(
                "Less than 4 calibration rectangles found",
            ));
        }
        Ok(TemplateConfigOutput {
            config: small_grid_config(),
            warped_image: b"warped".to_vec(),
            annotated_image: want_annotated.then(|| b"annotated".to_vec()),
            dimensions: ImageDimensions {
                original_width: 2400,
                original_height: 3200,
                processed_width: 1200,
                processed_height: 1600,
            },
        })
    }

    fn detect_clustering(
        &self,
        image: &[u8],
        _params: &ClusteringParams,
        want_annotated: bool,
    ) -> Result<TemplateConfigOutput> {
        self.detect_grid(image, want_annotated)
    }
}

pub struct FakeDetector;

impl IndexSectionDetector for FakeDetector {
    fn extract_index_section(&self, image: &[u8]) -> Result<Vec<u8>> {
        let mut crop = image.to_vec();
        crop.extend_from_slice(b"-crop");
        Ok(crop)
    }
}

pub struct FakeOcr {
    reading: IndexReading,
}

impl FakeOcr {
    pub fn with(text: &str, confidence: f64) -> Self {
        Self {
            reading: IndexReading {
                text: text.to_owned(),
                confidence,
            },
        }
    }
}

#[async_trait]
impl OcrProvider for FakeOcr {
    async fn recognize_digits(&self, _image: &[u8]) -> Result<IndexReading> {
        Ok(self.reading.clone())
    }
}

/// Renders rows as JSON so tests can read them back.
pub struct JsonSheetWriter;

impl ResultSheetWriter for JsonSheetWriter {
    fn render(
        &self,
        _sheet_name: &str,
        rows: &[omr_domain::entities::AnswerSheetResult],
    ) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(rows)?)
    }
}
