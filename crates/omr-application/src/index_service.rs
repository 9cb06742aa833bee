//! Standalone index recognizer service (the OCR side of the fan-out).
//!
//! Consumes index-recognition requests, crops the handwritten-index box,
//! runs recognition, and publishes `{task_id, sheet_id, index_number,
//! confidence, flag}` on the result queue. Like every worker, it emits one
//! envelope per dequeued request even on failure.

use std::sync::Arc;

use async_trait::async_trait;

use omr_domain::constants::vision::LOW_CONFIDENCE_THRESHOLD;
use omr_domain::error::{Error, Result};
use omr_domain::ports::{
    ArtifactStore, BrokerProvider, IndexSectionDetector, MessageHandler, OcrProvider,
};
use omr_domain::registry::{
    IndexFlag, IndexTaskRequest, IndexTaskResult, JobKind, ResultEnvelope,
};

use crate::QueueNames;
use crate::worker::publish_result;

/// Handler for `index_task_queue`.
pub struct IndexTaskHandler {
    store: Arc<dyn ArtifactStore>,
    broker: Arc<dyn BrokerProvider>,
    detector: Arc<dyn IndexSectionDetector>,
    ocr: Arc<dyn OcrProvider>,
}

impl IndexTaskHandler {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        broker: Arc<dyn BrokerProvider>,
        detector: Arc<dyn IndexSectionDetector>,
        ocr: Arc<dyn OcrProvider>,
    ) -> Self {
        Self {
            store,
            broker,
            detector,
            ocr,
        }
    }

    async fn recognize(&self, request: &IndexTaskRequest) -> Result<IndexTaskResult> {
        let image = self.store.get(&request.file_path).await?;

        let detector = Arc::clone(&self.detector);
        let crop = tokio::task::spawn_blocking(move || detector.extract_index_section(&image))
            .await
            .map_err(|e| Error::internal(format!("detector task panicked: {e}")))??;

        let reading = self.ocr.recognize_digits(&crop).await?;
        let flag = if reading.confidence < LOW_CONFIDENCE_THRESHOLD {
            IndexFlag::LowConfidence
        } else {
            IndexFlag::Ok
        };

        Ok(IndexTaskResult {
            task_id: request.task_id,
            sheet_id: request.sheet_id,
            index_number: (!reading.text.is_empty()).then_some(reading.text),
            confidence: reading.confidence,
            flag,
        })
    }
}

#[async_trait]
impl MessageHandler for IndexTaskHandler {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        let request: IndexTaskRequest = serde_json::from_slice(body)?;
        omr_domain::info!(
            "index_service",
            "Index task picked up",
            &format!("task={} sheet={}", request.task_id, request.sheet_id)
        );

        match self.recognize(&request).await {
            Ok(result) => {
                publish_result(
                    &self.broker,
                    JobKind::IndexTask,
                    &ResultEnvelope::completed(request.task_id, result),
                )
                .await
            }
            Err(error) => {
                let envelope: ResultEnvelope<IndexTaskResult> =
                    ResultEnvelope::failed(request.task_id, error.to_string());
                publish_result(&self.broker, JobKind::IndexTask, &envelope).await?;
                omr_domain::error!(
                    "index_service",
                    "Index task failed",
                    &format!("task={} sheet={}: {error}", request.task_id, request.sheet_id)
                );
                Err(error)
            }
        }
    }
}

/// The index recognizer process: one consumer on the task queue.
pub struct IndexService {
    broker: Arc<dyn BrokerProvider>,
    queues: QueueNames,
    handler: Arc<IndexTaskHandler>,
}

impl IndexService {
    pub fn new(
        broker: Arc<dyn BrokerProvider>,
        queues: QueueNames,
        handler: Arc<IndexTaskHandler>,
    ) -> Self {
        Self {
            broker,
            queues,
            handler,
        }
    }

    /// Run the consumer loop until it stops.
    pub async fn run(&self) -> Result<()> {
        omr_domain::info!("index_service", "Index recognizer starting");
        self.broker
            .consume(
                &self.queues.index_task,
                Arc::clone(&self.handler) as Arc<dyn MessageHandler>,
            )
            .await
    }
}
