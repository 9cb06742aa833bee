//! The three input-queue handlers.

use std::sync::Arc;

use async_trait::async_trait;

use omr_domain::entities::template::TemplateConfigType;
use omr_domain::error::{Error, Result};
use omr_domain::ports::{
    ArtifactStore, BrokerProvider, EventBusProvider, JobControlRepository, MarkingVision,
    MessageHandler, TemplateConfigOutput, TemplateVision,
};
use omr_domain::registry::{
    JobKind, MarkingConfigRequest, MarkingConfigResult, MarkingJobRequest, TemplateConfigRequest,
    TemplateConfigResult,
};
use omr_domain::value_objects::{BubbleMark, MarkingConfig, TemplateConfig, paths};

use super::{check_cancelled, process_request};
use crate::orchestrator::MarkingOrchestrator;

/// Dependencies shared by every worker handler.
#[derive(Clone)]
pub struct WorkerDeps {
    pub store: Arc<dyn ArtifactStore>,
    pub broker: Arc<dyn BrokerProvider>,
    pub control: Arc<dyn JobControlRepository>,
    pub events: Arc<dyn EventBusProvider>,
}

/// Handler for `template_config_queue`: anchor detection, warp, bubble
/// detection, and persistence of the config + warped image.
pub struct TemplateConfigHandler {
    deps: WorkerDeps,
    vision: Arc<dyn TemplateVision>,
}

impl TemplateConfigHandler {
    pub fn new(deps: WorkerDeps, vision: Arc<dyn TemplateVision>) -> Self {
        Self { deps, vision }
    }

    async fn configure(&self, request: TemplateConfigRequest) -> Result<TemplateConfigResult> {
        let kind = JobKind::TemplateConfig;
        let image = self.deps.store.get(&request.template_path).await?;
        check_cancelled(&self.deps.control, kind, request.id).await?;

        let vision = Arc::clone(&self.vision);
        let want_annotated = request.save_intermediate_results;
        let output: TemplateConfigOutput = tokio::task::spawn_blocking(move || {
            match request.config_type {
                TemplateConfigType::GridBased => vision.detect_grid(&image, want_annotated),
                TemplateConfigType::ClusteringBased => {
                    let params = request.clustering.ok_or_else(|| {
                        Error::validation("clustering_based job without clustering parameters")
                    })?;
                    vision.detect_clustering(&image, &params, want_annotated)
                }
            }
        })
        .await
        .map_err(|e| Error::internal(format!("vision task panicked: {e}")))??;

        check_cancelled(&self.deps.control, kind, request.id).await?;

        let template_config_path = paths::template_config_path(request.owner, request.template_id);
        let output_image_path = paths::warped_template_path(request.owner, request.template_id);
        self.deps
            .store
            .save(&template_config_path, &serde_json::to_vec(&output.config)?)
            .await?;
        self.deps
            .store
            .save(&output_image_path, &output.warped_image)
            .await?;

        let result_image_path = match output.annotated_image {
            Some(bytes) => {
                let path =
                    paths::template_result_image_path(request.owner, request.template_id);
                self.deps.store.save(&path, &bytes).await?;
                Some(path)
            }
            None => None,
        };

        Ok(TemplateConfigResult {
            template_config_path,
            output_image_path,
            result_image_path,
            bubble_config: output.config,
            image_dimensions: Some(output.dimensions),
        })
    }
}

#[async_trait]
impl MessageHandler for TemplateConfigHandler {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        process_request(
            body,
            JobKind::TemplateConfig,
            &self.deps.broker,
            &self.deps.control,
            &self.deps.events,
            |r: &TemplateConfigRequest| r.id,
            |request| self.configure(request),
        )
        .await
    }
}

/// Handler for `marking_config_queue`: align the filled scheme with the
/// warped template, sample every bubble, and cache the readings.
pub struct MarkingConfigHandler {
    deps: WorkerDeps,
    vision: Arc<dyn MarkingVision>,
}

impl MarkingConfigHandler {
    pub fn new(deps: WorkerDeps, vision: Arc<dyn MarkingVision>) -> Self {
        Self { deps, vision }
    }

    async fn configure(&self, request: MarkingConfigRequest) -> Result<MarkingConfigResult> {
        let kind = JobKind::MarkingConfig;
        let template_image = self.deps.store.get(&request.template_path).await?;
        let scheme_image = self.deps.store.get(&request.marking_scheme_path).await?;
        let config: TemplateConfig =
            serde_json::from_slice(&self.deps.store.get(&request.template_config_path).await?)?;
        let bubbles = config.bubble_coordinates()?;

        check_cancelled(&self.deps.control, kind, request.id).await?;

        let vision = Arc::clone(&self.vision);
        let marks: Vec<BubbleMark> = tokio::task::spawn_blocking(move || {
            let homography = vision
                .estimate_homography(&template_image, &scheme_image)?
                .ok_or_else(|| {
                    Error::validation("could not align marking scheme with template")
                })?;
            vision.read_marks(&scheme_image, &homography, &bubbles)
        })
        .await
        .map_err(|e| Error::internal(format!("vision task panicked: {e}")))??;

        check_cancelled(&self.deps.control, kind, request.id).await?;

        let marking_config = MarkingConfig::new(marks);
        let marking_config_path = paths::marking_config_path(request.owner, request.template_id);
        self.deps
            .store
            .save(&marking_config_path, &serde_json::to_vec(&marking_config)?)
            .await?;

        Ok(MarkingConfigResult {
            marking_config_path,
            marking_scheme_path: request.marking_scheme_path,
        })
    }
}

#[async_trait]
impl MessageHandler for MarkingConfigHandler {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        process_request(
            body,
            JobKind::MarkingConfig,
            &self.deps.broker,
            &self.deps.control,
            &self.deps.events,
            |r: &MarkingConfigRequest| r.id,
            |request| self.configure(request),
        )
        .await
    }
}

/// Handler for `marking_job_queue`: delegates to the orchestrator.
pub struct MarkingJobHandler {
    deps: WorkerDeps,
    orchestrator: Arc<MarkingOrchestrator>,
}

impl MarkingJobHandler {
    pub fn new(deps: WorkerDeps, orchestrator: Arc<MarkingOrchestrator>) -> Self {
        Self { deps, orchestrator }
    }
}

#[async_trait]
impl MessageHandler for MarkingJobHandler {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        process_request(
            body,
            JobKind::Marking,
            &self.deps.broker,
            &self.deps.control,
            &self.deps.events,
            |r: &MarkingJobRequest| r.id,
            |request| async move { self.orchestrator.run(&request).await },
        )
        .await
    }
}
