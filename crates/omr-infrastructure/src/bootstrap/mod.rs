//! Composition root: wires providers into the application services.
//!
//! One `AppContext` per process. The broker connection, artifact store,
//! database, repositories, and event bus are shared; each entry point
//! (worker, control plane, index service, producers) assembles its service
//! graph from them.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use omr_application::consumers::{
    MarkingConfigResultConsumer, MarkingJobResultConsumer, TemplateConfigResultConsumer,
};
use omr_application::index_router::IndexResultRouter;
use omr_application::index_service::{IndexService, IndexTaskHandler};
use omr_application::orchestrator::{MarkingOrchestrator, MarkingOrchestratorDeps};
use omr_application::producers::{
    MarkingConfigProducer, MarkingJobProducer, TemplateConfigProducer,
};
use omr_application::worker::{
    ControlPlane, MarkingConfigHandler, MarkingJobHandler, TemplateConfigHandler, Worker,
    WorkerDeps,
};
use omr_domain::error::Result;
use omr_domain::ports::{
    ArtifactStore, BrokerProvider, EventBusProvider, FileRepository, JobControlRepository,
    MarkingConfigJobRepository, MarkingJobRepository, TemplateConfigJobRepository,
    TemplateRepository,
};
use omr_domain::registry::JobKind;
use omr_providers::broker::{LapinBroker, QueueBinding};
use omr_providers::database::seaorm;
use omr_providers::database::seaorm::repos::{
    SeaOrmFileRepository, SeaOrmJobControlRepository, SeaOrmMarkingConfigJobRepository,
    SeaOrmMarkingJobRepository, SeaOrmTemplateConfigJobRepository, SeaOrmTemplateRepository,
};
use omr_providers::ocr::{TesseractOcr, TesseractSettings};
use omr_providers::spreadsheet::XlsxResultSheetWriter;
use omr_providers::storage::LocalArtifactStore;
use omr_providers::vision::{AnchorMarkingVision, ContourIndexSectionDetector, OmrTemplateVision};

use crate::config::AppConfig;
use crate::events::BroadcastEventBus;

/// Everything a process entry point needs.
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn ArtifactStore>,
    pub broker: Arc<dyn BrokerProvider>,
    pub event_bus: Arc<dyn EventBusProvider>,
    pub db: Arc<DatabaseConnection>,
    pub templates: Arc<dyn TemplateRepository>,
    pub template_config_jobs: Arc<dyn TemplateConfigJobRepository>,
    pub marking_config_jobs: Arc<dyn MarkingConfigJobRepository>,
    pub marking_jobs: Arc<dyn MarkingJobRepository>,
    pub files: Arc<dyn FileRepository>,
    pub job_control: Arc<dyn JobControlRepository>,
}

/// The full queue topology, declared on connect so producers, workers, and
/// consumers can start in any order.
fn queue_bindings(config: &AppConfig) -> Vec<QueueBinding> {
    JobKind::ALL
        .iter()
        .flat_map(|kind| {
            [
                QueueBinding {
                    queue: config.queues.request_queue(*kind).to_owned(),
                    routing_key: kind.request_routing_key().to_owned(),
                },
                QueueBinding {
                    queue: config.queues.result_queue(*kind).to_owned(),
                    routing_key: kind.result_routing_key().to_owned(),
                },
            ]
        })
        .collect()
}

impl AppContext {
    /// Connect to the broker and the database, open the artifact store,
    /// and build the repository set.
    pub async fn build(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn ArtifactStore> =
            Arc::new(LocalArtifactStore::new(&config.storage.root)?);
        let broker: Arc<dyn BrokerProvider> = Arc::new(
            LapinBroker::connect(&config.broker.url, &queue_bindings(&config)).await?,
        );
        let db = Arc::new(seaorm::connect(&config.database.url).await?);

        let templates: Arc<dyn TemplateRepository> =
            Arc::new(SeaOrmTemplateRepository::new(db.clone()));
        let template_config_jobs: Arc<dyn TemplateConfigJobRepository> =
            Arc::new(SeaOrmTemplateConfigJobRepository::new(db.clone()));
        let marking_config_jobs: Arc<dyn MarkingConfigJobRepository> =
            Arc::new(SeaOrmMarkingConfigJobRepository::new(db.clone()));
        let marking_jobs: Arc<dyn MarkingJobRepository> =
            Arc::new(SeaOrmMarkingJobRepository::new(db.clone()));
        let files: Arc<dyn FileRepository> = Arc::new(SeaOrmFileRepository::new(db.clone()));
        let job_control: Arc<dyn JobControlRepository> = Arc::new(SeaOrmJobControlRepository::new(
            template_config_jobs.clone(),
            marking_config_jobs.clone(),
            marking_jobs.clone(),
        ));

        Ok(Self {
            event_bus: Arc::new(BroadcastEventBus::new()),
            config,
            store,
            broker,
            db,
            templates,
            template_config_jobs,
            marking_config_jobs,
            marking_jobs,
            files,
            job_control,
        })
    }

    /// Create the database schema (idempotent).
    pub async fn init_schema(&self) -> Result<()> {
        seaorm::schema::create_schema(&self.db).await
    }

    fn worker_deps(&self) -> WorkerDeps {
        WorkerDeps {
            store: self.store.clone(),
            broker: self.broker.clone(),
            control: self.job_control.clone(),
            events: self.event_bus.clone(),
        }
    }

    /// Assemble the data-plane worker (three input queues + index fan-in).
    #[must_use]
    pub fn worker(&self) -> Worker {
        let router = Arc::new(IndexResultRouter::new());
        let marking_vision = Arc::new(AnchorMarkingVision::new());

        let orchestrator = Arc::new(MarkingOrchestrator::new(MarkingOrchestratorDeps {
            store: self.store.clone(),
            broker: self.broker.clone(),
            vision: marking_vision.clone(),
            writer: Arc::new(XlsxResultSheetWriter::new()),
            router: router.clone(),
            control: self.job_control.clone(),
            events: self.event_bus.clone(),
            settings: self.config.worker.orchestrator_settings(),
        }));

        Worker::new(
            self.broker.clone(),
            self.config.queues.queue_names(),
            Arc::new(TemplateConfigHandler::new(
                self.worker_deps(),
                Arc::new(OmrTemplateVision::new()),
            )),
            Arc::new(MarkingConfigHandler::new(self.worker_deps(), marking_vision)),
            Arc::new(MarkingJobHandler::new(self.worker_deps(), orchestrator)),
            router,
        )
    }

    /// Assemble the control plane (three result consumers).
    #[must_use]
    pub fn control_plane(&self) -> ControlPlane {
        ControlPlane::new(
            self.broker.clone(),
            self.config.queues.queue_names(),
            Arc::new(TemplateConfigResultConsumer::new(
                self.template_config_jobs.clone(),
                self.files.clone(),
                self.store.clone(),
                self.event_bus.clone(),
            )),
            Arc::new(MarkingConfigResultConsumer::new(
                self.marking_config_jobs.clone(),
                self.event_bus.clone(),
            )),
            Arc::new(MarkingJobResultConsumer::new(
                self.marking_jobs.clone(),
                self.event_bus.clone(),
            )),
        )
    }

    /// Assemble the standalone index recognizer service.
    pub fn index_service(&self) -> Result<IndexService> {
        let ocr = TesseractOcr::new(TesseractSettings {
            binary: self.config.ocr.tesseract_path.clone(),
            page_segmentation_mode: self.config.ocr.page_segmentation_mode,
            whitelist: self.config.ocr.whitelist.clone(),
        })?;
        let handler = IndexTaskHandler::new(
            self.store.clone(),
            self.broker.clone(),
            Arc::new(ContourIndexSectionDetector::new(self.config.ocr.blur_spread)),
            Arc::new(ocr),
        );
        Ok(IndexService::new(
            self.broker.clone(),
            self.config.queues.queue_names(),
            Arc::new(handler),
        ))
    }

    /// Producer for template-configuration jobs.
    #[must_use]
    pub fn template_config_producer(&self) -> TemplateConfigProducer {
        TemplateConfigProducer::new(
            self.template_config_jobs.clone(),
            self.broker.clone(),
            self.event_bus.clone(),
        )
    }

    /// Producer for marking-configuration jobs.
    #[must_use]
    pub fn marking_config_producer(&self) -> MarkingConfigProducer {
        MarkingConfigProducer::new(
            self.marking_config_jobs.clone(),
            self.broker.clone(),
            self.event_bus.clone(),
        )
    }

    /// Producer for batch marking jobs.
    #[must_use]
    pub fn marking_job_producer(&self) -> MarkingJobProducer {
        MarkingJobProducer::new(
            self.marking_jobs.clone(),
            self.files.clone(),
            self.broker.clone(),
            self.event_bus.clone(),
        )
    }

    /// Retention sweep: delete artifacts whose `deletion_date` has passed
    /// and tombstone their records. Returns the number removed.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let expired = self.files.list_expired(chrono::Utc::now()).await?;
        let mut removed = 0u64;
        for record in expired {
            self.store.delete(&record.path).await?;
            self.files.mark_deleted(record.id).await?;
            removed += 1;
        }
        omr_domain::info!(
            "cleanup",
            "Expired artifacts removed",
            &removed.to_string()
        );
        Ok(removed)
    }
}
