//! Marking orchestrator: the fan-out/fan-in hot path of a batch job.
//!
//! For one `MarkingJob`: compute the scheme answers once, score every sheet
//! in lexical file order, fan out one index-recognition request per scored
//! sheet, collect index results against a bounded deadline, assemble the
//! spreadsheet, and return the result payload for the worker to publish.
//!
//! Rows are appended in sheet-file order; index updates arrive in arbitrary
//! order and are applied by `sheet_id`, which equals the row position.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, timeout_at};

use omr_domain::constants::vision::LOW_CONFIDENCE_THRESHOLD;
use omr_domain::entities::{AnswerSheetResult, FlagReason};
use omr_domain::error::{Error, Result};
use omr_domain::events::DomainEvent;
use omr_domain::ports::{
    ArtifactStore, BrokerProvider, BubbleClass, EventBusProvider, JobControlRepository,
    MarkingVision, ResultSheetWriter,
};
use omr_domain::registry::{
    IndexTaskRequest, JobKind, MarkingJobRequest, MarkingJobResult, SheetSummary,
};
use omr_domain::value_objects::{BubbleMark, Homography, JobPriority, PointF, TemplateConfig};

use crate::index_router::IndexResultRouter;
use crate::scoring;

/// Fan-in deadline tuning.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    /// Budget per outstanding sheet.
    pub index_deadline_per_sheet: Duration,
    /// Hard cap on the whole fan-in wait.
    pub index_deadline_cap: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            index_deadline_per_sheet: Duration::from_secs(30),
            index_deadline_cap: Duration::from_secs(300),
        }
    }
}

/// Orchestrates one marking batch end to end.
pub struct MarkingOrchestrator {
    store: Arc<dyn ArtifactStore>,
    broker: Arc<dyn BrokerProvider>,
    vision: Arc<dyn MarkingVision>,
    writer: Arc<dyn ResultSheetWriter>,
    router: Arc<IndexResultRouter>,
    control: Arc<dyn JobControlRepository>,
    events: Arc<dyn EventBusProvider>,
    settings: OrchestratorSettings,
}

/// Constructor dependencies for [`MarkingOrchestrator`].
pub struct MarkingOrchestratorDeps {
    pub store: Arc<dyn ArtifactStore>,
    pub broker: Arc<dyn BrokerProvider>,
    pub vision: Arc<dyn MarkingVision>,
    pub writer: Arc<dyn ResultSheetWriter>,
    pub router: Arc<IndexResultRouter>,
    pub control: Arc<dyn JobControlRepository>,
    pub events: Arc<dyn EventBusProvider>,
    pub settings: OrchestratorSettings,
}

enum SheetOutcome {
    Aligned(Vec<BubbleMark>),
    AlignmentFailed,
}

impl MarkingOrchestrator {
    pub fn new(deps: MarkingOrchestratorDeps) -> Self {
        Self {
            store: deps.store,
            broker: deps.broker,
            vision: deps.vision,
            writer: deps.writer,
            router: deps.router,
            control: deps.control,
            events: deps.events,
            settings: deps.settings,
        }
    }

    /// Run the batch. Registers for index results before any fan-out and
    /// always deregisters, even on error.
    pub async fn run(&self, request: &MarkingJobRequest) -> Result<MarkingJobResult> {
        let mut rx = self.router.register(request.id);
        let result = self.run_batch(request, &mut rx).await;
        self.router.deregister(request.id);
        result
    }

    async fn run_batch(
        &self,
        request: &MarkingJobRequest,
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<omr_domain::registry::IndexTaskResult>,
    ) -> Result<MarkingJobResult> {
        let started_at = Utc::now();

        let template_image = self.store.get(&request.template_path).await?;
        let scheme_image = self.store.get(&request.marking_scheme_path).await?;
        let config: TemplateConfig =
            serde_json::from_slice(&self.store.get(&request.template_config_path).await?)?;
        let bubbles = config.bubble_coordinates()?;
        let choice_distribution = config.choice_distribution();
        let column_rows = config.metadata.column_row_distribution.clone();

        self.check_cancelled(request.id).await?;

        // Scheme answers are computed once per batch; every sheet scores
        // against these flags.
        let scheme_marks = self
            .read_sheet(&template_image, &scheme_image, &bubbles)
            .await?;
        let scheme_marks = match scheme_marks {
            SheetOutcome::Aligned(marks) => marks,
            SheetOutcome::AlignmentFailed => {
                return Err(Error::validation(
                    "could not align marking scheme with template",
                ));
            }
        };
        let scheme_flags: Vec<bool> = scheme_marks.iter().map(BubbleMark::is_marked).collect();

        let sheets = self
            .store
            .list(&request.answer_sheets_folder_path, "*")
            .await?;
        let total = sheets.len() as u32;
        omr_domain::info!(
            "orchestrator",
            "Marking batch started",
            &format!("job={} sheets={total}", request.id)
        );

        let mut rows: Vec<AnswerSheetResult> = Vec::with_capacity(sheets.len());
        let mut outstanding: HashSet<u32> = HashSet::new();
        let mut processed = 0u32;
        let mut failed = 0u32;

        for (i, sheet_path) in sheets.iter().enumerate() {
            let sheet_id = i as u32;
            self.check_cancelled(request.id).await?;

            let (sheet_image, outcome) = match self.store.get(sheet_path).await {
                Ok(sheet_image) => {
                    let outcome = self
                        .read_sheet(&template_image, &sheet_image, &bubbles)
                        .await?;
                    (sheet_image, outcome)
                }
                Err(e) => {
                    omr_domain::warn!(
                        "orchestrator",
                        "Answer sheet unreadable",
                        &format!("job={} sheet={sheet_path}: {e}", request.id)
                    );
                    (Vec::new(), SheetOutcome::AlignmentFailed)
                }
            };

            match outcome {
                SheetOutcome::AlignmentFailed => {
                    failed += 1;
                    rows.push(AnswerSheetResult::alignment_failed(
                        sheet_id,
                        sheet_path,
                        column_rows.len().max(1),
                    ));
                }
                SheetOutcome::Aligned(marks) => {
                    let flags: Vec<bool> = marks.iter().map(BubbleMark::is_marked).collect();
                    let breakdown = scoring::score_sheet(
                        &scheme_flags,
                        &flags,
                        &choice_distribution,
                        &column_rows,
                    )?;

                    if request.save_intermediate_results {
                        let classes = scoring::bubble_classes(&breakdown, &choice_distribution);
                        self.save_annotated(request, sheet_id, &sheet_image, &marks, classes)
                            .await;
                    }

                    self.dispatch_index_request(request.id, sheet_id, sheet_path)
                        .await;
                    outstanding.insert(sheet_id);

                    let _ = self
                        .events
                        .publish_event(DomainEvent::SheetScored {
                            job_id: request.id,
                            sheet_id,
                            score: breakdown.score,
                            flagged: breakdown.is_flagged(),
                        })
                        .await;

                    rows.push(AnswerSheetResult {
                        sheet_id,
                        path: sheet_path.clone(),
                        flag: breakdown.is_flagged(),
                        flag_reason: breakdown.first_flag,
                        score: breakdown.score,
                        correct: breakdown.correct,
                        incorrect: breakdown.incorrect,
                        multi_marked: breakdown.multi_marked,
                        unmarked: breakdown.unmarked,
                        column_totals: breakdown.column_totals,
                        index_number: None,
                        index_confidence: None,
                        labeled_points: marks,
                    });
                    processed += 1;
                }
            }
        }

        self.collect_index_results(request.id, &mut rows, &mut outstanding, rx)
            .await;

        let workbook = {
            let writer = Arc::clone(&self.writer);
            let name = request.name.clone();
            let rows = rows.clone();
            tokio::task::spawn_blocking(move || writer.render(&name, &rows))
                .await
                .map_err(|e| Error::internal(format!("spreadsheet task panicked: {e}")))??
        };
        // Re-running the batch overwrites the same output path.
        self.store.save(&request.output_path, &workbook).await?;

        let results_summary = rows
            .iter()
            .map(|row| SheetSummary {
                sheet_id: row.sheet_id,
                path: row.path.clone(),
                score: row.score,
                flag: row.flag,
                flag_reason: row.flag_reason.map(|r| r.as_str().to_owned()),
                index_number: row.index_number.clone(),
            })
            .collect();

        omr_domain::info!(
            "orchestrator",
            "Marking batch finished",
            &format!("job={} processed={processed} failed={failed}", request.id)
        );

        Ok(MarkingJobResult {
            output_path: request.output_path.clone(),
            intermediate_results_path: request
                .save_intermediate_results
                .then(|| request.intermediate_results_path.clone())
                .flatten(),
            total_answer_sheets: total,
            processed_answer_sheets: processed,
            failed_answer_sheets: failed,
            processing_started_at: started_at,
            processing_completed_at: Utc::now(),
            results_summary,
        })
    }

    async fn check_cancelled(&self, job_id: i64) -> Result<()> {
        if self.control.is_cancelled(JobKind::Marking, job_id).await? {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    async fn read_sheet(
        &self,
        reference: &[u8],
        target: &[u8],
        bubbles: &[PointF],
    ) -> Result<SheetOutcome> {
        let vision = Arc::clone(&self.vision);
        let reference = reference.to_vec();
        let target = target.to_vec();
        let bubbles = bubbles.to_vec();
        tokio::task::spawn_blocking(move || -> Result<SheetOutcome> {
            let homography: Option<Homography> =
                vision.estimate_homography(&reference, &target)?;
            match homography {
                None => Ok(SheetOutcome::AlignmentFailed),
                Some(h) if h.is_near_identity(1e-3) => Ok(SheetOutcome::AlignmentFailed),
                Some(h) => Ok(SheetOutcome::Aligned(vision.read_marks(&target, &h, &bubbles)?)),
            }
        })
        .await
        .map_err(|e| Error::internal(format!("vision task panicked: {e}")))?
    }

    async fn dispatch_index_request(&self, job_id: i64, sheet_id: u32, sheet_path: &str) {
        let request = IndexTaskRequest {
            task_id: job_id,
            sheet_id,
            file_path: sheet_path.to_owned(),
        };
        let body = match serde_json::to_vec(&request) {
            Ok(b) => b,
            Err(e) => {
                omr_domain::error!(
                    "orchestrator",
                    "Index request serialization failed",
                    &format!("job={job_id} sheet={sheet_id}: {e}")
                );
                return;
            }
        };
        // A lost index request only costs the index number; the sheet row
        // survives and is flagged at the deadline.
        if let Err(e) = self
            .broker
            .publish(
                JobKind::IndexTask.request_routing_key(),
                body,
                JobPriority::Normal.broker_priority(),
            )
            .await
        {
            omr_domain::warn!(
                "orchestrator",
                "Index request publish failed",
                &format!("job={job_id} sheet={sheet_id}: {e}")
            );
        }
    }

    async fn save_annotated(
        &self,
        request: &MarkingJobRequest,
        sheet_id: u32,
        sheet_image: &[u8],
        marks: &[BubbleMark],
        classes: Vec<BubbleClass>,
    ) {
        let Some(dir) = request.intermediate_results_path.as_deref() else {
            return;
        };
        let vision = Arc::clone(&self.vision);
        let image = sheet_image.to_vec();
        let marks = marks.to_vec();
        let annotated = tokio::task::spawn_blocking(move || vision.annotate(&image, &marks, &classes))
            .await;
        match annotated {
            Ok(Ok(bytes)) => {
                let path = format!("{dir}/{sheet_id}.jpg");
                if let Err(e) = self.store.save(&path, &bytes).await {
                    omr_domain::warn!(
                        "orchestrator",
                        "Intermediate image save failed",
                        &format!("job={} sheet={sheet_id}: {e}", request.id)
                    );
                }
            }
            Ok(Err(e)) => {
                omr_domain::warn!(
                    "orchestrator",
                    "Annotation failed",
                    &format!("job={} sheet={sheet_id}: {e}", request.id)
                );
            }
            Err(e) => {
                omr_domain::warn!(
                    "orchestrator",
                    "Annotation task panicked",
                    &format!("job={} sheet={sheet_id}: {e}", request.id)
                );
            }
        }
    }

    /// Fan-in: wait for index results with a bounded deadline and apply
    /// them by row index. Sheets still outstanding at the deadline keep an
    /// empty index and are flagged.
    async fn collect_index_results(
        &self,
        job_id: i64,
        rows: &mut [AnswerSheetResult],
        outstanding: &mut HashSet<u32>,
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<omr_domain::registry::IndexTaskResult>,
    ) {
        if outstanding.is_empty() {
            return;
        }
        let budget = self
            .settings
            .index_deadline_per_sheet
            .checked_mul(outstanding.len() as u32)
            .unwrap_or(self.settings.index_deadline_cap)
            .min(self.settings.index_deadline_cap);
        let deadline = Instant::now() + budget;

        while !outstanding.is_empty() {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some(result)) => {
                    if !outstanding.remove(&result.sheet_id) {
                        omr_domain::debug!(
                            "orchestrator",
                            "Duplicate or unexpected index result",
                            &format!("job={job_id} sheet={}", result.sheet_id)
                        );
                        continue;
                    }
                    let Some(row) = rows.get_mut(result.sheet_id as usize) else {
                        continue;
                    };
                    row.index_number = result.index_number.clone();
                    row.index_confidence = Some(result.confidence);
                    if result.confidence < LOW_CONFIDENCE_THRESHOLD
                        || result.index_number.is_none()
                    {
                        row.flag_if_unflagged(FlagReason::LowIndexConfidence);
                    }
                    let _ = self
                        .events
                        .publish_event(DomainEvent::IndexResolved {
                            job_id,
                            sheet_id: result.sheet_id,
                            confidence: result.confidence,
                        })
                        .await;
                }
                Ok(None) => break,
                Err(_) => break,
            }
        }

        for sheet_id in outstanding.drain() {
            if let Some(row) = rows.get_mut(sheet_id as usize) {
                row.flag_if_unflagged(FlagReason::IndexTimeout);
            }
        }
    }
}
