//! Application layer of the OMR marking pipeline.
//!
//! Use cases composed from domain ports: the control-plane producers and
//! result consumers, the data-plane worker with its three handlers, the
//! marking orchestrator with its index fan-out/fan-in, the standalone
//! index recognizer service, and the pure scoring algorithm.

pub mod consumers;
pub mod index_router;
pub mod index_service;
pub mod orchestrator;
pub mod producers;
pub mod scoring;
pub mod worker;

/// Resolved queue names for the current deployment. Defaults match the
/// registry's queue table; configuration may override any of them.
#[derive(Debug, Clone)]
pub struct QueueNames {
    pub template_config: String,
    pub marking_config: String,
    pub marking_job: String,
    pub index_task: String,
    pub template_config_results: String,
    pub marking_config_results: String,
    pub marking_job_results: String,
    pub index_task_results: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        use omr_domain::registry::JobKind;
        Self {
            template_config: JobKind::TemplateConfig.default_request_queue().to_owned(),
            marking_config: JobKind::MarkingConfig.default_request_queue().to_owned(),
            marking_job: JobKind::Marking.default_request_queue().to_owned(),
            index_task: JobKind::IndexTask.default_request_queue().to_owned(),
            template_config_results: JobKind::TemplateConfig.default_result_queue().to_owned(),
            marking_config_results: JobKind::MarkingConfig.default_result_queue().to_owned(),
            marking_job_results: JobKind::Marking.default_result_queue().to_owned(),
            index_task_results: JobKind::IndexTask.default_result_queue().to_owned(),
        }
    }
}
