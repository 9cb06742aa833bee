//! The four job kinds and their broker wiring.

use serde::{Deserialize, Serialize};

use crate::constants::queues::{
    INDEX_TASK_QUEUE, INDEX_TASK_RESULTS_QUEUE, MARKING_CONFIG_QUEUE, MARKING_CONFIG_RESULTS_QUEUE,
    MARKING_JOB_QUEUE, MARKING_JOB_RESULTS_QUEUE, TEMPLATE_CONFIG_QUEUE,
    TEMPLATE_CONFIG_RESULTS_QUEUE,
};

/// The kind of work flowing through the pipeline. Each kind has its own
/// request queue, result queue, and payload schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Detect bubble coordinates on a blank template.
    TemplateConfig,
    /// Cache marked-bubble coordinates from a filled marking scheme.
    MarkingConfig,
    /// Score every sheet in a batch.
    Marking,
    /// Recognize the handwritten student index on one sheet.
    IndexTask,
}

impl JobKind {
    /// Every kind, in declaration order.
    pub const ALL: [JobKind; 4] = [
        JobKind::TemplateConfig,
        JobKind::MarkingConfig,
        JobKind::Marking,
        JobKind::IndexTask,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TemplateConfig => "template_config",
            Self::MarkingConfig => "marking_config",
            Self::Marking => "marking",
            Self::IndexTask => "index_task",
        }
    }

    /// Routing key of the request (control→worker) direction.
    #[must_use]
    pub fn request_routing_key(&self) -> &'static str {
        match self {
            Self::TemplateConfig => "template.config",
            Self::MarkingConfig => "marking.config",
            Self::Marking => "marking.job",
            Self::IndexTask => "index.task",
        }
    }

    /// Routing key of the result (worker→control) direction.
    #[must_use]
    pub fn result_routing_key(&self) -> &'static str {
        match self {
            Self::TemplateConfig => "template.config.result",
            Self::MarkingConfig => "marking.config.result",
            Self::Marking => "marking.job.result",
            Self::IndexTask => "index.task.result",
        }
    }

    /// Default name of the request queue (overridable via configuration).
    #[must_use]
    pub fn default_request_queue(&self) -> &'static str {
        match self {
            Self::TemplateConfig => TEMPLATE_CONFIG_QUEUE,
            Self::MarkingConfig => MARKING_CONFIG_QUEUE,
            Self::Marking => MARKING_JOB_QUEUE,
            Self::IndexTask => INDEX_TASK_QUEUE,
        }
    }

    /// Default name of the result queue (overridable via configuration).
    #[must_use]
    pub fn default_result_queue(&self) -> &'static str {
        match self {
            Self::TemplateConfig => TEMPLATE_CONFIG_RESULTS_QUEUE,
            Self::MarkingConfig => MARKING_CONFIG_RESULTS_QUEUE,
            Self::Marking => MARKING_JOB_RESULTS_QUEUE,
            Self::IndexTask => INDEX_TASK_RESULTS_QUEUE,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
