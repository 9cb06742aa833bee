//! Broker topology constants.
//!
//! Queue names are defaults; deployments may override them through
//! configuration. Routing keys are part of the wire contract and fixed.

/// The single direct exchange every queue is bound to.
pub const EXCHANGE_NAME: &str = "mcq_ocr";

/// Maximum message priority declared on every queue (`x-max-priority`).
pub const MAX_QUEUE_PRIORITY: u8 = 10;

/// Default queue name for template configuration requests.
pub const TEMPLATE_CONFIG_QUEUE: &str = "template_config_queue";
/// Default queue name for marking configuration requests.
pub const MARKING_CONFIG_QUEUE: &str = "marking_config_queue";
/// Default queue name for marking job requests.
pub const MARKING_JOB_QUEUE: &str = "marking_job_queue";
/// Default queue name for index recognition requests.
pub const INDEX_TASK_QUEUE: &str = "index_task_queue";

/// Default queue name for template configuration results.
pub const TEMPLATE_CONFIG_RESULTS_QUEUE: &str = "template_config_results";
/// Default queue name for marking configuration results.
pub const MARKING_CONFIG_RESULTS_QUEUE: &str = "marking_config_results";
/// Default queue name for marking job results.
pub const MARKING_JOB_RESULTS_QUEUE: &str = "marking_job_results";
/// Default queue name for index recognition results.
pub const INDEX_TASK_RESULTS_QUEUE: &str = "index_task_results";

/// Initial reconnect delay when the broker is unreachable (seconds).
pub const RECONNECT_INITIAL_DELAY_SECS: u64 = 2;
/// Multiplier applied to the reconnect delay after each failed attempt.
pub const RECONNECT_BACKOFF_FACTOR: u32 = 2;
/// Connection attempts before giving up fatally.
pub const RECONNECT_MAX_ATTEMPTS: u32 = 5;
/// AMQP heartbeat interval (seconds).
pub const HEARTBEAT_SECS: u64 = 60;
