//! Subcommand implementations.

use anyhow::Result;

use omr_infrastructure::bootstrap::AppContext;
use omr_infrastructure::config::AppConfig;

use crate::SubmitKind;

/// Run a long-lived service until it stops or SIGINT arrives.
macro_rules! run_until_interrupted {
    ($service:expr, $name:literal) => {
        tokio::select! {
            outcome = $service.run() => outcome?,
            _ = tokio::signal::ctrl_c() => {
                omr_domain::info!("cli", concat!($name, " interrupted, shutting down"));
            }
        }
    };
}

pub async fn run_worker(config: AppConfig) -> Result<()> {
    let context = AppContext::build(config).await?;
    let worker = context.worker();
    run_until_interrupted!(worker, "worker");
    Ok(())
}

pub async fn run_control(config: AppConfig) -> Result<()> {
    let context = AppContext::build(config).await?;
    let control = context.control_plane();
    run_until_interrupted!(control, "control plane");
    Ok(())
}

pub async fn run_index_service(config: AppConfig) -> Result<()> {
    let context = AppContext::build(config).await?;
    let service = context.index_service()?;
    run_until_interrupted!(service, "index service");
    Ok(())
}

pub async fn submit(config: AppConfig, kind: SubmitKind, id: i64) -> Result<()> {
    let context = AppContext::build(config).await?;
    match kind {
        SubmitKind::TemplateConfig => context.template_config_producer().submit(id).await?,
        SubmitKind::MarkingConfig => context.marking_config_producer().submit(id).await?,
        SubmitKind::Marking => context.marking_job_producer().submit(id).await?,
    }
    Ok(())
}

pub async fn init_db(config: AppConfig) -> Result<()> {
    let context = AppContext::build(config).await?;
    context.init_schema().await?;
    omr_domain::info!("cli", "Database schema created");
    Ok(())
}

pub async fn cleanup(config: AppConfig) -> Result<()> {
    let context = AppContext::build(config).await?;
    let removed = context.cleanup_expired().await?;
    omr_domain::info!("cli", "Cleanup finished", &format!("{removed} artifacts removed"));
    Ok(())
}
