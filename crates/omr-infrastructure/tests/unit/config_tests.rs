//! Unit tests for configuration loading

use omr_infrastructure::config::AppConfig;

#[test]
fn defaults_match_the_broker_topology() {
    let config = AppConfig::default();
    assert_eq!(config.queues.template_config, "template_config_queue");
    assert_eq!(config.queues.index_task_results, "index_task_results");
    assert_eq!(config.worker.index_deadline_per_sheet_secs, 30);
    assert_eq!(config.worker.index_deadline_cap_secs, 300);
    assert_eq!(config.ocr.whitelist, "0123456789");
    assert!(config.broker.url.starts_with("amqp://"));
}

#[test]
fn environment_overrides_nested_sections() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("OMR_BROKER__URL", "amqp://broker.internal:5672/%2f");
        jail.set_env("OMR_QUEUES__MARKING_JOB", "marking_job_queue_eu");
        jail.set_env("OMR_WORKER__INDEX_DEADLINE_CAP_SECS", "60");

        let config = AppConfig::load_from("does-not-exist.toml").expect("load");
        assert_eq!(config.broker.url, "amqp://broker.internal:5672/%2f");
        assert_eq!(config.queues.marking_job, "marking_job_queue_eu");
        assert_eq!(config.worker.index_deadline_cap_secs, 60);
        // Untouched sections keep their defaults.
        assert_eq!(config.queues.template_config, "template_config_queue");
        Ok(())
    });
}

#[test]
fn toml_file_overrides_defaults() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "omr.toml",
            r#"
                [storage]
                root = "/mnt/omr"

                [logging]
                level = "debug"
                json = true
            "#,
        )?;
        let config = AppConfig::load_from("omr.toml").expect("load");
        assert_eq!(config.storage.root, std::path::PathBuf::from("/mnt/omr"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        Ok(())
    });
}

#[test]
fn orchestrator_settings_convert_to_durations() {
    let config = AppConfig::default();
    let settings = config.worker.orchestrator_settings();
    assert_eq!(settings.index_deadline_per_sheet.as_secs(), 30);
    assert_eq!(settings.index_deadline_cap.as_secs(), 300);
}
