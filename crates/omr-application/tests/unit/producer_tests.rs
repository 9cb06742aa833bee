//! Unit tests for the control-plane producers

use std::sync::Arc;

use omr_application::producers::{
    MarkingConfigProducer, MarkingJobProducer, TemplateConfigProducer,
};
use omr_domain::error::Error;
use omr_domain::registry::{MarkingJobRequest, TemplateConfigRequest};
use omr_domain::value_objects::JobStatus;

use crate::utils::{
    FakeBroker, FakeEventBus, FakeFiles, FakeMarkingConfigJobs, FakeMarkingJobs,
    FakeTemplateConfigJobs, marking_config_job, marking_job, template, template_config_job,
};

#[tokio::test]
async fn submit_publishes_with_mapped_priority_and_queues_the_record() {
    let repo = Arc::new(FakeTemplateConfigJobs::with(
        template_config_job(1, 9),
        template(9, JobStatus::Pending),
    ));
    let broker = Arc::new(FakeBroker::new());
    let events = Arc::new(FakeEventBus::new());
    let producer =
        TemplateConfigProducer::new(repo.clone(), broker.clone(), events.clone());

    producer.submit(1).await.unwrap();

    let job = repo.job(1);
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.processing_started_at.is_some());

    let published = broker.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].routing_key, "template.config");
    assert_eq!(published[0].priority, 7); // High

    let request: TemplateConfigRequest = serde_json::from_slice(&published[0].body).unwrap();
    assert_eq!(request.id, 1);
    assert_eq!(request.template_id, 9);
    assert_eq!(request.template_path, "uploads/templates/1/blank.jpg");
}

#[tokio::test]
async fn submit_unknown_job_is_not_found() {
    let repo = Arc::new(FakeTemplateConfigJobs::default());
    let producer = TemplateConfigProducer::new(
        repo,
        Arc::new(FakeBroker::new()),
        Arc::new(FakeEventBus::new()),
    );
    let err = producer.submit(404).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn publish_failure_flips_the_record_to_failed() {
    let repo = Arc::new(FakeTemplateConfigJobs::with(
        template_config_job(1, 9),
        template(9, JobStatus::Pending),
    ));
    let broker = Arc::new(FakeBroker::new());
    broker.fail_publishes();
    let producer = TemplateConfigProducer::new(
        repo.clone(),
        broker.clone(),
        Arc::new(FakeEventBus::new()),
    );

    let err = producer.submit(1).await.unwrap_err();
    assert!(matches!(err, Error::Broker { .. }));

    let job = repo.job(1);
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("publish failure"));
    // No duplicate message reached the broker.
    assert!(broker.published().is_empty());
}

#[tokio::test]
async fn marking_config_fails_fast_on_unconfigured_template() {
    let repo = Arc::new(FakeMarkingConfigJobs::with(
        marking_config_job(3, 9),
        template(9, JobStatus::Processing),
    ));
    let broker = Arc::new(FakeBroker::new());
    let producer =
        MarkingConfigProducer::new(repo.clone(), broker.clone(), Arc::new(FakeEventBus::new()));

    let err = producer.submit(3).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(repo.job(3).status, JobStatus::Failed);
    assert!(broker.published().is_empty());
}

#[tokio::test]
async fn marking_config_happy_path() {
    let repo = Arc::new(FakeMarkingConfigJobs::with(
        marking_config_job(3, 9),
        template(9, JobStatus::Completed),
    ));
    let broker = Arc::new(FakeBroker::new());
    let producer =
        MarkingConfigProducer::new(repo.clone(), broker.clone(), Arc::new(FakeEventBus::new()));

    producer.submit(3).await.unwrap();
    assert_eq!(repo.job(3).status, JobStatus::Queued);
    assert_eq!(broker.published()[0].routing_key, "marking.config");
}

#[tokio::test]
async fn marking_job_resolves_template_artifacts_through_file_records() {
    let mut tpl = template(9, JobStatus::Completed);
    tpl.template_file_id = Some(11);
    tpl.configuration_file_id = Some(12);
    let repo = Arc::new(FakeMarkingJobs::with(marking_job(7, 9), tpl));
    let files = Arc::new(FakeFiles::new());
    files.add(11, "templates/1/9_ab_template.jpg");
    files.add(12, "templates/1/9_ab_config.json");
    let broker = Arc::new(FakeBroker::new());
    let producer = MarkingJobProducer::new(
        repo.clone(),
        files,
        broker.clone(),
        Arc::new(FakeEventBus::new()),
    );

    producer.submit(7).await.unwrap();

    let published = broker.published();
    assert_eq!(published[0].routing_key, "marking.job");
    assert_eq!(published[0].priority, 9); // Urgent

    let request: MarkingJobRequest = serde_json::from_slice(&published[0].body).unwrap();
    assert_eq!(request.template_path, "templates/1/9_ab_template.jpg");
    assert_eq!(request.template_config_path, "templates/1/9_ab_config.json");
    assert_eq!(repo.job(7).status, JobStatus::Queued);
}

#[tokio::test]
async fn marking_job_without_template_artifacts_fails() {
    let repo = Arc::new(FakeMarkingJobs::with(
        marking_job(7, 9),
        template(9, JobStatus::Completed),
    ));
    let producer = MarkingJobProducer::new(
        repo.clone(),
        Arc::new(FakeFiles::new()),
        Arc::new(FakeBroker::new()),
        Arc::new(FakeEventBus::new()),
    );

    let err = producer.submit(7).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(repo.job(7).status, JobStatus::Failed);
}
