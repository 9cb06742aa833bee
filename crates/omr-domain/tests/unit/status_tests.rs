//! Unit tests for the shared job state machine

use std::str::FromStr;

use omr_domain::value_objects::JobStatus;

#[test]
fn terminal_states_are_terminal() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Cancelled.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Queued.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
}

#[test]
fn happy_path_transitions() {
    assert!(JobStatus::Pending.can_transition_to(JobStatus::Queued));
    assert!(JobStatus::Queued.can_transition_to(JobStatus::Processing));
    assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
    assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));
}

#[test]
fn producer_failure_transition() {
    // A failed publish flips the record straight from Queued to Failed.
    assert!(JobStatus::Queued.can_transition_to(JobStatus::Failed));
    assert!(JobStatus::Pending.can_transition_to(JobStatus::Failed));
}

#[test]
fn cancellation_from_any_live_state() {
    for s in [JobStatus::Pending, JobStatus::Queued, JobStatus::Processing] {
        assert!(s.can_transition_to(JobStatus::Cancelled), "{s} -> cancelled");
    }
}

#[test]
fn terminal_states_accept_nothing() {
    for from in [JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled] {
        for to in [
            JobStatus::Pending,
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert!(!from.can_transition_to(to), "{from} -> {to} should be illegal");
        }
    }
}

#[test]
fn no_skipping_states() {
    assert!(!JobStatus::Pending.can_transition_to(JobStatus::Processing));
    assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
    assert!(!JobStatus::Queued.can_transition_to(JobStatus::Completed));
}

#[test]
fn round_trips_through_strings() {
    for s in [
        JobStatus::Pending,
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ] {
        assert_eq!(JobStatus::from_str(s.as_str()), Ok(s));
    }
    assert!(JobStatus::from_str("resumed").is_err());
}
