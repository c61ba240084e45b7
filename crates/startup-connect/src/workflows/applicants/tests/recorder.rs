use std::collections::HashSet;
use std::sync::atomic::Ordering;

use super::common::*;
use crate::workflows::applicants::domain::{ApplicationSubmission, OpportunityId};
use crate::workflows::applicants::intake::ValidationError;
use crate::workflows::applicants::repository::RecordStore;
use crate::workflows::applicants::service::AccountingError;

#[test]
fn submit_records_application_and_bumps_count() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    let receipt = service
        .submit(&opportunity.id, student(1), submission_with_resume(1024))
        .expect("submission stored");

    assert!(receipt.counted());
    assert_eq!(receipt.applicant_count, Some(1));
    assert_eq!(receipt.application.opportunity_id, opportunity.id);
    assert_eq!(receipt.application.applicant_id, student(1));
    assert_eq!(
        receipt.application.resume.as_ref().map(|resume| resume.size_bytes),
        Some(1024)
    );
    assert_eq!(store.count_applications(&opportunity.id).expect("count"), 1);
    assert_eq!(cached_count(store.as_ref(), &opportunity.id), 1);
}

#[test]
fn empty_motivation_writes_nothing() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    let result = service.submit(
        &opportunity.id,
        student(1),
        ApplicationSubmission {
            motivation: "   ".to_string(),
            resume: None,
        },
    );

    match result {
        Err(AccountingError::Validation(err)) => assert_eq!(err.field(), "motivation"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(store.count_applications(&opportunity.id).expect("count"), 0);
    assert_eq!(cached_count(store.as_ref(), &opportunity.id), 0);
}

#[test]
fn oversized_resume_writes_nothing() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    let result = service.submit(
        &opportunity.id,
        student(1),
        submission_with_resume(6 * 1024 * 1024),
    );

    assert!(matches!(
        result,
        Err(AccountingError::Validation(ValidationError::ResumeTooLarge { .. }))
    ));
    assert!(store
        .applications_for(&opportunity.id)
        .expect("select")
        .is_empty());
    assert_eq!(cached_count(store.as_ref(), &opportunity.id), 0);
}

#[test]
fn unknown_opportunity_is_not_found() {
    let (service, _store) = build_service();
    let missing = OpportunityId("opp-missing".to_string());

    match service.submit(&missing, student(1), submission()) {
        Err(AccountingError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn closed_opportunity_rejects_submissions() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");
    service
        .deactivate_opportunity(&opportunity.id)
        .expect("deactivated");

    match service.submit(&opportunity.id, student(1), submission()) {
        Err(AccountingError::Validation(err)) => {
            assert_eq!(err, ValidationError::OpportunityClosed(opportunity.id.clone()));
            assert_eq!(err.field(), "opportunity_id");
        }
        other => panic!("expected closed opportunity, got {other:?}"),
    }
    assert_eq!(store.count_applications(&opportunity.id).expect("count"), 0);
}

#[test]
fn insert_failure_is_retryable_and_leaves_count_alone() {
    let (service, store) = build_flaky_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    store.fail_inserts.store(true, Ordering::SeqCst);
    let err = service
        .submit(&opportunity.id, student(1), submission())
        .expect_err("insert fails");
    assert!(matches!(err, AccountingError::Storage(_)));
    assert!(err.is_retryable());
    assert_eq!(store.count_writes.load(Ordering::SeqCst), 0);

    store.fail_inserts.store(false, Ordering::SeqCst);
    let receipt = service
        .submit(&opportunity.id, student(1), submission())
        .expect("retry succeeds");
    assert_eq!(receipt.applicant_count, Some(1));
    assert_eq!(store.count_applications(&opportunity.id).expect("count"), 1);
}

#[test]
fn dropped_increment_keeps_the_application() {
    let (service, store) = build_flaky_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    store.fail_count_writes.store(true, Ordering::SeqCst);
    let receipt = service
        .submit(&opportunity.id, student(1), submission())
        .expect("submission still succeeds");

    assert!(!receipt.counted());
    assert_eq!(store.count_applications(&opportunity.id).expect("count"), 1);
    assert_eq!(cached_count(store.as_ref(), &opportunity.id), 0);
}

#[test]
fn application_ids_are_unique() {
    let (service, _store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    let ids: HashSet<_> = (0..5)
        .map(|n| {
            service
                .submit(&opportunity.id, student(n), submission())
                .expect("submitted")
                .application
                .id
        })
        .collect();
    assert_eq!(ids.len(), 5);
}
