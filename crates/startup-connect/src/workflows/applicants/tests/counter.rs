use std::sync::Arc;
use std::thread;

use super::common::*;
use crate::workflows::applicants::domain::OpportunityId;
use crate::workflows::applicants::repository::RecordStore;
use crate::workflows::applicants::service::AccountingError;

#[test]
fn increment_n_times_adds_exactly_n() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    for expected in 1..=4 {
        assert_eq!(service.increment(&opportunity.id).expect("increment"), expected);
    }
    assert_eq!(cached_count(store.as_ref(), &opportunity.id), 4);
}

#[test]
fn increment_on_missing_opportunity_is_not_found() {
    let (service, _store) = build_service();
    let missing = OpportunityId("opp-ghost".to_string());

    assert!(matches!(
        service.increment(&missing),
        Err(AccountingError::NotFound(id)) if id == missing
    ));
}

#[test]
fn increment_saturates_instead_of_wrapping() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");
    store
        .set_applicant_count(&opportunity.id, u32::MAX)
        .expect("seed count");

    assert_eq!(service.increment(&opportunity.id).expect("increment"), u32::MAX);
}

#[test]
fn recount_on_missing_opportunity_mutates_nothing() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");
    service.increment(&opportunity.id).expect("increment");
    let before = store.opportunities().expect("list");

    let missing = OpportunityId("opp-nowhere".to_string());
    assert!(matches!(
        service.recount(&missing),
        Err(AccountingError::NotFound(_))
    ));
    assert_eq!(store.opportunities().expect("list"), before);
}

#[test]
fn recount_overwrites_drifted_cache() {
    let (service, store) = build_service();
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");
    service
        .submit(&opportunity.id, student(1), submission())
        .expect("submitted");
    service
        .submit(&opportunity.id, student(2), submission())
        .expect("submitted");
    store
        .set_applicant_count(&opportunity.id, 7)
        .expect("drift the cache");

    assert_eq!(service.recount(&opportunity.id).expect("recount"), 2);
    assert_eq!(cached_count(store.as_ref(), &opportunity.id), 2);
}

#[test]
fn concurrent_submissions_settle_after_sync() {
    let (service, store) = build_service();
    let service = Arc::new(service);
    let opportunity = service
        .post_opportunity(poster(), draft())
        .expect("opportunity posted");

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let service = Arc::clone(&service);
            let id = opportunity.id.clone();
            thread::spawn(move || {
                for n in 0..5 {
                    service
                        .submit(&id, student(worker * 10 + n), submission())
                        .expect("submitted");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker finished");
    }

    assert!(cached_count(store.as_ref(), &opportunity.id) <= 40);
    service.sync_all().expect("sync");
    assert_eq!(store.count_applications(&opportunity.id).expect("count"), 40);
    assert_eq!(cached_count(store.as_ref(), &opportunity.id), 40);
}
