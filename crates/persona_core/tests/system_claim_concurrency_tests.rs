mod support;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use parking_lot::Mutex;
use persona_core::{AgeBucket, UserRecord};
use rayon::prelude::*;
use support::TestDirectoryBuilder;

#[test]
fn simultaneous_claims_on_one_id_have_exactly_one_winner() {
    let (directory, _, _dir) = TestDirectoryBuilder::new().build();
    let directory = Arc::new(directory);
    let callers = 32;
    let barrier = Arc::new(Barrier::new(callers));

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let directory = Arc::clone(&directory);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                directory.claim("17").expect("known id")
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().expect("caller thread"))
        .filter(|newly_claimed| *newly_claimed)
        .count();
    assert_eq!(winners, 1);
    assert!(!directory.claim("17").expect("known id"));
}

#[test]
fn parallel_allocate_and_claim_never_hands_out_a_record_twice() {
    let (directory, _, _dir) = TestDirectoryBuilder::new()
        .with_generated(2_000, 5)
        .unseeded()
        .build();
    let won: Mutex<Vec<String>> = Mutex::new(Vec::new());

    (0..64).into_par_iter().for_each(|worker| {
        let bucket = AgeBucket::ALL[worker % AgeBucket::ALL.len()];
        for _ in 0..10 {
            for record in directory.allocate_by_persona_and_age("shopper", bucket, 2) {
                if directory.claim(&record.id).expect("allocated id exists") {
                    won.lock().push(record.id);
                }
            }
            if let Ok(records) = directory.allocate_any(2) {
                for record in records {
                    if directory.claim(&record.id).expect("allocated id exists") {
                        won.lock().push(record.id);
                    }
                }
            }
        }
    });

    let won = won.into_inner();
    let unique: HashSet<_> = won.iter().collect();
    assert_eq!(unique.len(), won.len(), "a record was claimed twice");
    assert_eq!(directory.stats().claimed, won.len());
}

#[test]
fn readers_never_observe_half_applied_updates() {
    let (directory, records, _dir) = TestDirectoryBuilder::new().build();
    let target = records[10].clone();
    let mismatches = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for round in 0..500 {
                let incoming = UserRecord {
                    identity_id: Some(format!("idp-{round}")),
                    email: format!("round{round}@example.com"),
                    ..target.clone()
                };
                directory.update(&incoming).expect("update");
            }
        });

        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..500 {
                    let record = directory.find_by_id(&target.id).expect("lookup");
                    let Some(identity_id) = record.identity_id.as_deref() else {
                        continue;
                    };
                    // Index and record must agree: the identity resolves back to
                    // the same record unless a newer update has moved it on.
                    match directory.find_by_identity_id(identity_id) {
                        Ok(found) if found.id != target.id => {
                            mismatches.fetch_add(1, Ordering::SeqCst);
                        }
                        _ => {}
                    }
                    if !record.email.ends_with("@example.com") {
                        mismatches.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(mismatches.load(Ordering::SeqCst), 0);
    let last = directory.find_by_identity_id("idp-499").expect("final identity");
    assert_eq!(last.id, target.id);
    assert!(directory.find_by_identity_id("idp-0").is_err());
}

#[test]
fn concurrent_creates_get_distinct_ids() {
    let (directory, records, _dir) = TestDirectoryBuilder::new().build();

    let created: Vec<UserRecord> = (0..100)
        .into_par_iter()
        .map(|i| {
            directory
                .create(UserRecord::new(format!("new-user-{i}"), "books_electronics", 40))
                .expect("create")
        })
        .collect();

    let ids: HashSet<_> = created.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids.len(), 100);
    assert_eq!(directory.len(), records.len() + 100);
    for record in &created {
        assert_eq!(
            directory.find_by_username(&record.username).expect("lookup").id,
            record.id
        );
    }
}
