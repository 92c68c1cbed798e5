mod support;

use persona_core::test_helpers::{user, write_users_gz};
use persona_core::{AgeBucket, Directory, DirectoryConfig, LoadError};
use support::TestDirectoryBuilder;

#[test]
fn every_loaded_record_resolves_by_id_and_username() {
    let (directory, records, _dir) = TestDirectoryBuilder::new().with_generated(500, 7).build();

    assert_eq!(directory.len(), records.len());
    for record in &records {
        let by_id = directory.find_by_id(&record.id).expect("id lookup");
        assert_eq!(by_id.id, record.id);
        assert_eq!(&by_id, record);

        let by_username = directory
            .find_by_username(&record.username)
            .expect("username lookup");
        assert_eq!(by_username.username, record.username);
        assert_eq!(by_username.id, record.id);
    }
}

#[test]
fn persona_and_age_indices_cover_matching_records() {
    let (directory, records, _dir) = TestDirectoryBuilder::new().with_generated(300, 3).build();

    for bucket in AgeBucket::ALL {
        let ids = directory.find_ids_by_age_bucket(bucket);
        let expected: Vec<_> = records
            .iter()
            .filter(|r| r.age_bucket() == Some(bucket))
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(ids, expected, "bucket {bucket}");
    }

    let unbucketed = records.iter().filter(|r| r.age < 18).count();
    let bucketed: usize = directory.stats().by_age_bucket.values().sum();
    assert_eq!(bucketed + unbucketed, records.len());

    for primary in directory.primary_personas() {
        for id in directory.find_ids_by_primary_persona(&primary) {
            let record = directory.find_by_id(&id).expect("indexed id resolves");
            assert_eq!(record.primary_persona(), primary);
        }
    }
}

#[test]
fn identity_ids_in_dataset_are_indexed() {
    let records = vec![
        user(0, "system", 40),
        user(1, "books_electronics", 33).with_identity_id("idp-1"),
        user(2, "books_electronics", 33),
    ];
    let (directory, _, _dir) = TestDirectoryBuilder::new().with_records(records).build();

    assert_eq!(
        directory.find_by_identity_id("idp-1").expect("identity").id,
        "1"
    );
    assert!(directory.find_by_identity_id("idp-2").is_err());
}

#[test]
fn missing_dataset_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = DirectoryConfig::default().with_dataset_path(dir.path().join("users.json.gz"));

    let error = Directory::load(&config).expect_err("load should fail");
    assert!(matches!(error, LoadError::Io { .. }));
    assert!(error.to_string().contains("users.json.gz"));
}

#[test]
fn duplicate_username_in_dataset_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("users.json.gz");
    let mut twin = user(2, "books", 30);
    twin.username = "user1".to_string();
    write_users_gz(&path, &[user(0, "system", 40), user(1, "books", 30), twin])
        .expect("write dataset");

    let error = Directory::load(&DirectoryConfig::default().with_dataset_path(&path))
        .expect_err("load should fail");
    assert!(matches!(error, LoadError::Malformed(_)));
}
