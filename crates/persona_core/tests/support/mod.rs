#![allow(dead_code)]

use persona_core::test_helpers::{generate_users, write_users_gz};
use persona_core::{Directory, DirectoryConfig, UserRecord};
use tempfile::TempDir;

/// Builder for directories loaded through the real gzip dataset path.
#[derive(Debug)]
pub struct TestDirectoryBuilder {
    records: Vec<UserRecord>,
    config: DirectoryConfig,
}

impl Default for TestDirectoryBuilder {
    fn default() -> Self {
        Self {
            records: generate_users(200, 42),
            config: DirectoryConfig::default().with_seed(42),
        }
    }
}

impl TestDirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the generated catalog with `count` records from `seed`.
    pub fn with_generated(mut self, count: usize, seed: u64) -> Self {
        self.records = generate_users(count, seed);
        self
    }

    /// Replace the catalog with explicit records.
    pub fn with_records(mut self, records: Vec<UserRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    /// Drop the seed so allocation uses fresh entropy.
    pub fn unseeded(mut self) -> Self {
        self.config.seed = None;
        self
    }

    pub fn with_draw_attempt_factor(mut self, factor: usize) -> Self {
        self.config = self.config.with_draw_attempt_factor(factor);
        self
    }

    /// Write the catalog to a temp dir and load it. The temp dir is returned
    /// so tests can reload the same file.
    pub fn build(self) -> (Directory, Vec<UserRecord>, TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.json.gz");
        write_users_gz(&path, &self.records).expect("write dataset");

        let directory = Directory::load(&self.config.with_dataset_path(&path))
            .expect("dataset should load");
        (directory, self.records, dir)
    }
}
