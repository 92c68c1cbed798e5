//! Test helpers for building synthetic directories and dataset files.
//!
//! Shared by unit tests, integration tests, benches and the example runner.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::record::UserRecord;

/// Persona strings used by generated records.
pub const TEST_PERSONAS: [&str; 8] = [
    "apparel_housewares_accessories",
    "footwear_jewelry_furniture",
    "books_electronics",
    "homedecor_tools_outdoors",
    "beauty_groceries",
    "seasonal_furniture",
    "shopper_books",
    "shopper",
];

/// A selectable record with the given id.
pub fn user(id: usize, persona: &str, age: u32) -> UserRecord {
    UserRecord::new(format!("user{id}"), persona, age).with_id(id.to_string())
}

/// Generate `count` records (position 0 is a non-selectable sentinel).
///
/// Ages span 14..=85 so every age bucket plus the unbucketed range shows up;
/// roughly one record in ten is not selectable.
pub fn generate_users(count: usize, seed: u64) -> Vec<UserRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|id| {
            if id == 0 {
                return user(0, "system", 99).with_selectable(false);
            }
            let persona = TEST_PERSONAS[rng.gen_range(0..TEST_PERSONAS.len())];
            let age = rng.gen_range(14..=85);
            let mut record = user(id, persona, age).with_selectable(rng.gen_bool(0.9));
            record.first_name = format!("First{id}");
            record.last_name = format!("Last{id}");
            record.email = format!("user{id}@example.com");
            record
        })
        .collect()
}

/// Write `records` as a gzip-compressed JSON array, the dataset format the
/// loader reads.
pub fn write_users_gz(path: &Path, records: &[UserRecord]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, records)?;
    encoder.finish()?.flush()
}
