//! Build a 5 000 user directory, hand out users per segment and claim them.
//!
//! Run with: cargo run -p persona_core --example allocation_run

use persona_core::test_helpers::generate_users;
use persona_core::{AgeBucket, Directory, DirectoryConfig};

fn main() {
    const NUM_USERS: usize = 5_000;
    const PER_SEGMENT: usize = 25;

    let directory = Directory::from_records(
        generate_users(NUM_USERS, 123),
        &DirectoryConfig::default().with_seed(123),
    )
    .expect("generated users are unique");

    println!("--- Allocation run ({} users, {} per segment, seed 123) ---", NUM_USERS, PER_SEGMENT);

    let mut total_claimed = 0;
    for primary in directory.primary_personas() {
        for bucket in AgeBucket::ALL {
            let picked = directory.allocate_by_persona_and_age(&primary, bucket, PER_SEGMENT);
            let claimed = picked
                .iter()
                .filter(|record| directory.claim(&record.id).unwrap_or(false))
                .count();
            total_claimed += claimed;
            if claimed > 0 {
                println!("  {:<12} {:<13} claimed {}", primary, bucket.label(), claimed);
            }
        }
    }

    match directory.allocate_any(100) {
        Ok(random) => println!("\nRandom unclaimed sample: {} users", random.len()),
        Err(error) => println!("\nRandom allocation failed: {error}"),
    }

    let stats = directory.stats();
    println!("Claimed {} users ({} selectable of {})", total_claimed, stats.selectable, stats.users);
}
