//! `persona`: load the users catalog and serve directory operations from the
//! command line. Results are JSON on stdout; logs go to stderr.
//!
//! The dataset is loaded before any command runs. If it cannot be loaded the
//! process exits with status 1 and nothing is served.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use parking_lot::Mutex;
use persona_core::config::{DEFAULT_DATASET_PATH, DEFAULT_DRAW_ATTEMPT_FACTOR};
use persona_core::{AgeBucket, Directory, DirectoryConfig, DirectoryError, LoadError, UserRecord};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "persona",
    about = "Synthetic shopper directory: lookups, random allocation and claims"
)]
struct Cli {
    /// Gzip-compressed JSON users catalog
    #[arg(long, env = "PERSONA_DATASET_PATH", default_value = DEFAULT_DATASET_PATH)]
    dataset: PathBuf,

    /// Random draws per directory record before unconstrained allocation sweeps
    #[arg(
        long,
        env = "PERSONA_DRAW_ATTEMPT_FACTOR",
        default_value_t = DEFAULT_DRAW_ATTEMPT_FACTOR
    )]
    draw_attempt_factor: usize,

    /// Seed allocation randomness for reproducible runs
    #[arg(long, env = "PERSONA_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print directory counts
    Stats,
    /// Look up one user
    User(UserKey),
    /// List user ids in a segment
    Ids(Segment),
    /// Random unclaimed users matching a primary persona and age bucket
    Unclaimed {
        #[arg(long)]
        persona: String,
        #[arg(long)]
        age_bucket: AgeBucket,
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Claim every returned user
        #[arg(long)]
        claim: bool,
    },
    /// Random unclaimed users from the whole directory
    Random {
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Claim every returned user
        #[arg(long)]
        claim: bool,
    },
    /// Claim users by id
    Claim {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Create a user from a JSON record on stdin
    Create,
    /// Update a user from a JSON record on stdin
    Update {
        /// Target id, overriding the id in the record
        #[arg(long)]
        id: Option<String>,
    },
    /// Allocate and claim from parallel workers, reporting how often workers raced for a user
    Stress {
        #[arg(long, default_value_t = 8)]
        workers: usize,
        #[arg(long, default_value_t = 100)]
        rounds: usize,
        #[arg(long, default_value_t = 2)]
        batch: usize,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct UserKey {
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    identity_id: Option<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Segment {
    /// Primary persona token, e.g. `apparel`
    #[arg(long)]
    persona: Option<String>,
    #[arg(long)]
    age_bucket: Option<AgeBucket>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Startup(#[from] LoadError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("invalid user record on stdin: {0}")]
    Input(#[source] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Startup(_) => 1,
            _ => 2,
        }
    }
}

/// Outcome of a stress run.
///
/// `contended` counts allocations of a record that another worker had also
/// been handed, i.e. allocations beyond the first per id. Each of those must
/// lose its claim, so `lost_claims == contended` and `claimed` equals the
/// number of distinct ids allocated.
#[derive(Serialize, Debug)]
struct StressReport {
    workers: usize,
    rounds: usize,
    allocated: usize,
    contended: usize,
    claimed: usize,
    lost_claims: usize,
    elapsed_ms: u128,
}

// ── helpers ────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("persona_core=info,persona_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}

fn read_record() -> Result<UserRecord, CliError> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    serde_json::from_str(&input).map_err(CliError::Input)
}

fn claim_all(directory: &Directory, records: &[UserRecord]) -> Result<(), CliError> {
    for record in records {
        directory.claim(&record.id)?;
    }
    Ok(())
}

fn stress(directory: &Directory, workers: usize, rounds: usize, batch: usize) -> StressReport {
    let handed_out: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let claimed = AtomicUsize::new(0);
    let lost_claims = AtomicUsize::new(0);
    let started = Instant::now();

    (0..workers).into_par_iter().for_each(|_| {
        for _ in 0..rounds {
            let Ok(records) = directory.allocate_any(batch) else {
                break;
            };
            handed_out
                .lock()
                .extend(records.iter().map(|record| record.id.clone()));
            for record in records {
                match directory.claim(&record.id) {
                    Ok(true) => claimed.fetch_add(1, Ordering::Relaxed),
                    _ => lost_claims.fetch_add(1, Ordering::Relaxed),
                };
            }
        }
    });

    let mut handed_out = handed_out.into_inner();
    let allocated = handed_out.len();
    handed_out.sort_unstable();
    handed_out.dedup();

    StressReport {
        workers,
        rounds,
        allocated,
        contended: allocated - handed_out.len(),
        claimed: claimed.into_inner(),
        lost_claims: lost_claims.into_inner(),
        elapsed_ms: started.elapsed().as_millis(),
    }
}

// ── commands ───────────────────────────────────────────────────────

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = DirectoryConfig::default()
        .with_dataset_path(cli.dataset)
        .with_draw_attempt_factor(cli.draw_attempt_factor);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let directory = Directory::load(&config)?;

    match cli.command {
        Commands::Stats => print_json(&directory.stats()),
        Commands::User(key) => {
            let record = match (key.id, key.username, key.identity_id) {
                (Some(id), _, _) => directory.find_by_id(&id)?,
                (_, Some(username), _) => directory.find_by_username(&username)?,
                (_, _, Some(identity_id)) => directory.find_by_identity_id(&identity_id)?,
                (None, None, None) => unreachable!("clap requires one user key"),
            };
            print_json(&record)
        }
        Commands::Ids(segment) => {
            let ids = match (segment.persona, segment.age_bucket) {
                (Some(persona), _) => directory.find_ids_by_primary_persona(&persona),
                (None, Some(bucket)) => directory.find_ids_by_age_bucket(bucket),
                (None, None) => unreachable!("clap requires one segment key"),
            };
            print_json(&ids)
        }
        Commands::Unclaimed {
            persona,
            age_bucket,
            count,
            claim,
        } => {
            let records = directory.allocate_by_persona_and_age(&persona, age_bucket, count);
            if claim {
                claim_all(&directory, &records)?;
            }
            print_json(&records)
        }
        Commands::Random { count, claim } => {
            let records = directory.allocate_any(count)?;
            if claim {
                claim_all(&directory, &records)?;
            }
            print_json(&records)
        }
        Commands::Claim { ids } => {
            let mut results = serde_json::Map::new();
            for id in ids {
                let newly_claimed = directory.claim(&id)?;
                results.insert(id, json!(newly_claimed));
            }
            print_json(&results)
        }
        Commands::Create => {
            let created = directory.create(read_record()?)?;
            print_json(&created)
        }
        Commands::Update { id } => {
            let mut record = read_record()?;
            if let Some(id) = id {
                record.id = id;
            }
            let updated = directory.update(&record)?;
            print_json(&updated)
        }
        Commands::Stress {
            workers,
            rounds,
            batch,
        } => {
            let report = stress(&directory, workers, rounds, batch);
            info!(
                allocated = report.allocated,
                contended = report.contended,
                claimed = report.claimed,
                "stress run finished"
            );
            print_json(&report)
        }
    }
}

// ── main ───────────────────────────────────────────────────────────

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ CliError::Startup(_)) => {
            error!("unable to load users file: {err}");
            ExitCode::from(err.exit_code())
        }
        Err(CliError::Directory(err)) if err.is_not_found() => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
