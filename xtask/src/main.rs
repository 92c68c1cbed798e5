use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the persona directory workspace",
    long_about = "A unified CLI for running the allocation example, the directory CLI,\n\
                  benchmarks, load tests and CI checks in the persona directory workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the allocation example (5 000 generated users)
    Run,
    /// Print directory stats for a dataset through the `persona` CLI
    Stats {
        /// Gzip-compressed JSON users catalog
        #[arg(long, env = "PERSONA_DATASET_PATH")]
        dataset: String,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Run CI checks (fmt, clippy, tests, examples, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run load tests (ignored tests in persona_core)
    LoadTest,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and run examples
    Examples,
    /// Run benchmarks
    Bench,
    /// Run check + examples + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test persona_core");
    run_cargo(&["test", "-p", "persona_core"]);

    step("Test persona_cli");
    run_cargo(&["test", "-p", "persona_cli"]);
}

fn ci_examples() {
    step("Run allocation_run (5 000 users)");
    run_cargo(&[
        "run",
        "-p",
        "persona_core",
        "--example",
        "allocation_run",
        "--release",
    ]);
}

fn ci_bench() {
    step("Run benchmarks");
    run_cargo(&["bench", "--package", "persona_core", "--bench", "performance"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_cargo(&[
                "run",
                "-p",
                "persona_core",
                "--example",
                "allocation_run",
                "--release",
            ]);
        }
        Commands::Stats { dataset } => {
            run_cargo(&[
                "run",
                "-p",
                "persona_cli",
                "--release",
                "--",
                "--dataset",
                &dataset,
                "stats",
            ]);
        }
        Commands::Bench => {
            run_cargo(&["bench", "--package", "persona_core", "--bench", "performance"]);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Examples => ci_examples(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_examples();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LoadTest => {
            run_cargo(&[
                "test",
                "-p",
                "persona_core",
                "--test",
                "load_tests",
                "--",
                "--ignored",
            ]);
        }
    }
}
