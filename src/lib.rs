//! Curator: declarative catalog reconciliation.
//!
//! **Curator keeps a persistent catalog converged on a compiled-in definition.**
//!
//! The definition lists every category and achievement the application
//! needs. Curator detects when the store has drifted from it, repairs the
//! drift idempotently, and reports per-entry failures without letting one
//! bad row abort the rest.
//!
//! # Operations
//!
//! - `ensure`: create missing entries, rewrite drifted ones, seed empty categories
//! - `verify`: two-read check that every canonical key exists
//! - `get_stats`: active categories with item counts, ordered for display
//!
//! [`catalog::retry::RetryController`] runs verify → ensure once per session
//! and retries failures with exponential backoff (1s, 2s, 4s by default).
//!
//! # Failure tiers
//!
//! 1. Per-entity store failure: recorded in `errors`, pass continues.
//! 2. Item seeding failure: logged only, `success` unaffected.
//! 3. Unreadable store during verify: every key reported missing.
//!
//! # Examples
//!
//! ```bash
//! # Converge the default store (./curator.db)
//! curator ensure
//!
//! # Check without writing
//! curator verify --format json
//!
//! # Run a full session with backoff against another database
//! curator session --db /var/lib/app/catalog.db
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: store contract, SQLite and in-memory stores, schema, config, errors
//! - [`catalog`]: definition, verifier, reconciler, stats, retry controller

pub mod catalog;
mod cli;
pub mod core;

use crate::catalog::Catalog;
use crate::catalog::definition::CatalogDefinition;
use crate::catalog::retry::{RetryController, SessionStatus};
use crate::cli::{Cli, Command, OutputFormat};
use crate::core::config::{self, CuratorConfig};
use crate::core::error::CuratorError;
use crate::core::output;
use crate::core::sqlite_store::SqliteStore;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "curator=debug" } else { "curator=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse arguments, run one command, and map the outcome to an exit code.
pub fn run() -> Result<ExitCode, CuratorError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        cfg.store.path = db.clone();
    }

    match cli.command {
        Command::Definition => print_definition(cli.format),
        Command::Ensure => {
            let catalog = open_catalog(&cfg)?;
            let result = catalog.ensure()?;
            let ok = result.success();
            match cli.format {
                OutputFormat::Json => emit_json("ensure", ok, serde_json::to_value(&result)?),
                OutputFormat::Text => {
                    println!(
                        "{} created {}, updated {}, seeded {}",
                        status_mark(ok),
                        result.created_count,
                        result.updated_count,
                        result.seeded_count
                    );
                    for e in &result.errors {
                        println!("  {} {}", "✗".bright_red(), output::single_line(&e.message, 160));
                    }
                }
            }
            Ok(exit_code(ok))
        }
        Command::Verify => {
            let result = open_catalog(&cfg)?.verify();
            let ok = result.is_valid();
            match cli.format {
                OutputFormat::Json => emit_json("verify", ok, serde_json::to_value(&result)?),
                OutputFormat::Text => {
                    if ok {
                        println!("{} catalog is complete", status_mark(true));
                    } else {
                        println!("{} catalog has drifted", status_mark(false));
                        if !result.missing_category_keys.is_empty() {
                            println!("  missing categories: {}", result.missing_category_keys.join(", "));
                        }
                        if !result.missing_achievement_keys.is_empty() {
                            println!(
                                "  missing achievements: {}",
                                result.missing_achievement_keys.join(", ")
                            );
                        }
                    }
                }
            }
            Ok(exit_code(ok))
        }
        Command::Stats => {
            let stats = open_catalog(&cfg)?.get_stats();
            match cli.format {
                OutputFormat::Json => emit_json("stats", true, serde_json::json!({ "categories": stats })),
                OutputFormat::Text => {
                    for s in &stats {
                        println!("{:<16} {:<28} {:>5}", s.key.bright_cyan(), s.name, s.item_count);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Session => {
            let mut controller = RetryController::with_policy(open_catalog(&cfg)?, cfg.retry.policy());
            let status = controller.run_blocking();
            let ok = status == SessionStatus::Verified;
            match cli.format {
                OutputFormat::Json => emit_json("session", ok, serde_json::to_value(controller.view())?),
                OutputFormat::Text => {
                    if ok {
                        println!("{} catalog verified", status_mark(true));
                    } else {
                        println!(
                            "{} catalog errored after {} retries: {}",
                            status_mark(false),
                            controller.retry_count(),
                            controller.error().unwrap_or("unknown error")
                        );
                    }
                }
            }
            Ok(exit_code(ok))
        }
    }
}

fn open_catalog(cfg: &CuratorConfig) -> Result<Catalog<SqliteStore>, CuratorError> {
    let store = SqliteStore::open(&cfg.store.path)?;
    Ok(Catalog::with_builtin(store))
}

fn print_definition(format: OutputFormat) -> Result<ExitCode, CuratorError> {
    let definition = CatalogDefinition::builtin();
    definition.validate()?;
    let fingerprint = definition.fingerprint()?;
    match format {
        OutputFormat::Json => emit_json(
            "definition",
            true,
            serde_json::json!({
                "version": definition.version,
                "fingerprint": fingerprint,
                "categories": definition.categories,
                "achievements": definition.achievements,
            }),
        ),
        OutputFormat::Text => {
            println!("version     {}", definition.version.bright_white());
            println!("fingerprint {}", fingerprint);
            for c in &definition.categories {
                println!("  category    {:<16} {}", c.key.bright_cyan(), c.name);
            }
            for a in &definition.achievements {
                println!("  achievement {:<16} {}", a.key.bright_cyan(), a.name);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// One JSON object per command: `cmd`, `status`, then the body's fields.
fn emit_json(cmd: &str, ok: bool, body: serde_json::Value) {
    let status = if ok { "ok" } else { "error" };
    let mut envelope = serde_json::Map::new();
    envelope.insert("cmd".into(), cmd.into());
    envelope.insert("status".into(), status.into());
    if let serde_json::Value::Object(fields) = body {
        envelope.extend(fields);
    }
    println!("{}", serde_json::Value::Object(envelope));
}

fn status_mark(ok: bool) -> colored::ColoredString {
    if ok { "✓".bright_green() } else { "✗".bright_red() }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
