//! CLI argument parsing and the one-shot `report` subcommand.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use estate_compute::{ExceptionEngine, ExceptionRequest, MemorySource, RecordSet, ThresholdConfig};
use estate_core::Config;

use crate::db;
use crate::service;
use crate::store::PgEstateStore;

// ── CLI ─────────────────────────────────────────────────────────────

/// Estate exceptions service: anomaly alerts over processing, dispatch and sales records.
#[derive(Parser, Debug)]
#[command(name = "estate-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (default).
    Serve,

    /// Compute one report and print it as JSON.
    Report {
        /// Tenant whose settings and records are read from PostgreSQL.
        #[arg(long)]
        tenant: Option<Uuid>,

        /// Report date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// JSON record fixture to report on instead of the database.
        #[arg(long, conflicts_with = "tenant")]
        fixture: Option<PathBuf>,
    },
}

pub async fn run_report(
    config: &Config,
    tenant: Option<Uuid>,
    as_of: Option<NaiveDate>,
    fixture: Option<PathBuf>,
) -> anyhow::Result<()> {
    let today = as_of.unwrap_or_else(|| Utc::now().date_naive());

    let report = match (fixture, tenant) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading fixture {}", path.display()))?;
            let records: RecordSet = serde_json::from_str(&raw)
                .with_context(|| format!("parsing fixture {}", path.display()))?;
            info!(
                fixture = %path.display(),
                processing = records.processing.len(),
                dispatches = records.dispatches.len(),
                sales = records.sales.len(),
                "reporting from fixture"
            );

            let request = ExceptionRequest {
                today,
                bag_weight_kgs: config.engine.default_bag_weight_kgs,
                thresholds: ThresholdConfig::default(),
            };
            ExceptionEngine::run(&MemorySource::new(records), &request).await?
        }
        (None, Some(tenant_id)) => {
            let pool = db::init_pg_pool(&config.postgres).await?;
            let store = PgEstateStore::new(pool, &config.engine.tenant_table)?;
            service::exceptions_for_tenant(&store, &config.engine, tenant_id, today).await?
        }
        (None, None) => anyhow::bail!("report needs --tenant or --fixture"),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["estate-server"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_report_arguments() {
        let cli = Cli::try_parse_from([
            "estate-server",
            "report",
            "--fixture",
            "records.json",
            "--as-of",
            "2024-06-20",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Report { tenant, as_of, fixture }) => {
                assert!(tenant.is_none());
                assert_eq!(as_of, NaiveDate::from_ymd_opt(2024, 6, 20));
                assert_eq!(fixture, Some(PathBuf::from("records.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn tenant_and_fixture_conflict() {
        let parsed = Cli::try_parse_from([
            "estate-server",
            "report",
            "--tenant",
            "7d7f3a6e-3c1b-4a51-9d7e-0f5b9b2e4c11",
            "--fixture",
            "records.json",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn report_without_source_is_an_error() {
        let err = run_report(&Config::for_profile(""), None, None, None).await.unwrap_err();
        assert!(err.to_string().contains("--tenant or --fixture"));
    }
}
