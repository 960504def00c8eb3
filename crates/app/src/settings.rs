//! Handles settings for the application. Configuration is read from
//! `config/guild_stats.toml` (or `--config`), then `GUILD_STATS_*`
//! environment variables, then command line flags.
//!
//! See `config/guild_stats.toml` for the configuration.

use std::path::PathBuf;

use clap::Parser;
use config::{Config, Environment, File};
use engine::{EngineConfig, SummaryWeek};
use serde::Deserialize;

use crate::{
    error::Result,
    report::{LedgerColumn, RaffleColumn, SummaryColumn},
};

const DEFAULT_CONFIG_PATH: &str = "config/guild_stats.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub guild: String,
    /// Account that ran the exports. When unset the guild is searched for.
    pub user: Option<String>,
    pub gbl: PathBuf,
    pub mm: PathBuf,
    pub out_dir: PathBuf,
    pub week: SummaryWeek,
    pub raffle_only: bool,
    pub raffle_final: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            guild: "AK Tamriel Trade".to_string(),
            user: None,
            gbl: PathBuf::from("GBLData.lua"),
            mm: PathBuf::from("MasterMerchant.lua"),
            out_dir: PathBuf::from("."),
            week: SummaryWeek::This,
            raffle_only: false,
            raffle_final: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Report {
    pub enable_headers: bool,
    pub prefix_date: bool,
    /// Also write the round that closed at the last deadline.
    pub output_last_raffle: bool,
    pub summary_file: String,
    pub raffle_file: String,
    pub last_raffle_file: String,
    pub summary_columns: Vec<SummaryColumn>,
    pub raffle_columns: Vec<RaffleColumn>,
    /// Also write every decoded ledger transaction, tab-delimited, plus a
    /// second file holding only the gold deposits.
    pub dump_ledger: bool,
    pub ledger_file: String,
    pub ledger_deposits_file: String,
    pub ledger_columns: Vec<LedgerColumn>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            enable_headers: false,
            prefix_date: true,
            output_last_raffle: true,
            summary_file: "donation_summary.csv".to_string(),
            raffle_file: "raffle.csv".to_string(),
            last_raffle_file: "raffle-last.csv".to_string(),
            summary_columns: SummaryColumn::default_layout(),
            raffle_columns: RaffleColumn::default_layout(),
            dump_ledger: false,
            ledger_file: "ledger.tsv".to_string(),
            ledger_deposits_file: "ledger_raffle.tsv".to_string(),
            ledger_columns: LedgerColumn::default_layout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub engine: EngineConfig,
    pub report: Report,
}

#[derive(Debug, Parser)]
#[command(
    name = "guild_stats",
    about = "Creates donation and raffle CSVs from guild bank and roster exports."
)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Guild Bank Ledger SavedVariables file.
    #[arg(long)]
    gbl: Option<PathBuf>,
    /// Master Merchant SavedVariables file.
    #[arg(long)]
    mm: Option<PathBuf>,
    /// Summary week: this, last or all.
    #[arg(long)]
    week: Option<SummaryWeek>,
    /// Skip the roster and only write raffle entries.
    #[arg(long)]
    raffle_only: bool,
    /// Report the raffle round that closed at the last deadline.
    #[arg(long)]
    raffle_final: bool,
    /// Also dump the decoded ledger to tab-delimited files.
    #[arg(long)]
    dump_ledger: bool,
    /// Account that ran the exports.
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    guild: Option<String>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    fn from_args(args: Args) -> Result<Self> {
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(config_path).required(args.config.is_some()))
            .add_source(
                Environment::with_prefix("GUILD_STATS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(gbl) = args.gbl {
            settings.app.gbl = gbl;
        }
        if let Some(mm) = args.mm {
            settings.app.mm = mm;
        }
        if let Some(week) = args.week {
            settings.app.week = week;
        }
        if let Some(user) = args.user {
            settings.app.user = Some(user);
        }
        if let Some(guild) = args.guild {
            settings.app.guild = guild;
        }
        if let Some(out_dir) = args.out_dir {
            settings.app.out_dir = out_dir;
        }
        settings.app.raffle_only |= args.raffle_only;
        settings.app.raffle_final |= args.raffle_final;
        settings.report.dump_ledger |= args.dump_ledger;

        Ok(settings)
    }
}
