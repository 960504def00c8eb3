use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use engine::{
    Engine, GuildScope, RaffleEntry, RaffleRound, Roster, SummaryWeek, TransactionKind,
    TransactionRecord,
};

use crate::{
    error::Result,
    report::{Layout, write_table, write_tsv},
    settings::Settings,
};

mod error;
mod input;
mod report;
mod settings;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "guild_stats={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let engine = settings.engine.builder()?.build()?;
    let now = Utc::now();
    let app = &settings.app;
    let user = app.user.as_deref();

    fs::create_dir_all(&app.out_dir)?;
    let records = input::load_ledger(&app.gbl, &GuildScope::ledger(&app.guild, user));

    if settings.report.dump_ledger {
        dump_ledger(&settings, &records)?;
    }

    let round = if app.raffle_final && !settings.report.output_last_raffle {
        RaffleRound::Final
    } else {
        RaffleRound::Current
    };
    let raffle_file = match round {
        RaffleRound::Current => &settings.report.raffle_file,
        RaffleRound::Final => &settings.report.last_raffle_file,
    };

    let (roster, raffle) = if app.raffle_only {
        tracing::info!("raffle-only round");
        (None, engine.raffle_only(&records, now, round).raffle)
    } else {
        tracing::info!("generating report for week {:?}", app.week);
        let roster = input::load_roster(&app.mm, &GuildScope::roster(&app.guild, user))?;
        let report = engine.summarize(&roster, &records, now, app.week, round);
        if !report.diagnostics.is_empty() {
            tracing::info!("{} records were skipped", report.diagnostics.len());
        }

        let layout = Layout {
            headers: settings.report.enable_headers,
            prefix_date: settings.report.prefix_date.then_some(now),
        };
        let path = app.out_dir.join(&settings.report.summary_file);
        write_table(
            fs::File::create(&path)?,
            &report.accounts,
            &settings.report.summary_columns,
            layout,
        )?;
        tracing::info!("wrote {} accounts to {}", report.accounts.len(), path.display());
        (Some(roster), report.raffle)
    };

    if !engine.rules().enabled {
        return Ok(());
    }

    write_raffle(&settings, &app.out_dir.join(raffle_file), &raffle)?;

    if settings.report.output_last_raffle {
        let last = last_round(&engine, roster.as_ref(), &records, now, app.week);
        write_raffle(
            &settings,
            &app.out_dir.join(&settings.report.last_raffle_file),
            &last,
        )?;
    }

    Ok(())
}

/// Entries of the round that closed at the last deadline. With a roster the
/// same membership and rank checks apply as for the current round.
fn last_round(
    engine: &Engine,
    roster: Option<&Roster>,
    records: &[TransactionRecord],
    now: DateTime<Utc>,
    week: SummaryWeek,
) -> Vec<RaffleEntry> {
    match roster {
        Some(roster) => {
            engine
                .summarize(roster, records, now, week, RaffleRound::Final)
                .raffle
        }
        None => engine.raffle_only(records, now, RaffleRound::Final).raffle,
    }
}

fn write_raffle(settings: &Settings, path: &Path, entries: &[RaffleEntry]) -> Result<()> {
    let layout = Layout {
        headers: settings.report.enable_headers,
        prefix_date: None,
    };
    write_table(
        fs::File::create(path)?,
        entries,
        &settings.report.raffle_columns,
        layout,
    )?;
    tracing::info!("wrote {} raffle entries to {}", entries.len(), path.display());
    Ok(())
}

fn gold_deposits(records: &[TransactionRecord]) -> Vec<TransactionRecord> {
    records
        .iter()
        .filter(|record| record.kind == TransactionKind::GoldDeposit)
        .cloned()
        .collect()
}

fn dump_ledger(settings: &Settings, records: &[TransactionRecord]) -> Result<()> {
    let layout = Layout {
        headers: settings.report.enable_headers,
        prefix_date: None,
    };
    let columns = &settings.report.ledger_columns;

    let path = settings.app.out_dir.join(&settings.report.ledger_file);
    write_tsv(fs::File::create(&path)?, records, columns, layout)?;
    tracing::info!("dumped {} ledger records to {}", records.len(), path.display());

    let deposits = gold_deposits(records);
    let path = settings
        .app
        .out_dir
        .join(&settings.report.ledger_deposits_file);
    write_tsv(fs::File::create(&path)?, &deposits, columns, layout)?;
    tracing::info!("dumped {} gold deposits to {}", deposits.len(), path.display());
    Ok(())
}
