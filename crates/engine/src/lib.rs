//! Guild bank ledger aggregation.
//!
//! The engine turns two addon exports into a weekly report: the guild bank
//! history (gold and item movements) and the member roster (sales, purchases,
//! taxes, rank). Gold deposits that match the raffle ticket rule become raffle
//! entries, other deposits and item donations are summed per member.
//!
//! ```no_run
//! use chrono::Utc;
//! use engine::{Engine, GuildScope, RaffleRound, SummaryWeek, ledger, lua, roster};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::builder().build()?;
//! let history = lua::parse(&std::fs::read_to_string("GBLData.lua")?)?;
//! let exports = lua::parse(&std::fs::read_to_string("MasterMerchant.lua")?)?;
//! let records = ledger::decode(GuildScope::ledger("My Guild", None).locate(&history)?);
//! let members = roster::decode(GuildScope::roster("My Guild", None).locate(&exports)?);
//! let report = engine.summarize(
//!     &members.roster,
//!     &records.records,
//!     Utc::now(),
//!     SummaryWeek::This,
//!     RaffleRound::Current,
//! );
//! println!("{} raffle entries", report.raffle.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};

pub use aggregate::{AccountSummary, RaffleReport, Report};
pub use config::EngineConfig;
pub use diagnostics::{Diagnostic, Source};
pub use error::EngineError;
pub use ledger::DecodedLedger;
pub use lua::{LuaDocument, LuaKey, LuaTable, LuaValue};
pub use money::UnitValue;
pub use raffle::{ENTRY_DATE_FORMAT, RaffleEntry, RaffleRules, classify};
pub use roster::{DecodedRoster, Member, Roster};
pub use saved_vars::GuildScope;
pub use transactions::{TransactionKind, TransactionRecord};
pub use windows::{RaffleRound, RaffleSchedule, SummarySchedule, SummaryWeek, TimeWindow};

mod aggregate;
mod config;
mod diagnostics;
mod error;
pub mod ledger;
pub mod lua;
mod money;
mod raffle;
pub mod roster;
mod saved_vars;
mod transactions;
mod windows;

type ResultEngine<T> = Result<T, EngineError>;

#[derive(Clone, Debug)]
pub struct Engine {
    rules: RaffleRules,
    summary: SummarySchedule,
    raffle: RaffleSchedule,
    excluded: HashSet<String>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn rules(&self) -> &RaffleRules {
        &self.rules
    }

    pub fn summary_schedule(&self) -> &SummarySchedule {
        &self.summary
    }

    pub fn raffle_schedule(&self) -> &RaffleSchedule {
        &self.raffle
    }

    pub fn is_excluded(&self, account_id: &str) -> bool {
        self.excluded.contains(account_id)
    }

    /// The summary and raffle windows for a run at `now`.
    pub fn windows(
        &self,
        now: DateTime<Utc>,
        week: SummaryWeek,
        round: RaffleRound,
    ) -> (TimeWindow, TimeWindow) {
        (self.summary.window(now, week), self.raffle.window(now, round))
    }

    /// Aggregates one run.
    ///
    /// Every call starts from fresh accumulators, so the same inputs always
    /// produce the same report.
    pub fn summarize(
        &self,
        roster: &Roster,
        records: &[TransactionRecord],
        now: DateTime<Utc>,
        week: SummaryWeek,
        round: RaffleRound,
    ) -> Report {
        let (summary_window, raffle_window) = self.windows(now, week, round);
        tracing::info!(
            summary_start = %summary_window.start(),
            summary_end = %summary_window.end(),
            raffle_start = %raffle_window.start(),
            raffle_end = %raffle_window.end(),
            "aggregating {} records for {} members",
            records.len(),
            roster.len()
        );

        let mut aggregation = aggregate::Aggregation::new(
            roster,
            &self.rules,
            &self.excluded,
            summary_window,
            raffle_window,
        );
        for record in records {
            aggregation.apply(record);
        }
        aggregation.finish()
    }

    /// Raffle entries only, without a roster. Any account may buy tickets.
    pub fn raffle_only(
        &self,
        records: &[TransactionRecord],
        now: DateTime<Utc>,
        round: RaffleRound,
    ) -> RaffleReport {
        let raffle_window = self.raffle.window(now, round);
        tracing::info!(
            raffle_start = %raffle_window.start(),
            raffle_end = %raffle_window.end(),
            "collecting raffle entries from {} records",
            records.len()
        );
        aggregate::raffle_entries(records, &self.rules, &self.excluded, raffle_window)
    }
}

/// The builder for `Engine`
#[derive(Clone, Debug, Default)]
pub struct EngineBuilder {
    rules: RaffleRules,
    summary: SummarySchedule,
    raffle: RaffleSchedule,
    excluded: HashSet<String>,
}

impl EngineBuilder {
    pub fn raffle_rules(mut self, rules: RaffleRules) -> EngineBuilder {
        self.rules = rules;
        self
    }

    pub fn summary_schedule(mut self, schedule: SummarySchedule) -> EngineBuilder {
        self.summary = schedule;
        self
    }

    pub fn raffle_schedule(mut self, schedule: RaffleSchedule) -> EngineBuilder {
        self.raffle = schedule;
        self
    }

    /// Accounts left out of every report, typically the guild bank itself.
    pub fn exclude<I, S>(mut self, accounts: I) -> EngineBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(accounts.into_iter().map(Into::into));
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        if self.rules.ticket_price <= 0 {
            return Err(EngineError::InvalidConfig(format!(
                "ticket_price must be positive, got {}",
                self.rules.ticket_price
            )));
        }
        if self.rules.deposit_modifier < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "deposit_modifier must not be negative, got {}",
                self.rules.deposit_modifier
            )));
        }

        Ok(Engine {
            rules: self.rules,
            summary: self.summary,
            raffle: self.raffle,
            excluded: self.excluded,
        })
    }
}
