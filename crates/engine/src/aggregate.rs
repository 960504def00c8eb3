//! The aggregation pass.
//!
//! One `Aggregation` owns all accumulators for a single run: account
//! summaries seeded from the roster, the raffle entry list and the
//! diagnostics. It is built fresh for every run and consumed by `finish`.

use std::collections::{HashMap, HashSet};

use crate::{
    Diagnostic, RaffleEntry, RaffleRules, TimeWindow, TransactionKind, TransactionRecord,
    roster::{Member, Roster},
};

/// Totals for one guild member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_id: String,
    pub rank: u32,
    pub sales: i64,
    /// `None` when the roster export carries no taxes column.
    pub taxes: Option<i64>,
    pub purchases: i64,
    /// Gold deposits that did not buy raffle tickets.
    pub deposits: i64,
    /// Gold spent on raffle tickets.
    pub raffle: i64,
    /// Value of deposited items, in whole gold.
    pub donations: i64,
}

impl From<&Member> for AccountSummary {
    fn from(member: &Member) -> Self {
        Self {
            account_id: member.account_id.clone(),
            rank: member.rank,
            sales: member.sales,
            taxes: member.taxes,
            purchases: member.purchases,
            deposits: 0,
            raffle: 0,
            donations: 0,
        }
    }
}

/// Result of a full run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub summary_window: TimeWindow,
    pub raffle_window: TimeWindow,
    /// Roster order, excluded accounts omitted.
    pub accounts: Vec<AccountSummary>,
    /// Ledger order.
    pub raffle: Vec<RaffleEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of a run without a roster: raffle entries only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaffleReport {
    pub raffle_window: TimeWindow,
    pub raffle: Vec<RaffleEntry>,
}

pub(crate) struct Aggregation<'a> {
    rules: &'a RaffleRules,
    excluded: &'a HashSet<String>,
    summary_window: TimeWindow,
    raffle_window: TimeWindow,
    accounts: Vec<AccountSummary>,
    positions: HashMap<String, usize>,
    raffle: Vec<RaffleEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Aggregation<'a> {
    pub(crate) fn new(
        roster: &Roster,
        rules: &'a RaffleRules,
        excluded: &'a HashSet<String>,
        summary_window: TimeWindow,
        raffle_window: TimeWindow,
    ) -> Self {
        let accounts: Vec<AccountSummary> = roster
            .members()
            .iter()
            .filter(|member| !excluded.contains(&member.account_id))
            .map(AccountSummary::from)
            .collect();
        let positions = accounts
            .iter()
            .enumerate()
            .map(|(position, account)| (account.account_id.clone(), position))
            .collect();

        Self {
            rules,
            excluded,
            summary_window,
            raffle_window,
            accounts,
            positions,
            raffle: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn apply(&mut self, record: &TransactionRecord) {
        if self.excluded.contains(&record.account_id) {
            return;
        }
        let Some(&position) = self.positions.get(&record.account_id) else {
            Diagnostic::UnknownAccount {
                account_id: record.account_id.clone(),
                transaction_id: record.transaction_id.clone(),
            }
            .record(&mut self.diagnostics);
            return;
        };

        match record.kind {
            TransactionKind::ItemDeposit => {
                if self.summary_window.contains(record.timestamp)
                    && let Some(value) = record.item_total()
                {
                    let account = &mut self.accounts[position];
                    account.donations = account.donations.saturating_add(value);
                }
            }
            TransactionKind::GoldDeposit => {
                if let Some(gold) = record.gold_amount {
                    self.apply_gold(position, record, gold);
                }
            }
            _ => {}
        }
    }

    fn apply_gold(&mut self, position: usize, record: &TransactionRecord, gold: i64) {
        let account = &mut self.accounts[position];
        let eligible = if self.raffle_window.contains(record.timestamp)
            && self.rules.admits_rank(account.rank)
        {
            self.rules.eligible_amount(gold)
        } else {
            None
        };

        match eligible {
            Some(amount) => {
                tracing::debug!(
                    account = %record.account_id,
                    transaction = %record.transaction_id,
                    amount,
                    "raffle purchase"
                );
                account.raffle = account.raffle.saturating_add(amount);
                self.raffle.push(RaffleEntry::new(
                    record.account_id.as_str(),
                    amount,
                    self.rules.tickets(amount),
                    record.transaction_id.as_str(),
                    record.timestamp,
                ));
            }
            None if self.summary_window.contains(record.timestamp) => {
                account.deposits = account.deposits.saturating_add(gold);
            }
            None => {}
        }
    }

    pub(crate) fn finish(self) -> Report {
        Report {
            summary_window: self.summary_window,
            raffle_window: self.raffle_window,
            accounts: self.accounts,
            raffle: self.raffle,
            diagnostics: self.diagnostics,
        }
    }
}

/// Collects ticket purchases without checking roster membership.
pub(crate) fn raffle_entries(
    records: &[TransactionRecord],
    rules: &RaffleRules,
    excluded: &HashSet<String>,
    raffle_window: TimeWindow,
) -> RaffleReport {
    let raffle = records
        .iter()
        .filter(|record| record.kind == TransactionKind::GoldDeposit)
        .filter(|record| !excluded.contains(&record.account_id))
        .filter(|record| raffle_window.contains(record.timestamp))
        .filter_map(|record| {
            let gold = record.gold_amount?;
            let amount = rules.eligible_amount(gold)?;
            Some(RaffleEntry::new(
                record.account_id.as_str(),
                amount,
                rules.tickets(amount),
                record.transaction_id.as_str(),
                record.timestamp,
            ))
        })
        .collect();

    RaffleReport {
        raffle_window,
        raffle,
    }
}
