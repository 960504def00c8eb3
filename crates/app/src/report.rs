//! CSV output of a report.
//!
//! Each file is a projection: an ordered list of column selectors applied to
//! every row. An empty selector (`""`) produces a blank column, and fields
//! that do not apply (unknown taxes, no ticket count) are written blank rather
//! than as `0`.
//!
//! The ledger dump uses the same projection, tab-delimited, one row per
//! decoded bank transaction.

use std::io;

use chrono::{DateTime, Utc};
use csv::{Writer, WriterBuilder};
use engine::{AccountSummary, ENTRY_DATE_FORMAT, RaffleEntry, TransactionRecord};
use serde::Deserialize;

use crate::error::Result;

/// Format of the run time written above the donation summary.
const PREFIX_DATE_FORMAT: &str = "%m/%d/%y %H:%M:%S";

/// A column that can be rendered for rows of type `R`.
pub trait Column<R> {
    /// Header text, the selector as configured.
    fn header(&self) -> &'static str;
    /// Cell text, `None` when the field does not apply.
    fn cell(&self, row: &R) -> Option<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryColumn {
    #[serde(alias = "account_id")]
    Username,
    Rank,
    Sales,
    Taxes,
    Purchases,
    Deposits,
    Raffle,
    Donations,
    #[serde(rename = "")]
    Blank,
}

impl SummaryColumn {
    pub fn default_layout() -> Vec<Self> {
        vec![
            Self::Username,
            Self::Rank,
            Self::Sales,
            Self::Taxes,
            Self::Deposits,
            Self::Raffle,
            Self::Donations,
            Self::Purchases,
        ]
    }
}

impl Column<AccountSummary> for SummaryColumn {
    fn header(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Rank => "rank",
            Self::Sales => "sales",
            Self::Taxes => "taxes",
            Self::Purchases => "purchases",
            Self::Deposits => "deposits",
            Self::Raffle => "raffle",
            Self::Donations => "donations",
            Self::Blank => "",
        }
    }

    fn cell(&self, row: &AccountSummary) -> Option<String> {
        match self {
            Self::Username => Some(row.account_id.clone()),
            Self::Rank => Some(row.rank.to_string()),
            Self::Sales => Some(row.sales.to_string()),
            Self::Taxes => row.taxes.map(|taxes| taxes.to_string()),
            Self::Purchases => Some(row.purchases.to_string()),
            Self::Deposits => Some(row.deposits.to_string()),
            Self::Raffle => Some(row.raffle.to_string()),
            Self::Donations => Some(row.donations.to_string()),
            Self::Blank => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaffleColumn {
    #[serde(alias = "account_id")]
    Username,
    Date,
    #[serde(rename = "transactionId", alias = "transaction_id")]
    TransactionId,
    Amount,
    Tickets,
    /// Seconds since the Unix epoch.
    Timestamp,
    #[serde(rename = "")]
    Blank,
}

impl RaffleColumn {
    pub fn default_layout() -> Vec<Self> {
        vec![
            Self::Username,
            Self::Date,
            Self::TransactionId,
            Self::Amount,
        ]
    }
}

impl Column<RaffleEntry> for RaffleColumn {
    fn header(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Date => "date",
            Self::TransactionId => "transactionId",
            Self::Amount => "amount",
            Self::Tickets => "tickets",
            Self::Timestamp => "timestamp",
            Self::Blank => "",
        }
    }

    fn cell(&self, row: &RaffleEntry) -> Option<String> {
        match self {
            Self::Username => Some(row.account_id.clone()),
            Self::Date => Some(row.date.clone()),
            Self::TransactionId => Some(row.transaction_id.clone()),
            Self::Amount => Some(row.amount.to_string()),
            Self::Tickets => row.tickets.map(|tickets| tickets.to_string()),
            Self::Timestamp => Some(row.timestamp.timestamp().to_string()),
            Self::Blank => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerColumn {
    /// Seconds since the Unix epoch.
    Timestamp,
    Date,
    #[serde(alias = "account_id")]
    Username,
    /// Addon code: `dep_gold`, `wd_item`, ...
    Kind,
    Gold,
    Count,
    Description,
    /// Per-item value in gold.
    Value,
    #[serde(rename = "transactionId", alias = "transaction_id")]
    TransactionId,
    #[serde(rename = "")]
    Blank,
}

impl LedgerColumn {
    pub fn default_layout() -> Vec<Self> {
        vec![
            Self::Timestamp,
            Self::Username,
            Self::Kind,
            Self::Gold,
            Self::Count,
            Self::Description,
            Self::Value,
            Self::TransactionId,
        ]
    }
}

impl Column<TransactionRecord> for LedgerColumn {
    fn header(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Username => "username",
            Self::Kind => "kind",
            Self::Gold => "gold",
            Self::Count => "count",
            Self::Description => "description",
            Self::Value => "value",
            Self::TransactionId => "transactionId",
            Self::Blank => "",
        }
    }

    fn cell(&self, row: &TransactionRecord) -> Option<String> {
        match self {
            Self::Timestamp => Some(row.timestamp.timestamp().to_string()),
            Self::Date => Some(row.timestamp.format(ENTRY_DATE_FORMAT).to_string()),
            Self::Username => Some(row.account_id.clone()),
            Self::Kind => Some(row.kind.as_str().to_string()),
            Self::Gold => row.gold_amount.map(|gold| gold.to_string()),
            Self::Count => row.item_count.map(|count| count.to_string()),
            Self::Description => row.item_description.clone(),
            Self::Value => row.item_unit_value.map(|value| value.to_string()),
            Self::TransactionId => Some(row.transaction_id.clone()),
            Self::Blank => None,
        }
    }
}

/// Options shared by every output file.
#[derive(Clone, Copy, Debug, Default)]
pub struct Layout {
    pub headers: bool,
    /// Run time written as a single-field first line.
    pub prefix_date: Option<DateTime<Utc>>,
}

/// Writes `rows` projected through `columns`.
pub fn write_table<W, R, C>(writer: W, rows: &[R], columns: &[C], layout: Layout) -> Result<()>
where
    W: io::Write,
    C: Column<R>,
{
    write_rows(
        WriterBuilder::new().flexible(true).from_writer(writer),
        rows,
        columns,
        layout,
    )
}

/// Writes `rows` projected through `columns`, separated by tabs.
pub fn write_tsv<W, R, C>(writer: W, rows: &[R], columns: &[C], layout: Layout) -> Result<()>
where
    W: io::Write,
    C: Column<R>,
{
    write_rows(
        WriterBuilder::new()
            .flexible(true)
            .delimiter(b'\t')
            .from_writer(writer),
        rows,
        columns,
        layout,
    )
}

fn write_rows<W, R, C>(mut csv: Writer<W>, rows: &[R], columns: &[C], layout: Layout) -> Result<()>
where
    W: io::Write,
    C: Column<R>,
{
    if let Some(date) = layout.prefix_date {
        csv.write_record([date.format(PREFIX_DATE_FORMAT).to_string()])?;
    }
    if layout.headers {
        csv.write_record(columns.iter().map(|column| column.header()))?;
    }
    for row in rows {
        csv.write_record(
            columns
                .iter()
                .map(|column| column.cell(row).unwrap_or_default()),
        )?;
    }

    csv.flush()?;
    Ok(())
}
