//! Ledger decoding: one guild's bank history table into transaction records.
//!
//! Every history entry is a string of tab separated fields:
//!
//! ```text
//! timestamp  account  kind  gold  item_count  description  item_link  item_value  transaction_id
//! ```
//!
//! `nil` (or an empty field) marks a value that does not apply. Fields past the
//! ninth are ignored.

use chrono::{DateTime, Utc};

use crate::{
    Diagnostic, TransactionKind, TransactionRecord, UnitValue,
    diagnostics::Source,
    lua::{LuaTable, LuaValue},
};

const FIELD_COUNT: usize = 9;

/// Records decoded from a history table, in table order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedLedger {
    pub records: Vec<TransactionRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decodes a guild history table. Entries that fail to decode are skipped
/// and reported.
pub fn decode(table: &LuaTable) -> DecodedLedger {
    let mut ledger = DecodedLedger::default();

    for (key, value) in table.iter() {
        let decoded = match value {
            LuaValue::String(line) => decode_line(line),
            other => Err(format!("expected a string, found {}", other.type_name())),
        };
        match decoded {
            Ok(record) => ledger.records.push(record),
            Err(reason) => {
                Diagnostic::malformed(Source::Ledger, key, reason).record(&mut ledger.diagnostics)
            }
        }
    }

    tracing::debug!(
        records = ledger.records.len(),
        skipped = ledger.diagnostics.len(),
        "decoded ledger"
    );
    ledger
}

/// Decodes one history line. The error is a human readable reason.
pub fn decode_line(line: &str) -> Result<TransactionRecord, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < FIELD_COUNT {
        return Err(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        ));
    }

    let timestamp = parse_timestamp(fields[0])?;
    let account_id = required(fields[1], "account")?;
    let kind = TransactionKind::from(fields[2]);
    let gold = optional(fields[3], "gold amount", |v| v.parse::<i64>().ok())?;
    let count = optional(fields[4], "item count", |v| v.parse::<i64>().ok())?;
    let description = (!is_absent(fields[5])).then(|| fields[5].to_string());
    let unit_value = optional(fields[7], "item value", |v| v.parse::<UnitValue>().ok())?;
    let transaction_id = required(fields[8], "transaction id")?;

    Ok(TransactionRecord::new(timestamp, account_id, kind, transaction_id)
        .with_gold(gold)
        .with_items(count, unit_value, description))
}

fn parse_timestamp(field: &str) -> Result<DateTime<Utc>, String> {
    field
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| format!("invalid timestamp {field:?}"))
}

fn is_absent(field: &str) -> bool {
    let field = field.trim();
    field.is_empty() || field == "nil"
}

fn required<'a>(field: &'a str, label: &str) -> Result<&'a str, String> {
    let trimmed = field.trim();
    if is_absent(trimmed) {
        return Err(format!("missing {label}"));
    }
    Ok(trimmed)
}

fn optional<T>(
    field: &str,
    label: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, String> {
    if is_absent(field) {
        return Ok(None);
    }
    parse(field.trim())
        .map(Some)
        .ok_or_else(|| format!("invalid {label} {field:?}"))
}
