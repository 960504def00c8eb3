//! Reading the addon exports from disk.

use std::{fs, path::Path};

use engine::{GuildScope, Roster, TransactionRecord, ledger, lua, roster};

use crate::error::Result;

/// Loads the guild's bank history.
///
/// A missing or unreadable ledger is treated as empty so the roster report
/// can still be written.
pub fn load_ledger(path: &Path, scope: &GuildScope<'_>) -> Vec<TransactionRecord> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("cannot read ledger {}: {err}", path.display());
            return Vec::new();
        }
    };

    let document = match lua::parse(&text) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!("cannot decode ledger {}: {err}", path.display());
            return Vec::new();
        }
    };

    match scope.locate(&document) {
        Ok(table) => {
            let decoded = ledger::decode(table);
            tracing::info!(
                "read {} ledger records from {} ({} skipped)",
                decoded.records.len(),
                path.display(),
                decoded.diagnostics.len()
            );
            decoded.records
        }
        Err(err) => {
            tracing::warn!("{err} in {}", path.display());
            Vec::new()
        }
    }
}

/// Loads the guild's member export. The file must be readable and parse,
/// a guild missing from it gives an empty roster.
pub fn load_roster(path: &Path, scope: &GuildScope<'_>) -> Result<Roster> {
    let text = fs::read_to_string(path)?;
    let document = lua::parse(&text)?;

    match scope.locate(&document) {
        Ok(table) => {
            let decoded = roster::decode(table);
            tracing::info!(
                "read {} members from {} ({} skipped)",
                decoded.roster.len(),
                path.display(),
                decoded.diagnostics.len()
            );
            Ok(decoded.roster)
        }
        Err(err) => {
            tracing::warn!("{err} in {}", path.display());
            Ok(Roster::default())
        }
    }
}
