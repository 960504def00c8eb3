//! Locating one guild's data inside a SavedVariables document.
//!
//! Addons store per-account data under
//! `<Root>.Default.<account>.$AccountWide.<section>.<guild>`. When the
//! exporting account is not known, the first table below `<Root>` keyed by the
//! guild name is used instead.

use crate::{
    EngineError, ResultEngine,
    lua::{LuaDocument, LuaKey, LuaTable, LuaValue},
};

/// Root global written by the Guild Bank Ledger addon.
pub const LEDGER_ROOT: &str = "GBLDataSavedVariables";
/// Section of the ledger addon holding transaction history.
pub const LEDGER_SECTION: &str = "history";
/// Root global written by Master Merchant.
pub const ROSTER_ROOT: &str = "ShopkeeperSavedVars";
/// Section of Master Merchant holding the member export.
pub const ROSTER_SECTION: &str = "EXPORT";

const ACCOUNT_WIDE: &str = "$AccountWide";
const DEFAULT_PROFILE: &str = "Default";

/// Where a guild table lives in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildScope<'a> {
    pub root: &'a str,
    pub section: &'a str,
    pub guild: &'a str,
    /// Account that ran the export. `None` searches below the root.
    pub account: Option<&'a str>,
}

impl<'a> GuildScope<'a> {
    pub fn ledger(guild: &'a str, account: Option<&'a str>) -> Self {
        Self {
            root: LEDGER_ROOT,
            section: LEDGER_SECTION,
            guild,
            account,
        }
    }

    pub fn roster(guild: &'a str, account: Option<&'a str>) -> Self {
        Self {
            root: ROSTER_ROOT,
            section: ROSTER_SECTION,
            guild,
            account,
        }
    }

    /// Returns the guild table of this scope.
    pub fn locate<'d>(&self, document: &'d LuaDocument) -> ResultEngine<&'d LuaTable> {
        match self.account {
            Some(account) => {
                let path = [DEFAULT_PROFILE, account, ACCOUNT_WIDE, self.section, self.guild];
                let mut table = document
                    .global(self.root)
                    .and_then(LuaValue::as_table)
                    .ok_or_else(|| EngineError::MissingTable(self.root.to_string()))?;
                let mut walked = self.root.to_string();
                for step in path {
                    walked.push('.');
                    walked.push_str(step);
                    table = table
                        .get(step)
                        .and_then(LuaValue::as_table)
                        .ok_or_else(|| EngineError::MissingTable(walked.clone()))?;
                }
                Ok(table)
            }
            None => document
                .global(self.root)
                .and_then(LuaValue::as_table)
                .and_then(|table| find_named_table(table, self.guild))
                .ok_or_else(|| EngineError::MissingTable(format!("{}..{}", self.root, self.guild))),
        }
    }
}

/// Depth-first search for the first table stored under `name`.
fn find_named_table<'d>(table: &'d LuaTable, name: &str) -> Option<&'d LuaTable> {
    for (key, value) in table.iter() {
        let Some(child) = value.as_table() else {
            continue;
        };
        if matches!(key, LuaKey::Name(key) if key == name) {
            return Some(child);
        }
        if let Some(found) = find_named_table(child, name) {
            return Some(found);
        }
    }
    None
}
