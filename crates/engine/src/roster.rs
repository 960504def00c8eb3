//! Member roster: the sales export that seeds every account summary.
//!
//! Each export entry is `account&sales&purchases&taxes&rank`; older exports
//! omit the taxes column (`account&sales&purchases&rank`).

use std::collections::HashMap;

use crate::{
    Diagnostic,
    diagnostics::Source,
    lua::{LuaTable, LuaValue},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub account_id: String,
    pub rank: u32,
    pub sales: i64,
    pub purchases: i64,
    /// `None` when the export has no taxes column.
    pub taxes: Option<i64>,
}

/// Members in export order, unique by account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    members: Vec<Member>,
    index: HashMap<String, usize>,
}

impl Roster {
    /// Adds a member. A second entry for the same account replaces the first
    /// but keeps its position.
    pub fn insert(&mut self, member: Member) {
        match self.index.get(&member.account_id) {
            Some(&position) => self.members[position] = member,
            None => {
                self.index
                    .insert(member.account_id.clone(), self.members.len());
                self.members.push(member);
            }
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<Member> for Roster {
    fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
        let mut roster = Roster::default();
        for member in iter {
            roster.insert(member);
        }
        roster
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedRoster {
    pub roster: Roster,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decodes a guild export table into a roster.
pub fn decode(table: &LuaTable) -> DecodedRoster {
    let mut decoded = DecodedRoster::default();

    for (key, value) in table.iter() {
        let member = match value {
            LuaValue::String(line) => decode_line(line),
            other => Err(format!("expected a string, found {}", other.type_name())),
        };
        match member {
            Ok(member) => decoded.roster.insert(member),
            Err(reason) => Diagnostic::malformed(Source::Roster, key, reason)
                .record(&mut decoded.diagnostics),
        }
    }

    tracing::debug!(members = decoded.roster.len(), "decoded roster");
    decoded
}

pub fn decode_line(line: &str) -> Result<Member, String> {
    let fields: Vec<&str> = line.trim().split('&').collect();
    let (account, sales, purchases, taxes, rank) = match fields.as_slice() {
        [account, sales, purchases, taxes, rank] => (account, sales, purchases, Some(taxes), rank),
        [account, sales, purchases, rank] => (account, sales, purchases, None, rank),
        _ => {
            return Err(format!(
                "expected 4 or 5 '&' separated fields, found {}",
                fields.len()
            ));
        }
    };

    if account.is_empty() {
        return Err("missing account".to_string());
    }

    Ok(Member {
        account_id: account.to_string(),
        sales: number(sales, "sales")?,
        purchases: number(purchases, "purchases")?,
        taxes: taxes.map(|taxes| number(taxes, "taxes")).transpose()?,
        rank: rank
            .parse()
            .map_err(|_| format!("invalid rank {rank:?}"))?,
    })
}

fn number(field: &str, label: &str) -> Result<i64, String> {
    field
        .parse()
        .map_err(|_| format!("invalid {label} {field:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::LuaKey;

    #[test]
    fn decodes_both_export_layouts() {
        let full = decode_line("@alice&125000&3000&4375&2").unwrap();
        assert_eq!(full.account_id, "@alice");
        assert_eq!(full.sales, 125_000);
        assert_eq!(full.purchases, 3000);
        assert_eq!(full.taxes, Some(4375));
        assert_eq!(full.rank, 2);

        let short = decode_line("@bob&0&10&5").unwrap();
        assert_eq!(short.taxes, None);
        assert_eq!(short.rank, 5);
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(decode_line("@alice&1&2").is_err());
        assert!(decode_line("@alice&x&2&3").is_err());
        assert!(decode_line("&1&2&3").is_err());
        assert!(decode_line("@alice&1&2&3&-1").is_err());
    }

    #[test]
    fn keeps_export_order_and_replaces_duplicates() {
        let table = LuaTable::new(vec![
            (LuaKey::Index(1), LuaValue::String("@b&1&0&3".to_string())),
            (LuaKey::Index(2), LuaValue::String("@a&2&0&4".to_string())),
            (LuaKey::Index(3), LuaValue::String("bad".to_string())),
            (LuaKey::Index(4), LuaValue::String("@b&9&0&3".to_string())),
        ]);

        let decoded = decode(&table);
        let ids: Vec<_> = decoded
            .roster
            .members()
            .iter()
            .map(|m| m.account_id.as_str())
            .collect();
        assert_eq!(ids, ["@b", "@a"]);
        assert_eq!(decoded.roster.members()[0].sales, 9);
        assert_eq!(decoded.diagnostics.len(), 1);
    }
}
