//! Transaction primitives.
//!
//! A `TransactionRecord` is one normalized guild bank ledger entry. Gold
//! fields and item fields are mutually exclusive and follow the kind.

use chrono::{DateTime, Utc};
use crate::UnitValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    GoldDeposit,
    GoldWithdrawal,
    ItemDeposit,
    ItemWithdrawal,
    Other,
}

impl TransactionKind {
    /// Code used by the ledger addon.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoldDeposit => "dep_gold",
            Self::GoldWithdrawal => "wd_gold",
            Self::ItemDeposit => "dep_item",
            Self::ItemWithdrawal => "wd_item",
            Self::Other => "other",
        }
    }

    pub fn is_gold(self) -> bool {
        matches!(self, Self::GoldDeposit | Self::GoldWithdrawal)
    }

    pub fn is_item(self) -> bool {
        matches!(self, Self::ItemDeposit | Self::ItemWithdrawal)
    }
}

impl From<&str> for TransactionKind {
    /// Unknown codes (guild store purchases, fees, ...) become `Other`.
    fn from(value: &str) -> Self {
        match value {
            "dep_gold" => Self::GoldDeposit,
            "wd_gold" => Self::GoldWithdrawal,
            "dep_item" => Self::ItemDeposit,
            "wd_item" => Self::ItemWithdrawal,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub account_id: String,
    pub kind: TransactionKind,
    pub gold_amount: Option<i64>,
    pub item_count: Option<i64>,
    pub item_unit_value: Option<UnitValue>,
    pub item_description: Option<String>,
    pub transaction_id: String,
}

impl TransactionRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        account_id: impl Into<String>,
        kind: TransactionKind,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            account_id: account_id.into(),
            kind,
            gold_amount: None,
            item_count: None,
            item_unit_value: None,
            item_description: None,
            transaction_id: transaction_id.into(),
        }
    }

    /// Sets the gold amount. Ignored unless the kind is a gold kind.
    pub fn with_gold(mut self, amount: Option<i64>) -> Self {
        if self.kind.is_gold() {
            self.gold_amount = amount;
        }
        self
    }

    /// Sets the item fields. Ignored unless the kind is an item kind.
    pub fn with_items(
        mut self,
        count: Option<i64>,
        unit_value: Option<UnitValue>,
        description: Option<String>,
    ) -> Self {
        if self.kind.is_item() {
            self.item_count = count;
            self.item_unit_value = unit_value;
            self.item_description = description;
        }
        self
    }

    /// Value of an item deposit in whole gold, when count and value are known.
    pub fn item_total(&self) -> Option<i64> {
        match (self.item_count, self.item_unit_value) {
            (Some(count), Some(value)) => Some(value.total_gold(count)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn kind_round_trips_addon_codes() {
        for kind in [
            TransactionKind::GoldDeposit,
            TransactionKind::GoldWithdrawal,
            TransactionKind::ItemDeposit,
            TransactionKind::ItemWithdrawal,
        ] {
            assert_eq!(TransactionKind::from(kind.as_str()), kind);
        }
        assert_eq!(TransactionKind::from("buy_store"), TransactionKind::Other);
    }

    #[test]
    fn gold_and_item_fields_follow_kind() {
        let gold = TransactionRecord::new(at(), "@a", TransactionKind::GoldDeposit, "1")
            .with_gold(Some(10))
            .with_items(Some(2), Some(UnitValue::from_gold(3)), None);
        assert_eq!(gold.gold_amount, Some(10));
        assert_eq!(gold.item_count, None);
        assert_eq!(gold.item_unit_value, None);

        let item = TransactionRecord::new(at(), "@a", TransactionKind::ItemDeposit, "2")
            .with_gold(Some(10))
            .with_items(Some(2), Some(UnitValue::from_gold(3)), None);
        assert_eq!(item.gold_amount, None);
        assert_eq!(item.item_total(), Some(6));

        let other = TransactionRecord::new(at(), "@a", TransactionKind::Other, "3")
            .with_gold(Some(10))
            .with_items(Some(2), None, None);
        assert_eq!(other.gold_amount, None);
        assert_eq!(other.item_count, None);
    }

    #[test]
    fn unknown_unit_value_is_not_zero() {
        let item = TransactionRecord::new(at(), "@a", TransactionKind::ItemDeposit, "2")
            .with_items(Some(4), None, None);
        assert_eq!(item.item_total(), None);
    }
}
