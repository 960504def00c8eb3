//! Raffle ticket eligibility.
//!
//! A gold deposit buys tickets when, after removing the deposit modifier, it is
//! an exact multiple of the ticket price. With a price of 1000 and a modifier
//! of 1, a deposit of 5001 buys five tickets (5000 gold) while 5000 or 5101
//! are plain deposits.

use chrono::{DateTime, Utc};

/// Display format of [`RaffleEntry::date`].
pub const ENTRY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decides whether a gold deposit is a ticket purchase.
///
/// Returns the amount spent on tickets, or `None` for a plain deposit. With
/// requirements disabled every deposit is eligible for its full amount.
/// A zero `ticket_price` never admits a deposit.
pub fn classify(
    gold_amount: i64,
    ticket_price: i64,
    modifier: i64,
    requirements_enabled: bool,
) -> Option<i64> {
    if !requirements_enabled {
        return Some(gold_amount);
    }
    let net = gold_amount.checked_sub(modifier)?;
    (net.checked_rem_euclid(ticket_price)? == 0).then_some(net)
}

/// Validated raffle parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaffleRules {
    /// When off, no deposit is ever a ticket purchase.
    pub enabled: bool,
    pub requirements_enabled: bool,
    pub ticket_price: i64,
    pub deposit_modifier: i64,
    /// Members ranked at or above this rank (1 = guild leader) cannot buy
    /// tickets; their deposits are plain deposits.
    pub rank_filter: Option<u32>,
}

impl Default for RaffleRules {
    fn default() -> Self {
        Self {
            enabled: true,
            requirements_enabled: true,
            ticket_price: 1000,
            deposit_modifier: 1,
            rank_filter: None,
        }
    }
}

impl RaffleRules {
    /// Ticket amount for a deposit, `None` if it is a plain deposit.
    pub fn eligible_amount(&self, gold_amount: i64) -> Option<i64> {
        if !self.enabled {
            return None;
        }
        classify(
            gold_amount,
            self.ticket_price,
            self.deposit_modifier,
            self.requirements_enabled,
        )
    }

    /// Whether a member of `rank` may buy tickets at all.
    pub fn admits_rank(&self, rank: u32) -> bool {
        self.rank_filter.is_none_or(|filter| rank > filter)
    }

    /// Number of tickets an eligible amount buys. Without requirements there
    /// is no fixed price, so no count.
    pub fn tickets(&self, eligible_amount: i64) -> Option<i64> {
        if !self.requirements_enabled {
            return None;
        }
        eligible_amount.checked_div(self.ticket_price)
    }
}

/// One ticket purchase, in ledger order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaffleEntry {
    pub account_id: String,
    pub amount: i64,
    pub tickets: Option<i64>,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub date: String,
}

impl RaffleEntry {
    pub fn new(
        account_id: impl Into<String>,
        amount: i64,
        tickets: Option<i64>,
        transaction_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            amount,
            tickets,
            transaction_id: transaction_id.into(),
            timestamp,
            date: timestamp.format(ENTRY_DATE_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn modifier_and_price_rule() {
        assert_eq!(classify(5001, 1000, 1, true), Some(5000));
        assert_eq!(classify(5000, 1000, 1, true), None);
        assert_eq!(classify(6001, 1000, 1, true), Some(6000));
        assert_eq!(classify(5101, 500, 1, true), None);
        assert_eq!(classify(5001, 500, 1, true), Some(5000));
    }

    #[test]
    fn zero_modifier_only_checks_divisibility() {
        assert_eq!(classify(3000, 1000, 0, true), Some(3000));
        assert_eq!(classify(3001, 1000, 0, true), None);
    }

    #[test]
    fn disabled_requirements_accept_everything() {
        for amount in [0, 1, 999, 5000, 5001, 123_456] {
            assert_eq!(classify(amount, 1000, 1, false), Some(amount));
        }
    }

    #[test]
    fn small_deposits_are_plain() {
        assert_eq!(classify(0, 1000, 1, true), None);
        assert_eq!(classify(500, 1000, 1, true), None);
        assert_eq!(classify(1000, 1000, 1, true), None);
    }

    #[test]
    fn zero_ticket_price_admits_nothing() {
        assert_eq!(classify(5001, 0, 1, true), None);
        assert_eq!(classify(1, 0, 1, true), None);
        let rules = RaffleRules {
            ticket_price: 0,
            ..RaffleRules::default()
        };
        assert_eq!(rules.eligible_amount(5001), None);
        assert_eq!(rules.tickets(5000), None);
    }

    #[test]
    fn rules_respect_switches() {
        let rules = RaffleRules::default();
        assert_eq!(rules.eligible_amount(2001), Some(2000));
        assert_eq!(rules.tickets(2000), Some(2));

        let off = RaffleRules {
            enabled: false,
            ..RaffleRules::default()
        };
        assert_eq!(off.eligible_amount(2001), None);

        let free = RaffleRules {
            requirements_enabled: false,
            ..RaffleRules::default()
        };
        assert_eq!(free.eligible_amount(2345), Some(2345));
        assert_eq!(free.tickets(2345), None);
    }

    #[test]
    fn rank_filter_blocks_higher_ranks() {
        let rules = RaffleRules {
            rank_filter: Some(2),
            ..RaffleRules::default()
        };
        assert!(!rules.admits_rank(1));
        assert!(!rules.admits_rank(2));
        assert!(rules.admits_rank(3));
        assert!(RaffleRules::default().admits_rank(1));
    }

    #[test]
    fn entry_date_is_utc_display() {
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 1).unwrap();
        let entry = RaffleEntry::new("@a", 5000, Some(5), "77", at);
        assert_eq!(entry.date, "2024-05-03 23:59:01");
    }
}
