//! Serializable engine settings.
//!
//! `EngineConfig` is the raw, user-facing form (weekday numbers, time strings,
//! zone names). [`EngineConfig::builder`] validates it into typed schedules and
//! rules.

use std::str::FromStr;

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::{EngineBuilder, EngineError, RaffleRules, RaffleSchedule, ResultEngine, SummarySchedule};

const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enable_raffle: bool,
    pub enable_requirements: bool,
    pub ticket_price: i64,
    pub deposit_modifier: i64,
    /// Members at or above this rank cannot buy tickets.
    pub rank_filter: Option<u32>,
    /// 0 = Monday .. 6 = Sunday.
    pub raffle_day: u8,
    /// `HH:MM:SS`, wall clock in `timezone`.
    pub raffle_time: String,
    pub timezone: String,
    /// 0 = Monday .. 6 = Sunday.
    pub rollover_day: u8,
    /// UTC hour of the weekly rollover.
    pub rollover_hour: u32,
    pub exclude_users: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_raffle: true,
            enable_requirements: true,
            ticket_price: 1000,
            deposit_modifier: 1,
            rank_filter: None,
            raffle_day: 4,
            raffle_time: "20:00:00".to_string(),
            timezone: "US/Eastern".to_string(),
            rollover_day: 1,
            rollover_hour: 19,
            exclude_users: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Validates the settings into an engine builder.
    pub fn builder(&self) -> ResultEngine<EngineBuilder> {
        let rules = RaffleRules {
            enabled: self.enable_raffle,
            requirements_enabled: self.enable_requirements,
            ticket_price: self.ticket_price,
            deposit_modifier: self.deposit_modifier,
            rank_filter: self.rank_filter,
        };

        let summary = SummarySchedule {
            weekday: weekday(self.rollover_day, "rollover_day")?,
            rollover: NaiveTime::from_hms_opt(self.rollover_hour, 0, 0).ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "rollover_hour must be 0..=23, got {}",
                    self.rollover_hour
                ))
            })?,
        };

        let raffle = RaffleSchedule {
            weekday: weekday(self.raffle_day, "raffle_day")?,
            time: NaiveTime::parse_from_str(self.raffle_time.trim(), TIME_FORMAT).map_err(
                |_| {
                    EngineError::InvalidConfig(format!(
                        "raffle_time must be HH:MM:SS, got {:?}",
                        self.raffle_time
                    ))
                },
            )?,
            timezone: Tz::from_str(self.timezone.trim()).map_err(|_| {
                EngineError::InvalidConfig(format!("unknown time zone {:?}", self.timezone))
            })?,
        };

        Ok(EngineBuilder::default()
            .raffle_rules(rules)
            .summary_schedule(summary)
            .raffle_schedule(raffle)
            .exclude(self.exclude_users.iter().cloned()))
    }
}

fn weekday(day: u8, field: &str) -> ResultEngine<Weekday> {
    Weekday::try_from(day).map_err(|_| {
        EngineError::InvalidConfig(format!("{field} must be 0 (Monday) ..= 6 (Sunday), got {day}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let engine = EngineConfig::default().builder().unwrap().build().unwrap();
        assert_eq!(engine.rules(), &RaffleRules::default());
        assert_eq!(engine.summary_schedule(), &SummarySchedule::default());
        assert_eq!(engine.raffle_schedule(), &RaffleSchedule::default());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let cases = [
            EngineConfig {
                raffle_day: 7,
                ..EngineConfig::default()
            },
            EngineConfig {
                rollover_day: 9,
                ..EngineConfig::default()
            },
            EngineConfig {
                rollover_hour: 24,
                ..EngineConfig::default()
            },
            EngineConfig {
                raffle_time: "8pm".to_string(),
                ..EngineConfig::default()
            },
            EngineConfig {
                timezone: "Tamriel/Vivec".to_string(),
                ..EngineConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.builder(), Err(EngineError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn rejects_bad_raffle_numbers() {
        for config in [
            EngineConfig {
                ticket_price: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                deposit_modifier: -1,
                ..EngineConfig::default()
            },
        ] {
            let built = config.builder().and_then(EngineBuilder::build);
            assert!(matches!(built, Err(EngineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "ticket_price": 500, "timezone": "UTC", "exclude_users": ["@bank"] }"#,
        )
        .unwrap();
        assert_eq!(config.ticket_price, 500);
        assert_eq!(config.deposit_modifier, 1);
        let engine = config.builder().unwrap().build().unwrap();
        assert_eq!(engine.raffle_schedule().timezone, chrono_tz::UTC);
        assert!(engine.is_excluded("@bank"));
    }
}
