//! Recoverable problems found while decoding or aggregating.
//!
//! A diagnostic never stops a run. Each one is logged when it is recorded and
//! kept in the report so callers can show or count them.

use std::fmt;

/// Which export a malformed line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Ledger,
    Roster,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ledger => "ledger",
            Self::Roster => "roster",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A line that could not be decoded and was skipped.
    MalformedRecord {
        source: Source,
        key: String,
        reason: String,
    },
    /// A ledger transaction by an account that is not on the roster.
    UnknownAccount {
        account_id: String,
        transaction_id: String,
    },
}

impl Diagnostic {
    pub(crate) fn malformed(source: Source, key: impl ToString, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            source,
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Logs the diagnostic and stores it.
    pub(crate) fn record(self, sink: &mut Vec<Diagnostic>) {
        tracing::warn!("{self}");
        sink.push(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord {
                source,
                key,
                reason,
            } => write!(f, "skipping malformed {source} record {key}: {reason}"),
            Self::UnknownAccount {
                account_id,
                transaction_id,
            } => write!(
                f,
                "user not found: {account_id} (transaction {transaction_id})"
            ),
        }
    }
}
