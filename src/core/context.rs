//! Per-call host context
//!
//! Every mutating operation on a [`Ledger`](crate::token::Ledger) or the
//! [`Registry`](crate::registry::Registry) receives the identity of the
//! caller and the timestamp of the call explicitly, so the same logic runs
//! unchanged from the CLI and from tests with fixed identities and times.

use alloy_primitives::Address;
use chrono::{DateTime, TimeZone, Utc};

/// Identity and time supplied by the host for a single call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Identity performing the call
    pub caller: Address,
    /// Host timestamp of the call
    pub timestamp: DateTime<Utc>,
}

impl CallContext {
    /// Create a context for `caller` at an explicit timestamp
    pub fn new(caller: Address, timestamp: DateTime<Utc>) -> Self {
        Self { caller, timestamp }
    }

    /// Create a context for `caller` stamped with the current wall clock
    pub fn now(caller: Address) -> Self {
        Self::new(caller, Utc::now())
    }

    /// Create a context from a unix timestamp in seconds.
    ///
    /// Out-of-range values fall back to the unix epoch.
    pub fn at_unix(caller: Address, secs: i64) -> Self {
        let timestamp = Utc
            .timestamp_opt(secs, 0)
            .single()
            .unwrap_or_default();
        Self::new(caller, timestamp)
    }
}
