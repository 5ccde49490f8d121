// src/outcome.rs
//! Best-effort results.
//!
//! Operations whose external contract is "never fails" (snapshot reads, AI
//! summaries, translation) return an [`Outcome`]: either the fresh value or a
//! fallback value plus the reason the fallback was used.

use std::fmt;

/// Why a degraded value was substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The external provider is not configured.
    Disabled,
    /// The provider call failed (transport, HTTP status, decode).
    ProviderError,
    /// The provider answered with nothing usable.
    EmptyResponse,
    /// The per-day call budget is spent.
    DailyLimit,
    /// No snapshot has been written yet.
    SnapshotMissing,
    /// The snapshot exists but cannot be read or parsed.
    SnapshotCorrupt,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Disabled => "disabled",
            FallbackReason::ProviderError => "error",
            FallbackReason::EmptyResponse => "empty",
            FallbackReason::DailyLimit => "daily-limit",
            FallbackReason::SnapshotMissing => "snapshot-missing",
            FallbackReason::SnapshotCorrupt => "snapshot-corrupt",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fresh(T),
    Degraded { value: T, reason: FallbackReason },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: FallbackReason) -> Self {
        Outcome::Degraded { value, reason }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Outcome::Fresh(_))
    }

    pub fn reason(&self) -> Option<FallbackReason> {
        match self {
            Outcome::Fresh(_) => None,
            Outcome::Degraded { reason, .. } => Some(*reason),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Fresh(v) | Outcome::Degraded { value: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Fresh(v) | Outcome::Degraded { value: v, .. } => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Fresh(v) => Outcome::Fresh(f(v)),
            Outcome::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}
