//! Server-declared call-quota tracking.
//!
//! Many APIs announce usage counters in their response headers. The
//! tracker relearns those counters from every received response,
//! error responses included, and the guard refuses new calls once the
//! quota is exhausted, before any transport I/O happens.

use std::sync::Mutex;

use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::{ErrorKind, Result};

/// Header names used to extract quota information from responses.
///
/// All keys are optional. A tracker with no keys configured never
/// learns anything and never refuses a call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaKeys {
    /// Header carrying the number of calls made so far
    #[serde(default)]
    pub call_count: Option<String>,

    /// Header carrying the total call allowance
    #[serde(default)]
    pub call_count_limit: Option<String>,

    /// Header carrying the number of calls left
    #[serde(default)]
    pub call_limit_remaining: Option<String>,
}

/// Counters learned from the server, last write wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct QuotaState {
    call_count: Option<i64>,
    call_count_limit: Option<i64>,
    remaining_calls: Option<i64>,
}

/// Tracks the server-declared remaining-call quota for one client.
///
/// The counters sit behind a mutex because every in-flight task of a
/// batch records its own response.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    keys: QuotaKeys,
    state: Mutex<QuotaState>,
}

impl QuotaTracker {
    /// Create a tracker reading the given header keys
    #[must_use]
    pub fn new(keys: QuotaKeys) -> Self {
        Self {
            keys,
            state: Mutex::new(QuotaState::default()),
        }
    }

    /// Refuse the next call if the server told us the quota is spent.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::QuotaExceeded`] when a remaining-calls count
    /// has been observed and is zero or below. A quota that was never
    /// observed allows the call.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned
    pub fn check_remaining(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        match state.remaining_calls {
            Some(remaining) if remaining <= 0 => Err(ErrorKind::QuotaExceeded { remaining }),
            _ => Ok(()),
        }
    }

    /// Relearn the counters from a response's headers.
    ///
    /// Runs after every received response, success or failure, so the
    /// guard stays accurate across a burst of calls. A configured key
    /// whose header is absent or unparseable counts as 0. When no
    /// remaining-calls key is configured, the remaining count is derived
    /// as `limit - count` once both counters are non-zero.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned
    pub fn update(&self, headers: &HeaderMap) {
        let mut state = self.state.lock().unwrap();

        if let (Some(count_key), Some(limit_key)) =
            (&self.keys.call_count, &self.keys.call_count_limit)
        {
            state.call_count = Some(header_number(headers, count_key).unwrap_or(0));
            state.call_count_limit = Some(header_number(headers, limit_key).unwrap_or(0));
        }

        if let Some(remaining_key) = &self.keys.call_limit_remaining {
            state.remaining_calls = Some(header_number(headers, remaining_key).unwrap_or(0));
        } else if let (Some(count), Some(limit)) = (state.call_count, state.call_count_limit)
            && count != 0
            && limit != 0
        {
            state.remaining_calls = Some(limit - count);
        }
    }

    /// Number of calls the server says are left, if ever observed
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned
    #[must_use]
    pub fn remaining_calls(&self) -> Option<i64> {
        self.state.lock().unwrap().remaining_calls
    }

    /// Number of calls made so far, if the server reports it
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned
    #[must_use]
    pub fn call_count(&self) -> Option<i64> {
        self.state.lock().unwrap().call_count
    }

    /// Total call allowance, if the server reports it
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned
    #[must_use]
    pub fn call_count_limit(&self) -> Option<i64> {
        self.state.lock().unwrap().call_count_limit
    }
}

/// Parse a numeric header value
fn header_number(headers: &HeaderMap, name: &str) -> Option<i64> {
    if let Some(value) = headers.get(name)
        && let Ok(value_str) = value.to_str()
        && let Ok(number) = value_str.trim().parse::<i64>()
    {
        return Some(number);
    }
    None
}
