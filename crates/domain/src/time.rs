//! Time helpers.
//!
//! Rule schedules are expressed in wall-clock time of the router, so the
//! helpers here work on local naive date-times rather than UTC instants.

use chrono::{Local, NaiveDateTime};

/// Local wall-clock moment used when computing rule status.
pub type LocalMoment = NaiveDateTime;

/// Return the current local wall-clock time.
#[must_use]
pub fn now_local() -> LocalMoment {
    Local::now().naive_local()
}
