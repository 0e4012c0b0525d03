//! Time related utils.

use std::fmt::Debug;
use std::str::FromStr;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;

use crate::Error;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Date format: "20220313"
const DATE: &str = "%Y%m%d";

/// Time format for ISO 8601: "20220313T072004Z"
const ISO8601: &str = "%Y%m%dT%H%M%SZ";

/// Create date time from now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into date: `20220301`
pub fn format_date(t: DateTime) -> String {
    t.format(DATE).to_string()
}

/// Format time into ISO8601: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format(ISO8601).to_string()
}

/// Parse ISO8601 time like `20220313T072004Z`.
pub fn parse_iso8601(s: &str) -> crate::Result<DateTime> {
    NaiveDateTime::parse_from_str(s, ISO8601)
        .map(|t| t.and_utc())
        .map_err(|e| {
            Error::request_invalid(format!("invalid iso8601 time: {s}")).with_source(e)
        })
}

/// SigningTime is the instant a request is signed at.
///
/// Both string forms used by signatures are rendered once at construction so
/// that signing many requests with the same instant doesn't re-format them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningTime {
    time: DateTime,
    iso8601: String,
    short_date: String,
}

impl SigningTime {
    /// Create a signing time from a UTC date time.
    pub fn new(time: DateTime) -> Self {
        Self {
            time,
            iso8601: format_iso8601(time),
            short_date: format_date(time),
        }
    }

    /// Create a signing time from seconds since unix epoch.
    ///
    /// Returns `None` if `secs` is out of range.
    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::new)
    }

    /// The full timestamp, for example `20220313T072004Z`.
    pub fn iso8601(&self) -> &str {
        &self.iso8601
    }

    /// The short date, for example `20220313`.
    pub fn short_date(&self) -> &str {
        &self.short_date
    }

    /// The calendar day (UTC) of this instant.
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }

    /// The underlying date time.
    pub fn as_datetime(&self) -> DateTime {
        self.time
    }
}

impl From<DateTime> for SigningTime {
    fn from(time: DateTime) -> Self {
        Self::new(time)
    }
}

impl FromStr for SigningTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_iso8601(s).map(Self::new)
    }
}

/// Clock is the source of "now".
///
/// Everything that needs the current time takes a clock instead of calling
/// [`now`] directly, so tests can pin time without touching globals.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> DateTime;
}

/// SystemClock reads the wall clock.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        now()
    }
}

/// FixedClock always returns the same instant.
#[derive(Debug, Copy, Clone)]
pub struct FixedClock(pub DateTime);

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}
