//! Revision metadata and row stamping
//!
//! `datesec` is elapsed seconds since 1998-01-01T00:00:00 TT, i.e. UTC
//! elapsed time plus every leap second inserted after the epoch.

use crate::errors::{LimitsError, Result};
use crate::model::entity::Entity;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Unix time of 1998-01-01T00:00:00 UTC
const UNIX_1998: i64 = 883_612_800;

/// UTC offset of the TT epoch: 1998.0 TT is 1997-12-31T23:58:56.816 UTC
const EPOCH_OFFSET_SECS: f64 = 63.184;

/// Unix times at which a leap second had just been inserted
const LEAP_SECONDS: [i64; 6] = [
    915_148_800,   // 1999-01-01
    1_136_073_600, // 2006-01-01
    1_230_768_000, // 2009-01-01
    1_341_100_800, // 2012-07-01
    1_435_708_800, // 2015-07-01
    1_483_228_800, // 2017-01-01
];

/// Calendar date/time read from a `$Date` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl RevisionDate {
    /// Build from the six numeric captures of a `$Date` keyword
    ///
    /// A four-digit first component is read as `YYYY/MM/DD`, a four-digit
    /// last component as `MM/DD/YYYY`. Anything else is a two-digit-year
    /// `YY/MM/DD` stamp from older RCS versions.
    pub fn from_captures(date: [&str; 3], time: [&str; 3]) -> Option<Self> {
        let [a, b, c] = date;
        let (year, month, day) = if a.len() == 4 {
            (a.parse().ok()?, b.parse().ok()?, c.parse().ok()?)
        } else if c.len() == 4 {
            (c.parse().ok()?, a.parse().ok()?, b.parse().ok()?)
        } else {
            let yy: i32 = a.parse().ok()?;
            let year = if yy >= 70 { 1900 + yy } else { 2000 + yy };
            (year, b.parse().ok()?, c.parse().ok()?)
        };
        Some(Self {
            year,
            month,
            day,
            hour: time[0].parse().ok()?,
            minute: time[1].parse().ok()?,
            second: time[2].parse().ok()?,
        })
    }

    /// `YYYY-MM-DD HH:MM:SS`
    pub fn to_date_string(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// Seconds since the mission epoch
    ///
    /// # Errors
    ///
    /// `InvalidDate` when the fields do not name a real calendar instant.
    pub fn datesec(&self) -> Result<f64> {
        let naive = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, self.second))
            .ok_or_else(|| LimitsError::InvalidDate {
                value: self.to_date_string(),
            })?;
        let unix = Utc.from_utc_datetime(&naive).timestamp();
        let leaps = LEAP_SECONDS.iter().filter(|&&t| unix >= t).count() as f64;
        Ok((unix - UNIX_1998) as f64 + EPOCH_OFFSET_SECS + leaps)
    }
}

/// Integer version of a `MAJOR.MINOR` revision string (the minor part)
///
/// # Errors
///
/// `MalformedRevision` when there is no dot or the minor part is not an integer.
pub fn revision_number(revision: &str) -> Result<i64> {
    revision
        .trim()
        .split_once('.')
        .and_then(|(_, minor)| minor.parse().ok())
        .ok_or_else(|| LimitsError::MalformedRevision {
            revision: revision.to_string(),
        })
}

/// The append-only stamp every row written by one revision carries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowStamp {
    pub datesec: f64,
    pub date: String,
    pub modversion: i64,
}

/// One revision file after parsing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRevision {
    pub revision: Option<String>,
    pub version: Option<String>,
    pub date: Option<RevisionDate>,
    /// File-wide default tolerance (`MLMDEFTOL`)
    pub mlmdeftol: Option<i64>,
    /// File-wide `MLMTHROW`, carried but not interpreted
    pub mlmthrow: Option<i64>,
    /// Entities keyed by their declared name
    pub entities: BTreeMap<String, Entity>,
}

impl ParsedRevision {
    /// Replace the revision read from the file (used for the baseline file)
    pub fn override_revision(&mut self, revision: &str) {
        self.revision = Some(revision.to_string());
        self.version = Some(revision.to_string());
    }

    /// Integer version of this revision
    ///
    /// # Errors
    ///
    /// `MissingMetadata` without a `$Revision`, `MalformedRevision` if unparseable.
    pub fn revision_number(&self) -> Result<i64> {
        let revision = self
            .revision
            .as_deref()
            .ok_or_else(|| LimitsError::MissingMetadata {
                field: "$Revision".to_string(),
            })?;
        revision_number(revision)
    }

    /// Stamp for rows written by this revision
    ///
    /// # Errors
    ///
    /// Fails when `$Revision` or `$Date` is absent or unusable.
    pub fn stamp(&self) -> Result<RowStamp> {
        let modversion = self.revision_number()?;
        let date = self.date.ok_or_else(|| LimitsError::MissingMetadata {
            field: "$Date".to_string(),
        })?;
        Ok(RowStamp {
            datesec: date.datesec()?,
            date: date.to_date_string(),
            modversion,
        })
    }
}
