//! Lookback over earlier calendar days.
//!
//! Several rules compare a reading with "the previous day" at the same
//! location. Stations drop out for days at a time, so the previous day is
//! the nearest earlier calendar day that has data, searched one day at a
//! time up to a bounded depth.
//!
//! A day's value is taken from the first reading of that day in batch
//! order. Duplicate readings for the same timestamp therefore resolve to the
//! first one the store returned. When that first reading has no usable value
//! for the field the day has data but nothing to compare: the scan ends
//! there without a result instead of reaching further back.
//!
//! [`DailyHistory`] indexes one location's readings by date once, so that
//! each lookup costs O(depth · log days) instead of a scan of the batch.

use crate::model::Reading;
use chrono::{Days, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

/// Readings of one location grouped by calendar day, preserving batch order
/// within each day.
#[derive(Debug, Default)]
pub struct DailyHistory<'a> {
    days: BTreeMap<NaiveDate, Vec<&'a Reading>>,
}

impl<'a> DailyHistory<'a> {
    pub fn new<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut days: BTreeMap<NaiveDate, Vec<&'a Reading>> = BTreeMap::new();
        for reading in readings {
            days.entry(reading.date()).or_default().push(reading);
        }
        Self { days }
    }

    /// `None` when no reading exists on `date`, otherwise the first
    /// reading's value of `field`, usable or not.
    fn first_of_day(&self, date: NaiveDate, field: &str) -> Option<Option<f64>> {
        self.days
            .get(&date)
            .and_then(|readings| readings.first())
            .map(|reading| reading.value(field))
    }

    /// The authoritative value of `field` on `date`.
    pub fn day_value(&self, date: NaiveDate, field: &str) -> Option<f64> {
        self.first_of_day(date, field).flatten()
    }

    /// Scans `from - 1 day`, `from - 2 days`, ... up to `max_days_back` days
    /// and returns the value of the first day with a reading.
    ///
    /// If that day's first reading has no usable value for `field` the
    /// result is `None`.
    pub fn prior_value(
        &self,
        field: &str,
        from: NaiveDateTime,
        max_days_back: u32,
    ) -> Option<(NaiveDate, f64)> {
        let start = from.date();
        for offset in 1..=max_days_back {
            let day = start.checked_sub_days(Days::new(u64::from(offset)))?;
            match self.first_of_day(day, field) {
                None => continue,
                Some(value) => return value.map(|v| (day, v)),
            }
        }
        None
    }

    /// Collects the values of `field` on each of the `days_back` calendar
    /// days before `from`, most recent first.
    ///
    /// The scan stops at the first day without a usable value, so the run
    /// is returned only when every one of those days is present.
    pub fn consecutive_values(
        &self,
        field: &str,
        from: NaiveDateTime,
        days_back: u32,
    ) -> Option<Vec<(NaiveDate, f64)>> {
        let start = from.date();
        let mut run = Vec::with_capacity(days_back as usize);
        for offset in 1..=days_back {
            let day = start.checked_sub_days(Days::new(u64::from(offset)))?;
            match self.day_value(day, field) {
                Some(value) => run.push((day, value)),
                None => return None,
            }
        }
        Some(run)
    }
}

/// Per-location histories for a whole station batch.
#[derive(Debug, Default)]
pub struct LocationHistories<'a> {
    by_location: HashMap<&'a str, DailyHistory<'a>>,
}

impl<'a> LocationHistories<'a> {
    pub fn new(readings: &'a [Reading]) -> Self {
        let mut grouped: HashMap<&'a str, Vec<&'a Reading>> = HashMap::new();
        for reading in readings {
            grouped.entry(reading.location_id.as_str()).or_default().push(reading);
        }
        let by_location = grouped
            .into_iter()
            .map(|(location, rows)| (location, DailyHistory::new(rows)))
            .collect();
        Self { by_location }
    }

    pub fn location(&self, location_id: &str) -> Option<&DailyHistory<'a>> {
        self.by_location.get(location_id)
    }

    pub fn location_count(&self) -> usize {
        self.by_location.len()
    }
}

/// Finds the most recent earlier day with a value for `field`.
///
/// `readings_for_location` must already be restricted to one location.
/// Builds a one-off index; callers evaluating many readings should keep a
/// [`DailyHistory`] instead.
pub fn find_prior_value(
    readings_for_location: &[Reading],
    field: &str,
    from_timestamp: NaiveDateTime,
    max_days_back: u32,
) -> Option<(NaiveDate, f64)> {
    DailyHistory::new(readings_for_location).prior_value(field, from_timestamp, max_days_back)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
