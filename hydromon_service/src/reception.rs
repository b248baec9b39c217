//! Data-reception tracking from the status feed.
//!
//! The status feed is exported as a sequence of report sections, each
//! starting again at `sr_no == 1`. A section is dated by the calendar date
//! most of its rows carry (the majority date); rows inside a section may
//! straddle midnight. For every location the engine takes the best
//! `data_count` seen on each day, sums those daily maxima over the window
//! and compares the total with the expected count for the days the
//! location was reported on. A day reported only with null counts still
//! costs its expected count and contributes nothing.

use crate::config::ReceptionConfig;
use crate::logging::{self, Component};
use crate::model::StatusRow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Inclusive date range a reception report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Builds a window, swapping the bounds if they are given in reverse.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Reception statistics for one location over the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceptionSummary {
    pub project_name: String,
    pub location_name: String,
    pub location_id: String,
    pub location_type: Option<String>,
    pub problem_statement: Option<String>,
    pub days_with_data: u32,
    pub data_count: f64,
    pub expected_data_count: f64,
    /// Received / expected, as a percentage rounded to 2 decimals.
    pub percentage: f64,
    pub alert: bool,
}

impl ReceptionSummary {
    pub fn band(&self) -> Option<ReceptionBand> {
        ReceptionBand::for_percentage(self.percentage)
    }
}

/// Ten-point reception buckets used by the distribution view. The lowest
/// bucket is closed on both ends, the others are open below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ReceptionBand {
    Below30,
    From30To39,
    From40To49,
    From50To59,
    From60To69,
    From70To79,
    From80To89,
    From90To100,
}

impl ReceptionBand {
    pub const ALL: [ReceptionBand; 8] = [
        ReceptionBand::Below30,
        ReceptionBand::From30To39,
        ReceptionBand::From40To49,
        ReceptionBand::From50To59,
        ReceptionBand::From60To69,
        ReceptionBand::From70To79,
        ReceptionBand::From80To89,
        ReceptionBand::From90To100,
    ];

    /// Upper (inclusive) edge of each bucket, in bucket order.
    const UPPER_EDGES: [f64; 8] = [30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

    /// Percentages outside 0..=100 (or NaN) fall in no bucket.
    pub fn for_percentage(percentage: f64) -> Option<Self> {
        if !(0.0..=100.0).contains(&percentage) {
            return None;
        }
        Self::UPPER_EDGES
            .iter()
            .position(|edge| percentage <= *edge)
            .map(|i| Self::ALL[i])
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReceptionBand::Below30 => "<30%",
            ReceptionBand::From30To39 => "30-39%",
            ReceptionBand::From40To49 => "40-49%",
            ReceptionBand::From50To59 => "50-59%",
            ReceptionBand::From60To69 => "60-69%",
            ReceptionBand::From70To79 => "70-79%",
            ReceptionBand::From80To89 => "80-89%",
            ReceptionBand::From90To100 => "90-100%",
        }
    }
}

impl fmt::Display for ReceptionBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Band distribution for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectBandCounts {
    pub project_name: String,
    /// Every band in bucket order, zero-filled.
    pub counts: Vec<(ReceptionBand, usize)>,
    pub total: usize,
}

/// Result of a reception evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceptionReport {
    pub window: DateWindow,
    /// Sorted by project, location name, location id.
    pub summaries: Vec<ReceptionSummary>,
}

impl ReceptionReport {
    pub fn alerts(&self) -> Vec<&ReceptionSummary> {
        self.summaries.iter().filter(|s| s.alert).collect()
    }

    pub fn band_counts(&self) -> Vec<(ReceptionBand, usize)> {
        count_bands(self.summaries.iter())
    }

    pub fn project_band_counts(&self) -> Vec<ProjectBandCounts> {
        let mut by_project: BTreeMap<&str, Vec<&ReceptionSummary>> = BTreeMap::new();
        for summary in &self.summaries {
            by_project.entry(summary.project_name.as_str()).or_default().push(summary);
        }
        by_project
            .into_iter()
            .map(|(project, summaries)| {
                let counts = count_bands(summaries.into_iter());
                let total = counts.iter().map(|(_, c)| c).sum();
                ProjectBandCounts {
                    project_name: project.to_string(),
                    counts,
                    total,
                }
            })
            .collect()
    }

    /// Mean percentage over alerting locations.
    pub fn alert_average_percentage(&self) -> Option<f64> {
        mean(self.alerts().iter().map(|s| s.percentage))
    }

    /// Mean received count over alerting locations.
    pub fn alert_average_data_count(&self) -> Option<f64> {
        mean(self.alerts().iter().map(|s| s.data_count))
    }
}

fn count_bands<'a>(summaries: impl Iterator<Item = &'a ReceptionSummary>) -> Vec<(ReceptionBand, usize)> {
    let mut counts: HashMap<ReceptionBand, usize> = HashMap::new();
    for band in summaries.filter_map(ReceptionSummary::band) {
        *counts.entry(band).or_default() += 1;
    }
    ReceptionBand::ALL
        .iter()
        .map(|band| (*band, counts.get(band).copied().unwrap_or(0)))
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| round2(sum / count as f64))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Splits rows into sections. A section starts at every row with
/// `sr_no == 1`; rows before the first such row form their own section.
pub fn split_sections(rows: &[StatusRow]) -> Vec<&[StatusRow]> {
    let mut sections = Vec::new();
    let mut start = 0;
    for (i, row) in rows.iter().enumerate() {
        if row.sr_no == 1 && i > start {
            sections.push(&rows[start..i]);
            start = i;
        }
    }
    if start < rows.len() {
        sections.push(&rows[start..]);
    }
    sections
}

/// Most frequent calendar date in a section; ties go to the earliest date.
/// Rows without a timestamp do not vote.
pub fn majority_date(section: &[StatusRow]) -> Option<NaiveDate> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for at in section.iter().filter_map(|row| row.last_updated) {
        *counts.entry(at.date()).or_default() += 1;
    }
    // BTreeMap iterates in ascending date order; keep the first maximum.
    let mut best: Option<(NaiveDate, usize)> = None;
    for (date, count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((date, count)),
        }
    }
    best.map(|(date, _)| date)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

type LocationKey = (String, String, String);

#[derive(Default)]
struct LocationAccumulator {
    /// Best count per reported day; `None` while every row that day had no
    /// usable count.
    daily_max: BTreeMap<NaiveDate, Option<f64>>,
    location_type: Option<(NaiveDateTime, String)>,
    problem_statement: Option<(NaiveDateTime, String)>,
}

impl LocationAccumulator {
    fn add(&mut self, date: NaiveDate, row: &StatusRow) {
        let slot = self.daily_max.entry(date).or_insert(None);
        if let Some(count) = row.data_count.filter(|c| c.is_finite()) {
            *slot = Some(slot.map_or(count, |best| best.max(count)));
        }
        if let Some(at) = row.last_updated {
            keep_latest(&mut self.location_type, at, row.location_type.as_deref());
            keep_latest(&mut self.problem_statement, at, row.problem_statement.as_deref());
        }
    }

    fn data_count(&self) -> f64 {
        self.daily_max.values().flatten().sum()
    }
}

fn keep_latest(slot: &mut Option<(NaiveDateTime, String)>, at: NaiveDateTime, value: Option<&str>) {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return,
    };
    let newer = match slot {
        Some((seen, _)) => at >= *seen,
        None => true,
    };
    if newer {
        *slot = Some((at, value.to_string()));
    }
}

/// Computes per-location reception over `window`.
pub fn evaluate(rows: &[StatusRow], window: DateWindow, config: &ReceptionConfig) -> ReceptionReport {
    let mut locations: BTreeMap<LocationKey, LocationAccumulator> = BTreeMap::new();
    let mut kept_rows = 0usize;

    for section in split_sections(rows) {
        let date = match majority_date(section) {
            Some(d) if window.contains(d) => d,
            _ => continue,
        };
        for row in section {
            let key = (
                row.project_name.clone(),
                row.location_name.clone(),
                row.location_id.clone(),
            );
            locations.entry(key).or_default().add(date, row);
            kept_rows += 1;
        }
    }

    let expected_per_day = f64::from(config.expected_per_day);
    let summaries: Vec<ReceptionSummary> = locations
        .into_iter()
        .filter_map(|((project_name, location_name, location_id), acc)| {
            let days_with_data = acc.daily_max.len() as u32;
            let expected_data_count = f64::from(days_with_data) * expected_per_day;
            if expected_data_count == 0.0 {
                return None;
            }
            let data_count = acc.data_count();
            let percentage = round2(data_count / expected_data_count * 100.0);
            Some(ReceptionSummary {
                project_name,
                location_name,
                location_id,
                location_type: acc.location_type.map(|(_, v)| v),
                problem_statement: acc.problem_statement.map(|(_, v)| v),
                days_with_data,
                data_count,
                expected_data_count,
                percentage,
                alert: percentage < config.alert_below_percent,
            })
        })
        .collect();

    let alerting = summaries.iter().filter(|s| s.alert).count();
    logging::info(
        Component::Reception,
        None,
        &format!(
            "{} status rows in window {} to {}: {} locations, {} below {}%",
            kept_rows,
            window.start,
            window.end,
            summaries.len(),
            alerting,
            config.alert_below_percent
        ),
    );

    ReceptionReport { window, summaries }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
