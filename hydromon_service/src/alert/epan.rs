//! Evaporation pan rules.
//!
//! EPAN readings report at most one alert. Checks run in priority order and
//! the first one that fires wins; lower-priority checks are not evaluated:
//!
//!   1. constant water depth over consecutive days (stuck sensor)
//!   2. day-over-day depth change
//!   3. low battery
//!   4. depth outside the operating band

use crate::alert::battery::check_low_battery;
use crate::alert::lookback::DailyHistory;
use crate::alert::{format_date, AlertCategory, PriorComparison, Trigger, TriggerContext};
use crate::config::{AlertConfig, EpanConfig};
use crate::model::{Reading, FIELD_EPAN_WATER_DEPTH};

/// Fires when the current depth equals the depth on each of the
/// `constant_days` preceding calendar days. A single missing day disqualifies
/// the check.
pub fn check_constant_depth(
    reading: &Reading,
    history: &DailyHistory<'_>,
    config: &EpanConfig,
) -> Option<Trigger> {
    let depth = reading.value(FIELD_EPAN_WATER_DEPTH)?;
    let run = history.consecutive_values(FIELD_EPAN_WATER_DEPTH, reading.timestamp, config.constant_days)?;
    if !run.iter().all(|(_, value)| *value == depth) {
        return None;
    }

    let mut days = Vec::with_capacity(run.len() + 1);
    days.push(reading.date());
    days.extend(run.iter().map(|(day, _)| *day));

    Some(
        Trigger::new(
            AlertCategory::ConstantWaterDepth,
            FIELD_EPAN_WATER_DEPTH,
            depth,
            f64::from(config.constant_days + 1),
            format!("Constant Water Depth ({} days)", config.constant_days + 1),
        )
        .with_context(TriggerContext::ConstantDays(days)),
    )
}

/// Fires when the depth moved by more than `depth_change_mm` since the
/// nearest earlier day with data (up to `lookback_days` back).
pub fn check_depth_change(
    reading: &Reading,
    history: &DailyHistory<'_>,
    config: &EpanConfig,
) -> Option<Trigger> {
    let depth = reading.value(FIELD_EPAN_WATER_DEPTH)?;
    let (comparison_date, previous) =
        history.prior_value(FIELD_EPAN_WATER_DEPTH, reading.timestamp, config.lookback_days)?;
    let difference = (depth - previous).abs();
    if difference <= config.depth_change_mm {
        return None;
    }

    Some(
        Trigger::new(
            AlertCategory::DepthChange,
            FIELD_EPAN_WATER_DEPTH,
            depth,
            config.depth_change_mm,
            format!(
                "Depth Change >{} (vs {})",
                config.depth_change_mm,
                format_date(comparison_date)
            ),
        )
        .with_context(TriggerContext::Prior(PriorComparison {
            previous_value: previous,
            comparison_date,
            difference,
        })),
    )
}

/// Fires when the depth is at or below the minimum, or at or above the maximum.
pub fn check_depth_threshold(reading: &Reading, config: &EpanConfig) -> Option<Trigger> {
    let depth = reading.value(FIELD_EPAN_WATER_DEPTH)?;
    let (threshold, label) = if depth <= config.min_depth_mm {
        (config.min_depth_mm, format!("Water Depth ≤{}", config.min_depth_mm))
    } else if depth >= config.max_depth_mm {
        (config.max_depth_mm, format!("Water Depth ≥{}", config.max_depth_mm))
    } else {
        return None;
    };
    Some(Trigger::new(
        AlertCategory::WaterDepthThreshold,
        FIELD_EPAN_WATER_DEPTH,
        depth,
        threshold,
        label,
    ))
}

/// Runs the EPAN checks in priority order and returns the first that fires.
/// Disabled categories are skipped and the next priority is considered.
pub fn evaluate(reading: &Reading, history: &DailyHistory<'_>, config: &AlertConfig) -> Option<Trigger> {
    let epan = &config.epan;

    if config.is_enabled(AlertCategory::ConstantWaterDepth) {
        if let Some(t) = check_constant_depth(reading, history, epan) {
            return Some(t);
        }
    }
    if config.is_enabled(AlertCategory::DepthChange) {
        if let Some(t) = check_depth_change(reading, history, epan) {
            return Some(t);
        }
    }
    if config.is_enabled(AlertCategory::LowBattery) {
        if let Some(t) = check_low_battery(reading, config.low_battery_volts) {
            return Some(t);
        }
    }
    if config.is_enabled(AlertCategory::WaterDepthThreshold) {
        return check_depth_threshold(reading, epan);
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
