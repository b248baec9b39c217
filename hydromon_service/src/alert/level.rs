//! River and dam level rules.
//!
//! Two independent variants exist because the dashboard views need
//! different things: the daily alert tables compare against the nearest
//! earlier day, the overview map only checks absolute bounds. Which ones run
//! is selected through [`LevelConfig`].

use crate::alert::lookback::DailyHistory;
use crate::alert::{format_date, AlertCategory, PriorComparison, Trigger, TriggerContext};
use crate::config::{AlertConfig, LevelConfig};
use crate::model::{Reading, FIELD_LEVEL_MTR};

/// Fires when the level moved by more than `level_change_m` since the
/// nearest earlier day with data.
pub fn check_level_change(
    reading: &Reading,
    history: &DailyHistory<'_>,
    config: &LevelConfig,
) -> Option<Trigger> {
    let level = reading.value(FIELD_LEVEL_MTR)?;
    let (comparison_date, previous) =
        history.prior_value(FIELD_LEVEL_MTR, reading.timestamp, config.lookback_days)?;
    let difference = (level - previous).abs();
    if difference <= config.level_change_m {
        return None;
    }

    Some(
        Trigger::new(
            AlertCategory::LevelChange,
            FIELD_LEVEL_MTR,
            level,
            config.level_change_m,
            format!(
                "Level Change >{}m (vs {})",
                config.level_change_m,
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

/// Fires when the level is at or below the floor, or at or above the ceiling.
pub fn check_extreme_level(reading: &Reading, config: &LevelConfig) -> Option<Trigger> {
    let level = reading.value(FIELD_LEVEL_MTR)?;
    let (threshold, label) = if level <= config.min_level_m {
        (config.min_level_m, format!("Level ≤{}m", config.min_level_m))
    } else if level >= config.max_level_m {
        (config.max_level_m, format!("Level ≥{}m", config.max_level_m))
    } else {
        return None;
    };
    Some(Trigger::new(
        AlertCategory::ExtremeLevel,
        FIELD_LEVEL_MTR,
        level,
        threshold,
        label,
    ))
}

/// Runs the selected level variants.
pub fn evaluate(reading: &Reading, history: &DailyHistory<'_>, config: &AlertConfig) -> Vec<Trigger> {
    let level = &config.level;
    let mut triggers = Vec::new();
    if level.lookback_diff && config.is_enabled(AlertCategory::LevelChange) {
        triggers.extend(check_level_change(reading, history, level));
    }
    if level.absolute_bound && config.is_enabled(AlertCategory::ExtremeLevel) {
        triggers.extend(check_extreme_level(reading, level));
    }
    triggers
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
