//! Battery voltage check shared by every station type.

use crate::alert::{AlertCategory, Trigger};
use crate::model::{Reading, FIELD_BATT_VOLT};

/// Fires when `batt_volt` is present, numeric and strictly below `threshold`.
pub fn check_low_battery(reading: &Reading, threshold: f64) -> Option<Trigger> {
    let volts = reading.value(FIELD_BATT_VOLT)?;
    (volts < threshold).then(|| {
        Trigger::new(
            AlertCategory::LowBattery,
            FIELD_BATT_VOLT,
            volts,
            threshold,
            format!("Low Battery (<{}V)", threshold),
        )
    })
}
