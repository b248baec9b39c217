//! Gate opening rule.

use crate::alert::{AlertCategory, Trigger};
use crate::config::GateConfig;
use crate::model::{numeric, GateChannel, Reading};

/// Returns the first gate channel (lowest number) whose opening is above
/// the threshold. Later channels are not examined.
pub fn first_open_gate<'a>(gates: &'a [GateChannel], open_above: f64) -> Option<(&'a GateChannel, f64)> {
    gates.iter().find_map(|gate| {
        let value = numeric(&gate.value)?;
        (value > open_above).then_some((gate, value))
    })
}

/// Fires `GateOpen` naming the first open gate channel.
pub fn check_gate_open(reading: &Reading, config: &GateConfig) -> Option<Trigger> {
    let gates = match &reading.measurements {
        crate::model::Measurements::Gate(fields) => &fields.gates,
        _ => return None,
    };
    let (gate, value) = first_open_gate(gates, config.open_above)?;
    Some(Trigger::new(
        AlertCategory::GateOpen,
        &gate.name,
        value,
        config.open_above,
        format!("Gate Opening Detected ({})", gate.name),
    ))
}
