/// Conversion of raw store rows into domain values.
///
/// Station tables are loosely typed: timestamps are VARCHAR in
/// `dd/mm/YYYY HH:MM` form and measurement columns may hold numbers or
/// text. This module is the only place that looks at raw rows.
///
/// Submodules:
/// - `rows`: JSON object rows (as produced by `to_jsonb`) to readings
///   and status rows.

pub mod rows;
