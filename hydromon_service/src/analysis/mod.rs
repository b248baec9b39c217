/// Supplementary views built on top of loaded readings and alerts.
///
/// These do not raise alerts themselves. They summarise the same batches
/// the engine evaluates, for the trend and alert tables.
///
/// Submodules:
/// - `gates`: daily gate activity per barrage location.
/// - `rain`: per-project daily rain used to annotate EPAN alerts.

pub mod gates;
pub mod rain;
