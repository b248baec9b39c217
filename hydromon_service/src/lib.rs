//! hydromon_service: alert detection and data-reception tracking for
//! hydrological telemetry stations (River, Dam, EPAN, AWS, ARS, Gate).
//!
//! Readings are loaded per station table through a [`store::ReadingStore`],
//! converted by [`ingest::rows`], and evaluated by
//! [`alert::engine::AlertEngine`]. Reception rates come from the status
//! feed via [`reception::evaluate`]. [`runner::run`] ties one pass together.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod reception;
pub mod runner;
pub mod stations;
pub mod store;
