//! Power metrics for Satisfactory Buddy.
//!
//! [`power`] walks an indexed [`sb_core::World`] and derives one labeled
//! generation or consumption fact per powered building. The facts are
//! published into a [`Registry`], which replaces its whole contents in one
//! step and renders them in the Prometheus text format.

/// Prometheus text exposition of the registry contents.
pub mod exposition;
/// Power fact derivation.
pub mod power;
/// Gauge series, label sets, and the shared registry handle.
pub mod registry;

/// Re-exports of [`power::PowerFact`] and the derivation entry points.
pub use power::{PowerFact, derive_power_facts, update_power_metrics};
/// Re-exports of the registry types.
pub use registry::{GaugeVec, PowerGauges, PowerLabels, PowerSeries, Registry};
