//! Core engine — the sell → buy → KPI pipeline for one transfer window.

pub mod kpi;
pub mod projection;
pub mod runner;

pub use runner::{SeasonSnapshot, SimulationRunner};
