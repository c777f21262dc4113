//! Dashboard rendering.
//!
//! `report` holds a small page/section container rendered with maud,
//! `plots` turns datasets and predictor sweeps into `plotly::Plot`s, and
//! `dashboard` assembles the participation-rate page from those pieces.
pub mod dashboard;
pub mod plots;
#[allow(clippy::module_inception)]
pub mod report;

pub use dashboard::{build_dashboard, save_dashboard, DashboardContext};
pub use report::{Report, ReportSection};
