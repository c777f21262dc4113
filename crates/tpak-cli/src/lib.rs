pub mod config;
pub mod dashboard;
pub mod evaluate;
pub mod predict;
pub mod util;
