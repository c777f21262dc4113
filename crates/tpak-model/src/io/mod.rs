//! IO utilities: model artifacts and regional indicator tables.

pub mod artifact;
pub mod datasets;

pub use artifact::{load_model, load_scaler, save_model, save_scaler, ArtifactPaths};
pub use datasets::{
    load_datasets, merge_tables, read_indicator_table, DatasetPaths, Indicator, IndicatorTable,
    MergedDataset, MergedRow,
};
