pub mod linear;
pub mod regressor_trait;

pub use linear::LinearRegression;
pub use regressor_trait::RegressorModel;
