mod allocation;
mod engine;
mod error;
mod money;
mod types;
mod yearly;

pub use allocation::{allocate_proportional, allocate_with_cash_buffer};
pub use engine::{ProjectionEngine, effective_inflation_rate};
pub use error::ProjectionError;
pub use types::{
    Assumptions, BucketMap, CategoryBudget, FxMapping, MonthlyProjection, OneTimeCost,
    OneTimeCostDetail, SubcategoryBudget, YearlyProjection,
};
pub use yearly::aggregate_yearly;
