use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error(
        "Invalid assumptions: allocation weights sum to {sum}, expected 1.0 (tolerance {tolerance})"
    )]
    InvalidAssumptions { sum: Decimal, tolerance: Decimal },
}
