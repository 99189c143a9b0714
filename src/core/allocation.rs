use rust_decimal::Decimal;

use super::types::BucketMap;

/// Splits `savings` across buckets by weight.
pub fn allocate_proportional(savings: Decimal, weights: &BucketMap) -> BucketMap {
    weights
        .iter()
        .map(|(bucket, weight)| (bucket.clone(), savings * *weight))
        .collect()
}

/// Routes savings into the reserve bucket until it holds
/// `expenses * minimum_months`, then splits the remainder by weight. The
/// reserve bucket also takes its normal weighted share of that remainder,
/// and always appears in the result so its balance is carried forward.
pub fn allocate_with_cash_buffer(
    savings: Decimal,
    expenses: Decimal,
    prior_buffer_balance: Decimal,
    minimum_months: u32,
    buffer_bucket: &str,
    weights: &BucketMap,
) -> BucketMap {
    let target = expenses.saturating_mul(Decimal::from(minimum_months));
    if prior_buffer_balance >= target {
        let mut allocations = allocate_proportional(savings, weights);
        allocations
            .entry(buffer_bucket.to_string())
            .or_insert(Decimal::ZERO);
        return allocations;
    }

    let to_buffer = savings.min(target.saturating_sub(prior_buffer_balance));
    let remainder = savings - to_buffer;
    let mut allocations = allocate_proportional(remainder, weights);
    *allocations
        .entry(buffer_bucket.to_string())
        .or_insert(Decimal::ZERO) += to_buffer;
    allocations
}
