use rust_decimal::Decimal;

use super::types::{BucketMap, MonthlyProjection, YearlyProjection};

fn year_of(period: &str) -> Option<i32> {
    period.split('-').next()?.parse().ok()
}

fn add_into(target: &mut BucketMap, source: &BucketMap) {
    for (bucket, amount) in source {
        let entry = target.entry(bucket.clone()).or_insert(Decimal::ZERO);
        *entry = entry.saturating_add(*amount);
    }
}

/// Rolls a monthly series into calendar-year summaries, ordered by year.
///
/// The opening balance of each year is reconstructed as the first month's
/// closing balance minus that month's contribution, so growth earned during
/// the first month is attributed to the opening balance.
pub fn aggregate_yearly(months: &[MonthlyProjection]) -> Vec<YearlyProjection> {
    let mut years: Vec<(i32, Vec<&MonthlyProjection>)> = Vec::new();
    for month in months {
        let Some(year) = year_of(&month.period) else {
            tracing::warn!(period = %month.period, "skipping month with unparseable period");
            continue;
        };
        match years.iter_mut().find(|(existing, _)| *existing == year) {
            Some((_, group)) => group.push(month),
            None => years.push((year, vec![month])),
        }
    }
    years.sort_by_key(|(year, _)| *year);

    years
        .into_iter()
        .map(|(year, group)| summarize_year(year, &group))
        .collect()
}

fn summarize_year(year: i32, group: &[&MonthlyProjection]) -> YearlyProjection {
    let mut summary = YearlyProjection {
        year,
        months: group.len() as u32,
        gross_income: Decimal::ZERO,
        taxes: Decimal::ZERO,
        net_income: Decimal::ZERO,
        expenses: Decimal::ZERO,
        one_time_costs: Decimal::ZERO,
        savings: Decimal::ZERO,
        deficit: Decimal::ZERO,
        avg_savings_rate: Decimal::ZERO,
        start_balances: BucketMap::new(),
        end_balances: BucketMap::new(),
        contributions: BucketMap::new(),
        total_wealth: Decimal::ZERO,
    };

    let mut rate_sum = Decimal::ZERO;
    for month in group {
        summary.gross_income = summary.gross_income.saturating_add(month.gross_income);
        summary.taxes = summary.taxes.saturating_add(month.taxes);
        summary.net_income = summary.net_income.saturating_add(month.net_income);
        summary.expenses = summary.expenses.saturating_add(month.expenses);
        summary.one_time_costs = summary.one_time_costs.saturating_add(month.one_time_costs);
        summary.savings = summary.savings.saturating_add(month.savings);
        summary.deficit = summary.deficit.saturating_add(month.deficit);
        rate_sum = rate_sum.saturating_add(month.savings_rate);
        add_into(&mut summary.contributions, &month.bucket_allocations);
    }
    if !group.is_empty() {
        summary.avg_savings_rate = rate_sum / Decimal::from(group.len() as u64);
    }

    if let Some(first) = group.first() {
        summary.start_balances = first
            .bucket_balances
            .iter()
            .map(|(bucket, balance)| {
                let allocation = first
                    .bucket_allocations
                    .get(bucket)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                (bucket.clone(), balance.saturating_sub(allocation))
            })
            .collect();
    }
    if let Some(last) = group.last() {
        summary.end_balances = last.bucket_balances.clone();
        summary.total_wealth = last.total_wealth();
    }
    summary
}
