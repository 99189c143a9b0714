use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::{debug, warn};

use super::allocation::{allocate_proportional, allocate_with_cash_buffer};
use super::error::ProjectionError;
use super::money::{scale, total};
use super::types::{
    Assumptions, BucketMap, CategoryBudget, FxMapping, MonthlyProjection, OneTimeCost,
    OneTimeCostDetail,
};

const MONTHS_PER_YEAR: u32 = 12;

fn weight_tolerance() -> Decimal {
    Decimal::new(1, 3)
}

/// Recurring expenses for one month, resolved once per step.
#[derive(Debug, Clone, Copy)]
enum ExpensePlan<'a> {
    Categorized(&'a [CategoryBudget]),
    Flat(Decimal),
}

impl<'a> ExpensePlan<'a> {
    fn resolve(assumptions: &'a Assumptions) -> Self {
        if assumptions.category_budgets.is_empty() {
            ExpensePlan::Flat(assumptions.monthly_expenses.unwrap_or(Decimal::ZERO))
        } else {
            ExpensePlan::Categorized(&assumptions.category_budgets)
        }
    }

    fn evaluate(self, month_index: u32, global_rate: Decimal) -> MonthExpenses {
        match self {
            ExpensePlan::Flat(amount) => MonthExpenses {
                total: inflate(amount, global_rate, month_index),
                breakdown: BucketMap::new(),
            },
            ExpensePlan::Categorized(categories) => {
                let mut breakdown = BucketMap::new();
                let mut sum_total = Decimal::ZERO;
                for category in categories {
                    let category_total = if category.subcategory_budgets.is_empty() {
                        let rate = effective_inflation_rate(
                            None,
                            category.inflation_override,
                            global_rate,
                        );
                        inflate(category.monthly_amount, rate, month_index)
                    } else {
                        let mut sum = Decimal::ZERO;
                        for sub in &category.subcategory_budgets {
                            let rate = effective_inflation_rate(
                                sub.inflation_override,
                                category.inflation_override,
                                global_rate,
                            );
                            let amount = inflate(sub.monthly_amount, rate, month_index);
                            breakdown.insert(
                                format!("{}:{}", category.category_id, sub.subcategory_id),
                                amount,
                            );
                            sum = sum.saturating_add(amount);
                        }
                        sum
                    };
                    let rollup = breakdown
                        .entry(category.category_id.clone())
                        .or_insert(Decimal::ZERO);
                    *rollup = rollup.saturating_add(category_total);
                    sum_total = sum_total.saturating_add(category_total);
                }
                MonthExpenses {
                    total: sum_total,
                    breakdown,
                }
            }
        }
    }
}

#[derive(Debug)]
struct MonthExpenses {
    total: Decimal,
    breakdown: BucketMap,
}

/// Subcategory override, then category override, then the global rate.
pub fn effective_inflation_rate(
    subcategory_override: Option<Decimal>,
    category_override: Option<Decimal>,
    global_rate: Decimal,
) -> Decimal {
    subcategory_override
        .or(category_override)
        .unwrap_or(global_rate)
}

/// `(1 + rate)^exponent`, evaluated in f64 and converted back to a decimal.
/// Factors beyond the decimal range saturate; an undefined factor is 1.
fn compounding_factor(rate: Decimal, exponent: f64) -> Decimal {
    let base = 1.0 + rate.to_f64().unwrap_or(0.0);
    let factor = base.powf(exponent);
    if factor.is_nan() {
        warn!(%rate, exponent, "undefined compounding factor, using 1");
        return Decimal::ONE;
    }
    match Decimal::from_f64(factor) {
        Some(factor) => factor,
        None if factor.abs() < 1.0 => Decimal::ZERO,
        None => {
            warn!(%rate, exponent, factor, "compounding factor out of range, saturating");
            if factor.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        }
    }
}

fn inflate(amount: Decimal, rate: Decimal, month_index: u32) -> Decimal {
    if amount.is_zero() {
        return Decimal::ZERO;
    }
    scale(
        amount,
        compounding_factor(rate, f64::from(month_index) / f64::from(MONTHS_PER_YEAR)),
    )
}

fn one_time_costs_for(
    costs: &[OneTimeCost],
    month_index: u32,
) -> (Decimal, Vec<OneTimeCostDetail>) {
    let detail: Vec<OneTimeCostDetail> = costs
        .iter()
        .filter(|cost| cost.month_index == month_index)
        .map(OneTimeCostDetail::from)
        .collect();
    let amount = total(detail.iter().map(|item| &item.amount));
    (amount, detail)
}

/// Closing balances for the buckets that received an allocation this month.
fn grow_buckets(allocations: &BucketMap, prior: &BucketMap, returns: &BucketMap) -> BucketMap {
    allocations
        .iter()
        .map(|(bucket, allocation)| {
            let prior_balance = prior.get(bucket).copied().unwrap_or(Decimal::ZERO);
            let annual_return = returns.get(bucket).copied().unwrap_or(Decimal::ZERO);
            let grown = if prior_balance.is_zero() {
                Decimal::ZERO
            } else {
                scale(
                    prior_balance,
                    compounding_factor(annual_return, 1.0 / f64::from(MONTHS_PER_YEAR)),
                )
            };
            (bucket.clone(), grown.saturating_add(*allocation))
        })
        .collect()
}

fn convert_fx(
    mapping: Option<&FxMapping>,
    base_currency: &str,
    net_income: Decimal,
    wealth: Decimal,
) -> (BucketMap, BucketMap) {
    let Some(mapping) = mapping else {
        return (BucketMap::new(), BucketMap::new());
    };
    let mut net_income_fx = BucketMap::new();
    let mut total_wealth_fx = BucketMap::new();
    for currency in &mapping.display_currencies {
        let rate = mapping.rate_to(base_currency, currency);
        net_income_fx.insert(currency.clone(), scale(net_income, rate));
        total_wealth_fx.insert(currency.clone(), scale(wealth, rate));
    }
    (net_income_fx, total_wealth_fx)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Deterministic month-by-month projection over a validated set of
/// assumptions.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    assumptions: Assumptions,
    anchor: NaiveDate,
}

impl ProjectionEngine {
    pub fn new(mut assumptions: Assumptions) -> Result<Self, ProjectionError> {
        if !assumptions.allocation_weights.is_empty() {
            let sum: Decimal = assumptions.allocation_weights.values().copied().sum();
            let tolerance = weight_tolerance();
            if (sum - Decimal::ONE).abs() > tolerance {
                return Err(ProjectionError::InvalidAssumptions { sum, tolerance });
            }
        }

        if assumptions
            .cash_buffer_bucket_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            assumptions.cash_buffer_bucket_name = None;
        }

        let anchor = first_of_month(
            assumptions
                .start_date
                .unwrap_or_else(|| Utc::now().date_naive()),
        );

        Ok(Self {
            assumptions,
            anchor,
        })
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn period_label(&self, month_index: u32) -> String {
        self.anchor
            .checked_add_months(Months::new(month_index))
            .unwrap_or(NaiveDate::MAX)
            .format("%Y-%m")
            .to_string()
    }

    pub fn project_month(&self, month_index: u32, prior_balances: &BucketMap) -> MonthlyProjection {
        let a = &self.assumptions;

        let gross_income =
            a.monthly_salary + a.annual_bonus / Decimal::from(MONTHS_PER_YEAR) + a.other_income;
        let taxes = gross_income * a.tax_rate;
        let net_income = gross_income - taxes;

        let expenses = ExpensePlan::resolve(a).evaluate(month_index, a.expense_inflation_rate);
        let (one_time_costs, one_time_costs_detail) =
            one_time_costs_for(&a.one_time_costs, month_index);

        let surplus = net_income
            .saturating_sub(expenses.total)
            .saturating_sub(one_time_costs);
        let savings = surplus.max(Decimal::ZERO);
        let deficit = (-surplus).max(Decimal::ZERO);

        let bucket_allocations = self.allocate(savings, expenses.total, prior_balances);
        let bucket_balances = grow_buckets(&bucket_allocations, prior_balances, &a.bucket_returns);

        let savings_rate = if net_income > Decimal::ZERO {
            savings / net_income
        } else {
            Decimal::ZERO
        };

        let wealth = total(bucket_balances.values());
        let (net_income_fx, total_wealth_fx) =
            convert_fx(a.fx_mapping.as_ref(), &a.base_currency, net_income, wealth);

        MonthlyProjection {
            period: self.period_label(month_index),
            gross_income,
            taxes,
            net_income,
            expenses: expenses.total,
            expense_breakdown: expenses.breakdown,
            one_time_costs,
            one_time_costs_detail,
            savings,
            deficit,
            savings_rate,
            bucket_allocations,
            bucket_balances,
            net_income_fx,
            total_wealth_fx,
        }
    }

    pub fn project_period(
        &self,
        months: u32,
        initial_balances: Option<&BucketMap>,
    ) -> Vec<MonthlyProjection> {
        let mut balances: BucketMap = self
            .assumptions
            .allocation_weights
            .keys()
            .map(|bucket| (bucket.clone(), Decimal::ZERO))
            .collect();
        if let Some(initial) = initial_balances {
            balances.extend(initial.iter().map(|(k, v)| (k.clone(), *v)));
        }

        let mut projections = Vec::with_capacity(months as usize);
        for month_index in 0..months {
            let month = self.project_month(month_index, &balances);
            balances = month.bucket_balances.clone();
            projections.push(month);
        }

        debug!(
            months,
            start = %self.period_label(0),
            buckets = balances.len(),
            "projected period"
        );
        projections
    }

    fn allocate(
        &self,
        savings: Decimal,
        expenses: Decimal,
        prior_balances: &BucketMap,
    ) -> BucketMap {
        let a = &self.assumptions;
        match a.cash_buffer_bucket_name.as_deref() {
            Some(bucket) if a.enforce_cash_buffer => {
                let prior_buffer = prior_balances.get(bucket).copied().unwrap_or(Decimal::ZERO);
                allocate_with_cash_buffer(
                    savings,
                    expenses,
                    prior_buffer,
                    a.minimum_cash_buffer_months,
                    bucket,
                    &a.allocation_weights,
                )
            }
            _ => allocate_proportional(savings, &a.allocation_weights),
        }
    }
}
