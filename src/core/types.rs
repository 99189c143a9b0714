use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type BucketMap = BTreeMap<String, Decimal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryBudget {
    pub subcategory_id: String,
    pub monthly_amount: Decimal,
    #[serde(default)]
    pub inflation_override: Option<Decimal>,
}

/// Planned monthly spend for one category. When `subcategory_budgets` is
/// non-empty the category total is the sum of its subcategories and
/// `monthly_amount` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub category_id: String,
    pub monthly_amount: Decimal,
    #[serde(default)]
    pub inflation_override: Option<Decimal>,
    #[serde(default)]
    pub subcategory_budgets: Vec<SubcategoryBudget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTimeCost {
    pub name: String,
    pub amount: Decimal,
    pub month_index: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxMapping {
    /// Left blank, the assumptions' base currency is used instead.
    #[serde(default)]
    pub base_currency: String,
    #[serde(default)]
    pub display_currencies: Vec<String>,
    #[serde(default)]
    pub rates: BTreeMap<String, Decimal>,
}

impl FxMapping {
    /// Rate for `<base><quote>`, falling back to 1 when the pair is unknown.
    /// `default_base` stands in for a blank `base_currency`.
    pub fn rate_to(&self, default_base: &str, quote: &str) -> Decimal {
        let base = match self.base_currency.trim() {
            "" => default_base,
            base => base,
        };
        let pair = format!("{base}{quote}");
        match self.rates.get(&pair) {
            Some(rate) => *rate,
            None => {
                tracing::debug!(pair = %pair, "fx rate missing, converting at 1:1");
                Decimal::ONE
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assumptions {
    /// Reporting currency. Keys FX rates when the mapping names no base.
    pub base_currency: String,
    pub start_date: Option<NaiveDate>,
    pub monthly_salary: Decimal,
    pub annual_bonus: Decimal,
    pub other_income: Decimal,
    pub tax_rate: Decimal,
    pub category_budgets: Vec<CategoryBudget>,
    pub monthly_expenses: Option<Decimal>,
    pub expense_inflation_rate: Decimal,
    pub one_time_costs: Vec<OneTimeCost>,
    pub allocation_weights: BucketMap,
    pub bucket_returns: BucketMap,
    pub minimum_cash_buffer_months: u32,
    pub cash_buffer_bucket_name: Option<String>,
    pub enforce_cash_buffer: bool,
    pub fx_mapping: Option<FxMapping>,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            base_currency: "SGD".to_string(),
            start_date: None,
            monthly_salary: Decimal::ZERO,
            annual_bonus: Decimal::ZERO,
            other_income: Decimal::ZERO,
            tax_rate: Decimal::new(20, 2),
            category_budgets: Vec::new(),
            monthly_expenses: None,
            expense_inflation_rate: Decimal::new(3, 2),
            one_time_costs: Vec::new(),
            allocation_weights: BucketMap::new(),
            bucket_returns: BucketMap::new(),
            minimum_cash_buffer_months: 6,
            cash_buffer_bucket_name: Some("cash".to_string()),
            enforce_cash_buffer: false,
            fx_mapping: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneTimeCostDetail {
    pub name: String,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub category_id: Option<String>,
}

impl From<&OneTimeCost> for OneTimeCostDetail {
    fn from(cost: &OneTimeCost) -> Self {
        Self {
            name: cost.name.clone(),
            amount: cost.amount,
            notes: cost.notes.clone(),
            category_id: cost.category_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProjection {
    pub period: String,
    pub gross_income: Decimal,
    pub taxes: Decimal,
    pub net_income: Decimal,
    pub expenses: Decimal,
    pub expense_breakdown: BucketMap,
    pub one_time_costs: Decimal,
    pub one_time_costs_detail: Vec<OneTimeCostDetail>,
    pub savings: Decimal,
    /// Shortfall hidden by clamping `savings` at zero.
    pub deficit: Decimal,
    pub savings_rate: Decimal,
    pub bucket_allocations: BucketMap,
    pub bucket_balances: BucketMap,
    pub net_income_fx: BucketMap,
    pub total_wealth_fx: BucketMap,
}

impl MonthlyProjection {
    pub fn total_wealth(&self) -> Decimal {
        super::money::total(self.bucket_balances.values())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyProjection {
    pub year: i32,
    pub months: u32,
    pub gross_income: Decimal,
    pub taxes: Decimal,
    pub net_income: Decimal,
    pub expenses: Decimal,
    pub one_time_costs: Decimal,
    pub savings: Decimal,
    pub deficit: Decimal,
    pub avg_savings_rate: Decimal,
    pub start_balances: BucketMap,
    pub end_balances: BucketMap,
    pub contributions: BucketMap,
    pub total_wealth: Decimal,
}
