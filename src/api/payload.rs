use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::core::{Assumptions, BucketMap, CategoryBudget, FxMapping, OneTimeCost};

/// Body of `POST /forecast`. Every field is optional; omitted fields take the
/// same defaults as [`Assumptions::default`], except `base_currency`, which
/// comes from configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForecastPayload {
    base_currency: Option<String>,
    #[serde(deserialize_with = "deserialize_start_date")]
    start_date: Option<NaiveDate>,

    monthly_salary: Option<Decimal>,
    annual_bonus: Option<Decimal>,
    other_income: Option<Decimal>,
    tax_rate: Option<Decimal>,

    category_budgets: Vec<CategoryBudget>,
    expense_inflation_rate: Option<Decimal>,
    monthly_expenses: Option<Decimal>,

    one_time_costs: Vec<OneTimeCost>,

    allocation_weights: BucketMap,
    bucket_returns: BucketMap,

    minimum_cash_buffer_months: Option<u32>,
    #[serde(deserialize_with = "deserialize_explicit_null")]
    cash_buffer_bucket_name: Option<Option<String>>,
    enforce_cash_buffer: Option<bool>,

    fx_mapping: Option<FxMapping>,
}

impl ForecastPayload {
    pub fn into_assumptions(self, default_base_currency: &str) -> Assumptions {
        let defaults = Assumptions::default();
        Assumptions {
            base_currency: self
                .base_currency
                .unwrap_or_else(|| default_base_currency.to_string()),
            start_date: self.start_date,
            monthly_salary: self.monthly_salary.unwrap_or(defaults.monthly_salary),
            annual_bonus: self.annual_bonus.unwrap_or(defaults.annual_bonus),
            other_income: self.other_income.unwrap_or(defaults.other_income),
            tax_rate: self.tax_rate.unwrap_or(defaults.tax_rate),
            category_budgets: self.category_budgets,
            monthly_expenses: self.monthly_expenses,
            expense_inflation_rate: self
                .expense_inflation_rate
                .unwrap_or(defaults.expense_inflation_rate),
            one_time_costs: self.one_time_costs,
            allocation_weights: self.allocation_weights,
            bucket_returns: self.bucket_returns,
            minimum_cash_buffer_months: self
                .minimum_cash_buffer_months
                .unwrap_or(defaults.minimum_cash_buffer_months),
            cash_buffer_bucket_name: self
                .cash_buffer_bucket_name
                .unwrap_or(defaults.cash_buffer_bucket_name),
            enforce_cash_buffer: self
                .enforce_cash_buffer
                .unwrap_or(defaults.enforce_cash_buffer),
            fx_mapping: self.fx_mapping,
        }
    }
}

/// Distinguishes an explicit `null` (no buffer bucket) from an absent key
/// (default bucket).
fn deserialize_explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Accepts RFC 3339 timestamps, naive timestamps, or plain dates.
fn deserialize_start_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_start_date(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid start_date: {raw}")))
}

fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(timestamp.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(json: &str) -> Assumptions {
        serde_json::from_str::<ForecastPayload>(json)
            .expect("json should parse")
            .into_assumptions("SGD")
    }

    #[test]
    fn empty_body_takes_defaults() {
        let assumptions = parse("{}");
        assert_eq!(assumptions, Assumptions::default());
    }

    #[test]
    fn configured_base_currency_applies_when_omitted() {
        let assumptions = serde_json::from_str::<ForecastPayload>("{}")
            .expect("json should parse")
            .into_assumptions("EUR");
        assert_eq!(assumptions.base_currency, "EUR");
    }

    #[test]
    fn parses_full_request_body() {
        let json = r#"{
          "base_currency": "SGD",
          "start_date": "2026-03-01T00:00:00",
          "monthly_salary": 8000,
          "annual_bonus": "24000",
          "tax_rate": 0.15,
          "category_budgets": [
            {"category_id": "housing", "monthly_amount": 2500},
            {"category_id": "food", "monthly_amount": 0, "inflation_override": 0.05,
             "subcategory_budgets": [
               {"subcategory_id": "groceries", "monthly_amount": 600},
               {"subcategory_id": "dining", "monthly_amount": 300, "inflation_override": 0.08}
             ]}
          ],
          "expense_inflation_rate": 0.025,
          "one_time_costs": [
            {"name": "wedding", "amount": 30000, "month_index": 9, "notes": "venue"}
          ],
          "allocation_weights": {"cash": 0.2, "invest": 0.8},
          "bucket_returns": {"cash": 0.02, "invest": 0.07},
          "minimum_cash_buffer_months": 3,
          "cash_buffer_bucket_name": "cash",
          "enforce_cash_buffer": true,
          "fx_mapping": {
            "base_currency": "SGD",
            "display_currencies": ["USD"],
            "rates": {"SGDUSD": 0.74}
          }
        }"#;
        let assumptions = parse(json);

        assert_eq!(assumptions.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(assumptions.monthly_salary, dec!(8000));
        assert_eq!(assumptions.annual_bonus, dec!(24000));
        assert_eq!(assumptions.tax_rate, dec!(0.15));
        assert_eq!(assumptions.category_budgets.len(), 2);
        assert_eq!(assumptions.category_budgets[1].subcategory_budgets.len(), 2);
        assert_eq!(
            assumptions.category_budgets[1].subcategory_budgets[1].inflation_override,
            Some(dec!(0.08))
        );
        assert_eq!(assumptions.one_time_costs[0].month_index, 9);
        assert_eq!(assumptions.one_time_costs[0].category_id, None);
        assert_eq!(assumptions.allocation_weights["invest"], dec!(0.8));
        assert_eq!(assumptions.minimum_cash_buffer_months, 3);
        assert!(assumptions.enforce_cash_buffer);
        let fx = assumptions.fx_mapping.expect("fx mapping present");
        assert_eq!(fx.rates["SGDUSD"], dec!(0.74));
    }

    #[test]
    fn explicit_null_buffer_bucket_disables_default() {
        let assumptions = parse(r#"{"cash_buffer_bucket_name": null}"#);
        assert_eq!(assumptions.cash_buffer_bucket_name, None);

        let assumptions = parse("{}");
        assert_eq!(assumptions.cash_buffer_bucket_name.as_deref(), Some("cash"));
    }

    #[test]
    fn start_date_formats() {
        assert_eq!(
            parse_start_date("2026-05-17T10:30:00+08:00"),
            NaiveDate::from_ymd_opt(2026, 5, 17)
        );
        assert_eq!(
            parse_start_date("2026-05-17T10:30:00.123"),
            NaiveDate::from_ymd_opt(2026, 5, 17)
        );
        assert_eq!(
            parse_start_date("2026-05-17"),
            NaiveDate::from_ymd_opt(2026, 5, 17)
        );
        assert_eq!(parse_start_date("May 2026"), None);
    }

    #[test]
    fn rejects_unparseable_start_date() {
        let err = serde_json::from_str::<ForecastPayload>(r#"{"start_date": "soon"}"#)
            .expect_err("must reject bad date");
        assert!(err.to_string().contains("start_date"));
    }
}
