use rust_decimal::Decimal;
use tracing::warn;

/// `amount * factor`, saturating at the decimal range instead of panicking.
pub(crate) fn scale(amount: Decimal, factor: Decimal) -> Decimal {
    amount.checked_mul(factor).unwrap_or_else(|| {
        warn!(%amount, %factor, "decimal overflow, saturating");
        amount.saturating_mul(factor)
    })
}

/// Saturating sum of a series of amounts.
pub(crate) fn total<'a>(amounts: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(*amount))
}
