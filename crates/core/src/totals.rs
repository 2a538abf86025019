use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::item::PricingCategory;
use crate::domain::quote::LineItem;

/// The deployment locale (COP) has no fractional currency unit.
pub const MINOR_UNIT_DECIMALS: u32 = 0;

/// Round a money amount to the currency's minor unit.
pub fn round_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl Totals {
    pub fn zero() -> Self {
        Self { subtotal: Decimal::ZERO, tax_amount: Decimal::ZERO, total: Decimal::ZERO }
    }
}

/// Derive a quote's financial summary from scratch.
///
/// Always recomputed from the full line list, never patched incrementally:
/// stored totals must not be able to drift from the lines underneath them.
/// The tax rate is clamped at zero on the low end; no upper bound is
/// enforced (see DESIGN.md).
pub fn compute_totals(lines: &[LineItem], tax_rate_percent: Decimal) -> Totals {
    let tax_rate = tax_rate_percent.max(Decimal::ZERO);

    let subtotal: Decimal = lines
        .iter()
        .filter(|line| match line.category {
            // Exhaustive on purpose: a new category must decide explicitly
            // whether it is collected by the issuer.
            PricingCategory::OneTime | PricingCategory::Recurring => true,
            PricingCategory::AdditionalCost => false,
        })
        .map(|line| line.extended_price)
        .sum();

    let tax_amount = round_minor(subtotal * tax_rate / Decimal::ONE_HUNDRED);

    Totals { subtotal, tax_amount, total: subtotal + tax_amount }
}
