//! Tax-inclusive price arithmetic over snapshot data.
//!
//! Every function here is pure. Carts price live catalog snapshots, orders
//! price their frozen [`OrderLine`](crate::OrderLine)s; both go through the
//! same [`PricedLine`] abstraction so the two totals can never drift apart.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors raised while converting amounts for external systems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// The amount cannot be represented in minor units.
    #[error("Amount {amount} cannot be expressed in minor currency units")]
    AmountOutOfRange { amount: Decimal },
}

/// A priced quantity of one product.
pub trait PricedLine {
    /// Unit price before tax.
    fn unit_price(&self) -> Decimal;

    /// Tax rate in percent (`20` means 20 %).
    fn tax_rate_percent(&self) -> Decimal;

    /// Number of units.
    fn quantity(&self) -> u32;
}

/// `unit_price * (1 + tax_rate_percent / 100)`.
pub fn unit_price_with_tax(unit_price: Decimal, tax_rate_percent: Decimal) -> Decimal {
    unit_price * (Decimal::ONE + tax_rate_percent / Decimal::ONE_HUNDRED)
}

/// Tax-inclusive total of one line.
pub fn line_total<L: PricedLine + ?Sized>(line: &L) -> Decimal {
    unit_price_with_tax(line.unit_price(), line.tax_rate_percent()) * Decimal::from(line.quantity())
}

/// Tax amount of one line, quantity applied.
pub fn line_tax<L: PricedLine + ?Sized>(line: &L) -> Decimal {
    line.unit_price() * line.tax_rate_percent() / Decimal::ONE_HUNDRED
        * Decimal::from(line.quantity())
}

/// Sum of the tax-inclusive totals of all lines.
pub fn subtotal_with_tax<'a, L, I>(lines: I) -> Decimal
where
    L: PricedLine + 'a,
    I: IntoIterator<Item = &'a L>,
{
    lines.into_iter().map(line_total).sum()
}

/// Sum of the tax part of all lines.
pub fn tax_total<'a, L, I>(lines: I) -> Decimal
where
    L: PricedLine + 'a,
    I: IntoIterator<Item = &'a L>,
{
    lines.into_iter().map(line_tax).sum()
}

/// Tax-inclusive subtotal plus the carrier price.
pub fn grand_total<'a, L, I>(lines: I, carrier_price: Decimal) -> Decimal
where
    L: PricedLine + 'a,
    I: IntoIterator<Item = &'a L>,
{
    subtotal_with_tax(lines) + carrier_price
}

/// Converts a major-unit amount to integer minor units (cents).
///
/// Rounds half away from zero. Fails instead of truncating when the result
/// does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PricingError> {
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(PricingError::AmountOutOfRange { amount })?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    scaled
        .to_i64()
        .ok_or(PricingError::AmountOutOfRange { amount })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    struct Line {
        price: Decimal,
        tax: Decimal,
        qty: u32,
    }

    impl PricedLine for Line {
        fn unit_price(&self) -> Decimal {
            self.price
        }

        fn tax_rate_percent(&self) -> Decimal {
            self.tax
        }

        fn quantity(&self) -> u32 {
            self.qty
        }
    }

    fn line(price: Decimal, tax: Decimal, qty: u32) -> Line {
        Line { price, tax, qty }
    }

    #[test]
    fn unit_price_with_tax_applies_rate() {
        assert_eq!(unit_price_with_tax(dec!(10.00), dec!(20)), dec!(12.00));
        assert_eq!(unit_price_with_tax(dec!(10.00), dec!(5.5)), dec!(10.55));
        assert_eq!(unit_price_with_tax(dec!(10.00), dec!(0)), dec!(10.00));
    }

    #[test]
    fn subtotal_and_grand_total_match_reference_scenario() {
        let lines = vec![line(dec!(10.00), dec!(20), 2)];

        assert_eq!(subtotal_with_tax(&lines), dec!(24.00));
        assert_eq!(grand_total(&lines, dec!(5.00)), dec!(29.00));
    }

    #[test]
    fn tax_total_applies_quantity_like_subtotal() {
        let lines = vec![
            line(dec!(10.00), dec!(20), 2),
            line(dec!(7.50), dec!(10), 3),
        ];

        let pre_tax: Decimal = lines
            .iter()
            .map(|l| l.price * Decimal::from(l.qty))
            .sum();

        assert_eq!(tax_total(&lines), dec!(6.25));
        assert_eq!(pre_tax + tax_total(&lines), subtotal_with_tax(&lines));
    }

    #[test]
    fn empty_lines_total_zero() {
        let lines: Vec<Line> = Vec::new();
        assert_eq!(subtotal_with_tax(&lines), Decimal::ZERO);
        assert_eq!(tax_total(&lines), Decimal::ZERO);
        assert_eq!(grand_total(&lines, dec!(4.90)), dec!(4.90));
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units(dec!(12.00)), Ok(1200));
        assert_eq!(to_minor_units(dec!(10.555)), Ok(1056));
        assert_eq!(to_minor_units(dec!(10.554)), Ok(1055));
        assert_eq!(to_minor_units(dec!(0)), Ok(0));
    }

    #[test]
    fn minor_units_reject_overflow() {
        let result = to_minor_units(Decimal::MAX);
        assert_eq!(
            result,
            Err(PricingError::AmountOutOfRange {
                amount: Decimal::MAX
            })
        );

        let too_big = Decimal::from(i64::MAX);
        assert!(to_minor_units(too_big).is_err());
    }
}
