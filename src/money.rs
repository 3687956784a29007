//! Monetary arithmetic for transfers.
//!
//! Balances and amounts use [Decimal] rather than binary floats so that the
//! fee rounding law holds exactly across any number of transfers. Amounts
//! are persisted as TEXT columns and parsed back on read.

use rusqlite::{Row, types::Type};
use rust_decimal::{Decimal, RoundingStrategy};

/// The fraction of the sent amount deducted as a fee on receipt.
pub fn fee_rate() -> Decimal {
    Decimal::new(5, 2)
}

/// The amount credited to the receiver for a given sent amount.
///
/// Applies the fee and rounds to cents, half away from zero, so a sent
/// amount of 100.00 yields 95.00 and 0.10 yields 0.10 (0.095 rounds up).
pub fn amount_received(amount_sent: Decimal) -> Decimal {
    (amount_sent * (Decimal::ONE - fee_rate()))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Read a decimal amount stored as TEXT from `row` at `index`.
///
/// # Errors
/// Returns a conversion error if the column is not valid decimal text, so
/// that row mappers can propagate it as a [rusqlite::Error].
pub(crate) fn decimal_from_row(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    text.parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

#[cfg(test)]
mod amount_received_tests {
    use rust_decimal::Decimal;

    use super::amount_received;

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    #[test]
    fn deducts_five_percent() {
        assert_eq!(amount_received(dec("100.00")), dec("95.00"));
        assert_eq!(amount_received(dec("50")), dec("47.50"));
        assert_eq!(amount_received(dec("1000.00")), dec("950.00"));
    }

    #[test]
    fn rounds_half_up_to_cents() {
        // 0.10 * 0.95 = 0.095, which rounds up to 0.10.
        assert_eq!(amount_received(dec("0.10")), dec("0.10"));
        // 0.30 * 0.95 = 0.285, which rounds up to 0.29.
        assert_eq!(amount_received(dec("0.30")), dec("0.29"));
        // 33.33 * 0.95 = 31.6635, which rounds down to 31.66.
        assert_eq!(amount_received(dec("33.33")), dec("31.66"));
    }

    #[test]
    fn zero_amount_yields_zero() {
        assert_eq!(amount_received(dec("0")), dec("0"));
    }

    #[test]
    fn repeated_small_amounts_do_not_drift() {
        let mut total = Decimal::ZERO;

        for _ in 0..1_000 {
            total += amount_received(dec("0.10"));
        }

        assert_eq!(total, dec("100.00"));
    }
}
