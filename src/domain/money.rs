//! Commission, tax and rounding rules for invoices.
//!
//! All currency values are rounded to 2 decimal places half-to-even at the
//! point of storage, never at display time, so repeated reads are stable.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::entities::fleet::{self, CommissionType};

/// Round to 2dp, half-to-even.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Commission retained by the platform when paying out a fleet.
/// Clamped to the subtotal: a flat commission larger than the payout never
/// produces a negative invoice.
pub fn commission_amount(
    commission_type: CommissionType,
    commission_value: Decimal,
    subtotal: Decimal,
) -> Decimal {
    let raw = match commission_type {
        CommissionType::Percentage => subtotal * commission_value / Decimal::from(100),
        CommissionType::Flat => commission_value,
    };
    round_currency(raw.clamp(Decimal::ZERO, subtotal))
}

pub fn fleet_commission(fleet: &fleet::Model, subtotal: Decimal) -> Decimal {
    commission_amount(fleet.commission_type, fleet.commission_value, subtotal)
}

/// Invoice money breakdown: tax applies after commission is deducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub commission: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

pub fn invoice_totals(subtotal: Decimal, commission: Decimal, tax_rate: Decimal) -> InvoiceTotals {
    let subtotal = round_currency(subtotal);
    let commission = round_currency(commission);
    let taxable = subtotal - commission;
    let tax = round_currency(taxable * tax_rate / Decimal::from(100));
    InvoiceTotals {
        subtotal,
        commission,
        tax,
        total: round_currency(taxable + tax),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(round_currency(d("1.005")), d("1.00"));
        assert_eq!(round_currency(d("1.015")), d("1.02"));
        assert_eq!(round_currency(d("1.025")), d("1.02"));
        assert_eq!(round_currency(d("2.675")), d("2.68"));
    }

    #[test]
    fn percentage_commission() {
        let c = commission_amount(CommissionType::Percentage, d("10"), d("100.00"));
        assert_eq!(c, d("10.00"));

        let c = commission_amount(CommissionType::Percentage, d("15"), d("50.00"));
        assert_eq!(c, d("7.50"));
    }

    #[test]
    fn flat_commission_clamped_to_subtotal() {
        let c = commission_amount(CommissionType::Flat, d("25.00"), d("100.00"));
        assert_eq!(c, d("25.00"));

        // A flat fee above the payout is capped, never negative
        let c = commission_amount(CommissionType::Flat, d("80.00"), d("50.00"));
        assert_eq!(c, d("50.00"));
    }

    #[test]
    fn ten_percent_commission_zero_tax() {
        let subtotal = d("123.45");
        let commission = commission_amount(CommissionType::Percentage, d("10"), subtotal);
        let totals = invoice_totals(subtotal, commission, d("0"));

        assert_eq!(totals.commission, round_currency(subtotal * d("0.10")));
        assert_eq!(totals.tax, d("0.00"));
        assert_eq!(totals.total, subtotal - totals.commission);
    }

    #[test]
    fn fleet_happy_path_numbers() {
        // driver_price 50, 15% commission, no tax
        let subtotal = d("50.00");
        let commission = commission_amount(CommissionType::Percentage, d("15"), subtotal);
        let totals = invoice_totals(subtotal, commission, d("0"));

        assert_eq!(totals.subtotal, d("50.00"));
        assert_eq!(totals.commission, d("7.50"));
        assert_eq!(totals.total, d("42.50"));
    }

    #[test]
    fn tax_applies_after_commission() {
        let totals = invoice_totals(d("100.00"), d("20.00"), d("20"));
        assert_eq!(totals.tax, d("16.00")); // 20% of 80
        assert_eq!(totals.total, d("96.00"));
    }

    #[test]
    fn totals_are_stable_under_reround() {
        let totals = invoice_totals(d("33.335"), d("3.3335"), d("19"));
        assert_eq!(round_currency(totals.total), totals.total);
        assert_eq!(round_currency(totals.tax), totals.tax);
        assert_eq!(round_currency(totals.commission), totals.commission);
    }
}
