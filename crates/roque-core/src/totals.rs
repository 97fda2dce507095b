//! # Sale Total Calculator
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line save:    line.subtotal = round(quantity × unit_price, 2)          │
//! │                                  (half-even, stored on the line)        │
//! │                                                                         │
//! │  recalculate:  sale.subtotal = Σ line.subtotal     (no extra rounding)  │
//! │                sale.total    = subtotal − discount + tax                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both sums are checked: a subtotal or total beyond
//! [`Money::MAX_AMOUNT`] is an error and nothing is stored.
//!
//! Recalculation is explicit. Whoever adds, edits or removes a line calls
//! [`Sale::recalculate`] once, inside the same transaction as the line change.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Sale, SaleLine};

/// `round(quantity × unit_price, 2)`, ties to even.
#[inline]
pub fn line_subtotal(quantity: Quantity, unit_price: Money) -> Money {
    unit_price.times_quantity(quantity)
}

/// Derived money fields of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Sums stored line subtotals and applies discount and tax.
    pub fn compute(lines: &[SaleLine], discount: Money, tax: Money) -> CoreResult<Self> {
        let subtotal = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.subtotal()))
            .filter(|subtotal| subtotal.fits_within(Money::MAX_AMOUNT))
            .ok_or_else(|| out_of_range("subtotal"))?;

        let total = subtotal
            .checked_sub(discount)
            .and_then(|net| net.checked_add(tax))
            .filter(|total| total.fits_within(Money::MAX_AMOUNT))
            .ok_or_else(|| out_of_range("total"))?;

        Ok(SaleTotals {
            subtotal,
            discount,
            tax,
            total,
        })
    }
}

fn out_of_range(field: &str) -> CoreError {
    CoreError::AmountOutOfRange {
        field: field.to_string(),
        limit: Money::MAX_AMOUNT,
    }
}

impl SaleLine {
    /// Recomputes the stored subtotal from quantity and unit price.
    pub fn refresh_subtotal(&mut self) -> Money {
        let subtotal = line_subtotal(self.quantity(), self.unit_price());
        self.subtotal_cents = subtotal.cents();
        subtotal
    }
}

impl Sale {
    /// Recomputes subtotal and total from `lines`, returning the new total.
    ///
    /// `lines` must be the complete current set of lines of this sale.
    /// On error the sale is left untouched.
    pub fn recalculate(&mut self, lines: &[SaleLine]) -> CoreResult<Money> {
        let totals = SaleTotals::compute(lines, self.discount(), self.tax())?;
        self.subtotal_cents = totals.subtotal.cents();
        self.total_cents = totals.total.cents();
        Ok(totals.total)
    }

    pub fn totals(&self) -> SaleTotals {
        SaleTotals {
            subtotal: self.subtotal(),
            discount: self.discount(),
            tax: self.tax(),
            total: self.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
