//! Money and price breakdowns.
//!
//! Amounts are integer kopecks so that totals are exact sums at every
//! level of aggregation.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// An amount of roubles, stored as kopecks.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Construct from kopecks.
    pub const fn from_kopecks(kopecks: i64) -> Self {
        Money(kopecks)
    }

    /// Construct from a rouble amount, rounding to the nearest kopeck.
    ///
    /// Non-finite input yields zero.
    pub fn from_rubles(rubles: f64) -> Self {
        if !rubles.is_finite() {
            return Money::ZERO;
        }
        Money((rubles * 100.0).round() as i64)
    }

    pub fn kopecks(&self) -> i64 {
        self.0
    }

    pub fn as_rubles(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Larger of two amounts.
    pub fn max(self, other: Money) -> Money {
        Money(self.0.max(other.0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, rhs: u32) -> Money {
        Money(self.0 * i64::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Money({self})")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02} ₽", abs / 100, abs % 100)
    }
}

/// Costs on top of the base fare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExpensesRepr")]
pub struct AdditionalExpenses {
    taxi: Money,
    baggage: Money,
    fees: Money,
    transfer: Money,
    total: Money,
}

#[derive(Deserialize)]
struct ExpensesRepr {
    taxi: Money,
    baggage: Money,
    fees: Money,
    transfer: Money,
    total: Money,
}

impl AdditionalExpenses {
    pub fn new(taxi: Money, baggage: Money, fees: Money, transfer: Money) -> Self {
        Self {
            taxi,
            baggage,
            fees,
            transfer,
            total: taxi + baggage + fees + transfer,
        }
    }

    pub fn taxi(&self) -> Money {
        self.taxi
    }

    pub fn baggage(&self) -> Money {
        self.baggage
    }

    pub fn fees(&self) -> Money {
        self.fees
    }

    pub fn transfer(&self) -> Money {
        self.transfer
    }

    /// Always `taxi + baggage + fees + transfer`.
    pub fn total(&self) -> Money {
        self.total
    }
}

impl TryFrom<ExpensesRepr> for AdditionalExpenses {
    type Error = PriceMismatch;

    fn try_from(r: ExpensesRepr) -> Result<Self, Self::Error> {
        let expenses = AdditionalExpenses::new(r.taxi, r.baggage, r.fees, r.transfer);
        if expenses.total != r.total {
            return Err(PriceMismatch {
                declared: r.total,
                computed: expenses.total,
            });
        }
        Ok(expenses)
    }
}

/// Error when a deserialized total does not equal the sum of its parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("declared total {declared} does not equal component sum {computed}")]
pub struct PriceMismatch {
    declared: Money,
    computed: Money,
}

/// Full price of a segment or route.
///
/// # Invariants
///
/// - `total == base + taxi + baggage + fees + transfer`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BreakdownRepr")]
pub struct PriceBreakdown {
    base: Money,
    taxi: Money,
    baggage: Money,
    fees: Money,
    transfer: Money,
    total: Money,
}

#[derive(Deserialize)]
struct BreakdownRepr {
    base: Money,
    taxi: Money,
    baggage: Money,
    fees: Money,
    transfer: Money,
    total: Money,
}

impl PriceBreakdown {
    pub fn new(base: Money, expenses: AdditionalExpenses) -> Self {
        Self {
            base,
            taxi: expenses.taxi,
            baggage: expenses.baggage,
            fees: expenses.fees,
            transfer: expenses.transfer,
            total: base + expenses.total,
        }
    }

    /// Sum breakdowns component by component.
    ///
    /// The aggregate total is recomputed from summed components, never by
    /// adding per-item totals.
    ///
    /// # Examples
    ///
    /// ```
    /// use trip_planner::domain::{AdditionalExpenses, Money, PriceBreakdown};
    ///
    /// let a = PriceBreakdown::new(
    ///     Money::from_rubles(1000.0),
    ///     AdditionalExpenses::new(Money::from_rubles(500.0), Money::ZERO, Money::ZERO, Money::ZERO),
    /// );
    /// let b = PriceBreakdown::new(Money::from_rubles(250.5), AdditionalExpenses::default());
    /// let sum = PriceBreakdown::sum([a, b].iter());
    /// assert_eq!(sum.total(), Money::from_rubles(1750.5));
    /// ```
    pub fn sum<'a>(items: impl Iterator<Item = &'a PriceBreakdown>) -> PriceBreakdown {
        let mut base = Money::ZERO;
        let mut taxi = Money::ZERO;
        let mut baggage = Money::ZERO;
        let mut fees = Money::ZERO;
        let mut transfer = Money::ZERO;
        for p in items {
            base += p.base;
            taxi += p.taxi;
            baggage += p.baggage;
            fees += p.fees;
            transfer += p.transfer;
        }
        PriceBreakdown::new(base, AdditionalExpenses::new(taxi, baggage, fees, transfer))
    }

    pub fn base(&self) -> Money {
        self.base
    }

    pub fn taxi(&self) -> Money {
        self.taxi
    }

    pub fn baggage(&self) -> Money {
        self.baggage
    }

    pub fn fees(&self) -> Money {
        self.fees
    }

    pub fn transfer(&self) -> Money {
        self.transfer
    }

    /// The additional expenses part of this breakdown.
    pub fn additional(&self) -> AdditionalExpenses {
        AdditionalExpenses::new(self.taxi, self.baggage, self.fees, self.transfer)
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

impl TryFrom<BreakdownRepr> for PriceBreakdown {
    type Error = PriceMismatch;

    fn try_from(r: BreakdownRepr) -> Result<Self, Self::Error> {
        let price = PriceBreakdown::new(
            r.base,
            AdditionalExpenses::new(r.taxi, r.baggage, r.fees, r.transfer),
        );
        if price.total != r.total {
            return Err(PriceMismatch {
                declared: r.total,
                computed: price.total,
            });
        }
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_rounding() {
        assert_eq!(Money::from_rubles(10.006).kopecks(), 1001);
        assert_eq!(Money::from_rubles(0.004).kopecks(), 0);
        assert_eq!(Money::from_rubles(f64::NAN), Money::ZERO);
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_kopecks(123456).to_string(), "1234.56 ₽");
        assert_eq!(Money::from_kopecks(-5).to_string(), "-0.05 ₽");
    }

    #[test]
    fn total_is_sum_of_parts() {
        let exp = AdditionalExpenses::new(
            Money::from_kopecks(100),
            Money::from_kopecks(200),
            Money::from_kopecks(300),
            Money::from_kopecks(400),
        );
        assert_eq!(exp.total(), Money::from_kopecks(1000));

        let price = PriceBreakdown::new(Money::from_kopecks(5000), exp);
        assert_eq!(price.total(), Money::from_kopecks(6000));
        assert_eq!(price.additional(), exp);
    }

    #[test]
    fn deserialize_rejects_inconsistent_total() {
        let bad = r#"{"base":100,"taxi":0,"baggage":0,"fees":0,"transfer":0,"total":99}"#;
        assert!(serde_json::from_str::<PriceBreakdown>(bad).is_err());

        let good = r#"{"base":100,"taxi":1,"baggage":2,"fees":3,"transfer":4,"total":110}"#;
        let price: PriceBreakdown = serde_json::from_str(good).unwrap();
        assert_eq!(price.total().kopecks(), 110);
    }
}
