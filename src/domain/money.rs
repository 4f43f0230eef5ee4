//! Monetary amounts.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// An amount rounded to two decimal places after every arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    amount: f64,
}

impl Money {
    pub const ZERO: Money = Money { amount: 0.0 };

    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn is_greater_than_zero(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_greater_than(&self, other: &Money) -> bool {
        self.amount > other.amount
    }

    fn scaled(amount: f64) -> Self {
        Self {
            amount: (amount * 100.0).round() / 100.0,
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::scaled(self.amount + other.amount)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::scaled(self.amount - other.amount)
    }
}

impl Mul<i32> for Money {
    type Output = Money;

    fn mul(self, factor: i32) -> Money {
        Money::scaled(self.amount * f64::from(factor))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.amount)
    }
}
