//! 数量值对象

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// 数量精度因子（3 位小数）
pub const QUANTITY_SCALE: i64 = 1000;

/// 计量单位
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Unit(pub String);

impl Unit {
    pub fn new(code: &str) -> Self {
        Self(code.to_string())
    }

    pub fn piece() -> Self {
        Self("PCS".to_string())
    }

    pub fn meter() -> Self {
        Self("M".to_string())
    }

    pub fn kilogram() -> Self {
        Self("KG".to_string())
    }
}

/// 数量值对象
///
/// 数量值以整数存储（乘以 [`QUANTITY_SCALE`]），避免浮点累计误差
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity {
    /// 缩放后的数量值
    pub value: i64,
    /// 计量单位
    pub unit: Unit,
}

impl Quantity {
    /// 从缩放后的原始值构造
    pub fn from_raw(value: i64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn zero(unit: Unit) -> Self {
        Self::from_raw(0, unit)
    }

    pub fn from_decimal(value: f64, unit: Unit) -> Self {
        Self::from_raw((value * QUANTITY_SCALE as f64).round() as i64, unit)
    }

    pub fn to_decimal(&self) -> f64 {
        self.value as f64 / QUANTITY_SCALE as f64
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0
    }

    /// 两数取小，单位必须一致
    pub fn min(&self, other: &Self) -> Self {
        assert_eq!(
            self.unit, other.unit,
            "Cannot compare quantities with different units"
        );
        if self.value <= other.value {
            self.clone()
        } else {
            other.clone()
        }
    }

    /// 减法，下限截断为 0
    pub fn saturating_sub(&self, other: &Self) -> Self {
        assert_eq!(
            self.unit, other.unit,
            "Cannot subtract quantities with different units"
        );
        Self::from_raw((self.value - other.value).max(0), self.unit.clone())
    }

    /// 精确减法，结果为负时返回 None
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        assert_eq!(
            self.unit, other.unit,
            "Cannot subtract quantities with different units"
        );
        let value = self.value - other.value;
        (value >= 0).then(|| Self::from_raw(value, self.unit.clone()))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        assert_eq!(
            self.unit, other.unit,
            "Cannot add quantities with different units"
        );
        Self::from_raw(self.value + other.value, self.unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {}", self.to_decimal(), self.unit.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_round_trip() {
        let q = Quantity::from_decimal(120.5, Unit::meter());
        assert_eq!(q.value, 120_500);
        assert_eq!(q.to_decimal(), 120.5);
    }

    #[test]
    fn test_saturating_sub_clamps_to_zero() {
        let a = Quantity::from_decimal(40.0, Unit::meter());
        let b = Quantity::from_decimal(100.0, Unit::meter());
        assert!(a.saturating_sub(&b).is_zero());
    }

    #[test]
    fn test_checked_sub() {
        let a = Quantity::from_decimal(100.0, Unit::meter());
        let b = Quantity::from_decimal(40.0, Unit::meter());
        assert_eq!(a.checked_sub(&b), Some(Quantity::from_decimal(60.0, Unit::meter())));
        assert_eq!(b.checked_sub(&a), None);
    }

    #[test]
    fn test_min() {
        let a = Quantity::from_decimal(100.0, Unit::meter());
        let b = Quantity::from_decimal(40.0, Unit::meter());
        assert_eq!(Quantity::min(&a, &b), b);
    }
}
