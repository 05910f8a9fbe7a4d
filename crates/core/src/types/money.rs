//! Integer money arithmetic in minor currency units.
//!
//! All amounts are stored and computed as whole paise (`i64`), never as
//! floating point. Display formatting renders rupees with two decimal
//! places. Arithmetic is checked: line totals and order subtotals return
//! `None` on overflow instead of wrapping.

use serde::{Deserialize, Serialize};

/// An amount of money in minor currency units (paise).
///
/// Stored in the database as `BIGINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create from an amount in minor units (paise).
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Create from a whole-rupee amount.
    #[must_use]
    pub const fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication by a quantity.
    #[must_use]
    pub const fn checked_mul(self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}\u{20b9}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let minor = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(minor))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupees() {
        assert_eq!(Money::from_rupees(299).minor(), 29_900);
    }

    #[test]
    fn test_checked_add() {
        let a = Money::from_minor(100);
        let b = Money::from_minor(250);
        assert_eq!(a.checked_add(b), Some(Money::from_minor(350)));
        assert_eq!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)), None);
    }

    #[test]
    fn test_checked_mul() {
        assert_eq!(
            Money::from_minor(10_000).checked_mul(2),
            Some(Money::from_minor(20_000))
        );
        assert_eq!(Money::from_minor(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(2_499_900).to_string(), "\u{20b9}24999.00");
        assert_eq!(Money::from_minor(105).to_string(), "\u{20b9}1.05");
        assert_eq!(Money::from_minor(-105).to_string(), "-\u{20b9}1.05");
    }

    #[test]
    fn test_serde_transparent() {
        let m = Money::from_minor(450);
        assert_eq!(serde_json::to_string(&m).expect("serialize"), "450");
    }
}
