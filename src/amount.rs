use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use diesel::deserialize::{self, FromSql};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::BigInt;
use diesel::sqlite::{Sqlite, SqliteValue};
use diesel::{AsExpression, FromSqlRow};
use serde::{Serialize, Serializer};

/// A fixed-point amount of money with two decimal places and at most twelve digits
///
/// Stored as a whole number of cents.
#[derive(AsExpression, FromSqlRow, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[diesel(sql_type = BigInt)]
pub struct Amount(i64);

impl Amount {
	pub const ZERO: Amount = Amount(0);
	/// 9,999,999,999.99
	pub const MAX_CENTS: i64 = 999_999_999_999;
	
	pub fn from_cents(cents: i64) -> Result<Self, AmountError> {
		if cents.unsigned_abs() > Self::MAX_CENTS as u64 {
			return Err(AmountError::OutOfRange);
		}
		Ok(Amount(cents))
	}
	
	pub fn is_positive(&self) -> bool {
		self.0 > 0
	}
	
	pub fn checked_add(self, other: Amount) -> Result<Amount, AmountError> {
		Amount::from_cents(self.0 + other.0)
	}
	
	pub fn checked_sub(self, other: Amount) -> Result<Amount, AmountError> {
		Amount::from_cents(self.0 - other.0)
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let sign = if self.0 < 0 { "-" } else { "" };
		let abs = self.0.unsigned_abs();
		write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
	}
}

impl TryFrom<&BigDecimal> for Amount {
	type Error = AmountError;
	
	fn try_from(value: &BigDecimal) -> Result<Self, Self::Error> {
		// bound the shape before scaling; an exponent can make the scaled value huge
		let shape = value.normalized();
		let (_, scale) = shape.as_bigint_and_exponent();
		if scale > 2 {
			return Err(AmountError::TooManyDecimals);
		}
		if shape.digits() as i64 - scale > 10 {
			return Err(AmountError::OutOfRange);
		}
		
		let hundred = BigDecimal::from(100);
		let scaled = value * &hundred;
		let whole = scaled.with_scale(0);
		if whole != scaled {
			return Err(AmountError::TooManyDecimals);
		}
		let cents = whole.to_i64().ok_or(AmountError::OutOfRange)?;
		Amount::from_cents(cents)
	}
}

impl FromStr for Amount {
	type Err = AmountError;
	
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let value = BigDecimal::from_str(s.trim())
			.map_err(|e| AmountError::Invalid(e.to_string()))?;
		Amount::try_from(&value)
	}
}

impl Serialize for Amount {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl ToSql<BigInt, Sqlite> for Amount {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
		ToSql::<BigInt, Sqlite>::to_sql(&self.0, out)
	}
}

impl FromSql<BigInt, Sqlite> for Amount {
	fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
		let cents = <i64 as FromSql<BigInt, Sqlite>>::from_sql(bytes)?;
		Ok(Amount(cents))
	}
}

/// Why a value could not be turned into an [`Amount`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
	Invalid(String),
	TooManyDecimals,
	OutOfRange,
}

impl fmt::Display for AmountError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			AmountError::Invalid(e) => write!(f, "invalid amount: {}", e),
			AmountError::TooManyDecimals => write!(f, "Ensure that there are no more than 2 decimal places."),
			AmountError::OutOfRange => write!(f, "Ensure that there are no more than 12 digits in total."),
		}
	}
}

impl std::error::Error for AmountError {}

#[cfg(test)]
mod tests {
	use super::*;
	
	#[test]
	fn parses_and_displays_two_decimals() {
		let cases = vec![
			("0", "0.00"),
			("12.5", "12.50"),
			("12.50", "12.50"),
			("-3.07", "-3.07"),
			(" 100 ", "100.00"),
			("9999999999.99", "9999999999.99"),
		];
		
		for (input, want) in cases {
			let got: Amount = input.parse().expect(input);
			assert_eq!(got.to_string(), want, "input {:?}", input);
		}
	}
	
	#[test]
	fn rejects_more_than_two_decimals() {
		assert_eq!("1.005".parse::<Amount>(), Err(AmountError::TooManyDecimals));
	}
	
	#[test]
	fn rejects_more_than_twelve_digits() {
		assert_eq!("10000000000".parse::<Amount>(), Err(AmountError::OutOfRange));
		assert_eq!(Amount::from_cents(Amount::MAX_CENTS + 1), Err(AmountError::OutOfRange));
	}
	
	#[test]
	fn rejects_garbage() {
		assert!(matches!("ten".parse::<Amount>(), Err(AmountError::Invalid(_))));
	}
	
	#[test]
	fn checked_arithmetic_stays_in_range() {
		let max = Amount::from_cents(Amount::MAX_CENTS).unwrap();
		let one = Amount::from_cents(100).unwrap();
		assert_eq!(max.checked_add(one), Err(AmountError::OutOfRange));
		assert_eq!(one.checked_sub(one), Ok(Amount::ZERO));
	}
	
	#[test]
	fn decimal_conversion_keeps_cents() {
		let amount: Amount = "42.10".parse().unwrap();
		assert_eq!(amount, Amount::from_cents(4210).unwrap());
		assert_eq!(Amount::try_from(&BigDecimal::from_str("4.210e1").unwrap()), Ok(amount));
		assert_eq!("1.500".parse::<Amount>(), Amount::from_cents(150));
	}
	
	#[test]
	fn exponents_are_bounded_before_scaling() {
		assert_eq!("1e10000000".parse::<Amount>(), Err(AmountError::OutOfRange));
		assert_eq!("-1E10000000".parse::<Amount>(), Err(AmountError::OutOfRange));
		assert_eq!("1e-10000000".parse::<Amount>(), Err(AmountError::TooManyDecimals));
		assert_eq!("1e9".parse::<Amount>(), Amount::from_cents(100_000_000_000));
		assert_eq!("1e10".parse::<Amount>(), Err(AmountError::OutOfRange));
		assert_eq!("0e10000000".parse::<Amount>(), Ok(Amount::ZERO));
	}
}
