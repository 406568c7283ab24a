use std::fmt;

use crate::amount::AmountError;
use crate::db;
use crate::form::FieldErrors;

/// An error that can occur when running a banking operation
#[derive(Debug)]
pub struct Error {
	kind: ErrorKind,
}

impl Error {
	pub fn new(kind: ErrorKind) -> Error {
		Error { kind }
	}
	
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}
	
	/// Field errors when the input failed validation
	pub fn field_errors(&self) -> Option<&FieldErrors> {
		match &self.kind {
			ErrorKind::Validation(errors) => Some(errors),
			_ => None,
		}
	}
}

/// The kind of an error that can occur.
#[derive(Debug)]
pub enum ErrorKind {
	Database(db::Error),
	/// Submitted fields failed validation; nothing was written
	Validation(FieldErrors),
	InadequateFunds,
	InvalidAmount(String),
	AmountOutOfRange,
	/// No session matches the token
	Unauthenticated,
	/// Unknown username or wrong password
	InvalidCredentials,
	Password(String),
	/// The user id no longer fits the account number range
	AccountNumbersExhausted,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match &self.kind {
			ErrorKind::Database(e) => write!(f, "db error: {}", e),
			ErrorKind::Validation(errors) => write!(f, "invalid input: {}", errors),
			ErrorKind::InadequateFunds => write!(f, "not enough funds in account"),
			ErrorKind::InvalidAmount(msg) => write!(f, "invalid amount: {}", msg),
			ErrorKind::AmountOutOfRange => write!(f, "balance would exceed 12 digits"),
			ErrorKind::Unauthenticated => write!(f, "not signed in"),
			ErrorKind::InvalidCredentials => write!(f, "invalid username or password"),
			ErrorKind::Password(msg) => write!(f, "hashing password: {}", msg),
			ErrorKind::AccountNumbersExhausted => write!(f, "no account number left for new users"),
		}
	}
}

impl std::error::Error for Error {}

impl From<db::Error> for Error {
	fn from(e: db::Error) -> Self {
		Error::new(ErrorKind::Database(e))
	}
}

impl From<diesel::r2d2::PoolError> for Error {
	fn from(e: diesel::r2d2::PoolError) -> Self {
		Error::new(ErrorKind::Database(db::Error::from(e)))
	}
}

impl From<diesel::result::Error> for Error {
	fn from(e: diesel::result::Error) -> Self {
		Error::new(ErrorKind::Database(db::Error::from(e)))
	}
}

impl From<FieldErrors> for Error {
	fn from(errors: FieldErrors) -> Self {
		Error::new(ErrorKind::Validation(errors))
	}
}

impl From<AmountError> for Error {
	fn from(e: AmountError) -> Self {
		match e {
			AmountError::OutOfRange => Error::new(ErrorKind::AmountOutOfRange),
			e => Error::new(ErrorKind::InvalidAmount(e.to_string())),
		}
	}
}

impl From<argon2::password_hash::Error> for Error {
	fn from(e: argon2::password_hash::Error) -> Self {
		Error::new(ErrorKind::Password(e.to_string()))
	}
}
