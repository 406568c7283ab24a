//! Submitted forms and their field-level validation
//!
//! A form is the raw text a client posted. `clean` turns it into typed data,
//! or into every field error found, keyed by field name.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::{AccountType, Gender};
use crate::amount::Amount;
use crate::transaction::TransactionType;
use crate::types::Date;

pub const REQUIRED: &str = "This field is required.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
/// Key for errors that belong to no single field
pub const NON_FIELD: &str = "__all__";

const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors keyed by field name
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
	pub fn new() -> Self {
		FieldErrors::default()
	}
	
	pub fn single(field: &str, message: impl Into<String>) -> Self {
		let mut errors = FieldErrors::new();
		errors.add(field, message);
		errors
	}
	
	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.0.entry(field.to_string()).or_default().push(message.into());
	}
	
	pub fn get(&self, field: &str) -> Option<&[String]> {
		self.0.get(field).map(Vec::as_slice)
	}
	
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
	
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}
}

impl fmt::Display for FieldErrors {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let mut first = true;
		for (field, messages) in &self.0 {
			for message in messages {
				if !first {
					write!(f, "; ")?;
				}
				write!(f, "{}: {}", field, message)?;
				first = false;
			}
		}
		Ok(())
	}
}

/// Cleans one field at a time, collecting the errors
struct Cleaner {
	errors: FieldErrors,
}

impl Cleaner {
	fn new() -> Self {
		Cleaner { errors: FieldErrors::new() }
	}
	
	fn required<'v>(&mut self, field: &str, value: &'v str) -> Option<&'v str> {
		let value = value.trim();
		if value.is_empty() {
			self.errors.add(field, REQUIRED);
			return None;
		}
		Some(value)
	}
	
	/// Like `required`, but whitespace is significant
	fn required_exact<'v>(&mut self, field: &str, value: &'v str) -> Option<&'v str> {
		if value.is_empty() {
			self.errors.add(field, REQUIRED);
			return None;
		}
		Some(value)
	}
	
	fn max_length(&mut self, field: &str, value: &str, max: usize) -> bool {
		let length = value.chars().count();
		if length > max {
			self.errors.add(field, format!("Ensure this value has at most {} characters (it has {}).", max, length));
			return false;
		}
		true
	}
	
	fn required_text(&mut self, field: &str, value: &str, max: usize) -> Option<String> {
		let value = self.required(field, value)?;
		if !self.max_length(field, value, max) {
			return None;
		}
		Some(value.to_string())
	}
	
	fn optional_text(&mut self, field: &str, value: &str, max: usize) -> Option<String> {
		let value = value.trim();
		if !self.max_length(field, value, max) {
			return None;
		}
		Some(value.to_string())
	}
	
	fn choice<T: std::str::FromStr>(&mut self, field: &str, value: &str) -> Option<T> {
		let value = self.required(field, value)?;
		match value.parse() {
			Ok(choice) => Some(choice),
			Err(_) => {
				self.errors.add(field, format!("Select a valid choice. {} is not one of the available choices.", value));
				None
			}
		}
	}
	
	fn finish<T>(self, cleaned: Option<T>) -> Result<T, FieldErrors> {
		match cleaned {
			Some(cleaned) if self.errors.is_empty() => Ok(cleaned),
			_ => Err(self.errors),
		}
	}
}

fn is_valid_username(username: &str) -> bool {
	username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
}

fn is_valid_email(email: &str) -> bool {
	let (local, domain) = match email.split_once('@') {
		Some(parts) => parts,
		None => return false,
	};
	!local.is_empty()
		&& !domain.contains('@')
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !email.chars().any(char::is_whitespace)
}

/// Fields of the registration page, as submitted
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
	pub username: String,
	pub password1: String,
	pub password2: String,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub gender: String,
	pub birth_date: String,
	pub postal_code: String,
	pub city: String,
	pub street_address: String,
	pub country: String,
	/// Defaults to savings when left blank
	pub account_type: String,
}

/// A registration that passed field validation
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
	pub username: String,
	pub password: String,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub gender: Gender,
	pub birth_date: Date,
	pub account_type: AccountType,
	pub street_address: String,
	pub city: String,
	pub postal_code: i32,
	pub country: String,
}

impl RegistrationForm {
	pub fn clean(&self) -> Result<Registration, FieldErrors> {
		let mut c = Cleaner::new();
		
		let username = c.required_text("username", &self.username, 150);
		if let Some(ref name) = username {
			if !is_valid_username(name) {
				c.errors.add("username", "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.");
			}
		}
		
		let password = self.clean_password(&mut c);
		
		let first_name = c.optional_text("first_name", &self.first_name, 150);
		let last_name = c.optional_text("last_name", &self.last_name, 150);
		let email = c.optional_text("email", &self.email, 254);
		if let Some(ref address) = email {
			if !address.is_empty() && !is_valid_email(address) {
				c.errors.add("email", "Enter a valid email address.");
			}
		}
		
		let gender = c.choice::<Gender>("gender", &self.gender);
		let birth_date = c.required("birth_date", &self.birth_date).and_then(|value| {
			match Date::parse_from_str(value, "%Y-%m-%d") {
				Ok(date) => Some(date),
				Err(_) => {
					c.errors.add("birth_date", "Enter a valid date.");
					None
				}
			}
		});
		let account_type = if self.account_type.trim().is_empty() {
			Some(AccountType::default())
		} else {
			c.choice::<AccountType>("account_type", &self.account_type)
		};
		
		let street_address = c.required_text("street_address", &self.street_address, 100);
		let city = c.required_text("city", &self.city, 100);
		let country = c.required_text("country", &self.country, 100);
		let postal_code = c.required("postal_code", &self.postal_code).and_then(|value| {
			match value.parse::<i32>() {
				Ok(code) => Some(code),
				Err(_) => {
					c.errors.add("postal_code", "Enter a whole number.");
					None
				}
			}
		});
		
		let cleaned = (|| Some(Registration {
			username: username?,
			password: password?,
			first_name: first_name?,
			last_name: last_name?,
			email: email?,
			gender: gender?,
			birth_date: birth_date?,
			account_type: account_type?,
			street_address: street_address?,
			city: city?,
			postal_code: postal_code?,
			country: country?,
		}))();
		c.finish(cleaned)
	}
	
	/// Both fields present and equal, then the strength rules on the second
	fn clean_password(&self, c: &mut Cleaner) -> Option<String> {
		let first = c.required_exact("password1", &self.password1);
		let second = c.required_exact("password2", &self.password2);
		let (first, second) = (first?, second?);
		
		if first != second {
			c.errors.add("password2", PASSWORD_MISMATCH);
			return None;
		}
		
		let before = c.errors.get("password2").map_or(0, |e| e.len());
		if second.chars().count() < MIN_PASSWORD_LENGTH {
			c.errors.add("password2", format!(
				"This password is too short. It must contain at least {} characters.", MIN_PASSWORD_LENGTH));
		}
		if second.chars().all(|ch| ch.is_ascii_digit()) {
			c.errors.add("password2", "This password is entirely numeric.");
		}
		if c.errors.get("password2").map_or(0, |e| e.len()) > before {
			return None;
		}
		Some(second.to_string())
	}
}

/// Credentials posted to the sign-in endpoint
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
	pub username: String,
	pub password: String,
}

impl LoginForm {
	pub fn clean(&self) -> Result<(String, String), FieldErrors> {
		let mut c = Cleaner::new();
		let username = c.required("username", &self.username).map(str::to_string);
		let password = c.required_exact("password", &self.password).map(str::to_string);
		let cleaned = username.zip(password);
		c.finish(cleaned)
	}
}

/// A transaction posted against the signed-in user's account
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
	pub transaction_type: String,
	pub amount: String,
}

impl TransactionForm {
	pub fn clean(&self) -> Result<(TransactionType, Amount), FieldErrors> {
		let mut c = Cleaner::new();
		let transaction_type = c.choice::<TransactionType>("transaction_type", &self.transaction_type);
		let amount = c.required("amount", &self.amount).and_then(|value| {
			match value.parse::<Amount>() {
				Ok(amount) if amount.is_positive() => Some(amount),
				Ok(_) => {
					c.errors.add("amount", "Ensure this value is greater than 0.");
					None
				}
				Err(e) => {
					c.errors.add("amount", e.to_string());
					None
				}
			}
		});
		let cleaned = transaction_type.zip(amount);
		c.finish(cleaned)
	}
}
