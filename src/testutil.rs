use std::sync::{Arc, Mutex};

use chrono::Duration;
use diesel::prelude::*;

use crate::account::{account_number_for, Account, AccountType, Gender, NewAccount};
use crate::amount::Amount;
use crate::bank::{NewService, Service};
use crate::db;
use crate::form::RegistrationForm;
use crate::schema::{sessions, transactions, user_addresses, user_bank_accounts, users};
use crate::types::{Calendar, Date, Id, Time};
use crate::user::{NewUser, User};

pub fn time(s: &str) -> Time {
	Time::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("test timestamp")
}

pub fn date(s: &str) -> Date {
	Date::parse_from_str(s, "%Y-%m-%d").expect("test date")
}

pub fn amount(s: &str) -> Amount {
	s.parse().expect("test amount")
}

/// A calendar that only moves when told to
pub struct FixedCalendar {
	now: Mutex<Time>,
}

impl FixedCalendar {
	pub fn new(now: Time) -> Self {
		FixedCalendar { now: Mutex::new(now) }
	}
	
	pub fn set(&self, now: Time) {
		*self.now.lock().unwrap() = now;
	}
	
	pub fn advance(&self, by: Duration) {
		let mut now = self.now.lock().unwrap();
		*now = *now + by;
	}
}

impl Calendar for FixedCalendar {
	fn now(&self) -> Time {
		*self.now.lock().unwrap()
	}
}

pub fn registration_form(username: &str) -> RegistrationForm {
	RegistrationForm {
		username: username.to_string(),
		password1: "s3cure-pass".into(),
		password2: "s3cure-pass".into(),
		first_name: "Bob".into(),
		last_name: "Roberts".into(),
		email: format!("{}@example.com", username),
		gender: "male".into(),
		birth_date: "1990-05-17".into(),
		postal_code: "1205".into(),
		city: "Dhaka".into(),
		street_address: "12 Lake Road".into(),
		country: "Bangladesh".into(),
		account_type: String::new(),
	}
}

#[derive(Debug, PartialEq, Eq)]
pub struct Counts {
	pub users: i64,
	pub addresses: i64,
	pub accounts: i64,
	pub transactions: i64,
	pub sessions: i64,
}

/// A private in-memory database plus helpers to fill it
///
/// The pool holds a single connection: never keep one checked out while
/// calling into a helper or the service.
pub struct Fixture {
	pub pool: db::DbPool,
	pub calendar: Arc<FixedCalendar>,
}

impl Fixture {
	pub fn new() -> Self {
		Fixture {
			pool: db::in_memory().expect("in-memory database"),
			calendar: Arc::new(FixedCalendar::new(time("2024-03-01 09:00:00"))),
		}
	}
	
	pub fn conn(&self) -> db::PooledConnection {
		self.pool.get().unwrap()
	}
	
	pub fn service(&self) -> Service {
		Service::new(NewService {
			db: self.pool.clone(),
			calendar: self.calendar.clone(),
		})
	}
	
	pub fn user(&self, username: &str) -> User {
		diesel::insert_into(users::table)
			.values(NewUser {
				username,
				..UserFactory::defaults()
			})
			.get_result::<User>(&mut self.conn())
			.unwrap()
	}
	
	pub fn account(&self, user: &User) -> Account {
		self.account_numbered(user, account_number_for(user.id).unwrap())
	}
	
	pub fn account_numbered(&self, user: &User, account_no: i32) -> Account {
		diesel::insert_into(user_bank_accounts::table)
			.values(NewAccount {
				account_no,
				..AccountFactory::defaults(user.id)
			})
			.get_result(&mut self.conn())
			.unwrap()
	}
	
	pub fn counts(&self) -> Counts {
		let conn = &mut self.conn();
		Counts {
			users: users::table.count().get_result(conn).unwrap(),
			addresses: user_addresses::table.count().get_result(conn).unwrap(),
			accounts: user_bank_accounts::table.count().get_result(conn).unwrap(),
			transactions: transactions::table.count().get_result(conn).unwrap(),
			sessions: sessions::table.count().get_result(conn).unwrap(),
		}
	}
}

pub struct UserFactory;

impl UserFactory {
	pub fn defaults() -> NewUser<'static> {
		NewUser {
			username: "default",
			password: "not-a-hash",
			first_name: "Default",
			last_name: "Default",
			email: "default@example.com",
			date_joined: time("2024-03-01 09:00:00"),
		}
	}
}

pub struct AccountFactory;

impl AccountFactory {
	pub fn defaults(user_id: Id) -> NewAccount {
		NewAccount {
			user_id,
			account_type: AccountType::Savings,
			account_no: account_number_for(user_id).unwrap(),
			birth_date: None,
			gender: Gender::Female,
			initial_deposit_date: date("2024-03-01"),
			balance: Amount::ZERO,
		}
	}
}
