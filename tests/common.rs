use std::sync::{Arc, Mutex};

pub use diesel::prelude::*;

pub use bank_front::*;
pub use bank_front::db::DbPool;
pub use bank_front::schema::*;

pub struct FixedCalendar {
	now: Mutex<Time>,
}

impl FixedCalendar {
	pub fn set(&self, now: &str) {
		*self.now.lock().unwrap() = time(now);
	}
}

impl Calendar for FixedCalendar {
	fn now(&self) -> Time {
		*self.now.lock().unwrap()
	}
}

pub fn time(s: &str) -> Time {
	Time::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("test timestamp")
}

pub fn amount(s: &str) -> Amount {
	s.parse().expect("test amount")
}

pub fn registration_form(username: &str) -> RegistrationForm {
	RegistrationForm {
		username: username.to_string(),
		password1: "s3cure-pass".into(),
		password2: "s3cure-pass".into(),
		first_name: "Vincent".into(),
		last_name: "Xiao".into(),
		email: format!("{}@example.com", username),
		gender: "male".into(),
		birth_date: "1991-02-03".into(),
		postal_code: "1207".into(),
		city: "Dhaka".into(),
		street_address: "House 5, Road 2".into(),
		country: "Bangladesh".into(),
		account_type: "savings".into(),
	}
}

pub struct Fixture {
	pub pool: DbPool,
	pub calendar: Arc<FixedCalendar>,
}

impl Fixture {
	pub fn new() -> Self {
		Fixture::with_pool(db::in_memory().expect("in-memory database"))
	}
	
	pub fn with_pool(pool: DbPool) -> Self {
		Fixture {
			pool,
			calendar: Arc::new(FixedCalendar { now: Mutex::new(time("2024-03-01 09:00:00")) }),
		}
	}
	
	pub fn service(&self) -> Service {
		Service::new(NewService {
			db: self.pool.clone(),
			calendar: self.calendar.clone(),
		})
	}
	
	/// Row counts of (users, addresses, accounts, transactions, sessions)
	pub fn counts(&self) -> (i64, i64, i64, i64, i64) {
		let conn = &mut self.pool.get().unwrap();
		(
			users::table.count().get_result(conn).unwrap(),
			user_addresses::table.count().get_result(conn).unwrap(),
			user_bank_accounts::table.count().get_result(conn).unwrap(),
			transactions::table.count().get_result(conn).unwrap(),
			sessions::table.count().get_result(conn).unwrap(),
		)
	}
}
