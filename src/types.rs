use chrono::{NaiveDate, NaiveDateTime, Utc};

pub type Id = i32;
pub type Time = NaiveDateTime;
pub type Date = NaiveDate;

/// Source of the current date and time, in UTC
pub trait Calendar: Send + Sync {
	/// Gets the current time
	fn now(&self) -> Time {
		Utc::now().naive_utc()
	}
	
	/// Gets the current date
	fn current_date(&self) -> Date {
		self.now().date()
	}
}

/// The wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCalendar;

impl Calendar for SystemCalendar {}
