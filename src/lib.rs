pub use account::{Account, AccountType, Gender};
pub use address::Address;
pub use amount::Amount;
pub use bank::{NewService, Registered, Service};
pub use config::Config;
pub use form::{FieldErrors, LoginForm, RegistrationForm, TransactionForm};
pub use session::Session;
pub use transaction::{Transaction, TransactionType};
pub use types::{Calendar, Date, Id, SystemCalendar, Time};
pub use user::User;

pub mod schema;
pub mod account;
pub mod address;
pub mod amount;
pub mod api;
pub mod bank;
pub mod config;
pub mod db;
pub mod form;
pub mod password;
pub mod session;
pub mod transaction;
pub mod types;
pub mod user;

#[cfg(test)]
mod testutil;
