use std::str::FromStr;

use diesel::deserialize::{self, FromSql};
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use diesel::{AsExpression, FromSqlRow};
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::amount::Amount;
use crate::db::{Connection, Result};
use crate::schema::user_bank_accounts;
use crate::types::{Date, Id};
use crate::user::User;

/// Account numbers are handed out as this offset plus the owner's user id
pub const ACCOUNT_NO_OFFSET: i32 = 100_000;

/// `None` once user ids grow past what an account number can hold
pub fn account_number_for(user_id: Id) -> Option<i32> {
	ACCOUNT_NO_OFFSET.checked_add(user_id)
}

/// A user's bank account, one per user
#[derive(Queryable, Identifiable, Associations, PartialEq, Debug, Clone)]
#[diesel(belongs_to(User))]
#[diesel(table_name = user_bank_accounts)]
pub struct Account {
	pub id: Id,
	pub user_id: Id,
	pub account_type: AccountType,
	pub account_no: i32,
	pub birth_date: Option<Date>,
	pub gender: Gender,
	/// Day the account was opened. Never updated.
	pub initial_deposit_date: Date,
	pub balance: Amount,
}

#[derive(Insertable)]
#[diesel(table_name = user_bank_accounts)]
pub struct NewAccount {
	pub user_id: Id,
	pub account_type: AccountType,
	pub account_no: i32,
	pub birth_date: Option<Date>,
	pub gender: Gender,
	pub initial_deposit_date: Date,
	pub balance: Amount,
}

#[derive(AsExpression, FromSqlRow, Clone, Copy, Eq, PartialEq, EnumString, Display, Serialize, Debug)]
#[diesel(sql_type = Text)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
	Savings,
	Current,
}

impl AccountType {
	pub fn as_str(&self) -> &'static str {
		match self {
			AccountType::Savings => "savings",
			AccountType::Current => "current",
		}
	}
}

impl Default for AccountType {
	fn default() -> Self {
		AccountType::Savings
	}
}

impl ToSql<Text, Sqlite> for AccountType {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
		ToSql::<Text, Sqlite>::to_sql(self.as_str(), out)
	}
}

impl FromSql<Text, Sqlite> for AccountType {
	fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
		let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
		AccountType::from_str(&s).map_err(|_| format!("invalid account type: {}", s).into())
	}
}

#[derive(AsExpression, FromSqlRow, Clone, Copy, Eq, PartialEq, EnumString, Display, Serialize, Debug)]
#[diesel(sql_type = Text)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
	Male,
	Female,
}

impl Gender {
	pub fn as_str(&self) -> &'static str {
		match self {
			Gender::Male => "male",
			Gender::Female => "female",
		}
	}
}

impl ToSql<Text, Sqlite> for Gender {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
		ToSql::<Text, Sqlite>::to_sql(self.as_str(), out)
	}
}

impl FromSql<Text, Sqlite> for Gender {
	fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
		let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
		Gender::from_str(&s).map_err(|_| format!("invalid gender: {}", s).into())
	}
}

pub enum AccountKey {
	Number(i32),
	User(Id),
}

pub struct Repo<'a> {
	db: &'a mut Connection,
}

impl<'a> Repo<'a> {
	pub fn new(db: &'a mut Connection) -> Self {
		Repo { db }
	}
	
	pub fn create(&mut self, new_account: NewAccount) -> Result<Account> {
		diesel::insert_into(user_bank_accounts::table)
			.values(&new_account)
			.get_result(self.db)
			.map_err(Into::into)
	}
	
	pub fn find(&mut self, key: AccountKey) -> Result<Account> {
		let query = user_bank_accounts::table.into_boxed();
		let query = match key {
			AccountKey::Number(account_no) => query.filter(user_bank_accounts::account_no.eq(account_no)),
			AccountKey::User(user_id) => query.filter(user_bank_accounts::user_id.eq(user_id)),
		};
		query.first::<Account>(self.db).map_err(Into::into)
	}
	
	/// Overwrite the balance; the only column of an account that ever changes
	pub fn set_balance(&mut self, account_id: Id, balance: Amount) -> Result<Account> {
		diesel::update(user_bank_accounts::table.find(account_id))
			.set(user_bank_accounts::balance.eq(balance))
			.get_result(self.db)
			.map_err(Into::into)
	}
	
	pub fn delete_for_user(&mut self, user_id: Id) -> Result<usize> {
		diesel::delete(user_bank_accounts::table.filter(user_bank_accounts::user_id.eq(user_id)))
			.execute(self.db)
			.map_err(Into::into)
	}
}
