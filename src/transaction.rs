use std::str::FromStr;

use diesel::deserialize::{self, FromSql};
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use diesel::{AsExpression, FromSqlRow};
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::account::Account;
use crate::amount::Amount;
use crate::db::{Connection, Result};
use crate::schema::transactions;
use crate::types::{Id, Time};

/// An entry posted against a bank account
#[derive(Queryable, Identifiable, Associations, Serialize, PartialEq, Debug, Clone)]
#[diesel(belongs_to(Account))]
#[diesel(table_name = transactions)]
pub struct Transaction {
	pub id: Id,
	pub account_id: Id,
	pub amount: Amount,
	pub balance_after_transaction: Amount,
	pub transaction_type: TransactionType,
	pub timestamp: Time,
	pub loan_approve: bool,
}

#[derive(Insertable)]
#[diesel(table_name = transactions)]
pub struct NewTransaction {
	pub account_id: Id,
	pub amount: Amount,
	pub balance_after_transaction: Amount,
	pub transaction_type: TransactionType,
	pub timestamp: Time,
	pub loan_approve: bool,
}

#[derive(AsExpression, FromSqlRow, Clone, Copy, Eq, PartialEq, EnumString, Display, Serialize, Debug)]
#[diesel(sql_type = Text)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
	/// Funds put into the account
	Deposit,
	/// Funds taken out of the account
	Withdrawal,
	/// A loan request, pending approval
	Loan,
	/// Repayment of a loan
	LoanPaid,
}

impl TransactionType {
	pub fn as_str(&self) -> &'static str {
		match self {
			TransactionType::Deposit => "deposit",
			TransactionType::Withdrawal => "withdrawal",
			TransactionType::Loan => "loan",
			TransactionType::LoanPaid => "loan_paid",
		}
	}
}

impl ToSql<Text, Sqlite> for TransactionType {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
		ToSql::<Text, Sqlite>::to_sql(self.as_str(), out)
	}
}

impl FromSql<Text, Sqlite> for TransactionType {
	fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
		let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
		TransactionType::from_str(&s).map_err(|_| format!("invalid transaction type: {}", s).into())
	}
}

/// Transactions are append-only: no update path exists
pub struct Repo<'a> {
	db: &'a mut Connection,
}

impl<'a> Repo<'a> {
	pub fn new(db: &'a mut Connection) -> Self {
		Repo { db }
	}
	
	pub fn create(&mut self, new_transaction: NewTransaction) -> Result<Transaction> {
		diesel::insert_into(transactions::table)
			.values(&new_transaction)
			.get_result::<Transaction>(self.db)
			.map_err(Into::into)
	}
	
	/// All transactions of the account, oldest first
	pub fn find_for_account(&mut self, account_id: Id) -> Result<Vec<Transaction>> {
		transactions::table
			.filter(transactions::account_id.eq(account_id))
			.order((transactions::timestamp.asc(), transactions::id.asc()))
			.load::<Transaction>(self.db)
			.map_err(Into::into)
	}
	
	pub fn delete_for_account(&mut self, account_id: Id) -> Result<usize> {
		diesel::delete(transactions::table.filter(transactions::account_id.eq(account_id)))
			.execute(self.db)
			.map_err(Into::into)
	}
}
