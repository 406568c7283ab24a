use std::sync::Arc;

use log::*;

use crate::account::{self, account_number_for, Account, AccountKey, NewAccount};
use crate::address::{self, Address, NewAddress};
use crate::amount::Amount;
use crate::db;
use crate::form::{FieldErrors, LoginForm, RegistrationForm, USERNAME_TAKEN};
use crate::password;
use crate::session::{self, Session};
use crate::transaction::{self, NewTransaction, Transaction, TransactionType};
use crate::types::{Calendar, Id};
use crate::user::{self, NewUser, User, UserKey};

use super::error::{Error, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

/// Service for the front-office workflows
///
/// Every operation checks out one pooled connection; operations that write
/// more than one row run inside a single database transaction on it.
#[derive(Clone)]
pub struct Service {
	db: db::DbPool,
	calendar: Arc<dyn Calendar>,
}

/// Parameter object for creating a new Service
pub struct NewService {
	pub db: db::DbPool,
	pub calendar: Arc<dyn Calendar>,
}

/// Everything a successful registration created
#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
	pub user: User,
	pub address: Address,
	pub account: Account,
	pub session: Session,
}

impl Service {
	pub fn new(v: NewService) -> Self {
		Service {
			db: v.db,
			calendar: v.calendar,
		}
	}
	
	/// Register a new user from a submitted form
	///
	/// Creates the user, their address and their bank account, then signs
	/// them in. All of it commits together or not at all; a form that fails
	/// validation writes nothing.
	pub fn register(&self, form: &RegistrationForm) -> Result<Registered> {
		let registration = form.clean()?;
		let password_hash = password::hash(&registration.password)?;
		let now = self.calendar.now();
		let opened = self.calendar.current_date();
		
		let conn = &mut self.db.get()?;
		let registered = conn.immediate_transaction::<Registered, Error, _>(|conn| {
			let user = user::Repo::new(conn)
				.create(NewUser {
					username: &registration.username,
					password: &password_hash,
					first_name: &registration.first_name,
					last_name: &registration.last_name,
					email: &registration.email,
					date_joined: now,
				})
				.map_err(|e| match e {
					db::Error::RecordAlreadyExists => Error::from(FieldErrors::single("username", USERNAME_TAKEN)),
					e => Error::from(e),
				})?;
			
			let address = address::Repo::new(conn).create(NewAddress {
				user_id: user.id,
				street_address: &registration.street_address,
				city: &registration.city,
				postal_code: registration.postal_code,
				country: &registration.country,
			})?;
			
			let account_no = account_number_for(user.id)
				.ok_or_else(|| Error::new(ErrorKind::AccountNumbersExhausted))?;
			let account = account::Repo::new(conn).create(NewAccount {
				user_id: user.id,
				account_type: registration.account_type,
				account_no,
				birth_date: Some(registration.birth_date),
				gender: registration.gender,
				initial_deposit_date: opened,
				balance: Amount::ZERO,
			})?;
			
			let session = session::Repo::new(conn).create(user.id, now)?;
			
			Ok(Registered { user, address, account, session })
		})?;
		
		info!("registered user {} ({}) with account {}",
			registered.user.username, registered.user.id, registered.account.account_no);
		Ok(registered)
	}
	
	/// Check a username and password and open a session for that user
	pub fn sign_in(&self, form: &LoginForm) -> Result<Session> {
		let (username, password) = form.clean()?;
		let conn = &mut self.db.get()?;
		
		let user = match user::Repo::new(conn).find(UserKey::Username(&username)) {
			Ok(user) => user,
			Err(db::Error::RecordNotFound) => return Err(Error::new(ErrorKind::InvalidCredentials)),
			Err(e) => return Err(e.into()),
		};
		if !password::verify(&password, &user.password) {
			warn!("failed sign-in for {}", username);
			return Err(Error::new(ErrorKind::InvalidCredentials));
		}
		
		let session = session::Repo::new(conn).create(user.id, self.calendar.now())?;
		debug!("user {} signed in", user.id);
		Ok(session)
	}
	
	/// Look up the user owning a session token
	pub fn authenticate(&self, token: &str) -> Result<User> {
		let conn = &mut self.db.get()?;
		let session = match session::Repo::new(conn).find(token) {
			Ok(session) => session,
			Err(db::Error::RecordNotFound) => return Err(Error::new(ErrorKind::Unauthenticated)),
			Err(e) => return Err(e.into()),
		};
		user::Repo::new(conn).find(UserKey::ID(session.user_id)).map_err(Into::into)
	}
	
	/// End a session. Unknown tokens are ignored.
	pub fn logout(&self, token: &str) -> Result<()> {
		let conn = &mut self.db.get()?;
		session::Repo::new(conn).delete(token)?;
		Ok(())
	}
	
	pub fn account(&self, user_id: Id) -> Result<Account> {
		let conn = &mut self.db.get()?;
		account::Repo::new(conn).find(AccountKey::User(user_id)).map_err(Into::into)
	}
	
	pub fn address(&self, user_id: Id) -> Result<Address> {
		let conn = &mut self.db.get()?;
		address::Repo::new(conn).find_by_user(user_id).map_err(Into::into)
	}
	
	/// Post a transaction against an account and update its balance
	///
	/// # Arguments
	/// * `account_no` - number of the account the transaction belongs to
	/// * `transaction_type` - deposits add to the balance, withdrawals and loan
	///   repayments take from it, loan requests leave it unchanged
	/// * `amount` - must be greater than zero
	pub fn post_transaction(&self, account_no: i32, transaction_type: TransactionType, amount: Amount) -> Result<Transaction> {
		if !amount.is_positive() {
			return Err(Error::new(ErrorKind::InvalidAmount("amount must be greater than zero".into())));
		}
		let now = self.calendar.now();
		
		let conn = &mut self.db.get()?;
		// immediate, so two writers never both hold a read lock they need to upgrade
		let posted = conn.immediate_transaction::<Transaction, Error, _>(|conn| {
			let account = account::Repo::new(conn).find(AccountKey::Number(account_no))?;
			
			let balance = match transaction_type {
				TransactionType::Deposit => account.balance.checked_add(amount)?,
				TransactionType::Withdrawal | TransactionType::LoanPaid => {
					if account.balance < amount {
						return Err(Error::new(ErrorKind::InadequateFunds));
					}
					account.balance.checked_sub(amount)?
				}
				TransactionType::Loan => account.balance,
			};
			if balance != account.balance {
				account::Repo::new(conn).set_balance(account.id, balance)?;
			}
			
			transaction::Repo::new(conn).create(NewTransaction {
				account_id: account.id,
				amount,
				balance_after_transaction: balance,
				transaction_type,
				timestamp: now,
				loan_approve: false,
			}).map_err(Into::into)
		})?;
		
		debug!("posted {} of {} to account {}", transaction_type, amount, account_no);
		Ok(posted)
	}
	
	/// Transactions of an account, oldest first
	pub fn transactions(&self, account_no: i32) -> Result<Vec<Transaction>> {
		let conn = &mut self.db.get()?;
		let account = account::Repo::new(conn).find(AccountKey::Number(account_no))?;
		transaction::Repo::new(conn).find_for_account(account.id).map_err(Into::into)
	}
	
	/// Remove a user together with everything they own
	///
	/// Transactions, bank account, address and sessions go first, then the
	/// user row, all in one database transaction.
	pub fn delete_user(&self, user_id: Id) -> Result<()> {
		let conn = &mut self.db.get()?;
		conn.immediate_transaction::<(), Error, _>(|conn| {
			user::Repo::new(conn).find(UserKey::ID(user_id))?;
			
			match account::Repo::new(conn).find(AccountKey::User(user_id)) {
				Ok(account) => {
					let removed = transaction::Repo::new(conn).delete_for_account(account.id)?;
					account::Repo::new(conn).delete_for_user(user_id)?;
					debug!("removed account {} and {} transactions", account.account_no, removed);
				}
				Err(db::Error::RecordNotFound) => {}
				Err(e) => return Err(e.into()),
			}
			address::Repo::new(conn).delete_for_user(user_id)?;
			session::Repo::new(conn).delete_for_user(user_id)?;
			user::Repo::new(conn).delete(user_id)?;
			Ok(())
		})?;
		
		info!("deleted user {}", user_id);
		Ok(())
	}
}
