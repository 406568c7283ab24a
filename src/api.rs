//! HTTP surface of the service
//!
//! Handlers call into [`Service`] synchronously on tokio's blocking pool and
//! always answer with a complete [`Response`], so every route unifies to the
//! same type.

use std::convert::Infallible;

use tokio::task;
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

use crate::account::{AccountType, Gender};
use crate::address::Address;
use crate::amount::Amount;
use crate::bank::{self, ErrorKind, Service};
use crate::db;
use crate::form::{FieldErrors, LoginForm, RegistrationForm, TransactionForm, NON_FIELD};
use crate::types::Date;
use crate::user::User;

pub const SESSION_COOKIE: &str = "sessionid";
const MAX_FORM_BYTES: u64 = 16 * 1024;

/// All routes, answering redirects to `success_url`
pub fn routes(service: Service, success_url: String) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
	let register = warp::path!("accounts" / "register")
		.and(warp::post())
		.and(form::<RegistrationForm>())
		.and(with_service(service.clone()))
		.and(with_url(success_url.clone()))
		.then(|form: RegistrationForm, service: Service, url: String| blocking(move || register(form, service, url)));
	
	let login = warp::path!("accounts" / "login")
		.and(warp::post())
		.and(form::<LoginForm>())
		.and(with_service(service.clone()))
		.and(with_url(success_url.clone()))
		.then(|form: LoginForm, service: Service, url: String| blocking(move || login(form, service, url)));
	
	let logout = warp::path!("accounts" / "logout")
		.and(warp::post())
		.and(warp::cookie::optional(SESSION_COOKIE))
		.and(with_service(service.clone()))
		.and(with_url(success_url))
		.then(|token: Option<String>, service: Service, url: String| blocking(move || logout(token, service, url)));
	
	let me = warp::path!("accounts" / "me")
		.and(warp::get())
		.and(warp::cookie::optional(SESSION_COOKIE))
		.and(with_service(service.clone()))
		.then(|token: Option<String>, service: Service| blocking(move || account(token, service)));
	
	let delete_me = warp::path!("accounts" / "me")
		.and(warp::delete())
		.and(warp::cookie::optional(SESSION_COOKIE))
		.and(with_service(service.clone()))
		.then(|token: Option<String>, service: Service| blocking(move || delete_account(token, service)));
	
	let list_transactions = warp::path!("transactions")
		.and(warp::get())
		.and(warp::cookie::optional(SESSION_COOKIE))
		.and(with_service(service.clone()))
		.then(|token: Option<String>, service: Service| blocking(move || list_transactions(token, service)));
	
	let post_transaction = warp::path!("transactions")
		.and(warp::post())
		.and(warp::cookie::optional(SESSION_COOKIE))
		.and(form::<TransactionForm>())
		.and(with_service(service))
		.then(|token: Option<String>, form: TransactionForm, service: Service| {
			blocking(move || post_transaction(token, form, service))
		});
	
	register
		.or(login).unify()
		.or(logout).unify()
		.or(me).unify()
		.or(delete_me).unify()
		.or(list_transactions).unify()
		.or(post_transaction).unify()
}

fn with_service(service: Service) -> impl Filter<Extract = (Service,), Error = Infallible> + Clone {
	warp::any().map(move || service.clone())
}

fn with_url(url: String) -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
	warp::any().map(move || url.clone())
}

/// Run a handler where password hashing and database waits cannot stall the runtime
async fn blocking<F>(handler: F) -> Response
where
	F: FnOnce() -> Response + Send + 'static,
{
	match task::spawn_blocking(handler).await {
		Ok(response) => response,
		Err(e) => {
			error!("handler did not finish: {}", e);
			StatusCode::INTERNAL_SERVER_ERROR.into_response()
		}
	}
}

fn form<T: DeserializeOwned + Send + 'static>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
	warp::body::content_length_limit(MAX_FORM_BYTES).and(warp::body::form())
}

fn register(form: RegistrationForm, service: Service, success_url: String) -> Response {
	match service.register(&form) {
		Ok(registered) => see_other(&success_url, session_cookie(&registered.session.token)),
		Err(e) => error_response(&e),
	}
}

fn login(form: LoginForm, service: Service, success_url: String) -> Response {
	match service.sign_in(&form) {
		Ok(session) => see_other(&success_url, session_cookie(&session.token)),
		Err(e) => error_response(&e),
	}
}

fn logout(token: Option<String>, service: Service, success_url: String) -> Response {
	if let Some(token) = token {
		if let Err(e) = service.logout(&token) {
			return error_response(&e);
		}
	}
	see_other(&success_url, cleared_cookie())
}

#[derive(Serialize)]
struct AccountView<'a> {
	username: &'a str,
	account_no: i32,
	account_type: AccountType,
	gender: Gender,
	birth_date: Option<Date>,
	initial_deposit_date: Date,
	balance: Amount,
	address: AddressView<'a>,
}

#[derive(Serialize)]
struct AddressView<'a> {
	street_address: &'a str,
	city: &'a str,
	postal_code: i32,
	country: &'a str,
}

impl<'a> From<&'a Address> for AddressView<'a> {
	fn from(address: &'a Address) -> Self {
		AddressView {
			street_address: &address.street_address,
			city: &address.city,
			postal_code: address.postal_code,
			country: &address.country,
		}
	}
}

fn account(token: Option<String>, service: Service) -> Response {
	let result = signed_in(&service, token).and_then(|user| {
		let account = service.account(user.id)?;
		let address = service.address(user.id)?;
		Ok((user, account, address))
	});
	match result {
		Ok((user, account, address)) => reply::json(&AccountView {
			username: &user.username,
			account_no: account.account_no,
			account_type: account.account_type,
			gender: account.gender,
			birth_date: account.birth_date,
			initial_deposit_date: account.initial_deposit_date,
			balance: account.balance,
			address: AddressView::from(&address),
		}).into_response(),
		Err(e) => error_response(&e),
	}
}

fn delete_account(token: Option<String>, service: Service) -> Response {
	match signed_in(&service, token).and_then(|user| service.delete_user(user.id)) {
		Ok(()) => reply::with_header(StatusCode::NO_CONTENT, "set-cookie", cleared_cookie()).into_response(),
		Err(e) => error_response(&e),
	}
}

fn list_transactions(token: Option<String>, service: Service) -> Response {
	let result = signed_in(&service, token)
		.and_then(|user| service.account(user.id))
		.and_then(|account| service.transactions(account.account_no));
	match result {
		Ok(transactions) => reply::json(&transactions).into_response(),
		Err(e) => error_response(&e),
	}
}

fn post_transaction(token: Option<String>, form: TransactionForm, service: Service) -> Response {
	let result = signed_in(&service, token)
		.and_then(|user| service.account(user.id))
		.and_then(|account| {
			let (transaction_type, amount) = form.clean()?;
			service.post_transaction(account.account_no, transaction_type, amount)
		});
	match result {
		Ok(transaction) => reply::with_status(reply::json(&transaction), StatusCode::CREATED).into_response(),
		Err(e) => error_response(&e),
	}
}

fn signed_in(service: &Service, token: Option<String>) -> bank::Result<User> {
	match token {
		Some(token) => service.authenticate(&token),
		None => Err(bank::Error::new(ErrorKind::Unauthenticated)),
	}
}

fn session_cookie(token: &str) -> String {
	format!("{}={}; HttpOnly; Path=/; SameSite=Lax", SESSION_COOKIE, token)
}

fn cleared_cookie() -> String {
	format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax", SESSION_COOKIE)
}

fn see_other(location: &str, cookie: String) -> Response {
	let redirect = reply::with_header(reply::reply(), "location", location);
	let redirect = reply::with_header(redirect, "set-cookie", cookie);
	reply::with_status(redirect, StatusCode::SEE_OTHER).into_response()
}

/// Field errors go back to the client; storage failures are logged and hidden
fn error_response(e: &bank::Error) -> Response {
	let (status, errors) = match e.kind() {
		ErrorKind::Validation(errors) => (StatusCode::BAD_REQUEST, errors.clone()),
		ErrorKind::InadequateFunds => (StatusCode::BAD_REQUEST, FieldErrors::single("amount", "Not enough funds in account.")),
		ErrorKind::InvalidAmount(msg) => (StatusCode::BAD_REQUEST, FieldErrors::single("amount", msg.as_str())),
		ErrorKind::AmountOutOfRange => (StatusCode::BAD_REQUEST, FieldErrors::single("amount", e.to_string())),
		ErrorKind::InvalidCredentials => (
			StatusCode::BAD_REQUEST,
			FieldErrors::single(NON_FIELD, "Please enter a correct username and password."),
		),
		ErrorKind::Unauthenticated => (
			StatusCode::UNAUTHORIZED,
			FieldErrors::single(NON_FIELD, "Authentication credentials were not provided."),
		),
		ErrorKind::Database(db::Error::RecordNotFound) => (StatusCode::NOT_FOUND, FieldErrors::single(NON_FIELD, "Not found.")),
		ErrorKind::Database(_) | ErrorKind::Password(_) | ErrorKind::AccountNumbersExhausted => {
			error!("request failed: {}", e);
			(StatusCode::INTERNAL_SERVER_ERROR, FieldErrors::single(NON_FIELD, "Internal server error."))
		}
	};
	reply::with_status(reply::json(&json!({ "errors": errors })), status).into_response()
}
