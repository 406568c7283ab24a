use std::env;
use std::fmt;
use std::net::SocketAddr;

use dotenv::dotenv;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3030";
pub const DEFAULT_SUCCESS_URL: &str = "/accounts/register";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Runtime settings, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	/// SQLite database path
	pub database_url: String,
	pub bind_addr: SocketAddr,
	/// Where a successful registration, sign-in or sign-out redirects to
	pub success_url: String,
	pub pool_size: u32,
}

impl Config {
	/// Load settings from the environment
	///
	/// `DATABASE_URL` must be set in the environment
	/// Loads `.env` file in the environment's directory
	pub fn from_env() -> Result<Config, Error> {
		dotenv().ok();
		Config::from_lookup(|key| env::var(key).ok())
	}
	
	pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
		where F: Fn(&str) -> Option<String>
	{
		let database_url = lookup("DATABASE_URL")
			.filter(|v| !v.is_empty())
			.ok_or(Error::Missing("DATABASE_URL"))?;
		
		let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
		let bind_addr = bind_addr.parse::<SocketAddr>()
			.map_err(|e| Error::Invalid("BIND_ADDR", e.to_string()))?;
		
		let success_url = lookup("REGISTER_SUCCESS_URL").unwrap_or_else(|| DEFAULT_SUCCESS_URL.to_string());
		if success_url.parse::<warp::http::Uri>().is_err() {
			return Err(Error::Invalid("REGISTER_SUCCESS_URL", format!("not a uri: {}", success_url)));
		}
		
		let pool_size = match lookup("DB_POOL_SIZE") {
			Some(v) => match v.parse::<u32>() {
				Ok(n) if n > 0 => n,
				_ => return Err(Error::Invalid("DB_POOL_SIZE", format!("expected a positive integer, got {}", v))),
			},
			None => DEFAULT_POOL_SIZE,
		};
		
		Ok(Config {
			database_url,
			bind_addr,
			success_url,
			pool_size,
		})
	}
}

#[derive(Debug, PartialEq)]
pub enum Error {
	Missing(&'static str),
	Invalid(&'static str, String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::Missing(key) => write!(f, "{} must be set", key),
			Error::Invalid(key, msg) => write!(f, "{} is invalid: {}", key, msg),
		}
	}
}

impl std::error::Error for Error {}
