use std::fmt;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, PoolError};
use diesel::result::DatabaseErrorKind::UniqueViolation;
use diesel::result::Error::{DatabaseError, NotFound};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::*;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type Result<T> = std::result::Result<T, Error>;
pub type Connection = SqliteConnection;
pub type DbPool = r2d2::Pool<ConnectionManager<Connection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<Connection>>;

/// Applied to every connection handed out by the pool
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<Connection, r2d2::Error> for ConnectionOptions {
	fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), r2d2::Error> {
		conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
			.map_err(r2d2::Error::QueryError)
	}
}

/// Open a connection pool against `database_url` and bring the schema up to date
///
/// `database_url` is a SQLite path, or `:memory:` (see [`in_memory`])
pub fn connect(database_url: &str, max_size: u32) -> Result<DbPool> {
	let manager = ConnectionManager::<Connection>::new(database_url);
	let pool = r2d2::Pool::builder()
		.max_size(max_size)
		.connection_customizer(Box::new(ConnectionOptions))
		.build(manager)?;
	
	run_migrations(&pool)?;
	info!("database ready at {}", database_url);
	Ok(pool)
}

/// A single-connection pool over a private in-memory database
///
/// Every call returns a fresh, empty, migrated database. The one connection
/// is never recycled, otherwise the data would vanish with it.
pub fn in_memory() -> Result<DbPool> {
	let manager = ConnectionManager::<Connection>::new(":memory:");
	let pool = r2d2::Pool::builder()
		.max_size(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connection_customizer(Box::new(ConnectionOptions))
		.build(manager)?;
	
	run_migrations(&pool)?;
	Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
	let mut pooled = pool.get()?;
	let conn: &mut Connection = &mut pooled;
	let applied = conn.run_pending_migrations(MIGRATIONS)
		.map_err(|e| Error::Migration(e.to_string()))?;
	for version in applied {
		debug!("applied migration {}", version);
	}
	Ok(())
}

/// Error that can occur when querying against the database
#[derive(Debug)]
pub enum Error {
	RecordAlreadyExists,
	RecordNotFound,
	Connection(String),
	Migration(String),
	/// Used as a catch-all for the remaining diesel errors
	DatabaseError(diesel::result::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::RecordAlreadyExists => write!(f, "record violates a unique constraint"),
			Error::RecordNotFound => write!(f, "record does not exist"),
			Error::Connection(e) => write!(f, "opening database connection: {}", e),
			Error::Migration(e) => write!(f, "running migrations: {}", e),
			Error::DatabaseError(e) => write!(f, "database error: {:?}", e),
		}
	}
}

impl std::error::Error for Error {}

impl From<diesel::result::Error> for Error {
	fn from(e: diesel::result::Error) -> Self {
		match e {
			DatabaseError(UniqueViolation, _) => Error::RecordAlreadyExists,
			NotFound => Error::RecordNotFound,
			
			_ => Error::DatabaseError(e),
		}
	}
}

impl From<PoolError> for Error {
	fn from(e: PoolError) -> Self {
		Error::Connection(e.to_string())
	}
}

#[cfg(test)]
mod tests {
	use diesel::prelude::*;
	
	use super::*;
	
	#[test]
	fn in_memory_databases_are_isolated() {
		let first = in_memory().expect("first pool");
		let second = in_memory().expect("second pool");
		
		diesel::sql_query("INSERT INTO users (username, password, date_joined) VALUES ('bob', 'x', '2024-01-01 00:00:00')")
			.execute(&mut first.get().unwrap())
			.unwrap();
		
		let count = |pool: &DbPool| -> i64 {
			crate::schema::users::table.count().get_result(&mut pool.get().unwrap()).unwrap()
		};
		assert_eq!(count(&first), 1);
		assert_eq!(count(&second), 0);
	}
	
	#[test]
	fn foreign_keys_are_enforced() {
		let pool = in_memory().unwrap();
		let err = diesel::sql_query("INSERT INTO sessions (token, user_id, created_at) VALUES ('t', 42, '2024-01-01 00:00:00')")
			.execute(&mut pool.get().unwrap())
			.unwrap_err();
		
		assert!(matches!(Error::from(err), Error::DatabaseError(_)));
	}
	
	#[test]
	fn unique_violation_maps_to_record_already_exists() {
		let pool = in_memory().unwrap();
		let conn = &mut pool.get().unwrap();
		let insert = "INSERT INTO users (username, password, date_joined) VALUES ('bob', 'x', '2024-01-01 00:00:00')";
		diesel::sql_query(insert).execute(conn).unwrap();
		let err = diesel::sql_query(insert).execute(conn).unwrap_err();
		
		assert!(matches!(Error::from(err), Error::RecordAlreadyExists));
	}
}
