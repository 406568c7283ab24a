//! Registration, sessions and account operations on top of the repos

pub use error::{Error, ErrorKind};
pub use service::{NewService, Registered, Result, Service};

pub mod error;
pub mod service;
