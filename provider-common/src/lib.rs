mod client;
pub use client::{Client, Provider, push_path, push_query};

pub mod database;
pub use database::{Database, DatabaseProvider};

mod error;
pub use error::{Error, StatusError};

mod request;
pub use request::{Hook, Hooks, RequestOptions};

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

/// Returns the value of a required option, or [`Error::MissingOption`] if it is absent or empty.
pub fn require<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, Error> {
	match value {
		Some(value) if !value.is_empty() => Ok(value),
		_ => Err(Error::MissingOption(name)),
	}
}
