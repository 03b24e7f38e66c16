//! The database capability shared by every provider that can provision databases.

/// Stands in for the real password in every descriptor returned to callers.
pub const MASKED_PASSWORD: &str = "*****";

/// Options for [`DatabaseProvider::create`]. Which fields are required depends on the provider.
#[derive(Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
	pub name: Option<String>,
	pub db_username: Option<String>,
	pub db_password: Option<String>,
	pub db_location: Option<String>,
}

impl std::fmt::Debug for CreateOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CreateOptions")
			.field("name", &self.name)
			.field("db_username", &self.db_username)
			.field("db_password", &self.db_password.as_ref().map(|_| MASKED_PASSWORD))
			.field("db_location", &self.db_location)
			.finish()
	}
}

/// Identifies one existing server.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ServerOptions {
	pub id: Option<String>,
}

impl From<&str> for ServerOptions {
	fn from(id: &str) -> Self {
		ServerOptions { id: Some(id.to_owned()) }
	}
}

/// A provisioned database server, in the same shape regardless of provider.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Database {
	pub id: String,
	pub host: String,
	pub port: u16,
	pub uri: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	pub password: &'static str,
}

pub trait DatabaseProvider: Send + Sync {
	/// The API version this provider speaks.
	fn version(&self) -> &'static str;

	fn create<'a>(&'a self, options: &'a CreateOptions) -> futures_util::future::BoxFuture<'a, Result<Database, crate::Error>>;

	fn list(&self) -> futures_util::future::BoxFuture<'_, Result<Vec<Database>, crate::Error>>;

	/// Returns `true` if the provider reported that the server was removed.
	fn remove<'a>(&'a self, options: &'a ServerOptions) -> futures_util::future::BoxFuture<'a, Result<bool, crate::Error>>;
}
