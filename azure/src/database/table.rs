//! Azure Table storage, where each table stands in for a database.
//!
//! Ref: <https://learn.microsoft.com/en-us/rest/api/storageservices/table-service-rest-api>

use anyhow::Context;
use provider_common::{Error, require};

pub const API_VERSION: &str = "2019-02-02";
pub const PORT: u16 = 443;

#[allow(clippy::declare_interior_mutable_const)] // Clippy doesn't like const http::HeaderValue
const APPLICATION_JSON_NO_METADATA: http_common::HeaderValue = http_common::HeaderValue::from_static("application/json;odata=nometadata");

pub struct Client {
	inner: provider_common::Client<Endpoint>,
	account: String,
}

#[derive(Debug)]
struct Endpoint {
	host: String,
}

impl provider_common::Provider for Endpoint {
	const NAME: &'static str = "azure";

	const FAIL_CODES: &'static [(http_common::StatusCode, &'static str)] = super::FAIL_CODES;

	fn url(&self, path: &[String], query: &[(String, String)]) -> anyhow::Result<http_common::Uri> {
		let mut url = format!("https://{}", self.host);
		provider_common::push_path(&mut url, path);
		provider_common::push_query(&mut url, query);
		let url = url.try_into().context("could not parse request URL")?;
		Ok(url)
	}
}

impl Client {
	/// `access_key` is the base64-encoded storage account key. `servers_url` overrides the default `<account>.table.core.windows.net`.
	pub fn new(
		servers_url: Option<&str>,
		account: &str,
		access_key: &str,
		transport: Box<dyn http_common::Transport>,
		logger: log2::Logger,
	) -> anyhow::Result<Self> {
		let endpoint = Endpoint {
			host: servers_url.map_or_else(|| format!("{account}.table.core.windows.net"), ToOwned::to_owned),
		};

		let hooks = provider_common::Hooks::new(vec![
			Box::new(|options: provider_common::RequestOptions| -> anyhow::Result<provider_common::RequestOptions> {
				Ok(options.with_header(http_common::ACCEPT, APPLICATION_JSON_NO_METADATA))
			}),
			Box::new(crate::auth::SharedKeyLite::new(account.to_owned(), access_key, API_VERSION)?),
		]);

		Ok(Client {
			inner: provider_common::Client::new(endpoint, hooks, transport, logger),
			account: account.to_owned(),
		})
	}

	pub fn version(&self) -> &'static str {
		API_VERSION
	}

	/// Requires `name`.
	pub async fn create(&self, options: &provider_common::database::CreateOptions) -> Result<provider_common::Database, Error> {
		#[derive(serde::Serialize)]
		struct Request<'a> {
			#[serde(rename = "TableName")]
			table_name: &'a str,
		}

		let name = require("name", options.name.as_deref())?;

		let body = serde_json::to_vec(&Request { table_name: name }).context("could not serialize request body").map_err(Error::Parse)?;

		self.inner.logger().report_operation(
			"azure/table",
			name,
			log2::ScopedObjectOperation::Create { value: name },
			async {
				let _ =
					self.inner.request(
						provider_common::RequestOptions::new(http_common::Method::POST, ["Tables"])
						.with_body(APPLICATION_JSON_NO_METADATA, body),
					).await?;
				Ok::<_, Error>(self.format_table(name))
			},
		).await
	}

	pub async fn list(&self) -> Result<Vec<provider_common::Database>, Error> {
		#[derive(serde::Deserialize)]
		struct Response {
			value: Vec<Table>,
		}

		#[derive(serde::Deserialize)]
		struct Table {
			#[serde(rename = "TableName")]
			table_name: String,
		}

		self.inner.logger().report_operation(
			"azure/tables",
			&self.account,
			log2::ScopedObjectOperation::Get,
			async {
				let response = self.inner.request(provider_common::RequestOptions::get(["Tables"])).await?;
				let Response { value } =
					serde_json::from_slice(&response.body)
					.context("could not parse table list")
					.map_err(Error::Parse)?;
				Ok::<_, Error>(value.iter().map(|table| self.format_table(&table.table_name)).collect())
			},
		).await
	}

	/// Requires `id`, the table name. Returns `true` if the table was deleted.
	pub async fn remove(&self, options: &provider_common::database::ServerOptions) -> Result<bool, Error> {
		let id = require("id", options.id.as_deref())?;

		self.inner.logger().report_operation(
			"azure/table",
			id,
			log2::ScopedObjectOperation::Delete,
			async {
				let response =
					self.inner.request(provider_common::RequestOptions::new(http_common::Method::DELETE, [format!("Tables('{id}')")])).await?;
				Ok::<_, Error>(response.status == http_common::StatusCode::NO_CONTENT)
			},
		).await
	}

	fn format_table(&self, name: &str) -> provider_common::Database {
		let host = &self.inner.provider().host;
		provider_common::Database {
			id: name.to_owned(),
			host: host.clone(),
			port: PORT,
			uri: format!("https://{host}/{name}"),
			username: Some(self.account.clone()),
			password: provider_common::database::MASKED_PASSWORD,
		}
	}
}

impl provider_common::DatabaseProvider for Client {
	fn version(&self) -> &'static str {
		API_VERSION
	}

	fn create<'a>(
		&'a self,
		options: &'a provider_common::database::CreateOptions,
	) -> futures_util::future::BoxFuture<'a, Result<provider_common::Database, Error>> {
		Box::pin(self.create(options))
	}

	fn list(&self) -> futures_util::future::BoxFuture<'_, Result<Vec<provider_common::Database>, Error>> {
		Box::pin(self.list())
	}

	fn remove<'a>(
		&'a self,
		options: &'a provider_common::database::ServerOptions,
	) -> futures_util::future::BoxFuture<'a, Result<bool, Error>> {
		Box::pin(self.remove(options))
	}
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("inner", &self.inner)
			.field("account", &self.account)
			.finish()
	}
}
