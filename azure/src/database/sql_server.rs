//! Azure SQL Database servers, through the classic Service Management API.
//!
//! Ref: <https://learn.microsoft.com/en-us/previous-versions/azure/reference/gg715283(v=azure.100)>

use anyhow::Context;
use provider_common::{Error, require};

pub const SQL_MANAGEMENT_ENDPOINT: &str = "management.database.windows.net:8443";
pub const API_VERSION: &str = "1.0";
pub const SQL_ENDPOINT: &str = "database.windows.net";
pub const SQL_PORT: u16 = 1433;

#[allow(clippy::declare_interior_mutable_const)] // Clippy doesn't like const http::HeaderValue
const APPLICATION_XML: http_common::HeaderValue = http_common::HeaderValue::from_static("application/xml");

pub struct Client {
	inner: provider_common::Client<Endpoint>,
	create_server_template: xml2::Template,
	create_firewall_rule_template: xml2::Template,
}

#[derive(Debug)]
struct Endpoint {
	servers_url: String,
	subscription_id: String,
}

impl provider_common::Provider for Endpoint {
	const NAME: &'static str = "azure";

	const FAIL_CODES: &'static [(http_common::StatusCode, &'static str)] = super::FAIL_CODES;

	fn url(&self, path: &[String], query: &[(String, String)]) -> anyhow::Result<http_common::Uri> {
		let mut url = format!("https://{}", self.servers_url);
		provider_common::push_path(&mut url, std::slice::from_ref(&self.subscription_id));
		provider_common::push_path(&mut url, path);
		provider_common::push_query(&mut url, query);
		let url = url.try_into().context("could not parse request URL")?;
		Ok(url)
	}
}

/// Options for the firewall rule operations. Which fields are required depends on the operation.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleOptions {
	/// The name of the server the rule belongs to.
	pub id: Option<String>,
	pub rule_name: Option<String>,
	pub start_ip_address: Option<String>,
	pub end_ip_address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
	pub rule_name: String,
	pub server_id: String,
	pub start_ip_address: Option<String>,
	pub end_ip_address: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleStatus {
	pub status_code: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFirewallRule {
	/// The client IP address as seen by Azure, which the rule now allows.
	pub ip_address: Option<String>,
	pub status_code: u16,
	pub rule_name: String,
}

impl Client {
	pub fn new(
		servers_url: Option<&str>,
		subscription_id: &str,
		identity: std::sync::Arc<http_common::ClientIdentity>,
		transport: Box<dyn http_common::Transport>,
		logger: log2::Logger,
	) -> anyhow::Result<Self> {
		let create_server_template =
			xml2::Template::parse(include_str!("templates/createSqlServer.xml"))
			.context("could not parse server template")?;
		let create_firewall_rule_template =
			xml2::Template::parse(include_str!("templates/createFirewallRule.xml"))
			.context("could not parse firewall rule template")?;

		let endpoint = Endpoint {
			servers_url: servers_url.unwrap_or(SQL_MANAGEMENT_ENDPOINT).to_owned(),
			subscription_id: subscription_id.to_owned(),
		};

		let hooks = provider_common::Hooks::new(vec![
			Box::new(crate::auth::ManagementCertificate::new(identity, API_VERSION)),
		]);

		Ok(Client {
			inner: provider_common::Client::new(endpoint, hooks, transport, logger),
			create_server_template,
			create_firewall_rule_template,
		})
	}

	pub fn version(&self) -> &'static str {
		API_VERSION
	}

	/// Requires `dbUsername`, `dbPassword` and `dbLocation`.
	pub async fn create(&self, options: &provider_common::database::CreateOptions) -> Result<provider_common::Database, Error> {
		let username = require("dbUsername", options.db_username.as_deref())?;
		let password = require("dbPassword", options.db_password.as_deref())?;
		let location = require("dbLocation", options.db_location.as_deref())?;

		let body =
			self.create_server_template.render(&[
				("username", username),
				("password", password),
				("location", location),
			])
			.map_err(Error::Config)?;

		self.inner.logger().report_operation(
			"azure/sql/server",
			username,
			log2::ScopedObjectOperation::Create { value: location },
			async {
				let response =
					self.inner.request(
						provider_common::RequestOptions::new(http_common::Method::POST, ["servers"])
						.with_body(APPLICATION_XML, body),
					).await?;
				let value = parse_xml(&response)?;
				format_server(&value, Some(username))
			},
		).await
	}

	pub async fn list(&self) -> Result<Vec<provider_common::Database>, Error> {
		self.inner.logger().report_operation(
			"azure/sql/servers",
			&self.inner.provider().subscription_id,
			log2::ScopedObjectOperation::Get,
			async {
				let response = self.inner.request(provider_common::RequestOptions::get(["servers"])).await?;
				let value = parse_xml(&response)?;
				value.get("Server")
					.map_or_else(Vec::new, xml2::Value::items)
					.into_iter()
					.map(|server| format_server(server, None))
					.collect()
			},
		).await
	}

	/// Requires `id`. Returns `true` if the server was deleted.
	pub async fn remove(&self, options: &provider_common::database::ServerOptions) -> Result<bool, Error> {
		let id = require("id", options.id.as_deref())?;

		self.inner.logger().report_operation(
			"azure/sql/server",
			id,
			log2::ScopedObjectOperation::Delete,
			async {
				let response = self.inner.request(provider_common::RequestOptions::new(http_common::Method::DELETE, ["servers", id])).await?;
				let deleted = response.status == http_common::StatusCode::OK;
				if !deleted {
					self.inner.logger().report_state("azure/sql/server", id, &format!("delete returned {}", response.status));
				}
				Ok::<_, Error>(deleted)
			},
		).await
	}

	/// Requires `id`, `ruleName`, `startIpAddress` and `endIpAddress`. Creates the rule or updates the existing rule with that name.
	pub async fn create_server_firewall_rule(&self, options: &FirewallRuleOptions) -> Result<FirewallRuleStatus, Error> {
		let id = require("id", options.id.as_deref())?;
		let rule_name = require("ruleName", options.rule_name.as_deref())?;
		let start_ip_address = require("startIpAddress", options.start_ip_address.as_deref())?;
		let end_ip_address = require("endIpAddress", options.end_ip_address.as_deref())?;

		let body =
			self.create_firewall_rule_template.render(&[
				("startIpAddress", start_ip_address),
				("endIpAddress", end_ip_address),
			])
			.map_err(Error::Config)?;

		self.inner.logger().report_operation(
			"azure/sql/server/firewall_rule",
			&format!("{id}/{rule_name}"),
			log2::ScopedObjectOperation::Create { value: &format!("{start_ip_address}-{end_ip_address}") },
			async {
				let response =
					self.inner.request(
						provider_common::RequestOptions::new(http_common::Method::PUT, ["servers", id, "firewallrules", rule_name])
						.with_body(APPLICATION_XML, body),
					).await?;
				Ok::<_, Error>(FirewallRuleStatus { status_code: response.status.as_u16() })
			},
		).await
	}

	/// Requires `id` and `ruleName`. Creates or updates the rule to allow the IP address that Azure sees this request coming from.
	pub async fn create_server_firewall_rule_with_ip_detect(&self, options: &FirewallRuleOptions) -> Result<DetectedFirewallRule, Error> {
		let id = require("id", options.id.as_deref())?;
		let rule_name = require("ruleName", options.rule_name.as_deref())?;

		self.inner.logger().report_operation(
			"azure/sql/server/firewall_rule",
			&format!("{id}/{rule_name}"),
			log2::ScopedObjectOperation::Create { value: "AutoDetectClientIP" },
			async {
				let response =
					self.inner.request(
						provider_common::RequestOptions::new(http_common::Method::POST, ["servers", id, "firewallrules", rule_name])
						.with_query("op", "AutoDetectClientIP"),
					).await?;
				let value = parse_xml(&response)?;
				Ok::<_, Error>(DetectedFirewallRule {
					ip_address: value.text().map(ToOwned::to_owned),
					status_code: response.status.as_u16(),
					rule_name: rule_name.to_owned(),
				})
			},
		).await
	}

	/// Requires `id`.
	pub async fn list_server_firewall_rules(&self, options: &provider_common::database::ServerOptions) -> Result<Vec<FirewallRule>, Error> {
		let id = require("id", options.id.as_deref())?;

		self.inner.logger().report_operation(
			"azure/sql/server/firewall_rules",
			id,
			log2::ScopedObjectOperation::Get,
			async {
				let response =
					self.inner.request(provider_common::RequestOptions::get(["servers", id, "firewallrules"])).await?;
				let value = parse_xml(&response)?;
				value.get("FirewallRule")
					.map_or_else(Vec::new, xml2::Value::items)
					.into_iter()
					.map(|rule| format_firewall_rule(rule, id))
					.collect()
			},
		).await
	}

	/// Requires `id` and `ruleName`. Returns `true` if the rule was deleted.
	pub async fn delete_firewall_rule(&self, options: &FirewallRuleOptions) -> Result<bool, Error> {
		let id = require("id", options.id.as_deref())?;
		let rule_name = require("ruleName", options.rule_name.as_deref())?;

		self.inner.logger().report_operation(
			"azure/sql/server/firewall_rule",
			&format!("{id}/{rule_name}"),
			log2::ScopedObjectOperation::Delete,
			async {
				let response =
					self.inner.request(
						provider_common::RequestOptions::new(http_common::Method::DELETE, ["servers", id, "firewallrules", rule_name]),
					).await?;
				Ok::<_, Error>(response.status == http_common::StatusCode::OK)
			},
		).await
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
			.finish_non_exhaustive()
	}
}

fn parse_xml(response: &http_common::Response) -> Result<xml2::Value, Error> {
	let body = response.body_str().map_err(Error::Parse)?;
	xml2::parse(body).map_err(Error::Parse)
}

/// `value` is either the `ServerName` returned by a create, whose character data is the name,
/// or a `Server` element from a list.
///
/// The login reported by the server takes precedence over `fallback_username`.
fn format_server(value: &xml2::Value, fallback_username: Option<&str>) -> Result<provider_common::Database, Error> {
	let id =
		value.text()
		.filter(|id| !id.is_empty())
		.or_else(|| value.get_text("Name"))
		.context("server has no name")
		.map_err(Error::Parse)?;

	let uri = format!("{id}.{SQL_ENDPOINT}");

	let username =
		value.get_text("AdministratorLogin")
		.or(fallback_username)
		.map(|login| format!("{login}@{uri}"));

	Ok(provider_common::Database {
		id: id.to_owned(),
		host: SQL_ENDPOINT.to_owned(),
		port: SQL_PORT,
		uri,
		username,
		password: provider_common::database::MASKED_PASSWORD,
	})
}

fn format_firewall_rule(value: &xml2::Value, server_id: &str) -> Result<FirewallRule, Error> {
	let rule_name = value.get_text("Name").context("firewall rule has no name").map_err(Error::Parse)?;

	Ok(FirewallRule {
		rule_name: rule_name.to_owned(),
		server_id: server_id.to_owned(),
		start_ip_address: value.get_text("StartIpAddress").map(ToOwned::to_owned),
		end_ip_address: value.get_text("EndIpAddress").map(ToOwned::to_owned),
	})
}
