//! Linode compute client.
//!
//! Ref: <https://techdocs.akamai.com/linode-api/reference/api>

use anyhow::Context;

pub mod auth;

mod flavor;
pub use flavor::{DEFAULT_FLAVOR, Flavor, flavors, get_flavor};

mod image;
pub use image::Image;

pub const DEFAULT_SERVERS_URL: &str = "api.linode.com";
pub const DEFAULT_VERSION: &str = "v4";

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	/// Personal access token.
	pub api_key: Option<log2::Secret<String>>,

	/// Defaults to [`DEFAULT_SERVERS_URL`].
	pub servers_url: Option<String>,

	/// Defaults to [`DEFAULT_VERSION`].
	pub version: Option<String>,
}

pub struct Client {
	inner: provider_common::Client<Endpoint>,
}

#[derive(Debug)]
struct Endpoint {
	servers_url: String,
	version: String,
}

impl provider_common::Provider for Endpoint {
	const NAME: &'static str = "linode";

	const FAIL_CODES: &'static [(http_common::StatusCode, &'static str)] = &[
		(http_common::StatusCode::BAD_REQUEST, "Bad Request"),
		(http_common::StatusCode::UNAUTHORIZED, "Unauthorized"),
		(http_common::StatusCode::FORBIDDEN, "Resize not allowed"),
		(http_common::StatusCode::NOT_FOUND, "Item not found"),
		(http_common::StatusCode::CONFLICT, "Build in progress"),
		(http_common::StatusCode::PAYLOAD_TOO_LARGE, "Over Limit"),
		(http_common::StatusCode::UNSUPPORTED_MEDIA_TYPE, "Bad Media Type"),
		(http_common::StatusCode::INTERNAL_SERVER_ERROR, "Fault"),
		(http_common::StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable"),
	];

	fn url(&self, path: &[String], query: &[(String, String)]) -> anyhow::Result<http_common::Uri> {
		let mut url = format!("https://{}/{}", self.servers_url, self.version);
		provider_common::push_path(&mut url, path);
		provider_common::push_query(&mut url, query);
		let url = url.try_into().context("could not parse request URL")?;
		Ok(url)
	}
}

impl Client {
	pub fn new(settings: &Settings, user_agent: http_common::HeaderValue, logger: log2::Logger) -> Result<Self, provider_common::Error> {
		let transport =
			http_common::Client::new(user_agent)
			.context("could not create HTTP client")
			.map_err(provider_common::Error::Config)?;
		Self::with_transport(settings, Box::new(transport), logger)
	}

	pub fn with_transport(
		settings: &Settings,
		transport: Box<dyn http_common::Transport>,
		logger: log2::Logger,
	) -> Result<Self, provider_common::Error> {
		let api_key = provider_common::require("apiKey", settings.api_key.as_ref().map(|log2::Secret(api_key)| &**api_key))?;
		let token = auth::Token::new(api_key).map_err(provider_common::Error::Config)?;

		let endpoint = Endpoint {
			servers_url: settings.servers_url.as_deref().unwrap_or(DEFAULT_SERVERS_URL).to_owned(),
			version: settings.version.as_deref().unwrap_or(DEFAULT_VERSION).to_owned(),
		};

		Ok(Client {
			inner: provider_common::Client::new(endpoint, provider_common::Hooks::new(vec![Box::new(token)]), transport, logger),
		})
	}

	pub fn version(&self) -> &str {
		&self.inner.provider().version
	}

	/// Lists the first page of images visible to the account.
	pub async fn list_images(&self) -> Result<Vec<Image>, provider_common::Error> {
		self.inner.logger().report_operation(
			"linode/images",
			&self.inner.provider().servers_url,
			log2::ScopedObjectOperation::Get,
			async {
				let response = self.inner.request(provider_common::RequestOptions::get(["images"])).await?;
				let image::ImagesResponse { data } =
					serde_json::from_slice(&response.body)
					.context("could not parse image list")
					.map_err(provider_common::Error::Parse)?;
				Ok::<_, provider_common::Error>(data.into_iter().map(Into::into).collect())
			},
		).await
	}
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("inner", &self.inner)
			.finish()
	}
}
