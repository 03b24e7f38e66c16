use anyhow::Context;

pub use http::Extensions;

pub use hyper::{
	Method,
	Request,
	StatusCode,
	Uri,
	body::Bytes,
	header::{
		ACCEPT,
		AUTHORIZATION,
		CONTENT_LENGTH,
		CONTENT_TYPE,
		HeaderMap,
		HeaderName,
		HeaderValue,
	},
};

pub use rustls::pki_types::{CertificateDer, PrivateKeyDer};

/// A TLS client certificate chain and the private key for its leaf certificate.
///
/// Insert an `Arc<ClientIdentity>` into a request's extensions to have [`Client`] present it during the TLS handshake.
pub struct ClientIdentity {
	pub certificate_chain: Vec<CertificateDer<'static>>,
	pub private_key: PrivateKeyDer<'static>,
}

impl std::fmt::Debug for ClientIdentity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientIdentity")
			.field("certificate_chain", &self.certificate_chain.len())
			.field("private_key", &format_args!("******"))
			.finish()
	}
}

/// A fully-read HTTP response.
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn body_str(&self) -> anyhow::Result<&str> {
		std::str::from_utf8(&self.body).context("response body is not valid UTF-8")
	}
}

/// Sends a single request and reads the whole response.
///
/// Implementations must not retry.
pub trait Transport: Send + Sync {
	fn send(&self, req: Request<Bytes>) -> futures_util::future::BoxFuture<'_, anyhow::Result<Response>>;
}

type Inner = hyper_util::client::legacy::Client<
	hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
	http_body_util::Full<Bytes>,
>;

pub struct Client {
	inner: Inner,
	identity_inners: std::sync::Mutex<Vec<(std::sync::Arc<ClientIdentity>, Inner)>>,
	user_agent: HeaderValue,
}

impl Client {
	pub fn new(user_agent: HeaderValue) -> anyhow::Result<Self> {
		Ok(Client {
			inner: make_inner(None)?,
			identity_inners: Default::default(),
			user_agent,
		})
	}

	pub async fn request(&self, mut req: Request<Bytes>) -> anyhow::Result<Response> {
		let inner = match req.extensions().get::<std::sync::Arc<ClientIdentity>>() {
			Some(identity) => self.inner_for(identity)?,
			None => self.inner.clone(),
		};

		req.headers_mut().insert(hyper::header::USER_AGENT, self.user_agent.clone());

		let res = inner.request(req.map(http_body_util::Full::new)).await.context("could not execute request")?;

		let (http::response::Parts { status, headers, .. }, body) = res.into_parts();

		let body = http_body_util::BodyExt::collect(body).await.context("could not read response body")?.to_bytes();

		Ok(Response {
			status,
			headers,
			body,
		})
	}

	// A connector's TLS config is fixed once built, so each distinct identity gets its own connection pool.
	fn inner_for(&self, identity: &std::sync::Arc<ClientIdentity>) -> anyhow::Result<Inner> {
		let mut identity_inners = self.identity_inners.lock().map_err(|_| anyhow::anyhow!("TLS client cache is poisoned"))?;

		if let Some((_, inner)) = identity_inners.iter().find(|(cached, _)| std::sync::Arc::ptr_eq(cached, identity)) {
			return Ok(inner.clone());
		}

		let inner = make_inner(Some(identity)).context("could not configure TLS client certificate")?;
		identity_inners.push((identity.clone(), inner.clone()));
		Ok(inner)
	}
}

impl Transport for Client {
	fn send(&self, req: Request<Bytes>) -> futures_util::future::BoxFuture<'_, anyhow::Result<Response>> {
		Box::pin(self.request(req))
	}
}

fn make_inner(identity: Option<&ClientIdentity>) -> anyhow::Result<Inner> {
	let root_store = rustls::RootCertStore {
		roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
	};

	let config =
		rustls::ClientConfig::builder_with_provider(std::sync::Arc::new(rustls::crypto::ring::default_provider()))
		.with_safe_default_protocol_versions().context("could not configure TLS protocol versions")?
		.with_root_certificates(root_store);
	let config = match identity {
		Some(ClientIdentity { certificate_chain, private_key }) =>
			config.with_client_auth_cert(certificate_chain.clone(), private_key.clone_key())
			.context("could not use TLS client certificate")?,

		None => config.with_no_client_auth(),
	};

	let connector =
		hyper_rustls::HttpsConnectorBuilder::new()
		.with_tls_config(config)
		.https_or_http()
		.enable_http1()
		.build();

	let inner = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);
	Ok(inner)
}
