use crate::{Error, Hooks, RequestOptions, StatusError};

/// The parts of a cloud vendor's API that the generic dispatch needs to know about.
pub trait Provider: Send + Sync {
	const NAME: &'static str;

	/// Responses with these status codes are reported as [`Error::Status`] with the corresponding message.
	const FAIL_CODES: &'static [(http_common::StatusCode, &'static str)];

	fn url(&self, path: &[String], query: &[(String, String)]) -> anyhow::Result<http_common::Uri>;
}

/// Characters that must be escaped within a single path segment.
///
/// Ref: <https://url.spec.whatwg.org/#path-percent-encode-set>
const PATH_SEGMENT: &percent_encoding::AsciiSet =
	&percent_encoding::CONTROLS
	.add(b' ').add(b'"').add(b'#').add(b'<').add(b'>').add(b'?').add(b'`').add(b'{').add(b'}')
	.add(b'%').add(b'/');

/// Appends each segment of `path` to `url` as `/<segment>`, percent-encoding characters that would otherwise
/// end the segment or the path.
pub fn push_path<S>(url: &mut String, path: &[S]) where S: AsRef<str> {
	for segment in path {
		url.push('/');
		url.extend(percent_encoding::utf8_percent_encode(segment.as_ref(), PATH_SEGMENT));
	}
}

/// Appends `query` to `url` as an `application/x-www-form-urlencoded` query string.
pub fn push_query(url: &mut String, query: &[(String, String)]) {
	if query.is_empty() {
		return;
	}

	url.push('?');
	let start_position = url.len();
	form_urlencoded::Serializer::for_suffix(url, start_position).extend_pairs(query);
}

pub struct Client<P> {
	provider: P,
	hooks: Hooks,
	transport: Box<dyn http_common::Transport>,
	logger: log2::Logger,
}

impl<P> Client<P> where P: Provider {
	pub fn new(
		provider: P,
		hooks: Hooks,
		transport: Box<dyn http_common::Transport>,
		logger: log2::Logger,
	) -> Self {
		Client {
			provider,
			hooks,
			transport,
			logger,
		}
	}

	pub fn provider(&self) -> &P {
		&self.provider
	}

	pub fn logger(&self) -> &log2::Logger {
		&self.logger
	}

	/// Sends one request through the hook chain and classifies the response by its status code.
	pub async fn request(&self, options: RequestOptions) -> Result<http_common::Response, Error> {
		if options.path.is_empty() {
			return Err(Error::NoPath);
		}

		let RequestOptions { method, path, query, headers, body, extensions } = self.hooks.apply(options).map_err(Error::Hook)?;

		let url = self.provider.url(&path, &query).map_err(Error::InvalidUrl)?;

		let mut req = http_common::Request::new(body.unwrap_or_default());
		*req.method_mut() = method;
		*req.uri_mut() = url;
		*req.headers_mut() = headers;
		*req.extensions_mut() = extensions;

		let response = self.transport.send(req).await.map_err(Error::Transport)?;

		if let Some((_, fail_code)) = P::FAIL_CODES.iter().find(|(status, _)| *status == response.status) {
			return Err(StatusError::new(P::NAME, response.status, fail_code, &response.body).into());
		}

		Ok(response)
	}
}

impl<P> std::fmt::Debug for Client<P> where P: std::fmt::Debug {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("provider", &self.provider)
			.field("hooks", &self.hooks)
			.field("logger", &self.logger)
			.finish_non_exhaustive()
	}
}
