/// A request that has not been sent yet.
///
/// The URL is not resolved until after the hook chain has run, so hooks see the path segments and can sign them.
#[derive(Debug)]
pub struct RequestOptions {
	pub method: http_common::Method,
	pub path: Vec<String>,
	pub query: Vec<(String, String)>,
	pub headers: http_common::HeaderMap,
	pub body: Option<http_common::Bytes>,
	pub extensions: http_common::Extensions,
}

impl RequestOptions {
	pub fn new<I>(method: http_common::Method, path: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		RequestOptions {
			method,
			path: path.into_iter().map(Into::into).collect(),
			query: vec![],
			headers: Default::default(),
			body: None,
			extensions: Default::default(),
		}
	}

	pub fn get<I>(path: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		Self::new(http_common::Method::GET, path)
	}

	#[must_use]
	pub fn with_query(mut self, name: &str, value: &str) -> Self {
		self.query.push((name.to_owned(), value.to_owned()));
		self
	}

	#[must_use]
	pub fn with_header(mut self, name: http_common::HeaderName, value: http_common::HeaderValue) -> Self {
		self.headers.insert(name, value);
		self
	}

	/// Sets the body along with its `content-type` and `content-length` headers.
	#[must_use]
	pub fn with_body(mut self, content_type: http_common::HeaderValue, body: impl Into<http_common::Bytes>) -> Self {
		let body = body.into();
		self.headers.insert(http_common::CONTENT_TYPE, content_type);
		self.headers.insert(http_common::CONTENT_LENGTH, body.len().into());
		self.body = Some(body);
		self
	}
}

/// A transform applied to every request before it is sent.
pub trait Hook: Send + Sync {
	fn apply(&self, options: RequestOptions) -> anyhow::Result<RequestOptions>;
}

impl<F> Hook for F where F: Fn(RequestOptions) -> anyhow::Result<RequestOptions> + Send + Sync {
	fn apply(&self, options: RequestOptions) -> anyhow::Result<RequestOptions> {
		self(options)
	}
}

/// An ordered chain of [`Hook`]s, fixed at construction.
#[derive(Default)]
pub struct Hooks(Vec<Box<dyn Hook>>);

impl Hooks {
	pub fn new(hooks: Vec<Box<dyn Hook>>) -> Self {
		Hooks(hooks)
	}

	/// Runs each hook in order on the output of the previous one, stopping at the first failure.
	pub fn apply(&self, options: RequestOptions) -> anyhow::Result<RequestOptions> {
		self.0.iter().try_fold(options, |options, hook| hook.apply(options))
	}
}

impl std::fmt::Debug for Hooks {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Hooks({})", self.0.len())
	}
}

#[cfg(test)]
mod tests {
	fn push_header(value: &'static str) -> Box<dyn super::Hook> {
		Box::new(move |mut options: super::RequestOptions| -> anyhow::Result<super::RequestOptions> {
			options.headers.append("x-trace", http_common::HeaderValue::from_static(value));
			Ok(options)
		})
	}

	#[test]
	fn hooks_run_in_order() {
		let hooks = super::Hooks::new(vec![push_header("a"), push_header("b"), push_header("c")]);
		let options = hooks.apply(super::RequestOptions::get(["servers"])).unwrap();
		let trace: Vec<_> = options.headers.get_all("x-trace").iter().map(|value| value.to_str().unwrap()).collect();
		assert_eq!(trace, ["a", "b", "c"]);
	}

	fn fail(message: &'static str) -> Box<dyn super::Hook> {
		Box::new(move |_: super::RequestOptions| -> anyhow::Result<super::RequestOptions> { Err(anyhow::anyhow!(message)) })
	}

	fn must_not_run() -> Box<dyn super::Hook> {
		Box::new(|_: super::RequestOptions| -> anyhow::Result<super::RequestOptions> { panic!("hook after a failing hook must not run") })
	}

	#[test]
	fn failing_hook_stops_chain() {
		let hooks = super::Hooks::new(vec![push_header("a"), fail("no credentials"), must_not_run()]);
		let err = hooks.apply(super::RequestOptions::get(["servers"])).unwrap_err();
		assert_eq!(err.to_string(), "no credentials");
	}

	#[test]
	fn with_body_sets_content_headers() {
		let options =
			super::RequestOptions::new(http_common::Method::POST, ["servers"])
			.with_body(http_common::HeaderValue::from_static("application/xml"), "<Server>é</Server>");
		assert_eq!(options.headers[http_common::CONTENT_TYPE], "application/xml");
		// Byte length, not character count.
		assert_eq!(options.headers[http_common::CONTENT_LENGTH], "19");
		assert_eq!(options.body.as_deref(), Some(&b"<Server>\xc3\xa9</Server>"[..]));
	}
}
