//! A [`http_common::Transport`] that replays canned responses instead of going over the network.

/// A request as it was handed to the transport.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: http_common::Method,
	pub uri: http_common::Uri,
	pub headers: http_common::HeaderMap,
	pub body: http_common::Bytes,
	pub extensions: http_common::Extensions,
}

impl RecordedRequest {
	pub fn body_str(&self) -> &str {
		std::str::from_utf8(&self.body).unwrap_or_default()
	}
}

#[derive(Default)]
struct State {
	replies: std::collections::VecDeque<anyhow::Result<http_common::Response>>,
	requests: Vec<RecordedRequest>,
}

/// Clones share the same queue of replies and the same log of requests.
#[derive(Clone, Default)]
pub struct MockTransport {
	state: std::sync::Arc<std::sync::Mutex<State>>,
}

impl MockTransport {
	pub fn new() -> Self {
		Default::default()
	}

	/// Queues a reply with the given status and body.
	#[must_use]
	pub fn reply(self, status: http_common::StatusCode, body: &str) -> Self {
		self.push(Ok(http_common::Response {
			status,
			headers: Default::default(),
			body: body.to_owned().into(),
		}))
	}

	/// Queues a reply with the given status and a JSON body.
	#[must_use]
	pub fn reply_json(self, status: http_common::StatusCode, body: &serde_json::Value) -> Self {
		let mut headers = http_common::HeaderMap::new();
		headers.insert(http_common::CONTENT_TYPE, http_common::HeaderValue::from_static("application/json"));
		self.push(Ok(http_common::Response {
			status,
			headers,
			body: body.to_string().into(),
		}))
	}

	/// Queues a transport-level failure.
	#[must_use]
	pub fn fail(self, message: &'static str) -> Self {
		self.push(Err(anyhow::anyhow!(message)))
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state().requests.clone()
	}

	fn push(self, reply: anyhow::Result<http_common::Response>) -> Self {
		self.state().replies.push_back(reply);
		self
	}

	fn state(&self) -> std::sync::MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
	}
}

impl http_common::Transport for MockTransport {
	fn send(&self, req: http_common::Request<http_common::Bytes>) -> futures_util::future::BoxFuture<'_, anyhow::Result<http_common::Response>> {
		let (parts, body) = req.into_parts();

		let mut state = self.state();
		state.requests.push(RecordedRequest {
			method: parts.method,
			uri: parts.uri,
			headers: parts.headers,
			body,
			extensions: parts.extensions,
		});
		let reply = state.replies.pop_front().unwrap_or_else(|| Err(anyhow::anyhow!("no reply queued for request")));
		drop(state);

		Box::pin(std::future::ready(reply))
	}
}
