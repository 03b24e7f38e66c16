use anyhow::Context;

/// Authenticates requests with a personal access token.
pub struct Token {
	authorization: http_common::HeaderValue,
}

impl Token {
	pub fn new(api_key: &str) -> anyhow::Result<Self> {
		let mut authorization: http_common::HeaderValue =
			format!("Bearer {api_key}")
			.try_into().context("API key is not a valid header value")?;
		authorization.set_sensitive(true);
		Ok(Token { authorization })
	}
}

impl provider_common::Hook for Token {
	fn apply(&self, options: provider_common::RequestOptions) -> anyhow::Result<provider_common::RequestOptions> {
		Ok(options.with_header(http_common::AUTHORIZATION, self.authorization.clone()))
	}
}

impl std::fmt::Debug for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Token").finish_non_exhaustive()
	}
}
