#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("options.{0} is a required option")]
	MissingOption(&'static str),

	#[error("no path was provided")]
	NoPath,

	#[error("request hook failed")]
	Hook(#[source] anyhow::Error),

	#[error("could not construct request URL")]
	InvalidUrl(#[source] anyhow::Error),

	#[error("could not execute request")]
	Transport(#[source] anyhow::Error),

	#[error(transparent)]
	Status(#[from] StatusError),

	#[error("could not parse response")]
	Parse(#[source] anyhow::Error),

	#[error("invalid client configuration")]
	Config(#[source] anyhow::Error),

	#[error("no such {kind}: {id}")]
	NoSuchResource {
		kind: &'static str,
		id: String,
	},
}

/// A response whose status code is in the provider's failure-code table.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StatusError {
	pub provider: &'static str,
	pub status: http_common::StatusCode,
	pub fail_code: &'static str,
	pub message: String,

	/// The response body parsed as JSON, or `{ "err": body }` if it is not JSON.
	pub result: serde_json::Value,
}

impl StatusError {
	pub(crate) fn new(provider: &'static str, status: http_common::StatusCode, fail_code: &'static str, body: &[u8]) -> Self {
		let result =
			serde_json::from_slice(body)
			.unwrap_or_else(|_| serde_json::json!({ "err": String::from_utf8_lossy(body) }));

		StatusError {
			provider,
			status,
			fail_code,
			message: format!("{provider} Error ({}): {fail_code}", status.as_u16()),
			result,
		}
	}
}

#[cfg(test)]
mod tests {
	#[test]
	fn status_error_result() {
		let err = super::StatusError::new("azure", http_common::StatusCode::NOT_FOUND, "Item not found", br#"{"code":"ResourceNotFound"}"#);
		assert_eq!(err.to_string(), "azure Error (404): Item not found");
		assert_eq!(err.result, serde_json::json!({ "code": "ResourceNotFound" }));

		let err = super::StatusError::new("azure", http_common::StatusCode::CONFLICT, "Build in progress", b"<Error>busy</Error>");
		assert_eq!(err.result, serde_json::json!({ "err": "<Error>busy</Error>" }));
	}

	#[test]
	fn missing_option_message() {
		assert_eq!(super::Error::MissingOption("dbUsername").to_string(), "options.dbUsername is a required option");
	}
}
