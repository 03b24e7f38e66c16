use anyhow::Context;

/// Authenticates Service Management API requests with a management certificate.
///
/// The certificate is presented as the TLS client certificate, so this only marks the request with it.
#[derive(Debug)]
pub struct ManagementCertificate {
	identity: std::sync::Arc<http_common::ClientIdentity>,
	version: http_common::HeaderValue,
}

impl ManagementCertificate {
	pub fn new(identity: std::sync::Arc<http_common::ClientIdentity>, version: &'static str) -> Self {
		ManagementCertificate {
			identity,
			version: http_common::HeaderValue::from_static(version),
		}
	}
}

impl provider_common::Hook for ManagementCertificate {
	fn apply(&self, mut options: provider_common::RequestOptions) -> anyhow::Result<provider_common::RequestOptions> {
		options.extensions.insert(self.identity.clone());
		options.headers.insert(X_MS_VERSION, self.version.clone());
		Ok(options)
	}
}

/// Signs Table service requests with the storage account's access key.
///
/// Ref: <https://learn.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#shared-key-lite-and-table-service-format-for-2009-09-19-and-later>
pub struct SharedKeyLite {
	account: String,
	key: Vec<u8>,
	version: http_common::HeaderValue,
}

impl SharedKeyLite {
	/// `key` is the base64-encoded access key, as shown in the portal.
	pub fn new(account: String, key: &str, version: &'static str) -> anyhow::Result<Self> {
		let key =
			base64::Engine::decode(&base64::engine::general_purpose::STANDARD, key)
			.context("storage access key is not valid base64")?;

		Ok(SharedKeyLite {
			account,
			key,
			version: http_common::HeaderValue::from_static(version),
		})
	}

	fn authorization(&self, x_ms_date: &str, path: &[String]) -> anyhow::Result<String> {
		let mut signature_input = format!("{x_ms_date}\n/{}", self.account);
		provider_common::push_path(&mut signature_input, path);

		let mut signer: hmac::Hmac<sha2::Sha256> = hmac::Mac::new_from_slice(&self.key).context("could not create signer")?;
		hmac::Mac::update(&mut signer, signature_input.as_bytes());
		let signature = hmac::Mac::finalize(signer).into_bytes();
		let signature = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, signature);

		Ok(format!("SharedKeyLite {}:{signature}", self.account))
	}
}

impl std::fmt::Debug for SharedKeyLite {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SharedKeyLite")
			.field("account", &self.account)
			.field("key", &format_args!("******"))
			.finish_non_exhaustive()
	}
}

impl provider_common::Hook for SharedKeyLite {
	fn apply(&self, mut options: provider_common::RequestOptions) -> anyhow::Result<provider_common::RequestOptions> {
		let x_ms_date = x_ms_date(chrono::Utc::now());
		let authorization = self.authorization(&x_ms_date, &options.path)?;

		options.headers.insert(X_MS_DATE, x_ms_date.try_into().context("could not create x-ms-date header")?);
		options.headers.insert(X_MS_VERSION, self.version.clone());
		options.headers.insert(http_common::AUTHORIZATION, authorization.try_into().context("could not create authorization header")?);
		Ok(options)
	}
}

#[allow(clippy::declare_interior_mutable_const)] // Clippy doesn't like const http::HeaderName
const X_MS_DATE: http_common::HeaderName = http_common::HeaderName::from_static("x-ms-date");
#[allow(clippy::declare_interior_mutable_const)]
const X_MS_VERSION: http_common::HeaderName = http_common::HeaderName::from_static("x-ms-version");

// Ref: https://tools.ietf.org/html/rfc822#section-5.1
//
// chrono's `to_rfc2822()` comes close, but it uses `+0000` at the end instead of `GMT` which Azure doesn't like.
fn x_ms_date(now: chrono::DateTime<chrono::Utc>) -> String {
	now.format_with_items([
		chrono::format::Item::Fixed(chrono::format::Fixed::ShortWeekdayName),
		chrono::format::Item::Literal(", "),
		chrono::format::Item::Numeric(chrono::format::Numeric::Day, chrono::format::Pad::Zero),
		chrono::format::Item::Literal(" "),
		chrono::format::Item::Fixed(chrono::format::Fixed::ShortMonthName),
		chrono::format::Item::Literal(" "),
		chrono::format::Item::Numeric(chrono::format::Numeric::Year, chrono::format::Pad::Zero),
		chrono::format::Item::Literal(" "),
		chrono::format::Item::Numeric(chrono::format::Numeric::Hour, chrono::format::Pad::Zero),
		chrono::format::Item::Literal(":"),
		chrono::format::Item::Numeric(chrono::format::Numeric::Minute, chrono::format::Pad::Zero),
		chrono::format::Item::Literal(":"),
		chrono::format::Item::Numeric(chrono::format::Numeric::Second, chrono::format::Pad::Zero),
		chrono::format::Item::Literal(" GMT"),
	].iter()).to_string()
}

#[cfg(test)]
mod tests {
	use provider_common::Hook;

	#[test]
	fn x_ms_date() {
		let now = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2019, 3, 7, 9, 5, 2).unwrap();
		assert_eq!(super::x_ms_date(now), "Thu, 07 Mar 2019 09:05:02 GMT");
	}

	#[test]
	fn management_certificate() {
		let identity = std::sync::Arc::new(http_common::ClientIdentity {
			certificate_chain: vec![http_common::CertificateDer::from(vec![0x30, 0x00])],
			private_key: http_common::PrivateKeyDer::Pkcs8(vec![0x30, 0x01, 0x02].into()),
		});
		let hook = super::ManagementCertificate::new(identity.clone(), "1.0");

		// Applying twice leaves the request the same as applying once.
		let options = hook.apply(provider_common::RequestOptions::get(["servers"])).unwrap();
		let options = hook.apply(options).unwrap();

		assert_eq!(options.headers.get_all("x-ms-version").iter().count(), 1);
		assert_eq!(options.headers["x-ms-version"], "1.0");
		let attached = options.extensions.get::<std::sync::Arc<http_common::ClientIdentity>>().unwrap();
		assert!(std::sync::Arc::ptr_eq(attached, &identity));
	}

	#[test]
	fn shared_key_lite() {
		let key = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b"secret key");
		let hook = super::SharedKeyLite::new("myaccount".to_owned(), &key, "2019-02-02").unwrap();

		let options = hook.apply(provider_common::RequestOptions::get(["Tables('mytable')"])).unwrap();
		assert_eq!(options.headers["x-ms-version"], "2019-02-02");

		let x_ms_date = options.headers["x-ms-date"].to_str().unwrap();
		assert!(x_ms_date.ends_with(" GMT"), "{x_ms_date}");

		let mut signer: hmac::Hmac<sha2::Sha256> = hmac::Mac::new_from_slice(b"secret key").unwrap();
		hmac::Mac::update(&mut signer, format!("{x_ms_date}\n/myaccount/Tables('mytable')").as_bytes());
		let expected = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, hmac::Mac::finalize(signer).into_bytes());
		assert_eq!(options.headers[http_common::AUTHORIZATION], format!("SharedKeyLite myaccount:{expected}"));

		assert!(!format!("{hook:?}").contains(&key));
	}

	#[test]
	fn shared_key_lite_signs_escaped_path() {
		let key = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b"secret key");
		let hook = super::SharedKeyLite::new("myaccount".to_owned(), &key, "2019-02-02").unwrap();

		let options = hook.apply(provider_common::RequestOptions::get(["Tables('my table#1')"])).unwrap();
		let x_ms_date = options.headers["x-ms-date"].to_str().unwrap();

		let mut signer: hmac::Hmac<sha2::Sha256> = hmac::Mac::new_from_slice(b"secret key").unwrap();
		hmac::Mac::update(&mut signer, format!("{x_ms_date}\n/myaccount/Tables('my%20table%231')").as_bytes());
		let expected = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, hmac::Mac::finalize(signer).into_bytes());
		assert_eq!(options.headers[http_common::AUTHORIZATION], format!("SharedKeyLite myaccount:{expected}"));
	}

	#[test]
	fn shared_key_lite_invalid_key() {
		let err = super::SharedKeyLite::new("myaccount".to_owned(), "not base64!", "2019-02-02").unwrap_err();
		assert_eq!(err.to_string(), "storage access key is not valid base64");
	}
}
