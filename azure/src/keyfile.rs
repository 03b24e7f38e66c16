use anyhow::Context;

/// Reads a management certificate keyfile.
///
/// The file is PEM, with one or more `CERTIFICATE` blocks followed by (or preceded by) the private key of the first certificate
/// in PKCS#1, PKCS#8 or SEC1 form.
pub fn read_from_file(path: &std::path::Path) -> anyhow::Result<http_common::ClientIdentity> {
	let pem = std::fs::read(path).with_context(|| format!("could not read keyfile {}", path.display()))?;
	parse(&pem).with_context(|| format!("could not parse keyfile {}", path.display()))
}

pub fn parse(mut pem: &[u8]) -> anyhow::Result<http_common::ClientIdentity> {
	let certificate_chain: Vec<_> =
		rustls_pemfile::certs(&mut { pem })
		.collect::<Result<_, _>>()
		.context("could not parse certificate")?;
	if certificate_chain.is_empty() {
		return Err(anyhow::anyhow!("keyfile does not contain a certificate"));
	}

	let private_key =
		rustls_pemfile::private_key(&mut pem)
		.context("could not parse private key")?
		.context("keyfile does not contain a private key")?;

	Ok(http_common::ClientIdentity {
		certificate_chain,
		private_key,
	})
}
