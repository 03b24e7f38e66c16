/// A Linode plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Flavor {
	pub id: &'static str,
	pub name: &'static str,

	/// In MiB.
	pub ram: u32,

	/// In GiB.
	pub disk: u32,
}

pub const DEFAULT_FLAVOR: &str = "Linode 512";

const FLAVORS: &[Flavor] = &[
	flavor("Linode 512", 512, 24),
	flavor("Linode 1024", 1024, 48),
	flavor("Linode 2048", 2 * 1024, 96),
	flavor("Linode 4GB", 4 * 1024, 192),
	flavor("Linode 8GB", 8 * 1024, 384),
	flavor("Linode 12GB", 12 * 1024, 576),
	flavor("Linode 16GB", 16 * 1024, 768),
	flavor("Linode 20GB", 20 * 1024, 960),
];

const fn flavor(name: &'static str, ram: u32, disk: u32) -> Flavor {
	Flavor { id: name, name, ram, disk }
}

pub fn flavors() -> &'static [Flavor] {
	FLAVORS
}

/// Looks up a flavor by name, or [`DEFAULT_FLAVOR`] if `name` is `None`.
pub fn get_flavor(name: Option<&str>) -> Result<Flavor, provider_common::Error> {
	let name = name.unwrap_or(DEFAULT_FLAVOR);
	FLAVORS.iter()
		.find(|flavor| flavor.name == name)
		.copied()
		.ok_or_else(|| provider_common::Error::NoSuchResource { kind: "Linode flavor", id: name.to_owned() })
}

#[cfg(test)]
mod tests {
	#[test]
	fn get_flavor() {
		assert_eq!(super::get_flavor(None).unwrap(), super::Flavor { id: "Linode 512", name: "Linode 512", ram: 512, disk: 24 });
		assert_eq!(super::get_flavor(Some("Linode 4GB")).unwrap().ram, 4096);
		assert_eq!(super::get_flavor(Some("Linode 20GB")).unwrap().disk, 960);

		let err = super::get_flavor(Some("Linode 64GB")).unwrap_err();
		assert_eq!(err.to_string(), "no such Linode flavor: Linode 64GB");
	}

	#[test]
	fn flavors() {
		let flavors = super::flavors();
		assert_eq!(flavors.len(), 8);
		assert!(flavors.windows(2).all(|pair| pair[0].ram < pair[1].ram && pair[0].disk < pair[1].disk));
	}
}
