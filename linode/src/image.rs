/// An image that a Linode can be deployed from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Image {
	pub id: String,
	pub name: String,
	pub created: Option<String>,
}

#[derive(serde::Deserialize)]
pub(crate) struct ImagesResponse {
	pub(crate) data: Vec<ImageResponse>,
}

#[derive(serde::Deserialize)]
pub(crate) struct ImageResponse {
	id: String,
	label: Option<String>,
	created: Option<String>,
}

impl From<ImageResponse> for Image {
	fn from(ImageResponse { id, label, created }: ImageResponse) -> Self {
		// Public image ids look like `linode/debian11`
		let name =
			label.filter(|label| !label.is_empty())
			.or_else(|| id.split('/').nth(1).map(ToOwned::to_owned))
			.unwrap_or_else(|| id.clone());

		Image {
			id,
			name,
			created,
		}
	}
}

#[cfg(test)]
mod tests {
	#[test]
	fn name_falls_back_to_id() {
		let response: super::ImagesResponse = serde_json::from_value(serde_json::json!({
			"data": [
				{ "id": "linode/debian11", "label": "Debian 11", "created": "2021-08-14T22:44:02" },
				{ "id": "linode/alpine3.18", "label": null, "created": null },
				{ "id": "private/12345", "label": "" },
				{ "id": "custom" },
			],
		})).unwrap();

		let images: Vec<super::Image> = response.data.into_iter().map(Into::into).collect();
		let names: Vec<_> = images.iter().map(|image| image.name.as_str()).collect();
		assert_eq!(names, ["Debian 11", "alpine3.18", "12345", "custom"]);
		assert_eq!(images[0].created.as_deref(), Some("2021-08-14T22:44:02"));
		assert_eq!(images[1].created, None);
	}
}
