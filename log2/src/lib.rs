/// Emits structured JSON records through the `log` facade.
///
/// Every record carries the logger's source, so that records from multiple provider clients can be told apart.
#[derive(Clone, Debug)]
pub struct Logger {
	source: std::sync::Arc<str>,
}

impl Logger {
	pub fn new(source: &str) -> Self {
		Logger {
			source: source.into(),
		}
	}

	pub fn report_error(&self, err: &(dyn std::error::Error + 'static)) {
		let mut exception = err.to_string();
		let mut source = err.source();
		while let Some(err) = source {
			exception.push_str(": ");
			exception.push_str(&err.to_string());
			source = err.source();
		}

		self.report_inner(Report::Error { exception: &exception });
	}

	pub fn report_message(&self, message: &str) {
		self.report_inner(Report::Message { message });
	}

	pub async fn report_operation<F>(&self, object_type: &str, object_id: &str, operation: ScopedObjectOperation<'_>, f: F) -> F::Output
	where
		F: std::future::Future,
		F::Output: std::fmt::Debug,
	{
		match operation {
			ScopedObjectOperation::Create { value } => {
				self.report_inner(Report::ObjectOperation { r#type: object_type, id: object_id, operation: ObjectOperation::CreateStart { value } });
				let result = f.await;
				self.report_inner(Report::ObjectOperation { r#type: object_type, id: object_id, operation: ObjectOperation::CreateEnd });
				result
			},

			ScopedObjectOperation::Delete => {
				self.report_inner(Report::ObjectOperation { r#type: object_type, id: object_id, operation: ObjectOperation::DeleteStart });
				let result = f.await;
				self.report_inner(Report::ObjectOperation { r#type: object_type, id: object_id, operation: ObjectOperation::DeleteEnd });
				result
			},

			ScopedObjectOperation::Get => {
				self.report_inner(Report::ObjectOperation { r#type: object_type, id: object_id, operation: ObjectOperation::GetStart });
				let result = f.await;
				self.report_inner(Report::ObjectOperation { r#type: object_type, id: object_id, operation: ObjectOperation::GetEnd { value: &format!("{result:?}") } });
				result
			},
		}
	}

	pub fn report_state(&self, object_type: &str, object_id: &str, state: &str) {
		self.report_inner(Report::ObjectState { r#type: object_type, id: object_id, state });
	}

	fn report_inner(&self, report: Report<'_>) {
		let record = Record {
			timestamp: chrono::Utc::now(),
			source: &self.source,
			report,
		};

		let level = if matches!(report, Report::Error { .. }) { log::Level::Error } else { log::Level::Info };

		match serde_json::to_string(&record) {
			Ok(record) => log::log!(level, "{record}"),
			Err(err) => log::log!(level, "{report:?} (could not serialize log record: {err})"),
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub enum ScopedObjectOperation<'a> {
	Create { value: &'a str },
	Delete,
	Get,
}

/// Wraps a value so that it is masked in debug output.
#[derive(Clone, serde::Deserialize)]
pub struct Secret<T>(pub T);

impl<T> std::fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("******")
	}
}

struct Record<'a> {
	timestamp: chrono::DateTime<chrono::Utc>,
	source: &'a str,
	report: Report<'a>,
}

#[derive(Clone, Copy, Debug)]
enum Report<'a> {
	Error {
		exception: &'a str,
	},

	Message {
		message: &'a str,
	},

	ObjectOperation {
		r#type: &'a str,
		id: &'a str,
		operation: ObjectOperation<'a>,
	},

	ObjectState {
		r#type: &'a str,
		id: &'a str,
		state: &'a str,
	},
}

#[derive(Clone, Copy, Debug)]
enum ObjectOperation<'a> {
	CreateStart { value: &'a str },
	CreateEnd,

	DeleteStart,
	DeleteEnd,

	GetStart,
	GetEnd { value: &'a str },
}

impl serde::Serialize for Record<'_> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: serde::Serializer {
		use serde::ser::SerializeMap;

		let Record {
			timestamp,
			source,
			report,
		} = self;

		let mut serializer = serializer.serialize_map(None)?;

		serializer.serialize_entry("TimeCollected", &timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))?;
		serializer.serialize_entry("Source", source)?;

		match report {
			Report::Error { exception } => {
				serializer.serialize_entry("Level", "Error")?;
				serializer.serialize_entry("Exception", exception)?;
			},

			Report::Message { message } => {
				serializer.serialize_entry("Level", "Information")?;
				serializer.serialize_entry("Message", message)?;
			},

			Report::ObjectOperation { r#type, id, operation } => {
				serializer.serialize_entry("Level", "Information")?;
				serializer.serialize_entry("ObjectType", r#type)?;
				serializer.serialize_entry("ObjectId", id)?;
				match operation {
					ObjectOperation::CreateStart { value } => {
						serializer.serialize_entry("ObjectOperation", "CreateStart")?;
						serializer.serialize_entry("ObjectValue", value)?;
					},

					ObjectOperation::CreateEnd => serializer.serialize_entry("ObjectOperation", "CreateEnd")?,

					ObjectOperation::DeleteStart => serializer.serialize_entry("ObjectOperation", "DeleteStart")?,

					ObjectOperation::DeleteEnd => serializer.serialize_entry("ObjectOperation", "DeleteEnd")?,

					ObjectOperation::GetStart => serializer.serialize_entry("ObjectOperation", "GetStart")?,

					ObjectOperation::GetEnd { value } => {
						serializer.serialize_entry("ObjectOperation", "GetEnd")?;
						serializer.serialize_entry("ObjectValue", value)?;
					},
				}
			},

			Report::ObjectState { r#type, id, state } => {
				serializer.serialize_entry("Level", "Information")?;
				serializer.serialize_entry("ObjectType", r#type)?;
				serializer.serialize_entry("ObjectId", id)?;
				serializer.serialize_entry("ObjectState", state)?;
			},
		}

		serializer.end()
	}
}
