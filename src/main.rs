use anyhow::Context;
use provider_common::DatabaseProvider;

const USAGE: &str = "usage: multicloud <operation> [<options JSON>]";

fn main() -> anyhow::Result<()> {
	log::set_boxed_logger(Box::new(GlobalLogger)).context("could not set global logger")?;
	log::set_max_level(log::LevelFilter::Info);

	let mut args = std::env::args().skip(1);
	let operation = args.next().context(USAGE)?;
	let options = args.next();

	let settings = std::env::var("SECRET_SETTINGS").context("could not read SECRET_SETTINGS env var")?;
	let settings: Settings = serde_json::from_str(&settings).context("could not parse SECRET_SETTINGS env var")?;

	let runtime =
		tokio::runtime::Builder::new_current_thread()
		.enable_io()
		.enable_time()
		.build()
		.context("could not create tokio runtime")?;
	let output = runtime.block_on(run(&settings, &operation, options.as_deref()))?;

	let output = serde_json::to_string_pretty(&output).context("could not serialize output")?;
	println!("{output}");

	Ok(())
}

/// The contents of the `SECRET_SETTINGS` env var.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
enum Settings {
	Azure(azure::database::Settings),
	Linode(linode::Settings),
}

async fn run(settings: &Settings, operation: &str, options: Option<&str>) -> anyhow::Result<serde_json::Value> {
	let user_agent = http_common::HeaderValue::from_static(concat!("multicloud/", env!("CARGO_PKG_VERSION")));

	let (logger, result) = match settings {
		Settings::Azure(settings) => {
			let logger = log2::Logger::new("azure");
			logger.report_message(&format!("running {operation}"));
			let result = async {
				let client = azure::database::Client::new(settings, user_agent, logger.clone())?;
				run_azure(&client, operation, options).await
			}.await;
			(logger, result)
		},

		Settings::Linode(settings) => {
			let logger = log2::Logger::new("linode");
			logger.report_message(&format!("running {operation}"));
			let result = async {
				let client = linode::Client::new(settings, user_agent, logger.clone())?;
				run_linode(&client, operation, options).await
			}.await;
			(logger, result)
		},
	};

	if let Err(err) = &result {
		logger.report_error(&**err);
	}

	result
}

async fn run_azure(client: &azure::database::Client, operation: &str, options: Option<&str>) -> anyhow::Result<serde_json::Value> {
	fn sql_server(client: &azure::database::Client) -> anyhow::Result<&azure::database::sql_server::Client> {
		client.as_sql_server().context("firewall rules are only supported for dbType AZURE_SQL")
	}

	let output = match operation {
		"version" => serde_json::to_value(client.version()),
		"create" => serde_json::to_value(client.create(&parse_options(options)?).await?),
		"list" => serde_json::to_value(client.list().await?),
		"remove" => serde_json::to_value(client.remove(&parse_options(options)?).await?),

		"create-firewall-rule" =>
			serde_json::to_value(sql_server(client)?.create_server_firewall_rule(&parse_options(options)?).await?),
		"create-firewall-rule-with-ip-detect" =>
			serde_json::to_value(sql_server(client)?.create_server_firewall_rule_with_ip_detect(&parse_options(options)?).await?),
		"list-firewall-rules" =>
			serde_json::to_value(sql_server(client)?.list_server_firewall_rules(&parse_options(options)?).await?),
		"delete-firewall-rule" =>
			serde_json::to_value(sql_server(client)?.delete_firewall_rule(&parse_options(options)?).await?),

		operation => return Err(anyhow::anyhow!("unknown azure operation {operation:?}")),
	};
	let output = output.context("could not serialize output")?;
	Ok(output)
}

async fn run_linode(client: &linode::Client, operation: &str, options: Option<&str>) -> anyhow::Result<serde_json::Value> {
	#[derive(serde::Deserialize)]
	struct GetFlavorOptions {
		name: Option<String>,
	}

	let output = match operation {
		"version" => serde_json::to_value(client.version()),
		"flavors" => serde_json::to_value(linode::flavors()),
		"get-flavor" => {
			let GetFlavorOptions { name } = parse_options(options)?;
			serde_json::to_value(linode::get_flavor(name.as_deref())?)
		},
		"list-images" => serde_json::to_value(client.list_images().await?),

		operation => return Err(anyhow::anyhow!("unknown linode operation {operation:?}")),
	};
	let output = output.context("could not serialize output")?;
	Ok(output)
}

fn parse_options<T>(options: Option<&str>) -> anyhow::Result<T> where T: serde::de::DeserializeOwned {
	serde_json::from_str(options.unwrap_or("{}")).context("could not parse options")
}

struct GlobalLogger;

impl log::Log for GlobalLogger {
	fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
		metadata.level() <= log::Level::Info
	}

	fn log(&self, record: &log::Record<'_>) {
		if !self.enabled(record.metadata()) {
			return;
		}

		let timestamp = chrono::Utc::now();
		let level = record.level();

		eprintln!("[{}] {:5} {}", timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true), level, record.args());
	}

	fn flush(&self) {
	}
}
