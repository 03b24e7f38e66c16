//! Firewall rule round trips against an in-memory stand-in for the SQL Database management API.

const SUBSCRIPTION_ID: &str = "azure-account-subscription-id";

#[derive(Default)]
struct FakeManagementApi {
	rules: std::sync::Mutex<std::collections::BTreeMap<(String, String), (String, String)>>,
}

impl FakeManagementApi {
	fn handle(&self, req: &http_common::Request<http_common::Bytes>) -> http_common::Response {
		assert!(req.extensions().get::<std::sync::Arc<http_common::ClientIdentity>>().is_some());
		assert_eq!(req.headers()["x-ms-version"], "1.0");

		let path = req.uri().path().strip_prefix(&format!("/{SUBSCRIPTION_ID}/")).unwrap();
		let segments: Vec<_> = path.split('/').collect();
		let mut rules = self.rules.lock().unwrap();

		match (req.method().as_str(), &segments[..]) {
			("PUT", ["servers", server, "firewallrules", rule]) => {
				let body = xml2::parse(std::str::from_utf8(req.body()).unwrap()).unwrap();
				let start = body.get_text("StartIpAddress").unwrap().to_owned();
				let end = body.get_text("EndIpAddress").unwrap().to_owned();
				rules.insert(((*server).to_owned(), (*rule).to_owned()), (start, end));
				response(http_common::StatusCode::OK, String::new())
			},

			("GET", ["servers", server, "firewallrules"]) => {
				let mut body = "<FirewallRules xmlns=\"http://schemas.microsoft.com/sqlazure/2010/12/\">".to_owned();
				for ((rule_server, rule), (start, end)) in rules.iter() {
					if rule_server.as_str() == *server {
						body.push_str(&format!(
							"<FirewallRule><Name>{rule}</Name><StartIpAddress>{start}</StartIpAddress><EndIpAddress>{end}</EndIpAddress></FirewallRule>",
						));
					}
				}
				body.push_str("</FirewallRules>");
				response(http_common::StatusCode::OK, body)
			},

			("DELETE", ["servers", server, "firewallrules", rule]) =>
				match rules.remove(&((*server).to_owned(), (*rule).to_owned())) {
					Some(_) => response(http_common::StatusCode::OK, String::new()),
					None => response(http_common::StatusCode::NOT_FOUND, String::new()),
				},

			_ => panic!("unexpected request {} {}", req.method(), req.uri()),
		}
	}
}

fn response(status: http_common::StatusCode, body: String) -> http_common::Response {
	http_common::Response {
		status,
		headers: Default::default(),
		body: body.into(),
	}
}

struct Transport(std::sync::Arc<FakeManagementApi>);

impl http_common::Transport for Transport {
	fn send(&self, req: http_common::Request<http_common::Bytes>) -> futures_util::future::BoxFuture<'_, anyhow::Result<http_common::Response>> {
		let response = self.0.handle(&req);
		Box::pin(std::future::ready(Ok(response)))
	}
}

fn client() -> azure::database::sql_server::Client {
	let identity = std::sync::Arc::new(http_common::ClientIdentity {
		certificate_chain: vec![http_common::CertificateDer::from(vec![0x30, 0x00])],
		private_key: http_common::PrivateKeyDer::Pkcs8(vec![0x30, 0x01, 0x02].into()),
	});
	let transport = Transport(Default::default());
	azure::database::sql_server::Client::new(None, SUBSCRIPTION_ID, identity, Box::new(transport), log2::Logger::new("test")).unwrap()
}

fn rule_options(rule_name: &str) -> azure::database::sql_server::FirewallRuleOptions {
	azure::database::sql_server::FirewallRuleOptions {
		id: Some("npm0lusisu".to_owned()),
		rule_name: Some(rule_name.to_owned()),
		start_ip_address: Some("192.168.1.1".to_owned()),
		end_ip_address: Some("192.168.1.2".to_owned()),
	}
}

#[tokio::test]
async fn firewall_rule_round_trip() {
	let client = client();

	assert!(client.list_server_firewall_rules(&"npm0lusisu".into()).await.unwrap().is_empty());

	let status = client.create_server_firewall_rule(&rule_options("r1")).await.unwrap();
	assert_eq!(status.status_code, 200);

	let rules = client.list_server_firewall_rules(&"npm0lusisu".into()).await.unwrap();
	assert_eq!(rules, [azure::database::sql_server::FirewallRule {
		rule_name: "r1".to_owned(),
		server_id: "npm0lusisu".to_owned(),
		start_ip_address: Some("192.168.1.1".to_owned()),
		end_ip_address: Some("192.168.1.2".to_owned()),
	}]);

	assert!(client.delete_firewall_rule(&rule_options("r1")).await.unwrap());

	assert!(client.list_server_firewall_rules(&"npm0lusisu".into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn rules_are_per_server() {
	let client = client();

	client.create_server_firewall_rule(&rule_options("a")).await.unwrap();
	client.create_server_firewall_rule(&rule_options("b")).await.unwrap();
	client.create_server_firewall_rule(&azure::database::sql_server::FirewallRuleOptions {
		id: Some("otherserver".to_owned()),
		..rule_options("c")
	}).await.unwrap();

	let rules = client.list_server_firewall_rules(&"npm0lusisu".into()).await.unwrap();
	let names: Vec<_> = rules.iter().map(|rule| rule.rule_name.as_str()).collect();
	assert_eq!(names, ["a", "b"]);
}

#[tokio::test]
async fn deleting_missing_rule_fails() {
	let client = client();

	let err = client.delete_firewall_rule(&rule_options("missing")).await.unwrap_err();
	let provider_common::Error::Status(err) = err else { panic!("{err:?}") };
	assert_eq!(err.status, http_common::StatusCode::NOT_FOUND);
	assert_eq!(err.message, "azure Error (404): Item not found");
	assert_eq!(err.result, serde_json::json!({ "err": "" }));
}
