use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::dispatch::ConfigArtifact;
use crate::dispatch::ConfigContainer;

pub const SAMPLE_CONNECTOR: &str = r#"# File: example_connector.py
import phantom.app as phantom
from phantom.base_connector import BaseConnector
from phantom.action_result import ActionResult

import requests
import json


class ExampleConnector(BaseConnector):

    def __init__(self):
        super(ExampleConnector, self).__init__()

    def handle_action(self, param):
        ret_val = phantom.APP_SUCCESS
        action_id = self.get_action_identifier()
        return ret_val


if __name__ == '__main__':
    pass
"#;

/// Everything in [`SAMPLE_CONNECTOR`] up to and including the anchor line.
pub const SAMPLE_CONNECTOR_PREFIX: &str = r#"# File: example_connector.py
import phantom.app as phantom
from phantom.base_connector import BaseConnector
from phantom.action_result import ActionResult

import requests
import json


class ExampleConnector(BaseConnector):

    def __init__(self):
        super(ExampleConnector, self).__init__()

    def handle_action(self, param):
"#;

pub const SAMPLE_METADATA: &str = r#"{
    "appid": "6f2a7a3c-1111-4c0e-9a55-000000000001",
    "name": "Example App",
    "description": "An example app",
    "product_name": "Example",
    "main_module": "example_connector.py"
}"#;

pub fn cef(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(map) => map,
		_ => Map::new(),
	}
}

pub fn params(value: Value) -> Map<String, Value> {
	cef(value)
}

pub fn criteria(value: Value) -> ConfigArtifact {
	ConfigArtifact::new("Matching Criteria", cef(value))
}

pub fn secondary(name: &str) -> ConfigArtifact {
	ConfigArtifact::new(name, cef(json!({ "sourceAddress": "10.0.0.1" })))
}

pub fn container(artifacts: Vec<ConfigArtifact>) -> ConfigContainer {
	ConfigContainer {
		name: None,
		artifacts,
	}
}

/// One container with an `x = "1"` criteria record and one holding the
/// default record.
pub fn matching_and_default_containers() -> Vec<ConfigContainer> {
	vec![
		container(vec![
			criteria(json!({ "x": "1", "dummy_file_vault_id": "vault-match" })),
			secondary("Matched Extra"),
		]),
		container(vec![
			criteria(json!({ "dummy_default": true, "dummy_file_vault_id": "vault-default" })),
			secondary("Default Extra"),
		]),
	]
}
