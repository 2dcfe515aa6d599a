#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const CONNECTOR: &str = "import phantom.app as phantom
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
";

pub const METADATA: &str = r#"{
    "appid": "6f2a7a3c-1111-4c0e-9a55-000000000001",
    "name": "Example App",
    "product_name": "Example",
    "main_module": "example_connector.py"
}"#;

pub fn dabcat_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("dabcat"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// Write a minimal app into `dir` and return its path.
pub fn write_app(dir: &Path) -> std::io::Result<std::path::PathBuf> {
	let app = dir.join("app");
	std::fs::create_dir_all(&app)?;
	std::fs::write(app.join("example_connector.py"), CONNECTOR)?;
	std::fs::write(app.join("example.json"), METADATA)?;
	std::fs::write(app.join("replacerizer.json"), r#"{"HOST": "web01"}"#)?;
	Ok(app)
}
