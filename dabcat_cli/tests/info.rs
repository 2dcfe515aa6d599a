mod common;

use common::dabcat_cmd;
use common::write_app;
use dabcat_core::AnyEmptyResult;

#[test]
fn info_lists_discovered_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let app = write_app(tmp.path())?;

	dabcat_cmd()
		.arg("info")
		.arg("--path")
		.arg(&app)
		.assert()
		.success()
		.stdout(predicates::str::contains("example_connector.py"))
		.stdout(predicates::str::contains("replacerizer.json"))
		.stdout(predicates::str::contains("line 14"))
		.stdout(predicates::str::contains("Example App DEV"))
		.stdout(predicates::str::contains("example_app_dev_dummy"));

	Ok(())
}

#[test]
fn info_json_reports_settings() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let app = write_app(tmp.path())?;
	std::fs::write(
		app.join("dabcat.toml"),
		"fail_on_not_found = true\n\n[app]\nappid = \"dev-id\"\n",
	)?;

	let output = dabcat_cmd()
		.arg("info")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(&app)
		.output()?;
	assert!(output.status.success());

	let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(report["files"]["connector"], "example_connector.py");
	assert_eq!(report["files"]["metadata"], "example.json");
	assert_eq!(report["anchors"], 1);
	assert_eq!(report["anchor_line"], 14);
	assert_eq!(report["previously_augmented"], false);
	assert_eq!(report["settings"]["name"], "Example App DEV");
	assert_eq!(report["settings"]["product_name"], "Example DEV");
	assert_eq!(report["settings"]["appid"], "dev-id");
	assert_eq!(report["settings"]["fail_on_not_found"], true);

	Ok(())
}

#[test]
fn info_without_connector() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	dabcat_cmd()
		.arg("info")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("(not found)"));

	Ok(())
}
