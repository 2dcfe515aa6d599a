mod common;

use common::dabcat_cmd;
use common::write_app;
use dabcat_core::AnyEmptyResult;

const FIXTURE: &str = r#"[
	{
		"data": {"ip": "***ip***", "host": "HOST"},
		"summary": {"total_objects": 1},
		"message": "Lookup complete"
	}
]"#;

#[test]
fn fixture_replays_with_map_and_params() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let app = write_app(tmp.path())?;
	let fixture = tmp.path().join("lookup.json");
	std::fs::write(&fixture, FIXTURE)?;

	let output = dabcat_cmd()
		.arg("fixture")
		.arg(&fixture)
		.arg("--param")
		.arg("ip=10.0.0.1")
		.arg("--path")
		.arg(&app)
		.output()?;
	assert!(output.status.success());

	let response: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(
		response,
		serde_json::json!({
			"summary": { "total_objects": 1 },
			"message": "Lookup complete",
			"data": [{ "ip": "10.0.0.1", "host": "web01" }]
		})
	);

	Ok(())
}

#[test]
fn fixture_fails_on_missing_param() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let app = write_app(tmp.path())?;
	let fixture = tmp.path().join("lookup.json");
	std::fs::write(&fixture, FIXTURE)?;

	dabcat_cmd()
		.arg("fixture")
		.arg(&fixture)
		.arg("--path")
		.arg(&app)
		.assert()
		.failure()
		.code(2)
		.stderr(predicates::str::contains("dabcat::missing_parameter"));

	Ok(())
}

#[test]
fn fixture_rejects_malformed_payload() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let app = write_app(tmp.path())?;
	let fixture = tmp.path().join("lookup.json");
	std::fs::write(&fixture, r#"[{"message": "no data"}]"#)?;

	dabcat_cmd()
		.arg("fixture")
		.arg(&fixture)
		.arg("--path")
		.arg(&app)
		.assert()
		.failure()
		.stderr(predicates::str::contains("dabcat::malformed_payload"));

	Ok(())
}

#[test]
fn fixture_rejects_bad_param_syntax() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let fixture = tmp.path().join("lookup.json");
	std::fs::write(&fixture, FIXTURE)?;

	dabcat_cmd()
		.arg("fixture")
		.arg(&fixture)
		.arg("--param")
		.arg("novalue")
		.assert()
		.failure()
		.stderr(predicates::str::contains("expected KEY=VALUE"));

	Ok(())
}
