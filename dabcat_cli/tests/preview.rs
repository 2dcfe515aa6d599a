mod common;

use std::path::Path;
use std::path::PathBuf;

use common::dabcat_cmd;
use dabcat_core::AnyEmptyResult;
use rstest::rstest;

const RECORDS: &str = r#"[
	{
		"name": "lookup ip",
		"artifacts": [
			{"name": "Matching Criteria", "cef": {"ip": "10.0.0.1", "dummy_file_vault_id": "vault-match"}},
			{"name": "Network Artifact", "cef": {"sourceAddress": "10.0.0.1"}}
		]
	},
	{
		"name": "lookup ip default",
		"artifacts": [
			{"name": "Matching Criteria", "cef": {"dummy_default": true, "dummy_file_vault_id": "vault-default"}}
		]
	}
]"#;

fn write_records(dir: &Path) -> std::io::Result<PathBuf> {
	let path = dir.join("records.json");
	std::fs::write(&path, RECORDS)?;
	Ok(path)
}

#[rstest]
#[case::matching("10.0.0.1", "matching:", "vault-match")]
#[case::default("10.0.0.2", "default:", "vault-default")]
fn preview_selects_record(
	#[case] ip: &str,
	#[case] branch: &str,
	#[case] vault: &str,
) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let records = write_records(tmp.path())?;

	dabcat_cmd()
		.arg("preview")
		.arg("--records")
		.arg(&records)
		.arg("--action")
		.arg("lookup_ip")
		.arg("--param")
		.arg(format!("ip={ip}"))
		.assert()
		.success()
		.stdout(predicates::str::contains(branch))
		.stdout(predicates::str::contains(vault))
		.stdout(predicates::str::contains("respond with the selected data"));

	Ok(())
}

#[test]
fn preview_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let records = write_records(tmp.path())?;

	let output = dabcat_cmd()
		.arg("preview")
		.arg("--records")
		.arg(&records)
		.arg("--action")
		.arg("lookup_ip")
		.arg("--param")
		.arg("ip=10.0.0.1")
		.arg("--format")
		.arg("json")
		.output()?;
	assert!(output.status.success());

	let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(report["action"], "lookup_ip");
	assert_eq!(report["selection"]["branch"], "matching");
	assert_eq!(
		report["selection"]["artifact"]["cef"]["dummy_file_vault_id"],
		"vault-match"
	);
	assert_eq!(
		report["selection"]["secondaries"][0]["name"],
		"Network Artifact"
	);
	assert_eq!(report["outcome"]["outcome"], "respond");

	Ok(())
}

#[rstest]
#[case::fail_fast("true", "fail with \"There is no data for polling action\"")]
#[case::fall_through("false", "run the app's own action code")]
fn preview_without_data(#[case] fail: &str, #[case] expected: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let records = write_records(tmp.path())?;

	dabcat_cmd()
		.arg("preview")
		.arg("--records")
		.arg(&records)
		.arg("--action")
		.arg("on_poll")
		.arg("--fail-on-not-found")
		.arg(fail)
		.assert()
		.success()
		.stdout(predicates::str::contains("no record answers this action"))
		.stdout(predicates::str::contains(expected));

	Ok(())
}

#[rstest]
#[case::from_config(None, "fail with \"There is no data for polling action\"")]
#[case::flag_overrides_config(Some("false"), "run the app's own action code")]
fn preview_reads_fail_option_from_config(
	#[case] flag: Option<&str>,
	#[case] expected: &str,
) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let records = write_records(tmp.path())?;
	std::fs::write(tmp.path().join("dabcat.toml"), "fail_on_not_found = true\n")?;

	let mut command = dabcat_cmd();
	command
		.arg("preview")
		.arg("--path")
		.arg(tmp.path())
		.arg("--records")
		.arg(&records)
		.arg("--action")
		.arg("on_poll");
	if let Some(flag) = flag {
		command.arg("--fail-on-not-found").arg(flag);
	}

	command
		.assert()
		.success()
		.stdout(predicates::str::contains(expected));

	Ok(())
}
