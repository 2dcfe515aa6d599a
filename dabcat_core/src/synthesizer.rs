use serde::Serialize;

use crate::DabcatError;
use crate::DabcatResult;
use crate::locator::IndentUnit;

const FRAGMENT_TEMPLATE_NAME: &str = "fragment.py";
const FRAGMENT_TEMPLATE: &str = include_str!("templates/fragment.py.j2");

/// Indentation width used by the embedded template for one nesting level.
const TEMPLATE_INDENT_WIDTH: usize = 4;

/// Generated lines sit one nesting level below the anchor, which is itself
/// one unit deep.
pub const FRAGMENT_BASE_DEPTH: usize = 2;

/// The action that replays archived containers instead of returning data.
pub const POLL_ACTION: &str = "on_poll";

/// Label of the containers that hold the dummy configuration records.
pub const CONFIG_LABEL: &str = "demo_configuration";

/// Normalised artifact name of a criteria record.
pub const CRITERIA_ARTIFACT: &str = "matching_criteria";

/// Normalised artifact name of a poll record.
pub const POLL_ARTIFACT: &str = "poll_artifact";

/// Criteria field marking a record as the fallback.
pub const DEFAULT_FLAG: &str = "dummy_default";

/// Criteria field holding the vault id of the fixture payload.
pub const DATA_VAULT_KEY: &str = "dummy_file_vault_id";

/// Criteria field holding the vault id of a replacerizer map.
pub const REPLACERIZER_KEY: &str = "replacerizer";

/// Criteria fields that are never compared against action parameters.
pub const RESERVED_CRITERIA_KEYS: [&str; 2] = [REPLACERIZER_KEY, DATA_VAULT_KEY];

/// Archive member holding the container description in poll data.
pub const CONTAINER_MEMBER: &str = "container.json";

pub const NO_DATA_MESSAGE: &str = "There is no data for the action/parameter selected";

const ARTIFACT_VOLATILE_FIELDS: [&str; 7] = [
	"container_id",
	"container",
	"create_time",
	"start_time",
	"update_time",
	"id",
	"owner_id",
];

const CONTAINER_VOLATILE_FIELDS: [&str; 19] = [
	"create_time",
	"asset_id",
	"due_time",
	"id",
	"hash",
	"start_time",
	"artifact_update_time",
	"container_update_time",
	"owner_id",
	"label",
	"current_phase_id",
	"close_time",
	"open_time",
	"closing_owner_id",
	"role_id",
	"node_guid",
	"in_case",
	"owner_name",
	"tenant_id",
];

/// Imports the fragment relies on, paired with the lowercase probe used to
/// detect an existing declaration.
const REQUIRED_IMPORTS: [(&str, &str); 5] = [
	("import re", "import re\n"),
	("import json", "import json\n"),
	("from phantom.vault import vault", "from phantom.vault import Vault\n"),
	("import uuid", "import uuid\n"),
	("import tarfile", "import tarfile\n"),
];

/// Settings that shape the generated fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionConfig {
	/// When true the generated code reports a failure if no configuration
	/// record matches. When false it falls through to the app's own
	/// `handle_action` body.
	pub fail_on_not_found: bool,
}

/// Synthesized lines, already indented for the anchor they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFragment {
	text: String,
}

impl GeneratedFragment {
	pub fn as_str(&self) -> &str {
		&self.text
	}

	pub fn len(&self) -> usize {
		self.text.len()
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}

	pub fn lines(&self) -> impl Iterator<Item = &str> {
		self.text.lines()
	}
}

impl AsRef<str> for GeneratedFragment {
	fn as_ref(&self) -> &str {
		&self.text
	}
}

#[derive(Serialize)]
struct FragmentContext<'a> {
	fail_option: &'a str,
	poll_action: &'a str,
	config_label: &'a str,
	criteria_artifact: &'a str,
	poll_artifact: &'a str,
	default_flag: &'a str,
	data_vault_key: &'a str,
	container_member: &'a str,
	no_data_message: &'a str,
	reserved_criteria_keys: &'a [&'a str],
	artifact_volatile_fields: &'a [&'a str],
	container_volatile_fields: &'a [&'a str],
}

/// Import statements missing from `document`. The check is a case-insensitive
/// substring search over the whole document.
pub fn import_preamble(document: &str) -> String {
	let lowered = document.to_lowercase();

	REQUIRED_IMPORTS
		.iter()
		.filter(|(probe, _)| !lowered.contains(probe))
		.map(|(_, statement)| *statement)
		.collect()
}

/// Render the fragment body for an anchor indented by `indent`.
pub fn synthesize(indent: &IndentUnit, config: &InjectionConfig) -> DabcatResult<GeneratedFragment> {
	if indent.is_empty() {
		return Err(DabcatError::AnchorNotFound);
	}

	let rendered = render_fragment_template(config)?;
	let text = reindent(&rendered, indent, FRAGMENT_BASE_DEPTH);
	tracing::debug!(
		lines = text.lines().count(),
		fail_on_not_found = config.fail_on_not_found,
		"synthesized fragment"
	);

	Ok(GeneratedFragment { text })
}

fn render_fragment_template(config: &InjectionConfig) -> DabcatResult<String> {
	let mut env = minijinja::Environment::new();
	env.set_keep_trailing_newline(true);
	env.add_template(FRAGMENT_TEMPLATE_NAME, FRAGMENT_TEMPLATE)
		.map_err(|e| DabcatError::TemplateRender(e.to_string()))?;

	let template = env
		.get_template(FRAGMENT_TEMPLATE_NAME)
		.map_err(|e| DabcatError::TemplateRender(e.to_string()))?;

	let ctx = FragmentContext {
		fail_option: python_bool(config.fail_on_not_found),
		poll_action: POLL_ACTION,
		config_label: CONFIG_LABEL,
		criteria_artifact: CRITERIA_ARTIFACT,
		poll_artifact: POLL_ARTIFACT,
		default_flag: DEFAULT_FLAG,
		data_vault_key: DATA_VAULT_KEY,
		container_member: CONTAINER_MEMBER,
		no_data_message: NO_DATA_MESSAGE,
		reserved_criteria_keys: &RESERVED_CRITERIA_KEYS,
		artifact_volatile_fields: &ARTIFACT_VOLATILE_FIELDS,
		container_volatile_fields: &CONTAINER_VOLATILE_FIELDS,
	};

	template
		.render(minijinja::Value::from_serialize(&ctx))
		.map_err(|e| DabcatError::TemplateRender(e.to_string()))
}

fn python_bool(value: bool) -> &'static str {
	if value { "True" } else { "False" }
}

/// Replace the template's four-space nesting with `indent` units, starting
/// `base_depth` units deep. Blank lines stay empty.
fn reindent(rendered: &str, indent: &IndentUnit, base_depth: usize) -> String {
	let mut result = String::with_capacity(rendered.len() * 2);

	for line in rendered.split_inclusive('\n') {
		let (body, newline) = match line.strip_suffix('\n') {
			Some(body) => (body, "\n"),
			None => (line, ""),
		};
		let content = body.trim_start_matches(' ');

		if !content.trim().is_empty() {
			let leading = body.len() - content.len();
			result.push_str(&indent.level(base_depth + leading / TEMPLATE_INDENT_WIDTH));
			result.push_str(&" ".repeat(leading % TEMPLATE_INDENT_WIDTH));
			result.push_str(content);
		}

		result.push_str(newline);
	}

	result
}
