use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DabcatError {
	#[error(transparent)]
	#[diagnostic(code(dabcat::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to decode json: {0}")]
	#[diagnostic(code(dabcat::json))]
	Json(#[from] serde_json::Error),

	#[error("no `handle_action` definition found in the connector")]
	#[diagnostic(
		code(dabcat::anchor_not_found),
		help("the connector must define an indented `def handle_action(self, param):` method")
	)]
	AnchorNotFound,

	#[error("no parameter named `{key}` for wildcard `***{key}***`")]
	#[diagnostic(
		code(dabcat::missing_parameter),
		help("wildcard keys are case-sensitive and have no default value")
	)]
	MissingParameter { key: String },

	#[error("malformed fixture payload: {0}")]
	#[diagnostic(
		code(dabcat::malformed_payload),
		help("a fixture is a json array of objects that each include `data` or `summary`")
	)]
	MalformedPayload(String),

	#[error("invalid replacerizer map: {0}")]
	#[diagnostic(
		code(dabcat::invalid_substitution_map),
		help("the replacerizer file must be a flat json object of string to string")
	)]
	InvalidSubstitutionMap(String),

	#[error("malformed app metadata: {0}")]
	#[diagnostic(
		code(dabcat::malformed_metadata),
		help("the app json must contain string values for `name`, `product_name` and `appid`")
	)]
	MalformedMetadata(String),

	#[error("could not find the {kind} file under `{root}`")]
	#[diagnostic(
		code(dabcat::missing_project_file),
		help("run dabcat from the app source directory or set the path under [files] in dabcat.toml")
	)]
	MissingProjectFile { kind: String, root: String },

	#[error("missing setting `{0}`")]
	#[diagnostic(
		code(dabcat::missing_setting),
		help("pass it on the command line or set it under [app] in dabcat.toml")
	)]
	MissingSetting(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(dabcat::config_parse),
		help("check that dabcat.toml is valid TOML with [app] and/or [files] sections")
	)]
	ConfigParse(String),

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(dabcat::template_render))]
	TemplateRender(String),

	#[error("invalid output destination `{path}`: {reason}")]
	#[diagnostic(code(dabcat::invalid_destination))]
	InvalidDestination { path: String, reason: String },
}

pub type DabcatResult<T> = Result<T, DabcatError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
