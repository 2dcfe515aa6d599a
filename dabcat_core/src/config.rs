use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::DabcatError;
use crate::DabcatResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["dabcat.toml", ".dabcat.toml", ".config/dabcat.toml"];

/// Configuration loaded from a `dabcat.toml` file. Every value can also be
/// given on the command line, which takes precedence.
///
/// ```toml
/// fail_on_not_found = true
/// out_dir = "../dist"
///
/// [app]
/// name = "Example DEV"
/// product_name = "Example DEV"
/// appid = "2b1e8d04-0f7c-4d55-9b5e-1f6f0f9d0c11"
///
/// [files]
/// connector = "example_connector.py"
/// metadata = "example.json"
/// replacerizer = "replacerizer.json"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DabcatConfig {
	/// Identity of the generated dummy app.
	#[serde(default)]
	pub app: AppConfig,
	/// Explicit file locations, relative to the app root. Unset entries are
	/// discovered by scanning the app directory.
	#[serde(default)]
	pub files: FilesConfig,
	/// Whether the generated code fails an action when no configuration
	/// record matches it. When unset the generated code falls through to the
	/// app's own implementation.
	#[serde(default)]
	pub fail_on_not_found: Option<bool>,
	/// Directory receiving the dummy app tree and archive. Defaults to the
	/// parent of the app root.
	#[serde(default)]
	pub out_dir: Option<PathBuf>,
}

/// The `[app]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub product_name: Option<String>,
	#[serde(default)]
	pub appid: Option<String>,
}

/// The `[files]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
	#[serde(default)]
	pub connector: Option<PathBuf>,
	#[serde(default)]
	pub metadata: Option<PathBuf>,
	#[serde(default)]
	pub replacerizer: Option<PathBuf>,
}

impl DabcatConfig {
	/// Resolve the config file path for a project root.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config for `root`, or `None` when no config file exists.
	pub fn load(root: &Path) -> DabcatResult<Option<DabcatConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> DabcatResult<DabcatConfig> {
		toml::from_str(content).map_err(|e| DabcatError::ConfigParse(e.to_string()))
	}
}

/// Sample written by `dabcat init`.
pub const SAMPLE_CONFIG: &str = "# dabcat configuration\n# Every value can be overridden on \
                                 the command line.\n\n# Fail actions that have no matching \
                                 configuration record instead of\n# running the app's own \
                                 code.\n# fail_on_not_found = true\n\n# Where the dummy app \
                                 tree and archive are written (defaults to the\n# parent of \
                                 this directory).\n# out_dir = \"..\"\n\n[app]\n# name = \
                                 \"My App DEV\"\n# product_name = \"My Product DEV\"\n# appid \
                                 = \"\"\n\n# Files are discovered automatically; set these \
                                 to override.\n[files]\n# connector = \
                                 \"my_app_connector.py\"\n# metadata = \"my_app.json\"\n# \
                                 replacerizer = \"replacerizer.json\"\n";
