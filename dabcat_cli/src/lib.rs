use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Turn an app into a dummy whose actions answer from stored fixture data.",
	long_about = "dabcat (Dummy App Builder for Code And Transforms) splices a generated region \
	              into an app connector's `handle_action` method. The generated code looks up \
	              configuration records for the running action and replays their stored \
	              payloads instead of calling the real service.\n\nQuick start:\n  dabcat init     \
	              Create a sample dabcat.toml\n  dabcat info     Show discovered files and \
	              settings\n  dabcat build    Write the dummy app and its archive\n  dabcat \
	              preview  Show which record answers an action"
)]
pub struct DabcatCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the app source directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `dabcat.toml` in the app directory.
	///
	/// Every setting in the sample is commented out. If a config file already
	/// exists this command leaves it untouched and exits successfully.
	Init,
	/// Show the discovered app files and the settings a build would use.
	Info {
		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Build the dummy app.
	///
	/// Splices the generated region into the connector, renames the app in
	/// its json metadata, copies the app tree to `<out-dir>/<name>_dummy` and
	/// writes `<out-dir>/<name>_dummy.tgz`. The source directory is never
	/// modified.
	Build {
		/// Name of the dummy app. Defaults to the original name followed by
		/// ` DEV`.
		#[arg(long)]
		name: Option<String>,

		/// Product name of the dummy app. Defaults to the original product
		/// name followed by ` DEV`.
		#[arg(long)]
		product_name: Option<String>,

		/// App id of the dummy app. Required here or in `dabcat.toml`.
		#[arg(long)]
		app_id: Option<String>,

		/// Fail actions that have no matching configuration record instead
		/// of running the app's own code.
		#[arg(long)]
		fail_on_not_found: Option<bool>,

		/// Directory receiving the dummy tree and archive. Defaults to the
		/// parent of the app directory.
		#[arg(long)]
		out_dir: Option<PathBuf>,

		/// Run the pipeline without writing anything.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Print a unified diff between the original and generated connector.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Validate a fixture payload and print the action result it replays to.
	///
	/// The app's replacerizer map is applied when one is found, followed by
	/// `***KEY***` wildcard resolution from `--param` values.
	Fixture {
		/// The fixture json file.
		file: PathBuf,

		/// Action parameter as `KEY=VALUE`. May be repeated.
		#[arg(long = "param", short = 'P', value_parser = parse_param)]
		params: Vec<(String, String)>,
	},
	/// Show which configuration record would answer an action.
	///
	/// Reads a json array of configuration containers, each with a list of
	/// `artifacts` (`name` and `cef`), and applies the same selection rules as
	/// the generated code.
	Preview {
		/// The configuration records json file.
		#[arg(long)]
		records: PathBuf,

		/// Action identifier, for example `lookup_ip` or `on_poll`.
		#[arg(long)]
		action: String,

		/// Action parameter as `KEY=VALUE`. May be repeated.
		#[arg(long = "param", short = 'P', value_parser = parse_param)]
		params: Vec<(String, String)>,

		/// Fail actions that have no matching configuration record. Defaults
		/// to `fail_on_not_found` in `dabcat.toml`.
		#[arg(long)]
		fail_on_not_found: Option<bool>,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

/// Parse a `KEY=VALUE` pair. The value may itself contain `=`.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
	let Some((key, value)) = raw.split_once('=') else {
		return Err(format!("expected KEY=VALUE, found `{raw}`"));
	};

	if key.is_empty() {
		return Err(format!("missing key in `{raw}`"));
	}

	Ok((key.to_string(), value.to_string()))
}
