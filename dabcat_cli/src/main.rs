use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use dabcat_cli::Commands;
use dabcat_cli::DabcatCli;
use dabcat_cli::OutputFormat;
use dabcat_core::AppIdentity;
use dabcat_core::AppMetadata;
use dabcat_core::DabcatError;
use dabcat_core::InjectionConfig;
use dabcat_core::augment;
use dabcat_core::config::CONFIG_FILE_CANDIDATES;
use dabcat_core::config::DabcatConfig;
use dabcat_core::config::SAMPLE_CONFIG;
use dabcat_core::count_anchors;
use dabcat_core::contains_generated_block;
use dabcat_core::dispatch::ConfigArtifact;
use dabcat_core::dispatch::ConfigContainer;
use dabcat_core::dispatch::Outcome;
use dabcat_core::dispatch::Selection;
use dabcat_core::dispatch::select;
use dabcat_core::locate;
use dabcat_core::package::OutputFile;
use dabcat_core::package::PackageRequest;
use dabcat_core::package::dummy_name;
use dabcat_core::package::package;
use dabcat_core::project::FileKind;
use dabcat_core::project::ProjectFiles;
use dabcat_core::project::discover;
use dabcat_core::project::load_project;
use dabcat_core::replay_fixture;
use dabcat_core::substitution::SubstitutionMap;
use owo_colors::OwoColorize;
use serde::Serialize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = DabcatCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Info { format }) => run_info(&args, *format),
		Some(Commands::Build {
			name,
			product_name,
			app_id,
			fail_on_not_found,
			out_dir,
			dry_run,
			diff,
		}) => {
			let overrides = BuildOverrides {
				name: name.clone(),
				product_name: product_name.clone(),
				appid: app_id.clone(),
				fail_on_not_found: *fail_on_not_found,
				out_dir: out_dir.clone(),
			};
			run_build(&args, &overrides, *dry_run, *diff)
		}
		Some(Commands::Fixture { file, params }) => run_fixture(&args, file, params),
		Some(Commands::Preview {
			records,
			action,
			params,
			fail_on_not_found,
			format,
		}) => run_preview(&args, records, action, params, *fail_on_not_found, *format),
		None => {
			eprintln!("No subcommand specified. Run `dabcat --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<DabcatError>() {
			Ok(dabcat_err) => {
				let report: miette::Report = (*dabcat_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(verbose)
		.without_time()
		.try_init()
		.ok();
}

fn resolve_root(args: &DabcatCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn print_field(label: &str, value: impl std::fmt::Display) {
	println!("  {label:<26} {value}");
}

fn display_or<T: AsRef<Path>>(path: Option<T>, fallback: &str) -> String {
	path.map_or_else(
		|| fallback.to_string(),
		|path| path.as_ref().display().to_string(),
	)
}

fn run_init(args: &DabcatCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = DabcatConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", config_path.display());

	println!();
	println!("Next steps:");
	println!("  1. Set `appid` under [app] in {}", CONFIG_FILE_CANDIDATES[0]);
	println!("  2. Run `dabcat info` to check the discovered files");
	println!("  3. Run `dabcat build` to write the dummy app");

	Ok(())
}

/// Values given on the command line, taking precedence over `dabcat.toml`.
#[derive(Debug, Default)]
struct BuildOverrides {
	name: Option<String>,
	product_name: Option<String>,
	appid: Option<String>,
	fail_on_not_found: Option<bool>,
	out_dir: Option<PathBuf>,
}

/// Settings used for a build once flags, config and defaults are merged.
#[derive(Debug, Serialize)]
struct ResolvedSettings {
	name: Option<String>,
	product_name: Option<String>,
	appid: Option<String>,
	fail_on_not_found: bool,
	out_dir: Option<PathBuf>,
}

impl ResolvedSettings {
	fn identity(&self) -> Result<AppIdentity, DabcatError> {
		let name = self
			.name
			.clone()
			.ok_or_else(|| DabcatError::MissingSetting("name".to_string()))?;
		let product_name = self
			.product_name
			.clone()
			.ok_or_else(|| DabcatError::MissingSetting("product_name".to_string()))?;
		let appid = self
			.appid
			.clone()
			.ok_or_else(|| DabcatError::MissingSetting("appid".to_string()))?;

		Ok(AppIdentity {
			name,
			product_name,
			appid,
		})
	}

	fn output_dir(&self, root: &Path) -> Result<PathBuf, DabcatError> {
		if let Some(out_dir) = &self.out_dir {
			return Ok(out_dir.clone());
		}

		let root = root.canonicalize()?;
		root.parent()
			.map(Path::to_path_buf)
			.ok_or_else(|| {
				DabcatError::InvalidDestination {
					path: root.display().to_string(),
					reason: "the app directory has no parent; pass --out-dir".to_string(),
				}
			})
	}
}

/// Merge flags over config values. Metadata suggestions fill in the name
/// and product name.
fn resolve_settings(
	root: &Path,
	config: &DabcatConfig,
	overrides: &BuildOverrides,
	suggested: Option<(String, String)>,
) -> ResolvedSettings {
	let (suggested_name, suggested_product) = suggested.unzip();

	ResolvedSettings {
		name: overrides
			.name
			.clone()
			.or_else(|| config.app.name.clone())
			.or(suggested_name),
		product_name: overrides
			.product_name
			.clone()
			.or_else(|| config.app.product_name.clone())
			.or(suggested_product),
		appid: overrides.appid.clone().or_else(|| config.app.appid.clone()),
		fail_on_not_found: overrides
			.fail_on_not_found
			.or(config.fail_on_not_found)
			.unwrap_or(false),
		out_dir: overrides
			.out_dir
			.clone()
			.or_else(|| config.out_dir.as_ref().map(|dir| root.join(dir))),
	}
}

fn load_config(root: &Path) -> Result<DabcatConfig, DabcatError> {
	Ok(DabcatConfig::load(root)?.unwrap_or_default())
}

#[derive(Debug, Serialize)]
struct InfoReport {
	root: PathBuf,
	config: Option<PathBuf>,
	files: ProjectFiles,
	anchors: Option<usize>,
	anchor_line: Option<usize>,
	previously_augmented: Option<bool>,
	settings: ResolvedSettings,
	dummy_name: Option<String>,
}

fn run_info(args: &DabcatCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let files = discover(&root, &config.files)?;

	let connector = match &files.connector {
		Some(path) => Some(std::fs::read_to_string(root.join(path))?),
		None => None,
	};
	let metadata = match &files.metadata {
		Some(path) => {
			match AppMetadata::from_json(&std::fs::read_to_string(root.join(path))?) {
				Ok(metadata) => Some(metadata),
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "could not read app metadata");
					None
				}
			}
		}
		None => None,
	};

	let suggested = metadata
		.as_ref()
		.map(|metadata| (metadata.suggested_name(), metadata.suggested_product_name()));
	let mut settings = resolve_settings(&root, &config, &BuildOverrides::default(), suggested);
	if settings.out_dir.is_none() {
		settings.out_dir = settings.output_dir(&root).ok();
	}

	let report = InfoReport {
		config: DabcatConfig::resolve_path(&root),
		anchors: connector.as_deref().map(count_anchors),
		anchor_line: connector
			.as_deref()
			.and_then(|text| locate(text).ok())
			.map(|insertion| insertion.line),
		previously_augmented: connector.as_deref().map(contains_generated_block),
		dummy_name: settings.name.as_deref().map(dummy_name),
		root,
		files,
		settings,
	};

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
		OutputFormat::Text => print_info(&report),
	}

	Ok(())
}

fn print_info(report: &InfoReport) {
	println!("{}", colored!("dabcat project info", bold));
	print_field("root", report.root.display());
	print_field("config", display_or(report.config.as_ref(), "(none)"));

	print_section("Files");
	for (label, path) in [
		("connector", &report.files.connector),
		("metadata", &report.files.metadata),
		("replacerizer", &report.files.replacerizer),
	] {
		let value = match path {
			Some(path) => path.display().to_string(),
			None => colored!("(not found)", yellow),
		};
		print_field(label, value);
	}

	if let Some(anchors) = report.anchors {
		print_section("Connector");
		let anchor = match (anchors, report.anchor_line) {
			(0, _) | (_, None) => colored!("none", red),
			(1, Some(line)) => format!("line {line}"),
			(count, Some(line)) => {
				format!("line {line} ({count} definitions, the first is used)")
			}
		};
		print_field("handle_action", anchor);
		let region = if report.previously_augmented == Some(true) {
			colored!("present", yellow)
		} else {
			"absent".to_string()
		};
		print_field("generated region", region);
	}

	print_section("Settings");
	print_field("name", report.settings.name.as_deref().unwrap_or("(unset)"));
	print_field(
		"product name",
		report.settings.product_name.as_deref().unwrap_or("(unset)"),
	);
	let appid = match &report.settings.appid {
		Some(appid) => appid.clone(),
		None => colored!("(unset)", yellow),
	};
	print_field("app id", appid);
	print_field("fail on not found", report.settings.fail_on_not_found);
	print_field(
		"out dir",
		display_or(report.settings.out_dir.as_ref(), "(unset)"),
	);
	if let Some(name) = &report.dummy_name {
		print_field("dummy name", name);
	}
}

fn run_build(
	args: &DabcatCli,
	overrides: &BuildOverrides,
	dry_run: bool,
	diff: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let files = discover(&root, &config.files)?;
	let mut project = load_project(files)?;

	let suggested = Some((
		project.metadata.suggested_name(),
		project.metadata.suggested_product_name(),
	));
	let settings = resolve_settings(&root, &config, overrides, suggested);
	let identity = settings.identity()?;
	let out_dir = settings.output_dir(&root)?;

	let injection = InjectionConfig {
		fail_on_not_found: settings.fail_on_not_found,
	};
	let augmentation = augment(&project.connector, &injection)?;
	if augmentation.previously_augmented {
		eprintln!(
			"{} the connector already contains a generated region; a second one was added",
			colored!("warning:", yellow)
		);
	}

	project.metadata.rename(&identity);
	let metadata_json = project.metadata.to_pretty_json()?;

	let connector_path = project.files.require(FileKind::Connector)?.to_path_buf();
	let metadata_path = project.files.require(FileKind::Metadata)?.to_path_buf();

	if diff {
		println!("--- {}", connector_path.display());
		println!("+++ {}", connector_path.display());
		print_diff(&project.connector, &augmentation.text);
	}

	let name = dummy_name(&identity.name);
	if dry_run {
		println!(
			"Dry run: would add {} bytes after line {} of {}",
			augmentation.inserted_len,
			augmentation.anchor_line,
			connector_path.display()
		);
		println!("  {}", out_dir.join(&name).display());
		println!("  {}", out_dir.join(format!("{name}.tgz")).display());
		return Ok(());
	}

	let result = package(&PackageRequest {
		source_root: &root,
		out_dir: &out_dir,
		app_name: &identity.name,
		outputs: vec![
			OutputFile {
				path: connector_path,
				content: augmentation.text,
			},
			OutputFile {
				path: metadata_path,
				content: metadata_json,
			},
		],
	})?;

	println!(
		"{} {} ({} files)",
		colored!("Built", green),
		result.tree.display(),
		result.copied_files
	);
	println!("{} {}", colored!("Archived", green), result.archive.display());

	if args.verbose {
		print_field("name", &identity.name);
		print_field("product name", &identity.product_name);
		print_field("app id", &identity.appid);
		print_field("fail on not found", injection.fail_on_not_found);
	}

	Ok(())
}

fn run_fixture(
	args: &DabcatCli,
	file: &Path,
	params: &[(String, String)],
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let files = discover(&root, &config.files)?;

	let map = match &files.replacerizer {
		Some(path) => {
			tracing::debug!(path = %path.display(), "using replacerizer map");
			Some(SubstitutionMap::from_json(&std::fs::read_to_string(
				root.join(path),
			)?)?)
		}
		None => None,
	};

	let params: HashMap<String, String> = params.iter().cloned().collect();
	let content = std::fs::read_to_string(file)?;
	let response = replay_fixture(&content, map.as_ref(), &params)?;

	println!("{}", serde_json::to_string_pretty(&response)?);
	Ok(())
}

#[derive(Debug, Serialize)]
struct PreviewReport<'a> {
	action: &'a str,
	selection: &'a Selection<'a>,
	outcome: Outcome,
}

fn run_preview(
	args: &DabcatCli,
	records: &Path,
	action: &str,
	params: &[(String, String)],
	fail_on_not_found: Option<bool>,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let config = load_config(&resolve_root(args))?;
	let fail_on_not_found = fail_on_not_found
		.or(config.fail_on_not_found)
		.unwrap_or(false);
	let containers: Vec<ConfigContainer> =
		serde_json::from_str(&std::fs::read_to_string(records)?).map_err(DabcatError::from)?;
	let params: serde_json::Map<String, serde_json::Value> = params
		.iter()
		.map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
		.collect();

	let selection = select(&containers, action, &params);
	let outcome = selection.outcome(action, fail_on_not_found);

	if matches!(format, OutputFormat::Json) {
		let report = PreviewReport {
			action,
			selection: &selection,
			outcome,
		};
		println!("{}", serde_json::to_string_pretty(&report)?);
		return Ok(());
	}

	match &selection {
		Selection::Poll { artifacts } => {
			println!("{} {} poll record(s)", colored!("poll:", bold), artifacts.len());
			for artifact in artifacts {
				print_artifact("poll record", artifact);
			}
		}
		Selection::Matching {
			artifact,
			secondaries,
		} => {
			println!("{} criteria record matched", colored!("matching:", bold));
			print_artifact("record", artifact);
			for secondary in secondaries {
				print_artifact("secondary", secondary);
			}
		}
		Selection::Default {
			artifact,
			secondaries,
		} => {
			println!(
				"{} no criteria record matched, using the default record",
				colored!("default:", bold)
			);
			print_artifact("record", artifact);
			for secondary in secondaries {
				print_artifact("secondary", secondary);
			}
		}
		Selection::NoData => println!("{} no record answers this action", colored!("no data:", bold)),
	}

	match outcome {
		Outcome::Respond => println!("{} respond with the selected data", colored!("outcome:", green)),
		Outcome::NoMatchingData(message) => {
			println!("{} fail with \"{message}\"", colored!("outcome:", red));
		}
		Outcome::FallThrough => {
			println!("{} run the app's own action code", colored!("outcome:", yellow));
		}
	}

	Ok(())
}

fn print_artifact(label: &str, artifact: &ConfigArtifact) {
	let cef = serde_json::Value::Object(artifact.cef.clone());
	print_field(label, format!("{} {cef}", artifact.name));
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
		println!("{}", hunk.header());
		for change in hunk.iter_changes() {
			match change.tag() {
				ChangeTag::Delete => print!("{}", colored!(format!("-{change}"), red)),
				ChangeTag::Insert => print!("{}", colored!(format!("+{change}"), green)),
				ChangeTag::Equal => print!(" {change}"),
			}
		}
	}
}
