use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::DabcatError;
use crate::DabcatResult;
use crate::config::FilesConfig;
use crate::metadata::AppMetadata;
use crate::substitution::SubstitutionMap;

const CONNECTOR_SUFFIX: &str = "_connector.py";
const REPLACERIZER_MARKER: &str = "replacerizer";

/// Role of a file in an app directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
	Connector,
	Metadata,
	Replacerizer,
}

impl FileKind {
	pub fn label(self) -> &'static str {
		match self {
			Self::Connector => "connector",
			Self::Metadata => "metadata",
			Self::Replacerizer => "replacerizer",
		}
	}
}

/// Classify a file by name. Connectors end in `_connector.py`, replacerizer
/// maps have `replacerizer` in their name, and any other json file is taken
/// for the app metadata.
pub fn classify_file(path: &Path) -> Option<FileKind> {
	let name = path.file_name()?.to_str()?.to_lowercase();

	if name.ends_with(CONNECTOR_SUFFIX) {
		Some(FileKind::Connector)
	} else if name.contains(REPLACERIZER_MARKER) {
		Some(FileKind::Replacerizer)
	} else if name.ends_with(".json") {
		Some(FileKind::Metadata)
	} else {
		None
	}
}

/// Important files of an app directory, relative to `root`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectFiles {
	pub root: PathBuf,
	pub connector: Option<PathBuf>,
	pub metadata: Option<PathBuf>,
	pub replacerizer: Option<PathBuf>,
}

impl ProjectFiles {
	fn slot(&mut self, kind: FileKind) -> &mut Option<PathBuf> {
		match kind {
			FileKind::Connector => &mut self.connector,
			FileKind::Metadata => &mut self.metadata,
			FileKind::Replacerizer => &mut self.replacerizer,
		}
	}

	pub fn is_complete(&self) -> bool {
		self.connector.is_some() && self.metadata.is_some() && self.replacerizer.is_some()
	}

	/// The path found for `kind`, or `MissingProjectFile`.
	pub fn require(&self, kind: FileKind) -> DabcatResult<&Path> {
		let path = match kind {
			FileKind::Connector => self.connector.as_deref(),
			FileKind::Metadata => self.metadata.as_deref(),
			FileKind::Replacerizer => self.replacerizer.as_deref(),
		};
		path.ok_or_else(|| {
			DabcatError::MissingProjectFile {
				kind: kind.label().to_string(),
				root: self.root.display().to_string(),
			}
		})
	}
}

/// Find the connector, metadata and replacerizer files under `root`.
///
/// Paths set in `overrides` are used as given. The rest are discovered by
/// walking the tree, shallowest and then alphabetically first match winning.
/// Hidden directories, `.gitignore`d paths and build output are skipped.
pub fn discover(root: &Path, overrides: &FilesConfig) -> DabcatResult<ProjectFiles> {
	let mut files = ProjectFiles {
		root: root.to_path_buf(),
		connector: overrides.connector.clone(),
		metadata: overrides.metadata.clone(),
		replacerizer: overrides.replacerizer.clone(),
	};

	if files.is_complete() {
		return Ok(files);
	}

	let mut candidates = collect_files(root)?;
	candidates.sort_by(|a, b| {
		a.components()
			.count()
			.cmp(&b.components().count())
			.then_with(|| a.cmp(b))
	});

	for path in candidates {
		let Some(kind) = classify_file(&path) else {
			continue;
		};
		let slot = files.slot(kind);
		if slot.is_none() {
			tracing::debug!(kind = kind.label(), path = %path.display(), "discovered file");
			*slot = Some(path);
		}
		if files.is_complete() {
			break;
		}
	}

	Ok(files)
}

/// An app directory with its important files loaded.
#[derive(Debug, Clone)]
pub struct Project {
	pub files: ProjectFiles,
	/// Connector source text.
	pub connector: String,
	pub metadata: AppMetadata,
	pub replacerizer: Option<SubstitutionMap>,
}

impl Project {
	pub fn root(&self) -> &Path {
		&self.files.root
	}
}

/// Read the files found by [`discover`]. The connector and metadata are
/// required; the replacerizer map is optional.
pub fn load_project(files: ProjectFiles) -> DabcatResult<Project> {
	let connector_path = files.root.join(files.require(FileKind::Connector)?);
	let metadata_path = files.root.join(files.require(FileKind::Metadata)?);

	let connector = std::fs::read_to_string(&connector_path)?;
	let metadata = AppMetadata::from_json(&std::fs::read_to_string(&metadata_path)?)?;
	let replacerizer = match &files.replacerizer {
		Some(path) => {
			Some(SubstitutionMap::from_json(&std::fs::read_to_string(
				files.root.join(path),
			)?)?)
		}
		None => None,
	};

	Ok(Project {
		files,
		connector,
		metadata,
		replacerizer,
	})
}

/// Discover and load the app at `root` in one step.
pub fn scan_project(root: &Path, overrides: &FilesConfig) -> DabcatResult<Project> {
	load_project(discover(root, overrides)?)
}

/// Collect all files below `root` as paths relative to it.
fn collect_files(root: &Path) -> DabcatResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	let gitignore = build_gitignore(root);

	walk_dir(root, root, &mut files, &gitignore, &mut visited_dirs)?;
	Ok(files)
}

/// Build a `Gitignore` matcher from the app's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

pub(crate) fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target" || name == "__pycache__"
}

fn walk_dir(
	root: &Path,
	dir: &Path,
	files: &mut Vec<PathBuf>,
	gitignore: &Gitignore,
	visited_dirs: &mut HashSet<PathBuf>,
) -> DabcatResult<()> {
	// Symlinked directories can loop back onto an ancestor.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		let is_dir = path.is_dir();

		if is_dir
			&& path
				.file_name()
				.and_then(|n| n.to_str())
				.is_some_and(is_ignored_directory_name)
		{
			continue;
		}

		if gitignore.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(root, &path, files, gitignore, visited_dirs)?;
		} else if let Ok(relative) = path.strip_prefix(root) {
			files.push(relative.to_path_buf());
		}
	}

	Ok(())
}
