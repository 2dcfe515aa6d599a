use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;
use ignore::WalkBuilder;
use serde::Serialize;

use crate::DabcatError;
use crate::DabcatResult;

/// Directories never copied into the dummy tree.
const SKIPPED_DIRECTORIES: [&str; 2] = [".git", "__pycache__"];

/// Directory and archive stem for the dummy copy of `app_name`.
pub fn dummy_name(app_name: &str) -> String {
	format!("{}_dummy", app_name.to_lowercase().replace(' ', "_"))
}

/// A file written into the dummy tree in place of its original.
#[derive(Debug, Clone)]
pub struct OutputFile {
	/// Path relative to the app root.
	pub path: PathBuf,
	pub content: String,
}

/// Everything needed to produce the dummy tree and archive.
#[derive(Debug, Clone)]
pub struct PackageRequest<'a> {
	pub source_root: &'a Path,
	pub out_dir: &'a Path,
	/// Name of the dummy app, used to derive the directory and archive name.
	pub app_name: &'a str,
	pub outputs: Vec<OutputFile>,
}

/// Where the dummy app was written.
#[derive(Debug, Clone, Serialize)]
pub struct PackageResult {
	pub tree: PathBuf,
	pub archive: PathBuf,
	pub copied_files: usize,
}

/// Copy the app into `<out_dir>/<dummy name>`, overwrite the generated files,
/// and archive the tree as `<out_dir>/<dummy name>.tgz`.
pub fn package(request: &PackageRequest<'_>) -> DabcatResult<PackageResult> {
	let name = dummy_name(request.app_name);
	let tree = request.out_dir.join(&name);
	let archive = request.out_dir.join(format!("{name}.tgz"));

	ensure_outside_source(request.source_root, request.out_dir, &tree)?;
	std::fs::create_dir_all(request.out_dir)?;

	let copied_files = copy_tree(request.source_root, &tree)?;
	tracing::info!(files = copied_files, tree = %tree.display(), "copied app tree");

	for output in &request.outputs {
		let destination = tree.join(&output.path);
		if let Some(parent) = destination.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&destination, &output.content)?;
		tracing::debug!(path = %destination.display(), "wrote generated file");
	}

	write_archive(&tree, &name, &archive)?;
	tracing::info!(archive = %archive.display(), "wrote archive");

	Ok(PackageResult {
		tree,
		archive,
		copied_files,
	})
}

/// The dummy tree may not overlap the app directory in either direction.
/// Nothing is created on disk while checking.
fn ensure_outside_source(source_root: &Path, out_dir: &Path, tree: &Path) -> DabcatResult<()> {
	let source = source_root.canonicalize()?;
	let out = resolve_path(out_dir)?;
	let resolved_tree = resolve_path(tree)?;

	if out.starts_with(&source) {
		return Err(DabcatError::InvalidDestination {
			path: out_dir.display().to_string(),
			reason: "the output directory must be outside the app directory".to_string(),
		});
	}

	if resolved_tree.starts_with(&source) || source.starts_with(&resolved_tree) {
		return Err(DabcatError::InvalidDestination {
			path: tree.display().to_string(),
			reason: "the dummy directory would overlap the app directory".to_string(),
		});
	}

	Ok(())
}

/// Absolute form of `path` with symlinks resolved for the part that exists.
/// Missing trailing components are appended lexically.
fn resolve_path(path: &Path) -> DabcatResult<PathBuf> {
	let absolute = std::path::absolute(path)?;
	let mut existing = absolute.as_path();
	let mut missing = Vec::new();

	while !existing.exists() {
		let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
			break;
		};
		missing.push(name.to_os_string());
		existing = parent;
	}

	let mut resolved = existing.canonicalize()?;
	for name in missing.into_iter().rev() {
		resolved.push(name);
	}

	Ok(resolved)
}

/// Copy every file below `source` to the same relative path below
/// `destination`, returning the number of files copied.
fn copy_tree(source: &Path, destination: &Path) -> DabcatResult<usize> {
	let walker = WalkBuilder::new(source)
		.hidden(false)
		.ignore(false)
		.git_ignore(false)
		.git_global(false)
		.git_exclude(false)
		.parents(false)
		.sort_by_file_name(|a, b| a.cmp(b))
		.filter_entry(|entry| {
			let is_dir = entry.file_type().is_some_and(|kind| kind.is_dir());
			!(is_dir
				&& entry
					.file_name()
					.to_str()
					.is_some_and(|name| SKIPPED_DIRECTORIES.contains(&name)))
		})
		.build();

	let mut copied = 0;
	for entry in walker {
		let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
		let Ok(relative) = entry.path().strip_prefix(source) else {
			continue;
		};
		let target = destination.join(relative);

		if entry.file_type().is_some_and(|kind| kind.is_dir()) {
			std::fs::create_dir_all(&target)?;
		} else {
			if let Some(parent) = target.parent() {
				std::fs::create_dir_all(parent)?;
			}
			std::fs::copy(entry.path(), &target)?;
			copied += 1;
		}
	}

	Ok(copied)
}

/// Gzip-compressed tar of `tree`, with every member under `name/`.
fn write_archive(tree: &Path, name: &str, archive: &Path) -> DabcatResult<()> {
	let file = File::create(archive)?;
	let encoder = GzEncoder::new(file, Compression::default());
	let mut builder = tar::Builder::new(encoder);
	builder.append_dir_all(name, tree)?;
	builder.into_inner()?.finish()?;
	Ok(())
}
