use std::sync::LazyLock;

use derive_more::Deref;
use regex::Regex;

use crate::DabcatError;
use crate::DabcatResult;

/// Matches an indented `def handle_action(...):` line, including the newline
/// that ends it. Parameter lists may span several lines and an optional
/// return annotation is accepted.
static ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?m)^(?P<indent>[ \t]+)def[ \t]+handle_action[ \t]*\((?P<params>[^)]+)\)(?:[ \t]*->[^:\n]+)?[ \t]*:[ \t]*\r?\n",
	)
	.expect("anchor pattern is valid")
});

/// The leading whitespace of the anchor line. Generated lines are indented
/// with whole multiples of this unit.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct IndentUnit(String);

impl IndentUnit {
	pub fn new(unit: impl Into<String>) -> Self {
		Self(unit.into())
	}

	/// The unit repeated `depth` times.
	pub fn level(&self, depth: usize) -> String {
		self.0.repeat(depth)
	}
}

/// A document split at the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion<'a> {
	/// Everything up to and including the anchor line.
	pub prefix: &'a str,
	/// Everything after the anchor line.
	pub suffix: &'a str,
	pub indent: IndentUnit,
	/// 1-indexed line number of the anchor.
	pub line: usize,
}

impl Insertion<'_> {
	/// Byte offset at which generated content is inserted.
	pub fn offset(&self) -> usize {
		self.prefix.len()
	}
}

/// Find the first `handle_action` definition and split the document after it.
pub fn locate(document: &str) -> DabcatResult<Insertion<'_>> {
	let Some(captures) = ANCHOR_PATTERN.captures(document) else {
		return Err(DabcatError::AnchorNotFound);
	};
	let (Some(whole), Some(indent)) = (captures.get(0), captures.name("indent")) else {
		return Err(DabcatError::AnchorNotFound);
	};

	let (prefix, suffix) = document.split_at(whole.end());
	let line = document[..whole.start()].matches('\n').count() + 1;
	tracing::debug!(line, offset = whole.end(), "located handle_action anchor");

	Ok(Insertion {
		prefix,
		suffix,
		indent: IndentUnit::new(indent.as_str()),
		line,
	})
}

/// Number of anchor definitions in the document. Only the first one is used.
pub fn count_anchors(document: &str) -> usize {
	ANCHOR_PATTERN.find_iter(document).count()
}
