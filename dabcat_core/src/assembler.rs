use crate::DabcatResult;
use crate::locator::IndentUnit;
use crate::locator::Insertion;
use crate::locator::locate;
use crate::synthesizer::FRAGMENT_BASE_DEPTH;
use crate::synthesizer::GeneratedFragment;
use crate::synthesizer::InjectionConfig;
use crate::synthesizer::import_preamble;
use crate::synthesizer::synthesize;

const MARKER_RULE: &str = "#####################################";
pub const BEGIN_MARKER_TITLE: &str = "#### start DABCAT generated code ####";
pub const END_MARKER_TITLE: &str = "#### stop DABCAT generated code #####";

/// The comment block opening a generated region.
pub fn begin_marker(indent: &IndentUnit) -> String {
	marker_block(indent, BEGIN_MARKER_TITLE)
}

/// The comment block closing a generated region.
pub fn end_marker(indent: &IndentUnit) -> String {
	marker_block(indent, END_MARKER_TITLE)
}

fn marker_block(indent: &IndentUnit, title: &str) -> String {
	let prefix = indent.level(FRAGMENT_BASE_DEPTH);
	format!("{prefix}{MARKER_RULE}\n{prefix}{title}\n{prefix}{MARKER_RULE}\n")
}

/// Splice `fragment` between boundary markers after the anchor line, with the
/// missing imports in front of the document.
pub fn assemble(preamble: &str, insertion: &Insertion<'_>, fragment: &GeneratedFragment) -> String {
	let begin = begin_marker(&insertion.indent);
	let end = end_marker(&insertion.indent);

	let mut result = String::with_capacity(
		preamble.len()
			+ insertion.prefix.len()
			+ begin.len()
			+ fragment.len()
			+ end.len()
			+ insertion.suffix.len(),
	);
	result.push_str(preamble);
	result.push_str(insertion.prefix);
	result.push_str(&begin);
	result.push_str(fragment.as_str());
	result.push_str(&end);
	result.push_str(insertion.suffix);
	result
}

/// Whether the document already carries a generated region.
pub fn contains_generated_block(document: &str) -> bool {
	document.contains(BEGIN_MARKER_TITLE)
}

/// A connector with the generated region spliced in.
#[derive(Debug, Clone)]
pub struct Augmentation {
	pub text: String,
	/// Imports added in front of the document.
	pub preamble: String,
	/// Byte offset of the begin marker in `text`.
	pub offset: usize,
	/// Bytes added to the original document.
	pub inserted_len: usize,
	/// 1-indexed line of the anchor in the original document.
	pub anchor_line: usize,
	/// The document already contained a generated region.
	pub previously_augmented: bool,
}

/// Locate the anchor, synthesize the fragment, and assemble the result.
///
/// Running this on a document that was already augmented adds a second
/// region after the first anchor rather than replacing the existing one.
pub fn augment(document: &str, config: &InjectionConfig) -> DabcatResult<Augmentation> {
	let insertion = locate(document)?;
	let previously_augmented = contains_generated_block(document);
	if previously_augmented {
		tracing::warn!(
			line = insertion.line,
			"connector already contains a generated region; adding another one"
		);
	}

	let preamble = import_preamble(document);
	let fragment = synthesize(&insertion.indent, config)?;
	let text = assemble(&preamble, &insertion, &fragment);
	let inserted_len = text.len() - document.len();

	Ok(Augmentation {
		offset: preamble.len() + insertion.offset(),
		anchor_line: insertion.line,
		preamble,
		text,
		inserted_len,
		previously_augmented,
	})
}
