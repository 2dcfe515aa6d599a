//! In-process model of the record selection performed by the generated code.
//!
//! The generated fragment queries configuration containers at runtime and
//! picks the record that supplies an action's result. This module applies the
//! same rules to records held in memory so they can be previewed and tested
//! without a running platform.
//!
//! Artifacts are classified by their normalised name (lowercase, spaces
//! replaced by underscores):
//!
//! - `poll_artifact` while running the poll action: replayed as a container.
//! - `matching_criteria` with a truthy `dummy_default`: the default record.
//! - `matching_criteria` otherwise: a criteria record. It matches when every
//!   criteria field except `replacerizer` and `dummy_file_vault_id` equals
//!   the action parameter of the same name.
//! - anything else: a secondary record of its container.
//!
//! The first container whose criteria record matches ends the scan.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::synthesizer::CRITERIA_ARTIFACT;
use crate::synthesizer::DEFAULT_FLAG;
use crate::synthesizer::NO_DATA_MESSAGE;
use crate::synthesizer::POLL_ACTION;
use crate::synthesizer::POLL_ARTIFACT;
use crate::synthesizer::RESERVED_CRITERIA_KEYS;

pub const NO_POLL_DATA_MESSAGE: &str = "There is no data for polling action";

/// A record attached to a configuration container.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigArtifact {
	pub name: String,
	#[serde(default)]
	pub cef: Map<String, Value>,
}

impl ConfigArtifact {
	pub fn new(name: impl Into<String>, cef: Map<String, Value>) -> Self {
		Self {
			name: name.into(),
			cef,
		}
	}

	/// Value of a string field in `cef`, trimmed.
	pub fn cef_str(&self, key: &str) -> Option<&str> {
		self.cef.get(key).and_then(Value::as_str).map(str::trim)
	}
}

/// A configuration container and its records.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigContainer {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub artifacts: Vec<ConfigArtifact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
	Poll,
	Criteria,
	Default,
	Secondary,
}

/// Classify an artifact for the given action.
pub fn classify(artifact: &ConfigArtifact, action: &str) -> ArtifactKind {
	let normalised = artifact.name.to_lowercase().replace(' ', "_");

	if action == POLL_ACTION && normalised == POLL_ARTIFACT {
		ArtifactKind::Poll
	} else if normalised == CRITERIA_ARTIFACT {
		if artifact.cef.get(DEFAULT_FLAG).is_some_and(is_truthy) {
			ArtifactKind::Default
		} else {
			ArtifactKind::Criteria
		}
	} else {
		ArtifactKind::Secondary
	}
}

/// Whether every non-reserved criteria field equals the parameter of the same
/// name. A missing parameter only equals an explicit `null`. Values compare
/// the way the generated code's `==` does, so `1 == 1.0` holds.
pub fn criteria_match(artifact: &ConfigArtifact, params: &Map<String, Value>) -> bool {
	artifact
		.cef
		.iter()
		.filter(|(key, _)| !RESERVED_CRITERIA_KEYS.contains(&key.as_str()))
		.all(|(key, expected)| loose_eq(params.get(key).unwrap_or(&Value::Null), expected))
}

/// Python equality over decoded json. Numbers compare by value and booleans
/// count as `0` or `1`.
#[allow(clippy::float_cmp)]
fn loose_eq(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::Array(left), Value::Array(right)) => {
			left.len() == right.len() && left.iter().zip(right).all(|(l, r)| loose_eq(l, r))
		}
		(Value::Object(left), Value::Object(right)) => {
			left.len() == right.len()
				&& left
					.iter()
					.all(|(key, value)| right.get(key).is_some_and(|other| loose_eq(value, other)))
		}
		_ => match (numeric(left), numeric(right)) {
			(Some(l), Some(r)) => left == right || l == r,
			_ => left == right,
		},
	}
}

fn numeric(value: &Value) -> Option<f64> {
	match value {
		Value::Number(number) => number.as_f64(),
		Value::Bool(flag) => Some(f64::from(u8::from(*flag))),
		_ => None,
	}
}

/// The record (or records) chosen for an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum Selection<'a> {
	/// Poll action: every poll record is replayed.
	Poll { artifacts: Vec<&'a ConfigArtifact> },
	/// A criteria record whose fields all equal the action parameters.
	Matching {
		artifact: &'a ConfigArtifact,
		secondaries: Vec<&'a ConfigArtifact>,
	},
	/// No criteria record matched; the default record is used.
	Default {
		artifact: &'a ConfigArtifact,
		secondaries: Vec<&'a ConfigArtifact>,
	},
	NoData,
}

impl<'a> Selection<'a> {
	/// The record supplying the action payload, if any.
	pub fn data_artifact(&self) -> Option<&'a ConfigArtifact> {
		match self {
			Self::Matching { artifact, .. } | Self::Default { artifact, .. } => Some(*artifact),
			Self::Poll { .. } | Self::NoData => None,
		}
	}

	/// What the generated code does with this selection.
	pub fn outcome(&self, action: &str, fail_on_not_found: bool) -> Outcome {
		match self {
			Self::NoData if fail_on_not_found => {
				let message = if action == POLL_ACTION {
					NO_POLL_DATA_MESSAGE
				} else {
					NO_DATA_MESSAGE
				};
				Outcome::NoMatchingData(message)
			}
			Self::NoData => Outcome::FallThrough,
			Self::Poll { .. } | Self::Matching { .. } | Self::Default { .. } => Outcome::Respond,
		}
	}
}

/// Result of the dispatch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum Outcome {
	/// The selected record answers the action.
	Respond,
	/// Nothing matched and the fragment fails the action with this message.
	NoMatchingData(&'static str),
	/// Nothing matched and the app's own action code runs.
	FallThrough,
}

/// Pick the record(s) answering `action` with `params`.
pub fn select<'a>(
	containers: &'a [ConfigContainer],
	action: &str,
	params: &Map<String, Value>,
) -> Selection<'a> {
	let mut matching: Option<(&'a ConfigArtifact, Vec<&'a ConfigArtifact>)> = None;
	let mut default: Option<&'a ConfigArtifact> = None;
	let mut default_secondaries: Vec<&'a ConfigArtifact> = Vec::new();
	let mut polls: Vec<&'a ConfigArtifact> = Vec::new();

	for container in containers {
		let mut candidate: Option<&'a ConfigArtifact> = None;
		let mut secondaries = Vec::new();
		let mut holds_default = false;

		for artifact in &container.artifacts {
			match classify(artifact, action) {
				ArtifactKind::Poll => polls.push(artifact),
				ArtifactKind::Criteria => candidate = Some(artifact),
				ArtifactKind::Default => {
					default = Some(artifact);
					holds_default = true;
				}
				ArtifactKind::Secondary => secondaries.push(artifact),
			}
		}

		if let Some(artifact) = candidate {
			if criteria_match(artifact, params) {
				tracing::debug!(container = ?container.name, "criteria record matched");
				matching = Some((artifact, secondaries));
				break;
			}
		}

		if holds_default {
			default_secondaries = secondaries;
		}
	}

	if action == POLL_ACTION {
		return if polls.is_empty() {
			Selection::NoData
		} else {
			Selection::Poll { artifacts: polls }
		};
	}

	match (matching, default) {
		(Some((artifact, secondaries)), _) => Selection::Matching {
			artifact,
			secondaries,
		},
		(None, Some(artifact)) => Selection::Default {
			artifact,
			secondaries: default_secondaries,
		},
		(None, None) => Selection::NoData,
	}
}

/// Python truthiness of a json value.
fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}
