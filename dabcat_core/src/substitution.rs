//! The replacerizer: literal token substitution followed by wildcard
//! parameter resolution.
//!
//! The literal pass walks the [`SubstitutionMap`] in its stored order and
//! rewrites the running text, so a later key also sees text introduced by an
//! earlier replacement. With `{"A": "B", "B": "C"}` the input `"A"` becomes
//! `"C"`.
//!
//! The wildcard pass replaces every `***KEY***` with the value of `KEY` in a
//! parameter set. Matches are resolved left to right in a single pass and the
//! substituted output is never rescanned.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::LazyLock;

use derive_more::Deref;
use regex::Regex;
use serde::Deserialize;
use serde::Deserializer;
use serde::de::MapAccess;
use serde::de::Visitor;

use crate::DabcatError;
use crate::DabcatResult;

static WILDCARD_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\*\*\*([^*]+)\*\*\*").expect("wildcard pattern is valid"));

/// An ordered list of literal `token → replacement` pairs.
///
/// Order is significant: it is the order in which replacements are applied.
/// Inserting an existing key overwrites its value but keeps its original
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct SubstitutionMap(Vec<(String, String)>);

impl SubstitutionMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();

		if let Some(entry) = self.0.iter_mut().find(|(existing, _)| *existing == key) {
			entry.1 = value;
		} else {
			self.0.push((key, value));
		}
	}

	/// Decode a flat json object, keeping the order in which keys appear in
	/// the document.
	pub fn from_json(content: &str) -> DabcatResult<Self> {
		serde_json::from_str(content).map_err(|e| DabcatError::InvalidSubstitutionMap(e.to_string()))
	}
}

impl<K, V> FromIterator<(K, V)> for SubstitutionMap
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut map = Self::new();
		for (key, value) in iter {
			map.insert(key, value);
		}
		map
	}
}

impl<'de> Deserialize<'de> for SubstitutionMap {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct SubstitutionMapVisitor;

		impl<'de> Visitor<'de> for SubstitutionMapVisitor {
			type Value = SubstitutionMap;

			fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
				formatter.write_str("an object of string replacements")
			}

			fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut map = SubstitutionMap::new();
				while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
					let serde_json::Value::String(value) = value else {
						return Err(serde::de::Error::custom(format!(
							"value for `{key}` must be a string, found `{value}`"
						)));
					};
					map.insert(key, value);
				}
				Ok(map)
			}
		}

		deserializer.deserialize_map(SubstitutionMapVisitor)
	}
}

/// A read-only lookup used to resolve wildcard placeholders.
pub trait Parameters {
	fn parameter(&self, key: &str) -> Option<&str>;
}

impl<S: BuildHasher> Parameters for HashMap<String, String, S> {
	fn parameter(&self, key: &str) -> Option<&str> {
		self.get(key).map(String::as_str)
	}
}

impl Parameters for BTreeMap<String, String> {
	fn parameter(&self, key: &str) -> Option<&str> {
		self.get(key).map(String::as_str)
	}
}

/// Only string values can fill a placeholder.
impl Parameters for serde_json::Map<String, serde_json::Value> {
	fn parameter(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(serde_json::Value::as_str)
	}
}

/// Replace every literal occurrence of each key with its value, one key at a
/// time, in map order. Empty keys are skipped.
pub fn substitute_literal(text: &str, map: &SubstitutionMap) -> String {
	let mut result = text.to_string();

	for (key, value) in map.iter() {
		if key.is_empty() {
			continue;
		}
		result = result.replace(key.as_str(), value);
	}

	result
}

/// Replace every `***KEY***` placeholder with `params[KEY]`.
///
/// Fails on the first key that has no parameter. Nothing is returned in that
/// case, not even the text resolved so far.
pub fn resolve_wildcards<P>(text: &str, params: &P) -> DabcatResult<String>
where
	P: Parameters + ?Sized,
{
	let mut result = String::with_capacity(text.len());
	let mut last_end = 0;

	for captures in WILDCARD_PATTERN.captures_iter(text) {
		let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
			continue;
		};
		let Some(value) = params.parameter(key.as_str()) else {
			return Err(DabcatError::MissingParameter {
				key: key.as_str().to_string(),
			});
		};

		result.push_str(&text[last_end..whole.start()]);
		result.push_str(value);
		last_end = whole.end();
	}

	result.push_str(&text[last_end..]);
	Ok(result)
}

/// Both replacerizer passes: literal substitution, then wildcard resolution.
pub fn replacerize<P>(text: &str, map: &SubstitutionMap, params: &P) -> DabcatResult<String>
where
	P: Parameters + ?Sized,
{
	let substituted = substitute_literal(text, map);
	tracing::debug!(
		keys = map.len(),
		changed = substituted != text,
		"applied literal substitutions"
	);
	resolve_wildcards(&substituted, params)
}

/// Returns every distinct wildcard key referenced in `text`, in order of first
/// appearance.
pub fn wildcard_keys(text: &str) -> Vec<String> {
	let mut keys: Vec<String> = Vec::new();

	for captures in WILDCARD_PATTERN.captures_iter(text) {
		if let Some(key) = captures.get(1) {
			if !keys.iter().any(|existing| existing == key.as_str()) {
				keys.push(key.as_str().to_string());
			}
		}
	}

	keys
}
