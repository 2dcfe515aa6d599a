use serde::Serialize;
use serde_json::Value;

use crate::DabcatError;
use crate::DabcatResult;
use crate::substitution::Parameters;
use crate::substitution::SubstitutionMap;
use crate::substitution::replacerize;
use crate::substitution::substitute_literal;

/// Decode a fixture payload, applying `map` to the raw text first.
///
/// A fixture is a non-empty json array of objects. Every object needs at
/// least one of `data` or `summary`.
pub fn load_fixture(content: &str, map: Option<&SubstitutionMap>) -> DabcatResult<Vec<Value>> {
	let content = match map {
		Some(map) => substitute_literal(content, map),
		None => content.to_string(),
	};

	let value: Value = serde_json::from_str(&content)
		.map_err(|e| DabcatError::MalformedPayload(format!("not valid json: {e}")))?;
	let Value::Array(items) = value else {
		return Err(DabcatError::MalformedPayload(
			"expected a json array at the top level".to_string(),
		));
	};

	validate_items(&items)?;
	Ok(items)
}

fn validate_items(items: &[Value]) -> DabcatResult<()> {
	if items.is_empty() {
		return Err(DabcatError::MalformedPayload(
			"the array must contain at least one result".to_string(),
		));
	}

	for (index, item) in items.iter().enumerate() {
		let Value::Object(fields) = item else {
			return Err(DabcatError::MalformedPayload(format!(
				"item {index} is not an object"
			)));
		};

		if !fields.contains_key("data") && !fields.contains_key("summary") {
			return Err(DabcatError::MalformedPayload(format!(
				"item {index} is missing the keys `data` and `summary`"
			)));
		}
	}

	Ok(())
}

/// The action result a fixture produces when replayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
	/// `summary` of the first item.
	pub summary: Value,
	/// `message` of the first item, rendered as text.
	pub message: String,
	/// `data` of every item, in order.
	pub data: Vec<Value>,
}

impl ActionResponse {
	pub fn from_items(items: &[Value]) -> DabcatResult<Self> {
		validate_items(items)?;
		let first = &items[0];

		let message = match first.get("message") {
			Some(Value::String(message)) => message.clone(),
			Some(Value::Null) | None => String::new(),
			Some(other) => other.to_string(),
		};

		Ok(Self {
			summary: first.get("summary").cloned().unwrap_or(Value::Null),
			message,
			data: items
				.iter()
				.map(|item| item.get("data").cloned().unwrap_or(Value::Null))
				.collect(),
		})
	}
}

/// Replay a stored payload the way the generated code does: when the record
/// references a replacerizer map, both substitution passes run before the
/// payload is decoded.
pub fn replay_fixture<P>(
	content: &str,
	map: Option<&SubstitutionMap>,
	params: &P,
) -> DabcatResult<ActionResponse>
where
	P: Parameters + ?Sized,
{
	let resolved = match map {
		Some(map) => replacerize(content, map, params)?,
		None => content.to_string(),
	};
	let items = load_fixture(&resolved, None)?;
	ActionResponse::from_items(&items)
}
