use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::DabcatError;
use crate::DabcatResult;

/// Identity fields every app json must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["name", "product_name", "appid"];

/// Name, product and id given to the dummy app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppIdentity {
	pub name: String,
	pub product_name: String,
	pub appid: String,
}

/// The app json, with key order preserved so a rewrite only changes the
/// identity fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AppMetadata {
	fields: Map<String, Value>,
}

impl AppMetadata {
	pub fn from_json(content: &str) -> DabcatResult<Self> {
		let value: Value = serde_json::from_str(content)
			.map_err(|e| DabcatError::MalformedMetadata(format!("not valid json: {e}")))?;
		let Value::Object(fields) = value else {
			return Err(DabcatError::MalformedMetadata(
				"expected a json object at the top level".to_string(),
			));
		};

		for key in REQUIRED_KEYS {
			if !fields.get(key).is_some_and(Value::is_string) {
				return Err(DabcatError::MalformedMetadata(format!(
					"missing string value for `{key}`"
				)));
			}
		}

		Ok(Self { fields })
	}

	fn string_field(&self, key: &str) -> &str {
		self.fields.get(key).and_then(Value::as_str).unwrap_or_default()
	}

	pub fn name(&self) -> &str {
		self.string_field("name")
	}

	pub fn product_name(&self) -> &str {
		self.string_field("product_name")
	}

	pub fn appid(&self) -> &str {
		self.string_field("appid")
	}

	pub fn identity(&self) -> AppIdentity {
		AppIdentity {
			name: self.name().to_string(),
			product_name: self.product_name().to_string(),
			appid: self.appid().to_string(),
		}
	}

	/// The identity suggested for a dummy copy of this app.
	pub fn suggested_name(&self) -> String {
		format!("{} DEV", self.name())
	}

	pub fn suggested_product_name(&self) -> String {
		format!("{} DEV", self.product_name())
	}

	/// Overwrite the identity fields in place.
	pub fn rename(&mut self, identity: &AppIdentity) {
		self.fields
			.insert("name".to_string(), Value::String(identity.name.clone()));
		self.fields.insert(
			"product_name".to_string(),
			Value::String(identity.product_name.clone()),
		);
		self.fields
			.insert("appid".to_string(), Value::String(identity.appid.clone()));
	}

	/// Pretty json with four-space indentation.
	pub fn to_pretty_json(&self) -> DabcatResult<String> {
		let mut buffer = Vec::new();
		let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
		let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
		self.fields.serialize(&mut serializer)?;
		String::from_utf8(buffer)
			.map_err(|e| DabcatError::MalformedMetadata(format!("not valid utf-8: {e}")))
	}
}
