use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Catalog dimensions a strategy may constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
	Brand,
	ItemName,
	Note,
	Season,
	Audience,
	Occasion,
	Accord,
}
impl Dimension {
	/// Parses the column labels emitted by strategy generation. Unknown labels yield `None`.
	pub fn parse(label: &str) -> Option<Self> {
		match label.trim().to_ascii_lowercase().as_str() {
			"brand" => Some(Self::Brand),
			"perfume_name" | "name" | "item_name" => Some(Self::ItemName),
			"note" | "notes" => Some(Self::Note),
			"season" => Some(Self::Season),
			"gender" | "audience" => Some(Self::Audience),
			"occasion" => Some(Self::Occasion),
			"accord" => Some(Self::Accord),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Brand => "brand",
			Self::ItemName => "item_name",
			Self::Note => "note",
			Self::Season => "season",
			Self::Audience => "audience",
			Self::Occasion => "occasion",
			Self::Accord => "accord",
		}
	}

	/// Situational framing rather than scent identity.
	pub fn is_context(self) -> bool {
		matches!(self, Self::Season | Self::Occasion)
	}
}
impl Display for Dimension {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
	One(String),
	Many(Vec<String>),
}
impl ConstraintValue {
	pub fn is_empty(&self) -> bool {
		match self {
			Self::One(value) => value.trim().is_empty(),
			Self::Many(values) => values.iter().all(|value| value.trim().is_empty()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
	pub dimension: Dimension,
	pub value: ConstraintValue,
}
impl Constraint {
	pub fn one(dimension: Dimension, value: impl Into<String>) -> Self {
		Self { dimension, value: ConstraintValue::One(value.into()) }
	}

	pub fn many(dimension: Dimension, values: Vec<String>) -> Self {
		Self { dimension, value: ConstraintValue::Many(values) }
	}
}

pub fn has_dimension(constraints: &[Constraint], dimension: Dimension) -> bool {
	constraints.iter().any(|constraint| constraint.dimension == dimension)
}
