//! Search strategies proposed by the strategy generator.
//!
//! The generator is an LLM, so its output is parsed leniently: malformed entries are dropped
//! rather than failing the whole plan.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraint::{Constraint, ConstraintValue, Dimension};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
	pub priority: u32,
	pub name: String,
	pub constraints: Vec<Constraint>,
	/// Free-text scent words that still need vocabulary resolution.
	pub note_keywords: Vec<String>,
	pub use_vector_search: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPlan {
	pub scenario: Option<String>,
	pub strategies: Vec<Strategy>,
}

/// Parses `{"plans": [...]}` into at most `max` strategies ordered by priority.
pub fn parse_plan(raw: &Value, max: usize) -> StrategyPlan {
	let scenario = raw
		.get("scenario_type")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string);
	let Some(entries) = raw.get("plans").and_then(Value::as_array) else {
		return StrategyPlan { scenario, strategies: Vec::new() };
	};
	let mut strategies: Vec<Strategy> = entries
		.iter()
		.enumerate()
		.filter_map(|(idx, entry)| parse_strategy(entry, idx as u32 + 1))
		.collect();

	strategies.sort_by_key(|strategy| strategy.priority);
	strategies.truncate(max);

	StrategyPlan { scenario, strategies }
}

fn parse_strategy(entry: &Value, default_priority: u32) -> Option<Strategy> {
	let object = entry.as_object()?;
	let priority = object
		.get("priority")
		.and_then(Value::as_u64)
		.and_then(|p| u32::try_from(p).ok())
		.unwrap_or(default_priority);
	let name = object
		.get("strategy_name")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.unwrap_or_else(|| format!("Strategy {priority}"));
	let constraints = object
		.get("filters")
		.and_then(Value::as_array)
		.map(|filters| filters.iter().filter_map(parse_filter).collect())
		.unwrap_or_default();
	let note_keywords = object.get("note_keywords").map(string_list).unwrap_or_default();
	let use_vector_search =
		object.get("use_vector_search").and_then(Value::as_bool).unwrap_or(false);

	Some(Strategy { priority, name, constraints, note_keywords, use_vector_search })
}

fn parse_filter(filter: &Value) -> Option<Constraint> {
	let dimension = Dimension::parse(filter.get("column")?.as_str()?)?;
	let value = match filter.get("value")? {
		Value::Array(_) => ConstraintValue::Many(string_list(filter.get("value")?)),
		other => ConstraintValue::One(scalar_text(other)?),
	};

	(!value.is_empty()).then_some(Constraint { dimension, value })
}

fn string_list(value: &Value) -> Vec<String> {
	match value {
		Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
		other => scalar_text(other).into_iter().collect(),
	}
}

fn scalar_text(value: &Value) -> Option<String> {
	let text = match value {
		Value::String(s) => s.trim().to_string(),
		Value::Number(n) => n.to_string(),
		_ => return None,
	};

	(!text.is_empty()).then_some(text)
}
