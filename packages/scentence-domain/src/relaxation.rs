//! The constraint relaxation ladder.
//!
//! Each rung is a pure function over the constraint list produced by the previous rung that was
//! planned. A rung returns `None` when its precondition does not hold, in which case it is skipped
//! and the next rung sees the same input.

use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, Dimension, has_dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
	Strict,
	RelaxedContext,
	BroadScent,
	Emergency,
}
impl Tier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Strict => "strict",
			Self::RelaxedContext => "relaxed_context",
			Self::BroadScent => "broad_scent",
			Self::Emergency => "emergency",
		}
	}
}

pub struct RelaxationStep {
	pub tier: Tier,
	pub apply: fn(&[Constraint]) -> Option<Vec<Constraint>>,
}

/// One query the retrieval engine should run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAttempt {
	pub tier: Tier,
	pub constraints: Vec<Constraint>,
}

pub const LADDER: [RelaxationStep; 4] = [
	RelaxationStep { tier: Tier::Strict, apply: keep_all },
	RelaxationStep { tier: Tier::RelaxedContext, apply: drop_context },
	RelaxationStep { tier: Tier::BroadScent, apply: drop_notes_keep_accord },
	RelaxationStep { tier: Tier::Emergency, apply: brand_and_audience_only },
];

pub fn keep_all(constraints: &[Constraint]) -> Option<Vec<Constraint>> {
	Some(constraints.to_vec())
}

pub fn drop_context(constraints: &[Constraint]) -> Option<Vec<Constraint>> {
	Some(constraints.iter().filter(|c| !c.dimension.is_context()).cloned().collect())
}

/// Without an accord there is no scent signal left once notes are gone.
pub fn drop_notes_keep_accord(constraints: &[Constraint]) -> Option<Vec<Constraint>> {
	let relaxed: Vec<Constraint> =
		constraints.iter().filter(|c| c.dimension != Dimension::Note).cloned().collect();

	has_dimension(&relaxed, Dimension::Accord).then_some(relaxed)
}

/// A brandless fallback is too generic to be a recommendation.
pub fn brand_and_audience_only(constraints: &[Constraint]) -> Option<Vec<Constraint>> {
	if !has_dimension(constraints, Dimension::Brand) {
		return None;
	}

	Some(
		constraints
			.iter()
			.filter(|c| matches!(c.dimension, Dimension::Brand | Dimension::Audience))
			.cloned()
			.collect(),
	)
}

/// Expands a constraint list into the ordered attempts of the ladder.
///
/// An empty input plans nothing. A rung whose constraint list equals the previous attempt is
/// dropped since re-running it cannot change the outcome.
pub fn plan(constraints: &[Constraint]) -> Vec<PlannedAttempt> {
	let mut attempts: Vec<PlannedAttempt> = Vec::new();

	if constraints.is_empty() {
		return attempts;
	}

	let mut current = constraints.to_vec();

	for step in LADDER.iter() {
		let Some(next) = (step.apply)(&current) else {
			continue;
		};

		let repeated = attempts.last().map(|last| last.constraints == next).unwrap_or(false);

		if !next.is_empty() && !repeated {
			attempts.push(PlannedAttempt { tier: step.tier, constraints: next.clone() });
		}

		current = next;
	}

	attempts
}
