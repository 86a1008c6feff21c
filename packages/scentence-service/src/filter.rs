//! Filter Compiler: abstract constraints to bound catalog predicates.

use std::collections::HashSet;

use crate::{Column, Predicate};
use scentence_domain::constraint::{Constraint, ConstraintValue, Dimension};

pub fn column_for(dimension: Dimension) -> Column {
	match dimension {
		Dimension::Brand => Column::PerfumeBrand,
		Dimension::ItemName => Column::PerfumeName,
		Dimension::Note => Column::Note,
		Dimension::Season => Column::Season,
		Dimension::Audience => Column::Audience,
		Dimension::Occasion => Column::Occasion,
		Dimension::Accord => Column::Accord,
	}
}

/// Compiles constraints in order. Empty values and empty sets produce no predicate.
pub fn compile(constraints: &[Constraint]) -> Vec<Predicate> {
	constraints.iter().filter_map(compile_constraint).collect()
}

pub fn compile_constraint(constraint: &Constraint) -> Option<Predicate> {
	let column = column_for(constraint.dimension);
	let mut values = match &constraint.value {
		ConstraintValue::One(value) => vec![value.trim().to_string()],
		ConstraintValue::Many(values) => values.iter().map(|v| v.trim().to_string()).collect(),
	};

	let mut seen = HashSet::new();

	values.retain(|value| !value.is_empty() && seen.insert(value.clone()));

	let first = values.first()?.clone();

	match constraint.dimension {
		Dimension::Brand => Some(Predicate::ILike { column, value: first }),
		Dimension::ItemName => Some(Predicate::Contains { column, value: first }),
		_ if values.len() == 1 => Some(Predicate::Equals { column, value: first }),
		_ => Some(Predicate::AnyOf { column, values }),
	}
}

/// Drops constraints whose value is empty so the relaxation ladder only sees real filters.
pub fn sanitize(constraints: &[Constraint]) -> Vec<Constraint> {
	constraints.iter().filter(|c| !c.value.is_empty()).cloned().collect()
}
