//! Entity Corrector: canonical spelling for brand and item-name constraints.

use tracing::warn;

use crate::{EntityColumn, ScentenceService};
use scentence_domain::constraint::{Constraint, ConstraintValue, Dimension};

impl ScentenceService {
	/// Canonical catalog spelling of `candidate`, or `None` when nothing matches or the lookup fails.
	pub async fn correct_entity(&self, column: EntityColumn, candidate: &str) -> Option<String> {
		match self.stores.catalog.find_entity(column, candidate).await {
			Ok(found) => found,
			Err(err) => {
				warn!(error = %err, candidate, "Entity lookup failed; keeping the raw value.");

				None
			},
		}
	}

	/// Rewrites brand and item-name values to catalog spelling. Unmatched values are kept as given.
	pub async fn correct_constraints(&self, constraints: Vec<Constraint>) -> Vec<Constraint> {
		let mut corrected = Vec::with_capacity(constraints.len());

		for constraint in constraints {
			let column = match constraint.dimension {
				Dimension::Brand => EntityColumn::Brand,
				Dimension::ItemName => EntityColumn::ItemName,
				_ => {
					corrected.push(constraint);

					continue;
				},
			};
			let value = match constraint.value {
				ConstraintValue::One(raw) => ConstraintValue::One(
					self.correct_entity(column, &raw).await.unwrap_or(raw),
				),
				ConstraintValue::Many(raws) => {
					let mut values = Vec::with_capacity(raws.len());

					for raw in raws {
						values.push(self.correct_entity(column, &raw).await.unwrap_or(raw));
					}

					ConstraintValue::Many(values)
				},
			};

			corrected.push(Constraint { dimension: constraint.dimension, value });
		}

		corrected
	}
}
