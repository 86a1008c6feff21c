//! Progressive Retrieval Engine.

use serde::Serialize;
use tracing::{info, warn};

use crate::{ScentenceService, filter};
use scentence_domain::{aggregate::CatalogMatch, constraint::Constraint, relaxation, relaxation::Tier};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalOutcome {
	Matched { tier: Tier, items: Vec<CatalogMatch> },
	NoMatch,
}
impl RetrievalOutcome {
	pub fn tier(&self) -> Option<Tier> {
		match self {
			Self::Matched { tier, .. } => Some(*tier),
			Self::NoMatch => None,
		}
	}

	pub fn items(&self) -> &[CatalogMatch] {
		match self {
			Self::Matched { items, .. } => items,
			Self::NoMatch => &[],
		}
	}
}

impl ScentenceService {
	/// Runs the relaxation ladder until a tier returns rows.
	///
	/// A failing tier counts as zero rows. Only an empty constraint list or an exhausted ladder
	/// yields `NoMatch`.
	pub async fn retrieve(&self, constraints: &[Constraint]) -> RetrievalOutcome {
		let limit = self.cfg.retrieval.max_results;
		let attempts = relaxation::plan(&filter::sanitize(constraints));

		if attempts.is_empty() {
			info!("No usable constraints; skipping catalog search.");

			return RetrievalOutcome::NoMatch;
		}

		for attempt in attempts {
			let predicates = filter::compile(&attempt.constraints);

			info!(
				tier = attempt.tier.as_str(),
				predicates = predicates.len(),
				"Running catalog search."
			);

			match self.stores.catalog.search(&predicates, limit).await {
				Ok(items) if !items.is_empty() => {
					info!(tier = attempt.tier.as_str(), items = items.len(), "Catalog search matched.");

					return RetrievalOutcome::Matched { tier: attempt.tier, items };
				},
				Ok(_) => info!(tier = attempt.tier.as_str(), "No rows; relaxing constraints."),
				Err(err) => warn!(
					error = %err,
					tier = attempt.tier.as_str(),
					"Catalog search failed; treating tier as empty."
				),
			}
		}

		RetrievalOutcome::NoMatch
	}
}
