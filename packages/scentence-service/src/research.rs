//! Strategy generation and per-strategy retrieval.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::{info, warn};

use crate::{ChatMessage, MetaDimension, ScentenceService};
use scentence_domain::{
	aggregate::{self, ItemSummary},
	constraint::{Constraint, ConstraintValue, Dimension},
	relaxation::Tier,
	strategy::{self, Strategy, StrategyPlan},
};

const STRATEGY_SYSTEM_PROMPT: &str = "\
You are a perfume director who knows the catalog database inside out. \
Turn the customer's request into distinct styling strategies that can be run as catalog searches. \
Respond with a single JSON object and nothing else.";

/// Filter vocabularies the strategy generator may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaValues {
	pub seasons: Vec<String>,
	pub occasions: Vec<String>,
	pub accords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRun {
	pub priority: u32,
	pub name: String,
	pub constraints: Vec<Constraint>,
	/// Tier that produced the items; `None` when the strategy matched nothing.
	pub tier: Option<Tier>,
	pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResearchReport {
	pub query: String,
	pub scenario: Option<String>,
	pub runs: Vec<StrategyRun>,
}
impl ResearchReport {
	pub fn has_matches(&self) -> bool {
		self.runs.iter().any(|run| !run.items.is_empty())
	}

	/// Plain-text digest of every strategy that matched, as handed to reply composition.
	pub fn render(&self) -> String {
		let mut out = String::new();

		for run in &self.runs {
			let Some(tier) = run.tier else {
				continue;
			};
			let _ = writeln!(out, "\n=== [Strategy: {}] ===", run.name);

			out.push_str(&aggregate::render_summaries(tier, &run.items));
		}

		if out.is_empty() { "No search results.".to_string() } else { out }
	}
}

pub fn strategy_prompt(query: &str, meta: &MetaValues, max_strategies: u32) -> String {
	let quoted = |values: &[String]| {
		values.iter().map(|value| format!("'{value}'")).collect::<Vec<_>>().join(", ")
	};

	format!(
		"\
Customer request: \"{query}\"

Plan up to {max_strategies} distinct strategies for this request.

[1. Data mapping]
Whenever the request mentions something that matches an allowed value below, put it in `filters`.
- brand: brand name, e.g. 'Chanel', 'Dior'.
- gender: 'Feminine', 'Masculine' or 'Unisex'.
- season, allowed values: [{seasons}]
- occasion, allowed values: [{occasions}]
- accord, allowed values: [{accords}]
Filter values must be chosen from the allowed values and written in English.

[2. Scenarios]
Type A (image or mood, e.g. \"chic\", \"cozy\"): put abstract words that are not allowed values into \
`note_keywords` and set `use_vector_search` to true.
Type B (specific conditions, e.g. \"citrus for summer\"): prefer `filters`.
Type D (gift or first perfume): add crowd-pleasing keywords such as \"Soap\", \"Clean\", \"Light Floral\".

[3. Styling frame]
Plan 1 harmony: reflect the image directly.
Plan 2 gap: an unexpected charm point.
Plan 3 shift: a balanced change of direction.

[4. Rules]
Give each strategy a short, plain `strategy_name` a beginner understands.

Respond with JSON shaped like:
{{
	\"scenario_type\": \"Type B (Specific)\",
	\"plans\": [
		{{
			\"priority\": 1,
			\"strategy_name\": \"Bright summer citrus\",
			\"filters\": [
				{{\"column\": \"season\", \"value\": \"Summer\"}},
				{{\"column\": \"accord\", \"value\": \"Citrus\"}},
				{{\"column\": \"gender\", \"value\": \"Unisex\"}}
			],
			\"note_keywords\": [\"Fresh\", \"Lime\"],
			\"use_vector_search\": true
		}}
	]
}}",
		seasons = quoted(&meta.seasons),
		occasions = quoted(&meta.occasions),
		accords = quoted(&meta.accords),
	)
}

impl ScentenceService {
	/// Generates strategies for `query` and runs each one through the retrieval ladder.
	pub async fn research(&self, query: &str) -> ResearchReport {
		let meta = self.meta_values().await;
		let plan = self.plan_strategies(query, &meta).await;

		info!(
			scenario = plan.scenario.as_deref().unwrap_or("unknown"),
			strategies = plan.strategies.len(),
			"Strategy plan ready."
		);

		let mut runs = Vec::with_capacity(plan.strategies.len());

		for strategy in &plan.strategies {
			runs.push(self.run_strategy(query, strategy).await);
		}

		ResearchReport { query: query.to_string(), scenario: plan.scenario, runs }
	}

	/// Distinct filter values from the catalog, falling back to configured defaults per dimension.
	pub async fn meta_values(&self) -> MetaValues {
		let fallback = &self.cfg.strategy;

		MetaValues {
			seasons: self.distinct_or(MetaDimension::Season, &fallback.fallback_seasons).await,
			occasions: self.distinct_or(MetaDimension::Occasion, &fallback.fallback_occasions).await,
			accords: self.distinct_or(MetaDimension::Accord, &fallback.fallback_accords).await,
		}
	}

	/// Never fails: a broken or unparseable generator call yields an empty plan.
	pub async fn plan_strategies(&self, query: &str, meta: &MetaValues) -> StrategyPlan {
		let max = self.cfg.strategy.max_strategies;
		let messages = vec![
			ChatMessage::system(STRATEGY_SYSTEM_PROMPT),
			ChatMessage::user(strategy_prompt(query, meta, max)),
		];

		match self.providers.llm.complete(&self.cfg.providers.llm_strategy, &messages, true).await {
			Ok(output) => match output.into_json() {
				Some(raw) => strategy::parse_plan(&raw, max as usize),
				None => {
					warn!("Strategy generator returned no JSON; using an empty plan.");

					StrategyPlan::default()
				},
			},
			Err(err) => {
				warn!(error = %err, "Strategy generation failed; using an empty plan.");

				StrategyPlan::default()
			},
		}
	}

	/// Canonicalizes entity values and note filters, then merges them with resolved keywords into
	/// one note set constraint. A note filter the vocabulary cannot place is kept as written.
	pub async fn normalize_strategy(&self, query: &str, strategy: &Strategy) -> Vec<Constraint> {
		let (note_filters, others): (Vec<Constraint>, Vec<Constraint>) =
			strategy.constraints.iter().cloned().partition(|c| c.dimension == Dimension::Note);
		let mut constraints = self.correct_constraints(others).await;
		let resolver = self.term_resolver();
		let mut notes: Vec<String> = Vec::new();

		for filter in note_filters {
			let raw = match filter.value {
				ConstraintValue::One(value) => vec![value],
				ConstraintValue::Many(values) => values,
			};

			for value in raw {
				let canonical = resolver.resolve(&value, 1).await.into_iter().next();

				notes.push(canonical.unwrap_or(value));
			}
		}

		if strategy.use_vector_search {
			notes.extend(resolver.resolve(query, self.cfg.resolver.request_top_k as usize).await);
		}

		for keyword in &strategy.note_keywords {
			notes.extend(resolver.resolve(keyword, self.cfg.resolver.keyword_top_k as usize).await);
		}

		let mut distinct: Vec<String> = Vec::with_capacity(notes.len());

		for note in notes {
			let note = note.trim().to_string();

			if !note.is_empty() && !distinct.iter().any(|d| d.eq_ignore_ascii_case(&note)) {
				distinct.push(note);
			}
		}

		if !distinct.is_empty() {
			constraints.push(Constraint::many(Dimension::Note, distinct));
		}

		constraints
	}

	pub async fn run_strategy(&self, query: &str, strategy: &Strategy) -> StrategyRun {
		info!(priority = strategy.priority, name = %strategy.name, "Running strategy.");

		let constraints = self.normalize_strategy(query, strategy).await;
		let outcome = self.retrieve(&constraints).await;
		let items = outcome
			.items()
			.iter()
			.map(|item| aggregate::summarize(item, &self.cfg.aggregation))
			.collect::<Vec<_>>();

		if items.is_empty() {
			info!(name = %strategy.name, "Strategy found nothing.");
		}

		StrategyRun {
			priority: strategy.priority,
			name: strategy.name.clone(),
			constraints,
			tier: outcome.tier(),
			items,
		}
	}

	async fn distinct_or(&self, dimension: MetaDimension, fallback: &[String]) -> Vec<String> {
		match self.stores.catalog.distinct_values(dimension).await {
			Ok(values) if !values.is_empty() => values,
			Ok(_) => fallback.to_vec(),
			Err(err) => {
				warn!(error = %err, ?dimension, "Filter vocabulary unavailable; using defaults.");

				fallback.to_vec()
			},
		}
	}
}
