//! Dialogue Router: one conversation turn through the routing state machine.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{ChatMessage, ScentenceService};
use scentence_domain::dialogue::{self, ClarifyOutcome, ConversationContext, FactUpdate, Route};

const ROUTER_PROMPT: &str = "\
You control the flow of a perfume recommendation conversation. Classify the user's latest utterance.

1. researcher (search now): pick this only for a complete request that can be searched without any \
further context, e.g. \"a woody Jo Malone perfume\" or \"a rose perfume for a woman in her 20s\".
2. interviewer (update context and ask): most utterances belong here. Short answers or attributes \
(\"cute\", \"chic\", \"something woody\", \"20s\") and incomplete requests (\"recommend a Jo Malone\") \
go here so they can be merged with what was said earlier.
3. writer (small talk or exit): greetings, complaints about the system, or requests to stop that \
have nothing to do with perfume.
When in doubt, answer interviewer.

Respond with JSON: {\"route\": \"interviewer\" | \"researcher\" | \"writer\"}";
const EXTRACTION_PROMPT: &str = "\
Extract perfume recommendation facts from the user's answer exactly as stated.
- Always record image or mood words (chic, cold, lovely) even when no scent is named.
- Never guess anything the user did not say; use null for fields they did not mention.

Respond with JSON: {\"brand\": string|null, \"mood\": string|null, \"preference\": string|null, \
\"target\": string|null, \"extras\": [string]}";
const QUESTION_PROMPT: &str = "\
You are a friendly perfume consultant. The information gathered so far is not enough to search. \
Ask exactly one short follow-up question that builds on what the user just said. If the user \
mentioned an image such as \"cold\", offer two concrete interpretations to choose from. If there \
is nothing to build on, ask about their usual style or mood (for example cute or chic). \
Reply with the question only.";
const EXTRACTION_APOLOGY: &str =
	"Sorry, something went wrong on my side. Could you say that once more?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
	Ask { question: String },
	Retrieve { query: String },
	DirectReply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
	pub route: Route,
	pub context: ConversationContext,
	pub decision: Decision,
}

impl ScentenceService {
	/// Classifies the utterance. A failed or unparseable call falls back to a direct reply.
	pub async fn route_utterance(&self, utterance: &str) -> Route {
		let messages = vec![ChatMessage::system(ROUTER_PROMPT), ChatMessage::user(utterance)];
		let result = self.providers.llm.complete(&self.cfg.providers.llm_fast, &messages, true).await;
		let route = match result {
			Ok(output) => match output.into_json().as_ref().and_then(|raw| raw.get("route")) {
				Some(Value::String(label)) => Route::from_label(label),
				_ => {
					warn!("Router returned no route label; replying directly.");

					Route::DirectReply
				},
			},
			Err(err) => {
				warn!(error = %err, "Routing failed; replying directly.");

				Route::DirectReply
			},
		};

		info!(route = route.as_str(), "Utterance routed.");

		route
	}

	/// Runs one turn: route, then clarify when the router asks for it.
	pub async fn dialogue_turn(&self, context: ConversationContext, utterance: &str) -> TurnOutcome {
		match self.route_utterance(utterance).await {
			Route::Retrieving => {
				let query = retrieval_query(&context, utterance);
				let context = ConversationContext { clarifying_turns: 0, ..context };

				TurnOutcome { route: Route::Retrieving, context, decision: Decision::Retrieve { query } }
			},
			Route::DirectReply =>
				TurnOutcome { route: Route::DirectReply, context, decision: Decision::DirectReply },
			Route::Clarifying => self.clarify(context, utterance).await,
		}
	}

	/// One clarifying step: merge new facts, judge sufficiency, then ask or proceed.
	///
	/// Every call counts toward the turn cap, including one whose extraction failed.
	pub async fn clarify(&self, context: ConversationContext, utterance: &str) -> TurnOutcome {
		let Some(update) = self.extract_facts(&context, utterance).await else {
			let mut unchanged = context;

			unchanged.clarifying_turns += 1;

			if dialogue::judge(&unchanged, self.cfg.dialogue.max_clarifying_turns)
				== ClarifyOutcome::TurnCapReached
			{
				return Self::finish_clarifying(unchanged, utterance, false);
			}

			return TurnOutcome {
				route: Route::Clarifying,
				context: unchanged,
				decision: Decision::Ask { question: EXTRACTION_APOLOGY.to_string() },
			};
		};
		let mut merged = context.merge(update);

		merged.clarifying_turns += 1;

		match dialogue::judge(&merged, self.cfg.dialogue.max_clarifying_turns) {
			outcome @ (ClarifyOutcome::Sufficient | ClarifyOutcome::TurnCapReached) =>
				Self::finish_clarifying(merged, utterance, outcome == ClarifyOutcome::Sufficient),
			ClarifyOutcome::NeedsMore => {
				let question = self.follow_up_question(&merged, utterance).await;

				TurnOutcome {
					route: Route::Clarifying,
					context: merged,
					decision: Decision::Ask { question },
				}
			},
		}
	}

	fn finish_clarifying(
		mut context: ConversationContext,
		utterance: &str,
		sufficient: bool,
	) -> TurnOutcome {
		info!(turns = context.clarifying_turns, sufficient, "Clarification finished; retrieving.");

		let query = retrieval_query(&context, utterance);

		context.clarifying_turns = 0;

		TurnOutcome { route: Route::Retrieving, context, decision: Decision::Retrieve { query } }
	}

	async fn extract_facts(
		&self,
		context: &ConversationContext,
		utterance: &str,
	) -> Option<FactUpdate> {
		let messages = vec![
			ChatMessage::system(EXTRACTION_PROMPT),
			ChatMessage::user(format!(
				"Known so far: {}\nUser answer: {utterance}",
				context.summary()
			)),
		];

		match self.providers.llm.complete(&self.cfg.providers.llm_fast, &messages, true).await {
			Ok(output) => {
				let update = output.into_json().as_ref().and_then(parse_fact_update);

				if update.is_none() {
					warn!("Fact extraction returned no JSON object.");
				}

				update
			},
			Err(err) => {
				warn!(error = %err, "Fact extraction failed; keeping the context unchanged.");

				None
			},
		}
	}

	async fn follow_up_question(&self, context: &ConversationContext, utterance: &str) -> String {
		let messages = vec![
			ChatMessage::system(QUESTION_PROMPT),
			ChatMessage::user(format!(
				"Known so far: {}\nUser just said: {utterance}",
				context.summary()
			)),
		];

		match self.providers.llm.complete(&self.cfg.providers.llm_fast, &messages, false).await {
			Ok(output) => {
				let question = output.into_text().trim().to_string();

				if question.is_empty() { fallback_question(utterance) } else { question }
			},
			Err(err) => {
				warn!(error = %err, "Question generation failed; using the fallback question.");

				fallback_question(utterance)
			},
		}
	}
}

/// Lenient reading of the extraction JSON; fields of the wrong shape count as unmentioned.
pub fn parse_fact_update(raw: &Value) -> Option<FactUpdate> {
	let object = raw.as_object()?;
	let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
	let extras = match object.get("extras") {
		Some(Value::Array(items)) =>
			items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
		Some(Value::String(single)) => vec![single.clone()],
		_ => Vec::new(),
	};

	Some(FactUpdate {
		brand: text("brand"),
		mood: text("mood"),
		preference: text("preference"),
		target: text("target"),
		extras,
	})
}

pub fn retrieval_query(context: &ConversationContext, utterance: &str) -> String {
	if context.is_empty() {
		utterance.trim().to_string()
	} else {
		format!("{} ({})", context.summary(), utterance.trim())
	}
}

pub fn fallback_question(utterance: &str) -> String {
	format!(
		"You mentioned \"{}\". Could you tell me a little more about the mood you have in mind, \
for example cute and lovely, or chic and cool?",
		utterance.trim()
	)
}
