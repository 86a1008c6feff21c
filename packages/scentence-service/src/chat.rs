//! Request-level entry points used by the HTTP layer.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Decision, Error, ResearchReport, Result, ScentenceService, StrategyRun};
use scentence_domain::dialogue::{ConversationContext, Route};

const DEFAULT_RESOLVE_K: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
	pub utterance: String,
	#[serde(default)]
	pub context: ConversationContext,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
	pub route: Route,
	pub reply: String,
	pub context: ConversationContext,
	pub strategies: Vec<StrategyRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
	pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
	pub reply: String,
	pub report: ResearchReport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
	pub token: String,
	pub k: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
	pub notes: Vec<String>,
}

impl ScentenceService {
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let utterance = req.utterance.trim();

		if utterance.is_empty() {
			return Err(Error::InvalidRequest { message: "utterance must be non-empty.".to_string() });
		}

		let turn = self.dialogue_turn(req.context, utterance).await;

		match turn.decision {
			Decision::Ask { question } => Ok(ChatResponse {
				route: turn.route,
				reply: question,
				context: turn.context,
				strategies: Vec::new(),
			}),
			Decision::Retrieve { query } => {
				info!(query = %query, "Retrieving recommendations.");

				let report = self.research(&query).await;
				let reply = self.compose_reply(&query, &report).await;

				Ok(ChatResponse {
					route: turn.route,
					reply,
					context: turn.context,
					strategies: report.runs,
				})
			},
			Decision::DirectReply => Ok(ChatResponse {
				route: turn.route,
				reply: self.direct_reply(utterance).await,
				context: turn.context,
				strategies: Vec::new(),
			}),
		}
	}

	/// Skips the dialogue and researches `query` directly.
	pub async fn recommend(&self, req: RecommendRequest) -> Result<RecommendResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let report = self.research(query).await;
		let reply = self.compose_reply(query, &report).await;

		Ok(RecommendResponse { reply, report })
	}

	pub async fn resolve_vocabulary(&self, req: ResolveRequest) -> Result<ResolveResponse> {
		let token = req.token.trim();
		let k = req.k.unwrap_or(DEFAULT_RESOLVE_K);

		if token.is_empty() {
			return Err(Error::InvalidRequest { message: "token must be non-empty.".to_string() });
		}
		if k == 0 {
			return Err(Error::InvalidRequest {
				message: "k must be greater than zero.".to_string(),
			});
		}

		Ok(ResolveResponse { notes: self.resolve_term(token, k as usize).await })
	}
}
