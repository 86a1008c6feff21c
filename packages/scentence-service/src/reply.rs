//! Reply composition for retrieval results and small talk.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::{ChatMessage, ResearchReport, ScentenceService};

const WRITER_PROMPT: &str = "\
You are the friendliest perfume consultant in the world, writing for beginners who know little \
about perfume.

Rules:
- Recommend only perfumes that appear in the search data. Never invent one.
- Pick exactly one perfume per strategy, never the same perfume twice, and do not mention that rule.
- Heading format: `## N. [strategy name] Brand - Perfume`, using the strategy name without any \
`Strategy:` prefix.
- Show the image as `![Perfume](image link)` when a link is available.
- Wrap item labels in underscores (`_What does it smell like?_`, `_Why this one_`, `_Info_`) and \
highlight key phrases with `**`.
- Separate recommendations with `---`.
- Info line: brand, name and release year only.
- Describe how the scent changes over time in plain sentences. Never use the words top, middle, \
base, note or accord.
- Explain calmly why the strategy led to this perfume; avoid marketing superlatives.";
const NO_RESULTS_REPLY: &str = "\
I could not find any perfume in the catalog that matches this request. Could you describe it a \
little differently, for example a scent you like (citrus, woody, floral), a mood (fresh, cozy, \
chic) or when you would wear it?";
const SMALL_TALK_PROMPT: &str = "\
You are a friendly perfume consultant. Answer the user briefly and warmly. If it fits, invite them \
to describe a scent, mood or occasion so you can recommend a perfume.";
const SMALL_TALK_FALLBACK: &str = "\
Hello! I can help you find a perfume. Tell me about a scent, a mood or an occasion you have in mind.";

static EMPHASIS: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"\*\*\s*(.*?)\s*\*\*").ok());

impl ScentenceService {
	/// Writes the recommendation answer. Without matches the reply says so instead of guessing.
	pub async fn compose_reply(&self, query: &str, report: &ResearchReport) -> String {
		if !report.has_matches() {
			return NO_RESULTS_REPLY.to_string();
		}

		let messages = vec![
			ChatMessage::system(WRITER_PROMPT),
			ChatMessage::user(format!(
				"[Customer request]: \"{query}\"\n\n[Search data]:\n{}",
				report.render()
			)),
		];

		match self.providers.llm.complete(&self.cfg.providers.llm_strategy, &messages, false).await {
			Ok(output) => {
				let text = output.into_text();

				if text.trim().is_empty() {
					plain_reply(report)
				} else {
					tighten_emphasis(&text)
				}
			},
			Err(err) => {
				warn!(error = %err, "Reply composition failed; returning the plain digest.");

				plain_reply(report)
			},
		}
	}

	pub async fn direct_reply(&self, utterance: &str) -> String {
		let messages = vec![ChatMessage::system(SMALL_TALK_PROMPT), ChatMessage::user(utterance)];

		match self.providers.llm.complete(&self.cfg.providers.llm_fast, &messages, false).await {
			Ok(output) => {
				let text = output.into_text().trim().to_string();

				if text.is_empty() { SMALL_TALK_FALLBACK.to_string() } else { text }
			},
			Err(err) => {
				warn!(error = %err, "Direct reply failed; using the canned greeting.");

				SMALL_TALK_FALLBACK.to_string()
			},
		}
	}
}

/// Removes padding inside `**...**` so markdown renders the emphasis.
pub fn tighten_emphasis(text: &str) -> String {
	match EMPHASIS.as_ref() {
		Some(re) => re.replace_all(text, "**$1**").into_owned(),
		None => text.to_string(),
	}
}

fn plain_reply(report: &ResearchReport) -> String {
	format!("Here is what I found in the catalog:\n{}", report.render())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn trims_spaces_inside_emphasis() {
		assert_eq!(
			tighten_emphasis("Starts with ** fresh lemon ** and dries into **  cedar**."),
			"Starts with **fresh lemon** and dries into **cedar**."
		);
	}
}
