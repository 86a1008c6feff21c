//! Conversation context and the pure transitions of the dialogue state machine.

use serde::{Deserialize, Serialize};

const ABSENT_MARKERS: [&str; 7] =
	["", "none", "unknown", "n/a", "null", "no information", "정보 없음"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
	Clarifying,
	Retrieving,
	DirectReply,
}
impl Route {
	/// Maps a classifier label to a route. Anything unrecognised is treated as under-specified.
	pub fn from_label(label: &str) -> Self {
		match label.trim().to_ascii_lowercase().as_str() {
			"researcher" | "retrieving" | "retrieve" => Self::Retrieving,
			"writer" | "direct_reply" | "reply" => Self::DirectReply,
			_ => Self::Clarifying,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Clarifying => "clarifying",
			Self::Retrieving => "retrieving",
			Self::DirectReply => "direct_reply",
		}
	}
}

/// Facts extracted from one user answer. Missing fields mean the user did not mention them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactUpdate {
	pub brand: Option<String>,
	pub mood: Option<String>,
	pub preference: Option<String>,
	pub target: Option<String>,
	pub extras: Vec<String>,
}

/// Everything learned about the user's intent so far in one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
	pub brand: Option<String>,
	/// Mood or image words, e.g. "chic, cold".
	pub mood: Option<String>,
	/// Concrete scent descriptors, e.g. "woody".
	pub preference: Option<String>,
	pub target: Option<String>,
	pub extras: Vec<String>,
	pub clarifying_turns: u32,
}
impl ConversationContext {
	/// Folds newly stated facts in. Known facts are never cleared by an absent value.
	pub fn merge(&self, update: FactUpdate) -> Self {
		let mut next = self.clone();

		if let Some(brand) = present(update.brand) {
			next.brand = Some(brand);
		}
		if let Some(target) = present(update.target) {
			next.target = Some(target);
		}

		next.mood = accumulate(next.mood.take(), present(update.mood));
		next.preference = accumulate(next.preference.take(), present(update.preference));

		for extra in update.extras.into_iter().filter_map(|extra| present(Some(extra))) {
			if !next.extras.iter().any(|known| known.eq_ignore_ascii_case(&extra)) {
				next.extras.push(extra);
			}
		}

		next
	}

	/// A qualitative hint is required; a brand or audience alone is not enough to search on.
	pub fn is_sufficient(&self) -> bool {
		self.preference.is_some() || self.mood.is_some()
	}

	pub fn is_empty(&self) -> bool {
		self.brand.is_none()
			&& self.mood.is_none()
			&& self.preference.is_none()
			&& self.target.is_none()
			&& self.extras.is_empty()
	}

	pub fn summary(&self) -> String {
		let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "unknown".to_string());
		let mut out = format!(
			"brand: {}, image: {}, preference: {}, target: {}",
			field(&self.brand),
			field(&self.mood),
			field(&self.preference),
			field(&self.target),
		);

		if !self.extras.is_empty() {
			out.push_str(&format!(", other: {}", self.extras.join("; ")));
		}

		out
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClarifyOutcome {
	Sufficient,
	TurnCapReached,
	NeedsMore,
}

/// Judges a context whose turn counter already includes the current turn.
pub fn judge(context: &ConversationContext, max_turns: u32) -> ClarifyOutcome {
	if context.is_sufficient() {
		ClarifyOutcome::Sufficient
	} else if context.clarifying_turns >= max_turns {
		ClarifyOutcome::TurnCapReached
	} else {
		ClarifyOutcome::NeedsMore
	}
}

pub fn is_absent(value: &str) -> bool {
	let normalized = value.trim().to_lowercase();

	ABSENT_MARKERS.iter().any(|marker| normalized == *marker)
}

fn present(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !is_absent(v))
}

fn accumulate(known: Option<String>, new: Option<String>) -> Option<String> {
	match (known, new) {
		(Some(known), Some(new)) => {
			if known.to_lowercase().contains(&new.to_lowercase()) {
				Some(known)
			} else {
				Some(format!("{known}, {new}"))
			}
		},
		(known, new) => known.or(new),
	}
}
