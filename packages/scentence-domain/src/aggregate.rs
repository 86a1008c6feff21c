use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::relaxation::Tier;
use scentence_config::Aggregation;

/// Rendered in place of a dimension that has nothing trustworthy to show.
pub const NO_INFORMATION: &str = "no information";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagVote {
	pub name: String,
	pub vote: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
	pub name: String,
	#[serde(rename = "type")]
	pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteRole {
	Top,
	Middle,
	Base,
	Single,
}
impl NoteRole {
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(|value| value.trim().to_ascii_uppercase()).as_deref() {
			Some("TOP") => Self::Top,
			Some("MIDDLE") | Some("HEART") => Self::Middle,
			Some("BASE") => Self::Base,
			_ => Self::Single,
		}
	}
}

/// A catalog item with its full tag fan-out, as returned by retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMatch {
	pub perfume_id: i64,
	pub name: String,
	pub brand: String,
	pub img_link: Option<String>,
	pub perfumer: Option<String>,
	pub release_year: Option<i32>,
	pub notes: Vec<NoteEntry>,
	pub accords: Vec<TagVote>,
	pub seasons: Vec<TagVote>,
	pub audiences: Vec<TagVote>,
	pub occasions: Vec<TagVote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
	pub perfume_id: i64,
	pub brand: String,
	pub name: String,
	pub img_link: Option<String>,
	pub perfumer: Option<String>,
	pub release_year: Option<i32>,
	pub audience: String,
	pub accords: String,
	pub seasons: String,
	pub occasions: String,
	pub notes: String,
}

/// Keeps the tags whose share of the item's votes in this dimension reaches `threshold`.
pub fn filter_by_votes(tags: &[TagVote], threshold: f32) -> String {
	let voted: Vec<(&str, i64)> = tags
		.iter()
		.filter(|tag| !tag.name.trim().is_empty())
		.filter_map(|tag| tag.vote.map(|vote| (tag.name.as_str(), vote.max(0))))
		.collect();
	let total: i64 = voted.iter().map(|(_, vote)| vote).sum();

	if total == 0 {
		return NO_INFORMATION.to_string();
	}

	let kept: Vec<&str> = voted
		.into_iter()
		.filter(|(_, vote)| *vote as f32 / total as f32 >= threshold)
		.map(|(name, _)| name)
		.collect();

	if kept.is_empty() { NO_INFORMATION.to_string() } else { kept.join(", ") }
}

/// Groups notes into labeled top/middle/base lines; role-less notes only render when no group does.
pub fn format_notes(notes: &[NoteEntry]) -> String {
	let mut top = Vec::new();
	let mut middle = Vec::new();
	let mut base = Vec::new();
	let mut single = Vec::new();

	for note in notes {
		if note.name.trim().is_empty() {
			continue;
		}

		let bucket = match NoteRole::parse(note.role.as_deref()) {
			NoteRole::Top => &mut top,
			NoteRole::Middle => &mut middle,
			NoteRole::Base => &mut base,
			NoteRole::Single => &mut single,
		};

		bucket.push(note.name.as_str());
	}

	let mut lines = Vec::new();

	for (label, group) in [("Top", &top), ("Middle", &middle), ("Base", &base)] {
		if !group.is_empty() {
			lines.push(format!("   [{label}]: {}", group.join(", ")));
		}
	}

	if lines.is_empty() && !single.is_empty() {
		lines.push(format!("   [Notes]: {}", single.join(", ")));
	}
	if lines.is_empty() {
		return NO_INFORMATION.to_string();
	}

	lines.join("\n")
}

pub fn summarize(item: &CatalogMatch, thresholds: &Aggregation) -> ItemSummary {
	ItemSummary {
		perfume_id: item.perfume_id,
		brand: item.brand.clone(),
		name: item.name.clone(),
		img_link: item.img_link.clone(),
		perfumer: item.perfumer.clone(),
		release_year: item.release_year,
		audience: filter_by_votes(&item.audiences, thresholds.audience_threshold),
		accords: filter_by_votes(&item.accords, thresholds.accord_threshold),
		seasons: filter_by_votes(&item.seasons, thresholds.season_threshold),
		occasions: filter_by_votes(&item.occasions, thresholds.occasion_threshold),
		notes: format_notes(&item.notes),
	}
}

/// Tells the reader which constraints were given up to find these items.
pub fn tier_banner(tier: Tier) -> Option<&'static str> {
	match tier {
		Tier::Strict => None,
		Tier::RelaxedContext => Some(
			"(Season/occasion did not match, so the search focused on the scent notes and mood.)",
		),
		Tier::BroadScent => Some(
			"(No item carries the exact notes, so these share a similar overall accord instead.)",
		),
		Tier::Emergency => Some(
			"(The requested scent could not be found, so these are representative picks from the brand.)",
		),
	}
}

pub fn render_summaries(tier: Tier, summaries: &[ItemSummary]) -> String {
	let mut out = String::new();

	if let Some(banner) = tier_banner(tier) {
		out.push_str(banner);
		out.push_str("\n\n");
	}

	for (idx, summary) in summaries.iter().enumerate() {
		let release = summary
			.release_year
			.map(|year| year.to_string())
			.unwrap_or_else(|| NO_INFORMATION.to_string());
		let _ = writeln!(out, "no.{}", idx + 1);
		let _ = writeln!(out, "brand: {}", summary.brand);
		let _ = writeln!(out, "name: {}", summary.name);
		let _ = writeln!(out, "image: {}", summary.img_link.as_deref().unwrap_or(NO_INFORMATION));
		let _ = writeln!(out, "perfumer: {}", summary.perfumer.as_deref().unwrap_or(NO_INFORMATION));
		let _ = writeln!(out, "released: {release}");
		let _ = writeln!(out, "audience: {}", summary.audience);
		let _ = writeln!(out, "mood: {}", summary.accords);
		let _ = writeln!(out, "season: {}", summary.seasons);
		let _ = writeln!(out, "occasion: {}", summary.occasions);
		let _ = writeln!(out, "notes:\n{}", summary.notes);
		out.push_str(&"-".repeat(25));
		out.push('\n');
	}

	out
}
