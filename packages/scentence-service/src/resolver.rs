//! Term Resolver: maps a free-text token onto canonical descriptor vocabulary.
//!
//! Tiers run in a fixed order (exact substring, edit distance, semantic nearest neighbour) and
//! the pipeline stops as soon as enough descriptors are collected or the token itself is found
//! verbatim. Every tier swallows its own failures, so resolution never errors.

use std::sync::Arc;

use tracing::warn;

use crate::{BoxFuture, EmbeddingProvider, ScentenceService, VocabularyStore};
use scentence_config::EmbeddingProviderConfig;

pub trait ResolverTier
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	/// Returns up to `k` entries, skipping anything in `found`.
	fn resolve<'a>(
		&'a self,
		token: &'a str,
		k: usize,
		found: &'a [String],
	) -> BoxFuture<'a, Vec<String>>;
}

pub struct ExactTier {
	pub vocabulary: Arc<dyn VocabularyStore>,
}
impl ResolverTier for ExactTier {
	fn name(&self) -> &'static str {
		"exact"
	}

	fn resolve<'a>(
		&'a self,
		token: &'a str,
		k: usize,
		_found: &'a [String],
	) -> BoxFuture<'a, Vec<String>> {
		Box::pin(async move {
			match self.vocabulary.substring_matches(token, k as u32).await {
				Ok(notes) => notes,
				Err(err) => {
					warn!(error = %err, token, "Exact descriptor lookup failed; continuing.");

					Vec::new()
				},
			}
		})
	}
}

pub struct FuzzyTier {
	pub vocabulary: Arc<dyn VocabularyStore>,
	pub max_distance: u32,
}
impl ResolverTier for FuzzyTier {
	fn name(&self) -> &'static str {
		"fuzzy"
	}

	fn resolve<'a>(
		&'a self,
		token: &'a str,
		k: usize,
		found: &'a [String],
	) -> BoxFuture<'a, Vec<String>> {
		Box::pin(async move {
			match self.vocabulary.fuzzy_matches(token, self.max_distance, found, k as u32).await {
				Ok(notes) => notes,
				Err(err) => {
					warn!(
						error = %err,
						token,
						"Edit-distance lookup unavailable; skipping fuzzy tier."
					);

					Vec::new()
				},
			}
		})
	}
}

/// Stands in for the fuzzy tier when it is switched off.
pub struct DisabledTier;
impl ResolverTier for DisabledTier {
	fn name(&self) -> &'static str {
		"disabled"
	}

	fn resolve<'a>(
		&'a self,
		_token: &'a str,
		_k: usize,
		_found: &'a [String],
	) -> BoxFuture<'a, Vec<String>> {
		Box::pin(async { Vec::new() })
	}
}

pub struct SemanticTier {
	pub vocabulary: Arc<dyn VocabularyStore>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub cfg: EmbeddingProviderConfig,
}
impl ResolverTier for SemanticTier {
	fn name(&self) -> &'static str {
		"semantic"
	}

	fn resolve<'a>(
		&'a self,
		token: &'a str,
		k: usize,
		found: &'a [String],
	) -> BoxFuture<'a, Vec<String>> {
		Box::pin(async move {
			let texts = vec![token.to_string()];
			let vector = match self.embedding.embed(&self.cfg, &texts).await {
				Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
				Ok(_) => {
					warn!(token, "Embedding provider returned no vector; skipping semantic tier.");

					return Vec::new();
				},
				Err(err) => {
					warn!(error = %err, token, "Embedding failed; skipping semantic tier.");

					return Vec::new();
				},
			};

			match self.vocabulary.nearest(&vector, found, k as u32).await {
				Ok(notes) => notes,
				Err(err) => {
					warn!(error = %err, token, "Nearest-neighbour lookup failed; continuing.");

					Vec::new()
				},
			}
		})
	}
}

pub struct TermResolver {
	tiers: Vec<Box<dyn ResolverTier>>,
}
impl TermResolver {
	pub fn new(tiers: Vec<Box<dyn ResolverTier>>) -> Self {
		Self { tiers }
	}

	/// Resolves `token` to at most `k` distinct descriptors in tier order.
	pub async fn resolve(&self, token: &str, k: usize) -> Vec<String> {
		let token = token.trim();
		let mut found: Vec<String> = Vec::new();

		if token.is_empty() || k == 0 {
			return found;
		}

		for tier in &self.tiers {
			let remaining = k - found.len();
			let matches = tier.resolve(token, remaining, &found).await;

			for candidate in matches {
				if found.len() >= k {
					break;
				}

				let candidate = candidate.trim().to_string();

				if candidate.is_empty() || found.iter().any(|f| f.eq_ignore_ascii_case(&candidate)) {
					continue;
				}

				found.push(candidate);
			}

			tracing::debug!(tier = tier.name(), token, found = found.len(), "Resolver tier done.");

			if found.len() >= k || found.iter().any(|f| f.eq_ignore_ascii_case(token)) {
				break;
			}
		}

		found
	}
}

impl ScentenceService {
	pub fn term_resolver(&self) -> TermResolver {
		let vocabulary = self.stores.vocabulary.clone();
		let fuzzy: Box<dyn ResolverTier> = if self.cfg.resolver.fuzzy_enabled {
			Box::new(FuzzyTier {
				vocabulary: vocabulary.clone(),
				max_distance: self.cfg.resolver.fuzzy_max_distance,
			})
		} else {
			Box::new(DisabledTier)
		};

		TermResolver::new(vec![
			Box::new(ExactTier { vocabulary: vocabulary.clone() }),
			fuzzy,
			Box::new(SemanticTier {
				vocabulary,
				embedding: self.providers.embedding.clone(),
				cfg: self.cfg.providers.embedding.clone(),
			}),
		])
	}

	pub async fn resolve_term(&self, token: &str, k: usize) -> Vec<String> {
		self.term_resolver().resolve(token, k).await
	}
}
