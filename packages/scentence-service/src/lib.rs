pub mod chat;
pub mod dialogue;
pub mod entity;
pub mod filter;
pub mod reply;
pub mod research;
pub mod resolver;
pub mod retrieval;

mod error;

pub use chat::{
	ChatRequest, ChatResponse, RecommendRequest, RecommendResponse, ResolveRequest,
	ResolveResponse,
};
pub use dialogue::{Decision, TurnOutcome};
pub use error::{Error, Result};
pub use research::{ResearchReport, StrategyRun};
pub use retrieval::RetrievalOutcome;
pub use scentence_providers::llm::{ChatMessage, LlmOutput};
pub use scentence_storage::catalog::{Column, EntityColumn, MetaDimension, Predicate};

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::PgPool;

use scentence_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use scentence_domain::aggregate::CatalogMatch;
use scentence_providers::{embedding, llm};
use scentence_storage::{catalog, db::Db, vocabulary};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
		json_mode: bool,
	) -> BoxFuture<'a, Result<LlmOutput>>;
}

/// Read access to the fragrance catalog.
pub trait CatalogStore
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		predicates: &'a [Predicate],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogMatch>>>;

	fn find_entity<'a>(
		&'a self,
		column: EntityColumn,
		candidate: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>>;

	fn distinct_values<'a>(&'a self, dimension: MetaDimension) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// Read access to the descriptor vocabulary.
pub trait VocabularyStore
where
	Self: Send + Sync,
{
	fn substring_matches<'a>(
		&'a self,
		token: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>>;

	fn fuzzy_matches<'a>(
		&'a self,
		token: &'a str,
		max_distance: u32,
		exclude: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>>;

	fn nearest<'a>(
		&'a self,
		embedding: &'a [f32],
		exclude: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub llm: Arc<dyn LlmProvider>,
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), llm: provider }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub catalog: Arc<dyn CatalogStore>,
	pub vocabulary: Arc<dyn VocabularyStore>,
}
impl Stores {
	pub fn postgres(pool: PgPool) -> Self {
		let store = Arc::new(PgStore { pool });

		Self { catalog: store.clone(), vocabulary: store }
	}
}

pub struct ScentenceService {
	pub cfg: Config,
	pub providers: Providers,
	pub stores: Stores,
}
impl ScentenceService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, providers: Providers::default(), stores: Stores::postgres(db.pool) }
	}

	pub fn with_parts(cfg: Config, providers: Providers, stores: Stores) -> Self {
		Self { cfg, providers, stores }
	}
}

/// Catalog and vocabulary access over the Postgres pool.
pub struct PgStore {
	pub pool: PgPool,
}
impl CatalogStore for PgStore {
	fn search<'a>(
		&'a self,
		predicates: &'a [Predicate],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogMatch>>> {
		Box::pin(async move { Ok(catalog::search(&self.pool, predicates, limit).await?) })
	}

	fn find_entity<'a>(
		&'a self,
		column: EntityColumn,
		candidate: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move { Ok(catalog::find_entity(&self.pool, column, candidate).await?) })
	}

	fn distinct_values<'a>(&'a self, dimension: MetaDimension) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move { Ok(catalog::distinct_values(&self.pool, dimension).await?) })
	}
}
impl VocabularyStore for PgStore {
	fn substring_matches<'a>(
		&'a self,
		token: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move { Ok(vocabulary::substring_matches(&self.pool, token, limit).await?) })
	}

	fn fuzzy_matches<'a>(
		&'a self,
		token: &'a str,
		max_distance: u32,
		exclude: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move {
			Ok(vocabulary::fuzzy_matches(&self.pool, token, max_distance, exclude, limit).await?)
		})
	}

	fn nearest<'a>(
		&'a self,
		embedding: &'a [f32],
		exclude: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move {
			let literal = vector_to_pg(embedding);

			Ok(vocabulary::nearest(&self.pool, &literal, exclude, limit).await?)
		})
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl LlmProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
		json_mode: bool,
	) -> BoxFuture<'a, Result<LlmOutput>> {
		Box::pin(async move { Ok(llm::complete_output(cfg, messages, json_mode).await?) })
	}
}

pub(crate) fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}
