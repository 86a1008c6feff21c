use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub resolver: Resolver,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub aggregation: Aggregation,
	#[serde(default)]
	pub dialogue: Dialogue,
	#[serde(default)]
	pub strategy: Strategy,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub vocabulary: Vocabulary,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Vocabulary {
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Cheap model used for routing, context extraction, and follow-up questions.
	pub llm_fast: LlmProviderConfig,
	/// Stronger model used for strategy generation and reply composition.
	pub llm_strategy: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: Option<f32>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Resolver {
	/// Descriptors pulled from the whole request when a strategy asks for broad semantic search.
	pub request_top_k: u32,
	/// Descriptors pulled per strategy keyword.
	pub keyword_top_k: u32,
	pub fuzzy_enabled: bool,
	pub fuzzy_max_distance: u32,
}
impl Default for Resolver {
	fn default() -> Self {
		Self { request_top_k: 3, keyword_top_k: 2, fuzzy_enabled: true, fuzzy_max_distance: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub max_results: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { max_results: 5 }
	}
}

/// Minimum vote share a tag needs before it is shown for an item.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Aggregation {
	pub season_threshold: f32,
	pub accord_threshold: f32,
	pub audience_threshold: f32,
	pub occasion_threshold: f32,
}
impl Default for Aggregation {
	fn default() -> Self {
		Self {
			season_threshold: 0.15,
			accord_threshold: 0.10,
			audience_threshold: 0.10,
			occasion_threshold: 0.10,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Dialogue {
	pub max_clarifying_turns: u32,
}
impl Default for Dialogue {
	fn default() -> Self {
		Self { max_clarifying_turns: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Strategy {
	pub max_strategies: u32,
	/// Used in the strategy prompt when the catalog's distinct values cannot be loaded.
	pub fallback_seasons: Vec<String>,
	pub fallback_occasions: Vec<String>,
	pub fallback_accords: Vec<String>,
}
impl Default for Strategy {
	fn default() -> Self {
		Self {
			max_strategies: 3,
			fallback_seasons: ["Spring", "Summer", "Fall", "Winter"].map(String::from).to_vec(),
			fallback_occasions: ["Daily", "Formal", "Date", "Party"].map(String::from).to_vec(),
			fallback_accords: ["Citrus", "Woody", "Floral", "Musk"].map(String::from).to_vec(),
		}
	}
}
