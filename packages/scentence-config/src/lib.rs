mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Aggregation, Config, Dialogue, EmbeddingProviderConfig, LlmProviderConfig, Postgres,
	Providers, Resolver, Retrieval, Service, Storage, Strategy, Vocabulary,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vocabulary.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vocabulary.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_fast", &cfg.providers.llm_fast.api_key),
		("llm_strategy", &cfg.providers.llm_strategy.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, temperature) in [
		("llm_fast", cfg.providers.llm_fast.temperature),
		("llm_strategy", cfg.providers.llm_strategy.temperature),
	] {
		if let Some(value) = temperature
			&& (!value.is_finite() || value < 0.0)
		{
			return Err(Error::Validation {
				message: format!(
					"providers.{label}.temperature must be a finite number, zero or greater."
				),
			});
		}
	}

	if cfg.resolver.request_top_k == 0 || cfg.resolver.keyword_top_k == 0 {
		return Err(Error::Validation {
			message: "resolver.request_top_k and resolver.keyword_top_k must be greater than zero."
				.to_string(),
		});
	}
	if cfg.retrieval.max_results == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_results must be greater than zero.".to_string(),
		});
	}

	for (label, threshold) in [
		("season_threshold", cfg.aggregation.season_threshold),
		("accord_threshold", cfg.aggregation.accord_threshold),
		("audience_threshold", cfg.aggregation.audience_threshold),
		("occasion_threshold", cfg.aggregation.occasion_threshold),
	] {
		if !threshold.is_finite() {
			return Err(Error::Validation {
				message: format!("aggregation.{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&threshold) {
			return Err(Error::Validation {
				message: format!("aggregation.{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.dialogue.max_clarifying_turns == 0 {
		return Err(Error::Validation {
			message: "dialogue.max_clarifying_turns must be greater than zero.".to_string(),
		});
	}
	if cfg.strategy.max_strategies == 0 {
		return Err(Error::Validation {
			message: "strategy.max_strategies must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in [
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.llm_fast.api_base,
		&mut cfg.providers.llm_strategy.api_base,
	] {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}
	for values in [
		&mut cfg.strategy.fallback_seasons,
		&mut cfg.strategy.fallback_occasions,
		&mut cfg.strategy.fallback_accords,
	] {
		values.iter_mut().for_each(|value| *value = value.trim().to_string());
		values.retain(|value| !value.is_empty());
	}
}
