use std::sync::Arc;

use scentence_service::ScentenceService;
use scentence_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ScentenceService>,
}
impl AppState {
	pub async fn new(mut config: scentence_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.vocabulary.vector_dim).await?;

		if config.resolver.fuzzy_enabled {
			config.resolver.fuzzy_enabled = db.ensure_fuzzy_match().await;
		}

		let service = ScentenceService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn from_service(service: ScentenceService) -> Self {
		Self { service: Arc::new(service) }
	}
}
