use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::warn;

use crate::{Result, schema};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &scentence_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self, vector_dim: u32) -> Result<()> {
		let sql = schema::render_schema(vector_dim);
		let lock_id: i64 = 5_101_422;
		// Advisory locks are held per connection, so take it inside the transaction that applies
		// the schema and let commit release it.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	/// Installs `fuzzystrmatch` outside the schema transaction. Returns whether `levenshtein` is
	/// usable; a server without the contrib extension still boots.
	pub async fn ensure_fuzzy_match(&self) -> bool {
		match sqlx::query("CREATE EXTENSION IF NOT EXISTS fuzzystrmatch").execute(&self.pool).await {
			Ok(_) => true,
			Err(err) => {
				warn!(error = %err, "fuzzystrmatch is unavailable; edit-distance lookups are off.");

				false
			},
		}
	}
}
