use sqlx::PgPool;

use scentence_config::Postgres;
use scentence_storage::{
	catalog::{self, Column, EntityColumn, MetaDimension, Predicate},
	db::Db,
	vocabulary,
};
use scentence_testkit::TestDatabase;

const VECTOR_DIM: u32 = 3;

async fn seed(pool: &PgPool) {
	for statement in [
		"INSERT INTO perfumes (perfume_id, perfume_name, perfume_brand, img_link, perfumer, release_year) VALUES
			(1, 'Lime Basil & Mandarin', 'Jo Malone', NULL, 'Lucien Malone', 1999),
			(2, 'Coco Mademoiselle', 'Chanel', NULL, 'Jacques Polge', 2001)",
		"INSERT INTO perfume_notes (perfume_id, note, note_type) VALUES
			(1, 'Lime', 'TOP'), (1, 'Basil', 'MIDDLE'), (2, 'Rose', 'MIDDLE'), (2, 'Patchouli', 'BASE')",
		"INSERT INTO perfume_accords (perfume_id, accord, vote) VALUES
			(1, 'Citrus', 90), (1, 'Aromatic', 10), (2, 'Woody', 50)",
		"INSERT INTO perfume_seasons (perfume_id, season, vote) VALUES (1, 'Spring', 40), (2, 'Fall', 60)",
		"INSERT INTO perfume_audiences (perfume_id, audience, vote) VALUES (2, 'Feminine', 80)",
		"INSERT INTO perfume_occasions (perfume_id, occasion, vote) VALUES (2, 'Date', 30)",
	] {
		sqlx::query(statement).execute(pool).await.expect("Failed to seed catalog.");
	}

	vocabulary::upsert_entry(pool, "Lime", None, Some("[1,0,0]"))
		.await
		.expect("Failed to seed vocabulary.");
	vocabulary::upsert_entry(pool, "Rose", Some("Floral, powdery."), Some("[0,1,0]"))
		.await
		.expect("Failed to seed vocabulary.");
	vocabulary::upsert_entry(pool, "Oud", None, Some("[0,0,1]"))
		.await
		.expect("Failed to seed vocabulary.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCENTENCE_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = scentence_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set SCENTENCE_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(VECTOR_DIM).await.expect("Failed to ensure schema.");
	db.ensure_schema(VECTOR_DIM).await.expect("Schema bootstrap must be idempotent.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'note_vocabulary'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);
	assert!(db.ensure_fuzzy_match().await);
	assert!(db.ensure_fuzzy_match().await);

	let installed: i64 =
		sqlx::query_scalar("SELECT count(*) FROM pg_extension WHERE extname = 'fuzzystrmatch'")
			.fetch_one(&db.pool)
			.await
			.expect("Failed to query extensions.");

	assert_eq!(installed, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCENTENCE_PG_DSN to run."]
async fn search_aggregates_child_tables() {
	let Some(base_dsn) = scentence_testkit::env_dsn() else {
		eprintln!("Skipping search_aggregates_child_tables; set SCENTENCE_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(VECTOR_DIM).await.expect("Failed to ensure schema.");
	seed(&db.pool).await;

	let matches = catalog::search(
		&db.pool,
		&[
			Predicate::ILike { column: Column::PerfumeBrand, value: "chanel".to_string() },
			Predicate::AnyOf {
				column: Column::Note,
				values: vec!["Rose".to_string(), "Oud".to_string()],
			},
		],
		5,
	)
	.await
	.expect("Search failed.");

	assert_eq!(matches.len(), 1);
	assert_eq!(matches[0].name, "Coco Mademoiselle");
	assert_eq!(matches[0].notes.len(), 2);
	assert_eq!(matches[0].audiences[0].vote, Some(80));

	let none = catalog::search(
		&db.pool,
		&[Predicate::Equals { column: Column::Season, value: "Winter".to_string() }],
		5,
	)
	.await
	.expect("Search failed.");

	assert!(none.is_empty());
	assert!(catalog::search(&db.pool, &[], 5).await.is_err());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCENTENCE_PG_DSN to run."]
async fn entity_and_vocabulary_lookups() {
	let Some(base_dsn) = scentence_testkit::env_dsn() else {
		eprintln!("Skipping entity_and_vocabulary_lookups; set SCENTENCE_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(VECTOR_DIM).await.expect("Failed to ensure schema.");
	seed(&db.pool).await;

	let brand = catalog::find_entity(&db.pool, EntityColumn::Brand, "jo malone")
		.await
		.expect("Entity lookup failed.");

	assert_eq!(brand.as_deref(), Some("Jo Malone"));

	let name = catalog::find_entity(&db.pool, EntityColumn::ItemName, "mademoiselle")
		.await
		.expect("Entity lookup failed.");

	assert_eq!(name.as_deref(), Some("Coco Mademoiselle"));

	let seasons = catalog::distinct_values(&db.pool, MetaDimension::Season)
		.await
		.expect("Distinct values failed.");

	assert_eq!(seasons, vec!["Fall", "Spring"]);

	let exact = vocabulary::substring_matches(&db.pool, "ros", 3).await.expect("Substring failed.");

	assert_eq!(exact, vec!["Rose"]);

	assert!(db.ensure_fuzzy_match().await);

	let fuzzy = vocabulary::fuzzy_matches(&db.pool, "Lyme", 3, &["Rose".to_string()], 3)
		.await
		.expect("Fuzzy lookup failed.");

	assert_eq!(fuzzy.first().map(String::as_str), Some("Lime"));
	assert!(!fuzzy.contains(&"Rose".to_string()));

	let nearest = vocabulary::nearest(&db.pool, "[0,0.1,0.9]", &[], 1)
		.await
		.expect("Nearest lookup failed.");

	assert_eq!(nearest, vec!["Oud"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
