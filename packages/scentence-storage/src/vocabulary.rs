//! Descriptor vocabulary lookups backing the three term-resolution tiers.

use sqlx::PgPool;

use crate::{Result, catalog::escape_like};

/// Case-insensitive substring matches, shortest entries first.
pub async fn substring_matches(pool: &PgPool, token: &str, limit: u32) -> Result<Vec<String>> {
	let notes: Vec<String> = sqlx::query_scalar(
		"\
SELECT note
FROM note_vocabulary
WHERE note ILIKE $1
ORDER BY length(note) ASC, note ASC
LIMIT $2",
	)
	.bind(format!("%{}%", escape_like(token.trim())))
	.bind(i64::from(limit))
	.fetch_all(pool)
	.await?;

	Ok(notes)
}

/// Entries within `max_distance` edits of `token`, closest first. Requires `fuzzystrmatch`.
pub async fn fuzzy_matches(
	pool: &PgPool,
	token: &str,
	max_distance: u32,
	exclude: &[String],
	limit: u32,
) -> Result<Vec<String>> {
	let notes: Vec<String> = sqlx::query_scalar(
		"\
SELECT note
FROM note_vocabulary
WHERE levenshtein(lower(note), lower($1)) <= $2
	AND NOT (note = ANY($3))
ORDER BY levenshtein(lower(note), lower($1)) ASC, note ASC
LIMIT $4",
	)
	.bind(token.trim())
	.bind(max_distance as i32)
	.bind(exclude)
	.bind(i64::from(limit))
	.fetch_all(pool)
	.await?;

	Ok(notes)
}

/// Entries ranked by cosine distance to `embedding`, a pgvector text literal.
pub async fn nearest(
	pool: &PgPool,
	embedding: &str,
	exclude: &[String],
	limit: u32,
) -> Result<Vec<String>> {
	let notes: Vec<String> = sqlx::query_scalar(
		"\
SELECT note
FROM note_vocabulary
WHERE embedding IS NOT NULL
	AND NOT (note = ANY($2))
ORDER BY embedding <=> $1::text::vector ASC
LIMIT $3",
	)
	.bind(embedding)
	.bind(exclude)
	.bind(i64::from(limit))
	.fetch_all(pool)
	.await?;

	Ok(notes)
}

pub async fn upsert_entry(
	pool: &PgPool,
	note: &str,
	description: Option<&str>,
	embedding: Option<&str>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO note_vocabulary (note, description, embedding)
VALUES ($1, $2, $3::text::vector)
ON CONFLICT (note) DO UPDATE
SET
	description = EXCLUDED.description,
	embedding = EXCLUDED.embedding",
	)
	.bind(note)
	.bind(description)
	.bind(embedding)
	.execute(pool)
	.await?;

	Ok(())
}
