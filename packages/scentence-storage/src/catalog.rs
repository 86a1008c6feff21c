//! Catalog queries: predicate search, entity lookup and filter vocabularies.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{Error, Result, models::CatalogRow};
use scentence_domain::aggregate::CatalogMatch;

const CATALOG_SELECT: &str = "\
SELECT
	p.perfume_id,
	p.perfume_name,
	p.perfume_brand,
	p.img_link,
	p.perfumer,
	p.release_year,
	COALESCE(
		(SELECT json_agg(json_build_object('name', x.note, 'type', x.note_type))
		FROM perfume_notes x WHERE x.perfume_id = p.perfume_id),
		'[]'::json
	) AS notes,
	COALESCE(
		(SELECT json_agg(json_build_object('name', x.accord, 'vote', x.vote))
		FROM perfume_accords x WHERE x.perfume_id = p.perfume_id),
		'[]'::json
	) AS accords,
	COALESCE(
		(SELECT json_agg(json_build_object('name', x.season, 'vote', x.vote))
		FROM perfume_seasons x WHERE x.perfume_id = p.perfume_id),
		'[]'::json
	) AS seasons,
	COALESCE(
		(SELECT json_agg(json_build_object('name', x.audience, 'vote', x.vote))
		FROM perfume_audiences x WHERE x.perfume_id = p.perfume_id),
		'[]'::json
	) AS audiences,
	COALESCE(
		(SELECT json_agg(json_build_object('name', x.occasion, 'vote', x.vote))
		FROM perfume_occasions x WHERE x.perfume_id = p.perfume_id),
		'[]'::json
	) AS occasions
FROM perfumes p
WHERE ";

/// A catalog column a predicate can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
	PerfumeName,
	PerfumeBrand,
	Note,
	Accord,
	Season,
	Audience,
	Occasion,
}
impl Column {
	pub fn qualified(self) -> &'static str {
		match self {
			Self::PerfumeName => "p.perfume_name",
			Self::PerfumeBrand => "p.perfume_brand",
			Self::Note => "n.note",
			Self::Accord => "ac.accord",
			Self::Season => "s.season",
			Self::Audience => "au.audience",
			Self::Occasion => "o.occasion",
		}
	}

	/// Child table and alias for tag columns; `None` for columns on `perfumes` itself.
	fn child_table(self) -> Option<(&'static str, &'static str)> {
		match self {
			Self::PerfumeName | Self::PerfumeBrand => None,
			Self::Note => Some(("perfume_notes", "n")),
			Self::Accord => Some(("perfume_accords", "ac")),
			Self::Season => Some(("perfume_seasons", "s")),
			Self::Audience => Some(("perfume_audiences", "au")),
			Self::Occasion => Some(("perfume_occasions", "o")),
		}
	}
}

/// One bound condition. Conditions in a search are conjunctive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
	Equals { column: Column, value: String },
	/// Case-insensitive equality.
	ILike { column: Column, value: String },
	/// Case-insensitive containment.
	Contains { column: Column, value: String },
	AnyOf { column: Column, values: Vec<String> },
}
impl Predicate {
	pub fn column(&self) -> Column {
		match self {
			Self::Equals { column, .. }
			| Self::ILike { column, .. }
			| Self::Contains { column, .. }
			| Self::AnyOf { column, .. } => *column,
		}
	}
}

/// Brand and item name are the only dimensions with free-text spelling variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityColumn {
	Brand,
	ItemName,
}
impl EntityColumn {
	fn column(self) -> &'static str {
		match self {
			Self::Brand => "perfume_brand",
			Self::ItemName => "perfume_name",
		}
	}
}

/// Categorical dimensions whose distinct values are offered to strategy generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaDimension {
	Season,
	Occasion,
	Accord,
}
impl MetaDimension {
	fn table_and_column(self) -> (&'static str, &'static str) {
		match self {
			Self::Season => ("perfume_seasons", "season"),
			Self::Occasion => ("perfume_occasions", "occasion"),
			Self::Accord => ("perfume_accords", "accord"),
		}
	}
}

pub fn escape_like(raw: &str) -> String {
	raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub fn build_search_query(predicates: &[Predicate], limit: u32) -> QueryBuilder<'_, Postgres> {
	let mut builder = QueryBuilder::new(CATALOG_SELECT);

	if predicates.is_empty() {
		builder.push("TRUE");
	}

	for (idx, predicate) in predicates.iter().enumerate() {
		if idx > 0 {
			builder.push(" AND ");
		}

		let column = predicate.column();

		if let Some((table, alias)) = column.child_table() {
			builder.push(format!(
				"EXISTS (SELECT 1 FROM {table} {alias} WHERE {alias}.perfume_id = p.perfume_id AND "
			));
			push_condition(&mut builder, predicate);
			builder.push(")");
		} else {
			push_condition(&mut builder, predicate);
		}
	}

	builder.push(" ORDER BY random() LIMIT ");
	builder.push_bind(i64::from(limit));

	builder
}

/// Runs one conjunctive search and returns a random sample of at most `limit` items.
pub async fn search(
	pool: &PgPool,
	predicates: &[Predicate],
	limit: u32,
) -> Result<Vec<CatalogMatch>> {
	if predicates.is_empty() {
		return Err(Error::InvalidArgument("Catalog search requires at least one predicate.".into()));
	}

	let mut builder = build_search_query(predicates, limit);
	let rows: Vec<CatalogRow> = builder.build_query_as().fetch_all(pool).await?;

	Ok(rows.into_iter().map(CatalogMatch::from).collect())
}

/// Canonical spelling of a brand or item name; exact case-insensitive matches win over substrings.
pub async fn find_entity(
	pool: &PgPool,
	column: EntityColumn,
	candidate: &str,
) -> Result<Option<String>> {
	let candidate = candidate.trim();

	if candidate.is_empty() {
		return Ok(None);
	}

	let column = column.column();
	let sql = format!(
		"\
SELECT {column}
FROM perfumes
WHERE lower({column}) = lower($1) OR {column} ILIKE $2
ORDER BY (lower({column}) = lower($1)) DESC
LIMIT 1"
	);
	let found: Option<String> = sqlx::query_scalar(&sql)
		.bind(candidate)
		.bind(format!("%{}%", escape_like(candidate)))
		.fetch_optional(pool)
		.await?;

	Ok(found)
}

pub async fn distinct_values(pool: &PgPool, dimension: MetaDimension) -> Result<Vec<String>> {
	let (table, column) = dimension.table_and_column();
	let sql = format!("SELECT DISTINCT {column} FROM {table} WHERE {column} <> '' ORDER BY {column}");
	let values: Vec<String> = sqlx::query_scalar(&sql).fetch_all(pool).await?;

	Ok(values)
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
	match predicate {
		Predicate::Equals { column, value } => {
			builder.push(format!("{} = ", column.qualified()));
			builder.push_bind(value.clone());
		},
		Predicate::ILike { column, value } => {
			builder.push(format!("{} ILIKE ", column.qualified()));
			builder.push_bind(escape_like(value));
		},
		Predicate::Contains { column, value } => {
			builder.push(format!("{} ILIKE ", column.qualified()));
			builder.push_bind(format!("%{}%", escape_like(value)));
		},
		Predicate::AnyOf { column, values } => {
			builder.push(format!("{} = ANY(", column.qualified()));
			builder.push_bind(values.clone());
			builder.push(")");
		},
	}
}
