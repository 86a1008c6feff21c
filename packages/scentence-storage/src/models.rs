use sqlx::types::Json;

use scentence_domain::aggregate::{CatalogMatch, NoteEntry, TagVote};

/// One catalog row with its child tables folded into JSON arrays.
#[derive(Debug, sqlx::FromRow)]
pub struct CatalogRow {
	pub perfume_id: i64,
	pub perfume_name: String,
	pub perfume_brand: String,
	pub img_link: Option<String>,
	pub perfumer: Option<String>,
	pub release_year: Option<i32>,
	pub notes: Json<Vec<NoteEntry>>,
	pub accords: Json<Vec<TagVote>>,
	pub seasons: Json<Vec<TagVote>>,
	pub audiences: Json<Vec<TagVote>>,
	pub occasions: Json<Vec<TagVote>>,
}
impl From<CatalogRow> for CatalogMatch {
	fn from(row: CatalogRow) -> Self {
		Self {
			perfume_id: row.perfume_id,
			name: row.perfume_name,
			brand: row.perfume_brand,
			img_link: row.img_link,
			perfumer: row.perfumer,
			release_year: row.release_year,
			notes: row.notes.0,
			accords: row.accords.0,
			seasons: row.seasons.0,
			audiences: row.audiences.0,
			occasions: row.occasions.0,
		}
	}
}
