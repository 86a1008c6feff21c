pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_perfumes.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_perfumes.sql")),
				"tables/002_perfume_notes.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_perfume_notes.sql")),
				"tables/003_perfume_accords.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_perfume_accords.sql")),
				"tables/004_perfume_seasons.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_perfume_seasons.sql")),
				"tables/005_perfume_audiences.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_perfume_audiences.sql")),
				"tables/006_perfume_occasions.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_perfume_occasions.sql")),
				"tables/007_note_vocabulary.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_note_vocabulary.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
