use crate::{Pool, error::Result};

const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    title TEXT NOT NULL CHECK (length(CAST(title AS BLOB)) BETWEEN 1 AND 500),
    year INTEGER NOT NULL CHECK (year >= 1888),
    runtime INTEGER NOT NULL CHECK (runtime > 0),
    genres TEXT,
    version INTEGER NOT NULL DEFAULT 1
);
CREATE VIRTUAL TABLE IF NOT EXISTS movies_fts USING fts5(title, content=movies, content_rowid=id);
CREATE TRIGGER IF NOT EXISTS movies_after_insert AFTER INSERT ON movies BEGIN
    INSERT INTO movies_fts(rowid, title) VALUES (new.id, new.title);
    END;
CREATE TRIGGER IF NOT EXISTS movies_after_delete AFTER DELETE ON movies BEGIN
    INSERT INTO movies_fts(movies_fts, rowid, title) VALUES('delete', old.id, old.title);
    END;
CREATE TRIGGER IF NOT EXISTS movies_after_update AFTER UPDATE ON movies BEGIN
    INSERT INTO movies_fts(movies_fts, rowid, title) VALUES('delete', old.id, old.title);
    INSERT INTO movies_fts(rowid, title) VALUES (new.id, new.title);
    END;
";

pub async fn ensure_schema(pool: &Pool) -> Result<()> {
    sqlx::raw_sql(CREATE_SCHEMA).execute(pool).await?;
    Ok(())
}
