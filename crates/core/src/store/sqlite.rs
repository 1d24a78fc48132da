//! SQLite-backed movie store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{MovieStore, StoreError, StoreStats, UpsertReport};
use crate::extract::{DownloadLink, EnrichedRecord, LinkKind};

/// SQLite-backed movie store.
pub struct SqliteMovieStore {
    conn: Mutex<Connection>,
}

impl SqliteMovieStore {
    /// Create a new SQLite store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- One row per site-unique movie id
            CREATE TABLE IF NOT EXISTS movies (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                full_title TEXT,
                poster TEXT,
                poster_hd TEXT,
                category TEXT,
                year TEXT,
                country TEXT,
                genre TEXT,
                language TEXT,
                subtitles TEXT,
                director TEXT,
                "cast" TEXT,
                synopsis TEXT,
                duration TEXT,
                file_size TEXT,
                resolution TEXT,
                format TEXT,
                release_date TEXT,
                update_date TEXT,
                publish_date TEXT,
                movie_url TEXT,
                screenshots TEXT,
                imdb_rating TEXT,
                scrape_date TEXT NOT NULL,
                raw_data TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_movies_category ON movies(category);

            -- Download links, rewritten wholesale on every upsert
            CREATE TABLE IF NOT EXISTS download_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id TEXT NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
                quality TEXT,
                uri TEXT NOT NULL,
                kind TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_download_links_movie_id ON download_links(movie_id);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Load the stored links for a movie, insertion-ordered.
    pub fn links(&self, movie_id: &str) -> Result<Vec<DownloadLink>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT quality, uri, kind FROM download_links WHERE movie_id = ? ORDER BY id")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![movie_id], |row| {
                let quality: String = row.get(0)?;
                let uri: String = row.get(1)?;
                let kind_str: String = row.get(2)?;
                // The kind was fixed at extraction time; the column is
                // authoritative, not the URI scheme.
                let kind = LinkKind::parse(&kind_str).unwrap_or(LinkKind::from_uri(&uri));
                Ok(DownloadLink {
                    quality,
                    uri,
                    kind,
                })
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut links = Vec::new();
        for row in rows {
            links.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(links)
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl MovieStore for SqliteMovieStore {
    fn upsert_batch(&self, records: &[EnrichedRecord]) -> Result<UpsertReport, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(db_err)?;
        let now_str = Utc::now().to_rfc3339();
        let mut report = UpsertReport::default();

        for record in records {
            // Records without links carry nothing worth keeping.
            if !record.has_links() {
                report.skipped_no_links += 1;
                continue;
            }

            let listing = &record.listing;
            let attrs = &record.attributes;
            let cast_json = serde_json::to_string(&attrs.cast)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let screenshots_json = serde_json::to_string(&attrs.screenshots)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let raw_data = serde_json::to_string(record)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            let exists: bool = tx
                .query_row(
                    "SELECT 1 FROM movies WHERE id = ?",
                    params![&listing.id],
                    |_| Ok(true),
                )
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(false),
                    other => Err(db_err(other)),
                })?;

            if exists {
                tx.execute(
                    r#"
                    UPDATE movies SET
                        title = ?2, full_title = ?3, poster = ?4, poster_hd = ?5,
                        category = ?6, year = ?7, country = ?8, genre = ?9,
                        language = ?10, subtitles = ?11, director = ?12, "cast" = ?13,
                        synopsis = ?14, duration = ?15, file_size = ?16, resolution = ?17,
                        format = ?18, release_date = ?19, update_date = ?20,
                        publish_date = ?21, movie_url = ?22, screenshots = ?23,
                        imdb_rating = ?24, scrape_date = ?25, raw_data = ?26
                    WHERE id = ?1
                    "#,
                    params![
                        listing.id,
                        listing.title,
                        attrs.full_title,
                        listing.poster,
                        attrs.poster_hd,
                        listing.category,
                        attrs.year,
                        attrs.country,
                        attrs.genre,
                        attrs.language,
                        attrs.subtitles,
                        attrs.director,
                        cast_json,
                        attrs.synopsis,
                        attrs.duration,
                        attrs.file_size,
                        attrs.resolution,
                        attrs.format,
                        attrs.release_date,
                        listing.update_date,
                        attrs.publish_date,
                        record.movie_url,
                        screenshots_json,
                        attrs.imdb_rating,
                        now_str,
                        raw_data,
                    ],
                )
                .map_err(db_err)?;
                report.updated += 1;
            } else {
                tx.execute(
                    r#"
                    INSERT INTO movies (
                        id, title, full_title, poster, poster_hd, category, year,
                        country, genre, language, subtitles, director, "cast", synopsis,
                        duration, file_size, resolution, format, release_date,
                        update_date, publish_date, movie_url, screenshots,
                        imdb_rating, scrape_date, raw_data
                    ) VALUES (
                        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                        ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
                    )
                    "#,
                    params![
                        listing.id,
                        listing.title,
                        attrs.full_title,
                        listing.poster,
                        attrs.poster_hd,
                        listing.category,
                        attrs.year,
                        attrs.country,
                        attrs.genre,
                        attrs.language,
                        attrs.subtitles,
                        attrs.director,
                        cast_json,
                        attrs.synopsis,
                        attrs.duration,
                        attrs.file_size,
                        attrs.resolution,
                        attrs.format,
                        attrs.release_date,
                        listing.update_date,
                        attrs.publish_date,
                        record.movie_url,
                        screenshots_json,
                        attrs.imdb_rating,
                        now_str,
                        raw_data,
                    ],
                )
                .map_err(db_err)?;
                report.saved += 1;
            }

            // Replace links wholesale so stale ones never survive an update.
            tx.execute(
                "DELETE FROM download_links WHERE movie_id = ?",
                params![&listing.id],
            )
            .map_err(db_err)?;

            for link in &record.download_links {
                tx.execute(
                    "INSERT INTO download_links (movie_id, quality, uri, kind) VALUES (?, ?, ?, ?)",
                    params![listing.id, link.quality, link.uri, link.kind.as_str()],
                )
                .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)?;
        Ok(report)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stats = StoreStats::default();

        stats.total_movies = conn
            .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))
            .map_err(db_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT COALESCE(NULLIF(category, ''), 'unknown'), COUNT(*)
                 FROM movies GROUP BY 1",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
            .map_err(db_err)?;
        for row in rows {
            let (category, count) = row.map_err(db_err)?;
            stats.by_category.insert(category, count);
        }

        let mut stmt = conn
            .prepare("SELECT kind, COUNT(*) FROM download_links GROUP BY kind")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
            .map_err(db_err)?;
        for row in rows {
            let (kind, count) = row.map_err(db_err)?;
            stats.by_link_kind.insert(kind, count);
        }

        Ok(stats)
    }
}
