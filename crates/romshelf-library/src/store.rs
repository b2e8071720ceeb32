//! Collection persistence using SQLite

use crate::LibraryError;
use crate::rom::{Collection, Rom, RomFile, RomId, RomMetadata};
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};

/// Where launcher collections are loaded from and swapped into
pub trait CollectionStore {
    /// Load a launcher's collection; unknown launchers are empty
    fn load_collection(&self, launcher_id: &str) -> Result<Collection, LibraryError>;

    /// Replace a launcher's collection in one step
    fn save_collection(&mut self, launcher_id: &str, collection: &Collection) -> Result<(), LibraryError>;
}

/// Collection store backed by a SQLite database
pub struct SqliteCollectionStore {
    conn: Connection,
}

impl SqliteCollectionStore {
    /// Open or create a database
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let conn = Connection::open(path)?;

        let store = Self { conn };
        store.init_schema()?;

        Ok(store)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn = Connection::open_in_memory()?;

        let store = Self { conn };
        store.init_schema()?;

        Ok(store)
    }

    fn init_schema(&self) -> Result<(), LibraryError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS roms (
                launcher_id TEXT NOT NULL,
                id TEXT NOT NULL,
                title TEXT NOT NULL,
                year TEXT NOT NULL DEFAULT '',
                genre TEXT NOT NULL DEFAULT '',
                developer TEXT NOT NULL DEFAULT '',
                players TEXT NOT NULL DEFAULT '',
                content_rating TEXT NOT NULL DEFAULT 'unknown',
                plot TEXT NOT NULL DEFAULT '',
                path TEXT NOT NULL,
                discs TEXT NOT NULL DEFAULT '[]',
                assets TEXT NOT NULL DEFAULT '{}',
                extra INTEGER NOT NULL DEFAULT 0,
                attributes TEXT NOT NULL DEFAULT '{}',
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (launcher_id, id)
            );

            CREATE INDEX IF NOT EXISTS idx_roms_launcher ON roms(launcher_id);
        "#,
        )?;

        Ok(())
    }

    /// Number of ROMs stored for a launcher
    pub fn count(&self, launcher_id: &str) -> Result<usize, LibraryError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM roms WHERE launcher_id = ?1",
            params![launcher_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Launchers with at least one stored ROM
    pub fn launcher_ids(&self) -> Result<Vec<String>, LibraryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT launcher_id FROM roms ORDER BY launcher_id")?;

        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    fn row_to_rom(row: &Row) -> Result<Rom, LibraryError> {
        let path: String = row.get("path")?;
        let discs: String = row.get("discs")?;
        let assets: String = row.get("assets")?;
        let attributes: String = row.get("attributes")?;

        Ok(Rom {
            id: RomId::new(row.get::<_, String>("id")?),
            title: row.get("title")?,
            metadata: RomMetadata {
                year: row.get("year")?,
                genre: row.get("genre")?,
                developer: row.get("developer")?,
                players: row.get("players")?,
                content_rating: row.get("content_rating")?,
                plot: row.get("plot")?,
            },
            file: RomFile {
                path: PathBuf::from(path),
                discs: serde_json::from_str(&discs)?,
            },
            assets: serde_json::from_str(&assets)?,
            extra: row.get("extra")?,
            attributes: serde_json::from_str(&attributes)?,
        })
    }
}

impl CollectionStore for SqliteCollectionStore {
    fn load_collection(&self, launcher_id: &str) -> Result<Collection, LibraryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM roms WHERE launcher_id = ?1")?;

        let mut rows = stmt.query(params![launcher_id])?;
        let mut collection = Collection::new();
        while let Some(row) = rows.next()? {
            collection.insert(Self::row_to_rom(row)?);
        }

        tracing::debug!("Loaded {} ROMs for launcher {}", collection.len(), launcher_id);
        Ok(collection)
    }

    fn save_collection(&mut self, launcher_id: &str, collection: &Collection) -> Result<(), LibraryError> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM roms WHERE launcher_id = ?1", params![launcher_id])?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO roms
                   (launcher_id, id, title, year, genre, developer, players,
                    content_rating, plot, path, discs, assets, extra, attributes, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, CURRENT_TIMESTAMP)"#,
            )?;

            for rom in collection.iter() {
                stmt.execute(params![
                    launcher_id,
                    rom.id.as_str(),
                    rom.title,
                    rom.metadata.year,
                    rom.metadata.genre,
                    rom.metadata.developer,
                    rom.metadata.players,
                    rom.metadata.content_rating,
                    rom.metadata.plot,
                    rom.file.path.to_string_lossy(),
                    serde_json::to_string(&rom.file.discs)?,
                    serde_json::to_string(&rom.assets)?,
                    rom.extra,
                    serde_json::to_string(&rom.attributes)?,
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!("Saved {} ROMs for launcher {}", collection.len(), launcher_id);
        Ok(())
    }
}
