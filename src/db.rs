use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

pub type Result<T> = std::result::Result<T, rusqlite::Error>;

/// The docset search index (`docSet.dsidx`).
///
/// Writes go into one transaction opened by [`IndexStore::initialize`] and
/// committed by [`IndexStore::finalize`]. Dropping the store without
/// finalizing rolls the run back.
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Drop any previous index and recreate an empty one.
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS searchIndex;
            CREATE TABLE searchIndex (
                id   INTEGER PRIMARY KEY,
                name TEXT,
                type TEXT,
                path TEXT
            );
            CREATE UNIQUE INDEX anchor ON searchIndex (name, type, path);
            BEGIN;
            ",
        )
    }

    /// Insert unless some row already has this path or this name, whatever
    /// its type. Returns whether the row was added.
    pub fn try_insert(&self, name: &str, kind: &str, path: &str) -> Result<bool> {
        let by_path: Option<i64> = self
            .conn
            .query_row(
                "SELECT rowid FROM searchIndex WHERE path = ?1",
                [path],
                |r| r.get(0),
            )
            .optional()?;
        let by_name: Option<i64> = self
            .conn
            .query_row(
                "SELECT rowid FROM searchIndex WHERE name = ?1",
                [name],
                |r| r.get(0),
            )
            .optional()?;
        if by_path.is_some() || by_name.is_some() {
            return Ok(false);
        }
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO searchIndex (name, type, path) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, kind, path],
        )?;
        Ok(n == 1)
    }

    /// Open a savepoint covering one page category's inserts.
    pub fn begin_category(&self) -> Result<()> {
        self.conn.execute_batch("SAVEPOINT category")
    }

    pub fn commit_category(&self) -> Result<()> {
        self.conn.execute_batch("RELEASE category")
    }

    /// Undo every insert since [`IndexStore::begin_category`].
    pub fn rollback_category(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK TO category; RELEASE category")
    }

    pub fn count(&self) -> Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM searchIndex", [], |r| r.get(0))
    }

    /// Per-type entry counts, largest first.
    pub fn count_by_type(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT type, COUNT(*) AS n FROM searchIndex GROUP BY type ORDER BY n DESC, type",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Commit the run and close the file.
    pub fn finalize(self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        self.conn.close().map_err(|(_, e)| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> IndexStore {
        let s = IndexStore::open_in_memory().unwrap();
        s.initialize().unwrap();
        s
    }

    #[test]
    fn same_entry_twice_keeps_one_row() {
        let s = store();
        assert!(s.try_insert("torch.abs", "func", "pytorch.org/docs/#abs").unwrap());
        assert!(!s.try_insert("torch.abs", "func", "pytorch.org/docs/#abs").unwrap());
        assert_eq!(s.count().unwrap(), 1);
    }

    #[test]
    fn name_collision_across_types_rejected() {
        let s = store();
        assert!(s.try_insert("X", "func", "/a").unwrap());
        assert!(!s.try_insert("X", "guide", "/b").unwrap());
        assert_eq!(s.count().unwrap(), 1);
    }

    #[test]
    fn path_collision_alone_rejected() {
        let s = store();
        assert!(s.try_insert("X", "func", "/a").unwrap());
        assert!(!s.try_insert("Y", "guide", "/a").unwrap());
        assert!(s.try_insert("Y", "guide", "/b").unwrap());
        assert_eq!(s.count().unwrap(), 2);
    }

    #[test]
    fn initialize_drops_previous_rows() {
        let s = store();
        s.try_insert("X", "func", "/a").unwrap();
        s.conn.execute_batch("COMMIT").unwrap();
        s.initialize().unwrap();
        assert_eq!(s.count().unwrap(), 0);
    }

    #[test]
    fn category_rollback_keeps_earlier_categories() {
        let s = store();
        s.begin_category().unwrap();
        s.try_insert("a", "func", "/a").unwrap();
        s.commit_category().unwrap();

        s.begin_category().unwrap();
        s.try_insert("aa: b", "Guide", "/b").unwrap();
        s.try_insert("ab: c", "Guide", "/c").unwrap();
        s.rollback_category().unwrap();

        assert_eq!(s.count().unwrap(), 1);
        // rolled-back names are free again
        assert!(s.try_insert("aa: b", "Guide", "/b").unwrap());
    }

    #[test]
    fn category_rollback_survives_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docSet.dsidx");
        let s = IndexStore::open(&path).unwrap();
        s.initialize().unwrap();
        s.begin_category().unwrap();
        s.try_insert("Foo", "func", "site/x").unwrap();
        s.commit_category().unwrap();
        s.begin_category().unwrap();
        s.try_insert("aa: Bar", "Guide", "site/y").unwrap();
        s.rollback_category().unwrap();
        s.finalize().unwrap();

        let reopened = IndexStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn counts_per_type() {
        let s = store();
        s.try_insert("a", "func", "/a").unwrap();
        s.try_insert("b", "func", "/b").unwrap();
        s.try_insert("aa: c", "Guide", "/c").unwrap();
        assert_eq!(
            s.count_by_type().unwrap(),
            vec![("func".to_string(), 2), ("Guide".to_string(), 1)]
        );
    }

    #[test]
    fn finalize_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docSet.dsidx");
        let s = IndexStore::open(&path).unwrap();
        s.initialize().unwrap();
        s.try_insert("Foo", "func", "site/x").unwrap();
        s.finalize().unwrap();

        let reopened = IndexStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn dropping_without_finalize_discards_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docSet.dsidx");
        {
            let s = IndexStore::open(&path).unwrap();
            s.initialize().unwrap();
            s.try_insert("Foo", "func", "site/x").unwrap();
        }
        let reopened = IndexStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 0);
    }
}
