//! Program storage: science programs as compressed JSON documents.

use std::sync::Arc;

use jiff::Timestamp;
use rusqlite::{OptionalExtension, TransactionBehavior};
use tracing::info;

use crate::program::{ProgramDocument, ProgramTree};

use super::{
    ProgramStore, Result, Storage, StorageError, StoredProgram, from_epoch_ns, next_version,
    to_epoch_ns,
};

/// zstd level for stored documents.
const COMPRESSION_LEVEL: i32 = 3;

impl ProgramStore for Storage {
    fn load(&self, project: &str) -> Result<StoredProgram> {
        let conn = self.open_db()?;
        let row = conn
            .query_row(
                "SELECT epoch_ns, document FROM program WHERE project_id = ?1",
                [project],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()?;
        let Some((epoch_ns, blob)) = row else {
            return Err(StorageError::UnknownProject(project.to_string()));
        };

        let tree = decode_program(&blob)?;
        if tree.project_id() != project {
            return Err(StorageError::Corrupt(format!(
                "row for {project} holds program {}",
                tree.project_id()
            )));
        }
        Ok(StoredProgram {
            tree: Arc::new(tree),
            timestamp: from_epoch_ns(epoch_ns)?,
        })
    }

    fn store(
        &self,
        tree: &ProgramTree,
        expected: Option<Timestamp>,
        force: bool,
    ) -> Result<Timestamp> {
        let project = tree.project_id();
        let blob = encode_program(tree)?;

        let mut conn = self.open_db()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stored = tx
            .query_row(
                "SELECT epoch_ns FROM program WHERE project_id = ?1",
                [project],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(from_epoch_ns)
            .transpose()?;

        let timestamp = next_version(project, stored, expected, force)?;
        tx.execute(
            "INSERT INTO program (project_id, epoch_ns, document) VALUES (?1, ?2, ?3)
             ON CONFLICT (project_id) DO UPDATE
             SET epoch_ns = excluded.epoch_ns, document = excluded.document",
            rusqlite::params![project, to_epoch_ns(timestamp)?, blob],
        )?;
        tx.commit()?;

        info!(project, %timestamp, forced = force && stored.is_some(), "program stored");
        Ok(timestamp)
    }

    fn projects(&self) -> Result<Vec<String>> {
        let conn = self.open_db()?;
        let mut stmt = conn.prepare("SELECT project_id FROM program ORDER BY project_id")?;
        let projects = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }
}

fn encode_program(tree: &ProgramTree) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(&tree.to_document())?;
    Ok(zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?)
}

fn decode_program(blob: &[u8]) -> Result<ProgramTree> {
    let json = zstd::decode_all(blob)?;
    let doc: ProgramDocument = serde_json::from_slice(&json)?;
    ProgramTree::from_document(&doc)
        .map_err(|e| StorageError::Corrupt(format!("stored program is invalid: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::{
        model::Remaining,
        program::{DocNode, tests::sample_document},
    };

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        (dir, storage)
    }

    fn sample_tree() -> ProgramTree {
        ProgramTree::from_document(&sample_document()).unwrap()
    }

    #[test]
    fn store_and_load_program() {
        let (_dir, storage) = test_storage();
        let tree = sample_tree();

        let timestamp = storage.store(&tree, None, false).unwrap();
        let loaded = storage.load("M01BU01").unwrap();

        assert_eq!(loaded.timestamp, timestamp);
        assert_eq!(loaded.tree.to_document(), tree.to_document());
        for msb in tree.msbs() {
            assert_eq!(loaded.tree.checksum(msb).unwrap(), tree.checksum(msb).unwrap());
        }
    }

    #[test]
    fn document_is_stored_compressed() {
        let (_dir, storage) = test_storage();
        storage.store(&sample_tree(), None, false).unwrap();

        let conn = storage.open_db().unwrap();
        let blob: Vec<u8> = conn
            .query_row("SELECT document FROM program", [], |row| row.get(0))
            .unwrap();
        assert!(serde_json::from_slice::<serde_json::Value>(&blob).is_err());
        assert!(decode_program(&blob).is_ok());
    }

    #[test]
    fn load_unknown_project_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load("nope").unwrap_err();
        assert!(matches!(err, StorageError::UnknownProject(p) if p == "nope"));
    }

    #[test]
    fn store_with_current_timestamp_succeeds() {
        let (_dir, storage) = test_storage();
        let first = storage.store(&sample_tree(), None, false).unwrap();

        let mut doc = sample_document();
        doc.children.push(DocNode::msb("Extra", 1));
        let tree = ProgramTree::from_document(&doc).unwrap();
        let second = storage.store(&tree, Some(first), false).unwrap();

        assert!(second > first);
        assert_eq!(storage.load("M01BU01").unwrap().tree.msbs().len(), 4);
    }

    #[test]
    fn stale_store_fails_and_keeps_program() {
        let (_dir, storage) = test_storage();
        let first = storage.store(&sample_tree(), None, false).unwrap();
        storage.store(&sample_tree(), Some(first), false).unwrap();

        let mut doc = sample_document();
        doc.children.push(DocNode::msb("Late", 1).with_remaining(Remaining::Count(4)));
        let late = ProgramTree::from_document(&doc).unwrap();

        let err = storage.store(&late, Some(first), false).unwrap_err();
        assert!(matches!(err, StorageError::StaleProgram { .. }));
        assert_eq!(storage.load("M01BU01").unwrap().tree.msbs().len(), 3);

        storage.store(&late, Some(first), true).unwrap();
        assert_eq!(storage.load("M01BU01").unwrap().tree.msbs().len(), 4);
    }

    #[test]
    fn resubmission_without_timestamp_is_stale() {
        let (_dir, storage) = test_storage();
        storage.store(&sample_tree(), None, false).unwrap();
        let err = storage.store(&sample_tree(), None, false).unwrap_err();
        assert!(matches!(err, StorageError::StaleProgram { expected: None, .. }));
    }

    #[test]
    fn projects_are_sorted() {
        let (_dir, storage) = test_storage();
        storage.store(&ProgramTree::new("U02"), None, false).unwrap();
        storage.store(&ProgramTree::new("M01"), None, false).unwrap();
        assert_eq!(storage.projects().unwrap(), vec!["M01", "U02"]);
    }
}
