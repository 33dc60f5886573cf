use std::path::Path;

use fjall::{Config, TransactionalKeyspace};
use gst_serialization::{Read, Write};

mod error;
pub use error::ChainbaseError;

mod undo_session;
pub use undo_session::UndoSession;

mod index;
pub use index::{Index, RangeIterator};

/// A row type stored in its own partition, addressed by a serialized primary
/// key. Key bytes must sort in the same order as the logical key so that
/// iteration with [`Index::lower_bound`] walks rows in key order.
pub trait ChainbaseObject: Read + Write {
    type PrimaryKey;

    fn primary_key(&self) -> Vec<u8>;
    fn primary_key_to_bytes(key: Self::PrimaryKey) -> Vec<u8>;
    fn table_name() -> &'static str;
}

#[derive(Clone)]
pub struct Database {
    keyspace: TransactionalKeyspace,
}

impl Database {
    pub fn new(path: &Path) -> Result<Self, ChainbaseError> {
        let keyspace = Config::new(path)
            .open_transactional()
            .map_err(|e| ChainbaseError::InternalError(format!("failed to open keyspace: {}", e)))?;
        Ok(Self { keyspace })
    }

    /// Opens a keyspace that is deleted when dropped. Used by tests and
    /// benchmarks.
    pub fn temporary(path: &Path) -> Result<Self, ChainbaseError> {
        let keyspace = Config::new(path)
            .temporary(true)
            .open_transactional()
            .map_err(|e| ChainbaseError::InternalError(format!("failed to open keyspace: {}", e)))?;
        Ok(Self { keyspace })
    }

    pub fn undo_session(&self) -> Result<UndoSession, ChainbaseError> {
        UndoSession::new(&self.keyspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gst_proc_macros::{NumBytes, Read, Write};

    #[derive(Debug, Default, Clone, PartialEq, Read, Write, NumBytes)]
    struct TestObject {
        id: u64,
        label: String,
    }

    impl ChainbaseObject for TestObject {
        type PrimaryKey = u64;

        fn primary_key(&self) -> Vec<u8> {
            TestObject::primary_key_to_bytes(self.id)
        }

        fn primary_key_to_bytes(key: Self::PrimaryKey) -> Vec<u8> {
            key.to_be_bytes().to_vec()
        }

        fn table_name() -> &'static str {
            "test_object"
        }
    }

    #[test]
    fn test_insert_find_modify_remove() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db = Database::temporary(dir.path()).expect("failed to create database");
        let mut session = db.undo_session().expect("failed to create session");

        let obj = TestObject {
            id: 1,
            label: "one".to_string(),
        };
        session.insert(&obj).expect("failed to insert object");
        assert!(matches!(
            session.insert(&obj),
            Err(ChainbaseError::AlreadyExists)
        ));

        let mut found = session
            .get::<TestObject>(1)
            .expect("failed to get object");
        assert_eq!(found.label, "one");

        session
            .modify(&mut found, |o| o.label = "uno".to_string())
            .expect("failed to modify object");
        let found = session.find::<TestObject>(1).expect("failed to find");
        assert_eq!(found.unwrap().label, "uno");

        session
            .remove(TestObject {
                id: 1,
                label: "uno".to_string(),
            })
            .expect("failed to remove object");
        assert!(session.find::<TestObject>(1).expect("find failed").is_none());
    }

    #[test]
    fn test_iteration_order() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db = Database::temporary(dir.path()).expect("failed to create database");
        let mut session = db.undo_session().expect("failed to create session");

        for id in [5u64, 1, 9, 3] {
            session
                .insert(&TestObject {
                    id,
                    label: id.to_string(),
                })
                .expect("failed to insert object");
        }

        let mut index = session.get_index::<TestObject>();
        let mut itr = index.lower_bound(2u64).expect("failed to seek");
        let mut seen = Vec::new();
        while let Some(obj) = itr.next().expect("iteration failed") {
            seen.push(obj.id);
        }
        assert_eq!(seen, vec![3, 5, 9]);
    }

    #[test]
    fn test_rollback_discards_changes() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db = Database::temporary(dir.path()).expect("failed to create database");

        let mut session = db.undo_session().expect("failed to create session");
        session
            .insert(&TestObject {
                id: 7,
                label: "seven".to_string(),
            })
            .expect("failed to insert object");
        session.rollback().expect("failed to roll back");

        let mut session = db.undo_session().expect("failed to create session");
        assert!(session.find::<TestObject>(7).expect("find failed").is_none());
    }
}
