use std::{cell::RefCell, ops::Bound, rc::Rc};

use fjall::{TransactionalKeyspace, TransactionalPartitionHandle, WriteTransaction};

use crate::{ChainbaseError, ChainbaseObject, Index};

/// A unit of work over the keyspace. All mutations made through a session
/// become visible to other sessions only on [`UndoSession::commit`]; dropping
/// or rolling back the session discards them. This is the transactional
/// boundary callers rely on to undo partial state changes.
#[derive(Clone)]
pub struct UndoSession {
    tx: Rc<RefCell<WriteTransaction>>,
    keyspace: TransactionalKeyspace,
}

impl UndoSession {
    pub fn new(keyspace: &TransactionalKeyspace) -> Result<Self, ChainbaseError> {
        let tx = keyspace
            .write_tx()
            .map_err(|e| ChainbaseError::InternalError(format!("failed to begin transaction: {}", e)))?;
        Ok(Self {
            tx: Rc::new(RefCell::new(tx)),
            keyspace: keyspace.clone(),
        })
    }

    fn partition(
        &self,
        table: &'static str,
    ) -> Result<TransactionalPartitionHandle, ChainbaseError> {
        self.keyspace
            .open_partition(table, Default::default())
            .map_err(|e| {
                ChainbaseError::InternalError(format!("failed to open partition {}: {}", table, e))
            })
    }

    #[must_use]
    pub fn exists<T: ChainbaseObject>(
        &mut self,
        key: T::PrimaryKey,
    ) -> Result<bool, ChainbaseError> {
        let partition = self.partition(T::table_name())?;
        let mut tx = self.tx.borrow_mut();
        tx.contains_key(&partition, T::primary_key_to_bytes(key))
            .map_err(|e| ChainbaseError::InternalError(format!("failed to check existence: {}", e)))
    }

    #[must_use]
    pub fn find<T: ChainbaseObject>(
        &mut self,
        key: T::PrimaryKey,
    ) -> Result<Option<T>, ChainbaseError> {
        let partition = self.partition(T::table_name())?;
        let mut tx = self.tx.borrow_mut();
        let serialized = tx
            .get(&partition, T::primary_key_to_bytes(key))
            .map_err(|e| ChainbaseError::InternalError(format!("failed to get object: {}", e)))?;
        match serialized {
            Some(serialized) => {
                let object = T::unpack(&serialized).map_err(|_| ChainbaseError::ReadError)?;
                Ok(Some(object))
            }
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn get<T: ChainbaseObject>(&mut self, key: T::PrimaryKey) -> Result<T, ChainbaseError> {
        self.find::<T>(key)?.ok_or(ChainbaseError::NotFound)
    }

    pub fn insert<T: ChainbaseObject>(&mut self, object: &T) -> Result<(), ChainbaseError> {
        let key = object.primary_key();
        let serialized = object.pack().map_err(|_| ChainbaseError::InvalidData)?;
        let partition = self.partition(T::table_name())?;
        let mut tx = self.tx.borrow_mut();
        let exists = tx
            .contains_key(&partition, &key)
            .map_err(|e| ChainbaseError::InternalError(format!("failed to check existence: {}", e)))?;
        if exists {
            return Err(ChainbaseError::AlreadyExists);
        }
        tx.insert(&partition, &key, serialized);
        Ok(())
    }

    pub fn modify<T, F>(&mut self, old: &mut T, f: F) -> Result<(), ChainbaseError>
    where
        T: ChainbaseObject,
        F: FnOnce(&mut T),
    {
        let key = old.primary_key();
        let partition = self.partition(T::table_name())?;
        let mut tx = self.tx.borrow_mut();
        let existing = tx
            .get(&partition, &key)
            .map_err(|e| ChainbaseError::InternalError(format!("failed to get object: {}", e)))?;
        if existing.is_none() {
            return Err(ChainbaseError::NotFound);
        }
        f(old);
        let serialized = old.pack().map_err(|_| ChainbaseError::InvalidData)?;
        tx.insert(&partition, &key, serialized);
        Ok(())
    }

    pub fn remove<T: ChainbaseObject>(&mut self, object: T) -> Result<(), ChainbaseError> {
        let key = object.primary_key();
        let partition = self.partition(T::table_name())?;
        let mut tx = self.tx.borrow_mut();
        let exists = tx
            .contains_key(&partition, &key)
            .map_err(|e| ChainbaseError::InternalError(format!("failed to check existence: {}", e)))?;
        if !exists {
            return Err(ChainbaseError::NotFound);
        }
        tx.remove(&partition, &key);
        Ok(())
    }

    /// The first `(key, value)` entry at or after `start` in key order.
    pub(crate) fn lower_bound_entry(
        &mut self,
        table: &'static str,
        start: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, ChainbaseError> {
        self.next_entry_impl(table, Bound::Included(start.to_vec()))
    }

    /// The first `(key, value)` entry strictly after `after` in key order.
    pub(crate) fn next_entry(
        &mut self,
        table: &'static str,
        after: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, ChainbaseError> {
        self.next_entry_impl(table, Bound::Excluded(after.to_vec()))
    }

    fn next_entry_impl(
        &mut self,
        table: &'static str,
        lower: Bound<Vec<u8>>,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, ChainbaseError> {
        let partition = self.partition(table)?;
        let mut tx = self.tx.borrow_mut();
        let mut range = tx.range(&partition, (lower, Bound::Unbounded));
        match range.next() {
            Some(Ok((key, value))) => Ok(Some((key.to_vec(), value.to_vec()))),
            Some(Err(e)) => Err(ChainbaseError::InternalError(format!(
                "failed to iterate partition {}: {}",
                table, e
            ))),
            None => Ok(None),
        }
    }

    pub fn get_index<C>(&self) -> Index<C>
    where
        C: ChainbaseObject,
    {
        Index::<C>::new(self.clone())
    }

    pub fn commit(self) -> Result<(), ChainbaseError> {
        let tx = Rc::try_unwrap(self.tx)
            .map_err(|_| {
                ChainbaseError::InternalError("session still borrowed at commit".to_string())
            })?
            .into_inner();
        tx.commit()
            .map_err(|e| ChainbaseError::InternalError(format!("failed to commit: {}", e)))?
            .map_err(|e| ChainbaseError::InternalError(format!("failed to commit: {}", e)))
    }

    pub fn rollback(self) -> Result<(), ChainbaseError> {
        let tx = Rc::try_unwrap(self.tx)
            .map_err(|_| {
                ChainbaseError::InternalError("session still borrowed at rollback".to_string())
            })?
            .into_inner();
        tx.rollback();
        Ok(())
    }
}
