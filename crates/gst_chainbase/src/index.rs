use gst_serialization::Write;

use crate::{ChainbaseError, ChainbaseObject, UndoSession};

/// Ordered view over a table's primary keys.
#[derive(Clone)]
pub struct Index<C>
where
    C: ChainbaseObject,
{
    undo_session: UndoSession,
    __phantom: std::marker::PhantomData<C>,
}

impl<C> Index<C>
where
    C: ChainbaseObject,
{
    pub fn new(undo_session: UndoSession) -> Self {
        Index::<C> {
            undo_session,
            __phantom: std::marker::PhantomData,
        }
    }

    /// Iterate from the first row in the table.
    pub fn begin(&mut self) -> Result<RangeIterator<C>, ChainbaseError> {
        Ok(RangeIterator::<C> {
            undo_session: self.undo_session.clone(),
            next_seek: Seek::LowerBound(Vec::new()),
            __phantom: std::marker::PhantomData,
        })
    }

    /// Iterate from the first row whose key is `>=` the given key. Partial
    /// keys work as prefixes because keys are order-preserving bytes.
    pub fn lower_bound(&mut self, key: impl Write) -> Result<RangeIterator<C>, ChainbaseError> {
        let key_bytes = key.pack().map_err(|e| {
            ChainbaseError::InternalError(format!("failed to serialize key: {}", e))
        })?;
        Ok(RangeIterator::<C> {
            undo_session: self.undo_session.clone(),
            next_seek: Seek::LowerBound(key_bytes),
            __phantom: std::marker::PhantomData,
        })
    }
}

enum Seek {
    LowerBound(Vec<u8>),
    After(Vec<u8>),
    End,
}

pub struct RangeIterator<C>
where
    C: ChainbaseObject,
{
    undo_session: UndoSession,
    next_seek: Seek,
    __phantom: std::marker::PhantomData<C>,
}

impl<C> RangeIterator<C>
where
    C: ChainbaseObject,
{
    pub fn next(&mut self) -> Result<Option<C>, ChainbaseError> {
        let entry = match &self.next_seek {
            Seek::LowerBound(start) => self
                .undo_session
                .lower_bound_entry(C::table_name(), start)?,
            Seek::After(current) => self.undo_session.next_entry(C::table_name(), current)?,
            Seek::End => None,
        };

        match entry {
            Some((key, value)) => {
                self.next_seek = Seek::After(key);
                let object = C::unpack(&value).map_err(|_| ChainbaseError::ReadError)?;
                Ok(Some(object))
            }
            None => {
                self.next_seek = Seek::End;
                Ok(None)
            }
        }
    }
}
