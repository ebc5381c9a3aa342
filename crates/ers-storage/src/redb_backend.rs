use crate::{KVStore, Result, StorageError, Transaction as KVTransaction};
use bytes::Bytes;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const OBJECTS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("objects");

/// redb-based storage backend
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open (or create) the database file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening redb database at: {}", path.as_ref().display());

        let db = Database::create(path.as_ref())?;

        // Create the table up front so readers never see TableDoesNotExist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(OBJECTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KVStore for RedbBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        debug!("Getting key: {}", String::from_utf8_lossy(key));

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBJECTS_TABLE)?;

        let value = table
            .get(key)?
            .map(|value| Bytes::copy_from_slice(value.value()));
        Ok(value)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        debug!("Putting key: {}", String::from_utf8_lossy(key));

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(OBJECTS_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Bytes, Bytes)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBJECTS_TABLE)?;

        let mut results = Vec::new();

        // Keys are ordered, so everything with the prefix is one contiguous run
        for entry in table.range::<&[u8]>(prefix..)? {
            let (key, value) = entry?;
            let key_bytes = key.value();
            if !key_bytes.starts_with(prefix) {
                break;
            }
            results.push((
                Bytes::copy_from_slice(key_bytes),
                Bytes::copy_from_slice(value.value()),
            ));
        }

        debug!(
            "Scan of {} found {} results",
            String::from_utf8_lossy(prefix),
            results.len()
        );
        Ok(results)
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBJECTS_TABLE)?;
        let found = table.get(key)?.is_some();
        Ok(found)
    }

    fn transaction(&self) -> Result<Box<dyn KVTransaction>> {
        let write_txn = self.db.begin_write()?;
        Ok(Box::new(RedbTransaction { txn: Some(write_txn) }))
    }
}

/// redb write transaction; dropped without commit means aborted
struct RedbTransaction {
    txn: Option<redb::WriteTransaction>,
}

impl RedbTransaction {
    fn txn(&self) -> Result<&redb::WriteTransaction> {
        self.txn.as_ref().ok_or_else(|| {
            StorageError::transaction_error("Transaction already committed or rolled back")
        })
    }
}

impl KVTransaction for RedbTransaction {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let table = self.txn()?.open_table(OBJECTS_TABLE)?;
        let value = table
            .get(key)?
            .map(|value| Bytes::copy_from_slice(value.value()));
        Ok(value)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut table = self.txn()?.open_table(OBJECTS_TABLE)?;
        table.insert(key, value)?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let txn = self.txn.take().ok_or_else(|| {
            StorageError::transaction_error("Transaction already committed or rolled back")
        })?;
        txn.commit()?;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        let txn = self.txn.take().ok_or_else(|| {
            StorageError::transaction_error("Transaction already committed or rolled back")
        })?;
        txn.abort()?;
        Ok(())
    }
}

impl Drop for RedbTransaction {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            let _ = txn.abort();
        }
    }
}
