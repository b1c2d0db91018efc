use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    attributes::{AttributeSet, PRIMARY_KEY},
    error::{DbError, Result},
};

/// File name of the metadata descriptor inside a database directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Persisted description of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// The name as written in `CREATE TABLE`, used when qualifying join columns.
    #[serde(rename = "originalTableName")]
    pub display_name: String,
    #[serde(rename = "primaryKey")]
    pub primary_key: String,
    next_primary_key: u64,
    pub attributes: AttributeSet,
}

impl TableSchema {
    /// A fresh schema whose id counter starts at 1.
    pub fn new(display_name: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            display_name: display_name.into(),
            primary_key: PRIMARY_KEY.to_string(),
            next_primary_key: 1,
            attributes,
        }
    }

    /// The id the next inserted record will receive.
    pub fn next_primary_key(&self) -> u64 {
        self.next_primary_key
    }

    /// Hands out the next record id and advances the counter.
    ///
    /// This is the only place the counter moves forward, so ids are never
    /// reused even after the records holding them are deleted.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_primary_key;
        self.next_primary_key += 1;
        id
    }

    /// Raises the counter so that it exceeds `id`. Never lowers it.
    pub(crate) fn reserve_past(&mut self, id: u64) {
        if self.next_primary_key <= id {
            self.next_primary_key = id + 1;
        }
    }
}

/// The per-database descriptor: every registered table, keyed by lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub tables: BTreeMap<String, TableSchema>,
}

impl DatabaseMetadata {
    /// Reads a descriptor, rejecting tables whose attributes do not start
    /// with the primary key.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let metadata: Self = serde_json::from_reader(reader)?;

        for (name, schema) in &metadata.tables {
            let leading = schema.attributes.get(0);
            if !leading.is_some_and(|attr| attr.eq_ignore_ascii_case(PRIMARY_KEY)) {
                return Err(DbError::CorruptMetadata {
                    path: path.to_path_buf(),
                    reason: format!("table {name:?} does not start with {PRIMARY_KEY:?}"),
                });
            }
        }
        Ok(metadata)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
