use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    attributes::AttributeSet,
    error::{DbError, Result},
    metadata::{DatabaseMetadata, METADATA_FILE, TableSchema},
    table::Table,
};

/// Extension of the per-table row files.
const ROW_FILE_EXTENSION: &str = "tab";

/// A registered table, either only described by its schema or resident.
#[derive(Debug)]
enum TableSlot {
    Unloaded(TableSchema),
    Loaded(Table),
}

impl TableSlot {
    fn schema(&self) -> &TableSchema {
        match self {
            TableSlot::Unloaded(schema) => schema,
            TableSlot::Loaded(table) => &table.schema,
        }
    }
}

/// An open database: its directory and the registry of its tables.
///
/// Tables are read from their row files the first time a command needs
/// them and stay resident until the database is closed. A table's schema
/// lives in exactly one place, its slot, so the metadata written on save is
/// always the schema the table itself was mutated through.
#[derive(Debug)]
pub struct Database {
    name: String,
    path: PathBuf,
    tables: BTreeMap<String, TableSlot>,
}

impl Database {
    /// Creates the database directory with an empty metadata descriptor.
    pub fn create(name: &str, path: &Path) -> Result<()> {
        fs::create_dir(path)?;
        DatabaseMetadata::default().save(&path.join(METADATA_FILE))?;
        info!("Created database {name:?} at {path:?}");
        Ok(())
    }

    /// Opens an existing database directory. No table is loaded yet.
    pub fn open(name: &str, path: &Path) -> Result<Self> {
        let metadata = DatabaseMetadata::load(&path.join(METADATA_FILE))?;
        let tables = metadata
            .tables
            .into_iter()
            .map(|(name, schema)| (name, TableSlot::Unloaded(schema)))
            .collect();

        info!("Opened database {name:?}");
        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            tables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The descriptor as it would be written now.
    pub fn metadata(&self) -> DatabaseMetadata {
        DatabaseMetadata {
            tables: self
                .tables
                .iter()
                .map(|(name, slot)| (name.clone(), slot.schema().clone()))
                .collect(),
        }
    }

    /// Rewrites the metadata descriptor and the row file of every resident table.
    pub fn save(&self) -> Result<()> {
        self.metadata().save(&self.path.join(METADATA_FILE))?;
        for (name, slot) in &self.tables {
            if let TableSlot::Loaded(table) = slot {
                table.save(&self.row_file(name))?;
            }
        }
        debug!("Saved database {:?}", self.name);
        Ok(())
    }

    fn row_file(&self, table: &str) -> PathBuf {
        self.path.join(format!("{table}.{ROW_FILE_EXTENSION}"))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Names of every registered table, loaded or not.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Makes `name` resident if it is not already and returns it.
    ///
    /// # Errors
    /// Returns an error if the table is not registered or its row file
    /// cannot be read.
    pub fn load_table(&mut self, name: &str) -> Result<&mut Table> {
        let path = self.row_file(name);
        let slot = self
            .tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound {
                name: name.to_string(),
            })?;

        if let TableSlot::Unloaded(schema) = slot {
            let table = Table::load(schema.clone(), &path)?;
            *slot = TableSlot::Loaded(table);
        }

        match slot {
            TableSlot::Loaded(table) => Ok(table),
            TableSlot::Unloaded(_) => Err(DbError::TableNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// A resident table. Returns `None` for unknown or not yet loaded tables.
    pub fn table(&self, name: &str) -> Option<&Table> {
        match self.tables.get(name) {
            Some(TableSlot::Loaded(table)) => Some(table),
            _ => None,
        }
    }

    /// Registers a new table and writes its header-only row file.
    ///
    /// The table gets an implicit leading `id` attribute; `attributes` must
    /// not repeat a name (case-insensitively) nor name `id` itself.
    pub fn create_table(&mut self, display_name: &str, attributes: &[String]) -> Result<()> {
        let key = display_name.to_lowercase();
        if self.tables.contains_key(&key) {
            return Err(DbError::TableAlreadyExists { name: key });
        }

        let mut set = AttributeSet::with_primary_key();
        for attribute in attributes {
            if !set.insert(attribute) {
                return Err(DbError::DuplicateAttribute {
                    name: attribute.clone(),
                });
            }
        }

        let table = Table::new(TableSchema::new(display_name, set));
        table.save(&self.row_file(&key))?;
        info!("Created table {key:?} in database {:?}", self.name);
        self.tables.insert(key, TableSlot::Loaded(table));
        Ok(())
    }

    /// Unregisters a table and deletes its row file.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if self.tables.remove(name).is_none() {
            return Err(DbError::TableNotFound {
                name: name.to_string(),
            });
        }
        match fs::remove_file(self.row_file(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!("Dropped table {name:?} from database {:?}", self.name);
        Ok(())
    }

    pub fn add_attribute(&mut self, table: &str, attribute: &str) -> Result<()> {
        self.load_table(table)?.add_attribute(attribute)
    }

    pub fn drop_attribute(&mut self, table: &str, attribute: &str) -> Result<()> {
        self.load_table(table)?.drop_attribute(attribute)
    }
}
