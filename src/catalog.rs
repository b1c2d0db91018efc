use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    database::Database,
    error::{DbError, Result},
    metadata::METADATA_FILE,
};

/// A storage session over a workspace directory holding one sub-directory
/// per database.
///
/// At most one database is open at a time. The catalog is an ordinary owned
/// value: construct one per workspace and hand it to the interpreter.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    current: Option<Database>,
}

impl Catalog {
    /// Creates a catalog over `root`. The directory is not touched until a
    /// database operation needs it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            current: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn database_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// True iff `name` is a directory containing a metadata descriptor.
    pub fn database_exists(&self, name: &str) -> bool {
        let path = self.database_path(name);
        path.is_dir() && path.join(METADATA_FILE).is_file()
    }

    pub fn create_database(&mut self, name: &str) -> Result<()> {
        if self.database_exists(name) {
            return Err(DbError::DatabaseAlreadyExists {
                name: name.to_string(),
            });
        }
        Database::create(name, &self.database_path(name))
    }

    /// Closes the open database (saving it) and opens `name` instead.
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        if !self.database_exists(name) {
            return Err(DbError::DatabaseNotFound {
                name: name.to_string(),
            });
        }
        self.close_database()?;
        self.current = Some(Database::open(name, &self.database_path(name))?);
        Ok(())
    }

    /// Removes a database directory. If it is the open database it is
    /// discarded first without being saved.
    pub fn delete_database(&mut self, name: &str) -> Result<()> {
        if !self.database_exists(name) {
            return Err(DbError::DatabaseNotFound {
                name: name.to_string(),
            });
        }
        if self.current_name() == Some(name) {
            warn!("Deleting database {name:?} while it is in use");
            self.current = None;
        }
        fs::remove_dir_all(self.database_path(name)).map_err(|source| DbError::DeleteDatabaseFailed {
            name: name.to_string(),
            source,
        })?;
        info!("Deleted database {name:?}");
        Ok(())
    }

    /// Saves and unloads the open database. A no-op when none is open.
    pub fn close_database(&mut self) -> Result<()> {
        self.save_database()?;
        if let Some(db) = self.current.take() {
            info!("Closed database {:?}", db.name());
        }
        Ok(())
    }

    /// Rewrites the open database's metadata and resident row files.
    /// A no-op when none is open.
    pub fn save_database(&self) -> Result<()> {
        match &self.current {
            Some(db) => db.save(),
            None => Ok(()),
        }
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(Database::name)
    }

    pub fn database(&self) -> Result<&Database> {
        self.current.as_ref().ok_or(DbError::NoDatabaseInUse)
    }

    pub fn database_mut(&mut self) -> Result<&mut Database> {
        self.current.as_mut().ok_or(DbError::NoDatabaseInUse)
    }
}
