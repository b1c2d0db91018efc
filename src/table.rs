use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    attributes::{AttributeSet, PRIMARY_KEY},
    error::{DbError, Result},
    metadata::TableSchema,
};

/// One row: attribute name (lowercase) to stored text.
pub type Record = HashMap<String, String>;

/// Value written into existing records when a column is added.
pub const EMPTY_VALUE: &str = "";

/// A table resident in memory.
///
/// Invariants kept by every method:
/// - each record holds exactly one value per attribute in the schema;
/// - each record's `id` value is its key in `records`;
/// - the schema's next id is greater than every key.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: TableSchema,
    records: BTreeMap<u64, Record>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            records: BTreeMap::new(),
        }
    }

    /// Reads a row file written by [Table::save].
    ///
    /// The header line is skipped; values are mapped onto the schema's
    /// attributes by position. Missing trailing values become empty.
    pub fn load(mut schema: TableSchema, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut records = BTreeMap::new();

        for line in content.lines().skip(1) {
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let record: Record = schema
                .attributes
                .iter()
                .map(|attr| {
                    let value = fields.next().unwrap_or(EMPTY_VALUE);
                    (attr.to_lowercase(), value.to_string())
                })
                .collect();

            let id = record
                .get(PRIMARY_KEY)
                .and_then(|v| v.parse::<u64>().ok())
                .ok_or_else(|| DbError::CorruptRowFile {
                    path: path.to_path_buf(),
                    reason: format!("invalid id in line {line:?}"),
                })?;
            schema.reserve_past(id);
            records.insert(id, record);
        }

        debug!("Loaded {} records from {:?}", records.len(), path);
        Ok(Self { schema, records })
    }

    /// Rewrites the whole row file: a header line, then one line per record.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);

        let header: Vec<&str> = self.schema.attributes.iter().collect();
        writeln!(writer, "{}", header.join("\t"))?;

        for record in self.records.values() {
            let line: Vec<&str> = self
                .schema
                .attributes
                .iter()
                .map(|attr| {
                    record
                        .get(&attr.to_lowercase())
                        .map(String::as_str)
                        .unwrap_or(EMPTY_VALUE)
                })
                .collect();
            writeln!(writer, "{}", line.join("\t"))?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.schema.attributes
    }

    /// Inserts a record from values for every attribute after `id`, in
    /// declaration order, and returns the id it was given.
    pub fn insert(&mut self, values: Vec<String>) -> Result<u64> {
        let expected = self.schema.attributes.len().saturating_sub(1);
        if values.len() != expected {
            return Err(DbError::InvalidValue {
                expected,
                found: values.len(),
            });
        }

        let id = self.schema.allocate_id();
        let mut record = Record::with_capacity(values.len() + 1);
        record.insert(PRIMARY_KEY.to_string(), id.to_string());
        for (attr, value) in self.schema.attributes.iter().skip(1).zip(values) {
            record.insert(attr.to_lowercase(), value);
        }
        self.records.insert(id, record);
        Ok(id)
    }

    /// Adds a column and fills it with [EMPTY_VALUE] on every record.
    pub fn add_attribute(&mut self, name: &str) -> Result<()> {
        if !self.schema.attributes.insert(name) {
            return Err(DbError::DuplicateAttribute {
                name: name.to_string(),
            });
        }
        let key = name.to_lowercase();
        for record in self.records.values_mut() {
            record.insert(key.clone(), EMPTY_VALUE.to_string());
        }
        Ok(())
    }

    /// Removes a column from the schema and from every record.
    pub fn drop_attribute(&mut self, name: &str) -> Result<()> {
        if name.eq_ignore_ascii_case(PRIMARY_KEY) {
            return Err(DbError::PrimaryKeyAlteration {
                name: name.to_string(),
            });
        }
        if !self.schema.attributes.remove(name) {
            return Err(DbError::AttributeNotFound {
                name: name.to_string(),
            });
        }
        let key = name.to_lowercase();
        for record in self.records.values_mut() {
            record.remove(&key);
        }
        Ok(())
    }

    /// Removes every record whose id is in `ids`; unknown ids are ignored.
    pub fn delete(&mut self, ids: &BTreeSet<u64>) {
        self.records.retain(|id, _| !ids.contains(id));
    }

    /// Applies `assignments` to the record `id`.
    ///
    /// All assignments are checked before any is applied, so a rejected
    /// assignment leaves this record untouched.
    pub fn update(&mut self, id: u64, assignments: &[(String, String)]) -> Result<()> {
        for (attr, _) in assignments {
            if attr.eq_ignore_ascii_case(PRIMARY_KEY) {
                return Err(DbError::PrimaryKeyAlteration { name: attr.clone() });
            }
            if !self.schema.attributes.contains(attr) {
                return Err(DbError::AttributeNotFound { name: attr.clone() });
            }
        }

        let record = self
            .records
            .get_mut(&id)
            .ok_or(DbError::RecordNotFound { id })?;
        for (attr, value) in assignments {
            record.insert(attr.to_lowercase(), value.clone());
        }
        Ok(())
    }

    pub fn record(&self, id: u64) -> Result<&Record> {
        self.records.get(&id).ok_or(DbError::RecordNotFound { id })
    }

    /// All records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = (u64, &Record)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    pub fn ids(&self) -> BTreeSet<u64> {
        self.records.keys().copied().collect()
    }

    /// The stored value of `attribute` for record `id`, if both exist.
    pub fn value(&self, id: u64, attribute: &str) -> Option<&str> {
        self.records
            .get(&id)
            .and_then(|record| record.get(&attribute.to_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
