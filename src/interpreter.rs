use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::{
    ast::*,
    attributes::{AttributeSet, PRIMARY_KEY},
    catalog::Catalog,
    database::Database,
    error::{DbError, Result},
    filter,
    metadata::TableSchema,
    parser::parse_statement,
    response::{QueryResult, Response},
    table::{EMPTY_VALUE, Table},
};

/// Name given to the unpersisted table a join produces.
const JOIN_TABLE: &str = "joinTable";

/// Executes commands against a [Catalog], one at a time.
///
/// Every command that changes a table or its schema ends by saving the open
/// database in full.
#[derive(Debug)]
pub struct Interpreter {
    catalog: Catalog,
}

impl Interpreter {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs one command and renders the outcome, errors included.
    pub fn handle(&mut self, command: &str) -> String {
        match self.execute(command) {
            Ok(response) => response.render(),
            Err(err) => {
                debug!("Command {command:?} failed: {err}");
                Response::render_error(&err)
            }
        }
    }

    /// Parses and runs one command.
    pub fn execute(&mut self, command: &str) -> Result<Response> {
        let statement = parse_statement(command)?;
        self.run(statement)
    }

    pub fn run(&mut self, statement: Statement) -> Result<Response> {
        debug!(?statement, "executing");
        match statement {
            Statement::Use(Use { database }) => {
                self.catalog.use_database(&database)?;
                Ok(Response::Ok)
            }
            Statement::CreateDatabase(CreateDatabase { database }) => {
                self.catalog.create_database(&database)?;
                Ok(Response::Ok)
            }
            Statement::DropDatabase(DropDatabase { database }) => {
                self.catalog.delete_database(&database)?;
                Ok(Response::Ok)
            }
            Statement::CreateTable(create) => {
                self.catalog
                    .database_mut()?
                    .create_table(&create.display_name, &create.attributes.0)?;
                self.saved()
            }
            Statement::DropTable(DropTable { table }) => {
                self.catalog.database_mut()?.drop_table(&table)?;
                self.saved()
            }
            Statement::AddAttribute(alter) => {
                self.catalog
                    .database_mut()?
                    .add_attribute(&alter.table, &alter.attribute)?;
                self.saved()
            }
            Statement::DropAttribute(alter) => {
                self.catalog
                    .database_mut()?
                    .drop_attribute(&alter.table, &alter.attribute)?;
                self.saved()
            }
            Statement::Insert(insert) => {
                let table = self.catalog.database_mut()?.load_table(&insert.table)?;
                let id = table.insert(insert.values.0)?;
                debug!("Inserted record {id} into {:?}", insert.table);
                self.saved()
            }
            Statement::Select(select) => self.select(select),
            Statement::Delete(delete) => self.delete(delete),
            Statement::Update(update) => self.update(update),
            Statement::Join(join) => self.join(join),
        }
    }

    /// Saves and closes the open database, if any.
    pub fn shutdown(&mut self) -> Result<()> {
        self.catalog.close_database()
    }

    fn saved(&self) -> Result<Response> {
        self.catalog.save_database()?;
        Ok(Response::Ok)
    }

    fn select(&mut self, select: Select) -> Result<Response> {
        let table = self.catalog.database_mut()?.load_table(&select.table)?;

        let columns = match select.attributes {
            WildAttributeList::All => table.attributes().iter().map(str::to_string).collect(),
            WildAttributeList::Named(AttributeList(names)) => {
                if let Some(missing) = names.iter().find(|n| !table.attributes().contains(n)) {
                    return Err(DbError::AttributeNotFound {
                        name: missing.clone(),
                    });
                }
                names
            }
        };

        let ids = match &select.condition {
            Some(condition) => filter::evaluate(condition, table)?,
            None => table.ids(),
        };

        Ok(Response::Rows(project(table, columns, &ids)))
    }

    fn delete(&mut self, delete: Delete) -> Result<Response> {
        let table = self.catalog.database_mut()?.load_table(&delete.table)?;
        let ids = filter::evaluate(&delete.condition, table)?;
        table.delete(&ids);
        info!("Deleted {} records from {:?}", ids.len(), delete.table);
        self.saved()
    }

    fn update(&mut self, update: Update) -> Result<Response> {
        let table = self.catalog.database_mut()?.load_table(&update.table)?;
        let ids = filter::evaluate(&update.condition, table)?;
        for id in &ids {
            table.update(*id, &update.assignments.0)?;
        }
        info!("Updated {} records in {:?}", ids.len(), update.table);
        self.saved()
    }

    fn join(&mut self, join: Join) -> Result<Response> {
        let db = self.catalog.database_mut()?;
        db.load_table(&join.left_table)?;
        db.load_table(&join.right_table)?;

        let left = resident(db, &join.left_table)?;
        let right = resident(db, &join.right_table)?;

        for (table, attribute) in [(left, &join.left_attribute), (right, &join.right_attribute)] {
            if !table.attributes().contains(attribute) {
                return Err(DbError::AttributeNotFound {
                    name: attribute.clone(),
                });
            }
        }

        let result = join_tables(left, &join.left_attribute, right, &join.right_attribute)?;
        let columns = result.attributes().iter().map(str::to_string).collect();
        Ok(Response::Rows(project(&result, columns, &result.ids())))
    }
}

fn resident<'a>(db: &'a Database, name: &str) -> Result<&'a Table> {
    db.table(name).ok_or_else(|| DbError::TableNotFound {
        name: name.to_string(),
    })
}

/// Builds the rendered rows of `columns` for the records `ids`, in id order.
fn project(table: &Table, columns: Vec<String>, ids: &BTreeSet<u64>) -> QueryResult {
    let rows = ids
        .iter()
        .filter(|id| table.record(**id).is_ok())
        .map(|id| {
            columns
                .iter()
                .map(|column| table.value(*id, column).unwrap_or(EMPTY_VALUE).to_string())
                .collect()
        })
        .collect();

    QueryResult { columns, rows }
}

/// Every attribute of `table` except `id` and `join_attribute`, paired with
/// its name qualified by the table's display name.
fn qualified_columns(table: &Table, join_attribute: &str) -> Vec<(String, String)> {
    table
        .attributes()
        .iter()
        .filter(|attr| {
            !attr.eq_ignore_ascii_case(PRIMARY_KEY) && !attr.eq_ignore_ascii_case(join_attribute)
        })
        .map(|attr| {
            (
                format!("{}.{}", table.schema.display_name, attr),
                attr.to_string(),
            )
        })
        .collect()
}

/// Nested-loop equality join on the stored text of the two attributes.
///
/// Pairs are produced in ascending left id, then ascending right id, and
/// numbered from 1 in that order.
fn join_tables(
    left: &Table,
    left_attribute: &str,
    right: &Table,
    right_attribute: &str,
) -> Result<Table> {
    let left_columns = qualified_columns(left, left_attribute);
    let right_columns = qualified_columns(right, right_attribute);

    let mut attributes = AttributeSet::with_primary_key();
    for (name, _) in left_columns.iter().chain(&right_columns) {
        if !attributes.insert(name) {
            return Err(DbError::DuplicateAttribute { name: name.clone() });
        }
    }
    let mut result = Table::new(TableSchema::new(JOIN_TABLE, attributes));

    for (left_id, _) in left.records() {
        let key = left.value(left_id, left_attribute);
        for (right_id, _) in right.records() {
            if right.value(right_id, right_attribute) != key {
                continue;
            }
            let values = left_columns
                .iter()
                .map(|(_, attr)| left.value(left_id, attr))
                .chain(
                    right_columns
                        .iter()
                        .map(|(_, attr)| right.value(right_id, attr)),
                )
                .map(|value| value.unwrap_or(EMPTY_VALUE).to_string())
                .collect();
            result.insert(values)?;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn interpreter(dir: &TempDir) -> Interpreter {
        let mut interpreter = Interpreter::new(Catalog::new(dir.path()));
        for command in ["CREATE DATABASE shop;", "USE shop;"] {
            interpreter.execute(command).unwrap();
        }
        interpreter
    }

    fn rows(response: Response) -> QueryResult {
        match response {
            Response::Rows(result) => result,
            Response::Ok => panic!("Expected rows"),
        }
    }

    #[test]
    fn test_commands_need_database() {
        let dir = TempDir::new().unwrap();
        let mut interpreter = Interpreter::new(Catalog::new(dir.path()));

        for command in [
            "CREATE TABLE t;",
            "DROP TABLE t;",
            "ALTER TABLE t ADD a;",
            "INSERT INTO t VALUES (1);",
            "SELECT * FROM t;",
            "DELETE FROM t WHERE a == 1;",
            "UPDATE t SET a = 1 WHERE a == 1;",
            "JOIN t AND u ON a AND b;",
        ] {
            assert!(
                matches!(interpreter.execute(command), Err(DbError::NoDatabaseInUse)),
                "{command}"
            );
        }
    }

    #[test]
    fn test_select_named_columns_keep_their_case() {
        let dir = TempDir::new().unwrap();
        let mut interpreter = interpreter(&dir);
        interpreter.execute("CREATE TABLE people (Name, age);").unwrap();
        interpreter
            .execute("INSERT INTO people VALUES ('Alice', 30);")
            .unwrap();

        let result = rows(interpreter.execute("SELECT NAME FROM people;").unwrap());
        assert_eq!(result.columns, vec!["NAME"]);
        assert_eq!(result.rows, vec![vec!["Alice"]]);

        assert!(matches!(
            interpreter.execute("SELECT height FROM people;"),
            Err(DbError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_update_rejects_primary_key() {
        let dir = TempDir::new().unwrap();
        let mut interpreter = interpreter(&dir);
        interpreter.execute("CREATE TABLE t (a);").unwrap();
        interpreter.execute("INSERT INTO t VALUES (1);").unwrap();

        assert!(matches!(
            interpreter.execute("UPDATE t SET id = 5 WHERE a == 1;"),
            Err(DbError::PrimaryKeyAlteration { .. })
        ));
        // Nothing matched: nothing to reject.
        interpreter
            .execute("UPDATE t SET missing = 5 WHERE a == 2;")
            .unwrap();
    }

    #[test]
    fn test_join_tables_orders_pairs() {
        let dir = TempDir::new().unwrap();
        let mut interpreter = interpreter(&dir);
        for command in [
            "CREATE TABLE People (name, team);",
            "CREATE TABLE Teams (code, city);",
            "INSERT INTO people VALUES ('Ann', 'B');",
            "INSERT INTO people VALUES ('Ben', 'A');",
            "INSERT INTO teams VALUES ('A', 'Oslo');",
            "INSERT INTO teams VALUES ('B', 'Rome');",
            "INSERT INTO teams VALUES ('A', 'Bergen');",
        ] {
            interpreter.execute(command).unwrap();
        }

        let result = rows(
            interpreter
                .execute("JOIN people AND teams ON team AND code;")
                .unwrap(),
        );
        assert_eq!(result.columns, vec!["id", "People.name", "Teams.city"]);
        assert_eq!(
            result.rows,
            vec![
                vec!["1", "Ann", "Rome"],
                vec!["2", "Ben", "Oslo"],
                vec!["3", "Ben", "Bergen"],
            ]
        );
    }

    #[test]
    fn test_join_unknown_attribute() {
        let dir = TempDir::new().unwrap();
        let mut interpreter = interpreter(&dir);
        interpreter.execute("CREATE TABLE a (x);").unwrap();
        interpreter.execute("CREATE TABLE b (y);").unwrap();

        assert!(matches!(
            interpreter.execute("JOIN a AND b ON x AND z;"),
            Err(DbError::AttributeNotFound { .. })
        ));
        assert!(matches!(
            interpreter.execute("JOIN a AND c ON x AND y;"),
            Err(DbError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_handle_renders_envelope() {
        let dir = TempDir::new().unwrap();
        let mut interpreter = interpreter(&dir);

        assert_eq!(interpreter.handle("CREATE TABLE t (a);"), "[OK]");
        assert!(interpreter.handle("CREATE TABLE t (a);").starts_with("[ERROR]: "));
        assert!(interpreter.handle("SELECT * FROM t;").starts_with("[OK]\n\n| id"));
    }
}
