//! Parsed commands. Nodes are plain data built once by the parser.
//!
//! Table and database names are stored lower-cased. Attribute names keep the
//! case they were written in; every lookup on them is case-insensitive.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Use(Use),
    CreateDatabase(CreateDatabase),
    CreateTable(CreateTable),
    DropDatabase(DropDatabase),
    DropTable(DropTable),
    AddAttribute(AlterAttribute),
    DropAttribute(AlterAttribute),
    Insert(Insert),
    Select(Select),
    Delete(Delete),
    Update(Update),
    Join(Join),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Use {
    pub database: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDatabase {
    pub database: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: String,
    /// The table name as written, kept for qualifying join columns.
    pub display_name: String,
    /// Empty when the statement has no attribute list.
    pub attributes: AttributeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropDatabase {
    pub database: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub table: String,
}

/// Payload of both `ALTER TABLE ... ADD` and `ALTER TABLE ... DROP`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterAttribute {
    pub table: String,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub values: ValueList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub attributes: WildAttributeList,
    pub table: String,
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: NameValueList,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left_table: String,
    pub right_table: String,
    pub left_attribute: String,
    pub right_attribute: String,
}

/// Attribute names in the order they were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeList(pub Vec<String>);

/// Literal values with quotes stripped, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueList(pub Vec<String>);

/// `SET` assignments in the order they were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameValueList(pub Vec<(String, String)>);

#[derive(Debug, Clone, PartialEq)]
pub enum WildAttributeList {
    /// `*`
    All,
    Named(AttributeList),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

/// A predicate over the records of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison {
        attribute: String,
        comparator: Comparator,
        value: String,
    },
    Boolean {
        left: Box<Condition>,
        op: BoolOperator,
        right: Box<Condition>,
    },
}

impl Condition {
    pub fn comparison(
        attribute: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> Self {
        Condition::Comparison {
            attribute: attribute.into(),
            comparator,
            value: value.into(),
        }
    }

    pub fn boolean(left: Condition, op: BoolOperator, right: Condition) -> Self {
        Condition::Boolean {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::LessThan => "<",
            Comparator::LessThanOrEqual => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanOrEqual => ">=",
            Comparator::Like => "LIKE",
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison {
                attribute,
                comparator,
                value,
            } => write!(f, "{attribute} {comparator} '{value}'"),
            Condition::Boolean { left, op, right } => {
                let op = match op {
                    BoolOperator::And => "AND",
                    BoolOperator::Or => "OR",
                };
                write!(f, "({left} {op} {right})")
            }
        }
    }
}
