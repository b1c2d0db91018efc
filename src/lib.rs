pub mod ast;
pub mod attributes;
pub mod catalog;
pub mod data_type;
pub mod database;
pub mod error;
pub mod filter;
pub mod interpreter;
pub mod metadata;
pub mod parser;
pub mod response;
pub mod table;
pub mod tokenizer;

pub use ast::{Condition, Statement};
pub use attributes::AttributeSet;
pub use catalog::Catalog;
pub use data_type::DataType;
pub use database::Database;
pub use error::{DbError, Result};
pub use interpreter::Interpreter;
pub use parser::{Parser, parse_statement};
pub use response::{QueryResult, Response};
pub use table::Table;
pub use tokenizer::{Token, TokenKind, Tokenizer};
