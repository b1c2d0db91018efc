use tracing::trace;

use crate::ast::*;
use crate::error::{DbError, Result};
use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// Tokenizes and parses one command.
pub fn parse_statement(input: &str) -> Result<Statement> {
    let tokens = Tokenizer::new(input).tokenize();
    Parser::new(tokens).parse()
}

/// A recursive-descent parser over a token sequence, one token of lookahead.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Open parentheses in the condition being parsed. Must be back to zero
    /// once a whole condition has been read.
    paren_depth: i32,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::eof());
        }
        Self {
            tokens,
            position: 0,
            paren_depth: 0,
        }
    }

    /// Parses exactly one command terminated by `;` and followed by nothing.
    pub fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current_token().kind {
            TokenKind::Use => self.parse_use(),
            TokenKind::Create => self.parse_create(),
            TokenKind::Drop => self.parse_drop(),
            TokenKind::Alter => self.parse_alter(),
            TokenKind::Insert => self.parse_insert(),
            TokenKind::Select => self.parse_select(),
            TokenKind::Update => self.parse_update(),
            TokenKind::Delete => self.parse_delete(),
            TokenKind::Join => self.parse_join(),
            _ => Err(DbError::invalid_query(format!(
                "Expected a command keyword, found {}",
                self.current_token()
            ))),
        }?;

        self.consume(TokenKind::Semicolon)?;

        // Check we are at the end of the statement
        if !self.is_at_end() {
            return Err(DbError::invalid_query(format!(
                "Unexpected {} after ';'",
                self.current_token()
            )));
        }

        trace!(?statement, "parsed");
        Ok(statement)
    }

    //helpers
    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn expected(&self, what: impl std::fmt::Display) -> DbError {
        DbError::invalid_query(format!("Expected {what}, found {}", self.current_token()))
    }

    fn consume(&mut self, expected: TokenKind) -> Result<()> {
        if self.peek_kind() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    /// Consumes whichever of `choices` comes next and returns its kind.
    fn consume_one_of(&mut self, choices: &[TokenKind]) -> Result<TokenKind> {
        let kind = self.peek_kind();
        if choices.contains(&kind) {
            self.advance();
            return Ok(kind);
        }
        let names: Vec<String> = choices.iter().map(ToString::to_string).collect();
        Err(self.expected(names.join(" or ")))
    }

    fn consume_ident(&mut self) -> Result<String> {
        match self.current_token() {
            Token {
                kind: TokenKind::Identifier,
                text,
            } => {
                let text = text.clone();
                self.advance();
                Ok(text)
            }
            _ => Err(self.expected(TokenKind::Identifier)),
        }
    }

    /// A table or database name, lower-cased.
    fn consume_name(&mut self) -> Result<String> {
        Ok(self.consume_ident()?.to_lowercase())
    }

    /// A literal value. String literals lose their quotes and surrounding
    /// whitespace; other literals are kept as written.
    fn consume_value(&mut self) -> Result<String> {
        let token = self.current_token();
        if !token.kind.is_value() {
            return Err(self.expected("a literal value"));
        }
        let value = match token.kind {
            TokenKind::StringLiteral => token.text[1..token.text.len() - 1].trim().to_string(),
            _ => token.text.clone(),
        };
        self.advance();
        Ok(value)
    }

    /// Reads `element (',' element)*` up to, but not including, `terminator`.
    ///
    /// An empty list, a missing comma and a comma directly before the
    /// terminator are all list errors.
    fn parse_list<T>(
        &mut self,
        terminator: TokenKind,
        mut element: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        if self.peek_kind() == terminator {
            return Err(DbError::invalid_list(format!(
                "Expected at least one element before {terminator}"
            )));
        }

        let mut items = vec![];
        loop {
            if self.is_at_end() {
                return Err(DbError::invalid_list(format!(
                    "Reached end of input before {terminator}"
                )));
            }
            items.push(element(self).map_err(into_list_error)?);
            match self.peek_kind() {
                kind if kind == terminator => return Ok(items),
                TokenKind::Comma => {
                    self.advance();
                    if self.peek_kind() == terminator {
                        return Err(DbError::invalid_list(format!(
                            "Trailing ',' before {terminator}"
                        )));
                    }
                }
                _ => {
                    return Err(DbError::invalid_list(format!(
                        "Expected ',' or {terminator}, found {}",
                        self.current_token()
                    )));
                }
            }
        }
    }

    fn parse_use(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Use)?;
        let database = self.consume_name()?;
        Ok(Statement::Use(Use { database }))
    }

    fn parse_create(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Create)?;
        match self.consume_one_of(&[TokenKind::Database, TokenKind::Table])? {
            TokenKind::Database => {
                let database = self.consume_name()?;
                Ok(Statement::CreateDatabase(CreateDatabase { database }))
            }
            _ => self.parse_create_table(),
        }
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        let display_name = self.consume_ident()?;
        let table = display_name.to_lowercase();

        // `CREATE TABLE name;` has no attribute list
        if self.peek_kind() == TokenKind::Semicolon {
            return Ok(Statement::CreateTable(CreateTable {
                table,
                display_name,
                attributes: AttributeList::default(),
            }));
        }

        self.consume(TokenKind::LeftParen)?;
        let names = self.parse_list(TokenKind::RightParen, Self::consume_ident)?;
        self.consume(TokenKind::RightParen)?;

        Ok(Statement::CreateTable(CreateTable {
            table,
            display_name,
            attributes: AttributeList(names),
        }))
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Drop)?;
        let kind = self.consume_one_of(&[TokenKind::Database, TokenKind::Table])?;
        let name = self.consume_name()?;
        Ok(match kind {
            TokenKind::Database => Statement::DropDatabase(DropDatabase { database: name }),
            _ => Statement::DropTable(DropTable { table: name }),
        })
    }

    fn parse_alter(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Alter)?;
        self.consume(TokenKind::Table)?;
        let table = self.consume_name()?;
        let kind = self.consume_one_of(&[TokenKind::Add, TokenKind::Drop])?;
        let attribute = self.consume_ident()?;

        let alter = AlterAttribute { table, attribute };
        Ok(match kind {
            TokenKind::Add => Statement::AddAttribute(alter),
            _ => Statement::DropAttribute(alter),
        })
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Insert)?;
        self.consume(TokenKind::Into)?;
        let table = self.consume_name()?;
        self.consume(TokenKind::Values)?;
        self.consume(TokenKind::LeftParen)?;
        let values = self.parse_list(TokenKind::RightParen, Self::consume_value)?;
        self.consume(TokenKind::RightParen)?;

        Ok(Statement::Insert(Insert {
            table,
            values: ValueList(values),
        }))
    }

    fn parse_select(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Select)?;

        let attributes = if self.peek_kind() == TokenKind::Star {
            self.advance();
            WildAttributeList::All
        } else {
            let names = self.parse_list(TokenKind::From, Self::consume_ident)?;
            WildAttributeList::Named(AttributeList(names))
        };

        self.consume(TokenKind::From)?;
        let table = self.consume_name()?;

        let condition = match self.peek_kind() {
            TokenKind::Where => {
                self.advance();
                Some(self.parse_where_condition()?)
            }
            _ => None,
        };

        Ok(Statement::Select(Select {
            attributes,
            table,
            condition,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Delete)?;
        self.consume(TokenKind::From)?;
        let table = self.consume_name()?;
        self.consume(TokenKind::Where)?;
        let condition = self.parse_where_condition()?;

        Ok(Statement::Delete(Delete { table, condition }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Update)?;
        let table = self.consume_name()?;
        self.consume(TokenKind::Set)?;
        let assignments = self.parse_list(TokenKind::Where, Self::parse_assignment)?;
        self.consume(TokenKind::Where)?;
        let condition = self.parse_where_condition()?;

        Ok(Statement::Update(Update {
            table,
            assignments: NameValueList(assignments),
            condition,
        }))
    }

    fn parse_assignment(&mut self) -> Result<(String, String)> {
        let name = self.consume_ident()?;
        self.consume(TokenKind::Assign)?;
        let value = self.consume_value()?;
        Ok((name, value))
    }

    fn parse_join(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Join)?;
        let left_table = self.consume_name()?;
        self.consume(TokenKind::And)?;
        let right_table = self.consume_name()?;
        self.consume(TokenKind::On)?;
        let left_attribute = self.consume_ident()?;
        self.consume(TokenKind::And)?;
        let right_attribute = self.consume_ident()?;

        Ok(Statement::Join(Join {
            left_table,
            right_table,
            left_attribute,
            right_attribute,
        }))
    }

    /// A full condition after `WHERE`; parentheses must balance.
    fn parse_where_condition(&mut self) -> Result<Condition> {
        self.paren_depth = 0;
        let condition = self.parse_condition()?;
        if self.paren_depth != 0 {
            return Err(DbError::invalid_query("Unbalanced parentheses in condition"));
        }
        Ok(condition)
    }

    /// Reads units joined by `AND`/`OR` and folds them left to right, with
    /// no precedence between the two operators. A unit is either a
    /// comparison or a parenthesized condition. A `)` ending the sequence
    /// is consumed here and closes one level of nesting.
    fn parse_condition(&mut self) -> Result<Condition> {
        let mut condition = self.parse_condition_unit()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::And => BoolOperator::And,
                TokenKind::Or => BoolOperator::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_condition_unit()?;
            condition = Condition::boolean(condition, op, right);
        }

        if self.peek_kind() == TokenKind::RightParen {
            self.advance();
            self.paren_depth -= 1;
        }
        Ok(condition)
    }

    fn parse_condition_unit(&mut self) -> Result<Condition> {
        if self.peek_kind() == TokenKind::LeftParen {
            self.advance();
            self.paren_depth += 1;
            return self.parse_condition();
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Condition> {
        let attribute = self.consume_ident()?;
        let comparator = match self.peek_kind() {
            TokenKind::Equals => Comparator::Equal,
            TokenKind::NotEquals => Comparator::NotEqual,
            TokenKind::LessThan => Comparator::LessThan,
            TokenKind::LessThanOrEqual => Comparator::LessThanOrEqual,
            TokenKind::GreaterThan => Comparator::GreaterThan,
            TokenKind::GreaterThanOrEqual => Comparator::GreaterThanOrEqual,
            TokenKind::Like => Comparator::Like,
            _ => return Err(self.expected("a comparator")),
        };
        self.advance();
        let value = self.consume_value()?;
        Ok(Condition::comparison(attribute, comparator, value))
    }
}

/// Errors inside a list element are reported as list errors.
fn into_list_error(err: DbError) -> DbError {
    match err {
        DbError::InvalidQuery { reason } => DbError::InvalidList { reason },
        other => other,
    }
}
