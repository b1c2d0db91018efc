use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::data_type::{FLOAT_SHAPE, INTEGER_SHAPE};

lazy_static! {
    static ref IDENTIFIER_SHAPE: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
    static ref OPERATOR: Regex = Regex::new(r"(==|>=|<=|>|<|!=|=)").unwrap();
}

/// Characters that always stand alone as a token outside string literals.
const PUNCTUATION: [char; 4] = ['(', ')', ',', ';'];

/// Characters that delimit fields and records in a row file.
const ROW_FILE_SEPARATORS: [char; 3] = ['\t', '\r', '\n'];

/// The lexical class of a [Token].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // --- Command Keywords ---
    Use,
    Create,
    Drop,
    Alter,
    Insert,
    Select,
    Update,
    Delete,
    Join,

    // --- Language Keywords ---
    Database,
    Table,
    Into,
    Values,
    From,
    Where,
    Set,
    And,
    Or,
    Add,
    On,

    // --- Literals ---
    /// Optional sign followed by digits (e.g., `-42`).
    IntegerLiteral,
    /// Optional sign, digits, a dot and digits (e.g., `3.14`).
    FloatLiteral,
    /// `TRUE` or `FALSE`, any case.
    BooleanLiteral,
    /// `NULL`, any case.
    NullLiteral,
    /// Text between single quotes, quotes included (e.g., `'Bob Dylan'`).
    StringLiteral,
    /// A table, database or attribute name: `[A-Za-z0-9]+`.
    Identifier,

    // --- Operators ---
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `LIKE`, any case.
    Like,
    /// `=` as used in `SET name = value`.
    Assign,

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Wildcard `*`
    Star,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
    /// Text matching no recognized shape. Rejected by the parser.
    Invalid,
}

impl TokenKind {
    /// Classifies a single raw token.
    ///
    /// Keywords are matched case-insensitively first, then literal shapes
    /// in order: integer, float, quoted string, identifier.
    pub fn classify(text: &str) -> Self {
        match text.to_uppercase().as_str() {
            "USE" => TokenKind::Use,
            "CREATE" => TokenKind::Create,
            "DROP" => TokenKind::Drop,
            "ALTER" => TokenKind::Alter,
            "INSERT" => TokenKind::Insert,
            "SELECT" => TokenKind::Select,
            "UPDATE" => TokenKind::Update,
            "DELETE" => TokenKind::Delete,
            "JOIN" => TokenKind::Join,
            "DATABASE" => TokenKind::Database,
            "TABLE" => TokenKind::Table,
            "INTO" => TokenKind::Into,
            "VALUES" => TokenKind::Values,
            "FROM" => TokenKind::From,
            "WHERE" => TokenKind::Where,
            "SET" => TokenKind::Set,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "ADD" => TokenKind::Add,
            "ON" => TokenKind::On,
            "TRUE" | "FALSE" => TokenKind::BooleanLiteral,
            "NULL" => TokenKind::NullLiteral,
            "LIKE" => TokenKind::Like,
            "==" => TokenKind::Equals,
            "!=" => TokenKind::NotEquals,
            "<" => TokenKind::LessThan,
            "<=" => TokenKind::LessThanOrEqual,
            ">" => TokenKind::GreaterThan,
            ">=" => TokenKind::GreaterThanOrEqual,
            "=" => TokenKind::Assign,
            "(" => TokenKind::LeftParen,
            ")" => TokenKind::RightParen,
            "," => TokenKind::Comma,
            ";" => TokenKind::Semicolon,
            "*" => TokenKind::Star,
            _ if INTEGER_SHAPE.is_match(text) => TokenKind::IntegerLiteral,
            _ if FLOAT_SHAPE.is_match(text) => TokenKind::FloatLiteral,
            _ if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') => {
                TokenKind::StringLiteral
            }
            _ if IDENTIFIER_SHAPE.is_match(text) => TokenKind::Identifier,
            _ => TokenKind::Invalid,
        }
    }

    /// True for the kinds accepted wherever a literal value is expected.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerLiteral
                | TokenKind::FloatLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::NullLiteral
                | TokenKind::StringLiteral
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Use => "USE",
            TokenKind::Create => "CREATE",
            TokenKind::Drop => "DROP",
            TokenKind::Alter => "ALTER",
            TokenKind::Insert => "INSERT",
            TokenKind::Select => "SELECT",
            TokenKind::Update => "UPDATE",
            TokenKind::Delete => "DELETE",
            TokenKind::Join => "JOIN",
            TokenKind::Database => "DATABASE",
            TokenKind::Table => "TABLE",
            TokenKind::Into => "INTO",
            TokenKind::Values => "VALUES",
            TokenKind::From => "FROM",
            TokenKind::Where => "WHERE",
            TokenKind::Set => "SET",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Add => "ADD",
            TokenKind::On => "ON",
            TokenKind::IntegerLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::BooleanLiteral => "boolean literal",
            TokenKind::NullLiteral => "NULL",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Equals => "'=='",
            TokenKind::NotEquals => "'!='",
            TokenKind::LessThan => "'<'",
            TokenKind::LessThanOrEqual => "'<='",
            TokenKind::GreaterThan => "'>'",
            TokenKind::GreaterThanOrEqual => "'>='",
            TokenKind::Like => "LIKE",
            TokenKind::Assign => "'='",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Star => "'*'",
            TokenKind::Eof => "end of input",
            TokenKind::Invalid => "invalid token",
        };
        f.write_str(name)
    }
}

/// A classified piece of command text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw text, quotes included for string literals. Empty for [TokenKind::Eof].
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: TokenKind::classify(&text),
            text,
        }
    }

    pub fn eof() -> Self {
        Self {
            kind: TokenKind::Eof,
            text: String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::IntegerLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::Identifier
            | TokenKind::Invalid => write!(f, "{} {}", self.kind, self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// A lexical scanner (lexer) that converts a raw command string into a sequence of [Token]s.
pub struct Tokenizer {
    input: String,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.trim().to_string(),
        }
    }

    /// Processes the entire input and returns a vector of tokens, always
    /// terminated by [TokenKind::Eof].
    ///
    /// The input is first cut at single quotes: every odd fragment is the
    /// body of a string literal and becomes one token with its quotes
    /// restored. Other fragments are split around punctuation and
    /// comparison operators, then on whitespace. Unrecognized text is
    /// classified as [TokenKind::Invalid], never rejected here. So is a
    /// string literal holding a tab or line break, which row files cannot
    /// store.
    ///
    /// # Example
    /// ```
    /// # use tabdb::tokenizer::{Tokenizer, TokenKind};
    /// let tokens = Tokenizer::new("SELECT * FROM t;").tokenize();
    /// assert_eq!(tokens[0].kind, TokenKind::Select);
    /// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    /// ```
    pub fn tokenize(&self) -> Vec<Token> {
        let fragments: Vec<&str> = self.input.split('\'').collect();
        // An even fragment count means an odd number of quotes.
        let unterminated = fragments.len() % 2 == 0;
        let mut tokens = Vec::new();

        for (i, fragment) in fragments.iter().enumerate() {
            if i % 2 == 0 {
                tokens.extend(Self::split_fragment(fragment).into_iter().map(Token::new));
            } else if unterminated && i == fragments.len() - 1 {
                tokens.push(Token {
                    kind: TokenKind::Invalid,
                    text: format!("'{fragment}"),
                });
            } else if fragment.contains(ROW_FILE_SEPARATORS) {
                tokens.push(Token {
                    kind: TokenKind::Invalid,
                    text: format!("'{fragment}'"),
                });
            } else {
                tokens.push(Token::new(format!("'{fragment}'")));
            }
        }

        tokens.push(Token::eof());
        tokens
    }

    /// Splits text found outside string literals into raw token texts.
    fn split_fragment(fragment: &str) -> Vec<String> {
        let mut spaced = String::with_capacity(fragment.len() * 2);
        for ch in fragment.chars() {
            if PUNCTUATION.contains(&ch) {
                spaced.push(' ');
                spaced.push(ch);
                spaced.push(' ');
            } else {
                spaced.push(ch);
            }
        }
        let spaced = OPERATOR.replace_all(&spaced, " $1 ");

        spaced.split_whitespace().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(input: &str) -> Vec<String> {
        Tokenizer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(
            kinds("CREATE TABLE users;"),
            vec![
                TokenKind::Create,
                TokenKind::Table,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("select * from t where a like 'x'"),
            vec![
                TokenKind::Select,
                TokenKind::Star,
                TokenKind::From,
                TokenKind::Identifier,
                TokenKind::Where,
                TokenKind::Identifier,
                TokenKind::Like,
                TokenKind::StringLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_with_parens() {
        assert_eq!(texts("(id,name)"), vec!["(", "id", ",", "name", ")", ""]);
    }

    #[test]
    fn test_operators_need_no_spaces() {
        assert_eq!(
            texts("age>=30 AND name!='x'"),
            vec!["age", ">=", "30", "AND", "name", "!=", "'x'", ""]
        );
        assert_eq!(
            kinds("a==1 b<2 c<=3 d>4 e=5"),
            vec![
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::IntegerLiteral,
                TokenKind::Identifier,
                TokenKind::LessThan,
                TokenKind::IntegerLiteral,
                TokenKind::Identifier,
                TokenKind::LessThanOrEqual,
                TokenKind::IntegerLiteral,
                TokenKind::Identifier,
                TokenKind::GreaterThan,
                TokenKind::IntegerLiteral,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::IntegerLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("42, -7, +3, 1.14"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::Comma,
                TokenKind::IntegerLiteral,
                TokenKind::Comma,
                TokenKind::IntegerLiteral,
                TokenKind::Comma,
                TokenKind::FloatLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_strings_keep_quotes_and_content() {
        let tokens = Tokenizer::new("VALUES ('Bob Dylan', 'a,b;(c)', '')").tokenize();
        let strings: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::StringLiteral)
            .map(|t| t.text.as_str())
            .collect();

        assert_eq!(strings, vec!["'Bob Dylan'", "'a,b;(c)'", "''"]);
    }

    #[test]
    fn test_literal_keywords() {
        assert_eq!(
            kinds("TRUE false NuLl"),
            vec![
                TokenKind::BooleanLiteral,
                TokenKind::BooleanLiteral,
                TokenKind::NullLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_tokens() {
        assert_eq!(TokenKind::classify("user_name"), TokenKind::Invalid);
        assert_eq!(TokenKind::classify("3.14.15"), TokenKind::Invalid);
        assert_eq!(TokenKind::classify("a.b"), TokenKind::Invalid);
        assert_eq!(TokenKind::classify("!"), TokenKind::Invalid);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = Tokenizer::new("INSERT INTO t VALUES ('hello);").tokenize();
        let last = &tokens[tokens.len() - 2];

        assert_eq!(last.kind, TokenKind::Invalid);
        assert_eq!(last.text, "'hello);");
    }

    #[test]
    fn test_string_with_separator_is_invalid() {
        for input in ["('a\tb', 1);", "('c\nd', 1);", "('e\r\nf', 1);"] {
            let tokens = Tokenizer::new(input).tokenize();
            assert_eq!(tokens[1].kind, TokenKind::Invalid, "{input:?}");
        }

        let tokens = Tokenizer::new("('a b, c;', 1);").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);
    }
}
