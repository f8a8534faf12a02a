//! Lexer: tokenizes a normalized, bound expression.
//!
//! Identifiers follow Unicode letter rules, so an unresolved field name
//! such as `应收账款` lexes as an ordinary identifier. Positions are
//! character offsets into the input.

use crate::error::{ExprError, ExprResult};
use crate::scan;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the first character of the token.
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals and names
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    For,
    True,
    False,
    None,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
    NotEq,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Str(s) => write!(f, "string {s:?}"),
            Self::Ident(name) => write!(f, "name '{name}'"),
            Self::And => f.write_str("'and'"),
            Self::Or => f.write_str("'or'"),
            Self::Not => f.write_str("'not'"),
            Self::In => f.write_str("'in'"),
            Self::Is => f.write_str("'is'"),
            Self::If => f.write_str("'if'"),
            Self::Else => f.write_str("'else'"),
            Self::For => f.write_str("'for'"),
            Self::True => f.write_str("'True'"),
            Self::False => f.write_str("'False'"),
            Self::None => f.write_str("'None'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::LBracket => f.write_str("'['"),
            Self::RBracket => f.write_str("']'"),
            Self::Comma => f.write_str("','"),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Star => f.write_str("'*'"),
            Self::StarStar => f.write_str("'**'"),
            Self::Slash => f.write_str("'/'"),
            Self::SlashSlash => f.write_str("'//'"),
            Self::Percent => f.write_str("'%'"),
            Self::Gt => f.write_str("'>'"),
            Self::Lt => f.write_str("'<'"),
            Self::Ge => f.write_str("'>='"),
            Self::Le => f.write_str("'<='"),
            Self::EqEq => f.write_str("'=='"),
            Self::NotEq => f.write_str("'!='"),
            Self::Eof => f.write_str("end of expression"),
        }
    }
}

/// Words with a fixed meaning in the grammar. They are never field names.
pub const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "for", "True", "False", "None",
];

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> ExprResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.pos = scan::skip_ws(&self.input, self.pos);
            if self.pos >= self.input.len() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    offset: self.pos,
                });
                return Ok(tokens);
            }
            tokens.push(self.next_token()?);
        }
    }

    fn next_token(&mut self) -> ExprResult<Token> {
        let offset = self.pos;
        let ch = self.input[self.pos];
        let next = self.input.get(self.pos + 1).copied();

        let (kind, width) = match ch {
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '[' => (TokenKind::LBracket, 1),
            ']' => (TokenKind::RBracket, 1),
            ',' => (TokenKind::Comma, 1),
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '%' => (TokenKind::Percent, 1),
            '*' if next == Some('*') => (TokenKind::StarStar, 2),
            '*' => (TokenKind::Star, 1),
            '/' if next == Some('/') => (TokenKind::SlashSlash, 2),
            '/' => (TokenKind::Slash, 1),
            '>' if next == Some('=') => (TokenKind::Ge, 2),
            '>' => (TokenKind::Gt, 1),
            '<' if next == Some('=') => (TokenKind::Le, 2),
            '<' => (TokenKind::Lt, 1),
            '=' if next == Some('=') => (TokenKind::EqEq, 2),
            '!' if next == Some('=') => (TokenKind::NotEq, 2),
            '"' | '\'' => return self.read_string(),
            _ if scan::starts_number(&self.input, self.pos) => return self.read_number(),
            c if scan::is_word_start(c) => return Ok(self.read_word()),
            '=' => return Err(ExprError::syntax(offset, "assignment is not an expression")),
            c => return Err(ExprError::syntax(offset, format!("unexpected character '{c}'"))),
        };
        self.pos += width;
        Ok(Token { kind, offset })
    }

    fn read_string(&mut self) -> ExprResult<Token> {
        let offset = self.pos;
        let quote = self.input[self.pos];
        self.pos += 1;

        let mut text = String::new();
        while self.pos < self.input.len() {
            let c = self.input[self.pos];
            if c == quote {
                self.pos += 1;
                return Ok(Token {
                    kind: TokenKind::Str(text),
                    offset,
                });
            }
            if c == '\\' {
                let escaped = self.input.get(self.pos + 1).copied().ok_or_else(|| {
                    ExprError::syntax(self.pos, "dangling escape at end of string")
                })?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                self.pos += 2;
            } else {
                text.push(c);
                self.pos += 1;
            }
        }
        Err(ExprError::syntax(offset, "unterminated string literal"))
    }

    fn read_number(&mut self) -> ExprResult<Token> {
        let offset = self.pos;
        let end = scan::number_end(&self.input, self.pos);
        let raw: String = self.input[self.pos..end].iter().filter(|c| **c != '_').collect();
        self.pos = end;

        if self.input.get(end).is_some_and(|c| scan::is_word_char(*c)) {
            return Err(ExprError::syntax(end, "invalid character after number"));
        }
        let value = raw
            .parse::<f64>()
            .map_err(|_| ExprError::syntax(offset, format!("invalid number literal '{raw}'")))?;
        Ok(Token {
            kind: TokenKind::Number(value),
            offset,
        })
    }

    fn read_word(&mut self) -> Token {
        let offset = self.pos;
        let end = scan::word_end(&self.input, self.pos);
        let word: String = self.input[self.pos..end].iter().collect();
        self.pos = end;

        let kind = match word.as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "is" => TokenKind::Is,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => TokenKind::Ident(word),
        };
        Token { kind, offset }
    }
}
