//! Token types for layout definition files.

use rust_decimal::Decimal;

/// One lexical token of a layout line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier (directive name, field name, type name).
    Ident(String),
    /// String literal with escapes resolved.
    Str(String),
    /// Integer literal (decimal or `0x` hexadecimal).
    Integer(i64),
    /// Non-integer numeric literal.
    Decimal(Decimal),

    /// `?` filler marker.
    Question,
    /// `:` directive separator.
    Colon,
    /// `[` record type open.
    LBracket,
    /// `]` record type close.
    RBracket,
    /// `(` parameter list open.
    LParen,
    /// `)` parameter list close.
    RParen,
    /// `,` parameter separator.
    Comma,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Str(s) => format!("\"{s}\""),
            Token::Integer(n) => n.to_string(),
            Token::Decimal(d) => d.to_string(),
            Token::Question => "?".to_string(),
            Token::Colon => ":".to_string(),
            Token::LBracket => "[".to_string(),
            Token::RBracket => "]".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}
