//! Character-level scanning of a single layout line.

use std::iter::Peekable;
use std::str::{Chars, FromStr};

use rust_decimal::Decimal;

use super::token::Token;

/// Tokenize one line. `#` outside a string literal ends the line.
///
/// Errors are returned as bare messages; the parser attaches the line.
pub fn tokenize_line(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\u{feff}' => {
                chars.next();
            }
            '#' => break,
            '?' => {
                chars.next();
                tokens.push(Token::Question);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(scan_string(&mut chars)?));
            }
            '0'..='9' | '+' | '-' => tokens.push(scan_number(&mut chars)?),
            _ if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '-' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("unexpected character was found. character=[{other}].")),
        }
    }

    Ok(tokens)
}

fn scan_string(chars: &mut Peekable<Chars<'_>>) -> Result<String, String> {
    let mut s = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(s),
            Some('\\') => match chars.next() {
                Some('\\') => s.push('\\'),
                Some('"') => s.push('"'),
                Some('r') => s.push('\r'),
                Some('n') => s.push('\n'),
                Some('t') => s.push('\t'),
                Some(other) => {
                    return Err(format!("invalid escape sequence was found. sequence=[\\{other}]."))
                }
                None => break,
            },
            Some(c) => s.push(c),
            None => break,
        }
    }
    Err(format!("unterminated string literal. literal=[\"{s}]."))
}

fn scan_number(chars: &mut Peekable<Chars<'_>>) -> Result<Token, String> {
    let mut text = String::new();
    if let Some(&sign) = chars.peek().filter(|c| matches!(**c, '+' | '-')) {
        text.push(sign);
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '.' {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }

    let invalid = || format!("invalid number literal. literal=[{text}].");
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };

    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        let n = i64::from_str_radix(hex, 16).map_err(|_| invalid())?;
        return Ok(Token::Integer(if negative { -n } else { n }));
    }
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(invalid());
    }
    if body.contains('.') {
        let d = Decimal::from_str(body).map_err(|_| invalid())?;
        return Ok(Token::Decimal(if negative { -d } else { d }));
    }
    text.parse::<i64>().map(Token::Integer).map_err(|_| invalid())
}
