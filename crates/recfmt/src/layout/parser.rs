//! Layout file parser.

use std::path::Path;

use tracing::debug;

use super::scanner::tokenize_line;
use super::token::Token;
use super::{Directive, FieldSpec, LayoutDefinition, FIXED_FILE_TYPE};
use crate::convertor::{
    Param, NEGATIVE_SIGN_DIRECTIVE, PACK_NIBBLE_DIRECTIVE, POSITIVE_SIGN_DIRECTIVE,
};
use crate::error::SyntaxError;

const FILE_TYPE: &str = "file-type";
const TEXT_ENCODING: &str = "text-encoding";
const RECORD_LENGTH: &str = "record-length";
const RECORD_SEPARATOR: &str = "record-separator";

const KNOWN_DIRECTIVES: &[&str] = &[
    FILE_TYPE,
    TEXT_ENCODING,
    RECORD_LENGTH,
    RECORD_SEPARATOR,
    POSITIVE_SIGN_DIRECTIVE,
    NEGATIVE_SIGN_DIRECTIVE,
    PACK_NIBBLE_DIRECTIVE,
];

/// Read and parse a layout file. Errors carry the file path.
pub fn parse_layout_file(path: &Path) -> Result<LayoutDefinition, SyntaxError> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        SyntaxError::new(format!("layout file could not be read. {e}.")).with_file_path(path)
    })?;
    let mut layout = parse_layout(&source).map_err(|e| e.with_file_path(path))?;
    layout.file_path = Some(path.to_path_buf());
    debug!(
        path = %path.display(),
        record_type = %layout.record_type,
        fields = layout.fields.len(),
        "parsed layout file"
    );
    Ok(layout)
}

/// Parse layout source text.
pub fn parse_layout(source: &str) -> Result<LayoutDefinition, SyntaxError> {
    let mut directives: Vec<Directive> = Vec::new();
    let mut record_type: Option<String> = None;
    let mut fields: Vec<FieldSpec> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        let tokens = tokenize_line(line).map_err(|m| SyntaxError::new(m).with_line(line_no))?;
        if tokens.is_empty() {
            continue;
        }
        let mut cursor = Cursor::new(&tokens, line_no);

        match tokens[0] {
            Token::LBracket => {
                let name = parse_record_type(&mut cursor)?;
                if let Some(existing) = &record_type {
                    return Err(SyntaxError::new(format!(
                        "only one record type can be defined. record type=[{existing}], [{name}]."
                    ))
                    .with_line(line_no));
                }
                record_type = Some(name);
            }
            Token::Ident(_) if record_type.is_none() => {
                let directive = parse_directive(&mut cursor)?;
                if directives.iter().any(|d| d.name == directive.name) {
                    return Err(SyntaxError::new(format!(
                        "directive was specified more than once. directive=[{}].",
                        directive.name
                    ))
                    .with_line(line_no));
                }
                directives.push(directive);
            }
            _ if record_type.is_some() => fields.push(parse_field(&mut cursor)?),
            _ => {
                return Err(SyntaxError::new(format!(
                    "unexpected token was found before the record type definition. token=[{}].",
                    tokens[0].describe()
                ))
                .with_line(line_no))
            }
        }
    }

    build_definition(directives, record_type, fields)
}

fn build_definition(
    directives: Vec<Directive>,
    record_type: Option<String>,
    fields: Vec<FieldSpec>,
) -> Result<LayoutDefinition, SyntaxError> {
    let file_type = find_directive(&directives, FILE_TYPE)
        .ok_or_else(|| SyntaxError::new(format!("directive '{FILE_TYPE}' was not specified.")))?;
    match &file_type.value {
        Param::Text(t) if t == FIXED_FILE_TYPE => {}
        other => {
            return Err(SyntaxError::new(format!(
                "unsupported file type was specified. file type=[{other}]. supported file type=[{FIXED_FILE_TYPE}]."
            ))
            .with_line(file_type.line))
        }
    }

    let text_encoding = find_directive(&directives, TEXT_ENCODING)
        .map(text_value)
        .transpose()?;
    let record_separator = find_directive(&directives, RECORD_SEPARATOR)
        .map(text_value)
        .transpose()?;

    let length = find_directive(&directives, RECORD_LENGTH)
        .ok_or_else(|| SyntaxError::new(format!("directive '{RECORD_LENGTH}' was not specified.")))?;
    let record_length = match &length.value {
        Param::Integer(n) if *n > 0 => usize::try_from(*n).ok(),
        _ => None,
    }
    .ok_or_else(|| {
        SyntaxError::new(format!(
            "invalid directive value was specified. {RECORD_LENGTH} must be positive integer, but was [{}].",
            length.value
        ))
        .with_line(length.line)
    })?;

    let record_type = record_type
        .ok_or_else(|| SyntaxError::new("record type definition was not specified."))?;
    if fields.is_empty() {
        return Err(SyntaxError::new(format!(
            "record type has no field definition. record type=[{record_type}]."
        )));
    }

    Ok(LayoutDefinition {
        file_path: None,
        directives,
        text_encoding,
        record_length,
        record_separator,
        record_type,
        fields,
    })
}

fn find_directive<'a>(directives: &'a [Directive], name: &str) -> Option<&'a Directive> {
    directives.iter().find(|d| d.name == name)
}

fn text_value(directive: &Directive) -> Result<String, SyntaxError> {
    match &directive.value {
        Param::Text(s) => Ok(s.clone()),
        other => Err(SyntaxError::new(format!(
            "invalid directive value was specified. {} must be a string, but was [{other}].",
            directive.name
        ))
        .with_line(directive.line)),
    }
}

// ---------------------------------------------------------------------------
// Line parsers
// ---------------------------------------------------------------------------

/// Token cursor over one line.
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message).with_line(self.line)
    }

    fn expect(&mut self, expected: &Token) -> Result<(), SyntaxError> {
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(self.error(format!(
                "unexpected token was found. expected=[{}], actual=[{}].",
                expected.describe(),
                t.describe()
            ))),
            None => Err(self.error(format!(
                "unexpected end of line. expected=[{}].",
                expected.describe()
            ))),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, SyntaxError> {
        match self.next() {
            Some(Token::Ident(s)) => Ok(s.clone()),
            Some(t) => Err(self.error(format!("{what} was expected, but was [{}].", t.describe()))),
            None => Err(self.error(format!("{what} was expected, but the line ended."))),
        }
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(self.error(format!(
                "unexpected token was found. token=[{}].",
                t.describe()
            ))),
        }
    }
}

fn literal(token: &Token) -> Option<Param> {
    match token {
        Token::Str(s) => Some(Param::Text(s.clone())),
        Token::Integer(n) => Some(Param::Integer(*n)),
        Token::Decimal(d) => Some(Param::Decimal(*d)),
        _ => None,
    }
}

fn parse_record_type(cursor: &mut Cursor<'_>) -> Result<String, SyntaxError> {
    cursor.expect(&Token::LBracket)?;
    let name = cursor.ident("record type name")?;
    cursor.expect(&Token::RBracket)?;
    cursor.expect_end()?;
    Ok(name)
}

fn parse_directive(cursor: &mut Cursor<'_>) -> Result<Directive, SyntaxError> {
    let name = cursor.ident("directive name")?;
    if !KNOWN_DIRECTIVES.contains(&name.as_str()) {
        return Err(cursor.error(format!("unknown directive was specified. directive=[{name}].")));
    }
    cursor.expect(&Token::Colon)?;
    let value = cursor
        .next()
        .and_then(literal)
        .ok_or_else(|| cursor.error(format!("directive value was not specified. directive=[{name}].")))?;
    cursor.expect_end()?;
    Ok(Directive {
        name,
        value,
        line: cursor.line,
    })
}

/// `<offset> [?]<name> <type>(<params>) [literal] [pad(x)] [encoding("x")]`
fn parse_field(cursor: &mut Cursor<'_>) -> Result<FieldSpec, SyntaxError> {
    let position = match cursor.next() {
        Some(Token::Integer(n)) if *n > 0 => usize::try_from(*n).ok(),
        _ => None,
    }
    .ok_or_else(|| cursor.error("field definition must start with a positive position."))?;

    let filler = cursor.peek() == Some(&Token::Question);
    if filler {
        cursor.next();
    }
    let name = cursor.ident("field name")?;
    let type_name = cursor.ident("data type")?;
    let params = parse_args(cursor)?;

    let mut spec = FieldSpec {
        position,
        name,
        filler,
        type_name,
        params,
        default_value: None,
        padding: None,
        encoding: None,
        line: cursor.line,
    };

    while let Some(token) = cursor.next() {
        if let Some(value) = literal(token) {
            if spec.default_value.is_some() {
                return Err(cursor.error(format!(
                    "default value was specified more than once. field=[{}].",
                    spec.name
                )));
            }
            spec.default_value = Some(value);
            continue;
        }
        match token {
            Token::Ident(attr) if attr == "pad" => {
                let args = parse_args(cursor)?;
                spec.padding = Some(single_arg(cursor, attr, args)?);
            }
            Token::Ident(attr) if attr == "encoding" => {
                let args = parse_args(cursor)?;
                match single_arg(cursor, attr, args)? {
                    Param::Text(name) => spec.encoding = Some(name),
                    other => {
                        return Err(cursor.error(format!(
                            "invalid parameter was specified. encoding must be a string, but was [{other}]."
                        )))
                    }
                }
            }
            other => {
                return Err(cursor.error(format!(
                    "unexpected token was found. token=[{}]. field=[{}].",
                    other.describe(),
                    spec.name
                )))
            }
        }
    }

    Ok(spec)
}

/// `( literal, literal, ... )`, possibly empty.
fn parse_args(cursor: &mut Cursor<'_>) -> Result<Vec<Param>, SyntaxError> {
    cursor.expect(&Token::LParen)?;
    let mut args = Vec::new();
    if cursor.peek() == Some(&Token::RParen) {
        cursor.next();
        return Ok(args);
    }
    loop {
        let token = cursor
            .next()
            .ok_or_else(|| cursor.error("unexpected end of line in parameter list."))?;
        let value = literal(token).ok_or_else(|| {
            cursor.error(format!(
                "invalid parameter was found. parameter=[{}].",
                token.describe()
            ))
        })?;
        args.push(value);
        match cursor.next() {
            Some(Token::Comma) => continue,
            Some(Token::RParen) => return Ok(args),
            Some(t) => {
                return Err(cursor.error(format!(
                    "unexpected token was found in parameter list. token=[{}].",
                    t.describe()
                )))
            }
            None => return Err(cursor.error("unexpected end of line in parameter list.")),
        }
    }
}

fn single_arg(cursor: &Cursor<'_>, attr: &str, mut args: Vec<Param>) -> Result<Param, SyntaxError> {
    if args.len() != 1 {
        return Err(cursor.error(format!(
            "{attr} requires exactly one parameter, but was [{}].",
            args.len()
        )));
    }
    Ok(args.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = r#"
# file type
file-type:    "Fixed"
text-encoding: "sjis"
record-length: 20
record-separator: "\r\n"
positive-pack-sign-nibble: "4"

[Default]
1    name     X(10)   "abc"  pad(" ")   # name
11   amount   SP(5, 2)
16  ?filler   X(5) pad(0x00) encoding("IBM-1047")
"#;

    #[test]
    fn test_parse_full_layout() {
        let layout = parse_layout(LAYOUT).unwrap();
        assert_eq!(layout.text_encoding.as_deref(), Some("sjis"));
        assert_eq!(layout.record_length, 20);
        assert_eq!(layout.record_separator.as_deref(), Some("\r\n"));
        assert_eq!(layout.record_type, "Default");
        assert_eq!(layout.directive(POSITIVE_SIGN_DIRECTIVE), Some(&Param::from("4")));
        assert_eq!(layout.fields.len(), 3);

        let name = &layout.fields[0];
        assert_eq!(name.position, 1);
        assert_eq!(name.type_name, "X");
        assert_eq!(name.params, vec![Param::Integer(10)]);
        assert_eq!(name.default_value, Some(Param::from("abc")));
        assert_eq!(name.padding, Some(Param::from(" ")));
        assert_eq!(name.line, 10);

        let amount = &layout.fields[1];
        assert_eq!(amount.params, vec![Param::Integer(5), Param::Integer(2)]);

        let filler = &layout.fields[2];
        assert!(filler.filler);
        assert_eq!(filler.name, "filler");
        assert_eq!(filler.padding, Some(Param::Integer(0)));
        assert_eq!(filler.encoding.as_deref(), Some("IBM-1047"));
    }

    #[test]
    fn test_empty_and_string_params() {
        let src = "file-type: \"Fixed\"\nrecord-length: 1\n[R]\n1 a X()\n";
        assert!(parse_layout(src).unwrap().fields[0].params.is_empty());

        let src = "file-type: \"Fixed\"\nrecord-length: 1\n[R]\n1 a X(\"a\")\n";
        assert_eq!(parse_layout(src).unwrap().fields[0].params, vec![Param::from("a")]);
    }

    #[test]
    fn test_missing_directives() {
        let err = parse_layout("record-length: 1\n[R]\n1 a X(1)\n").unwrap_err();
        assert_eq!(err.message(), "directive 'file-type' was not specified.");

        let err = parse_layout("file-type: \"Fixed\"\n[R]\n1 a X(1)\n").unwrap_err();
        assert_eq!(err.message(), "directive 'record-length' was not specified.");
    }

    #[test]
    fn test_variable_file_type_rejected() {
        let err = parse_layout("file-type: \"Variable\"\nrecord-length: 1\n[R]\n1 a X(1)\n")
            .unwrap_err();
        assert!(err.message().starts_with("unsupported file type was specified."));
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_errors_carry_line() {
        let err = parse_layout("file-type: \"Fixed\"\nrecord-length: 1\n[R]\n1 a X(1\n").unwrap_err();
        assert_eq!(err.line(), Some(4));

        let err = parse_layout("file-type: \"Fixed\"\nunknown: 1\n").unwrap_err();
        assert_eq!(err.message(), "unknown directive was specified. directive=[unknown].");
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_single_record_type() {
        let src = "file-type: \"Fixed\"\nrecord-length: 1\n[A]\n1 a X(1)\n[B]\n1 b X(1)\n";
        let err = parse_layout(src).unwrap_err();
        assert!(err.message().starts_with("only one record type can be defined."));
        assert_eq!(err.line(), Some(5));
    }

    #[test]
    fn test_duplicate_directive() {
        let err = parse_layout("file-type: \"Fixed\"\nfile-type: \"Fixed\"\n").unwrap_err();
        assert!(err.message().starts_with("directive was specified more than once."));
    }

    #[test]
    fn test_parse_file_attaches_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("format.fmt");
        std::fs::write(&path, "file-type: \"Fixed\"\nrecord-length: x\n").unwrap();
        let err = parse_layout_file(&path).unwrap_err();
        assert!(err.file_path().unwrap().ends_with("format.fmt"));

        let missing = parse_layout_file(&dir.path().join("missing.fmt")).unwrap_err();
        assert!(missing.message().starts_with("layout file could not be read."));
    }
}
