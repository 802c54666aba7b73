//! Load a schema from its line-oriented text form using PEST.
//!
//! ```text
//! # name         width  [fixed value]
//! prefix           16   fixed 0xfcff
//! version           5   fixed 2
//! process_type     16
//! ```
//!
//! Loading is fail-fast: the first bad record aborts the whole load.

use crate::schema::{FieldSpec, Schema, SchemaBuilder, SchemaError, MAX_FIELD_BITS};
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::path::Path;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

const FIXED_KEYWORD: &str = "fixed";

/// Load a schema from a sequence of line records. Line numbers in errors are 1-based
/// positions in `lines`; blank and comment-only lines are skipped.
pub fn load_schema<I, S>(lines: I) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = SchemaBuilder::new();
    for (i, line) in lines.into_iter().enumerate() {
        let line_no = i + 1;
        let text = line.as_ref().trim_end_matches(['\r', '\n']);
        let pairs = SchemaParser::parse(Rule::record, text).map_err(|e| SchemaError::Syntax {
            line: line_no,
            message: format!("Parse error: {}", e),
        })?;
        for pair in pairs.flatten().filter(|p| p.as_rule() == Rule::line) {
            push_record(&mut builder, line_no, pair)?;
        }
    }
    Ok(builder.build())
}

/// Load a schema from a whole document (records separated by newlines).
pub fn parse(source: &str) -> Result<Schema, SchemaError> {
    let pairs = SchemaParser::parse(Rule::schema, source).map_err(|e| {
        let line = match e.line_col {
            pest::error::LineColLocation::Pos((l, _)) => l,
            pest::error::LineColLocation::Span((l, _), _) => l,
        };
        SchemaError::Syntax {
            line,
            message: format!("Parse error: {}", e),
        }
    })?;
    let mut builder = SchemaBuilder::new();
    for pair in pairs.flatten().filter(|p| p.as_rule() == Rule::line) {
        let line_no = pair.as_span().start_pos().line_col().0;
        push_record(&mut builder, line_no, pair)?;
    }
    Ok(builder.build())
}

/// Read and load a schema file.
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<Schema, SchemaError> {
    let source = std::fs::read_to_string(path)?;
    parse(&source)
}

fn push_record(
    builder: &mut SchemaBuilder,
    line: usize,
    pair: pest::iterators::Pair<Rule>,
) -> Result<(), SchemaError> {
    let tokens: Vec<&str> = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::token)
        .map(|p| p.as_str())
        .collect();
    if tokens.is_empty() {
        return Ok(());
    }
    let field = build_field(builder, line, &tokens)?;
    log::debug!(
        "line {}: field {} width {} fixed {:?}",
        line,
        field.name,
        field.bit_width,
        field.fixed
    );
    builder.push(line, field)
}

/// Tokens are checked left to right; the width and running total are settled before
/// anything after the width is looked at.
fn build_field(builder: &SchemaBuilder, line: usize, tokens: &[&str]) -> Result<FieldSpec, SchemaError> {
    let name = tokens[0].to_string();
    let width_token = tokens.get(1).ok_or_else(|| SchemaError::MissingWidth {
        line,
        name: name.clone(),
    })?;
    let bit_width = parse_width(line, width_token)?;
    builder.check_width(line, &name, bit_width)?;

    let fixed = match tokens.get(2) {
        None => None,
        Some(&FIXED_KEYWORD) => {
            let value_token = tokens.get(3).ok_or_else(|| SchemaError::MissingFixedValue {
                line,
                name: name.clone(),
            })?;
            let value = parse_number(value_token).ok_or_else(|| SchemaError::InvalidFixedValue {
                line,
                token: value_token.to_string(),
            })?;
            Some(value)
        }
        Some(other) => {
            return Err(SchemaError::UnexpectedToken {
                line,
                token: other.to_string(),
            })
        }
    };
    if let Some(extra) = tokens.get(4) {
        return Err(SchemaError::UnexpectedToken {
            line,
            token: extra.to_string(),
        });
    }

    Ok(FieldSpec {
        name,
        bit_width,
        fixed,
    })
}

/// Decimal digits only; saturates so oversized widths report `WidthTooLarge`.
fn parse_width(line: usize, token: &str) -> Result<u32, SchemaError> {
    let mut width: u64 = 0;
    for c in token.chars() {
        let digit = c.to_digit(10).ok_or_else(|| SchemaError::InvalidWidth {
            line,
            token: token.to_string(),
        })?;
        width = width.saturating_mul(10).saturating_add(digit as u64);
    }
    if width > MAX_FIELD_BITS as u64 {
        return Err(SchemaError::WidthTooLarge { line, width });
    }
    Ok(width as u32)
}

/// Parse a decimal number, or hexadecimal when it starts with `0x`/`0X`.
///
/// The base switches when the second character turns out to be the `x`, so `0x1f` is read
/// as `0`, then base 16, then `1f`. Returns `None` on a digit outside the base, a bare
/// `0x`, or a value that does not fit in `u64`.
pub fn parse_number(token: &str) -> Option<u64> {
    let mut base = 10u32;
    let mut value: u64 = 0;
    let mut digits = 0usize;
    let leading_zero = token.starts_with('0');
    for (i, c) in token.chars().enumerate() {
        if let Some(d) = c.to_digit(base) {
            value = value.checked_mul(base as u64)?.checked_add(d as u64)?;
            digits += 1;
        } else if i == 1 && leading_zero && (c == 'x' || c == 'X') {
            base = 16;
            digits = 0;
        } else {
            return None;
        }
    }
    if digits == 0 {
        return None;
    }
    Some(value)
}
