//! Format schemas and decoded values for display (diagnostic listings, CLI output).

use crate::schema::{FieldSpec, Schema};
use crate::value::FieldValues;

/// Hex digits needed to show a `bit_width`-bit value.
fn hex_digits(bit_width: u32) -> usize {
    (bit_width as usize).div_ceil(4).max(1)
}

/// Zero-padded hex sized to the field, e.g. `0x0840` for a 16-bit field.
pub fn format_hex(v: u64, bit_width: u32) -> String {
    format!("0x{:0width$x}", v, width = hex_digits(bit_width))
}

fn fixed_column(f: &FieldSpec) -> String {
    match (f.fixed, f.encoded_fixed_value()) {
        (Some(raw), Some(enc)) if raw != enc => {
            format!(
                "fixed {} (truncated from {})",
                format_hex(enc, f.bit_width),
                format_hex(raw, f.bit_width)
            )
        }
        (Some(v), _) => format!("fixed {}", format_hex(v, f.bit_width)),
        _ => String::new(),
    }
}

/// One line per field: name, bit range, width, fixed value. Ends with the total.
pub fn format_schema(schema: &Schema) -> String {
    let name_width = schema
        .fields()
        .iter()
        .map(|f| f.name.len())
        .max()
        .unwrap_or(0);
    let mut lines = Vec::with_capacity(schema.len() + 1);
    let mut offset = 0u32;
    for f in schema.fields() {
        let end = offset + f.bit_width - 1;
        let line = format!(
            "{:<nw$}  {:>3}..{:<3}  {:>2} bits  {}",
            f.name,
            offset,
            end,
            f.bit_width,
            fixed_column(f),
            nw = name_width
        );
        lines.push(line.trim_end().to_string());
        offset += f.bit_width;
    }
    lines.push(format!(
        "total: {} bits, {} input field(s)",
        schema.total_bits(),
        schema.input_count()
    ));
    lines.join("\n")
}

/// One line per decoded field: `name = hex (decimal)`, with a marker on fixed fields whose
/// value does not match the schema.
pub fn format_fields(schema: &Schema, values: &FieldValues) -> String {
    let name_width = values.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
    values
        .iter()
        .zip(schema.fields())
        .map(|((name, v), f)| {
            let mismatch = match f.encoded_fixed_value() {
                Some(expected) if expected != v => {
                    format!("  (expected {})", format_hex(expected, f.bit_width))
                }
                _ => String::new(),
            };
            format!(
                "{:<nw$} = {} ({}){}",
                name,
                format_hex(v, f.bit_width),
                v,
                mismatch,
                nw = name_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Values separated by tabs in hex, as a compact single line.
pub fn format_values_line(schema: &Schema, values: &[u64]) -> String {
    values
        .iter()
        .zip(schema.fields())
        .map(|(&v, f)| format_hex(v, f.bit_width))
        .collect::<Vec<_>>()
        .join("\t")
}
