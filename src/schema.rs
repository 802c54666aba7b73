//! Schema model: an ordered list of fixed-width fields packed MSB-first into a 128-bit address.
//!
//! Field order is the packing order. The first field occupies the most significant bits;
//! bits after the last field are always zero.

/// Total number of bits in an address.
pub const ADDRESS_BITS: u32 = 128;
/// Widest single field (values are carried as `u64`).
pub const MAX_FIELD_BITS: u32 = 64;

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub bit_width: u32,
    /// Value baked into the schema. Fixed fields take no caller value on encode.
    ///
    /// A value wider than `bit_width` is kept as written and silently truncated to its
    /// low `bit_width` bits when encoded, so `0x1ff` in an 8-bit field encodes as `0xff`.
    pub fixed: Option<u64>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, bit_width: u32) -> Self {
        FieldSpec {
            name: name.into(),
            bit_width,
            fixed: None,
        }
    }

    pub fn fixed(name: impl Into<String>, bit_width: u32, value: u64) -> Self {
        FieldSpec {
            name: name.into(),
            bit_width,
            fixed: Some(value),
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }

    /// The fixed value as it actually lands in the address (low `bit_width` bits).
    pub fn encoded_fixed_value(&self) -> Option<u64> {
        self.fixed.map(|v| v & width_mask(self.bit_width))
    }
}

/// Mask covering the low `bits` bits (`bits` in 0..=64).
pub fn width_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: field \"{name}\" has no bit width")]
    MissingWidth { line: usize, name: String },
    #[error("line {line}: unexpected \"{token}\" in bit width (decimal digits only)")]
    InvalidWidth { line: usize, token: String },
    #[error("line {line}: field \"{name}\" has a bit width of 0")]
    ZeroWidth { line: usize, name: String },
    #[error("line {line}: field width {width} exceeds 64 bits")]
    WidthTooLarge { line: usize, width: u64 },
    #[error("line {line}: schema uses {total} bits, at most 128 allowed")]
    TotalBitsExceeded { line: usize, total: u32 },
    #[error("line {line}: unexpected \"{token}\", expecting \"fixed\"")]
    UnexpectedToken { line: usize, token: String },
    #[error("line {line}: fixed field \"{name}\" has no value")]
    MissingFixedValue { line: usize, name: String },
    #[error("line {line}: invalid fixed value \"{token}\"")]
    InvalidFixedValue { line: usize, token: String },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// A validated, immutable schema. Build with [SchemaBuilder], [Schema::new] or the loaders in [crate::parser].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    total_bits: u32,
}

impl Schema {
    /// Validate `fields` in order. Errors report the 1-based field index as the line.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::new();
        for (i, field) in fields.into_iter().enumerate() {
            builder.push(i + 1, field)?;
        }
        Ok(builder.build())
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bits consumed by all fields (at most [ADDRESS_BITS]).
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Number of caller-supplied values `encode` expects (non-fixed fields).
    pub fn input_count(&self) -> usize {
        self.fields.iter().filter(|f| !f.is_fixed()).count()
    }

    /// Index of the first field called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    /// Bit offset of the first bit of `name`, counted from the most significant bit.
    pub fn bit_offset(&self, name: &str) -> Option<u32> {
        let idx = self.index_of(name)?;
        Some(self.fields[..idx].iter().map(|f| f.bit_width).sum())
    }

    /// Prefix length covering every field up to and including `name`.
    pub fn prefix_len_through(&self, name: &str) -> Option<u32> {
        let idx = self.index_of(name)?;
        Some(self.fields[..=idx].iter().map(|f| f.bit_width).sum())
    }

    /// True when every fixed field in `values` (one value per field, decode order)
    /// holds the value the encoder would have written for it.
    pub fn fixed_fields_match(&self, values: &[u64]) -> bool {
        values.len() == self.fields.len()
            && self
                .fields
                .iter()
                .zip(values)
                .all(|(f, &v)| f.encoded_fixed_value().map_or(true, |fixed| fixed == v))
    }
}

/// Append-only builder enforcing the width and total-bits invariants as each field arrives.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
    total_bits: u32,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that a field `bit_width` wide could be appended next; returns the new total.
    /// Fails as soon as the running total passes [ADDRESS_BITS].
    pub fn check_width(&self, line: usize, name: &str, bit_width: u32) -> Result<u32, SchemaError> {
        if bit_width == 0 {
            return Err(SchemaError::ZeroWidth {
                line,
                name: name.to_string(),
            });
        }
        if bit_width > MAX_FIELD_BITS {
            return Err(SchemaError::WidthTooLarge {
                line,
                width: bit_width as u64,
            });
        }
        let total = self.total_bits + bit_width;
        if total > ADDRESS_BITS {
            return Err(SchemaError::TotalBitsExceeded { line, total });
        }
        Ok(total)
    }

    /// Add `field`; `line` is only used for error reporting.
    pub fn push(&mut self, line: usize, field: FieldSpec) -> Result<(), SchemaError> {
        self.total_bits = self.check_width(line, &field.name, field.bit_width)?;
        self.fields.push(field);
        Ok(())
    }

    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
            total_bits: self.total_bits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new(vec![
            FieldSpec::fixed("prefix", 16, 0xfcff),
            FieldSpec::fixed("version", 5, 2),
            FieldSpec::new("process_type", 16),
            FieldSpec::new("process_version", 5),
            FieldSpec::new("sys_id", 32),
            FieldSpec::new("pid", 22),
            FieldSpec::new("timestamp", 32),
        ])
        .expect("valid schema")
    }

    #[test]
    fn counts_inputs_and_bits() {
        let schema = sample();
        assert_eq!(schema.len(), 7);
        assert_eq!(schema.total_bits(), 128);
        assert_eq!(schema.input_count(), 5);
    }

    #[test]
    fn offsets_and_prefix_lengths() {
        let schema = sample();
        assert_eq!(schema.bit_offset("prefix"), Some(0));
        assert_eq!(schema.bit_offset("process_type"), Some(21));
        assert_eq!(schema.prefix_len_through("process_version"), Some(42));
        assert_eq!(schema.prefix_len_through("nope"), None);
    }

    #[test]
    fn builder_rejects_zero_and_wide_fields() {
        let mut b = SchemaBuilder::new();
        assert!(matches!(
            b.push(1, FieldSpec::new("z", 0)),
            Err(SchemaError::ZeroWidth { line: 1, .. })
        ));
        assert!(matches!(
            b.push(2, FieldSpec::new("w", 65)),
            Err(SchemaError::WidthTooLarge { line: 2, width: 65 })
        ));
    }

    #[test]
    fn builder_stops_at_crossing_field() {
        let mut b = SchemaBuilder::new();
        b.push(1, FieldSpec::new("a", 64)).unwrap();
        b.push(2, FieldSpec::new("b", 64)).unwrap();
        let err = b.push(3, FieldSpec::new("c", 1)).unwrap_err();
        assert!(matches!(err, SchemaError::TotalBitsExceeded { line: 3, total: 129 }));
        assert_eq!(b.total_bits(), 128);
    }

    #[test]
    fn fixed_value_truncates_to_width() {
        let f = FieldSpec::fixed("v", 4, 0x1f);
        assert_eq!(f.fixed, Some(0x1f));
        assert_eq!(f.encoded_fixed_value(), Some(0xf));
        assert_eq!(FieldSpec::fixed("w", 64, u64::MAX).encoded_fixed_value(), Some(u64::MAX));
    }

    #[test]
    fn fixed_fields_match_checks_only_fixed() {
        let schema = sample();
        assert!(schema.fixed_fields_match(&[0xfcff, 2, 9, 9, 9, 9, 9]));
        assert!(!schema.fixed_fields_match(&[0xfcfe, 2, 9, 9, 9, 9, 9]));
        assert!(!schema.fixed_fields_match(&[0xfcff, 2]));
    }
}
