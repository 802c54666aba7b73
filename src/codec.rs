//! Encode field values into addresses and decode addresses back into field values.
//!
//! Fields are packed MSB-first in schema order through a 16-bit group buffer: each field's
//! `bit_width` low bits are copied most significant first, and a group is emitted every
//! time the cursor crosses a 16-bit boundary. A field that straddles a boundary is split,
//! high part first. Decoding walks the same positions and scatters bits back to fields.

use crate::address::{expand_groups, Address, Prefix, GROUP_BITS, GROUP_COUNT};
use crate::schema::{Schema, ADDRESS_BITS};
use crate::value::FieldValues;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("Value count: expected {expected} (non-fixed fields), got {found}")]
    ValueCount { expected: usize, found: usize },
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed group {index}: \"{group}\"")]
    MalformedGroup { index: usize, group: String },
    #[error("Too many groups: {found} (an address has 8)")]
    TooManyGroups { found: usize },
}

/// Encode `values` (one per non-fixed field, schema order) as full colon-hex text.
pub fn encode(schema: &Schema, values: &[u64]) -> Result<String, EncodeError> {
    Ok(encode_address(schema, values)?.to_string())
}

/// Encode `values` into an [Address]. Fixed fields take their schema value; every value
/// is cut to its field's width.
pub fn encode_address(schema: &Schema, values: &[u64]) -> Result<Address, EncodeError> {
    let expected = schema.input_count();
    if values.len() != expected {
        return Err(EncodeError::ValueCount {
            expected,
            found: values.len(),
        });
    }
    let mut inputs = values.iter().copied();
    let mut w = GroupWriteState::default();
    for field in schema.fields() {
        let value = match field.fixed {
            Some(v) => v,
            // count checked above
            None => inputs.next().unwrap_or_default(),
        };
        w.write_bits(value, field.bit_width);
    }
    Ok(w.finish())
}

/// Decode address text into one value per field (fixed fields included, as found in the text).
pub fn decode(schema: &Schema, text: &str) -> Result<Vec<u64>, DecodeError> {
    let groups = expand_groups(text)?;
    if groups.len() < GROUP_COUNT {
        log::debug!(
            "{} group(s) in \"{}\", remaining bits read as zero",
            groups.len(),
            text
        );
    }
    Ok(read_fields(schema, &groups))
}

/// Decode an already parsed address.
pub fn decode_address(schema: &Schema, addr: Address) -> Vec<u64> {
    read_fields(schema, &addr.groups())
}

/// Like [decode], keeping each value paired with its field name.
pub fn decode_fields(schema: &Schema, text: &str) -> Result<FieldValues, DecodeError> {
    let values = decode(schema, text)?;
    Ok(FieldValues::new(schema, values))
}

fn read_fields(schema: &Schema, groups: &[u16]) -> Vec<u64> {
    let mut r = GroupReadState::new(groups);
    schema
        .fields()
        .iter()
        .map(|f| r.read_bits(f.bit_width))
        .collect()
}

/// A schema bundled with the encode/decode operations over it.
#[derive(Debug, Clone)]
pub struct AddressCodec {
    schema: Schema,
}

impl AddressCodec {
    pub fn new(schema: Schema) -> Self {
        AddressCodec { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn encode(&self, values: &[u64]) -> Result<String, EncodeError> {
        encode(&self.schema, values)
    }

    pub fn encode_address(&self, values: &[u64]) -> Result<Address, EncodeError> {
        encode_address(&self.schema, values)
    }

    pub fn decode(&self, text: &str) -> Result<Vec<u64>, DecodeError> {
        decode(&self.schema, text)
    }

    pub fn decode_address(&self, addr: Address) -> Vec<u64> {
        decode_address(&self.schema, addr)
    }

    pub fn decode_fields(&self, text: &str) -> Result<FieldValues, DecodeError> {
        decode_fields(&self.schema, text)
    }

    /// True when `text` carries this schema's fixed values, i.e. it was built with this schema.
    pub fn has_fixed_values(&self, text: &str) -> Result<bool, DecodeError> {
        let values = self.decode(text)?;
        Ok(self.schema.fixed_fields_match(&values))
    }

    /// Encode `values` and keep only the bits up to and including field `through`.
    pub fn prefix(&self, values: &[u64], through: &str) -> Result<Prefix, EncodeError> {
        let len = self
            .schema
            .prefix_len_through(through)
            .ok_or_else(|| EncodeError::UnknownField(through.to_string()))?;
        let addr = self.encode_address(values)?;
        Ok(Prefix::clamped(addr, len))
    }
}

/// Group buffer for encoding: bits shift in at the bottom of `part` until it holds 16.
#[derive(Debug, Default)]
struct GroupWriteState {
    groups: [u16; GROUP_COUNT],
    part: u16,
    bit: u32,
}

impl GroupWriteState {
    fn write_bits(&mut self, value: u64, width: u32) {
        for i in (0..width).rev() {
            if self.bit >= ADDRESS_BITS {
                return;
            }
            self.part = (self.part << 1) | ((value >> i) & 1) as u16;
            self.bit += 1;
            if self.bit % GROUP_BITS == 0 {
                self.groups[(self.bit / GROUP_BITS) as usize - 1] = self.part;
                self.part = 0;
            }
        }
    }

    /// Zero-fill the open group; later groups are already zero.
    fn finish(mut self) -> Address {
        let used = self.bit % GROUP_BITS;
        if used != 0 {
            self.groups[(self.bit / GROUP_BITS) as usize] = self.part << (GROUP_BITS - used);
        }
        Address::from_groups(self.groups)
    }
}

/// Bit cursor over decoded groups. Positions past the supplied groups read as zero.
#[derive(Debug)]
struct GroupReadState<'a> {
    groups: &'a [u16],
    bit: u32,
}

impl<'a> GroupReadState<'a> {
    fn new(groups: &'a [u16]) -> Self {
        GroupReadState { groups, bit: 0 }
    }

    fn read_bits(&mut self, width: u32) -> u64 {
        let mut out = 0u64;
        for _ in 0..width {
            let idx = (self.bit / GROUP_BITS) as usize;
            let part = self.groups.get(idx).copied().unwrap_or(0);
            if self.bit % GROUP_BITS == 0 {
                log::trace!("group {}: {:04x}", idx, part);
            }
            let shift = GROUP_BITS - 1 - self.bit % GROUP_BITS;
            out = (out << 1) | ((part >> shift) & 1) as u64;
            self.bit += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn byte_fields() -> Schema {
        Schema::new(vec![
            FieldSpec::new("a", 8),
            FieldSpec::fixed("b", 4, 0xa),
            FieldSpec::new("c", 12),
        ])
        .unwrap()
    }

    #[test]
    fn writes_msb_first_and_zero_fills() {
        let text = encode(&byte_fields(), &[0x12, 0x345]).unwrap();
        assert_eq!(text, "12a3:4500:0000:0000:0000:0000:0000:0000");
    }

    #[test]
    fn value_count_is_checked() {
        let err = encode(&byte_fields(), &[1]).unwrap_err();
        assert_eq!(err, EncodeError::ValueCount { expected: 2, found: 1 });
        assert!(encode(&byte_fields(), &[1, 2, 3]).is_err());
    }

    #[test]
    fn wide_values_are_truncated() {
        let text = encode(&byte_fields(), &[0x1ff, 0xfffff]).unwrap();
        assert_eq!(text, "ffaf:ff00:0000:0000:0000:0000:0000:0000");
    }

    #[test]
    fn straddling_field_splits_high_part_first() {
        let schema = Schema::new(vec![FieldSpec::new("pad", 12), FieldSpec::new("x", 8)]).unwrap();
        let text = encode(&schema, &[0, 0xab]).unwrap();
        assert_eq!(text, "000a:b000:0000:0000:0000:0000:0000:0000");
        assert_eq!(decode(&schema, &text).unwrap(), vec![0, 0xab]);
    }

    #[test]
    fn reads_past_short_input_as_zero() {
        let values = decode(&byte_fields(), "12a3").unwrap();
        assert_eq!(values, vec![0x12, 0xa, 0x300]);
    }

    #[test]
    fn empty_schema_encodes_all_zero() {
        let schema = Schema::default();
        assert_eq!(encode(&schema, &[]).unwrap(), "0000:0000:0000:0000:0000:0000:0000:0000");
        assert!(decode(&schema, "::1").unwrap().is_empty());
    }

    #[test]
    fn full_width_64_bit_fields() {
        let schema = Schema::new(vec![FieldSpec::new("hi", 64), FieldSpec::new("lo", 64)]).unwrap();
        let values = [u64::MAX, 0x0123_4567_89ab_cdef];
        let addr = encode_address(&schema, &values).unwrap();
        assert_eq!(addr.bits(), (u64::MAX as u128) << 64 | 0x0123_4567_89ab_cdef);
        assert_eq!(decode_address(&schema, addr), values.to_vec());
    }

    #[test]
    fn codec_prefix_and_membership() {
        let codec = AddressCodec::new(byte_fields());
        let prefix = codec.prefix(&[0x12, 0x345], "b").unwrap();
        assert_eq!(prefix.len(), 12);
        assert_eq!(prefix.to_string(), "12a0:0000:0000:0000:0000:0000:0000:0000/12");
        assert!(matches!(codec.prefix(&[0, 0], "zz"), Err(EncodeError::UnknownField(_))));
        assert!(codec.has_fixed_values("12a3:4500::").unwrap());
        assert!(!codec.has_fixed_values("12b3:4500::").unwrap());
    }
}
