//! The 128-bit address value and its colon-hex text forms.
//!
//! Text is 8 groups of 16 bits. [Address]'s `Display` always writes the full form
//! (`fcff:1000:0840:0000:0100:17c9:4d8a:3a71`); parsing also accepts groups with leading
//! zeros dropped and a single `::` run of zero groups.

use crate::codec::DecodeError;
use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

/// Groups in an address.
pub const GROUP_COUNT: usize = 8;
/// Bits per group.
pub const GROUP_BITS: u32 = 16;

const ZERO_RUN: &str = "::";

/// A packed address. Bit 0 of the schema is the most significant bit of the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u128);

impl Address {
    pub const fn new(bits: u128) -> Self {
        Address(bits)
    }

    pub const fn bits(self) -> u128 {
        self.0
    }

    pub fn from_groups(groups: [u16; GROUP_COUNT]) -> Self {
        Address(
            groups
                .iter()
                .fold(0u128, |acc, &g| (acc << GROUP_BITS) | g as u128),
        )
    }

    pub fn groups(self) -> [u16; GROUP_COUNT] {
        let mut out = [0u16; GROUP_COUNT];
        for (i, g) in out.iter_mut().enumerate() {
            let shift = GROUP_BITS as usize * (GROUP_COUNT - 1 - i);
            *g = (self.0 >> shift) as u16;
        }
        out
    }

    /// Network-order octets.
    pub fn to_octets(self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        BigEndian::write_u128(&mut buf, self.0);
        buf
    }

    pub fn from_octets(octets: [u8; 16]) -> Self {
        Address(BigEndian::read_u128(&octets))
    }

    /// Keep the first `len` bits, zero the rest. `len` ≥ 128 keeps everything.
    pub fn masked(self, len: u32) -> Self {
        Address(self.0 & prefix_mask(len))
    }
}

fn prefix_mask(len: u32) -> u128 {
    match len {
        0 => 0,
        l if l >= 128 => u128::MAX,
        l => u128::MAX << (128 - l),
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, g) in self.groups().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:04x}", g)?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = DecodeError;

    /// Parse full or compressed text. Missing trailing groups read as zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut groups = [0u16; GROUP_COUNT];
        for (slot, g) in groups.iter_mut().zip(expand_groups(s)?) {
            *slot = g;
        }
        Ok(Address::from_groups(groups))
    }
}

impl From<Ipv6Addr> for Address {
    fn from(addr: Ipv6Addr) -> Self {
        Address(u128::from(addr))
    }
}

impl From<Address> for Ipv6Addr {
    fn from(addr: Address) -> Self {
        Ipv6Addr::from(addr.0)
    }
}

/// Expand address text into its groups, in order.
///
/// A `::` becomes however many zero groups bring the total to 8 (at least one), at the
/// position it appears, so `fcff::` ends in seven zero groups and `::1` starts with seven.
/// Without `::` the groups are returned as written and may number fewer than 8.
pub fn expand_groups(text: &str) -> Result<Vec<u16>, DecodeError> {
    let text = text.trim();
    let Some((head, tail)) = text.split_once(ZERO_RUN) else {
        let groups = parse_run(text, 0)?;
        if groups.len() > GROUP_COUNT {
            return Err(DecodeError::TooManyGroups {
                found: groups.len(),
            });
        }
        return Ok(groups);
    };

    let head = if head.is_empty() {
        Vec::new()
    } else {
        parse_run(head, 0)?
    };
    if tail.contains(ZERO_RUN) {
        return Err(DecodeError::MalformedGroup {
            index: head.len(),
            group: ZERO_RUN.to_string(),
        });
    }
    let tail = if tail.is_empty() {
        Vec::new()
    } else {
        parse_run(tail, head.len())?
    };

    let present = head.len() + tail.len();
    if present >= GROUP_COUNT {
        return Err(DecodeError::TooManyGroups { found: present + 1 });
    }
    let mut groups = head;
    groups.resize(GROUP_COUNT - tail.len(), 0);
    groups.extend(tail);
    Ok(groups)
}

/// Colon-separated groups; `first_index` numbers them for error reports.
fn parse_run(run: &str, first_index: usize) -> Result<Vec<u16>, DecodeError> {
    run.split(':')
        .enumerate()
        .map(|(i, g)| parse_group(g, first_index + i))
        .collect()
}

fn parse_group(group: &str, index: usize) -> Result<u16, DecodeError> {
    let malformed = || DecodeError::MalformedGroup {
        index,
        group: group.to_string(),
    };
    if group.is_empty() || group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    u16::from_str_radix(group, 16).map_err(|_| malformed())
}

/// An address together with a prefix length; bits past the prefix are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    network: Address,
    len: u32,
}

impl Prefix {
    /// `None` when `len` exceeds 128.
    pub fn new(addr: Address, len: u32) -> Option<Self> {
        (len <= 128).then(|| Prefix::clamped(addr, len))
    }

    /// Like [Prefix::new], with lengths over 128 taken as 128.
    pub fn clamped(addr: Address, len: u32) -> Self {
        let len = len.min(128);
        Prefix {
            network: addr.masked(len),
            len,
        }
    }

    pub fn network(&self) -> Address {
        self.network
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr.masked(self.len) == self.network
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_full_lowercase_form() {
        let addr = Address::from_groups([0xfcff, 0x1000, 0x840, 0, 0x100, 0x17c9, 0x4d8a, 0x3a71]);
        assert_eq!(addr.to_string(), "fcff:1000:0840:0000:0100:17c9:4d8a:3a71");
    }

    #[test]
    fn expands_middle_run() {
        let groups = expand_groups("fcff:1000:840::17c9:4d8a:3a71").unwrap();
        assert_eq!(groups, vec![0xfcff, 0x1000, 0x840, 0, 0, 0x17c9, 0x4d8a, 0x3a71]);
    }

    #[test]
    fn expands_trailing_and_leading_runs() {
        assert_eq!(expand_groups("fcff::").unwrap(), vec![0xfcff, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(expand_groups("::1").unwrap(), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(expand_groups("::").unwrap(), vec![0; 8]);
        assert_eq!(expand_groups("1:2:3:4:5:6::8").unwrap(), vec![1, 2, 3, 4, 5, 6, 0, 8]);
    }

    #[test]
    fn short_text_without_run_is_not_padded() {
        assert_eq!(expand_groups("fcff:1").unwrap(), vec![0xfcff, 1]);
        let addr: Address = "fcff:1".parse().unwrap();
        assert_eq!(addr.to_string(), "fcff:0001:0000:0000:0000:0000:0000:0000");
    }

    #[test]
    fn rejects_bad_groups() {
        assert!(matches!(
            expand_groups("fcff:xyz::1"),
            Err(DecodeError::MalformedGroup { index: 1, .. })
        ));
        assert!(matches!(
            expand_groups("12345::"),
            Err(DecodeError::MalformedGroup { index: 0, .. })
        ));
        assert!(matches!(
            expand_groups("1:2:"),
            Err(DecodeError::MalformedGroup { index: 2, .. })
        ));
        assert!(matches!(expand_groups(""), Err(DecodeError::MalformedGroup { .. })));
        assert!(matches!(expand_groups("1:::2"), Err(DecodeError::MalformedGroup { .. })));
    }

    #[test]
    fn rejects_second_run() {
        let err = expand_groups("1::2::3").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedGroup { ref group, .. } if group == "::"));
    }

    #[test]
    fn rejects_too_many_groups() {
        assert!(matches!(
            expand_groups("1:2:3:4:5:6:7:8:9"),
            Err(DecodeError::TooManyGroups { found: 9 })
        ));
        assert!(matches!(
            expand_groups("1:2:3:4::5:6:7:8"),
            Err(DecodeError::TooManyGroups { found: 9 })
        ));
    }

    #[test]
    fn octets_and_ipv6_agree() {
        let addr: Address = "fcff:1000:840::17c9:4d8a:3a71".parse().unwrap();
        let ip: Ipv6Addr = addr.into();
        assert_eq!(ip.octets(), addr.to_octets());
        assert_eq!(Address::from_octets(addr.to_octets()), addr);
        assert_eq!(Address::from(ip), addr);
    }

    #[test]
    fn prefix_masks_and_contains() {
        let addr: Address = "fcff:1000:0840:0000:0100:17c9:4d8a:3a71".parse().unwrap();
        let prefix = Prefix::new(addr, 42).unwrap();
        assert_eq!(prefix.to_string(), "fcff:1000:0840:0000:0000:0000:0000:0000/42");
        assert!(prefix.contains(addr));
        assert!(!prefix.contains("fcff:1000:0880::".parse().unwrap()));
        assert!(Prefix::new(addr, 129).is_none());
        assert_eq!(Prefix::clamped(addr, 200), Prefix::new(addr, 128).unwrap());
        assert_eq!(Prefix::clamped(addr, 42), prefix);
        assert_eq!(Prefix::new(addr, 0).unwrap().network(), Address::default());
    }
}
