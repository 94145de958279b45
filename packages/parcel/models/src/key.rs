//! Canonical block-lot parcel identifiers.

use serde::{Serialize, Serializer};

/// Width the block number is zero-padded to.
const BLOCK_WIDTH: usize = 4;

/// Minimum length of a slash-less composite `mapblklot` identifier
/// (4-character block plus at least a 3-character lot).
const MIN_COMPOSITE_LEN: usize = 7;

/// Canonical parcel identity: `BBBB-LOT`.
///
/// The block is trimmed and left-padded with zeros to four characters, the
/// lot is trimmed and uppercased. A key can only be built from a non-empty
/// block and a non-empty lot, so every map keyed by `ParcelKey` is free of
/// "no key" entries.
#[derive(Debug, Clone)]
pub struct ParcelKey {
    id: String,
    block_len: usize,
}

impl ParcelKey {
    /// Builds a key from separate block and lot values.
    ///
    /// Returns `None` if either side is missing or blank after trimming.
    #[must_use]
    pub fn normalize(block: Option<&str>, lot: Option<&str>) -> Option<Self> {
        let block = block.map(str::trim).filter(|s| !s.is_empty())?;
        let lot = lot.map(str::trim).filter(|s| !s.is_empty())?;

        let block = format!("{block:0>width$}", width = BLOCK_WIDTH);
        let lot = lot.to_uppercase();
        let block_len = block.len();

        Some(Self {
            id: format!("{block}-{lot}"),
            block_len,
        })
    }

    /// Builds a key from a composite land-use identifier.
    ///
    /// Accepts `BLOCK/LOT` (`"1186/006"`) or a fixed-width concatenation
    /// whose first four characters are the block (`"1186006"`). Anything
    /// shorter than seven characters without a slash is rejected.
    #[must_use]
    pub fn from_composite(mapblklot: Option<&str>) -> Option<Self> {
        let s = mapblklot?.trim().to_uppercase();
        if s.is_empty() {
            return None;
        }

        if let Some((block, lot)) = s.split_once('/') {
            return Self::normalize(Some(block), Some(lot));
        }

        if s.chars().count() >= MIN_COMPOSITE_LEN {
            let split = s
                .char_indices()
                .nth(BLOCK_WIDTH)
                .map_or(s.len(), |(idx, _)| idx);
            let (block, lot) = s.split_at(split);
            return Self::normalize(Some(block), Some(lot));
        }

        None
    }

    /// The canonical key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// The padded block component.
    #[must_use]
    pub fn block(&self) -> &str {
        &self.id[..self.block_len]
    }

    /// The uppercased lot component.
    #[must_use]
    pub fn lot(&self) -> &str {
        &self.id[self.block_len + 1..]
    }
}

// Identity is the key string alone.
impl PartialEq for ParcelKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParcelKey {}

impl PartialOrd for ParcelKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParcelKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for ParcelKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for ParcelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

impl AsRef<str> for ParcelKey {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl Serialize for ParcelKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn key(block: Option<&str>, lot: Option<&str>) -> Option<String> {
        ParcelKey::normalize(block, lot).map(|k| k.to_string())
    }

    #[test]
    fn pads_block_and_uppercases_lot() {
        assert_eq!(key(Some("1234"), Some("56")).as_deref(), Some("1234-56"));
        assert_eq!(key(Some("99"), Some("a")).as_deref(), Some("0099-A"));
        assert_eq!(key(Some("12345"), Some("1")).as_deref(), Some("12345-1"));
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(
            key(Some(" 1234 "), Some("56")),
            key(Some("1234"), Some("56"))
        );
        assert_eq!(key(Some("  1234  "), Some("  56  ")).as_deref(), Some("1234-56"));
    }

    #[test]
    fn missing_block_returns_none() {
        assert_eq!(key(None, Some("56")), None);
        assert_eq!(key(Some(""), Some("56")), None);
        assert_eq!(key(Some("   "), Some("56")), None);
    }

    #[test]
    fn missing_lot_returns_none() {
        assert_eq!(key(Some("1234"), None), None);
        assert_eq!(key(Some("1234"), Some("")), None);
    }

    #[test]
    fn both_missing_returns_none() {
        assert_eq!(key(None, None), None);
        assert_eq!(key(Some(""), Some(" ")), None);
    }

    #[test]
    fn exposes_components() {
        let k = ParcelKey::normalize(Some("99"), Some("a1")).unwrap();
        assert_eq!(k.block(), "0099");
        assert_eq!(k.lot(), "A1");
        assert_eq!(k.as_str(), "0099-A1");
    }

    #[test]
    fn composite_with_slash() {
        let k = ParcelKey::from_composite(Some("1186/006")).unwrap();
        assert_eq!(k.as_str(), "1186-006");
        let k = ParcelKey::from_composite(Some(" 86/6a ")).unwrap();
        assert_eq!(k.as_str(), "0086-6A");
    }

    #[test]
    fn composite_fixed_width() {
        let k = ParcelKey::from_composite(Some("1186006")).unwrap();
        assert_eq!(k.as_str(), "1186-006");
        let k = ParcelKey::from_composite(Some("3512008a")).unwrap();
        assert_eq!(k.as_str(), "3512-008A");
    }

    #[test]
    fn malformed_composite_returns_none() {
        assert!(ParcelKey::from_composite(None).is_none());
        assert!(ParcelKey::from_composite(Some("")).is_none());
        assert!(ParcelKey::from_composite(Some("118600")).is_none());
        assert!(ParcelKey::from_composite(Some("1186/")).is_none());
        assert!(ParcelKey::from_composite(Some("/006")).is_none());
    }

    #[test]
    fn serializes_as_plain_string() {
        let k = ParcelKey::normalize(Some("1234"), Some("56")).unwrap();
        assert_eq!(serde_json::to_string(&k).unwrap(), "\"1234-56\"");
    }

    proptest! {
        #[test]
        fn normalization_is_stable_under_padding_and_case(
            block in "[0-9]{1,4}",
            lot in "[0-9A-Za-z]{1,4}",
            lpad in 0_usize..3,
            rpad in 0_usize..3,
        ) {
            let padded_block = format!("{}{block}{}", " ".repeat(lpad), " ".repeat(rpad));
            let zero_block = format!("{block:0>4}");
            let a = ParcelKey::normalize(Some(&block), Some(&lot)).unwrap();
            let b = ParcelKey::normalize(Some(&padded_block), Some(&lot.to_lowercase())).unwrap();
            let c = ParcelKey::normalize(Some(&zero_block), Some(&lot.to_uppercase())).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(&a, &c);
            // Normalizing the components of a key reproduces the key.
            let again = ParcelKey::normalize(Some(a.block()), Some(a.lot())).unwrap();
            prop_assert_eq!(a, again);
        }
    }
}
