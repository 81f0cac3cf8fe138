//! Single-word reference representation for identifiers `0..64`.
//!
//! [`WordSet`] shares the [`IdSet`](crate::IdSet) interface with
//! [`DecodedSet`](crate::DecodedSet) and serves as an oracle for it in tests.
//! Its encoding is the trivial version marker followed by the raw word.

use canonset_bits::{BitReader, BitWriter, low_mask};
use canonset_common::{Result, error::Error, verify_arg, verify_canon};
use canonset_format::{CduType, TRIVIAL_FORMAT_VERSION};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WordSet(u64);

impl WordSet {
    /// Number of identifiers in the domain.
    pub const DOMAIN: u64 = 64;

    pub const fn from_word(word: u64) -> WordSet {
        WordSet(word)
    }

    pub const fn word(&self) -> u64 {
        self.0
    }

    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Result<WordSet> {
        let mut set = WordSet::default();
        for id in ids {
            set.insert(id)?;
        }
        Ok(set)
    }

    pub fn contains(&self, id: u64) -> bool {
        id < Self::DOMAIN && (self.0 >> id) & 1 != 0
    }

    pub fn insert(&mut self, id: u64) -> Result<bool> {
        verify_arg!(id, id < Self::DOMAIN);
        let was = self.contains(id);
        self.0 |= 1 << id;
        Ok(!was)
    }

    pub fn remove(&mut self, id: u64) -> Result<bool> {
        let was = self.contains(id);
        if was {
            self.0 &= !(1 << id);
        }
        Ok(was)
    }

    pub fn cardinality(&self) -> u64 {
        self.0.count_ones() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn rank(&self, id: u64) -> u64 {
        (self.0 & low_mask(id.min(Self::DOMAIN) as u32)).count_ones() as u64
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                return None;
            }
            let id = rest.trailing_zeros() as u64;
            rest &= rest - 1;
            Some(id)
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new();
        CduType::DEFAULT.write(&mut writer, TRIVIAL_FORMAT_VERSION)?;
        CduType::RAW64.write(&mut writer, self.0)?;
        writer.align_to_byte();
        Ok(writer.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<WordSet> {
        let mut reader = BitReader::new(bytes);
        let version = CduType::DEFAULT.read(&mut reader)?;
        if version != TRIVIAL_FORMAT_VERSION {
            return Err(Error::unsupported_format(version));
        }
        let word = CduType::RAW64.read(&mut reader)?;
        let padding = ((8 - reader.position() % 8) % 8) as u32;
        let pad_bits = reader
            .read(padding)
            .ok_or_else(|| Error::truncated("padding"))?;
        verify_canon!(padding, pad_bits == 0);
        if reader.remaining() != 0 {
            return Err(Error::malformed("trailing", "bytes after the word"));
        }
        Ok(WordSet(word))
    }
}

#[cfg(test)]
mod tests {
    use canonset_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_word_set_basics() {
        let mut set = WordSet::from_ids([0, 5, 63]).unwrap();
        assert_eq!(set.cardinality(), 3);
        assert!(set.contains(63));
        assert!(!set.contains(64));
        assert_eq!(set.rank(6), 2);
        assert_eq!(set.rank(1_000), 3);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![0, 5, 63]);
        assert!(!set.insert(5).unwrap());
        assert!(set.remove(5).unwrap());
        assert!(!set.remove(200).unwrap());
        let err = set.insert(64).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_word_set_encoding() {
        let set = WordSet::from_word(0x8000_0000_0000_0001);
        let bytes = set.encode().unwrap();
        // 17 version bits plus 64 raw bits.
        assert_eq!(bytes.len(), 11);
        assert_eq!(WordSet::decode(&bytes).unwrap(), set);

        let mut padded = bytes.clone();
        *padded.last_mut().unwrap() |= 0x80;
        assert!(WordSet::decode(&padded).unwrap_err().is_canon_violation());

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(WordSet::decode(&longer).unwrap_err().is_malformed());

        assert!(matches!(
            WordSet::decode(&[0x00]).unwrap_err().kind(),
            ErrorKind::UnsupportedFormat { version: 0 }
        ));
    }
}
