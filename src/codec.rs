//! Country Codec - fixed-width packing of excluded country lists
//!
//! Up to 40 three-letter codes are flattened into a 120-byte stream and cut
//! into four 30-byte chunks. Chunk `i` becomes word `i`, with stream byte
//! `30*i + j` at bit offset `8*j` of the word. Words are kept here as
//! little-endian byte arrays so that index `j` is exactly that byte; the
//! big-endian integer form the registry hashes is produced by
//! [`PackedCountryBlock::word_be`].

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, PolicyError};

pub const MAX_COUNTRIES: usize = 40;
pub const CODES_PER_WORD: usize = 10;
pub const CODE_LEN: usize = 3;
pub const WORD_COUNT: usize = MAX_COUNTRIES / CODES_PER_WORD;
/// Bytes of each word that carry codes; bytes 30 and 31 stay zero.
pub const USED_BYTES_PER_WORD: usize = CODES_PER_WORD * CODE_LEN;

/// Four packed 256-bit words, each stored least-significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackedCountryBlock {
    pub words: [[u8; 32]; WORD_COUNT],
}

impl PackedCountryBlock {
    /// Word `i` as a 32-byte big-endian unsigned integer.
    pub fn word_be(&self, i: usize) -> [u8; 32] {
        let mut out = self.words[i];
        out.reverse();
        out
    }

    /// Rebuild from four big-endian 32-byte integers, as returned on-chain.
    pub fn from_be_words(words_be: [[u8; 32]; WORD_COUNT]) -> Self {
        let mut words = words_be;
        for w in words.iter_mut() {
            w.reverse();
        }
        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.iter().all(|b| *b == 0))
    }
}

/// Whether `code` is acceptable as a country slot: exactly three of
/// `A`-`Z` or the MRZ filler `<` (as in `D<<`).
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(is_code_byte)
}

fn is_code_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b == b'<'
}

/// Pack an ordered list of codes. Order is preserved slot for slot.
pub fn pack<S: AsRef<str>>(codes: &[S]) -> Result<PackedCountryBlock, PolicyError> {
    if codes.len() > MAX_COUNTRIES {
        return Err(PolicyError::TooManyCountries { count: codes.len() });
    }

    // Padding codes are all-zero, so the stream only needs the real codes.
    let mut stream = [0u8; MAX_COUNTRIES * CODE_LEN];
    for (k, code) in codes.iter().enumerate() {
        let code = code.as_ref();
        if !is_valid_code(code) {
            return Err(PolicyError::InvalidCode { code: code.to_string() });
        }
        stream[k * CODE_LEN..(k + 1) * CODE_LEN].copy_from_slice(code.as_bytes());
    }

    let mut block = PackedCountryBlock::default();
    for (i, word) in block.words.iter_mut().enumerate() {
        let start = i * USED_BYTES_PER_WORD;
        word[..USED_BYTES_PER_WORD].copy_from_slice(&stream[start..start + USED_BYTES_PER_WORD]);
    }
    Ok(block)
}

/// Unpack words back into codes. All-zero slots are skipped wherever they
/// appear; a slot that does not hold three non-zero bytes is a
/// [`DecodeError`]. Other bytes are kept as they are, one `char` per byte.
pub fn unpack(block: &PackedCountryBlock) -> Result<Vec<String>, DecodeError> {
    let mut codes = Vec::new();

    for (w, word) in block.words.iter().enumerate() {
        if word[USED_BYTES_PER_WORD..].iter().any(|b| *b != 0) {
            return Err(DecodeError::DirtyPadding { word: w });
        }

        for slot in 0..CODES_PER_WORD {
            let bytes = &word[slot * CODE_LEN..(slot + 1) * CODE_LEN];
            let len = bytes.iter().position(|b| *b == 0).unwrap_or(CODE_LEN);

            if len == 0 {
                if bytes.iter().any(|b| *b != 0) {
                    return Err(DecodeError::UnterminatedSlot { word: w, slot });
                }
                continue;
            }
            if len < CODE_LEN {
                return Err(DecodeError::UnterminatedSlot { word: w, slot });
            }
            let code: String = bytes.iter().map(|b| char::from(*b)).collect();
            if !bytes.iter().all(|b| is_code_byte(*b)) {
                tracing::warn!(word = w, slot, code = %code.escape_default(), "stored country code is not A-Z");
            }
            codes.push(code);
        }
    }

    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_places_bytes_low_first() {
        let block = pack(&["USA", "GBR"]).unwrap();
        assert_eq!(&block.words[0][..6], b"USAGBR");
        assert!(block.words[0][6..].iter().all(|b| *b == 0));
        assert!(block.words[1..].iter().all(|w| w.iter().all(|b| *b == 0)));
    }

    #[test]
    fn test_word_be_matches_integer_value() {
        // "USAGBR" read as a little-endian integer is 0x524247415355
        let block = pack(&["USA", "GBR"]).unwrap();
        let be = block.word_be(0);
        assert!(be[..26].iter().all(|b| *b == 0));
        assert_eq!(&be[26..], &[0x52, 0x42, 0x47, 0x41, 0x53, 0x55]);
    }

    #[test]
    fn test_eleventh_code_starts_second_word() {
        let codes: Vec<String> = (0..11).map(|i| format!("A{}Z", (b'A' + i) as char)).collect();
        let block = pack(&codes).unwrap();
        assert_eq!(&block.words[0][27..30], b"AJZ");
        assert_eq!(&block.words[0][30..], &[0, 0]);
        assert_eq!(&block.words[1][..3], b"AKZ");
    }

    #[test]
    fn test_pack_rejects_bad_codes() {
        assert_eq!(
            pack(&["US"]),
            Err(PolicyError::InvalidCode { code: "US".into() })
        );
        assert_eq!(
            pack(&["usa"]),
            Err(PolicyError::InvalidCode { code: "usa".into() })
        );
        assert!(pack(&["ÜSA"]).is_err());
    }

    #[test]
    fn test_pack_accepts_mrz_filler() {
        let block = pack(&["D<<"]).unwrap();
        assert_eq!(unpack(&block).unwrap(), vec!["D<<"]);
    }

    #[test]
    fn test_unpack_skips_interior_empty_slots() {
        let mut block = PackedCountryBlock::default();
        block.words[0][..3].copy_from_slice(b"USA");
        block.words[2][9..12].copy_from_slice(b"CUB");
        assert_eq!(unpack(&block).unwrap(), vec!["USA", "CUB"]);
    }

    #[test]
    fn test_unpack_rejects_truncated_slot() {
        let mut block = PackedCountryBlock::default();
        block.words[0][..2].copy_from_slice(b"US");
        assert_eq!(
            unpack(&block),
            Err(DecodeError::UnterminatedSlot { word: 0, slot: 0 })
        );

        let mut block = PackedCountryBlock::default();
        block.words[1][3] = 0;
        block.words[1][4] = b'X';
        assert_eq!(
            unpack(&block),
            Err(DecodeError::UnterminatedSlot { word: 1, slot: 1 })
        );
    }

    #[test]
    fn test_unpack_rejects_dirty_padding() {
        let mut block = pack(&["USA"]).unwrap();
        block.words[3][31] = 1;
        assert_eq!(unpack(&block), Err(DecodeError::DirtyPadding { word: 3 }));
    }

    #[test]
    fn test_unpack_keeps_non_code_bytes() {
        let mut block = PackedCountryBlock::default();
        block.words[0][..3].copy_from_slice(b"usa");
        block.words[0][3..6].copy_from_slice(b"D1A");
        block.words[1][..3].copy_from_slice(&[b'A', 0xe9, b'B']);
        assert_eq!(unpack(&block).unwrap(), vec!["usa", "D1A", "A\u{e9}B"]);
    }

    #[test]
    fn test_be_words_roundtrip() {
        let block = pack(&["IRN", "PRK", "CUB", "SYR"]).unwrap();
        let be = [block.word_be(0), block.word_be(1), block.word_be(2), block.word_be(3)];
        assert_eq!(PackedCountryBlock::from_be_words(be), block);
    }
}
