//! Dictionary loading adapter (§6 "Dictionary file"): one word per
//! whitespace-separated token, duplicates tolerated and deduplicated
//! internally. Mirrors `penalty::PenaltyModel::from_reader` as the other
//! half of the crate's two file-format adapters.

use std::io::Read;

use crate::error::ProxtrieError;
use crate::word::Word;

/// Parses whitespace-separated tokens from `reader` into distinct, validated
/// [`Word`]s, preserving first-occurrence order. Fails with
/// [`ProxtrieError::InvalidCharacter`] on the first token containing a byte
/// outside `1..128`.
pub fn load_words(mut reader: impl Read) -> Result<Vec<Word>, ProxtrieError> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(ProxtrieError::Io)?;

    let mut words = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for token in text.split_whitespace() {
        if seen.insert(token) {
            words.push(Word::new(token)?);
        }
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_arbitrary_whitespace() {
        let words = load_words("cat   car\nbat\tbat".as_bytes()).unwrap();
        let rendered: Vec<String> = words.iter().map(|w| w.to_string_lossy()).collect();
        assert_eq!(rendered, vec!["cat", "car", "bat"]);
    }

    #[test]
    fn deduplicates_preserving_first_occurrence_order() {
        let words = load_words("car cat car bat cat".as_bytes()).unwrap();
        let rendered: Vec<String> = words.iter().map(|w| w.to_string_lossy()).collect();
        assert_eq!(rendered, vec!["car", "cat", "bat"]);
    }

    #[test]
    fn empty_input_yields_no_words() {
        let words = load_words("   \n\t  ".as_bytes()).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn rejects_invalid_characters() {
        let mut bytes = b"cat ".to_vec();
        bytes.push(200);
        let err = load_words(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, ProxtrieError::InvalidCharacter { .. }));
    }
}
