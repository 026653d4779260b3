use thiserror::Error;

/// Errors surfaced by dictionary/penalty construction and the ambient CLI layer.
///
/// Core query execution never returns an error: a built [`crate::Engine`] always
/// answers a query, because all fallible work happens before the trie exists.
#[derive(Debug, Error)]
pub enum ProxtrieError {
    #[error("invalid character byte {byte:#x} at position {position} (words must be 7-bit ASCII, 0 < b < 128)")]
    InvalidCharacter { byte: u8, position: usize },

    #[error("malformed penalty weights: {0}")]
    MalformedWeights(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}
