use crate::error::ProxtrieError;

/// A dictionary word validated to contain only bytes in `1..128`.
///
/// Validation happens exactly once, at construction; nothing downstream
/// re-checks byte ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word(Box<[u8]>);

impl Word {
    /// Validates `bytes` and wraps them as a [`Word`].
    ///
    /// Fails with [`ProxtrieError::InvalidCharacter`] on the first byte
    /// outside `1..128`.
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, ProxtrieError> {
        let bytes = bytes.as_ref();
        for (position, &byte) in bytes.iter().enumerate() {
            if byte == 0 || byte >= 128 {
                return Err(ProxtrieError::InvalidCharacter { byte, position });
            }
        }
        Ok(Word(bytes.into()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the word back to a `String`. Infallible since every byte is
    /// ASCII by construction.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}
