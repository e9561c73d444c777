//! Bijective encoding between category labels and contiguous integers.

use crate::target::LabelAlphabet;
use crate::CoreError;

/// Encoder/decoder for one target's label alphabet.
///
/// Encoding is stable for a given alphabet ordering, so `decode` is a true
/// inverse of `encode`.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    alphabet: LabelAlphabet,
}

impl LabelCodec {
    /// Create a codec over the given alphabet.
    #[must_use]
    pub fn new(alphabet: LabelAlphabet) -> Self {
        Self { alphabet }
    }

    /// Return the underlying alphabet.
    #[must_use]
    pub fn alphabet(&self) -> &LabelAlphabet {
        &self.alphabet
    }

    /// Encode category strings to integer codes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownLabel`] on the first label that is not a
    /// member of the alphabet.
    pub fn encode(&self, labels: &[String]) -> Result<Vec<usize>, CoreError> {
        labels
            .iter()
            .map(|label| {
                self.alphabet
                    .position(label)
                    .ok_or_else(|| CoreError::UnknownLabel {
                        label: label.clone(),
                        alphabet: self.alphabet.labels().join(", "),
                    })
            })
            .collect()
    }

    /// Decode integer codes back to category strings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLabelCode`] on the first code outside the
    /// alphabet range.
    pub fn decode(&self, codes: &[usize]) -> Result<Vec<String>, CoreError> {
        codes
            .iter()
            .map(|&code| {
                self.alphabet
                    .label(code)
                    .map(String::from)
                    .ok_or(CoreError::InvalidLabelCode {
                        code,
                        size: self.alphabet.len(),
                    })
            })
            .collect()
    }
}
