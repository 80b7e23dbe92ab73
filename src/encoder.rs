//! Bidirectional string/integer table used to keep branching keys compact.

use std::path::Path;

use ahash::AHashMap;

use crate::error::Result;
use crate::serialization;

/// Identifier assigned by [`IntegerEncoder::fit`].
pub type EncodedId = u32;

/// Assigns dense ids to strings in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegerEncoder {
    ids: AHashMap<String, EncodedId>,
    strings: Vec<String>,
}

impl IntegerEncoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `text`, allocating the next one on first sight.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are fitted.
    pub fn fit(&mut self, text: &str) -> EncodedId {
        if let Some(&id) = self.ids.get(text) {
            return id;
        }
        let id = EncodedId::try_from(self.strings.len())
            .expect("integer encoder exceeded u32::MAX entries");
        self.ids.insert(text.to_owned(), id);
        self.strings.push(text.to_owned());
        id
    }

    /// Returns the id of `text` without allocating one.
    #[must_use]
    pub fn encode(&self, text: &str) -> Option<EncodedId> {
        self.ids.get(text).copied()
    }

    /// Returns the string behind `id`, or `default` for unknown ids.
    #[must_use]
    pub fn decode<'a>(&'a self, id: EncodedId, default: &'a str) -> &'a str {
        self.strings
            .get(id as usize)
            .map_or(default, String::as_str)
    }

    /// Number of distinct strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true when nothing has been fitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterates over strings in id order.
    pub fn iter(&self) -> impl Iterator<Item = (EncodedId, &str)> + '_ {
        (0..).zip(self.strings.iter().map(String::as_str))
    }

    /// Loads a table previously written by [`IntegerEncoder::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        serialization::load_encoder(path)
    }

    /// Writes the table atomically to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        serialization::save_encoder(self, path)
    }
}
