//! Sticker tables and nearest-neighbor classification
//!
//! Each piece carries a colored sticker on its base. A calibrated table maps
//! sticker labels to reference signatures; a scan is classified as the label
//! whose reference is closest under a weighted squared Euclidean distance.
//!
//! The table is a closed world: the classifier always answers with *some*
//! label, however far the scan is from every reference. A piece with an
//! unknown sticker is reported as its nearest neighbor. This is a known
//! precision limit of the approach and is left visible to callers through
//! [`StickerMatch::distance`].

use core::fmt;

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::domain::signature::{ChannelPolicy, Signature, SIGNATURE_CHANNELS};
use crate::error::ConfigError;

/// Maximum label length in bytes
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum entries in a sticker table or notation map
pub const MAX_STICKERS: usize = 32;

/// Label of the "nothing on the square" entry
pub const EMPTY_LABEL: &str = "Empty";

/// Label reported while a square has no usable classification
pub const UNRESOLVED_LABEL: &str = "Processing";

/// Notation character for labels missing from the notation map
pub const UNKNOWN_NOTATION: char = '?';

/// Sticker label (fixed capacity, no heap)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Label(String<MAX_LABEL_LEN>);

impl Label {
    pub fn new(label: &str) -> Result<Self, ConfigError> {
        String::try_from(label)
            .map(Self)
            .map_err(|_| ConfigError::LabelTooLong {
                len: label.len(),
                max: MAX_LABEL_LEN,
            })
    }

    /// The reserved unresolved label
    pub fn unresolved() -> Self {
        let mut s = String::new();
        // shorter than MAX_LABEL_LEN
        let _ = s.push_str(UNRESOLVED_LABEL);
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// One calibrated sticker
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StickerEntry {
    label: Label,
    reference: Vec<u16, SIGNATURE_CHANNELS>,
}

impl StickerEntry {
    /// Create an entry; the reference must have 3 or 4 channels
    pub fn new(label: &str, reference: &[u16]) -> Result<Self, ConfigError> {
        if ChannelPolicy::for_len(reference.len()).is_none() {
            return Err(ConfigError::UnsupportedChannelCount {
                found: reference.len(),
            });
        }
        let reference = Vec::from_slice(reference).map_err(|_| {
            ConfigError::UnsupportedChannelCount {
                found: reference.len(),
            }
        })?;
        Ok(Self {
            label: Label::new(label)?,
            reference,
        })
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn reference(&self) -> &[u16] {
        &self.reference
    }
}

/// Ordered table of calibrated stickers
///
/// Order matters: on equal distance the earlier entry wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StickerTable {
    entries: Vec<StickerEntry, MAX_STICKERS>,
}

impl StickerTable {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Build a table from `(label, reference)` rows
    pub fn from_rows<R: AsRef<[u16]>>(rows: &[(&str, R)]) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for (label, reference) in rows {
            table.push(label, reference.as_ref())?;
        }
        Ok(table)
    }

    /// Append an entry
    pub fn push(&mut self, label: &str, reference: &[u16]) -> Result<(), ConfigError> {
        let index = self.entries.len();
        if self.entries.iter().any(|e| e.label == label) {
            return Err(ConfigError::DuplicateLabel { index });
        }
        let entry = StickerEntry::new(label, reference)?;
        self.entries
            .push(entry)
            .map_err(|_| ConfigError::TableFull { max: MAX_STICKERS })
    }

    pub fn entries(&self) -> &[StickerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every reference has exactly `policy.len()` channels
    pub fn validate(&self, policy: ChannelPolicy) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyStickerTable);
        }
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.reference.len() != policy.len() {
                return Err(ConfigError::ReferenceLengthMismatch {
                    index,
                    expected: policy.len(),
                    found: entry.reference.len(),
                });
            }
        }
        Ok(())
    }
}

/// Label → board-notation character
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotationMap {
    entries: Vec<(Label, char), MAX_STICKERS>,
}

impl NotationMap {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn from_rows(rows: &[(&str, char)]) -> Result<Self, ConfigError> {
        let mut map = Self::new();
        for (label, notation) in rows {
            map.insert(label, *notation)?;
        }
        Ok(map)
    }

    /// Add a mapping; a label already present is rejected
    ///
    /// Notation must be ASCII: rendered boards are one byte per square.
    pub fn insert(&mut self, label: &str, notation: char) -> Result<(), ConfigError> {
        let index = self.entries.len();
        if !notation.is_ascii() {
            return Err(ConfigError::NonAsciiNotation { index });
        }
        if self.entries.iter().any(|(l, _)| l == label) {
            return Err(ConfigError::DuplicateLabel { index });
        }
        self.entries
            .push((Label::new(label)?, notation))
            .map_err(|_| ConfigError::TableFull { max: MAX_STICKERS })
    }

    /// Notation for `label`, or [`UNKNOWN_NOTATION`] if unmapped
    pub fn notation_for(&self, label: &str) -> char {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, n)| *n)
            .unwrap_or(UNKNOWN_NOTATION)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classifier tuning
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassifierConfig {
    /// Channels compared against the references
    pub policy: ChannelPolicy,
    /// Per-channel distance weights, in signature order; only the first
    /// `policy.len()` are used
    pub weights: [f64; SIGNATURE_CHANNELS],
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            policy: ChannelPolicy::ColorOnly,
            weights: [1.0; SIGNATURE_CHANNELS],
        }
    }
}

impl ClassifierConfig {
    /// Unweighted, with the given channel policy
    pub const fn with_policy(policy: ChannelPolicy) -> Self {
        Self {
            policy,
            weights: [1.0; SIGNATURE_CHANNELS],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (channel, w) in self.weights.iter().enumerate() {
            if !w.is_finite() || *w < 0.0 {
                return Err(ConfigError::InvalidWeight { channel });
            }
        }
        Ok(())
    }
}

/// Result of a nearest-neighbor search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickerMatch<'a> {
    /// Index of the winning entry in the table
    pub index: usize,
    pub label: &'a Label,
    /// Weighted squared distance to the winning reference
    pub distance: f64,
}

/// Nearest-neighbor sticker classifier
///
/// Holds the active table and notation map by value; build one per board
/// (or per calibration) at startup.
#[derive(Clone, Debug)]
pub struct StickerClassifier {
    table: StickerTable,
    notation: NotationMap,
    config: ClassifierConfig,
    unresolved: Label,
}

impl StickerClassifier {
    /// Build a classifier, rejecting tables that don't fit the policy
    pub fn new(
        table: StickerTable,
        notation: NotationMap,
        config: ClassifierConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        table.validate(config.policy)?;
        Ok(Self {
            table,
            notation,
            config,
            unresolved: Label::unresolved(),
        })
    }

    pub fn table(&self) -> &StickerTable {
        &self.table
    }

    pub fn notation(&self) -> &NotationMap {
        &self.notation
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Weighted squared Euclidean distance over the policy's channels
    ///
    /// Both operands must have `policy.len()` values; the table was checked
    /// for this at construction.
    pub fn distance(&self, signature: &Signature, reference: &[u16]) -> f64 {
        let scan = signature.view(self.config.policy);
        debug_assert_eq!(scan.len(), reference.len());
        scan.iter()
            .zip(reference)
            .zip(&self.config.weights)
            .map(|((&a, &b), &w)| {
                let d = i64::from(a) - i64::from(b);
                w * (d * d) as f64
            })
            .sum()
    }

    /// Closest entry; `None` only for an empty table
    pub fn nearest(&self, signature: &Signature) -> Option<StickerMatch<'_>> {
        let mut best: Option<StickerMatch<'_>> = None;
        for (index, entry) in self.table.entries().iter().enumerate() {
            let distance = self.distance(signature, entry.reference());
            // strict `<` keeps the earliest entry on ties
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(StickerMatch {
                    index,
                    label: entry.label(),
                    distance,
                });
            }
        }
        best
    }

    /// Label of the closest entry
    ///
    /// The unresolved fallback is unreachable for a classifier built through
    /// `new`, which refuses empty tables.
    pub fn classify(&self, signature: &Signature) -> &Label {
        match self.nearest(signature) {
            Some(m) => {
                trace!("classified as {} (d={})", m.label.as_str(), m.distance);
                m.label
            }
            None => &self.unresolved,
        }
    }

    /// Notation character for a label
    pub fn notation_for(&self, label: &str) -> char {
        self.notation.notation_for(label)
    }
}
