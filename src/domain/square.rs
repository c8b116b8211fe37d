//! Square identity and cached state

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::domain::polarity::PieceSide;
use crate::domain::sticker::{Label, EMPTY_LABEL, UNRESOLVED_LABEL};

/// Maximum length of a square name
pub const MAX_SQUARE_NAME_LEN: usize = 4;

/// Square name, e.g. `e4`
///
/// Any short ASCII alphanumeric name is accepted; algebraic names (`a1` to
/// `h8`) additionally have board coordinates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SquareName(String<MAX_SQUARE_NAME_LEN>);

impl SquareName {
    /// Parse a name; `None` if empty, too long or not alphanumeric
    pub fn new(name: &str) -> Option<Self> {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        String::try_from(name).ok().map(Self)
    }

    /// Algebraic square from zero-based file and rank
    pub fn from_coords(file: u8, rank: u8) -> Option<Self> {
        if file >= 8 || rank >= 8 {
            return None;
        }
        let mut s = String::new();
        s.push(char::from(b'a' + file)).ok()?;
        s.push(char::from(b'1' + rank)).ok()?;
        Some(Self(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Zero-based `(file, rank)` for algebraic names
    pub fn coords(&self) -> Option<(u8, u8)> {
        match self.0.as_bytes() {
            &[f @ b'a'..=b'h', r @ b'1'..=b'8'] => Some((f - b'a', r - b'1')),
            _ => None,
        }
    }
}

impl fmt::Display for SquareName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the board believes is on a square
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareContent {
    #[default]
    Empty,
    /// Classified sticker
    Sticker(Label),
    /// Scan ran but produced no label
    ///
    /// Only reachable with an empty sticker table, which
    /// `StickerClassifier::new` already rejects; no runtime path leads here
    /// with a validated classifier.
    Unresolved,
}

impl SquareContent {
    /// Label used for notation lookup
    pub fn label(&self) -> &str {
        match self {
            SquareContent::Empty => EMPTY_LABEL,
            SquareContent::Sticker(label) => label.as_str(),
            SquareContent::Unresolved => UNRESOLVED_LABEL,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SquareContent::Empty)
    }
}

/// Per-square state owned by the poll loop
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SquareState {
    /// Last known content
    pub content: SquareContent,
    /// Side from the magnet at the last scan
    pub side: PieceSide,
    /// Poll tick of the last scan (0 = never scanned)
    pub scanned_at: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_name_parsing() {
        assert_eq!(SquareName::new("e4").unwrap().coords(), Some((4, 3)));
        assert_eq!(SquareName::new("A0").unwrap().coords(), None);
        assert!(SquareName::new("").is_none());
        assert!(SquareName::new("e-4").is_none());
        assert!(SquareName::new("toolong").is_none());
    }

    #[test]
    fn test_from_coords_round_trip() {
        let name = SquareName::from_coords(7, 7).unwrap();
        assert_eq!(name.as_str(), "h8");
        assert_eq!(name.coords(), Some((7, 7)));
        assert!(SquareName::from_coords(8, 0).is_none());
    }

    #[test]
    fn test_content_labels() {
        assert_eq!(SquareContent::default().label(), EMPTY_LABEL);
        assert_eq!(SquareContent::Unresolved.label(), UNRESOLVED_LABEL);
        let red = SquareContent::Sticker(Label::new("Red").unwrap());
        assert_eq!(red.label(), "Red");
        assert!(!red.is_empty());
    }
}
