//! Board report protocol shared by the board and the host CLI
//!
//! A report is a snapshot of every configured square, serialized with
//! `postcard` and framed with COBS so a byte stream can be resynchronized
//! on the zero delimiter.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::config::MAX_SQUARES;
use crate::domain::calibration::EMPTY_NOTATION;
use crate::domain::polarity::PieceSide;
use crate::domain::square::SquareName;
use crate::domain::sticker::UNKNOWN_NOTATION;

/// Upper bound on one encoded frame, delimiter included
pub const MAX_FRAME_LEN: usize = 768;

/// Longest FEN placement field: 64 pieces plus 7 separators
pub const MAX_FEN_LEN: usize = 72;

/// One square in a report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareReport {
    pub name: SquareName,
    pub notation: char,
    pub side: PieceSide,
}

/// Snapshot of the board
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardReport {
    /// Aggregator tick the snapshot was taken at
    pub tick: u32,
    /// Squares in configured order
    pub squares: Vec<SquareReport, MAX_SQUARES>,
}

impl BoardReport {
    pub fn new(tick: u32) -> Self {
        Self {
            tick,
            squares: Vec::new(),
        }
    }

    /// Notation of a named square, if it is part of the report
    pub fn notation_of(&self, name: &str) -> Option<char> {
        self.squares
            .iter()
            .find(|sq| sq.name.as_str() == name)
            .map(|sq| sq.notation)
    }

    /// FEN piece-placement field, rank 8 first
    ///
    /// Squares that are not named `a1`..`h8`, or missing from the report,
    /// count as empty. A non-ASCII notation off the wire is rendered as
    /// [`UNKNOWN_NOTATION`] so every square stays one byte.
    pub fn placement_fen(&self) -> String<MAX_FEN_LEN> {
        let mut grid = [[EMPTY_NOTATION; 8]; 8];
        for sq in &self.squares {
            if let Some((file, rank)) = sq.name.coords() {
                grid[usize::from(rank)][usize::from(file)] = if sq.notation.is_ascii() {
                    sq.notation
                } else {
                    UNKNOWN_NOTATION
                };
            }
        }

        // at most 8 bytes per rank plus separators, so pushes cannot overflow
        let mut fen = String::new();
        for (i, row) in grid.iter().rev().enumerate() {
            if i > 0 {
                let _ = fen.push('/');
            }
            let mut run = 0u8;
            for &cell in row {
                if cell == EMPTY_NOTATION {
                    run += 1;
                    continue;
                }
                if run > 0 {
                    let _ = fen.push(char::from(b'0' + run));
                    run = 0;
                }
                let _ = fen.push(cell);
            }
            if run > 0 {
                let _ = fen.push(char::from(b'0' + run));
            }
        }
        fen
    }
}

/// Serialize a report into `buf` as one COBS frame ending in `0x00`
pub fn encode_frame<'a>(report: &BoardReport, buf: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
    postcard::to_slice_cobs(report, buf)
}

/// Decode one COBS frame in place
pub fn decode_frame(frame: &mut [u8]) -> Result<BoardReport, postcard::Error> {
    postcard::from_bytes_cobs(frame)
}
