//! Board state aggregator - the poll loop body
//!
//! Gates every square each poll, scans the covered ones, empties the ones
//! that just went bright, and renders the board as one notation string.

use heapless::{String, Vec};

use crate::board::square_unit::SquareUnit;
use crate::board_protocol::{BoardReport, SquareReport};
use crate::config::{BoardConfig, MAX_SQUARES};
use crate::domain::gate::GateEvent;
use crate::domain::sticker::StickerClassifier;
use crate::error::ConfigError;
use crate::ports::BoardHal;
use crate::sensing::SignatureReader;

/// What one poll changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSummary {
    /// Tick this poll ran as
    pub tick: u32,
    /// Covered squares that were scanned
    pub placed: u8,
    /// Squares emptied because a piece left
    pub removed: u8,
    /// Squares whose cached content or side differs from the last poll
    pub relabeled: u8,
}

impl PollSummary {
    /// Whether the board's rendering changed this poll
    pub const fn changed(&self) -> bool {
        self.relabeled > 0
    }
}

/// Cached per-square state plus the shared sensing services
pub struct BoardStateAggregator {
    squares: Vec<SquareUnit, MAX_SQUARES>,
    reader: SignatureReader,
    classifier: StickerClassifier,
    gate_threshold: u16,
    tick: u32,
}

impl BoardStateAggregator {
    /// Validate the board and build the aggregator
    ///
    /// Fails before any hardware is touched if the wiring is inconsistent.
    pub fn new(config: &BoardConfig, classifier: StickerClassifier) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            warn!("board config rejected");
            return Err(e);
        }

        let mut squares = Vec::new();
        for square in config.squares() {
            squares
                .push(SquareUnit::new(square))
                .map_err(|_| ConfigError::TooManySquares { max: MAX_SQUARES })?;
        }

        info!(
            "board ready: {} squares, {} stickers, gate threshold {}",
            squares.len(),
            classifier.table().len(),
            config.gate_threshold
        );

        Ok(Self {
            squares,
            reader: SignatureReader::new(config.bus, config.color_timing, config.ir_timing),
            classifier,
            gate_threshold: config.gate_threshold,
            tick: 0,
        })
    }

    pub fn squares(&self) -> &[SquareUnit] {
        &self.squares
    }

    pub fn classifier(&self) -> &StickerClassifier {
        &self.classifier
    }

    pub fn reader(&self) -> &SignatureReader {
        &self.reader
    }

    /// Number of polls (and forced rescans) run so far
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// One poll cycle
    ///
    /// Squares are visited in configured order and each scan runs to
    /// completion before the next square is touched. Covered squares are
    /// rescanned every poll, so a scan taken while a hand still shadowed the
    /// square is corrected once the piece settles.
    pub fn poll<H: BoardHal>(&mut self, hal: &mut H) -> PollSummary {
        self.tick = self.tick.wrapping_add(1);
        let tick = self.tick;
        let mut summary = PollSummary {
            tick,
            ..PollSummary::default()
        };

        for square in self.squares.iter_mut() {
            let before = (square.state().content.clone(), square.state().side);
            match square.check_ambient_change(hal, &self.reader, self.gate_threshold) {
                GateEvent::Placed => {
                    square.scan(hal, &self.reader, &self.classifier, tick);
                    summary.placed += 1;
                }
                GateEvent::Removed => {
                    square.clear(tick);
                    summary.removed += 1;
                }
                GateEvent::NoChange => continue,
            }
            let state = square.state();
            if state.content != before.0 || state.side != before.1 {
                summary.relabeled += 1;
            }
        }

        if summary.changed() {
            debug!(
                "poll {}: {} relabeled ({} scanned, {} removed)",
                tick,
                summary.relabeled,
                summary.placed,
                summary.removed
            );
        }
        summary
    }

    /// Scan every square regardless of its gate
    ///
    /// Gates keep their baselines; only the cached labels are refreshed.
    pub fn rescan_all<H: BoardHal>(&mut self, hal: &mut H) {
        self.tick = self.tick.wrapping_add(1);
        for square in self.squares.iter_mut() {
            square.scan(hal, &self.reader, &self.classifier, self.tick);
        }
    }

    /// Notation of every square, in configured order
    pub fn render_notation(&self) -> String<MAX_SQUARES> {
        let mut out = String::new();
        for square in &self.squares {
            // one byte per square: NotationMap only holds ASCII and the
            // unknown marker is ASCII
            let _ = out.push(square.notation(&self.classifier));
        }
        out
    }

    /// Snapshot for the host protocol
    pub fn report(&self) -> BoardReport {
        let mut report = BoardReport::new(self.tick);
        for square in &self.squares {
            let _ = report.squares.push(SquareReport {
                name: square.name().clone(),
                notation: square.notation(&self.classifier),
                side: square.state().side,
            });
        }
        report
    }
}
