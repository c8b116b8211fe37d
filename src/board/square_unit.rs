//! One instrumented square

use crate::config::{SquareConfig, SquareWiring};
use crate::domain::gate::{AmbientChangeGate, GateEvent};
use crate::domain::polarity::{PieceSide, Polarity};
use crate::domain::signature::Signature;
use crate::domain::square::{SquareContent, SquareName, SquareState};
use crate::domain::sticker::{Label, StickerClassifier, EMPTY_LABEL};
use crate::ports::BoardHal;
use crate::sensing::{MagneticPolarityDetector, SignatureReader};

/// A square: its wiring, its gate, and what it last saw
///
/// The excitation bus and the classifier are shared between squares, so
/// the operations borrow them from the caller instead of owning copies.
#[derive(Clone, Debug)]
pub struct SquareUnit {
    name: SquareName,
    wiring: SquareWiring,
    hall: MagneticPolarityDetector,
    gate: AmbientChangeGate,
    state: SquareState,
}

impl SquareUnit {
    pub fn new(config: &SquareConfig) -> Self {
        Self {
            name: config.name.clone(),
            wiring: config.wiring,
            hall: MagneticPolarityDetector::new(config.wiring.hall, config.polarity),
            gate: AmbientChangeGate::new(),
            state: SquareState::default(),
        }
    }

    pub fn name(&self) -> &SquareName {
        &self.name
    }

    pub fn wiring(&self) -> &SquareWiring {
        &self.wiring
    }

    pub fn state(&self) -> &SquareState {
        &self.state
    }

    pub fn gate(&self) -> &AmbientChangeGate {
        &self.gate
    }

    /// Full R/G/B/IR scan
    pub fn read_signature<H: BoardHal>(&self, hal: &mut H, reader: &SignatureReader) -> Signature {
        reader.read_signature(hal, &self.wiring)
    }

    /// Scan and classify
    pub fn classify<'c, H: BoardHal>(
        &self,
        hal: &mut H,
        reader: &SignatureReader,
        classifier: &'c StickerClassifier,
    ) -> &'c Label {
        let signature = self.read_signature(hal, reader);
        classifier.classify(&signature)
    }

    pub fn notation_for(&self, classifier: &StickerClassifier, label: &str) -> char {
        classifier.notation_for(label)
    }

    pub fn read_polarity<H: BoardHal>(&self, hal: &mut H) -> Polarity {
        self.hall.read_polarity(hal)
    }

    /// Cheap ambient-only read fed through this square's gate
    pub fn check_ambient_change<H: BoardHal>(
        &mut self,
        hal: &mut H,
        reader: &SignatureReader,
        threshold: u16,
    ) -> GateEvent {
        let reading = reader.read_ambient(hal, &self.wiring);
        let event = self.gate.check(reading, threshold);
        if event != GateEvent::NoChange {
            trace!("{}: {} (ambient={})", self.name.as_str(), event.as_str(), reading);
        }
        event
    }

    /// Classify whatever is on the square and cache it
    pub fn scan<H: BoardHal>(
        &mut self,
        hal: &mut H,
        reader: &SignatureReader,
        classifier: &StickerClassifier,
        tick: u32,
    ) -> &SquareState {
        let signature = self.read_signature(hal, reader);
        self.state.content = match classifier.nearest(&signature) {
            Some(m) => {
                trace!("{}: {} (d={})", self.name.as_str(), m.label.as_str(), m.distance);
                if m.label == EMPTY_LABEL {
                    SquareContent::Empty
                } else {
                    SquareContent::Sticker(m.label.clone())
                }
            }
            None => {
                warn!("{}: no sticker matched", self.name.as_str());
                SquareContent::Unresolved
            }
        };
        self.state.side = PieceSide::from(self.read_polarity(hal));
        self.state.scanned_at = tick;
        &self.state
    }

    /// Piece lifted: empty the square without scanning
    pub fn clear(&mut self, tick: u32) {
        self.state.content = SquareContent::Empty;
        self.state.side = PieceSide::None;
        self.state.scanned_at = tick;
    }

    /// Notation of the cached content
    pub fn notation(&self, classifier: &StickerClassifier) -> char {
        self.notation_for(classifier, self.state.content.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{SimPiece, SimulatedBoard};
    use crate::config::ColorBus;
    use crate::domain::{Calibration, ClassifierConfig, PolarityThresholds, DEFAULT_GATE_THRESHOLD};
    use crate::ports::Channel;

    fn setup() -> (SquareUnit, SimulatedBoard, SignatureReader, StickerClassifier) {
        let wiring = SquareWiring {
            photodiode: Channel(14),
            led_enable: Channel(12),
            hall: Channel(18),
        };
        let config = SquareConfig {
            name: SquareName::new("e4").unwrap(),
            wiring,
            polarity: PolarityThresholds::PCB_V1,
        };
        let mut hal = SimulatedBoard::new();
        hal.add_square(wiring, ColorBus::PCB_V1, 40);
        let classifier = Calibration::PCB_V1
            .classifier(ClassifierConfig::default())
            .unwrap();
        (SquareUnit::new(&config), hal, SignatureReader::default(), classifier)
    }

    #[test]
    fn test_classify_placed_sticker() {
        let (unit, mut hal, reader, classifier) = setup();
        hal.place(unit.wiring().photodiode, SimPiece::new([5, 65, 110, 659], 600));
        let label = unit.classify(&mut hal, &reader, &classifier);
        assert_eq!(label, "Blue");
        assert_eq!(unit.notation_for(&classifier, label.as_str()), 'Q');
    }

    #[test]
    fn test_scan_caches_content_and_side() {
        let (mut unit, mut hal, reader, classifier) = setup();
        hal.place(unit.wiring().photodiode, SimPiece::new([3, 4, 7, 494], 200));
        let state = unit.scan(&mut hal, &reader, &classifier, 7).clone();
        assert_eq!(state.content, SquareContent::Sticker(Label::new("Black").unwrap()));
        assert_eq!(state.side, PieceSide::Black);
        assert_eq!(state.scanned_at, 7);
        assert_eq!(unit.notation(&classifier), 'k');
    }

    #[test]
    fn test_empty_sticker_scans_as_empty() {
        let (mut unit, mut hal, reader, classifier) = setup();
        hal.place(unit.wiring().photodiode, SimPiece::new([0, 0, 0, 478], 400));
        unit.scan(&mut hal, &reader, &classifier, 1);
        assert!(unit.state().content.is_empty());
        assert_eq!(unit.notation(&classifier), '-');
    }

    #[test]
    fn test_gate_through_unit() {
        let (mut unit, mut hal, reader, _) = setup();
        let t = DEFAULT_GATE_THRESHOLD;
        assert_eq!(unit.check_ambient_change(&mut hal, &reader, t), GateEvent::NoChange);
        hal.place(unit.wiring().photodiode, SimPiece::new([72, 5, 9, 716], 600));
        assert_eq!(unit.check_ambient_change(&mut hal, &reader, t), GateEvent::Placed);
        assert_eq!(unit.check_ambient_change(&mut hal, &reader, t), GateEvent::NoChange);
        hal.remove(unit.wiring().photodiode);
        assert_eq!(unit.check_ambient_change(&mut hal, &reader, t), GateEvent::Removed);
    }
}
