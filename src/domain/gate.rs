//! Ambient change gate
//!
//! A full signature scan strobes four excitations with three settle delays
//! each. Every poll first does one raw photodiode read with all excitation
//! off: open squares are skipped, squares that just opened are emptied
//! without a scan, and only covered squares are scanned.
//!
//! A piece covering the photodiode reads darker than the open square:
//! a reading at or below the threshold means "covered". The threshold is an
//! absolute ADC value, so it depends on the room lighting the board was set
//! up in.

/// Threshold used on the v1 square PCB
pub const DEFAULT_GATE_THRESHOLD: u16 = 6;

/// Outcome of one gate check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateEvent {
    /// Square is covered: scan and classify it
    Placed,
    /// Square went bright: mark it empty, no scan needed
    Removed,
    NoChange,
}

impl GateEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            GateEvent::Placed => "placed",
            GateEvent::Removed => "removed",
            GateEvent::NoChange => "no change",
        }
    }
}

/// Gate state after the latest check
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateState {
    /// Nothing to do
    #[default]
    Settled,
    /// The latest check saw a covered or newly opened square; the caller
    /// owes a scan or a clear
    Transitioning,
}

/// Per-square change detector
///
/// Any covered reading is `Placed`, whatever came before, so a square that
/// stays covered is re-scanned every poll and a scan taken while a hand was
/// still over it gets corrected on the next one. An upward crossing is
/// `Removed`; an open square that stays open is `NoChange`. A fresh gate has
/// no baseline and treats the square as open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AmbientChangeGate {
    baseline: Option<u16>,
    state: GateState,
}

impl AmbientChangeGate {
    pub const fn new() -> Self {
        Self {
            baseline: None,
            state: GateState::Settled,
        }
    }

    /// Gate with a known starting reading
    pub const fn with_baseline(baseline: u16) -> Self {
        Self {
            baseline: Some(baseline),
            state: GateState::Settled,
        }
    }

    pub const fn baseline(&self) -> Option<u16> {
        self.baseline
    }

    pub const fn state(&self) -> GateState {
        self.state
    }

    /// Feed one ambient-only reading
    ///
    /// The baseline is replaced by `reading` whatever the outcome.
    pub fn check(&mut self, reading: u16, threshold: u16) -> GateEvent {
        let was_covered = self.baseline.is_some_and(|b| b <= threshold);
        let is_covered = reading <= threshold;

        let event = match (was_covered, is_covered) {
            (_, true) => GateEvent::Placed,
            (true, false) => GateEvent::Removed,
            (false, false) => GateEvent::NoChange,
        };

        self.baseline = Some(reading);
        self.state = match event {
            GateEvent::NoChange => GateState::Settled,
            GateEvent::Placed | GateEvent::Removed => GateState::Transitioning,
        };
        event
    }
}
