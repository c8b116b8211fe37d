//! Simulated board adapter
//!
//! Implements `BoardHal` with a light model of the square PCB: each square
//! has a photodiode that sees room light (or the shadow of a piece) plus
//! whatever the lit excitation reflects off the piece's sticker, and a Hall
//! sensor that reads the piece's magnet. Time only advances through
//! `sleep_us`.
//!
//! Used as the test double for every sensing test and by the host's
//! `--simulate` mode. Storage is fixed-capacity so it works in `no_std`.

use heapless::Vec;

use crate::config::{ColorBus, SquareWiring, MAX_SQUARES};
use crate::ports::{BoardHal, Channel};

/// Full scale of the simulated 10-bit ADC
pub const ADC_MAX: u16 = 1023;

/// Hall output with no magnet nearby
pub const HALL_QUIESCENT: u16 = 400;

/// Calls kept in the trace
pub const TRACE_CAPACITY: usize = 256;

const LINES: usize = 256;

/// One recorded HAL call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalCall {
    Digital(Channel, bool),
    Analog(Channel, u8),
    Read(Channel),
    Sleep(u32),
}

/// A piece standing on a simulated square
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SimPiece {
    /// Sticker response at full drive: `[R, G, B, IR]`
    pub reflectance: [u16; 4],
    /// Hall sensor output with this piece's magnet on the square
    pub hall: u16,
}

impl SimPiece {
    pub const fn new(reflectance: [u16; 4], hall: u16) -> Self {
        Self { reflectance, hall }
    }
}

#[derive(Clone, Copy, Debug)]
struct SimSquare {
    wiring: SquareWiring,
    bus: ColorBus,
    /// Photodiode reading of the open square, excitation off
    ambient: u16,
    /// Ambient added per ADC conversion of this photodiode
    drift: u16,
    reads: u16,
    piece: Option<SimPiece>,
}

/// In-memory board implementing `BoardHal`
#[derive(Clone, Debug)]
pub struct SimulatedBoard {
    digital: [bool; LINES],
    analog: [u8; LINES],
    squares: Vec<SimSquare, MAX_SQUARES>,
    covered_ambient: u16,
    elapsed_us: u64,
    trace: Vec<HalCall, TRACE_CAPACITY>,
    trace_overflowed: bool,
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self {
            digital: [false; LINES],
            analog: [0; LINES],
            squares: Vec::new(),
            covered_ambient: 2,
            elapsed_us: 0,
            trace: Vec::new(),
            trace_overflowed: false,
        }
    }

    /// Register a square; `ambient` is its open-square dark reading
    ///
    /// Returns `false` when the board is full.
    pub fn add_square(&mut self, wiring: SquareWiring, bus: ColorBus, ambient: u16) -> bool {
        self.squares
            .push(SimSquare {
                wiring,
                bus,
                ambient,
                drift: 0,
                reads: 0,
                piece: None,
            })
            .is_ok()
    }

    /// Put a piece on the square read by `photodiode` (replacing any)
    pub fn place(&mut self, photodiode: Channel, piece: SimPiece) {
        if let Some(sq) = self.square_mut(photodiode) {
            sq.piece = Some(piece);
        }
    }

    /// Lift the piece off the square read by `photodiode`
    pub fn remove(&mut self, photodiode: Channel) -> Option<SimPiece> {
        self.square_mut(photodiode).and_then(|sq| sq.piece.take())
    }

    pub fn piece(&self, photodiode: Channel) -> Option<SimPiece> {
        self.squares
            .iter()
            .find(|sq| sq.wiring.photodiode == photodiode)
            .and_then(|sq| sq.piece)
    }

    /// Change the open-square ambient level (room lights)
    pub fn set_ambient(&mut self, photodiode: Channel, ambient: u16) {
        if let Some(sq) = self.square_mut(photodiode) {
            sq.ambient = ambient;
        }
    }

    /// Make ambient rise by `step` on every conversion of `photodiode`
    pub fn set_ambient_drift(&mut self, photodiode: Channel, step: u16) {
        if let Some(sq) = self.square_mut(photodiode) {
            sq.drift = step;
            sq.reads = 0;
        }
    }

    /// Dark reading of a square shadowed by a piece
    pub fn covered_ambient(&self) -> u16 {
        self.covered_ambient
    }

    pub fn set_covered_ambient(&mut self, level: u16) {
        self.covered_ambient = level;
    }

    pub fn digital(&self, channel: Channel) -> bool {
        self.digital[usize::from(channel.0)]
    }

    pub fn analog(&self, channel: Channel) -> u8 {
        self.analog[usize::from(channel.0)]
    }

    /// Simulated time spent in `sleep_us`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Recorded calls, oldest first (stops recording when full)
    pub fn trace(&self) -> &[HalCall] {
        &self.trace
    }

    pub fn trace_overflowed(&self) -> bool {
        self.trace_overflowed
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
        self.trace_overflowed = false;
    }

    fn record(&mut self, call: HalCall) {
        if self.trace.push(call).is_err() {
            self.trace_overflowed = true;
        }
    }

    fn square_mut(&mut self, photodiode: Channel) -> Option<&mut SimSquare> {
        self.squares
            .iter_mut()
            .find(|sq| sq.wiring.photodiode == photodiode)
    }

    /// Light reaching a square's photodiode right now
    fn photodiode_level(&self, sq: &SimSquare) -> u32 {
        let mut level = match sq.piece {
            Some(_) => u32::from(self.covered_ambient),
            None => u32::from(sq.ambient),
        };
        level += u32::from(sq.drift) * u32::from(sq.reads);

        let Some(piece) = sq.piece else {
            return level;
        };
        let bus = sq.bus;
        if self.digital(sq.wiring.led_enable) {
            let dark = u32::from(bus.drive.dark());
            for (i, line) in [bus.red, bus.green, bus.blue].into_iter().enumerate() {
                // drive strength 0..=255 away from the dark level
                let strength = u32::from(self.analog(line)).abs_diff(dark);
                level += u32::from(piece.reflectance[i]) * strength / 255;
            }
        }
        if self.digital(bus.ir_emitter) {
            level += u32::from(piece.reflectance[3]);
        }
        level
    }
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardHal for SimulatedBoard {
    fn set_digital_output(&mut self, channel: Channel, high: bool) {
        self.digital[usize::from(channel.0)] = high;
        self.record(HalCall::Digital(channel, high));
    }

    fn set_analog_output(&mut self, channel: Channel, level: u8) {
        self.analog[usize::from(channel.0)] = level;
        self.record(HalCall::Analog(channel, level));
    }

    fn read_analog_input(&mut self, channel: Channel) -> u16 {
        self.record(HalCall::Read(channel));

        if let Some(idx) = self
            .squares
            .iter()
            .position(|sq| sq.wiring.photodiode == channel)
        {
            let level = self.photodiode_level(&self.squares[idx]);
            self.squares[idx].reads = self.squares[idx].reads.wrapping_add(1);
            return level.min(u32::from(ADC_MAX)) as u16;
        }

        if let Some(sq) = self.squares.iter().find(|sq| sq.wiring.hall == channel) {
            return sq.piece.map_or(HALL_QUIESCENT, |p| p.hall);
        }

        0
    }

    fn sleep_us(&mut self, us: u32) {
        self.elapsed_us += u64::from(us);
        self.record(HalCall::Sleep(us));
    }
}
