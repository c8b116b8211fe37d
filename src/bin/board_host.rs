//! Sticker Board Host CLI
//!
//! Runs on your PC. Listens to the board over USB serial and prints the
//! FEN placement of every report the board sends, or drives the whole
//! sensing pipeline against a simulated board.
//!
//! A board split across several controllers is read by passing `--port`
//! once per controller. Reports are merged by square name, the latest
//! report for a square wins, and one combined placement is printed per
//! frame received.
//!
//! ## Usage
//!
//! ```bash
//! # List available serial ports
//! cargo run --features std --bin board_host -- --list-ports
//!
//! # Listen to the board (auto-detects a USB serial device)
//! cargo run --features std --bin board_host
//!
//! # Listen on a specific port / baud rate
//! cargo run --features std --bin board_host -- --port /dev/ttyACM0 --baud 9600
//!
//! # Two controllers, one board
//! cargo run --features std --bin board_host -- --port /dev/ttyACM0 --port /dev/ttyACM1
//!
//! # No hardware: play a short game on the simulated board
//! RUST_LOG=debug cargo run --features std --bin board_host -- --simulate
//! ```

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use sticker_board::adapters::{SimPiece, SimulatedBoard};
use sticker_board::board_protocol::{
    decode_frame, encode_frame, BoardReport, SquareReport, MAX_FRAME_LEN,
};
use sticker_board::config::{BoardConfig, SquareWiring};
use sticker_board::domain::{Calibration, ClassifierConfig, PolarityThresholds, SquareName};
use sticker_board::ports::Channel;
use sticker_board::BoardStateAggregator;

const DEFAULT_BAUD: u32 = 115_200;

/// Hall outputs used for simulated magnets
const SIM_HALL_WHITE: u16 = 600;
const SIM_HALL_BLACK: u16 = 200;

/// Open-square room light in the simulation
const SIM_AMBIENT: u16 = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--list-ports") {
        list_ports();
        return Ok(());
    }

    if args.iter().any(|a| a == "--simulate") {
        return simulate();
    }

    let baud = match option_value(&args, "--baud") {
        Some(v) => v.parse::<u32>().map_err(|_| format!("Invalid baud rate: {}", v))?,
        None => DEFAULT_BAUD,
    };

    let mut port_names = option_values(&args, "--port");
    if port_names.is_empty() {
        match find_usb_port() {
            Some(name) => port_names.push(name),
            None => {
                eprintln!("Error: No board found");
                eprintln!("Use --list-ports to see available ports");
                eprintln!("Or specify port with --port <PORT>");
                return Err("No device found".into());
            }
        }
    }

    let (tx, rx) = mpsc::channel();
    for port_name in port_names {
        let mut port = open_port(&port_name, baud)?;
        let tx = tx.clone();
        thread::spawn(move || {
            if let Err(e) = listen(&mut *port, &tx) {
                log::error!("{}: {}", port_name, e);
            }
        });
    }
    drop(tx);

    // every listener gone means every port failed
    let mut merged = MergedBoard::default();
    for report in rx {
        merged.apply(&report);
        print_report(&merged.report(report.tick));
    }
    Err("all ports closed".into())
}

/// Every value following `flag`, in order
fn option_values(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
        .collect()
}

fn option_value(args: &[String], flag: &str) -> Option<String> {
    option_values(args, flag).into_iter().next()
}

fn open_port(port_name: &str, baud: u32) -> Result<Box<dyn serialport::SerialPort>, Box<dyn std::error::Error>> {
    // On Windows, COM ports >= 10 need the \\.\COMxx format
    #[cfg(target_os = "windows")]
    let port_name = &if port_name.starts_with("COM") && !port_name.starts_with(r"\\") {
        format!(r"\\.\{}", port_name)
    } else {
        port_name.to_string()
    };

    log::info!("connecting to {} at {} baud", port_name, baud);
    let mut port = serialport::new(port_name, baud)
        .timeout(Duration::from_millis(1000))
        .flow_control(serialport::FlowControl::None)
        .open()?;

    // Some CDC devices wait for DTR before sending
    port.write_data_terminal_ready(true)?;
    println!("Connected to {}. Waiting for board reports (Ctrl-C to quit)", port_name);
    Ok(port)
}

/// Read COBS frames forever, forwarding each decoded report
fn listen<R: Read + ?Sized>(
    port: &mut R,
    reports: &mpsc::Sender<BoardReport>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut rx_buf = [0u8; 256];
    let mut frame: Vec<u8> = Vec::with_capacity(MAX_FRAME_LEN);

    loop {
        let n = match port.read(&mut rx_buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e.into()),
        };

        for &byte in &rx_buf[..n] {
            frame.push(byte);
            if byte != 0x00 {
                if frame.len() > MAX_FRAME_LEN {
                    log::warn!("frame exceeds {} bytes, resynchronizing", MAX_FRAME_LEN);
                    frame.clear();
                }
                continue;
            }

            match decode_frame(&mut frame) {
                Ok(report) => {
                    if reports.send(report).is_err() {
                        return Ok(());
                    }
                }
                Err(e) => log::warn!("dropping malformed frame ({} bytes): {}", frame.len(), e),
            }
            frame.clear();
        }
    }
}

/// Latest known state of every square seen on any port
#[derive(Default)]
struct MergedBoard {
    squares: BTreeMap<String, SquareReport>,
}

impl MergedBoard {
    fn apply(&mut self, report: &BoardReport) {
        for sq in &report.squares {
            self.squares.insert(sq.name.as_str().to_string(), sq.clone());
        }
    }

    /// Combined report; squares beyond one report's capacity are dropped
    fn report(&self, tick: u32) -> BoardReport {
        let mut merged = BoardReport::new(tick);
        for sq in self.squares.values() {
            if merged.squares.push(sq.clone()).is_err() {
                log::warn!("more squares than one report holds, {} ignored", sq.name);
            }
        }
        merged
    }
}

fn print_report(report: &BoardReport) {
    println!("[{:>6}] {}", report.tick, report.placement_fen());
    for sq in &report.squares {
        log::debug!("  {} {} {}", sq.name, sq.notation, sq.side.as_str());
    }
}

fn list_ports() {
    println!("Available serial ports:");
    match serialport::available_ports() {
        Ok(ports) => {
            if ports.is_empty() {
                println!("  (none)");
            }
            for port in ports {
                print!("  {}", port.port_name);
                match &port.port_type {
                    serialport::SerialPortType::UsbPort(info) => {
                        println!(" - USB (VID: 0x{:04x}, PID: 0x{:04x})", info.vid, info.pid);
                        if let Some(ref manufacturer) = info.manufacturer {
                            println!("      Manufacturer: {}", manufacturer);
                        }
                        if let Some(ref product) = info.product {
                            println!("      Product: {}", product);
                        }
                    }
                    serialport::SerialPortType::BluetoothPort => println!(" - Bluetooth"),
                    serialport::SerialPortType::PciPort => println!(" - PCI"),
                    serialport::SerialPortType::Unknown => println!(" - Unknown"),
                }
            }
        }
        Err(e) => {
            eprintln!("Error listing ports: {}", e);
        }
    }
}

/// First USB serial device; the board enumerates as a plain CDC port
fn find_usb_port() -> Option<String> {
    serialport::available_ports()
        .ok()?
        .into_iter()
        .find(|port| matches!(port.port_type, serialport::SerialPortType::UsbPort(_)))
        .map(|port| port.port_name)
}

// ============================================================================
// Simulation
// ============================================================================

/// Wiring of square `i` on the simulated 8x8 board
///
/// Lines 0..8 are left to the shared excitation bus.
fn sim_wiring(i: u8) -> SquareWiring {
    SquareWiring {
        photodiode: Channel(8 + i),
        led_enable: Channel(72 + i),
        hall: Channel(136 + i),
    }
}

/// Simulated piece wearing the sticker that maps to `notation`
fn sim_piece(calibration: &Calibration, notation: char) -> Option<SimPiece> {
    let (label, _) = calibration.notation.iter().find(|(_, c)| *c == notation)?;
    let (_, reflectance) = calibration.stickers.iter().find(|(l, _)| l == label)?;
    let hall = if notation.is_ascii_uppercase() {
        SIM_HALL_WHITE
    } else {
        SIM_HALL_BLACK
    };
    Some(SimPiece::new(*reflectance, hall))
}

fn photodiode_of(square: &str) -> Result<Channel, Box<dyn std::error::Error>> {
    let (file, rank) = SquareName::new(square)
        .and_then(|n| n.coords())
        .ok_or_else(|| format!("not a board square: {}", square))?;
    Ok(sim_wiring(rank * 8 + file).photodiode)
}

fn simulate() -> Result<(), Box<dyn std::error::Error>> {
    let calibration = Calibration::PCB_V1;
    let mut config = BoardConfig::default();
    let mut hal = SimulatedBoard::new();

    for rank in 0..8u8 {
        for file in 0..8u8 {
            let name = SquareName::from_coords(file, rank).ok_or("bad coordinates")?;
            let wiring = sim_wiring(rank * 8 + file);
            config.add_square(name.as_str(), wiring, PolarityThresholds::PCB_V1)?;
            hal.add_square(wiring, config.bus, SIM_AMBIENT);
        }
    }

    let classifier = calibration.classifier(ClassifierConfig::default())?;
    let mut board = BoardStateAggregator::new(&config, classifier)?;

    // Set up the opening position before the first poll
    let back_rank = ['R', 'N', 'B', 'Q', 'K', 'B', 'N', 'R'];
    for (file, &white) in back_rank.iter().enumerate() {
        let file_char = char::from(b'a' + file as u8);
        let black = white.to_ascii_lowercase();
        for (rank, notation) in [(1, white), (2, 'P'), (7, 'p'), (8, black)] {
            let square = format!("{}{}", file_char, rank);
            let piece = sim_piece(&calibration, notation).ok_or("no sticker for piece")?;
            hal.place(photodiode_of(&square)?, piece);
        }
    }

    let summary = board.poll(&mut hal);
    log::info!("initial poll: {} pieces detected", summary.relabeled);
    emit(&board)?;

    // 1. e4 e5 2. Nf3 Nc6, each move lifts then drops a piece
    let moves = [("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6")];
    for (from, to) in moves {
        let piece = hal
            .remove(photodiode_of(from)?)
            .ok_or_else(|| format!("no piece on {}", from))?;
        let lifted = board.poll(&mut hal);
        log::debug!("lift {}: {} removed, {} rescanned", from, lifted.removed, lifted.placed);

        hal.place(photodiode_of(to)?, piece);
        let dropped = board.poll(&mut hal);
        log::debug!("drop {}: {} relabeled", to, dropped.relabeled);

        emit(&board)?;
    }

    println!("Simulated scan time per square: {} us", board.reader().scan_duration_us());
    println!("Total simulated settle time: {} us", hal.elapsed_us());
    Ok(())
}

/// Encode the board's report the way firmware sends it, then decode and print
fn emit(board: &BoardStateAggregator) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = [0u8; MAX_FRAME_LEN];
    let frame = encode_frame(&board.report(), &mut buf)?;
    log::debug!("frame: {} bytes", frame.len());
    let report = decode_frame(frame)?;
    print_report(&report);
    Ok(())
}

fn print_help() {
    println!("board_host - read sticker board reports");
    println!();
    println!("Options:");
    println!("  --list-ports      List available serial ports");
    println!("  --port <PORT>     Serial port to listen on, repeat to merge several");
    println!("                    controllers into one board (default: first USB port)");
    println!("  --baud <RATE>     Baud rate (default: {})", DEFAULT_BAUD);
    println!("  --simulate        Run the pipeline against a simulated board");
    println!("  --help            Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sticker_board::domain::PieceSide;

    fn report(tick: u32, squares: &[(&str, char)]) -> BoardReport {
        let mut report = BoardReport::new(tick);
        for (name, notation) in squares {
            report
                .squares
                .push(SquareReport {
                    name: SquareName::new(name).unwrap(),
                    notation: *notation,
                    side: PieceSide::None,
                })
                .unwrap();
        }
        report
    }

    #[test]
    fn test_repeated_port_flags() {
        let args: Vec<String> = [
            "board_host",
            "--port",
            "/dev/ttyACM0",
            "--baud",
            "9600",
            "--port",
            "/dev/ttyACM1",
        ]
        .iter()
        .map(|a| a.to_string())
        .collect();
        assert_eq!(option_values(&args, "--port"), ["/dev/ttyACM0", "/dev/ttyACM1"]);
        assert_eq!(option_value(&args, "--baud").as_deref(), Some("9600"));
        assert!(option_values(&args, "--list-ports").is_empty());
    }

    #[test]
    fn test_regions_merge_into_one_board() {
        let mut merged = MergedBoard::default();
        // white half on one controller, black half on another
        merged.apply(&report(7, &[("e1", 'K'), ("e2", 'P')]));
        merged.apply(&report(3, &[("e8", 'k'), ("e7", 'p')]));
        assert_eq!(merged.report(3).placement_fen().as_str(), "4k3/4p3/8/8/8/8/4P3/4K3");

        // the latest report for a square wins
        merged.apply(&report(8, &[("e2", '-'), ("e4", 'P')]));
        let combined = merged.report(8);
        assert_eq!(combined.tick, 8);
        assert_eq!(combined.squares.len(), 5);
        assert_eq!(combined.placement_fen().as_str(), "4k3/4p3/8/8/4P3/8/8/4K3");
    }
}
