//! Full poll loop against the simulated board

use sticker_board::adapters::{SimPiece, SimulatedBoard};
use sticker_board::board_protocol::{decode_frame, encode_frame, MAX_FRAME_LEN};
use sticker_board::config::{BoardConfig, SquareWiring};
use sticker_board::domain::{
    Calibration, ChannelPolicy, ClassifierConfig, PieceSide, PolarityThresholds, SquareContent,
};
use sticker_board::ports::Channel;
use sticker_board::BoardStateAggregator;

const WHITE_HALL: u16 = 620;
const BLACK_HALL: u16 = 180;

fn wiring(i: u8) -> SquareWiring {
    SquareWiring {
        photodiode: Channel(8 + i),
        led_enable: Channel(72 + i),
        hall: Channel(136 + i),
    }
}

fn photodiode(square: &str) -> Channel {
    let b = square.as_bytes();
    let (file, rank) = (b[0] - b'a', b[1] - b'1');
    wiring(rank * 8 + file).photodiode
}

fn sticker(label: &str, hall: u16) -> SimPiece {
    let (_, reflectance) = Calibration::PCB_V1
        .stickers
        .iter()
        .find(|(l, _)| *l == label)
        .unwrap();
    SimPiece::new(*reflectance, hall)
}

fn full_board(config: ClassifierConfig) -> (BoardStateAggregator, SimulatedBoard) {
    let mut board_config = BoardConfig::default();
    let mut hal = SimulatedBoard::new();
    for i in 0..64u8 {
        let name = format!("{}{}", char::from(b'a' + i % 8), i / 8 + 1);
        board_config
            .add_square(&name, wiring(i), PolarityThresholds::PCB_V1)
            .unwrap();
        hal.add_square(wiring(i), board_config.bus, 45);
    }
    let classifier = Calibration::PCB_V1.classifier(config).unwrap();
    (
        BoardStateAggregator::new(&board_config, classifier).unwrap(),
        hal,
    )
}

#[test]
fn test_empty_board_renders_empty_fen() {
    let (mut board, mut hal) = full_board(ClassifierConfig::default());
    assert!(!board.poll(&mut hal).changed());
    assert_eq!(board.render_notation().len(), 64);
    assert!(board.render_notation().chars().all(|c| c == '-'));
    assert_eq!(board.report().placement_fen().as_str(), "8/8/8/8/8/8/8/8");
}

#[test]
fn test_play_a_move() {
    let (mut board, mut hal) = full_board(ClassifierConfig::default());
    hal.place(photodiode("e1"), sticker("LightGreen", WHITE_HALL));
    hal.place(photodiode("e2"), sticker("Green", WHITE_HALL));
    hal.place(photodiode("e8"), sticker("Black", BLACK_HALL));
    hal.place(photodiode("d7"), sticker("Red", BLACK_HALL));

    let summary = board.poll(&mut hal);
    assert_eq!((summary.placed, summary.relabeled), (4, 4));
    assert_eq!(
        board.report().placement_fen().as_str(),
        "4k3/3p4/8/8/8/8/4P3/4K3"
    );

    // lift
    let pawn = hal.remove(photodiode("e2")).unwrap();
    let summary = board.poll(&mut hal);
    // the three pieces still standing are rescanned but read the same
    assert_eq!((summary.placed, summary.removed, summary.relabeled), (3, 1, 1));
    assert_eq!(
        board.report().placement_fen().as_str(),
        "4k3/3p4/8/8/8/8/8/4K3"
    );

    // drop
    hal.place(photodiode("e4"), pawn);
    let summary = board.poll(&mut hal);
    assert_eq!((summary.placed, summary.removed, summary.relabeled), (4, 0, 1));
    assert_eq!(
        board.report().placement_fen().as_str(),
        "4k3/3p4/8/8/4P3/8/8/4K3"
    );

    let e4 = &board.squares()[3 * 8 + 4];
    assert_eq!(e4.name().as_str(), "e4");
    assert_eq!(e4.state().side, PieceSide::White);
    assert!(matches!(e4.state().content, SquareContent::Sticker(ref l) if l == "Green"));
}

#[test]
fn test_room_light_change_only_rescans_covered_squares() {
    let (mut board, mut hal) = full_board(ClassifierConfig::default());
    hal.place(photodiode("a1"), sticker("White", WHITE_HALL));
    board.poll(&mut hal);

    // lights dim but open squares stay well above the gate threshold
    for i in 0..64u8 {
        hal.set_ambient(wiring(i).photodiode, 20);
    }
    let before = hal.elapsed_us();
    let summary = board.poll(&mut hal);
    assert!(!summary.changed());
    assert_eq!(summary.placed, 1);
    assert_eq!(
        hal.elapsed_us() - before,
        u64::from(board.reader().scan_duration_us())
    );
    assert_eq!(board.render_notation().chars().next(), Some('R'));
}

#[test]
fn test_four_channel_policy_matches_too() {
    let config = ClassifierConfig::with_policy(ChannelPolicy::ColorAndInfrared);
    let (mut board, mut hal) = full_board(config);
    hal.place(photodiode("h8"), sticker("LightBlue", BLACK_HALL));
    hal.place(photodiode("a8"), sticker("Gold", BLACK_HALL));
    board.poll(&mut hal);
    assert_eq!(
        board.report().placement_fen().as_str(),
        "q6r/8/8/8/8/8/8/8"
    );
}

#[test]
fn test_report_survives_framing() {
    let (mut board, mut hal) = full_board(ClassifierConfig::default());
    hal.place(photodiode("c3"), sticker("Silver", WHITE_HALL));
    hal.place(photodiode("f6"), sticker("Gray", BLACK_HALL));
    board.poll(&mut hal);

    let report = board.report();
    let mut buf = [0u8; MAX_FRAME_LEN];
    let frame = encode_frame(&report, &mut buf).unwrap();
    let decoded = decode_frame(frame).unwrap();

    assert_eq!(decoded, report);
    assert_eq!(decoded.squares.len(), 64);
    assert_eq!(decoded.notation_of("c3"), Some('N'));
    assert_eq!(decoded.notation_of("f6"), Some('n'));
    assert_eq!(decoded.placement_fen().as_str(), "8/8/5n2/8/8/2N5/8/8");
}
