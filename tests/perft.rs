use std::str::FromStr;

use chesscore::board::{self, MoveGen, Position};

fn init() {
    board::init();
}

fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves: Vec<_> = MoveGen::new_legal(pos).collect();
    let mut count = 0u64;
    for mv in moves {
        pos.apply_move(mv);
        count += perft(pos, depth - 1);
        pos.undo_move();
    }
    count
}

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -";
const POSITION5: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -";
const POSITION6: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

#[test]
fn startpos_depth_1() {
    init();
    let mut pos = Position::default();
    assert_eq!(perft(&mut pos, 1), 20);
}

#[test]
fn startpos_depth_4() {
    init();
    let mut pos = Position::default();
    assert_eq!(perft(&mut pos, 4), 197_281);
}

// depths 5-6 walk hundreds of millions of leaves; opt in with `cargo test -- --ignored`.
#[test]
#[ignore]
fn startpos_depth_5() {
    init();
    let mut pos = Position::default();
    assert_eq!(perft(&mut pos, 5), 4_865_609);
}

#[test]
#[ignore]
fn startpos_depth_6() {
    init();
    let mut pos = Position::default();
    assert_eq!(perft(&mut pos, 6), 119_060_324);
}

#[test]
#[ignore]
fn kiwipete_depth_5() {
    init();
    let mut pos = Position::from_str(KIWIPETE).unwrap();
    assert_eq!(perft(&mut pos, 5), 193_690_690);
}

#[test]
#[ignore]
fn position5_depth_6() {
    init();
    let mut pos = Position::from_str(POSITION5).unwrap();
    assert_eq!(perft(&mut pos, 6), 11_030_083);
}

#[test]
#[ignore]
fn position6_depth_5() {
    init();
    let mut pos = Position::from_str(POSITION6).unwrap();
    assert_eq!(perft(&mut pos, 5), 89_941_194);
}
