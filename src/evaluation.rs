use crate::board::{bishop_attacks, king_attacks, knight_attacks, rook_attacks};
use crate::board::{Color, GameStatus, Piece, Position};
use crate::types::{Score, SCORE_MATE};

const PAWN_VALUE: Score = 100;
const KNIGHT_VALUE: Score = 300;
const BISHOP_VALUE: Score = 300;
const ROOK_VALUE: Score = 500;
const QUEEN_VALUE: Score = 900;

fn piece_value(piece: Piece) -> Score {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

const DOUBLED_PAWN_PENALTY: Score = 10;
const ISOLATED_PAWN_PENALTY: Score = 15;
const BACKWARD_PAWN_PENALTY: Score = 8;
const CENTER_PAWN_BONUS: Score = 10;
const BLOCKED_CENTRAL_PAWN_PENALTY: Score = 20;
const MOBILITY_WEIGHT: Score = 2;
const ROOK_OPEN_FILE_BONUS: Score = 20;
const ROOK_SEMI_OPEN_FILE_BONUS: Score = 10;
const KING_ATTACK_WEIGHT: Score = 4;

/// Static evaluation of `pos` from the side-to-move's perspective. Positive means the side to
/// move stands better. Terminal states (checkmate, stalemate, insufficient material) are
/// resolved first; everything past that is material plus a handful of positional terms computed
/// white-minus-black and flipped for black to move, per the negamax sign convention used
/// throughout search.
pub fn evaluate(pos: &Position) -> Score {
    match pos.status() {
        GameStatus::Checkmate => return -SCORE_MATE,
        GameStatus::Stalemate => return 0,
        GameStatus::Ongoing => {}
    }

    if is_insufficient_material(pos) {
        return 0;
    }

    let mut score = 0;
    score += material(pos);
    score += pawn_structure(pos);
    score += mobility(pos);
    score += rook_files(pos);
    score += king_safety(pos);

    if pos.side_to_move() == Color::White {
        score
    } else {
        -score
    }
}

/// King vs king, king + lone minor vs king, and king + two knights vs king are dead draws no
/// matter whose turn it is — none of them can force checkmate against bare-king resistance.
fn is_insufficient_material(pos: &Position) -> bool {
    let non_king = pos.combined() & !pos.pieces(Piece::King);
    let count = non_king.popcnt();

    match count {
        0 => true,
        1 => {
            let lone = pos.pieces(Piece::Knight) | pos.pieces(Piece::Bishop);
            !(lone & non_king).is_empty()
        }
        2 => (pos.pieces(Piece::Knight) & non_king).popcnt() == 2,
        _ => false,
    }
}

fn material(pos: &Position) -> Score {
    let mut score = 0;
    for piece in Piece::ALL {
        let white = (pos.pieces(piece) & pos.color_combined(Color::White)).popcnt() as Score;
        let black = (pos.pieces(piece) & pos.color_combined(Color::Black)).popcnt() as Score;
        score += (white - black) * piece_value(piece);
    }
    score
}

/// Squares d4/e4/d5/e5 — a pawn sitting on one of these is worth a small bonus regardless of
/// color, mirroring the center-control weighting a human evaluator would apply by hand.
fn is_center_square(sq: crate::board::Square) -> bool {
    let file = sq.file().to_index();
    let rank = sq.rank().to_index();
    (file == 3 || file == 4) && (rank == 3 || rank == 4)
}

fn pawn_structure(pos: &Position) -> Score {
    let mut score = 0;
    let pawns = pos.pieces(Piece::Pawn);
    let occupied = pos.combined();

    for color in [Color::White, Color::Black] {
        let sign: Score = if color == Color::White { 1 } else { -1 };
        let our_pawns = pawns & pos.color_combined(color);
        let (push_dir, start_rank): (i8, usize) = if color == Color::White { (8, 1) } else { (-8, 6) };

        let mut file_counts = [0u32; 8];
        for sq in our_pawns.iter() {
            file_counts[sq.file().to_index()] += 1;
        }

        for sq in our_pawns.iter() {
            let file = sq.file().to_index();
            let rank = sq.rank().to_index();

            if file_counts[file] > 1 {
                score -= sign * DOUBLED_PAWN_PENALTY;
            }

            let left_has_pawn = file > 0 && file_counts[file - 1] > 0;
            let right_has_pawn = file < 7 && file_counts[file + 1] > 0;
            if !left_has_pawn && !right_has_pawn {
                score -= sign * ISOLATED_PAWN_PENALTY;
            } else {
                // backward: no friendly pawn on an adjacent file level with or ahead of this one,
                // and an enemy pawn already guards the square this pawn would advance to.
                let has_support = our_pawns.iter().any(|other| {
                    let of = other.file().to_index();
                    let or = other.rank().to_index();
                    (of == file.wrapping_sub(1) || of == file + 1)
                        && if color == Color::White { or <= rank } else { or >= rank }
                });
                if !has_support {
                    let ahead_idx = sq.to_index() as i8 + push_dir;
                    if (0..64).contains(&ahead_idx) {
                        let ahead = crate::board::Square::new(ahead_idx as u8);
                        // squares from which an enemy pawn would attack `ahead` are exactly the
                        // squares our own color's pawn-attack pattern reaches from `ahead`.
                        let guards = crate::board::pawn_attacks(color, ahead)
                            & pos.pieces(Piece::Pawn)
                            & pos.color_combined(!color);
                        if !guards.is_empty() {
                            score -= sign * BACKWARD_PAWN_PENALTY;
                        }
                    }
                }
            }

            if is_center_square(sq) {
                score += sign * CENTER_PAWN_BONUS;
            }

            if (file == 3 || file == 4) && rank == start_rank {
                let ahead_idx = sq.to_index() as i8 + push_dir;
                if (0..64).contains(&ahead_idx) {
                    let ahead = crate::board::Square::new(ahead_idx as u8);
                    if !(crate::board::BitBoard::from_square(ahead) & occupied).is_empty() {
                        score -= sign * BLOCKED_CENTRAL_PAWN_PENALTY;
                    }
                }
            }
        }
    }

    score
}

/// Pseudo-legal destination count for knights/bishops/rooks/queens, used as a cheap proxy for
/// piece activity. Pawns and kings are excluded — their mobility says little about how active a
/// position is and including the king would reward walking it into the open.
fn mobility(pos: &Position) -> Score {
    let mut score = 0;
    let occupied = pos.combined();

    for color in [Color::White, Color::Black] {
        let sign: Score = if color == Color::White { 1 } else { -1 };
        let own = pos.color_combined(color);
        let mut count: u32 = 0;

        for sq in (pos.pieces(Piece::Knight) & own).iter() {
            count += (knight_attacks(sq) & !own).popcnt();
        }
        for sq in (pos.pieces(Piece::Bishop) & own).iter() {
            count += (bishop_attacks(sq, occupied) & !own).popcnt();
        }
        for sq in (pos.pieces(Piece::Rook) & own).iter() {
            count += (rook_attacks(sq, occupied) & !own).popcnt();
        }
        for sq in (pos.pieces(Piece::Queen) & own).iter() {
            count += ((bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)) & !own).popcnt();
        }

        score += sign * (count as Score) * MOBILITY_WEIGHT;
    }

    score
}

fn rook_files(pos: &Position) -> Score {
    let mut score = 0;
    let pawns = pos.pieces(Piece::Pawn);

    for color in [Color::White, Color::Black] {
        let sign: Score = if color == Color::White { 1 } else { -1 };
        let our_pawns = pawns & pos.color_combined(color);
        let their_pawns = pawns & pos.color_combined(!color);

        for sq in (pos.pieces(Piece::Rook) & pos.color_combined(color)).iter() {
            let file_mask = FILE_MASKS[sq.file().to_index()];
            let own_pawns_on_file = !(our_pawns & file_mask).is_empty();
            let enemy_pawns_on_file = !(their_pawns & file_mask).is_empty();

            if !own_pawns_on_file && !enemy_pawns_on_file {
                score += sign * ROOK_OPEN_FILE_BONUS;
            } else if !own_pawns_on_file {
                score += sign * ROOK_SEMI_OPEN_FILE_BONUS;
            }
        }
    }

    score
}

const FILE_MASKS: [crate::board::BitBoard; 8] = {
    let mut masks = [crate::board::EMPTY; 8];
    let mut file = 0usize;
    while file < 8 {
        let mut bits: u64 = 0;
        let mut rank = 0usize;
        while rank < 8 {
            bits |= 1u64 << (rank * 8 + file);
            rank += 1;
        }
        masks[file] = crate::board::BitBoard(bits);
        file += 1;
    }
    masks
};

/// Bonus for friendly pieces attacking the ring of squares around the enemy king — a crude
/// proxy for attacking chances, not a real king-safety model (no weighting by attacker count or
/// open lines).
fn king_safety(pos: &Position) -> Score {
    let mut score = 0;
    let occupied = pos.combined();

    for color in [Color::White, Color::Black] {
        let sign: Score = if color == Color::White { 1 } else { -1 };
        let enemy_king = pos.pieces(Piece::King) & pos.color_combined(!color);
        if enemy_king.is_empty() {
            continue;
        }
        let king_sq = crate::board::Square::new(enemy_king.lsb());
        let ring = king_attacks(king_sq);
        let own = pos.color_combined(color);

        let mut attackers: u32 = 0;
        for sq in (pos.pieces(Piece::Knight) & own).iter() {
            attackers += (knight_attacks(sq) & ring).popcnt();
        }
        for sq in (pos.pieces(Piece::Bishop) & own).iter() {
            attackers += (bishop_attacks(sq, occupied) & ring).popcnt();
        }
        for sq in (pos.pieces(Piece::Rook) & own).iter() {
            attackers += (rook_attacks(sq, occupied) & ring).popcnt();
        }
        for sq in (pos.pieces(Piece::Queen) & own).iter() {
            attackers += ((bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)) & ring).popcnt();
        }

        score += sign * (attackers as Score) * KING_ATTACK_WEIGHT;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn init() {
        crate::board::init();
    }

    #[test]
    fn test_startpos_near_zero() {
        init();
        let pos = Position::default();
        let score = evaluate(&pos);
        assert!(score.abs() < 100, "startpos score {} is too far from 0", score);
    }

    #[test]
    fn test_white_up_queen() {
        init();
        let pos = Position::from_str("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let score = evaluate(&pos);
        assert!(score > 800, "white up a queen should score high, got {}", score);
    }

    #[test]
    fn test_black_up_queen_from_black_perspective() {
        init();
        let pos = Position::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR b KQkq - 0 1").unwrap();
        let score = evaluate(&pos);
        assert!(score > 800, "black up a queen, black to move, should be positive, got {}", score);
    }

    #[test]
    fn test_checkmate_scores_as_mate() {
        init();
        let pos = Position::from_str("rnbqkbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert_eq!(evaluate(&pos), -SCORE_MATE);
    }

    #[test]
    fn test_stalemate_is_drawn() {
        init();
        let pos = Position::from_str("4k3/8/1Q2K3/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(evaluate(&pos), 0);
    }

    #[test]
    fn test_insufficient_material_king_vs_king() {
        init();
        let pos = Position::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(evaluate(&pos), 0);
    }

    #[test]
    fn test_insufficient_material_king_and_bishop_vs_king() {
        init();
        let pos = Position::from_str("4k3/8/8/8/8/8/8/3BK3 w - - 0 1").unwrap();
        assert_eq!(evaluate(&pos), 0);
    }

    #[test]
    fn test_sufficient_material_is_not_drawn() {
        init();
        let pos = Position::from_str("4k3/8/8/8/8/8/8/3RK3 w - - 0 1").unwrap();
        assert_ne!(evaluate(&pos), 0);
    }

    #[test]
    fn test_doubled_pawns_penalized() {
        init();
        let doubled = Position::from_str("4k3/8/8/8/8/4P3/4P3/4K3 w - - 0 1").unwrap();
        let spread = Position::from_str("4k3/8/8/8/8/3P4/4P3/4K3 w - - 0 1").unwrap();
        assert!(evaluate(&doubled) < evaluate(&spread));
    }

    #[test]
    fn test_rook_open_file_bonus() {
        init();
        // same pawn count on both sides; only difference is whether the pawn sits in front of
        // the rook's own file.
        let open = Position::from_str("4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1").unwrap();
        let closed = Position::from_str("4k3/8/8/8/8/8/P7/R3K3 w - - 0 1").unwrap();
        assert!(evaluate(&open) > evaluate(&closed));
    }
}
