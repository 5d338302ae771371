mod attacks;
mod bitboard;
mod chessmove;
mod magic;
mod movegen;
mod piece;
#[allow(clippy::module_inception)]
mod position;
mod square;
mod zobrist;

#[allow(unused_imports)]
pub use bitboard::{BitBoard, EMPTY};
pub use chessmove::{Move, MoveKind};
/// raw pseudo-legal attack lookups, exposed crate-wide for the evaluation and move-ordering
/// terms that need attack bitboards without going through full legal move generation.
pub(crate) use attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
#[allow(unused_imports)]
pub use movegen::MoveGen;
pub use piece::{Color, Piece};
pub use position::{GameStatus, Position};
#[allow(unused_imports)]
pub use square::{File, Rank, Square, ALL_SQUARES};

/// Init attack tables and Zobrist keys. Must be called before any board operations.
pub fn init() {
    attacks::init_attacks();
    zobrist::init_zobrist();
}
