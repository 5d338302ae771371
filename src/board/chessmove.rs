use std::fmt;

use super::piece::Piece;
use super::square::Square;

/// How a move changes position state beyond a plain piece relocation. Every non-`Normal`
/// variant needs special-case handling in `Position::apply_move`/`undo_move`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum MoveKind {
    Normal,
    DoublePawnPush,
    EnPassant,
    Castle,
    Promotion,
    Null,
}

/// A fully-described chess move: enough to apply it, undo it, and order it, without consulting
/// the position it came from.
///
/// `captured` is resolved once at generation time rather than re-derived during `apply()` — the
/// generator already inspects destination occupancy to build the candidate, so storing the
/// result here avoids a second board lookup per move. The three backup fields exist solely so
/// `undo_move` needs no state beyond the move itself: they are filled in by
/// `Position::apply_move` immediately before mutation, not by the move generator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    moving: Piece,
    resulting: Piece,
    captured: Option<Piece>,
    kind: MoveKind,
    prev_ep: Option<Square>,
    prev_castling: u8,
    prev_halfmove_clock: u16,
    prev_hash: u64,
}

impl Move {
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        from: Square,
        to: Square,
        moving: Piece,
        resulting: Piece,
        captured: Option<Piece>,
        kind: MoveKind,
    ) -> Self {
        Move {
            from,
            to,
            moving,
            resulting,
            captured,
            kind,
            prev_ep: None,
            prev_castling: 0,
            prev_halfmove_clock: 0,
            prev_hash: 0,
        }
    }

    #[inline]
    pub fn quiet(from: Square, to: Square, moving: Piece) -> Self {
        Move::new(from, to, moving, moving, None, MoveKind::Normal)
    }

    #[inline]
    pub fn capture(from: Square, to: Square, moving: Piece, captured: Piece) -> Self {
        Move::new(from, to, moving, moving, Some(captured), MoveKind::Normal)
    }

    #[inline]
    pub fn double_pawn_push(from: Square, to: Square, moving: Piece) -> Self {
        Move::new(from, to, moving, moving, None, MoveKind::DoublePawnPush)
    }

    #[inline]
    pub fn en_passant(from: Square, to: Square, moving: Piece, captured: Piece) -> Self {
        Move::new(from, to, moving, moving, Some(captured), MoveKind::EnPassant)
    }

    #[inline]
    pub fn castle(from: Square, to: Square, moving: Piece) -> Self {
        Move::new(from, to, moving, moving, None, MoveKind::Castle)
    }

    #[inline]
    pub fn promotion(from: Square, to: Square, moving: Piece, resulting: Piece, captured: Option<Piece>) -> Self {
        Move::new(from, to, moving, resulting, captured, MoveKind::Promotion)
    }

    /// the null move: same square to itself, used only for null-move pruning.
    #[inline]
    pub fn null() -> Self {
        Move::new(Square::new(0), Square::new(0), Piece::King, Piece::King, None, MoveKind::Null)
    }

    /// returns a copy of this move with undo-backup fields snapshotted from the position it is
    /// about to be applied to. Called by `Position::apply_move` just before mutating state.
    #[inline]
    pub fn with_backup(
        mut self,
        prev_ep: Option<Square>,
        prev_castling: u8,
        prev_halfmove_clock: u16,
        prev_hash: u64,
    ) -> Self {
        self.prev_ep = prev_ep;
        self.prev_castling = prev_castling;
        self.prev_halfmove_clock = prev_halfmove_clock;
        self.prev_hash = prev_hash;
        self
    }

    #[inline]
    pub fn from(self) -> Square {
        self.from
    }

    #[inline]
    pub fn to(self) -> Square {
        self.to
    }

    #[inline]
    pub fn moving(self) -> Piece {
        self.moving
    }

    #[inline]
    pub fn resulting(self) -> Piece {
        self.resulting
    }

    #[inline]
    pub fn captured(self) -> Option<Piece> {
        self.captured
    }

    #[inline]
    pub fn kind(self) -> MoveKind {
        self.kind
    }

    #[inline]
    pub fn is_capture(self) -> bool {
        self.captured.is_some()
    }

    #[inline]
    pub fn is_promotion(self) -> bool {
        self.kind == MoveKind::Promotion
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.kind == MoveKind::Null
    }

    #[inline]
    pub fn prev_ep(self) -> Option<Square> {
        self.prev_ep
    }

    #[inline]
    pub fn prev_castling(self) -> u8 {
        self.prev_castling
    }

    #[inline]
    pub fn prev_halfmove_clock(self) -> u16 {
        self.prev_halfmove_clock
    }

    #[inline]
    pub fn prev_hash(self) -> u64 {
        self.prev_hash
    }

    #[inline]
    pub fn get_promotion(self) -> Option<Piece> {
        if self.kind == MoveKind::Promotion {
            Some(self.resulting)
        } else {
            None
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.get_promotion() {
            let c = match promo {
                Piece::Knight => 'n',
                Piece::Bishop => 'b',
                Piece::Rook => 'r',
                Piece::Queen => 'q',
                _ => 'q',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
