//! The immutable position value the search tree is keyed on.

use std::fmt;

use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::piece::Piece;
use crate::square::Square;

/// A chess position: piece placement, side to move, castling rights, and
/// en-passant target.
///
/// This is a value type: built once, never mutated afterward. Equality
/// covers exactly the fields that determine which moves are possible from
/// here, so two positions reached at different move numbers (or by
/// different move orders) compare equal. Move counters are intentionally
/// not part of the value; repetition and fifty-move bookkeeping belong to
/// the game layer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Piece on each square, indexed by [`Square::index()`].
    squares: [Option<Piece>; Square::COUNT],
    /// Which side moves next.
    side_to_move: Color,
    /// Current castling rights.
    castling: CastleRights,
    /// En passant target square, if any.
    en_passant: Option<Square>,
}

impl Position {
    /// Return an empty board with White to move and no castling rights.
    ///
    /// Intended as the seed for the `with_*` builders; an empty board is
    /// not a legal game position, and this crate does not care.
    pub const fn empty() -> Position {
        Position {
            squares: [None; Square::COUNT],
            side_to_move: Color::White,
            castling: CastleRights::NONE,
            en_passant: None,
        }
    }

    /// Return the standard starting position.
    pub fn starting_position() -> Position {
        crate::fen::STARTING_FEN
            .parse()
            .expect("starting FEN is well-formed")
    }

    /// Return a copy with `piece` placed on `sq` (replacing any occupant).
    #[must_use]
    pub const fn with_piece(mut self, sq: Square, piece: Piece) -> Position {
        self.squares[sq.index()] = Some(piece);
        self
    }

    /// Return a copy with `sq` emptied.
    #[must_use]
    pub const fn without_piece(mut self, sq: Square) -> Position {
        self.squares[sq.index()] = None;
        self
    }

    /// Return a copy with the given side to move.
    #[must_use]
    pub const fn with_side_to_move(mut self, color: Color) -> Position {
        self.side_to_move = color;
        self
    }

    /// Return a copy with the given castling rights.
    #[must_use]
    pub const fn with_castling(mut self, castling: CastleRights) -> Position {
        self.castling = castling;
        self
    }

    /// Return a copy with the given en-passant target.
    #[must_use]
    pub const fn with_en_passant(mut self, en_passant: Option<Square>) -> Position {
        self.en_passant = en_passant;
        self
    }

    /// Return the piece on the given square, if any.
    #[inline]
    pub const fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Return which side moves next.
    #[inline]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Return the current castling rights.
    #[inline]
    pub const fn castling(&self) -> CastleRights {
        self.castling
    }

    /// Return the en passant target square, if any.
    #[inline]
    pub const fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Iterate over all occupied squares with their pieces, in square order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.squares[sq.index()].map(|piece| (sq, piece)))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegates to the FEN rendering in `crate::fen`.
        write!(f, "Position({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::Position;
    use crate::castle_rights::CastleRights;
    use crate::color::Color;
    use crate::piece::Piece;
    use crate::square::Square;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn starting_position_basics() {
        let position = Position::starting_position();
        assert_eq!(position.side_to_move(), Color::White);
        assert_eq!(position.castling(), CastleRights::ALL);
        assert_eq!(position.en_passant(), None);
        assert_eq!(position.pieces().count(), 32);
        assert_eq!(position.piece_on(sq("e1")), Piece::from_fen_char('K'));
        assert_eq!(position.piece_on(sq("e4")), None);
    }

    #[test]
    fn equality_ignores_nothing_it_stores() {
        let a = Position::starting_position();
        let b = Position::starting_position();
        assert_eq!(a, b);

        assert_ne!(a, b.with_side_to_move(Color::Black));
        assert_ne!(a, b.with_castling(CastleRights::NONE));
        assert_ne!(a, b.with_en_passant(Some(sq("e3"))));
        assert_ne!(a, b.without_piece(sq("a2")));
    }

    #[test]
    fn builders_compose() {
        let position = Position::empty()
            .with_piece(sq("e1"), Piece::from_fen_char('K').unwrap())
            .with_piece(sq("e8"), Piece::from_fen_char('k').unwrap())
            .with_side_to_move(Color::Black);
        assert_eq!(position.pieces().count(), 2);
        assert_eq!(position.side_to_move(), Color::Black);
    }
}
