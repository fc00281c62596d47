//! Zobrist fingerprinting of positions.
//!
//! The hasher is an explicitly constructed instance rather than a process
//! global: build one `Zobrist`, hand it to whatever owns the search tree,
//! and every fingerprint for that tree comes from the same key tables.
//! Keys are generated exactly once, in the constructor, and never touched
//! again.

use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::file::File;
use crate::piece::Piece;
use crate::position::Position;
use crate::square::Square;

/// Zobrist key tables plus the pure `hash` function over them.
///
/// One independent 64-bit key per (piece, square) pair, one key XORed in
/// when Black is on move, one key per castling-rights configuration, and
/// one key per en-passant file. A position's fingerprint is the XOR of the
/// keys its actual state selects, so positions differing in any of those
/// components hash differently with overwhelming probability. There is no
/// collision handling here; callers that need correctness rather than
/// speed must confirm with full position equality.
pub struct Zobrist {
    /// Indexed by `[Piece::index()][Square::index()]`.
    piece_square: [[u64; Square::COUNT]; Piece::COUNT],
    /// XORed in when Black is the side to move.
    side_to_move: u64,
    /// Indexed by `CastleRights::bits()`.
    castling: [u64; CastleRights::CONFIGURATIONS],
    /// Indexed by `File::index()` of the en-passant target.
    en_passant_file: [u64; File::COUNT],
}

impl Zobrist {
    /// Seed for the default key stream.
    ///
    /// Fixed so that fingerprints are reproducible across runs, which helps
    /// diffing search logs from two processes. Nothing depends on this;
    /// any nonzero seed works.
    pub const DEFAULT_SEED: u64 = 0x6c61_7269_6365_2121; // "larice!!"

    /// Build the key tables from the default seed.
    pub fn new() -> Zobrist {
        Zobrist::with_seed(Self::DEFAULT_SEED)
    }

    /// Build the key tables from a caller-supplied seed.
    pub fn with_seed(seed: u64) -> Zobrist {
        // Zero is the fixed point of xorshift64; substitute the default.
        let mut state = if seed == 0 { Self::DEFAULT_SEED } else { seed };

        let mut piece_square = [[0u64; Square::COUNT]; Piece::COUNT];
        for row in piece_square.iter_mut() {
            for key in row.iter_mut() {
                (*key, state) = xorshift64(state);
            }
        }

        let (side_to_move, mut state) = xorshift64(state);

        let mut castling = [0u64; CastleRights::CONFIGURATIONS];
        for key in castling.iter_mut() {
            (*key, state) = xorshift64(state);
        }

        let mut en_passant_file = [0u64; File::COUNT];
        for key in en_passant_file.iter_mut() {
            (*key, state) = xorshift64(state);
        }

        Zobrist {
            piece_square,
            side_to_move,
            castling,
            en_passant_file,
        }
    }

    /// Compute the fingerprint of a position.
    ///
    /// Pure and deterministic for the lifetime of this instance.
    pub fn hash(&self, position: &Position) -> u64 {
        let mut hash = 0u64;

        for (sq, piece) in position.pieces() {
            hash ^= self.piece_square[piece.index()][sq.index()];
        }

        if position.side_to_move() == Color::Black {
            hash ^= self.side_to_move;
        }

        hash ^= self.castling[position.castling().bits() as usize];

        if let Some(ep_sq) = position.en_passant() {
            hash ^= self.en_passant_file[ep_sq.file().index()];
        }

        hash
    }
}

impl Default for Zobrist {
    fn default() -> Zobrist {
        Zobrist::new()
    }
}

/// Xorshift64 PRNG step. Returns (value, next_state).
const fn xorshift64(mut state: u64) -> (u64, u64) {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    (state, state)
}
