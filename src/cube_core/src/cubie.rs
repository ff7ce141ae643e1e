//! The cubie level model: where each corner and edge piece sits and how it
//! is twisted or flipped.

use crate::moves::{Face, Move};
use std::fmt;

pub const CORNER_COUNT: usize = 8;
pub const EDGE_COUNT: usize = 12;

/// Corner slots, named by the faces they touch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Corner {
    URF,
    UFL,
    ULB,
    UBR,
    DFR,
    DLF,
    DBL,
    DRB,
}

/// Edge slots, named by the faces they touch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    UR,
    UF,
    UL,
    UB,
    DR,
    DF,
    DL,
    DB,
    FR,
    FL,
    BL,
    BR,
}

impl Corner {
    pub const ALL: [Self; CORNER_COUNT] = {
        use Corner::*;
        [URF, UFL, ULB, UBR, DFR, DLF, DBL, DRB]
    };
}

impl Edge {
    pub const ALL: [Self; EDGE_COUNT] = {
        use Edge::*;
        [UR, UF, UL, UB, DR, DF, DL, DB, FR, FL, BL, BR]
    };
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A cube state at the piece level.
///
/// The arrays use the "replaced by" convention: `cp[i]` is the corner that
/// sits in slot `i` and `co[i]` its clockwise twist relative to the U/D
/// sticker, likewise `ep`/`eo` for edges. Any array contents are
/// representable; [`crate::validate::check_solvable`] decides whether a state
/// is physically reachable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CubieCube {
    pub cp: [u8; CORNER_COUNT],
    pub co: [u8; CORNER_COUNT],
    pub ep: [u8; EDGE_COUNT],
    pub eo: [u8; EDGE_COUNT],
}

impl Default for CubieCube {
    fn default() -> Self {
        Self::SOLVED
    }
}

const BASIC_MOVES: [CubieCube; 6] = [
    // U
    CubieCube {
        cp: [3, 0, 1, 2, 4, 5, 6, 7],
        co: [0; 8],
        ep: [3, 0, 1, 2, 4, 5, 6, 7, 8, 9, 10, 11],
        eo: [0; 12],
    },
    // R
    CubieCube {
        cp: [4, 1, 2, 0, 7, 5, 6, 3],
        co: [2, 0, 0, 1, 1, 0, 0, 2],
        ep: [8, 1, 2, 3, 11, 5, 6, 7, 4, 9, 10, 0],
        eo: [0; 12],
    },
    // F
    CubieCube {
        cp: [1, 5, 2, 3, 0, 4, 6, 7],
        co: [1, 2, 0, 0, 2, 1, 0, 0],
        ep: [0, 9, 2, 3, 4, 8, 6, 7, 1, 5, 10, 11],
        eo: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
    },
    // D
    CubieCube {
        cp: [0, 1, 2, 3, 5, 6, 7, 4],
        co: [0; 8],
        ep: [0, 1, 2, 3, 5, 6, 7, 4, 8, 9, 10, 11],
        eo: [0; 12],
    },
    // L
    CubieCube {
        cp: [0, 2, 6, 3, 4, 1, 5, 7],
        co: [0, 1, 2, 0, 0, 2, 1, 0],
        ep: [0, 1, 10, 3, 4, 5, 9, 7, 8, 2, 6, 11],
        eo: [0; 12],
    },
    // B
    CubieCube {
        cp: [0, 1, 3, 7, 4, 5, 2, 6],
        co: [0, 0, 1, 2, 0, 0, 2, 1],
        ep: [0, 1, 2, 11, 4, 5, 6, 10, 8, 9, 3, 7],
        eo: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
    },
];

/// The transformation of every move, indexed by [`Move::index`]. Evaluated at
/// compile time.
pub const MOVE_CUBES: [CubieCube; Move::COUNT] = {
    let mut out = [CubieCube::SOLVED; Move::COUNT];

    let mut face = 0;
    while face < Face::ALL.len() {
        let quarter = BASIC_MOVES[face];
        let half = quarter.compose(&quarter);
        out[face * 3] = quarter;
        out[face * 3 + 1] = half;
        out[face * 3 + 2] = half.compose(&quarter);
        face += 1;
    }

    out
};

impl CubieCube {
    pub const SOLVED: Self = Self {
        cp: [0, 1, 2, 3, 4, 5, 6, 7],
        co: [0; CORNER_COUNT],
        ep: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        eo: [0; EDGE_COUNT],
    };

    /// The state reached by performing `self` and then `other`.
    #[must_use]
    pub const fn compose(&self, other: &Self) -> Self {
        let mut out = Self::SOLVED;

        let mut i = 0;
        while i < CORNER_COUNT {
            let from = other.cp[i] as usize;
            out.cp[i] = self.cp[from];
            out.co[i] = (self.co[from] + other.co[i]) % 3;
            i += 1;
        }

        let mut i = 0;
        while i < EDGE_COUNT {
            let from = other.ep[i] as usize;
            out.ep[i] = self.ep[from];
            out.eo[i] = (self.eo[from] + other.eo[i]) % 2;
            i += 1;
        }

        out
    }

    /// Compose `other` into `self` in place.
    pub fn multiply(&mut self, other: &Self) {
        *self = self.compose(other);
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut out = Self::SOLVED;
        for (slot, &corner) in self.cp.iter().enumerate() {
            out.cp[corner as usize] = slot as u8;
        }
        for (slot, &corner) in out.cp.iter().enumerate() {
            out.co[slot] = (3 - self.co[corner as usize]) % 3;
        }
        for (slot, &edge) in self.ep.iter().enumerate() {
            out.ep[edge as usize] = slot as u8;
        }
        for (slot, &edge) in out.ep.iter().enumerate() {
            out.eo[slot] = self.eo[edge as usize];
        }
        out
    }

    #[must_use]
    pub fn apply_move(&self, move_: Move) -> Self {
        self.compose(&MOVE_CUBES[move_.index()])
    }

    #[must_use]
    pub fn apply_moves(&self, moves: impl IntoIterator<Item = Move>) -> Self {
        moves
            .into_iter()
            .fold(*self, |cube, move_| cube.apply_move(move_))
    }

    /// Collapse a whole move sequence into the single transformation it
    /// performs on the solved cube.
    #[must_use]
    pub fn from_moves(moves: impl IntoIterator<Item = Move>) -> Self {
        Self::SOLVED.apply_moves(moves)
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        *self == Self::SOLVED
    }

    /// Whether the corner permutation is odd.
    #[must_use]
    pub fn corner_parity(&self) -> bool {
        odd_permutation(&self.cp)
    }

    /// Whether the edge permutation is odd.
    #[must_use]
    pub fn edge_parity(&self) -> bool {
        odd_permutation(&self.ep)
    }

    #[must_use]
    pub fn twist_sum(&self) -> u32 {
        self.co.iter().map(|&o| u32::from(o)).sum()
    }

    #[must_use]
    pub fn flip_sum(&self) -> u32 {
        self.eo.iter().map(|&o| u32::from(o)).sum()
    }
}

fn odd_permutation(perm: &[u8]) -> bool {
    let mut inversions = 0_usize;
    for (i, &a) in perm.iter().enumerate() {
        inversions += perm[i + 1..].iter().filter(|&&b| b < a).count();
    }
    inversions % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{MoveSequence, Turn};

    fn scrambled() -> CubieCube {
        let seq: MoveSequence = "F L D2 F' U' R U' B' R B D R2 D' L F' U2 F' L U' F U L2 F' L F U"
            .parse()
            .unwrap();
        CubieCube::from_moves(seq)
    }

    #[test]
    fn move_then_inverse_is_identity() {
        let states = [CubieCube::SOLVED, scrambled(), scrambled().inverse()];
        for state in states {
            for move_ in Move::ALL {
                assert_eq!(state.apply_move(move_).apply_move(move_.inverse()), state);
            }
        }
    }

    #[test]
    fn quarter_turns_have_order_four() {
        for move_ in Move::ALL.into_iter().filter(|m| m.turn == Turn::Clockwise) {
            let once = CubieCube::SOLVED.apply_move(move_);
            assert_ne!(once, CubieCube::SOLVED);
            assert_eq!(
                CubieCube::from_moves([move_, move_, move_, move_]),
                CubieCube::SOLVED
            );
        }
    }

    #[test]
    fn composition_is_associative() {
        let a = scrambled();
        let b = MOVE_CUBES[4];
        let c = a.inverse().apply_move(Move::ALL[10]);
        assert_eq!(a.compose(&b).compose(&c), a.compose(&b.compose(&c)));
    }

    #[test]
    fn inverse_composes_to_solved() {
        let a = scrambled();
        assert!(a.compose(&a.inverse()).is_solved());
        assert!(a.inverse().compose(&a).is_solved());
    }

    #[test]
    fn moves_preserve_invariants() {
        let mut cube = CubieCube::SOLVED;
        for move_ in Move::ALL.iter().cycle().step_by(7).take(200) {
            cube = cube.apply_move(*move_);
            assert_eq!(cube.corner_parity(), cube.edge_parity());
            assert_eq!(cube.twist_sum() % 3, 0);
            assert_eq!(cube.flip_sum() % 2, 0);
        }
    }

    #[test]
    fn quarter_turn_changes_parity() {
        let cube = CubieCube::SOLVED.apply_move("R".parse().unwrap());
        assert!(cube.corner_parity());
        assert!(cube.edge_parity());
        let cube = CubieCube::SOLVED.apply_move("R2".parse().unwrap());
        assert!(!cube.corner_parity());
    }
}
