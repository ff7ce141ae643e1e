use crate::coord::{Coordinate, CornerPerm, Flip, SlicePerm, SlicePosition, Twist, UdEdgePerm};
use cube_core::{
    cubie::{CubieCube, MOVE_CUBES},
    moves::{Face, Move, Turn},
};
use log::debug;
use std::time::Instant;

/// The moves that keep a cube inside the phase 2 subgroup.
pub const PHASE2_MOVES: [Move; 10] = [
    Move::new(Face::U, Turn::Clockwise),
    Move::new(Face::U, Turn::Half),
    Move::new(Face::U, Turn::CounterClockwise),
    Move::new(Face::D, Turn::Clockwise),
    Move::new(Face::D, Turn::Half),
    Move::new(Face::D, Turn::CounterClockwise),
    Move::new(Face::R, Turn::Half),
    Move::new(Face::F, Turn::Half),
    Move::new(Face::L, Turn::Half),
    Move::new(Face::B, Turn::Half),
];

/// Whether `move_` is one of [`PHASE2_MOVES`].
#[must_use]
pub fn is_phase2_move(move_: Move) -> bool {
    matches!(move_.face, Face::U | Face::D) || move_.turn == Turn::Half
}

/// `coord × move → coord` for one coordinate over a fixed move set, stored
/// row-major.
#[derive(Debug, Clone)]
pub struct MoveTable {
    table: Box<[u16]>,
    width: usize,
}

impl MoveTable {
    #[must_use]
    pub fn build<C: Coordinate>(moves: &[Move]) -> Self {
        let mut table = Vec::with_capacity(C::COUNT * moves.len());
        for value in 0..C::COUNT {
            let mut cube = CubieCube::SOLVED;
            C::set(&mut cube, value as u16);
            for &move_ in moves {
                table.push(C::get(&cube.compose(&MOVE_CUBES[move_.index()])));
            }
        }

        Self {
            table: table.into_boxed_slice(),
            width: moves.len(),
        }
    }

    /// The coordinate after the move at `move_index` of the table's move set.
    #[inline]
    #[must_use]
    pub fn apply(&self, coord: u16, move_index: usize) -> u16 {
        self.table[usize::from(coord) * self.width + move_index]
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len() / self.width
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Move tables for all six coordinates. Phase 1 tables are indexed by
/// [`Move::index`], phase 2 tables by position in [`PHASE2_MOVES`].
#[derive(Debug, Clone)]
pub struct MoveTables {
    pub twist: MoveTable,
    pub flip: MoveTable,
    pub slice_position: MoveTable,
    pub corner_perm: MoveTable,
    pub ud_edge_perm: MoveTable,
    pub slice_perm: MoveTable,
}

impl MoveTables {
    #[must_use]
    pub fn generate() -> Self {
        let start = Instant::now();
        let tables = Self {
            twist: MoveTable::build::<Twist>(&Move::ALL),
            flip: MoveTable::build::<Flip>(&Move::ALL),
            slice_position: MoveTable::build::<SlicePosition>(&Move::ALL),
            corner_perm: MoveTable::build::<CornerPerm>(&PHASE2_MOVES),
            ud_edge_perm: MoveTable::build::<UdEdgePerm>(&PHASE2_MOVES),
            slice_perm: MoveTable::build::<SlicePerm>(&PHASE2_MOVES),
        };
        debug!(
            "Built move tables in {:.3}s",
            start.elapsed().as_secs_f64()
        );
        tables
    }
}
