//! Coordinates: small integers that each capture one aspect of a cube state.
//!
//! Every coordinate is zero on the solved cube. `set` writes a
//! representative state for a value onto an otherwise solved cube, which is
//! all the move table generator needs.

use crate::FACT_UNTIL_12;
use cube_core::cubie::{CORNER_COUNT, CubieCube, EDGE_COUNT};

/// A projection of [`CubieCube`] onto `0..COUNT`.
pub trait Coordinate {
    const COUNT: usize;

    fn get(cube: &CubieCube) -> u16;

    fn set(cube: &mut CubieCube, value: u16);
}

/// Corner orientation, a base 3 number over the first seven corners.
pub struct Twist;

/// Edge orientation, a base 2 number over the first eleven edges.
pub struct Flip;

/// Which four slots hold the `FR FL BL BR` edges, ignoring their order.
pub struct SlicePosition;

/// Lehmer rank of the corner permutation.
pub struct CornerPerm;

/// Lehmer rank of the permutation of the eight U and D layer edges. Only
/// meaningful in phase 2, where those edges stay in their layers.
pub struct UdEdgePerm;

/// Lehmer rank of the permutation of the four equator edges inside the
/// equator.
pub struct SlicePerm;

const SLICE_EDGE: u8 = 8;

impl Coordinate for Twist {
    const COUNT: usize = 2187;

    fn get(cube: &CubieCube) -> u16 {
        cube.co[..CORNER_COUNT - 1]
            .iter()
            .fold(0, |acc, &o| acc * 3 + u16::from(o))
    }

    fn set(cube: &mut CubieCube, mut value: u16) {
        let mut sum = 0;
        for o in cube.co[..CORNER_COUNT - 1].iter_mut().rev() {
            *o = (value % 3) as u8;
            sum += *o;
            value /= 3;
        }
        cube.co[CORNER_COUNT - 1] = (3 - sum % 3) % 3;
    }
}

impl Coordinate for Flip {
    const COUNT: usize = 2048;

    fn get(cube: &CubieCube) -> u16 {
        cube.eo[..EDGE_COUNT - 1]
            .iter()
            .fold(0, |acc, &o| acc * 2 + u16::from(o))
    }

    fn set(cube: &mut CubieCube, mut value: u16) {
        let mut sum = 0;
        for o in cube.eo[..EDGE_COUNT - 1].iter_mut().rev() {
            *o = (value % 2) as u8;
            sum += *o;
            value /= 2;
        }
        cube.eo[EDGE_COUNT - 1] = sum % 2;
    }
}

impl Coordinate for SlicePosition {
    const COUNT: usize = 495;

    fn get(cube: &CubieCube) -> u16 {
        let mut value = 0;
        let mut seen = 0;
        for slot in (0..EDGE_COUNT).rev() {
            if cube.ep[slot] >= SLICE_EDGE {
                seen += 1;
                value += binomial(EDGE_COUNT - 1 - slot, seen);
            }
        }
        value
    }

    fn set(cube: &mut CubieCube, mut value: u16) {
        let mut remaining = 4;
        let mut next_slice = SLICE_EDGE;
        let mut next_other = 0;
        for slot in 0..EDGE_COUNT {
            let skip = binomial(EDGE_COUNT - 1 - slot, remaining);
            if remaining > 0 && value >= skip {
                value -= skip;
                remaining -= 1;
                cube.ep[slot] = next_slice;
                next_slice += 1;
            } else {
                cube.ep[slot] = next_other;
                next_other += 1;
            }
        }
    }
}

impl Coordinate for CornerPerm {
    const COUNT: usize = 40320;

    fn get(cube: &CubieCube) -> u16 {
        rank(&cube.cp)
    }

    fn set(cube: &mut CubieCube, value: u16) {
        cube.cp = unrank(value);
    }
}

impl Coordinate for UdEdgePerm {
    const COUNT: usize = 40320;

    fn get(cube: &CubieCube) -> u16 {
        rank(&cube.ep[..8])
    }

    fn set(cube: &mut CubieCube, value: u16) {
        let perm: [u8; 8] = unrank(value);
        cube.ep[..8].copy_from_slice(&perm);
    }
}

impl Coordinate for SlicePerm {
    const COUNT: usize = 24;

    fn get(cube: &CubieCube) -> u16 {
        rank(&cube.ep[8..])
    }

    fn set(cube: &mut CubieCube, value: u16) {
        let perm: [u8; 4] = unrank(value);
        for (slot, edge) in cube.ep[8..].iter_mut().zip(perm) {
            *slot = edge + SLICE_EDGE;
        }
    }
}

const fn binomial(n: usize, k: usize) -> u16 {
    if k > n {
        return 0;
    }
    let mut out = 1;
    let mut i = 0;
    while i < k {
        out = out * (n - i) / (i + 1);
        i += 1;
    }
    out as u16
}

/// Lehmer rank of a sequence of distinct values, by their relative order.
fn rank(perm: &[u8]) -> u16 {
    let n = perm.len();
    let mut out = 0;
    for (i, &a) in perm.iter().enumerate() {
        let smaller_after = perm[i + 1..].iter().filter(|&&b| b < a).count();
        out += smaller_after * FACT_UNTIL_12[n - 1 - i];
    }
    out as u16
}

fn unrank<const N: usize>(value: u16) -> [u8; N] {
    let mut value = usize::from(value);
    let mut available: [u8; N] = std::array::from_fn(|i| i as u8);
    let mut len = N;
    let mut out = [0; N];

    for (i, slot) in out.iter_mut().enumerate() {
        let fact = FACT_UNTIL_12[N - 1 - i];
        let digit = value / fact;
        value %= fact;
        *slot = available[digit];
        available.copy_within(digit + 1..len, digit);
        len -= 1;
    }

    out
}

/// The three phase 1 coordinates of a state.
#[must_use]
pub fn phase1_coords(cube: &CubieCube) -> (u16, u16, u16) {
    (Twist::get(cube), Flip::get(cube), SlicePosition::get(cube))
}

/// The three phase 2 coordinates of a state in the phase 2 subgroup.
#[must_use]
pub fn phase2_coords(cube: &CubieCube) -> (u16, u16, u16) {
    (
        CornerPerm::get(cube),
        UdEdgePerm::get(cube),
        SlicePerm::get(cube),
    )
}
