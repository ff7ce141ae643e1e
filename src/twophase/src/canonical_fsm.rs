//! A finite state machine over the six face classes that only admits
//! canonical move sequences: no face is turned twice in a row, and of two
//! commuting faces only the lower one may come first.
//!
//! Each state is the set of face classes turned since the last move that did
//! not commute with them. A move is illegal when its own class is in the set
//! or when a higher class that commutes with it is.

use cube_core::moves::Face;
use std::collections::HashMap;

const FACE_COUNT: usize = Face::ALL.len();

// Bit N is set for the face with discriminant N.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
struct FaceMask(u8);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanonicalFsmState(usize);

#[derive(Debug)]
pub struct CanonicalFsm {
    next_state_lookup: Vec<[Option<CanonicalFsmState>; FACE_COUNT]>,
}

impl Default for CanonicalFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalFsm {
    #[must_use]
    pub fn new() -> Self {
        // Turns of a face commute with turns of the same or the opposite face
        let commutes = Face::ALL.map(|face| FaceMask((1 << face as u8) | (1 << face.opposite() as u8)));

        let mut mask_to_state = HashMap::new();
        mask_to_state.insert(FaceMask(0), CanonicalFsmState(0));
        let mut state_to_mask = vec![FaceMask(0)];
        let mut next_state_lookup = vec![];

        let mut queue_index = 0;
        while queue_index < state_to_mask.len() {
            let mask = state_to_mask[queue_index];
            queue_index += 1;

            let mut next_state = [None; FACE_COUNT];
            for (face_index, next) in next_state.iter_mut().enumerate() {
                let same_face = (mask.0 >> face_index) & 1 != 0;
                let higher_commuting = (mask.0 & commutes[face_index].0) >> (face_index + 1) != 0;
                if same_face || higher_commuting {
                    continue;
                }

                let mut next_bits = (mask.0 & commutes[face_index].0) | (1 << face_index);
                // Faces with the same commuting set are interchangeable in the
                // mask; keep only the highest
                for i in 0..FACE_COUNT {
                    if (next_bits >> i) & 1 == 0 {
                        continue;
                    }
                    for j in (i + 1)..FACE_COUNT {
                        if (next_bits >> j) & 1 != 0 && commutes[i] == commutes[j] {
                            next_bits &= !(1 << i);
                        }
                    }
                }

                let next_mask = FaceMask(next_bits);
                *next = Some(*mask_to_state.entry(next_mask).or_insert_with(|| {
                    state_to_mask.push(next_mask);
                    CanonicalFsmState(state_to_mask.len() - 1)
                }));
            }
            next_state_lookup.push(next_state);
        }

        Self { next_state_lookup }
    }

    /// The state after turning `face`, or `None` if that turn would make the
    /// sequence non-canonical.
    #[inline]
    #[must_use]
    pub fn next_state(&self, current: CanonicalFsmState, face: Face) -> Option<CanonicalFsmState> {
        self.next_state_lookup[current.0][face as usize]
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.next_state_lookup.len()
    }
}
