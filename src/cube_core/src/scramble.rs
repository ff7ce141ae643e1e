use crate::{
    cubie::CubieCube,
    moves::{Face, Move, MoveSequence},
};

/// A random walk of `length` moves from solved. Consecutive moves never turn
/// the same face, and two turns of opposite faces are always written in one
/// order, so no move of the walk cancels into its neighbor.
pub fn random_walk(length: usize, rng: &mut fastrand::Rng) -> MoveSequence {
    let mut moves: Vec<Move> = Vec::with_capacity(length);

    while moves.len() < length {
        let move_ = Move::ALL[rng.usize(..Move::COUNT)];
        if !follows_canonically(&moves, move_.face) {
            continue;
        }
        moves.push(move_);
    }

    MoveSequence::new(moves)
}

fn follows_canonically(moves: &[Move], face: Face) -> bool {
    match moves {
        [] => true,
        [.., last] if last.face == face => false,
        // `D U` is the same as `U D`; only allow the lower face first
        [.., last] if last.face.opposite() == face && last.face > face => false,
        _ => true,
    }
}

/// A random scramble together with the state it produces.
pub fn random_state(length: usize, rng: &mut fastrand::Rng) -> (MoveSequence, CubieCube) {
    let scramble = random_walk(length, rng);
    let cube = CubieCube::from_moves(scramble.iter());
    (scramble, cube)
}
