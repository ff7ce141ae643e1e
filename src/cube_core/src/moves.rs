use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A face of the cube, in the order used by the cubie tables and the
/// face-letter interchange string.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    U,
    R,
    F,
    D,
    L,
    B,
}

impl Face {
    pub const ALL: [Self; 6] = {
        use Face::*;
        let v = [U, R, F, D, L, B];

        let mut i = 0;
        while i < v.len() {
            assert!(i == v[i] as usize);
            i += 1;
        }

        v
    };

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Face::U => 'U',
            Face::R => 'R',
            Face::F => 'F',
            Face::D => 'D',
            Face::L => 'L',
            Face::B => 'B',
        }
    }

    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'U' => Some(Face::U),
            'R' => Some(Face::R),
            'F' => Some(Face::F),
            'D' => Some(Face::D),
            'L' => Some(Face::L),
            'B' => Some(Face::B),
            _ => None,
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::ALL[(self as usize + 3) % 6]
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// How far a face is turned. Discriminants are the number of clockwise
/// quarter turns minus one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Turn {
    Clockwise,
    Half,
    CounterClockwise,
}

impl Turn {
    pub const ALL: [Self; 3] = [Turn::Clockwise, Turn::Half, Turn::CounterClockwise];

    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        self as u8 + 1
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Turn::Clockwise => Turn::CounterClockwise,
            Turn::Half => Turn::Half,
            Turn::CounterClockwise => Turn::Clockwise,
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Turn::Clockwise => "",
            Turn::Half => "2",
            Turn::CounterClockwise => "'",
        }
    }
}

/// One of the 18 face turns of the half turn metric.
///
/// Moves are ordered face-major (`U U2 U' R R2 R' ...`), and `index` is the
/// position in [`Move::ALL`]. Every move table in the solver is laid out with
/// this index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Move {
    pub face: Face,
    pub turn: Turn,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("Expected a move but got an empty token")]
    Empty,
    #[error("Unknown face `{0}`, expected one of U, D, L, R, F, B")]
    UnknownFace(char),
    #[error("Unknown turn suffix `{suffix}` in move `{token}`, expected nothing, `'` or `2`")]
    UnknownSuffix { token: String, suffix: String },
}

impl Move {
    pub const COUNT: usize = 18;

    pub const ALL: [Self; Self::COUNT] = {
        let mut out = [Move {
            face: Face::U,
            turn: Turn::Clockwise,
        }; Self::COUNT];

        let mut i = 0;
        while i < Self::COUNT {
            out[i] = Move {
                face: Face::ALL[i / 3],
                turn: Turn::ALL[i % 3],
            };
            i += 1;
        }

        out
    };

    #[must_use]
    pub const fn new(face: Face, turn: Turn) -> Self {
        Self { face, turn }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.face as usize * 3 + self.turn as usize
    }

    /// # Panics
    ///
    /// If `index` is not less than [`Move::COUNT`].
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        Self {
            face: self.face,
            turn: self.turn.inverse(),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face.letter(), self.turn.suffix())
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let first = chars.next().ok_or(MoveParseError::Empty)?;
        let face = Face::from_letter(first).ok_or(MoveParseError::UnknownFace(first))?;
        let turn = match chars.as_str() {
            "" => Turn::Clockwise,
            "2" => Turn::Half,
            "'" => Turn::CounterClockwise,
            suffix => {
                return Err(MoveParseError::UnknownSuffix {
                    token: s.to_owned(),
                    suffix: suffix.to_owned(),
                });
            }
        };
        Ok(Move { face, turn })
    }
}

impl From<Move> for String {
    fn from(value: Move) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Move {
    type Error = MoveParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An ordered list of moves, written space separated (`R U2 D' B L2`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveSequence(pub Vec<Move>);

impl MoveSequence {
    #[must_use]
    pub fn new(moves: Vec<Move>) -> Self {
        Self(moves)
    }

    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.0.iter().copied()
    }

    /// The sequence that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self(self.0.iter().rev().map(|m| m.inverse()).collect())
    }
}

impl From<Vec<Move>> for MoveSequence {
    fn from(value: Vec<Move>) -> Self {
        Self(value)
    }
}

impl IntoIterator for MoveSequence {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(" "))
    }
}

impl FromStr for MoveSequence {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
