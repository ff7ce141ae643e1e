//! Sticker level model and its conversion to and from cubies.
//!
//! Stickers are numbered face by face in `U R F D L B` order, nine per face,
//! row-major with the standard net orientation: U is seen from above with B
//! at the top, D from below with F at the top, and the side faces with U at
//! the top. `U1..U9` are 0..8, `R1..R9` are 9..17 and so on.
//!
//! User input follows the grid of the original form instead: faces in
//! `U L F R B D` order, one color letter per sticker, with the same
//! numbering inside each face.

use crate::{
    cubie::{CORNER_COUNT, Corner, CubieCube, EDGE_COUNT, Edge},
    moves::Face,
    validate::UnsolvableConfigurationError,
};
use std::fmt;
use thiserror::Error;

pub const FACELET_COUNT: usize = 54;

/// Face order of the user facing color grid.
pub const INPUT_FACE_ORDER: [Face; 6] = [Face::U, Face::L, Face::F, Face::R, Face::B, Face::D];

const CENTER: usize = 4;

/// Sticker positions of each corner slot, starting with its U or D sticker
/// and continuing clockwise.
const CORNER_FACELETS: [[usize; 3]; CORNER_COUNT] = [
    [8, 9, 20],
    [6, 18, 38],
    [0, 36, 47],
    [2, 45, 11],
    [29, 26, 15],
    [27, 44, 24],
    [33, 53, 42],
    [35, 17, 51],
];

/// Sticker positions of each edge slot.
const EDGE_FACELETS: [[usize; 2]; EDGE_COUNT] = [
    [5, 10],
    [7, 19],
    [3, 37],
    [1, 46],
    [32, 16],
    [28, 25],
    [30, 43],
    [34, 52],
    [23, 12],
    [21, 41],
    [50, 39],
    [48, 14],
];

const CORNER_COLORS: [[Face; 3]; CORNER_COUNT] = {
    use Face::*;
    [
        [U, R, F],
        [U, F, L],
        [U, L, B],
        [U, B, R],
        [D, F, R],
        [D, L, F],
        [D, B, L],
        [D, R, B],
    ]
};

const EDGE_COLORS: [[Face; 2]; EDGE_COUNT] = {
    use Face::*;
    [
        [U, R],
        [U, F],
        [U, L],
        [U, B],
        [D, R],
        [D, F],
        [D, L],
        [D, B],
        [F, R],
        [F, L],
        [B, L],
        [B, R],
    ]
};

/// A sticker color, written with its single-letter code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    White,
    Orange,
    Green,
    Red,
    Blue,
    Yellow,
}

impl Color {
    pub const ALL: [Self; 6] = [
        Color::White,
        Color::Orange,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::Yellow,
    ];

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Color::White => 'W',
            Color::Orange => 'O',
            Color::Green => 'G',
            Color::Red => 'R',
            Color::Blue => 'B',
            Color::Yellow => 'Y',
        }
    }

    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.letter() == letter.to_ascii_uppercase())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedInputError {
    #[error("Expected {FACELET_COUNT} stickers but got {actual}")]
    WrongLength { actual: usize },
    #[error("Face {face} must have 9 stickers but has {actual}")]
    WrongFaceLength { face: Face, actual: usize },
    #[error("Invalid color `{found}` on face {face} at index {index}, expected one of W, Y, G, B, R, O")]
    InvalidColor { face: Face, index: usize, found: char },
    #[error("The center of face {face} must be {expected} but is {found}")]
    CenterMismatch {
        face: Face,
        expected: Color,
        found: Color,
    },
    #[error("Each color must appear exactly 9 times but {color} appears {count} times")]
    ColorCount { color: Color, count: usize },
    #[error("Color {0} is assigned to more than one face")]
    DuplicateSchemeColor(Color),
}

/// Binding of center colors to faces. Fixed for the lifetime of whatever
/// uses it and shared by reference.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    colors: [Color; 6],
}

impl Default for ColorScheme {
    /// White top, green front, red right.
    fn default() -> Self {
        Self {
            colors: [
                Color::White,
                Color::Red,
                Color::Green,
                Color::Yellow,
                Color::Orange,
                Color::Blue,
            ],
        }
    }
}

impl ColorScheme {
    /// Create a scheme from the center colors, indexed in `U R F D L B`
    /// order.
    ///
    /// # Errors
    ///
    /// If two faces share a color.
    pub fn new(colors: [Color; 6]) -> Result<Self, MalformedInputError> {
        for (i, color) in colors.iter().enumerate() {
            if colors[..i].contains(color) {
                return Err(MalformedInputError::DuplicateSchemeColor(*color));
            }
        }
        Ok(Self { colors })
    }

    #[must_use]
    pub fn color_of(&self, face: Face) -> Color {
        self.colors[face as usize]
    }

    #[must_use]
    pub fn face_of(&self, color: Color) -> Face {
        // The six colors are distinct, so every color names exactly one face
        let index = self
            .colors
            .iter()
            .position(|&c| c == color)
            .unwrap_or_default();
        Face::ALL[index]
    }
}

/// 54 stickers, each recorded as the face whose center shares its color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FaceletCube {
    facelets: [Face; FACELET_COUNT],
}

impl Default for FaceletCube {
    fn default() -> Self {
        Self::from_cubie(&CubieCube::SOLVED)
    }
}

impl FaceletCube {
    /// Parse the color grid: 54 color letters in `U L F R B D` face order,
    /// either contiguous or as six whitespace separated faces.
    ///
    /// # Errors
    ///
    /// If the input has the wrong shape, contains an unknown letter, or a
    /// center does not match `scheme`.
    pub fn parse(input: &str, scheme: &ColorScheme) -> Result<Self, MalformedInputError> {
        let stickers = split_stickers(input)?;
        let mut facelets = [Face::U; FACELET_COUNT];

        for (k, letter) in stickers.into_iter().enumerate() {
            let face = INPUT_FACE_ORDER[k / 9];
            let index = k % 9;
            let color = Color::from_letter(letter).ok_or(MalformedInputError::InvalidColor {
                face,
                index,
                found: letter,
            })?;
            if index == CENTER && color != scheme.color_of(face) {
                return Err(MalformedInputError::CenterMismatch {
                    face,
                    expected: scheme.color_of(face),
                    found: color,
                });
            }
            facelets[face as usize * 9 + index] = scheme.face_of(color);
        }

        Ok(Self { facelets })
    }

    /// Parse a face-letter string (`UUUUUUUUURRRRRRRRRFFF...`) in `U R F D L
    /// B` face order.
    ///
    /// # Errors
    ///
    /// If the input has the wrong length, contains a letter that is not a
    /// face, or a center is not its own face.
    pub fn from_face_letters(input: &str) -> Result<Self, MalformedInputError> {
        let letters = input.trim().chars().collect::<Vec<_>>();
        if letters.len() != FACELET_COUNT {
            return Err(MalformedInputError::WrongLength {
                actual: letters.len(),
            });
        }

        let mut facelets = [Face::U; FACELET_COUNT];
        for (k, letter) in letters.into_iter().enumerate() {
            let face = Face::ALL[k / 9];
            let index = k % 9;
            let sticker = Face::from_letter(letter).ok_or(MalformedInputError::InvalidColor {
                face,
                index,
                found: letter,
            })?;
            if index == CENTER && sticker != face {
                let scheme = ColorScheme::default();
                return Err(MalformedInputError::CenterMismatch {
                    face,
                    expected: scheme.color_of(face),
                    found: scheme.color_of(sticker),
                });
            }
            facelets[k] = sticker;
        }

        Ok(Self { facelets })
    }

    #[must_use]
    pub fn to_face_letters(&self) -> String {
        self.facelets.iter().map(|face| face.letter()).collect()
    }

    /// The color grid in input order, the inverse of [`FaceletCube::parse`].
    #[must_use]
    pub fn to_colors(&self, scheme: &ColorScheme) -> String {
        INPUT_FACE_ORDER
            .iter()
            .flat_map(|&face| &self.facelets[face as usize * 9..face as usize * 9 + 9])
            .map(|&sticker| scheme.color_of(sticker).letter())
            .collect()
    }

    /// How many stickers carry each face's color, indexed by face.
    #[must_use]
    pub fn color_counts(&self) -> [usize; 6] {
        let mut counts = [0; 6];
        for face in self.facelets {
            counts[face as usize] += 1;
        }
        counts
    }

    #[must_use]
    pub fn facelets(&self) -> &[Face; FACELET_COUNT] {
        &self.facelets
    }

    /// Identify the piece and orientation in every slot.
    ///
    /// The result is not checked for solvability; a sticker combination that
    /// is no physical piece is the only failure here.
    ///
    /// # Errors
    ///
    /// If the stickers of a corner or edge slot do not belong to any piece.
    pub fn to_cubie(&self) -> Result<CubieCube, UnsolvableConfigurationError> {
        let mut cube = CubieCube::SOLVED;

        for (slot, positions) in CORNER_FACELETS.iter().enumerate() {
            let unknown = UnsolvableConfigurationError::UnknownCorner {
                position: Corner::ALL[slot],
            };
            let ori = (0..3)
                .find(|&o| matches!(self.facelets[positions[o]], Face::U | Face::D))
                .ok_or(unknown.clone())?;
            let col1 = self.facelets[positions[(ori + 1) % 3]];
            let col2 = self.facelets[positions[(ori + 2) % 3]];
            let corner = CORNER_COLORS
                .iter()
                .position(|colors| colors[1] == col1 && colors[2] == col2)
                .ok_or(unknown)?;
            cube.cp[slot] = corner as u8;
            cube.co[slot] = ori as u8;
        }

        for (slot, positions) in EDGE_FACELETS.iter().enumerate() {
            let a = self.facelets[positions[0]];
            let b = self.facelets[positions[1]];
            let (edge, ori) = EDGE_COLORS
                .iter()
                .enumerate()
                .find_map(|(edge, colors)| match *colors {
                    [x, y] if x == a && y == b => Some((edge, 0)),
                    [x, y] if x == b && y == a => Some((edge, 1)),
                    _ => None,
                })
                .ok_or(UnsolvableConfigurationError::UnknownEdge {
                    position: Edge::ALL[slot],
                })?;
            cube.ep[slot] = edge as u8;
            cube.eo[slot] = ori;
        }

        Ok(cube)
    }

    /// Paint the stickers of a cubie state.
    ///
    /// # Panics
    ///
    /// If `cube` holds a piece or orientation index out of range.
    #[must_use]
    pub fn from_cubie(cube: &CubieCube) -> Self {
        let mut facelets = [Face::U; FACELET_COUNT];
        for face in Face::ALL {
            facelets[face as usize * 9 + CENTER] = face;
        }

        for (slot, positions) in CORNER_FACELETS.iter().enumerate() {
            let corner = cube.cp[slot] as usize;
            let ori = cube.co[slot] as usize;
            for k in 0..3 {
                facelets[positions[(k + ori) % 3]] = CORNER_COLORS[corner][k];
            }
        }

        for (slot, positions) in EDGE_FACELETS.iter().enumerate() {
            let edge = cube.ep[slot] as usize;
            let ori = cube.eo[slot] as usize;
            for k in 0..2 {
                facelets[positions[(k + ori) % 2]] = EDGE_COLORS[edge][k];
            }
        }

        Self { facelets }
    }
}

impl fmt::Display for FaceletCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_colors(&ColorScheme::default()))
    }
}

fn split_stickers(input: &str) -> Result<Vec<char>, MalformedInputError> {
    let groups = input.split_whitespace().collect::<Vec<_>>();

    if groups.len() == INPUT_FACE_ORDER.len() {
        for (&face, group) in INPUT_FACE_ORDER.iter().zip(&groups) {
            let actual = group.chars().count();
            if actual != 9 {
                return Err(MalformedInputError::WrongFaceLength { face, actual });
            }
        }
    }

    let stickers = groups.concat().chars().collect::<Vec<_>>();
    if stickers.len() != FACELET_COUNT {
        return Err(MalformedInputError::WrongLength {
            actual: stickers.len(),
        });
    }
    Ok(stickers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveSequence;

    const SOLVED_COLORS: &str = "WWWWWWWWWOOOOOOOOOGGGGGGGGGRRRRRRRRRBBBBBBBBBYYYYYYYYY";

    // Scrambles paired with the face-letter strings other two-phase solvers
    // produce for them.
    const KNOWN_STATES: [[&str; 2]; 8] = [
        ["", "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB"],
        [
            "U",
            "UUUUUUUUUBBBRRRRRRRRRFFFFFFDDDDDDDDDFFFLLLLLLLLLBBBBBB",
        ],
        [
            "U2 R2 L D2 L F2 B2 U' D' F U R' L2 U2 D L F' B2 D R2",
            "FLLLULFRFRUURRRBBBLDDFFUBRUDFRDDUFLDUFUFLDLBRBDRBBULBD",
        ],
        [
            "L U' R2 F B2 R2 L U' D2 R2 F B' U R' U2 R2 D2 F2 U2 L'",
            "BLBLUFFFFDULURFRRULDLBFRDBUFDFBDDDBRDUUFLULRRUDRLBRBLB",
        ],
        [
            "R2 D' B2 U' D' R2 U' L2 U' L2 B' R' F D F' B U2 L'",
            "BUDFUDRFDBRFURBFDRDULRFBUBURDLFDLRDDULFULBBRFLRLLBLBFU",
        ],
        [
            "L D2 R' L' D2 F' R' L' F B2 U' D F B' R' U2 L",
            "FRFDUDULRUBDFRBFFRLDBLFRDULRRDLDUBLULFBBLFDBBRDURBUFUL",
        ],
        [
            "F U' F' B' L' U F B R F' B D2 F B2 U2 R2 U2 D2 F B",
            "RRDBUFDLBLLFLRRURBRUDLFDLRRUUBUDBRBLDDBDLBUFFLDFFBFUUF",
        ],
        [
            "U2 D2 L2 F' B L2 B2 U2 F' R L2 F' B2 U2 D F' U' D2 R U2 D F2",
            "LBDLULDDURDRRRFRURBFFRFBFRDLDBDDBDFBBULRLFFBUFLUUBUULL",
        ],
    ];

    #[test]
    fn solved_round_trip() {
        let scheme = ColorScheme::default();
        let facelets = FaceletCube::parse(SOLVED_COLORS, &scheme).unwrap();
        assert_eq!(facelets, FaceletCube::default());
        assert_eq!(facelets.to_cubie().unwrap(), CubieCube::SOLVED);
        assert_eq!(facelets.to_colors(&scheme), SOLVED_COLORS);
        assert_eq!(facelets.to_string(), SOLVED_COLORS);
    }

    #[test]
    fn known_states_match_face_letter_strings() {
        for [scramble, expected] in KNOWN_STATES {
            let seq: MoveSequence = scramble.parse().unwrap();
            let cube = CubieCube::from_moves(seq);
            let facelets = FaceletCube::from_cubie(&cube);
            assert_eq!(facelets.to_face_letters(), expected, "scramble `{scramble}`");

            let parsed = FaceletCube::from_face_letters(expected).unwrap();
            assert_eq!(parsed.to_cubie().unwrap(), cube);
        }
    }

    #[test]
    fn color_grid_round_trips_through_cubies() {
        let scheme = ColorScheme::default();
        for [scramble, _] in KNOWN_STATES {
            let cube = CubieCube::from_moves(scramble.parse::<MoveSequence>().unwrap());
            let colors = FaceletCube::from_cubie(&cube).to_colors(&scheme);
            let parsed = FaceletCube::parse(&colors, &scheme).unwrap();
            assert_eq!(parsed.to_cubie().unwrap(), cube);
        }
    }

    #[test]
    fn accepts_grouped_lowercase_input() {
        let grouped = "wwwwwwwww ooooooooo ggggggggg rrrrrrrrr bbbbbbbbb yyyyyyyyy";
        let facelets = FaceletCube::parse(grouped, &ColorScheme::default()).unwrap();
        assert_eq!(facelets, FaceletCube::default());
    }

    #[test]
    fn rejects_malformed_input() {
        let scheme = ColorScheme::default();
        assert_eq!(
            FaceletCube::parse(&SOLVED_COLORS[1..], &scheme),
            Err(MalformedInputError::WrongLength { actual: 53 })
        );
        assert_eq!(
            FaceletCube::parse(
                "WWWWWWWW OOOOOOOOOO GGGGGGGGG RRRRRRRRR BBBBBBBBB YYYYYYYYY",
                &scheme
            ),
            Err(MalformedInputError::WrongFaceLength {
                face: Face::U,
                actual: 8
            })
        );

        let mut bad_letter = SOLVED_COLORS.to_owned();
        bad_letter.replace_range(20..21, "X");
        assert_eq!(
            FaceletCube::parse(&bad_letter, &scheme),
            Err(MalformedInputError::InvalidColor {
                face: Face::F,
                index: 2,
                found: 'X'
            })
        );

        let mut bad_center = SOLVED_COLORS.to_owned();
        bad_center.replace_range(4..5, "Y");
        assert_eq!(
            FaceletCube::parse(&bad_center, &scheme),
            Err(MalformedInputError::CenterMismatch {
                face: Face::U,
                expected: Color::White,
                found: Color::Yellow
            })
        );
    }

    #[test]
    fn scheme_rejects_duplicates() {
        assert_eq!(
            ColorScheme::new([Color::White; 6]),
            Err(MalformedInputError::DuplicateSchemeColor(Color::White))
        );
        let scheme = ColorScheme::default();
        for face in Face::ALL {
            assert_eq!(scheme.face_of(scheme.color_of(face)), face);
        }
    }

    #[test]
    fn custom_scheme_changes_centers() {
        let scheme = ColorScheme::new([
            Color::Yellow,
            Color::Red,
            Color::Blue,
            Color::White,
            Color::Orange,
            Color::Green,
        ])
        .unwrap();
        let colors = FaceletCube::default().to_colors(&scheme);
        assert!(colors.starts_with("YYYYYYYYY"));
        assert_eq!(
            FaceletCube::parse(&colors, &scheme).unwrap(),
            FaceletCube::default()
        );
        assert!(FaceletCube::parse(&colors, &ColorScheme::default()).is_err());
    }

    #[test]
    fn impossible_corner_stickers() {
        // Two white stickers on one corner
        let mut letters = FaceletCube::default().to_face_letters();
        letters.replace_range(9..10, "U");
        let facelets = FaceletCube::from_face_letters(&letters).unwrap();
        assert_eq!(
            facelets.to_cubie(),
            Err(UnsolvableConfigurationError::UnknownCorner {
                position: Corner::URF
            })
        );
    }
}
