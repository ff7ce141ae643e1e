use crate::{
    cubie::{CORNER_COUNT, Corner, CubieCube, EDGE_COUNT, Edge},
    facelet::{Color, ColorScheme, FaceletCube, MalformedInputError},
};
use thiserror::Error;

/// A state that parses fine but is no physical cube.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsolvableConfigurationError {
    #[error("The stickers of corner slot {position} do not belong to any corner")]
    UnknownCorner { position: Corner },
    #[error("The stickers of edge slot {position} do not belong to any edge")]
    UnknownEdge { position: Edge },
    #[error("Corner {corner} does not appear exactly once")]
    MissingCorner { corner: Corner },
    #[error("Edge {edge} does not appear exactly once")]
    MissingEdge { edge: Edge },
    #[error("Corner slot {position} has orientation {orientation}, expected 0, 1 or 2")]
    CornerOrientationOutOfRange { position: Corner, orientation: u8 },
    #[error("Edge slot {position} has orientation {orientation}, expected 0 or 1")]
    EdgeOrientationOutOfRange { position: Edge, orientation: u8 },
    #[error("Corner and edge permutation parities differ (two pieces are swapped)")]
    ParityMismatch,
    #[error("Corner twists sum to {twist_sum}, which is not a multiple of 3 (a corner is twisted)")]
    CornerTwist { twist_sum: u32 },
    #[error("Edge flips sum to {flip_sum}, which is not even (an edge is flipped)")]
    EdgeFlip { flip_sum: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),
    #[error(transparent)]
    Unsolvable(#[from] UnsolvableConfigurationError),
}

/// Check that a cubie state can be reached from solved with face turns.
///
/// # Errors
///
/// With the first broken invariant, checked in this order: every piece
/// present once, orientations in range, matching permutation parities,
/// corner twist, edge flip.
pub fn check_solvable(cube: &CubieCube) -> Result<(), UnsolvableConfigurationError> {
    let mut seen_corners = [false; CORNER_COUNT];
    for &corner in &cube.cp {
        if let Some(seen) = seen_corners.get_mut(corner as usize) {
            *seen = true;
        }
    }
    if let Some(missing) = seen_corners.iter().position(|seen| !seen) {
        return Err(UnsolvableConfigurationError::MissingCorner {
            corner: Corner::ALL[missing],
        });
    }

    let mut seen_edges = [false; EDGE_COUNT];
    for &edge in &cube.ep {
        if let Some(seen) = seen_edges.get_mut(edge as usize) {
            *seen = true;
        }
    }
    if let Some(missing) = seen_edges.iter().position(|seen| !seen) {
        return Err(UnsolvableConfigurationError::MissingEdge {
            edge: Edge::ALL[missing],
        });
    }

    if let Some(slot) = cube.co.iter().position(|&o| o > 2) {
        return Err(UnsolvableConfigurationError::CornerOrientationOutOfRange {
            position: Corner::ALL[slot],
            orientation: cube.co[slot],
        });
    }
    if let Some(slot) = cube.eo.iter().position(|&o| o > 1) {
        return Err(UnsolvableConfigurationError::EdgeOrientationOutOfRange {
            position: Edge::ALL[slot],
            orientation: cube.eo[slot],
        });
    }

    if cube.corner_parity() != cube.edge_parity() {
        return Err(UnsolvableConfigurationError::ParityMismatch);
    }

    let twist_sum = cube.twist_sum();
    if twist_sum % 3 != 0 {
        return Err(UnsolvableConfigurationError::CornerTwist { twist_sum });
    }

    let flip_sum = cube.flip_sum();
    if flip_sum % 2 != 0 {
        return Err(UnsolvableConfigurationError::EdgeFlip { flip_sum });
    }

    Ok(())
}

/// Check that every color covers exactly nine stickers.
///
/// # Errors
///
/// With the first color, in [`Color::ALL`] order, whose
/// count is off.
pub fn check_color_counts(
    facelets: &FaceletCube,
    scheme: &ColorScheme,
) -> Result<(), MalformedInputError> {
    let counts = facelets.color_counts();
    for color in Color::ALL {
        let count = counts[scheme.face_of(color) as usize];
        if count != 9 {
            return Err(MalformedInputError::ColorCount { color, count });
        }
    }
    Ok(())
}

/// Run the whole gate on a color grid: parse, count colors, identify
/// pieces and check solvability.
///
/// # Errors
///
/// With the first problem found.
pub fn validate_facelets(input: &str, scheme: &ColorScheme) -> Result<CubieCube, ValidationError> {
    let facelets = FaceletCube::parse(input, scheme)?;
    check_color_counts(&facelets, scheme)?;
    let cube = facelets.to_cubie()?;
    check_solvable(&cube)?;
    Ok(cube)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveSequence;

    const SOLVED_COLORS: &str = "WWWWWWWWWOOOOOOOOOGGGGGGGGGRRRRRRRRRBBBBBBBBBYYYYYYYYY";

    fn edit(changes: &[(usize, char)]) -> String {
        let mut stickers = SOLVED_COLORS.chars().collect::<Vec<_>>();
        for &(index, color) in changes {
            stickers[index] = color;
        }
        stickers.into_iter().collect()
    }

    fn validate(input: &str) -> Result<CubieCube, ValidationError> {
        validate_facelets(input, &ColorScheme::default())
    }

    #[test]
    fn accepts_solved_and_scrambled() {
        assert_eq!(validate(SOLVED_COLORS), Ok(CubieCube::SOLVED));

        let seq: MoveSequence = "R U2 D' B L2".parse().unwrap();
        let cube = CubieCube::from_moves(seq);
        let colors = FaceletCube::from_cubie(&cube).to_colors(&ColorScheme::default());
        assert_eq!(validate(&colors), Ok(cube));
    }

    #[test]
    fn rejects_flipped_edge() {
        // The UF edge: U7 and F1
        let input = edit(&[(7, 'G'), (19, 'W')]);
        assert_eq!(
            validate(&input),
            Err(ValidationError::Unsolvable(
                UnsolvableConfigurationError::EdgeFlip { flip_sum: 1 }
            ))
        );
    }

    #[test]
    fn rejects_twisted_corner() {
        // The URF corner: U8, R0 and F2 rotated one step
        let input = edit(&[(8, 'G'), (27, 'W'), (20, 'R')]);
        assert!(matches!(
            validate(&input),
            Err(ValidationError::Unsolvable(
                UnsolvableConfigurationError::CornerTwist { .. }
            ))
        ));
    }

    #[test]
    fn rejects_swapped_edges() {
        // Exchange the UF and UR edges
        let input = edit(&[(7, 'W'), (19, 'R'), (5, 'W'), (28, 'G')]);
        assert_eq!(
            validate(&input),
            Err(ValidationError::Unsolvable(
                UnsolvableConfigurationError::ParityMismatch
            ))
        );
    }

    #[test]
    fn rejects_bad_color_counts() {
        let input = edit(&[(0, 'O'), (1, 'O'), (18, 'O')]);
        assert_eq!(
            validate(&input),
            Err(ValidationError::Malformed(MalformedInputError::ColorCount {
                color: Color::White,
                count: 7
            }))
        );
    }

    #[test]
    fn malformed_input_is_reported_before_solvability() {
        assert!(matches!(
            validate("WWW"),
            Err(ValidationError::Malformed(
                MalformedInputError::WrongLength { actual: 3 }
            ))
        ));
    }

    #[test]
    fn cubie_checks() {
        let mut cube = CubieCube::SOLVED;
        cube.cp[0] = 1;
        assert_eq!(
            check_solvable(&cube),
            Err(UnsolvableConfigurationError::MissingCorner {
                corner: Corner::URF
            })
        );

        let mut cube = CubieCube::SOLVED;
        cube.ep[11] = 20;
        assert_eq!(
            check_solvable(&cube),
            Err(UnsolvableConfigurationError::MissingEdge { edge: Edge::BR })
        );

        let mut cube = CubieCube::SOLVED;
        cube.co[3] = 3;
        assert_eq!(
            check_solvable(&cube),
            Err(UnsolvableConfigurationError::CornerOrientationOutOfRange {
                position: Corner::UBR,
                orientation: 3
            })
        );

        let mut cube = CubieCube::SOLVED;
        cube.co = [1, 2, 0, 0, 0, 0, 0, 0];
        cube.eo[0] = 1;
        cube.eo[5] = 1;
        assert_eq!(check_solvable(&cube), Ok(()));
    }
}
