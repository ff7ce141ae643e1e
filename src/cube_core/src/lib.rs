//! Cube state representations for the two-phase solver: stickers, cubies,
//! the 18 face turns and the solvability gate between them.

pub mod cubie;
pub mod facelet;
pub mod moves;
pub mod scramble;
pub mod validate;

pub use cubie::CubieCube;
pub use facelet::{Color, ColorScheme, FaceletCube, MalformedInputError};
pub use moves::{Face, Move, MoveParseError, MoveSequence, Turn};
pub use validate::{UnsolvableConfigurationError, ValidationError, check_solvable, validate_facelets};
