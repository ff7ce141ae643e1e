use crate::{
    canonical_fsm::{CanonicalFsm, CanonicalFsmState},
    config::SearchConfig,
    coord::{phase1_coords, phase2_coords},
    move_tables::{PHASE2_MOVES, is_phase2_move},
    pruning::Tables,
    start, success, working,
};
use cube_core::{
    CubieCube, MalformedInputError, Move, MoveSequence, UnsolvableConfigurationError,
    ValidationError,
    facelet::{ColorScheme, FaceletCube},
    validate::{check_color_counts, check_solvable},
};
use itertools::Itertools;
use log::{debug, info};
use std::{
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use thiserror::Error;

/// Phase 2 depth allowed when the cube starts inside the phase 2 subgroup.
const UNRESTRICTED_PHASE2_DEPTH: usize = 18;

/// Deadline checks are amortized over this many nodes, starting with the
/// first.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Solves cubes with Kociemba's two-phase algorithm. A solver is immutable;
/// every solve builds its own search state, so one solver and its tables can
/// serve many threads at once.
#[derive(Debug, Clone)]
pub struct Solver {
    tables: Arc<Tables>,
    canonical_fsm: Arc<CanonicalFsm>,
    config: SearchConfig,
}

/// The search state of one solve.
struct SolverMutable<'a> {
    cube: CubieCube,
    phase1_moves: Vec<Move>,
    phase2_moves: Vec<Move>,
    best: Option<(Vec<Move>, usize)>,
    phase1_solutions: usize,
    nodes_visited: u64,
    deadline: Instant,
    cancel: Option<&'a AtomicBool>,
    halt: Option<Halt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Cancelled,
    Budget,
    Done,
}

/// A verified solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub moves: MoveSequence,
    /// How many of the moves belong to phase 1.
    pub phase1_length: usize,
    pub nodes_visited: u64,
    pub elapsed: Duration,
}

#[derive(Error, Debug)]
pub enum SolveError {
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),
    #[error(transparent)]
    Unsolvable(#[from] UnsolvableConfigurationError),
    #[error("No solution found within the search budget ({nodes} nodes in {elapsed:.3?})")]
    SearchTimeout { nodes: u64, elapsed: Duration },
    #[error("The search was cancelled")]
    Cancelled,
    #[error("The solution `{0}` does not solve the cube")]
    VerificationFailed(MoveSequence),
}

impl From<ValidationError> for SolveError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::Malformed(e) => SolveError::Malformed(e),
            ValidationError::Unsolvable(e) => SolveError::Unsolvable(e),
        }
    }
}

impl Solution {
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl SolverMutable<'_> {
    fn best_length(&self) -> Option<usize> {
        self.best.as_ref().map(|(moves, _)| moves.len())
    }

    /// Count a node and stop the search once the budget runs out.
    fn visit(&mut self, node_limit: u64) -> ControlFlow<()> {
        self.nodes_visited += 1;
        if self.cancel.is_some_and(|cancel| cancel.load(Ordering::Relaxed)) {
            self.halt = Some(Halt::Cancelled);
            return ControlFlow::Break(());
        }
        if self.nodes_visited > node_limit
            || (self.nodes_visited % DEADLINE_CHECK_INTERVAL == 1 && Instant::now() >= self.deadline)
        {
            self.halt = Some(Halt::Budget);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

impl Solver {
    #[must_use]
    pub fn new(tables: Arc<Tables>) -> Self {
        Self {
            tables,
            canonical_fsm: Arc::new(CanonicalFsm::new()),
            config: SearchConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_max_solution_length(mut self, max_solution_length: usize) -> Self {
        self.config.max_length = max_solution_length;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn tables(&self) -> &Arc<Tables> {
        &self.tables
    }

    /// Validate a color grid and solve it.
    ///
    /// # Errors
    ///
    /// If the input is malformed or unsolvable, or the search fails. See
    /// [`SolveError`].
    pub fn solve_facelets(&self, input: &str, scheme: &ColorScheme) -> Result<Solution, SolveError> {
        let facelets = FaceletCube::parse(input, scheme)?;
        check_color_counts(&facelets, scheme)?;
        let cube = facelets.to_cubie()?;
        self.solve_cubie(&cube)
    }

    /// # Errors
    ///
    /// If the cube is unsolvable or the search fails. See [`SolveError`].
    pub fn solve_cubie(&self, cube: &CubieCube) -> Result<Solution, SolveError> {
        self.solve_inner(cube, None)
    }

    /// Like [`Solver::solve_cubie`], giving up with [`SolveError::Cancelled`]
    /// once `cancel` is set.
    ///
    /// # Errors
    ///
    /// If the cube is unsolvable, the search fails or is cancelled. See
    /// [`SolveError`].
    pub fn solve_with_cancel(
        &self,
        cube: &CubieCube,
        cancel: &AtomicBool,
    ) -> Result<Solution, SolveError> {
        self.solve_inner(cube, Some(cancel))
    }

    fn solve_inner(
        &self,
        cube: &CubieCube,
        cancel: Option<&AtomicBool>,
    ) -> Result<Solution, SolveError> {
        check_solvable(cube)?;

        info!(start!("Searching for a two-phase solution"));
        let start = Instant::now();

        let mut mutable = SolverMutable {
            cube: *cube,
            phase1_moves: Vec::with_capacity(self.config.max_length),
            phase2_moves: Vec::with_capacity(self.config.max_length),
            best: None,
            phase1_solutions: 0,
            nodes_visited: 0,
            deadline: start + self.config.timeout(),
            cancel,
            halt: None,
        };

        let (twist, flip, slice) = phase1_coords(cube);
        let root_heuristic = usize::from(self.tables.phase1_heuristic(twist, flip, slice));

        for depth in root_heuristic..=self.config.max_length {
            if mutable.best_length().is_some_and(|best| best <= depth) {
                break;
            }
            debug!(working!("Searching phase 1 depth {}..."), depth);
            let depth_start = Instant::now();
            let flow = self.search_phase1(
                &mut mutable,
                (twist, flip, slice),
                CanonicalFsmState::default(),
                depth,
            );
            debug!(
                working!("Traversed {} nodes in {:.3}s"),
                mutable.nodes_visited,
                depth_start.elapsed().as_secs_f64()
            );
            if flow.is_break() {
                break;
            }
        }

        let elapsed = start.elapsed();
        if mutable.halt == Some(Halt::Cancelled) {
            return Err(SolveError::Cancelled);
        }
        let Some((moves, phase1_length)) = mutable.best else {
            return Err(SolveError::SearchTimeout {
                nodes: mutable.nodes_visited,
                elapsed,
            });
        };

        let moves = MoveSequence::new(moves);
        if !cube.apply_moves(moves.iter()).is_solved() {
            return Err(SolveError::VerificationFailed(moves));
        }

        info!(
            success!("Found a {} move solution ({} + {}) after {} nodes in {:.3}s"),
            moves.len(),
            phase1_length,
            moves.len() - phase1_length,
            mutable.nodes_visited,
            elapsed.as_secs_f64()
        );

        Ok(Solution {
            moves,
            phase1_length,
            nodes_visited: mutable.nodes_visited,
            elapsed,
        })
    }

    /// IDA* over phase 1 for sequences of exactly `togo` more moves. Every
    /// sequence that lands in the phase 2 subgroup hands over to phase 2.
    fn search_phase1(
        &self,
        mutable: &mut SolverMutable,
        (twist, flip, slice): (u16, u16, u16),
        fsm_state: CanonicalFsmState,
        togo: usize,
    ) -> ControlFlow<()> {
        mutable.visit(self.config.node_limit)?;

        let heuristic = usize::from(self.tables.phase1_heuristic(twist, flip, slice));
        if heuristic > togo {
            return ControlFlow::Continue(());
        }

        if togo == 0 {
            // A phase 1 solution ending in a phase 2 move has a shorter prefix
            // that was already tried
            if mutable
                .phase1_moves
                .last()
                .is_some_and(|&last| is_phase2_move(last))
            {
                return ControlFlow::Continue(());
            }
            return self.start_phase2(mutable, fsm_state);
        }

        let moves = &self.tables.moves;
        for move_ in Move::ALL {
            let Some(next_fsm_state) = self.canonical_fsm.next_state(fsm_state, move_.face) else {
                continue;
            };
            let m = move_.index();
            let next = (
                moves.twist.apply(twist, m),
                moves.flip.apply(flip, m),
                moves.slice_position.apply(slice, m),
            );

            mutable.phase1_moves.push(move_);
            let flow = self.search_phase1(mutable, next, next_fsm_state, togo - 1);
            mutable.phase1_moves.pop();
            flow?;
        }

        ControlFlow::Continue(())
    }

    /// Run phase 2 IDA* from the end of the current phase 1 sequence, within
    /// the bound that would still improve on the best solution.
    fn start_phase2(
        &self,
        mutable: &mut SolverMutable,
        fsm_state: CanonicalFsmState,
    ) -> ControlFlow<()> {
        mutable.phase1_solutions += 1;

        let phase1_length = mutable.phase1_moves.len();
        let cap = if phase1_length == 0 {
            UNRESTRICTED_PHASE2_DEPTH
        } else {
            self.config.max_phase2_depth
        };
        let length_limit = mutable
            .best_length()
            .map_or(self.config.max_length, |best| best.saturating_sub(1));
        let limit = cap.min(length_limit.saturating_sub(phase1_length));
        if phase1_length > length_limit {
            return self.phase1_solution_done(mutable);
        }

        let cube = mutable.cube.apply_moves(mutable.phase1_moves.iter().copied());
        let (corner_perm, edge_perm, slice_perm) = phase2_coords(&cube);
        let root_heuristic =
            usize::from(self.tables.phase2_heuristic(corner_perm, edge_perm, slice_perm));

        for depth in root_heuristic..=limit {
            let flow = self.search_phase2(
                mutable,
                (corner_perm, edge_perm, slice_perm),
                fsm_state,
                depth,
            );
            match flow {
                ControlFlow::Break(true) => {
                    let mut moves = mutable.phase1_moves.clone();
                    moves.extend_from_slice(&mutable.phase2_moves);
                    debug!(
                        working!("Found a {} move solution ({} + {}): {}"),
                        moves.len(),
                        phase1_length,
                        depth,
                        moves.iter().join(" ")
                    );
                    mutable.best = Some((moves, phase1_length));
                    mutable.phase2_moves.clear();
                    break;
                }
                ControlFlow::Break(false) => return ControlFlow::Break(()),
                ControlFlow::Continue(()) => {}
            }
        }

        self.phase1_solution_done(mutable)
    }

    fn phase1_solution_done(&self, mutable: &mut SolverMutable) -> ControlFlow<()> {
        let Some(best) = mutable.best_length() else {
            return ControlFlow::Continue(());
        };
        if best <= self.config.target_length
            || mutable.phase1_solutions >= self.config.max_phase1_solutions
        {
            mutable.halt = Some(Halt::Done);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    /// IDA* over phase 2 for sequences of exactly `togo` more moves. Breaks
    /// with `true` when the cube is solved, leaving the moves in
    /// `phase2_moves`, and with `false` when the budget runs out.
    fn search_phase2(
        &self,
        mutable: &mut SolverMutable,
        (corner_perm, edge_perm, slice_perm): (u16, u16, u16),
        fsm_state: CanonicalFsmState,
        togo: usize,
    ) -> ControlFlow<bool> {
        if mutable.visit(self.config.node_limit).is_break() {
            return ControlFlow::Break(false);
        }

        let heuristic =
            usize::from(self.tables.phase2_heuristic(corner_perm, edge_perm, slice_perm));
        if heuristic > togo {
            return ControlFlow::Continue(());
        }
        if togo == 0 {
            // Both tables are exact, so a zero heuristic is the solved cube
            return if heuristic == 0 {
                ControlFlow::Break(true)
            } else {
                ControlFlow::Continue(())
            };
        }

        let moves = &self.tables.moves;
        for (m, move_) in PHASE2_MOVES.into_iter().enumerate() {
            let Some(next_fsm_state) = self.canonical_fsm.next_state(fsm_state, move_.face) else {
                continue;
            };
            let next = (
                moves.corner_perm.apply(corner_perm, m),
                moves.ud_edge_perm.apply(edge_perm, m),
                moves.slice_perm.apply(slice_perm, m),
            );

            mutable.phase2_moves.push(move_);
            match self.search_phase2(mutable, next, next_fsm_state, togo - 1) {
                ControlFlow::Break(true) => return ControlFlow::Break(true),
                ControlFlow::Break(false) => {
                    mutable.phase2_moves.pop();
                    return ControlFlow::Break(false);
                }
                ControlFlow::Continue(()) => {
                    mutable.phase2_moves.pop();
                }
            }
        }

        ControlFlow::Continue(())
    }
}
