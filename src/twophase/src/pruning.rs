use crate::{
    config::TableConfig,
    coord::{CornerPerm, Coordinate, Flip, SlicePerm, SlicePosition, Twist, UdEdgePerm},
    move_tables::{MoveTable, MoveTables},
    start, success, working,
};
use log::{debug, info};
use std::{sync::Arc, time::Instant};

const UNVISITED: u8 = u8::MAX;

/// Exact distance to solved of a pair of coordinates, saturating at the
/// depth cap. Entry `a * len(b) + b` holds the distance of the pair `(a, b)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruningTable {
    depths: Box<[u8]>,
    b_count: usize,
}

impl PruningTable {
    /// Breadth first search from the solved pair under every move the two
    /// move tables share. `threads` workers split each level.
    ///
    /// # Panics
    ///
    /// If the move tables disagree on their move set, or a worker panics.
    #[must_use]
    pub fn generate(a: &MoveTable, b: &MoveTable, depth_cap: u8, threads: usize) -> Self {
        assert_eq!(a.width(), b.width());
        let threads = threads.max(1);
        let depth_cap = depth_cap.max(1);
        let b_count = b.len();
        let size = a.len() * b_count;

        let mut depths = vec![UNVISITED; size];
        depths[0] = 0;
        let mut visited = 1;
        let mut frontier = 1;
        let mut depth = 0;

        let neighbors = |index: usize| {
            let (coord_a, coord_b) = ((index / b_count) as u16, (index % b_count) as u16);
            (0..a.width()).map(move |m| {
                usize::from(a.apply(coord_a, m)) * b_count + usize::from(b.apply(coord_b, m))
            })
        };

        while depth < depth_cap && visited < size && frontier > 0 {
            let level_start = Instant::now();
            // Walking backwards from the unvisited entries is cheaper once they
            // are outnumbered by the frontier
            let found = if frontier <= size - visited {
                expand_forward(&mut depths, depth, threads, &neighbors)
            } else {
                expand_backward(&mut depths, depth, threads, &neighbors)
            };

            depth += 1;
            visited += found;
            frontier = found;
            debug!(
                working!("Depth {} holds {} entries ({:.3}s)"),
                depth,
                found,
                level_start.elapsed().as_secs_f64()
            );
        }

        for entry in &mut depths {
            if *entry == UNVISITED {
                *entry = depth_cap;
            }
        }

        Self {
            depths: depths.into_boxed_slice(),
            b_count,
        }
    }

    pub(crate) fn from_raw(depths: Box<[u8]>, b_count: usize) -> Self {
        Self { depths, b_count }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.depths
    }

    #[inline]
    #[must_use]
    pub fn get(&self, a: u16, b: u16) -> u8 {
        self.depths[usize::from(a) * self.b_count + usize::from(b)]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.depths.iter().copied().max().unwrap_or_default()
    }
}

/// Every worker scans a share of the table for frontier entries and collects
/// their unvisited neighbors; the results are merged once all have joined.
fn expand_forward<N, I>(depths: &mut [u8], depth: u8, threads: usize, neighbors: &N) -> usize
where
    N: Fn(usize) -> I + Sync,
    I: Iterator<Item = usize>,
{
    let chunk_len = depths.len().div_ceil(threads);
    let snapshot: &[u8] = depths;

    let discovered = crossbeam::scope(|s| {
        let workers = (0..threads)
            .map(|t| {
                s.spawn(move |_| {
                    let start = (t * chunk_len).min(snapshot.len());
                    let end = ((t + 1) * chunk_len).min(snapshot.len());
                    let mut found = vec![];
                    for index in start..end {
                        if snapshot[index] != depth {
                            continue;
                        }
                        found.extend(neighbors(index).filter(|&n| snapshot[n] == UNVISITED));
                    }
                    found
                })
            })
            .collect::<Vec<_>>();

        workers
            .into_iter()
            .map(|worker| worker.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|e| std::panic::resume_unwind(e));

    let mut count = 0;
    for index in discovered.into_iter().flatten() {
        if depths[index] == UNVISITED {
            depths[index] = depth + 1;
            count += 1;
        }
    }
    count
}

/// Every worker owns a disjoint range of the table and marks each unvisited
/// entry in it that has a neighbor on the frontier. Moves are closed under
/// inverses, so such a neighbor is also a predecessor.
fn expand_backward<N, I>(depths: &mut [u8], depth: u8, threads: usize, neighbors: &N) -> usize
where
    N: Fn(usize) -> I + Sync,
    I: Iterator<Item = usize>,
{
    let chunk_len = depths.len().div_ceil(threads);
    let snapshot = depths.to_vec();
    let snapshot = &snapshot;

    crossbeam::scope(|s| {
        let workers = depths
            .chunks_mut(chunk_len)
            .enumerate()
            .map(|(t, chunk)| {
                s.spawn(move |_| {
                    let offset = t * chunk_len;
                    let mut count = 0;
                    for (i, entry) in chunk.iter_mut().enumerate() {
                        if *entry == UNVISITED
                            && neighbors(offset + i).any(|n| snapshot[n] == depth)
                        {
                            *entry = depth + 1;
                            count += 1;
                        }
                    }
                    count
                })
            })
            .collect::<Vec<_>>();

        workers
            .into_iter()
            .map(|worker| worker.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .sum()
    })
    .unwrap_or_else(|e| std::panic::resume_unwind(e))
}

/// Everything the search reads: move tables for the six coordinates and the
/// four pruning tables.
#[derive(Debug, Clone)]
pub struct Tables {
    pub moves: MoveTables,
    /// Phase 1, indexed by twist then slice position.
    pub twist_slice: PruningTable,
    /// Phase 1, indexed by flip then slice position.
    pub flip_slice: PruningTable,
    /// Phase 2, indexed by corner permutation then slice permutation.
    pub corner_slice: PruningTable,
    /// Phase 2, indexed by U/D edge permutation then slice permutation.
    pub edge_slice: PruningTable,
    pub depth_cap: u8,
}

impl Tables {
    /// Build every table from scratch. The four pruning tables are generated
    /// concurrently, each with a share of the configured threads.
    ///
    /// # Panics
    ///
    /// If a table generation worker panics.
    #[must_use]
    pub fn generate(config: &TableConfig) -> Self {
        info!(start!("Generating pruning tables"));
        let start = Instant::now();

        let moves = MoveTables::generate();
        let pruning = Self::generate_pruning(&moves, config);
        let tables = Self::from_parts(moves, pruning, config.effective_depth_cap());

        info!(
            success!("Generated pruning tables in {:.3}s"),
            start.elapsed().as_secs_f64()
        );
        tables
    }

    pub(crate) fn generate_pruning(moves: &MoveTables, config: &TableConfig) -> [PruningTable; 4] {
        let depth_cap = config.effective_depth_cap();
        let inner_threads = (config.thread_count() / 4).max(1);

        let generate = |a: &MoveTable, b: &MoveTable, name: &str| {
            let start = Instant::now();
            let table = PruningTable::generate(a, b, depth_cap, inner_threads);
            debug!(
                working!("Generated the {} table ({} entries, max depth {}) in {:.3}s"),
                name,
                table.len(),
                table.max_depth(),
                start.elapsed().as_secs_f64()
            );
            table
        };

        crossbeam::scope(|s| {
            let twist_slice = s.spawn(|_| generate(&moves.twist, &moves.slice_position, "twist×slice"));
            let flip_slice = s.spawn(|_| generate(&moves.flip, &moves.slice_position, "flip×slice"));
            let corner_slice =
                s.spawn(|_| generate(&moves.corner_perm, &moves.slice_perm, "corner×slice perm"));
            let edge_slice =
                s.spawn(|_| generate(&moves.ud_edge_perm, &moves.slice_perm, "edge×slice perm"));

            [twist_slice, flip_slice, corner_slice, edge_slice]
                .map(|worker| worker.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
        })
        .unwrap_or_else(|e| std::panic::resume_unwind(e))
    }

    pub(crate) fn from_parts(moves: MoveTables, pruning: [PruningTable; 4], depth_cap: u8) -> Self {
        let [twist_slice, flip_slice, corner_slice, edge_slice] = pruning;
        Self {
            moves,
            twist_slice,
            flip_slice,
            corner_slice,
            edge_slice,
            depth_cap,
        }
    }

    pub(crate) fn pruning_tables(&self) -> [&PruningTable; 4] {
        [
            &self.twist_slice,
            &self.flip_slice,
            &self.corner_slice,
            &self.edge_slice,
        ]
    }

    /// Expected table lengths, in [`Tables::pruning_tables`] order.
    pub(crate) const PRUNING_SHAPES: [(usize, usize); 4] = [
        (Twist::COUNT, SlicePosition::COUNT),
        (Flip::COUNT, SlicePosition::COUNT),
        (CornerPerm::COUNT, SlicePerm::COUNT),
        (UdEdgePerm::COUNT, SlicePerm::COUNT),
    ];

    /// Lower bound on the moves to reach the phase 2 subgroup.
    #[inline]
    #[must_use]
    pub fn phase1_heuristic(&self, twist: u16, flip: u16, slice: u16) -> u8 {
        self.twist_slice
            .get(twist, slice)
            .max(self.flip_slice.get(flip, slice))
    }

    /// Lower bound on the phase 2 moves to solve a cube in the subgroup.
    #[inline]
    #[must_use]
    pub fn phase2_heuristic(&self, corner_perm: u16, edge_perm: u16, slice_perm: u16) -> u8 {
        self.corner_slice
            .get(corner_perm, slice_perm)
            .max(self.edge_slice.get(edge_perm, slice_perm))
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
