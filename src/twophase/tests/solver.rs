use cube_core::{
    CubieCube, MoveSequence,
    facelet::{ColorScheme, FaceletCube},
    scramble::random_state,
};
use std::{
    sync::{
        Arc, LazyLock,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};
use twophase::{SearchConfig, SolveError, Solver, TableConfig, Tables};

static TABLES: LazyLock<Arc<Tables>> = LazyLock::new(|| {
    Arc::new(Tables::generate(
        &TableConfig::default().with_cache(false),
    ))
});

fn solver() -> Solver {
    Solver::new(Arc::clone(&TABLES))
}

fn colors_of(scramble: &str) -> String {
    let cube = CubieCube::from_moves(scramble.parse::<MoveSequence>().unwrap());
    FaceletCube::from_cubie(&cube).to_colors(&ColorScheme::default())
}

#[test_log::test]
fn solves_the_reference_scramble() {
    let input = colors_of("R U2 D' B L2");
    let solution = solver()
        .solve_facelets(&input, &ColorScheme::default())
        .unwrap();

    assert!(!solution.moves.is_empty());
    assert!(solution.moves.len() <= 30);

    twophase::validate(&input).unwrap();
    let cube = FaceletCube::parse(&input, &ColorScheme::default())
        .unwrap()
        .to_cubie()
        .unwrap();
    assert!(cube.apply_moves(solution.moves.iter()).is_solved());
}

#[test_log::test]
fn solved_input_gives_empty_solution() {
    let solution = solver()
        .solve_facelets(
            "WWWWWWWWW OOOOOOOOO GGGGGGGGG RRRRRRRRR BBBBBBBBB YYYYYYYYY",
            &ColorScheme::default(),
        )
        .unwrap();
    assert!(solution.moves.is_empty());
}

#[test_log::test]
fn random_scrambles_are_solved() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let solver = solver();

    for _ in 0..20 {
        let (scramble, cube) = random_state(30, &mut rng);
        let solution = solver
            .solve_cubie(&cube)
            .unwrap_or_else(|e| panic!("{scramble}: {e}"));
        assert!(solution.moves.len() <= 30, "{scramble}");
        assert!(
            cube.apply_moves(solution.moves.iter()).is_solved(),
            "{scramble} -> {}",
            solution.moves
        );
    }
}

#[test_log::test]
fn concurrent_solves_share_tables() {
    let solver = &solver();
    let mut rng = fastrand::Rng::with_seed(99);
    let cubes = (0..8).map(|_| random_state(25, &mut rng).1).collect::<Vec<_>>();

    thread::scope(|s| {
        let handles = cubes
            .iter()
            .map(|cube| s.spawn(move || (cube, solver.solve_cubie(cube))))
            .collect::<Vec<_>>();
        for handle in handles {
            let (cube, solution) = handle.join().unwrap();
            let solution = solution.unwrap();
            assert!(cube.apply_moves(solution.moves.iter()).is_solved());
        }
    });

    assert!(Arc::ptr_eq(solver.tables(), &TABLES));
}

#[test_log::test]
fn cancelled_search_reports_cancelled() {
    let (_, cube) = random_state(25, &mut fastrand::Rng::with_seed(1));
    let cancel = AtomicBool::new(true);
    let err = solver().solve_with_cancel(&cube, &cancel).unwrap_err();
    assert!(matches!(err, SolveError::Cancelled));
}

#[test_log::test]
fn cancel_from_another_thread_stops_the_search() {
    let (_, cube) = random_state(25, &mut fastrand::Rng::with_seed(4));
    // Nothing reaches the target and no budget runs out, so only the cancel
    // can end this search
    let solver = solver().with_config(
        SearchConfig::default()
            .with_target_length(0)
            .with_max_phase1_solutions(usize::MAX)
            .with_node_limit(u64::MAX)
            .with_timeout(Duration::from_secs(3600)),
    );
    let cancel = AtomicBool::new(false);

    let result = thread::scope(|s| {
        let search = s.spawn(|| solver.solve_with_cancel(&cube, &cancel));
        thread::sleep(Duration::from_millis(200));
        let was_running = !search.is_finished();
        cancel.store(true, Ordering::Relaxed);
        let result = search.join().unwrap();
        assert!(was_running);
        result
    });
    assert!(matches!(result, Err(SolveError::Cancelled)));
}

#[test_log::test]
fn elapsed_deadline_is_a_timeout() {
    let (_, cube) = random_state(25, &mut fastrand::Rng::with_seed(5));
    let err = solver()
        .with_config(
            SearchConfig::default()
                .with_target_length(0)
                .with_timeout(Duration::ZERO),
        )
        .solve_cubie(&cube)
        .unwrap_err();
    assert!(matches!(err, SolveError::SearchTimeout { .. }));
}

#[test_log::test]
fn exhausted_node_budget_is_a_timeout() {
    let (_, cube) = random_state(25, &mut fastrand::Rng::with_seed(2));
    let err = solver()
        .with_config(SearchConfig::default().with_node_limit(1))
        .solve_cubie(&cube)
        .unwrap_err();
    assert!(matches!(err, SolveError::SearchTimeout { .. }));
}

#[test_log::test]
fn budget_keeps_the_best_complete_solution() {
    // A target nothing reaches forces the search to run until the budget
    // ends; the best solution so far is still returned
    let (_, cube) = random_state(25, &mut fastrand::Rng::with_seed(3));
    let solution = solver()
        .with_config(
            SearchConfig::default()
                .with_target_length(0)
                .with_node_limit(3_000_000),
        )
        .solve_cubie(&cube)
        .unwrap();
    assert!(cube.apply_moves(solution.moves.iter()).is_solved());
}

#[test_log::test]
fn invalid_input_fails_before_search() {
    let mut flipped = colors_of("").chars().collect::<Vec<_>>();
    flipped.swap(7, 19);
    let flipped = flipped.into_iter().collect::<String>();

    assert!(matches!(
        twophase::validate(&flipped),
        Err(SolveError::Unsolvable(_))
    ));
    assert!(matches!(
        solver().solve_facelets(&flipped, &ColorScheme::default()),
        Err(SolveError::Unsolvable(_))
    ));
    assert!(matches!(
        twophase::validate("not a cube"),
        Err(SolveError::Malformed(_))
    ));
}
