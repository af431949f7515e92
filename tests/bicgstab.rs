//! Integration tests for the BiCGStab solver

use solvr::prelude::*;
use std::sync::Arc;

/// Route solver log output through the test harness when RUST_LOG is set
fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Create 1D Laplacian (SPD tridiagonal): diag=2, off-diag=-1
fn create_1d_laplacian(exec: Arc<Executor>, n: usize) -> Csr<f64, i32> {
    let mut row_ptrs = Vec::with_capacity(n + 1);
    let mut col_idxs = Vec::new();
    let mut values = Vec::new();

    row_ptrs.push(0i32);
    for i in 0..n {
        if i > 0 {
            col_idxs.push((i - 1) as i32);
            values.push(-1.0f64);
        }
        col_idxs.push(i as i32);
        values.push(2.0f64);
        if i < n - 1 {
            col_idxs.push((i + 1) as i32);
            values.push(-1.0f64);
        }
        row_ptrs.push(col_idxs.len() as i32);
    }

    Csr::from_parts(exec, Dim::square(n), &row_ptrs, &col_idxs, &values)
        .expect("CSR creation should succeed")
}

/// Create a non-symmetric tridiagonal (convection-diffusion style)
fn create_nonsymmetric(exec: Arc<Executor>, n: usize) -> Csr<f64, i32> {
    let mut row_ptrs = Vec::with_capacity(n + 1);
    let mut col_idxs = Vec::new();
    let mut values = Vec::new();

    row_ptrs.push(0i32);
    for i in 0..n {
        if i > 0 {
            col_idxs.push((i - 1) as i32);
            values.push(-1.0f64);
        }
        col_idxs.push(i as i32);
        values.push(3.0f64);
        if i < n - 1 {
            col_idxs.push((i + 1) as i32);
            values.push(-1.5f64);
        }
        row_ptrs.push(col_idxs.len() as i32);
    }

    Csr::from_parts(exec, Dim::square(n), &row_ptrs, &col_idxs, &values)
        .expect("CSR creation should succeed")
}

fn residual_norm(a: &Csr<f64, i32>, b: &Dense<f64>, x: &Dense<f64>, col: usize) -> f64 {
    let n = a.size().rows;
    let mut ax = Dense::with_config_of(b).unwrap();
    a.apply(x, &mut ax).expect("spmv");
    let mut norm = 0.0;
    for i in 0..n {
        let r = b.at(i, col).unwrap() - ax.at(i, col).unwrap();
        norm += r * r;
    }
    norm.sqrt()
}

#[test]
fn test_bicgstab_laplacian() {
    init_logging();
    let exec = Executor::reference();
    let n = 10;
    let a = Arc::new(create_1d_laplacian(Arc::clone(&exec), n));
    let b_data: Vec<f64> = (0..n).map(|i| (i as f64 + 1.0).sin()).collect();
    let b = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &b_data).unwrap();
    let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(n, 1)).unwrap();

    let solver = Bicgstab::new(
        Arc::clone(&a) as Arc<dyn LinOp<f64>>,
        BicgstabOptions {
            max_iters: 200,
            rel_residual_goal: 1e-10,
        },
    )
    .unwrap();
    let status = solver.solve_with_status(&b, &mut x).expect("solve");

    assert!(status.all_converged(), "should converge on SPD Laplacian");
    assert!(status.iterations <= 200);
    let res = residual_norm(&a, &b, &x, 0);
    assert!(res < 1e-8, "residual too large: {res}");
}

#[test]
fn test_bicgstab_nonsymmetric() {
    init_logging();
    let exec = Executor::reference();
    let n = 20;
    let a = Arc::new(create_nonsymmetric(Arc::clone(&exec), n));
    let b_data: Vec<f64> = (0..n).map(|i| (i as f64).cos()).collect();
    let b = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &b_data).unwrap();
    let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(n, 1)).unwrap();

    let solver = Bicgstab::new(
        Arc::clone(&a) as Arc<dyn LinOp<f64>>,
        BicgstabOptions {
            max_iters: 200,
            rel_residual_goal: 1e-10,
        },
    )
    .unwrap();
    let status = solver.solve_with_status(&b, &mut x).expect("solve");

    assert!(status.all_converged(), "should converge on diagonally dominant system");
    let res = residual_norm(&a, &b, &x, 0);
    assert!(res < 1e-8, "residual too large: {res}");
}

#[test]
fn test_bicgstab_identity_converges_on_the_half_step() {
    init_logging();
    let exec = Executor::reference();
    let n = 5;
    let a = Arc::new(
        Csr::<f64, i32>::from_parts(
            Arc::clone(&exec),
            Dim::square(n),
            &[0, 1, 2, 3, 4, 5],
            &[0, 1, 2, 3, 4],
            &[1.0; 5],
        )
        .unwrap(),
    );
    let b =
        Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(n, 1)).unwrap();

    let solver = Bicgstab::new(
        Arc::clone(&a) as Arc<dyn LinOp<f64>>,
        BicgstabOptions::default(),
    )
    .unwrap();
    let status = solver.solve_with_status(&b, &mut x).expect("solve");

    assert!(status.all_converged());
    assert_eq!(status.iterations, 1, "identity should converge in 1 iter");
    for i in 0..n {
        assert!((x.at(i, 0).unwrap() - (i as f64 + 1.0)).abs() < 1e-12);
    }
}

#[test]
fn test_bicgstab_zero_column_stays_untouched() {
    init_logging();
    let exec = Executor::reference();
    let n = 12;
    let a = Arc::new(create_1d_laplacian(Arc::clone(&exec), n));

    // Column 0 is already solved (b = 0, x = 0) and must converge before
    // any update; column 1 is a real system.
    let mut b_data = vec![0.0f64; n * 2];
    for i in 0..n {
        b_data[i * 2 + 1] = (i as f64 + 1.0).sin();
    }
    let b = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 2), &b_data).unwrap();
    let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(n, 2)).unwrap();

    let options = BicgstabOptions {
        max_iters: 200,
        rel_residual_goal: 1e-10,
    };
    let solver =
        Bicgstab::new(Arc::clone(&a) as Arc<dyn LinOp<f64>>, options).unwrap();
    let status = solver.solve_with_status(&b, &mut x).expect("solve");
    assert!(status.all_converged());

    for i in 0..n {
        let entry = x.at(i, 0).unwrap();
        assert_eq!(
            entry.to_bits(),
            0.0f64.to_bits(),
            "converged column was modified at row {i}: {entry}"
        );
    }

    // The coupled solve must advance column 1 exactly as a solo solve.
    let b1_data: Vec<f64> = (0..n).map(|i| (i as f64 + 1.0).sin()).collect();
    let b1 = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &b1_data).unwrap();
    let mut x1 = Dense::zeros(Arc::clone(&exec), Dim::new(n, 1)).unwrap();
    let solo = Bicgstab::new(Arc::clone(&a) as Arc<dyn LinOp<f64>>, options).unwrap();
    let solo_status = solo.solve_with_status(&b1, &mut x1).expect("solve");
    assert_eq!(solo_status.iterations, status.iterations);
    for i in 0..n {
        assert_eq!(
            x.at(i, 1).unwrap().to_bits(),
            x1.at(i, 0).unwrap().to_bits(),
            "coupled and solo trajectories diverged at row {i}"
        );
    }
}

#[test]
fn test_bicgstab_zero_iteration_budget() {
    init_logging();
    let exec = Executor::reference();
    let n = 6;
    let a = Arc::new(create_1d_laplacian(Arc::clone(&exec), n));
    let b = Dense::filled(Arc::clone(&exec), Dim::new(n, 1), 1.0).unwrap();
    let mut x = Dense::filled(Arc::clone(&exec), Dim::new(n, 1), 0.5).unwrap();

    let solver = Bicgstab::new(
        Arc::clone(&a) as Arc<dyn LinOp<f64>>,
        BicgstabOptions {
            max_iters: 0,
            rel_residual_goal: 1e-10,
        },
    )
    .unwrap();
    let status = solver.solve_with_status(&b, &mut x).expect("solve");

    assert_eq!(status.iterations, 0);
    assert!(!status.all_converged());
    for i in 0..n {
        assert_eq!(x.at(i, 0).unwrap(), 0.5, "initial guess was modified");
    }
}

#[test]
fn test_bicgstab_iteration_cap_is_exact() {
    init_logging();
    let exec = Executor::reference();
    let n = 50;
    let a = Arc::new(create_1d_laplacian(Arc::clone(&exec), n));
    let b = Dense::filled(Arc::clone(&exec), Dim::new(n, 1), 1.0).unwrap();
    let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(n, 1)).unwrap();

    let solver = Bicgstab::new(
        Arc::clone(&a) as Arc<dyn LinOp<f64>>,
        BicgstabOptions {
            max_iters: 3,
            rel_residual_goal: 1e-14,
        },
    )
    .unwrap();
    let status = solver.solve_with_status(&b, &mut x).expect("solve");

    assert_eq!(status.iterations, 3, "budget must be honored exactly");
    assert!(!status.all_converged());
    // Three iterations of progress, not a pristine x.
    let moved = (0..n).any(|i| x.at(i, 0).unwrap() != 0.0);
    assert!(moved, "capped solve should still improve the guess");
}

#[test]
fn test_bicgstab_reference_host_parallel_parity() {
    init_logging();
    let n = 30;
    let mut results = Vec::new();
    for exec in [Executor::reference(), Executor::host_parallel()] {
        let a = Arc::new(create_nonsymmetric(Arc::clone(&exec), n));
        let b_data: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin() + 1.0).collect();
        let b = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &b_data).unwrap();
        let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(n, 1)).unwrap();

        let solver = Bicgstab::new(
            Arc::clone(&a) as Arc<dyn LinOp<f64>>,
            BicgstabOptions {
                max_iters: 100,
                rel_residual_goal: 1e-9,
            },
        )
        .unwrap();
        let status = solver.solve_with_status(&b, &mut x).expect("solve");
        assert!(status.all_converged());
        let column: Vec<u64> = (0..n).map(|i| x.at(i, 0).unwrap().to_bits()).collect();
        results.push((status.iterations, column));
    }
    assert_eq!(results[0].0, results[1].0, "iteration counts differ");
    assert_eq!(results[0].1, results[1].1, "backends disagree bitwise");
}

#[test]
fn test_bicgstab_scaled_apply_blends() {
    init_logging();
    let exec = Executor::reference();
    let n = 8;
    let a = Arc::new(create_1d_laplacian(Arc::clone(&exec), n));
    let b_data: Vec<f64> = (0..n).map(|i| (i as f64 + 2.0).ln()).collect();
    let b = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &b_data).unwrap();
    let options = BicgstabOptions {
        max_iters: 200,
        rel_residual_goal: 1e-12,
    };
    let solver = Bicgstab::new(Arc::clone(&a) as Arc<dyn LinOp<f64>>, options).unwrap();

    let x0_data: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
    let mut x = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &x0_data).unwrap();
    let alpha = Dense::scalar(Arc::clone(&exec), 2.0).unwrap();
    let beta = Dense::scalar(Arc::clone(&exec), 3.0).unwrap();
    solver.apply_scaled(&alpha, &b, &beta, &mut x).expect("scaled apply");

    // Same solve run directly, blended by hand.
    let mut x_solo = Dense::from_slice(Arc::clone(&exec), Dim::new(n, 1), &x0_data).unwrap();
    solver.solve_with_status(&b, &mut x_solo).expect("solve");
    for i in 0..n {
        let expected = 3.0 * x0_data[i] + 2.0 * x_solo.at(i, 0).unwrap();
        let got = x.at(i, 0).unwrap();
        assert!(
            (got - expected).abs() < 1e-12,
            "row {i}: expected {expected}, got {got}"
        );
    }
}

#[test]
fn test_bicgstab_scaled_apply_failure_leaves_x_intact() {
    init_logging();
    let exec = Executor::reference();
    let other = Executor::host_parallel();
    let n = 4;
    let a = Arc::new(create_1d_laplacian(Arc::clone(&exec), n));
    let solver = Bicgstab::new(
        Arc::clone(&a) as Arc<dyn LinOp<f64>>,
        BicgstabOptions::default(),
    )
    .unwrap();

    // The right-hand side lives on the wrong executor; the inner solve
    // fails before any scaling touches x.
    let b = Dense::filled(Arc::clone(&other), Dim::new(n, 1), 1.0).unwrap();
    let mut x = Dense::filled(Arc::clone(&exec), Dim::new(n, 1), 0.25).unwrap();
    let alpha = Dense::scalar(Arc::clone(&exec), 1.0).unwrap();
    let beta = Dense::scalar(Arc::clone(&exec), 0.0).unwrap();

    let err = solver.apply_scaled(&alpha, &b, &beta, &mut x).unwrap_err();
    assert!(matches!(err, Error::ExecutorMismatch { .. }));
    for i in 0..n {
        assert_eq!(x.at(i, 0).unwrap(), 0.25, "x must survive a failed solve");
    }
}

#[test]
fn test_bicgstab_rejects_rectangular_matrices() {
    init_logging();
    let exec = Executor::reference();
    let a = Arc::new(Dense::<f64>::zeros(Arc::clone(&exec), Dim::new(3, 2)).unwrap());
    let err = Bicgstab::new(a as Arc<dyn LinOp<f64>>, BicgstabOptions::default()).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn test_bicgstab_singular_system_stays_finite() {
    init_logging();
    let exec = Executor::reference();
    // diag(1, 0): column 0 of b has no solution component in row 1, so the
    // Krylov directions collapse and the guarded divides must keep the
    // iterates finite instead of producing NaN. Column 1 lies in the range
    // and converges on the half-step of the first iteration.
    let a: Arc<Csr<f64, i32>> = Arc::new(
        Csr::from_parts(
            Arc::clone(&exec),
            Dim::square(2),
            &[0, 1, 2],
            &[0, 1],
            &[1.0, 0.0],
        )
        .unwrap(),
    );
    let b = Dense::from_slice(Arc::clone(&exec), Dim::new(2, 2), &[1.0, 2.0, 1.0, 0.0]).unwrap();

    let solve = |max_iters: usize| {
        let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(2, 2)).unwrap();
        let solver = Bicgstab::new(
            Arc::clone(&a) as Arc<dyn LinOp<f64>>,
            BicgstabOptions {
                max_iters,
                rel_residual_goal: 1e-6,
            },
        )
        .unwrap();
        let status = solver.solve_with_status(&b, &mut x).unwrap();
        (status, x)
    };

    let (status, x) = solve(6);
    assert_eq!(status.iterations, 6, "stalled column runs out the budget");
    assert_eq!(status.converged, vec![false, true]);
    for i in 0..2 {
        for j in 0..2 {
            assert!(x.at(i, j).unwrap().is_finite(), "entry ({i}, {j}) diverged");
        }
    }
    assert!((x.at(0, 1).unwrap() - 2.0).abs() < 1e-12);
    assert!(x.at(1, 1).unwrap().abs() < 1e-12);

    // Once a column has converged, further iterations must not touch it.
    let (_, x_short) = solve(2);
    for i in 0..2 {
        assert_eq!(
            x.at(i, 1).unwrap().to_bits(),
            x_short.at(i, 1).unwrap().to_bits(),
            "converged column drifted after convergence"
        );
    }
}
