//! Operator-split burn behavior through the reactor entry points
//!
//! Run tests with: cargo test --test `strang_burn`

mod common;

use approx::assert_relative_eq;
use burn_sim_core::core_types::layout::{EINT, RHO, TEMP};
use burn_sim_core::{
    BoxArray, DistributionMap, Geometry, GhostWidths, HostedRanks, IntBox, LevelState, MultiFab,
    ReactConfig, ReactError, ReactLimits, Reactor, StateLayout, TimeIntegration, ZeroSources,
};
use common::{
    all_values, fill_uniform, fill_with, level_1d, level_2d, no_ghosts, reactor, set_cell,
    valid_value, AuxDecayNetwork, ConversionNetwork, CountingNetwork, FailingCellNetwork,
    IterationCountNetwork, NoOpNetwork,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_fields_close(a: &MultiFab, b: &MultiFab) {
    for (x, y) in all_values(a).iter().zip(all_values(b).iter()) {
        assert_relative_eq!(*x, *y, max_relative = 1e-12);
    }
}

#[test]
fn test_uniform_noop_burn_leaves_state_unchanged() {
    let mut level = level_2d(8, 8, 4, 1, [false; 3], GhostWidths::default());
    fill_uniform(&mut level.state_old, 1.0e7, 5.0e8, &[0.7, 0.3]);
    level.fill_sborder().unwrap();
    let before = level.sborder.clone();

    let reactor = reactor(ReactConfig::default(), NoOpNetwork, 1);
    let outcome = reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    assert!(outcome.success);
    assert!(all_values(&level.reactions_old).iter().all(|&r| r == 0.0));
    assert_fields_close(&level.sborder, &before);
}

#[test]
fn test_density_limiter_skips_every_cell() {
    let mut level = level_1d(16, 4, 2, GhostWidths::default());
    fill_uniform(&mut level.state_old, 1.0e4, 5.0e8, &[1.0, 0.0]);
    level.fill_sborder().unwrap();
    let before = level.sborder.clone();

    let network = CountingNetwork::default();
    let config = ReactConfig {
        limits: ReactLimits {
            rho_min: 1.0e5,
            ..ReactLimits::default()
        },
        ..ReactConfig::default()
    };
    let reactor = reactor(config, network.clone(), 2);
    let outcome = reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    assert!(outcome.success);
    assert_eq!(network.count(), 0);
    assert_eq!(all_values(&level.sborder), all_values(&before));
    assert!(all_values(&level.reactions_old).iter().all(|&r| r == 0.0));
}

#[test]
fn test_single_failing_cell_fails_globally() {
    let mut level = level_1d(8, 2, 4, no_ghosts());
    fill_with(&mut level.state_old, |cell| {
        let t = if cell[0] == 5 { 7.0e8 } else { 5.0e8 };
        (1.0e7, t, vec![1.0, 0.0])
    });
    level.fill_sborder().unwrap();

    let network = FailingCellNetwork {
        inner: ConversionNetwork::default(),
        fail_temperature: 7.0e8,
    };
    let reactor = reactor(ReactConfig::default(), network, 4);
    let outcome = reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    assert!(!outcome.success);
    let layout = StateLayout::new(2);
    // Every cell, including the failing one, carries the network's output
    for i in 0..8 {
        let cell = [i, 0, 0];
        assert_relative_eq!(
            valid_value(&level.sborder, cell, layout.species(0)),
            0.5e7,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            valid_value(&level.sborder, cell, layout.species(1)),
            0.5e7,
            max_relative = 1e-12
        );
    }
    let rho_e_start = common::eos().rho_e_from_temperature(1.0e7, 5.0e8);
    assert_relative_eq!(
        valid_value(&level.sborder, [0, 0, 0], EINT),
        rho_e_start + 1.0e7 * 0.5e17,
        max_relative = 1e-12
    );
}

#[test]
fn test_all_cells_succeed() {
    let mut level = level_2d(8, 8, 4, 4, [true, true, false], GhostWidths::default());
    fill_uniform(&mut level.state_old, 1.0e7, 5.0e8, &[1.0, 0.0]);
    level.fill_sborder().unwrap();

    let reactor = reactor(ReactConfig::default(), ConversionNetwork::default(), 4);
    let outcome = reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();
    assert!(outcome.success);
}

#[test]
fn test_weights_follow_iteration_counts() {
    let mut level = level_1d(2, 2, 1, no_ghosts()).with_knapsack_weights();
    fill_with(&mut level.state_old, |cell| {
        let t = if cell[0] == 0 { 2.0e9 } else { 5.0e8 };
        (1.0e7, t, vec![1.0, 0.0])
    });
    level.fill_sborder().unwrap();

    let config = ReactConfig {
        use_custom_knapsack_weights: true,
        ..ReactConfig::default()
    };
    let network = IterationCountNetwork {
        hot_temperature: 1.0e9,
    };
    let reactor = reactor(config, network, 1);
    reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    let weights = &level.knapsack_weights.as_ref().unwrap().old;
    assert_eq!(weights.fab(0).get([0, 0, 0], 0), 14.0);
    assert_eq!(weights.fab(0).get([1, 0, 0], 0), 1.0);
}

#[test]
fn test_second_half_resets_new_weights_before_burning() {
    let mut level = level_1d(4, 2, 2, no_ghosts()).with_knapsack_weights();
    fill_uniform(&mut level.state_new, 1.0e7, 5.0e8, &[1.0, 0.0]);
    level.knapsack_weights.as_mut().unwrap().new.set_val(99.0);

    let config = ReactConfig {
        use_custom_knapsack_weights: true,
        limits: ReactLimits {
            t_max: 1.0e8,
            ..ReactLimits::default()
        },
        ..ReactConfig::default()
    };
    let reactor = reactor(config, ConversionNetwork::default(), 2);
    let outcome = reactor
        .strang_react_second_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    // Every cell is above t_max, so the pass is skipped but the weights reset
    assert!(outcome.success);
    let weights = &level.knapsack_weights.as_ref().unwrap().new;
    assert!(all_values(weights).iter().all(|&w| w == 1.0));
}

#[test]
fn test_ineligible_cells_keep_zero_rates() {
    let ghosts = GhostWidths {
        state: 0,
        border: 2,
        reactions: 1,
    };
    let mut level = level_2d(8, 8, 4, 2, [false; 3], ghosts);
    // Hot stripe above the temperature limit
    fill_with(&mut level.state_old, |cell| {
        let t = if cell[1] >= 6 { 3.0e9 } else { 5.0e8 };
        (1.0e7, t, vec![1.0, 0.0])
    });
    level.fill_sborder().unwrap();

    let config = ReactConfig {
        limits: ReactLimits {
            t_max: 1.0e9,
            ..ReactLimits::default()
        },
        ..ReactConfig::default()
    };
    let reactor = reactor(config, ConversionNetwork::default(), 2);
    let outcome = reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();
    assert!(outcome.success);

    let layout = StateLayout::new(2);
    for patch in 0..level.reactions_old.len() {
        let valid = level.grids().get(patch);
        let rfab = level.reactions_old.fab(patch);
        for cell in rfab.bx().cells() {
            // Ghosts beyond the domain edge inherit the stripe by extrapolation
            let hot = cell[1] >= 6;
            let interior_ghost = !valid.contains(cell)
                && (0..8).contains(&cell[0])
                && (0..8).contains(&cell[1]);
            if hot || interior_ghost {
                for comp in 0..layout.reaction_ncomp() {
                    assert_eq!(rfab.get(cell, comp), 0.0, "cell {cell:?} comp {comp}");
                }
            } else {
                assert!(rfab.get(cell, layout.reaction_rho_energy()) > 0.0);
            }
        }
    }
}

#[test]
fn test_species_mass_is_conserved() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut level = level_2d(12, 12, 4, 3, [true, false, false], GhostWidths::default());
    let mut cells = Vec::new();
    for _ in 0..level.grids().num_pts() {
        let rho = rng.random_range(1.0e5..1.0e8);
        let t = rng.random_range(1.0e8..3.0e9);
        let x0 = rng.random_range(0.0..1.0);
        cells.push((rho, t, x0));
    }
    fill_with(&mut level.state_old, |cell| {
        let (rho, t, x0) = cells[(cell[1] * 12 + cell[0]) as usize];
        (rho, t, vec![x0, 1.0 - x0])
    });
    level.fill_sborder().unwrap();

    let network = ConversionNetwork {
        fraction: 0.3,
        q: 1.0e16,
    };
    let reactor = reactor(ReactConfig::default(), network, 3);
    reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    let layout = StateLayout::new(2);
    for patch in 0..level.sborder.len() {
        let fab = level.sborder.fab(patch);
        for cell in level.grids().get(patch).cells() {
            let total = fab.get(cell, layout.species(0)) + fab.get(cell, layout.species(1));
            assert_relative_eq!(total, fab.get(cell, RHO), max_relative = 1e-12);
        }
    }
}

#[test]
fn test_shock_flagged_cells_skipped_when_disabled() {
    let layout = StateLayout::new(2).with_shock_flag();
    let domain = IntBox::new([0, 0, 0], [3, 0, 0]);
    let mut level = LevelState::new(
        Geometry::new(domain),
        &BoxArray::chop(domain, 4, 1),
        &DistributionMap::round_robin(1, 1),
        layout,
        no_ghosts(),
    );
    let shock = layout.shock().unwrap();
    {
        let fab = level.state_old.fab_mut(0);
        for i in 0..4 {
            set_cell(fab, [i, 0, 0], 1.0e7, 5.0e8, &[1.0, 0.0]);
        }
        fab.set([2, 0, 0], shock, 1.0);
    }
    level.fill_sborder().unwrap();

    let config = ReactConfig {
        disable_shock_burning: true,
        ..ReactConfig::default()
    };
    let reactor = reactor(config, ConversionNetwork::default(), 1);
    reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    let fab = level.sborder.fab(0);
    assert_eq!(fab.get([2, 0, 0], layout.species(0)), 1.0e7);
    assert_relative_eq!(fab.get([1, 0, 0], layout.species(0)), 0.5e7, max_relative = 1e-12);
    assert_eq!(level.reactions_old.fab(0).get([2, 0, 0], 0), 0.0);
}

#[test]
fn test_auxiliary_fractions_burn_as_partial_densities() {
    let layout = StateLayout::new(2).with_aux(1);
    let domain = IntBox::new([0, 0, 0], [3, 0, 0]);
    let mut level = LevelState::new(
        Geometry::new(domain),
        &BoxArray::chop(domain, 2, 1),
        &DistributionMap::round_robin(2, 1),
        layout,
        no_ghosts(),
    );
    for patch in 0..level.state_old.len() {
        let fab = level.state_old.fab_mut(patch);
        let bx = fab.bx();
        for cell in bx.cells() {
            set_cell(fab, cell, 2.0, 5.0e8, &[0.5, 0.5]);
            fab.set(cell, layout.aux(0), 2.0);
        }
    }
    level.fill_sborder().unwrap();

    let reactor = reactor(ReactConfig::default(), AuxDecayNetwork { factor: 0.25 }, 1);
    let outcome = reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();
    assert!(outcome.success);

    for i in 0..4 {
        let cell = [i, 0, 0];
        assert_relative_eq!(
            valid_value(&level.sborder, cell, layout.aux(0)),
            0.5,
            max_relative = 1e-12
        );
        assert_eq!(valid_value(&level.sborder, cell, layout.species(0)), 1.0);
        assert_eq!(valid_value(&level.reactions_old, cell, 0), 0.0);
    }
}

#[test]
fn test_do_react_off_zeroes_reactions_and_succeeds() {
    let mut level = level_1d(4, 4, 1, no_ghosts());
    fill_uniform(&mut level.state_new, 1.0e7, 5.0e8, &[1.0, 0.0]);
    level.reactions_new.set_val(3.0);
    let before = level.state_new.clone();

    let config = ReactConfig {
        do_react: false,
        ..ReactConfig::default()
    };
    let reactor = reactor(config, ConversionNetwork::default(), 1);
    let outcome = reactor
        .strang_react_second_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    assert!(outcome.success);
    assert!(all_values(&level.reactions_new).iter().all(|&r| r == 0.0));
    assert_eq!(all_values(&level.state_new), all_values(&before));
}

#[test]
fn test_narrow_reaction_ghosts_are_respected() {
    let ghosts = GhostWidths {
        state: 0,
        border: 3,
        reactions: 0,
    };
    let mut level = level_1d(8, 4, 1, ghosts);
    fill_uniform(&mut level.state_old, 1.0e7, 5.0e8, &[1.0, 0.0]);
    level.fill_sborder().unwrap();

    let reactor = reactor(ReactConfig::default(), ConversionNetwork::default(), 1);
    reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    let layout = StateLayout::new(2);
    // Ghost beyond the domain edge is burned in the state
    assert_relative_eq!(
        level.sborder.fab(0).get([-2, 0, 0], layout.species(0)),
        0.5e7,
        max_relative = 1e-12
    );
    assert!(level.reactions_old.fab(0).bx().contains([3, 0, 0]));
    assert!(!level.reactions_old.fab(0).bx().contains([-2, 0, 0]));
}

#[test]
fn test_energy_diagnostic_reports_total_rate() {
    let mut level = level_1d(4, 2, 2, no_ghosts());
    fill_uniform(&mut level.state_new, 1.0e7, 5.0e8, &[1.0, 0.0]);

    let config = ReactConfig {
        print_update_diagnostics: true,
        verbose: 1,
        ..ReactConfig::default()
    };
    let reactor = reactor(config, ConversionNetwork::default(), 2);
    let dt = 1.0e-3;
    let outcome = reactor
        .strang_react_second_half(&mut level, 0.0, dt)
        .unwrap();

    let expected = 4.0 * 1.0e7 * 0.5e17 / dt;
    assert_relative_eq!(outcome.energy_added.unwrap(), expected, max_relative = 1e-12);
    assert!(outcome.wall_time.is_some());
}

#[test]
fn test_strang_entry_points_rejected_under_sdc() {
    let mut level = level_1d(4, 4, 1, no_ghosts());
    let config = ReactConfig {
        time_integration: TimeIntegration::SimplifiedSdc,
        ..ReactConfig::default()
    };
    let reactor = reactor(config, NoOpNetwork, 1);

    let first = reactor.strang_react_first_half(&mut level, 0.0, 1.0);
    assert!(matches!(
        first,
        Err(ReactError::UnsupportedIntegration {
            operation: "strang_react_first_half",
            ..
        })
    ));
    let second = reactor.strang_react_second_half(&mut level, 0.0, 1.0);
    assert!(matches!(
        second,
        Err(ReactError::UnsupportedIntegration { .. })
    ));
}

#[test]
fn test_sdc_entry_rejected_under_strang() {
    let mut level = level_1d(4, 4, 1, no_ghosts());
    let reactor = Reactor::new(
        ReactConfig::default(),
        Box::new(NoOpNetwork),
        Box::new(common::eos()),
        Box::new(HostedRanks::serial()),
    );
    let result = reactor.react_state_sdc(&mut level, &ZeroSources, 0.0, 1.0);
    assert_eq!(
        result,
        Err(ReactError::UnsupportedIntegration {
            operation: "react_state_sdc",
            configured: TimeIntegration::CornerTransportUpwind,
        })
    );
}

#[test]
fn test_rebalancing_without_weights_is_an_error() {
    let mut level = level_1d(4, 4, 1, no_ghosts());
    fill_uniform(&mut level.state_old, 1.0e7, 5.0e8, &[1.0, 0.0]);
    level.fill_sborder().unwrap();
    let config = ReactConfig {
        use_custom_knapsack_weights: true,
        ..ReactConfig::default()
    };
    let reactor = reactor(config, NoOpNetwork, 1);
    let result = reactor.strang_react_first_half(&mut level, 0.0, 1.0);
    assert!(matches!(result, Err(ReactError::LayoutMismatch(_))));
}

#[test]
fn test_cleaner_recomputes_temperature() {
    let mut level = level_1d(2, 2, 1, no_ghosts());
    fill_uniform(&mut level.state_old, 1.0e7, 5.0e8, &[1.0, 0.0]);
    level.fill_sborder().unwrap();

    let reactor = reactor(ReactConfig::default(), ConversionNetwork::default(), 1);
    reactor
        .strang_react_first_half(&mut level, 0.0, 1.0e-3)
        .unwrap();

    let eos = common::eos();
    let fab = level.sborder.fab(0);
    let e = fab.get([0, 0, 0], EINT) / fab.get([0, 0, 0], RHO);
    assert_relative_eq!(
        fab.get([0, 0, 0], TEMP),
        eos.temperature_from_e(e),
        max_relative = 1e-12
    );
    assert!(fab.get([0, 0, 0], TEMP) > 5.0e8);
}
