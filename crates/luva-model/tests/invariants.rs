//! Whole-run invariants of the UV-A model.
//!
//! These tests integrate the full system over the growth period:
//! - Treatments without UV-A never accumulate Stress
//! - Stress grows with dose
//! - States stay in their physical domain, including after a restart
//! - Runs are reproducible
//! - All of the above hold for every mechanism combination

use approx::assert_relative_eq;
use luva_model::catalogue;
use luva_model::parameters::{IntradayMechanism, Mechanisms, ParameterSet, PigmentInduction, StressFeedback};
use luva_model::simulation::{Recording, Simulation};
use luva_model::treatment::Treatment;

fn final_stress(simulation: &Simulation, name: &str) -> f64 {
    let treatment = catalogue::find(name).unwrap().treatment;
    simulation.run(&treatment).unwrap().stress()
}

mod no_stress {
    use super::*;

    /// A control never leaves Stress = 0, at any solver step.
    #[test]
    fn test_control_stress_is_exactly_zero() {
        let simulation = Simulation::default();
        let result = simulation
            .run_with_trajectory(&Treatment::control("CK"), None)
            .unwrap();

        assert_eq!(result.stress(), 0.0);
        let trajectory = result.trajectory.unwrap();
        assert!(trajectory.states.column(4).iter().all(|&s| s == 0.0));
    }

    /// Without UV-A the full model reduces to the growth-only model.
    #[test]
    fn test_control_matches_baseline_growth() {
        let simulation = Simulation::default();
        let control = simulation.run(&Treatment::control("CK")).unwrap();
        let baseline = simulation.run_baseline().unwrap();

        assert_relative_eq!(control.final_state.dry_mass, baseline.dry_mass, max_relative = 1e-3);
        assert_relative_eq!(control.fresh_weight(), baseline.fresh_weight, max_relative = 1e-3);
        assert_relative_eq!(control.final_state.lai, baseline.lai, max_relative = 1e-3);
    }

    /// A degenerate window delivers nothing and behaves as a control.
    #[test]
    fn test_degenerate_window_behaves_as_control() {
        let simulation = Simulation::default();
        let degenerate = Treatment::new("empty", 11.0, 29, 29, 10.0, 16.0);
        let result = simulation.run(&degenerate).unwrap();
        let control = simulation.run(&Treatment::control("CK")).unwrap();

        assert_eq!(result.stress(), 0.0);
        assert_eq!(result.final_state, control.final_state);
    }

    /// Raising a damage coefficient cannot move a treatment that never sees UV-A.
    #[test]
    fn test_damage_coefficient_does_not_affect_control() {
        let control = Treatment::control("CK");
        let default = Simulation::default().run(&control).unwrap();

        let mut parameters = ParameterSet::default();
        parameters.stress.damage_coefficient *= 10.0;
        parameters.stress.feedback_coefficient *= 2.0;
        let perturbed = Simulation::new(parameters).run(&control).unwrap();

        assert_eq!(default.fresh_weight(), perturbed.fresh_weight());
        assert_eq!(default.anthocyanin_ppm(), perturbed.anthocyanin_ppm());
    }
}

mod dose_response {
    use super::*;

    #[test]
    fn test_stress_increases_with_session_length() {
        let simulation = Simulation::default();
        let stresses: Vec<f64> = ["VL3D3", "L6D3", "M9D3", "H12D3_val", "VH15D3"]
            .iter()
            .map(|name| final_stress(&simulation, name))
            .collect();

        assert!(stresses[0] > 0.0);
        for pair in stresses.windows(2) {
            assert!(pair[1] > pair[0], "Stress not monotonic in hours: {:?}", stresses);
        }
    }

    #[test]
    fn test_stress_increases_with_intensity() {
        let simulation = Simulation::default();
        let stresses: Vec<f64> = [2.0, 11.0, 22.0]
            .iter()
            .map(|&intensity| {
                let treatment = Treatment::new("L6D6", intensity, 29, 35, 10.0, 16.0);
                simulation.run(&treatment).unwrap().stress()
            })
            .collect();

        assert!(stresses[0] > 0.0);
        assert!(stresses[1] > stresses[0]);
        assert!(stresses[2] > stresses[1]);
    }

    #[test]
    fn test_dynamic_modes_stress_the_plant() {
        let simulation = Simulation::default();
        for treatment in catalogue::dynamic_treatments() {
            let result = simulation.run(&treatment).unwrap();
            assert!(result.stress() > 0.0, "{} produced no Stress", treatment.name);
            assert!(result.fresh_weight().is_finite());
        }
    }
}

mod domain {
    use super::*;

    #[test]
    fn test_states_remain_non_negative() {
        let simulation = Simulation::default();
        for name in ["H12D3", "VH15D3", "L6D6-N"] {
            let treatment = catalogue::find(name).unwrap().treatment;
            let trajectory = simulation
                .run_with_trajectory(&treatment, None)
                .unwrap()
                .trajectory
                .unwrap();
            assert!(
                trajectory.states.iter().all(|&v| v >= 0.0 && v.is_finite()),
                "{} left the physical domain",
                name
            );
        }
    }

    /// Restarting from an intermediate state stays in the domain and lands
    /// close to the uninterrupted run.
    #[test]
    fn test_restart_from_intermediate_state() {
        let simulation = Simulation::default();
        let treatment = catalogue::find("L6D12").unwrap().treatment;
        let full = simulation.run_with_trajectory(&treatment, None).unwrap();
        let trajectory = full.trajectory.as_ref().unwrap();

        let i = trajectory.len() / 2;
        let row = trajectory.states.row(i);
        let restart_state = luva_model::model::PlantState {
            dry_mass: row[0],
            buffer: row[1],
            lai: row[2],
            anthocyanin: row[3],
            stress: row[4],
            ros: row[5],
        };
        let restarted = simulation
            .run_from(&treatment, trajectory.times[i], restart_state, Recording::FinalState)
            .unwrap();

        assert!(restarted.final_state.is_non_negative());
        assert_relative_eq!(restarted.fresh_weight(), full.fresh_weight(), max_relative = 1e-2);
        assert_relative_eq!(restarted.stress(), full.stress(), max_relative = 1e-2);
    }

    #[test]
    fn test_resampled_trajectory_spans_window() {
        let simulation = Simulation::default();
        let result = simulation
            .run_with_trajectory(&Treatment::control("CK"), Some(86400.0))
            .unwrap();
        let trajectory = result.trajectory.unwrap();

        assert_eq!(trajectory.len(), 22);
        assert_eq!(trajectory.times[0], simulation.window().t_start());
        assert_eq!(trajectory.times[21], simulation.window().t_end());
        assert_relative_eq!(trajectory.fresh_weight[0], 10.0, max_relative = 1e-9);
        assert_relative_eq!(trajectory.fresh_weight[21], result.outputs.fresh_weight, max_relative = 1e-9);
    }
}

mod reproducibility {
    use super::*;

    #[test]
    fn test_reruns_are_bit_identical() {
        let simulation = Simulation::default();
        let treatment = catalogue::find("H12D3").unwrap().treatment;
        let first = simulation.run(&treatment).unwrap();
        let second = simulation.run(&treatment).unwrap();

        assert_eq!(first.final_state, second.final_state);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_concurrent_runs_match_serial() {
        let simulation = Simulation::default();
        let treatments: Vec<Treatment> = catalogue::training_set()
            .into_iter()
            .map(|r| r.treatment)
            .collect();
        let serial: Vec<_> = treatments
            .iter()
            .map(|t| simulation.run(t).unwrap().final_state)
            .collect();

        let concurrent: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = treatments
                .iter()
                .map(|t| scope.spawn(|| simulation.run(t).unwrap().final_state))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(serial, concurrent);
    }
}

mod mechanisms {
    use super::*;

    fn all_combinations() -> Vec<Mechanisms> {
        let mut combinations = Vec::new();
        for intraday in [
            IntradayMechanism::SoftplusEnergy,
            IntradayMechanism::PowerLawHours,
            IntradayMechanism::GompertzHours,
        ] {
            for stress_feedback in [StressFeedback::MichaelisMenten, StressFeedback::Disabled] {
                for pigment_induction in [PigmentInduction::Hill, PigmentInduction::Saturating] {
                    for ros_enabled in [false, true] {
                        combinations.push(Mechanisms {
                            intraday,
                            stress_feedback,
                            pigment_induction,
                            ros_enabled,
                        });
                    }
                }
            }
        }
        combinations
    }

    fn simulation(mechanisms: Mechanisms) -> Simulation {
        Simulation::new(ParameterSet::default().with_mechanisms(mechanisms))
    }

    #[test]
    fn test_every_combination_is_enumerated() {
        let combinations = all_combinations();
        assert_eq!(combinations.len(), 24);
        assert!(combinations.contains(&Mechanisms::default()));
    }

    /// Each combination stays in the physical domain over a high-dose run,
    /// and the ROS state only moves when the ROS mechanism is enabled.
    #[test]
    fn test_states_stay_in_domain() {
        let treatment = catalogue::find("H12D3").unwrap().treatment;
        for mechanisms in all_combinations() {
            let result = simulation(mechanisms)
                .run_with_trajectory(&treatment, None)
                .unwrap_or_else(|e| panic!("{:?} failed: {}", mechanisms, e));
            let trajectory = result.trajectory.as_ref().unwrap();

            assert!(
                trajectory.states.iter().all(|&v| v >= 0.0 && v.is_finite()),
                "{:?} left the physical domain",
                mechanisms
            );
            assert!(result.stress() > 0.0, "{:?} accumulated no Stress", mechanisms);
            assert!(result.anthocyanin_ppm().is_finite() && result.fresh_weight() > 0.0);

            let peak_ros = trajectory.states.column(5).iter().cloned().fold(0.0, f64::max);
            if mechanisms.ros_enabled {
                assert!(peak_ros > 0.0, "{:?} never produced ROS", mechanisms);
            } else {
                assert_eq!(peak_ros, 0.0, "{:?} produced ROS while disabled", mechanisms);
            }
        }
    }

    /// Controls stay at zero Stress whatever the mechanisms.
    #[test]
    fn test_controls_never_stress() {
        for mechanisms in all_combinations() {
            let result = simulation(mechanisms).run(&Treatment::control("CK")).unwrap();
            assert_eq!(result.stress(), 0.0, "{:?}", mechanisms);
            assert_eq!(result.final_state.ros, 0.0, "{:?}", mechanisms);
        }
    }

    #[test]
    fn test_concurrent_runs_match_serial() {
        let treatment = catalogue::find("VH15D3").unwrap().treatment;
        let combinations = all_combinations();
        let serial: Vec<_> = combinations
            .iter()
            .map(|m| simulation(*m).run(&treatment).unwrap())
            .collect();

        let concurrent: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = combinations
                .iter()
                .map(|m| scope.spawn(|| simulation(*m).run(&treatment).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for ((mechanisms, a), b) in combinations.iter().zip(&serial).zip(&concurrent) {
            assert_eq!(a.final_state, b.final_state, "{:?}", mechanisms);
            assert_eq!(a.stats, b.stats, "{:?}", mechanisms);
        }
    }
}
