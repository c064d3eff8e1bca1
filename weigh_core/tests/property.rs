use proptest::prelude::*;
use weigh_core::advisory::AdvisoryLevel;
use weigh_core::speed::{PeakSpeed, estimate_mps};
use weigh_core::timing::APPROACH_GATE_CM;
use weigh_core::{LoadCellCalibration, WeightAccumulator};

proptest! {
    #[test]
    fn speed_matches_formula_inside_gate(prev in 0u16..2000, cur in 0u16..APPROACH_GATE_CM, periods in 1u32..5) {
        let dt = 0.1 * periods as f32;
        let v = estimate_mps(prev, cur, dt).unwrap();
        let expect = (f32::from(prev) - f32::from(cur)) / 100.0 / dt;
        prop_assert!((v - expect).abs() <= 1e-3 * expect.abs().max(1.0));
    }

    #[test]
    fn speed_undefined_outside_gate(prev in any::<u16>(), cur in APPROACH_GATE_CM..=u16::MAX) {
        prop_assert_eq!(estimate_mps(prev, cur, 0.1), None);
    }

    #[test]
    fn calibration_is_monotonic_and_bounded(a in 0u16..=3300, b in 0u16..=3300) {
        let cal = LoadCellCalibration::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cal.to_kg(lo) <= cal.to_kg(hi));
        prop_assert!(cal.to_kg(hi) <= 20_000);
    }

    #[test]
    fn accumulator_total_is_sum_of_averages(
        ch1 in proptest::collection::vec(0u32..=20_000, 50),
        ch2 in proptest::collection::vec(0u32..=20_000, 50),
    ) {
        let mut acc = WeightAccumulator::new(50);
        for (a, b) in ch1.iter().zip(&ch2) {
            prop_assert!(acc.add(0, *a));
            prop_assert!(acc.add(1, *b));
        }
        prop_assert!(acc.is_complete());
        prop_assert!(!acc.add(0, 1));
        let expect = ch1.iter().sum::<u32>() / 50 + ch2.iter().sum::<u32>() / 50;
        prop_assert_eq!(acc.total_kg(), expect);
    }

    #[test]
    fn peak_is_max_positive(speeds in proptest::collection::vec(proptest::option::of(-30.0f32..30.0), 0..40)) {
        let mut p = PeakSpeed::default();
        for s in &speeds {
            p.observe(*s);
        }
        let expect = speeds.iter().flatten().copied().fold(0.0f32, f32::max);
        prop_assert_eq!(p.get(), expect);
    }

    #[test]
    fn advisory_is_symmetric_in_direction(v in 0.0f32..50.0) {
        prop_assert_eq!(AdvisoryLevel::from_speed(Some(v)), AdvisoryLevel::from_speed(Some(-v)));
    }
}
