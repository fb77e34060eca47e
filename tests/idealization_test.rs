use ndarray::{array, Array1};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use patchclamp_backend::idealization::{detect_first_activation, Idealizer};

fn millis(indices: std::ops::Range<usize>) -> Array1<f64> {
    indices.map(|i| i as f64 * 1e-3).collect()
}

#[test]
fn threshold_crossing_two_levels() {
    // Midpoint threshold at 0.5.
    let signal = array![0.1, 0.9, 1.1, 0.4, 0.0];
    let idealization = Idealizer::threshold_crossing(&signal, &[1.0, 0.0], None);
    assert_eq!(idealization.to_vec(), vec![0., 1., 1., 0., 0.]);
}

#[test]
fn threshold_crossing_sorts_amplitudes() {
    let signal = array![0.1, 0.9, 1.1, 0.4, 0.0];
    let ascending = Idealizer::threshold_crossing(&signal, &[0.0, 1.0], None);
    let descending = Idealizer::threshold_crossing(&signal, &[1.0, 0.0], None);
    assert_eq!(ascending, descending);
}

#[test]
fn threshold_crossing_single_amplitude_is_constant() {
    let signal = array![0.3, -2., 5.];
    let idealization = Idealizer::threshold_crossing(&signal, &[1.5], None);
    assert_eq!(idealization.to_vec(), vec![1.5, 1.5, 1.5]);
}

#[test]
fn threshold_crossing_three_levels() {
    let signal = array![2.2, 1.9, 1.1, 0.9, 0.1, -0.3];
    let idealization = Idealizer::threshold_crossing(&signal, &[2., 1., 0.], None);
    assert_eq!(idealization.to_vec(), vec![2., 2., 1., 1., 0., 0.]);
}

#[test]
fn wrong_length_thresholds_fall_back_to_midpoints() {
    let signal = array![0.1, 0.9, 1.1, 0.4, 0.0];
    let with_bad = Idealizer::threshold_crossing(&signal, &[1.0, 0.0], Some(&[0.2, 0.4, 0.6]));
    let with_none = Idealizer::threshold_crossing(&signal, &[1.0, 0.0], None);
    assert_eq!(with_bad, with_none);
}

#[test]
fn supplied_thresholds_used_as_is() {
    let signal = array![0.1, 0.9, 1.1, 0.4, 0.0];
    // A threshold at 0.85 flips the classification of the 0.9 sample.
    let idealization = Idealizer::threshold_crossing(&signal, &[1.0, 0.0], Some(&[0.85]));
    assert_eq!(idealization.to_vec(), vec![0., 1., 1., 0., 0.]);
}

#[test]
fn idealization_values_subset_of_amplitudes() {
    let signal: Array1<f64> = (0..100).map(|i| (i as f64 * 0.37).sin() * 2.).collect();
    let amplitudes = [1.5, 0.5, -1.];
    let idealization = Idealizer::threshold_crossing(&signal, &amplitudes, None);
    for &x in idealization.iter() {
        assert!(amplitudes.contains(&x), "value {} not an amplitude", x);
    }
}

#[test]
fn resolution_removes_short_interior_event() {
    // The length-1 event at index 2 merges into a neighbour; both
    // neighbours are zero, so the result is flat either way.
    let mut idealization = array![0., 0., 1., 0., 0., 0.];
    let time = millis(0..6);
    let mut rng = Pcg32::seed_from_u64(7);
    let residual =
        Idealizer::apply_resolution(&mut idealization, &time, 2e-3, &mut rng);
    assert_eq!(idealization.to_vec(), vec![0.; 6]);
    assert!(!residual);
}

#[test]
fn resolution_is_reproducible_with_a_seed() {
    let time = millis(0..12);
    let original = array![0., 0., 1., 0., 0., 1., 1., 0., 1., 0., 0., 0.];
    let mut first = original.clone();
    let mut second = original.clone();
    let mut rng = Pcg32::seed_from_u64(123);
    Idealizer::apply_resolution(&mut first, &time, 2e-3, &mut rng);
    let mut rng = Pcg32::seed_from_u64(123);
    Idealizer::apply_resolution(&mut second, &time, 2e-3, &mut rng);
    assert_eq!(first, second);
}

#[test]
fn first_event_merges_forward() {
    let mut idealization = array![1., 0., 0., 0.];
    let time = millis(0..4);
    let mut rng = Pcg32::seed_from_u64(0);
    Idealizer::apply_resolution(&mut idealization, &time, 2e-3, &mut rng);
    assert_eq!(idealization.to_vec(), vec![0., 0., 0., 0.]);
}

#[test]
fn last_event_merges_backward() {
    let mut idealization = array![0., 0., 0., 1.];
    let time = millis(0..4);
    let mut rng = Pcg32::seed_from_u64(0);
    Idealizer::apply_resolution(&mut idealization, &time, 2e-3, &mut rng);
    assert_eq!(idealization.to_vec(), vec![0., 0., 0., 0.]);
}

#[test]
fn resolution_durations_bounded_or_residual() {
    let time = millis(0..10);
    let original = array![0., 1., 0., 1., 1., 0., 1., 0., 0., 1.];
    let resolution = 3e-3;
    let mut idealization = original.clone();
    let mut rng = Pcg32::seed_from_u64(99);
    let residual =
        Idealizer::apply_resolution(&mut idealization, &time, resolution, &mut rng);
    let events = Idealizer::extract_events(&idealization, &time);
    assert!(
        residual || events.iter().all(|e| e.duration >= resolution),
        "events too short without residual warning: {:?}",
        events
    );
}

#[test]
fn unresolvable_trace_raises_residual() {
    // Everything is shorter than the resolution; merging collapses the
    // trace to a single run that is still too short.
    let mut idealization = array![0., 1., 0.];
    let time = millis(0..3);
    let mut rng = Pcg32::seed_from_u64(1);
    let residual = Idealizer::apply_resolution(&mut idealization, &time, 10e-3, &mut rng);
    assert!(residual);
}

#[test]
fn events_of_a_three_level_trace() {
    let idealization = array![2., 2., 1., 1., 1., 0., 0.];
    let time = millis(0..7);
    let events = Idealizer::extract_events(&idealization, &time);
    assert_eq!(events.len(), 3);

    let expect = [
        (2., 2e-3, 0., 1e-3),
        (1., 3e-3, 2e-3, 4e-3),
        (0., 2e-3, 5e-3, 6e-3),
    ];
    for (event, &(amplitude, duration, t_start, t_end)) in events.iter().zip(expect.iter()) {
        assert_eq!(event.amplitude, amplitude);
        assert!((event.duration - duration).abs() < 1e-12);
        assert!((event.t_start - t_start).abs() < 1e-12);
        assert!((event.t_end - t_end).abs() < 1e-12);
    }
}

#[test]
fn events_of_a_constant_trace() {
    let idealization = array![1., 1., 1.];
    let time = millis(0..3);
    let events = Idealizer::extract_events(&idealization, &time);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].t_start, 0.);
    assert_eq!(events[0].t_end, 2e-3);
    assert!((events[0].duration - 3e-3).abs() < 1e-12);
}

#[test]
fn event_durations_sum_to_trace_length() {
    let idealization = array![0., 1., 1., 0., 2., 2., 2., 0.];
    let time = millis(0..8);
    let events = Idealizer::extract_events(&idealization, &time);
    let total: f64 = events.iter().map(|e| e.duration).sum();
    let delta = time[1] - time[0];
    assert!((total - (time[7] - time[0] + delta)).abs() < 1e-12);
}

#[test]
fn events_reconstruct_the_idealization() {
    let idealization = array![0., 1., 1., 0., 2., 2., 2., 0.];
    let time = millis(0..8);
    let events = Idealizer::extract_events(&idealization, &time);

    let mut reconstruction = Array1::<f64>::zeros(idealization.len());
    for event in &events {
        for (i, &t) in time.iter().enumerate() {
            if t >= event.t_start - 1e-12 && t <= event.t_end + 1e-12 {
                reconstruction[i] = event.amplitude;
            }
        }
    }
    assert_eq!(reconstruction, idealization);
}

#[test]
fn idealize_episode_with_interpolation() {
    let time = millis(0..5);
    let signal = array![0., 0.2, 1., 0.9, 0.1];
    let mut rng = Pcg32::seed_from_u64(5);
    let (idealization, idealization_time) = Idealizer::idealize_episode(
        &signal,
        &time,
        &[1., 0.],
        None,
        None,
        2,
        &mut rng,
    )
    .unwrap();
    // Upsampling by 2 over 5 samples gives an 8-point end-exclusive grid.
    assert_eq!(idealization.len(), 8);
    assert_eq!(idealization_time.len(), 8);
    assert!((idealization_time[1] - 0.5e-3).abs() < 1e-12);
    for &x in idealization.iter() {
        assert!(x == 0. || x == 1.);
    }
}

#[test]
fn first_activation_at_first_crossing() {
    let time = millis(0..4);
    let signal = array![1., 2., 0.5, 3.];
    assert_eq!(detect_first_activation(&time, &signal, 0.8), time[2]);
}

#[test]
fn first_activation_defaults_to_trace_start() {
    let time = millis(0..4);
    let signal = array![1., 2., 1.5, 3.];
    assert_eq!(detect_first_activation(&time, &signal, 0.8), time[0]);
}
