use rand::SeedableRng;
use rand_pcg::Pcg32;

use patchclamp_backend::config::IdealizationParams;
use patchclamp_backend::raw::{InputUnits, RawRecording};
use patchclamp_backend::recording::{BaseRecording, Recording};
use patchclamp_backend::selection::Selection;
use patchclamp_backend::{BaselineMethod, BaselineParams};

// Runs a synthetic two-level recording through the pipeline:
// baseline correction, Gaussian filter, idealization, event table.
fn main() {
    env_logger::init();

    let sampling_rate = 1e4;
    let n_samples = 1000;
    let time: Vec<f64> = (0..n_samples).map(|i| i as f64 / sampling_rate).collect();

    // Two episodes: a channel opening to 1 pA for the middle fifth of
    // the sweep, on a drifting baseline.
    let mut currents = Vec::new();
    for episode in 0..2 {
        let trace: Vec<f64> = (0..n_samples)
            .map(|i| {
                let drift = 0.1e-12 * time[i] * (episode + 1) as f64;
                let open = if (400..600).contains(&i) { 1e-12 } else { 0. };
                drift + open
            })
            .collect();
        currents.push(trace);
    }

    let raw = RawRecording {
        column_names: vec!["time".to_string(), "trace".to_string()],
        time,
        currents,
        piezos: None,
        commands: None,
    };
    let mut recording =
        Recording::from_raw(&raw, sampling_rate, &InputUnits::default()).unwrap();

    recording
        .baseline_correction(&BaselineParams {
            method: BaselineMethod::Polynomial,
            degree: 1,
            selection: Selection::Intervals(vec![(0., 0.03)]),
        })
        .unwrap();
    recording.gauss_filter_series(1000.).unwrap();

    let mut rng = Pcg32::seed_from_u64(42);
    let mut params = IdealizationParams::new(vec![0., 1e-12]);
    params.resolution = Some(1e-3);
    recording.idealize_series(&params, &mut rng).unwrap();

    println!("datakey: {}", recording.current_datakey());
    for row in recording.get_events().unwrap() {
        println!(
            "episode {}: {:.3e} A for {:.1} ms (t = {:.1}..{:.1} ms)",
            row.n_episode,
            row.amplitude,
            row.duration * 1e3,
            row.t_start * 1e3,
            row.t_end * 1e3,
        );
    }
}
