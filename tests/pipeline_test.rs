use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use patchclamp_backend::config::{BaselineParams, CkParams, IdealizationParams};
use patchclamp_backend::error::Error;
use patchclamp_backend::raw::{Filetype, InputUnits, RawRecording};
use patchclamp_backend::recording::{BaseRecording, Recording, ALL_LIST};
use patchclamp_backend::selection::Selection;
use patchclamp_backend::units::{CurrentUnit, TimeUnit};
use patchclamp_backend::{BaselineMethod, Series};

// A two-episode recording with piezo data: the channel opens to 1 pA
// while the piezo is high over the middle of the sweep.
fn test_recording() -> Recording {
    let sampling_rate = 1e3;
    let n_samples = 100;
    let time: Vec<f64> = (0..n_samples).map(|i| i as f64 / sampling_rate).collect();
    let mut currents = Vec::new();
    let mut piezos = Vec::new();
    for episode in 0..2 {
        currents.push(
            (0..n_samples)
                .map(|i| {
                    let open = if (40..60).contains(&i) { 1e-12 } else { 0. };
                    open + episode as f64 * 1e-13
                })
                .collect(),
        );
        piezos.push(
            (0..n_samples)
                .map(|i| if (30..70).contains(&i) { 10. } else { 0. })
                .collect(),
        );
    }
    let raw = RawRecording {
        column_names: vec!["time".into(), "trace".into(), "piezo".into()],
        time,
        currents,
        piezos: Some(piezos),
        commands: None,
    };
    Recording::from_raw(&raw, sampling_rate, &InputUnits::default()).unwrap()
}

fn bc_params() -> BaselineParams {
    BaselineParams {
        method: BaselineMethod::Offset,
        degree: 0,
        selection: Selection::Piezo {
            active: false,
            deviation: 0.05,
        },
    }
}

#[test]
fn lineage_key_of_stacked_stages() {
    let mut recording = test_recording();
    assert_eq!(recording.current_datakey(), "raw_");

    recording.baseline_correction(&bc_params()).unwrap();
    assert_eq!(recording.current_datakey(), "BC_");

    recording.gauss_filter_series(1000.).unwrap();
    assert_eq!(recording.current_datakey(), "BC_GFILTER1000_");

    recording
        .ck_filter_series(&CkParams::new(vec![3, 5], 2., 10))
        .unwrap();
    assert_eq!(
        recording.current_datakey(),
        "BC_GFILTER1000_CKFILTER_K2p2M10_"
    );

    // All intermediate series stay available.
    assert_eq!(
        recording.datakeys(),
        vec!["raw_", "BC_", "BC_GFILTER1000_", "BC_GFILTER1000_CKFILTER_K2p2M10_"]
    );
}

#[test]
fn stages_leave_the_source_series_untouched() {
    let mut recording = test_recording();
    let before: Vec<Vec<f64>> = recording
        .series()
        .iter()
        .map(|e| e.trace().to_vec())
        .collect();

    recording.baseline_correction(&bc_params()).unwrap();
    recording.select_series("raw_").unwrap();
    let after: Vec<Vec<f64>> = recording
        .series()
        .iter()
        .map(|e| e.trace().to_vec())
        .collect();
    assert_eq!(before, after);

    // And the corrected series is a genuinely different buffer.
    recording.select_series("BC_").unwrap();
    let corrected: Vec<Vec<f64>> = recording
        .series()
        .iter()
        .map(|e| e.trace().to_vec())
        .collect();
    assert_ne!(before, corrected);
}

#[test]
fn repeating_a_stage_replaces_the_series() {
    let mut recording = test_recording();
    recording.baseline_correction(&bc_params()).unwrap();
    recording.select_series("raw_").unwrap();
    recording.baseline_correction(&bc_params()).unwrap();
    assert_eq!(recording.datakeys(), vec!["raw_", "BC_"]);
}

#[test]
fn select_series_rejects_unknown_datakeys() {
    let mut recording = test_recording();
    match recording.select_series("GFILTER100_") {
        Err(Error::UnknownDatakey { datakey, .. }) => assert_eq!(datakey, "GFILTER100_"),
        other => panic!("expected UnknownDatakey, got {:?}", other),
    }
}

#[test]
fn select_episode_rejects_out_of_range_indices() {
    let mut recording = test_recording();
    recording.select_episode(1).unwrap();
    assert!(matches!(
        recording.select_episode(2),
        Err(Error::EpisodeOutOfRange { n_episode: 2, len: 2 })
    ));
}

#[test]
fn insert_series_validates_the_datakey_grammar() {
    let mut recording = test_recording();
    let series = recording.series().clone();
    recording.insert_series("BC_GFILTER500_", series).unwrap();

    let series = recording.series().clone();
    assert!(matches!(
        recording.insert_series("bogus", series),
        Err(Error::InvalidDatakey { .. })
    ));
}

#[test]
fn events_require_an_idealized_series() {
    let mut recording = test_recording();
    assert!(matches!(
        recording.get_events(),
        Err(Error::NotIdealized { .. })
    ));

    // Idealizing only the current episode is not enough for a
    // series-wide event table.
    let params = IdealizationParams::new(vec![0., 1e-12]);
    let mut rng = Pcg32::seed_from_u64(3);
    recording.idealize_episode(&params, &mut rng).unwrap();
    assert!(matches!(
        recording.get_events(),
        Err(Error::NotIdealized { n_episode: 1 })
    ));

    recording.idealize_series(&params, &mut rng).unwrap();
    let rows = recording.get_events().unwrap();
    assert!(rows.iter().any(|r| r.n_episode == 0));
    assert!(rows.iter().any(|r| r.n_episode == 1));
    // Each episode contributes open-close-open around the piezo pulse.
    assert_eq!(rows.iter().filter(|r| r.n_episode == 0).count(), 3);
}

#[test]
fn idealization_artifacts_live_on_the_episodes() {
    let mut recording = test_recording();
    let params = IdealizationParams::new(vec![0., 1e-12]);
    let mut rng = Pcg32::seed_from_u64(3);
    recording.idealize_series(&params, &mut rng).unwrap();

    for episode in recording.series() {
        let idealization = episode.idealization().unwrap();
        assert_eq!(idealization.len(), episode.time().len());
        assert_eq!(
            episode.idealization_time().unwrap().len(),
            idealization.len()
        );
    }
}

#[test]
fn first_activation_respects_exclusions() {
    let mut recording = test_recording();
    // Traces never go below -1 pA, so the threshold is never crossed
    // and detection falls back to the trace start.
    recording.detect_first_activation(-1e-12, &[1]);
    assert_eq!(recording.series().get(0).unwrap().first_activation(), Some(0.));
    assert_eq!(recording.series().get(1).unwrap().first_activation(), None);
}

#[test]
fn user_lists_union_and_protection() {
    let mut recording = test_recording();

    recording.new_list("open", BTreeSet::from([0]), "red", Some('o'));
    recording.new_list("noisy", BTreeSet::from([1, 7]), "blue", None);

    // Out-of-range indices are dropped from the view.
    assert_eq!(
        recording.selected_indices(&["open", "noisy"]).unwrap(),
        vec![0, 1]
    );
    assert_eq!(recording.selected_indices(&[ALL_LIST]).unwrap(), vec![0, 1]);

    recording.add_to_list("open", 1).unwrap();
    assert_eq!(recording.selected_indices(&["open"]).unwrap(), vec![0, 1]);
    recording.remove_from_list("open", 0).unwrap();
    assert_eq!(recording.selected_indices(&["open"]).unwrap(), vec![1]);

    assert!(matches!(
        recording.remove_list(ALL_LIST),
        Err(Error::ProtectedList { .. })
    ));
    assert!(matches!(
        recording.remove_list("missing"),
        Err(Error::UnknownList { .. })
    ));
    recording.remove_list("noisy").unwrap();
    assert!(matches!(
        recording.selected_indices(&["noisy"]),
        Err(Error::UnknownList { .. })
    ));
}

#[test]
fn ingest_converts_to_si() {
    let raw = RawRecording {
        column_names: vec!["time".into(), "trace".into()],
        time: vec![0., 1., 2.],
        currents: vec![vec![1., 2., 3.]],
        piezos: None,
        commands: None,
    };
    let units = InputUnits {
        time: TimeUnit::MilliSecond,
        trace: CurrentUnit::PicoAmpere,
        ..InputUnits::default()
    };
    let recording = Recording::from_raw(&raw, 1e3, &units).unwrap();
    let episode = recording.series().get(0).unwrap();
    assert!((episode.time()[1] - 1e-3).abs() < 1e-15);
    assert!((episode.trace()[2] - 3e-12).abs() < 1e-24);
}

#[test]
fn ingest_rejects_mismatched_channel_counts() {
    let raw = RawRecording {
        column_names: vec![],
        time: vec![0., 1.],
        currents: vec![vec![0., 0.], vec![0., 0.]],
        piezos: Some(vec![vec![0., 0.]]),
        commands: None,
    };
    assert!(matches!(
        Recording::from_raw(&raw, 1., &InputUnits::default()),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn filetype_dispatch() {
    assert_eq!(Filetype::from_path("rec.mat").unwrap(), Filetype::Matlab);
    assert_eq!(Filetype::from_path("rec.axgd").unwrap(), Filetype::Axograph);
    assert_eq!(Filetype::from_path("rec.pkl").unwrap(), Filetype::Native);
    assert!(matches!(
        Filetype::from_path("rec.csv"),
        Err(Error::UnsupportedFiletype { .. })
    ));
}

#[test]
fn recording_round_trips_through_serde() {
    let mut recording = test_recording();
    recording.baseline_correction(&bc_params()).unwrap();

    let json = serde_json::to_string(&recording).unwrap();
    let restored: Recording = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.current_datakey(), "BC_");
    assert_eq!(restored.datakeys(), recording.datakeys());
    assert_eq!(
        restored.series().get(0).unwrap().trace(),
        recording.series().get(0).unwrap().trace()
    );
    assert!(restored.lists().contains_key(ALL_LIST));
}

#[test]
fn histograms_follow_the_selection() {
    let recording = test_recording();

    // Piezo-active histogram of episode 0: only the open-channel level.
    let hist = recording
        .episode_hist(
            10,
            false,
            &Selection::Piezo {
                active: true,
                deviation: 0.05,
            },
        )
        .unwrap();
    assert_eq!(hist.heights.sum(), 40.);

    // Series-wide histogram without selection covers every sample.
    let hist = recording.series_hist(10, false, &Selection::None).unwrap();
    assert_eq!(hist.heights.sum(), 200.);
    assert_eq!(hist.bin_edges.len(), 11);
}

#[test]
fn piezo_histogram_degrades_without_piezo_data() {
    let raw = RawRecording {
        column_names: vec!["time".into(), "trace".into()],
        time: vec![0., 1e-3, 2e-3, 3e-3],
        currents: vec![vec![1., 2., 3., 4.]],
        piezos: None,
        commands: None,
    };
    let recording = Recording::from_raw(&raw, 1e3, &InputUnits::default()).unwrap();
    let hist = recording
        .series_hist(
            2,
            false,
            &Selection::Piezo {
                active: true,
                deviation: 0.05,
            },
        )
        .unwrap();
    assert_eq!(hist.heights.sum(), 4.);
}

#[test]
fn std_screen_flags_noisy_episodes() {
    let recording = test_recording();
    // Both episodes swing by 1 pA during the pulse; a generous
    // threshold flags nothing, a tiny one flags both.
    assert!(recording.series().check_std_all(1e-9).is_empty());
    assert_eq!(recording.series().check_std_all(1e-15), vec![0, 1]);
}

#[test]
fn events_csv_has_header_and_three_decimals() {
    use patchclamp_backend::export::events_csv;

    let mut recording = test_recording();
    let params = IdealizationParams::new(vec![0., 1e-12]);
    let mut rng = Pcg32::seed_from_u64(11);
    recording.idealize_series(&params, &mut rng).unwrap();

    let csv = events_csv(&recording, TimeUnit::MilliSecond, CurrentUnit::PicoAmpere).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "amplitude [pA],duration [ms],t_start,t_stop,episode number"
    );
    // First event of episode 0: closed at 0 pA for 40 ms.
    assert_eq!(lines.next().unwrap(), "0,40.000,0.000,39.000,0");
}

#[test]
fn matlab_table_zero_pads_episode_numbers() {
    use patchclamp_backend::export::{matlab_table, OutputUnits};

    let sampling_rate = 1e3;
    let time: Vec<f64> = (0..4).map(|i| i as f64 / sampling_rate).collect();
    let raw = RawRecording {
        column_names: vec!["time".into(), "trace".into()],
        time,
        currents: (0..12).map(|e| vec![e as f64; 4]).collect(),
        piezos: None,
        commands: None,
    };
    let recording = Recording::from_raw(&raw, sampling_rate, &InputUnits::default()).unwrap();

    let table = matlab_table(
        &recording,
        "raw_",
        &[ALL_LIST],
        false,
        false,
        &OutputUnits::default(),
    )
    .unwrap();
    assert_eq!(table[0].0, "time");
    // 12 episodes pad to two digits.
    assert_eq!(table[1].0, "trace00");
    assert_eq!(table[11].0, "trace10");
    assert_eq!(table.len(), 13);
}

#[test]
fn idealization_csv_is_time_by_episode() {
    use patchclamp_backend::export::idealization_csv;

    let mut recording = test_recording();
    let params = IdealizationParams::new(vec![0., 1e-12]);
    let mut rng = Pcg32::seed_from_u64(2);
    recording.idealize_series(&params, &mut rng).unwrap();

    let csv = idealization_csv(
        &recording,
        &[ALL_LIST],
        TimeUnit::MilliSecond,
        CurrentUnit::PicoAmpere,
    )
    .unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    // One row per sample: time, then one idealization column per episode.
    assert_eq!(lines.len(), 100);
    assert_eq!(lines[0], "0,0,0");
    assert_eq!(lines[50], "50,1,1");
}

#[test]
fn axograph_table_interleaves_channels() {
    use patchclamp_backend::export::{axograph_table, OutputUnits};

    let recording = test_recording();
    let (names, columns) = axograph_table(
        &recording,
        "raw_",
        &[ALL_LIST],
        true,
        false,
        &OutputUnits::default(),
    )
    .unwrap();
    assert_eq!(
        names,
        vec![
            "time (s)",
            "Ipatch (A ep#0)",
            "piezo voltage (V ep#0)",
            "Ipatch (A ep#1)",
            "piezo voltage (V ep#1)",
        ]
    );
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[0].len(), 100);
}

#[test]
fn first_activation_csv_lists_detected_episodes() {
    use patchclamp_backend::export::first_activation_csv;

    let mut recording = test_recording();
    recording.detect_first_activation(5e-13, &[]);
    let csv = first_activation_csv(&recording, &[ALL_LIST], TimeUnit::MilliSecond).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    // The trace first dips below 0.5 pA at its very first sample.
    assert_eq!(lines[0], "0,0");
}

#[test]
fn series_rejects_structural_mismatch() {
    use ndarray::Array1;
    use patchclamp_backend::Episode;

    let recording = test_recording();
    let episodes: Vec<_> = recording.series().iter().cloned().collect();
    assert!(Series::new(episodes).is_ok());

    // An episode of a different length cannot join the series.
    let time: Array1<f64> = (0..10).map(|i| i as f64).collect();
    let stray = Episode::new(2, time.clone(), Array1::zeros(10), None, None, 1.).unwrap();
    let mut episodes: Vec<_> = recording.series().iter().cloned().collect();
    episodes.push(stray);
    assert!(matches!(
        Series::new(episodes),
        Err(Error::ShapeMismatch { .. })
    ));
}
