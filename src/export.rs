//! Exporter interfaces.
//!
//! Exporters are pure functions over a read-only recording. The
//! functions here build the tables and CSV text the file writers
//! consume; encoding the MATLAB/Axograph containers themselves is not a
//! core concern. Values are converted from SI to the caller-supplied
//! output units.

use std::fmt::Write;

use ndarray::Array1;

use crate::episode::Episode;
use crate::error::{Error, Result};
use crate::recording::{BaseRecording, Recording};
use crate::units::{CurrentUnit, TimeUnit, VoltageUnit};

/// Output units for trace-level exports.
#[derive(Debug, Clone, Copy)]
pub struct OutputUnits {
    pub time: TimeUnit,
    pub trace: CurrentUnit,
    pub piezo: VoltageUnit,
    pub command: VoltageUnit,
}

impl Default for OutputUnits {
    fn default() -> Self {
        OutputUnits {
            time: TimeUnit::Second,
            trace: CurrentUnit::Ampere,
            piezo: VoltageUnit::Volt,
            command: VoltageUnit::Volt,
        }
    }
}

fn series_for_export<'a>(
    recording: &'a Recording,
    datakey: &str,
) -> Result<&'a crate::series::Series> {
    recording
        .series_map()
        .get(datakey)
        .ok_or_else(|| Error::UnknownDatakey {
            datakey: datakey.to_string(),
            known: recording.series_map().keys().cloned().collect(),
        })
}

/// Builds the name → vector table of a MATLAB export: `time` plus
/// `trace{NN}` (and optionally `piezo{NN}`, `command{NN}`) per selected
/// episode, `NN` zero-padded to the digit count of the episode total.
pub fn matlab_table(
    recording: &Recording,
    datakey: &str,
    list_names: &[&str],
    save_piezo: bool,
    save_command: bool,
    units: &OutputUnits,
) -> Result<Vec<(String, Array1<f64>)>> {
    let series = series_for_export(recording, datakey)?;
    let fill_length = series.len().to_string().len();
    let indices = recording.selected_indices(list_names)?;

    let mut table = Vec::new();
    if let Some(first) = series.get(0) {
        table.push((
            "time".to_string(),
            first.time().mapv(|t| units.time.from_si(t)),
        ));
    }
    for i in indices {
        let episode = match series.get(i) {
            Some(episode) => episode,
            None => continue,
        };
        let n = format!("{:0>width$}", episode.n_episode(), width = fill_length);
        table.push((
            format!("trace{}", n),
            episode.trace().mapv(|x| units.trace.from_si(x)),
        ));
        if save_piezo {
            if let Some(piezo) = episode.piezo() {
                table.push((format!("piezo{}", n), piezo.mapv(|x| units.piezo.from_si(x))));
            }
        }
        if save_command {
            if let Some(command) = episode.command() {
                table.push((
                    format!("command{}", n),
                    command.mapv(|x| units.command.from_si(x)),
                ));
            }
        }
    }
    Ok(table)
}

/// Builds the column table of an Axograph export: column names and the
/// matching data columns (`time`, then per episode `Ipatch` and
/// optionally the piezo and command voltages).
pub fn axograph_table(
    recording: &Recording,
    datakey: &str,
    list_names: &[&str],
    save_piezo: bool,
    save_command: bool,
    units: &OutputUnits,
) -> Result<(Vec<String>, Vec<Array1<f64>>)> {
    let series = series_for_export(recording, datakey)?;
    let indices = recording.selected_indices(list_names)?;

    let mut column_names = vec![format!("time ({})", units.time.label())];
    let mut columns = Vec::new();
    if let Some(first) = series.get(0) {
        columns.push(first.time().mapv(|t| units.time.from_si(t)));
    }
    for i in indices {
        let episode = match series.get(i) {
            Some(episode) => episode,
            None => continue,
        };
        column_names.push(format!(
            "Ipatch ({} ep#{})",
            units.trace.label(),
            episode.n_episode()
        ));
        columns.push(episode.trace().mapv(|x| units.trace.from_si(x)));
        if save_piezo {
            if let Some(piezo) = episode.piezo() {
                column_names.push(format!(
                    "piezo voltage ({} ep#{})",
                    units.piezo.label(),
                    episode.n_episode()
                ));
                columns.push(piezo.mapv(|x| units.piezo.from_si(x)));
            }
        }
        if save_command {
            if let Some(command) = episode.command() {
                column_names.push(format!(
                    "command voltage ({} ep#{})",
                    units.command.label(),
                    episode.n_episode()
                ));
                columns.push(command.mapv(|x| units.command.from_si(x)));
            }
        }
    }
    Ok((column_names, columns))
}

/// CSV of the idealizations of the selected episodes as a time ×
/// episode matrix: first column the idealization time grid, then one
/// column per episode.
pub fn idealization_csv(
    recording: &Recording,
    list_names: &[&str],
    time_unit: TimeUnit,
    trace_unit: CurrentUnit,
) -> Result<String> {
    let episodes = recording.selected_episodes(list_names)?;
    let idealizations: Vec<(&Episode, &Array1<f64>)> = episodes
        .iter()
        .map(|&episode| {
            episode
                .idealization()
                .map(|idealization| (episode, idealization))
                .ok_or(Error::NotIdealized {
                    n_episode: episode.n_episode(),
                })
        })
        .collect::<Result<_>>()?;

    let mut csv = String::new();
    if let Some(&(first, _)) = idealizations.first() {
        let time = first
            .idealization_time()
            .ok_or(Error::NotIdealized {
                n_episode: first.n_episode(),
            })?;
        for row in 0..time.len() {
            write!(csv, "{}", time_unit.from_si(time[row])).unwrap();
            for &(_, idealization) in &idealizations {
                write!(csv, ",{}", trace_unit.from_si(idealization[row])).unwrap();
            }
            csv.push('\n');
        }
    }
    Ok(csv)
}

/// CSV of the event table of the current series, one row per event.
///
/// Columns: amplitude, duration, start time, stop time, episode number;
/// duration and the timestamps are printed with 3 decimal places.
pub fn events_csv(
    recording: &Recording,
    time_unit: TimeUnit,
    trace_unit: CurrentUnit,
) -> Result<String> {
    let mut csv = format!(
        "amplitude [{}],duration [{}],t_start,t_stop,episode number\n",
        trace_unit.label(),
        time_unit.label()
    );
    for row in recording.get_events()? {
        writeln!(
            csv,
            "{},{:.3},{:.3},{:.3},{}",
            trace_unit.from_si(row.amplitude),
            time_unit.from_si(row.duration),
            time_unit.from_si(row.t_start),
            time_unit.from_si(row.t_end),
            row.n_episode
        )
        .unwrap();
    }
    Ok(csv)
}

/// CSV of first-activation times: `episode index, first activation`.
///
/// Episodes without a detected first activation are skipped.
pub fn first_activation_csv(
    recording: &Recording,
    list_names: &[&str],
    time_unit: TimeUnit,
) -> Result<String> {
    let mut csv = String::new();
    for episode in recording.selected_episodes(list_names)? {
        if let Some(first_activation) = episode.first_activation() {
            writeln!(
                csv,
                "{},{}",
                episode.n_episode(),
                time_unit.from_si(first_activation)
            )
            .unwrap();
        }
    }
    Ok(csv)
}
