use anyhow::{Context, Result};
use std::path::PathBuf;

use nwbconv::nwb::{NwbFile, NwbIo, TimeSeries};

/// Display file-level fields and the hierarchy of an NWB container
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let nwbfile = NwbIo::read_hierarchy(&file).context("Failed to read NWB container")?;
    print!("{}", format_report(&file.display().to_string(), &nwbfile));
    Ok(())
}

fn format_report(file: &str, nwbfile: &NwbFile) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", heading("NWB File Information")));
    output.push_str("====================\n");
    output.push_str(&format!("File: {}\n\n", file));

    output.push_str(&format!("{}\n", heading("Session:")));
    output.push_str(&format!("  Identifier: {}\n", nwbfile.identifier));
    output.push_str(&format!("  Description: {}\n", nwbfile.session_description));
    output.push_str(&format!("  Start time: {}\n", nwbfile.session_start_time.to_rfc3339()));
    if let Some(session_id) = &nwbfile.session_id {
        output.push_str(&format!("  Session id: {}\n", session_id));
    }
    if !nwbfile.experimenter.is_empty() {
        output.push_str(&format!("  Experimenter: {}\n", nwbfile.experimenter.join(", ")));
    }
    output.push('\n');

    if !nwbfile.devices.is_empty() {
        output.push_str(&format!("{}\n", heading("Devices:")));
        for device in nwbfile.devices.values() {
            match &device.description {
                Some(description) => output.push_str(&format!("  {} ({})\n", device.name, description)),
                None => output.push_str(&format!("  {}\n", device.name)),
            }
        }
        output.push_str(&format!(
            "  Electrode groups: {}, electrodes: {}\n\n",
            nwbfile.electrode_groups.len(),
            nwbfile.electrodes.len()
        ));
    }

    output.push_str(&format!("{}\n", heading("Series:")));
    for (location, series) in nwbfile.series() {
        output.push_str(&format!("  {}\n", describe(&location, series)));
    }
    output
}

fn describe(location: &str, series: &TimeSeries) -> String {
    let timing = match series.rate() {
        Some(rate) => format!("{} Hz from {} s", rate, series.starting_time().unwrap_or(0.0)),
        None => "timestamps".to_string(),
    };
    format!(
        "{} [{}] {} x {} ({}, {})",
        location,
        series.neurodata_type.as_str(),
        series.data.num_frames,
        series.data.num_channels,
        series.unit,
        timing
    )
}

#[cfg(feature = "colorized_output")]
fn heading(text: &str) -> String {
    console::style(text).bold().cyan().to_string()
}

#[cfg(not(feature = "colorized_output"))]
fn heading(text: &str) -> String {
    text.to_string()
}
