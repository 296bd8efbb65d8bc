use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

use nwbconv::interfaces::{AudioInterface, DataInterface, RunOptions};
use nwbconv::nwb::BackendConfiguration;

use super::config::Config;

/// Run the conversion described by a config file
pub fn run(config_path: PathBuf, overwrite: bool, verbose: bool) -> Result<()> {
    let config = Config::from_file(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let audio = config
        .audio
        .as_ref()
        .context("Config has no [audio] section; nothing to convert")?;
    let output = config
        .output
        .path
        .as_ref()
        .map(|path| base_dir.join(path))
        .context("Config has no output path ([output] path = ...)")?;
    let overwrite = overwrite || config.output.overwrite;

    let file_paths: Vec<PathBuf> = audio.file_paths.iter().map(|path| base_dir.join(path)).collect();
    let interface = AudioInterface::new(&file_paths, verbose).context("Failed to open audio sources")?;
    let conversion_options = audio.conversion_options()?;
    let overrides = config.metadata_overrides(base_dir)?;

    info!("nwbconv - audio to NWB");
    info!("======================");
    info!("Sources: {}", file_paths.len());
    info!("Output:  {}", output.display());

    let mut options = RunOptions::to_path(&output)
        .with_metadata(overrides.clone())
        .with_overwrite(overwrite)
        .with_verbose(verbose);

    if let Some(method) = &config.output.compression {
        if output.exists() && !overwrite {
            warn!("Compression setting ignored when appending to {}", output.display());
        } else {
            let metadata = interface.get_metadata()?.merged(&overrides);
            let preview = interface
                .create_nwbfile(&metadata, &conversion_options)
                .context("Failed to prepare datasets")?;
            let mut backend = BackendConfiguration::from_nwbfile(&preview);
            backend.apply_global_compression(method, config.output.compression_level)?;
            info!("Compression: {} ({} datasets)", method, backend.dataset_configurations.len());
            options = options.with_backend_configuration(backend);
        }
    }

    let nwbfile = interface
        .run_conversion(options, &conversion_options)
        .context("Conversion failed")?;

    info!("Conversion complete!");
    info!("  Series written: {}", nwbfile.series().len());
    let file_size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    info!(
        "  Output file size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1024.0 / 1024.0
    );

    Ok(())
}
