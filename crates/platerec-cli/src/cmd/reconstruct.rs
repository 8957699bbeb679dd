// crates/platerec-cli/src/cmd/reconstruct.rs

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use log::info;
use platerec_core::{reconstruct, Capabilities, PlateId, Version};

use crate::io::inputs;

pub const DEFAULT_OUTPUT_FILENAME_PREFIX: &str = "features";
pub const DEFAULT_OUTPUT_FILENAME_EXTENSION: &str = "gmt";

/// Oldest engine release this driver knows how to drive.
pub const REQUIRED_ENGINE_VERSION: Version = Version::new(0, 1, 0);

/// Raises (or lowers) the minimum engine version, e.g. `PLATEREC_MIN_ENGINE_VERSION=2.0`.
pub const MIN_ENGINE_VERSION_ENV: &str = "PLATEREC_MIN_ENGINE_VERSION";

#[derive(Args, Debug)]
pub struct ReconstructArgs {
    /// One or more rotation files.
    #[arg(
        short = 'r',
        long = "rotation_filenames",
        value_name = "rotation_filename",
        num_args = 1..,
        required = true
    )]
    pub rotation_filenames: Vec<PathBuf>,

    /// One or more feature files.
    #[arg(
        short = 'm',
        long = "feature_filenames",
        value_name = "feature_filename",
        num_args = 1..,
        required = true
    )]
    pub feature_filenames: Vec<PathBuf>,

    /// One or more times (Ma) at which to reconstruct features.
    #[arg(
        short = 't',
        long = "reconstruction_times",
        value_name = "reconstruction_time",
        num_args = 1..,
        required = true,
        allow_negative_numbers = true
    )]
    pub reconstruction_times: Vec<f64>,

    /// Filename extension of the output files (supported: shp, gmt, xy, geojson).
    #[arg(short = 'e', long = "output_filename_extension", default_value = DEFAULT_OUTPUT_FILENAME_EXTENSION)]
    pub output_filename_extension: String,

    /// Prefix of the output files containing the reconstructed features.
    #[arg(default_value = DEFAULT_OUTPUT_FILENAME_PREFIX)]
    pub output_filename_prefix: String,

    /// Anchor plate id used for reconstructing.
    #[arg(short = 'a', long = "anchor", default_value_t = 0)]
    pub anchor_plate_id: PlateId,
}

/// Minimum engine version: `PLATEREC_MIN_ENGINE_VERSION` if set, else the built-in floor.
pub fn required_engine_version() -> anyhow::Result<Version> {
    match std::env::var(MIN_ENGINE_VERSION_ENV) {
        Ok(v) if !v.trim().is_empty() => v
            .parse::<Version>()
            .map_err(|e| anyhow::anyhow!("{MIN_ENGINE_VERSION_ENV}: {e}")),
        _ => Ok(REQUIRED_ENGINE_VERSION),
    }
}

/// Fail when the linked engine is older than `required`.
pub fn check_engine(caps: &Capabilities, required: Version) -> anyhow::Result<()> {
    if caps.require(required).is_err() {
        anyhow::bail!(
            "imported platerec-core version {} but version {} or greater is required",
            caps.version,
            required
        );
    }
    Ok(())
}

/// `reconstructed_<prefix>_<time>Ma.<extension>`
pub fn export_filename(prefix: &str, time: f64, extension: &str) -> String {
    // -0.0 would otherwise print as "-0"
    let time = if time == 0.0 { 0.0 } else { time };
    format!("reconstructed_{prefix}_{time}Ma.{extension}")
}

pub fn run(args: ReconstructArgs) -> anyhow::Result<()> {
    let model = inputs::load_rotation_model(&args.rotation_filenames)?;
    let collections = inputs::load_feature_collections(&args.feature_filenames)?;

    for &time in &args.reconstruction_times {
        let export = export_filename(
            &args.output_filename_prefix,
            time,
            &args.output_filename_extension,
        );

        let summary = reconstruct(&collections, &model, &export, time, args.anchor_plate_id)
            .with_context(|| format!("reconstruct to {time} Ma -> {export}"))?;

        info!(
            "{export}: {} features, {} geometries, {} files",
            summary.features,
            summary.geometries,
            summary.files.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_filename_template() {
        assert_eq!(export_filename("features", 0.0, "gmt"), "reconstructed_features_0Ma.gmt");
        assert_eq!(export_filename("features", 10.0, "gmt"), "reconstructed_features_10Ma.gmt");
        assert_eq!(export_filename("coast", 12.5, "shp"), "reconstructed_coast_12.5Ma.shp");
        assert_eq!(export_filename("x", -0.0, "xy"), "reconstructed_x_0Ma.xy");
    }

    #[test]
    fn check_engine_accepts_current_build() {
        let caps = Capabilities::current();
        assert!(check_engine(&caps, REQUIRED_ENGINE_VERSION).is_ok());
    }

    #[test]
    fn check_engine_rejects_old_engine() {
        let caps = Capabilities {
            version: Version::new(0, 0, 9),
        };
        let err = check_engine(&caps, Version::new(0, 1, 0)).expect_err("too old");
        assert_eq!(
            err.to_string(),
            "imported platerec-core version 0.0.9 but version 0.1.0 or greater is required"
        );
    }
}
