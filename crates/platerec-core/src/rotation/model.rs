// crates/platerec-core/src/rotation/model.rs

use std::path::{Path, PathBuf};

use log::info;

use crate::error::{EngineError, Result};
use crate::geometry::FiniteRotation;
use crate::rotation::file::read_rotation_file;
use crate::rotation::tree::RotationTree;
use crate::rotation::{PlateId, RotationSequence};

/// Time-dependent plate hierarchy loaded from one or more rotation files.
/// Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct RotationModel {
    sequences: Vec<RotationSequence>,
    sources: Vec<PathBuf>,
}

impl RotationModel {
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Err(EngineError::InvalidInput(
                "rotation model needs at least one rotation file".into(),
            ));
        }

        let mut sequences = Vec::new();
        let mut sources = Vec::with_capacity(paths.len());
        for p in paths {
            let p = p.as_ref();
            let seqs = read_rotation_file(p)?;
            info!(
                "loaded rotation file {}: {} sequences, {} poles",
                p.display(),
                seqs.len(),
                seqs.iter().map(|s| s.poles.len()).sum::<usize>()
            );
            sequences.extend(seqs);
            sources.push(p.to_path_buf());
        }

        let model = Self { sequences, sources };
        info!("rotation model id={}", model.model_id_hex());
        Ok(model)
    }

    pub fn from_sequences(sequences: Vec<RotationSequence>) -> Self {
        Self { sequences, sources: Vec::new() }
    }

    pub fn sequences(&self) -> &[RotationSequence] {
        &self.sequences
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Sorted, de-duplicated moving plate ids.
    pub fn moving_plate_ids(&self) -> Vec<PlateId> {
        let mut ids: Vec<PlateId> = self.sequences.iter().map(|s| s.moving).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Rotation of `moving` relative to its fixed plate at `time`.
    /// The first sequence in load order whose span contains `time` wins.
    pub fn relative_rotation(&self, moving: PlateId, time: f64) -> Option<(PlateId, FiniteRotation)> {
        self.sequences
            .iter()
            .filter(|s| s.moving == moving)
            .find_map(|s| s.rotation_at(time).map(|r| (s.fixed, r)))
    }

    pub fn tree(&self, time: f64, anchor: PlateId) -> Result<RotationTree> {
        RotationTree::new(self, time, anchor)
    }

    /// Rotation of `plate` relative to `anchor` at `time`.
    pub fn rotation(&self, time: f64, plate: PlateId, anchor: PlateId) -> Result<FiniteRotation> {
        self.tree(time, anchor)?.equivalent_rotation(plate)
    }

    /// Stable content id over every pole (blake3, first 16 bytes, hex).
    pub fn model_id_hex(&self) -> String {
        let mut h = blake3::Hasher::new();
        for s in &self.sequences {
            for p in &s.poles {
                h.update(&p.moving.to_le_bytes());
                h.update(&p.fixed.to_le_bytes());
                h.update(&p.time.to_le_bytes());
                h.update(&p.pole.lat.to_le_bytes());
                h.update(&p.pole.lon.to_le_bytes());
                h.update(&p.angle.to_le_bytes());
            }
        }
        let hash = h.finalize();
        hex(&hash.as_bytes()[0..16])
    }
}

fn hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(HEX[(b >> 4) as usize] as char);
        s.push(HEX[(b & 0x0f) as usize] as char);
    }
    s
}
