//! Checkerboard detector output files.
//!
//! The detector writes one JSON file per view, named `checkers_<viewId>.json`,
//! holding the corner list and the board index grids. Views without a file
//! are skipped silently.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::scene::SceneData;
use lenscal_core::{CheckerBoard, CheckerBoardCorner};

/// Detector output for one view: detected corners plus the boards grouping
/// them into grid topologies.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckerDetector {
    pub corners: Vec<CheckerBoardCorner>,
    pub boards: Vec<CheckerBoard>,
}

/// File name of one view's detector output.
pub fn detector_file_name(view_id: u32) -> String {
    format!("checkers_{view_id}.json")
}

pub fn load_detector(path: &Path) -> Result<CheckerDetector> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("cannot read detector output '{}'", path.display()))?;
    let detector: CheckerDetector = serde_json::from_str(&data)
        .with_context(|| format!("cannot parse detector output '{}'", path.display()))?;
    for (idx, board) in detector.boards.iter().enumerate() {
        ensure!(
            board.is_consistent(detector.corners.len()),
            "board {idx} of '{}' references corners out of range",
            path.display()
        );
    }
    Ok(detector)
}

/// Load the detector output of every view that has one.
pub fn load_detectors(dir: &Path, scene: &SceneData) -> Result<BTreeMap<u32, CheckerDetector>> {
    let mut detectors = BTreeMap::new();
    for &view_id in scene.views.keys() {
        let path: PathBuf = dir.join(detector_file_name(view_id));
        if !path.exists() {
            continue;
        }
        detectors.insert(view_id, load_detector(&path)?);
    }
    Ok(detectors)
}
