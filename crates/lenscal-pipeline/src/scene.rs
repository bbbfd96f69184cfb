//! Scene-data descriptor: the views and intrinsics this core reads and the
//! intrinsic fields it writes back.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use lenscal_core::{Distortion, DistortionKind, PinholeCamera, Real, Vec2};

/// Projection type of an intrinsic. Only pinhole intrinsics are calibrated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    Pinhole,
    Equidistant,
    Equirectangular,
}

/// One intrinsic of the scene.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntrinsicDesc {
    pub projection: ProjectionKind,
    pub model: DistortionKind,
    pub width: u32,
    pub height: u32,
    pub scale: [Real; 2],
    pub offset: [Real; 2],
    /// Model parameter vector; empty means the family seed.
    #[serde(default)]
    pub distortion_params: Vec<Real>,
}

/// One view of the scene; detector outputs are matched by the view id.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ViewDesc {
    pub intrinsic_id: u32,
}

/// Scene-data container. Maps are keyed by id and iterate in id order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneData {
    pub views: BTreeMap<u32, ViewDesc>,
    pub intrinsics: BTreeMap<u32, IntrinsicDesc>,
}

impl SceneData {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("cannot read scene data from '{}'", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("cannot parse scene data from '{}'", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)
            .with_context(|| format!("cannot write scene data to '{}'", path.display()))
    }
}

impl IntrinsicDesc {
    /// Build the core camera for this intrinsic.
    pub fn to_camera(&self) -> Result<PinholeCamera> {
        ensure!(
            self.projection == ProjectionKind::Pinhole,
            "only work for pinhole cameras"
        );
        let distortion = if self.distortion_params.is_empty() {
            Distortion::seeded(self.model)
        } else {
            Distortion::from_params(self.model, &self.distortion_params).ok_or_else(|| {
                anyhow!(
                    "{} distortion parameters do not fit model {:?}",
                    self.distortion_params.len(),
                    self.model
                )
            })?
        };
        Ok(PinholeCamera::new(
            self.width,
            self.height,
            Vec2::new(self.scale[0], self.scale[1]),
            Vec2::new(self.offset[0], self.offset[1]),
            distortion,
        ))
    }

    /// Write the fitted camera state back into the descriptor.
    pub fn update_from(&mut self, camera: &PinholeCamera) {
        self.scale = [camera.scale.x, camera.scale.y];
        self.offset = [camera.offset.x, camera.offset.y];
        self.distortion_params = camera.distortion.params();
    }
}
