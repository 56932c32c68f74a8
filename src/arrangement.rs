//! Arrangement algorithms and the per-gallery arrangement session

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::backend::WallBackend;
use crate::wall::{GalleryId, WallDescriptor, WallId};
use crate::{Error, Result};

/// Layout algorithm the backend uses to arrange a gallery into a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmType {
    Linear,
    Column,
    Grid,
}

impl AlgorithmType {
    pub const ALL: [AlgorithmType; 3] = [AlgorithmType::Linear, AlgorithmType::Column, AlgorithmType::Grid];

    /// Form value sent as `algorithm_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::Linear => "linear",
            AlgorithmType::Column => "column",
            AlgorithmType::Grid => "grid",
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AlgorithmType::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Other(format!("unknown algorithm type: {}", s)))
    }
}

/// State of the arrangement page for one gallery.
///
/// Each algorithm's wall is generated once and reused until refreshed or
/// reset; walls saved through the session are remembered.
pub struct ArrangementSession<B: WallBackend> {
    backend: B,
    gallery_id: GalleryId,
    generated: HashMap<AlgorithmType, WallId>,
    saved: HashSet<WallId>,
    current: Option<(AlgorithmType, WallId)>,
}

impl<B: WallBackend> ArrangementSession<B> {
    pub fn new(backend: B, gallery_id: GalleryId) -> Self {
        Self {
            backend,
            gallery_id,
            generated: HashMap::new(),
            saved: HashSet::new(),
            current: None,
        }
    }

    pub fn gallery_id(&self) -> GalleryId {
        self.gallery_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Select `algorithm`, arranging the gallery only the first time.
    pub fn show(&mut self, algorithm: AlgorithmType) -> Result<WallId> {
        let wall_id = match self.generated.get(&algorithm) {
            Some(&id) => {
                debug!("reusing wall {} for {} arrangement", id, algorithm);
                id
            }
            None => self.arrange(algorithm)?,
        };
        self.current = Some((algorithm, wall_id));
        Ok(wall_id)
    }

    /// Select `algorithm` with a freshly arranged wall.
    pub fn refresh(&mut self, algorithm: AlgorithmType) -> Result<WallId> {
        let wall_id = self.arrange(algorithm)?;
        self.current = Some((algorithm, wall_id));
        Ok(wall_id)
    }

    fn arrange(&mut self, algorithm: AlgorithmType) -> Result<WallId> {
        let wall_id = self.backend.arrange(self.gallery_id, algorithm)?;
        info!(
            "gallery {} arranged with {} as wall {}",
            self.gallery_id, algorithm, wall_id
        );
        self.generated.insert(algorithm, wall_id);
        Ok(wall_id)
    }

    /// Forget generated walls and the current selection. Saved walls stay saved.
    pub fn reset(&mut self) {
        self.generated.clear();
        self.current = None;
    }

    /// Save the currently selected wall.
    pub fn save_current(&mut self) -> Result<WallId> {
        let (_, wall_id) = self
            .current
            .ok_or_else(|| Error::Other("no arrangement selected to save".into()))?;
        let saved = self.backend.save_wall(wall_id)?;
        info!("saved wall {}", saved);
        self.saved.insert(saved);
        Ok(saved)
    }

    pub fn is_saved(&self, wall_id: WallId) -> bool {
        self.saved.contains(&wall_id)
    }

    pub fn current(&self) -> Option<(AlgorithmType, WallId)> {
        self.current
    }

    pub fn generated(&self, algorithm: AlgorithmType) -> Option<WallId> {
        self.generated.get(&algorithm).copied()
    }

    /// Fetch the current wall's descriptor from the backend
    pub fn fetch_current(&self) -> Result<Option<WallDescriptor>> {
        match self.current {
            Some((_, wall_id)) => self.backend.get_wall(wall_id),
            None => Ok(None),
        }
    }
}
