//! Wall descriptors as served by `getwall.json` and `getgallery.json`

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Backend identifier of a wall
pub type WallId = u64;

/// Backend identifier of a gallery
pub type GalleryId = u64;

/// Placement of one picture in wall space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicturePlacement {
    /// Left edge in wall space
    pub x: f64,
    /// Top edge in wall space
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Image source (URL, `data:` URL or path); `None` draws a placeholder
    #[serde(default)]
    pub image: Option<String>,
}

impl PicturePlacement {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            image: None,
        }
    }

    pub fn with_image(mut self, source: impl Into<String>) -> Self {
        self.image = Some(source.into());
        self
    }
}

/// Picture placements keyed by picture id, in document order.
///
/// Keys keep the order they were inserted (or appeared in the JSON object),
/// which is the tie-break order for pictures of equal height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placements(Vec<(String, PicturePlacement)>);

impl Placements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a placement. An existing key keeps its position and takes the
    /// new value.
    pub fn insert(&mut self, key: impl Into<String>, placement: PicturePlacement) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = placement,
            None => self.0.push((key, placement)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PicturePlacement> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PicturePlacement)> {
        self.0.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, PicturePlacement)> for Placements {
    fn from_iter<I: IntoIterator<Item = (K, PicturePlacement)>>(iter: I) -> Self {
        let mut placements = Placements::new();
        for (k, p) in iter {
            placements.insert(k, p);
        }
        placements
    }
}

impl Serialize for Placements {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, p)| (k, p)))
    }
}

impl<'de> Deserialize<'de> for Placements {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PlacementsVisitor;

        impl<'de> Visitor<'de> for PlacementsVisitor {
            type Value = Placements;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of picture ids to placements")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Placements, A::Error> {
                let mut placements = Placements::new();
                while let Some((key, placement)) = map.next_entry::<String, PicturePlacement>()? {
                    placements.insert(key, placement);
                }
                Ok(placements)
            }
        }

        deserializer.deserialize_map(PlacementsVisitor)
    }
}

/// A wall (or gallery) and the pictures hung on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallDescriptor {
    pub id: WallId,
    /// Wall width in wall-space pixels
    pub width: f64,
    /// Wall height in wall-space pixels
    pub height: f64,
    /// Galleries get a floor drawn beneath the tallest picture
    #[serde(default)]
    pub is_gallery: bool,
    #[serde(default)]
    pub pictures_to_hang: Placements,
}

impl WallDescriptor {
    pub fn new(id: WallId, width: f64, height: f64) -> Self {
        Self {
            id,
            width,
            height,
            is_gallery: false,
            pictures_to_hang: Placements::new(),
        }
    }

    pub fn as_gallery(mut self) -> Self {
        self.is_gallery = true;
        self
    }

    pub fn with_picture(mut self, key: impl Into<String>, placement: PicturePlacement) -> Self {
        self.pictures_to_hang.insert(key, placement);
        self
    }

    /// Parse a backend payload.
    ///
    /// The backend answers `{"id": null}` for unknown walls; that yields
    /// `Ok(None)` rather than an error.
    pub fn from_payload(json: &str) -> Result<Option<Self>> {
        #[derive(Deserialize)]
        struct IdOnly {
            #[serde(default)]
            id: Option<IgnoredAny>,
        }

        let head: IdOnly = serde_json::from_str(json)?;
        if head.id.is_none() {
            return Ok(None);
        }
        let wall: WallDescriptor = serde_json::from_str(json)?;
        Ok(Some(wall))
    }

    /// Check the dimensions the renderer divides by and sorts on.
    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) || !(self.height.is_finite() && self.height > 0.0) {
            return Err(Error::InvalidWall(format!(
                "wall {} has non-positive dimensions {}x{}",
                self.id, self.width, self.height
            )));
        }
        for (key, p) in self.pictures_to_hang.iter() {
            let finite = [p.x, p.y, p.width, p.height].iter().all(|v| v.is_finite());
            if !finite || p.width <= 0.0 || p.height <= 0.0 {
                return Err(Error::InvalidWall(format!(
                    "picture {} on wall {} has invalid geometry ({}, {}, {}x{})",
                    key, self.id, p.x, p.y, p.width, p.height
                )));
            }
        }
        Ok(())
    }
}
