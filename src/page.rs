//! Render target discovery in wall listing and arrangement pages.
//!
//! Pages mark what to draw with data attributes: `data-wallid` and
//! `data-galleryid` on the elements owning a wall, `data-algorithmtype` on
//! arrangement buttons. Each wall draws into `<canvas id="canvas<id>">`.

use log::warn;
use scraper::{ElementRef, Html, Selector};

use crate::arrangement::AlgorithmType;
use crate::wall::WallId;
use crate::{CanvasSize, Error, Result};

/// A wall or gallery to render, with its canvas size when the page has one
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasTarget {
    pub id: WallId,
    pub canvas: Option<CanvasSize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageTargets {
    pub walls: Vec<CanvasTarget>,
    pub galleries: Vec<CanvasTarget>,
    pub algorithms: Vec<AlgorithmType>,
}

impl PageTargets {
    pub fn is_empty(&self) -> bool {
        self.walls.is_empty() && self.galleries.is_empty() && self.algorithms.is_empty()
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::PageError(format!("Bad selector {}: {:?}", css, e)))
}

/// Find every render target in `html`, in document order without duplicates.
pub fn discover(html: &str) -> Result<PageTargets> {
    let document = Html::parse_document(html);
    let canvas_sel = selector("canvas[id]")?;

    let canvases: Vec<(String, Option<CanvasSize>)> = document
        .select(&canvas_sel)
        .filter_map(|node| {
            let id = node.value().attr("id")?;
            Some((id.to_string(), canvas_size(&node)))
        })
        .collect();
    let canvas_for = |id: WallId| {
        let wanted = format!("canvas{}", id);
        canvases
            .iter()
            .find(|(cid, _)| *cid == wanted)
            .and_then(|(_, size)| *size)
    };

    let mut targets = PageTargets::default();
    for (attr, list) in [("data-wallid", &mut targets.walls), ("data-galleryid", &mut targets.galleries)] {
        let sel = selector(&format!("[{}]", attr))?;
        for node in document.select(&sel) {
            let raw = node.value().attr(attr).unwrap_or_default();
            let Ok(id) = raw.trim().parse::<WallId>() else {
                warn!("ignoring {}={:?}: not a numeric id", attr, raw);
                continue;
            };
            if list.iter().any(|t| t.id == id) {
                continue;
            }
            list.push(CanvasTarget {
                id,
                canvas: canvas_for(id),
            });
        }
    }

    let algo_sel = selector("[data-algorithmtype]")?;
    for node in document.select(&algo_sel) {
        let raw = node.value().attr("data-algorithmtype").unwrap_or_default();
        match raw.parse::<AlgorithmType>() {
            Ok(a) if !targets.algorithms.contains(&a) => targets.algorithms.push(a),
            Ok(_) => {}
            Err(_) => warn!("ignoring unknown algorithm type {:?}", raw),
        }
    }

    Ok(targets)
}

fn canvas_size(node: &ElementRef<'_>) -> Option<CanvasSize> {
    let width: u32 = node.value().attr("width")?.trim().parse().ok()?;
    let height: u32 = node.value().attr("height")?.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(CanvasSize { width, height })
}
