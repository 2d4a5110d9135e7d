use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Bbox;
use crate::ocr::results::Block;

/// How a region's content is treated on recognition and export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    #[default]
    Text,
    Image,
}

impl RegionKind {
    pub const fn idx(&self) -> i16 {
        match self {
            RegionKind::Text => 0,
            RegionKind::Image => 1,
        }
    }

    pub fn from_idx(idx: i16) -> Self {
        match idx {
            1 => RegionKind::Image,
            _ => RegionKind::Text,
        }
    }
}

/// A rectangular area of the page marked for recognition or export.
///
/// Identity (`id`) is stable for the region's lifetime and is how
/// asynchronous recognition results find their way back. `order` is the
/// reading-order position maintained by the region store; it changes as
/// regions around this one come and go.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub id: Uuid,
    pub order: usize,
    pub bbox: Bbox,
    pub kind: RegionKind,
    /// Excluded regions are kept on the page but skipped by exporters.
    pub export_enabled: bool,
    /// Set once a recognition result has been attached.
    pub recognized: bool,
    /// Recognition language for this region, e.g. `deu` or `eng`.
    pub language: String,
    /// Semantic tag from layout analysis (`h1`, `figcaption`, ...).
    pub tag: String,
    /// Semantic class from layout analysis (`heading`, `flowing`, ...).
    pub class: String,
    /// Flowing text derived from the attached block.
    pub text: String,
    pub block: Option<Block>,
}

impl Region {
    pub fn new(bbox: Bbox, kind: RegionKind, language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order: 0,
            bbox,
            kind,
            export_enabled: true,
            recognized: false,
            language: language.into(),
            tag: String::new(),
            class: String::new(),
            text: String::new(),
            block: None,
        }
    }
}

/// Partial update of a region's editable properties.
///
/// `None` fields are left untouched. Order is deliberately absent:
/// reading-order changes go through the store so the contiguity of order
/// values is never in the hands of a property edit.
#[derive(Clone, Debug, Default)]
pub struct RegionPatch {
    pub bbox: Option<Bbox>,
    pub kind: Option<RegionKind>,
    pub export_enabled: Option<bool>,
    pub recognized: Option<bool>,
    pub language: Option<String>,
    pub tag: Option<String>,
    pub class: Option<String>,
    pub text: Option<String>,
    pub block: Option<Option<Block>>,
}

impl RegionPatch {
    pub fn apply(&self, region: &mut Region) {
        if let Some(bbox) = self.bbox {
            region.bbox = bbox;
        }
        if let Some(kind) = self.kind {
            region.kind = kind;
        }
        if let Some(export_enabled) = self.export_enabled {
            region.export_enabled = export_enabled;
        }
        if let Some(recognized) = self.recognized {
            region.recognized = recognized;
        }
        if let Some(language) = &self.language {
            region.language = language.clone();
        }
        if let Some(tag) = &self.tag {
            region.tag = tag.clone();
        }
        if let Some(class) = &self.class {
            region.class = class.clone();
        }
        if let Some(text) = &self.text {
            region.text = text.clone();
        }
        if let Some(block) = &self.block {
            region.block = block.clone();
        }
    }
}
