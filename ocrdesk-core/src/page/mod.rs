pub mod region;
pub mod store;

pub use region::{Region, RegionKind, RegionPatch};
pub use store::RegionStore;

use serde::{Deserialize, Serialize};

use crate::geometry::Bbox;

/// Orientation of a separator mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub const fn idx(&self) -> i16 {
        match self {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 1,
        }
    }

    pub fn from_idx(idx: i16) -> Self {
        match idx {
            1 => Orientation::Vertical,
            _ => Orientation::Horizontal,
        }
    }
}

/// A ruled line found by layout analysis.
///
/// Separators are display-only marks; they never become regions and are
/// not recognized or exported.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Separator {
    pub bbox: Bbox,
    pub orientation: Orientation,
}

/// One scanned page of the project: its source image, its regions and the
/// guides that constrain layout analysis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Page {
    /// Path of the page image, relative to the project file.
    pub image_path: String,
    pub name: String,
    /// Physical paper size name, e.g. `A4`.
    pub paper_size: String,
    pub dpi: f32,
    /// Everything above this Y-coordinate is running header, excluded from
    /// layout analysis.
    pub header_y: Option<f32>,
    /// Everything below this Y-coordinate is running footer.
    pub footer_y: Option<f32>,
    /// Committed column split guides, as X-coordinates.
    pub split_xs: Vec<f32>,
    pub separators: Vec<Separator>,
    pub regions: RegionStore,
}

impl Page {
    pub fn new(image_path: impl Into<String>, name: impl Into<String>, dpi: f32) -> Self {
        Self {
            image_path: image_path.into(),
            name: name.into(),
            dpi,
            ..Default::default()
        }
    }

    /// The vertical band layout analysis may segment, as
    /// `(top, bottom)` Y-coordinates given the page image height.
    pub fn content_band(&self, image_height: f32) -> (f32, f32) {
        (
            self.header_y.unwrap_or(0.0),
            self.footer_y.unwrap_or(image_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_band_defaults_to_full_page() {
        let mut page = Page::new("scan_001.png", "Seite 1", 300.0);
        assert_eq!(page.content_band(3508.0), (0.0, 3508.0));

        page.header_y = Some(120.0);
        page.footer_y = Some(3300.0);
        assert_eq!(page.content_band(3508.0), (120.0, 3300.0));
    }
}
