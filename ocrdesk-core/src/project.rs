use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use snafu::ResultExt;
use tracing::info;

use crate::consts::FORMAT_REVISION;
use crate::error::{DecodeSnafu, IoSnafu, OcrdeskError, RevisionSnafu, TruncatedSnafu};
use crate::geometry::Bbox;
use crate::ocr::results::{Block, BlockType, Line, Paragraph, Word};
use crate::page::{Orientation, Page, Region, RegionKind, Separator};

/// A digitization project: document metadata plus its pages.
///
/// Persists to an order-sensitive binary format headed by
/// [`FORMAT_REVISION`]. A revision mismatch fails the load outright;
/// there is no migration of foreign revisions.
#[derive(Clone, Debug, Default)]
pub struct Project {
    pub name: String,
    pub default_language: String,
    pub default_paper_size: String,
    pub current_page: usize,
    pub pages: Vec<Page>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_language: "deu".into(),
            default_paper_size: "A4".into(),
            current_page: 0,
            pages: Vec::new(),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_i16(FORMAT_REVISION);
        put_string(&mut buf, &self.name);
        put_string(&mut buf, &self.default_language);
        put_string(&mut buf, &self.default_paper_size);
        buf.put_i16(self.current_page as i16);
        buf.put_i16(self.pages.len() as i16);
        for page in &self.pages {
            put_page(&mut buf, page);
        }
        buf.freeze()
    }

    pub fn decode(mut data: &[u8]) -> Result<Self, OcrdeskError> {
        let buf = &mut data;

        ensure_remaining(buf, 2, "revision")?;
        let found = buf.get_i16();
        if found != FORMAT_REVISION {
            return RevisionSnafu {
                found,
                expected: FORMAT_REVISION,
            }
            .fail();
        }

        let name = get_string(buf, "project name")?;
        let default_language = get_string(buf, "default language")?;
        let default_paper_size = get_string(buf, "default paper size")?;
        ensure_remaining(buf, 4, "page counts")?;
        let current_page = buf.get_i16().max(0) as usize;
        let page_count = buf.get_i16().max(0) as usize;

        let mut pages = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            pages.push(get_page(buf)?);
        }
        // A stale index must not point past the last page
        let current_page = current_page.min(pages.len().saturating_sub(1));

        Ok(Self {
            name,
            default_language,
            default_paper_size,
            current_page,
            pages,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), OcrdeskError> {
        std::fs::write(path, self.encode()).context(IoSnafu {
            path: path.display().to_string(),
        })?;
        info!(path = %path.display(), pages = self.pages.len(), "project saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, OcrdeskError> {
        let data = std::fs::read(path).context(IoSnafu {
            path: path.display().to_string(),
        })?;
        let project = Self::decode(&data)?;
        info!(path = %path.display(), pages = project.pages.len(), "project loaded");
        Ok(project)
    }
}

fn put_string(buf: &mut BytesMut, value: &str) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value.as_bytes());
}

fn get_string(buf: &mut &[u8], stage: &str) -> Result<String, OcrdeskError> {
    ensure_remaining(buf, 4, stage)?;
    let len = buf.get_u32() as usize;
    ensure_remaining(buf, len, stage)?;
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).ok().ok_or_else(|| {
        DecodeSnafu {
            stage,
            message: "invalid UTF-8",
        }
        .build()
    })
}

fn ensure_remaining(buf: &&[u8], needed: usize, stage: &str) -> Result<(), OcrdeskError> {
    if buf.remaining() < needed {
        return TruncatedSnafu { stage }.fail();
    }
    Ok(())
}

fn put_bbox(buf: &mut BytesMut, bbox: &Bbox) {
    buf.put_f32(bbox.min.x);
    buf.put_f32(bbox.min.y);
    buf.put_f32(bbox.max.x);
    buf.put_f32(bbox.max.y);
}

fn get_bbox(buf: &mut &[u8], stage: &str) -> Result<Bbox, OcrdeskError> {
    ensure_remaining(buf, 16, stage)?;
    let min = glam::Vec2::new(buf.get_f32(), buf.get_f32());
    let max = glam::Vec2::new(buf.get_f32(), buf.get_f32());
    Ok(Bbox::new(min, max))
}

fn put_page(buf: &mut BytesMut, page: &Page) {
    put_string(buf, &page.image_path);
    put_string(buf, &page.name);
    put_string(buf, &page.paper_size);
    buf.put_f32(page.dpi);
    // Unset boundaries are stored as a negative coordinate
    buf.put_f32(page.header_y.unwrap_or(-1.0));
    buf.put_f32(page.footer_y.unwrap_or(-1.0));
    buf.put_u16(page.split_xs.len() as u16);
    for x in &page.split_xs {
        buf.put_f32(*x);
    }
    let regions = page.regions.ordered();
    buf.put_i16(regions.len() as i16);
    for region in regions {
        put_region(buf, region);
    }
    buf.put_i16(page.separators.len() as i16);
    for separator in &page.separators {
        put_bbox(buf, &separator.bbox);
        buf.put_i16(separator.orientation.idx());
    }
}

fn get_page(buf: &mut &[u8]) -> Result<Page, OcrdeskError> {
    let image_path = get_string(buf, "page image path")?;
    let name = get_string(buf, "page name")?;
    let paper_size = get_string(buf, "page paper size")?;
    ensure_remaining(buf, 14, "page header")?;
    let dpi = buf.get_f32();
    let header_y = Some(buf.get_f32()).filter(|y| *y >= 0.0);
    let footer_y = Some(buf.get_f32()).filter(|y| *y >= 0.0);
    let split_count = buf.get_u16() as usize;
    ensure_remaining(buf, split_count * 4, "page split lines")?;
    let mut split_xs = Vec::with_capacity(split_count);
    for _ in 0..split_count {
        split_xs.push(buf.get_f32());
    }
    ensure_remaining(buf, 2, "region count")?;
    let region_count = buf.get_i16().max(0) as usize;

    let mut page = Page {
        image_path,
        name,
        paper_size,
        dpi,
        header_y,
        footer_y,
        split_xs,
        ..Default::default()
    };
    // Records are written in reading order, so appending reproduces it
    for _ in 0..region_count {
        let region = get_region(buf)?;
        page.regions.insert(region, None);
    }

    ensure_remaining(buf, 2, "separator count")?;
    let separator_count = buf.get_i16().max(0) as usize;
    for _ in 0..separator_count {
        let bbox = get_bbox(buf, "separator bbox")?;
        ensure_remaining(buf, 2, "separator orientation")?;
        let orientation = Orientation::from_idx(buf.get_i16());
        page.separators.push(Separator { bbox, orientation });
    }
    Ok(page)
}

fn put_region(buf: &mut BytesMut, region: &Region) {
    buf.put_i16(region.order as i16);
    put_bbox(buf, &region.bbox);
    buf.put_i16(region.kind.idx());
    put_string(buf, &region.text);
    put_string(buf, &region.language);
    buf.put_u8(region.recognized as u8);
    put_string(buf, &region.tag);
    put_string(buf, &region.class);
    buf.put_u8(region.export_enabled as u8);
    match &region.block {
        Some(block) => {
            buf.put_u8(1);
            put_block(buf, block);
        }
        None => buf.put_u8(0),
    }
}

fn get_region(buf: &mut &[u8]) -> Result<Region, OcrdeskError> {
    ensure_remaining(buf, 2, "region order")?;
    let _order = buf.get_i16();
    let bbox = get_bbox(buf, "region bbox")?;
    ensure_remaining(buf, 2, "region kind")?;
    let kind = RegionKind::from_idx(buf.get_i16());

    // Ids are session identity, not persisted; a fresh one is assigned
    let mut region = Region::new(bbox, kind, String::new());
    region.text = get_string(buf, "region text")?;
    region.language = get_string(buf, "region language")?;
    ensure_remaining(buf, 1, "region recognized")?;
    region.recognized = buf.get_u8() != 0;
    region.tag = get_string(buf, "region tag")?;
    region.class = get_string(buf, "region class")?;
    ensure_remaining(buf, 2, "region flags")?;
    region.export_enabled = buf.get_u8() != 0;
    if buf.get_u8() != 0 {
        region.block = Some(get_block(buf)?);
    }
    Ok(region)
}

fn put_block(buf: &mut BytesMut, block: &Block) {
    put_bbox(buf, &block.bbox);
    buf.put_f32(block.confidence);
    buf.put_i16(block.block_type.idx());
    put_string(buf, &block.tag);
    put_string(buf, &block.class);
    buf.put_u32(block.paragraphs.len() as u32);
    for paragraph in &block.paragraphs {
        put_bbox(buf, &paragraph.bbox);
        buf.put_u32(paragraph.lines.len() as u32);
        for line in &paragraph.lines {
            put_bbox(buf, &line.bbox);
            buf.put_u32(line.words.len() as u32);
            for word in &line.words {
                put_bbox(buf, &word.bbox);
                put_string(buf, &word.text);
                buf.put_f32(word.confidence);
                buf.put_u32(word.blanks_before);
                buf.put_f32(word.font_size);
            }
        }
    }
}

fn get_block(buf: &mut &[u8]) -> Result<Block, OcrdeskError> {
    let bbox = get_bbox(buf, "block bbox")?;
    ensure_remaining(buf, 6, "block header")?;
    let confidence = buf.get_f32();
    let block_type = BlockType::from_idx(buf.get_i16());
    let tag = get_string(buf, "block tag")?;
    let class = get_string(buf, "block class")?;

    ensure_remaining(buf, 4, "paragraph count")?;
    let paragraph_count = buf.get_u32() as usize;
    let mut paragraphs = Vec::with_capacity(paragraph_count.min(1024));
    for _ in 0..paragraph_count {
        let bbox = get_bbox(buf, "paragraph bbox")?;
        ensure_remaining(buf, 4, "line count")?;
        let line_count = buf.get_u32() as usize;
        let mut lines = Vec::with_capacity(line_count.min(1024));
        for _ in 0..line_count {
            let bbox = get_bbox(buf, "line bbox")?;
            ensure_remaining(buf, 4, "word count")?;
            let word_count = buf.get_u32() as usize;
            let mut words = Vec::with_capacity(word_count.min(1024));
            for _ in 0..word_count {
                let bbox = get_bbox(buf, "word bbox")?;
                let text = get_string(buf, "word text")?;
                ensure_remaining(buf, 12, "word metrics")?;
                words.push(Word {
                    bbox,
                    text,
                    confidence: buf.get_f32(),
                    blanks_before: buf.get_u32(),
                    font_size: buf.get_f32(),
                });
            }
            lines.push(Line { bbox, words });
        }
        paragraphs.push(Paragraph { bbox, lines });
    }

    Ok(Block {
        bbox,
        confidence,
        block_type,
        tag,
        class,
        paragraphs,
    })
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn bbox(x: f32, y: f32, w: f32, h: f32) -> Bbox {
        Bbox::from_min_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    fn sample_project() -> Project {
        let mut project = Project::new("Amiga Magazin 1989-04");
        let mut page = Page::new("scan_001.png", "Seite 1", 300.0);
        page.paper_size = "A4".into();
        page.header_y = Some(120.0);
        page.split_xs.push(210.0);

        let mut region = Region::new(bbox(10.0, 130.0, 400.0, 200.0), RegionKind::Text, "deu");
        region.recognized = true;
        region.text = "Hallo Welt".into();
        region.tag = "h1".into();
        region.class = "heading".into();
        region.block = Some(Block {
            bbox: bbox(10.0, 130.0, 400.0, 200.0),
            confidence: 87.5,
            block_type: BlockType::Text,
            tag: "h1".into(),
            class: "heading".into(),
            paragraphs: vec![Paragraph {
                bbox: bbox(10.0, 130.0, 400.0, 20.0),
                lines: vec![Line {
                    bbox: bbox(10.0, 130.0, 400.0, 20.0),
                    words: vec![
                        Word {
                            bbox: bbox(10.0, 130.0, 60.0, 20.0),
                            text: "Hallo".into(),
                            confidence: 90.0,
                            blanks_before: 0,
                            font_size: 11.0,
                        },
                        Word {
                            bbox: bbox(80.0, 130.0, 60.0, 20.0),
                            text: "Welt".into(),
                            confidence: 85.0,
                            blanks_before: 1,
                            font_size: 11.0,
                        },
                    ],
                }],
            }],
        });
        page.regions.insert(region, None);

        let image = Region::new(bbox(10.0, 400.0, 200.0, 150.0), RegionKind::Image, "deu");
        page.regions.insert(image, None);
        page.separators.push(Separator {
            bbox: bbox(10.0, 380.0, 400.0, 2.0),
            orientation: Orientation::Horizontal,
        });

        project.pages.push(page);
        project.pages.push(Page::new("scan_002.png", "Seite 2", 300.0));
        project.current_page = 1;
        project
    }

    #[test]
    fn test_round_trip() {
        let project = sample_project();
        let decoded = Project::decode(&project.encode()).unwrap();

        assert_eq!(decoded.name, project.name);
        assert_eq!(decoded.default_language, "deu");
        assert_eq!(decoded.current_page, 1);
        assert_eq!(decoded.pages.len(), 2);

        let page = &decoded.pages[0];
        assert_eq!(page.image_path, "scan_001.png");
        assert_eq!(page.header_y, Some(120.0));
        assert_eq!(page.footer_y, None);
        assert_eq!(page.split_xs, vec![210.0]);
        assert_eq!(page.regions.len(), 2);

        let region = page.regions.by_order(0).unwrap();
        assert!(region.recognized);
        assert_eq!(region.text, "Hallo Welt");
        assert_eq!(region.kind, RegionKind::Text);
        assert_eq!(region.tag, "h1");

        let block = region.block.as_ref().unwrap();
        assert_eq!(block.confidence, 87.5);
        let words = &block.paragraphs[0].lines[0].words;
        assert_eq!(words[1].text, "Welt");
        assert_eq!(words[1].blanks_before, 1);

        assert_eq!(page.regions.by_order(1).unwrap().kind, RegionKind::Image);

        assert_eq!(page.separators.len(), 1);
        assert_eq!(page.separators[0].orientation, Orientation::Horizontal);
    }

    #[test]
    fn test_reading_order_survives_round_trip() {
        let mut project = Project::new("order");
        let mut page = Page::new("p.png", "p", 300.0);
        let a = page
            .regions
            .insert(Region::new(bbox(0.0, 0.0, 50.0, 50.0), RegionKind::Text, "deu"), None);
        let b = page
            .regions
            .insert(Region::new(bbox(100.0, 0.0, 50.0, 50.0), RegionKind::Text, "deu"), None);
        page.regions.swap_orders(a, b).unwrap();
        project.pages.push(page);

        let decoded = Project::decode(&project.encode()).unwrap();
        let ordered = decoded.pages[0].regions.ordered();
        // The region drawn second now leads the reading order
        assert_eq!(ordered[0].bbox.min.x, 100.0);
        assert_eq!(ordered[1].bbox.min.x, 0.0);
    }

    #[test]
    fn test_out_of_range_current_page_is_clamped() {
        let mut project = sample_project();
        project.current_page = 9;

        let decoded = Project::decode(&project.encode()).unwrap();
        assert_eq!(decoded.current_page, decoded.pages.len() - 1);

        let empty = Project::decode(&Project::new("leer").encode()).unwrap();
        assert_eq!(empty.current_page, 0);
    }

    #[test]
    fn test_revision_mismatch_is_fatal() {
        let mut data = BytesMut::new();
        data.put_i16(FORMAT_REVISION - 1);
        put_string(&mut data, "old project");

        let result = Project::decode(&data);
        assert!(matches!(
            result,
            Err(OcrdeskError::Revision { found, expected })
                if found == FORMAT_REVISION - 1 && expected == FORMAT_REVISION
        ));
    }

    #[test]
    fn test_truncated_data() {
        let encoded = sample_project().encode();
        let result = Project::decode(&encoded[..encoded.len() / 2]);
        assert!(matches!(
            result,
            Err(OcrdeskError::Truncated { .. }) | Err(OcrdeskError::Decode { .. })
        ));

        assert!(matches!(
            Project::decode(&[]),
            Err(OcrdeskError::Truncated { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("magazin.odp");

        let project = sample_project();
        project.save(&path).unwrap();
        let loaded = Project::load(&path).unwrap();

        assert_eq!(loaded.name, project.name);
        assert_eq!(loaded.pages.len(), project.pages.len());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Project::load(Path::new("/nonexistent/magazin.odp"));
        assert!(matches!(result, Err(OcrdeskError::Io { .. })));
    }
}
