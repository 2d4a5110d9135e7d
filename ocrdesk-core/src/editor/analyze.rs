use image::DynamicImage;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::OcrdeskError;
use crate::ocr::pool::RecognitionPool;
use crate::ocr::results::{Block, BlockType};
use crate::page::{Orientation, Page, Region, RegionKind, Separator};

use super::command::{Command, CommandStack};

/// Runs page segmentation and commits the result as one undo step.
///
/// The segmentation itself happens on the blocking pool; only the commit
/// touches the page. The band between the page's header and footer
/// boundaries is analyzed, the rest of the page is ignored.
pub async fn analyse_page(
    pool: &RecognitionPool,
    image: DynamicImage,
    page: &mut Page,
    stack: &mut CommandStack,
    language: &str,
) -> Result<(), OcrdeskError> {
    let (top, bottom) = page.content_band(image.height() as f32);
    let blocks = pool.analyze_layout(image, top, bottom).await?;
    info!(count = blocks.len(), "layout analysis finished");

    stack.push(Box::new(AnalyseLayoutCommand::new(blocks, language)), page)
}

/// Seeds the page with regions and separators from a segmentation run,
/// as one atomic undo step.
///
/// `HLine`/`VLine` blocks become separators, `Unknown` blocks are
/// skipped, the rest become regions appended in discovery order. A
/// seeded region fully contained in a strictly larger region is dropped
/// again as a duplicate nested detection.
#[derive(Debug)]
pub struct AnalyseLayoutCommand {
    blocks: Vec<Block>,
    language: String,
    created: Vec<Uuid>,
    separators_added: usize,
}

impl AnalyseLayoutCommand {
    pub fn new(blocks: Vec<Block>, language: impl Into<String>) -> Self {
        Self {
            blocks,
            language: language.into(),
            created: Vec::new(),
            separators_added: 0,
        }
    }
}

impl Command for AnalyseLayoutCommand {
    fn name(&self) -> &'static str {
        "analyse layout"
    }

    fn execute(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        self.created.clear();
        self.separators_added = 0;

        for block in &self.blocks {
            let kind = match block.block_type {
                BlockType::Text => RegionKind::Text,
                BlockType::Image => RegionKind::Image,
                BlockType::HLine | BlockType::VLine => {
                    let orientation = if block.block_type == BlockType::HLine {
                        Orientation::Horizontal
                    } else {
                        Orientation::Vertical
                    };
                    page.separators.push(Separator {
                        bbox: block.bbox,
                        orientation,
                    });
                    self.separators_added += 1;
                    continue;
                }
                BlockType::Unknown => continue,
            };

            let mut region = Region::new(block.bbox, kind, self.language.clone());
            region.tag = block.tag.clone();
            region.class = block.class.clone();
            region.block = Some(block.clone());
            self.created.push(page.regions.insert(region, None));
        }

        let duplicates: Vec<Uuid> = page
            .regions
            .iter()
            .filter(|region| self.created.contains(&region.id))
            .filter(|region| {
                page.regions.iter().any(|other| {
                    other.id != region.id
                        && other.bbox.contains(&region.bbox)
                        && other.bbox.area() > region.bbox.area()
                })
            })
            .map(|region| region.id)
            .collect();
        for id in duplicates {
            debug!(%id, "dropping nested duplicate detection");
            page.regions.remove(id);
            self.created.retain(|created| *created != id);
        }

        Ok(())
    }

    fn undo(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        for id in std::mem::take(&mut self.created) {
            page.regions
                .remove(id)
                .ok_or(OcrdeskError::RegionNotFound { id })?;
        }
        for _ in 0..self.separators_added {
            page.separators.pop();
        }
        self.separators_added = 0;
        Ok(())
    }
}
