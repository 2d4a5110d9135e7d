use std::sync::Arc;

use derive_builder::Builder;
use tracing::{info, warn};
use uuid::Uuid;

use crate::consts::{CONFIDENCE_THRESHOLD, SPLIT_SAFETY_MARGIN};
use crate::error::OcrdeskError;
use crate::ocr::engine::Dictionary;
use crate::ocr::pool::RecognitionMessage;
use crate::ocr::results::Block;
use crate::page::{Page, Region, RegionKind, RegionPatch};
use crate::text::repair_hyphens;

use super::command::{AddRegionCommand, CommandStack, ModifyRegionCommand, RemoveRegionCommand};
use super::state::Editor;

/// What reconciliation did with a recognition result.
#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The target region was deleted while recognition ran.
    DroppedStale,
    /// Result attached to the existing region.
    Attached,
    /// Region reclassified as an image; no text attached.
    Reclassified,
    /// Region replaced by one new region per accepted block.
    Split { created: Vec<Uuid> },
}

#[derive(Clone, Debug, Builder)]
pub struct ReconcilerConfig {
    /// Minimum average block confidence for accepting text.
    #[builder(default = "CONFIDENCE_THRESHOLD")]
    pub confidence_threshold: f32,
    /// Pixels of slack around block boxes when a split creates regions.
    #[builder(default = "SPLIT_SAFETY_MARGIN")]
    pub split_margin: f32,
    /// Mark low-confidence words in derived text.
    #[builder(default = "false")]
    pub diagnostics: bool,
    /// Run hyphenation repair on derived text.
    #[builder(default = "false")]
    pub remove_hyphens: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            split_margin: SPLIT_SAFETY_MARGIN,
            diagnostics: false,
            remove_hyphens: false,
        }
    }
}

/// Applies asynchronous recognition results to the page.
///
/// Runs on the control thread, one message at a time, and writes every
/// page mutation through the command stack so reconciliation is undoable
/// like any manual edit.
pub struct Reconciler {
    config: ReconcilerConfig,
    dictionary: Option<Arc<dyn Dictionary>>,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig, dictionary: Option<Arc<dyn Dictionary>>) -> Self {
        Self { config, dictionary }
    }

    /// Reconciles one recognition result with the current page state.
    ///
    /// The region named by the message may be gone; such results are
    /// dropped without error. Otherwise the policy is:
    ///
    /// - raw request: attach the first block verbatim, no gating
    /// - no blocks, or one block below the confidence threshold: the
    ///   region is not text after all, reclassify it as an image
    /// - one block at or above the threshold: attach it and derive the
    ///   region's flowing text
    /// - several blocks: the drawn region actually covered several layout
    ///   blocks; replace it with one region per accepted block, taking
    ///   over the original's reading-order position
    pub fn reconcile(
        &self,
        message: RecognitionMessage,
        page: &mut Page,
        stack: &mut CommandStack,
        editor: &mut Editor,
    ) -> Result<ReconcileOutcome, OcrdeskError> {
        let RecognitionMessage {
            region_id,
            raw,
            result,
        } = message;

        let Some(region) = page.regions.get(region_id) else {
            warn!(%region_id, "dropping recognition result for deleted region");
            return Ok(ReconcileOutcome::DroppedStale);
        };
        let origin = region.bbox.min;
        let order = region.order;
        let language = region.language.clone();

        let mut blocks = result?;
        // Engine coordinates are relative to the cropped region image
        for block in &mut blocks {
            block.translate(origin);
        }

        if raw {
            return match blocks.into_iter().next() {
                Some(block) => {
                    self.attach(region_id, block, &language, false, page, stack)?;
                    Ok(ReconcileOutcome::Attached)
                }
                None => {
                    self.reclassify(region_id, page, stack)?;
                    Ok(ReconcileOutcome::Reclassified)
                }
            };
        }

        match blocks.len() {
            0 => {
                self.reclassify(region_id, page, stack)?;
                Ok(ReconcileOutcome::Reclassified)
            }
            1 => {
                let block = blocks.remove(0);
                if block.confidence >= self.config.confidence_threshold {
                    self.attach(region_id, block, &language, true, page, stack)?;
                    Ok(ReconcileOutcome::Attached)
                } else {
                    info!(
                        %region_id,
                        confidence = block.confidence,
                        "confidence below threshold, reclassifying as image"
                    );
                    self.reclassify(region_id, page, stack)?;
                    Ok(ReconcileOutcome::Reclassified)
                }
            }
            _ => self.split(region_id, order, blocks, &language, page, stack, editor),
        }
    }

    fn attach(
        &self,
        region_id: Uuid,
        block: Block,
        language: &str,
        cleanup: bool,
        page: &mut Page,
        stack: &mut CommandStack,
    ) -> Result<(), OcrdeskError> {
        let text = self.flowing_text(&block, language, cleanup);
        let patch = RegionPatch {
            recognized: Some(true),
            text: Some(text),
            block: Some(Some(block)),
            ..Default::default()
        };
        stack.push(Box::new(ModifyRegionCommand::new(region_id, patch)), page)
    }

    fn reclassify(
        &self,
        region_id: Uuid,
        page: &mut Page,
        stack: &mut CommandStack,
    ) -> Result<(), OcrdeskError> {
        let patch = RegionPatch {
            kind: Some(RegionKind::Image),
            ..Default::default()
        };
        stack.push(Box::new(ModifyRegionCommand::new(region_id, patch)), page)
    }

    #[allow(clippy::too_many_arguments)]
    fn split(
        &self,
        region_id: Uuid,
        order: usize,
        blocks: Vec<Block>,
        language: &str,
        page: &mut Page,
        stack: &mut CommandStack,
        editor: &mut Editor,
    ) -> Result<ReconcileOutcome, OcrdeskError> {
        let original_bbox = page
            .regions
            .get(region_id)
            .ok_or(OcrdeskError::RegionNotFound { id: region_id })?
            .bbox;

        let accepted: Vec<Block> = blocks
            .into_iter()
            .filter(|block| block.confidence >= self.config.confidence_threshold)
            .collect();

        stack.push(Box::new(RemoveRegionCommand::new(region_id)), page)?;

        // Nothing survived the threshold: the area still holds content,
        // keep it as a single image region instead of leaving a hole.
        if accepted.is_empty() {
            let region = Region::new(original_bbox, RegionKind::Image, language);
            let command = AddRegionCommand::new(region, Some(order));
            let created = vec![command.region_id()];
            stack.push(Box::new(command), page)?;
            return Ok(ReconcileOutcome::Split { created });
        }

        let mut created = Vec::with_capacity(accepted.len());
        for (offset, block) in accepted.into_iter().enumerate() {
            let bbox = block.bbox.expanded(self.config.split_margin);
            let mut region = Region::new(bbox, RegionKind::Text, language);
            region.recognized = true;
            region.text = self.flowing_text(&block, language, true);
            region.block = Some(block);

            let command = AddRegionCommand::new(region, Some(order + offset));
            created.push(command.region_id());
            stack.push(Box::new(command), page)?;
        }

        info!(%region_id, count = created.len(), "region split by recognition result");
        if let Some(&first) = created.first() {
            editor.select_only(first);
        }
        Ok(ReconcileOutcome::Split { created })
    }

    fn flowing_text(&self, block: &Block, language: &str, cleanup: bool) -> String {
        let document = block.document(cleanup && self.config.diagnostics);
        let document = if cleanup && self.config.remove_hyphens {
            match &self.dictionary {
                Some(dictionary) => repair_hyphens(&document, language, dictionary.as_ref()),
                None => document,
            }
        } else {
            document
        };
        document.to_plain_text()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::editor::state::EditorConfig;
    use crate::geometry::Bbox;
    use crate::ocr::results::{BlockType, Line, Paragraph, Word};

    fn setup() -> (Reconciler, Page, CommandStack, Editor) {
        (
            Reconciler::new(ReconcilerConfig::default(), None),
            Page::new("scan_001.png", "Seite 1", 300.0),
            CommandStack::default(),
            Editor::new(EditorConfig::default()),
        )
    }

    fn bbox(x: f32, y: f32, w: f32, h: f32) -> Bbox {
        Bbox::from_min_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    fn region(page: &mut Page, x: f32) -> Uuid {
        page.regions.insert(
            Region::new(bbox(x, 0.0, 200.0, 100.0), RegionKind::Text, "deu"),
            None,
        )
    }

    /// A block in crop-relative coordinates with a single word.
    fn block(confidence: f32, text: &str, rel: Bbox) -> Block {
        Block {
            bbox: rel,
            confidence,
            block_type: BlockType::Text,
            paragraphs: vec![Paragraph {
                bbox: rel,
                lines: vec![Line {
                    bbox: rel,
                    words: vec![Word {
                        bbox: rel,
                        text: text.into(),
                        confidence,
                        blanks_before: 0,
                        font_size: 10.0,
                    }],
                }],
            }],
            ..Default::default()
        }
    }

    fn message(region_id: Uuid, raw: bool, blocks: Vec<Block>) -> RecognitionMessage {
        RecognitionMessage {
            region_id,
            raw,
            result: Ok(blocks),
        }
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        region(&mut page, 0.0);

        let outcome = reconciler
            .reconcile(
                message(Uuid::new_v4(), false, vec![]),
                &mut page,
                &mut stack,
                &mut editor,
            )
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::DroppedStale);
        assert_eq!(page.regions.len(), 1);
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_single_confident_block_attaches() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        let id = region(&mut page, 100.0);

        let outcome = reconciler
            .reconcile(
                message(id, false, vec![block(85.0, "Hallo", bbox(10.0, 10.0, 50.0, 20.0))]),
                &mut page,
                &mut stack,
                &mut editor,
            )
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Attached);
        let attached = page.regions.get(id).unwrap();
        assert!(attached.recognized);
        assert_eq!(attached.text, "Hallo");
        // Block translated into page coordinates
        assert_eq!(
            attached.block.as_ref().unwrap().bbox.min,
            Vec2::new(110.0, 10.0)
        );

        // Attachment is a single undo step
        stack.undo(&mut page).unwrap();
        assert!(!page.regions.get(id).unwrap().recognized);
    }

    #[test]
    fn test_low_confidence_reclassifies_as_image() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        let id = region(&mut page, 0.0);

        let outcome = reconciler
            .reconcile(
                message(id, false, vec![block(12.0, "???", bbox(0.0, 0.0, 50.0, 20.0))]),
                &mut page,
                &mut stack,
                &mut editor,
            )
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Reclassified);
        let reclassified = page.regions.get(id).unwrap();
        assert_eq!(reclassified.kind, RegionKind::Image);
        assert!(reclassified.text.is_empty());
        assert!(reclassified.block.is_none());
    }

    #[test]
    fn test_empty_result_reclassifies_as_image() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        let id = region(&mut page, 0.0);

        let outcome = reconciler
            .reconcile(message(id, false, vec![]), &mut page, &mut stack, &mut editor)
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Reclassified);
        assert_eq!(page.regions.get(id).unwrap().kind, RegionKind::Image);
    }

    #[test]
    fn test_raw_attaches_without_confidence_gate() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        let id = region(&mut page, 0.0);

        let outcome = reconciler
            .reconcile(
                message(id, true, vec![block(5.0, "0xDEADBEEF", bbox(0.0, 0.0, 50.0, 20.0))]),
                &mut page,
                &mut stack,
                &mut editor,
            )
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Attached);
        let attached = page.regions.get(id).unwrap();
        assert!(attached.recognized);
        assert_eq!(attached.kind, RegionKind::Text);
        assert_eq!(attached.text, "0xDEADBEEF");
    }

    #[test]
    fn test_multi_block_split_renumbers_following_regions() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        let first = region(&mut page, 0.0);
        let target = region(&mut page, 300.0);
        let last = region(&mut page, 600.0);

        let blocks = vec![
            block(40.0, "oben", bbox(10.0, 10.0, 100.0, 20.0)),
            block(20.0, "Rauschen", bbox(10.0, 40.0, 100.0, 20.0)),
            block(60.0, "unten", bbox(10.0, 70.0, 100.0, 20.0)),
        ];

        let outcome = reconciler
            .reconcile(message(target, false, blocks), &mut page, &mut stack, &mut editor)
            .unwrap();

        let ReconcileOutcome::Split { created } = outcome else {
            panic!("expected split");
        };
        assert_eq!(created.len(), 2);
        assert!(page.regions.get(target).is_none());

        assert_eq!(page.regions.get(first).unwrap().order, 0);
        assert_eq!(page.regions.get(created[0]).unwrap().order, 1);
        assert_eq!(page.regions.get(created[1]).unwrap().order, 2);
        assert_eq!(page.regions.get(last).unwrap().order, 3);

        // New regions sit at the translated block bbox plus the margin
        let top = page.regions.get(created[0]).unwrap();
        assert_eq!(top.bbox.min, Vec2::new(305.0, 5.0));
        assert_eq!(top.text, "oben");
        assert!(top.recognized);

        assert_eq!(editor.selection(), &[created[0]]);

        // Undo unwinds the adds and the remove, restoring the original
        while stack.undo(&mut page).unwrap() {}
        assert!(page.regions.get(target).is_some());
        assert_eq!(page.regions.get(target).unwrap().order, 1);
        assert_eq!(page.regions.len(), 3);
    }

    #[test]
    fn test_split_with_no_survivors_leaves_image_region() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        let target = region(&mut page, 100.0);
        let original_bbox = page.regions.get(target).unwrap().bbox;

        let blocks = vec![
            block(10.0, "a", bbox(0.0, 0.0, 50.0, 20.0)),
            block(15.0, "b", bbox(0.0, 30.0, 50.0, 20.0)),
        ];

        let outcome = reconciler
            .reconcile(message(target, false, blocks), &mut page, &mut stack, &mut editor)
            .unwrap();

        let ReconcileOutcome::Split { created } = outcome else {
            panic!("expected split");
        };
        assert_eq!(created.len(), 1);
        let replacement = page.regions.get(created[0]).unwrap();
        assert_eq!(replacement.kind, RegionKind::Image);
        assert_eq!(replacement.bbox, original_bbox);
        assert_eq!(replacement.order, 0);
    }

    #[test]
    fn test_hyphen_repair_applied_to_derived_text() {
        struct AllWords;
        impl Dictionary for AllWords {
            fn supports(&self, _language: &str) -> bool {
                true
            }
            fn check(&self, _word: &str, _language: &str) -> bool {
                true
            }
        }

        let config = ReconcilerConfigBuilder::default()
            .remove_hyphens(true)
            .build()
            .unwrap();
        let reconciler = Reconciler::new(config, Some(Arc::new(AllWords)));

        let mut page = Page::new("scan_001.png", "Seite 1", 300.0);
        let mut stack = CommandStack::default();
        let mut editor = Editor::new(EditorConfig::default());
        let id = region(&mut page, 0.0);

        let rel = bbox(0.0, 0.0, 100.0, 40.0);
        let mut split_word = block(90.0, "Zei-", rel);
        split_word.paragraphs[0].lines.push(Line {
            bbox: bbox(0.0, 20.0, 100.0, 20.0),
            words: vec![Word {
                bbox: bbox(0.0, 20.0, 30.0, 20.0),
                text: "le".into(),
                confidence: 90.0,
                blanks_before: 0,
                font_size: 10.0,
            }],
        });

        reconciler
            .reconcile(
                message(id, false, vec![split_word]),
                &mut page,
                &mut stack,
                &mut editor,
            )
            .unwrap();

        assert_eq!(page.regions.get(id).unwrap().text, "Zeile");
    }

    #[test]
    fn test_engine_error_propagates() {
        let (reconciler, mut page, mut stack, mut editor) = setup();
        let id = region(&mut page, 0.0);

        let message = RecognitionMessage {
            region_id: id,
            raw: false,
            result: Err(OcrdeskError::Engine {
                stage: "recognize".into(),
                message: "model missing".into(),
            }),
        };

        let result = reconciler.reconcile(message, &mut page, &mut stack, &mut editor);
        assert!(matches!(result, Err(OcrdeskError::Engine { .. })));
        // Region untouched
        assert!(!page.regions.get(id).unwrap().recognized);
    }
}
