use derive_builder::Builder;
use glam::Vec2;
use tracing::debug;
use uuid::Uuid;

use crate::consts::MIN_REGION_SIZE;
use crate::error::OcrdeskError;
use crate::geometry::Bbox;
use crate::page::{Page, Region, RegionKind, RegionPatch};

use super::command::{
    AddRegionCommand, CommandStack, ModifyRegionCommand, RemoveRegionCommand, SwapOrderCommand,
};

/// Editing mode of the page view.
///
/// `Select` is the home state; every other mode is entered from it and
/// left via Escape or by completing its gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditorState {
    Select,
    /// Rubber-band drawing of a new region. `origin` is the anchor corner
    /// of the drag in progress, if any.
    Draw { origin: Option<Vec2> },
    Hand,
    PlaceHeader,
    PlaceFooter,
    PlaceSplitLine,
    /// Reading-order swap. `anchor` is the first clicked region.
    Renumber { anchor: Option<Uuid> },
}

/// Pointer shape the view should show for the current mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorShape {
    Arrow,
    Cross,
    OpenHand,
    SplitVertical,
    SplitHorizontal,
    PointingHand,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditorInput {
    PointerDown { pos: Vec2 },
    PointerMove { pos: Vec2 },
    PointerUp { pos: Vec2 },
    Key(KeyCommand),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyCommand {
    EnterDraw,
    EnterHand,
    EnterPlaceHeader,
    EnterPlaceFooter,
    EnterPlaceSplitLine,
    EnterRenumber,
    Escape,
    Delete,
    SetKindText,
    SetKindImage,
    ToggleExport,
    SelectAll,
    CycleSelection { forward: bool },
    Recognize { raw: bool },
    Undo,
    Redo,
}

/// Work the editor wants done outside its own synchronous scope.
///
/// Recognition is asynchronous; the caller crops the region image and
/// dispatches through the recognition pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorRequest {
    Recognize { region_id: Uuid, raw: bool },
}

#[derive(Clone, Debug, Builder)]
#[builder(setter(into))]
pub struct EditorConfig {
    /// Drawn rectangles below this size in either dimension are discarded.
    #[builder(default = "MIN_REGION_SIZE")]
    pub min_region_size: f32,
    /// Kind assigned to newly drawn regions.
    #[builder(default)]
    pub default_kind: RegionKind,
    /// Recognition language assigned to newly drawn regions.
    #[builder(default = "String::from(\"deu\")")]
    pub default_language: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfigBuilder::default()
            .build()
            .unwrap_or_else(|_| Self {
                min_region_size: MIN_REGION_SIZE,
                default_kind: RegionKind::Text,
                default_language: "deu".into(),
            })
    }
}

/// The interactive region editor: a state machine over pointer and key
/// input that turns gestures into commands on the undo stack.
///
/// Guide placement (header, footer, column splits) mutates the page
/// directly; guides are cheap to re-place and deliberately not part of
/// the undo history.
#[derive(Debug, Default)]
pub struct Editor {
    config: EditorConfig,
    state: EditorState,
    selection: Vec<Uuid>,
    /// Live rubber-band rectangle while a draw drag is in progress.
    drag_rect: Option<Bbox>,
    /// Live guide coordinate while placing a header/footer/split line.
    guide: Option<f32>,
}

impl Default for EditorState {
    fn default() -> Self {
        EditorState::Select
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            state: EditorState::Select,
            selection: Vec::new(),
            drag_rect: None,
            guide: None,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn selection(&self) -> &[Uuid] {
        &self.selection
    }

    pub fn drag_rect(&self) -> Option<Bbox> {
        self.drag_rect
    }

    pub fn guide(&self) -> Option<f32> {
        self.guide
    }

    pub fn cursor(&self) -> CursorShape {
        match self.state {
            EditorState::Select => CursorShape::Arrow,
            EditorState::Draw { .. } => CursorShape::Cross,
            EditorState::Hand => CursorShape::OpenHand,
            EditorState::PlaceHeader | EditorState::PlaceFooter => CursorShape::SplitVertical,
            EditorState::PlaceSplitLine => CursorShape::SplitHorizontal,
            EditorState::Renumber { .. } => CursorShape::PointingHand,
        }
    }

    /// While drawing, regions must not swallow pointer events meant for
    /// the rubber band.
    pub fn regions_selectable(&self) -> bool {
        !matches!(self.state, EditorState::Draw { .. })
    }

    pub fn select_only(&mut self, id: Uuid) {
        self.selection.clear();
        self.selection.push(id);
    }

    /// Feeds one input event through the state machine.
    ///
    /// Page mutations go through `stack`; asynchronous work the editor
    /// cannot do itself is returned as requests.
    pub fn handle(
        &mut self,
        input: EditorInput,
        page: &mut Page,
        stack: &mut CommandStack,
    ) -> Result<Vec<EditorRequest>, OcrdeskError> {
        match input {
            EditorInput::Key(key) => self.handle_key(key, page, stack),
            EditorInput::PointerDown { pos } => self.pointer_down(pos, page, stack),
            EditorInput::PointerMove { pos } => {
                self.pointer_move(pos);
                Ok(Vec::new())
            }
            EditorInput::PointerUp { pos } => self.pointer_up(pos, page, stack),
        }
    }

    fn handle_key(
        &mut self,
        key: KeyCommand,
        page: &mut Page,
        stack: &mut CommandStack,
    ) -> Result<Vec<EditorRequest>, OcrdeskError> {
        match key {
            KeyCommand::Escape => {
                self.enter(EditorState::Select);
                return Ok(Vec::new());
            }
            KeyCommand::Undo => {
                stack.undo(page)?;
                self.prune_selection(page);
                return Ok(Vec::new());
            }
            KeyCommand::Redo => {
                stack.redo(page)?;
                self.prune_selection(page);
                return Ok(Vec::new());
            }
            _ => {}
        }

        // Mode switches and edits act from the home state only.
        if self.state != EditorState::Select {
            return Ok(Vec::new());
        }

        match key {
            KeyCommand::EnterDraw => self.enter(EditorState::Draw { origin: None }),
            KeyCommand::EnterHand => self.enter(EditorState::Hand),
            KeyCommand::EnterPlaceHeader => self.enter(EditorState::PlaceHeader),
            KeyCommand::EnterPlaceFooter => self.enter(EditorState::PlaceFooter),
            KeyCommand::EnterPlaceSplitLine => self.enter(EditorState::PlaceSplitLine),
            KeyCommand::EnterRenumber => self.enter(EditorState::Renumber { anchor: None }),
            KeyCommand::Delete => {
                self.prune_selection(page);
                for id in std::mem::take(&mut self.selection) {
                    stack.push(Box::new(RemoveRegionCommand::new(id)), page)?;
                }
            }
            KeyCommand::SetKindText => self.patch_selection(
                page,
                stack,
                RegionPatch {
                    kind: Some(RegionKind::Text),
                    ..Default::default()
                },
            )?,
            KeyCommand::SetKindImage => self.patch_selection(
                page,
                stack,
                RegionPatch {
                    kind: Some(RegionKind::Image),
                    ..Default::default()
                },
            )?,
            KeyCommand::ToggleExport => {
                self.prune_selection(page);
                for id in self.selection.clone() {
                    let enabled = page
                        .regions
                        .get(id)
                        .ok_or(OcrdeskError::RegionNotFound { id })?
                        .export_enabled;
                    let patch = RegionPatch {
                        export_enabled: Some(!enabled),
                        ..Default::default()
                    };
                    stack.push(Box::new(ModifyRegionCommand::new(id, patch)), page)?;
                }
            }
            KeyCommand::SelectAll => {
                self.selection = page.regions.ordered().iter().map(|r| r.id).collect();
            }
            KeyCommand::CycleSelection { forward } => {
                let ordered = page.regions.ordered();
                if ordered.is_empty() {
                    return Ok(Vec::new());
                }
                let len = ordered.len();
                let current = self
                    .selection
                    .first()
                    .and_then(|&id| page.regions.get(id))
                    .map(|r| r.order);
                let next = match current {
                    Some(order) if forward => (order + 1) % len,
                    Some(order) => (order + len - 1) % len,
                    None if forward => 0,
                    None => len - 1,
                };
                let id = ordered[next].id;
                self.select_only(id);
            }
            KeyCommand::Recognize { raw } => {
                self.prune_selection(page);
                return Ok(self
                    .selection
                    .iter()
                    .map(|&region_id| EditorRequest::Recognize { region_id, raw })
                    .collect());
            }
            _ => {}
        }
        Ok(Vec::new())
    }

    fn pointer_down(
        &mut self,
        pos: Vec2,
        page: &mut Page,
        stack: &mut CommandStack,
    ) -> Result<Vec<EditorRequest>, OcrdeskError> {
        match self.state {
            EditorState::Select => {
                match page.regions.region_at(pos) {
                    Some(region) => self.select_only(region.id),
                    None => self.selection.clear(),
                }
            }
            EditorState::Draw { .. } => {
                // Never start a rubber band on top of an existing region
                if page.regions.region_at(pos).is_none() {
                    self.state = EditorState::Draw { origin: Some(pos) };
                    self.drag_rect = Some(Bbox::from_corners(pos, pos));
                }
            }
            EditorState::Hand => {}
            EditorState::PlaceHeader => {
                page.header_y = Some(pos.y);
                debug!(y = pos.y, "header boundary placed");
                self.enter(EditorState::Select);
            }
            EditorState::PlaceFooter => {
                page.footer_y = Some(pos.y);
                debug!(y = pos.y, "footer boundary placed");
                self.enter(EditorState::Select);
            }
            EditorState::PlaceSplitLine => {
                page.split_xs.push(pos.x);
                debug!(x = pos.x, "column split placed");
                self.enter(EditorState::Select);
            }
            EditorState::Renumber { anchor } => match anchor {
                None => {
                    if let Some(region) = page.regions.region_at(pos) {
                        let id = region.id;
                        self.state = EditorState::Renumber { anchor: Some(id) };
                        self.select_only(id);
                    }
                }
                Some(anchor_id) => {
                    if let Some(region) = page.regions.region_at(pos) {
                        let id = region.id;
                        if id != anchor_id {
                            stack.push(Box::new(SwapOrderCommand::new(anchor_id, id)), page)?;
                            self.enter(EditorState::Select);
                        }
                    }
                }
            },
        }
        Ok(Vec::new())
    }

    fn pointer_move(&mut self, pos: Vec2) {
        match self.state {
            EditorState::Draw {
                origin: Some(origin),
            } => {
                self.drag_rect = Some(Bbox::from_corners(origin, pos));
            }
            EditorState::PlaceHeader | EditorState::PlaceFooter => {
                self.guide = Some(pos.y);
            }
            EditorState::PlaceSplitLine => {
                self.guide = Some(pos.x);
            }
            _ => {}
        }
    }

    fn pointer_up(
        &mut self,
        pos: Vec2,
        page: &mut Page,
        stack: &mut CommandStack,
    ) -> Result<Vec<EditorRequest>, OcrdeskError> {
        if let EditorState::Draw {
            origin: Some(origin),
        } = self.state
        {
            let rect = Bbox::from_corners(origin, pos);
            self.drag_rect = None;
            // Stay in draw mode for the next rectangle
            self.state = EditorState::Draw { origin: None };

            if rect.exceeds_min_size(self.config.min_region_size) {
                let region = Region::new(
                    rect,
                    self.config.default_kind,
                    self.config.default_language.clone(),
                );
                let command = AddRegionCommand::new(region, None);
                let id = command.region_id();
                stack.push(Box::new(command), page)?;
                self.select_only(id);
            } else {
                debug!(
                    width = rect.width(),
                    height = rect.height(),
                    "discarding undersized draw"
                );
            }
        }
        Ok(Vec::new())
    }

    fn enter(&mut self, state: EditorState) {
        self.state = state;
        self.drag_rect = None;
        self.guide = None;
    }

    fn patch_selection(
        &mut self,
        page: &mut Page,
        stack: &mut CommandStack,
        patch: RegionPatch,
    ) -> Result<(), OcrdeskError> {
        self.prune_selection(page);
        for id in self.selection.clone() {
            stack.push(Box::new(ModifyRegionCommand::new(id, patch.clone())), page)?;
        }
        Ok(())
    }

    /// Drops selected ids whose regions no longer exist, e.g. after an
    /// undo removed them.
    fn prune_selection(&mut self, page: &Page) {
        self.selection.retain(|&id| page.regions.get(id).is_some());
    }
}
