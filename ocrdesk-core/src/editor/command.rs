use tracing::{debug, error};
use uuid::Uuid;

use crate::error::OcrdeskError;
use crate::page::{Page, Region, RegionPatch};

/// A reversible page mutation.
///
/// Commands are executed exactly once when pushed onto the
/// [`CommandStack`] and thereafter replayed via `undo`/`execute` in strict
/// LIFO discipline. They may capture state during `execute` (snapshots,
/// created ids) for their own `undo`.
pub trait Command: std::fmt::Debug + Send {
    fn name(&self) -> &'static str;

    fn execute(&mut self, page: &mut Page) -> Result<(), OcrdeskError>;

    fn undo(&mut self, page: &mut Page) -> Result<(), OcrdeskError>;
}

/// Inserts a prepared region, optionally at an explicit reading-order
/// position.
///
/// The region template keeps its id across undo/redo cycles, so
/// references held elsewhere (selection, in-flight recognition) stay
/// valid after a redo.
#[derive(Debug)]
pub struct AddRegionCommand {
    region: Region,
    order: Option<usize>,
}

impl AddRegionCommand {
    pub fn new(region: Region, order: Option<usize>) -> Self {
        Self { region, order }
    }

    pub fn region_id(&self) -> Uuid {
        self.region.id
    }
}

impl Command for AddRegionCommand {
    fn name(&self) -> &'static str {
        "add region"
    }

    fn execute(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        page.regions.insert(self.region.clone(), self.order);
        Ok(())
    }

    fn undo(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        page.regions
            .remove(self.region.id)
            .ok_or(OcrdeskError::RegionNotFound { id: self.region.id })?;
        Ok(())
    }
}

/// Removes a region, snapshotting it in full so undo restores every
/// property including recognition state and reading order.
#[derive(Debug)]
pub struct RemoveRegionCommand {
    id: Uuid,
    snapshot: Option<Region>,
}

impl RemoveRegionCommand {
    pub fn new(id: Uuid) -> Self {
        Self { id, snapshot: None }
    }
}

impl Command for RemoveRegionCommand {
    fn name(&self) -> &'static str {
        "remove region"
    }

    fn execute(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        let removed = page
            .regions
            .remove(self.id)
            .ok_or(OcrdeskError::RegionNotFound { id: self.id })?;
        self.snapshot = Some(removed);
        Ok(())
    }

    fn undo(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        let region = self
            .snapshot
            .clone()
            .ok_or(OcrdeskError::StackCorrupted {
                command: self.name().into(),
                message: "undo before execute".into(),
            })?;
        let order = region.order;
        page.regions.insert(region, Some(order));
        Ok(())
    }
}

/// Applies a property patch to a region.
///
/// Undo restores the full pre-patch snapshot rather than inverting the
/// patch field by field; recognition results arriving between execute and
/// undo cannot leave the region in a state no patch describes.
#[derive(Debug)]
pub struct ModifyRegionCommand {
    id: Uuid,
    patch: RegionPatch,
    snapshot: Option<Region>,
}

impl ModifyRegionCommand {
    pub fn new(id: Uuid, patch: RegionPatch) -> Self {
        Self {
            id,
            patch,
            snapshot: None,
        }
    }
}

impl Command for ModifyRegionCommand {
    fn name(&self) -> &'static str {
        "modify region"
    }

    fn execute(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        let region = page
            .regions
            .get_mut(self.id)
            .ok_or(OcrdeskError::RegionNotFound { id: self.id })?;
        self.snapshot = Some(region.clone());
        self.patch.apply(region);
        Ok(())
    }

    fn undo(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        let snapshot = self
            .snapshot
            .clone()
            .ok_or(OcrdeskError::StackCorrupted {
                command: self.name().into(),
                message: "undo before execute".into(),
            })?;
        let region = page
            .regions
            .get_mut(self.id)
            .ok_or(OcrdeskError::RegionNotFound { id: self.id })?;
        *region = snapshot;
        Ok(())
    }
}

/// Swaps the reading-order positions of two regions. Self-inverse.
#[derive(Debug)]
pub struct SwapOrderCommand {
    a: Uuid,
    b: Uuid,
}

impl SwapOrderCommand {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        Self { a, b }
    }
}

impl Command for SwapOrderCommand {
    fn name(&self) -> &'static str {
        "swap reading order"
    }

    fn execute(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        page.regions.swap_orders(self.a, self.b)
    }

    fn undo(&mut self, page: &mut Page) -> Result<(), OcrdeskError> {
        page.regions.swap_orders(self.a, self.b)
    }
}

/// Linear undo history over a page.
///
/// Pushing a command executes it and discards any redoable future. A
/// failed undo or redo means the history no longer matches the page; the
/// stack is cleared rather than left half-rolled-back, and the failure is
/// reported as [`OcrdeskError::StackCorrupted`].
#[derive(Debug, Default)]
pub struct CommandStack {
    undo: Vec<Box<dyn Command>>,
    redo: Vec<Box<dyn Command>>,
}

impl CommandStack {
    /// Executes `command` and records it.
    ///
    /// On failure the command is not recorded and the history is kept:
    /// commands validate their targets before mutating, so a failed push
    /// leaves the page untouched.
    pub fn push(
        &mut self,
        mut command: Box<dyn Command>,
        page: &mut Page,
    ) -> Result<(), OcrdeskError> {
        command.execute(page)?;
        debug!(command = command.name(), "executed");
        self.redo.clear();
        self.undo.push(command);
        Ok(())
    }

    /// Rolls back the most recent command. Returns `false` on an empty
    /// history.
    pub fn undo(&mut self, page: &mut Page) -> Result<bool, OcrdeskError> {
        let Some(mut command) = self.undo.pop() else {
            return Ok(false);
        };
        match command.undo(page) {
            Ok(()) => {
                self.redo.push(command);
                Ok(true)
            }
            Err(source) => {
                error!(command = command.name(), %source, "undo failed, clearing history");
                let name = command.name();
                self.clear();
                Err(OcrdeskError::StackCorrupted {
                    command: name.into(),
                    message: source.to_string(),
                })
            }
        }
    }

    /// Re-applies the most recently undone command. Returns `false` when
    /// there is nothing to redo.
    pub fn redo(&mut self, page: &mut Page) -> Result<bool, OcrdeskError> {
        let Some(mut command) = self.redo.pop() else {
            return Ok(false);
        };
        match command.execute(page) {
            Ok(()) => {
                self.undo.push(command);
                Ok(true)
            }
            Err(source) => {
                error!(command = command.name(), %source, "redo failed, clearing history");
                let name = command.name();
                self.clear();
                Err(OcrdeskError::StackCorrupted {
                    command: name.into(),
                    message: source.to_string(),
                })
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
