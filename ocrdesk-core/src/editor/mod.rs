pub mod analyze;
pub mod command;
pub mod reconcile;
pub mod state;

pub use analyze::{AnalyseLayoutCommand, analyse_page};
pub use command::{
    AddRegionCommand, Command, CommandStack, ModifyRegionCommand, RemoveRegionCommand,
    SwapOrderCommand,
};
pub use reconcile::{ReconcileOutcome, Reconciler, ReconcilerConfig, ReconcilerConfigBuilder};
pub use state::{
    CursorShape, Editor, EditorConfig, EditorConfigBuilder, EditorInput, EditorRequest,
    EditorState, KeyCommand,
};
