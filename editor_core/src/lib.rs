//! LAEFEX editor core - Python editing logic without any UI.
//!
//! An [`EditorSession`] owns one buffer and keeps its derived views
//! (highlighting, diagnostics, bracket match, completion, symbols, folds)
//! in step with every edit. A [`Workspace`] holds the open sessions as
//! tabs along with the run output pane and the active stylesheet.

pub mod brackets;
pub mod buffer;
pub mod completion;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fold;
pub mod history;
pub mod indent;
pub mod notice;
pub mod render;
pub mod runner;
pub mod search;
pub mod session;
pub mod stylesheet;
pub mod syntax;
pub mod workspace;

pub use brackets::{match_bracket, BracketPair};
pub use buffer::{LineChange, TextBuffer};
pub use completion::{CompletionChain, CompletionProvider, CompletionRequest, CompletionState};
pub use config::EditorConfig;
pub use cursor::{Cursor, Position, Selection};
pub use error::{
    AnalysisError, ConfigError, RunError, SessionError, ThemeError, WorkspaceError,
};
pub use fold::{FoldManager, FoldRegion};
pub use history::{EditOperation, History};
pub use notice::{Notice, NoticeKind};
pub use render::{GutterLine, MinimapRow};
pub use runner::{CodeRunner, OutputPane, RunOutput};
pub use search::{Search, SearchMatch};
pub use session::{EditorSession, SessionState};
pub use stylesheet::ThemeManager;
pub use syntax::{ErrorSpan, Language, StyledSpan, SymbolTable, Theme, TokenStyle};
pub use workspace::{TabId, TabInfo, Workspace};
