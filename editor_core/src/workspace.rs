//! Tabs, each an independent editor session, plus the state they share:
//! the run output pane, the stylesheet and the configuration.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::EditorConfig;
use crate::error::{RunError, SessionError, WorkspaceError};
use crate::notice::Notice;
use crate::runner::{CodeRunner, OutputPane, RunOutput};
use crate::session::EditorSession;
use crate::stylesheet::ThemeManager;
use crate::syntax::{Language, Theme};

/// Unique identifier for a tab.
pub type TabId = usize;

/// Information about a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: TabId,
    /// Display name (file name or "Untitled").
    pub name: String,
    pub path: Option<PathBuf>,
    pub language: Language,
}

#[derive(Debug)]
struct Tab {
    session: EditorSession,
    path: Option<PathBuf>,
}

/// Manages the open tabs.
#[derive(Debug)]
pub struct Workspace {
    /// Indexed by `TabId`; closed tabs leave `None`.
    tabs: Vec<Option<Tab>>,
    active_tab: Option<TabId>,
    /// Tab ids in display order.
    tab_order: Vec<TabId>,
    next_id: TabId,
    output: OutputPane,
    runner: CodeRunner,
    themes: ThemeManager,
    /// Name and contents of the applied stylesheet.
    stylesheet: Option<(String, String)>,
    notices: Vec<Notice>,
    config: EditorConfig,
}

impl Workspace {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab: None,
            tab_order: Vec::new(),
            next_id: 0,
            output: OutputPane::new(),
            runner: CodeRunner::new(config.interpreter.clone()),
            themes: ThemeManager::new(config.themes_dir.clone()),
            stylesheet: None,
            notices: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn insert_tab(&mut self, tab: Tab) -> TabId {
        let id = self.next_id;
        self.next_id += 1;
        if id >= self.tabs.len() {
            self.tabs.resize_with(id + 1, || None);
        }
        self.tabs[id] = Some(tab);
        self.tab_order.push(id);
        self.active_tab = Some(id);
        id
    }

    /// Opens an empty Python tab and makes it active.
    pub fn new_tab(&mut self) -> Result<TabId, SessionError> {
        let session = EditorSession::new(&self.config)?;
        Ok(self.insert_tab(Tab {
            session,
            path: None,
        }))
    }

    /// Opens `path` in a new tab, or activates the tab already showing it.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> Result<TabId, WorkspaceError> {
        let path = path.as_ref();
        if let Some(existing) = self.find_tab_by_path(path) {
            self.active_tab = Some(existing);
            return Ok(existing);
        }

        let text = fs::read_to_string(path).map_err(|source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let session = EditorSession::with_text(&text, Language::from_path(path), &self.config)?;
        log::info!("opened {}", path.display());
        Ok(self.insert_tab(Tab {
            session,
            path: Some(path.to_path_buf()),
        }))
    }

    fn find_tab_by_path(&self, path: &Path) -> Option<TabId> {
        self.tab_order.iter().copied().find(|&id| {
            self.tabs
                .get(id)
                .and_then(Option::as_ref)
                .is_some_and(|tab| tab.path.as_deref() == Some(path))
        })
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.active_tab
    }

    pub fn active_session(&self) -> Option<&EditorSession> {
        self.active_tab.and_then(|id| self.session(id))
    }

    pub fn active_session_mut(&mut self) -> Option<&mut EditorSession> {
        let id = self.active_tab?;
        self.session_mut(id)
    }

    pub fn session(&self, id: TabId) -> Option<&EditorSession> {
        self.tabs
            .get(id)
            .and_then(Option::as_ref)
            .map(|tab| &tab.session)
    }

    pub fn session_mut(&mut self, id: TabId) -> Option<&mut EditorSession> {
        self.tabs
            .get_mut(id)
            .and_then(Option::as_mut)
            .map(|tab| &mut tab.session)
    }

    pub fn set_active_tab(&mut self, id: TabId) -> bool {
        if self.session(id).is_some() {
            self.active_tab = Some(id);
            true
        } else {
            false
        }
    }

    /// Switches to the next tab, wrapping around.
    pub fn next_tab(&mut self) {
        if let Some(pos) = self.active_tab_index() {
            let next = (pos + 1) % self.tab_order.len();
            self.active_tab = Some(self.tab_order[next]);
        }
    }

    /// Switches to the previous tab, wrapping around.
    pub fn prev_tab(&mut self) {
        if let Some(pos) = self.active_tab_index() {
            let prev = pos.checked_sub(1).unwrap_or(self.tab_order.len() - 1);
            self.active_tab = Some(self.tab_order[prev]);
        }
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        self.tab_order
            .iter()
            .filter_map(|&id| {
                let tab = self.tabs.get(id)?.as_ref()?;
                Some(TabInfo {
                    id,
                    name: tab
                        .path
                        .as_deref()
                        .and_then(Path::file_name)
                        .and_then(|n| n.to_str())
                        .unwrap_or("Untitled")
                        .to_string(),
                    path: tab.path.clone(),
                    language: tab.session.language(),
                })
            })
            .collect()
    }

    pub fn tab_count(&self) -> usize {
        self.tab_order.len()
    }

    pub fn active_tab_index(&self) -> Option<usize> {
        let active = self.active_tab?;
        self.tab_order.iter().position(|&id| id == active)
    }

    /// Closes a tab, discarding its session. Returns true if it was open.
    pub fn close_tab(&mut self, id: TabId) -> bool {
        let Some(slot) = self.tabs.get_mut(id) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }
        self.tab_order.retain(|&tab_id| tab_id != id);
        if self.active_tab == Some(id) {
            self.active_tab = self.tab_order.first().copied();
        }
        true
    }

    pub fn close_active_tab(&mut self) -> Option<TabId> {
        let id = self.active_tab?;
        self.close_tab(id).then_some(id)
    }

    // ==================== Run ====================

    pub fn output(&self) -> &OutputPane {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut OutputPane {
        &mut self.output
    }

    /// Runs the active tab's text and shows the result in the output pane.
    /// Returns `None` when no tab is open.
    pub fn run_active(&mut self) -> Option<Result<RunOutput, RunError>> {
        let source = self.active_session()?.text();
        let result = self.runner.run(&source);
        self.output.show_run(&result);
        Some(result)
    }

    // ==================== Themes ====================

    pub fn available_themes(&self) -> Vec<String> {
        self.themes.available().unwrap_or_else(|err| {
            log::warn!("could not list themes in {}: {err}", self.themes.dir().display());
            Vec::new()
        })
    }

    /// Applies the stylesheet `name`, and the matching token palette if there
    /// is one. On failure a warning notice is queued and nothing changes.
    pub fn apply_theme(&mut self, name: &str) -> bool {
        match self.themes.load(name) {
            Ok(sheet) => {
                self.stylesheet = Some((name.to_string(), sheet));
                if let Some(palette) = Theme::by_name(name) {
                    for tab in self.tabs.iter_mut().flatten() {
                        tab.session.set_theme(palette.clone());
                    }
                }
                true
            }
            Err(err) => {
                log::warn!("{err}");
                self.notices.push(Notice::warning(err.to_string()));
                false
            }
        }
    }

    pub fn theme_name(&self) -> Option<&str> {
        self.stylesheet.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn stylesheet(&self) -> Option<&str> {
        self.stylesheet.as_ref().map(|(_, sheet)| sheet.as_str())
    }

    /// Drains the workspace's notices, then every tab's in display order.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = std::mem::take(&mut self.notices);
        for &id in &self.tab_order {
            if let Some(Some(tab)) = self.tabs.get_mut(id) {
                notices.extend(tab.session.take_notices());
            }
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;
    use pretty_assertions::assert_eq;

    fn workspace() -> Workspace {
        Workspace::new(EditorConfig {
            deep_analysis: false,
            ..EditorConfig::default()
        })
    }

    #[test]
    fn test_new_workspace() {
        let ws = workspace();
        assert!(ws.active_tab_id().is_none());
        assert_eq!(ws.tab_count(), 0);
        assert!(ws.active_session().is_none());
    }

    #[test]
    fn test_tabs_are_independent() {
        let mut ws = workspace();
        let first = ws.new_tab().unwrap();
        let second = ws.new_tab().unwrap();
        assert_eq!(ws.active_tab_id(), Some(second));

        ws.active_session_mut().unwrap().insert_text("x = 1\n");
        assert_eq!(ws.session(first).unwrap().text(), "");
        assert!(ws.session(first).unwrap().symbols().is_empty());
        assert!(ws.session(second).unwrap().symbols().variables.contains("x"));
    }

    #[test]
    fn test_tab_switching() {
        let mut ws = workspace();
        let a = ws.new_tab().unwrap();
        let b = ws.new_tab().unwrap();
        let c = ws.new_tab().unwrap();

        ws.set_active_tab(a);
        ws.next_tab();
        assert_eq!(ws.active_tab_id(), Some(b));
        ws.prev_tab();
        ws.prev_tab();
        assert_eq!(ws.active_tab_id(), Some(c));
        assert!(!ws.set_active_tab(42));
    }

    #[test]
    fn test_close_tab() {
        let mut ws = workspace();
        let a = ws.new_tab().unwrap();
        let b = ws.new_tab().unwrap();

        assert!(ws.close_tab(b));
        assert!(!ws.close_tab(b));
        assert_eq!(ws.active_tab_id(), Some(a));
        assert!(ws.session(b).is_none());
        assert_eq!(ws.close_active_tab(), Some(a));
        assert_eq!(ws.tab_count(), 0);
    }

    #[test]
    fn test_open_file_detects_language_and_reuses_tab() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("main.py");
        let notes = dir.path().join("notes.txt");
        fs::write(&script, "def main():\n    pass\n").unwrap();
        fs::write(&notes, "def").unwrap();

        let mut ws = workspace();
        let id = ws.open_file(&script).unwrap();
        let other = ws.open_file(&notes).unwrap();
        assert_eq!(ws.open_file(&script).unwrap(), id);
        assert_eq!(ws.active_tab_id(), Some(id));

        let tabs = ws.tabs();
        assert_eq!(tabs[0].name, "main.py");
        assert_eq!(tabs[0].language, Language::Python);
        assert_eq!(tabs[1].id, other);
        assert_eq!(tabs[1].language, Language::PlainText);
        assert!(ws.session(id).unwrap().symbols().functions.contains("main"));

        let missing = ws.open_file(dir.path().join("missing.py"));
        assert!(matches!(missing, Err(WorkspaceError::Io { .. })));
    }

    #[test]
    fn test_apply_theme() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("light.qss"), "QWidget { color: black; }").unwrap();
        let mut ws = Workspace::new(EditorConfig {
            deep_analysis: false,
            themes_dir: dir.path().to_path_buf(),
            ..EditorConfig::default()
        });
        let id = ws.new_tab().unwrap();

        assert!(ws.apply_theme("light"));
        assert_eq!(ws.theme_name(), Some("light"));
        assert_eq!(ws.session(id).unwrap().theme().name, Theme::light().name);

        assert!(!ws.apply_theme("neon"));
        assert_eq!(ws.theme_name(), Some("light"));
        assert_eq!(ws.stylesheet(), Some("QWidget { color: black; }"));
        assert_eq!(
            ws.take_notices(),
            vec![Notice::new(NoticeKind::Warning, "Theme 'neon' not found.")]
        );
        assert_eq!(ws.available_themes(), vec!["light"]);
    }

    #[test]
    fn test_notices_are_drained_from_tabs() {
        let mut ws = workspace();
        ws.new_tab().unwrap();
        ws.active_session_mut().unwrap().find("missing");
        let notices = ws.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Info);
        assert!(ws.take_notices().is_empty());
    }

    #[test]
    fn test_run_without_tab() {
        let mut ws = workspace();
        assert!(ws.run_active().is_none());
        assert!(!ws.output().is_visible());
    }

    #[test]
    fn test_run_failure_shows_error_in_output() {
        let mut ws = Workspace::new(EditorConfig {
            deep_analysis: false,
            interpreter: "laefex-test-no-such-interpreter".to_string(),
            ..EditorConfig::default()
        });
        ws.new_tab().unwrap();
        ws.active_session_mut().unwrap().insert_text("print(1+1)");

        let result = ws.run_active().unwrap();
        assert!(matches!(result, Err(RunError::Spawn { .. })));
        assert!(ws.output().is_visible());
        assert!(ws.output().text().contains("laefex-test-no-such-interpreter"));
    }
}
