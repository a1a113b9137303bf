//! The authoritative list of remote file names.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::api::FileStoreApi;
use crate::notify::Notifier;

use super::actions::{ActionKind, RowAction};

/// Shown when the list cannot be fetched and the backend gave no message.
pub const LIST_FAILED: &str = "Error fetching files.";

/// One rendered entry: the name plus its four actions bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub name: String,
    pub actions: Vec<RowAction>,
}

impl FileRow {
    fn new(name: String) -> Self {
        let actions = ActionKind::ALL
            .iter()
            .map(|kind| RowAction::new(*kind, name.clone()))
            .collect();
        Self { name, actions }
    }

    pub fn action(&self, kind: ActionKind) -> Option<&RowAction> {
        self.actions.iter().find(|a| a.kind == kind)
    }
}

#[derive(Debug, Default)]
struct ListState {
    rows: Vec<FileRow>,
    selected: Option<usize>,
}

impl ListState {
    fn clamp_selection(&mut self) {
        self.selected = match self.rows.len() {
            0 => None,
            len => Some(self.selected.unwrap_or(0).min(len - 1)),
        };
    }
}

/// Rows mirror the most recent completed `list_files` response and are
/// changed by nothing else. Clone is cheap and every clone shares the rows.
#[derive(Clone)]
pub struct FileListView {
    api: Arc<dyn FileStoreApi>,
    notifier: Notifier,
    state: Arc<Mutex<ListState>>,
}

impl FileListView {
    pub fn new(api: Arc<dyn FileStoreApi>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            state: Arc::new(Mutex::new(ListState::default())),
        }
    }

    /// Fetch the list and replace every row with the result.
    ///
    /// The old rows are discarded when the response arrives. On failure the
    /// list is left empty and an error notice is raised. When refreshes
    /// overlap, the rows end up matching whichever response arrived last.
    pub async fn refresh(&self) -> bool {
        let result = self.api.list_files().await;

        let mut state = self.state.lock();
        state.rows.clear();
        match result {
            Ok(names) => {
                state.rows = names.into_iter().map(FileRow::new).collect();
                state.clamp_selection();
                info!(count = state.rows.len(), "File list refreshed");
                true
            }
            Err(e) => {
                state.selected = None;
                drop(state);
                warn!(error = %e, "Failed to fetch file list");
                self.notifier.error(e.user_message(LIST_FAILED));
                false
            }
        }
    }

    pub fn snapshot(&self) -> Vec<FileRow> {
        self.state.lock().rows.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.state.lock().rows.iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().rows.is_empty()
    }

    pub fn row(&self, name: &str) -> Option<FileRow> {
        self.state.lock().rows.iter().find(|r| r.name == name).cloned()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.lock().selected
    }

    pub fn selected(&self) -> Option<FileRow> {
        let state = self.state.lock();
        state.selected.and_then(|i| state.rows.get(i)).cloned()
    }

    pub fn select_next(&self) {
        let mut state = self.state.lock();
        let len = state.rows.len();
        if len > 0 {
            state.selected = Some(state.selected.map_or(0, |i| (i + 1).min(len - 1)));
        }
    }

    pub fn select_prev(&self) {
        let mut state = self.state.lock();
        if !state.rows.is_empty() {
            state.selected = Some(state.selected.map_or(0, |i| i.saturating_sub(1)));
        }
    }
}
