use crate::model::{validate_text, TaskId};
use crate::storage::KeyValueStore;
use crate::store::{StoreError, TaskStore};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Draft {
    target: TaskId,
    text: String,
}

/// The single in-progress inline edit, if any.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditSession {
    draft: Option<Draft>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing `id`, discarding any edit already in progress.
    pub fn begin(&mut self, id: TaskId, current_text: &str) {
        self.draft = Some(Draft {
            target: id,
            text: current_text.to_string(),
        });
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    pub fn is_active(&self) -> bool {
        self.draft.is_some()
    }

    pub fn target(&self) -> Option<TaskId> {
        self.draft.as_ref().map(|d| d.target)
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_ref().map(|d| d.text.as_str())
    }

    pub fn draft_mut(&mut self) -> Option<&mut String> {
        self.draft.as_mut().map(|d| &mut d.text)
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.text = text.into();
        }
    }

    /// Writes the draft onto its task. On a validation failure the session
    /// stays open with the draft untouched. Returns the committed id, or
    /// `None` when there was no session or its task no longer exists.
    pub fn commit<S: KeyValueStore>(
        &mut self,
        store: &mut TaskStore<S>,
    ) -> Result<Option<TaskId>, StoreError> {
        let Some(draft) = self.draft.as_ref() else {
            return Ok(None);
        };
        validate_text(&draft.text)?;
        let target = draft.target;
        let found = store.edit_text(target, &draft.text)?;
        self.draft = None;
        Ok(found.then_some(target))
    }
}
