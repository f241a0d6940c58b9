//! Contexts (tabs) and how a caller picks a source and a target.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::ActionKind;
use crate::ids::ContextId;
use crate::request::ReplicationRequest;

/// What the host reports about an open context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    pub id: ContextId,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
}

impl ContextInfo {
    pub fn new(id: impl Into<ContextId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: String::new(),
            active: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no source tab selected")]
    MissingSource,

    #[error("no target tab selected")]
    MissingTarget,
}

/// Source and target chosen by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextSelection {
    pub source: Option<ContextId>,
    pub target: Option<ContextId>,
}

impl ContextSelection {
    /// Start with the active context as the target.
    pub fn with_active_target(contexts: &[ContextInfo]) -> Self {
        Self {
            source: None,
            target: contexts.iter().find(|c| c.active).map(|c| c.id),
        }
    }

    pub fn select_source(&mut self, id: ContextId) {
        self.source = Some(id);
    }

    pub fn select_target(&mut self, id: ContextId) {
        self.target = Some(id);
    }

    /// Actions are only available once both ends are chosen.
    pub fn is_ready(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    pub fn request(&self, action: ActionKind) -> Result<ReplicationRequest, SelectionError> {
        let source = self.source.ok_or(SelectionError::MissingSource)?;
        let target = self.target.ok_or(SelectionError::MissingTarget)?;
        Ok(ReplicationRequest::new(action, source, target))
    }
}
