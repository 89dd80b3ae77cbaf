//! Navigation state that travels with record mutations.

use crate::core::{CollectionKind, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Dashboard,
    List(CollectionKind),
    Edit { kind: CollectionKind, id: RecordId },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub route: Route,
    pub selected: Option<RecordId>,
}

impl ViewState {
    /// Viewing the edit screen of one record
    pub fn editing(kind: CollectionKind, id: impl Into<RecordId>) -> Self {
        let id = id.into();
        Self {
            route: Route::Edit {
                kind,
                id: id.clone(),
            },
            selected: Some(id),
        }
    }

    pub fn is_viewing(&self, kind: CollectionKind, id: &str) -> bool {
        match &self.route {
            Route::Edit {
                kind: route_kind,
                id: route_id,
            } => *route_kind == kind && route_id == id,
            _ => false,
        }
    }

    /// Step back to the list when the viewed record goes away.
    /// Returns true if navigation changed.
    pub fn leave(&mut self, kind: CollectionKind, id: &str) -> bool {
        let mut changed = false;
        if self.is_viewing(kind, id) {
            self.route = Route::List(kind);
            changed = true;
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_viewed_record_returns_to_list() {
        let mut view = ViewState::editing(CollectionKind::Animals, "a1");
        assert!(view.leave(CollectionKind::Animals, "a1"));
        assert_eq!(view.route, Route::List(CollectionKind::Animals));
        assert_eq!(view.selected, None);
    }

    #[test]
    fn test_leave_other_record_is_noop() {
        let mut view = ViewState::editing(CollectionKind::Animals, "a1");
        assert!(!view.leave(CollectionKind::Animals, "a2"));
        assert_eq!(view, ViewState::editing(CollectionKind::Animals, "a1"));
        view.leave(CollectionKind::Tasks, "a1");
        assert!(view.is_viewing(CollectionKind::Animals, "a1"));
    }
}
