//! Single-selection edit/create state machine.
//!
//! ```text
//! Idle ──enable add──▶ Adding ──disable add──▶ Idle
//! Idle ──click mark──▶ Editing(id) ──click empty──▶ Idle
//! Editing(id) ──enable add──▶ Adding
//! Editing(id) ──click other mark──▶ Editing(id')
//! Editing(id) ──delete selected──▶ Idle
//! ```
//!
//! Adding and editing are mutually exclusive. While editing, tool attribute
//! changes patch the selected mark; otherwise they become the defaults for
//! the next created mark.

use crate::mark::{Mark, MarkId, MarkPatch, ToolAttrs};
use crate::store::MarkStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditorMode {
    #[default]
    Idle,
    Adding,
    Editing(MarkId),
}

/// What a change of the tool attributes currently applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolTarget {
    DefaultsForCreate,
    PatchTargetFor(MarkId),
}

#[derive(Debug)]
pub struct SelectionController {
    mode: EditorMode,
    /// Attributes shown in the toolbar: the create defaults, or a mirror of
    /// the selected mark while editing.
    tool: ToolAttrs,
    create_defaults: ToolAttrs,
}

impl SelectionController {
    pub fn new(defaults: ToolAttrs) -> Self {
        Self {
            mode: EditorMode::Idle,
            tool: defaults.clone(),
            create_defaults: defaults,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn selected(&self) -> Option<MarkId> {
        match self.mode {
            EditorMode::Editing(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_adding(&self) -> bool {
        self.mode == EditorMode::Adding
    }

    pub fn tool_target(&self) -> ToolTarget {
        match self.mode {
            EditorMode::Editing(id) => ToolTarget::PatchTargetFor(id),
            EditorMode::Idle | EditorMode::Adding => ToolTarget::DefaultsForCreate,
        }
    }

    pub fn tool_attrs(&self) -> &ToolAttrs {
        &self.tool
    }

    pub fn create_defaults(&self) -> &ToolAttrs {
        &self.create_defaults
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    /// Enter add mode. Any selection is dropped.
    pub fn enable_add_mode(&mut self) {
        if self.selected().is_some() {
            self.restore_defaults();
        }
        self.mode = EditorMode::Adding;
    }

    pub fn disable_add_mode(&mut self) {
        if self.is_adding() {
            self.mode = EditorMode::Idle;
        }
    }

    pub fn set_add_mode(&mut self, enabled: bool) {
        if enabled {
            self.enable_add_mode();
        } else {
            self.disable_add_mode();
        }
    }

    /// Select an existing mark and load its attributes into the tool state.
    /// Returns `false` if the mark does not exist.
    pub fn select(&mut self, store: &MarkStore, id: MarkId) -> bool {
        let Some(mark) = store.get(id) else {
            return false;
        };
        self.tool = mark.attrs();
        self.mode = EditorMode::Editing(id);
        log::debug!("Selected mark {}", id);
        true
    }

    /// Click on empty canvas: leaves editing, keeps add mode.
    pub fn deselect(&mut self) {
        if self.selected().is_some() {
            self.restore_defaults();
            self.mode = EditorMode::Idle;
        }
    }

    /// Back to `Idle` from any state.
    pub fn reset(&mut self) {
        self.restore_defaults();
        self.mode = EditorMode::Idle;
    }

    /// Remove the selected mark. No-op outside `Editing`.
    pub fn delete_selected(&mut self, store: &mut MarkStore) -> Option<Mark> {
        let id = self.selected()?;
        let removed = store.remove_by_id(id);
        self.reset();
        removed
    }

    /// Forget the selection if the given mark disappeared from the store.
    pub fn mark_removed(&mut self, id: MarkId) {
        if self.selected() == Some(id) {
            self.reset();
        }
    }

    // ── Tool attributes ─────────────────────────────────────────────────────

    pub fn set_create_defaults(&mut self, attrs: ToolAttrs) {
        if self.selected().is_none() {
            self.tool = attrs.clone();
        }
        self.create_defaults = attrs;
    }

    /// Patch the selected mark and mirror the change in the tool state.
    /// Returns `false` when nothing is selected.
    pub fn patch_selected(&mut self, store: &mut MarkStore, patch: &MarkPatch) -> bool {
        let Some(id) = self.selected() else {
            return false;
        };
        if !store.update_by_id(id, patch) {
            self.reset();
            return false;
        }
        patch.apply(&mut self.tool);
        true
    }

    /// Route a toolbar change to the create defaults or to the selected mark.
    pub fn apply_tool_change(&mut self, store: &mut MarkStore, patch: &MarkPatch) -> ToolTarget {
        let target = self.tool_target();
        match target {
            ToolTarget::PatchTargetFor(_) => {
                self.patch_selected(store, patch);
            }
            ToolTarget::DefaultsForCreate => {
                let mut defaults = self.create_defaults.clone();
                patch.apply(&mut defaults);
                self.set_create_defaults(defaults);
            }
        }
        target
    }

    fn restore_defaults(&mut self) {
        self.tool = self.create_defaults.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::{Section, Thickness};

    fn setup() -> (SelectionController, MarkStore, MarkId) {
        let mut store = MarkStore::new();
        let id = store
            .add(
                egui::pos2(1.0, 2.0),
                ToolAttrs::new("blue").with_section(Section::HalfVertical),
            )
            .id();
        (SelectionController::new(ToolAttrs::new("red")), store, id)
    }

    #[test]
    fn test_add_mode_toggle() {
        let (mut sel, _, _) = setup();
        sel.enable_add_mode();
        assert_eq!(sel.mode(), EditorMode::Adding);
        sel.disable_add_mode();
        assert_eq!(sel.mode(), EditorMode::Idle);
    }

    #[test]
    fn test_select_loads_mark_attrs() {
        let (mut sel, store, id) = setup();
        assert!(sel.select(&store, id));
        assert_eq!(sel.mode(), EditorMode::Editing(id));
        assert_eq!(sel.tool_attrs().color.as_str(), "blue");
        assert_eq!(sel.tool_attrs().section, Section::HalfVertical);
        assert_eq!(sel.tool_target(), ToolTarget::PatchTargetFor(id));
    }

    #[test]
    fn test_enable_add_mode_clears_selection() {
        let (mut sel, store, id) = setup();
        sel.select(&store, id);
        sel.enable_add_mode();
        assert_eq!(sel.mode(), EditorMode::Adding);
        assert_eq!(sel.selected(), None);
        assert_eq!(sel.tool_attrs().color.as_str(), "red");
    }

    #[test]
    fn test_deselect_restores_create_defaults() {
        let (mut sel, store, id) = setup();
        sel.select(&store, id);
        sel.deselect();
        assert_eq!(sel.mode(), EditorMode::Idle);
        assert_eq!(sel.tool_attrs(), &ToolAttrs::new("red"));
    }

    #[test]
    fn test_tool_change_while_editing_patches_mark_only() {
        let (mut sel, mut store, id) = setup();
        sel.select(&store, id);
        let target = sel.apply_tool_change(&mut store, &MarkPatch::thickness(Some(Thickness::Mm30)));
        assert_eq!(target, ToolTarget::PatchTargetFor(id));
        assert_eq!(store.get(id).unwrap().thickness, Some(Thickness::Mm30));
        assert_eq!(sel.tool_attrs().thickness, Some(Thickness::Mm30));
        assert_eq!(sel.create_defaults().thickness, None);
    }

    #[test]
    fn test_new_defaults_while_editing_leave_selection_alone() {
        let (mut sel, store, id) = setup();
        sel.select(&store, id);
        sel.set_create_defaults(ToolAttrs::new("green").with_thickness(Some(Thickness::Mm50)));

        assert_eq!(sel.mode(), EditorMode::Editing(id));
        assert_eq!(sel.tool_attrs().color.as_str(), "blue");
        assert_eq!(sel.tool_attrs().section, Section::HalfVertical);
        assert_eq!(sel.create_defaults().color.as_str(), "green");
        let mark = store.get(id).unwrap();
        assert_eq!(mark.color.as_str(), "blue");
        assert_eq!(mark.thickness, None);

        sel.deselect();
        assert_eq!(sel.tool_attrs().color.as_str(), "green");
        assert_eq!(sel.tool_attrs().thickness, Some(Thickness::Mm50));
    }

    #[test]
    fn test_tool_change_while_idle_sets_defaults() {
        let (mut sel, mut store, id) = setup();
        let target = sel.apply_tool_change(&mut store, &MarkPatch::color("green"));
        assert_eq!(target, ToolTarget::DefaultsForCreate);
        assert_eq!(sel.create_defaults().color.as_str(), "green");
        assert_eq!(sel.tool_attrs().color.as_str(), "green");
        assert_eq!(store.get(id).unwrap().color.as_str(), "blue");
    }

    #[test]
    fn test_delete_selected() {
        let (mut sel, mut store, id) = setup();
        assert!(sel.delete_selected(&mut store).is_none());
        assert_eq!(store.len(), 1);

        sel.select(&store, id);
        let removed = sel.delete_selected(&mut store);
        assert_eq!(removed.map(|m| m.id()), Some(id));
        assert!(store.is_empty());
        assert_eq!(sel.mode(), EditorMode::Idle);
    }

    #[test]
    fn test_select_missing_mark_is_rejected() {
        let (mut sel, mut store, id) = setup();
        store.remove_by_id(id);
        assert!(!sel.select(&store, id));
        assert_eq!(sel.mode(), EditorMode::Idle);
    }

    #[test]
    fn test_switch_selection_directly() {
        let (mut sel, mut store, first) = setup();
        let second = store.add(egui::pos2(9.0, 9.0), ToolAttrs::new("yellow")).id();
        sel.select(&store, first);
        sel.select(&store, second);
        assert_eq!(sel.mode(), EditorMode::Editing(second));
        assert_eq!(sel.tool_attrs().color.as_str(), "yellow");
    }
}
