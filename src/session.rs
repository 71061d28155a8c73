//! Everything one marking session owns: image dimensions, zoom, marks,
//! selection and the color registry. Pointer events enter here.

use crate::color::{ColorKey, ColorRegistry};
use crate::error::{Error, Result};
use crate::export::ReportSink;
use crate::mark::{Mark, MarkId, MarkPatch, ToolAttrs};
use crate::options::Options;
use crate::report::{Report, ReportLayout, ReportQuoting};
use crate::selection::{EditorMode, SelectionController, ToolTarget};
use crate::store::MarkStore;
use crate::transform::{to_image_space, ImageSize, Zoom};

/// Result of a primary click on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Created(MarkId),
    Selected(MarkId),
    Deselected,
    /// Outside the image in add mode, or empty canvas with nothing selected.
    Ignored,
}

#[derive(Debug)]
pub struct Session {
    image: Option<ImageSize>,
    zoom: Zoom,
    store: MarkStore,
    selection: SelectionController,
    registry: ColorRegistry,
    mark_radius: f32,
}

impl Session {
    pub fn new(options: &Options) -> Self {
        let options = options.sanitized();
        let registry = options.registry();
        let tool = options.initial_tool(&registry);
        Self {
            image: None,
            zoom: Zoom::new(options.zoom_step, options.zoom_min),
            store: MarkStore::new(),
            selection: SelectionController::new(tool),
            registry,
            mark_radius: options.mark_radius,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn image(&self) -> Option<ImageSize> {
        self.image
    }

    pub fn zoom(&self) -> &Zoom {
        &self.zoom
    }

    pub fn marks(&self) -> &MarkStore {
        &self.store
    }

    pub fn mode(&self) -> EditorMode {
        self.selection.mode()
    }

    pub fn selected(&self) -> Option<MarkId> {
        self.selection.selected()
    }

    pub fn tool_attrs(&self) -> &ToolAttrs {
        self.selection.tool_attrs()
    }

    pub fn tool_target(&self) -> ToolTarget {
        self.selection.tool_target()
    }

    pub fn registry(&self) -> &ColorRegistry {
        &self.registry
    }

    /// Labels are editable; keys and order are not.
    pub fn registry_mut(&mut self) -> &mut ColorRegistry {
        &mut self.registry
    }

    pub fn mark_radius(&self) -> f32 {
        self.mark_radius
    }

    // ── Image & zoom ────────────────────────────────────────────────────────

    /// Switch to a newly loaded image. Marks from the previous image are dropped.
    pub fn set_image(&mut self, size: ImageSize) {
        if !self.store.is_empty() {
            log::info!("New image loaded, discarding {} marks", self.store.len());
        }
        self.image = Some(size);
        self.store.clear();
        self.selection.reset();
        self.zoom.reset();
    }

    pub fn zoom_in(&mut self) {
        self.zoom.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.zoom.zoom_out();
    }

    // ── Pointer input ───────────────────────────────────────────────────────

    /// Handle a primary click given in viewport pixels.
    pub fn pointer_click(
        &mut self,
        pointer: egui::Pos2,
        image_origin: egui::Pos2,
    ) -> Result<ClickOutcome> {
        let pos = to_image_space(pointer, image_origin, self.zoom.factor());
        self.click_at(pos)
    }

    /// Handle a primary click at an image-space position.
    ///
    /// In add mode every click on the image creates a mark, even on top of
    /// an existing one. Otherwise a click selects the mark under the pointer
    /// or clears the selection.
    pub fn click_at(&mut self, pos: egui::Pos2) -> Result<ClickOutcome> {
        if self.selection.is_adding() {
            let inside = self.image.is_some_and(|size| size.contains(pos));
            if !inside {
                return Ok(ClickOutcome::Ignored);
            }
            let attrs = self.selection.create_defaults().clone();
            return self.add_mark(pos, attrs).map(ClickOutcome::Created);
        }

        match self.store.mark_at(pos, self.mark_radius) {
            Some(id) => {
                self.selection.select(&self.store, id);
                Ok(ClickOutcome::Selected(id))
            }
            None if self.selection.selected().is_some() => {
                self.selection.deselect();
                Ok(ClickOutcome::Deselected)
            }
            None => Ok(ClickOutcome::Ignored),
        }
    }

    // ── Marks ───────────────────────────────────────────────────────────────

    /// Add a mark directly. The color must be registered.
    pub fn add_mark(&mut self, pos: egui::Pos2, attrs: ToolAttrs) -> Result<MarkId> {
        self.ensure_registered(&attrs.color)?;
        Ok(self.store.add(pos, attrs).id())
    }

    pub fn remove_mark(&mut self, id: MarkId) -> Option<Mark> {
        let removed = self.store.remove_by_id(id);
        self.selection.mark_removed(id);
        removed
    }

    /// Delete the selected mark; no-op without a selection.
    pub fn delete_selected(&mut self) -> Option<Mark> {
        self.selection.delete_selected(&mut self.store)
    }

    /// Remove every mark and return to `Idle`.
    pub fn clear_marks(&mut self) {
        self.store.clear();
        self.selection.reset();
    }

    // ── Mode & tool attributes ──────────────────────────────────────────────

    pub fn set_add_mode(&mut self, enabled: bool) {
        self.selection.set_add_mode(enabled);
    }

    /// Leave add mode or drop the selection.
    pub fn cancel(&mut self) {
        self.selection.reset();
    }

    pub fn set_create_defaults(&mut self, attrs: ToolAttrs) -> Result<()> {
        self.ensure_registered(&attrs.color)?;
        self.selection.set_create_defaults(attrs);
        Ok(())
    }

    /// Patch the selected mark. Returns `false` when nothing is selected.
    pub fn patch_selected(&mut self, patch: &MarkPatch) -> Result<bool> {
        self.ensure_patch_valid(patch)?;
        Ok(self.selection.patch_selected(&mut self.store, patch))
    }

    /// A toolbar change, applied according to the current mode.
    pub fn apply_tool_change(&mut self, patch: &MarkPatch) -> Result<ToolTarget> {
        self.ensure_patch_valid(patch)?;
        Ok(self.selection.apply_tool_change(&mut self.store, patch))
    }

    // ── Report ──────────────────────────────────────────────────────────────

    pub fn report(&self, layout: ReportLayout) -> Report {
        Report::build(layout, self.store.iter(), &self.registry)
    }

    pub fn export(
        &self,
        layout: ReportLayout,
        quoting: ReportQuoting,
        sink: &mut dyn ReportSink,
    ) -> Result<()> {
        let csv = self.report(layout).to_csv(quoting)?;
        sink.export(csv.as_bytes())?;
        Ok(())
    }

    fn ensure_patch_valid(&self, patch: &MarkPatch) -> Result<()> {
        match &patch.color {
            Some(color) => self.ensure_registered(color),
            None => Ok(()),
        }
    }

    fn ensure_registered(&self, color: &ColorKey) -> Result<()> {
        if self.registry.contains(color) {
            Ok(())
        } else {
            Err(Error::UnknownColor(color.to_string()))
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::Section;

    fn session_with_image() -> Session {
        let mut session = Session::default();
        session.set_image(ImageSize::new(200, 100));
        session
    }

    #[test]
    fn test_click_in_add_mode_creates_without_selecting() {
        let mut session = session_with_image();
        session.set_add_mode(true);
        let outcome = session.click_at(egui::pos2(50.0, 50.0)).unwrap();
        assert!(matches!(outcome, ClickOutcome::Created(_)));
        assert_eq!(session.mode(), EditorMode::Adding);
        assert_eq!(session.selected(), None);
        assert_eq!(session.marks().len(), 1);
    }

    #[test]
    fn test_click_outside_image_is_ignored() {
        let mut session = session_with_image();
        session.set_add_mode(true);
        let outcome = session.click_at(egui::pos2(250.0, 50.0)).unwrap();
        assert_eq!(outcome, ClickOutcome::Ignored);
        assert!(session.marks().is_empty());
    }

    #[test]
    fn test_no_image_means_no_marks() {
        let mut session = Session::default();
        session.set_add_mode(true);
        assert_eq!(
            session.click_at(egui::pos2(1.0, 1.0)).unwrap(),
            ClickOutcome::Ignored
        );
    }

    #[test]
    fn test_pointer_click_uses_zoom() {
        let mut session = session_with_image();
        session.zoom_in();
        session.zoom_in();
        session.set_add_mode(true);
        let outcome = session
            .pointer_click(egui::pos2(130.0, 70.0), egui::pos2(10.0, 10.0))
            .unwrap();
        let ClickOutcome::Created(id) = outcome else {
            panic!("expected a new mark");
        };
        let mark = session.marks().get(id).unwrap();
        approx::assert_relative_eq!(mark.x, 100.0, epsilon = 1e-3);
        approx::assert_relative_eq!(mark.y, 50.0, epsilon = 1e-3);
    }

    #[test]
    fn test_unregistered_color_is_rejected() {
        let mut session = session_with_image();
        let err = session
            .add_mark(egui::pos2(1.0, 1.0), ToolAttrs::new("purple"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColor(c) if c == "purple"));
        assert!(session.set_create_defaults(ToolAttrs::new("purple")).is_err());
        assert!(session.apply_tool_change(&MarkPatch::color("purple")).is_err());
        assert!(session.marks().is_empty());
    }

    #[test]
    fn test_new_image_drops_marks_and_zoom() {
        let mut session = session_with_image();
        session
            .add_mark(egui::pos2(5.0, 5.0), ToolAttrs::new("red"))
            .unwrap();
        session.zoom_in();
        session.set_image(ImageSize::new(10, 10));
        assert!(session.marks().is_empty());
        assert_eq!(session.zoom().percent(), 100);
        assert_eq!(session.mode(), EditorMode::Idle);
    }

    #[test]
    fn test_remove_selected_mark_clears_selection() {
        let mut session = session_with_image();
        let id = session
            .add_mark(egui::pos2(5.0, 5.0), ToolAttrs::new("red"))
            .unwrap();
        session.click_at(egui::pos2(5.0, 5.0)).unwrap();
        assert_eq!(session.selected(), Some(id));
        session.remove_mark(id);
        assert_eq!(session.mode(), EditorMode::Idle);
    }

    #[test]
    fn test_zero_zoom_floor_keeps_clicks_finite() {
        let options = Options {
            zoom_step: 0.5,
            zoom_min: 0.0,
            mark_radius: -1.0,
            ..Options::default()
        };
        let mut session = Session::new(&options);
        session.set_image(ImageSize::new(200, 100));
        for _ in 0..10 {
            session.zoom_out();
        }
        assert!(session.zoom().factor() > 0.0);
        assert!(session.mark_radius() > 0.0);

        session.set_add_mode(true);
        let outcome = session
            .pointer_click(egui::pos2(20.0, 10.0), egui::pos2(0.0, 0.0))
            .unwrap();
        let ClickOutcome::Created(id) = outcome else {
            panic!("expected a new mark");
        };
        let mark = session.marks().get(id).unwrap();
        assert!(mark.x.is_finite() && mark.y.is_finite());
    }

    #[test]
    fn test_empty_color_list_still_adds_marks() {
        let options = Options {
            colors: Vec::new(),
            ..Options::default()
        };
        let mut session = Session::new(&options);
        session.set_image(ImageSize::new(200, 100));
        session.set_add_mode(true);
        let outcome = session.click_at(egui::pos2(50.0, 50.0)).unwrap();
        assert!(matches!(outcome, ClickOutcome::Created(_)));
        assert_eq!(session.tool_attrs().color.as_str(), "red");
    }

    #[test]
    fn test_patch_selected_without_selection() {
        let mut session = session_with_image();
        assert!(!session
            .patch_selected(&MarkPatch::section(Section::HalfVertical))
            .unwrap());
    }
}
