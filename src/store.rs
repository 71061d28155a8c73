use crate::mark::{Mark, MarkId, MarkPatch, ToolAttrs};

/// Ordered mark collection. Iteration follows insertion order.
#[derive(Debug, Default)]
pub struct MarkStore {
    marks: Vec<Mark>,
    next_id: u64,
}

impl MarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mark at an image-space position and return it.
    pub fn add(&mut self, pos: egui::Pos2, attrs: ToolAttrs) -> &Mark {
        let id = MarkId(self.next_id);
        self.next_id += 1;
        self.marks.push(Mark::new(id, pos, attrs));
        log::debug!("Mark {} added at ({:.1}, {:.1})", id, pos.x, pos.y);
        &self.marks[self.marks.len() - 1]
    }

    /// Remove a mark. Absent ids are a no-op.
    pub fn remove_by_id(&mut self, id: MarkId) -> Option<Mark> {
        let index = self.marks.iter().position(|m| m.id() == id)?;
        log::debug!("Mark {} removed", id);
        Some(self.marks.remove(index))
    }

    /// Apply a partial update. Returns `false` when the id is absent.
    pub fn update_by_id(&mut self, id: MarkId, patch: &MarkPatch) -> bool {
        match self.marks.iter_mut().find(|m| m.id() == id) {
            Some(mark) => {
                mark.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Drop every mark. Ids keep counting up afterwards.
    pub fn clear(&mut self) {
        log::debug!("Clearing {} marks", self.marks.len());
        self.marks.clear();
    }

    pub fn get(&self, id: MarkId) -> Option<&Mark> {
        self.marks.iter().find(|m| m.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.marks.iter()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Topmost mark whose centre lies within `radius` image pixels of `pos`.
    pub fn mark_at(&self, pos: egui::Pos2, radius: f32) -> Option<MarkId> {
        self.marks
            .iter()
            .rev()
            .find(|m| m.pos().distance(pos) <= radius)
            .map(Mark::id)
    }
}
