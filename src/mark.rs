use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::ColorKey;

// ── Identity ────────────────────────────────────────────────────────────────

/// Store-scoped mark identifier. Never reused within a store's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId(pub(crate) u64);

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Attributes ──────────────────────────────────────────────────────────────

/// Marker thickness in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Thickness {
    Mm20,
    Mm30,
    Mm40,
    Mm50,
}

impl Thickness {
    pub const ALL: [Thickness; 4] = [
        Thickness::Mm20,
        Thickness::Mm30,
        Thickness::Mm40,
        Thickness::Mm50,
    ];

    pub fn millimetres(self) -> u32 {
        match self {
            Thickness::Mm20 => 20,
            Thickness::Mm30 => 30,
            Thickness::Mm40 => 40,
            Thickness::Mm50 => 50,
        }
    }
}

impl TryFrom<u32> for Thickness {
    type Error = String;

    fn try_from(mm: u32) -> Result<Self, Self::Error> {
        Thickness::ALL
            .into_iter()
            .find(|t| t.millimetres() == mm)
            .ok_or_else(|| format!("thickness must be one of 20, 30, 40, 50 (got {mm})"))
    }
}

impl From<Thickness> for u32 {
    fn from(t: Thickness) -> Self {
        t.millimetres()
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.millimetres())
    }
}

/// Whether a mark counts as a whole unit or as half of one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    #[default]
    Whole,
    /// Half unit, split along the vertical axis.
    HalfVertical,
    /// Half unit, split along the horizontal axis.
    HalfHorizontal,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::Whole,
        Section::HalfVertical,
        Section::HalfHorizontal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Whole => "Whole",
            Section::HalfVertical => "0.5 Vertical",
            Section::HalfHorizontal => "0.5 Horizontal",
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whole" => Ok(Section::Whole),
            "half-vertical" => Ok(Section::HalfVertical),
            "half-horizontal" => Ok(Section::HalfHorizontal),
            other => Err(format!("unknown section '{other}'")),
        }
    }
}

/// The {color, thickness, section} triple chosen in the toolbar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolAttrs {
    pub color: ColorKey,
    pub thickness: Option<Thickness>,
    pub section: Section,
}

impl ToolAttrs {
    pub fn new(color: impl Into<ColorKey>) -> Self {
        Self {
            color: color.into(),
            thickness: None,
            section: Section::Whole,
        }
    }

    pub fn with_thickness(mut self, thickness: Option<Thickness>) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }
}

/// Partial attribute update. `None` leaves a field untouched; note that
/// `thickness: Some(None)` clears the thickness.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkPatch {
    pub color: Option<ColorKey>,
    pub thickness: Option<Option<Thickness>>,
    pub section: Option<Section>,
}

impl MarkPatch {
    pub fn color(color: impl Into<ColorKey>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }

    pub fn thickness(thickness: Option<Thickness>) -> Self {
        Self {
            thickness: Some(thickness),
            ..Default::default()
        }
    }

    pub fn section(section: Section) -> Self {
        Self {
            section: Some(section),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.thickness.is_none() && self.section.is_none()
    }

    pub fn apply(&self, attrs: &mut ToolAttrs) {
        if let Some(color) = &self.color {
            attrs.color = color.clone();
        }
        if let Some(thickness) = self.thickness {
            attrs.thickness = thickness;
        }
        if let Some(section) = self.section {
            attrs.section = section;
        }
    }
}

// ── Mark ────────────────────────────────────────────────────────────────────

/// A placed marker. `x`/`y` are image-space pixels, origin top-left.
#[derive(Clone, Debug, PartialEq)]
pub struct Mark {
    id: MarkId,
    pub x: f32,
    pub y: f32,
    pub color: ColorKey,
    pub thickness: Option<Thickness>,
    pub section: Section,
}

impl Mark {
    pub(crate) fn new(id: MarkId, pos: egui::Pos2, attrs: ToolAttrs) -> Self {
        Self {
            id,
            x: pos.x,
            y: pos.y,
            color: attrs.color,
            thickness: attrs.thickness,
            section: attrs.section,
        }
    }

    pub fn id(&self) -> MarkId {
        self.id
    }

    pub fn pos(&self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }

    pub fn attrs(&self) -> ToolAttrs {
        ToolAttrs {
            color: self.color.clone(),
            thickness: self.thickness,
            section: self.section,
        }
    }

    pub(crate) fn apply(&mut self, patch: &MarkPatch) {
        let mut attrs = self.attrs();
        patch.apply(&mut attrs);
        self.color = attrs.color;
        self.thickness = attrs.thickness;
        self.section = attrs.section;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thickness_only_accepts_fixed_set() {
        assert_eq!(Thickness::try_from(30), Ok(Thickness::Mm30));
        assert!(Thickness::try_from(25).is_err());
        assert_eq!(u32::from(Thickness::Mm50), 50);
    }

    #[test]
    fn test_section_parse() {
        assert_eq!("half-vertical".parse(), Ok(Section::HalfVertical));
        assert!("quarter".parse::<Section>().is_err());
        assert_eq!(Section::default(), Section::Whole);
    }

    #[test]
    fn test_patch_touches_only_given_fields() {
        let mut attrs = ToolAttrs::new("red").with_thickness(Some(Thickness::Mm20));
        MarkPatch::section(Section::HalfHorizontal).apply(&mut attrs);
        assert_eq!(attrs.color.as_str(), "red");
        assert_eq!(attrs.thickness, Some(Thickness::Mm20));
        assert_eq!(attrs.section, Section::HalfHorizontal);

        MarkPatch::thickness(None).apply(&mut attrs);
        assert_eq!(attrs.thickness, None);
    }
}
