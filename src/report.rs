//! Grouped mark counts and their CSV serialization.
//!
//! Rows follow the color registry order. Within one color the thickness
//! groups are ordered 20, 30, 40, 50 and then unspecified. Groups without
//! marks are left out, as are marks whose color is not registered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::{ColorKey, ColorRegistry};
use crate::error::Result;
use crate::mark::{Mark, Section, Thickness};

pub const SECTIONS_HEADER: [&str; 7] = [
    "No",
    "Color Label",
    "Thickness (mm)",
    "Whole",
    "0.5 Vertical",
    "0.5 Horizontal",
    "Sum",
];

pub const COUNTS_HEADER: [&str; 3] = ["No", "Label", "Count"];

/// Which column layout to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportLayout {
    /// Per (color, thickness) group with section buckets and a sum.
    #[default]
    Sections,
    /// Flat count per color.
    Counts,
}

/// How fields are written out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportQuoting {
    /// Fields joined with `,` and no escaping at all. A label containing a
    /// comma or newline produces a malformed row. Kept for compatibility with
    /// reports exported by earlier versions.
    Raw,
    /// Fields quoted where needed.
    #[default]
    Rfc4180,
}

/// Section counts for one (color, thickness) group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionCounts {
    pub whole: u32,
    pub half_vertical: u32,
    pub half_horizontal: u32,
}

impl SectionCounts {
    fn record(&mut self, section: Section) {
        match section {
            Section::Whole => self.whole += 1,
            Section::HalfVertical => self.half_vertical += 1,
            Section::HalfHorizontal => self.half_horizontal += 1,
        }
    }

    /// Whole units: two halves of the same orientation make one whole, and a
    /// leftover half rounds up. Vertical and horizontal halves never combine.
    pub fn sum(&self) -> u32 {
        self.whole + self.half_vertical.div_ceil(2) + self.half_horizontal.div_ceil(2)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionRow {
    pub index: usize,
    pub color_label: String,
    pub thickness: Option<Thickness>,
    pub counts: SectionCounts,
}

impl SectionRow {
    pub fn sum(&self) -> u32 {
        self.counts.sum()
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.color_label.clone(),
            self.thickness.map(|t| t.to_string()).unwrap_or_default(),
            self.counts.whole.to_string(),
            self.counts.half_vertical.to_string(),
            self.counts.half_horizontal.to_string(),
            self.sum().to_string(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountRow {
    pub index: usize,
    pub label: String,
    pub count: u32,
}

impl CountRow {
    fn fields(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.label.clone(),
            self.count.to_string(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Report {
    Sections(Vec<SectionRow>),
    Counts(Vec<CountRow>),
}

impl Report {
    pub fn build<'a>(
        layout: ReportLayout,
        marks: impl IntoIterator<Item = &'a Mark>,
        registry: &ColorRegistry,
    ) -> Self {
        match layout {
            ReportLayout::Sections => Report::Sections(section_rows(marks, registry)),
            ReportLayout::Counts => Report::Counts(count_rows(marks, registry)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Report::Sections(rows) => rows.is_empty(),
            Report::Counts(rows) => rows.is_empty(),
        }
    }

    fn records(&self) -> (&'static [&'static str], Vec<Vec<String>>) {
        match self {
            Report::Sections(rows) => (
                &SECTIONS_HEADER[..],
                rows.iter().map(SectionRow::fields).collect(),
            ),
            Report::Counts(rows) => (&COUNTS_HEADER[..], rows.iter().map(CountRow::fields).collect()),
        }
    }

    /// Serialize with a header row; every row ends with `\n`.
    pub fn to_csv(&self, quoting: ReportQuoting) -> Result<String> {
        let (header, records) = self.records();
        match quoting {
            ReportQuoting::Raw => {
                let mut out = header.join(",");
                out.push('\n');
                for record in &records {
                    out.push_str(&record.join(","));
                    out.push('\n');
                }
                Ok(out)
            }
            ReportQuoting::Rfc4180 => {
                let mut writer = csv::WriterBuilder::new()
                    .terminator(csv::Terminator::Any(b'\n'))
                    .from_writer(Vec::new());
                writer.write_record(header)?;
                for record in &records {
                    writer.write_record(record)?;
                }
                let bytes = writer.into_inner().map_err(|e| e.into_error())?;
                Ok(String::from_utf8(bytes)?)
            }
        }
    }
}

fn section_rows<'a>(
    marks: impl IntoIterator<Item = &'a Mark>,
    registry: &ColorRegistry,
) -> Vec<SectionRow> {
    let mut groups: HashMap<(&ColorKey, Option<Thickness>), SectionCounts> = HashMap::new();
    for mark in marks {
        groups
            .entry((&mark.color, mark.thickness))
            .or_default()
            .record(mark.section);
    }

    let thickness_order = Thickness::ALL.into_iter().map(Some).chain([None]);
    let mut rows = Vec::new();
    for color in registry.iter() {
        for thickness in thickness_order.clone() {
            let Some(counts) = groups.get(&(color.key(), thickness)) else {
                continue;
            };
            rows.push(SectionRow {
                index: rows.len() + 1,
                color_label: color.label.clone(),
                thickness,
                counts: *counts,
            });
        }
    }
    rows
}

fn count_rows<'a>(
    marks: impl IntoIterator<Item = &'a Mark>,
    registry: &ColorRegistry,
) -> Vec<CountRow> {
    let mut counts: HashMap<&ColorKey, u32> = HashMap::new();
    for mark in marks {
        *counts.entry(&mark.color).or_default() += 1;
    }

    let mut rows = Vec::new();
    for color in registry.iter() {
        let Some(&count) = counts.get(color.key()) else {
            continue;
        };
        rows.push(CountRow {
            index: rows.len() + 1,
            label: color.label.clone(),
            count,
        });
    }
    rows
}
