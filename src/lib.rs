//! Place typed markers on an image and export grouped counts.
//!
//! The core (transform, marks, selection, report) has no UI dependency beyond
//! egui's geometry types; the eframe front end lives in [`app`].

pub mod app;
pub mod color;
pub mod error;
pub mod export;
pub mod image_source;
pub mod mark;
pub mod options;
pub mod report;
pub mod selection;
pub mod session;
pub mod store;
pub mod transform;

pub use color::{ColorDefinition, ColorKey, ColorRegistry};
pub use error::{Error, Result, SinkError};
pub use export::{FileSink, MemorySink, ReportSink};
pub use mark::{Mark, MarkId, MarkPatch, Section, Thickness, ToolAttrs};
pub use options::Options;
pub use report::{Report, ReportLayout, ReportQuoting};
pub use selection::{EditorMode, SelectionController, ToolTarget};
pub use session::{ClickOutcome, Session};
pub use store::MarkStore;
pub use transform::{to_image_space, to_screen_space, ImageSize, Zoom};
