use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use eframe::egui;

use crate::error::Error;
use crate::export::{report_file_name, FileSink};
use crate::image_source::{self, LoadedImage};
use crate::mark::{MarkPatch, Section, Thickness};
use crate::options::Options;
use crate::report::{Report, ReportLayout, ReportQuoting, SECTIONS_HEADER};
use crate::selection::EditorMode;
use crate::session::Session;
use crate::transform::to_screen_space;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 120, 255);

// ── App ─────────────────────────────────────────────────────────────────────

pub struct MarkTallyApp {
    session: Session,
    image_path: Option<PathBuf>,
    texture: Option<egui::TextureHandle>,
    /// Decoded pixels waiting for a GPU upload on the next frame.
    pending_image: Option<LoadedImage>,
    quoting: ReportQuoting,
    options: Options,
    config_path: PathBuf,
    pan: egui::Vec2,
    status: String,
}

impl MarkTallyApp {
    pub fn new(options: Options, config_path: PathBuf, image_path: Option<PathBuf>) -> Self {
        let mut app = Self {
            session: Session::new(&options),
            image_path: None,
            texture: None,
            pending_image: None,
            quoting: options.report_quoting,
            options,
            config_path,
            pan: egui::Vec2::ZERO,
            status: String::new(),
        };
        if let Some(path) = image_path {
            app.open_image(&path);
        }
        app
    }

    fn open_image(&mut self, path: &Path) {
        match image_source::load(path) {
            Ok(loaded) => {
                self.session.set_image(loaded.size);
                self.pending_image = Some(loaded);
                self.texture = None;
                self.pan = egui::Vec2::ZERO;
                self.image_path = Some(path.to_path_buf());
                self.status = format!("Opened {}", path.display());
            }
            Err(e) => self.show_error(e),
        }
    }

    fn pick_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        {
            self.open_image(&path);
        }
    }

    fn export_report(&mut self, layout: ReportLayout) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(report_file_name(self.image_path.as_deref()))
            .add_filter("CSV", &["csv"])
            .save_file()
        else {
            return;
        };
        let mut sink = FileSink::new(path);
        match self.session.export(layout, self.quoting, &mut sink) {
            Ok(()) => self.status = format!("Report saved to {}", sink.path().display()),
            Err(e) => self.show_error(e),
        }
    }

    fn save_settings(&mut self) {
        self.options.remember(self.session.registry(), self.quoting);
        match self.options.save_to_file(&self.config_path) {
            Ok(()) => self.status = format!("Settings saved to {}", self.config_path.display()),
            Err(e) => self.show_error(e),
        }
    }

    fn show_error(&mut self, e: Error) {
        log::error!("{}", e);
        self.status = e.to_string();
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let Some(loaded) = self.pending_image.take() else {
            return;
        };
        let size = [loaded.rgba.width() as usize, loaded.rgba.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, loaded.rgba.as_raw());
        self.texture = Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
    }

    // ── Panels ──────────────────────────────────────────────────────────────

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open…").clicked() {
                self.pick_image();
            }
            ui.separator();

            let mut adding = self.session.mode() == EditorMode::Adding;
            if ui.toggle_value(&mut adding, "Add marks").changed() {
                self.session.set_add_mode(adding);
            }
            ui.separator();

            self.tool_controls(ui);
            ui.separator();

            if ui.button("−").clicked() {
                self.session.zoom_out();
            }
            ui.label(format!("Zoom: {}%", self.session.zoom().percent()));
            if ui.button("+").clicked() {
                self.session.zoom_in();
            }
            ui.separator();

            let has_selection = self.session.selected().is_some();
            if ui
                .add_enabled(has_selection, egui::Button::new("Delete selected"))
                .clicked()
            {
                self.session.delete_selected();
            }
            let has_marks = !self.session.marks().is_empty();
            if ui
                .add_enabled(has_marks, egui::Button::new("Clear all"))
                .clicked()
            {
                self.session.clear_marks();
            }
            ui.separator();

            if ui.button("Export report").clicked() {
                self.export_report(ReportLayout::Sections);
            }
            if ui.button("Export counts").clicked() {
                self.export_report(ReportLayout::Counts);
            }
        });
    }

    /// Color, thickness and section pickers. Changes go to the selected mark
    /// while editing, otherwise to the defaults for new marks.
    fn tool_controls(&mut self, ui: &mut egui::Ui) {
        let current = self.session.tool_attrs().clone();
        let mut patch = MarkPatch::default();

        let mut color = current.color.clone();
        let color_text = self
            .session
            .registry()
            .label(&color)
            .unwrap_or_default()
            .to_string();
        egui::ComboBox::from_id_salt("tool_color")
            .selected_text(color_text)
            .show_ui(ui, |ui| {
                for def in self.session.registry().iter() {
                    ui.selectable_value(&mut color, def.key().clone(), def.label.as_str());
                }
            });
        if color != current.color {
            patch.color = Some(color);
        }

        let mut thickness = current.thickness;
        egui::ComboBox::from_id_salt("tool_thickness")
            .selected_text(thickness_text(thickness))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut thickness, None, thickness_text(None));
                for t in Thickness::ALL {
                    ui.selectable_value(&mut thickness, Some(t), thickness_text(Some(t)));
                }
            });
        if thickness != current.thickness {
            patch.thickness = Some(thickness);
        }

        let mut section = current.section;
        for s in Section::ALL {
            ui.radio_value(&mut section, s, s.label());
        }
        if section != current.section {
            patch.section = Some(section);
        }

        if !patch.is_empty() {
            if let Err(e) = self.session.apply_tool_change(&patch) {
                self.show_error(e);
            }
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Colors");
        for key in self.session.registry().keys() {
            let swatch = self
                .session
                .registry()
                .get(&key)
                .map(|c| c.to_egui())
                .unwrap_or(egui::Color32::GRAY);
            if let Some(label) = self.session.registry_mut().label_mut(&key) {
                ui.horizontal(|ui| {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, swatch);
                    ui.text_edit_singleline(label);
                });
            }
        }

        ui.separator();
        let mut quote = self.quoting == ReportQuoting::Rfc4180;
        if ui.checkbox(&mut quote, "Quote labels in CSV").changed() {
            self.quoting = if quote {
                ReportQuoting::Rfc4180
            } else {
                ReportQuoting::Raw
            };
        }
        if ui
            .button("Save settings")
            .on_hover_text("Keep labels and quoting for the next start")
            .clicked()
        {
            self.save_settings();
        }

        ui.separator();
        ui.heading("Summary");
        let report = self.session.report(ReportLayout::Sections);
        if report.is_empty() {
            ui.weak("No marks yet");
        } else if let Report::Sections(rows) = report {
            egui::Grid::new("summary").striped(true).show(ui, |ui| {
                for title in SECTIONS_HEADER {
                    ui.strong(title);
                }
                ui.end_row();
                for row in &rows {
                    ui.label(row.index.to_string());
                    ui.label(row.color_label.as_str());
                    ui.label(row.thickness.map(|t| t.to_string()).unwrap_or_default());
                    ui.label(row.counts.whole.to_string());
                    ui.label(row.counts.half_vertical.to_string());
                    ui.label(row.counts.half_horizontal.to_string());
                    ui.label(row.sum().to_string());
                    ui.end_row();
                }
            });
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mode = match self.session.mode() {
                EditorMode::Idle => "Idle".to_string(),
                EditorMode::Adding => "Adding".to_string(),
                EditorMode::Editing(id) => format!("Editing {id}"),
            };
            ui.label(mode);
            ui.separator();
            ui.label(format!("{} marks", self.session.marks().len()));
            if !self.status.is_empty() {
                ui.separator();
                ui.label(self.status.as_str());
            }
        });
    }

    // ── Canvas ──────────────────────────────────────────────────────────────

    fn canvas(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

        let origin = canvas_rect.min + self.pan;
        let zoom = self.session.zoom().factor();

        if let (Some(tex), Some(size)) = (&self.texture, self.session.image()) {
            let img_rect = egui::Rect::from_min_size(origin, size.on_screen(zoom));
            painter.image(
                tex.id(),
                img_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        } else {
            painter.text(
                canvas_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open a PNG or JPEG image to start",
                egui::FontId::proportional(18.0),
                egui::Color32::from_gray(160),
            );
        }

        self.draw_marks(&painter, origin);

        // pan with the middle button
        if ctx.input(|i| i.pointer.middle_down()) {
            self.pan += ctx.input(|i| i.pointer.delta());
        }

        if self.session.mode() == EditorMode::Adding && response.hovered() {
            ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            if let Some(pointer) = response.interact_pointer_pos() {
                match self.session.pointer_click(pointer, origin) {
                    Ok(outcome) => log::debug!("Canvas click: {:?}", outcome),
                    Err(e) => self.show_error(e),
                }
            }
        }
    }

    fn draw_marks(&self, painter: &egui::Painter, origin: egui::Pos2) {
        let zoom = self.session.zoom().factor();
        let radius = self.session.mark_radius() * zoom;
        let selected = self.session.selected();

        for mark in self.session.marks().iter() {
            let center = origin + to_screen_space(mark.pos(), zoom).to_vec2();
            let color = self
                .session
                .registry()
                .get(&mark.color)
                .map(|c| c.to_egui())
                .unwrap_or(egui::Color32::GRAY);
            draw_mark(painter, center, radius, color, mark.section);
            if let Some(t) = mark.thickness {
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    t.to_string(),
                    egui::FontId::proportional((radius * 0.8).max(8.0)),
                    egui::Color32::WHITE,
                );
            }
            if selected == Some(mark.id()) {
                painter.circle_stroke(center, radius + 4.0, egui::Stroke::new(2.0, SELECTION_COLOR));
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
                self.session.delete_selected();
            }
            if i.key_pressed(egui::Key::Escape) {
                self.session.cancel();
            }
            if i.modifiers.ctrl && (i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals)) {
                self.session.zoom_in();
            }
            if i.modifiers.ctrl && i.key_pressed(egui::Key::Minus) {
                self.session.zoom_out();
            }
        });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.first() {
            self.open_image(path);
        }
    }
}

fn thickness_text(thickness: Option<Thickness>) -> String {
    match thickness {
        Some(t) => format!("{t} mm"),
        None => "Unspecified".to_string(),
    }
}

fn draw_mark(
    painter: &egui::Painter,
    center: egui::Pos2,
    radius: f32,
    color: egui::Color32,
    section: Section,
) {
    let fill = color.gamma_multiply(0.6);
    match section {
        Section::Whole => {
            painter.circle_filled(center, radius, fill);
        }
        // left half filled
        Section::HalfVertical => {
            painter.add(egui::Shape::convex_polygon(
                half_disk(center, radius, PI / 2.0),
                fill,
                egui::Stroke::NONE,
            ));
        }
        // top half filled
        Section::HalfHorizontal => {
            painter.add(egui::Shape::convex_polygon(
                half_disk(center, radius, PI),
                fill,
                egui::Stroke::NONE,
            ));
        }
    }
    painter.circle_stroke(center, radius, egui::Stroke::new(2.0, color));
}

/// Points of a half disk starting at `start` radians, sweeping clockwise on screen.
fn half_disk(center: egui::Pos2, radius: f32, start: f32) -> Vec<egui::Pos2> {
    const SEGMENTS: usize = 16;
    (0..=SEGMENTS)
        .map(|i| {
            let angle = start + PI * i as f32 / SEGMENTS as f32;
            center + egui::vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for MarkTallyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.ensure_texture(ctx);
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));
        egui::SidePanel::right("colors")
            .default_width(320.0)
            .show(ctx, |ui| self.side_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ctx, ui));
    }
}
