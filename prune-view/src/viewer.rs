//! Interactive 3D tree-pruning viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Session`] (tree, prune
//! set, view, debris) plus the camera and UI state, and implements
//! [`eframe::App`] to draw the tree and route clicks into prune actions.

use crate::camera::OrbitCamera;
use crate::render::SceneRenderer;
use eframe::App;
use prune_core::{
    codec::TreeState,
    picker::Ray,
    config::{Config, ViewStyle},
    prune::{PruneOutcome, PruneSet},
    session::Session,
    template::{NormalizeInfo, SegmentTemplate},
    types::Seed,
};
use rand::Rng;
use std::path::Path;

/// Upper bound for a single debris step, so a stalled frame does not
/// teleport falling fragments.
const MAX_FRAME_DT: f32 = 0.1;

const TITLE: &str = "Prunable Tree";

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The tree core: a [`Session`] holding the tree, prune set and debris.
/// - UI state (camera, text fields, template options).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. On click, prune the node highlighted at the end of the last frame.
/// 2. Orbit/zoom the camera from drag and scroll input.
/// 3. Cast the pointer ray and update the highlight.
/// 4. Advance falling debris by the frame time.
/// 5. Paint the tree and the debris.
///
/// ### Fields
/// - `session` - Tree, prune set, view and debris.
/// - `camera` - Orbit camera used for drawing and picking.
///
/// - `seed_text` - Contents of the seed input field.
/// - `state_text` - Contents of the compact state input field.
/// - `load_path` - File the "Load" button reads from.
/// - `notice` - Last user-facing message (errors, saved file names).
/// - `shown_state` - State string currently shown in the window title.
///
/// - `use_template` - Whether solid segments use the tapered template.
/// - `template_sides` / `template_top_ratio` - Shape of that template.
/// - `template_info` - How the template mesh was normalized, for display.
pub struct Viewer {
    session: Session,
    camera: OrbitCamera,

    seed_text: String,
    state_text: String,
    load_path: String,
    notice: Option<String>,
    shown_state: String,

    use_template: bool,
    template_sides: u32,
    template_top_ratio: f32,
    template_info: Option<NormalizeInfo>,
}

impl Viewer {
    /// Creates a viewer showing `initial`.
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`] ready to be passed to `eframe::run_native`.
    pub fn new(initial: TreeState) -> Self {
        let mut session = Session::new(Config::default());
        session.load_state(&initial);
        let seed_text = session.seed().to_string();
        let load_path = session.file_name();

        Self {
            session,
            camera: OrbitCamera::default(),
            seed_text,
            state_text: String::new(),
            load_path,
            notice: None,
            shown_state: String::new(),
            use_template: false,
            template_sides: 8,
            template_top_ratio: 0.6,
            template_info: None,
        }
    }

    fn generate_from_seed_text(&mut self) {
        if self.session.generate_from_text(&self.seed_text) {
            self.notice = None;
            self.load_path = self.session.file_name();
        } else {
            self.notice = Some(format!("\"{}\" is not a valid seed", self.seed_text.trim()));
        }
    }

    fn generate_random(&mut self) {
        let seed: Seed = rand::rng().random_range(0..100_000);
        self.session.generate(seed, PruneSet::new());
        self.seed_text = seed.to_string();
        self.load_path = self.session.file_name();
        self.notice = None;
    }

    /// Applies a compact `"<seed>_p<ids>"` state typed by the user.
    fn apply_state_text(&mut self) {
        self.session.load_state_string(&self.state_text);
        self.seed_text = self.session.seed().to_string();
        self.notice = Some(format!(
            "restored seed {} with {} pruned",
            self.session.seed(),
            self.session.pruned().len()
        ));
    }

    fn save(&mut self) {
        let name = self.session.file_name();
        self.notice = Some(match self.session.save_to(Path::new(&name)) {
            Ok(()) => format!("saved {name}"),
            Err(e) => {
                log::warn!("saving {name} failed: {e}");
                format!("save failed: {e}")
            }
        });
    }

    fn load(&mut self) {
        let path = self.load_path.trim().to_owned();
        self.notice = Some(match self.session.load_from(Path::new(&path)) {
            Ok(()) => {
                self.seed_text = self.session.seed().to_string();
                format!("loaded {path}")
            }
            Err(e) => {
                log::warn!("loading {path} failed: {e}");
                format!("load failed: {e}")
            }
        });
    }

    /// Rebuilds (or removes) the tapered segment template from the current options.
    fn refresh_template(&mut self) {
        if !self.use_template {
            self.template_info = None;
            self.session.set_template(None);
            return;
        }
        match SegmentTemplate::tapered(self.template_sides, self.template_top_ratio) {
            Ok((template, info)) => {
                self.template_info = Some(info);
                self.session.set_template(Some(template));
            }
            Err(e) => {
                log::warn!("template rejected: {e}");
                self.notice = Some(format!("template rejected: {e}"));
                self.use_template = false;
                self.template_info = None;
                self.session.set_template(None);
            }
        }
    }

    fn on_click(&mut self) {
        match self.session.prune_highlighted() {
            Some(PruneOutcome::Pruned { added }) => {
                log::info!("pruned {added} nodes");
                self.notice = None;
            }
            Some(PruneOutcome::ProtectedBase) => {
                self.notice = Some("the trunk base cannot be pruned".to_owned());
            }
            Some(PruneOutcome::UnknownNode) | None => {}
        }
    }

    /// Advances the tree by one frame.
    ///
    /// A click acts on the highlight left by the previous frame, so the
    /// prune (and its rebuild) lands before this frame's picking and
    /// debris step.
    fn step_frame(&mut self, clicked: bool, ray: Option<Ray>, dt: f32) {
        if clicked {
            self.on_click();
        }
        self.session.update_highlight(ray.as_ref());
        self.session.tick(dt);
    }

    /// Returns the new window title when the state string changed since
    /// the last call.
    fn sync_title(&mut self) -> Option<String> {
        let state = self.session.state_string();
        if state == self.shown_state {
            return None;
        }
        let title = format!("{TITLE} - {state}");
        self.shown_state = state;
        Some(title)
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    /// Builds the top panel UI (seed, state sharing, persistence, style).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Seed:");
                let seed_edit =
                    ui.add(egui::TextEdit::singleline(&mut self.seed_text).desired_width(80.0));
                let entered =
                    seed_edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Generate").clicked() || entered {
                    self.generate_from_seed_text();
                }
                if ui.button("🎲 Random").clicked() {
                    self.generate_random();
                }

                ui.separator();
                if ui.button("Copy state").clicked() {
                    ctx.copy_text(self.session.state_string());
                    self.notice = Some("state copied".to_owned());
                }
                ui.add(
                    egui::TextEdit::singleline(&mut self.state_text)
                        .hint_text("12345_p4,9")
                        .desired_width(120.0),
                );
                if ui.button("Apply").clicked() {
                    self.apply_state_text();
                }

                ui.separator();
                if ui.button("Save").clicked() {
                    self.save();
                }
                ui.add(egui::TextEdit::singleline(&mut self.load_path).desired_width(160.0));
                if ui.button("Load").clicked() {
                    self.load();
                }

                ui.separator();
                let mut skeleton = self.session.cfg.style == ViewStyle::Skeleton;
                if ui.checkbox(&mut skeleton, "Skeleton").changed() {
                    self.session.set_style(if skeleton {
                        ViewStyle::Skeleton
                    } else {
                        ViewStyle::Solid
                    });
                }
            });
        });
    }

    /// Builds the bottom status bar (seed, prune count, scene size, debris).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("state = {}", self.session.state_string()));
                ui.separator();
                ui.label(format!("debris = {}", self.session.debris().len()));
                ui.label(format!(
                    "primitives = {}",
                    self.session.view().primitive_count()
                ));
                ui.label(format!("ids = {}", self.session.tree().id_count()));
                ui.separator();
                ui.label(format!("pruned = {}", self.session.pruned().len()));
                ui.label(format!("seed = {}", self.session.seed()));
                if let Some(notice) = &self.notice {
                    ui.separator();
                    ui.label(notice);
                }
            });
        });
    }

    /// Builds the right-hand panel for debris physics and the segment template.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Debris");
                let cfg = &mut self.session.cfg;
                Self::labeled_drag_f32(ui, "gravity:", &mut cfg.gravity, 0.0..=50.0, 0.1);
                Self::labeled_drag_f32(ui, "floor_y:", &mut cfg.floor_y, -100.0..=0.0, 0.5);
                Self::labeled_drag_f32(
                    ui,
                    "linear spread:",
                    &mut cfg.debris_linear_spread,
                    0.0..=10.0,
                    0.05,
                );
                Self::labeled_drag_f32(
                    ui,
                    "upward speed:",
                    &mut cfg.debris_upward_speed,
                    0.0..=10.0,
                    0.05,
                );
                Self::labeled_drag_f32(
                    ui,
                    "angular spread:",
                    &mut cfg.debris_angular_spread,
                    0.0..=20.0,
                    0.1,
                );

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    let style = self.session.cfg.style;
                    self.session.cfg = Config {
                        style,
                        ..Config::default()
                    };
                }

                ui.separator();
                ui.label("Segment template");
                let mut changed = ui
                    .checkbox(&mut self.use_template, "Tapered segments")
                    .changed();
                ui.add_enabled_ui(self.use_template, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("sides:");
                        changed |= ui
                            .add(egui::DragValue::new(&mut self.template_sides).range(3..=32))
                            .changed();
                    });
                    changed |= Self::labeled_drag_f32(
                        ui,
                        "top ratio:",
                        &mut self.template_top_ratio,
                        0.05..=1.0,
                        0.01,
                    );
                });
                if changed {
                    self.refresh_template();
                }

                if let Some(info) = &self.template_info {
                    let d = info.original_dims;
                    ui.label(format!("source dims: {:.2} x {:.2} x {:.2}", d.x, d.y, d.z));
                    ui.label(format!("scale: {:.3}", info.scale_factor));
                    ui.label(format!(
                        "pivot: ({:.2}, {:.2}, {:.2})",
                        info.pivot.x, info.pivot.y, info.pivot.z
                    ));
                }
                if self.session.cfg.style == ViewStyle::Skeleton {
                    ui.weak("(templates apply to the solid view)");
                }
            });
    }

    /// Builds the central panel where the tree is drawn and pruned.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let response =
                    ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;
                let painter = ui.painter_at(rect);

                // Orbit with drag.
                if response.dragged() {
                    self.camera.orbit(response.drag_delta());
                }

                // Zoom towards the target.
                if response.hovered() {
                    let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
                    if scroll != 0.0 {
                        self.camera.zoom(scroll);
                    }
                }

                let ray = response
                    .hover_pos()
                    .map(|p| self.camera.screen_to_ray(p, rect));
                let dt = ctx.input(|i| i.stable_dt).min(MAX_FRAME_DT);
                self.step_frame(response.clicked(), ray, dt);

                let mut renderer = SceneRenderer::new(&self.camera, rect);
                renderer.add_graph(self.session.view());
                for body in &self.session.debris().bodies {
                    renderer.add_graph(&body.fragment);
                }
                renderer.finish(&painter);

                ctx.request_repaint();
            });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);

        if let Some(title) = self.sync_title() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn new_viewer_shows_the_initial_state() {
        let viewer = Viewer::new(TreeState {
            seed: 42,
            pruned: BTreeSet::from([5, 9]),
        });
        assert_eq!(viewer.session.seed(), 42);
        assert_eq!(viewer.seed_text, "42");
        assert_eq!(viewer.session.state_string(), "42_p5,9");
        assert_eq!(viewer.load_path, "tree-state-42.json");
        assert!(viewer.notice.is_none());
    }

    #[test]
    fn seed_text_generates_or_reports() {
        let mut viewer = Viewer::new(TreeState::fallback());
        viewer.seed_text = "abc".to_owned();
        viewer.generate_from_seed_text();
        assert_eq!(viewer.session.seed(), 12345);
        assert!(viewer.notice.is_some());

        viewer.seed_text = "31".to_owned();
        viewer.generate_from_seed_text();
        assert_eq!(viewer.session.seed(), 31);
        assert!(viewer.notice.is_none());
    }

    #[test]
    fn random_seed_stays_in_range_and_clears_prunes() {
        let mut viewer = Viewer::new(TreeState {
            seed: 7,
            pruned: BTreeSet::from([4]),
        });
        viewer.generate_random();
        assert!(viewer.session.seed() < 100_000);
        assert!(viewer.session.pruned().is_empty());
        assert_eq!(viewer.seed_text, viewer.session.seed().to_string());
    }

    #[test]
    fn state_text_is_applied_leniently() {
        let mut viewer = Viewer::new(TreeState::fallback());
        viewer.state_text = "88_p4,x,6".to_owned();
        viewer.apply_state_text();
        assert_eq!(viewer.session.state_string(), "88_p4,6");
        assert_eq!(viewer.seed_text, "88");
    }

    #[test]
    fn template_toggle_round_trips() {
        let mut viewer = Viewer::new(TreeState::fallback());
        viewer.use_template = true;
        viewer.refresh_template();
        assert!(viewer.session.template().is_some());
        assert!(viewer.template_info.is_some());

        viewer.use_template = false;
        viewer.refresh_template();
        assert!(viewer.session.template().is_none());
        assert!(viewer.template_info.is_none());
    }

    #[test]
    fn click_prunes_the_previous_frames_highlight() {
        let mut viewer = Viewer::new(TreeState::fallback());
        let upper_trunk = viewer.session.tree().root().segments[1].id;
        let ray = Ray::new(glam::Vec3::new(-0.5, 2.0, 0.0), glam::Vec3::X);

        viewer.step_frame(false, Some(ray), 1.0 / 60.0);
        assert!(viewer.session.highlighted().is_some());
        assert!(viewer.session.pruned().is_empty());

        // The pointer has already left the tree when the click arrives.
        viewer.step_frame(true, None, 1.0 / 60.0);
        assert!(viewer.session.pruned().contains(upper_trunk));
        assert_eq!(viewer.session.debris().len(), 1);
        assert_eq!(viewer.session.highlighted(), None);
    }

    #[test]
    fn title_follows_every_structural_change() {
        let mut viewer = Viewer::new(TreeState::fallback());
        assert_eq!(viewer.sync_title().as_deref(), Some("Prunable Tree - 12345_p"));
        assert_eq!(viewer.sync_title(), None);

        let leaf = viewer
            .session
            .tree()
            .iter()
            .find_map(|(_, b)| b.leaf)
            .unwrap();
        viewer.session.prune_id(leaf.id);
        let expected = format!("Prunable Tree - 12345_p{}", leaf.id);
        assert_eq!(viewer.sync_title(), Some(expected));

        viewer.seed_text = "-5".to_owned();
        viewer.generate_from_seed_text();
        assert_eq!(viewer.sync_title().as_deref(), Some("Prunable Tree - -5_p"));
    }

    #[test]
    fn loading_a_missing_file_reports_and_keeps_tree() {
        let mut viewer = Viewer::new(TreeState::fallback());
        viewer.load_path = "/definitely/not/here.json".to_owned();
        viewer.load();
        assert_eq!(viewer.session.seed(), 12345);
        assert!(viewer.notice.as_deref().unwrap().starts_with("load failed"));
    }
}
