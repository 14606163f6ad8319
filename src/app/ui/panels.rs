use std::path::Path;

use eframe::egui::{self, Align, Align2, Color32, Context, Layout, Ui, vec2};

use crate::analysis::ModuleGraph;
use crate::app::drilldown::{PanelSet, PanelSlot};
use crate::app::engine::GraphEngine;
use crate::app::engine::input::{LayoutKind, SceneInput};
use crate::app::engine::layout::MAIN_ITERATIONS;
use crate::app::engine::view::ViewMode;
use crate::app::filter::{FilterConfig, compute_visibility};
use crate::app::{Toast, Workspace};

const TOAST_SECONDS: f64 = 2.5;

impl Workspace {
    pub(in crate::app) fn new(graph: ModuleGraph) -> Self {
        let mut workspace = Self {
            graph,
            filter: FilterConfig::default(),
            engine: GraphEngine::new(
                ViewMode::Planar,
                LayoutKind::Force {
                    iterations: MAIN_ITERATIONS,
                },
            ),
            drilldown: None,
            pending_refocus: None,
            toast: None,
            search: String::new(),
            show_method_sidebar: true,
            graph_dirty: true,
            visible_node_count: 0,
            visible_edge_count: 0,
            last_inspected: None,
        };
        workspace.rebuild_visible_graph();
        workspace
    }

    /// Re-applies the filter and hands the visible slice to the engine. The
    /// previous scene generation is released inside `set_input`.
    fn rebuild_visible_graph(&mut self) {
        let visible = compute_visibility(&self.graph, &self.filter);
        self.engine
            .set_input(SceneInput::from_graph(&self.graph, &visible));
        self.visible_node_count = self.engine.node_count();
        self.visible_edge_count = self.engine.edge_count();
        self.graph_dirty = false;
    }

    pub(in crate::app) fn show_toast(&mut self, now: f64, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            expires_at: now + TOAST_SECONDS,
        });
    }

    fn open_drilldown(&mut self, now: f64, target: &str) {
        match PanelSet::build(&self.graph, target) {
            Ok(set) => self.drilldown = Some(set),
            Err(error) => self.show_toast(now, error.to_string()),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        artifact_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let now = ctx.input(|i| i.time);

        if let Some(target) = self.pending_refocus.take() {
            self.open_drilldown(now, &target);
        }
        if self.graph_dirty {
            self.rebuild_visible_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("depscope");
                    ui.separator();
                    ui.label(format!("artifact: {}", artifact_path.display()));
                    ui.label(format!("modules: {}", self.graph.node_count()));
                    ui.label(format!("imports: {}", self.graph.edge_count()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload artifact"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} modules, {} imports",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        if self.drilldown.is_some() {
            self.show_drilldown(ctx, now);
        } else {
            self.show_main(ctx, now);
        }

        self.show_toast_overlay(ctx, now);
    }

    fn show_main(&mut self, ctx: &Context, now: f64) {
        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let output = self.engine.draw(ui);
            if let Some(index) = output.hovered {
                let id = &self.engine.scene().nodes[index].id;
                if self.last_inspected.as_deref() != Some(id.as_str()) {
                    self.last_inspected = Some(id.clone());
                }
            }
            if let Some(clicked) = output.clicked {
                match clicked.module_id {
                    Some(id) if clicked.is_library => {
                        self.show_toast(now, format!("{id} is an external package"));
                    }
                    Some(id) => self.pending_refocus = Some(id),
                    None => {}
                }
            }
        });
    }

    fn show_drilldown(&mut self, ctx: &Context, now: f64) {
        let Some(focus_id) = self.drilldown.as_ref().map(|set| set.focus_id.clone()) else {
            return;
        };
        let focus_label = self
            .drilldown
            .as_ref()
            .map(|set| set.focus_label.clone())
            .unwrap_or_default();

        let mut back = false;
        egui::TopBottomPanel::top("drill_header")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("< Back to graph").clicked() {
                        back = true;
                    }
                    ui.separator();
                    ui.heading(&focus_label);
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.checkbox(&mut self.show_method_sidebar, "Method details");
                    });
                });
            });

        if self.show_method_sidebar {
            egui::SidePanel::right("method_details")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| self.draw_method_sidebar(ui, &focus_id));
        }

        let mut refocus = None;
        let mut toast = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(set) = self.drilldown.as_mut() else {
                return;
            };
            ui.columns(3, |columns| {
                panel_column(&mut columns[0], "Imports", &mut set.imports, &mut refocus, &mut toast);
                panel_column(&mut columns[1], "Methods", &mut set.methods, &mut refocus, &mut toast);
                panel_column(
                    &mut columns[2],
                    "Importers",
                    &mut set.importers,
                    &mut refocus,
                    &mut toast,
                );
            });
        });

        if let Some(text) = toast {
            self.show_toast(now, text);
        }
        if let Some(target) = refocus {
            self.pending_refocus = Some(target);
        }
        if back {
            self.drilldown = None;
        }
    }

    fn show_toast_overlay(&mut self, ctx: &Context, now: f64) {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| now >= toast.expires_at)
        {
            self.toast = None;
        }
        let Some(toast) = &self.toast else {
            return;
        };

        egui::Area::new(egui::Id::new("status_toast"))
            .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -28.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(toast.text.as_str());
                });
            });
        ctx.request_repaint_after(std::time::Duration::from_millis(200));
    }
}

/// One drill-down column: a title row with the per-panel view toggle, then
/// the panel body. Clicks bubble out through `refocus`/`toast` so panel
/// rebuilding happens between frames, not mid-draw.
fn panel_column(
    ui: &mut Ui,
    title: &str,
    slot: &mut PanelSlot,
    refocus: &mut Option<String>,
    toast: &mut Option<String>,
) {
    ui.horizontal(|ui| {
        ui.strong(title);
        if let Some(engine) = slot.engine_mut() {
            for mode in [ViewMode::Planar, ViewMode::Volumetric] {
                if ui
                    .selectable_label(engine.view_mode() == mode, mode.label())
                    .clicked()
                {
                    engine.set_view_mode(mode);
                }
            }
        }
    });
    ui.separator();

    match slot {
        PanelSlot::Empty(message) => {
            ui.add_space(24.0);
            ui.weak(*message);
        }
        PanelSlot::Failed(message) => {
            ui.add_space(24.0);
            ui.colored_label(Color32::LIGHT_RED, message.as_str());
        }
        PanelSlot::Engine(engine) => {
            let output = engine.draw(ui);
            if let Some(clicked) = output.clicked {
                if !clicked.pinned {
                    match clicked.module_id {
                        Some(id) if clicked.is_library => {
                            *toast = Some(format!("{id} is an external package"));
                        }
                        Some(id) => *refocus = Some(id),
                        None => {}
                    }
                }
            }
        }
    }
}
