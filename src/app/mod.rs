use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};
use tracing::warn;

use crate::analysis::{ModuleGraph, load_artifact};
use crate::app::drilldown::PanelSet;
use crate::app::engine::GraphEngine;
use crate::app::filter::FilterConfig;

mod drilldown;
mod engine;
mod filter;
mod render_utils;
mod ui;

pub struct DepScopeApp {
    artifact_path: PathBuf,
    state: AppState,
    reload_rx: Option<Receiver<Result<ModuleGraph, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<ModuleGraph, String>>,
    },
    Ready(Box<Workspace>),
    Error(String),
}

/// Short-lived status message shown over the canvas.
struct Toast {
    text: String,
    expires_at: f64,
}

/// Everything the ready application owns: the ingested graph, the filter
/// state, the main engine, and the optional drill-down view stacked on top.
struct Workspace {
    graph: ModuleGraph,
    filter: FilterConfig,
    engine: GraphEngine,
    drilldown: Option<PanelSet>,
    /// Drill-down target picked up at the start of the next frame, so a
    /// click inside a panel never rebuilds the panels it came from mid-draw.
    pending_refocus: Option<String>,
    toast: Option<Toast>,
    search: String,
    show_method_sidebar: bool,
    graph_dirty: bool,
    visible_node_count: usize,
    visible_edge_count: usize,
    /// Last node shown in the details panel; outlives the hover that set it.
    last_inspected: Option<String>,
}

impl DepScopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, artifact_path: PathBuf) -> Self {
        let state = Self::start_load(artifact_path.clone());
        Self {
            artifact_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(artifact_path: PathBuf) -> Receiver<Result<ModuleGraph, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_artifact(&artifact_path).map_err(|error| format!("{error:#}"));
            if tx.send(result).is_err() {
                warn!("artifact load finished after the receiver was dropped");
            }
        });

        rx
    }

    fn start_load(artifact_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(artifact_path),
        }
    }
}

impl eframe::App for DepScopeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(graph) => AppState::Ready(Box::new(Workspace::new(graph))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading dependency graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the analysis artifact");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.artifact_path.clone()));
                    }
                });
            }
            AppState::Ready(workspace) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                workspace.show(ctx, &self.artifact_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.artifact_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            // A fresh graph starts a fresh workspace; any
                            // open drill-down is discarded with it.
                            transition = Some(match result {
                                Ok(graph) => AppState::Ready(Box::new(Workspace::new(graph))),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
