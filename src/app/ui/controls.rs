use std::collections::HashSet;

use eframe::egui::{self, ComboBox, Key, Slider, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::app::Workspace;
use crate::app::engine::ConnectorStyle;
use crate::app::engine::view::ViewMode;
use crate::app::filter::{CategoryFilter, DependencyMode, LibraryFilter};

impl Workspace {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        let now = ui.input(|i| i.time);

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading("View");
            ui.horizontal(|ui| {
                for mode in [ViewMode::Planar, ViewMode::Volumetric] {
                    if ui
                        .selectable_label(self.engine.view_mode() == mode, mode.label())
                        .clicked()
                    {
                        self.engine.set_view_mode(mode);
                    }
                }
                if ui.button("Reset camera").clicked() {
                    self.engine.reset_camera(now);
                }
            });
            ui.checkbox(&mut self.engine.settings.show_labels, "Show labels");
            ui.checkbox(&mut self.engine.settings.directed, "Show direction markers");
            ui.horizontal(|ui| {
                ui.label("Marker:");
                ui.selectable_value(
                    &mut self.engine.settings.connector,
                    ConnectorStyle::Arrow,
                    "Arrow",
                );
                ui.selectable_value(
                    &mut self.engine.settings.connector,
                    ConnectorStyle::Receptor,
                    "Receptor",
                );
            });

            let mut node_scale = self.engine.settings.node_scale;
            if ui
                .add(Slider::new(&mut node_scale, 0.5..=3.0).text("Node scale"))
                .changed()
            {
                self.engine.set_node_scale(node_scale);
            }
            let mut link_opacity = self.engine.settings.link_opacity;
            if ui
                .add(Slider::new(&mut link_opacity, 0.05..=1.0).text("Edge opacity"))
                .changed()
            {
                self.engine.set_link_opacity(link_opacity);
            }

            ui.separator();
            ui.heading("Filters");
            let mut filter_changed = false;

            ui.horizontal(|ui| {
                ui.label("Name contains:");
                filter_changed |= ui
                    .text_edit_singleline(&mut self.filter.name_contains)
                    .changed();
            });

            ComboBox::from_label("Name filter scope")
                .selected_text(self.filter.dependency_mode.label())
                .show_ui(ui, |ui| {
                    for mode in [
                        DependencyMode::None,
                        DependencyMode::Dependencies,
                        DependencyMode::Dependents,
                        DependencyMode::Both,
                    ] {
                        filter_changed |= ui
                            .selectable_value(&mut self.filter.dependency_mode, mode, mode.label())
                            .changed();
                    }
                });

            let category_text = match &self.filter.category {
                CategoryFilter::Any => "All".to_owned(),
                CategoryFilter::Library => "Libraries".to_owned(),
                CategoryFilter::Extension(ext) => ext.clone(),
            };
            let file_types = self.graph.file_types.clone();
            ComboBox::from_label("Category")
                .selected_text(category_text)
                .show_ui(ui, |ui| {
                    filter_changed |= ui
                        .selectable_value(&mut self.filter.category, CategoryFilter::Any, "All")
                        .changed();
                    filter_changed |= ui
                        .selectable_value(
                            &mut self.filter.category,
                            CategoryFilter::Library,
                            "Libraries",
                        )
                        .changed();
                    for ext in &file_types {
                        filter_changed |= ui
                            .selectable_value(
                                &mut self.filter.category,
                                CategoryFilter::Extension(ext.clone()),
                                ext,
                            )
                            .changed();
                    }
                });

            let library_text = match &self.filter.library {
                LibraryFilter::Any => "All".to_owned(),
                LibraryFilter::Package(package) => package.clone(),
            };
            let libraries = self.graph.libraries.clone();
            ComboBox::from_label("Library")
                .selected_text(library_text)
                .show_ui(ui, |ui| {
                    filter_changed |= ui
                        .selectable_value(&mut self.filter.library, LibraryFilter::Any, "All")
                        .changed();
                    for package in &libraries {
                        filter_changed |= ui
                            .selectable_value(
                                &mut self.filter.library,
                                LibraryFilter::Package(package.clone()),
                                package,
                            )
                            .changed();
                    }
                });

            let mut min_connections = self.filter.min_connections;
            if ui
                .add(Slider::new(&mut min_connections, 0..=25).text("Min connections"))
                .changed()
            {
                self.filter.min_connections = min_connections;
                filter_changed = true;
            }

            if filter_changed {
                self.graph_dirty = true;
            }

            ui.separator();
            ui.heading("Search");
            ui.horizontal(|ui| {
                let response = ui.text_edit_singleline(&mut self.search);
                if response.changed() {
                    if self.search.is_empty() {
                        self.engine.clear_search();
                    } else {
                        let matches = self.search_matches();
                        self.engine.set_search(matches);
                    }
                }

                let jump = ui.button("Jump").clicked()
                    || (response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)));
                if jump {
                    if let Some(best) = self.best_search_match() {
                        self.engine.center_on(&best, now);
                    }
                }
            });
            if !self.search.is_empty() {
                ui.weak(format!("{} matches", self.search_matches().len()));
            }
        });
    }

    /// Membership is a plain case-insensitive substring test on name or
    /// path; fuzzy scoring only decides which match the camera jumps to.
    fn search_matches(&self) -> HashSet<String> {
        let needle = self.search.to_lowercase();
        self.graph
            .nodes
            .iter()
            .filter(|node| {
                node.name.to_lowercase().contains(&needle)
                    || node.path.to_lowercase().contains(&needle)
            })
            .map(|node| node.id.clone())
            .collect()
    }

    fn best_search_match(&self) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        let needle = self.search.to_lowercase();

        let mut best: Option<(i64, &str)> = None;
        let mut first: Option<&str> = None;
        for node in &self.graph.nodes {
            if !node.name.to_lowercase().contains(&needle)
                && !node.path.to_lowercase().contains(&needle)
            {
                continue;
            }
            first.get_or_insert(node.id.as_str());
            if let Some(score) = matcher.fuzzy_match(&node.name, &self.search) {
                if best.is_none_or(|(top, _)| score > top) {
                    best = Some((score, node.id.as_str()));
                }
            }
        }

        best.map(|(_, id)| id.to_owned())
            .or_else(|| first.map(str::to_owned))
    }
}
