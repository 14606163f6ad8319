use eframe::egui::{self, RichText, Ui};

use crate::analysis::{CallKind, MethodRecord};
use crate::app::Workspace;
use crate::util::format_bytes;

impl Workspace {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Module details");
        ui.separator();

        let inspected = self
            .engine
            .hovered_id()
            .map(str::to_owned)
            .or_else(|| self.last_inspected.clone());
        let Some(id) = inspected else {
            ui.weak("Hover a node to inspect it.");
            return;
        };
        let Some(index) = self.graph.index_of(&id) else {
            ui.weak("Hover a node to inspect it.");
            return;
        };

        let node = &self.graph.nodes[index];
        ui.strong(&node.name);
        ui.label(RichText::new(&node.path).monospace().small());
        ui.add_space(4.0);

        egui::Grid::new("module_facts").num_columns(2).show(ui, |ui| {
            ui.label("Category");
            ui.label(node.category.label());
            ui.end_row();
            ui.label("Size");
            ui.label(format_bytes(node.size));
            ui.end_row();
            ui.label("Imports");
            ui.label(self.graph.dependency_count(index).to_string());
            ui.end_row();
            ui.label("Imported by");
            ui.label(self.graph.dependent_count(index).to_string());
            ui.end_row();
        });

        let is_library = node.category.is_library();
        ui.add_space(6.0);
        if !is_library && ui.button("Open drill-down").clicked() {
            self.pending_refocus = Some(id.clone());
        }

        let now = ui.input(|i| i.time);
        let imports = self.neighbor_names(&self.graph.out_edges[index]);
        let importers = self.neighbor_names(&self.graph.in_edges[index]);

        egui::ScrollArea::vertical().show(ui, |ui| {
            self.neighbor_list(ui, now, "Imports", &imports);
            self.neighbor_list(ui, now, "Imported by", &importers);
        });
    }

    fn neighbor_names(&self, neighbors: &[usize]) -> Vec<(String, String)> {
        let mut entries = neighbors
            .iter()
            .map(|&index| {
                let node = &self.graph.nodes[index];
                (node.id.clone(), node.name.clone())
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }

    fn neighbor_list(&mut self, ui: &mut Ui, now: f64, title: &str, entries: &[(String, String)]) {
        egui::CollapsingHeader::new(format!("{title} ({})", entries.len()))
            .default_open(entries.len() <= 12)
            .show(ui, |ui| {
                if entries.is_empty() {
                    ui.weak("none");
                }
                for (id, name) in entries {
                    if ui.link(name).clicked() {
                        // A hidden neighbour is a no-op jump; the inspected
                        // module still switches.
                        self.engine.center_on(id, now);
                        self.last_inspected = Some(id.clone());
                    }
                }
            });
    }

    /// Method metadata for the drill-down focus: signatures, spans, and the
    /// calls each method makes.
    pub(in crate::app) fn draw_method_sidebar(&self, ui: &mut Ui, focus_id: &str) {
        ui.heading("Methods");
        ui.separator();

        let methods = self.graph.methods_for(focus_id);
        if methods.is_empty() {
            ui.weak("No method data recorded.");
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (index, method) in methods.iter().enumerate() {
                egui::CollapsingHeader::new(method_signature(method))
                    .id_salt((index, &method.name))
                    .show(ui, |ui| {
                        ui.label(format!("kind: {}", method.kind.label()));
                        if let Some(class) = &method.class {
                            ui.label(format!("class: {class}"));
                        }
                        if let Some(span) = &method.loc {
                            ui.label(format!(
                                "span {}:{} - {}:{}",
                                span.start_line, span.start_col, span.end_line, span.end_col
                            ));
                        }

                        let calls = self
                            .graph
                            .calls_for(focus_id)
                            .and_then(|by_method| by_method.get(&method.name));
                        if let Some(calls) = calls {
                            ui.add_space(4.0);
                            ui.strong("Calls");
                            for call in calls {
                                let text = match (call.kind, &call.module) {
                                    (CallKind::Imported, Some(module)) => {
                                        format!("{} (from {module})", call.name)
                                    }
                                    (CallKind::Imported, None) => format!("{} (imported)", call.name),
                                    (CallKind::Local, _) => call.name.clone(),
                                };
                                ui.label(RichText::new(text).monospace().small());
                            }
                        }
                    });
            }
        });
    }
}

fn method_signature(method: &MethodRecord) -> String {
    let params = method
        .params
        .iter()
        .map(|param| {
            let mut rendered = String::new();
            if param.rest {
                rendered.push_str("...");
            }
            rendered.push_str(&param.name);
            if let Some(ty) = &param.ty {
                rendered.push_str(": ");
                rendered.push_str(ty);
            }
            if let Some(default_value) = &param.default_value {
                rendered.push_str(" = ");
                rendered.push_str(default_value);
            }
            rendered
        })
        .collect::<Vec<_>>()
        .join(", ");

    match &method.class {
        Some(class) => format!("{class}.{}({params})", method.name),
        None => format!("{}({params})", method.name),
    }
}
