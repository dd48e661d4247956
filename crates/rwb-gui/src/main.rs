use chrono::Local;
use eframe::{App, egui};
use log::warn;
use rwb_core::backups;
use rwb_core::{BackupError, Catalog, ConfigStore, Scenario};
use std::path::PathBuf;

/// Destructive actions waiting for the user to confirm.
#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Restore(String),
    Delete(String),
}

#[derive(Default)]
struct State {
    root_dir: Option<PathBuf>,
    language: String,
    catalog: Catalog,
    search: String,
    // (route id, scenario id)
    selected: Option<(String, String)>,
    backups: Vec<String>,
    selected_backup: Option<String>,
    confirm: Option<Pending>,
    status: String,
}

impl State {
    fn selected_scenario(&self) -> Option<&Scenario> {
        let (route, scenario) = self.selected.as_ref()?;
        self.catalog.scenario(route, scenario)
    }
    fn clear_selection(&mut self) {
        self.selected = None;
        self.backups.clear();
        self.selected_backup = None;
        self.confirm = None;
    }
}

struct AppGui {
    state: State,
    store: ConfigStore,
}

impl AppGui {
    fn new(_cc: &eframe::CreationContext<'_>, store: ConfigStore) -> Self {
        let mut app = Self {
            state: State {
                root_dir: store.installation_path().map(|p| p.to_path_buf()),
                language: store.language().to_string(),
                ..Default::default()
            },
            store,
        };
        if app.state.root_dir.is_none() {
            app.detect_root();
        } else {
            app.rescan();
        }
        app
    }
    fn set_root(&mut self, dir: PathBuf) {
        if let Err(e) = self.store.set_installation_path(&dir) {
            warn!("cannot save settings: {}", e);
        }
        self.state.root_dir = Some(dir);
        self.rescan();
    }
    fn pick_root_dir(&mut self) {
        let start = self.state.root_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        if let Some(dir) = rfd::FileDialog::new().set_directory(start).pick_folder() {
            self.set_root(dir);
        }
    }
    fn detect_root(&mut self) {
        match rwb_core::detect_installation() {
            Some(dir) => self.set_root(dir),
            None => self.state.status = "RailWorks not found; choose the folder manually".into(),
        }
    }
    fn rescan(&mut self) {
        let Some(root) = self.state.root_dir.clone() else {
            self.state.status = "Set the RailWorks installation folder first".into();
            return;
        };
        match rwb_core::scan_catalog(&root, &self.state.language) {
            Ok(catalog) => {
                self.state.status = format!(
                    "Found {} route(s), {} scenario(s)",
                    catalog.routes.len(),
                    catalog.scenario_count()
                );
                self.state.catalog = catalog;
                if let Err(e) = self.store.mark_scanned(Local::now()) {
                    warn!("cannot save settings: {}", e);
                }
            }
            Err(e) => {
                self.state.catalog = Catalog::default();
                self.state.status = format!("Scan failed: {}", e);
            }
        }
        // The old selection may not exist in the new snapshot.
        if self.state.selected_scenario().is_none() {
            self.state.clear_selection();
        } else {
            self.refresh_backups();
        }
    }
    fn apply_language(&mut self) {
        let tag = self.state.language.trim().to_string();
        if let Err(e) = self.store.set_language(&tag) {
            warn!("cannot save settings: {}", e);
        }
        self.state.language = tag;
        self.rescan();
    }
    fn select(&mut self, route: String, scenario: String) {
        self.state.clear_selection();
        self.state.selected = Some((route, scenario));
        self.refresh_backups();
    }
    fn refresh_backups(&mut self) {
        self.state.backups = self
            .state
            .selected_scenario()
            .map(|s| backups::list_backups(&s.path))
            .unwrap_or_default();
        if let Some(b) = &self.state.selected_backup
            && !self.state.backups.contains(b)
        {
            self.state.selected_backup = None;
        }
    }
    fn create_backup(&mut self) {
        let Some(path) = self.state.selected_scenario().map(|s| s.path.clone()) else {
            return;
        };
        self.state.status = match backups::create_backup_at(&path, Local::now().naive_local()) {
            Ok(id) => format!("Backup {} created", id),
            Err(BackupError::NoSave) => format!(
                "No {} yet. Save in game first (F2 or Save in the pause menu).",
                backups::SAVE_FILE
            ),
            Err(e) => format!("Backup failed: {}", e),
        };
        self.refresh_backups();
    }
    fn run_pending(&mut self, pending: Pending) {
        let Some(path) = self.state.selected_scenario().map(|s| s.path.clone()) else {
            return;
        };
        self.state.status = match pending {
            Pending::Restore(id) => {
                if backups::restore_backup(&path, &id) {
                    format!("Restored {}", id)
                } else {
                    format!("Restore of {} failed", id)
                }
            }
            Pending::Delete(id) => {
                if backups::delete_backup(&path, &id) {
                    format!("Deleted {}", id)
                } else {
                    format!("Delete of {} failed", id)
                }
            }
        };
        self.refresh_backups();
    }

    fn route_tree(&mut self, ui: &mut egui::Ui) {
        let filtered = self.state.catalog.filter(&self.state.search);
        let searching = filtered.routes.len() != self.state.catalog.routes.len()
            || filtered.scenario_count() != self.state.catalog.scenario_count();
        let mut clicked: Option<(String, String)> = None;
        egui::ScrollArea::vertical()
            .id_source("route_tree")
            .show(ui, |ui| {
                for route in &filtered.routes {
                    egui::CollapsingHeader::new(&route.display_name)
                        .id_source(&route.id)
                        .open(searching.then_some(true))
                        .show(ui, |ui| {
                            for s in &route.scenarios {
                                let sel = self.state.selected.as_ref()
                                    == Some(&(route.id.clone(), s.id.clone()));
                                if ui.selectable_label(sel, &s.display_name).clicked() {
                                    clicked = Some((route.id.clone(), s.id.clone()));
                                }
                            }
                        });
                }
            });
        if let Some((route, scenario)) = clicked {
            self.select(route, scenario);
        }
    }

    fn backup_panel(&mut self, ui: &mut egui::Ui) {
        let Some(scenario) = self.state.selected_scenario() else {
            ui.label("Select a scenario on the left");
            return;
        };
        ui.heading(&scenario.display_name);
        ui.label(scenario.path.display().to_string());
        let has_save = backups::has_save(&scenario.path);
        if !has_save {
            ui.colored_label(
                egui::Color32::YELLOW,
                format!("No {} in this scenario", backups::SAVE_FILE),
            );
        }
        ui.separator();

        ui.horizontal(|ui| {
            if ui.button("Create Backup").clicked() {
                self.create_backup();
            }
            let has_sel = self.state.selected_backup.is_some();
            if ui.add_enabled(has_sel, egui::Button::new("Restore")).clicked()
                && let Some(id) = self.state.selected_backup.clone()
            {
                self.state.confirm = Some(Pending::Restore(id));
            }
            if ui.add_enabled(has_sel, egui::Button::new("Delete")).clicked()
                && let Some(id) = self.state.selected_backup.clone()
            {
                self.state.confirm = Some(Pending::Delete(id));
            }
            if ui.button("Refresh").clicked() {
                self.refresh_backups();
            }
        });

        if let Some(pending) = self.state.confirm.clone() {
            ui.horizontal(|ui| {
                let question = match &pending {
                    Pending::Restore(id) => format!(
                        "Restoring {} overwrites the current save. Continue?",
                        id
                    ),
                    Pending::Delete(id) => format!("Delete backup {}?", id),
                };
                ui.label(question);
                if ui.button("Confirm").clicked() {
                    self.state.confirm = None;
                    self.run_pending(pending);
                }
                if ui.button("Cancel").clicked() {
                    self.state.confirm = None;
                }
            });
        }
        ui.separator();

        ui.label(format!("{} backup(s)", self.state.backups.len()));
        let mut clicked: Option<String> = None;
        egui::ScrollArea::vertical()
            .id_source("backup_list")
            .show(ui, |ui| {
                for id in &self.state.backups {
                    let label = match backups::backup_time(id) {
                        Some(t) => format!("{}    ({})", id, t.format("%Y-%m-%d %H:%M:%S")),
                        None => id.clone(),
                    };
                    let sel = self.state.selected_backup.as_ref() == Some(id);
                    if ui.selectable_label(sel, label).clicked() {
                        clicked = Some(id.clone());
                    }
                }
            });
        if let Some(id) = clicked {
            self.state.selected_backup = Some(id);
            self.state.confirm = None;
        }
    }
}

impl App for AppGui {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Choose RailWorks Folder").clicked() {
                    self.pick_root_dir();
                }
                if ui.button("Auto-detect").clicked() {
                    self.detect_root();
                }
                if ui.button("Rescan").clicked() {
                    self.rescan();
                }
                ui.separator();
                ui.label("Language:");
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut self.state.language).desired_width(60.0),
                );
                if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.apply_language();
                }
                if let Some(root) = &self.state.root_dir {
                    ui.separator();
                    ui.label(root.display().to_string());
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.state.status);
        });

        egui::SidePanel::left("left")
            .resizable(true)
            .default_width(380.0)
            .show(ctx, |ui| {
                ui.heading("Routes");
                ui.horizontal(|ui| {
                    ui.label("Search:");
                    ui.text_edit_singleline(&mut self.state.search);
                    if ui.button("x").clicked() {
                        self.state.search.clear();
                    }
                });
                ui.separator();
                self.route_tree(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.backup_panel(ui);
        });
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let store = ConfigStore::open_default();
    let window = store.config().window;
    let native_options = eframe::NativeOptions {
        viewport: egui::viewport::ViewportBuilder::default()
            .with_inner_size([window.width, window.height])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "RailWorks Save Backup",
        native_options,
        Box::new(move |cc| Ok(Box::new(AppGui::new(cc, store)))),
    )
}
