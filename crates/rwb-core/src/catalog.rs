use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::backups;
use crate::error::CatalogError;
use crate::install;
use crate::names::{self, ROUTE_PROPERTIES, SCENARIO_PROPERTIES};

pub const SCENARIOS_DIR: &str = "Scenarios";

/// Queries shorter than this leave the catalog unfiltered.
pub const MIN_FILTER_LEN: usize = 2;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub id: String,
    pub display_name: String,
    pub path: PathBuf,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub id: String,
    pub display_name: String,
    pub path: PathBuf,
    pub backup_dir: PathBuf,
}

impl Scenario {
    fn load(path: PathBuf, id: String, language: &str) -> Self {
        let display_name = display_name_or_id(&path.join(SCENARIO_PROPERTIES), language, &id);
        let backup_dir = backups::backup_dir(&path);
        Self {
            id,
            display_name,
            path,
            backup_dir,
        }
    }
}

impl Catalog {
    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    pub fn scenario(&self, route_id: &str, scenario_id: &str) -> Option<&Scenario> {
        self.route(route_id)?
            .scenarios
            .iter()
            .find(|s| s.id == scenario_id)
    }

    pub fn scenario_count(&self) -> usize {
        self.routes.iter().map(|r| r.scenarios.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Case-insensitive name search. A matching route keeps all its
    /// scenarios; any other route keeps only matching scenarios, or is dropped.
    /// A route-name hit is never narrowed to its matching scenarios.
    pub fn filter(&self, query: &str) -> Catalog {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_FILTER_LEN {
            return self.clone();
        }
        let hit = |name: &str| name.to_lowercase().contains(&query);
        let routes = self
            .routes
            .iter()
            .filter_map(|route| {
                if hit(&route.display_name) {
                    return Some(route.clone());
                }
                let scenarios: Vec<Scenario> = route
                    .scenarios
                    .iter()
                    .filter(|s| hit(&s.display_name))
                    .cloned()
                    .collect();
                (!scenarios.is_empty()).then(|| Route {
                    scenarios,
                    ..route.clone()
                })
            })
            .collect();
        Catalog { routes }
    }
}

/// Build a fresh catalog from `install/Content/Routes`.
///
/// Routes without scenarios are left out. Routes and scenarios are sorted by
/// display name, then id.
pub fn scan_catalog(install: &Path, language: &str) -> Result<Catalog, CatalogError> {
    let routes_dir = install::routes_dir(install);
    if !routes_dir.is_dir() {
        return Err(CatalogError::NoRoutes(install.to_path_buf()));
    }

    let mut routes = Vec::new();
    for (route_path, route_id) in subdirs(&routes_dir)? {
        let scenarios_dir = route_path.join(SCENARIOS_DIR);
        let mut scenarios = Vec::new();
        if scenarios_dir.is_dir() {
            match subdirs(&scenarios_dir) {
                Ok(dirs) => {
                    scenarios = dirs
                        .into_iter()
                        .map(|(path, id)| Scenario::load(path, id, language))
                        .collect();
                }
                Err(e) => {
                    warn!("skipping route {}: {}", route_id, e);
                    continue;
                }
            }
        }
        if scenarios.is_empty() {
            debug!("route {} has no scenarios", route_id);
            continue;
        }
        scenarios.sort_by(|a, b| by_name(&a.display_name, &a.id, &b.display_name, &b.id));

        let display_name =
            display_name_or_id(&route_path.join(ROUTE_PROPERTIES), language, &route_id);
        routes.push(Route {
            id: route_id,
            display_name,
            path: route_path,
            scenarios,
        });
    }
    routes.sort_by(|a, b| by_name(&a.display_name, &a.id, &b.display_name, &b.id));

    let catalog = Catalog { routes };
    info!(
        "scanned {}: {} route(s), {} scenario(s)",
        routes_dir.display(),
        catalog.routes.len(),
        catalog.scenario_count()
    );
    Ok(catalog)
}

fn display_name_or_id(xml: &Path, language: &str, id: &str) -> String {
    let name = names::resolve_display_name(xml, language);
    if name.is_empty() { id.to_owned() } else { name }
}

fn by_name(a_name: &str, a_id: &str, b_name: &str, b_id: &str) -> Ordering {
    a_name
        .to_lowercase()
        .cmp(&b_name.to_lowercase())
        .then_with(|| a_id.cmp(b_id))
}

// Immediate child directories as (path, name); non-UTF-8 names are skipped.
fn subdirs(dir: &Path) -> Result<Vec<(PathBuf, String)>, CatalogError> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk error"));
                return Err(CatalogError::Io {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                warn!("skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => out.push((entry.path().to_path_buf(), name.to_owned())),
            None => warn!("skipping non UTF-8 directory {}", entry.path().display()),
        }
    }
    Ok(out)
}
