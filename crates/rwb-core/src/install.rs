//! Locating a RailWorks (Train Simulator Classic) installation.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

/// Launchers shipped by the 32-bit, 64-bit and DX12 builds.
pub const LAUNCHERS: [&str; 3] = ["RailWorks.exe", "RailWorks64.exe", "RailWorksDX12_64.exe"];

const STEAM_LIBRARIES: [&str; 5] = [
    "C:/Program Files (x86)/Steam/steamapps/common/RailWorks",
    "D:/Program Files (x86)/Steam/steamapps/common/RailWorks",
    "E:/Program Files (x86)/Steam/steamapps/common/RailWorks",
    "C:/Program Files/Steam/steamapps/common/RailWorks",
    "D:/Program Files/Steam/steamapps/common/RailWorks",
];

#[cfg(not(windows))]
const HOME_LIBRARIES: [&str; 2] = [
    ".steam/steam/steamapps/common/RailWorks",
    ".local/share/Steam/steamapps/common/RailWorks",
];

pub fn routes_dir(install: &Path) -> PathBuf {
    install.join("Content").join("Routes")
}

/// A directory holding one of the launchers, or at least `Content/Routes`.
pub fn is_installation(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let has_launcher = fs::read_dir(path)
        .map(|rd| {
            rd.flatten().any(|e| {
                e.file_name().to_str().is_some_and(|name| {
                    LAUNCHERS.iter().any(|l| l.eq_ignore_ascii_case(name))
                })
            })
        })
        .unwrap_or(false);
    has_launcher || routes_dir(path).is_dir()
}

pub fn candidates() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = STEAM_LIBRARIES.iter().map(PathBuf::from).collect();
    out.extend(home_libraries());
    out
}

#[cfg(not(windows))]
fn home_libraries() -> Vec<PathBuf> {
    directories::BaseDirs::new()
        .map(|base| HOME_LIBRARIES.iter().map(|rel| base.home_dir().join(rel)).collect())
        .unwrap_or_default()
}

#[cfg(windows)]
fn home_libraries() -> Vec<PathBuf> {
    Vec::new()
}

/// First well-known location that holds an installation.
pub fn detect_installation() -> Option<PathBuf> {
    let found = candidates().into_iter().find(|p| is_installation(p));
    match &found {
        Some(p) => debug!("found installation at {}", p.display()),
        None => debug!("no installation in the default locations"),
    }
    found
}
