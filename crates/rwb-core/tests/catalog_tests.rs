use std::fs;
use std::path::Path;

use chrono::{Local, TimeZone};
use rwb_core::config::{Config, ConfigStore, DEFAULT_LANGUAGE};
use rwb_core::install::{is_installation, routes_dir};
use rwb_core::{CatalogError, scan_catalog};

fn name_xml(english: &str, chinese: Option<&str>) -> String {
    let other = chinese
        .map(|zh| {
            format!(
                "<Other><Localisation-cUserLocalisedString-cOtherStringLangPair>\
                 <Language>zh-CN</Language><String>{zh}</String>\
                 </Localisation-cUserLocalisedString-cOtherStringLangPair></Other>"
            )
        })
        .unwrap_or_default();
    format!(
        r#"<cProperties xmlns:d="http://www.kuju.com/TnT/2003/Delta">
<DisplayName><Localisation-cUserLocalisedString>
<English d:type="cDeltaString">{english}</English>{other}
</Localisation-cUserLocalisedString></DisplayName>
</cProperties>"#
    )
}

fn scenario(route: &Path, id: &str, xml: Option<String>) {
    let dir = route.join("Scenarios").join(id);
    fs::create_dir_all(&dir).unwrap();
    if let Some(xml) = xml {
        fs::write(dir.join("ScenarioProperties.xml"), xml).unwrap();
    }
}

// Content/Routes with:
//   r-aaa "Western Main Line" -> s1 "Zulu Freight", s2 (no metadata)
//   r-bbb (no metadata)       -> s9 "Alpha Shuttle"
//   r-ccc "Empty Route"       -> no scenarios
fn fake_install(root: &Path) {
    let routes = routes_dir(root);
    let a = routes.join("r-aaa");
    fs::create_dir_all(&a).unwrap();
    fs::write(
        a.join("RouteProperties.xml"),
        name_xml("Western Main Line", Some("西部干线")),
    )
    .unwrap();
    scenario(&a, "s1", Some(name_xml("Zulu Freight", None)));
    scenario(&a, "s2", None);

    let b = routes.join("r-bbb");
    fs::create_dir_all(&b).unwrap();
    scenario(&b, "s9", Some(name_xml("Alpha Shuttle", None)));

    let c = routes.join("r-ccc");
    fs::create_dir_all(c.join("Scenarios")).unwrap();
    fs::write(c.join("RouteProperties.xml"), name_xml("Empty Route", None)).unwrap();

    // Stray files are not routes.
    fs::write(routes.join("readme.txt"), "x").unwrap();
}

#[test]
fn scan_builds_sorted_catalog_with_fallback_names() {
    let d = tempfile::tempdir().unwrap();
    fake_install(d.path());
    let catalog = scan_catalog(d.path(), "en").unwrap();

    let routes: Vec<(&str, &str)> = catalog
        .routes
        .iter()
        .map(|r| (r.id.as_str(), r.display_name.as_str()))
        .collect();
    assert_eq!(routes, [("r-bbb", "r-bbb"), ("r-aaa", "Western Main Line")]);

    let western = catalog.route("r-aaa").unwrap();
    let names: Vec<&str> = western
        .scenarios
        .iter()
        .map(|s| s.display_name.as_str())
        .collect();
    assert_eq!(names, ["s2", "Zulu Freight"]);

    let s1 = catalog.scenario("r-aaa", "s1").unwrap();
    assert_eq!(s1.path, routes_dir(d.path()).join("r-aaa/Scenarios/s1"));
    assert_eq!(s1.backup_dir, s1.path.join("saves"));
    assert_eq!(catalog.scenario_count(), 3);
    assert!(catalog.route("r-ccc").is_none());
}

#[test]
fn scan_uses_requested_language() {
    let d = tempfile::tempdir().unwrap();
    fake_install(d.path());
    let catalog = scan_catalog(d.path(), "zh").unwrap();
    assert_eq!(catalog.route("r-aaa").unwrap().display_name, "西部干线");
    // No Chinese entry: English built-in is used.
    assert_eq!(
        catalog.scenario("r-aaa", "s1").unwrap().display_name,
        "Zulu Freight"
    );
}

#[test]
fn scan_without_routes_dir_fails() {
    let d = tempfile::tempdir().unwrap();
    let err = scan_catalog(d.path(), "en").unwrap_err();
    assert!(matches!(err, CatalogError::NoRoutes(_)));
}

#[test]
fn filter_keeps_matching_routes_and_scenarios() {
    let d = tempfile::tempdir().unwrap();
    fake_install(d.path());
    let catalog = scan_catalog(d.path(), "en").unwrap();

    // Route name hit keeps every scenario.
    let f = catalog.filter("WESTERN");
    assert_eq!(f.routes.len(), 1);
    assert_eq!(f.routes[0].scenarios.len(), 2);

    // Scenario hit keeps only that scenario.
    let f = catalog.filter(" zulu ");
    assert_eq!(f.routes.len(), 1);
    assert_eq!(f.routes[0].id, "r-aaa");
    assert_eq!(f.routes[0].scenarios.len(), 1);
    assert_eq!(f.routes[0].scenarios[0].id, "s1");

    assert!(catalog.filter("no such thing").is_empty());
    // Too short to filter.
    assert_eq!(catalog.filter("z").scenario_count(), 3);
    assert_eq!(catalog.filter("").routes.len(), 2);
}

#[test]
fn config_defaults_and_round_trip() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("nested").join("rwb-config.json");

    let mut store = ConfigStore::load(&path);
    assert_eq!(store.config(), &Config::default());
    assert_eq!(store.language(), DEFAULT_LANGUAGE);
    assert!(store.installation_path().is_none());

    store.set_installation_path("D:/test/railworks").unwrap();
    store.set_language("en").unwrap();
    let scanned = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    store.mark_scanned(scanned).unwrap();

    let reloaded = ConfigStore::load(&path);
    assert_eq!(
        reloaded.installation_path(),
        Some(Path::new("D:/test/railworks"))
    );
    assert_eq!(reloaded.language(), "en");
    assert_eq!(reloaded.config(), store.config());
}

#[test]
fn config_merges_partial_and_ignores_corrupt_files() {
    let d = tempfile::tempdir().unwrap();
    let partial = d.path().join("partial.json");
    fs::write(&partial, r#"{"language": "de", "installation_path": ""}"#).unwrap();
    let store = ConfigStore::load(&partial);
    assert_eq!(store.language(), "de");
    assert!(store.installation_path().is_none());
    assert_eq!(store.config().window.width, 1200.0);

    let corrupt = d.path().join("corrupt.json");
    fs::write(&corrupt, "{not json").unwrap();
    assert_eq!(ConfigStore::load(&corrupt).config(), &Config::default());
}

#[test]
fn installation_is_recognised_by_launcher_or_routes() {
    let d = tempfile::tempdir().unwrap();
    assert!(!is_installation(d.path()));
    assert!(!is_installation(&d.path().join("missing")));

    let by_exe = d.path().join("steam");
    fs::create_dir_all(&by_exe).unwrap();
    fs::write(by_exe.join("railworks64.EXE"), "").unwrap();
    assert!(is_installation(&by_exe));

    let by_routes = d.path().join("copy");
    fs::create_dir_all(routes_dir(&by_routes)).unwrap();
    assert!(is_installation(&by_routes));
}
