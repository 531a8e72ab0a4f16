/// Vehicle and browser tag resolution from result-file paths.
///
/// A "vehicle" is the browser+OS build combination under test, identified
/// by the Android package name embedded in the result path. The browser
/// tag comes from the top-level directory the harness writes results into
/// (`chrome/` or `firefox/`).

/// Package-name substrings and their vehicle labels, scanned in order;
/// first match wins.
const VEHICLES: &[(&str, &str)] = &[
    ("com.android.chrome", "Chrome 74"),
    ("org.mozilla.geckoview_example", "GVE 68"),
    ("org.mozilla.fenix", "Fenix 68"),
    ("org.mozilla.firefox", "Fennec 64"),
];

/// Resolve the vehicle label for a result-file path.
///
/// Returns `None` if no known package name appears in the path.
pub fn resolve_vehicle(path: &str) -> Option<&'static str> {
    for (package, vehicle) in VEHICLES {
        if path.contains(package) {
            return Some(vehicle);
        }
    }
    None
}

/// Map a top-level results directory name to its browser engine tag.
///
/// Returns `None` for anything other than `chrome` or `firefox`.
pub fn browser_engine(dir: &str) -> Option<&'static str> {
    match dir {
        "chrome" => Some("WebView"),
        "firefox" => Some("GeckoView"),
        _ => None,
    }
}
