use std::collections::{BTreeMap, BTreeSet};

use crate::geocode::{GeocodeMatch, Resolution};
use crate::markers::{LayerKind, MapMarker, Placement, ReconcileReport};

/// Formats a dollar amount compactly, e.g. `$1.2B`, `$350.0M`, `$900`
pub fn format_currency(usd: f64) -> String {
    let usd = if usd.is_finite() { usd.max(0.0) } else { 0.0 };
    if usd.round() < 1e3 {
        return format!("${:.0}", usd);
    }
    // Units are picked after rounding to tenths, so 999,950 reads $1.0M.
    let tenths = |scale: f64| (usd / (scale / 10.0)).round();
    let (scale, suffix) = [(1e3, "K"), (1e6, "M")]
        .into_iter()
        .find(|&(scale, _)| tenths(scale) < 10_000.0)
        .unwrap_or((1e9, "B"));
    format!("${:.1}{}", tenths(scale) / 10.0, suffix)
}

/// Formats casualty counts, e.g. `1 death, 4 injuries`
pub fn format_casualties(deaths: f64, injuries: f64) -> String {
    let count = |v: f64| if v.is_finite() { v.max(0.0).round() as u64 } else { 0 };
    let plural = |n: u64, one: &str, many: &str| {
        if n == 1 {
            format!("{} {}", n, one)
        } else {
            format!("{} {}", n, many)
        }
    };
    format!(
        "{}, {}",
        plural(count(deaths), "death", "deaths"),
        plural(count(injuries), "injury", "injuries")
    )
}

fn describe_placement(placement: &Placement) -> String {
    match placement {
        Placement::Upstream => "upstream coordinates".to_string(),
        Placement::Geocoded { matched } => describe_match(matched),
    }
}

fn describe_match(matched: &GeocodeMatch) -> String {
    match matched {
        GeocodeMatch::Tier {
            tier,
            key,
            via_fallback,
        } => {
            let via = if *via_fallback { " via fallback region" } else { "" };
            format!("{} '{}'{}", tier.as_str(), key, via)
        }
        GeocodeMatch::Miss => "geocode miss, default center".to_string(),
    }
}

fn format_marker(output: &mut String, index: usize, marker: &MapMarker) {
    let style = &marker.style;
    output.push_str(&format!(
        "Marker {}: {}\n  Id: {}\n  Position: {:.4}, {:.4} ({})\n  Severity: {} ({}, {}, radius {:.0}px){}\n",
        index + 1,
        marker.popup.title,
        marker.id,
        marker.coordinate.lat(),
        marker.coordinate.lon(),
        describe_placement(&marker.placement),
        style.band.as_str(),
        style.color,
        style.icon,
        style.radius,
        if style.pulse { ", pulsing" } else { "" }
    ));
    if let Some(score) = style.score {
        output.push_str(&format!("  Score: {:.1}\n", score));
    }
    for (label, value) in &marker.popup.fields {
        output.push_str(&format!("  {}: {}\n", label, value));
    }
    output.push_str(&format!("  {}\n", marker.popup.attribution));
    if let Some(link) = &marker.popup.link {
        output.push_str(&format!("  Link: {}\n", link));
    }
    output.push('\n');
}

/// Formats a rebuilt layer into a human-readable string
pub fn format_layer(kind: LayerKind, markers: &[MapMarker], report: &ReconcileReport) -> String {
    let mut output = format!(
        "Layer '{}': {} marker(s) placed, {} removed",
        kind, report.added, report.removed
    );
    if report.skipped_invalid > 0 {
        output.push_str(&format!(
            ", {} skipped for invalid coordinates",
            report.skipped_invalid
        ));
    }
    if report.geocode_misses > 0 {
        output.push_str(&format!(
            ", {} placed at the default center",
            report.geocode_misses
        ));
    }
    output.push_str("\n\n");

    if markers.is_empty() {
        output.push_str("No markers to display.\n");
        return output;
    }
    for (i, marker) in markers.iter().enumerate() {
        format_marker(&mut output, i, marker);
    }
    output
}

/// Formats a single geocoder resolution
pub fn format_resolution(location: &str, resolution: &Resolution) -> String {
    format!(
        "Location: {}\n  Resolved: {:.4}, {:.4}\n  Match: {}\n",
        location,
        resolution.coordinate.lat(),
        resolution.coordinate.lon(),
        describe_match(&resolution.matched)
    )
}

/// Formats per-layer marker counts
pub fn format_map_summary(counts: &BTreeMap<LayerKind, usize>, hidden: &BTreeSet<LayerKind>) -> String {
    let mut output = String::from("Map Layers:\n\n");
    for (kind, count) in counts {
        let state = if hidden.contains(kind) { "hidden" } else { "visible" };
        output.push_str(&format!("  {}: {} marker(s), {}\n", kind, count, state));
    }
    let total: usize = counts.values().sum();
    output.push_str(&format!("\nTotal rendered: {}\n", total));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_units() {
        assert_eq!(format_currency(2_000_000_000.0), "$2.0B");
        assert_eq!(format_currency(350_000_000.0), "$350.0M");
        assert_eq!(format_currency(12_500.0), "$12.5K");
        assert_eq!(format_currency(900.0), "$900");
        assert_eq!(format_currency(999.6), "$1.0K");
        assert_eq!(format_currency(999_950.0), "$1.0M");
        assert_eq!(format_currency(999_950_000.0), "$1.0B");
        assert_eq!(format_currency(999_900.0), "$999.9K");
        assert_eq!(format_currency(-5.0), "$0");
        assert_eq!(format_currency(f64::NAN), "$0");
    }

    #[test]
    fn casualty_wording() {
        assert_eq!(format_casualties(1.0, 4.0), "1 death, 4 injuries");
        assert_eq!(format_casualties(0.0, 1.0), "0 deaths, 1 injury");
    }

    #[test]
    fn summary_marks_hidden_layers() {
        let counts = BTreeMap::from([(LayerKind::Alerts, 0), (LayerKind::Earthquakes, 7)]);
        let hidden = BTreeSet::from([LayerKind::Alerts]);
        let text = format_map_summary(&counts, &hidden);
        assert!(text.contains("alerts: 0 marker(s), hidden"));
        assert!(text.contains("earthquakes: 7 marker(s), visible"));
        assert!(text.contains("Total rendered: 7"));
    }

    #[test]
    fn empty_layer_message() {
        let text = format_layer(LayerKind::StormEvents, &[], &ReconcileReport::default());
        assert!(text.contains("No markers to display."));
    }
}
