//! Registry of built-in report definitions.
//!
//! Each report is a TOML file in the `reports/` directory, embedded at
//! compile time via [`include_str!`]. A new variant needs only a new TOML
//! file and an entry in the list below.

use std::path::Path;

use crate::ReportError;
use crate::definition::{ReportDefinition, load_report_file, parse_report_toml};

/// Embedded report TOMLs, keyed by file stem.
const REPORT_TOMLS: &[(&str, &str)] = &[
    // ── State rankings ───────────────────────────────────────────────
    ("estatal_top_10", include_str!("../reports/estatal_top_10.toml")),
    (
        "estatal_bottom_10",
        include_str!("../reports/estatal_bottom_10.toml"),
    ),
    (
        "estatal_top_7_tipo",
        include_str!("../reports/estatal_top_7_tipo.toml"),
    ),
    // ── Municipal reports ────────────────────────────────────────────
    (
        "municipal_tasa_top_30",
        include_str!("../reports/municipal_tasa_top_30.toml"),
    ),
    (
        "municipal_absolutos_top_30",
        include_str!("../reports/municipal_absolutos_top_30.toml"),
    ),
    ("municipal_mapa", include_str!("../reports/municipal_mapa.toml")),
    // ── Victims ──────────────────────────────────────────────────────
    (
        "victimas_extorsion",
        include_str!("../reports/victimas_extorsion.toml"),
    ),
    (
        "victimas_tendencia",
        include_str!("../reports/victimas_tendencia.toml"),
    ),
    // ── Comparisons ──────────────────────────────────────────────────
    (
        "comparacion_anual",
        include_str!("../reports/comparacion_anual.toml"),
    ),
    (
        "victimas_comparacion_entidad",
        include_str!("../reports/victimas_comparacion_entidad.toml"),
    ),
    // ── Monthly series ───────────────────────────────────────────────
    ("alto_impacto", include_str!("../reports/alto_impacto.toml")),
];

/// Total number of built-in reports (used in tests).
#[cfg(test)]
const EXPECTED_REPORT_COUNT: usize = 11;

/// Returns all built-in report definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_reports() -> Vec<ReportDefinition> {
    REPORT_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_report_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Finds a report by built-in id, or loads it from a TOML file when
/// `id_or_path` names an existing file.
///
/// # Errors
///
/// Returns [`ReportError::UnknownReport`] if neither matches, or the
/// file's parse error.
pub fn find_report(id_or_path: &str) -> Result<ReportDefinition, ReportError> {
    if let Some((_, toml)) = REPORT_TOMLS.iter().find(|(id, _)| *id == id_or_path) {
        return parse_report_toml(toml);
    }

    let path = Path::new(id_or_path);
    if path.is_file() {
        return load_report_file(path);
    }

    Err(ReportError::UnknownReport {
        id: id_or_path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ReportKind;

    #[test]
    fn loads_all_reports() {
        let reports = all_reports();
        assert_eq!(reports.len(), EXPECTED_REPORT_COUNT);
    }

    #[test]
    fn report_ids_are_unique_and_match_file_names() {
        let reports = all_reports();
        let mut ids: Vec<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        for (report, (name, _)) in reports.iter().zip(REPORT_TOMLS) {
            assert_eq!(report.id, *name);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_REPORT_COUNT);
    }

    #[test]
    fn all_reports_have_required_inputs() {
        for report in &all_reports() {
            assert!(!report.name.is_empty(), "{}: name is empty", report.id);
            if report.kind.needs_population() {
                assert!(
                    report.inputs.population.is_some(),
                    "{}: no population input",
                    report.id
                );
            }
            assert!(
                report.scale.edges >= 2,
                "{}: scale needs at least two edges",
                report.id
            );
        }
    }

    #[test]
    fn municipal_rate_ranking_uses_threshold_and_census_year() {
        let report = find_report("municipal_tasa_top_30").unwrap();
        assert_eq!(report.kind, ReportKind::MunicipalRanking);
        assert_eq!(report.population_year(), 2020);
        assert_eq!(report.ranking.top_n, Some(30));
        assert_eq!(report.ranking.min_population, Some(50_000.0));
    }

    #[test]
    fn bottom_ranking_is_ascending() {
        let top = find_report("estatal_top_10").unwrap();
        let bottom = find_report("estatal_bottom_10").unwrap();
        assert_eq!(top.categories, bottom.categories);
        assert_ne!(top.ranking.direction, bottom.ranking.direction);
        assert_eq!(top.category_filters()[0].label(), "Homicidio doloso y Feminicidio");
    }

    #[test]
    fn maps_leave_zero_rates_out_where_configured() {
        let municipal = find_report("municipal_mapa").unwrap();
        assert!(municipal.has_map());
        assert!(municipal.scale.exclude_zero);

        let victims = find_report("victimas_extorsion").unwrap();
        assert!(victims.has_map());
        assert_eq!(victims.scale.edges, 11);
        assert!((victims.scale.upper_percentile - 0.975).abs() < f64::EPSILON);
    }

    #[test]
    fn series_and_comparison_reports() {
        let sparkline = find_report("alto_impacto").unwrap();
        assert_eq!(sparkline.kind, ReportKind::MonthlySeries);
        assert_eq!(sparkline.category_filters().len(), 12);
        assert_eq!(sparkline.series.tail(), 13);

        let trend = find_report("victimas_tendencia").unwrap();
        assert_eq!(trend.kind, ReportKind::NationalTrend);

        let by_region = find_report("victimas_comparacion_entidad").unwrap();
        assert_eq!(by_region.kind, ReportKind::RegionComparison);
        assert_eq!(by_region.compare_year(), 2022);
    }

    #[test]
    fn unknown_report_is_an_error() {
        assert!(matches!(
            find_report("no_such_report"),
            Err(ReportError::UnknownReport { .. })
        ));
    }
}
