//! CSV and JSON writers for report results and long-format series.

use std::io::Write;

use csv::WriterBuilder;
use incidencia_aggregate::series::SeriesPoint;
use incidencia_incidence_models::Period;
use incidencia_loader::timeseries::DATE_FORMAT;
use incidencia_rates::format::format_rate;
use incidencia_region_models::RegionKey;
use incidencia_region_models::states::region_label;
use serde::Serialize;

use crate::ReportError;
use crate::definition::ReportKind;
use crate::pipeline::{CategorySection, ReportOutput};

#[derive(Serialize)]
struct RankingRow<'a> {
    category: &'a str,
    rank: usize,
    region: String,
    label: &'a str,
    total: u64,
    population: Option<f64>,
    rate: Option<f64>,
    rate_label: Option<String>,
}

#[derive(Serialize)]
struct RegionChangeCsvRow<'a> {
    category: &'a str,
    region: String,
    label: &'a str,
    first: u64,
    second: u64,
    diff: i64,
    change: Option<f64>,
}

#[derive(Serialize)]
struct TrendCsvRow<'a> {
    category: &'a str,
    year: i32,
    total: u64,
    population: Option<f64>,
    rate: Option<f64>,
    rate_label: Option<String>,
}

#[derive(Serialize)]
struct SeriesCsvRow<'a> {
    category: &'a str,
    isodate: Option<String>,
    total: u64,
    rolling_mean: Option<f64>,
}

#[derive(Serialize)]
struct ComparisonCsvRow<'a> {
    category: &'a str,
    first: u64,
    second: u64,
    diff: i64,
    change: Option<f64>,
}

#[derive(Serialize)]
struct MapRow<'a> {
    region: String,
    label: &'a str,
    rate: f64,
    bucket: usize,
    bucket_label: &'a str,
}

#[derive(Serialize)]
struct MonthlyRow<'a> {
    isodate: String,
    entidad: String,
    delito: &'a str,
    total: u64,
}

#[derive(Serialize)]
struct AnnualRow<'a> {
    #[serde(rename = "año")]
    year: i32,
    cve_municipio: String,
    delito: &'a str,
    total: u64,
}

/// Writes a report as CSV, one row per:
///
/// - ranked entry of every section (ranking kinds);
/// - category (period comparisons);
/// - region of every category (region comparisons);
/// - year of every category (national trends);
/// - month of every category (monthly series).
///
/// Undefined rates and changes are left blank.
///
/// # Errors
///
/// Returns [`ReportError::Csv`] if a row cannot be written.
pub fn write_csv(output: &ReportOutput, writer: impl Write) -> Result<(), ReportError> {
    let mut csv = WriterBuilder::new().from_writer(writer);

    match output.kind {
        ReportKind::PeriodComparison => {
            for row in &output.comparison {
                csv.serialize(ComparisonCsvRow {
                    category: &row.category,
                    first: row.first,
                    second: row.second,
                    diff: row.diff,
                    change: row.change.value(),
                })?;
            }
        }
        ReportKind::RegionComparison => {
            for changes in &output.changes {
                for row in &changes.rows {
                    csv.serialize(RegionChangeCsvRow {
                        category: &changes.category,
                        region: row.region.code(),
                        label: &row.label,
                        first: row.first,
                        second: row.second,
                        diff: row.diff,
                        change: row.change.value(),
                    })?;
                }
            }
        }
        ReportKind::NationalTrend => {
            for trend in &output.trend {
                for year in &trend.years {
                    csv.serialize(TrendCsvRow {
                        category: &trend.category,
                        year: year.year,
                        total: year.total,
                        population: year.population,
                        rate: year.rate,
                        rate_label: year.rate.map(format_rate),
                    })?;
                }
            }
        }
        ReportKind::MonthlySeries => {
            for series in &output.series {
                for point in &series.points {
                    csv.serialize(SeriesCsvRow {
                        category: &series.category,
                        isodate: point.date().map(|date| date.format(DATE_FORMAT).to_string()),
                        total: point.total,
                        rolling_mean: point.rolling_mean,
                    })?;
                }
            }
        }
        ReportKind::StateRanking
        | ReportKind::MunicipalRanking
        | ReportKind::MunicipalChoropleth
        | ReportKind::VictimRanking => {
            for section in &output.sections {
                for entry in &section.ranking.entries {
                    csv.serialize(RankingRow {
                        category: &section.category,
                        rank: entry.rank,
                        region: entry.region.code(),
                        label: &entry.label,
                        total: entry.total,
                        population: entry.population,
                        rate: entry.rate,
                        rate_label: entry.rate.map(format_rate),
                    })?;
                }
            }
        }
    }

    csv.flush()?;
    Ok(())
}

/// Writes the choropleth cells of a section as CSV, each with the label of
/// its bucket's lower edge.
///
/// # Errors
///
/// Returns [`ReportError::Csv`] if a row cannot be written.
pub fn write_map_csv(section: &CategorySection, writer: impl Write) -> Result<(), ReportError> {
    let mut csv = WriterBuilder::new().from_writer(writer);

    for cell in &section.map {
        let bucket_label = section
            .scale
            .as_ref()
            .and_then(|scale| scale.labels.get(cell.bucket))
            .map_or("", String::as_str);
        csv.serialize(MapRow {
            region: cell.region.code(),
            label: &cell.label,
            rate: cell.rate,
            bucket: cell.bucket,
            bucket_label,
        })?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes a report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ReportError::Json`] if serialization fails.
pub fn write_json(output: &ReportOutput, mut writer: impl Write) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, output)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Writes series points in the long format the loader reads back.
///
/// Monthly state points (national included) use
/// `isodate,entidad,delito,total`; annual municipal points use
/// `año,cve_municipio,delito,total`.
///
/// # Errors
///
/// Returns [`ReportError::UnsupportedSeries`] if the points mix layouts or
/// fit neither, and [`ReportError::Csv`] if a row cannot be written.
pub fn write_timeseries_csv(points: &[SeriesPoint], writer: impl Write) -> Result<(), ReportError> {
    let monthly = points
        .first()
        .is_some_and(|point| matches!(point.period, Period::YearMonth { .. }));
    let mut csv = WriterBuilder::new().from_writer(writer);

    for point in points {
        match (point.period, point.region, monthly) {
            (Period::YearMonth { .. }, RegionKey::National | RegionKey::State(_), true) => {
                let date = point.date().ok_or_else(|| ReportError::UnsupportedSeries {
                    message: format!("no calendar date for period {}", point.period),
                })?;
                csv.serialize(MonthlyRow {
                    isodate: date.format(DATE_FORMAT).to_string(),
                    entidad: region_label(point.region),
                    delito: &point.category,
                    total: point.total,
                })?;
            }
            (Period::Year(year), RegionKey::Municipality(code), false) => {
                csv.serialize(AnnualRow {
                    year,
                    cve_municipio: code.to_string(),
                    delito: &point.category,
                    total: point.total,
                })?;
            }
            (period, region, _) => {
                return Err(ReportError::UnsupportedSeries {
                    message: format!(
                        "point {period} for region {} does not fit a {} series",
                        region.code(),
                        if monthly { "monthly state" } else { "annual municipal" }
                    ),
                });
            }
        }
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use incidencia_aggregate::compare::ComparisonRow;
    use incidencia_aggregate::series::{TrendPoint, to_timeseries};
    use incidencia_incidence_models::{IncidentRecord, Month, RankedEntry};
    use incidencia_loader::timeseries::parse_timeseries;
    use incidencia_rank::Ranking;
    use incidencia_rates::PercentChange;
    use incidencia_rates::trend::AnnualRate;
    use incidencia_region_models::{MunicipalityCode, StateCode};

    use super::*;
    use crate::pipeline::{
        CategorySeries, CategoryTrend, NationalSummary, RegionChangeRow, RegionChanges,
    };

    fn state(code: u32) -> RegionKey {
        RegionKey::State(StateCode::new(code).unwrap())
    }

    fn monthly(code: u32, month: Month, count: u64) -> IncidentRecord {
        IncidentRecord {
            period: Period::YearMonth { year: 2023, month },
            region: state(code),
            category: "Robo".to_string(),
            secondary: None,
            count,
        }
    }

    #[test]
    fn monthly_series_reads_back() {
        let records = vec![
            monthly(9, Month::January, 4),
            monthly(15, Month::January, 6),
            monthly(9, Month::February, 1),
        ];
        let points = to_timeseries(&records);

        let mut buffer = Vec::new();
        write_timeseries_csv(&points, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("isodate,entidad,delito,total\n"));
        assert!(text.contains("2023-01-01,Nacional,Robo,10\n"));

        let parsed = parse_timeseries(&text).unwrap();
        assert_eq!(parsed.len(), points.len());
        let national: u64 = parsed
            .iter()
            .filter(|record| record.region.is_national())
            .map(|record| record.count)
            .sum();
        assert_eq!(national, 11);
    }

    #[test]
    fn annual_municipal_series() {
        let records = vec![IncidentRecord {
            period: Period::Year(2023),
            region: RegionKey::Municipality(MunicipalityCode::parse("09015").unwrap()),
            category: "Extorsión".to_string(),
            secondary: None,
            count: 7,
        }];
        let mut buffer = Vec::new();
        write_timeseries_csv(&to_timeseries(&records), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "año,cve_municipio,delito,total\n2023,09015,Extorsión,7\n");
    }

    #[test]
    fn mixed_series_is_rejected() {
        let mut records = vec![monthly(9, Month::January, 1)];
        records.push(IncidentRecord {
            period: Period::Year(2023),
            ..monthly(9, Month::January, 1)
        });
        let result = write_timeseries_csv(&to_timeseries(&records), Vec::new());
        assert!(matches!(result, Err(ReportError::UnsupportedSeries { .. })));
    }

    #[test]
    fn comparison_csv_leaves_undefined_change_blank() {
        let mut output = empty_output(ReportKind::PeriodComparison);
        output.comparison.push(ComparisonRow {
            category: "Secuestro".to_string(),
            first: 0,
            second: 4,
            diff: 4,
            change: PercentChange::Undefined,
        });
        let mut buffer = Vec::new();
        write_csv(&output, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "category,first,second,diff,change\nSecuestro,0,4,4,\n");
    }

    fn empty_output(kind: ReportKind) -> ReportOutput {
        ReportOutput {
            id: "prueba".to_string(),
            name: "Prueba".to_string(),
            kind,
            year: 2023,
            sections: Vec::new(),
            comparison: Vec::new(),
            changes: Vec::new(),
            trend: Vec::new(),
            series: Vec::new(),
        }
    }

    #[test]
    fn ranking_csv_leaves_missing_population_blank() {
        let mut output = empty_output(ReportKind::MunicipalRanking);
        output.sections.push(CategorySection {
            category: "Extorsión".to_string(),
            national: NationalSummary {
                total: 35,
                population: None,
                rate: None,
            },
            ranking: Ranking {
                entries: vec![
                    RankedEntry {
                        rank: 1,
                        region: RegionKey::Municipality(MunicipalityCode::parse("09998").unwrap()),
                        label: "09998".to_string(),
                        total: 25,
                        population: None,
                        rate: None,
                    },
                    RankedEntry {
                        rank: 2,
                        region: RegionKey::Municipality(MunicipalityCode::parse("09015").unwrap()),
                        label: "Cuauhtémoc".to_string(),
                        total: 10,
                        population: Some(500_000.0),
                        rate: Some(2.0),
                    },
                ],
                exclusions: Vec::new(),
            },
            undefined: Vec::new(),
            stats: None,
            dropped: 0,
            zero_rates: 0,
            scale: None,
            map: Vec::new(),
            shares: Vec::new(),
        });

        let mut buffer = Vec::new();
        write_csv(&output, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "category,rank,region,label,total,population,rate,rate_label\n\
             Extorsión,1,09998,09998,25,,,\n\
             Extorsión,2,09015,Cuauhtémoc,10,500000.0,2.0,2.00\n"
        );
    }

    #[test]
    fn trend_and_series_csv() {
        let mut output = empty_output(ReportKind::NationalTrend);
        output.trend.push(CategoryTrend {
            category: "Extorsión".to_string(),
            cumulative_total: 150,
            years: vec![AnnualRate {
                year: 2023,
                total: 150,
                population: Some(1_000_000.0),
                rate: Some(15.0),
            }],
        });
        let mut buffer = Vec::new();
        write_csv(&output, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "category,year,total,population,rate,rate_label\nExtorsión,2023,150,1000000.0,15.0,15.0\n"
        );

        let mut output = empty_output(ReportKind::MonthlySeries);
        output.series.push(CategorySeries {
            category: "Robo".to_string(),
            points: vec![TrendPoint {
                period: Period::YearMonth {
                    year: 2024,
                    month: Month::January,
                },
                total: 7,
                rolling_mean: None,
            }],
        });
        let mut buffer = Vec::new();
        write_csv(&output, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "category,isodate,total,rolling_mean\nRobo,2024-01-01,7,\n"
        );
    }

    #[test]
    fn region_change_csv() {
        let mut output = empty_output(ReportKind::RegionComparison);
        output.changes.push(RegionChanges {
            category: "Extorsión".to_string(),
            first_year: 2022,
            second_year: 2023,
            rows: vec![RegionChangeRow {
                region: RegionKey::National,
                label: "Nacional".to_string(),
                first: 20,
                second: 25,
                diff: 5,
                change: PercentChange::Defined(25.0),
            }],
        });
        let mut buffer = Vec::new();
        write_csv(&output, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "category,region,label,first,second,diff,change\nExtorsión,Nacional,Nacional,20,25,5,25.0\n"
        );
    }

    #[test]
    fn json_tags_undefined_change() {
        let mut output = empty_output(ReportKind::PeriodComparison);
        output.comparison.push(ComparisonRow {
            category: "Secuestro".to_string(),
            first: 0,
            second: 4,
            diff: 4,
            change: PercentChange::Undefined,
        });
        let mut buffer = Vec::new();
        write_json(&output, &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["kind"], "period_comparison");
        assert_eq!(value["comparison"][0]["change"]["kind"], "undefined");
        assert!(value.get("sections").is_none());
    }
}
