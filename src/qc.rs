use log::{debug, info, warn};

use food_security::flags::{run_checks, run_correlations, CorrelationReport, ExpectedSign, FlagResult};
use food_security::stats::{Correlation, Describe};
use food_security::summary::*;
use food_security::*;
use snafu::{prelude::*, Snafu};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::qc::config_reader::*;
use crate::qc::io_common::{make_default_id, simplify_file_name, RawTable};

pub mod config_reader;
mod export;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum QcError {
    #[snafu(display("Error opening file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found"))]
    MissingWorksheet { name: String },
    #[snafu(display("No data found in {path}"))]
    EmptyInput { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno}: {source}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error creating {path}"))]
    CreatingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{path}: {source}"))]
    Schema { source: SchemaError, path: String },
    #[snafu(display("Provider not implemented {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No data source: pass --input or list dataSources in the configuration"))]
    NoDataSources {},
    #[snafu(display("Cannot find the directory of {path}"))]
    MissingParentDir { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type QcResult<T> = Result<T, QcError>;
pub type BQcResult<T> = Result<T, Box<QcError>>;

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}

fn guess_provider(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("xlsx") => "xlsx".to_string(),
        Some("tsv") | Some("tab") => "tsv".to_string(),
        _ => "csv".to_string(),
    }
}

/// The data sources to read, with their resolved paths. Command line values
/// take precedence over the configuration.
fn data_sources(args: &Args, config: &QcConfig, root: &Path) -> Vec<(String, FileSource)> {
    let mut res: Vec<(String, FileSource)> = match args.input.as_deref() {
        Some(input) if !input.is_empty() => vec![(
            input.to_string(),
            FileSource {
                provider: guess_provider(input),
                file_path: input.to_string(),
                delimiter: None,
                excel_worksheet_name: None,
                id_column: config.data_sources.first().and_then(|s| s.id_column.clone()),
            },
        )],
        _ => config
            .data_sources
            .iter()
            .map(|cfs| {
                let p: PathBuf = root.join(&cfs.file_path);
                (p.display().to_string(), cfs.clone())
            })
            .collect(),
    };
    for (_, cfs) in res.iter_mut() {
        if let Some(provider) = args.input_type.as_ref() {
            cfs.provider = provider.clone();
        }
        if let Some(c) = args.delimiter {
            cfs.delimiter = Some(c.to_string());
        }
        if let Some(name) = args.excel_worksheet_name.as_ref() {
            cfs.excel_worksheet_name = Some(name.clone());
        }
    }
    res
}

fn read_table(path: &str, cfs: &FileSource) -> BQcResult<RawTable> {
    info!("Attempting to read survey file {:?}", path);
    match cfs.provider.as_str() {
        "csv" | "tsv" => io_csv::read_csv_table(path, cfs),
        "xlsx" => io_excel::read_excel_table(path, cfs),
        x => Err(Box::new(QcError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

fn read_household_data(
    path: &str,
    cfs: &FileSource,
    overrides: &BTreeMap<String, Vec<String>>,
    labels: &CodeLabels,
) -> BQcResult<Vec<HouseholdRecord>> {
    let table = read_table(path, cfs)?;
    let path = table.path.as_str();
    let layout = ColumnLayout::resolve(&table.header, overrides, cfs.id_column.as_deref())
        .context(SchemaSnafu { path })?;
    let default_id = make_default_id(path);
    let records: Vec<HouseholdRecord> = table
        .rows
        .iter()
        .map(|(lineno, row)| layout.read_record(row, &default_id(*lineno), labels))
        .collect();
    debug!("read_household_data: {}: {} households", path, records.len());
    Ok(records)
}

// ******** Summary *********

fn describe_js(d: &Option<Describe>) -> JSValue {
    match d {
        None => JSValue::Null,
        Some(d) => json!({
            "count": d.count,
            "mean": round4(d.mean),
            "std": d.std.map(round4),
            "min": round4(d.min),
            "25%": round4(d.q25),
            "50%": round4(d.median),
            "75%": round4(d.q75),
            "max": round4(d.max),
        }),
    }
}

fn describe_table_js(l: &[(&'static str, Option<Describe>)]) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (name, d) in l.iter() {
        m.insert(name.to_string(), describe_js(d));
    }
    JSValue::Object(m)
}

fn correlation_js(c: &Option<Correlation>) -> JSValue {
    match c {
        None => JSValue::Null,
        Some(c) => json!({
            "coefficient": round4(c.coefficient),
            "pValue": round4(c.p_value),
        }),
    }
}

fn correlations_js(reports: &[CorrelationReport]) -> Vec<JSValue> {
    reports
        .iter()
        .map(|r| {
            let expected = match r.expected {
                ExpectedSign::Positive => "positive",
                ExpectedSign::Negative => "negative",
            };
            json!({
                "name": r.check.name(),
                "expected": expected,
                "count": r.count,
                "pearson": correlation_js(&r.pearson),
                "spearman": correlation_js(&r.spearman),
                "matchesExpectation": r.matches_expectation(),
            })
        })
        .collect()
}

fn flags_js(flags: &[FlagResult]) -> Vec<JSValue> {
    flags
        .iter()
        .map(|f| {
            let ids: Vec<&str> = f.flagged.iter().map(|r| r.id.as_str()).collect();
            json!({
                "name": f.name,
                "description": f.description,
                "count": f.count(),
                "passed": f.passed,
                "indeterminate": f.indeterminate.len(),
                "lookupMisses": f.lookup_misses(),
                "ids": ids,
            })
        })
        .collect()
}

fn distributions_js(distributions: &[Distribution]) -> Vec<JSValue> {
    distributions
        .iter()
        .map(|d| {
            let shares: Vec<JSValue> = d
                .shares
                .iter()
                .map(|s| {
                    json!({
                        "code": s.code,
                        "label": s.label,
                        "count": s.count,
                        "percent": round4(s.percent),
                    })
                })
                .collect();
            json!({"indicator": d.indicator, "known": d.known, "shares": shares})
        })
        .collect()
}

fn diagnostics_js(d: &Diagnostics) -> JSValue {
    let livelihoods: Vec<JSValue> = d
        .zero_spending_livelihoods
        .iter()
        .map(|(name, share)| json!({"activity": name, "meanShare": round4(*share)}))
        .collect();
    json!({
        "expenditure": describe_table_js(&d.expenditure),
        "expenditureByFcs": describe_table_js(&d.expenditure_by_fcs),
        "foodGroupFrequencies": describe_table_js(&d.food_group_frequencies),
        "zeroSpendingHouseholds": d.zero_spending_households,
        "zeroSpendingLivelihoods": livelihoods,
        "zeroSpendingPurchaseShare": d.zero_spending_purchase_share.map(round4),
    })
}

fn build_summary_js(
    config: &QcConfig,
    sources: &[(String, FileSource)],
    records: &[HouseholdRecord],
    flags: &[FlagResult],
    settings: &AnalysisSettings,
) -> JSValue {
    let correlations = run_correlations(records);

    let indicators: Vec<JSValue> = indicator_summary(records)
        .iter()
        .map(|s| {
            json!({
                "name": s.name,
                "computed": s.computed,
                "indeterminate": s.indeterminate,
                "unmapped": s.unmapped,
                "lookupMisses": s.lookup_misses,
            })
        })
        .collect();

    let p = progress(records, settings);
    let progress_js = json!({
        "interviews": p.interviews,
        "target": p.target,
        "percentOfTarget": round4(p.percent_of_target),
        "meanHouseholdSize": p.mean_household_size.map(round4),
        "byGender": p.by_gender,
        "byResidence": p.by_residence,
        "byState": p.by_state,
    });

    let source_names: Vec<String> = sources
        .iter()
        .map(|(_, cfs)| simplify_file_name(&cfs.file_path))
        .collect();

    json!({
        "config": {
            "surveyName": config.output_settings.survey_name,
            "sources": source_names,
        },
        "records": records.len(),
        "derivedDigest": derived_digest(records),
        "indicators": indicators,
        "distributions": distributions_js(&category_distributions(records)),
        "flags": flags_js(flags),
        "correlations": correlations_js(&correlations),
        "descriptives": diagnostics_js(&diagnostics(records)),
        "progress": progress_js,
    })
}

fn write_summary(out: Option<&str>, pretty_js: &str) -> QcResult<()> {
    match out {
        None | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some("") => {
            debug!("write_summary: no output requested");
        }
        Some(path) => {
            fs::write(path, pretty_js).context(CreatingOutputSnafu { path })?;
            info!("write_summary: summary written to {:?}", path);
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> QcResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("check_reference: the summary matches {:?}", reference_path);
    Ok(())
}

/// Runs the whole analysis: reads the data sources, augments the records,
/// runs the checks, writes the exports and returns the summary.
pub fn run_analysis(args: &Args) -> BQcResult<JSValue> {
    let (config, root) = match args.config.as_deref() {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu { path: config_path })?
                .to_path_buf();
            (config, root)
        }
        None => (QcConfig::default(), PathBuf::from(".")),
    };
    info!("config: {:?}", config);

    let settings = config.settings()?;
    let overrides = config.field_overrides();

    let sources = data_sources(args, &config, &root);
    if sources.is_empty() {
        return Err(Box::new(QcError::NoDataSources {}));
    }

    let mut records: Vec<HouseholdRecord> = Vec::new();
    for (path, cfs) in sources.iter() {
        let mut file_data = read_household_data(path, cfs, &overrides, &settings.labels)?;
        records.append(&mut file_data);
    }
    info!("run_analysis: {} households read", records.len());

    augment(&mut records, &settings);

    let flags = run_checks(&records, &settings);
    let result_js = build_summary_js(&config, &sources, &records, &flags, &settings);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(args.out.as_deref(), &pretty_js_stats)?;

    let output_dir: Option<PathBuf> = match args.output_dir.as_deref() {
        Some(dir) => Some(PathBuf::from(dir)),
        None => config
            .output_settings
            .output_directory
            .as_ref()
            .map(|dir| root.join(dir)),
    };
    if let Some(dir) = output_dir {
        let export_subsets = config.output_settings.export_flagged_subsets.unwrap_or(true);
        export::export_all(&dir, &records, &flags, export_subsets)?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = args.reference.as_deref() {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(result_js)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata")
    }

    fn scratch_dir(test_name: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("fsqc-{}-{}", test_name, std::process::id()));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn run_test(test_name: &str, args: Args) -> BQcResult<JSValue> {
        let _ = env_logger::builder().is_test(true).try_init();
        info!("Running test {}", test_name);
        let res = run_analysis(&args);
        if let Err(e) = res.as_ref() {
            warn!("Error occured {:?}", e);
        }
        res
    }

    fn fixture_args(test_name: &str) -> Args {
        Args {
            config: Some(
                test_dir()
                    .join(format!("{}_config.json", test_name))
                    .display()
                    .to_string(),
            ),
            out: Some(String::new()),
            ..Default::default()
        }
    }

    fn flag<'a>(js: &'a JSValue, name: &str) -> &'a JSValue {
        js["flags"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == name)
            .unwrap()
    }

    fn flagged_ids(js: &JSValue, name: &str) -> Vec<String> {
        flag(js, name)["ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|x| x.as_str().unwrap().to_string())
            .collect()
    }

    fn share_count(js: &JSValue, indicator: &str, label: &str) -> u64 {
        js["distributions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["indicator"] == indicator)
            .unwrap()["shares"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["label"] == label)
            .unwrap()["count"]
            .as_u64()
            .unwrap()
    }

    #[test]
    fn basic_survey() {
        let js = run_test("basic_survey", fixture_args("basic_survey")).unwrap();
        assert_eq!(js["records"], 6);
        assert_eq!(js["config"]["surveyName"], "Basic survey");
        assert_eq!(js["derivedDigest"].as_str().unwrap().len(), 64);

        assert_eq!(share_count(&js, "fcs_categories", "Acceptable"), 2);
        assert_eq!(share_count(&js, "fcs_categories", "Borderline"), 1);
        assert_eq!(share_count(&js, "fcs_categories", "Poor"), 3);
        assert_eq!(share_count(&js, "LCS", "Emergency"), 1);

        assert_eq!(flagged_ids(&js, "food_con_7days_sum_zero"), vec!["hh-03"]);
        assert_eq!(
            flagged_ids(&js, "expenditure_food_items_too_low_zero"),
            vec!["hh-03"]
        );
        assert_eq!(flagged_ids(&js, "very_low_fcs"), vec!["hh-03"]);
        assert_eq!(
            flagged_ids(&js, "expenditure_education_gt_0_no_child"),
            vec!["hh-04"]
        );
        assert_eq!(flagged_ids(&js, "fcs_acceptable_hhs_severe"), vec!["hh-05"]);
        assert_eq!(flagged_ids(&js, "invalid_current_live_Income_Total"), vec!["hh-06"]);
        assert_eq!(flagged_ids(&js, "hhs_q3_gt_0_q1_q2_0"), vec!["hh-06"]);

        assert_eq!(js["progress"]["interviews"], 6);
        assert_eq!(js["progress"]["byState"]["Khartoum"], 4);
        assert_eq!(js["progress"]["byGender"]["Female"], 2);
    }

    #[test]
    fn summary_matches_reference() {
        let dir = scratch_dir("reference");
        let summary_p = dir.join("summary.json").display().to_string();
        let mut args = fixture_args("basic_survey");
        args.out = Some(summary_p.clone());
        let first = run_test("reference_write", args).unwrap();

        let mut args = fixture_args("basic_survey");
        args.reference = Some(summary_p.clone());
        let second = run_test("reference_check", args).unwrap();
        assert_eq!(first, second);

        // A tampered reference fails the run.
        let mut tampered = first.clone();
        tampered["records"] = json!(7);
        fs::write(&summary_p, serde_json::to_string_pretty(&tampered).unwrap()).unwrap();
        let mut args = fixture_args("basic_survey");
        args.reference = Some(summary_p);
        assert!(run_test("reference_tampered", args).is_err());
    }

    #[test]
    fn exports() {
        let dir = scratch_dir("exports");
        let mut args = fixture_args("basic_survey");
        args.output_dir = Some(dir.display().to_string());
        run_test("exports", args).unwrap();

        let augmented = fs::read_to_string(dir.join("augmented.csv")).unwrap();
        let lines: Vec<&str> = augmented.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("id,state_code,"));
        assert!(lines[3].starts_with("hh-03,"));

        let subset = fs::read_to_string(dir.join("flags").join("very_low_fcs.csv")).unwrap();
        assert_eq!(subset.lines().count(), 2);
        assert!(!dir.join("flags").join("fcs_rCSI.csv").exists());
    }

    #[test]
    fn exports_are_byte_stable() {
        let read = |name: &str| {
            let dir = scratch_dir(name);
            let mut args = fixture_args("basic_survey");
            args.output_dir = Some(dir.display().to_string());
            run_test(name, args).unwrap();
            fs::read(dir.join("augmented.csv")).unwrap()
        };
        assert_eq!(read("stable_1"), read("stable_2"));
    }

    #[test]
    fn renamed_columns() {
        let js = run_test("renamed_columns", fixture_args("renamed_columns")).unwrap();
        assert_eq!(js["records"], 2);
        // No idColumn: the identifiers come from the file name and the line number.
        let ids = flagged_ids(&js, "food_con_7days_sum_zero");
        assert_eq!(ids, vec!["renamed_columns.tsv-00000003"]);
        assert_eq!(js["progress"]["meanHouseholdSize"], 4.5);
    }

    #[test]
    fn household_ids_from_table_path() {
        let config_p = test_dir().join("renamed_columns_config.json");
        let config = read_config(&config_p.display().to_string()).unwrap();
        let settings = config.settings().unwrap();
        let path = test_dir().join("renamed_columns.tsv").display().to_string();
        let records = read_household_data(
            &path,
            &config.data_sources[0],
            &config.field_overrides(),
            &settings.labels,
        )
        .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["renamed_columns.tsv-00000002", "renamed_columns.tsv-00000003"]
        );
    }

    #[test]
    fn missing_column_is_fatal() {
        let res = run_test("missing_column", fixture_args("missing_column"));
        match res.map_err(|e| *e) {
            Err(QcError::Schema { source, .. }) => match source {
                SchemaError::MissingColumn { field, .. } => assert_eq!(field, "FCSDairy"),
                e => panic!("unexpected schema error {:?}", e),
            },
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn command_line_input() {
        let args = Args {
            input: Some(test_dir().join("basic_survey.csv").display().to_string()),
            out: Some(String::new()),
            ..Default::default()
        };
        let js = run_test("command_line_input", args).unwrap();
        assert_eq!(js["records"], 6);
        assert_eq!(js["config"]["surveyName"], JSValue::Null);
        assert_eq!(js["config"]["sources"][0], "basic_survey.csv");
    }

    #[test]
    fn no_sources() {
        let args = Args {
            out: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            run_test("no_sources", args).map_err(|e| *e),
            Err(QcError::NoDataSources {})
        ));
    }

    #[test]
    fn providers() {
        assert_eq!(guess_provider("a/b/survey.XLSX"), "xlsx");
        assert_eq!(guess_provider("survey.tsv"), "tsv");
        assert_eq!(guess_provider("survey"), "csv");
        let args = Args {
            input: Some("survey.sav".to_string()),
            input_type: Some("spss".to_string()),
            out: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            run_test("unknown_provider", args).map_err(|e| *e),
            Err(QcError::UnknownProvider { .. })
        ));
    }
}
