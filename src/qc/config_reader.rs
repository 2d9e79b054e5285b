use std::collections::BTreeMap;

use crate::qc::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "exportFlaggedSubsets")]
    pub export_flagged_subsets: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub delimiter: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// The column holding the household identifier. By default the
    /// identifier is built from the file name and the line number.
    #[serde(rename = "idColumn")]
    pub id_column: Option<String>,
}

impl FileSource {
    pub fn delimiter_byte(&self) -> QcResult<u8> {
        let default = match self.provider.as_str() {
            "tsv" => "\t",
            _ => ",",
        };
        match self.delimiter.as_deref().unwrap_or(default).as_bytes() {
            [b] => Ok(*b),
            _ => whatever!(
                "the delimiter of {} must be a single character, got {:?}",
                self.file_path,
                self.delimiter
            ),
        }
    }
}

/// A questionnaire column, or a list of alternative columns where the first one present wins.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    One(String),
    AnyOf(Vec<String>),
}

impl ColumnRef {
    pub fn codes(&self) -> Vec<String> {
        match self {
            ColumnRef::One(s) => vec![s.clone()],
            ColumnRef::AnyOf(l) => l.clone(),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExchangeRatesConfig {
    pub official: Option<f64>,
    #[serde(rename = "otherMarket")]
    pub other_market: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ThresholdsConfig {
    #[serde(rename = "veryLowFcs")]
    pub very_low_fcs: Option<f64>,
    #[serde(rename = "poorSpendingQuantile")]
    pub poor_spending_quantile: Option<f64>,
    #[serde(rename = "highHouseholdSpending")]
    pub high_household_spending: Option<f64>,
    #[serde(rename = "highPerCapitaSpending")]
    pub high_per_capita_spending: Option<f64>,
    #[serde(rename = "lowHouseholdSpending")]
    pub low_household_spending: Option<f64>,
    #[serde(rename = "highRcsi")]
    pub high_rcsi: Option<f64>,
    #[serde(rename = "lowRcsi")]
    pub low_rcsi: Option<f64>,
    #[serde(rename = "highHhs")]
    pub high_hhs: Option<f64>,
    #[serde(rename = "lowStapleDays")]
    pub low_staple_days: Option<f64>,
    #[serde(rename = "incomeSharesTotal")]
    pub income_shares_total: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct QcConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSources", default)]
    pub data_sources: Vec<FileSource>,
    #[serde(rename = "fieldMapping", default)]
    pub field_mapping: BTreeMap<String, ColumnRef>,
    #[serde(rename = "stateLabels")]
    pub state_labels: Option<BTreeMap<i64, String>>,
    #[serde(rename = "genderLabels")]
    pub gender_labels: Option<BTreeMap<i64, String>>,
    #[serde(rename = "residenceLabels")]
    pub residence_labels: Option<BTreeMap<i64, String>>,
    #[serde(rename = "mebByState")]
    pub meb_by_state: Option<BTreeMap<String, f64>>,
    #[serde(rename = "exchangeRates")]
    pub exchange_rates: Option<ExchangeRatesConfig>,
    pub thresholds: Option<ThresholdsConfig>,
    #[serde(rename = "lcsUsedCodes")]
    pub lcs_used_codes: Option<Vec<i64>>,
    #[serde(rename = "purchaseSourceCodes")]
    pub purchase_source_codes: Option<Vec<i64>>,
    #[serde(rename = "capFrequencies")]
    pub cap_frequencies: Option<bool>,
    #[serde(rename = "sampleTarget")]
    pub sample_target: Option<u64>,
}

impl QcConfig {
    /// The analysis settings, starting from the defaults.
    pub fn settings(&self) -> QcResult<AnalysisSettings> {
        let d = AnalysisSettings::default();
        let rates = self.exchange_rates.clone().unwrap_or_default();
        let exchange_rates = ExchangeRates {
            official: rates.official.unwrap_or(d.exchange_rates.official),
            other_market: rates.other_market.unwrap_or(d.exchange_rates.other_market),
        };
        for (name, rate) in [
            ("official", exchange_rates.official),
            ("otherMarket", exchange_rates.other_market),
        ] {
            if !(rate > 0.0) {
                whatever!("exchange rate {} must be positive, got {}", name, rate);
            }
        }

        let t = self.thresholds.clone().unwrap_or_default();
        let dt = d.thresholds;
        let thresholds = FlagThresholds {
            very_low_fcs: t.very_low_fcs.unwrap_or(dt.very_low_fcs),
            poor_spending_quantile: t.poor_spending_quantile.unwrap_or(dt.poor_spending_quantile),
            high_household_spending: t
                .high_household_spending
                .unwrap_or(dt.high_household_spending),
            high_per_capita_spending: t
                .high_per_capita_spending
                .unwrap_or(dt.high_per_capita_spending),
            low_household_spending: t
                .low_household_spending
                .unwrap_or(dt.low_household_spending),
            high_rcsi: t.high_rcsi.unwrap_or(dt.high_rcsi),
            low_rcsi: t.low_rcsi.unwrap_or(dt.low_rcsi),
            high_hhs: t.high_hhs.unwrap_or(dt.high_hhs),
            low_staple_days: t.low_staple_days.unwrap_or(dt.low_staple_days),
            income_shares_total: t.income_shares_total.unwrap_or(dt.income_shares_total),
        };
        if !(0.0..=1.0).contains(&thresholds.poor_spending_quantile) {
            whatever!(
                "poorSpendingQuantile must be between 0 and 1, got {}",
                thresholds.poor_spending_quantile
            );
        }

        let labels = CodeLabels {
            states: self.state_labels.clone().unwrap_or(d.labels.states),
            genders: self.gender_labels.clone().unwrap_or(d.labels.genders),
            residences: self.residence_labels.clone().unwrap_or(d.labels.residences),
        };

        Ok(AnalysisSettings {
            cap_frequencies: self.cap_frequencies.unwrap_or(d.cap_frequencies),
            lcs_used_codes: self.lcs_used_codes.clone().unwrap_or(d.lcs_used_codes),
            purchase_source_codes: self
                .purchase_source_codes
                .clone()
                .unwrap_or(d.purchase_source_codes),
            exchange_rates,
            thresholds,
            meb_by_state: self.meb_by_state.clone().unwrap_or(d.meb_by_state),
            labels,
            sample_target: self.sample_target.unwrap_or(d.sample_target),
        })
    }

    pub fn field_overrides(&self) -> BTreeMap<String, Vec<String>> {
        self.field_mapping
            .iter()
            .map(|(field, cols)| (field.clone(), cols.codes()))
            .collect()
    }
}

pub fn read_config(path: &str) -> QcResult<QcConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: QcConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> QcResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: QcConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.settings().unwrap(), AnalysisSettings::default());
        assert!(config.field_overrides().is_empty());
    }

    #[test]
    fn config_overrides() {
        let js = r#"{
            "outputSettings": {"surveyName": "FSMS round 2"},
            "dataSources": [{"provider": "tsv", "filePath": "survey.tsv", "idColumn": "_uuid"}],
            "fieldMapping": {"household_size": "HHSize", "gender": ["Q2_2", "RespSex"]},
            "stateLabels": {"1": "North Darfur", "2": "South Darfur"},
            "mebByState": {"North Darfur": 400},
            "exchangeRates": {"otherMarket": 2500},
            "thresholds": {"highRcsi": 20},
            "lcsUsedCodes": [2, 3, 4],
            "capFrequencies": false
        }"#;
        let config: QcConfig = serde_json::from_str(js).unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.exchange_rates.official, 1987.0);
        assert_eq!(settings.exchange_rates.other_market, 2500.0);
        assert_eq!(settings.thresholds.high_rcsi, 20.0);
        assert_eq!(settings.thresholds.low_rcsi, 4.0);
        assert_eq!(settings.lcs_used_codes, vec![2, 3, 4]);
        assert!(!settings.cap_frequencies);
        assert_eq!(settings.labels.states.len(), 2);
        assert_eq!(settings.labels.genders.get(&2), Some(&"Female".to_string()));
        assert_eq!(settings.meb_by_state.get("North Darfur"), Some(&400.0));
        assert_eq!(settings.meb_by_state.get("Khartoum"), None);
        let overrides = config.field_overrides();
        assert_eq!(overrides["household_size"], vec!["HHSize".to_string()]);
        assert_eq!(overrides["gender"].len(), 2);
        assert_eq!(config.data_sources[0].delimiter_byte().unwrap(), b'\t');
    }

    #[test]
    fn invalid_settings() {
        let config: QcConfig =
            serde_json::from_str(r#"{"thresholds": {"poorSpendingQuantile": 75}}"#).unwrap();
        assert!(config.settings().is_err());
        let config: QcConfig =
            serde_json::from_str(r#"{"exchangeRates": {"official": 0}}"#).unwrap();
        assert!(config.settings().is_err());
        let source = FileSource {
            provider: "csv".to_string(),
            file_path: "x.csv".to_string(),
            delimiter: Some(";;".to_string()),
            excel_worksheet_name: None,
            id_column: None,
        };
        assert!(source.delimiter_byte().is_err());
    }
}
