/*!
The questionnaire field catalog.

Every answer used by the indicators is a typed [Field]. Columns of the
input dataset are resolved to fields once, when the header is read, so
that a renamed or missing column fails the whole run before any
computation happens.
*/

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use log::{debug, info};

use crate::config::*;

/// A semantic field of the household questionnaire.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Field {
    StateCode,
    Enumerator,
    Day,
    HouseholdSize,
    Gender,
    Residence,
    /// Children aged 24 months to 17 years, one column per age band and sex.
    Children(usize),
    FoodDays(FoodGroup),
    FoodSource(FoodGroup),
    Food24h(FoodGroup),
    Rcsi(RcsiStrategy),
    Hhs(HhsQuestion),
    Lcs(LcsStrategy),
    FoodExpenditure(usize),
    EducationExpenditure(usize),
    Livelihood(LivelihoodActivity),
    Livestock(Livestock),
}

const CHILDREN_COLUMNS: [&str; NUM_CHILD_COLUMNS] = [
    "Q2_7_2a", "Q2_7_2b", "Q2_7_3a", "Q2_7_3b", "Q2_7_4a", "Q2_7_4b",
];

const EXPENDITURE_SUFFIXES: [&str; 3] = ["a", "b", "c"];

impl Field {
    /// All the fields, in the column order of the exported datasets.
    pub fn all() -> Vec<Field> {
        let mut res = vec![
            Field::StateCode,
            Field::Enumerator,
            Field::Day,
            Field::HouseholdSize,
            Field::Gender,
            Field::Residence,
        ];
        res.extend((0..NUM_CHILD_COLUMNS).map(Field::Children));
        for group in FoodGroup::ALL {
            res.push(Field::FoodDays(group));
            res.push(Field::FoodSource(group));
            res.push(Field::Food24h(group));
        }
        res.extend(RcsiStrategy::ALL.iter().map(|s| Field::Rcsi(*s)));
        res.extend(HhsQuestion::ALL.iter().map(|q| Field::Hhs(*q)));
        res.extend(LcsStrategy::ALL.iter().map(|s| Field::Lcs(*s)));
        res.extend((0..NUM_FOOD_EXPENDITURE_COLUMNS).map(Field::FoodExpenditure));
        res.extend((0..NUM_EDUCATION_EXPENDITURE_COLUMNS).map(Field::EducationExpenditure));
        res.extend(LivelihoodActivity::ALL.iter().map(|a| Field::Livelihood(*a)));
        res.extend(Livestock::ALL.iter().map(|l| Field::Livestock(*l)));
        res
    }

    /// The semantic name, as used in the field mapping of the configuration.
    pub fn name(&self) -> String {
        match self {
            Field::StateCode => "state_code".to_string(),
            Field::Enumerator => "enumerator".to_string(),
            Field::Day => "day".to_string(),
            Field::HouseholdSize => "household_size".to_string(),
            Field::Gender => "gender".to_string(),
            Field::Residence => "residence_status".to_string(),
            Field::Children(idx) => format!("children_24m_17y_{}", idx + 1),
            Field::FoodDays(g) => g.var_name().to_string(),
            Field::FoodSource(g) => format!("{}_source", g.var_name()),
            Field::Food24h(g) => format!("{}_24h", g.var_name()),
            Field::Rcsi(s) => s.var_name().to_string(),
            Field::Hhs(q) => q.var_name().to_string(),
            Field::Lcs(s) => s.var_name().to_string(),
            Field::FoodExpenditure(idx) => format!("food_expenditure_{}", idx + 1),
            Field::EducationExpenditure(idx) => format!("education_expenditure_{}", idx + 1),
            Field::Livelihood(a) => a.var_name().to_string(),
            Field::Livestock(l) => l.var_name().to_string(),
        }
    }

    /// The questionnaire column codes looked up when no mapping is configured.
    /// The first code present in the header wins.
    pub fn default_columns(&self) -> Vec<String> {
        match self {
            Field::StateCode => vec!["QState".to_string()],
            Field::Enumerator => vec!["enumerator".to_string()],
            Field::Day => vec!["day".to_string()],
            Field::HouseholdSize => vec!["Q2_7".to_string()],
            Field::Gender => vec!["Q2_2".to_string(), "Q2_2a".to_string()],
            Field::Residence => vec!["Q2_1".to_string()],
            Field::Children(idx) => vec![CHILDREN_COLUMNS[*idx].to_string()],
            Field::FoodDays(g) => vec![format!("{}a", g.code())],
            Field::FoodSource(g) => vec![format!("{}b", g.code())],
            Field::Food24h(g) => vec![format!("{}c", g.code())],
            Field::Rcsi(s) => vec![s.code().to_string()],
            Field::Hhs(q) => vec![q.code().to_string()],
            Field::Lcs(s) => vec![s.code()],
            Field::FoodExpenditure(idx) => vec![format!(
                "Q4_{}{}",
                idx / 3 + 1,
                EXPENDITURE_SUFFIXES[idx % 3]
            )],
            Field::EducationExpenditure(idx) => {
                vec![format!("Q4_14{}", EXPENDITURE_SUFFIXES[*idx])]
            }
            Field::Livelihood(a) => vec![a.code()],
            Field::Livestock(l) => vec![l.code()],
        }
    }

    /// Optional fields are left empty when their column is absent.
    pub fn is_required(&self) -> bool {
        !matches!(
            self,
            Field::Enumerator
                | Field::Day
                | Field::Gender
                | Field::Residence
                | Field::Livestock(_)
        )
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::all().into_iter().find(|f| f.name() == name)
    }
}

/// Fatal errors: the dataset cannot be mapped onto the questionnaire.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SchemaError {
    MissingColumn {
        field: String,
        candidates: Vec<String>,
    },
    UnknownField(String),
}

impl Error for SchemaError {}

impl Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::MissingColumn { field, candidates } => write!(
                f,
                "required field {} not found in the dataset: expected one of the columns {:?}",
                field, candidates
            ),
            SchemaError::UnknownField(name) => {
                write!(f, "the field mapping refers to an unknown field: {}", name)
            }
        }
    }
}

/// The position of every field in the rows of one dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnLayout {
    id_column: Option<usize>,
    columns: Vec<(Field, Option<usize>)>,
}

impl ColumnLayout {
    /// Resolves the fields against a header.
    ///
    /// `overrides` maps semantic field names to alternative column codes. It
    /// replaces the default codes of the fields it names.
    pub fn resolve(
        header: &[String],
        overrides: &BTreeMap<String, Vec<String>>,
        id_column: Option<&str>,
    ) -> Result<ColumnLayout, SchemaError> {
        for name in overrides.keys() {
            if Field::from_name(name).is_none() {
                return Err(SchemaError::UnknownField(name.clone()));
            }
        }
        let position = |code: &str| header.iter().position(|h| h.trim() == code);

        let id_column = match id_column {
            Some(code) => match position(code) {
                Some(idx) => Some(idx),
                None => {
                    return Err(SchemaError::MissingColumn {
                        field: "id".to_string(),
                        candidates: vec![code.to_string()],
                    })
                }
            },
            None => None,
        };

        let mut columns = Vec::new();
        for field in Field::all() {
            let candidates = overrides
                .get(&field.name())
                .cloned()
                .unwrap_or_else(|| field.default_columns());
            let found = candidates.iter().find_map(|c| position(c));
            match found {
                Some(idx) => {
                    debug!("resolve: field {} -> column {:?}", field.name(), header[idx]);
                }
                None if field.is_required() => {
                    return Err(SchemaError::MissingColumn {
                        field: field.name(),
                        candidates,
                    });
                }
                None => {
                    debug!("resolve: optional field {} absent", field.name());
                }
            }
            columns.push((field, found));
        }
        info!(
            "resolve: {} of {} fields mapped",
            columns.iter().filter(|(_, c)| c.is_some()).count(),
            columns.len()
        );
        Ok(ColumnLayout { id_column, columns })
    }

    pub fn column_of(&self, field: Field) -> Option<usize> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, c)| *c)
    }

    /// Reads one row. Cells are never an error: blank or non-numeric cells
    /// become empty fields.
    pub fn read_record(&self, row: &[String], default_id: &str, labels: &CodeLabels) -> HouseholdRecord {
        let cell = |idx: Option<usize>| -> Option<&str> {
            idx.and_then(|i| row.get(i))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };
        let id = cell(self.id_column)
            .map(|s| s.to_string())
            .unwrap_or_else(|| default_id.to_string());
        let mut record = HouseholdRecord {
            id,
            ..Default::default()
        };
        for (field, idx) in self.columns.iter() {
            let raw = cell(*idx);
            match field {
                Field::Enumerator => record.enumerator = raw.map(|s| s.to_string()),
                Field::Day => record.day = raw.map(|s| s.to_string()),
                Field::Gender => record.gender = raw.map(|s| apply_label(s, &labels.genders)),
                Field::Residence => {
                    record.residence = raw.map(|s| apply_label(s, &labels.residences))
                }
                Field::StateCode => {
                    let code = raw.and_then(parse_code);
                    record.state_code = code;
                    record.state = code.and_then(|c| labels.states.get(&c).cloned());
                }
                f => record.set_numeric(*f, raw.and_then(parse_number)),
            }
        }
        record
    }
}

fn apply_label(raw: &str, table: &BTreeMap<i64, String>) -> String {
    parse_code(raw)
        .and_then(|code| table.get(&code).cloned())
        .unwrap_or_else(|| raw.to_string())
}

/// Parses a numeric cell. Only finite values are kept.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Parses an integral code, such as `3` or `3.0`.
pub fn parse_code(raw: &str) -> Option<i64> {
    parse_number(raw).filter(|x| x.fract() == 0.0).map(|x| x as i64)
}

/// A deterministic textual form: integral values print without a decimal point.
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

impl HouseholdRecord {
    /// The numeric answer of a field. Text fields return `None`.
    pub fn numeric(&self, field: Field) -> Option<f64> {
        match field {
            Field::StateCode => self.state_code.map(|c| c as f64),
            Field::Enumerator | Field::Day | Field::Gender | Field::Residence => None,
            Field::HouseholdSize => self.household_size,
            Field::Children(idx) => self.children[idx],
            Field::FoodDays(g) => self.food(g).days_7d,
            Field::FoodSource(g) => self.food(g).source,
            Field::Food24h(g) => self.food(g).ate_24h,
            Field::Rcsi(s) => self.rcsi_answer(s),
            Field::Hhs(q) => self.hhs_answer(q),
            Field::Lcs(s) => self.lcs_answer(s),
            Field::FoodExpenditure(idx) => self.food_expenditure[idx],
            Field::EducationExpenditure(idx) => self.education_expenditure[idx],
            Field::Livelihood(a) => self.livelihood_shares[a.index()],
            Field::Livestock(l) => self.livestock[l.index()],
        }
    }

    pub fn set_numeric(&mut self, field: Field, value: Option<f64>) {
        match field {
            Field::StateCode => self.state_code = value.map(|v| v as i64),
            Field::Enumerator | Field::Day | Field::Gender | Field::Residence => {}
            Field::HouseholdSize => self.household_size = value,
            Field::Children(idx) => self.children[idx] = value,
            Field::FoodDays(g) => self.food[g.index()].days_7d = value,
            Field::FoodSource(g) => self.food[g.index()].source = value,
            Field::Food24h(g) => self.food[g.index()].ate_24h = value,
            Field::Rcsi(s) => self.rcsi[s.index()] = value,
            Field::Hhs(q) => self.hhs[q.index()] = value,
            Field::Lcs(s) => self.lcs[s.index()] = value,
            Field::FoodExpenditure(idx) => self.food_expenditure[idx] = value,
            Field::EducationExpenditure(idx) => self.education_expenditure[idx] = value,
            Field::Livelihood(a) => self.livelihood_shares[a.index()] = value,
            Field::Livestock(l) => self.livestock[l.index()] = value,
        }
    }

    /// The cell of a field in the exported dataset. Blank when empty.
    pub fn render(&self, field: Field) -> String {
        match field {
            Field::Enumerator => self.enumerator.clone().unwrap_or_default(),
            Field::Day => self.day.clone().unwrap_or_default(),
            Field::Gender => self.gender.clone().unwrap_or_default(),
            Field::Residence => self.residence.clone().unwrap_or_default(),
            f => self.numeric(f).map(format_number).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_header() -> Vec<String> {
        Field::all()
            .iter()
            .filter_map(|f| f.default_columns().first().cloned())
            .collect()
    }

    #[test]
    fn catalog_covers_questionnaire() {
        let fields = Field::all();
        assert_eq!(fields.len(), 128);
        assert_eq!(
            Field::FoodExpenditure(0).default_columns(),
            vec!["Q4_1a".to_string()]
        );
        assert_eq!(
            Field::FoodExpenditure(29).default_columns(),
            vec!["Q4_10c".to_string()]
        );
        assert_eq!(
            Field::Lcs(LcsStrategy::GatheredWildFood).default_columns(),
            vec!["Q6_2_10".to_string()]
        );
        assert_eq!(
            Field::Food24h(FoodGroup::OrangeFruit).default_columns(),
            vec!["Q5_6_1c".to_string()]
        );
        for f in fields.iter() {
            assert_eq!(Field::from_name(&f.name()), Some(*f));
        }
    }

    #[test]
    fn resolve_default_header() {
        let header = default_header();
        let layout = ColumnLayout::resolve(&header, &BTreeMap::new(), None).unwrap();
        assert_eq!(layout.column_of(Field::StateCode), Some(0));
        assert_eq!(layout.column_of(Field::HouseholdSize), Some(3));
    }

    #[test]
    fn resolve_missing_required_column() {
        let header: Vec<String> = default_header()
            .into_iter()
            .filter(|h| h != "Q5_1a")
            .collect();
        let err = ColumnLayout::resolve(&header, &BTreeMap::new(), None).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                field: "FCSStap".to_string(),
                candidates: vec!["Q5_1a".to_string()]
            }
        );
    }

    #[test]
    fn resolve_optional_and_alternatives() {
        let header: Vec<String> = default_header()
            .into_iter()
            .filter(|h| h != "Q2_2" && h != "enumerator" && !h.starts_with("Q7_2"))
            .chain(vec!["Q2_2a".to_string()])
            .collect();
        let layout = ColumnLayout::resolve(&header, &BTreeMap::new(), None).unwrap();
        assert_eq!(layout.column_of(Field::Gender), Some(header.len() - 1));
        assert_eq!(layout.column_of(Field::Enumerator), None);
        assert_eq!(layout.column_of(Field::Livestock(Livestock::Cattle)), None);
    }

    #[test]
    fn resolve_with_mapping() {
        let header: Vec<String> = default_header()
            .into_iter()
            .map(|h| if h == "Q2_7" { "hh_size".to_string() } else { h })
            .collect();
        let mut mapping = BTreeMap::new();
        mapping.insert(
            "household_size".to_string(),
            vec!["HHSize".to_string(), "hh_size".to_string()],
        );
        let layout = ColumnLayout::resolve(&header, &mapping, None).unwrap();
        assert_eq!(layout.column_of(Field::HouseholdSize), Some(3));

        mapping.insert("hh_members".to_string(), vec!["x".to_string()]);
        assert_eq!(
            ColumnLayout::resolve(&header, &mapping, None),
            Err(SchemaError::UnknownField("hh_members".to_string()))
        );
    }

    #[test]
    fn read_record_cells() {
        let header = default_header();
        let layout = ColumnLayout::resolve(&header, &BTreeMap::new(), None).unwrap();
        let mut row: Vec<String> = vec!["".to_string(); header.len()];
        row[0] = "17".to_string();
        row[3] = " 6 ".to_string();
        row[4] = "2".to_string();
        row[5] = "8".to_string();
        let pos = header.iter().position(|h| h == "Q5_1a").unwrap();
        row[pos] = "7".to_string();
        let pos = header.iter().position(|h| h == "Q5_2a").unwrap();
        row[pos] = "n/a".to_string();
        let record = layout.read_record(&row, "hh-1", &CodeLabels::default());
        assert_eq!(record.id, "hh-1");
        assert_eq!(record.state_code, Some(17));
        assert_eq!(record.state, Some("AL Gazira".to_string()));
        assert_eq!(record.household_size, Some(6.0));
        assert_eq!(record.gender, Some("Female".to_string()));
        assert_eq!(
            record.residence,
            Some("IDP hosted in the community/living with resident families".to_string())
        );
        assert_eq!(record.food(FoodGroup::Cereals).days_7d, Some(7.0));
        assert_eq!(record.food(FoodGroup::Pulses).days_7d, None);
        assert_eq!(record.enumerator, None);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(12.25), "12.25");
        assert_eq!(parse_code("3.0"), Some(3));
        assert_eq!(parse_code("3.5"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
