use log::{debug, info};

use crate::config::*;
use crate::schema::Field;
use crate::stats::{self, Correlation};

/// A row-level quality check.
///
/// Every check reads the augmented records and never modifies them.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Check {
    ZeroFoodExpenditure,
    EducationWithoutChildren,
    InvalidIncomeShares,
    NoFoodConsumption,
    /// Eaten over the last 24 hours, but on no day of the last 7 days.
    RecallUnderReported(FoodGroup),
    /// Not eaten over the last 24 hours, but on each of the last 7 days.
    RecallOverReported(FoodGroup),
    FrequencyOutOfRange,
    VeryLowFcs,
    HighSpendingPoorFcs,
    HighFoodSpending,
    HighPerCapitaSpending,
    HighHouseholdLowPerCapita,
    LowFoodSpending,
    AcceptableFcsSevereHhs,
    AcceptableFcsHighRcsi,
    AcceptableFcsLowRcsiHighHhs,
    LowStapleConsumption,
    SpendingAboveMebPoorFcs,
    ZeroSpendingPurchaseSource,
    WholeDayWithoutFoodInHouse,
    WholeDayWithoutSleepHungry,
    WholeDayWithoutEither,
}

impl Check {
    /// The complete catalog, in reporting order.
    pub fn all() -> Vec<Check> {
        let mut res = vec![
            Check::ZeroFoodExpenditure,
            Check::EducationWithoutChildren,
            Check::InvalidIncomeShares,
            Check::NoFoodConsumption,
        ];
        res.extend(FoodGroup::ALL.iter().map(|g| Check::RecallUnderReported(*g)));
        res.extend(FoodGroup::ALL.iter().map(|g| Check::RecallOverReported(*g)));
        res.extend(vec![
            Check::FrequencyOutOfRange,
            Check::VeryLowFcs,
            Check::HighSpendingPoorFcs,
            Check::HighFoodSpending,
            Check::HighPerCapitaSpending,
            Check::HighHouseholdLowPerCapita,
            Check::LowFoodSpending,
            Check::AcceptableFcsSevereHhs,
            Check::AcceptableFcsHighRcsi,
            Check::AcceptableFcsLowRcsiHighHhs,
            Check::LowStapleConsumption,
            Check::SpendingAboveMebPoorFcs,
            Check::ZeroSpendingPurchaseSource,
            Check::WholeDayWithoutFoodInHouse,
            Check::WholeDayWithoutSleepHungry,
            Check::WholeDayWithoutEither,
        ]);
        res
    }

    /// A stable identifier, also used to name the exported subsets.
    pub fn name(&self) -> String {
        match self {
            Check::ZeroFoodExpenditure => "expenditure_food_items_too_low_zero".to_string(),
            Check::EducationWithoutChildren => "expenditure_education_gt_0_no_child".to_string(),
            Check::InvalidIncomeShares => "invalid_current_live_Income_Total".to_string(),
            Check::NoFoodConsumption => "food_con_7days_sum_zero".to_string(),
            Check::RecallUnderReported(g) => format!("{}_24h_without_7d", g.slug()),
            Check::RecallOverReported(g) => format!("{}_7d_without_24h", g.slug()),
            Check::FrequencyOutOfRange => "food_frequency_out_of_range".to_string(),
            Check::VeryLowFcs => "very_low_fcs".to_string(),
            Check::HighSpendingPoorFcs => "fcs_poor_high_spending".to_string(),
            Check::HighFoodSpending => "expenditure_food_items_too_high".to_string(),
            Check::HighPerCapitaSpending => "expenditure_food_items_too_high_per_capita".to_string(),
            Check::HighHouseholdLowPerCapita => "expenditure_food_items_high_hh_low_per_capita".to_string(),
            Check::LowFoodSpending => "expenditure_food_items_too_low".to_string(),
            Check::AcceptableFcsSevereHhs => "fcs_acceptable_hhs_severe".to_string(),
            Check::AcceptableFcsHighRcsi => "fcs_acceptable_rcsi_high".to_string(),
            Check::AcceptableFcsLowRcsiHighHhs => "fcs_acceptable_rcsi_low_hhs_high".to_string(),
            Check::LowStapleConsumption => "cereals_tubers_low_days".to_string(),
            Check::SpendingAboveMebPoorFcs => "food_exp_gt_meb_fcs_poor_borderline".to_string(),
            Check::ZeroSpendingPurchaseSource => "zero_spending_purchase_source".to_string(),
            Check::WholeDayWithoutFoodInHouse => "hhs_q3_gt_0_q1_0".to_string(),
            Check::WholeDayWithoutSleepHungry => "hhs_q3_gt_0_q2_0".to_string(),
            Check::WholeDayWithoutEither => "hhs_q3_gt_0_q1_q2_0".to_string(),
        }
    }

    pub fn description(&self, settings: &AnalysisSettings) -> String {
        let t = &settings.thresholds;
        match self {
            Check::ZeroFoodExpenditure => "No spending on food items".to_string(),
            Check::EducationWithoutChildren => {
                "Spending on education but no children aged 24 months to 17 years".to_string()
            }
            Check::InvalidIncomeShares => format!(
                "Livelihood income shares do not add up to {}",
                t.income_shares_total
            ),
            Check::NoFoodConsumption => "No consumption of any food item in the last 7 days".to_string(),
            Check::RecallUnderReported(g) => format!(
                "{} eaten in the last 24 hours but on no day of the last 7 days",
                g.label()
            ),
            Check::RecallOverReported(g) => format!(
                "{} eaten on each of the last 7 days but not in the last 24 hours",
                g.label()
            ),
            Check::FrequencyOutOfRange => {
                "A food group frequency is outside of 0 to 7 days".to_string()
            }
            Check::VeryLowFcs => format!("FCS below {}", t.very_low_fcs),
            Check::HighSpendingPoorFcs => format!(
                "Poor FCS with food spending above the {}th percentile of Poor households",
                t.poor_spending_quantile * 100.0
            ),
            Check::HighFoodSpending => format!(
                "Household food spending above {} USD",
                t.high_household_spending
            ),
            Check::HighPerCapitaSpending => format!(
                "Per capita food spending above {} USD",
                t.high_per_capita_spending
            ),
            Check::HighHouseholdLowPerCapita => format!(
                "Household food spending above {} USD but per capita spending below {} USD",
                t.high_household_spending, t.high_per_capita_spending
            ),
            Check::LowFoodSpending => format!(
                "Household food spending below {} USD",
                t.low_household_spending
            ),
            Check::AcceptableFcsSevereHhs => "Acceptable FCS with severe hunger".to_string(),
            Check::AcceptableFcsHighRcsi => format!("Acceptable FCS with rCSI above {}", t.high_rcsi),
            Check::AcceptableFcsLowRcsiHighHhs => format!(
                "Acceptable FCS, rCSI below {} and HHS above {}",
                t.low_rcsi, t.high_hhs
            ),
            Check::LowStapleConsumption => format!(
                "Cereals and tubers eaten on fewer than {} days",
                t.low_staple_days
            ),
            Check::SpendingAboveMebPoorFcs => {
                "Food spending above the state MEB with Poor or Borderline FCS".to_string()
            }
            Check::ZeroSpendingPurchaseSource => {
                "No food spending while purchase is reported as a main food source".to_string()
            }
            Check::WholeDayWithoutFoodInHouse => {
                "A whole day without eating, but never without food in the house".to_string()
            }
            Check::WholeDayWithoutSleepHungry => {
                "A whole day without eating, but never went to sleep hungry".to_string()
            }
            Check::WholeDayWithoutEither => {
                "A whole day without eating, but neither without food in the house nor went to sleep hungry"
                    .to_string()
            }
        }
    }

    /// Ok(true) if the record is flagged, Ok(false) if it passes, an error if it cannot be decided.
    pub fn evaluate(&self, record: &HouseholdRecord, ctx: &CheckContext) -> IndicatorResult<bool> {
        let ind = record.derived()?;
        let t = &ctx.settings.thresholds;
        let acceptable = is(&ind.fcs_category, FcsCategory::Acceptable);
        match self {
            Check::ZeroFoodExpenditure => test(&ind.expenditure_food_items, |x| x == 0.0),
            Check::EducationWithoutChildren => all_of(&[
                test(&ind.expenditure_education, |x| x > 0.0),
                test(&ind.children_24m_17y, |x| x == 0.0),
            ]),
            Check::InvalidIncomeShares => test(&ind.livelihood_income_total, |x| {
                (x - t.income_shares_total).abs() > 1e-9
            }),
            Check::NoFoodConsumption => test(&ind.food_con_7days_sum, |x| x == 0.0),
            Check::RecallUnderReported(g) => {
                let food = record.food(*g);
                match food.ate_24h {
                    None => Err(IndicatorError::MissingField(Field::Food24h(*g))),
                    Some(ate) if ate == 1.0 => Ok(food.days_7d.map(|d| d == 0.0).unwrap_or(true)),
                    Some(_) => Ok(false),
                }
            }
            Check::RecallOverReported(g) => {
                let food = record.food(*g);
                match (food.ate_24h, food.days_7d) {
                    (None, _) => Err(IndicatorError::MissingField(Field::Food24h(*g))),
                    (Some(ate), _) if ate != 0.0 => Ok(false),
                    (Some(_), None) => Err(IndicatorError::MissingField(Field::FoodDays(*g))),
                    (Some(_), Some(days)) => Ok(days >= 7.0),
                }
            }
            Check::FrequencyOutOfRange => {
                let days: Vec<f64> = FoodGroup::ALL
                    .iter()
                    .filter_map(|g| record.food(*g).days_7d)
                    .collect();
                if days.is_empty() {
                    Err(IndicatorError::MissingField(Field::FoodDays(FoodGroup::Cereals)))
                } else {
                    Ok(days.iter().any(|d| !(0.0..=7.0).contains(d)))
                }
            }
            Check::VeryLowFcs => test(&ind.fcs, |x| x < t.very_low_fcs),
            Check::HighSpendingPoorFcs => {
                let threshold = ctx.poor_spending_threshold.ok_or(IndicatorError::LookupMiss {
                    table: "poor spending quantile",
                    key: FcsCategory::Poor.label().to_string(),
                });
                all_of(&[
                    is(&ind.fcs_category, FcsCategory::Poor),
                    compare(&ind.food_usd_market, &threshold, |x, q| x > q),
                ])
            }
            Check::HighFoodSpending => {
                test(&ind.food_usd_market, |x| x > t.high_household_spending)
            }
            Check::HighPerCapitaSpending => {
                test(&ind.per_capita_usd_market, |x| x > t.high_per_capita_spending)
            }
            Check::HighHouseholdLowPerCapita => all_of(&[
                test(&ind.food_usd_market, |x| x > t.high_household_spending),
                test(&ind.per_capita_usd_market, |x| x < t.high_per_capita_spending),
            ]),
            Check::LowFoodSpending => test(&ind.food_usd_market, |x| x < t.low_household_spending),
            Check::AcceptableFcsSevereHhs => {
                all_of(&[acceptable, is(&ind.hhs_category, HhsCategory::SevereHunger)])
            }
            Check::AcceptableFcsHighRcsi => {
                all_of(&[acceptable, test(&ind.rcsi, |x| x > t.high_rcsi)])
            }
            Check::AcceptableFcsLowRcsiHighHhs => all_of(&[
                acceptable,
                test(&ind.rcsi, |x| x < t.low_rcsi),
                ind.hhs.clone().map(|x| (x as f64) > t.high_hhs),
            ]),
            Check::LowStapleConsumption => record
                .food(FoodGroup::Cereals)
                .days_7d
                .map(|d| d < t.low_staple_days)
                .ok_or(IndicatorError::MissingField(Field::FoodDays(FoodGroup::Cereals))),
            Check::SpendingAboveMebPoorFcs => all_of(&[
                any_of(&[
                    is(&ind.fcs_category, FcsCategory::Poor),
                    is(&ind.fcs_category, FcsCategory::Borderline),
                ]),
                compare(&ind.food_usd_market, &ind.meb_usd, |x, meb| x > meb),
            ]),
            Check::ZeroSpendingPurchaseSource => all_of(&[
                test(&ind.expenditure_food_items, |x| x == 0.0),
                ind.food_source_purchase.clone(),
            ]),
            Check::WholeDayWithoutFoodInHouse => all_of(&[
                hhs_code(ind, HhsQuestion::WholeDayWithoutFood, |c| c > 0),
                hhs_code(ind, HhsQuestion::NoFood, |c| c == 0),
            ]),
            Check::WholeDayWithoutSleepHungry => all_of(&[
                hhs_code(ind, HhsQuestion::WholeDayWithoutFood, |c| c > 0),
                hhs_code(ind, HhsQuestion::SleepHungry, |c| c == 0),
            ]),
            Check::WholeDayWithoutEither => all_of(&[
                hhs_code(ind, HhsQuestion::WholeDayWithoutFood, |c| c > 0),
                hhs_code(ind, HhsQuestion::NoFood, |c| c == 0),
                hhs_code(ind, HhsQuestion::SleepHungry, |c| c == 0),
            ]),
        }
    }
}

fn test<F: Fn(f64) -> bool>(r: &IndicatorResult<f64>, f: F) -> IndicatorResult<bool> {
    r.clone().map(f)
}

fn is<C: PartialEq + Copy>(r: &IndicatorResult<C>, expected: C) -> IndicatorResult<bool> {
    r.clone().map(|c| c == expected)
}

fn compare<F: Fn(f64, f64) -> bool>(
    a: &IndicatorResult<f64>,
    b: &IndicatorResult<f64>,
    f: F,
) -> IndicatorResult<bool> {
    Ok(f(a.clone()?, b.clone()?))
}

fn hhs_code<F: Fn(u8) -> bool>(ind: &Indicators, q: HhsQuestion, f: F) -> IndicatorResult<bool> {
    ind.hhs_codes[q.index()].clone().map(f)
}

/// Three-valued conjunction: a known false condition decides, otherwise any
/// unknown condition makes the result unknown.
pub fn all_of(conditions: &[IndicatorResult<bool>]) -> IndicatorResult<bool> {
    if conditions.iter().any(|c| *c == Ok(false)) {
        return Ok(false);
    }
    match conditions.iter().find_map(|c| c.as_ref().err()) {
        Some(e) => Err(e.clone()),
        None => Ok(true),
    }
}

/// Three-valued disjunction.
pub fn any_of(conditions: &[IndicatorResult<bool>]) -> IndicatorResult<bool> {
    if conditions.iter().any(|c| *c == Ok(true)) {
        return Ok(true);
    }
    match conditions.iter().find_map(|c| c.as_ref().err()) {
        Some(e) => Err(e.clone()),
        None => Ok(false),
    }
}

/// The dataset-wide values some checks compare against.
#[derive(PartialEq, Debug, Clone)]
pub struct CheckContext<'a> {
    pub settings: &'a AnalysisSettings,
    /// The spending quantile of the households with a Poor FCS, in USD at the other-market rate.
    pub poor_spending_threshold: Option<f64>,
}

impl<'a> CheckContext<'a> {
    pub fn new(records: &[HouseholdRecord], settings: &'a AnalysisSettings) -> CheckContext<'a> {
        let poor_spending: Vec<f64> = records
            .iter()
            .filter_map(|r| r.indicators.as_ref())
            .filter(|ind| ind.fcs_category == Ok(FcsCategory::Poor))
            .filter_map(|ind| ind.food_usd_market.clone().ok())
            .collect();
        let poor_spending_threshold =
            stats::quantile(&poor_spending, settings.thresholds.poor_spending_quantile);
        debug!(
            "CheckContext: {} poor households with spending, threshold {:?}",
            poor_spending.len(),
            poor_spending_threshold
        );
        CheckContext {
            settings,
            poor_spending_threshold,
        }
    }
}

/// The outcome of one check over the dataset.
///
/// Every record lands in exactly one of the flagged subset, the passed count
/// and the indeterminate subset.
#[derive(PartialEq, Debug, Clone)]
pub struct FlagResult<'a> {
    pub check: Check,
    pub name: String,
    pub description: String,
    pub flagged: Vec<&'a HouseholdRecord>,
    pub passed: usize,
    pub indeterminate: Vec<(&'a HouseholdRecord, IndicatorError)>,
}

impl<'a> FlagResult<'a> {
    pub fn count(&self) -> usize {
        self.flagged.len()
    }

    /// Records skipped because a lookup table had no entry for them.
    pub fn lookup_misses(&self) -> usize {
        self.indeterminate
            .iter()
            .filter(|(_, e)| e.is_lookup_miss())
            .count()
    }
}

pub fn run_check<'a>(check: Check, records: &'a [HouseholdRecord], ctx: &CheckContext) -> FlagResult<'a> {
    let mut res = FlagResult {
        check,
        name: check.name(),
        description: check.description(ctx.settings),
        flagged: Vec::new(),
        passed: 0,
        indeterminate: Vec::new(),
    };
    for record in records.iter() {
        match check.evaluate(record, ctx) {
            Ok(true) => {
                debug!("run_check: {}: flagged household {}", res.name, record.id);
                res.flagged.push(record);
            }
            Ok(false) => res.passed += 1,
            Err(e) => res.indeterminate.push((record, e)),
        }
    }
    res
}

/// Runs the complete catalog of checks.
pub fn run_checks<'a>(records: &'a [HouseholdRecord], settings: &AnalysisSettings) -> Vec<FlagResult<'a>> {
    let ctx = CheckContext::new(records, settings);
    let res: Vec<FlagResult> = Check::all()
        .into_iter()
        .map(|check| run_check(check, records, &ctx))
        .collect();
    for r in res.iter().filter(|r| r.count() > 0) {
        info!(
            "run_checks: {}: {} flagged, {} passed, {} indeterminate",
            r.name,
            r.count(),
            r.passed,
            r.indeterminate.len()
        );
    }
    res
}

// ******** Correlation diagnostics *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ExpectedSign {
    Positive,
    Negative,
}

/// Dataset-level sanity checks. They describe, they do not flag records.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CorrelationCheck {
    FcsFoodExpenditure,
    FcsRcsi,
}

impl CorrelationCheck {
    pub const ALL: [CorrelationCheck; 2] =
        [CorrelationCheck::FcsFoodExpenditure, CorrelationCheck::FcsRcsi];

    pub fn name(&self) -> &'static str {
        match self {
            CorrelationCheck::FcsFoodExpenditure => "fcs_expenditure_food_items",
            CorrelationCheck::FcsRcsi => "fcs_rCSI",
        }
    }

    pub fn expected(&self) -> ExpectedSign {
        match self {
            CorrelationCheck::FcsFoodExpenditure => ExpectedSign::Positive,
            CorrelationCheck::FcsRcsi => ExpectedSign::Negative,
        }
    }

    fn second(&self, ind: &Indicators) -> IndicatorResult<f64> {
        match self {
            CorrelationCheck::FcsFoodExpenditure => ind.expenditure_food_items.clone(),
            CorrelationCheck::FcsRcsi => ind.rcsi.clone(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct CorrelationReport {
    pub check: CorrelationCheck,
    pub expected: ExpectedSign,
    /// The number of records where both values are known.
    pub count: usize,
    pub pearson: Option<Correlation>,
    pub spearman: Option<Correlation>,
}

impl CorrelationReport {
    /// Whether the Pearson coefficient has the expected sign, if it is defined.
    pub fn matches_expectation(&self) -> Option<bool> {
        self.pearson.map(|c| match self.expected {
            ExpectedSign::Positive => c.coefficient > 0.0,
            ExpectedSign::Negative => c.coefficient < 0.0,
        })
    }
}

pub fn correlation(check: CorrelationCheck, records: &[HouseholdRecord]) -> CorrelationReport {
    let (xs, ys): (Vec<f64>, Vec<f64>) = records
        .iter()
        .filter_map(|r| r.indicators.as_ref())
        .filter_map(|ind| match (ind.fcs.clone(), check.second(ind)) {
            (Ok(x), Ok(y)) => Some((x, y)),
            _ => None,
        })
        .unzip();
    let res = CorrelationReport {
        check,
        expected: check.expected(),
        count: xs.len(),
        pearson: stats::pearson(&xs, &ys),
        spearman: stats::spearman(&xs, &ys),
    };
    info!(
        "correlation: {}: n={} pearson {:?} spearman {:?}",
        check.name(),
        res.count,
        res.pearson,
        res.spearman
    );
    res
}

pub fn run_correlations(records: &[HouseholdRecord]) -> Vec<CorrelationReport> {
    CorrelationCheck::ALL
        .iter()
        .map(|c| correlation(*c, records))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RecordBuilder;
    use crate::indicators::augment;

    fn augmented(mut records: Vec<HouseholdRecord>) -> Vec<HouseholdRecord> {
        augment(&mut records, &AnalysisSettings::default());
        records
    }

    fn flagged_ids(check: Check, records: &[HouseholdRecord]) -> Vec<String> {
        let settings = AnalysisSettings::default();
        let ctx = CheckContext::new(records, &settings);
        run_check(check, records, &ctx)
            .flagged
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    #[test]
    fn catalog_names_are_unique() {
        let all = Check::all();
        assert_eq!(all.len(), 52);
        let mut names: Vec<String> = all.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn three_valued_logic() {
        let unknown: IndicatorResult<bool> = Err(IndicatorError::NotAugmented);
        assert_eq!(all_of(&[Ok(false), unknown.clone()]), Ok(false));
        assert_eq!(all_of(&[Ok(true), unknown.clone()]), unknown);
        assert_eq!(all_of(&[Ok(true), Ok(true)]), Ok(true));
        assert_eq!(any_of(&[Ok(true), unknown.clone()]), Ok(true));
        assert_eq!(any_of(&[Ok(false), unknown.clone()]), unknown);
        assert_eq!(any_of(&[Ok(false), Ok(false)]), Ok(false));
    }

    #[test]
    fn recall_over_reported() {
        let records = augmented(vec![
            RecordBuilder::complete("full_week_no_24h")
                .food_days(FoodGroup::Dairy, 7.0)
                .ate_24h(FoodGroup::Dairy, 0.0)
                .build(),
            RecordBuilder::complete("consistent")
                .food_days(FoodGroup::Dairy, 7.0)
                .ate_24h(FoodGroup::Dairy, 1.0)
                .build(),
        ]);
        assert_eq!(
            flagged_ids(Check::RecallOverReported(FoodGroup::Dairy), &records),
            vec!["full_week_no_24h".to_string()]
        );
        assert!(flagged_ids(Check::RecallOverReported(FoodGroup::Fish), &records).is_empty());
    }

    #[test]
    fn recall_under_reported() {
        let records = augmented(vec![
            RecordBuilder::complete("zero")
                .ate_24h(FoodGroup::Eggs, 1.0)
                .build(),
            RecordBuilder::complete("blank")
                .ate_24h(FoodGroup::Eggs, 1.0)
                .field(Field::FoodDays(FoodGroup::Eggs), None)
                .build(),
            RecordBuilder::complete("ok")
                .ate_24h(FoodGroup::Eggs, 1.0)
                .food_days(FoodGroup::Eggs, 2.0)
                .build(),
            RecordBuilder::complete("unknown")
                .field(Field::Food24h(FoodGroup::Eggs), None)
                .build(),
        ]);
        let settings = AnalysisSettings::default();
        let ctx = CheckContext::new(&records, &settings);
        let res = run_check(Check::RecallUnderReported(FoodGroup::Eggs), &records, &ctx);
        let ids: Vec<&str> = res.flagged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["zero", "blank"]);
        assert_eq!(res.passed, 1);
        assert_eq!(res.indeterminate.len(), 1);
        assert_eq!(res.indeterminate[0].0.id, "unknown");
    }

    #[test]
    fn subsets_partition_the_dataset() {
        let records = augmented(vec![
            RecordBuilder::complete("a").build(),
            RecordBuilder::complete("b").fcs_days(7.0).build(),
            RecordBuilder::new("c").build(),
            RecordBuilder::complete("d")
                .food_expenditure(0, 50000.0)
                .hhs(HhsQuestion::WholeDayWithoutFood, 3.0)
                .build(),
        ]);
        let before = records.clone();
        for res in run_checks(&records, &AnalysisSettings::default()) {
            assert_eq!(
                res.count() + res.passed + res.indeterminate.len(),
                records.len(),
                "{}",
                res.name
            );
            for r in res.flagged.iter() {
                assert!(records.iter().any(|x| std::ptr::eq(x, *r)));
            }
        }
        assert_eq!(records, before);
    }

    #[test]
    fn no_consumption_scenario() {
        let records = augmented(vec![
            RecordBuilder::complete("none").build(),
            RecordBuilder::complete("some").food_days(FoodGroup::Oil, 2.0).build(),
        ]);
        assert_eq!(
            flagged_ids(Check::NoFoodConsumption, &records),
            vec!["none".to_string()]
        );
        assert_eq!(
            flagged_ids(Check::ZeroFoodExpenditure, &records),
            vec!["none".to_string(), "some".to_string()]
        );
    }

    #[test]
    fn spending_thresholds() {
        // 2350 local units per USD.
        let records = augmented(vec![
            RecordBuilder::complete("low")
                .food_expenditure(0, 2350.0 * 10.0)
                .build(),
            RecordBuilder::complete("high_per_capita")
                .food_expenditure(0, 2350.0 * 100.0)
                .build(),
            RecordBuilder::complete("high_household")
                .household_size(10.0)
                .food_expenditure(0, 2350.0 * 600.0)
                .build(),
        ]);
        assert_eq!(flagged_ids(Check::LowFoodSpending, &records), vec!["low"]);
        assert_eq!(
            flagged_ids(Check::HighPerCapitaSpending, &records),
            vec!["high_per_capita"]
        );
        assert_eq!(
            flagged_ids(Check::HighFoodSpending, &records),
            vec!["high_household"]
        );
        assert_eq!(
            flagged_ids(Check::HighHouseholdLowPerCapita, &records),
            vec!["high_household"]
        );
    }

    #[test]
    fn poor_households_spending_quantile() {
        let records = augmented(
            (1..=5)
                .map(|i| {
                    RecordBuilder::complete(&format!("poor_{}", i))
                        .food_expenditure(0, 2350.0 * 10.0 * i as f64)
                        .build()
                })
                .chain(std::iter::once(
                    RecordBuilder::complete("acceptable")
                        .fcs_days(7.0)
                        .food_expenditure(0, 2350.0 * 1000.0)
                        .build(),
                ))
                .collect(),
        );
        let settings = AnalysisSettings::default();
        let ctx = CheckContext::new(&records, &settings);
        // 10, 20, 30, 40, 50 USD: the 75th percentile is 40.
        assert_eq!(ctx.poor_spending_threshold, Some(40.0));
        assert_eq!(
            flagged_ids(Check::HighSpendingPoorFcs, &records),
            vec!["poor_5"]
        );
    }

    #[test]
    fn cross_indicator_checks() {
        let records = augmented(vec![
            RecordBuilder::complete("severe")
                .fcs_days(7.0)
                .hhs(HhsQuestion::NoFood, 3.0)
                .hhs(HhsQuestion::SleepHungry, 3.0)
                .build(),
            RecordBuilder::complete("coping")
                .fcs_days(7.0)
                .rcsi(RcsiStrategy::AdultRestriction, 7.0)
                .build(),
            RecordBuilder::complete("poor").build(),
        ]);
        assert_eq!(
            flagged_ids(Check::AcceptableFcsSevereHhs, &records),
            vec!["severe"]
        );
        assert_eq!(
            flagged_ids(Check::AcceptableFcsHighRcsi, &records),
            vec!["coping"]
        );
        assert_eq!(
            flagged_ids(Check::AcceptableFcsLowRcsiHighHhs, &records),
            vec!["severe"]
        );
    }

    #[test]
    fn hunger_question_consistency() {
        let records = augmented(vec![
            RecordBuilder::complete("q3_only")
                .hhs(HhsQuestion::WholeDayWithoutFood, 1.0)
                .build(),
            RecordBuilder::complete("q3_q1")
                .hhs(HhsQuestion::WholeDayWithoutFood, 1.0)
                .hhs(HhsQuestion::NoFood, 2.0)
                .build(),
        ]);
        assert_eq!(
            flagged_ids(Check::WholeDayWithoutFoodInHouse, &records),
            vec!["q3_only"]
        );
        assert_eq!(
            flagged_ids(Check::WholeDayWithoutSleepHungry, &records),
            vec!["q3_only", "q3_q1"]
        );
        assert_eq!(
            flagged_ids(Check::WholeDayWithoutEither, &records),
            vec!["q3_only"]
        );
    }

    #[test]
    fn meb_lookup_miss_is_reported_separately() {
        let mut unknown_state = RecordBuilder::complete("unknown_state")
            .food_expenditure(0, 2350.0 * 1000.0)
            .build();
        unknown_state.state = Some("Atlantis".to_string());
        let records = augmented(vec![
            unknown_state,
            RecordBuilder::complete("above_meb")
                .food_expenditure(0, 2350.0 * 1000.0)
                .build(),
            RecordBuilder::complete("below_meb")
                .food_expenditure(0, 2350.0 * 100.0)
                .build(),
        ]);
        let settings = AnalysisSettings::default();
        let ctx = CheckContext::new(&records, &settings);
        let res = run_check(Check::SpendingAboveMebPoorFcs, &records, &ctx);
        assert_eq!(res.flagged.len(), 1);
        assert_eq!(res.flagged[0].id, "above_meb");
        assert_eq!(res.passed, 1);
        assert_eq!(res.lookup_misses(), 1);
    }

    #[test]
    fn zero_spending_with_purchase() {
        let records = augmented(vec![
            RecordBuilder::complete("market")
                .food_source(FoodGroup::Cereals, 5.0)
                .build(),
            RecordBuilder::complete("own_production")
                .food_source(FoodGroup::Cereals, 1.0)
                .build(),
        ]);
        assert_eq!(
            flagged_ids(Check::ZeroSpendingPurchaseSource, &records),
            vec!["market"]
        );
    }

    #[test]
    fn not_augmented_is_indeterminate() {
        let records = vec![RecordBuilder::complete("raw").build()];
        let settings = AnalysisSettings::default();
        let ctx = CheckContext::new(&records, &settings);
        let res = run_check(Check::VeryLowFcs, &records, &ctx);
        assert_eq!(res.indeterminate[0].1, IndicatorError::NotAugmented);
    }

    #[test]
    fn frequency_out_of_range() {
        let blank = FoodGroup::ALL
            .iter()
            .fold(RecordBuilder::complete("blank"), |b, g| {
                b.field(Field::FoodDays(*g), None)
            })
            .build();
        let records = augmented(vec![
            RecordBuilder::complete("nine_days")
                .food_days(FoodGroup::Cereals, 9.0)
                .build(),
            RecordBuilder::complete("in_range").fcs_days(7.0).build(),
            blank,
        ]);
        let settings = AnalysisSettings::default();
        let ctx = CheckContext::new(&records, &settings);
        let check = Check::FrequencyOutOfRange;
        assert_eq!(check.evaluate(&records[0], &ctx), Ok(true));
        assert_eq!(check.evaluate(&records[1], &ctx), Ok(false));
        assert!(check.evaluate(&records[2], &ctx).is_err());

        let res = run_check(check, &records, &ctx);
        assert_eq!(res.count(), 1);
        assert_eq!(res.passed, 1);
        assert_eq!(res.indeterminate.len(), 1);
        assert_eq!(res.indeterminate[0].0.id, "blank");
    }

    #[test]
    fn low_staple_consumption() {
        let records = augmented(vec![
            RecordBuilder::complete("three")
                .food_days(FoodGroup::Cereals, 3.0)
                .build(),
            RecordBuilder::complete("four")
                .food_days(FoodGroup::Cereals, 4.0)
                .build(),
            RecordBuilder::complete("blank")
                .field(Field::FoodDays(FoodGroup::Cereals), None)
                .build(),
        ]);
        let settings = AnalysisSettings::default();
        let ctx = CheckContext::new(&records, &settings);
        let check = Check::LowStapleConsumption;
        assert_eq!(check.evaluate(&records[0], &ctx), Ok(true));
        assert_eq!(check.evaluate(&records[1], &ctx), Ok(false));
        assert_eq!(
            check.evaluate(&records[2], &ctx),
            Err(IndicatorError::MissingField(Field::FoodDays(FoodGroup::Cereals)))
        );
        assert_eq!(flagged_ids(check, &records), vec!["three"]);
    }

    #[test]
    fn correlation_signs() {
        let records = augmented(
            (0..8)
                .map(|i| {
                    let days = i as f64;
                    RecordBuilder::complete(&format!("hh_{}", i))
                        .fcs_days(days.min(7.0))
                        .food_expenditure(0, 1000.0 * (i * i) as f64)
                        .rcsi(RcsiStrategy::BorrowFood, 7.0 - days.min(7.0))
                        .build()
                })
                .collect(),
        );
        let reports = run_correlations(&records);
        assert_eq!(reports[0].check, CorrelationCheck::FcsFoodExpenditure);
        assert_eq!(reports[0].count, 8);
        assert_eq!(reports[0].matches_expectation(), Some(true));
        assert_eq!(reports[1].matches_expectation(), Some(true));
        let spearman = reports[1].spearman.unwrap();
        assert!((spearman.coefficient + 1.0).abs() < 1e-9);
    }
}
