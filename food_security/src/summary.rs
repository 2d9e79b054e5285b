//! Aggregates over an augmented dataset: error counts, category
//! distributions, survey progress and descriptive diagnostics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::debug;

use crate::config::*;
use crate::indicators::indicator_statuses;
use crate::stats::{self, Describe};

const UNKNOWN: &str = "unknown";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IndicatorSummary {
    pub name: &'static str,
    pub computed: usize,
    /// Includes the lookup misses.
    pub indeterminate: usize,
    pub unmapped: usize,
    pub lookup_misses: usize,
}

/// Counts, for each indicator, how many records got a value.
pub fn indicator_summary(records: &[HouseholdRecord]) -> Vec<IndicatorSummary> {
    let mut res: Vec<IndicatorSummary> = Vec::new();
    for record in records.iter() {
        let ind = match record.indicators.as_ref() {
            Some(ind) => ind,
            None => continue,
        };
        for (idx, (name, status)) in indicator_statuses(ind).into_iter().enumerate() {
            if res.len() <= idx {
                res.push(IndicatorSummary {
                    name,
                    computed: 0,
                    indeterminate: 0,
                    unmapped: 0,
                    lookup_misses: 0,
                });
            }
            let s = &mut res[idx];
            match status {
                Ok(()) => s.computed += 1,
                Err(e) if e.is_unmapped() => s.unmapped += 1,
                Err(e) => {
                    s.indeterminate += 1;
                    if e.is_lookup_miss() {
                        s.lookup_misses += 1;
                    }
                }
            }
        }
    }
    res
}

#[derive(PartialEq, Debug, Clone)]
pub struct CategoryShare {
    pub code: u8,
    pub label: &'static str,
    pub count: usize,
    /// Percent of the records where the category is known.
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Distribution {
    pub indicator: &'static str,
    pub known: usize,
    pub shares: Vec<CategoryShare>,
}

fn distribution<'a, C, I>(indicator: &'static str, categories: &[C], values: I) -> Distribution
where
    C: CategoryLabel + PartialEq + 'a,
    I: Iterator<Item = &'a IndicatorResult<C>>,
{
    let known: Vec<C> = values.filter_map(|v| v.as_ref().ok().copied()).collect();
    let shares = categories
        .iter()
        .map(|c| {
            let count = known.iter().filter(|k| *k == c).count();
            CategoryShare {
                code: c.code(),
                label: c.label(),
                count,
                percent: if known.is_empty() {
                    0.0
                } else {
                    100.0 * count as f64 / known.len() as f64
                },
            }
        })
        .collect();
    Distribution {
        indicator,
        known: known.len(),
        shares,
    }
}

pub fn category_distributions(records: &[HouseholdRecord]) -> Vec<Distribution> {
    let inds: Vec<&Indicators> = records.iter().filter_map(|r| r.indicators.as_ref()).collect();
    vec![
        distribution(
            "fcs_categories",
            &FcsCategory::ALL,
            inds.iter().copied().map(|i| &i.fcs_category),
        ),
        distribution(
            "rCSI_IPC",
            &RcsiIpcPhase::ALL,
            inds.iter().copied().map(|i| &i.rcsi_ipc),
        ),
        distribution(
            "rCSI_WFP",
            &RcsiWfpLevel::ALL,
            inds.iter().copied().map(|i| &i.rcsi_wfp),
        ),
        distribution(
            "HHSCat",
            &HhsCategory::ALL,
            inds.iter().copied().map(|i| &i.hhs_category),
        ),
        distribution("HHS_IPC", &HhsIpcPhase::ALL, inds.iter().copied().map(|i| &i.hhs_ipc)),
        distribution("LCS", &LcsPhase::ALL, inds.iter().copied().map(|i| &i.lcs)),
    ]
}

/// Data collection progress against the planned sample.
#[derive(PartialEq, Debug, Clone)]
pub struct ProgressSummary {
    pub interviews: usize,
    pub target: u64,
    pub percent_of_target: f64,
    pub mean_household_size: Option<f64>,
    pub by_gender: BTreeMap<String, usize>,
    pub by_residence: BTreeMap<String, usize>,
    pub by_state: BTreeMap<String, usize>,
}

fn count_by<F: Fn(&HouseholdRecord) -> Option<String>>(
    records: &[HouseholdRecord],
    key: F,
) -> BTreeMap<String, usize> {
    let mut res = BTreeMap::new();
    for r in records.iter() {
        let k = key(r).unwrap_or_else(|| UNKNOWN.to_string());
        *res.entry(k).or_insert(0) += 1;
    }
    res
}

pub fn progress(records: &[HouseholdRecord], settings: &AnalysisSettings) -> ProgressSummary {
    let sizes: Vec<f64> = records.iter().filter_map(|r| r.household_size).collect();
    let percent_of_target = if settings.sample_target == 0 {
        0.0
    } else {
        100.0 * records.len() as f64 / settings.sample_target as f64
    };
    ProgressSummary {
        interviews: records.len(),
        target: settings.sample_target,
        percent_of_target,
        mean_household_size: stats::mean(&sizes),
        by_gender: count_by(records, |r| r.gender.clone()),
        by_residence: count_by(records, |r| r.residence.clone()),
        by_state: count_by(records, |r| {
            r.state
                .clone()
                .or_else(|| r.state_code.map(|c| c.to_string()))
        }),
    }
}

/// Descriptive statistics for a reviewer of the data.
#[derive(PartialEq, Debug, Clone)]
pub struct Diagnostics {
    pub expenditure: Vec<(&'static str, Option<Describe>)>,
    /// Food spending at the other-market rate, for each FCS category.
    pub expenditure_by_fcs: Vec<(&'static str, Option<Describe>)>,
    pub food_group_frequencies: Vec<(&'static str, Option<Describe>)>,
    pub zero_spending_households: usize,
    /// Mean income shares of the households without food spending, sorted by decreasing share.
    pub zero_spending_livelihoods: Vec<(&'static str, f64)>,
    /// Percent of the households without food spending that report a purchase source.
    pub zero_spending_purchase_share: Option<f64>,
}

fn values<F: Fn(&Indicators) -> IndicatorResult<f64>>(inds: &[&Indicators], f: F) -> Vec<f64> {
    inds.iter().filter_map(|i| f(i).ok()).collect()
}

pub fn diagnostics(records: &[HouseholdRecord]) -> Diagnostics {
    let inds: Vec<&Indicators> = records.iter().filter_map(|r| r.indicators.as_ref()).collect();

    let expenditure = vec![
        (
            "expenditure_food_items_offi_usd",
            stats::describe(&values(&inds, |i| i.food_usd_official.clone())),
        ),
        (
            "expenditure_food_items_oth_market_usd",
            stats::describe(&values(&inds, |i| i.food_usd_market.clone())),
        ),
        (
            "per_capita_expenditure_food_items_offi_usd",
            stats::describe(&values(&inds, |i| i.per_capita_usd_official.clone())),
        ),
        (
            "per_capita_expenditure_food_items_oth_market_usd",
            stats::describe(&values(&inds, |i| i.per_capita_usd_market.clone())),
        ),
    ];

    let expenditure_by_fcs = FcsCategory::ALL
        .iter()
        .map(|cat| {
            let xs: Vec<f64> = inds
                .iter()
                .filter(|i| i.fcs_category.as_ref() == Ok(cat))
                .filter_map(|i| i.food_usd_market.clone().ok())
                .collect();
            (cat.label(), stats::describe(&xs))
        })
        .collect();

    let food_group_frequencies = FoodGroup::FCS_GROUPS
        .iter()
        .map(|g| {
            let xs: Vec<f64> = records
                .iter()
                .filter_map(|r| r.food(*g).days_7d)
                .collect();
            (g.var_name(), stats::describe(&xs))
        })
        .collect();

    let zero_spenders: Vec<&HouseholdRecord> = records
        .iter()
        .filter(|r| {
            r.indicators
                .as_ref()
                .map(|i| i.expenditure_food_items == Ok(0.0))
                .unwrap_or(false)
        })
        .collect();
    let mut zero_spending_livelihoods: Vec<(&'static str, f64)> = LivelihoodActivity::ALL
        .iter()
        .filter_map(|a| {
            let xs: Vec<f64> = zero_spenders
                .iter()
                .filter_map(|r| r.livelihood_shares[a.index()])
                .collect();
            stats::mean(&xs).map(|m| (a.label(), m))
        })
        .collect();
    zero_spending_livelihoods.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let purchases: Vec<bool> = zero_spenders
        .iter()
        .filter_map(|r| r.indicators.as_ref())
        .filter_map(|i| i.food_source_purchase.clone().ok())
        .collect();
    let zero_spending_purchase_share = if purchases.is_empty() {
        None
    } else {
        Some(100.0 * purchases.iter().filter(|p| **p).count() as f64 / purchases.len() as f64)
    };
    debug!(
        "diagnostics: {} households without food spending",
        zero_spenders.len()
    );

    Diagnostics {
        expenditure,
        expenditure_by_fcs,
        food_group_frequencies,
        zero_spending_households: zero_spenders.len(),
        zero_spending_livelihoods,
        zero_spending_purchase_share,
    }
}
