use log::{debug, info, warn};

use crate::config::*;
use crate::schema::{format_number, Field};

// ******** Food consumption *********

/// The Food Consumption Score: the weighted sum of the 7-day frequencies of the nine main groups.
pub fn food_consumption_score(
    record: &HouseholdRecord,
    settings: &AnalysisSettings,
) -> IndicatorResult<f64> {
    let mut score = 0.0;
    for group in FoodGroup::FCS_GROUPS {
        let days = record
            .food(group)
            .days_7d
            .ok_or(IndicatorError::MissingField(Field::FoodDays(group)))?;
        let days = if settings.cap_frequencies {
            days.min(7.0)
        } else {
            days
        };
        score += days * group.fcs_weight().unwrap_or(0.0);
    }
    Ok(score)
}

/// Poor up to 28 included, Borderline up to 42 included, Acceptable above.
pub fn fcs_category(score: f64) -> IndicatorResult<FcsCategory> {
    if score.is_nan() || score < 0.0 {
        return Err(IndicatorError::OutOfDomain {
            indicator: "FCS",
            value: score,
        });
    }
    if score <= 28.0 {
        Ok(FcsCategory::Poor)
    } else if score <= 42.0 {
        Ok(FcsCategory::Borderline)
    } else {
        Ok(FcsCategory::Acceptable)
    }
}

/// Number of days any food was eaten, summed over the 16 groups.
pub fn food_consumption_days(record: &HouseholdRecord) -> IndicatorResult<f64> {
    lenient_sum(
        FoodGroup::ALL.iter().map(|g| record.food(*g).days_7d),
        Field::FoodDays(FoodGroup::Cereals),
    )
}

/// True if the main source of any food group is a purchase.
pub fn food_source_purchase(
    record: &HouseholdRecord,
    settings: &AnalysisSettings,
) -> IndicatorResult<bool> {
    let sources: Vec<f64> = FoodGroup::ALL
        .iter()
        .filter_map(|g| record.food(*g).source)
        .collect();
    if sources.is_empty() {
        return Err(IndicatorError::MissingField(Field::FoodSource(
            FoodGroup::Cereals,
        )));
    }
    Ok(sources
        .iter()
        .any(|s| is_coded(*s, &settings.purchase_source_codes)))
}

// ******** Reduced coping strategies *********

pub fn reduced_coping_index(record: &HouseholdRecord) -> IndicatorResult<f64> {
    let mut total = 0.0;
    for strategy in RcsiStrategy::ALL {
        let days = record
            .rcsi_answer(strategy)
            .ok_or(IndicatorError::MissingField(Field::Rcsi(strategy)))?;
        total += days * strategy.weight();
    }
    Ok(total)
}

fn check_rcsi_domain(rcsi: f64) -> IndicatorResult<()> {
    if rcsi.is_nan() || rcsi < 0.0 {
        Err(IndicatorError::OutOfDomain {
            indicator: "rCSI",
            value: rcsi,
        })
    } else {
        Ok(())
    }
}

/// Minimal up to 3, Stressed up to 18, Crisis-Emergency above.
pub fn rcsi_ipc_phase(rcsi: f64) -> IndicatorResult<RcsiIpcPhase> {
    check_rcsi_domain(rcsi)?;
    if rcsi <= 3.0 {
        Ok(RcsiIpcPhase::Minimal)
    } else if rcsi <= 18.0 {
        Ok(RcsiIpcPhase::Stressed)
    } else {
        Ok(RcsiIpcPhase::CrisisEmergency)
    }
}

/// Low up to 5, Medium up to 11, High above.
pub fn rcsi_wfp_level(rcsi: f64) -> IndicatorResult<RcsiWfpLevel> {
    check_rcsi_domain(rcsi)?;
    if rcsi <= 5.0 {
        Ok(RcsiWfpLevel::Low)
    } else if rcsi <= 11.0 {
        Ok(RcsiWfpLevel::Medium)
    } else {
        Ok(RcsiWfpLevel::High)
    }
}

// ******** Household hunger scale *********

/// Collapses a frequency-of-occurrence answer: 1 (rarely) and 2 (sometimes)
/// count 1, 3 (often) counts 2. Any other answer counts 0.
pub fn hhs_frequency_code(answer: f64) -> u8 {
    if answer == 1.0 || answer == 2.0 {
        1
    } else if answer == 3.0 {
        2
    } else {
        0
    }
}

pub fn hhs_codes(record: &HouseholdRecord) -> [IndicatorResult<u8>; 3] {
    HhsQuestion::ALL.map(|q| {
        record
            .hhs_answer(q)
            .map(hhs_frequency_code)
            .ok_or(IndicatorError::MissingField(Field::Hhs(q)))
    })
}

pub fn hhs_category(score: i64) -> IndicatorResult<HhsCategory> {
    match score {
        0 | 1 => Ok(HhsCategory::NoOrLittleHunger),
        2 | 3 => Ok(HhsCategory::ModerateHunger),
        x if x >= 4 => Ok(HhsCategory::SevereHunger),
        x => Err(IndicatorError::OutOfDomain {
            indicator: "HHS",
            value: x as f64,
        }),
    }
}

pub fn hhs_ipc_phase(score: i64) -> IndicatorResult<HhsIpcPhase> {
    match score {
        0 => Ok(HhsIpcPhase::Minimal),
        1 => Ok(HhsIpcPhase::Stressed),
        2 | 3 => Ok(HhsIpcPhase::Crisis),
        4 => Ok(HhsIpcPhase::Emergency),
        5 | 6 => Ok(HhsIpcPhase::Catastrophe),
        x => Err(IndicatorError::OutOfDomain {
            indicator: "HHS",
            value: x as f64,
        }),
    }
}

// ******** Livelihood coping strategies *********

/// The value of one severity tier: its severity if any of its strategies was
/// used, 1 if none was.
///
/// A blank answer only makes the tier indeterminate when no other strategy
/// of the tier was used.
pub fn coping_tier(
    record: &HouseholdRecord,
    severity: LcsSeverity,
    settings: &AnalysisSettings,
) -> IndicatorResult<u8> {
    let mut missing: Option<LcsStrategy> = None;
    for strategy in LcsStrategy::ALL.iter().filter(|s| s.severity() == severity) {
        match record.lcs_answer(*strategy) {
            Some(answer) if is_coded(answer, &settings.lcs_used_codes) => {
                return Ok(severity.value())
            }
            Some(_) => {}
            None => {
                missing = missing.or(Some(*strategy));
            }
        }
    }
    match missing {
        Some(strategy) => Err(IndicatorError::MissingField(Field::Lcs(strategy))),
        None => Ok(1),
    }
}

/// The worst severity over the three tiers.
///
/// An indeterminate tier does not matter when a known tier is already at
/// least as severe as the indeterminate one could be.
pub fn lcs_phase(tiers: &[(LcsSeverity, IndicatorResult<u8>)]) -> IndicatorResult<LcsPhase> {
    let known_max: u8 = tiers
        .iter()
        .filter_map(|(_, t)| t.as_ref().ok().copied())
        .max()
        .unwrap_or(1);
    let unknown = tiers
        .iter()
        .filter_map(|(sev, t)| t.as_ref().err().map(|e| (sev.value(), e)))
        .max_by_key(|(ceiling, _)| *ceiling);
    match unknown {
        Some((ceiling, err)) if ceiling > known_max => Err(err.clone()),
        _ => LcsPhase::from_value(known_max),
    }
}

// ******** Expenditures and household composition *********

/// Sums the components, counting blanks as zero. The sum is only
/// indeterminate when all the components are blank.
pub fn lenient_sum<I>(values: I, first_field: Field) -> IndicatorResult<f64>
where
    I: Iterator<Item = Option<f64>>,
{
    let mut seen = false;
    let mut total = 0.0;
    for x in values.flatten() {
        seen = true;
        total += x;
    }
    if seen {
        Ok(total)
    } else {
        Err(IndicatorError::MissingField(first_field))
    }
}

pub fn food_expenditure(record: &HouseholdRecord) -> IndicatorResult<f64> {
    lenient_sum(
        record.food_expenditure.iter().copied(),
        Field::FoodExpenditure(0),
    )
}

pub fn education_expenditure(record: &HouseholdRecord) -> IndicatorResult<f64> {
    lenient_sum(
        record.education_expenditure.iter().copied(),
        Field::EducationExpenditure(0),
    )
}

pub fn children_count(record: &HouseholdRecord) -> IndicatorResult<f64> {
    lenient_sum(record.children.iter().copied(), Field::Children(0))
}

pub fn livelihood_income_total(record: &HouseholdRecord) -> IndicatorResult<f64> {
    lenient_sum(
        record.livelihood_shares.iter().copied(),
        Field::Livelihood(LivelihoodActivity::Crops),
    )
}

/// Converts an amount in local currency to USD.
pub fn to_usd(amount: &IndicatorResult<f64>, rate: f64) -> IndicatorResult<f64> {
    let amount = amount.clone()?;
    if rate.is_nan() || rate <= 0.0 {
        return Err(IndicatorError::OutOfDomain {
            indicator: "exchange rate",
            value: rate,
        });
    }
    Ok(amount / rate)
}

pub fn per_capita(record: &HouseholdRecord, amount: &IndicatorResult<f64>) -> IndicatorResult<f64> {
    let amount = amount.clone()?;
    let size = record
        .household_size
        .ok_or(IndicatorError::MissingField(Field::HouseholdSize))?;
    if size.is_nan() || size <= 0.0 {
        return Err(IndicatorError::OutOfDomain {
            indicator: "household size",
            value: size,
        });
    }
    Ok(amount / size)
}

/// The minimum expenditure basket of the record's state, in USD.
pub fn meb_usd(record: &HouseholdRecord, settings: &AnalysisSettings) -> IndicatorResult<f64> {
    let key = match (&record.state, record.state_code) {
        (Some(name), _) => name.clone(),
        (None, Some(code)) => code.to_string(),
        (None, None) => return Err(IndicatorError::MissingField(Field::StateCode)),
    };
    settings
        .meb_by_state
        .get(&key)
        .copied()
        .ok_or(IndicatorError::LookupMiss {
            table: "mebByState",
            key,
        })
}

// ******** Engine *********

/// Computes all the indicators of one household.
pub fn compute_indicators(record: &HouseholdRecord, settings: &AnalysisSettings) -> Indicators {
    let fcs = food_consumption_score(record, settings);
    let fcs_cat = fcs.clone().and_then(fcs_category);

    let rcsi = reduced_coping_index(record);
    let rcsi_ipc = rcsi.clone().and_then(rcsi_ipc_phase);
    let rcsi_wfp = rcsi.clone().and_then(rcsi_wfp_level);

    let codes = hhs_codes(record);
    let hhs: IndicatorResult<u8> = codes
        .iter()
        .try_fold(0u8, |acc, c| c.clone().map(|x| acc + x));
    let hhs_cat = hhs.clone().and_then(|x| hhs_category(x as i64));
    let hhs_ipc = hhs.clone().and_then(|x| hhs_ipc_phase(x as i64));

    let emergency = coping_tier(record, LcsSeverity::Emergency, settings);
    let crisis = coping_tier(record, LcsSeverity::Crisis, settings);
    let stress = coping_tier(record, LcsSeverity::Stress, settings);
    let lcs = lcs_phase(&[
        (LcsSeverity::Emergency, emergency.clone()),
        (LcsSeverity::Crisis, crisis.clone()),
        (LcsSeverity::Stress, stress.clone()),
    ]);

    let food_exp = food_expenditure(record);
    let rates = settings.exchange_rates;
    let usd_official = to_usd(&food_exp, rates.official);
    let usd_market = to_usd(&food_exp, rates.other_market);
    let per_capita_official = per_capita(record, &usd_official);
    let per_capita_market = per_capita(record, &usd_market);
    let meb = meb_usd(record, settings);
    if let Err(e @ IndicatorError::LookupMiss { .. }) = &meb {
        warn!("compute_indicators: household {}: {}", record.id, e);
    }

    let res = Indicators {
        food_con_7days_sum: food_consumption_days(record),
        fcs,
        fcs_category: fcs_cat,
        rcsi,
        rcsi_ipc,
        rcsi_wfp,
        hhs_codes: codes,
        hhs,
        hhs_category: hhs_cat,
        hhs_ipc,
        emergency_coping: emergency,
        crisis_coping: crisis,
        stress_coping: stress,
        lcs,
        expenditure_food_items: food_exp,
        expenditure_education: education_expenditure(record),
        children_24m_17y: children_count(record),
        livelihood_income_total: livelihood_income_total(record),
        food_source_purchase: food_source_purchase(record, settings),
        food_usd_official: usd_official,
        food_usd_market: usd_market,
        per_capita_usd_official: per_capita_official,
        per_capita_usd_market: per_capita_market,
        meb_usd: meb,
    };
    debug!(
        "compute_indicators: household {}: fcs {:?} rcsi {:?} hhs {:?} lcs {:?}",
        record.id, res.fcs, res.rcsi, res.hhs, res.lcs
    );
    res
}

/// Attaches the indicators to every record, in place.
///
/// Each record only depends on its own answers: the result does not depend
/// on the order of the records, and running it twice changes nothing.
pub fn augment(records: &mut [HouseholdRecord], settings: &AnalysisSettings) {
    info!("augment: processing {} households", records.len());
    for record in records.iter_mut() {
        record.indicators = Some(compute_indicators(record, settings));
    }
    let num_incomplete = records
        .iter()
        .filter(|r| {
            r.indicators
                .as_ref()
                .map(|ind| indicator_statuses(ind).iter().any(|(_, s)| s.is_err()))
                .unwrap_or(false)
        })
        .count();
    if num_incomplete > 0 {
        warn!(
            "augment: {} of {} households have at least one indeterminate or unmapped indicator",
            num_incomplete,
            records.len()
        );
    }
}

/// The outcome of every indicator, by column name.
pub fn indicator_statuses(ind: &Indicators) -> Vec<(&'static str, Result<(), &IndicatorError>)> {
    fn status<T>(r: &IndicatorResult<T>) -> Result<(), &IndicatorError> {
        r.as_ref().map(|_| ())
    }
    let mut res = vec![
        ("food_con_7days_sum", status(&ind.food_con_7days_sum)),
        ("fcs", status(&ind.fcs)),
        ("fcs_categories", status(&ind.fcs_category)),
        ("rCSI", status(&ind.rcsi)),
        ("rCSI_IPC", status(&ind.rcsi_ipc)),
        ("rCSI_WFP", status(&ind.rcsi_wfp)),
        ("HHSQ1", status(&ind.hhs_codes[0])),
        ("HHSQ2", status(&ind.hhs_codes[1])),
        ("HHSQ3", status(&ind.hhs_codes[2])),
        ("HHS", status(&ind.hhs)),
        ("HHSCat", status(&ind.hhs_category)),
        ("HHS_IPC", status(&ind.hhs_ipc)),
    ];
    res.extend(
        LcsSeverity::ALL
            .iter()
            .map(|sev| (sev.var_name(), status(ind.coping_tier(*sev)))),
    );
    res.extend([
        ("LCS", status(&ind.lcs)),
        ("expenditure_food_items", status(&ind.expenditure_food_items)),
        ("expenditure_education", status(&ind.expenditure_education)),
        ("children_24months_17_years_sum", status(&ind.children_24m_17y)),
        ("current_live_Income_Total", status(&ind.livelihood_income_total)),
        ("food_source_purchase", status(&ind.food_source_purchase)),
        ("expenditure_food_items_offi_usd", status(&ind.food_usd_official)),
        ("expenditure_food_items_oth_market_usd", status(&ind.food_usd_market)),
        (
            "per_capita_expenditure_food_items_offi_usd",
            status(&ind.per_capita_usd_official),
        ),
        (
            "per_capita_expenditure_food_items_oth_market_usd",
            status(&ind.per_capita_usd_market),
        ),
        ("meb_un_rate_usd", status(&ind.meb_usd)),
    ]);
    res
}

// ******** Derived columns *********

pub const DERIVED_COLUMNS: [&str; 32] = [
    "food_con_7days_sum",
    "fcs",
    "fcs_categories",
    "fcs_categories_labels",
    "rCSI",
    "rCSI_IPC",
    "rCSI_IPC_Label",
    "rCSI_WFP",
    "rCSI_WFP_Label",
    "HHSQ1",
    "HHSQ2",
    "HHSQ3",
    "HHS",
    "HHSCat",
    "HHSCat_labels",
    "HHS_IPC",
    "HHS_IPC_labels",
    "emergency_coping_FS",
    "crisis_coping_FS",
    "stress_coping_FS",
    "LCS",
    "LCS_labels",
    "expenditure_food_items",
    "expenditure_education",
    "children_24months_17_years_sum",
    "current_live_Income_Total",
    "food_source_purchase",
    "expenditure_food_items_offi_usd",
    "expenditure_food_items_oth_market_usd",
    "per_capita_expenditure_food_items_offi_usd",
    "per_capita_expenditure_food_items_oth_market_usd",
    "meb_un_rate_usd",
];

pub const UNMAPPED: &str = "unmapped";

fn render<T, F: Fn(&T) -> String>(r: &IndicatorResult<T>, f: F) -> String {
    match r {
        Ok(x) => f(x),
        Err(e) if e.is_unmapped() => UNMAPPED.to_string(),
        Err(_) => String::new(),
    }
}

fn render_num(r: &IndicatorResult<f64>) -> String {
    render(r, |x| format_number(*x))
}

fn render_u8(r: &IndicatorResult<u8>) -> String {
    render(r, |x| x.to_string())
}

fn render_code<C: CategoryLabel>(r: &IndicatorResult<C>) -> String {
    render(r, |c| c.code().to_string())
}

fn render_label<C: CategoryLabel>(r: &IndicatorResult<C>) -> String {
    render(r, |c| c.label().to_string())
}

/// The cells of the derived columns, in the order of [DERIVED_COLUMNS].
///
/// Indeterminate values are blank, out-of-domain values are `unmapped`.
pub fn render_derived(ind: &Indicators) -> Vec<String> {
    let mut res = vec![
        render_num(&ind.food_con_7days_sum),
        render_num(&ind.fcs),
        render_code(&ind.fcs_category),
        render_label(&ind.fcs_category),
        render_num(&ind.rcsi),
        render_code(&ind.rcsi_ipc),
        render_label(&ind.rcsi_ipc),
        render_code(&ind.rcsi_wfp),
        render_label(&ind.rcsi_wfp),
    ];
    res.extend(ind.hhs_codes.iter().map(render_u8));
    res.extend(vec![
        render_u8(&ind.hhs),
        render_code(&ind.hhs_category),
        render_label(&ind.hhs_category),
        render_code(&ind.hhs_ipc),
        render_label(&ind.hhs_ipc),
        render_u8(&ind.emergency_coping),
        render_u8(&ind.crisis_coping),
        render_u8(&ind.stress_coping),
        render_code(&ind.lcs),
        render_label(&ind.lcs),
        render_num(&ind.expenditure_food_items),
        render_num(&ind.expenditure_education),
        render_num(&ind.children_24m_17y),
        render_num(&ind.livelihood_income_total),
        render(&ind.food_source_purchase, |b| b.to_string()),
        render_num(&ind.food_usd_official),
        render_num(&ind.food_usd_market),
        render_num(&ind.per_capita_usd_official),
        render_num(&ind.per_capita_usd_market),
        render_num(&ind.meb_usd),
    ]);
    res
}
