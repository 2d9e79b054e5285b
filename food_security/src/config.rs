// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use crate::schema::Field;

pub const NUM_CHILD_COLUMNS: usize = 6;
pub const NUM_FOOD_EXPENDITURE_COLUMNS: usize = 30;
pub const NUM_EDUCATION_EXPENDITURE_COLUMNS: usize = 2;

/// The food groups of the consumption module, in questionnaire order.
///
/// The nine main groups enter the Food Consumption Score. The sub-groups
/// (flesh meat, orange vegetables, ...) are only used by consistency checks
/// and by the total consumption count.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum FoodGroup {
    Cereals,
    Pulses,
    Dairy,
    Protein,
    FleshMeat,
    OrganMeat,
    Fish,
    Eggs,
    Vegetables,
    OrangeVegetables,
    GreenLeafyVegetables,
    Fruit,
    OrangeFruit,
    Oil,
    Sugar,
    Condiments,
}

impl FoodGroup {
    pub const ALL: [FoodGroup; 16] = [
        FoodGroup::Cereals,
        FoodGroup::Pulses,
        FoodGroup::Dairy,
        FoodGroup::Protein,
        FoodGroup::FleshMeat,
        FoodGroup::OrganMeat,
        FoodGroup::Fish,
        FoodGroup::Eggs,
        FoodGroup::Vegetables,
        FoodGroup::OrangeVegetables,
        FoodGroup::GreenLeafyVegetables,
        FoodGroup::Fruit,
        FoodGroup::OrangeFruit,
        FoodGroup::Oil,
        FoodGroup::Sugar,
        FoodGroup::Condiments,
    ];

    /// The groups weighted in the Food Consumption Score.
    pub const FCS_GROUPS: [FoodGroup; 9] = [
        FoodGroup::Cereals,
        FoodGroup::Pulses,
        FoodGroup::Dairy,
        FoodGroup::Protein,
        FoodGroup::Vegetables,
        FoodGroup::Fruit,
        FoodGroup::Oil,
        FoodGroup::Sugar,
        FoodGroup::Condiments,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Questionnaire prefix. The 7-day, source and 24-hour columns append `a`, `b` and `c`.
    pub fn code(self) -> &'static str {
        match self {
            FoodGroup::Cereals => "Q5_1",
            FoodGroup::Pulses => "Q5_2",
            FoodGroup::Dairy => "Q5_3",
            FoodGroup::Protein => "Q5_4",
            FoodGroup::FleshMeat => "Q5_4_1",
            FoodGroup::OrganMeat => "Q5_4_2",
            FoodGroup::Fish => "Q5_4_3",
            FoodGroup::Eggs => "Q5_4_4",
            FoodGroup::Vegetables => "Q5_5",
            FoodGroup::OrangeVegetables => "Q5_5_1",
            FoodGroup::GreenLeafyVegetables => "Q5_5_2",
            FoodGroup::Fruit => "Q5_6",
            FoodGroup::OrangeFruit => "Q5_6_1",
            FoodGroup::Oil => "Q5_7",
            FoodGroup::Sugar => "Q5_8",
            FoodGroup::Condiments => "Q5_9",
        }
    }

    /// Standard variable name of the 7-day frequency.
    pub fn var_name(self) -> &'static str {
        match self {
            FoodGroup::Cereals => "FCSStap",
            FoodGroup::Pulses => "FCSPulse",
            FoodGroup::Dairy => "FCSDairy",
            FoodGroup::Protein => "FCSPr",
            FoodGroup::FleshMeat => "FCSPrMeatF",
            FoodGroup::OrganMeat => "FCSPrMeatO",
            FoodGroup::Fish => "FCSPrFish",
            FoodGroup::Eggs => "FCSPrEgg",
            FoodGroup::Vegetables => "FCSVeg",
            FoodGroup::OrangeVegetables => "FCSVegOrg",
            FoodGroup::GreenLeafyVegetables => "FCSVegGre",
            FoodGroup::Fruit => "FCSFruit",
            FoodGroup::OrangeFruit => "FCSFruitOrg",
            FoodGroup::Oil => "FCSFat",
            FoodGroup::Sugar => "FCSSugar",
            FoodGroup::Condiments => "FCSCond",
        }
    }

    /// Lower-case identifier, used to name the per-group checks.
    pub fn slug(self) -> &'static str {
        match self {
            FoodGroup::Cereals => "cereals",
            FoodGroup::Pulses => "pulses",
            FoodGroup::Dairy => "dairy",
            FoodGroup::Protein => "protein",
            FoodGroup::FleshMeat => "flesh_meat",
            FoodGroup::OrganMeat => "organ_meat",
            FoodGroup::Fish => "fish",
            FoodGroup::Eggs => "eggs",
            FoodGroup::Vegetables => "vegetables",
            FoodGroup::OrangeVegetables => "orange_vegetables",
            FoodGroup::GreenLeafyVegetables => "green_leafy_vegetables",
            FoodGroup::Fruit => "fruit",
            FoodGroup::OrangeFruit => "orange_fruit",
            FoodGroup::Oil => "oil",
            FoodGroup::Sugar => "sugar",
            FoodGroup::Condiments => "condiments",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FoodGroup::Cereals => "Cereals and tubers",
            FoodGroup::Pulses => "Pulses",
            FoodGroup::Dairy => "Milk and dairy products",
            FoodGroup::Protein => "Meat, fish and eggs",
            FoodGroup::FleshMeat => "Flesh meat",
            FoodGroup::OrganMeat => "Organ meat",
            FoodGroup::Fish => "Fish/shellfish",
            FoodGroup::Eggs => "Eggs",
            FoodGroup::Vegetables => "Vegetables and leaves",
            FoodGroup::OrangeVegetables => "Orange vegetables",
            FoodGroup::GreenLeafyVegetables => "Green leafy vegetables",
            FoodGroup::Fruit => "Fruits",
            FoodGroup::OrangeFruit => "Orange fruits",
            FoodGroup::Oil => "Oil and fats",
            FoodGroup::Sugar => "Sugar",
            FoodGroup::Condiments => "Condiments",
        }
    }

    /// The weight in the Food Consumption Score, for the nine main groups.
    pub fn fcs_weight(self) -> Option<f64> {
        match self {
            FoodGroup::Cereals => Some(2.0),
            FoodGroup::Pulses => Some(3.0),
            FoodGroup::Dairy => Some(4.0),
            FoodGroup::Protein => Some(4.0),
            FoodGroup::Vegetables => Some(1.0),
            FoodGroup::Fruit => Some(1.0),
            FoodGroup::Oil => Some(0.5),
            FoodGroup::Sugar => Some(0.5),
            FoodGroup::Condiments => Some(0.0),
            _ => None,
        }
    }
}

/// Coping behaviours of the reduced Coping Strategy Index.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum RcsiStrategy {
    LessPreferredFood,
    BorrowFood,
    SmallerPortions,
    AdultRestriction,
    ReducedMeals,
}

impl RcsiStrategy {
    pub const ALL: [RcsiStrategy; 5] = [
        RcsiStrategy::LessPreferredFood,
        RcsiStrategy::BorrowFood,
        RcsiStrategy::SmallerPortions,
        RcsiStrategy::AdultRestriction,
        RcsiStrategy::ReducedMeals,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            RcsiStrategy::LessPreferredFood => "Q6_1_1",
            RcsiStrategy::BorrowFood => "Q6_1_2",
            RcsiStrategy::SmallerPortions => "Q6_1_3",
            RcsiStrategy::AdultRestriction => "Q6_1_4",
            RcsiStrategy::ReducedMeals => "Q6_1_5",
        }
    }

    pub fn var_name(self) -> &'static str {
        match self {
            RcsiStrategy::LessPreferredFood => "rCSILessQlty",
            RcsiStrategy::BorrowFood => "rCSIBorrow",
            RcsiStrategy::SmallerPortions => "rCSIMealSize",
            RcsiStrategy::AdultRestriction => "rCSIMealAdult",
            RcsiStrategy::ReducedMeals => "rCSIMealNb",
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            RcsiStrategy::LessPreferredFood => 1.0,
            RcsiStrategy::BorrowFood => 2.0,
            RcsiStrategy::SmallerPortions => 1.0,
            RcsiStrategy::AdultRestriction => 3.0,
            RcsiStrategy::ReducedMeals => 1.0,
        }
    }
}

/// The three frequency-of-occurrence questions of the Household Hunger Scale.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum HhsQuestion {
    /// Was there ever no food to eat in the household?
    NoFood,
    /// Did any household member go to sleep hungry?
    SleepHungry,
    /// Did any household member go a whole day and night without eating?
    WholeDayWithoutFood,
}

impl HhsQuestion {
    pub const ALL: [HhsQuestion; 3] = [
        HhsQuestion::NoFood,
        HhsQuestion::SleepHungry,
        HhsQuestion::WholeDayWithoutFood,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            HhsQuestion::NoFood => "Q6_7",
            HhsQuestion::SleepHungry => "Q6_8",
            HhsQuestion::WholeDayWithoutFood => "Q6_11",
        }
    }

    pub fn var_name(self) -> &'static str {
        match self {
            HhsQuestion::NoFood => "HHSNoFood_FR",
            HhsQuestion::SleepHungry => "HHSBedHung",
            HhsQuestion::WholeDayWithoutFood => "HHSNotEat_FR",
        }
    }
}

/// Severity tier of a livelihood coping strategy.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum LcsSeverity {
    Stress,
    Crisis,
    Emergency,
}

impl LcsSeverity {
    pub const ALL: [LcsSeverity; 3] = [
        LcsSeverity::Emergency,
        LcsSeverity::Crisis,
        LcsSeverity::Stress,
    ];

    /// The value taken by the tier sub-indicator when one of its strategies was used.
    pub fn value(self) -> u8 {
        match self {
            LcsSeverity::Stress => 2,
            LcsSeverity::Crisis => 3,
            LcsSeverity::Emergency => 4,
        }
    }

    pub fn var_name(self) -> &'static str {
        match self {
            LcsSeverity::Stress => "stress_coping_FS",
            LcsSeverity::Crisis => "crisis_coping_FS",
            LcsSeverity::Emergency => "emergency_coping_FS",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum LcsStrategy {
    SoldDomesticAssets,
    ReducedHealthExpenses,
    ConsumedSeedStock,
    SpentSavings,
    AccumulatedDebt,
    SoldProductiveAssets,
    ReducedFarmInputs,
    SoldLastFemaleAnimals,
    Begged,
    GatheredWildFood,
}

impl LcsStrategy {
    pub const ALL: [LcsStrategy; 10] = [
        LcsStrategy::SoldDomesticAssets,
        LcsStrategy::ReducedHealthExpenses,
        LcsStrategy::ConsumedSeedStock,
        LcsStrategy::SpentSavings,
        LcsStrategy::AccumulatedDebt,
        LcsStrategy::SoldProductiveAssets,
        LcsStrategy::ReducedFarmInputs,
        LcsStrategy::SoldLastFemaleAnimals,
        LcsStrategy::Begged,
        LcsStrategy::GatheredWildFood,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> String {
        format!("Q6_2_{}", self.index() + 1)
    }

    pub fn var_name(self) -> &'static str {
        match self {
            LcsStrategy::SoldDomesticAssets => "Lcs_stress_DomAsset",
            LcsStrategy::ReducedHealthExpenses => "Lcs_crisis_Health",
            LcsStrategy::ConsumedSeedStock => "Lcs_crisis_con_stock",
            LcsStrategy::SpentSavings => "Lcs_stress_Saving",
            LcsStrategy::AccumulatedDebt => "Lcs_stress_accum_debt",
            LcsStrategy::SoldProductiveAssets => "Lcs_em_ResAsset",
            LcsStrategy::ReducedFarmInputs => "Lcs_stress_red_farm_liv_input",
            LcsStrategy::SoldLastFemaleAnimals => "Lcs_em_last_female",
            LcsStrategy::Begged => "Lcs_em_Begged",
            LcsStrategy::GatheredWildFood => "Lcs_crisis_wild_food",
        }
    }

    pub fn severity(self) -> LcsSeverity {
        match self {
            LcsStrategy::SoldDomesticAssets
            | LcsStrategy::SpentSavings
            | LcsStrategy::AccumulatedDebt
            | LcsStrategy::ReducedFarmInputs => LcsSeverity::Stress,
            LcsStrategy::ReducedHealthExpenses
            | LcsStrategy::ConsumedSeedStock
            | LcsStrategy::GatheredWildFood => LcsSeverity::Crisis,
            LcsStrategy::SoldProductiveAssets
            | LcsStrategy::SoldLastFemaleAnimals
            | LcsStrategy::Begged => LcsSeverity::Emergency,
        }
    }
}

/// Current livelihood activities. The income shares are percentages and should add up to 100.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum LivelihoodActivity {
    Crops,
    Livestock,
    DonationGift,
    Business,
    AgriculturalWageLabour,
    NonAgriculturalWageLabour,
    SaleOfAidFood,
    SaleOfFirewoodCharcoal,
    TraditionalMining,
    SalariedWork,
    Begging,
    Remittances,
    Pension,
}

impl LivelihoodActivity {
    pub const ALL: [LivelihoodActivity; 13] = [
        LivelihoodActivity::Crops,
        LivelihoodActivity::Livestock,
        LivelihoodActivity::DonationGift,
        LivelihoodActivity::Business,
        LivelihoodActivity::AgriculturalWageLabour,
        LivelihoodActivity::NonAgriculturalWageLabour,
        LivelihoodActivity::SaleOfAidFood,
        LivelihoodActivity::SaleOfFirewoodCharcoal,
        LivelihoodActivity::TraditionalMining,
        LivelihoodActivity::SalariedWork,
        LivelihoodActivity::Begging,
        LivelihoodActivity::Remittances,
        LivelihoodActivity::Pension,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> String {
        format!("Q3_1_{}", self.index() + 1)
    }

    pub fn var_name(self) -> &'static str {
        match self {
            LivelihoodActivity::Crops => "liv_activ_crops",
            LivelihoodActivity::Livestock => "liv_activ_livestock",
            LivelihoodActivity::DonationGift => "liv_activ_donation_gift",
            LivelihoodActivity::Business => "liv_activ_business",
            LivelihoodActivity::AgriculturalWageLabour => "liv_activ_agric_wage_labour",
            LivelihoodActivity::NonAgriculturalWageLabour => "liv_activ_non_agric_wage_labour",
            LivelihoodActivity::SaleOfAidFood => "liv_activ_sale_aid_food",
            LivelihoodActivity::SaleOfFirewoodCharcoal => "liv_activ_sale_firewood_charcoal",
            LivelihoodActivity::TraditionalMining => "liv_activ_traditional_mining",
            LivelihoodActivity::SalariedWork => "liv_activ_salaried_work",
            LivelihoodActivity::Begging => "liv_activ_begging",
            LivelihoodActivity::Remittances => "liv_activ_remittances",
            LivelihoodActivity::Pension => "liv_activ_pension",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LivelihoodActivity::Crops => "Crops",
            LivelihoodActivity::Livestock => "Livestock",
            LivelihoodActivity::DonationGift => "Donation/Gift",
            LivelihoodActivity::Business => "Business",
            LivelihoodActivity::AgriculturalWageLabour => "Agricultural wage labour",
            LivelihoodActivity::NonAgriculturalWageLabour => "Non-agricultural wage labour",
            LivelihoodActivity::SaleOfAidFood => "Sale of aid food",
            LivelihoodActivity::SaleOfFirewoodCharcoal => "Sale of firewood/charcoal",
            LivelihoodActivity::TraditionalMining => "Traditional mining",
            LivelihoodActivity::SalariedWork => "Salaried work",
            LivelihoodActivity::Begging => "Begging",
            LivelihoodActivity::Remittances => "Remittances",
            LivelihoodActivity::Pension => "Pension",
        }
    }
}

/// Livestock ownership. Carried through to the outputs, not used by any indicator.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Livestock {
    Cattle,
    Donkeys,
    Camels,
    GoatsSheep,
    Poultry,
}

impl Livestock {
    pub const ALL: [Livestock; 5] = [
        Livestock::Cattle,
        Livestock::Donkeys,
        Livestock::Camels,
        Livestock::GoatsSheep,
        Livestock::Poultry,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> String {
        format!("Q7_2_{}", self.index() + 1)
    }

    pub fn var_name(self) -> &'static str {
        match self {
            Livestock::Cattle => "HH_own_cattle",
            Livestock::Donkeys => "HH_own_donkey",
            Livestock::Camels => "HH_own_camel",
            Livestock::GoatsSheep => "HH_own_goats_sheep",
            Livestock::Poultry => "HH_own_poultry",
        }
    }
}

/// The answers for one food group.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct FoodRecall {
    /// Number of days the group was eaten over the past 7 days.
    pub days_7d: Option<f64>,
    /// Main source of the food (coded).
    pub source: Option<f64>,
    /// 1 if eaten over the past 24 hours, 0 otherwise.
    pub ate_24h: Option<f64>,
}

/// One surveyed household.
///
/// Every questionnaire answer is resolved to a named field when the dataset
/// is read. A blank or non-numeric cell is stored as `None`. The derived
/// indicators are attached in place by [`crate::augment`].
#[derive(PartialEq, Debug, Clone, Default)]
pub struct HouseholdRecord {
    pub id: String,
    pub state_code: Option<i64>,
    /// The state label, from the configured code table.
    pub state: Option<String>,
    pub enumerator: Option<String>,
    pub day: Option<String>,
    pub household_size: Option<f64>,
    pub gender: Option<String>,
    pub residence: Option<String>,
    /// Number of children aged 24 months to 17 years, per age/sex column.
    pub children: [Option<f64>; NUM_CHILD_COLUMNS],
    pub food: [FoodRecall; 16],
    pub rcsi: [Option<f64>; 5],
    pub hhs: [Option<f64>; 3],
    pub lcs: [Option<f64>; 10],
    pub food_expenditure: [Option<f64>; NUM_FOOD_EXPENDITURE_COLUMNS],
    pub education_expenditure: [Option<f64>; NUM_EDUCATION_EXPENDITURE_COLUMNS],
    pub livelihood_shares: [Option<f64>; 13],
    pub livestock: [Option<f64>; 5],
    pub indicators: Option<Indicators>,
}

impl HouseholdRecord {
    pub fn food(&self, group: FoodGroup) -> &FoodRecall {
        &self.food[group.index()]
    }

    pub fn rcsi_answer(&self, strategy: RcsiStrategy) -> Option<f64> {
        self.rcsi[strategy.index()]
    }

    pub fn hhs_answer(&self, question: HhsQuestion) -> Option<f64> {
        self.hhs[question.index()]
    }

    pub fn lcs_answer(&self, strategy: LcsStrategy) -> Option<f64> {
        self.lcs[strategy.index()]
    }

    /// The derived indicators, once the record went through the engine.
    pub fn derived(&self) -> IndicatorResult<&Indicators> {
        self.indicators.as_ref().ok_or(IndicatorError::NotAugmented)
    }
}

// ******** Output data structures *********

/// Ordinal labels attached to a derived indicator.
pub trait CategoryLabel: Copy {
    /// The numeric code, as used in the exported datasets.
    fn code(&self) -> u8;
    fn label(&self) -> &'static str;
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum FcsCategory {
    Acceptable,
    Borderline,
    Poor,
}

impl FcsCategory {
    pub const ALL: [FcsCategory; 3] = [
        FcsCategory::Acceptable,
        FcsCategory::Borderline,
        FcsCategory::Poor,
    ];
}

impl CategoryLabel for FcsCategory {
    fn code(&self) -> u8 {
        match self {
            FcsCategory::Acceptable => 1,
            FcsCategory::Borderline => 2,
            FcsCategory::Poor => 3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FcsCategory::Acceptable => "Acceptable",
            FcsCategory::Borderline => "Borderline",
            FcsCategory::Poor => "Poor",
        }
    }
}

/// rCSI phases aligned with the IPC thresholds.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum RcsiIpcPhase {
    Minimal,
    Stressed,
    CrisisEmergency,
}

impl RcsiIpcPhase {
    pub const ALL: [RcsiIpcPhase; 3] = [
        RcsiIpcPhase::Minimal,
        RcsiIpcPhase::Stressed,
        RcsiIpcPhase::CrisisEmergency,
    ];
}

impl CategoryLabel for RcsiIpcPhase {
    fn code(&self) -> u8 {
        match self {
            RcsiIpcPhase::Minimal => 1,
            RcsiIpcPhase::Stressed => 2,
            RcsiIpcPhase::CrisisEmergency => 3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RcsiIpcPhase::Minimal => "Minimal",
            RcsiIpcPhase::Stressed => "Stressed",
            RcsiIpcPhase::CrisisEmergency => "Crisis-Emergency",
        }
    }
}

/// rCSI levels used by the country office.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum RcsiWfpLevel {
    Low,
    Medium,
    High,
}

impl RcsiWfpLevel {
    pub const ALL: [RcsiWfpLevel; 3] = [RcsiWfpLevel::Low, RcsiWfpLevel::Medium, RcsiWfpLevel::High];
}

impl CategoryLabel for RcsiWfpLevel {
    fn code(&self) -> u8 {
        match self {
            RcsiWfpLevel::Low => 1,
            RcsiWfpLevel::Medium => 2,
            RcsiWfpLevel::High => 3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RcsiWfpLevel::Low => "Low (<6)",
            RcsiWfpLevel::Medium => "Medium (6-11)",
            RcsiWfpLevel::High => "High (>11)",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum HhsCategory {
    NoOrLittleHunger,
    ModerateHunger,
    SevereHunger,
}

impl HhsCategory {
    pub const ALL: [HhsCategory; 3] = [
        HhsCategory::NoOrLittleHunger,
        HhsCategory::ModerateHunger,
        HhsCategory::SevereHunger,
    ];
}

impl CategoryLabel for HhsCategory {
    fn code(&self) -> u8 {
        match self {
            HhsCategory::NoOrLittleHunger => 1,
            HhsCategory::ModerateHunger => 2,
            HhsCategory::SevereHunger => 3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            HhsCategory::NoOrLittleHunger => "No or little hunger",
            HhsCategory::ModerateHunger => "Moderate hunger",
            HhsCategory::SevereHunger => "Severe hunger",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum HhsIpcPhase {
    Minimal,
    Stressed,
    Crisis,
    Emergency,
    Catastrophe,
}

impl HhsIpcPhase {
    pub const ALL: [HhsIpcPhase; 5] = [
        HhsIpcPhase::Minimal,
        HhsIpcPhase::Stressed,
        HhsIpcPhase::Crisis,
        HhsIpcPhase::Emergency,
        HhsIpcPhase::Catastrophe,
    ];
}

impl CategoryLabel for HhsIpcPhase {
    fn code(&self) -> u8 {
        match self {
            HhsIpcPhase::Minimal => 1,
            HhsIpcPhase::Stressed => 2,
            HhsIpcPhase::Crisis => 3,
            HhsIpcPhase::Emergency => 4,
            HhsIpcPhase::Catastrophe => 5,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            HhsIpcPhase::Minimal => "Minimal",
            HhsIpcPhase::Stressed => "Stressed",
            HhsIpcPhase::Crisis => "Crisis",
            HhsIpcPhase::Emergency => "Emergency",
            HhsIpcPhase::Catastrophe => "Catastrophe",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum LcsPhase {
    Minimal,
    Stressed,
    Crisis,
    Emergency,
}

impl LcsPhase {
    pub const ALL: [LcsPhase; 4] = [
        LcsPhase::Minimal,
        LcsPhase::Stressed,
        LcsPhase::Crisis,
        LcsPhase::Emergency,
    ];

    pub fn from_value(value: u8) -> IndicatorResult<LcsPhase> {
        match value {
            1 => Ok(LcsPhase::Minimal),
            2 => Ok(LcsPhase::Stressed),
            3 => Ok(LcsPhase::Crisis),
            4 => Ok(LcsPhase::Emergency),
            x => Err(IndicatorError::OutOfDomain {
                indicator: "LCS",
                value: x as f64,
            }),
        }
    }
}

impl CategoryLabel for LcsPhase {
    fn code(&self) -> u8 {
        match self {
            LcsPhase::Minimal => 1,
            LcsPhase::Stressed => 2,
            LcsPhase::Crisis => 3,
            LcsPhase::Emergency => 4,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LcsPhase::Minimal => "Minimal",
            LcsPhase::Stressed => "Stressed",
            LcsPhase::Crisis => "Crisis",
            LcsPhase::Emergency => "Emergency",
        }
    }
}

/// All the indicators derived from one household.
///
/// Each value is computed independently: a missing answer makes the
/// dependent indicators indeterminate and leaves the others untouched.
#[derive(PartialEq, Debug, Clone)]
pub struct Indicators {
    pub food_con_7days_sum: IndicatorResult<f64>,
    pub fcs: IndicatorResult<f64>,
    pub fcs_category: IndicatorResult<FcsCategory>,
    pub rcsi: IndicatorResult<f64>,
    pub rcsi_ipc: IndicatorResult<RcsiIpcPhase>,
    pub rcsi_wfp: IndicatorResult<RcsiWfpLevel>,
    /// The 0/1/2 severity code of each hunger question.
    pub hhs_codes: [IndicatorResult<u8>; 3],
    pub hhs: IndicatorResult<u8>,
    pub hhs_category: IndicatorResult<HhsCategory>,
    pub hhs_ipc: IndicatorResult<HhsIpcPhase>,
    pub emergency_coping: IndicatorResult<u8>,
    pub crisis_coping: IndicatorResult<u8>,
    pub stress_coping: IndicatorResult<u8>,
    pub lcs: IndicatorResult<LcsPhase>,
    pub expenditure_food_items: IndicatorResult<f64>,
    pub expenditure_education: IndicatorResult<f64>,
    pub children_24m_17y: IndicatorResult<f64>,
    pub livelihood_income_total: IndicatorResult<f64>,
    pub food_source_purchase: IndicatorResult<bool>,
    pub food_usd_official: IndicatorResult<f64>,
    pub food_usd_market: IndicatorResult<f64>,
    pub per_capita_usd_official: IndicatorResult<f64>,
    pub per_capita_usd_market: IndicatorResult<f64>,
    pub meb_usd: IndicatorResult<f64>,
}

impl Indicators {
    pub fn coping_tier(&self, severity: LcsSeverity) -> &IndicatorResult<u8> {
        match severity {
            LcsSeverity::Emergency => &self.emergency_coping,
            LcsSeverity::Crisis => &self.crisis_coping,
            LcsSeverity::Stress => &self.stress_coping,
        }
    }
}

/// Row-local errors. They never abort a run: the dependent value becomes
/// indeterminate (or unmapped) and processing continues.
#[derive(PartialEq, Debug, Clone)]
pub enum IndicatorError {
    /// A source answer is blank.
    MissingField(Field),
    /// The value exists but falls outside the domain of a categorization scheme.
    OutOfDomain { indicator: &'static str, value: f64 },
    /// A lookup table has no entry for the record's key.
    LookupMiss { table: &'static str, key: String },
    /// The record has not been processed by the indicator engine.
    NotAugmented,
}

impl IndicatorError {
    pub fn is_unmapped(&self) -> bool {
        matches!(self, IndicatorError::OutOfDomain { .. })
    }

    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, IndicatorError::LookupMiss { .. })
    }
}

impl Error for IndicatorError {}

impl Display for IndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorError::MissingField(field) => write!(f, "missing answer for {}", field.name()),
            IndicatorError::OutOfDomain { indicator, value } => {
                write!(f, "{} value {} is outside of the categorization domain", indicator, value)
            }
            IndicatorError::LookupMiss { table, key } => {
                write!(f, "no entry for {:?} in table {}", key, table)
            }
            IndicatorError::NotAugmented => write!(f, "indicators were not computed"),
        }
    }
}

pub type IndicatorResult<T> = Result<T, IndicatorError>;

// ********* Configuration **********

/// Local currency units per US dollar.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ExchangeRates {
    pub official: f64,
    pub other_market: f64,
}

impl ExchangeRates {
    pub const DEFAULT: ExchangeRates = ExchangeRates {
        official: 1987.0,
        other_market: 2350.0,
    };
}

/// The fixed thresholds of the outlier checks. Amounts are in USD at the other-market rate.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct FlagThresholds {
    pub very_low_fcs: f64,
    /// Quantile of the spending of Poor households above which a Poor household is flagged.
    pub poor_spending_quantile: f64,
    pub high_household_spending: f64,
    pub high_per_capita_spending: f64,
    pub low_household_spending: f64,
    pub high_rcsi: f64,
    pub low_rcsi: f64,
    pub high_hhs: f64,
    pub low_staple_days: f64,
    pub income_shares_total: f64,
}

impl FlagThresholds {
    pub const DEFAULT: FlagThresholds = FlagThresholds {
        very_low_fcs: 10.0,
        poor_spending_quantile: 0.75,
        high_household_spending: 500.0,
        high_per_capita_spending: 80.0,
        low_household_spending: 15.0,
        high_rcsi: 18.0,
        low_rcsi: 4.0,
        high_hhs: 3.0,
        low_staple_days: 4.0,
        income_shares_total: 100.0,
    };
}

/// Code to label tables applied when the records are read.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CodeLabels {
    pub states: BTreeMap<i64, String>,
    pub genders: BTreeMap<i64, String>,
    pub residences: BTreeMap<i64, String>,
}

impl Default for CodeLabels {
    fn default() -> Self {
        let states = [
            "North Darfur",
            "South Darfur",
            "West Darfur",
            "Central Darfur",
            "East Darfur",
            "Kassala",
            "Red Sea",
            "Blue Nile",
            "White Nile",
            "North Kordofan",
            "West Kordofan",
            "South Kordofan",
            "Gadarif",
            "Khartoum",
            "Sinnar",
            "Northern State",
            "AL Gazira",
            "River Nile",
        ];
        CodeLabels {
            states: states
                .iter()
                .enumerate()
                .map(|(idx, name)| ((idx + 1) as i64, name.to_string()))
                .collect(),
            genders: [(1, "Male"), (2, "Female")]
                .iter()
                .map(|(code, name)| (*code, name.to_string()))
                .collect(),
            residences: [
                (1, "Residents"),
                (5, "Nomads"),
                (8, "IDP hosted in the community/living with resident families"),
                (9, "IDPs living in rented accommodation"),
            ]
            .iter()
            .map(|(code, name)| (*code, name.to_string()))
            .collect(),
        }
    }
}

/// Everything besides the dataset that the engine and the checks depend on.
#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisSettings {
    /// Cap each food-group frequency at 7 before weighting the FCS.
    pub cap_frequencies: bool,
    /// Codes of the livelihood usage scale that mean the strategy was used.
    pub lcs_used_codes: Vec<i64>,
    /// Food source codes that mean the food was purchased.
    pub purchase_source_codes: Vec<i64>,
    pub exchange_rates: ExchangeRates,
    pub thresholds: FlagThresholds,
    /// Minimum expenditure basket in USD, by state label.
    pub meb_by_state: BTreeMap<String, f64>,
    pub labels: CodeLabels,
    /// Number of interviews planned for the survey.
    pub sample_target: u64,
}

impl AnalysisSettings {
    pub fn default_meb_table() -> BTreeMap<String, f64> {
        [
            ("AL Gazira", 508.0),
            ("Blue Nile", 473.0),
            ("Central Darfur", 519.0),
            ("East Darfur", 519.0),
            ("Gadarif", 344.0),
            ("Kassala", 304.0),
            ("Khartoum", 370.0),
            ("River Nile", 356.0),
            ("North Darfur", 415.0),
            ("North Kordofan", 567.0),
            ("Northern State", 465.0),
            ("Red Sea", 384.0),
            ("Sinnar", 327.0),
            ("South Darfur", 385.0),
            ("South Kordofan", 567.0),
            ("West Darfur", 294.0),
            ("West Kordofan", 380.0),
            ("White Nile", 444.0),
        ]
        .iter()
        .map(|(state, meb)| (state.to_string(), *meb))
        .collect()
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            cap_frequencies: true,
            lcs_used_codes: vec![2, 4],
            purchase_source_codes: vec![5, 6],
            exchange_rates: ExchangeRates::DEFAULT,
            thresholds: FlagThresholds::DEFAULT,
            meb_by_state: AnalysisSettings::default_meb_table(),
            labels: CodeLabels::default(),
            sample_target: 18000,
        }
    }
}

/// True if the answer is one of the codes.
pub fn is_coded(value: f64, codes: &[i64]) -> bool {
    codes.iter().any(|c| (*c as f64) == value)
}
