pub use crate::config::*;
use crate::schema::Field;

/// A builder for household records.
///
/// Records are usually read from a dataset. The builder is convenient when
/// the answers come from elsewhere, for example a form or a test.
///
/// ```
/// use food_security::builder::RecordBuilder;
/// use food_security::{compute_indicators, AnalysisSettings, FoodGroup};
///
/// let record = RecordBuilder::complete("hh-1")
///     .food_days(FoodGroup::Cereals, 7.0)
///     .food_days(FoodGroup::Pulses, 3.0)
///     .build();
///
/// let indicators = compute_indicators(&record, &AnalysisSettings::default());
/// assert_eq!(indicators.fcs, Ok(23.0));
/// ```
pub struct RecordBuilder {
    pub(crate) _record: HouseholdRecord,
}

impl RecordBuilder {
    /// A record where every answer is blank.
    pub fn new(id: &str) -> RecordBuilder {
        RecordBuilder {
            _record: HouseholdRecord {
                id: id.to_string(),
                ..Default::default()
            },
        }
    }

    /// A record where every numeric answer is filled: one household member
    /// in Khartoum living from crops, who neither ate nor spent anything.
    pub fn complete(id: &str) -> RecordBuilder {
        let mut builder = RecordBuilder::new(id).state(14, "Khartoum");
        for field in Field::all() {
            match field {
                Field::StateCode => {}
                Field::HouseholdSize => builder._record.set_numeric(field, Some(1.0)),
                // 1: the strategy was not used.
                Field::Lcs(_) => builder._record.set_numeric(field, Some(1.0)),
                f => builder._record.set_numeric(f, Some(0.0)),
            }
        }
        builder.livelihood(LivelihoodActivity::Crops, 100.0)
    }

    pub fn state(mut self, code: i64, name: &str) -> RecordBuilder {
        self._record.state_code = Some(code);
        self._record.state = Some(name.to_string());
        self
    }

    pub fn gender(mut self, gender: &str) -> RecordBuilder {
        self._record.gender = Some(gender.to_string());
        self
    }

    pub fn residence(mut self, residence: &str) -> RecordBuilder {
        self._record.residence = Some(residence.to_string());
        self
    }

    pub fn household_size(self, size: f64) -> RecordBuilder {
        self.field(Field::HouseholdSize, Some(size))
    }

    pub fn food_days(self, group: FoodGroup, days: f64) -> RecordBuilder {
        self.field(Field::FoodDays(group), Some(days))
    }

    /// Sets the same 7-day frequency for the nine groups of the FCS.
    pub fn fcs_days(self, days: f64) -> RecordBuilder {
        FoodGroup::FCS_GROUPS
            .iter()
            .fold(self, |b, g| b.food_days(*g, days))
    }

    pub fn food_source(self, group: FoodGroup, source: f64) -> RecordBuilder {
        self.field(Field::FoodSource(group), Some(source))
    }

    pub fn ate_24h(self, group: FoodGroup, ate: f64) -> RecordBuilder {
        self.field(Field::Food24h(group), Some(ate))
    }

    pub fn rcsi(self, strategy: RcsiStrategy, days: f64) -> RecordBuilder {
        self.field(Field::Rcsi(strategy), Some(days))
    }

    pub fn hhs(self, question: HhsQuestion, answer: f64) -> RecordBuilder {
        self.field(Field::Hhs(question), Some(answer))
    }

    pub fn lcs(self, strategy: LcsStrategy, answer: f64) -> RecordBuilder {
        self.field(Field::Lcs(strategy), Some(answer))
    }

    /// Sets one of the food expenditure amounts, in local currency.
    pub fn food_expenditure(self, idx: usize, amount: f64) -> RecordBuilder {
        self.field(Field::FoodExpenditure(idx), Some(amount))
    }

    pub fn education_expenditure(self, idx: usize, amount: f64) -> RecordBuilder {
        self.field(Field::EducationExpenditure(idx), Some(amount))
    }

    pub fn children(self, idx: usize, count: f64) -> RecordBuilder {
        self.field(Field::Children(idx), Some(count))
    }

    pub fn livelihood(self, activity: LivelihoodActivity, share: f64) -> RecordBuilder {
        self.field(Field::Livelihood(activity), Some(share))
    }

    /// Sets or clears any numeric field.
    pub fn field(mut self, field: Field, value: Option<f64>) -> RecordBuilder {
        self._record.set_numeric(field, value);
        self
    }

    pub fn build(self) -> HouseholdRecord {
        self._record
    }
}
