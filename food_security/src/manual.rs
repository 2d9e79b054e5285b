/*!

This is the long-form manual for `food_security` and `fsqc`.

## Input

One row per household, one column per questionnaire answer. The columns
are identified by their questionnaire code (`Q5_1a`, `Q6_1_3`, ...). When a
questionnaire version renames a code, the `fieldMapping` section of the
configuration maps the semantic field name to the new code, or to a list of
alternative codes where the first one present wins:

```json
{
  "fieldMapping": {
    "household_size": "HHSize",
    "gender": ["Q2_2", "Q2_2a", "RespSex"]
  }
}
```

The semantic names are:

| field | default column |
|-------|----------------|
| `state_code` | `QState` |
| `enumerator`, `day` | `enumerator`, `day` (optional) |
| `household_size` | `Q2_7` |
| `gender` | `Q2_2` or `Q2_2a` (optional) |
| `residence_status` | `Q2_1` (optional) |
| `children_24m_17y_1` ... `_6` | `Q2_7_2a` ... `Q2_7_4b` |
| `FCSStap`, `FCSPulse`, ... | `Q5_1a`, `Q5_2a`, ... (7-day frequencies) |
| `FCSStap_source`, ... | `Q5_1b`, ... (main source) |
| `FCSStap_24h`, ... | `Q5_1c`, ... (eaten in the last 24 hours) |
| `rCSILessQlty` ... `rCSIMealNb` | `Q6_1_1` ... `Q6_1_5` |
| `HHSNoFood_FR`, `HHSBedHung`, `HHSNotEat_FR` | `Q6_7`, `Q6_8`, `Q6_11` |
| `Lcs_stress_DomAsset` ... `Lcs_crisis_wild_food` | `Q6_2_1` ... `Q6_2_10` |
| `food_expenditure_1` ... `_30` | `Q4_1a` ... `Q4_10c` |
| `education_expenditure_1`, `_2` | `Q4_14a`, `Q4_14b` |
| `liv_activ_crops` ... `liv_activ_pension` | `Q3_1_1` ... `Q3_1_13` |
| `HH_own_cattle` ... `HH_own_poultry` | `Q7_2_1` ... `Q7_2_5` (optional) |

A required column that cannot be found stops the run before any
computation, with the name of the field and the columns that were tried.

Blank and non-numeric cells are read as missing answers.

## Indicators

### Food Consumption Score

`fcs` is the weighted sum of the 7-day frequencies of the nine main
groups: cereals 2, pulses 3, dairy 4, meat and fish 4, vegetables 1,
fruits 1, oil 0.5, sugar 0.5, condiments 0. Frequencies above 7 are capped
unless `capFrequencies` is false.

| FCS | category |
|-----|----------|
| up to 28 | Poor |
| above 28, up to 42 | Borderline |
| above 42 | Acceptable |

### Reduced Coping Strategy Index

`rCSI` weighs less preferred food 1, borrowing 2, smaller portions 1,
restriction of adults 3, fewer meals 1. Two schemes are reported:

| rCSI | IPC | WFP |
|------|-----|-----|
| up to 3 | Minimal | Low (<6) |
| above 3, up to 5 | Stressed | Low (<6) |
| above 5, up to 11 | Stressed | Medium (6-11) |
| above 11, up to 18 | Stressed | High (>11) |
| above 18 | Crisis-Emergency | High (>11) |

### Household Hunger Scale

Each of the three answers is recoded: rarely (1) and sometimes (2) count 1,
often (3) counts 2, anything else counts 0. `HHS` is the sum of the codes.

| HHS | HHSCat | HHS_IPC |
|-----|--------|---------|
| 0 | No or little hunger | Minimal |
| 1 | No or little hunger | Stressed |
| 2, 3 | Moderate hunger | Crisis |
| 4 | Severe hunger | Emergency |
| 5, 6 | Severe hunger | Catastrophe |

### Livelihood Coping Strategies

The strategies are grouped into stress (4 strategies), crisis (3) and
emergency (3). A tier takes the value 2, 3 or 4 when one of its strategies
was used (answer in `lcsUsedCodes`, by default 2 and 4), and 1 otherwise.
`LCS` is the most severe tier: 1 Minimal, 2 Stressed, 3 Crisis,
4 Emergency.

## Missing and out-of-domain values

An indicator is indeterminate when an answer it needs is blank. Other
indicators of the same household are still computed. Sums over many
columns (expenditures, children, income shares) count blanks as zero and
are only indeterminate when all their columns are blank.

A value that falls outside of a categorization scheme (for example a
negative score) gets the label `unmapped` instead of a category.

In the exported dataset, indeterminate cells are blank.

## Quality checks

Each check reports the households it flags, the number that passed and
the households it could not decide on, with the reason. The MEB check is
undecided for a state missing from `mebByState`; such households are
counted as lookup misses.

Checks that combine several conditions use three-valued logic: one
condition known to be false is enough to pass the household.

The correlation of FCS with food spending (expected positive) and with
rCSI (expected negative) is reported with Pearson and Spearman
coefficients and their p-values. These do not flag households.

## Output

The summary is a JSON document. With `--reference`, it is compared line by
line with a stored summary and the run fails on any difference. The
`derivedDigest` entry is a SHA-256 fingerprint of all the derived columns,
which stays the same as long as the inputs and the settings do not change.

With an output directory, the augmented dataset is written to
`augmented.csv` and each non-empty flagged subset to `flags/<check>.csv`.
*/
