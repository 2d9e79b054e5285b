// CSV exports of the augmented dataset and of the flagged subsets.

use std::path::Path;

use food_security::flags::FlagResult;

use crate::qc::*;

pub fn augmented_header() -> Vec<String> {
    let mut res = vec!["id".to_string()];
    res.extend(Field::all().iter().map(|f| f.name()));
    res.push("state".to_string());
    res.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
    res
}

/// One exported row. The derived cells are blank for a record that was not augmented.
pub fn augmented_row(record: &HouseholdRecord) -> Vec<String> {
    let mut res = vec![record.id.clone()];
    res.extend(Field::all().into_iter().map(|f| record.render(f)));
    res.push(record.state.clone().unwrap_or_default());
    match record.indicators.as_ref() {
        Some(ind) => res.extend(render_derived(ind)),
        None => res.extend(DERIVED_COLUMNS.iter().map(|_| String::new())),
    }
    res
}

pub fn write_records<'a, I>(path: &Path, records: I) -> QcResult<usize>
where
    I: IntoIterator<Item = &'a HouseholdRecord>,
{
    let p = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path: p.clone() })?;
    wtr.write_record(augmented_header())
        .context(CsvWriteSnafu { path: p.clone() })?;
    let mut count = 0;
    for record in records {
        wtr.write_record(augmented_row(record))
            .context(CsvWriteSnafu { path: p.clone() })?;
        count += 1;
    }
    wtr.flush().context(CreatingOutputSnafu { path: p.clone() })?;
    debug!("write_records: {}: {} records", p, count);
    Ok(count)
}

/// Writes `augmented.csv` and, if requested, `flags/<check>.csv` for every
/// check that flagged at least one household. Returns the written paths.
pub fn export_all(
    dir: &Path,
    records: &[HouseholdRecord],
    flags: &[FlagResult],
    export_subsets: bool,
) -> QcResult<Vec<String>> {
    fs::create_dir_all(dir).context(CreatingOutputSnafu {
        path: dir.display().to_string(),
    })?;
    let mut written: Vec<String> = Vec::new();

    let augmented_p = dir.join("augmented.csv");
    write_records(&augmented_p, records.iter())?;
    written.push(augmented_p.display().to_string());

    if export_subsets {
        let flags_dir = dir.join("flags");
        fs::create_dir_all(&flags_dir).context(CreatingOutputSnafu {
            path: flags_dir.display().to_string(),
        })?;
        for flag in flags.iter().filter(|f| f.count() > 0) {
            let p = flags_dir.join(format!("{}.csv", flag.name));
            write_records(&p, flag.flagged.iter().copied())?;
            written.push(p.display().to_string());
        }
    }
    info!("export_all: wrote {} files in {:?}", written.len(), dir);
    Ok(written)
}
