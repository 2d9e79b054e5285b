// Primitives for reading delimited text files.

use crate::qc::{io_common::RawTable, *};

pub fn read_csv_table(path: &str, cfs: &FileSource) -> BQcResult<RawTable> {
    let delimiter = cfs.delimiter_byte()?;
    debug!(
        "read_csv_table: path: {:?} delimiter: {:?}",
        path, delimiter as char
    );
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header: Vec<String> = records
        .next()
        .context(EmptyInputSnafu { path })?
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_table: header: {:?}", header);

    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    // The index starts at 1 to respect most conventions in the excel world
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if line.iter().all(|c| c.trim().is_empty()) {
            debug!("read_csv_table: skipping empty line {}", lineno);
            continue;
        }
        rows.push((lineno, line.iter().map(|s| s.to_string()).collect()));
    }
    info!("read_csv_table: {}: {} rows", path, rows.len());
    Ok(RawTable {
        path: path.to_string(),
        header,
        rows,
    })
}
