// Primitives for reading xlsx workbooks.

use calamine::DataType;

use crate::qc::{io_common::RawTable, *};

pub fn read_excel_table(path: &str, cfs: &FileSource) -> BQcResult<RawTable> {
    let wrange = get_range(path, cfs)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyInputSnafu { path })?
        .iter()
        .map(read_cell)
        .collect();
    debug!("read_excel_table: header: {:?}", header);

    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells: Vec<String> = row.iter().map(read_cell).collect();
        if cells.iter().all(|c| c.is_empty()) {
            debug!("read_excel_table: skipping empty row {}", lineno);
            continue;
        }
        rows.push((lineno, cells));
    }
    info!("read_excel_table: {}: {} rows", path, rows.len());
    Ok(RawTable {
        path: path.to_string(),
        header,
        rows,
    })
}

fn get_range(path: &str, cfs: &FileSource) -> BQcResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(QcError::EmptyInput {
                path: path.to_string(),
            })),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_table: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            [(worksheet_name, wrange), ..] => {
                warn!(
                    "read_excel_table: {} has {} worksheets, using the first one: {:?}",
                    path,
                    all_worksheets.len(),
                    worksheet_name
                );
                Ok(wrange.clone())
            }
        }
    }
}

fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) | DataType::DateTime(f) => format_number(*f),
        DataType::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        DataType::Error(e) => {
            warn!("read_cell: error cell {:?} read as blank", e);
            String::new()
        }
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Float(3.0)), "3");
        assert_eq!(read_cell(&DataType::Float(2.5)), "2.5");
        assert_eq!(read_cell(&DataType::Int(14)), "14");
        assert_eq!(read_cell(&DataType::String(" Q5_1 ".to_string())), "Q5_1");
        assert_eq!(read_cell(&DataType::Empty), "");
        assert_eq!(read_cell(&DataType::Bool(true)), "1");
    }
}
