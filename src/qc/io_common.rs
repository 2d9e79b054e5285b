use std::path::Path;

/// The raw cells of one dataset, before the columns are resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawTable {
    pub path: String,
    pub header: Vec<String>,
    /// The rows with their line number in the file (the header is line 1).
    pub rows: Vec<(usize, Vec<String>)>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ids() {
        assert_eq!(simplify_file_name("data/round2/survey.csv"), "survey.csv");
        assert_eq!(simplify_file_name("survey.csv"), "survey.csv");
        let f = make_default_id("data/survey.xlsx");
        assert_eq!(f(12), "survey.xlsx-00000012");
    }
}
