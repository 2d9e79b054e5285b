use clap::Parser;

/// Computes food security indicators from household survey data and runs data quality checks.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration of the analysis: data sources, field mapping,
    /// lookup tables and thresholds. Relative paths in the configuration are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, fsqc will
    /// check that the generated summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the analysis will be written in JSON format to the given
    /// location. Otherwise it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the survey dataset to read. Setting this option overrides
    /// the data sources of the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv, tsv or xlsx) The type of the input. By default, it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (single character) The delimiter of delimited text inputs.
    #[clap(long, value_parser)]
    pub delimiter: Option<char>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (directory) If specified, the augmented dataset and the flagged subsets are written as CSV files
    /// in this directory. Overrides the output directory of the configuration.
    #[clap(long, value_parser)]
    pub output_dir: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
