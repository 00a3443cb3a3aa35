use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for geonames-cli
#[derive(Debug, Parser)]
#[command(name = "geonames", version, about = "Locate geonames in given strings")]
pub struct CliArgs {
    /// Build a map file from the geodata dump and exit
    #[arg(short = 'b', long = "build", value_name = "FILE")]
    pub build: Option<PathBuf>,

    /// Read queries from a file instead of stdin
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Literal query string (repeatable, discards --input)
    #[arg(short = 'q', long = "query", value_name = "STRING")]
    pub queries: Vec<String>,

    /// Write results to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Treat each input line as a JSON object and read the given field
    #[arg(short = 'j', long = "json-field", value_name = "FIELD")]
    pub json_field: Option<String>,

    /// Extra characters to tokenize queries on
    #[arg(long = "extra-delimiters", value_name = "CHARS")]
    pub extra_delimiters: Option<String>,

    /// Prefer results from the given country
    #[arg(long = "default-country", value_name = "STRING")]
    pub default_country: Option<String>,

    /// Merge nearby ambiguous results (haversine distance, km)
    #[arg(short = 'm', long = "merge-near", value_name = "KM", default_value_t = 0.0)]
    pub merge_near: f64,

    /// Output only results with a unique match
    #[arg(short = 'u', long = "unique-only")]
    pub unique_only: bool,

    /// Add the query string to the result JSON
    #[arg(short = 'Q', long = "queries")]
    pub echo_queries: bool,

    /// Add object info (id, type) to the result JSON
    #[arg(short = 'I', long = "info")]
    pub info: bool,

    /// Add the tokens used to deduce each object to the result JSON
    #[arg(short = 'T', long = "tokens")]
    pub tokens: bool,

    /// Print only successfully parsed results
    #[arg(short = 'P', long = "parsed")]
    pub parsed_only: bool,

    /// Output result JSON in one line per request
    #[arg(short = '1', long = "one-line")]
    pub one_line: bool,

    /// Print answer stats to stderr
    #[arg(short = 'S', long = "print-stats")]
    pub print_stats: bool,

    /// Map file to query, or the raw geonames dump when --build is given
    #[arg(value_name = "GEODATA")]
    pub geodata: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_mode() {
        let args =
            CliArgs::try_parse_from(["geonames", "-b", "out.idx", "allCountries.txt"]).unwrap();
        assert_eq!(args.build.unwrap(), PathBuf::from("out.idx"));
        assert_eq!(args.geodata, PathBuf::from("allCountries.txt"));
    }

    #[test]
    fn parses_query_flags() {
        let args = CliArgs::try_parse_from([
            "geonames",
            "-q",
            "San Jose, CA",
            "-q",
            "Paris",
            "-u",
            "-1",
            "-m",
            "50",
            "--default-country",
            "France",
            "geonames.idx",
        ])
        .unwrap();
        assert_eq!(args.queries, ["San Jose, CA", "Paris"]);
        assert!(args.unique_only);
        assert!(args.one_line);
        assert_eq!(args.merge_near, 50.0);
        assert_eq!(args.default_country.as_deref(), Some("France"));
    }

    #[test]
    fn geodata_is_required() {
        assert!(CliArgs::try_parse_from(["geonames"]).is_err());
    }
}
