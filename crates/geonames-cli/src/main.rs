//! geonames — Command-line interface for geonames-core
//!
//! Build an index from a GeoNames dump, then locate countries, provinces
//! and cities mentioned in free-text queries, one JSON answer per input
//! line.
//!
//! Usage examples
//! --------------
//!
//! - Build the map file once
//!   $ geonames -b geonames.idx allCountries.txt
//!
//! - Parse literal queries
//!   $ geonames -q "San Jose, CA" -q "Paris France" geonames.idx
//!
//! - Stream JSON lines, reading the "location" field of each object
//!   $ geonames -j location -i users.jsonl -1 geonames.idx
//!
//! - Prefer one country and reject ambiguous answers
//!   $ geonames --default-country France -u geonames.idx

mod args;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::args::CliArgs;
use geonames_core::{build_index, GeoStore, MappedStore, ParsedObject, ParserSettings};

#[derive(Debug, Default, Serialize)]
struct AnswerStats {
    queries: usize,
    unique: usize,
    ambiguous: usize,
    unknown: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();

    if let Some(map_path) = &args.build {
        let stats = build_index(map_path, &args.geodata).context("failed to build map file")?;
        println!("Map file ready ({} objects)", stats.objects);
        return Ok(());
    }

    let store = MappedStore::open(&args.geodata).context("failed to initialize geodata")?;

    let mut settings = ParserSettings {
        unique_only: args.unique_only,
        merge_near: args.merge_near,
        ..ParserSettings::default()
    };
    if let Some(extra) = &args.extra_delimiters {
        settings.delimiters.push_str(extra);
    }
    if let Some(country) = &args.default_country {
        settings.default_country = country.clone();
    }

    let input: Box<dyn BufRead> = if let Some(path) = &args.input {
        let file = File::open(path)
            .with_context(|| format!("failed to open input file {}", path.display()))?;
        Box::new(BufReader::new(file))
    } else if !args.queries.is_empty() {
        Box::new(Cursor::new(args.queries.join("\n")))
    } else {
        Box::new(BufReader::new(io::stdin()))
    };

    let mut output: Box<dyn Write> = if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file {}", path.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(io::stdout())
    };

    let mut stats = AnswerStats::default();
    for (n, line) in input.lines().enumerate() {
        let mut line = line?;

        if let Some(field) = &args.json_field {
            let data: serde_json::Value = serde_json::from_str(&line)
                .with_context(|| format!("failed to parse JSON from line {}", n + 1))?;
            match data.get(field).and_then(|value| value.as_str()) {
                Some(value) => line = value.to_string(),
                None => continue,
            }
        }

        let results = store.parse(&line, &settings);

        let mut answer = json!({ "results": [] });
        if args.echo_queries {
            answer["_query"] = json!(line);
        }
        for res in &results {
            let mut obj = json!({ "_score": res.score });
            json_result(&mut obj, "country", &res.country, &args);
            json_result(&mut obj, "state", &res.province, &args);
            json_result(&mut obj, "city", &res.city, &args);
            answer["results"].as_array_mut().unwrap().push(obj);
        }

        stats.queries += 1;
        if results.is_empty() {
            stats.unknown += 1;
        } else if results.len() == 1 {
            stats.unique += 1;
        } else {
            stats.ambiguous += 1;
        }

        if !results.is_empty() || !args.parsed_only {
            let rendered = if args.one_line {
                serde_json::to_string(&answer)?
            } else {
                serde_json::to_string_pretty(&answer)?
            };
            writeln!(output, "{rendered}")?;
        }
    }
    output.flush()?;

    if args.print_stats {
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}

fn json_result(
    answer: &mut serde_json::Value,
    name: &str,
    parsed: &Option<ParsedObject<'_>>,
    args: &CliArgs,
) {
    let Some(parsed) = parsed else { return };
    let entity = &parsed.entity;

    let mut obj = json!({
        "name": entity.name,
        "latitude": entity.latitude,
        "longitude": entity.longitude,
    });
    if args.info {
        obj["id"] = json!(entity.id);
        obj["type"] = json!(entity.kind.to_code());
    }
    answer[name] = obj;
    if args.tokens {
        answer[format!("_{name}_tokens")] = json!(parsed.tokens);
    }
}
