//! Basic usage example for geonames-core
//!
//! This example demonstrates how to:
//! - Build an index file from a GeoNames dump
//! - Open the memory-mapped store
//! - Parse free-text queries against it
//!
//! Run with an existing index, or with a dump to build one first:
//!
//! ```text
//! cargo run --example basic_usage -- geonames.idx
//! cargo run --example basic_usage -- geonames.idx allCountries.txt
//! ```

use geonames_core::{build_index, GeoStore, MappedStore, ParserSettings};

fn main() -> geonames_core::Result<()> {
    let mut args = std::env::args().skip(1);
    let map_path = args.next().unwrap_or_else(|| "geonames.idx".to_string());

    if let Some(dump_path) = args.next() {
        println!("Building {map_path} from {dump_path}...");
        let stats = build_index(&map_path, &dump_path)?;
        println!(
            "✓ Indexed {} objects ({} countries, {} provinces, {} cities)\n",
            stats.objects, stats.countries, stats.provinces, stats.cities
        );
    }

    let store = MappedStore::open(&map_path)?;
    println!("✓ Mapped {} entities from {map_path}\n", store.len());

    let settings = ParserSettings::default();
    for query in ["San Jose, CA", "Paris France", "US", "San Francisco Bay Area"] {
        println!("--- {query} ---");
        let results = store.parse(query, &settings);
        if results.is_empty() {
            println!("(no match)");
        }
        for res in results {
            for (role, obj) in
                [("country", &res.country), ("state", &res.province), ("city", &res.city)]
            {
                if let Some(obj) = obj {
                    println!(
                        "{role}: {} ({:.2}, {:.2})",
                        obj.entity.name, obj.entity.latitude, obj.entity.longitude
                    );
                }
            }
            println!("score: {:.3}", res.score);
        }
        println!();
    }

    Ok(())
}
