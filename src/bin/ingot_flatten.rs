//! ingot-flatten: Flatten JSON entities into a CSV table
//!
//! Each input record is deserialized into the chosen model type, flattened,
//! and written as one row. Columns are the flat paths.
//!
//! Usage:
//!   # A JSON array (or a single object) of users, to stdout
//!   ingot-flatten --entity user users.json
//!
//!   # NDJSON from stdin, wire names in the header, tab-separated
//!   cat users.jsonl | ingot-flatten --entity user --ndjson --wire-names --delimiter tab
//!
//!   # Write to a file without the header row
//!   ingot-flatten --entity company companies.json --no-header -o companies.csv

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use ingot::model::{Address, Company, ContactInfo, ModelKind, Project, User};
use ingot::table::parse_delimiter;
use ingot::{Codec, CodecConfig, Entity, Naming, Table, TableConfig};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "ingot-flatten")]
#[command(about = "Flatten JSON entities into a CSV table", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Entity type of every input record
    #[arg(long, short = 'e', value_enum)]
    entity: ModelKind,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Name columns by wire name instead of field name
    #[arg(long)]
    wire_names: bool,

    /// Field delimiter (a single ASCII character, or `tab`)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Don't write the header row
    #[arg(long)]
    no_header: bool,

    /// Output file (use stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Log progress to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ingot::logging::init(args.verbose);

    let naming = if args.wire_names {
        Naming::WireName
    } else {
        Naming::FieldName
    };
    let codec = Codec::new(args.entity.registry()?, CodecConfig::with_naming(naming))?;

    let reader = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        )) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };
    let records = read_records(reader, args.ndjson)?;
    info!(records = records.len(), entity = args.entity.type_name(), "read input");

    let table = match args.entity {
        ModelKind::User => flatten::<User>(&codec, records)?,
        ModelKind::Company => flatten::<Company>(&codec, records)?,
        ModelKind::Address => flatten::<Address>(&codec, records)?,
        ModelKind::ContactInfo => flatten::<ContactInfo>(&codec, records)?,
        ModelKind::Project => flatten::<Project>(&codec, records)?,
    };

    let config = TableConfig {
        delimiter: args.delimiter,
        include_header: !args.no_header,
    };
    let writer = if let Some(file_path) = &args.output {
        Box::new(BufWriter::new(
            File::create(file_path).with_context(|| format!("Failed to create {}", file_path))?,
        )) as Box<dyn Write>
    } else {
        Box::new(std::io::stdout()) as Box<dyn Write>
    };
    table.write_csv(writer, &config)?;

    Ok(())
}

/// Read JSON records using SIMD-accelerated parsing when possible
fn read_records(reader: Box<dyn Read>, ndjson: bool) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader.read_to_end(&mut content).context("Failed to read input")?;

    let mut records = Vec::new();
    if ndjson {
        for (n, line) in content.split_mut(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let value: Value = simd_json::serde::from_slice(line)
                .with_context(|| format!("Failed to parse JSON on line {}", n + 1))?;
            records.push(value);
        }
        return Ok(records);
    }

    // simd-json parses in place, so the buffer is unusable after an error
    match simd_json::serde::from_slice::<Value>(&mut content).context("Failed to parse JSON")? {
        Value::Array(items) => records.extend(items),
        value => records.push(value),
    }
    debug!(records = records.len(), "parsed JSON input");
    Ok(records)
}

fn flatten<T: Entity + DeserializeOwned>(codec: &Codec, records: Vec<Value>) -> Result<Table> {
    let mut table = Table::new();
    for (n, value) in records.into_iter().enumerate() {
        let entity: T = serde_json::from_value(value)
            .with_context(|| format!("Record {} is not a valid {}", n + 1, T::TYPE_NAME))?;
        let pairs = codec
            .encode(&entity)
            .with_context(|| format!("Failed to flatten record {}", n + 1))?;
        table.push_pairs(&pairs)?;
    }
    Ok(table)
}
