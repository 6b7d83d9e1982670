//! ingot-unflatten: Rebuild JSON entities from a CSV table
//!
//! The inverse of ingot-flatten: every row is decoded into the chosen model
//! type and written as one line of NDJSON.
//!
//! Usage:
//!   ingot-unflatten --entity user users.csv
//!   ingot-flatten --entity user --wire-names users.json | ingot-unflatten --entity user --wire-names

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use ingot::model::{Address, Company, ContactInfo, ModelKind, Project, User};
use ingot::table::parse_delimiter;
use ingot::{Codec, CodecConfig, Entity, Naming, Table, TableConfig};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ingot-unflatten")]
#[command(about = "Rebuild JSON entities from a CSV table", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Entity type of every row
    #[arg(long, short = 'e', value_enum)]
    entity: ModelKind,

    /// Columns are named by wire name instead of field name
    #[arg(long)]
    wire_names: bool,

    /// Field delimiter (a single ASCII character, or `tab`)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

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
    let config = TableConfig {
        delimiter: args.delimiter,
        include_header: true,
    };
    let table = Table::read_csv(reader, &config)?;
    info!(rows = table.len(), columns = table.columns().len(), "read table");

    let mut writer = if let Some(file_path) = &args.output {
        Box::new(BufWriter::new(
            File::create(file_path).with_context(|| format!("Failed to create {}", file_path))?,
        )) as Box<dyn Write>
    } else {
        Box::new(std::io::stdout()) as Box<dyn Write>
    };

    match args.entity {
        ModelKind::User => unflatten::<User, _>(&codec, &table, &mut writer)?,
        ModelKind::Company => unflatten::<Company, _>(&codec, &table, &mut writer)?,
        ModelKind::Address => unflatten::<Address, _>(&codec, &table, &mut writer)?,
        ModelKind::ContactInfo => unflatten::<ContactInfo, _>(&codec, &table, &mut writer)?,
        ModelKind::Project => unflatten::<Project, _>(&codec, &table, &mut writer)?,
    }

    writer.flush().context("Failed to flush writer")?;
    Ok(())
}

/// Decode every row and write it as newline-delimited JSON
fn unflatten<T: Entity + Serialize, W: Write>(codec: &Codec, table: &Table, writer: &mut W) -> Result<()> {
    for (n, pairs) in table.rows()?.into_iter().enumerate() {
        let entity: T = codec
            .decode(&pairs)
            .with_context(|| format!("Failed to decode row {} as {}", n + 1, T::TYPE_NAME))?;
        let line = serde_json::to_string(&entity).context("Failed to serialize entity")?;
        writeln!(writer, "{}", line).context("Failed to write entity")?;
    }
    Ok(())
}
