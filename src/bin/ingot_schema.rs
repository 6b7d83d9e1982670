//! ingot-schema: Print the JSON Schema of a model entity
//!
//! Usage:
//!   ingot-schema --entity user
//!   ingot-schema --entity company --compact

use anyhow::Result;
use clap::Parser;
use ingot::model::ModelKind;

#[derive(Parser, Debug)]
#[command(name = "ingot-schema")]
#[command(about = "Print the JSON Schema of a model entity", long_about = None)]
struct Args {
    /// Entity type to describe
    #[arg(long, short = 'e', value_enum)]
    entity: ModelKind,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Log progress to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ingot::logging::init(args.verbose);

    let registry = args.entity.registry()?;
    let schema = ingot::json_schema(&registry, args.entity.type_name())?;

    if args.compact {
        println!("{}", serde_json::to_string(&schema)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    }

    Ok(())
}
