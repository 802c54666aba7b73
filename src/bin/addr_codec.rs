//! Encode and decode schema-driven addresses from the command line.
//!
//! Usage:
//!   addr_codec [OPTIONS] SCHEMA list
//!   addr_codec [OPTIONS] SCHEMA encode VALUE...
//!   addr_codec [OPTIONS] SCHEMA decode ADDRESS...
//!   addr_codec [OPTIONS] SCHEMA prefix FIELD VALUE...
//!
//! VALUEs are decimal or `0x` hex, one per non-fixed field in schema order.
//!
//! Options:
//!   --verbose, -v  Log at debug level (`-vv` for trace); RUST_LOG overrides
//!   --human, -H    Per-field listing for `decode` instead of one tab-separated line
//!
//! Exit code 1 if any address or value could not be processed.

use anyhow::{bail, Context};
use fieldaddr::dump::{format_fields, format_schema, format_values_line};
use fieldaddr::parser::parse_number;
use fieldaddr::{load_schema_file, AddressCodec, FieldValues};

#[derive(Clone, Copy)]
enum OutputStyle {
    Compact,
    Human,
}

fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> usize {
    let before = args.len();
    args.retain(|a| a != long && a != short);
    before - args.len()
}

fn parse_values(args: &[String]) -> anyhow::Result<Vec<u64>> {
    args.iter()
        .map(|a| parse_number(a).with_context(|| format!("invalid value \"{}\"", a)))
        .collect()
}

fn init_logging(verbosity: usize) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn usage() -> ! {
    eprintln!("usage: addr_codec [-v] [-H] SCHEMA (list | encode VALUE... | decode ADDRESS... | prefix FIELD VALUE...)");
    std::process::exit(2);
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut verbosity = take_flag(&mut args, "--verbose", "-v");
    verbosity += 2 * take_flag(&mut args, "-vv", "-vv");
    let style = if take_flag(&mut args, "--human", "-H") > 0 {
        OutputStyle::Human
    } else {
        OutputStyle::Compact
    };
    init_logging(verbosity);

    if args.len() < 2 {
        usage();
    }
    let schema_path = &args[0];
    let schema = load_schema_file(schema_path)
        .with_context(|| format!("loading schema {}", schema_path))?;
    let codec = AddressCodec::new(schema);
    let rest = &args[2..];

    match args[1].as_str() {
        "list" => println!("{}", format_schema(codec.schema())),
        "encode" => {
            let values = parse_values(rest)?;
            println!("{}", codec.encode(&values)?);
        }
        "decode" => {
            let mut has_error = false;
            for text in rest {
                match codec.decode(text) {
                    Ok(values) => match style {
                        OutputStyle::Compact => {
                            println!("{}", format_values_line(codec.schema(), &values))
                        }
                        OutputStyle::Human => {
                            println!("{}", text);
                            let fields = FieldValues::new(codec.schema(), values);
                            for line in format_fields(codec.schema(), &fields).lines() {
                                println!("  {}", line);
                            }
                        }
                    },
                    Err(e) => {
                        eprintln!("{}: {}", text, e);
                        has_error = true;
                    }
                }
            }
            if has_error {
                std::process::exit(1);
            }
        }
        "prefix" => {
            let Some((field, values)) = rest.split_first() else {
                usage();
            };
            let values = parse_values(values)?;
            println!("{}", codec.prefix(&values, field)?);
        }
        other => bail!("unknown command \"{}\"", other),
    }
    Ok(())
}
