//! nanval CLI
//!
//! Command-line interface for encoding, decoding and classifying
//! NaN-boxed value words.

use clap::{Args, CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use nanval_core::{LayoutKind, TypedValue};
use nanval_inspect::{
    DecodeReport, EncodeReport, InspectConfig, InspectError, LayoutTable, OutputFormat,
    parse_word, render,
};
use serde::Serialize;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "nanval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "nanval - inspect NaN-boxed value words", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Path to configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a raw word given as 0x-prefixed hex or decimal
    Decode {
        /// Raw 64-bit word
        word: String,

        /// Pointer layout for managed words (defaults to the native layout)
        #[arg(long)]
        layout: Option<LayoutKind>,
    },

    /// Encode a value and print its word
    Encode {
        #[command(flatten)]
        value: ValueArgs,

        /// Pointer layout for --managed (defaults to the native layout)
        #[arg(long)]
        layout: Option<LayoutKind>,
    },

    /// List the supported pointer layouts
    Layouts,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Exactly one value to encode
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ValueArgs {
    /// 32-bit integer
    #[arg(long, allow_hyphen_values = true)]
    int: Option<i32>,

    /// Double (accepts NaN, inf and -inf)
    #[arg(long, allow_hyphen_values = true)]
    double: Option<f64>,

    /// Boolean (true or false)
    #[arg(long = "bool", value_name = "BOOL")]
    boolean: Option<bool>,

    #[arg(long)]
    null: bool,

    #[arg(long)]
    undefined: bool,

    /// The empty array hole
    #[arg(long)]
    empty: bool,

    /// 32-byte aligned heap address
    #[arg(long, value_name = "ADDRESS")]
    managed: Option<String>,
}

impl ValueArgs {
    fn report(self, layout: LayoutKind) -> Result<EncodeReport, InspectError> {
        if let Some(address) = self.managed {
            return EncodeReport::managed(parse_word(&address)?, layout);
        }
        let value = if let Some(i) = self.int {
            TypedValue::Integer(i)
        } else if let Some(d) = self.double {
            TypedValue::Double(d)
        } else if let Some(b) = self.boolean {
            TypedValue::Boolean(b)
        } else if self.null {
            TypedValue::Null
        } else if self.empty {
            TypedValue::Empty
        } else {
            TypedValue::Undefined
        };
        Ok(EncodeReport::new(value))
    }
}

/// Log targets are the binary (`nanval`) and its library (`nanval_inspect`)
const DEFAULT_LOG_FILTER: &str = "nanval=warn,nanval_inspect=warn";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => match InspectConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => InspectConfig::default(),
    };
    debug!(?config, "configuration loaded");
    let format = config.format(cli.format);

    match cli.command {
        Commands::Decode { word, layout } => {
            let layout = config.layout(layout);
            debug!(%layout, "decoding {}", word);
            emit(
                parse_word(&word).and_then(|raw| DecodeReport::new(raw, layout)),
                format,
            );
        }
        Commands::Encode { value, layout } => {
            emit(value.report(config.layout(layout)), format);
        }
        Commands::Layouts => {
            emit(Ok(LayoutTable::collect()), format);
        }
        Commands::Completions { shell } => {
            run_completions(shell);
        }
    }
}

fn emit<T: Serialize + Display>(report: Result<T, InspectError>, format: OutputFormat) {
    match report.and_then(|r| render(&r, format)) {
        Ok(out) if out.ends_with('\n') => print!("{}", out),
        Ok(out) => println!("{}", out),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "nanval", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_filter_covers_binary_target() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        let targets: Vec<&str> = DEFAULT_LOG_FILTER
            .split(',')
            .filter_map(|d| d.split('=').next())
            .collect();
        // Events in this binary are logged under its crate name
        let binary_target = module_path!().split("::").next().unwrap();
        assert_eq!(binary_target, "nanval");
        assert!(targets.contains(&binary_target));
        assert!(targets.contains(&"nanval_inspect"));
    }

    #[test]
    fn test_encode_one_value_only() {
        assert!(Cli::try_parse_from(["nanval", "encode", "--int", "1", "--null"]).is_err());
        assert!(Cli::try_parse_from(["nanval", "encode"]).is_err());
    }

    #[test]
    fn test_encode_negative_double() {
        let cli = Cli::try_parse_from(["nanval", "encode", "--double", "-2.5"]).unwrap();
        let Commands::Encode { value, .. } = cli.command else {
            panic!("expected encode");
        };
        let report = value.report(LayoutKind::Flat).unwrap();
        assert_eq!(report.value, TypedValue::Double(-2.5));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "nanval", "decode", "0x0", "--format", "json", "--layout", "sparc64",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        let Commands::Decode { word, layout } = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(word, "0x0");
        assert_eq!(layout, Some(LayoutKind::Sparc64));
    }

    #[test]
    fn test_encode_managed_with_layout() {
        let cli = Cli::try_parse_from([
            "nanval",
            "encode",
            "--managed",
            "0xff00000000001000",
            "--layout",
            "arm64-top-byte",
        ])
        .unwrap();
        let Commands::Encode { value, layout } = cli.command else {
            panic!("expected encode");
        };
        let report = value.report(layout.unwrap()).unwrap();
        assert_eq!(report.value, TypedValue::Managed(0xff00_0000_0000_1000));
    }
}
