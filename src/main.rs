//! Purpose: `pointbase` CLI entry point and argument surface.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Command output is JSON on stdout; errors are JSON on stderr when piped.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All store mutations go through `api::Store` (load/save contract).
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use pointbase::api::{
    Backup, Criteria, DEFAULT_BACKUP_SUFFIX, Error, ErrorKind, Record, SaveOptions, Store,
    to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome { exit_code });
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(err.to_string().trim_end().to_string())
                    .with_hint("Run `pointbase --help` for usage."));
            }
        },
    };

    init_tracing(cli.verbose);
    command_dispatch::dispatch_command(cli.command)
}

fn init_tracing(verbose: bool) {
    if !verbose {
        return;
    }
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "pointbase",
    version,
    about = "Flat-file record stores for schema-less data points",
    after_help = r#"EXAMPLES
  $ pointbase add results.json --no-backup --data-json '{"configuration": "ts1", "electron_energy": -152.13}'
  $ pointbase list results.json configuration=ts1
  $ pointbase get results.json configuration=ts1 method=b3lyp
  $ pointbase prop results.json electron_energy configuration=ts1 --tol 0.001
  $ pointbase remove results.json configuration=ts1

NOTES
  - Criteria are KEY=VALUE pairs; VALUE is parsed as JSON, falling back to a string
  - A record only matches when the key is present and the value is equal
  - Mutating commands back up the store file to <file>.bak before saving"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true, help = "Enable debug diagnostics on stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List records matching the criteria, one JSON object per line")]
    List {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(value_name = "KEY=VALUE")]
        criteria: Vec<String>,
        #[arg(long, help = "Wrap each record with its position in the store")]
        index: bool,
    },
    #[command(about = "Get the single record matching the criteria")]
    Get {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(value_name = "KEY=VALUE")]
        criteria: Vec<String>,
    },
    #[command(
        about = "Get one property across all matching records",
        long_about = "Get the value of one property across all records matching the criteria.\n\
                      With --tol, numeric values may disagree up to the given spread and the\n\
                      arithmetic mean is reported; without it, more than one value is an error."
    )]
    Prop {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(value_name = "KEY=VALUE")]
        criteria: Vec<String>,
        #[arg(long, default_value_t = 0.0, help = "Tolerated spread (max - min) among values")]
        tol: f64,
    },
    #[command(about = "Append one record and save the store")]
    Add {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, value_name = "JSON", help = "The record to append (default: read stdin)")]
        data_json: Option<String>,
        #[command(flatten)]
        backup: BackupArgs,
    },
    #[command(about = "Remove every record matching the criteria and save the store")]
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(value_name = "KEY=VALUE", required = true)]
        criteria: Vec<String>,
        #[command(flatten)]
        backup: BackupArgs,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct BackupArgs {
    #[arg(long, help = "Skip the pre-save backup entirely")]
    no_backup: bool,
    #[arg(long, help = "Skip the backup when the store file does not exist yet")]
    backup_if_present: bool,
    #[arg(long, value_name = "SUFFIX", help = "Backup suffix (default: .bak)")]
    backup_suffix: Option<String>,
}

impl BackupArgs {
    fn policy(&self) -> Result<Backup, Error> {
        if self.no_backup {
            if self.backup_suffix.is_some() || self.backup_if_present {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--no-backup cannot be combined with other backup flags")
                    .with_hint("Drop --no-backup, or drop the suffix/if-present flags."));
            }
            return Ok(Backup::Off);
        }
        if self.backup_suffix.as_deref() == Some("") {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("--backup-suffix must not be empty")
                .with_hint("Use --no-backup to save without a backup."));
        }
        let suffix = self
            .backup_suffix
            .clone()
            .unwrap_or_else(|| DEFAULT_BACKUP_SUFFIX.to_string());
        if self.backup_if_present {
            Ok(Backup::IfPresent(suffix))
        } else {
            Ok(Backup::Suffix(suffix))
        }
    }
}

fn parse_criteria(pairs: &[String]) -> Result<Criteria, Error> {
    let mut criteria = Criteria::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("criterion `{pair}` is not a KEY=VALUE pair"))
                .with_hint("Write criteria as key=value, e.g. configuration=ts1 or count=3."));
        };
        if key.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("criterion `{pair}` has an empty property name")));
        }
        // A value that parses as JSON is compared as that JSON value;
        // anything else is taken as a bare string.
        let value: Value = serde_json::from_str(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        criteria = criteria.equals(key, value);
    }
    Ok(criteria)
}

fn parse_record(text: &str) -> Result<Record, Error> {
    let value: Value = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("record is not valid JSON")
            .with_hint("Pass a JSON object, e.g. '{\"configuration\": \"ts1\"}'.")
            .with_source(err)
    })?;
    match value {
        Value::Object(record) => Ok(record),
        other => Err(Error::new(ErrorKind::Usage).with_message(format!(
            "record must be a JSON object, got {}",
            match other {
                Value::Null => "null",
                Value::Bool(_) => "a boolean",
                Value::Number(_) => "a number",
                Value::String(_) => "a string",
                Value::Array(_) => "an array",
                Value::Object(_) => unreachable!(),
            }
        ))),
    }
}

fn read_record_input(data_json: Option<String>) -> Result<Record, Error> {
    let text = match data_json {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read record from stdin")
                    .with_source(err)
            })?;
            buffer
        }
    };
    if text.trim().is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("no record given")
            .with_hint("Pass --data-json '<object>' or pipe a JSON object on stdin."));
    }
    parse_record(&text)
}

fn emit_json(value: Value) {
    let json = serde_json::to_string(&value)
        .unwrap_or_else(|_| "{\"error\":{\"kind\":\"Internal\"}}".to_string());
    println!("{json}");
}

fn emit_record(record: &Record) {
    emit_json(Value::Object(record.clone()));
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    if let Some(message) = err.message() {
        inner.insert("message".to_string(), json!(message));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(key) = err.key() {
        inner.insert("property".to_string(), json!(key));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

#[cfg(test)]
mod tests {
    use super::{parse_criteria, parse_record};
    use pointbase::api::ErrorKind;
    use serde_json::json;

    #[test]
    fn criteria_values_parse_as_json_with_string_fallback() {
        let criteria =
            parse_criteria(&["x=1".to_string(), "name=ts1".to_string(), "flag=true".to_string()])
                .expect("criteria");
        assert_eq!(criteria.len(), 3);

        let mut record = serde_json::Map::new();
        record.insert("x".to_string(), json!(1));
        record.insert("name".to_string(), json!("ts1"));
        record.insert("flag".to_string(), json!(true));
        assert!(criteria.accepts(&record));

        record.insert("x".to_string(), json!("1"));
        assert!(!criteria.accepts(&record));
    }

    #[test]
    fn criteria_without_an_equals_sign_are_usage_errors() {
        let err = parse_criteria(&["oops".to_string()]).expect_err("usage");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn records_must_be_json_objects() {
        assert!(parse_record("{\"x\": 1}").is_ok());
        let err = parse_record("[1, 2]").expect_err("array");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = parse_record("not json").expect_err("garbage");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
