use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use promdeps::extract_metric_names;

use crate::config::{Configuration, LogFormat};
use crate::error::ServerError;

#[derive(Parser, Debug, Clone)]
#[command(name = "promdeps")]
#[command(about = "Extracts the metric names referenced by PromQL expressions")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Log filter directive, e.g. \"debug\"")]
    pub log_level: Option<String>,

    #[arg(long, global = true, value_enum, help = "Log output format")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Default, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default behavior)
    #[default]
    Serve,
    /// Print the metric names referenced by the given expressions. Reads a JSON
    /// array of expressions from stdin when none are given.
    Extract {
        exprs: Vec<String>,

        #[arg(long, help = "Pretty-print the JSON output")]
        pretty: bool,
    },
    /// Show the effective configuration and exit
    Config,
}

impl Cli {
    /// Applies the logging flags on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Configuration) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

/// Runs extraction for `exprs`, or for a JSON array read from `input` when `exprs`
/// is empty, and writes the result as JSON to `output`.
pub fn run_extract<R: Read, W: Write>(
    exprs: Vec<String>,
    pretty: bool,
    input: R,
    mut output: W,
) -> Result<(), ServerError> {
    let exprs = if exprs.is_empty() {
        let exprs: Option<Vec<String>> = serde_json::from_reader(input)?;
        exprs.unwrap_or_default()
    } else {
        exprs
    };

    let result = extract_metric_names(&exprs);
    if pretty {
        serde_json::to_writer_pretty(&mut output, &result)?;
    } else {
        serde_json::to_writer(&mut output, &result)?;
    }
    writeln!(output)?;
    Ok(())
}

/// Writes the effective configuration as pretty JSON.
pub fn run_show_config<W: Write>(config: &Configuration, mut output: W) -> Result<(), ServerError> {
    serde_json::to_writer_pretty(&mut output, config)?;
    writeln!(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    fn extract_to_string(exprs: &[&str], stdin: &str) -> Result<String, ServerError> {
        let exprs = exprs.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        run_extract(exprs, false, stdin.as_bytes(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["promdeps"]).unwrap();
        assert_eq!(cli.command.unwrap_or_default(), Command::Serve);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "promdeps",
            "extract",
            "up",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Extract {
                exprs: vec!["up".to_string()],
                pretty: false
            })
        );

        let mut config = Configuration::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_log_format() {
        assert!(Cli::try_parse_from(["promdeps", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_extract_args() {
        let out = extract_to_string(&["sum(rate(a[5m]))", "a / b", "b{"], "").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["metrics"], serde_json::json!(["a", "b"]));
        assert_eq!(value["errors"][0], "");
        assert_eq!(value["errors"][1], "");
        assert!(!value["errors"][2].as_str().unwrap().is_empty());
        assert!(out.ends_with('\n'));
    }

    #[test_case("[\"up\", \"up offset $__range\"]", r#"{"metrics":["up"],"errors":["",""]}"# ; "array")]
    #[test_case("null", r#"{"metrics":[],"errors":[]}"# ; "null")]
    #[test_case("[]", r#"{"metrics":[],"errors":[]}"# ; "empty")]
    fn test_extract_stdin(stdin: &str, expected: &str) {
        let out = extract_to_string(&[], stdin).unwrap();
        assert_eq!(out.trim_end(), expected);
    }

    #[test]
    fn test_extract_stdin_invalid() {
        let err = extract_to_string(&[], "{\"up\": 1}").unwrap_err();
        assert!(matches!(err, ServerError::Json(_)));
    }

    #[test]
    fn test_show_config() {
        let mut out = Vec::new();
        run_show_config(&Configuration::default(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["server"]["port"], 8080);
        assert_eq!(value["logging"]["format"], "compact");
    }
}
