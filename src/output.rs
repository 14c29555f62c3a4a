//! What taskdesk commands print.
//!
//! With `--json` every command writes one envelope to stdout:
//!
//! ```json
//! {"schema_version": "taskdesk.v1", "command": "task new", "status": "success", "data": {}}
//! ```
//!
//! Failures use `"status": "error"` and an `error` object instead of `data`.
//! Without `--json` commands print a [`HumanOutput`] and errors go to stderr.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "taskdesk.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text report: a headline, `key: value` pairs, then bulleted sections.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;

        if !self.summary.is_empty() {
            write!(f, "\n\nSummary:")?;
            for (key, value) in &self.summary {
                match value.as_str() {
                    "" => write!(f, "\n- {key}")?,
                    value => write!(f, "\n- {key}: {value}")?,
                }
            }
        }

        for (title, items) in [
            ("Details", &self.details),
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ] {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "no_items")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_items")]
    next_steps: &'a [String],
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

fn print_envelope<T: Serialize>(envelope: &Envelope<'_, T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = match human {
            Some(h) => (h.warnings.as_slice(), h.next_steps.as_slice()),
            None => (&[][..], &[][..]),
        };
        return print_envelope(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings,
            next_steps,
        });
    }

    if let (false, Some(human)) = (options.quiet, human) {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps: Vec<String> = hint(err).map(str::to_string).into_iter().collect();

    if json {
        return print_envelope::<()>(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            }),
            warnings: &[],
            next_steps: &next_steps,
        });
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint(err) {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Command name for error envelopes, read from the process arguments
/// because clap may not have produced a [`crate::cli::Cli`] at all.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

/// `task new`, `notifications read`, `login`, ... from raw arguments.
fn command_name(args: impl Iterator<Item = String>) -> String {
    let mut words = Vec::with_capacity(2);
    let mut skip_value = false;
    for arg in args {
        if skip_value {
            skip_value = false;
            continue;
        }
        if arg.starts_with('-') {
            skip_value = arg == "--data-dir";
            continue;
        }
        words.push(arg);
        let grouped = matches!(words[0].as_str(), "task" | "notifications");
        if !grouped || words.len() == 2 {
            break;
        }
    }

    if words.is_empty() {
        "taskdesk".to_string()
    } else {
        words.join(" ")
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "denied",
        _ => "operation_failed",
    }
}

fn hint(err: &Error) -> Option<&'static str> {
    Some(match err {
        Error::NotAuthenticated => "taskdesk login <email>",
        Error::TaskNotFound(_) => "taskdesk task list",
        Error::UserNotFound(_) => "taskdesk users",
        Error::InvalidConfig(_) => "fix taskdesk.toml then retry",
        Error::LockFailed(_) => "retry once other taskdesk commands finish",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn command_name_includes_subcommand() {
        assert_eq!(command_name(args(&["--json", "task", "new", "Ship"])), "task new");
        assert_eq!(
            command_name(args(&["--data-dir", "/tmp/x", "login", "a@b"])),
            "login"
        );
        assert_eq!(
            command_name(args(&["notifications", "--json", "clear"])),
            "notifications clear"
        );
        assert_eq!(command_name(args(&["task"])), "task");
        assert_eq!(command_name(args(&[])), "taskdesk");
    }

    #[test]
    fn human_sections_skip_empty() {
        let mut human = HumanOutput::new("Task created successfully!");
        human.push_summary("id", "01abc");
        human.push_next_step("taskdesk task show 01abc");

        let text = human.to_string();
        assert!(text.starts_with("Task created successfully!"));
        assert!(text.contains("- id: 01abc"));
        assert!(text.contains("Next steps:"));
        assert!(!text.contains("Warnings:"));
    }

    #[test]
    fn error_envelope_shape() {
        let err = Error::NotAuthenticated;
        let steps = vec![hint(&err).unwrap_or_default().to_string()];
        let envelope = Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command: "task list",
            status: "error",
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(&err),
                details: None,
            }),
            warnings: &[],
            next_steps: &steps,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("data").is_none());
        assert!(value.get("warnings").is_none());
        assert_eq!(value["error"]["kind"], "denied");
        assert_eq!(value["next_steps"][0], "taskdesk login <email>");
    }

    #[test]
    fn hints() {
        assert_eq!(hint(&Error::NotAuthenticated), Some("taskdesk login <email>"));
        assert_eq!(hint(&Error::Rejected("x".into())), None);
    }
}
