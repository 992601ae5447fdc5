use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use summary_core::summary_types::{
    Audience, FocusArea, Priority, ProblemStatus, SummaryLength, TimeFrame, UrgencyLevel,
};
use summary_core::{validate, SummaryConfig, SummaryEngine, ValidationErrors};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ehr-summary")]
#[command(about = "EHR summary command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a request file and print the summary as JSON
    Summarize {
        /// Request JSON with `ehr_data` and optional `customization`
        file: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a request file and print every field error
    Validate {
        /// Request JSON with `ehr_data` and optional `customization`
        file: PathBuf,
    },
    /// List every customization option with its default
    Options,
}

/// Customization values that replace the ones in the request file.
#[derive(clap::Args, Debug, Default)]
struct Overrides {
    #[arg(long)]
    length: Option<SummaryLength>,
    #[arg(long)]
    time_frame: Option<TimeFrame>,
    #[arg(long)]
    focus_area: Option<FocusArea>,
    #[arg(long)]
    audience: Option<Audience>,
    #[arg(long)]
    urgency_level: Option<UrgencyLevel>,
}

impl Overrides {
    /// Writes the overrides into the raw request so they pass through validation like any other
    /// customization value.
    fn apply(&self, raw: &mut Value) {
        let Some(root) = raw.as_object_mut() else {
            return;
        };
        let pairs = [
            (SummaryLength::FIELD, self.length.map(SummaryLength::as_str)),
            (TimeFrame::FIELD, self.time_frame.map(TimeFrame::as_str)),
            (FocusArea::FIELD, self.focus_area.map(FocusArea::as_str)),
            (Audience::FIELD, self.audience.map(Audience::as_str)),
            (UrgencyLevel::FIELD, self.urgency_level.map(UrgencyLevel::as_str)),
        ];
        if pairs.iter().all(|(_, value)| value.is_none()) {
            return;
        }

        let customization = root
            .entry("customization")
            .or_insert_with(|| Value::Object(Default::default()));
        if customization.is_null() {
            *customization = Value::Object(Default::default());
        }
        if let Some(fields) = customization.as_object_mut() {
            for (field, value) in pairs {
                if let Some(value) = value {
                    fields.insert(field.to_string(), Value::String(value.to_string()));
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("summary_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Summarize {
            file,
            overrides,
            pretty,
        }) => {
            let mut raw = read_request(&file)?;
            overrides.apply(&mut raw);
            let (snapshot, params) = match validate(&raw) {
                Ok(valid) => valid,
                Err(errors) => exit_invalid(&errors),
            };

            let cfg = SummaryConfig::from_env()?;
            let engine = SummaryEngine::from_config(&cfg)?;
            let summary = engine.summarize(&snapshot, &params).await?;

            let output = if pretty {
                serde_json::to_string_pretty(&summary)?
            } else {
                serde_json::to_string(&summary)?
            };
            println!("{output}");
        }
        Some(Commands::Validate { file }) => {
            let raw = read_request(&file)?;
            match validate(&raw) {
                Ok(_) => println!("ok"),
                Err(errors) => exit_invalid(&errors),
            }
        }
        Some(Commands::Options) => {
            print_options(SummaryLength::FIELD, SummaryLength::VALUES, SummaryLength::default().as_str());
            print_options(TimeFrame::FIELD, TimeFrame::VALUES, TimeFrame::default().as_str());
            print_options(FocusArea::FIELD, FocusArea::VALUES, FocusArea::default().as_str());
            print_options(Audience::FIELD, Audience::VALUES, Audience::default().as_str());
            print_options(UrgencyLevel::FIELD, UrgencyLevel::VALUES, UrgencyLevel::default().as_str());
            println!();
            println!("Output values:");
            println!("  {}: {}", ProblemStatus::FIELD, ProblemStatus::VALUES.join(", "));
            println!("  {}: {}", Priority::FIELD, Priority::VALUES.join(", "));
        }
        None => {
            println!("Use 'ehr-summary --help' for commands");
        }
    }

    Ok(())
}

fn read_request(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn exit_invalid(errors: &ValidationErrors) -> ! {
    for error in errors.errors() {
        eprintln!("{error}");
    }
    std::process::exit(2);
}

fn print_options(field: &str, values: &[&str], default: &str) {
    println!("{field}:");
    for value in values {
        let marker = if *value == default { " (default)" } else { "" };
        println!("  {value}{marker}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_replace_file_customization() {
        let mut raw = json!({ "ehr_data": {}, "customization": { "audience": "Nurse", "length": "Brief" } });
        let overrides = Overrides {
            audience: Some(Audience::Patient),
            time_frame: Some(TimeFrame::CompleteHistory),
            ..Overrides::default()
        };
        overrides.apply(&mut raw);

        assert_eq!(raw["customization"]["audience"], "Patient");
        assert_eq!(raw["customization"]["time_frame"], "Complete history");
        assert_eq!(raw["customization"]["length"], "Brief");
    }

    #[test]
    fn test_overrides_keep_malformed_customization_for_validation() {
        let mut raw = json!({ "ehr_data": {}, "customization": "Nurse" });
        let overrides = Overrides {
            audience: Some(Audience::Patient),
            ..Overrides::default()
        };
        overrides.apply(&mut raw);
        assert_eq!(raw["customization"], "Nurse");

        let errors = validate(&raw).expect_err("malformed customization");
        let err = errors.find("customization").expect("customization error");
        assert_eq!(err.kind, summary_core::FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn test_overrides_fill_null_customization() {
        let mut raw = json!({ "ehr_data": {}, "customization": null });
        let overrides = Overrides {
            length: Some(SummaryLength::Brief),
            ..Overrides::default()
        };
        overrides.apply(&mut raw);
        assert_eq!(raw["customization"], json!({ "length": "Brief" }));
    }

    #[test]
    fn test_no_overrides_leave_request_untouched() {
        let mut raw = json!({ "ehr_data": {} });
        Overrides::default().apply(&mut raw);
        assert_eq!(raw, json!({ "ehr_data": {} }));
    }

    #[test]
    fn test_flags_parse_wire_values() {
        let cli = Cli::try_parse_from([
            "ehr-summary",
            "summarize",
            "request.json",
            "--time-frame",
            "Last 6 months",
            "--urgency-level",
            "Critical only",
        ])
        .expect("parse");
        let Some(Commands::Summarize { overrides, .. }) = cli.command else {
            panic!("expected summarize");
        };
        assert_eq!(overrides.time_frame, Some(TimeFrame::Last6Months));
        assert_eq!(overrides.urgency_level, Some(UrgencyLevel::CriticalOnly));
    }
}
