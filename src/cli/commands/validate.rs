use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::schedule::{validate_schedules, ScheduleError, ValidationRules, WeeklySchedule};

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(help = "Schedules JSON file (stdin when omitted or '-')")]
    pub input: Option<PathBuf>,

    #[arg(long, help = "Allow schedules on the same day to overlap")]
    pub allow_overlaps: bool,
}

/// A bare schedule array, or any object with a `schedules` field
#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleInput {
    Bare(Vec<WeeklySchedule>),
    Wrapped { schedules: Vec<WeeklySchedule> },
}

pub async fn handle(args: ValidateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let input = utils::read_json_input(args.input.as_deref())?;
    let schedules = match serde_json::from_value::<ScheduleInput>(input).context("input holds no weekly schedules")? {
        ScheduleInput::Bare(s) | ScheduleInput::Wrapped { schedules: s } => s,
    };

    let mut rules = ValidationRules::from_config();
    if args.allow_overlaps {
        rules.reject_overlaps = false;
    }
    let problems = validate_schedules(&schedules, rules);

    if problems.is_empty() {
        return utils::output_success(
            output_format,
            &format!("{} schedules are valid", schedules.len()),
            Some(json!({ "schedules": schedules.len() })),
        );
    }

    let details = problems.iter().map(problem_json).collect();
    utils::output_error(output_format, "schedules failed validation", Some(details))?;
    if output_format == OutputFormat::Text {
        for p in &problems {
            eprintln!("  - {}", p);
        }
    }
    anyhow::bail!("{} schedule problems found", problems.len())
}

fn problem_json(err: &ScheduleError) -> serde_json::Value {
    json!({ "field": err.field(), "message": err.to_string() })
}
