use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::schedule::{validate_schedules, ExpansionRequest, SessionExpander, ValidationRules};

#[derive(Args)]
pub struct ExpandArgs {
    #[arg(help = "Expansion request JSON file (stdin when omitted or '-')")]
    pub input: Option<PathBuf>,

    #[arg(long, help = "Sort sessions by start time instead of schedule order")]
    pub sort: bool,

    #[arg(long, help = "Skip schedule validation before expanding")]
    pub no_validate: bool,

    #[arg(long, help = "Refuse ranges longer than this many days")]
    pub max_range_days: Option<i64>,
}

pub async fn handle(args: ExpandArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let input = utils::read_json_input(args.input.as_deref())?;
    let request: ExpansionRequest = serde_json::from_value(input).context("input is not an expansion request")?;

    if !args.no_validate {
        let problems = validate_schedules(&request.schedules, ValidationRules::from_config());
        if !problems.is_empty() {
            let details = problems.iter().map(|p| json!(p.to_string())).collect();
            utils::output_error(output_format, "schedules failed validation", Some(details))?;
            anyhow::bail!("{} schedule problems found", problems.len());
        }
    }

    let max_range_days = args.max_range_days.or(crate::config::config().schedule.max_range_days);
    let mut sessions = SessionExpander::new()
        .with_max_range_days(max_range_days)
        .expand_request(&request)?;
    if args.sort {
        sessions.sort_by_key(|s| s.start_date);
    }

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sessions)?),
        OutputFormat::Text => {
            for s in &sessions {
                println!(
                    "{}  {:<9}  {}-{}  {}",
                    s.start_date.format("%Y-%m-%d"),
                    s.start_date.format("%A").to_string().to_uppercase(),
                    s.start_date.format("%H:%M"),
                    s.end_date.format("%H:%M"),
                    s.id
                );
            }
            println!("{} sessions", sessions.len());
        }
    }
    Ok(())
}
