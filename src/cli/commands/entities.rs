use std::sync::Arc;

use clap::Args;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::database::metadata::StaticSchema;
use crate::database::soft_delete::SoftDeleteRegistry;

#[derive(Args)]
pub struct EntitiesArgs {
    #[arg(long, help = "Deletion marker field (defaults to SOFT_DELETE_FIELD)")]
    pub marker: Option<String>,
}

pub async fn handle(args: EntitiesArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let schema = Arc::new(StaticSchema::new());
    let names: Vec<&str> = schema.entity_names().collect();
    let marker = args.marker.unwrap_or_else(|| crate::config::config().soft_delete.field.clone());

    let registry = SoftDeleteRegistry::new(schema.clone(), marker);
    registry.warm(&names).await;
    let entities = registry.snapshot().await;

    match output_format {
        OutputFormat::Json => {
            let list: Vec<_> = entities
                .iter()
                .map(|(name, soft)| json!({ "entity": name, "soft_delete": soft }))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "marker": registry.marker(), "entities": list }))?
            );
        }
        OutputFormat::Text => {
            println!("{:<32} {}", "ENTITY", format!("SOFT DELETE ({})", registry.marker()));
            for (name, soft) in &entities {
                println!("{:<32} {}", name, if *soft { "yes" } else { "no" });
            }
        }
    }
    Ok(())
}
