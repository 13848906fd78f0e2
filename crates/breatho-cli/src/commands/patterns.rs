use clap::Subcommand;
use breatho_core::{BreathingPattern, Config, CoreError};

use super::resolve_pattern;

#[derive(Subcommand)]
pub enum PatternsAction {
    /// List presets and custom patterns
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one pattern
    Show {
        /// Pattern id or name (e.g. "box")
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: PatternsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        PatternsAction::List { json } => {
            let catalog = config.catalog().map_err(CoreError::from)?;
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.list())?);
            } else {
                let default_id = config.session.default_pattern.to_lowercase();
                for pattern in catalog.list() {
                    let marker = if pattern.id.to_lowercase() == default_id { "*" } else { " " };
                    println!("{marker} {}", summary_line(pattern));
                }
            }
        }
        PatternsAction::Show { id, json } => {
            let (_, pattern) = resolve_pattern(&config, Some(&id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pattern)?);
            } else {
                println!("{}", summary_line(&pattern));
                if !pattern.description.is_empty() {
                    println!("  {}", pattern.description);
                }
                let phases = pattern
                    .active_phases()
                    .iter()
                    .map(|p| format!("{p} {}s", pattern.duration_ms(*p) as f64 / 1000.0))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                println!("  {phases}");
                println!("  cycle: {}s", pattern.cycle_ms() as f64 / 1000.0);
            }
        }
    }
    Ok(())
}

fn summary_line(pattern: &BreathingPattern) -> String {
    format!(
        "{:<8} {:<18} {:<10} {}",
        pattern.id,
        pattern.name,
        pattern.rhythm(),
        pattern.color.as_str()
    )
}
