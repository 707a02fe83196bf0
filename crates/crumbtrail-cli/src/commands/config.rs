//! Configuration management commands.

use crumbtrail_core::config::IssueSeverity;
use crumbtrail_core::error::format_error_with_suggestion;
use crumbtrail_core::TrackingConfig;

use crate::{AppContext, ConfigAction};

pub fn handle(action: ConfigAction, ctx: &AppContext) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(&ctx.config)?);
        }
        ConfigAction::Check => {
            let result = ctx.config.validate();
            if result.issues.is_empty() {
                let tracking = TrackingConfig::from_config(&ctx.config.breadcrumbs)
                    .map_err(|e| anyhow::anyhow!(format_error_with_suggestion(&e)))?;
                println!("✓ Configuration is valid");
                println!("  tracking: {}", tracking.supported_paths().join(", "));
                println!("  max crumbs: {}", tracking.max_crumbs());
                return Ok(());
            }

            for issue in &result.issues {
                let marker = match issue.severity {
                    IssueSeverity::Error => "✗",
                    IssueSeverity::Warning => "!",
                };
                println!("  {} {}: {}", marker, issue.field, issue.message);
            }

            if !result.is_ok() {
                anyhow::bail!("{} configuration error(s)", result.errors().len());
            }
        }
    }
    Ok(())
}
