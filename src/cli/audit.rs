//! Audit log CLI command

use crate::audit::{AuditLogger, EntityType};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::Permission;

use super::CliContext;

/// Print the most recent audit entries, oldest first
pub fn handle_audit_command(
    ctx: &CliContext,
    limit: usize,
    entity: Option<&str>,
    user: Option<&str>,
    verbose: bool,
) -> CheckdeskResult<()> {
    ctx.require(Permission::SystemConfig)?;

    let entity_type = entity
        .map(|name| {
            EntityType::parse(name).ok_or_else(|| {
                CheckdeskError::Validation(format!(
                    "Unknown entity type '{}'. Use bank, branch, client, check, user or notification",
                    name
                ))
            })
        })
        .transpose()?;

    let logger = AuditLogger::new(ctx.paths.audit_log());
    if !logger.exists() {
        println!("No audit entries yet.");
        return Ok(());
    }

    let entries = logger.read_filtered(entity_type, user, limit)?;
    if entries.is_empty() {
        println!("No matching audit entries.");
        return Ok(());
    }

    for entry in &entries {
        if verbose {
            println!("{}", entry.format_human_readable());
        } else {
            println!(
                "{} {:<6} {:<12} {} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.operation.to_string(),
                entry.entity_type.to_string(),
                entry.entity_name.as_deref().unwrap_or(&entry.entity_id),
                entry
                    .actor
                    .as_deref()
                    .map(|a| format!("by {}", a))
                    .unwrap_or_default()
            );
        }
    }
    println!("{} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    Ok(())
}
