//! YAML Export functionality
//!
//! Exports the complete database to YAML format for human-readable backup.

use std::io::Write;

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

fn export_error(e: impl std::fmt::Display) -> CheckdeskError {
    CheckdeskError::Export(e.to_string())
}

/// Export the full database to YAML format
pub fn export_full_yaml<W: Write>(storage: &Storage, writer: &mut W) -> CheckdeskResult<usize> {
    let export = FullExport::from_storage(storage)?;

    writeln!(writer, "# checkdesk full database export").map_err(export_error)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_error)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_error)?;
    writeln!(writer).map_err(export_error)?;

    serde_yaml::to_writer(writer, &export).map_err(export_error)?;

    Ok(export.metadata.check_count)
}

/// Parse and validate a YAML export
pub fn import_from_yaml(yaml_str: &str) -> CheckdeskResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| CheckdeskError::Import(e.to_string()))?;
    export.validate().map_err(CheckdeskError::Import)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bank;

    #[test]
    fn test_yaml_export_round_trip() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .banks()
            .insert(&Bank::new("Bank of Africa", Some("BOA".into())))
            .unwrap();

        let mut out = Vec::new();
        export_full_yaml(&storage, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# checkdesk full database export"));

        let export = import_from_yaml(&text).unwrap();
        assert_eq!(export.banks[0].name, "Bank of Africa");
    }
}
