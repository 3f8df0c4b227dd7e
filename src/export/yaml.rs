//! YAML export, for a human-readable copy of the ledger

use std::io::Write;

use crate::error::LedgerResult;
use crate::storage::LedgerSnapshot;

use super::export_error;
use super::json::FullExport;

pub fn export_full_yaml<W: Write>(snapshot: &LedgerSnapshot, writer: &mut W) -> LedgerResult<()> {
    let export = FullExport::from_snapshot(snapshot);

    writeln!(writer, "# Pocket Ledger Export").map_err(export_error)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_error)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_error)?;
    writeln!(writer, "#").map_err(export_error)?;
    writeln!(writer, "# Contains every entry and budget in the ledger.").map_err(export_error)?;
    writeln!(writer).map_err(export_error)?;

    serde_yaml::to_writer(writer, &export).map_err(export_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::json::tests::sample_snapshot;

    #[test]
    fn test_yaml_export() {
        let mut output = Vec::new();
        export_full_yaml(&sample_snapshot(), &mut output).unwrap();
        let yaml = String::from_utf8(output).unwrap();

        assert!(yaml.starts_with("# Pocket Ledger Export"));
        assert!(yaml.contains("Groceries"));
        assert!(yaml.contains("Travel"));
    }

    #[test]
    fn test_yaml_parses_back() {
        let snapshot = sample_snapshot();
        let mut output = Vec::new();
        export_full_yaml(&snapshot, &mut output).unwrap();

        // serde_yaml treats the header lines as comments
        let parsed: FullExport = serde_yaml::from_slice(&output).unwrap();
        assert_eq!(parsed.metadata.entry_count, 2);
        assert!(parsed.entries.contains(&snapshot.entries[1]));
    }
}
