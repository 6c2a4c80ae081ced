use crate::output::read_snapshot;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a flame snapshot JSON file
///
/// Checks that it parses, that the schema version matches and that no
/// rectangle escapes the recorded scene width.
pub fn validate_snapshot_file(file_path: &Path) -> Result<()> {
    println!("Validating snapshot: {}", file_path.display());

    let snapshot = read_snapshot(file_path).context("Failed to read snapshot")?;

    if snapshot.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported snapshot version {} (expected {})",
            snapshot.version,
            SCHEMA_VERSION
        );
    }

    let right_edge = snapshot.bounds.x + snapshot.bounds.width;
    if let Some(rect) = snapshot
        .rects
        .iter()
        .find(|r| r.width > snapshot.bounds.width || r.x > right_edge)
    {
        anyhow::bail!("Rectangle '{}' lies outside the scene", rect.name);
    }

    println!("✓ Valid snapshot JSON");
    println!("  Version:     {}", snapshot.version);
    println!("  Generated:   {}", snapshot.generated_at);
    println!("  Stack order: {}", if snapshot.reverse_stack { "reverse" } else { "normal" });
    println!("  Scene:       {:.0} x {:.0}", snapshot.bounds.width, snapshot.bounds.height);
    println!("  Rectangles:  {}", snapshot.rects.len());
    if let Some(term) = &snapshot.search_term {
        println!(
            "  Search:      '{}' ({} matches)",
            term,
            snapshot.rects.iter().filter(|r| r.matched).count()
        );
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("allocscope v{}", env!("CARGO_PKG_VERSION"));
    println!("Snapshot Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Memory allocation flame graphs from stack and allocation dumps.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{write_snapshot, FlameSnapshot};
    use crate::parser::{parse_allocations, parse_stacks};
    use crate::view::FlameView;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_written_snapshot() {
        let mut view = FlameView::default();
        view.update_data(&parse_stacks("hash:a\nmain\n"), &parse_allocations("size: 10\nhash: a\n"));
        let file = NamedTempFile::new().unwrap();
        write_snapshot(&FlameSnapshot::from_view(&view), file.path()).unwrap();

        assert!(validate_snapshot_file(file.path()).is_ok());
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not json").unwrap();
        assert!(validate_snapshot_file(file.path()).is_err());
    }
}
