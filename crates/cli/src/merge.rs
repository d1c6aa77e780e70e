//! `survmerge merge` / `survmerge validate` — config-driven consolidation.

use std::path::{Path, PathBuf};

use survmerge_dedup::{consolidate, MergeConfig};
use survmerge_io::{discover_session_files, load_file, write_combined, CombinedHeader};

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_LOAD, EXIT_RUNTIME};
use crate::CliError;

fn merge_err(code: u8, message: impl Into<String>) -> CliError {
    CliError {
        code,
        message: message.into(),
        hint: None,
    }
}

pub fn cmd_merge(
    config_path: PathBuf,
    json_output: bool,
    audit_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| merge_err(EXIT_LOAD, format!("cannot read config: {e}")))?;
    let config = MergeConfig::from_toml(&config_str)
        .map_err(|e| merge_err(EXIT_INVALID_CONFIG, e.to_string()))?;

    // Input and output paths resolve relative to the config file's directory.
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let session_dir = base_dir.join(&config.input.dir);

    let files = discover_session_files(&session_dir, &config.input.patterns, &config.input.exclude)
        .map_err(|e| merge_err(EXIT_LOAD, e.to_string()))?;

    eprintln!("Found {} session file(s):", files.len());
    let mut records = Vec::new();
    for file in &files {
        let mut loaded = load_file(file).map_err(|e| merge_err(EXIT_LOAD, e.to_string()))?;
        eprintln!("  - {} ({} points)", file.display(), loaded.len());
        records.append(&mut loaded);
    }

    let result =
        consolidate(&records, config.strategy).map_err(|e| merge_err(EXIT_RUNTIME, e.to_string()))?;
    let audit = &result.audit;

    if let Some(ref rel) = config.output.file {
        let out_path = base_dir.join(rel);
        let header = CombinedHeader::from_audit(audit, files.len());
        write_combined(&out_path, &result.survivors, &header)
            .map_err(|e| merge_err(EXIT_RUNTIME, e.to_string()))?;
        eprintln!("wrote {}", out_path.display());
    }

    let json_str = serde_json::to_string_pretty(audit)
        .map_err(|e| merge_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
    if let Some(ref path) = audit_file {
        std::fs::write(path, &json_str)
            .map_err(|e| merge_err(EXIT_RUNTIME, format!("cannot write audit: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!(
        "merge '{}' ({}): {} -> {} points, {} duplicate group(s), {} discarded, {} rejected",
        config.name,
        audit.strategy,
        audit.total_input,
        audit.total_after,
        audit.duplicate_groups,
        audit.discarded.len(),
        audit.rejected.len(),
    );
    for lost in &audit.discarded {
        eprintln!(
            "  duplicate: id '{}' (point {}) from {} merged into id '{}' from {}",
            lost.identifier,
            lost.label,
            lost.origin,
            lost.survivor_identifier,
            lost.survivor_origin,
        );
    }
    for bad in &audit.rejected {
        eprintln!(
            "  rejected: row {} id '{}' from {}: {}",
            bad.index, bad.identifier, bad.origin, bad.reason,
        );
    }
    if let (Some(first), Some(last)) = (result.survivors.first(), result.survivors.last()) {
        eprintln!(
            "  time span: {} to {}",
            first.timestamp.format("%Y-%m-%d %H:%M:%S"),
            last.timestamp.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| merge_err(EXIT_LOAD, format!("cannot read config: {e}")))?;
    match MergeConfig::from_toml(&config_str) {
        Ok(config) => {
            eprintln!(
                "valid: merge '{}' with strategy {}, input dir '{}'",
                config.name, config.strategy, config.input.dir,
            );
            Ok(())
        }
        Err(e) => Err(merge_err(EXIT_INVALID_CONFIG, e.to_string())),
    }
}
