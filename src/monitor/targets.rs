//! Target list acquisition and validation.
//!
//! Targets come from the command line, a list file, or an interactive
//! prompt. Entries made only of hex digits, dots and colons are treated as
//! IP addresses and must parse as one; anything else is taken as a hostname.

use crate::monitor::config::Config;
use crate::monitor::constants::{DEFAULT_TARGET_FILE, MAX_TARGETS};
use crate::monitor::error::{MonitorError, Result};
use colored::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, warn};

fn is_ip_like(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':')
}

fn check_target(value: &str) -> Result<()> {
    if is_ip_like(value) && value.parse::<IpAddr>().is_err() {
        return Err(MonitorError::InvalidTarget(value.to_string()));
    }
    Ok(())
}

/// Validate targets given on the command line
pub fn validate_targets(targets: &[String]) -> Result<Vec<String>> {
    let mut valid = Vec::with_capacity(targets.len());
    for target in targets {
        let target = target.trim();
        if target.is_empty() {
            continue;
        }
        check_target(target)?;
        valid.push(target.to_string());
    }

    if valid.is_empty() {
        return Err(MonitorError::NoTargets);
    }
    if valid.len() > MAX_TARGETS {
        return Err(MonitorError::Config(format!(
            "at most {} targets may be monitored",
            MAX_TARGETS
        )));
    }
    Ok(valid)
}

/// Read one target per line, skipping blanks and invalid IP addresses.
///
/// Stops after the first `MAX_TARGETS` accepted entries.
pub fn parse_target_list<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut targets = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        if check_target(entry).is_err() {
            warn!(entry = entry, "Skipping invalid IP in target list");
            continue;
        }
        targets.push(entry.to_string());
        if targets.len() == MAX_TARGETS {
            break;
        }
    }
    Ok(targets)
}

/// Load targets from a list file. An empty result is fatal.
pub fn load_target_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(MonitorError::Config(format!(
            "{} not found",
            path.display()
        )));
    }
    debug!(path = %path.display(), "Loading target list");
    let targets = parse_target_list(BufReader::new(File::open(path)?))?;
    if targets.is_empty() {
        return Err(MonitorError::NoTargets);
    }
    Ok(targets)
}

fn read_trimmed<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask the operator for targets: typed in one by one, or from `default_file`
pub fn prompt_targets<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    default_file: &Path,
) -> Result<Vec<String>> {
    writeln!(output, "Select input method:")?;
    writeln!(output, "  1) Manual entry")?;
    writeln!(output, "  2) Load from {}", DEFAULT_TARGET_FILE)?;

    loop {
        write!(output, "Enter choice (1 or 2): ")?;
        output.flush()?;
        match read_trimmed(input)?.as_deref() {
            None => return Err(MonitorError::NoTargets),
            Some("1") => return prompt_manual(input, output),
            Some("2") => return load_target_file(default_file),
            Some(_) => continue,
        }
    }
}

fn prompt_manual<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Vec<String>> {
    let mut targets: Vec<String> = Vec::new();
    writeln!(
        output,
        "Enter up to {} IP addresses or FQDNs. Type {} when finished.",
        MAX_TARGETS,
        "'end'".cyan()
    )?;

    while targets.len() < MAX_TARGETS {
        write!(output, "Target {}: ", targets.len() + 1)?;
        output.flush()?;
        let entry = match read_trimmed(input)? {
            Some(entry) => entry,
            None => break,
        };
        if entry.is_empty() {
            continue;
        }
        if entry.eq_ignore_ascii_case("end") {
            break;
        }
        if check_target(&entry).is_err() {
            writeln!(output, "  Invalid IP address. Please try again.")?;
            continue;
        }
        targets.push(entry);
    }

    if targets.len() == MAX_TARGETS {
        writeln!(output, "Reached the maximum of {} targets.", MAX_TARGETS)?;
    }
    if targets.is_empty() {
        return Err(MonitorError::NoTargets);
    }
    Ok(targets)
}

/// Pick the target source: positional targets, `--file`, the interactive
/// prompt when `interactive`, else the default list file.
pub fn resolve_targets<R: BufRead, W: Write>(
    config: &Config,
    input: &mut R,
    output: &mut W,
    interactive: bool,
) -> Result<Vec<String>> {
    if !config.targets.is_empty() {
        return validate_targets(&config.targets);
    }
    if let Some(file) = &config.file {
        return load_target_file(file);
    }
    if interactive {
        return prompt_targets(input, output, Path::new(DEFAULT_TARGET_FILE));
    }
    load_target_file(Path::new(DEFAULT_TARGET_FILE))
}
