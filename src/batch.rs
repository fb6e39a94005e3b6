//! Batch driver: one independent render session per image file.
//!
//! Sessions share nothing mutable; a failed item is recorded in the
//! summary and processing continues. A malformed seed list is treated as
//! empty; a missing input directory produces a summary note instead of an
//! error.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use rand::Rng;
use tracing::{info, warn};

use crate::config::GlitchConfig;
use crate::renderer::render;

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outputs: Vec<PathBuf>,
    pub lines: Vec<String>,
}

impl BatchSummary {
    pub fn text(&self) -> String {
        let mut out = vec![format!(
            "Batch finished {}: {}/{} images succeeded",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.succeeded,
            self.attempted
        )];
        out.push(String::new());
        out.extend(self.lines.iter().cloned());
        out.join("\n")
    }

    fn note(message: String) -> Self {
        Self {
            lines: vec![message],
            ..Self::default()
        }
    }
}

/// Parse a comma-separated seed list. Any malformed entry voids the whole
/// list (treated as "no seeds given").
pub fn parse_seed_list(input: &str) -> Vec<u64> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    let parsed: Result<Vec<u64>, _> = input
        .split(',')
        .map(|entry| entry.trim().parse::<u64>())
        .collect();
    parsed.unwrap_or_default()
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            let lower = extension.to_ascii_lowercase();
            lower == "jpg" || lower == "jpeg" || lower == "png"
        })
        .unwrap_or(false)
}

pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    font_path: Option<&Path>,
    cfg: &GlitchConfig,
    seeds_input: &str,
) -> BatchSummary {
    if !input_dir.is_dir() {
        return BatchSummary::note(format!(
            "input directory '{}' does not exist",
            input_dir.display()
        ));
    }
    if let Err(error) = fs::create_dir_all(output_dir) {
        return BatchSummary::note(format!(
            "cannot create output directory '{}': {error}",
            output_dir.display()
        ));
    }

    let mut files: Vec<PathBuf> = match fs::read_dir(input_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image_file(path))
            .collect(),
        Err(error) => {
            return BatchSummary::note(format!(
                "cannot list input directory '{}': {error}",
                input_dir.display()
            ));
        }
    };
    files.sort();

    if files.is_empty() {
        return BatchSummary::note(format!(
            "no image files in '{}'",
            input_dir.display()
        ));
    }

    let seeds = parse_seed_list(seeds_input);
    let mut summary = BatchSummary {
        attempted: files.len(),
        ..BatchSummary::default()
    };

    for (index, file) in files.iter().enumerate() {
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        let seed = seeds
            .get(index)
            .copied()
            .unwrap_or_else(|| rand::thread_rng().gen_range(1..=1_000_000));

        let output = output_dir.join(format!("glitch_{seed}_{file_name}"));
        match render(file, font_path, cfg, seed, &output) {
            Ok(stats) => {
                info!(file = %file_name, seed, boxes = stats.boxes_drawn, "batch item done");
                summary.succeeded += 1;
                summary.lines.push(format!(
                    "{file_name}: seed={seed}, boxes={}, blocks={}, connections={}",
                    stats.boxes_drawn, stats.text_blocks, stats.box_connections
                ));
                summary.outputs.push(output);
            }
            Err(error) => {
                warn!(file = %file_name, %error, "batch item failed");
                summary.failed += 1;
                summary.lines.push(format!("{file_name}: failed - {error:#}"));
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_list_parses_clean_input() {
        assert_eq!(parse_seed_list("42, 123,456"), vec![42, 123, 456]);
    }

    #[test]
    fn malformed_seed_list_is_treated_as_empty() {
        assert!(parse_seed_list("42,oops,7").is_empty());
        assert!(parse_seed_list("").is_empty());
        assert!(parse_seed_list("  ").is_empty());
    }

    #[test]
    fn missing_input_directory_is_a_summary_note_not_an_error() {
        let summary = run_batch(
            Path::new("/nonexistent/input"),
            Path::new("/tmp/glitchcore-out"),
            None,
            &GlitchConfig::default(),
            "",
        );
        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.failed, 0);
        assert!(summary.lines[0].contains("does not exist"));
    }
}
