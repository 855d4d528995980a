use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use log::{debug, error};
use unicode_width::UnicodeWidthChar;

use crate::checker::Checker;
use crate::config::Config;
use crate::dictionary::{AddOutcome, DictionaryStore};
use crate::report::{self, Finding};

pub fn store_for(config: &Config, folder_override: Option<PathBuf>) -> Arc<DictionaryStore> {
    let folder = folder_override.unwrap_or_else(|| config.dictionary_folder());
    let store = DictionaryStore::with_cooldown(folder, config.cooldown());
    store.load_all(true);
    Arc::new(store)
}

/// Language id for a file, named the way editors name them.
pub fn language_from_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("md" | "markdown") => "markdown",
        Some("js" | "mjs" | "cjs" | "jsx") => "javascript",
        Some("ts" | "mts" | "cts" | "tsx") => "typescript",
        Some("rs") => "rust",
        Some("py") => "python",
        Some("json") => "json",
        _ => "plaintext",
    }
}

/// `path:line:col: severity: message`, followed by the source line with
/// the token underlined.
pub fn render_finding(path: &Path, text: &str, finding: &Finding) -> String {
    let start = finding.offset;
    let end = start + finding.len;
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[start..].find('\n').map_or(text.len(), |i| start + i);
    let source_line = text[line_start..line_end].trim_end_matches('\r');

    let line_no = (finding.location.start.line() + 1).to_string();
    let gutter = " ".repeat(line_no.len());
    let pad: String = text[line_start..start]
        .chars()
        .map(|c| match c {
            '\t' => "\t".to_string(),
            c => " ".repeat(c.width().unwrap_or(0)),
        })
        .collect();
    let carets = "^".repeat(text[start..end].chars().filter_map(|c| c.width()).sum::<usize>().max(1));

    format!(
        "{}:{}:{}: {}: {}\n{gutter} |\n{line_no} | {source_line}\n{gutter} | {pad}{carets}\n",
        path.display(),
        line_no,
        finding.location.start.column() + 1,
        finding.severity,
        finding.message,
    )
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub findings: usize,
    pub failed_files: usize,
}

pub fn check_files(
    checker: &Checker,
    config: &Config,
    files: &[PathBuf],
    language: Option<&str>,
    out: &mut String,
) -> CheckSummary {
    let mut summary = CheckSummary::default();
    for path in files {
        let language_id = language.unwrap_or_else(|| language_from_path(path));
        if !config.should_check(language_id) {
            debug!("skipping {path:?} ({language_id})");
            continue;
        }
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                error!("Failed to read {path:?}: {err}");
                summary.failed_files += 1;
                continue;
            }
        };
        let findings = report::report(checker.scan(&text), config.diagnostic_severity);
        for finding in &findings {
            out.push_str(&render_finding(path, &text, finding));
        }
        summary.findings += findings.len();
    }
    summary
}

pub fn check(
    store: Arc<DictionaryStore>,
    config: &Config,
    files: &[PathBuf],
    language: Option<&str>,
) -> ExitCode {
    let mut out = String::new();
    let summary = check_files(&Checker::new(store), config, files, language, &mut out);
    print!("{out}");
    if summary.failed_files > 0 {
        return ExitCode::from(2);
    }
    if summary.findings > 0 {
        println!("{} unknown words", summary.findings);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

pub async fn add(store: Arc<DictionaryStore>, word: &str) -> ExitCode {
    match store.add_word(word).await {
        Ok(AddOutcome::Added(word)) => {
            println!("Added \"{word}\" to {}", store.user_dictionary_path().display());
            ExitCode::SUCCESS
        }
        Ok(AddOutcome::AlreadyPresent(word)) => {
            println!("\"{word}\" is already in the user dictionary.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(2)
        }
    }
}

pub async fn export(store: Arc<DictionaryStore>, path: &Path) -> ExitCode {
    match store.export_user_dictionary(path).await {
        Ok(count) => {
            println!("Exported {count} words to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(2)
        }
    }
}
