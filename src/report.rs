use serde::{Deserialize, Serialize};

use crate::checker::CheckResult;
use crate::config::Severity;
use crate::lexer::Location;

/// Payload attached to every finding so hosts can build quick fixes without
/// re-scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingData {
    pub compound: String,
    #[serde(alias = "unknownWords")]
    pub unknown_parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub location: Location,
    /// Byte range in the scanned text.
    pub offset: usize,
    pub len: usize,
    pub severity: Severity,
    pub message: String,
    pub data: FindingData,
}

impl Finding {
    pub fn from_result(result: CheckResult, severity: Severity) -> Finding {
        let message = message(&result.token.lexeme, &result.unknown_parts);
        Finding {
            location: result.token.location(),
            offset: result.token.offset,
            len: result.token.len(),
            severity,
            message,
            data: FindingData {
                compound: result.token.lexeme,
                unknown_parts: result.unknown_parts,
            },
        }
    }
}

pub fn report(results: Vec<CheckResult>, severity: Severity) -> Vec<Finding> {
    results
        .into_iter()
        .map(|r| Finding::from_result(r, severity))
        .collect()
}

pub fn message(compound: &str, unknown_parts: &[String]) -> String {
    match unknown_parts {
        [part] => format!("Unknown word part: \"{part}\" in \"{compound}\""),
        parts => format!(
            "Multiple unknown word parts: \"{}\" in \"{compound}\"",
            parts.join("\", \"")
        ),
    }
}
