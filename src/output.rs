// src/output.rs
// =============================================================================
// Prints lint results, either as a human-readable table or as JSON.
//
// One FileReport per input file. The JSON form is an array of them:
//
//   [{ "file": "README.md", "findings": [...], "failures": [...] }]
// =============================================================================

use anyhow::Result;
use serde::Serialize;

use no_dead_urls::{Finding, LintReport, Severity};

/// A URL whose check broke instead of settling.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub url: String,
    pub error: String,
}

/// Results for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub findings: Vec<Finding>,
    pub failures: Vec<Failure>,
}

impl FileReport {
    pub fn new(file: impl Into<String>, report: LintReport) -> Self {
        FileReport {
            file: file.into(),
            findings: report.findings,
            failures: report
                .failures
                .into_iter()
                .map(|(url, error)| Failure {
                    url,
                    error: error.to_string(),
                })
                .collect(),
        }
    }
}

/// Prints results either as a table or JSON.
pub fn print_results(reports: &[FileReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        print_table(reports);
    }
    Ok(())
}

fn print_table(reports: &[FileReport]) {
    for report in reports {
        for finding in &report.findings {
            println!("{}", format_finding(&report.file, finding));
            if let Some(cause) = &finding.cause {
                println!("    {}", cause);
            }
        }
        for failure in &report.failures {
            println!("{}  {:<8} {}", report.file, "error", failure.error);
        }
    }

    let findings = reports.iter().flat_map(|report| &report.findings);
    let fatal = findings.clone().filter(|finding| finding.is_fatal()).count();
    let advisory = findings.count() - fatal;
    let failures: usize = reports.iter().map(|report| report.failures.len()).sum();

    println!();
    println!("📊 Summary:");
    println!("   ❌ Dead: {}", fatal);
    println!("   ⚠️  Warnings: {}", advisory);
    println!("   💥 Errors: {}", failures);
    println!("   📄 Files: {}", reports.len());
}

// FILE:LINE:COL  SEVERITY MESSAGE
fn format_finding(file: &str, finding: &Finding) -> String {
    let place = match finding.position {
        Some(position) => format!("{}:{}:{}", file, position.line, position.column),
        None => file.to_string(),
    };
    format!("{}  {:<8} {}", place, format_severity(finding.severity), finding.message)
}

fn format_severity(severity: Severity) -> &'static str {
    match severity {
        Severity::Fatal => "error",
        Severity::Advisory => "warning",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use no_dead_urls::document::Position;
    use no_dead_urls::CheckError;

    fn finding(severity: Severity, position: Option<Position>) -> Finding {
        Finding {
            message: "Unexpected dead URL `https://a.com/`, expected live URL".to_string(),
            severity,
            position,
            url: Some("https://a.com/".to_string()),
            cause: None,
            expected: None,
            actual: None,
        }
    }

    #[test]
    fn test_format_finding_with_position() {
        let position = Position { line: 3, column: 5, offset: 20 };
        let line = format_finding("README.md", &finding(Severity::Fatal, Some(position)));
        assert_eq!(
            line,
            "README.md:3:5  error    Unexpected dead URL `https://a.com/`, expected live URL"
        );
    }

    #[test]
    fn test_format_document_level_finding() {
        let line = format_finding("README.md", &finding(Severity::Advisory, None));
        assert!(line.starts_with("README.md  warning  "));
    }

    #[test]
    fn test_file_report_json() {
        let report = LintReport {
            findings: vec![finding(Severity::Fatal, None)],
            failures: vec![(
                "https://x.com/".to_string(),
                CheckError::Client("boom".to_string()),
            )],
            checked: 2,
        };
        let json = serde_json::to_value(FileReport::new("a.md", report)).unwrap();

        assert_eq!(json["file"], "a.md");
        assert_eq!(json["findings"][0]["severity"], "fatal");
        assert!(json["findings"][0].get("position").is_none());
        assert_eq!(json["failures"][0]["url"], "https://x.com/");
    }
}
