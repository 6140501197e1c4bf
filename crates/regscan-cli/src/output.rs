//! Colored plain-text rendering of scan results.
//!
//! Uses `termcolor`. Respects `NO_COLOR` and the `--color` flag.

use std::io::Write;

use regscan_core::{
    AbortReason, Candidate, Evidence, LookupFailure, Provenance, SampleStatus, ScanResult,
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled writer over stdout.
pub struct StyledOutput {
    stdout: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    fn write_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.stdout.set_color(&spec);
        let _ = write!(self.stdout, "{}", text);
        let _ = self.stdout.reset();
    }

    fn plain(&mut self, text: &str) {
        let _ = write!(self.stdout, "{}", text);
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.stdout, "{}", text);
    }

    fn label(&mut self, name: &str, value: Option<&str>) {
        self.write_styled(&format!("{:<18}", name), None, true);
        self.line(value.unwrap_or("-"));
    }

    fn evidence_badge(&mut self, evidence: Evidence) {
        let (text, color) = match evidence {
            Evidence::Confirmed => ("confirmed", Color::Green),
            Evidence::Suspected => ("suspected", Color::Yellow),
            Evidence::Rejected => ("rejected", Color::Red),
        };
        self.write_styled(&format!("[{}]", text), Some(color), true);
    }

    /// Full listing of a scan result
    pub fn scan_result(&mut self, result: &ScanResult) {
        self.label("Root:", result.root_type.as_deref());
        self.label("Handle:", result.handle_type.as_deref());
        self.label("Target:", result.target_type.as_deref());
        self.label("Component id:", result.component_id.as_deref());
        let states = result.component_states.as_ref().map(|s| match s.count {
            Some(count) => format!("{} ({}, {} entries)", s.field, s.type_name, count),
            None => format!("{} ({})", s.field, s.type_name),
        });
        self.label("Component states:", states.as_deref());
        self.line("");

        if let Some(reason) = &result.aborted {
            self.write_styled("Scan aborted: ", Some(Color::Red), true);
            self.line(&describe_abort(reason));
            return;
        }

        if !result.found_any {
            self.write_styled("No registry found", Some(Color::Yellow), true);
            self.line("");
            return;
        }

        self.write_styled(
            &format!("Candidates ({}):", result.candidates.len()),
            None,
            true,
        );
        self.line("");
        for candidate in &result.candidates {
            self.candidate(candidate);
        }
        let _ = self.stdout.flush();
    }

    fn candidate(&mut self, candidate: &Candidate) {
        self.plain("  ");
        self.evidence_badge(candidate.evidence);
        self.plain(" ");
        self.write_styled(&candidate.path, Some(Color::Cyan), true);
        self.line(&format!(
            " : {} ({})",
            candidate.type_name,
            describe_provenance(&candidate.provenance)
        ));

        let summary = &candidate.summary;
        let size = summary
            .size
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        self.line(&format!("      size: {}", size));
        for sample in &summary.samples {
            self.line(&format!(
                "      [{}] {} -> {}",
                sample.index,
                sample.key.as_deref().unwrap_or("?"),
                sample.value_type
            ));
        }
        match &summary.status {
            SampleStatus::Sampled => {}
            SampleStatus::Empty => self.line("      (empty)"),
            SampleStatus::NotEnumerable => self.line("      (not enumerable)"),
            SampleStatus::EnumerationFailed { reason } => {
                self.write_styled("      (enumeration failed: ", Some(Color::Red), false);
                self.write_styled(reason, Some(Color::Red), false);
                self.write_styled(")", Some(Color::Red), false);
                self.line("");
            }
        }
    }
}

/// One-line description of an abort
pub fn describe_abort(reason: &AbortReason) -> String {
    let (what, field, failure) = match reason {
        AbortReason::RootUnavailable { field, failure } => ("handle", field, failure),
        AbortReason::InnerUnavailable { field, failure } => ("target", field, failure),
    };
    let cause = match failure {
        LookupFailure::UnknownBaseType(name) => format!("unknown base type {}", name),
        LookupFailure::NoRuntimeType => "instance has no runtime type".to_string(),
        LookupFailure::FieldNotFound => "field not found".to_string(),
        LookupFailure::Null => "field is null".to_string(),
        LookupFailure::Unreadable(err) => format!("unreadable: {}", err),
    };
    format!("{} field `{}` unavailable ({})", what, field, cause)
}

fn describe_provenance(provenance: &Provenance) -> String {
    match provenance {
        Provenance::FastPath => "fast path".to_string(),
        Provenance::Direct => "direct".to_string(),
        Provenance::Nested {
            container_field,
            container_type,
        } => format!("inside {}: {}", container_field, container_type),
    }
}
