//! Validation reports: errors with ranked suggestions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::suggest::{suggest, Suggestion, DEFAULT_LIMIT};
use crate::validator::{ErrorKind, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    #[serde(flatten)]
    pub error: ValidationError,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dataset: String,
    pub errors: Vec<ReportedError>,
}

impl ValidationReport {
    pub fn new(dataset: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let suggestions = suggest(&error.invalid_value, &error.valid_options, DEFAULT_LIMIT);
                ReportedError { error, suggestions }
            })
            .collect();
        Self {
            dataset: dataset.into(),
            errors,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn describe(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UnknownValue => "unknown value",
        ErrorKind::UnknownCompoundLeft => "unknown left side",
        ErrorKind::UnknownCompoundRight => "unknown right side",
        ErrorKind::NotInRelationship => "not related",
        ErrorKind::NoMatchingTask => "no task transforms this product with this enhancement",
    }
}

/// Parts of a rendered report that a caller may style differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// The report header
    Heading,
    /// A field name
    Field,
    /// An offending value
    Value,
    /// The suggestion label
    Hint,
}

impl ValidationReport {
    /// Render the itemized report, passing each emphasized part through `style`.
    ///
    /// `Display` uses this with no styling; terminals can add color.
    pub fn render_with<W, S>(&self, out: &mut W, style: S) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
        S: Fn(Emphasis, &str) -> String,
    {
        let heading = format!("{}: {} validation error(s)", self.dataset, self.errors.len());
        writeln!(out, "{}", style(Emphasis::Heading, &heading))?;
        for (i, reported) in self.errors.iter().enumerate() {
            let e = &reported.error;
            write!(out, "  {}. row {}", i + 1, e.row)?;
            if let Some(index) = e.array_index {
                write!(out, " (array index {index})")?;
            }
            writeln!(
                out,
                ", field `{}`: {}",
                style(Emphasis::Field, &e.field),
                describe(e.kind)
            )?;
            if let Some(compound) = &e.compound {
                writeln!(out, "     specification: {compound:?}")?;
            }
            let value = format!("{:?}", e.invalid_value);
            writeln!(out, "     value: {}", style(Emphasis::Value, &value))?;
            if e.valid_options.is_empty() {
                writeln!(out, "     valid options: (none)")?;
            } else {
                writeln!(out, "     valid options: {}", e.valid_options.join(", "))?;
            }
            if !reported.suggestions.is_empty() {
                let ranked: Vec<String> = reported
                    .suggestions
                    .iter()
                    .map(|s| format!("{} ({})", s.candidate, s.distance))
                    .collect();
                writeln!(
                    out,
                    "     {} {}",
                    style(Emphasis::Hint, "did you mean:"),
                    ranked.join(", ")
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render_with(f, |_, text| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(value: &str, options: &[&str]) -> ValidationError {
        ValidationError {
            row: 4,
            array_index: Some(2),
            field: "task".to_string(),
            invalid_value: value.to_string(),
            valid_options: options.iter().map(|s| s.to_string()).collect(),
            kind: ErrorKind::UnknownValue,
            compound: None,
        }
    }

    #[test]
    fn suggestions_are_attached_per_error() {
        let report = ValidationReport::new(
            "services",
            vec![
                error("Blurign", &["Blurring", "Staging"]),
                error("zzzzzzzz", &["Blurring"]),
            ],
        );
        assert_eq!(report.len(), 2);
        assert_eq!(report.errors[0].suggestions[0].candidate, "Blurring");
        assert!(report.errors[1].suggestions.is_empty());
    }

    #[test]
    fn rendering_is_itemized() {
        let report = ValidationReport::new("services", vec![error("Blurign", &["Blurring"])]);
        let text = report.to_string();
        assert!(text.starts_with("services: 1 validation error(s)"));
        assert!(text.contains("row 4 (array index 2), field `task`: unknown value"));
        assert!(text.contains("valid options: Blurring"));
        assert!(text.contains("did you mean: Blurring (3)"));
    }

    #[test]
    fn styled_rendering_only_wraps_emphasized_parts() {
        let report = ValidationReport::new("services", vec![error("Blurign", &["Blurring"])]);
        let mut text = String::new();
        report
            .render_with(&mut text, |emphasis, part| match emphasis {
                Emphasis::Field => format!("<{part}>"),
                Emphasis::Hint => part.to_uppercase(),
                Emphasis::Heading | Emphasis::Value => part.to_string(),
            })
            .unwrap();
        assert!(text.contains("field `<task>`: unknown value"));
        assert!(text.contains("DID YOU MEAN: Blurring (3)"));
        assert!(text.contains("value: \"Blurign\""));

        let plain = report.to_string();
        assert_eq!(plain.lines().count(), text.lines().count());
        assert!(plain.contains("did you mean: Blurring (3)"));
    }

    #[test]
    fn json_flattens_the_error_fields() {
        let report = ValidationReport::new("services", vec![error("Blurign", &["Blurring"])]);
        let value: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        let first = &value["errors"][0];
        assert_eq!(first["invalid_value"], "Blurign");
        assert_eq!(first["kind"], "unknown_value");
        assert_eq!(first["suggestions"][0]["distance"], 3);
    }
}
