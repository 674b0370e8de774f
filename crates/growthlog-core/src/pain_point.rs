use crate::error::{GrowthError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const LABEL_MAX_CHARS: usize = 50;
pub const EXPLANATION_MAX_CHARS: usize = 100;
pub const ELLIPSIS: &str = "...";
pub const DEFAULT_MAX_POINTS: usize = 3;

// ---------------------------------------------------------------------------
// PainPoint
// ---------------------------------------------------------------------------

/// A short, labeled business problem with an explanation and a source link.
/// Absent, null or non-string fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainPoint {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub explanation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: String,
}

impl PainPoint {
    /// Build a display-ready point: label and explanation are truncated,
    /// the link is kept verbatim.
    pub fn new(label: &str, explanation: &str, link: impl Into<String>) -> Self {
        Self {
            label: truncate_chars(label, LABEL_MAX_CHARS),
            explanation: truncate_chars(explanation, EXPLANATION_MAX_CHARS),
            link: link.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.explanation.is_empty() && self.link.is_empty()
    }
}

/// Keep the first `max` characters of `text` and append `...` when it is
/// longer than `max`. Counts chars, so multi-byte text is never split.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Summaries the upstream step wrote in place of a real one start with this.
pub const GENERATION_ERROR_PREFIX: &str = "Error";

/// One analysed source post as written by the upstream summarisation step.
/// Text fields that are null or not strings load as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub summary: Option<String>,
    #[serde(default, alias = "link", deserialize_with = "lenient_opt_string")]
    pub url: Option<String>,
    /// Set by the summariser when generation failed. Any value other than
    /// null, `false` or an empty string marks the record unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl AnalysisResult {
    pub fn has_error(&self) -> bool {
        match &self.error {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// The summary, if present, non-blank and not flagged as an error either
    /// by the `error` field or by an `Error...` placeholder text.
    pub fn usable_summary(&self) -> Option<&str> {
        if self.has_error() {
            return None;
        }
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .filter(|s| !s.trim_start().starts_with(GENERATION_ERROR_PREFIX))
    }
}

fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Load analysis results from a JSON file holding either a bare array or an
/// object with a `results` array. Elements that are not objects, or that
/// cannot be read as a result, are skipped.
pub fn load_results(path: &Path) -> Result<Vec<AnalysisResult>> {
    if !path.exists() {
        return Err(GrowthError::ResultsNotFound(path.display().to_string()));
    }
    let invalid = |reason: String| GrowthError::InvalidResults {
        path: path.display().to_string(),
        reason,
    };

    let data = std::fs::read_to_string(path)?;
    let parsed: serde_json::Value =
        serde_json::from_str(&data).map_err(|e| invalid(e.to_string()))?;
    let entries = match parsed {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Object(mut map) => match map.remove("results") {
            Some(serde_json::Value::Array(entries)) => entries,
            Some(_) => return Err(invalid("'results' is not an array".to_string())),
            None => return Err(invalid("expected an array or an object with 'results'".to_string())),
        },
        _ => return Err(invalid("expected an array or an object with 'results'".to_string())),
    };

    let mut results = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            tracing::debug!(index = idx, "skipping results entry that is not an object");
            continue;
        }
        match serde_json::from_value::<AnalysisResult>(entry) {
            Ok(result) => results.push(result),
            Err(e) => tracing::debug!(index = idx, error = %e, "skipping unreadable results entry"),
        }
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Turn analysis results into at most `max_points` pain points, in input
/// order, skipping records without a usable summary. Never pads.
pub fn extract_pain_points(results: &[AnalysisResult], max_points: usize) -> Vec<PainPoint> {
    let mut points = Vec::with_capacity(max_points.min(results.len()));
    for (idx, result) in results.iter().enumerate() {
        if points.len() >= max_points {
            break;
        }
        let Some(summary) = result.usable_summary() else {
            tracing::debug!(index = idx, "skipping result without usable summary");
            continue;
        };
        points.push(PainPoint::new(
            result.title.as_deref().unwrap_or_default(),
            summary,
            result.url.clone().unwrap_or_default(),
        ));
    }
    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result(title: &str, summary: Option<&str>, url: &str) -> AnalysisResult {
        AnalysisResult {
            title: Some(title.to_string()),
            summary: summary.map(str::to_string),
            url: Some(url.to_string()),
            error: None,
        }
    }

    #[test]
    fn label_truncation_boundary() {
        let exact = "a".repeat(50);
        assert_eq!(truncate_chars(&exact, LABEL_MAX_CHARS), exact);

        let long = "b".repeat(51);
        let out = truncate_chars(&long, LABEL_MAX_CHARS);
        assert_eq!(out, format!("{}...", "b".repeat(50)));
    }

    #[test]
    fn explanation_truncation_boundary() {
        let exact = "c".repeat(100);
        let p = PainPoint::new("x", &exact, "");
        assert_eq!(p.explanation, exact);

        let long = "d".repeat(101);
        let p = PainPoint::new("x", &long, "");
        assert_eq!(p.explanation, format!("{}...", "d".repeat(100)));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = "é".repeat(51);
        let out = truncate_chars(&text, 50);
        assert_eq!(out.chars().count(), 53);
        assert!(out.starts_with(&"é".repeat(50)));
    }

    #[test]
    fn extract_skips_missing_and_errored_summaries() {
        let mut errored = result("Errored", Some("Error generating summary"), "u2");
        errored.error = Some(serde_json::json!("quota exceeded"));
        let results = vec![
            result("First", Some("first summary"), "u1"),
            errored,
            result("Missing", None, "u3"),
            result("Blank", Some("   "), "u4"),
            result("Second", Some("second summary"), "u5"),
        ];
        let points = extract_pain_points(&results, 3);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "First");
        assert_eq!(points[1].label, "Second");
        assert_eq!(points[1].link, "u5");
    }

    #[test]
    fn extract_stops_at_max_points() {
        let results: Vec<_> = (0..6)
            .map(|i| result(&format!("t{i}"), Some("s"), &format!("u{i}")))
            .collect();
        let points = extract_pain_points(&results, 3);
        let labels: Vec<_> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["t0", "t1", "t2"]);
    }

    #[test]
    fn extract_applies_truncation_and_defaults() {
        let results = vec![AnalysisResult {
            title: None,
            summary: Some("s".repeat(150)),
            url: None,
            error: Some(serde_json::Value::Bool(false)),
        }];
        let points = extract_pain_points(&results, 3);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].label, "");
        assert_eq!(points[0].explanation.len(), 103);
        assert_eq!(points[0].link, "");
    }

    #[test]
    fn pain_point_missing_fields_deserialize_empty() {
        let p: PainPoint = serde_json::from_str(r#"{"label": "only label"}"#).unwrap();
        assert_eq!(p.label, "only label");
        assert_eq!(p.explanation, "");
        assert_eq!(p.link, "");
    }

    #[test]
    fn pain_point_null_fields_deserialize_empty() {
        let p: PainPoint =
            serde_json::from_str(r#"{"label": null, "explanation": "e", "link": 7}"#).unwrap();
        assert_eq!(p.label, "");
        assert_eq!(p.explanation, "e");
        assert_eq!(p.link, "");
    }

    #[test]
    fn summary_with_error_text_is_not_usable() {
        let flagged = result("Broken", Some("Error generating summary: timeout"), "u1");
        assert!(!flagged.has_error());
        assert_eq!(flagged.usable_summary(), None);

        let ok = result("Ok", Some("Manual invoicing eats hours"), "u2");
        assert_eq!(ok.usable_summary(), Some("Manual invoicing eats hours"));

        let points = extract_pain_points(&[flagged, ok], 3);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].label, "Ok");
    }

    #[test]
    fn load_results_keeps_good_records_beside_bad_ones() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.json");
        std::fs::write(
            &path,
            r#"[{"title": "good", "summary": "fine", "url": "u"},
                {"title": 42, "summary": "x", "url": null},
                "not an object",
                {"title": "both", "summary": "s", "url": "a", "link": "b"}]"#,
        )
        .unwrap();
        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title.as_deref(), Some("good"));
        assert_eq!(loaded[1].title, None);
        assert_eq!(loaded[1].summary.as_deref(), Some("x"));
        assert_eq!(loaded[1].url, None);

        let points = extract_pain_points(&loaded, 3);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].label, "");
        assert_eq!(points[1].explanation, "x");
    }

    #[test]
    fn load_results_rejects_wrong_top_level_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shape.json");
        std::fs::write(&path, r#"{"results": "nope"}"#).unwrap();
        let err = load_results(&path).unwrap_err();
        assert!(err.to_string().contains("'results' is not an array"));

        std::fs::write(&path, "42").unwrap();
        assert!(matches!(
            load_results(&path).unwrap_err(),
            GrowthError::InvalidResults { .. }
        ));
    }

    #[test]
    fn load_results_accepts_array_and_wrapped() {
        let dir = TempDir::new().unwrap();
        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, r#"[{"title": "a", "summary": "b", "link": "c"}]"#).unwrap();
        let loaded = load_results(&bare).unwrap();
        assert_eq!(loaded[0].url.as_deref(), Some("c"));

        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(
            &wrapped,
            r#"{"results": [{"title": "a", "summary": "b"}, {"title": "x"}], "query": "q"}"#,
        )
        .unwrap();
        assert_eq!(load_results(&wrapped).unwrap().len(), 2);
    }

    #[test]
    fn load_results_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = load_results(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, GrowthError::ResultsNotFound(_)));
    }

    #[test]
    fn load_results_malformed_json_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_results(&path).unwrap_err();
        assert!(matches!(err, GrowthError::InvalidResults { .. }));
    }
}
