//! Parsing and validation of the inference service's response text.

use crate::types::{AnalysisError, AnalysisResult};

/// Upper bound on the number of dimension entries accepted.
///
/// The response schema cannot express a `maxItems`, so a runaway
/// response is rejected here instead of being rendered.
pub const MAX_DIMENSIONS: usize = 64;

/// Parse the service's raw response text into an [`AnalysisResult`].
///
/// Accepts the bare JSON object, optionally wrapped in a fenced code
/// block. Entry order is preserved exactly.
///
/// The overlay markup is not inspected here; see
/// [`crate::sanitize::sanitize_overlay`].
///
/// # Errors
///
/// Returns [`AnalysisError::Parse`] if:
/// - the text is not JSON, or `dimensions` / `annotatedImageSvg` is
///   missing or has the wrong type
/// - any label or estimate is blank
/// - there are more than [`MAX_DIMENSIONS`] entries
pub fn parse_response(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let body = strip_code_fence(text);
    let result: AnalysisResult =
        serde_json::from_str(body).map_err(|e| AnalysisError::Parse(e.to_string()))?;

    if result.dimensions.len() > MAX_DIMENSIONS {
        return Err(AnalysisError::Parse(format!(
            "too many dimensions: {} (limit {MAX_DIMENSIONS})",
            result.dimensions.len()
        )));
    }
    for (i, dim) in result.dimensions.iter().enumerate() {
        if dim.label.trim().is_empty() {
            return Err(AnalysisError::Parse(format!("dimension {i} has an empty label")));
        }
        if dim.estimate.trim().is_empty() {
            return Err(AnalysisError::Parse(format!(
                "dimension {i} ({}) has an empty estimate",
                dim.label
            )));
        }
    }
    Ok(result)
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    inner
        .split_once('\n')
        .map_or(inner, |(_, body)| body)
        .trim()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Dimension;

    #[test]
    fn parse_scenario_response() {
        let text = r#"{"dimensions":[{"label":"Ceiling Height","estimate":"~8 feet"}],"annotatedImageSvg":"<line x1=\"10\" y1=\"5\" x2=\"10\" y2=\"95\"/>"}"#;
        let result = parse_response(text).unwrap();
        assert_eq!(
            result.dimensions,
            vec![Dimension {
                label: "Ceiling Height".into(),
                estimate: "~8 feet".into(),
            }]
        );
        assert!(result.annotated_image_svg.starts_with("<line"));
    }

    #[test]
    fn parse_preserves_count_order_and_strings() {
        let labels = ["Width", "Depth", "Ceiling Height", "Door Height", "Window Width"];
        let entries: Vec<String> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| format!(r#"{{"label":"{l}","estimate":"~{i}.5 m"}}"#))
            .collect();
        let text = format!(
            r#"{{"dimensions":[{}],"annotatedImageSvg":""}}"#,
            entries.join(",")
        );

        let result = parse_response(&text).unwrap();
        assert_eq!(result.dimensions.len(), labels.len());
        for (i, (dim, label)) in result.dimensions.iter().zip(labels).enumerate() {
            assert_eq!(dim.label, label);
            assert_eq!(dim.estimate, format!("~{i}.5 m"));
        }
    }

    #[test]
    fn parse_accepts_empty_dimensions() {
        let result = parse_response(r#"{"dimensions":[],"annotatedImageSvg":"<svg/>"}"#).unwrap();
        assert!(result.dimensions.is_empty());
    }

    #[test]
    fn parse_non_json_text() {
        let result = parse_response("I'm sorry, I can't analyze this image.");
        assert!(matches!(result, Err(AnalysisError::Parse(_))));
    }

    #[test]
    fn parse_missing_svg_field() {
        let result = parse_response(r#"{"dimensions":[]}"#);
        assert!(
            matches!(result, Err(AnalysisError::Parse(ref m)) if m.contains("annotatedImageSvg")),
            "got {result:?}"
        );
    }

    #[test]
    fn parse_missing_dimensions_field() {
        let result = parse_response(r#"{"annotatedImageSvg":"<svg/>"}"#);
        assert!(
            matches!(result, Err(AnalysisError::Parse(ref m)) if m.contains("dimensions")),
            "got {result:?}"
        );
    }

    #[test]
    fn parse_wrong_field_types() {
        for text in [
            r#"{"dimensions":"8 feet","annotatedImageSvg":""}"#,
            r#"{"dimensions":[],"annotatedImageSvg":42}"#,
            r#"{"dimensions":[{"label":"Width"}],"annotatedImageSvg":""}"#,
            r#"[]"#,
        ] {
            assert!(
                matches!(parse_response(text), Err(AnalysisError::Parse(_))),
                "expected Parse error for {text}"
            );
        }
    }

    #[test]
    fn parse_blank_label_or_estimate() {
        let blank_label = r#"{"dimensions":[{"label":"  ","estimate":"~3 m"}],"annotatedImageSvg":""}"#;
        let blank_estimate = r#"{"dimensions":[{"label":"Width","estimate":""}],"annotatedImageSvg":""}"#;
        assert!(matches!(parse_response(blank_label), Err(AnalysisError::Parse(_))));
        assert!(matches!(parse_response(blank_estimate), Err(AnalysisError::Parse(_))));
    }

    #[test]
    fn parse_too_many_dimensions() {
        let entry = r#"{"label":"Tile","estimate":"~30 cm"}"#;
        let entries = vec![entry; MAX_DIMENSIONS + 1].join(",");
        let text = format!(r#"{{"dimensions":[{entries}],"annotatedImageSvg":""}}"#);
        assert!(matches!(parse_response(&text), Err(AnalysisError::Parse(_))));

        let entries = vec![entry; MAX_DIMENSIONS].join(",");
        let text = format!(r#"{{"dimensions":[{entries}],"annotatedImageSvg":""}}"#);
        assert_eq!(parse_response(&text).unwrap().dimensions.len(), MAX_DIMENSIONS);
    }

    #[test]
    fn parse_ignores_unknown_fields() {
        let text = r#"{"dimensions":[],"annotatedImageSvg":"","confidence":"low"}"#;
        assert!(parse_response(text).is_ok());
    }

    #[test]
    fn parse_fenced_json() {
        let text = "```json\n{\"dimensions\":[],\"annotatedImageSvg\":\"<svg/>\"}\n```";
        let result = parse_response(text).unwrap();
        assert_eq!(result.annotated_image_svg, "<svg/>");
    }

    #[test]
    fn strip_code_fence_leaves_unfenced_text() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```unterminated"), "```unterminated");
    }
}
