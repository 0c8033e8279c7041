//! Overlay sanitizer: turns untrusted overlay markup into a [`SafeSvg`].
//!
//! The overlay comes from a third-party service and is embedded into
//! the page verbatim, so it is re-built from scratch here: the markup is
//! tokenized with the [`svg`] crate's parser and only an allow-listed
//! subset of elements and attributes is re-emitted through the `svg`
//! crate's document builder (which escapes text and attribute values).
//!
//! Anything not on the allow-list is dropped together with its subtree.
//! That covers `<script>`, `<foreignObject>`, `<image>`, `<a>`, `<use>`,
//! `<style>`, and animation elements, as well as event handler
//! attributes, `style`, `href`, and external `url(...)` references.
//!
//! The emitted root always uses the normalized 0-100 coordinate space
//! with `preserveAspectRatio="none"`, regardless of what the service
//! returned, so the overlay stretches exactly over the rendered image.

use std::collections::hash_map::DefaultHasher;
use std::fmt;

use svg::node::element::Element;
use svg::node::element::tag::Type;
use svg::node::{Attributes, Node, NodeDefaultHash, Text};
use svg::parser::Event;

use crate::types::AnalysisError;

/// `viewBox` of every sanitized overlay.
pub const NORMALIZED_VIEW_BOX: &str = "0 0 100 100";

/// Elements that survive sanitizing.
const ALLOWED_ELEMENTS: &[&str] = &[
    "g", "defs", "marker", "line", "polyline", "polygon", "path", "rect", "circle", "ellipse",
    "text", "tspan", "title", "desc",
];

/// Elements whose character data is kept.
const TEXT_ELEMENTS: &[&str] = &["text", "tspan", "title", "desc"];

/// Geometry and presentation attributes that survive sanitizing.
const ALLOWED_ATTRIBUTES: &[&str] = &[
    "id",
    "x",
    "y",
    "x1",
    "y1",
    "x2",
    "y2",
    "cx",
    "cy",
    "r",
    "rx",
    "ry",
    "dx",
    "dy",
    "width",
    "height",
    "points",
    "d",
    "transform",
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-opacity",
    "opacity",
    "vector-effect",
    "paint-order",
    "font-size",
    "font-family",
    "font-weight",
    "font-style",
    "text-anchor",
    "dominant-baseline",
    "alignment-baseline",
    "marker-start",
    "marker-mid",
    "marker-end",
    "markerWidth",
    "markerHeight",
    "markerUnits",
    "refX",
    "refY",
    "orient",
];

/// Attributes of the service's own root `<svg>` that are not carried
/// over, because the sanitized root fixes its own geometry.
const ROOT_GEOMETRY: &[&str] = &["id", "x", "y", "width", "height", "transform"];

/// Overlay markup that has passed [`sanitize_overlay`].
///
/// The only way to obtain one is through the sanitizer, so holding a
/// `SafeSvg` means the markup is safe to inject into the page.
#[derive(Debug, Clone)]
pub struct SafeSvg {
    element: Element,
    markup: String,
    dropped: usize,
}

impl SafeSvg {
    /// The sanitized markup, a single `<svg>` element.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.markup
    }

    /// The sanitized document tree, for embedding into another document.
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.element
    }

    /// Number of elements and attributes that were removed.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }
}

impl PartialEq for SafeSvg {
    fn eq(&self, other: &Self) -> bool {
        self.markup == other.markup
    }
}

impl fmt::Display for SafeSvg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.markup)
    }
}

/// A `<tspan>` (or other text element) nested inside text content.
///
/// The `svg` crate writes a line break before every child element,
/// which inside `<text>` would render as an extra space. Reporting the
/// element as bare keeps it on the same line as the surrounding text.
#[derive(Debug, Clone)]
struct InlineElement(Element);

impl fmt::Display for InlineElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Node for InlineElement {
    fn get_name(&self) -> &str {
        self.0.get_name()
    }

    fn get_attributes(&self) -> Option<&Attributes> {
        Some(self.0.get_attributes())
    }

    fn is_bare(&self) -> bool {
        true
    }
}

impl NodeDefaultHash for InlineElement {
    fn default_hash(&self, state: &mut DefaultHasher) {
        self.0.default_hash(state);
    }
}

/// One open element while walking the token stream.
enum Frame {
    /// An allow-listed element being rebuilt.
    Kept(String, Element),
    /// The service's root `<svg>`, merged into the normalized root.
    Root,
    /// An element dropped along with everything inside it.
    Dropped(String),
}

impl Frame {
    fn name(&self) -> &str {
        match self {
            Self::Kept(name, _) | Self::Dropped(name) => name,
            Self::Root => "svg",
        }
    }
}

/// Sanitize overlay markup returned by the inference service.
///
/// Accepts a complete `<svg>` document or a bare fragment
/// (`<line .../><text ...>...</text>`); fragments are wrapped in the
/// normalized root. Empty input yields an empty overlay.
///
/// # Errors
///
/// Returns [`AnalysisError::Parse`] if the markup is not well-formed
/// (tokenizer error, mismatched or unclosed tags).
pub fn sanitize_overlay(markup: &str) -> Result<SafeSvg, AnalysisError> {
    let mut root = normalized_root();
    let mut stack: Vec<Frame> = Vec::new();
    let mut dropped = 0usize;
    let mut root_merged = false;

    for event in svg::Parser::new(markup) {
        match event {
            Event::Error(e) => {
                return Err(AnalysisError::Parse(format!(
                    "malformed overlay markup: {e}"
                )));
            }
            Event::Tag(name, tag_type, attributes) => {
                let in_dropped = stack.iter().any(|f| matches!(f, Frame::Dropped(_)));
                let mut attrs: Vec<(String, String)> = attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), unescape(&v.to_string())))
                    .collect();
                attrs.sort();

                match tag_type {
                    Type::Start | Type::Empty => {
                        let frame = if in_dropped {
                            Frame::Dropped(name.to_owned())
                        } else if name == "svg" && stack.is_empty() && !root_merged {
                            root_merged = true;
                            dropped += merge_root_attributes(&mut root, &attrs);
                            Frame::Root
                        } else if ALLOWED_ELEMENTS.contains(&name) {
                            let (element, removed) = build_element(name, &attrs);
                            dropped += removed;
                            Frame::Kept(name.to_owned(), element)
                        } else {
                            tracing::debug!(element = name, "dropping disallowed overlay element");
                            dropped += 1;
                            Frame::Dropped(name.to_owned())
                        };
                        if matches!(tag_type, Type::Start) {
                            stack.push(frame);
                        } else {
                            close(frame, &mut stack, &mut root);
                        }
                    }
                    Type::End => {
                        let frame = stack.pop().ok_or_else(|| {
                            AnalysisError::Parse(format!(
                                "malformed overlay markup: unexpected </{name}>"
                            ))
                        })?;
                        if frame.name() != name {
                            return Err(AnalysisError::Parse(format!(
                                "malformed overlay markup: expected </{}>, found </{name}>",
                                frame.name()
                            )));
                        }
                        close(frame, &mut stack, &mut root);
                    }
                }
            }
            Event::Text(text) => {
                if let Some(Frame::Kept(name, element)) = stack.last_mut()
                    && TEXT_ELEMENTS.contains(&name.as_str())
                {
                    let raw = untrimmed(markup, text);
                    if !raw.trim().is_empty() {
                        element.append(Text::new(unescape(raw)));
                    }
                }
            }
            // Comments, declarations, and processing instructions carry
            // nothing worth rendering.
            _ => {}
        }
    }

    if let Some(frame) = stack.last() {
        return Err(AnalysisError::Parse(format!(
            "malformed overlay markup: unclosed <{}>",
            frame.name()
        )));
    }

    if dropped > 0 {
        tracing::info!(dropped, "removed unsafe content from overlay");
    }

    let markup = root.to_string();
    Ok(SafeSvg {
        element: root,
        markup,
        dropped,
    })
}

/// The root every sanitized overlay hangs off.
fn normalized_root() -> Element {
    let mut root = Element::new("svg");
    root.assign("xmlns", "http://www.w3.org/2000/svg");
    root.assign("viewBox", NORMALIZED_VIEW_BOX);
    root.assign("preserveAspectRatio", "none");
    root.assign("width", "100%");
    root.assign("height", "100%");
    root
}

/// Attach a finished element to its parent (or the root).
fn close(frame: Frame, stack: &mut [Frame], root: &mut Element) {
    if let Frame::Kept(_, element) = frame {
        match stack.last_mut() {
            Some(Frame::Kept(parent_name, parent))
                if TEXT_ELEMENTS.contains(&parent_name.as_str()) =>
            {
                parent.append(InlineElement(element));
            }
            Some(Frame::Kept(_, parent)) => parent.append(element),
            _ => root.append(element),
        }
    }
}

/// Widen a text token back over the whitespace the tokenizer trimmed.
///
/// `text` is a slice of `markup`; its neighbours are the `>` and `<` of
/// the surrounding tags, so all whitespace next to it belongs to it.
fn untrimmed<'a>(markup: &'a str, text: &'a str) -> &'a str {
    let start = (text.as_ptr() as usize).wrapping_sub(markup.as_ptr() as usize);
    let end = start.saturating_add(text.len());
    if markup.get(start..end) != Some(text) {
        return text;
    }
    let before = markup[..start].trim_end().len();
    let after = markup.len() - markup[end..].trim_start().len();
    &markup[before..after]
}

/// Copy inheritable presentation attributes from the service's root.
///
/// Returns the number of attributes removed.
fn merge_root_attributes(root: &mut Element, attrs: &[(String, String)]) -> usize {
    let mut removed = 0;
    for (name, value) in attrs {
        if name == "viewBox"
            || name == "preserveAspectRatio"
            || name.starts_with("xmlns")
            || name == "version"
        {
            // Replaced by the normalized root; not counted as unsafe.
            continue;
        }
        if ROOT_GEOMETRY.contains(&name.as_str()) || !is_allowed_attribute("svg", name, value) {
            removed += 1;
            continue;
        }
        root.assign(name.as_str(), value.as_str());
    }
    removed
}

/// Build an allow-listed element, keeping only safe attributes.
///
/// Returns the element and the number of attributes removed.
fn build_element(name: &str, attrs: &[(String, String)]) -> (Element, usize) {
    let mut element = Element::new(name);
    let mut removed = 0;
    for (attr, value) in attrs {
        if is_allowed_attribute(name, attr, value) {
            element.assign(attr.as_str(), value.as_str());
        } else {
            tracing::debug!(element = name, attribute = %attr, "dropping overlay attribute");
            removed += 1;
        }
    }
    (element, removed)
}

fn is_allowed_attribute(element: &str, name: &str, value: &str) -> bool {
    let name_ok =
        ALLOWED_ATTRIBUTES.contains(&name) || (name == "viewBox" && element == "marker");
    name_ok && is_safe_value(value)
}

/// Reject script URLs and any `url(...)` that is not a local fragment.
fn is_safe_value(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.contains("javascript:") || compact.contains("data:") {
        return false;
    }
    compact
        .match_indices("url(")
        .all(|(i, _)| compact[i + 4..].starts_with('#'))
}

/// Decode XML character and entity references.
///
/// Unknown entities are kept literally; the output is re-escaped when
/// the document is serialized.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = num.strip_prefix(['x', 'X']).map_or_else(
                        || num.parse::<u32>().ok(),
                        |hex| u32::from_str_radix(hex, 16).ok(),
                    )?;
                    char::from_u32(code)
                }),
            }?;
            Some((ch, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sanitize(markup: &str) -> SafeSvg {
        sanitize_overlay(markup).unwrap()
    }

    #[test]
    fn empty_markup_yields_empty_normalized_root() {
        let safe = sanitize("");
        assert!(safe.as_str().starts_with("<svg"));
        assert!(safe.as_str().contains(r#"viewBox="0 0 100 100""#));
        assert!(safe.as_str().contains(r#"preserveAspectRatio="none""#));
        assert!(!safe.as_str().contains("<line"));
        assert_eq!(safe.dropped(), 0);
    }

    #[test]
    fn fragment_is_wrapped_in_root() {
        let safe = sanitize(
            r#"<line x1="10" y1="50" x2="90" y2="50" stroke="yellow" stroke-width="0.5" stroke-dasharray="1,1" />"#,
        );
        let markup = safe.as_str();
        assert!(markup.starts_with("<svg"), "got {markup}");
        assert!(markup.contains("<line"));
        assert!(markup.contains(r#"stroke-dasharray="1,1""#));
        assert!(markup.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn service_root_view_box_is_normalized() {
        let safe = sanitize(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 640 480" width="640" height="480" fill="none"><rect x="1" y="1" width="5" height="5"/></svg>"#,
        );
        let markup = safe.as_str();
        assert!(markup.contains(r#"viewBox="0 0 100 100""#), "got {markup}");
        assert!(!markup.contains("640"), "service geometry leaked: {markup}");
        assert!(markup.contains(r#"fill="none""#));
        assert!(markup.contains("<rect"));
        assert_eq!(markup.matches("<svg").count(), 1);
    }

    #[test]
    fn text_content_is_kept_and_escaped() {
        let safe = sanitize(
            r#"<text x="50" y="48" fill="yellow" font-size="3" text-anchor="middle">~12 ft &amp; 3 in</text>"#,
        );
        let markup = safe.as_str();
        assert!(markup.contains("~12 ft &amp; 3 in"), "got {markup}");
        assert!(markup.contains(r#"text-anchor="middle""#));
    }

    #[test]
    fn spacing_in_mixed_text_content_is_kept() {
        let safe = sanitize(r#"<text x="1">a<tspan>b</tspan> c</text>"#);
        let markup = safe.as_str();
        assert!(
            markup.contains(r#"<text x="1">a<tspan>b</tspan> c</text>"#),
            "got {markup}"
        );
    }

    #[test]
    fn untrimmed_recovers_surrounding_whitespace() {
        let markup = "<text> 12 ft </text>";
        let token = &markup[7..12];
        assert_eq!(token, "12 ft");
        assert_eq!(untrimmed(markup, token), " 12 ft ");
        assert_eq!(untrimmed(markup, "elsewhere"), "elsewhere");
    }

    #[test]
    fn encoded_quotes_cannot_break_out_of_an_attribute() {
        let safe = sanitize(r#"<line stroke="a&quot; onload=&quot;alert(1)"/>"#);
        let markup = safe.as_str();
        assert!(
            markup.contains(r#"stroke="a&quot; onload=&quot;alert(1)""#),
            "got {markup}"
        );
        assert!(!markup.contains(r#"onload=""#), "attribute breakout: {markup}");
        assert_eq!(safe.dropped(), 0);
    }

    #[test]
    fn script_element_and_its_content_are_removed() {
        let safe = sanitize(
            r#"<svg viewBox="0 0 100 100"><script>alert(document.cookie)</script><line x1="0" y1="0" x2="1" y2="1"/></svg>"#,
        );
        let markup = safe.as_str();
        assert!(!markup.contains("script"), "got {markup}");
        assert!(!markup.contains("alert"), "got {markup}");
        assert!(markup.contains("<line"));
        assert_eq!(safe.dropped(), 1);
    }

    #[test]
    fn foreign_object_subtree_is_removed() {
        let safe = sanitize(
            r#"<foreignObject width="100" height="100"><div><text>inner</text></div></foreignObject><circle cx="5" cy="5" r="1"/>"#,
        );
        let markup = safe.as_str();
        assert!(!markup.contains("foreignObject"));
        assert!(!markup.contains("inner"), "nested allowed element leaked: {markup}");
        assert!(markup.contains("<circle"));
    }

    #[test]
    fn event_handlers_and_links_are_removed() {
        let safe = sanitize(
            r##"<rect x="0" y="0" width="10" height="10" onclick="steal()" onload="steal()" style="fill:red" href="#x" xlink:href="javascript:steal()"/>"##,
        );
        let markup = safe.as_str();
        for needle in ["onclick", "onload", "style", "href", "steal"] {
            assert!(!markup.contains(needle), "{needle} leaked: {markup}");
        }
        assert!(markup.contains("<rect"));
        assert_eq!(safe.dropped(), 5);
    }

    #[test]
    fn external_urls_are_removed_but_fragment_refs_are_kept() {
        let safe = sanitize(
            r##"<defs><marker id="arrow" viewBox="0 0 10 10" refX="5" refY="5" markerWidth="4" markerHeight="4" orient="auto"><path d="M0,0 L10,5 L0,10 z" fill="cyan"/></marker></defs><line x1="1" y1="1" x2="9" y2="9" marker-end="url(#arrow)" fill="url(https://evil.example/x.svg#p)"/>"##,
        );
        let markup = safe.as_str();
        assert!(markup.contains(r##"marker-end="url(#arrow)""##), "got {markup}");
        assert!(markup.contains(r#"viewBox="0 0 10 10""#), "marker viewBox removed: {markup}");
        assert!(!markup.contains("evil.example"), "got {markup}");
    }

    #[test]
    fn nested_svg_is_dropped() {
        let safe = sanitize(
            r#"<svg viewBox="0 0 100 100"><svg viewBox="0 0 1 1"><line x1="0" y1="0" x2="1" y2="1"/></svg></svg>"#,
        );
        assert_eq!(safe.as_str().matches("<svg").count(), 1);
        assert!(!safe.as_str().contains("<line"));
    }

    #[test]
    fn comments_and_declarations_are_ignored() {
        let safe = sanitize(
            r#"<?xml version="1.0"?><!-- generated --><svg><g stroke="cyan"><line x1="0" y1="0" x2="1" y2="1"/></g></svg>"#,
        );
        let markup = safe.as_str();
        assert!(!markup.contains("generated"));
        assert!(markup.contains("<g"));
        assert!(markup.contains(r#"stroke="cyan""#));
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let result = sanitize_overlay("<g><line></g></line>");
        assert!(matches!(result, Err(AnalysisError::Parse(_))), "got {result:?}");
    }

    #[test]
    fn unclosed_tag_is_malformed() {
        let result = sanitize_overlay("<g><line/>");
        assert!(
            matches!(result, Err(AnalysisError::Parse(ref m)) if m.contains("unclosed")),
            "got {result:?}"
        );
    }

    #[test]
    fn stray_end_tag_is_malformed() {
        let result = sanitize_overlay("</g>");
        assert!(matches!(result, Err(AnalysisError::Parse(_))), "got {result:?}");
    }

    #[test]
    fn safe_value_rules() {
        assert!(is_safe_value("yellow"));
        assert!(is_safe_value("url(#arrow)"));
        assert!(is_safe_value("url( #arrow )"));
        assert!(!is_safe_value("url(https://x)"));
        assert!(!is_safe_value("url(#a) url(data:image/png;base64,AA)"));
        assert!(!is_safe_value("JavaScript:alert(1)"));
        assert!(!is_safe_value("java script:alert(1)"));
    }

    #[test]
    fn unescape_decodes_references() {
        assert_eq!(unescape("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
        assert_eq!(unescape("&quot;&apos;"), "\"'");
        assert_eq!(unescape("&#39;&#x41;"), "'A");
        assert_eq!(unescape("&unknown; & alone"), "&unknown; & alone");
        assert_eq!(unescape("plain"), "plain");
    }
}
