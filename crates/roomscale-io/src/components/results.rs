//! Result display: the annotated photo and the dimension list.

use std::rc::Rc;

use dioxus::prelude::*;
use roomscale_analysis::{Analysis, Dimension};

/// Compare optional shared analyses by identity.
///
/// Each completed analysis is a fresh `Rc`, so pointer equality is
/// enough to tell whether a component needs to re-render.
pub(crate) fn same_analysis(a: Option<&Rc<Analysis>>, b: Option<&Rc<Analysis>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Props for the [`AnnotatedImage`] component.
#[derive(Props, Clone)]
pub struct AnnotatedImageProps {
    /// `<img src>` for the photo.
    src: String,
    /// The analysis whose overlay is drawn over the photo.
    analysis: Rc<Analysis>,
}

impl PartialEq for AnnotatedImageProps {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && Rc::ptr_eq(&self.analysis, &other.analysis)
    }
}

/// The photo with its overlay stacked on top.
///
/// The wrapper shrinks to the rendered image, and the overlay fills the
/// wrapper, so the overlay's 0-100 space lands on the image's edges at
/// any size or aspect ratio.
#[component]
pub fn AnnotatedImage(props: AnnotatedImageProps) -> Element {
    let overlay = props.analysis.overlay.as_str();

    rsx! {
        div { class: "annotated",
            img {
                src: "{props.src}",
                alt: "Analyzed room",
                class: "annotated-photo",
            }
            // Sanitized markup only; see roomscale_analysis::sanitize.
            div {
                class: "annotated-overlay",
                dangerous_inner_html: "{overlay}",
            }
        }
    }
}

/// Props for the [`DimensionTable`] component.
#[derive(Props, Clone, PartialEq)]
pub struct DimensionTableProps {
    /// Estimates in display order.
    dimensions: Vec<Dimension>,
}

/// Ordered `label` / `estimate` rows.
#[component]
pub fn DimensionTable(props: DimensionTableProps) -> Element {
    rsx! {
        if props.dimensions.is_empty() {
            p { class: "muted", "No dimensions could be estimated from this photo." }
        } else {
            ul { class: "dimension-list",
                for (index, dimension) in props.dimensions.iter().enumerate() {
                    li { key: "{index}", class: "dimension-row",
                        span { class: "dimension-label", "{dimension.label}" }
                        span { class: "dimension-estimate", "{dimension.estimate}" }
                    }
                }
            }
        }
    }
}

/// Props for the [`ResultsPanel`] component.
#[derive(Props, Clone)]
pub struct ResultsPanelProps {
    /// Preview URL of the analysed photo.
    image_url: Option<String>,
    /// The completed analysis, if any.
    analysis: Option<Rc<Analysis>>,
    /// Extra controls shown under the results (e.g. export).
    children: Element,
}

impl PartialEq for ResultsPanelProps {
    fn eq(&self, other: &Self) -> bool {
        self.image_url == other.image_url
            && same_analysis(self.analysis.as_ref(), other.analysis.as_ref())
            && self.children == other.children
    }
}

/// Right-hand column: results when present, a placeholder otherwise.
#[component]
pub fn ResultsPanel(props: ResultsPanelProps) -> Element {
    let content = match (props.image_url, props.analysis) {
        (Some(src), Some(analysis)) => {
            let dimensions = analysis.dimensions.clone();
            rsx! {
                section { class: "results",
                    h2 { class: "section-title", "Annotated Image" }
                    AnnotatedImage { src: src, analysis: analysis }
                }
                section { class: "results",
                    h2 { class: "section-title", "Estimated Dimensions" }
                    DimensionTable { dimensions: dimensions }
                }
                {props.children}
            }
        }
        _ => rsx! {
            div { class: "placeholder",
                h3 { "Analysis Results" }
                p { "Upload an image and click \"Analyze\" to see the results here." }
            }
        },
    };

    rsx! {
        div { class: "panel", {content} }
    }
}
