//! Annotated SVG download button.

use std::rc::Rc;
use std::sync::Arc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdDownload;
use roomscale_analysis::{Analysis, ImageMime};
use roomscale_export::SvgMetadata;

use crate::download;

/// Props for the [`ExportButton`] component.
#[derive(Props, Clone)]
pub struct ExportButtonProps {
    /// Original photo bytes.
    image: Arc<[u8]>,
    /// Format of `image`.
    mime: ImageMime,
    /// The analysis to export.
    analysis: Rc<Analysis>,
    /// File stem used for the title and the download name.
    stem: String,
}

impl PartialEq for ExportButtonProps {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
            && self.mime == other.mime
            && Rc::ptr_eq(&self.analysis, &other.analysis)
            && self.stem == other.stem
    }
}

/// Downloads the photo and overlay as one standalone SVG.
#[component]
pub fn ExportButton(props: ExportButtonProps) -> Element {
    let mut export_error = use_signal(|| Option::<String>::None);

    let on_click = move |_| {
        let metadata = SvgMetadata {
            title: Some(props.stem.as_str()),
            description: None,
        };
        let outcome =
            roomscale_export::to_annotated_svg(&props.image, props.mime, &props.analysis, &metadata)
                .map_err(|e| e.to_string())
                .and_then(|svg| download::save_svg(&svg, &props.stem).map_err(|e| e.to_string()));
        match outcome {
            Ok(()) => export_error.set(None),
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                export_error.set(Some(format!("Download failed: {e}")));
            }
        }
    };

    rsx! {
        div { class: "export",
            button { class: "btn btn-secondary", onclick: on_click,
                Icon { width: 18, height: 18, fill: "none", icon: LdDownload }
                "Download annotated SVG"
            }
            if let Some(ref err) = export_error() {
                p { class: "text-error", "{err}" }
            }
        }
    }
}
