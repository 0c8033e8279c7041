//! Analyze button and failure banner.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdInfo, LdRuler};

/// Props for the [`AnalyzeButton`] component.
#[derive(Props, Clone, PartialEq)]
pub struct AnalyzeButtonProps {
    /// Whether a request is in flight.
    busy: bool,
    /// Whether the button may be pressed.
    enabled: bool,
    /// Fired on click.
    on_analyze: EventHandler<()>,
}

/// The single "Analyze Dimensions" trigger.
///
/// Disabled while a request is in flight so a second click cannot start
/// another one.
#[component]
pub fn AnalyzeButton(props: AnalyzeButtonProps) -> Element {
    let disabled = props.busy || !props.enabled;

    rsx! {
        button {
            class: "btn btn-primary btn-wide",
            disabled: disabled,
            onclick: move |_| props.on_analyze.call(()),
            if props.busy {
                span { class: "spinner" }
                "Analyzing..."
            } else {
                Icon { width: 20, height: 20, fill: "none", icon: LdRuler }
                "2. Analyze Dimensions"
            }
        }
    }
}

/// Props for the [`ErrorBanner`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ErrorBannerProps {
    /// Human-readable failure message.
    message: String,
}

/// "Analysis Failed" with the stored message.
#[component]
pub fn ErrorBanner(props: ErrorBannerProps) -> Element {
    rsx! {
        div { class: "error-banner", role: "alert",
            Icon { width: 24, height: 24, fill: "none", icon: LdInfo }
            div {
                h3 { "Analysis Failed" }
                p { "{props.message}" }
            }
        }
    }
}
