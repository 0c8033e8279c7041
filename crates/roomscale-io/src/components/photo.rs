//! Preview of the selected photo with a clear button.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdX;

/// Props for the [`PhotoPreview`] component.
#[derive(Props, Clone, PartialEq)]
pub struct PhotoPreviewProps {
    /// `<img src>` for the photo.
    src: String,
    /// File name shown under the image.
    name: String,
    /// Disables the clear button while a request is in flight.
    busy: bool,
    /// Fired when the user clears the selection.
    on_clear: EventHandler<()>,
}

#[component]
pub fn PhotoPreview(props: PhotoPreviewProps) -> Element {
    rsx! {
        div { class: "photo-preview",
            div { class: "photo-frame",
                img { src: "{props.src}", alt: "Room preview" }
            }
            p { class: "muted", "{props.name}" }
            button {
                class: "btn btn-secondary btn-wide",
                disabled: props.busy,
                onclick: move |_| props.on_clear.call(()),
                Icon { width: 18, height: 18, fill: "none", icon: LdX }
                "Clear Image"
            }
        }
    }
}
