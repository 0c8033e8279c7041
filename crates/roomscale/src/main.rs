use dioxus::prelude::*;
use roomscale_analysis::{Commit, ImageMime, Phase, SelectedImage, Session, analyze_ticket};
use roomscale_client::{ClientConfig, GeminiClient};
use roomscale_io::{
    AnalyzeButton, ErrorBanner, ExportButton, FileUpload, ObjectUrl, PhotoPreview, ResultsPanel,
};

fn main() {
    // Fails only if a logger is already installed.
    let _ = dioxus::logger::init(dioxus::logger::tracing::Level::INFO);
    dioxus::launch(app);
}

/// Client configuration baked in at build time.
///
/// A missing key is reported when the first analysis is attempted.
fn client_config() -> ClientConfig {
    let api_key = option_env!("GEMINI_API_KEY")
        .or(option_env!("API_KEY"))
        .map(str::to_owned);
    ClientConfig::default().with_api_key(api_key)
}

/// Root application component.
///
/// Holds the [`Session`] in a signal and wires the upload, analyze,
/// result, and export components to it.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let mut session = use_signal(Session::<ObjectUrl>::new);
    let mut upload_error = use_signal(|| Option::<String>::None);
    let config = use_hook(client_config);

    // --- File upload handler ---
    let on_upload = move |(bytes, name): (Vec<u8>, String)| {
        let mime = match ImageMime::detect(&name, &bytes) {
            Ok(mime) => mime,
            Err(e) => {
                upload_error.set(Some(e.to_string()));
                return;
            }
        };
        let preview = match ObjectUrl::from_bytes(&bytes, mime.as_str()) {
            Ok(preview) => preview,
            Err(e) => {
                upload_error.set(Some(format!("Failed to preview image: {e}")));
                return;
            }
        };
        upload_error.set(None);
        tracing::info!(name = %name, mime = %mime, bytes = bytes.len(), "image selected");
        // The replaced image's preview URL is revoked when it drops here.
        drop(
            session
                .write()
                .select_image(SelectedImage::new(bytes, name, mime, preview)),
        );
    };

    // --- Clear handler ---
    let on_clear = move |()| {
        upload_error.set(None);
        drop(session.write().clear());
    };

    // --- Analyze handler ---
    // One ticket per click; `begin_analysis` refuses while a request is
    // in flight, and `finish` drops outcomes for a cleared or replaced
    // image.
    let on_analyze = move |()| {
        let Some(ticket) = session.write().begin_analysis() else {
            return;
        };
        let config = config.clone();
        spawn(async move {
            let outcome = match GeminiClient::new(&config) {
                Ok(client) => analyze_ticket(&client, &ticket).await,
                Err(e) => Err(e),
            };
            if let Err(ref e) = outcome {
                tracing::warn!(kind = ?e.kind(), error = %e, "analysis failed");
            }
            if session.write().finish(&ticket, outcome) == Commit::Stale {
                tracing::debug!(generation = ticket.generation(), "analysis outcome was stale");
            }
        });
    };

    // --- Snapshot for rendering ---
    let state = session.read();
    let phase = state.phase();
    let busy = state.is_analyzing();
    let can_analyze = state.can_analyze();
    let error = state.error().map(str::to_owned);
    let analysis = state.analysis();
    let image = state.image().map(|image| {
        (
            image.preview().as_str().to_owned(),
            image.name().to_owned(),
            image.stem().to_owned(),
            image.shared_bytes(),
            image.mime(),
        )
    });
    drop(state);

    let preview_url = image.as_ref().map(|(url, ..)| url.clone());
    let export = match (&image, &analysis) {
        (Some((_, _, stem, bytes, mime)), Some(analysis)) if phase == Phase::Complete => {
            rsx! {
                ExportButton {
                    image: bytes.clone(),
                    mime: *mime,
                    analysis: analysis.clone(),
                    stem: stem.clone(),
                }
            }
        }
        _ => rsx! {},
    };

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: include_str!("../assets/main.css") }

        div { class: "app",
            header { class: "app-header",
                h1 { class: "app-title", "Room Dimension Estimator" }
                p { class: "app-subtitle",
                    "Upload a photo of a room, and let AI estimate its dimensions and provide an annotated visual guide."
                }
            }

            main { class: "columns",
                // Left column: upload and controls
                div { class: "column",
                    h2 { class: "section-title", "1. Upload Your Image" }

                    if let Some((ref src, ref name, ..)) = image {
                        PhotoPreview {
                            src: src.clone(),
                            name: name.clone(),
                            busy: busy,
                            on_clear: on_clear,
                        }
                        AnalyzeButton {
                            busy: busy,
                            enabled: can_analyze,
                            on_analyze: on_analyze,
                        }
                    } else {
                        FileUpload { on_upload: on_upload }
                    }

                    if let Some(ref err) = upload_error() {
                        p { class: "text-error", "{err}" }
                    }

                    if let Some(message) = error {
                        ErrorBanner { message: message }
                    }
                }

                // Right column: results
                ResultsPanel {
                    image_url: preview_url,
                    analysis: analysis,
                    {export}
                }
            }
        }
    }
}
