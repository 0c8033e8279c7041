//! The fixed instruction text and output schema sent with every request.
//!
//! The schema uses the OpenAPI-subset dialect the Gemini API accepts for
//! `generationConfig.responseSchema` (upper-case `type` names).

use serde_json::{Value, json};

/// Instruction text sent ahead of the image.
pub const INSTRUCTION: &str = r#"You are an expert interior architect and spatial analyst. Your task is to analyze an image of a room and estimate its dimensions. You must use common objects within the photo (e.g., doors which are typically 6'8" high, windows, light switches, furniture, power outlets) as a scale reference.

You must provide your response in a single JSON object. The JSON object should have two properties: 'dimensions' and 'annotatedImageSvg'.

1. 'dimensions': An array of objects. Each object should represent a single estimated dimension and have the following properties:
   - 'label': A descriptive name for the dimension (e.g., "Ceiling Height", "Width of Wall with Window").
   - 'estimate': A string representing the estimated dimension, including units (e.g., "~8 feet", "~2.5 meters").

2. 'annotatedImageSvg': A string containing a complete SVG. This SVG will be overlaid on top of the original image.
   - The SVG's viewBox should be '0 0 100 100', using a percentage-based coordinate system that corresponds to the original image's dimensions (width and height).
   - The SVG should contain lines, arrows, and text elements to visually represent the estimated dimensions on the image.
   - Use dashed lines for measurements.
   - Use a contrasting color for lines and text (e.g., bright yellow or cyan) to be visible on various backgrounds.
   - The text should be clear and readable.
   - Example SVG line: <line x1="10" y1="50" x2="90" y2="50" stroke="yellow" stroke-width="0.5" stroke-dasharray="1,1" />
   - Example SVG text: <text x="50" y="48" fill="yellow" font-size="3" text-anchor="middle">~12 ft</text>

Analyze the provided image and return the JSON object as described. Do not include any other text, explanations, or markdown formatting outside of the JSON object."#;

/// MIME type the service is asked to respond with.
pub const RESPONSE_MIME_TYPE: &str = "application/json";

/// The schema the service's output is constrained to.
#[must_use]
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "dimensions": {
                "type": "ARRAY",
                "description": "An array of estimated dimensions.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": {
                            "type": "STRING",
                            "description": "Descriptive name for the dimension."
                        },
                        "estimate": {
                            "type": "STRING",
                            "description": "The estimated dimension with units."
                        }
                    },
                    "required": ["label", "estimate"]
                }
            },
            "annotatedImageSvg": {
                "type": "STRING",
                "description": "A string containing a complete SVG to be overlaid on the image. Must have a viewBox of '0 0 100 100'."
            }
        },
        "required": ["dimensions", "annotatedImageSvg"]
    })
}
