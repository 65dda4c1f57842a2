use serde_json::{json, Value};

/// System message sent with every extraction request.
pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You assist in extracting recipe data from web pages and output in json format.";

/// Instruction placed in front of the visible page text.
pub const EXTRACTION_INSTRUCTION: &str = "Extract the recipe details from the provided text, including name/title, description, instructions, ingredients, original_url, featuredImage, and category. Category is either breakfast, dinner or baking. Ensure all steps and ingredients are fully covered.";

/// Name under which the response schema is registered with the API.
pub const RECIPE_SCHEMA_NAME: &str = "recipe_response";

/// Build the user message for one page.
pub fn build_extraction_prompt(page_text: &str) -> String {
    format!("{} {}", EXTRACTION_INSTRUCTION, page_text)
}

/// Prompt used to generate a stand-in photo when a page has no usable image.
pub fn image_prompt(title: &str) -> String {
    format!(
        "High quality food photography of {}, plated, natural lighting",
        title
    )
}

/// Strict JSON schema the extraction response must follow.
///
/// Strict mode requires every property to be listed as required and no
/// additional properties.
pub fn recipe_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "description": { "type": "string" },
            "instructions": { "type": "array", "items": { "type": "string" } },
            "ingredients": { "type": "array", "items": { "type": "string" } },
            "url": { "type": "string" },
            "image": { "type": "string" },
            "category": {
                "type": "string",
                "enum": ["breakfast", "dinner", "baking", "other"]
            },
            "prepTime": { "type": "integer" },
            "cookTime": { "type": "integer" },
            "totalTime": { "type": "integer" },
            "servings": { "type": "integer" }
        },
        "required": [
            "title", "description", "instructions", "ingredients", "url", "image",
            "category", "prepTime", "cookTime", "totalTime", "servings"
        ],
        "additionalProperties": false
    })
}
