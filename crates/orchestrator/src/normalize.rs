//! Request normalization: policy model substitution, attempt counting,
//! and payload redaction.

use serde_json::Value;

use pictor_core::catalog::model_ids;
use pictor_core::types::ModelId;

/// Text-only models substituted with their image-conditioned sibling
/// when the request carries reference media.
const TEXT_TO_MEDIA_SIBLINGS: &[(ModelId, ModelId)] = &[
    (model_ids::SORA_TEXT_TO_VIDEO, model_ids::SORA),
    (model_ids::SORA_PRO_TEXT_TO_VIDEO, model_ids::SORA_PRO),
];

/// Stand-in stored in place of inline base64 media.
const MEDIA_PLACEHOLDER: &str = "image_placeholder";

/// Whether the request carries a reference image.
pub fn has_reference_media(params: &Value) -> bool {
    if params["image"].as_str().is_some_and(|s| !s.is_empty()) {
        return true;
    }
    params["images"].as_array().is_some_and(|a| !a.is_empty())
}

/// Resolve the model that should actually handle the request: the
/// requested one, unless reference media upgrades it to the configured
/// image-conditioned sibling.
pub fn resolve_target_model(requested: ModelId, params: &Value) -> ModelId {
    if !has_reference_media(params) {
        return requested;
    }
    TEXT_TO_MEDIA_SIBLINGS
        .iter()
        .find(|(text, _)| *text == requested)
        .map(|(_, media)| *media)
        .unwrap_or(requested)
}

/// Number of independent generation attempts this request expands to.
pub fn attempt_count(params: &Value) -> u32 {
    match params["num_images"].as_u64() {
        Some(n) if n >= 1 => n as u32,
        _ => 1,
    }
}

/// Copy of the request safe to persist: inline `data:` URIs in
/// `init_images` are replaced with a placeholder so base64 blobs never
/// land in the payload column.
pub fn redact_payload(params: &Value) -> Value {
    let mut payload = params.clone();
    if let Some(init) = payload
        .get_mut("init_images")
        .and_then(Value::as_array_mut)
    {
        for image in init.iter_mut() {
            if image.as_str().is_some_and(|s| s.starts_with("data:")) {
                *image = Value::String(MEDIA_PLACEHOLDER.to_owned());
            }
        }
    }
    payload
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
