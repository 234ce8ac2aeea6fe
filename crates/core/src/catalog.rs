//! Static model catalog.
//!
//! A [`ModelSpec`] describes one dispatchable generation model: which
//! platform runs it, what it costs, and how raw request params become
//! the provider-ready input. The catalog is built once at startup and
//! injected wherever models are resolved, so tests can substitute fake
//! specs without touching global state.
//!
//! Request params and provider inputs are untyped JSON: every provider
//! accepts a different shape, and the parsers are the single place
//! where per-model structure is enforced.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::cost;
use crate::types::{ModelId, Platform, TaskType};

/// Credit cost of a request, as a pure function of its params.
pub type CostFn = fn(&Value) -> f64;

/// Validate and transform raw request params into provider input.
pub type ParseFn = fn(&Value) -> Result<Value, ParseError>;

/// Optional policy hook: given the parsed input, name a different
/// model that should actually be billed and dispatched.
pub type UpgradeFn = fn(&Value) -> Option<ModelId>;

/// A model parser rejected the request params.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One entry in the static model catalog.
#[derive(Clone)]
pub struct ModelSpec {
    /// Provider-specific model identifier; may encode a version after `:`.
    pub name: &'static str,
    pub platform: Platform,
    pub task_type: TaskType,
    pub cost: CostFn,
    pub parse: ParseFn,
    pub upgrade_by_input: Option<UpgradeFn>,
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec")
            .field("name", &self.name)
            .field("platform", &self.platform)
            .field("task_type", &self.task_type)
            .finish()
    }
}

/// Immutable model-id → spec mapping, loaded once at process start.
pub struct ModelCatalog {
    models: HashMap<ModelId, ModelSpec>,
}

impl ModelCatalog {
    /// Build a catalog from explicit entries (used by tests).
    pub fn from_specs(specs: impl IntoIterator<Item = (ModelId, ModelSpec)>) -> Self {
        Self {
            models: specs.into_iter().collect(),
        }
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelSpec> {
        self.models.get(&id)
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.models.contains_key(&id)
    }

    /// The production model table.
    pub fn builtin() -> Self {
        Self::from_specs([
            (
                model_ids::HAILUO,
                ModelSpec {
                    name: "fal-ai/minimax/hailuo-02/standard/image-to-video",
                    platform: Platform::Fal,
                    task_type: TaskType::Video,
                    cost: |_| cost::HAILUO_COST,
                    parse: parse_hailuo,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::RAY,
                ModelSpec {
                    name: "fal-ai/luma-dream-machine/ray-2/image-to-video",
                    platform: Platform::Fal,
                    task_type: TaskType::Video,
                    cost: |_| cost::RAY_COST,
                    parse: parse_ray,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::RAY_FLASH,
                ModelSpec {
                    name: "luma/ray-flash-2-720p",
                    platform: Platform::Replicate,
                    task_type: TaskType::Video,
                    cost: |p| {
                        cost::by_duration_tier(p, cost::RAY_FLASH_5S_COST, cost::RAY_FLASH_9S_COST)
                    },
                    parse: parse_ray_flash,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::KLING,
                ModelSpec {
                    name: "kwaivgi/kling-v1.6-standard",
                    platform: Platform::Replicate,
                    task_type: TaskType::Video,
                    cost: |p| cost::by_duration_tier(p, cost::KLING_5S_COST, cost::KLING_10S_COST),
                    parse: parse_kling,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::VIDU,
                ModelSpec {
                    name: "vidu/q1-classic",
                    platform: Platform::Kie,
                    task_type: TaskType::Video,
                    cost: |_| cost::VIDU_COST,
                    parse: parse_vidu,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::SEEDANCE,
                ModelSpec {
                    name: "seedance-1-0-pro-250528",
                    platform: Platform::Ark,
                    task_type: TaskType::Video,
                    cost: |p| cost::per_second(p, cost::SEEDANCE_PER_SECOND),
                    parse: parse_seedance,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::SORA,
                ModelSpec {
                    name: "sora-2-image-to-video",
                    platform: Platform::Kie,
                    task_type: TaskType::Video,
                    cost: |p| cost::per_second(p, cost::SORA_PER_SECOND),
                    parse: parse_sora_image,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::SORA_PRO,
                ModelSpec {
                    name: "sora-2-pro-image-to-video",
                    platform: Platform::Kie,
                    task_type: TaskType::Video,
                    cost: |p| cost::per_second(p, cost::SORA_PRO_PER_SECOND),
                    parse: parse_sora_image,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::SORA_TEXT_TO_VIDEO,
                ModelSpec {
                    name: "sora-2-text-to-video",
                    platform: Platform::Kie,
                    task_type: TaskType::Video,
                    cost: |p| cost::per_second(p, cost::SORA_PER_SECOND),
                    parse: parse_sora_text,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::SORA_PRO_TEXT_TO_VIDEO,
                ModelSpec {
                    name: "sora-2-pro-text-to-video",
                    platform: Platform::Kie,
                    task_type: TaskType::Video,
                    cost: |p| cost::per_second(p, cost::SORA_PRO_PER_SECOND),
                    parse: parse_sora_text,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::SEEDREAM,
                ModelSpec {
                    name: "fal-ai/bytedance/seedream/v4.5/text-to-image",
                    platform: Platform::Fal,
                    task_type: TaskType::Image,
                    cost: |_| cost::SEEDREAM_PER_IMAGE,
                    parse: parse_seedream,
                    upgrade_by_input: Some(upgrade_seedream),
                },
            ),
            (
                model_ids::SEEDREAM_EDIT,
                ModelSpec {
                    name: "fal-ai/bytedance/seedream/v4.5/edit",
                    platform: Platform::Fal,
                    task_type: TaskType::Image,
                    cost: |_| cost::SEEDREAM_PER_IMAGE,
                    parse: parse_seedream,
                    upgrade_by_input: None,
                },
            ),
            (
                model_ids::NANO_BANANA,
                ModelSpec {
                    name: "nano-banana",
                    platform: Platform::Nano,
                    task_type: TaskType::Image,
                    cost: |_| cost::NANO_PER_IMAGE,
                    parse: parse_nano,
                    upgrade_by_input: None,
                },
            ),
        ])
    }
}

/// Well-known catalog keys. Values are stable across deployments; task
/// rows reference them, so renumbering is a data migration.
pub mod model_ids {
    use crate::types::ModelId;

    pub const HAILUO: ModelId = 1;
    pub const RAY: ModelId = 2;
    pub const RAY_FLASH: ModelId = 3;
    pub const KLING: ModelId = 5;
    pub const VIDU: ModelId = 11;
    pub const SEEDANCE: ModelId = 22;
    pub const SORA: ModelId = 35;
    pub const SORA_PRO: ModelId = 36;
    pub const SORA_TEXT_TO_VIDEO: ModelId = 37;
    pub const SORA_PRO_TEXT_TO_VIDEO: ModelId = 38;
    pub const SEEDREAM: ModelId = 44;
    pub const SEEDREAM_EDIT: ModelId = 45;
    pub const NANO_BANANA: ModelId = 48;
}

// ---------------------------------------------------------------------------
// Param readers
// ---------------------------------------------------------------------------

fn str_field<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params[key].as_str().filter(|s| !s.is_empty())
}

fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ParseError> {
    str_field(params, key).ok_or_else(|| ParseError::new(format!("{key} is required")))
}

/// Resolve the first (and optional last) frame for an image-to-video
/// request. Accepts either a single `image`, an `images` pair, or an
/// explicit `end_frame` alongside the first frame.
fn image_to_video_frames(params: &Value) -> Result<(String, Option<String>), ParseError> {
    let first = str_field(params, "image")
        .or_else(|| params["images"][0].as_str())
        .map(str::to_owned);

    if let Some(end) = str_field(params, "end_frame") {
        let first = first.ok_or_else(|| {
            ParseError::new("First frame image is required when end_frame is provided")
        })?;
        return Ok((first, Some(end.to_owned())));
    }

    if let Some(single) = str_field(params, "image") {
        return Ok((single.to_owned(), None));
    }

    let images = params["images"].as_array();
    match images {
        Some(pair) if pair.len() >= 2 => {
            let first = pair[0]
                .as_str()
                .ok_or_else(|| ParseError::new("images entries must be URLs"))?;
            let last = pair[1]
                .as_str()
                .ok_or_else(|| ParseError::new("images entries must be URLs"))?;
            Ok((first.to_owned(), Some(last.to_owned())))
        }
        Some(_) => Err(ParseError::new("Please provide 2 images")),
        None => first
            .map(|f| (f, None))
            .ok_or_else(|| ParseError::new("Image is required")),
    }
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

fn parse_hailuo(params: &Value) -> Result<Value, ParseError> {
    let prompt = require_str(params, "prompt")?;
    let (first, end) = image_to_video_frames(params)?;

    let mut input = json!({
        "prompt": prompt,
        "image_url": first,
    });
    if let Some(end) = end {
        input["end_image_url"] = Value::String(end);
    }
    Ok(input)
}

fn parse_ray(params: &Value) -> Result<Value, ParseError> {
    let (first, end) = image_to_video_frames(params)?;

    let mut input = json!({
        "prompt": params["prompt"].as_str().unwrap_or(""),
        "image_url": first,
        "aspect_ratio": params["aspect_ratio"].as_str().unwrap_or("16:9"),
    });
    if let Some(end) = end {
        input["end_image_url"] = Value::String(end);
    }
    Ok(input)
}

fn parse_ray_flash(params: &Value) -> Result<Value, ParseError> {
    let image = require_str(params, "image")?;
    Ok(json!({
        "prompt": params["prompt"].as_str().unwrap_or(""),
        "start_image_url": image,
        "duration": cost::duration_secs(params, cost::DEFAULT_VIDEO_SECS) as i64,
        "aspect_ratio": params["aspect_ratio"].as_str().unwrap_or("16:9"),
    }))
}

fn parse_kling(params: &Value) -> Result<Value, ParseError> {
    let image = require_str(params, "image")?;
    Ok(json!({
        "prompt": params["prompt"].as_str().unwrap_or(""),
        "start_image": image,
        "duration": cost::duration_secs(params, cost::DEFAULT_VIDEO_SECS) as i64,
    }))
}

fn parse_vidu(params: &Value) -> Result<Value, ParseError> {
    let prompt = require_str(params, "prompt")?;
    let mut input = json!({
        "prompt": prompt,
        "duration": cost::duration_secs(params, cost::DEFAULT_VIDEO_SECS) as i64,
        "resolution": params["resolution"].as_str().unwrap_or("720p"),
    });
    if let Some(image) = str_field(params, "image") {
        input["image_urls"] = json!([image]);
    }
    Ok(input)
}

fn parse_seedance(params: &Value) -> Result<Value, ParseError> {
    let prompt = require_str(params, "prompt")?;
    let image = require_str(params, "image")?;

    // Ark encodes generation options as CLI-style flags appended to the
    // text content.
    let mut text = prompt.to_owned();
    if let Some(rs) = str_field(params, "resolution") {
        text.push_str(&format!(" --rs {rs}"));
    }
    let duration = cost::duration_secs(params, cost::DEFAULT_VIDEO_SECS) as i64;
    text.push_str(&format!(" --dur {duration}"));

    Ok(json!([
        { "type": "text", "text": text },
        { "type": "image_url", "image_url": { "url": image } },
    ]))
}

fn parse_sora_text(params: &Value) -> Result<Value, ParseError> {
    let prompt = require_str(params, "prompt")?;
    Ok(json!({
        "prompt": prompt,
        "aspect_ratio": params["aspect_ratio"].as_str().unwrap_or("landscape"),
        "duration": cost::duration_secs(params, cost::DEFAULT_VIDEO_SECS) as i64,
    }))
}

fn parse_sora_image(params: &Value) -> Result<Value, ParseError> {
    let mut input = parse_sora_text(params)?;
    let image = str_field(params, "image")
        .or_else(|| params["images"][0].as_str())
        .ok_or_else(|| ParseError::new("Image is required"))?;
    input["image_urls"] = json!([image]);
    Ok(input)
}

fn parse_seedream(params: &Value) -> Result<Value, ParseError> {
    let prompt = require_str(params, "prompt")?;
    let mut input = json!({
        "prompt": prompt,
        "image_size": params["size"].clone(),
        "num_images": 1,
    });
    if let Some(images) = params["images"].as_array().filter(|a| !a.is_empty()) {
        input["image_urls"] = Value::Array(images.clone());
    }
    Ok(input)
}

/// Seedream requests carrying reference images are billed and run as
/// the edit variant.
fn upgrade_seedream(input: &Value) -> Option<ModelId> {
    match input["image_urls"].as_array() {
        Some(urls) if !urls.is_empty() => Some(model_ids::SEEDREAM_EDIT),
        _ => None,
    }
}

fn parse_nano(params: &Value) -> Result<Value, ParseError> {
    let prompt = require_str(params, "prompt")?;
    let mut input = json!({
        "prompt": prompt,
        "size": params["size"].clone(),
    });
    if let Some(init) = params["init_images"].as_array().filter(|a| !a.is_empty()) {
        input["init_images"] = Value::Array(init.clone());
    }
    Ok(input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
