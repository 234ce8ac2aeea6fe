//! Credit cost constants and calculators for the model catalog.
//!
//! Costs are fixed at submission time and denormalised onto the task
//! row, so later pricing changes never retroactively reprice in-flight
//! work. All calculators are pure functions of the raw request params.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Per-model credit prices
// ---------------------------------------------------------------------------

/// Hailuo image-to-video, flat per clip.
pub const HAILUO_COST: f64 = 45.0;
/// Luma Ray 2 image-to-video, flat per clip.
pub const RAY_COST: f64 = 60.0;
/// Luma Ray Flash 2, 5-second tier.
pub const RAY_FLASH_5S_COST: f64 = 25.0;
/// Luma Ray Flash 2, 9-second tier.
pub const RAY_FLASH_9S_COST: f64 = 45.0;
/// Kling, 5-second tier.
pub const KLING_5S_COST: f64 = 35.0;
/// Kling, 10-second tier.
pub const KLING_10S_COST: f64 = 70.0;
/// Vidu, flat per clip.
pub const VIDU_COST: f64 = 200.0;
/// Seedance, per second of output video.
pub const SEEDANCE_PER_SECOND: f64 = 12.0;
/// Sora, per second of output video.
pub const SORA_PER_SECOND: f64 = 10.0;
/// Sora Pro, per second of output video.
pub const SORA_PRO_PER_SECOND: f64 = 30.0;
/// Seedream, per generated image.
pub const SEEDREAM_PER_IMAGE: f64 = 10.0;
/// Nano (in-process image model), per generated image.
pub const NANO_PER_IMAGE: f64 = 5.0;

/// Default clip length assumed when the request omits `duration`.
pub const DEFAULT_VIDEO_SECS: f64 = 5.0;

// ---------------------------------------------------------------------------
// Param readers
// ---------------------------------------------------------------------------

/// Read `duration` from request params.
///
/// Accepts either a JSON number or a numeric string (both appear in the
/// wild). Falls back to `default` when absent or unparseable.
pub fn duration_secs(params: &Value, default: f64) -> f64 {
    match &params["duration"] {
        Value::Number(n) => n.as_f64().unwrap_or(default),
        Value::String(s) => s.parse().unwrap_or(default),
        _ => default,
    }
}

// ---------------------------------------------------------------------------
// Calculators
// ---------------------------------------------------------------------------

/// Two-tier pricing: `five` credits for a 5-second clip, `long` for
/// anything else.
pub fn by_duration_tier(params: &Value, five: f64, long: f64) -> f64 {
    if duration_secs(params, DEFAULT_VIDEO_SECS) == 5.0 {
        five
    } else {
        long
    }
}

/// Linear pricing: `unit` credits per second of requested duration.
pub fn per_second(params: &Value, unit: f64) -> f64 {
    unit * duration_secs(params, DEFAULT_VIDEO_SECS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- duration_secs --------------------------------------------------------

    #[test]
    fn duration_from_number() {
        assert_eq!(duration_secs(&json!({"duration": 8}), 5.0), 8.0);
    }

    #[test]
    fn duration_from_numeric_string() {
        assert_eq!(duration_secs(&json!({"duration": "10"}), 5.0), 10.0);
    }

    #[test]
    fn duration_defaults_when_absent() {
        assert_eq!(duration_secs(&json!({}), 5.0), 5.0);
    }

    #[test]
    fn duration_defaults_on_garbage() {
        assert_eq!(duration_secs(&json!({"duration": "soon"}), 5.0), 5.0);
    }

    // -- by_duration_tier -----------------------------------------------------

    #[test]
    fn tier_five_seconds() {
        assert_eq!(by_duration_tier(&json!({"duration": "5"}), 25.0, 45.0), 25.0);
    }

    #[test]
    fn tier_long_clip() {
        assert_eq!(by_duration_tier(&json!({"duration": "9"}), 25.0, 45.0), 45.0);
    }

    #[test]
    fn tier_defaults_to_five() {
        assert_eq!(by_duration_tier(&json!({}), 25.0, 45.0), 25.0);
    }

    // -- per_second -----------------------------------------------------------

    #[test]
    fn per_second_scales_with_duration() {
        assert_eq!(per_second(&json!({"duration": 10}), 10.0), 100.0);
    }

    #[test]
    fn per_second_uses_default_duration() {
        assert_eq!(per_second(&json!({}), 10.0), 50.0);
    }
}
