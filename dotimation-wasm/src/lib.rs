//! Plan the intro for a real page
//!
//! The page measures its own DOM (caret, character slots, glyph ink, marker
//! box, viewport), ships the measurements here as JSON, and gets back the
//! full frame-by-frame plan to play against `requestAnimationFrame`.

use dotimation::clock::FixedStep;
use dotimation::{play, MotionConfig, RecordingStage, Script, StageLayout};
use wasm_bindgen::prelude::*;

/// Run the whole intro headless at 60 fps. `config_json` may be empty or a
/// partial override of the default tuning.
#[wasm_bindgen]
pub fn plan_intro(
    config_json: &str,
    stage_json: &str,
    script_json: &str,
) -> Result<String, String> {
    let config: MotionConfig = if config_json.trim().is_empty() {
        MotionConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(|e| format!("Unable to parse config: {e}"))?
    };
    let layout: StageLayout =
        serde_json::from_str(stage_json).map_err(|e| format!("Unable to parse stage: {e}"))?;
    let script: Script =
        serde_json::from_str(script_json).map_err(|e| format!("Unable to parse script: {e}"))?;

    let mut stage = RecordingStage::new(layout);
    let mut clock = FixedStep::fps(60.0);
    play(&config, script, &mut stage, &mut clock);

    serde_json::to_string(&stage.into_events())
        .map_err(|e| format!("Unable to serialize frames: {e}"))
}

#[cfg(test)]
mod tests {
    use super::plan_intro;

    const STAGE: &str = r#"{
        "font_px": 64.0,
        "viewport": { "width_px": 1280.0, "portrait": false },
        "caret": [410.0, 12.0],
        "char_slots": [
            {
                "start_x": 360.0,
                "end_x": 404.0,
                "bounds": { "left": 358.0, "top": 8.0, "width": 48.0, "height": 64.0 }
            }
        ],
        "ink": { "o": { "ascent": 30.0, "descent": 0.5 } },
        "marker": { "left": 420.0, "top": 48.0, "width": 17.0, "height": 17.0 },
        "dot_diameter": 17.0
    }"#;

    const SCRIPT: &str = r#"{ "char_index": 0, "target_char": "o" }"#;

    #[test]
    fn plans_a_full_run_from_json() {
        let frames = plan_intro("", STAGE, SCRIPT).unwrap();
        assert!(frames.contains("cursor_hidden"));
        assert!(frames.contains("marker_shown"));
        assert!(frames.contains("trailing"));
    }

    #[test]
    fn partial_config_overrides_apply() {
        let frames = plan_intro(r#"{ "hop": { "attempts": 0 } }"#, STAGE, SCRIPT).unwrap();
        assert!(frames.contains("cursor_hidden"));
    }

    #[test]
    fn bad_input_reports_instead_of_panicking() {
        assert!(plan_intro("{", STAGE, SCRIPT).is_err());
        assert!(plan_intro("", "not a stage", SCRIPT).is_err());
        assert!(plan_intro("", STAGE, "{}").is_err());
    }
}
