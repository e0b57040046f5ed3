//! vizij-array-bake-wasm: wasm-bindgen surface for vizij-array-bake-core.
//!
//! JS hosts either hand over pre-sampled world matrices (`bake_sampled`) or
//! pass evaluator callbacks (`bake_with_evaluators`). Both return
//! `{ summary, tracks }` where `tracks` is the per-instance channel export.

use js_sys::{Float64Array, Function};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use vizij_array_bake_core::{
    export_baked_json, plan_bake, AffineTransform, BakeConfig, BakeError, BakeSummary,
    BakedTracks, BakingPipeline, FrameIndex, FrameRange, SampledEvaluator, SourceObject,
};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn bake_error(e: BakeError) -> JsError {
    JsError::new(&e.to_string())
}

/// Plain-object output (no JS `Map`s) so results can be JSON.stringify'd.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("output error: {e}")))
}

fn parse_config(config: JsValue) -> Result<BakeConfig, JsError> {
    if jsvalue_is_undefined_or_null(&config) {
        return Ok(BakeConfig::default());
    }
    swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))
}

#[derive(Debug, Deserialize)]
struct SampledRequest {
    #[serde(default)]
    config: BakeConfig,
    base: SampledEvaluator,
    offset: SampledEvaluator,
}

#[derive(Debug, Serialize)]
struct BakeResponse {
    summary: BakeSummary,
    tracks: serde_json::Value,
}

/// Rejects tables that would need edge holding to span the bake range.
fn run_bake(
    cfg: &BakeConfig,
    base: &SampledEvaluator,
    offset: &SampledEvaluator,
) -> Result<BakeResponse, BakeError> {
    let (count, range) = cfg.validate()?;
    base.require_coverage("base", range)?;
    offset.require_coverage("offset", range)?;

    let mut tracks = BakedTracks::new(cfg.rotation);
    let summary =
        BakingPipeline::new(cfg.options()).bake(range, base, offset, count, &mut tracks)?;
    Ok(BakeResponse {
        summary,
        tracks: export_baked_json(&tracks),
    })
}

/// Evaluator backed by a JS callback `(frame: number) => number[16] | number[4][4]`,
/// row-major with translation in the last column.
struct JsEvaluator {
    label: &'static str,
    f: Function,
}

impl JsEvaluator {
    fn sample(&self, frame: FrameIndex) -> Result<AffineTransform, JsError> {
        let val = self
            .f
            .call1(&JsValue::UNDEFINED, &JsValue::from(frame))
            .map_err(|e| {
                JsError::new(&format!(
                    "{} evaluator threw at frame {frame}: {e:?}",
                    self.label
                ))
            })?;
        matrix_from_js(val).ok_or_else(|| {
            JsError::new(&format!(
                "{} evaluator returned a non-matrix at frame {frame}",
                self.label
            ))
        })
    }

    /// Callbacks can throw, so the whole range is sampled before baking.
    fn record(&self, range: FrameRange) -> Result<SampledEvaluator, JsError> {
        let frames = range
            .frames()
            .map(|frame| self.sample(frame))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SampledEvaluator::new(range.start, frames))
    }
}

fn matrix_from_js(val: JsValue) -> Option<AffineTransform> {
    if let Some(typed) = val.dyn_ref::<Float64Array>() {
        return AffineTransform::from_row_slice(&typed.to_vec());
    }
    if let Ok(flat) = swb::from_value::<Vec<f64>>(val.clone()) {
        return AffineTransform::from_row_slice(&flat);
    }
    swb::from_value::<AffineTransform>(val).ok()
}

/// Bake a `{ config?, base: { start, frames }, offset: { start, frames } }`
/// request of pre-sampled row-major matrices.
#[wasm_bindgen]
pub fn bake_sampled(request: JsValue) -> Result<JsValue, JsError> {
    console_error_panic_hook::set_once();
    let req: SampledRequest =
        swb::from_value(request).map_err(|e| JsError::new(&format!("request error: {e}")))?;
    let response = run_bake(&req.config, &req.base, &req.offset).map_err(bake_error)?;
    to_js(&response)
}

/// String-in/string-out variant of [`bake_sampled`].
#[wasm_bindgen]
pub fn bake_sampled_json(request_json: &str) -> Result<String, JsValue> {
    let req: SampledRequest =
        serde_json::from_str(request_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let response = run_bake(&req.config, &req.base, &req.offset)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&response).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Bake by calling `base(frame)` and `offset(frame)` once per frame in order.
/// `config` may be undefined/null for defaults. Count and range are checked
/// before either callback runs.
#[wasm_bindgen]
pub fn bake_with_evaluators(
    config: JsValue,
    base: Function,
    offset: Function,
) -> Result<JsValue, JsError> {
    console_error_panic_hook::set_once();
    let cfg = parse_config(config)?;
    let (_, range) = cfg.validate().map_err(bake_error)?;

    let base = JsEvaluator {
        label: "base",
        f: base,
    }
    .record(range)?;
    let offset = JsEvaluator {
        label: "offset",
        f: offset,
    }
    .record(range)?;

    let response = run_bake(&cfg, &base, &offset).map_err(bake_error)?;
    to_js(&response)
}

/// Validate a source object description (or null when nothing is selected)
/// and return its `BakePlan`.
#[wasm_bindgen]
pub fn plan_bake_json(source: JsValue, start: i32, end: i32) -> Result<JsValue, JsError> {
    let source: Option<SourceObject> = if jsvalue_is_undefined_or_null(&source) {
        None
    } else {
        Some(swb::from_value(source).map_err(|e| JsError::new(&format!("source error: {e}")))?)
    };
    let plan = plan_bake(source.as_ref(), FrameRange { start, end }).map_err(bake_error)?;
    to_js(&plan)
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
