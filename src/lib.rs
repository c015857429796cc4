pub mod error;
pub mod kmz;
pub mod mission;
pub mod options;
pub mod reconcile;
pub mod waypoints;
pub mod xml_tree;

use wasm_bindgen::prelude::*;

use crate::options::ConvertOptions;

/// Convert GeoJSON waypoints into a DJI mission KMZ, returned as a JS
/// object `{ kmz: Uint8Array, report: {...} }`.
#[wasm_bindgen(js_name = convertMission)]
pub fn convert_mission(seed_kmz: &[u8], geojson: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let conversion = mission::convert(seed_kmz, geojson, &opts).map_err(JsValue::from)?;

    let result = js_sys::Object::new();
    js_sys::Reflect::set(
        &result,
        &JsValue::from_str("kmz"),
        &js_sys::Uint8Array::from(conversion.kmz.as_slice()).into(),
    )?;
    let report = serde_wasm_bindgen::to_value(&conversion.report)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::Reflect::set(&result, &JsValue::from_str("report"), &report)?;
    Ok(result.into())
}

/// Convert GeoJSON waypoints into a DJI mission KMZ, returned as the raw
/// archive bytes.
#[wasm_bindgen(js_name = convertMissionKmz)]
pub fn convert_mission_kmz(
    seed_kmz: &[u8],
    geojson: &str,
    options: JsValue,
) -> Result<Vec<u8>, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let conversion = mission::convert(seed_kmz, geojson, &opts).map_err(JsValue::from)?;
    Ok(conversion.kmz)
}

fn parse_options(options: JsValue) -> Result<ConvertOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(ConvertOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
