use std::sync::OnceLock;

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

pub mod cluster;
pub mod color_table;
pub mod error;
pub mod format;
pub mod grid;
pub mod namer;
pub mod notify;
pub mod pipeline;

pub use cluster::{ClusterOptions, ColorCluster, dominant_color, extract_clusters};
pub use color_table::{ColorTable, PaletteEntry};
pub use error::{ProfileError, Result};
pub use format::enumerate_names;
pub use grid::PixelGrid;
pub use namer::{PaletteVote, VoteOrder, name_clusters, nearest_entry, vote_colors};
pub use notify::{LogNotifier, Notifier};
pub use pipeline::{
    ColorProfile, ColorResponse, DEFAULT_K, ProfileOptions, RankedColor, Strategy,
    dominant_color_name, parse_k, profile_colors,
};

/// Decode `input` and profile its colors.
///
/// `k` is taken as the raw request value; it is validated before the image
/// is decoded, so a bad count never costs a decode.
pub fn profile_bytes(
    input: &[u8],
    k: Option<&str>,
    strategy: Strategy,
    table: &ColorTable,
    options: &ProfileOptions,
) -> Result<ColorProfile> {
    let k = parse_k(k)?;
    let grid = PixelGrid::decode(input, options.downscale)?;
    profile_colors(&grid, k, strategy, table, options)
}

/// Built-in table for the wasm entry point, parsed on first use.
fn builtin_table() -> Result<&'static ColorTable> {
    static TABLE: OnceLock<ColorTable> = OnceLock::new();
    if let Some(table) = TABLE.get() {
        return Ok(table);
    }
    let table = ColorTable::builtin()?;
    Ok(TABLE.get_or_init(|| table))
}

/// Name the dominant colors of an encoded image.
///
/// Returns `{ colors: "Red, Green, and Blue", rgb: [[r, g, b], ...] }`; `rgb`
/// is only present for the `"centroid"` strategy (the default).
#[wasm_bindgen]
pub fn detect_color(
    input: Vec<u8>,
    k: Option<String>,
    strategy: Option<String>,
    seed: Option<u64>,
) -> std::result::Result<Object, JsValue> {
    let to_js = |e: ProfileError| JsValue::from_str(&e.to_string());

    let strategy = match strategy {
        Some(s) => s.parse::<Strategy>().map_err(to_js)?,
        None => Strategy::default(),
    };
    let options = ProfileOptions {
        seed,
        ..ProfileOptions::default()
    };
    let table = builtin_table().map_err(to_js)?;
    let profile = profile_bytes(&input, k.as_deref(), strategy, table, &options).map_err(to_js)?;

    let result = Object::new();
    Reflect::set(
        &result,
        &JsValue::from_str("colors"),
        &JsValue::from_str(&profile.description),
    )?;
    if let Some(rgbs) = profile.rgbs() {
        let rgb_js = Array::new();
        for [r, g, b] in rgbs {
            let triple = Array::new();
            triple.push(&JsValue::from(r));
            triple.push(&JsValue::from(g));
            triple.push(&JsValue::from(b));
            rgb_js.push(&triple);
        }
        Reflect::set(&result, &JsValue::from_str("rgb"), &rgb_js)?;
    }

    Ok(result)
}
