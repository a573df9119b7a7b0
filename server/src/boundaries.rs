//! Boundary serving pipeline: load a level's GeoJSON file, refresh its
//! content hash, filter by an optional parent code, and strip features down
//! to the properties the map client actually renders.
//!
//! Source boundary files are inconsistent in property naming across
//! providers and scales, so every lookup walks an ordered candidate list and
//! takes the first property present. New source formats are added by
//! extending the lists, not by branching.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::error;

use super::{error::ApiError, state::AppState};

/// Country-code candidates used when filtering by parent.
const COUNTRY_CODE_FIELDS: &[&str] = &["ISO_A2", "iso_a2", "ADM0_A3", "adm0_a3"];

/// Compound region codes of the form `"{country}-{region}"`.
const COMPOUND_CODE_FIELDS: &[&str] = &["iso_3166_2", "ISO_3166_2"];

/// State identifier candidates for level-2 filtering.
const STATE_ABBR_FIELDS: &[&str] = &["STUSPS", "STATE", "state", "POSTAL", "postal"];
const STATE_NAME_FIELDS: &[&str] = &["NAME_1", "name_1", "admin_1"];

/// Per-level `code`/`name` extraction, declared as data.
struct LevelFields {
    code: &'static [&'static str],
    name: &'static [&'static str],
    /// Compound codes like `"US-CA"` keep only the region part.
    strip_compound_prefix: bool,
}

const LEVEL_FIELDS: [LevelFields; 3] = [
    // Countries
    LevelFields {
        code: &["ISO_A2", "iso_a2"],
        name: &["NAME", "name", "NAME_EN", "ADMIN", "admin"],
        strip_compound_prefix: false,
    },
    // States/provinces
    LevelFields {
        code: &[
            "iso_3166_2", "ISO_3166_2", "postal", "POSTAL", "STUSPS", "code_hasc", "abbrev",
            "ABBREV",
        ],
        name: &["NAME", "name", "NAME_1", "name_1", "ADMIN", "admin"],
        strip_compound_prefix: true,
    },
    // Counties
    LevelFields {
        code: &["GEOID", "FIPS", "fips", "ADM2_CODE", "adm2_code", "CODE", "code"],
        name: &["NAME", "name", "NAME_2", "name_2", "ADMIN", "admin"],
        strip_compound_prefix: false,
    },
];

#[derive(Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub bbox: Option<Value>,
}

#[derive(Serialize)]
pub struct SimplifiedFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: SimplifiedProperties,
    geometry: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<Value>,
}

#[derive(Serialize)]
pub struct SimplifiedProperties {
    pub code: String,
    pub name: String,
    pub level: u8,
}

#[derive(Serialize)]
pub struct SimplifiedCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<SimplifiedFeature>,
}

#[derive(Serialize)]
pub struct BoundaryResponse {
    pub success: bool,
    pub data: SimplifiedCollection,
    pub version: String,
    pub metadata: Metadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub level: u8,
    pub parent_code: Option<String>,
    pub count: usize,
    pub source_file: String,
}

fn first_string<'a>(props: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|f| props.get(*f)?.as_str())
}

fn keep_feature(props: &Map<String, Value>, level: u8, parent_code: &str) -> bool {
    match level {
        1 => {
            let country_matches =
                first_string(props, COUNTRY_CODE_FIELDS) == Some(parent_code);

            let compound_matches = first_string(props, COMPOUND_CODE_FIELDS)
                .is_some_and(|code| code.starts_with(&format!("{parent_code}-")));

            country_matches || compound_matches
        }
        2 => {
            let Some((country, state)) = parent_code.split_once('-') else {
                return false;
            };

            let country_matches = first_string(props, COUNTRY_CODE_FIELDS) == Some(country);

            let state_from_compound = first_string(props, COMPOUND_CODE_FIELDS)
                .and_then(|code| code.split_once('-'))
                .map(|(_, suffix)| suffix);

            let state_matches = first_string(props, STATE_ABBR_FIELDS) == Some(state)
                || first_string(props, STATE_NAME_FIELDS) == Some(state)
                || state_from_compound == Some(state);

            country_matches && state_matches
        }
        // Countries have no parent to filter by.
        _ => true,
    }
}

fn simplify(feature: Feature, level: u8) -> SimplifiedFeature {
    let fields = &LEVEL_FIELDS[level as usize];

    let mut code = first_string(&feature.properties, fields.code);
    if fields.strip_compound_prefix {
        if let Some(suffix) = code.and_then(|c| c.split_once('-')).map(|(_, s)| s) {
            code = Some(suffix);
        }
    }

    let name = first_string(&feature.properties, fields.name);

    SimplifiedFeature {
        kind: "Feature",
        properties: SimplifiedProperties {
            code: code.unwrap_or("UNKNOWN").to_string(),
            name: name.unwrap_or("Unknown").to_string(),
            level,
        },
        geometry: feature.geometry,
        bbox: feature.bbox,
    }
}

pub fn filter_and_simplify(
    collection: FeatureCollection,
    level: u8,
    parent_code: Option<&str>,
) -> Vec<SimplifiedFeature> {
    collection
        .features
        .into_iter()
        .filter(|f| match parent_code {
            Some(parent) => keep_feature(&f.properties, level, parent),
            None => true,
        })
        .map(|f| simplify(f, level))
        .collect()
}

/// Full request pipeline: load, hash, filter, simplify.
pub async fn get_boundaries(
    state: &AppState,
    level: u8,
    parent_code: Option<&str>,
) -> Result<BoundaryResponse, ApiError> {
    if level > 2 {
        return Err(ApiError::InvalidLevel);
    }

    let dataset = state.registry.boundary_dataset();
    let download = dataset.level_download(level).ok_or(ApiError::InvalidLevel)?;
    let filename = dataset.stored_filename(download);
    let path = state.config.data_dir.join(&filename);

    let data = match fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::DataUnavailable(level));
        }
        Err(e) => {
            error!("Failed to read {}: {e}", path.display());
            return Err(ApiError::internal(
                "Failed to serve boundary data",
                state.error_detail(&e),
            ));
        }
    };

    let collection: FeatureCollection = serde_json::from_slice(&data).map_err(|e| {
        error!("Failed to parse {filename}: {e}");
        ApiError::internal("Failed to serve boundary data", state.error_detail(&e))
    })?;

    let version = state.cache.lock().unwrap().update_file_hash(&filename, &data);

    let features = filter_and_simplify(collection, level, parent_code);

    Ok(BoundaryResponse {
        success: true,
        metadata: Metadata {
            level,
            parent_code: parent_code.map(str::to_string),
            count: features.len(),
            source_file: filename,
        },
        data: SimplifiedCollection {
            kind: "FeatureCollection",
            features,
        },
        version,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn collection(features: Vec<Value>) -> FeatureCollection {
        serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": features,
        }))
        .unwrap()
    }

    fn feature(props: Value) -> Value {
        json!({
            "type": "Feature",
            "properties": props,
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
        })
    }

    #[test]
    fn no_parent_passes_everything_through() {
        let input = collection(vec![
            feature(json!({ "ISO_A2": "US", "NAME": "United States" })),
            feature(json!({ "ISO_A2": "CA", "NAME": "Canada" })),
        ]);

        let out = filter_and_simplify(input, 0, None);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].properties.code, "US");
        assert_eq!(out[0].properties.name, "United States");
        assert_eq!(out[0].properties.level, 0);
    }

    #[test]
    fn level_1_filters_by_country() {
        let input = collection(vec![
            feature(json!({ "ISO_A2": "US", "NAME": "California" })),
            feature(json!({ "ISO_A2": "CA", "NAME": "Ontario" })),
        ]);

        let out = filter_and_simplify(input, 1, Some("US"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].properties.name, "California");
    }

    #[test]
    fn level_1_matches_compound_code_prefix() {
        // No plain country property, only the compound ISO code.
        let input = collection(vec![
            feature(json!({ "iso_3166_2": "US-CA", "name": "California" })),
            feature(json!({ "iso_3166_2": "CA-ON", "name": "Ontario" })),
        ]);

        let out = filter_and_simplify(input, 1, Some("US"));
        assert_eq!(out.len(), 1);
        // Compound code is stripped to the region part.
        assert_eq!(out[0].properties.code, "CA");
        assert_eq!(out[0].properties.name, "California");
    }

    #[test]
    fn level_1_prefix_match_is_exact_on_country() {
        // "C" must not match "CA-ON".
        let input = collection(vec![feature(
            json!({ "iso_3166_2": "CA-ON", "name": "Ontario" }),
        )]);

        assert!(filter_and_simplify(input, 1, Some("C")).is_empty());
    }

    #[test]
    fn level_2_requires_country_and_state() {
        let input = collection(vec![
            feature(json!({ "ISO_A2": "US", "STUSPS": "CA", "NAME": "Alameda" })),
            feature(json!({ "ISO_A2": "US", "STUSPS": "TX", "NAME": "Travis" })),
            feature(json!({ "ISO_A2": "CA", "STUSPS": "CA", "NAME": "Not a county" })),
        ]);

        let out = filter_and_simplify(input, 2, Some("US-CA"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].properties.name, "Alameda");
    }

    #[test]
    fn level_2_accepts_state_from_compound_code() {
        let input = collection(vec![feature(
            json!({ "iso_a2": "US", "iso_3166_2": "US-CA", "name": "Alameda", "GEOID": "06001" }),
        )]);

        let out = filter_and_simplify(input, 2, Some("US-CA"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].properties.code, "06001");
    }

    #[test]
    fn level_2_parent_without_dash_matches_nothing() {
        let input = collection(vec![feature(
            json!({ "ISO_A2": "US", "STUSPS": "CA", "NAME": "Alameda" }),
        )]);

        assert!(filter_and_simplify(input, 2, Some("US")).is_empty());
    }

    #[test]
    fn missing_properties_fall_back_to_unknown() {
        let input = collection(vec![feature(json!({}))]);

        let out = filter_and_simplify(input, 0, None);
        assert_eq!(out[0].properties.code, "UNKNOWN");
        assert_eq!(out[0].properties.name, "Unknown");
    }

    #[test]
    fn bbox_survives_simplification() {
        let input = collection(vec![json!({
            "type": "Feature",
            "properties": { "ISO_A2": "US", "NAME": "United States" },
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
            "bbox": [-125.0, 24.0, -66.0, 49.0],
        })]);

        let out = filter_and_simplify(input, 0, None);
        assert!(out[0].bbox.is_some());
    }

    #[test]
    fn extra_source_properties_are_dropped() {
        let input = collection(vec![feature(
            json!({ "ISO_A2": "US", "NAME": "United States", "POP_EST": 331000000_u64, "GDP_MD": 21433226_u64 }),
        )]);

        let out = filter_and_simplify(input, 0, None);
        let serialized = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(
            serialized["properties"],
            json!({ "code": "US", "name": "United States", "level": 0 })
        );
    }
}
