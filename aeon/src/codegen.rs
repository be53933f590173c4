//! Instrument table generator.
//!
//! Turns the OCS instrument capability document (served at
//! `/api/instruments/` by an observation portal) into the body of the
//! `instrument_registry!` table in [`crate::ocs::registry`].

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ocs::instrument::ConfigurationType;

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("instrument document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("instrument document must be a JSON object keyed by instrument code")]
    NotAnObject,

    #[error("instrument '{code}' is malformed at {path}: {source}")]
    Instrument {
        code: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("instrument '{instrument}' declares unknown configuration type '{code}'")]
    UnknownConfigurationType { instrument: String, code: String },

    #[error("instrument '{instrument}' has optical element '{name}', which is not an identifier")]
    InvalidElementName { instrument: String, name: String },
}

#[derive(Debug, Deserialize)]
struct InstrumentDocument {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    class: String,
    modes: Modes,
    #[serde(default)]
    optical_elements: Map<String, Value>,
    #[serde(default)]
    configuration_types: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Modes {
    readout: ModeGroup,
    #[serde(default)]
    rotator: ModeGroup,
    #[serde(default)]
    acquisition: ModeGroup,
    #[serde(default)]
    guiding: ModeGroup,
}

#[derive(Debug, Default, Deserialize)]
struct ModeGroup {
    #[serde(default)]
    modes: Vec<Coded>,
}

#[derive(Debug, Deserialize)]
struct Coded {
    code: String,
}

/// One row of the generated table.
struct Entry {
    type_name: String,
    instrument_type: String,
    summary: String,
    configuration_types: Vec<ConfigurationType>,
    readout_modes: Vec<String>,
    rotator_modes: Vec<String>,
    optical_elements: Vec<(String, Vec<String>)>,
    acquisition_modes: Vec<String>,
    guiding_modes: Vec<String>,
}

/// Generate the `instrument_registry!` invocation for every instrument in
/// `json`, in document order.
pub fn generate_instrument_table(json: &str) -> Result<String, CodegenError> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Object(instruments) = document else {
        return Err(CodegenError::NotAnObject);
    };

    let entries = instruments
        .into_iter()
        .map(|(code, value)| build_entry(code, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(render(&entries))
}

fn build_entry(code: String, value: Value) -> Result<Entry, CodegenError> {
    let document: InstrumentDocument =
        serde_path_to_error::deserialize(value).map_err(|err| CodegenError::Instrument {
            code: code.clone(),
            path: err.path().to_string(),
            source: err.into_inner(),
        })?;

    let configuration_types = document
        .configuration_types
        .values()
        .map(|entry| {
            let ctype = entry.get("code").and_then(Value::as_str).unwrap_or_default();
            ConfigurationType::from_str(ctype).map_err(|_| CodegenError::UnknownConfigurationType {
                instrument: code.clone(),
                code: ctype.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let optical_elements = document
        .optical_elements
        .iter()
        .map(|(plural, values)| {
            let name = singular(plural);
            if !is_identifier(name) {
                return Err(CodegenError::InvalidElementName {
                    instrument: code.clone(),
                    name: plural.clone(),
                });
            }
            let values = values
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("code").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Ok((name.to_string(), values))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let codes = |group: ModeGroup| group.modes.into_iter().map(|m| m.code).collect::<Vec<_>>();
    let summary = [document.class.as_str(), document.kind.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Entry {
        type_name: type_name(&code),
        summary,
        configuration_types,
        readout_modes: codes(document.modes.readout),
        rotator_modes: codes(document.modes.rotator),
        optical_elements,
        acquisition_modes: codes(document.modes.acquisition),
        guiding_modes: codes(document.modes.guiding),
        instrument_type: code,
    })
}

/// Rust type name for an instrument code.
///
/// Words split on `-` and `_` are capitalised; a letter that follows a digit
/// stays upper case so `1M0` survives. Codes that start with a digit get an
/// `Lco` prefix.
pub fn type_name(code: &str) -> String {
    let mut name = String::new();
    for word in code.split(['-', '_']).filter(|w| !w.is_empty()) {
        let mut previous: Option<char> = None;
        for c in word.chars() {
            let upper = previous.map_or(true, |p| p.is_ascii_digit());
            if upper {
                name.push(c.to_ascii_uppercase());
            } else {
                name.push(c.to_ascii_lowercase());
            }
            previous = Some(c);
        }
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Lco");
    }
    name
}

fn singular(plural: &str) -> &str {
    plural.strip_suffix('s').unwrap_or(plural)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn render(entries: &[Entry]) -> String {
    let mut out = String::from("instrument_registry! {\n");
    for entry in entries {
        // Writing to a String cannot fail.
        let _ = render_entry(&mut out, entry);
    }
    out.push_str("}\n");
    out
}

fn render_entry(out: &mut String, entry: &Entry) -> std::fmt::Result {
    if !entry.summary.is_empty() {
        writeln!(out, "    /// {} {}", entry.instrument_type, entry.summary)?;
    }
    writeln!(out, "    {} {{", entry.type_name)?;
    writeln!(out, "        instrument_type: {:?},", entry.instrument_type)?;
    let ctypes: Vec<String> = entry.configuration_types.iter().map(|c| format!("{:?}", c)).collect();
    writeln!(out, "        configuration_types: [{}],", ctypes.join(", "))?;
    writeln!(out, "        readout_modes: {},", literal_list(&entry.readout_modes))?;
    writeln!(out, "        rotator_modes: {},", literal_list(&entry.rotator_modes))?;
    if entry.optical_elements.is_empty() {
        writeln!(out, "        optical_elements: {{}},")?;
    } else {
        writeln!(out, "        optical_elements: {{")?;
        for (name, values) in &entry.optical_elements {
            writeln!(out, "            {}: {},", name, literal_list(values))?;
        }
        writeln!(out, "        }},")?;
    }
    writeln!(out, "        acquisition_modes: {},", literal_list(&entry.acquisition_modes))?;
    writeln!(out, "        guiding_modes: {},", literal_list(&entry.guiding_modes))?;
    writeln!(out, "    }},")
}

fn literal_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sinistro_document() -> Value {
        json!({
            "1M0-SCICAM-SINISTRO": {
                "type": "IMAGE",
                "class": "1m0",
                "modes": {
                    "readout": {"modes": [{"code": "full_frame"}, {"code": "central_2k_2x2"}]},
                    "acquisition": {"modes": [{"code": "OFF"}]},
                    "guiding": {"modes": [{"code": "OFF"}, {"code": "ON"}]}
                },
                "optical_elements": {
                    "filters": [{"code": "B"}, {"code": "V"}]
                },
                "configuration_types": {
                    "EXPOSE": {"code": "EXPOSE", "name": "Exposure"},
                    "AUTO_FOCUS": {"code": "AUTO_FOCUS", "name": "Auto Focus"}
                }
            }
        })
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name("1M0-SCICAM-SINISTRO"), "Lco1M0ScicamSinistro");
        assert_eq!(type_name("0M4-SCICAM-QHY600"), "Lco0M4ScicamQhy600");
        assert_eq!(type_name("SOAR_GHTS_REDCAM_IMAGER"), "SoarGhtsRedcamImager");
        assert_eq!(type_name("BLANCO_NEWFIRM"), "BlancoNewfirm");
    }

    #[test]
    fn test_generates_table_entry() {
        let table = generate_instrument_table(&sinistro_document().to_string()).unwrap();
        assert!(table.starts_with("instrument_registry! {\n"));
        assert!(table.contains("    /// 1M0-SCICAM-SINISTRO 1m0 IMAGE\n"));
        assert!(table.contains("    Lco1M0ScicamSinistro {\n"));
        assert!(table.contains("        instrument_type: \"1M0-SCICAM-SINISTRO\",\n"));
        assert!(table.contains("        configuration_types: [Expose, AutoFocus],\n"));
        assert!(table.contains("        readout_modes: [\"full_frame\", \"central_2k_2x2\"],\n"));
        assert!(table.contains("        rotator_modes: [],\n"));
        assert!(table.contains("            filter: [\"B\", \"V\"],\n"));
        assert!(table.contains("        guiding_modes: [\"OFF\", \"ON\"],\n"));
        assert!(table.ends_with("    },\n}\n"));
    }

    #[test]
    fn test_preserves_document_order() {
        let mut document = sinistro_document();
        document["BLANCO_NEWFIRM"] = json!({
            "type": "IMAGE",
            "modes": {"readout": {"modes": [{"code": "fowler1"}]}},
            "configuration_types": {"EXPOSE": {"code": "EXPOSE"}}
        });
        let table = generate_instrument_table(&document.to_string()).unwrap();
        let sinistro = table.find("Lco1M0ScicamSinistro").unwrap();
        let newfirm = table.find("BlancoNewfirm").unwrap();
        assert!(sinistro < newfirm);
        assert!(table.contains("        optical_elements: {},\n"));
    }

    #[test]
    fn test_unknown_configuration_type_fails() {
        let mut document = sinistro_document();
        document["1M0-SCICAM-SINISTRO"]["configuration_types"]["WARP"] = json!({"code": "WARP"});
        let err = generate_instrument_table(&document.to_string()).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::UnknownConfigurationType { ref code, .. } if code == "WARP"
        ));
    }

    #[test]
    fn test_missing_readout_names_path() {
        let document = json!({"X": {"modes": {}}});
        match generate_instrument_table(&document.to_string()).unwrap_err() {
            CodegenError::Instrument { code, path, .. } => {
                assert_eq!(code, "X");
                assert_eq!(path, "modes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            generate_instrument_table("[1, 2]").unwrap_err(),
            CodegenError::NotAnObject
        ));
    }
}
