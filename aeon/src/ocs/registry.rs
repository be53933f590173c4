//! Instrument table and the [`Configuration`] union.
//!
//! The table body below is produced by `aeon-codegen` from the OCS
//! `/api/instruments/` document. Each entry expands to a marker type
//! implementing [`Instrument`] and a variant of [`Configuration`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, ValidationError};
use crate::models::target::Target;
use crate::ocs::constraints::Constraints;
use crate::ocs::instrument::{
    ConfigurationType, Instrument, InstrumentConfiguration, InstrumentSpec, OpticalElementSpec,
};

macro_rules! instrument_registry {
    ($(
        $(#[$meta:meta])*
        $name:ident {
            instrument_type: $code:literal,
            configuration_types: [$($ctype:ident),* $(,)?],
            readout_modes: [$($readout:literal),* $(,)?],
            rotator_modes: [$($rotator:literal),* $(,)?],
            optical_elements: { $($element:ident: [$($value:literal),* $(,)?]),* $(,)? },
            acquisition_modes: [$($acquisition:literal),* $(,)?],
            guiding_modes: [$($guiding:literal),* $(,)?] $(,)?
        }
    ),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct $name;

            impl Instrument for $name {
                const SPEC: &'static InstrumentSpec = &InstrumentSpec {
                    instrument_type: $code,
                    type_name: stringify!($name),
                    configuration_types: &[$(ConfigurationType::$ctype),*],
                    readout_modes: &[$($readout),*],
                    rotator_modes: &[$($rotator),*],
                    optical_elements: &[$(OpticalElementSpec {
                        name: stringify!($element),
                        values: &[$($value),*],
                    }),*],
                    acquisition_modes: &[$($acquisition),*],
                    guiding_modes: &[$($guiding),*],
                };
            }

            impl From<InstrumentConfiguration<$name>> for Configuration {
                fn from(configuration: InstrumentConfiguration<$name>) -> Self {
                    Configuration::$name(configuration)
                }
            }
        )+

        /// Every instrument known to this crate, in table order.
        pub const INSTRUMENTS: &[&InstrumentSpec] = &[$($name::SPEC),+];

        /// A configuration for any instrument in the table, discriminated by
        /// `instrument_type` on the wire.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Configuration {
            $($name(InstrumentConfiguration<$name>)),+
        }

        impl Configuration {
            pub fn spec(&self) -> &'static InstrumentSpec {
                match self {
                    $(Configuration::$name(_) => $name::SPEC),+
                }
            }

            pub fn kind(&self) -> ConfigurationType {
                match self {
                    $(Configuration::$name(c) => c.kind()),+
                }
            }

            pub fn target(&self) -> &Target {
                match self {
                    $(Configuration::$name(c) => c.target()),+
                }
            }

            pub fn target_mut(&mut self) -> &mut Target {
                match self {
                    $(Configuration::$name(c) => c.target_mut()),+
                }
            }

            pub fn constraints(&self) -> &Constraints {
                match self {
                    $(Configuration::$name(c) => c.constraints()),+
                }
            }

            pub fn constraints_mut(&mut self) -> &mut Constraints {
                match self {
                    $(Configuration::$name(c) => c.constraints_mut()),+
                }
            }

            fn from_value(value: Value) -> Result<Self, String> {
                let instrument_type = match value.get("instrument_type") {
                    Some(Value::String(s)) => s.clone(),
                    Some(_) => return Err("instrument_type must be a string".to_string()),
                    None => return Err(ValidationError::missing("instrument_type").to_string()),
                };
                match instrument_type.as_str() {
                    $($code => crate::payload::from_value_with_path::<InstrumentConfiguration<$name>>(value)
                        .map(Configuration::$name),)+
                    _ => Err(ValidationError::at(
                        "instrument_type",
                        ErrorKind::UnknownVariant {
                            value: instrument_type,
                            expected: INSTRUMENTS.iter().map(|s| s.instrument_type.to_string()).collect(),
                        },
                    )
                    .to_string()),
                }
            }
        }

        impl Serialize for Configuration {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $(Configuration::$name(c) => c.serialize(serializer)),+
                }
            }
        }
    };
}

impl Configuration {
    pub fn instrument_type(&self) -> &'static str {
        self.spec().instrument_type
    }
}

impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Configuration::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Look an instrument up by its wire identifier.
pub fn find_instrument(instrument_type: &str) -> Option<&'static InstrumentSpec> {
    INSTRUMENTS
        .iter()
        .copied()
        .find(|spec| spec.instrument_type == instrument_type)
}

instrument_registry! {
    SoarGhtsBluecam {
        instrument_type: "SOAR_GHTS_BLUECAM",
        configuration_types: [Spectrum, Engineering, Script, LampFlat, Arc],
        readout_modes: ["GHTS_B_400m1_2x2"],
        rotator_modes: ["SKY"],
        optical_elements: {},
        acquisition_modes: ["MANUAL"],
        guiding_modes: ["ON"],
    },
    SoarGhtsBluecamImager {
        instrument_type: "SOAR_GHTS_BLUECAM_IMAGER",
        configuration_types: [Expose],
        readout_modes: ["GHTS_B_Image_2x2"],
        rotator_modes: ["SKY"],
        optical_elements: {
            filter: ["u-SDSS", "g-SDSS", "r-SDSS", "i-SDSS"],
        },
        acquisition_modes: ["MANUAL"],
        guiding_modes: ["OFF", "ON"],
    },
    SoarGhtsRedcam {
        instrument_type: "SOAR_GHTS_REDCAM",
        configuration_types: [Spectrum, Engineering, Script, Arc, LampFlat],
        readout_modes: [
            "GHTS_R_1200_CaNIR_6300A_1x2_slit0p8",
            "GHTS_R_400m1_2x2",
            "GHTS_R_400m2_2x2",
            "GHTS_R_1200_CaNIR_1x2_slit0p8",
            "GHTS_R_2100_5000A_1x2_slit1p0",
            "GHTS_R_2100_6507A_1x2_slit0p45",
        ],
        rotator_modes: ["SKY"],
        optical_elements: {},
        acquisition_modes: ["MANUAL"],
        guiding_modes: ["ON"],
    },
    SoarGhtsRedcamImager {
        instrument_type: "SOAR_GHTS_REDCAM_IMAGER",
        configuration_types: [Expose],
        readout_modes: ["GHTS_R_Image_2x2"],
        rotator_modes: ["SKY"],
        optical_elements: {
            filter: ["g-SDSS", "r-SDSS", "i-SDSS", "z-SDSS"],
        },
        acquisition_modes: ["MANUAL"],
        guiding_modes: ["OFF", "ON"],
    },
    SoarTriplespec {
        instrument_type: "SOAR_TRIPLESPEC",
        configuration_types: [Spectrum, Standard, Arc, LampFlat, Bias],
        readout_modes: [
            "fowler1_coadds2",
            "fowler4_coadds1",
            "fowler8_coadds1",
            "fowler16_coadds1",
            "fowler1_coadds1",
        ],
        rotator_modes: ["SKY"],
        optical_elements: {},
        acquisition_modes: ["MANUAL"],
        guiding_modes: ["ON"],
    },
    Lco1M0NresScicam {
        instrument_type: "1M0-NRES-SCICAM",
        configuration_types: [
            NresSpectrum, RepeatNresSpectrum, NresExpose, NresTest, Script, Engineering,
            Arc, LampFlat, NresBias, NresDark, AutoFocus,
        ],
        readout_modes: ["default"],
        rotator_modes: [],
        optical_elements: {},
        acquisition_modes: ["WCS", "BRIGHTEST"],
        guiding_modes: ["ON"],
    },
    Lco2M0FloydsScicam {
        instrument_type: "2M0-FLOYDS-SCICAM",
        configuration_types: [Spectrum, RepeatSpectrum, Arc, Engineering, Script, LampFlat],
        readout_modes: ["default"],
        rotator_modes: ["VFLOAT", "SKY"],
        optical_elements: {
            slit: ["slit_6.0as", "slit_1.6as", "slit_2.0as", "slit_1.2as"],
        },
        acquisition_modes: ["BRIGHTEST", "WCS"],
        guiding_modes: ["OFF", "ON"],
    },
    Lco2M0ScicamMuscat {
        instrument_type: "2M0-SCICAM-MUSCAT",
        configuration_types: [
            Expose, RepeatExpose, Bias, Dark, Standard, Script, AutoFocus, Engineering, SkyFlat,
        ],
        readout_modes: ["MUSCAT_SLOW", "MUSCAT_FAST"],
        rotator_modes: [],
        optical_elements: {
            narrowband_g_position: ["out", "in"],
            narrowband_r_position: ["out", "in"],
            narrowband_i_position: ["out", "in"],
            narrowband_z_position: ["out", "in"],
        },
        acquisition_modes: ["OFF"],
        guiding_modes: ["ON", "OFF"],
    },
    Lco1M0ScicamSinistro {
        instrument_type: "1M0-SCICAM-SINISTRO",
        configuration_types: [
            Expose, RepeatExpose, Bias, Dark, Standard, Script, AutoFocus, Engineering, SkyFlat,
        ],
        readout_modes: ["full_frame", "central_2k_2x2"],
        rotator_modes: [],
        optical_elements: {
            filter: [
                "I", "R", "U", "w", "Y", "up", "rp", "ip", "gp", "zs", "V", "B",
                "400um-Pinhole", "150um-Pinhole", "CN",
            ],
        },
        acquisition_modes: ["OFF"],
        guiding_modes: ["OFF", "ON"],
    },
    Lco0M4ScicamQhy600 {
        instrument_type: "0M4-SCICAM-QHY600",
        configuration_types: [Expose, RepeatExpose, AutoFocus, Bias, Dark, Standard, SkyFlat],
        readout_modes: ["central30x30", "full_frame"],
        rotator_modes: [],
        optical_elements: {
            filter: [
                "OIII", "SII", "Astrodon-Exo", "w", "opaque", "up", "rp", "ip", "gp", "zs",
                "V", "B", "H-Alpha",
            ],
        },
        acquisition_modes: ["OFF"],
        guiding_modes: ["OFF", "ON"],
    },
    BlancoNewfirm {
        instrument_type: "BLANCO_NEWFIRM",
        configuration_types: [Expose, SkyFlat, Standard, Dark],
        readout_modes: ["fowler1_coadds1", "fowler8_coadds1", "fowler16_coadds1"],
        rotator_modes: [],
        optical_elements: {
            filter: [
                "JX", "HX", "KXs", "1187", "2096", "1644", "2124", "2168", "J1", "1066", "DARK",
            ],
        },
        acquisition_modes: ["MANUAL"],
        guiding_modes: ["ON"],
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::SiderealTarget;
    use crate::ocs::instrument::{AcquisitionConfig, GuidingConfig};
    use serde_json::json;

    fn sinistro() -> InstrumentConfiguration<Lco1M0ScicamSinistro> {
        let elements = Lco1M0ScicamSinistro::optical_elements(&[("filter", "B")]).unwrap();
        let block = Lco1M0ScicamSinistro::instrument_config(1, 10.0, "central_2k_2x2", None, elements).unwrap();
        Lco1M0ScicamSinistro::configuration(
            ConfigurationType::Expose,
            SiderealTarget::new("M51", 202.469, 47.195).unwrap(),
            Constraints::default(),
            vec![block],
            AcquisitionConfig::new("OFF").unwrap(),
            GuidingConfig::new("ON", true).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_table_has_unique_discriminators() {
        assert_eq!(INSTRUMENTS.len(), 11);
        for (i, spec) in INSTRUMENTS.iter().enumerate() {
            assert!(
                INSTRUMENTS[i + 1..]
                    .iter()
                    .all(|other| other.instrument_type != spec.instrument_type),
                "duplicate {}",
                spec.instrument_type
            );
            assert!(!spec.readout_modes.is_empty());
            assert!(!spec.configuration_types.is_empty());
        }
    }

    #[test]
    fn test_find_instrument() {
        let spec = find_instrument("2M0-SCICAM-MUSCAT").unwrap();
        assert_eq!(spec.type_name, "Lco2M0ScicamMuscat");
        assert_eq!(spec.optical_elements.len(), 4);
        assert!(find_instrument("2M0-SCICAM-SPECTRAL").is_none());
    }

    #[test]
    fn test_configuration_dispatches_on_instrument_type() {
        let configuration = Configuration::from(sinistro());
        let json = serde_json::to_value(&configuration).unwrap();
        assert_eq!(json["instrument_type"], "1M0-SCICAM-SINISTRO");

        let back: Configuration = serde_json::from_value(json).unwrap();
        assert!(matches!(back, Configuration::Lco1M0ScicamSinistro(_)));
        assert_eq!(back, configuration);
        assert_eq!(back.instrument_type(), "1M0-SCICAM-SINISTRO");
    }

    /// A minimal legal payload for `spec`: first value of every closed set.
    fn payload_for(spec: &InstrumentSpec) -> Value {
        let elements: serde_json::Map<String, Value> = spec
            .optical_elements
            .iter()
            .map(|element| (element.name.to_string(), json!(element.values[0])))
            .collect();
        let mut block = json!({
            "exposure_count": 1,
            "exposure_time": 30.0,
            "mode": spec.readout_modes[0],
            "optical_elements": elements,
        });
        if let Some(rotator) = spec.rotator_modes.first() {
            block["rotator_mode"] = json!(rotator);
        }
        json!({
            "type": spec.configuration_types[0].as_str(),
            "instrument_type": spec.instrument_type,
            "instrument_configs": [block],
            "acquisition_config": {"mode": spec.acquisition_modes[0]},
            "guiding_config": {"mode": spec.guiding_modes[0], "optional": false},
            "target": serde_json::to_value(Target::from(
                SiderealTarget::new("M51", 202.469, 47.195).unwrap(),
            ))
            .unwrap(),
            "constraints": serde_json::to_value(Constraints::default()).unwrap(),
        })
    }

    #[test]
    fn test_every_instrument_accepts_only_its_modes() {
        for spec in INSTRUMENTS {
            let payload = payload_for(spec);
            let configuration: Configuration = serde_json::from_str(&payload.to_string())
                .unwrap_or_else(|err| panic!("{}: {}", spec.instrument_type, err));
            assert_eq!(configuration.spec(), *spec);

            // Every other readout mode in the table is foreign to this instrument.
            let foreign = INSTRUMENTS
                .iter()
                .flat_map(|other| other.readout_modes.iter().copied())
                .find(|mode| !spec.readout_modes.contains(mode))
                .unwrap();
            for mode in [foreign, "not-a-mode"] {
                let mut bad = payload.clone();
                bad["instrument_configs"][0]["mode"] = json!(mode);
                let err = serde_json::from_value::<Configuration>(bad).unwrap_err().to_string();
                assert!(err.contains("mode") && err.contains(mode), "{}: {}", spec.instrument_type, err);
            }

            let mut rotator = payload.clone();
            if spec.requires_rotator_mode() {
                rotator["instrument_configs"][0]["rotator_mode"] = json!("not-a-rotator");
                let err = serde_json::from_value::<Configuration>(rotator.clone()).unwrap_err();
                assert!(err.to_string().contains("not-a-rotator"), "{}", spec.instrument_type);
                rotator["instrument_configs"][0]
                    .as_object_mut()
                    .unwrap()
                    .remove("rotator_mode");
                let err = serde_json::from_value::<Configuration>(rotator).unwrap_err();
                assert!(err.to_string().contains("rotator_mode: required field missing"));
            } else {
                rotator["instrument_configs"][0]["rotator_mode"] = json!("SKY");
                let err = serde_json::from_value::<Configuration>(rotator).unwrap_err();
                assert!(err.to_string().contains("has no rotator"), "{}", spec.instrument_type);
            }
        }
    }

    #[test]
    fn test_unknown_instrument_type_fails() {
        let mut json = serde_json::to_value(Configuration::from(sinistro())).unwrap();
        json["instrument_type"] = json!("1M0-SCICAM-SBIG");
        let err = serde_json::from_value::<Configuration>(json).unwrap_err();
        assert!(err.to_string().contains("unknown variant '1M0-SCICAM-SBIG'"));
    }

    #[test]
    fn test_payload_for_other_instrument_does_not_fall_through() {
        // A Sinistro payload relabelled as QHY600 must fail on QHY600's own rules.
        let mut json = serde_json::to_value(Configuration::from(sinistro())).unwrap();
        json["instrument_type"] = json!("0M4-SCICAM-QHY600");
        let err = serde_json::from_value::<Configuration>(json).unwrap_err();
        assert!(err.to_string().contains("central_2k_2x2"));
    }
}
