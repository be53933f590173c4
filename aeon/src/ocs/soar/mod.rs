//! SOAR instruments and facility client.

#[cfg(feature = "facility")]
pub mod facility;

pub use crate::ocs::registry::{
    SoarGhtsBluecam, SoarGhtsBluecamImager, SoarGhtsRedcam, SoarGhtsRedcamImager, SoarTriplespec,
};

#[cfg(feature = "facility")]
pub use facility::SoarFacility;
