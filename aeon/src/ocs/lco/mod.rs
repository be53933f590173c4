//! Las Cumbres Observatory network: its own instruments plus the SOAR and
//! Blanco instruments it also schedules.

#[cfg(feature = "facility")]
pub mod facility;

pub use crate::ocs::registry::{
    BlancoNewfirm, Lco0M4ScicamQhy600, Lco1M0NresScicam, Lco1M0ScicamSinistro, Lco2M0FloydsScicam,
    Lco2M0ScicamMuscat, SoarGhtsBluecam, SoarGhtsBluecamImager, SoarGhtsRedcam,
    SoarGhtsRedcamImager, SoarTriplespec,
};

#[cfg(feature = "facility")]
pub use facility::{FacilityError, FacilityResult, LcoFacility, Proposal, ValidationOutcome};
