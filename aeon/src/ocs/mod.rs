//! Observatory Control System (OCS) request model, shared by the LCO and
//! SOAR portals.

pub mod constraints;
pub mod instrument;
pub mod lco;
pub mod registry;
pub mod request;
pub mod soar;

pub use constraints::Constraints;
pub use instrument::{
    AcquisitionConfig, ConfigurationType, GuidingConfig, Instrument, InstrumentConfig,
    InstrumentConfiguration, InstrumentSpec, OpticalElementSpec, OpticalElements, Roi,
};
pub use registry::{find_instrument, Configuration, INSTRUMENTS};
pub use request::{
    Cadence, Location, ObservationType, Operator, OptimizationType, Request, RequestGroup,
    RequestGroupState, SubmittedRequestGroup,
};
