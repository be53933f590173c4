//! Network-independent value types: scalar adapters, targets and windows.

pub mod angle;
pub mod macros;
pub mod rules;
pub mod target;
pub mod time;
pub mod window;

pub use angle::*;
pub use target::*;
pub use time::*;
pub use window::*;
