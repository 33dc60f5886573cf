use gst_proc_macros::name;

pub const GSTIO_NAME: Name = Name::new(name!("gstio"));
pub const GSTIO_GAS_NAME: Name = Name::new(name!("gstio.gas"));

pub mod block;
pub use block::*;

pub mod config;

mod error;
pub use error::ChainError;

pub mod name;
pub use name::Name;

pub mod resource;
pub use resource::*;

mod resource_limits;
pub use resource_limits::ResourceLimitsManager;

pub mod snapshot;
pub use snapshot::*;

pub mod utils;
pub use utils::*;
