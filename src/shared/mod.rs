// This is free and unencumbered software released into the public domain.

mod bridge;
pub use bridge::*;

mod capture;
pub use capture::*;

mod config;
pub use config::*;

mod context;
pub use context::*;

mod driver;
pub use driver::*;

pub mod drivers {
    pub mod simulated;
}

mod encoder;
pub use encoder::*;

mod error;
pub use error::*;

mod events;
pub use events::*;

mod focus;
pub use focus::*;

mod frame;
pub use frame::*;

mod open;
pub use open::*;

mod region;
pub use region::*;

mod service;
pub use service::*;

mod storage;
pub use storage::*;
