//! SD/MMC block-device core: a host-side state machine and card-init
//! protocol generic over a low-level bus driver ([`Lld`]).
//!
//! Wire a platform's [`Lld`] implementor (e.g.
//! `platform::bcm2835::emmc::Bcm2835Lld`) and an [`IrqControl`] impl into
//! [`Driver`] to get a [`crate::hal::block_device::BlockDevice`].
//!
//! [`IrqControl`]: common::sync::irq::IrqControl

mod connect;
mod driver;
mod error;
mod lld;
mod proto;

#[cfg(test)]
mod tests;

pub use connect::CardMode;
pub use driver::{Driver, SdmmcConfig, State};
pub use error::{SdmmcError, SdmmcErrors};
pub use lld::{Lld, LongResponse, Sleep};
pub use proto::{BusWidth, CardState, R1};
