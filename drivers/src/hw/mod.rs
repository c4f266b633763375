//! Raw hardware glue used directly by `kernel` (MMU peripheral mapping,
//! early boot UART, interrupt controller) rather than through the
//! [`hal`](crate::hal)/[`platform`](crate::platform) trait layer.

pub mod bcm2835;
pub mod pl011;
