//! Peripheral Drivers
//!
//! This module contains drivers for reusable peripherals that
//! can be found across different platforms.
//!
//! # Available Peripherals
//!
//! - [`pl011`]: ARM PrimeCell PL011 UART

pub mod pl011;
