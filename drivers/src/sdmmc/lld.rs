//! Low-level bus driver (LLD) and sleep capability surfaces.
//!
//! The connection engine and block-device facade are generic over these
//! two traits rather than bound to one SoC's SD/MMC controller. A platform
//! crate implements [`Lld`] against its own registers (see
//! `platform::bcm2835::emmc::Bcm2835Lld`) and plugs it into
//! [`crate::sdmmc::Driver`].

use super::proto::BusWidth;

/// Long-response register set, as returned by `send_cmd_long_crc` (CID/CSD
/// reads): four 32-bit words, word 0 first.
pub type LongResponse = [u32; 4];

/// The capability set the core consumes from the bus driver.
///
/// Every method returns pass/fail via `Result`; the core never assumes any
/// particular latency beyond completion.
pub trait Lld {
    /// Opaque transport failure reason.
    type Error: core::fmt::Debug + Copy;

    /// Power the peripheral on for use. Covers controller reset and raising
    /// the identification-rate clock; idempotent.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Power the peripheral down.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Start the card clock at the identification rate (≤400 kHz).
    fn start_clk(&mut self) -> Result<(), Self::Error>;

    /// Stop the card clock.
    fn stop_clk(&mut self) -> Result<(), Self::Error>;

    /// Raise the card clock to the data-phase (operational) rate.
    fn set_data_clk(&mut self) -> Result<(), Self::Error>;

    /// Switch the data bus to the given width.
    fn set_bus_mode(&mut self, width: BusWidth) -> Result<(), Self::Error>;

    /// Record whether the card addresses blocks directly (SDHC/SDXC or
    /// high-capacity eMMC) rather than by byte offset. The connection
    /// engine calls this once it learns the OCR's capacity bit, before any
    /// `read_blocks`/`write_blocks` command is issued; it governs how those
    /// two methods encode their CMD17/18/24/25 argument.
    fn set_high_capacity(&mut self, high_capacity: bool);

    /// Fire-and-forget command, no response expected.
    fn send_cmd_none(&mut self, cmd: u32, arg: u32) -> Result<(), Self::Error>;

    /// 48-bit response, CRC not checked on the response body.
    fn send_cmd_short(&mut self, cmd: u32, arg: u32) -> Result<u32, Self::Error>;

    /// 48-bit response, CRC checked; fails on mismatch.
    fn send_cmd_short_crc(&mut self, cmd: u32, arg: u32) -> Result<u32, Self::Error>;

    /// 136-bit response (CID/CSD reads).
    fn send_cmd_long_crc(&mut self, cmd: u32, arg: u32) -> Result<LongResponse, Self::Error>;

    /// Read `n` contiguous 512-byte blocks starting at `startblk` into `buf`.
    ///
    /// `buf` must be at least `n * 512` bytes.
    fn read_blocks(&mut self, startblk: u64, buf: &mut [u8], n: usize) -> Result<(), Self::Error>;

    /// Write `n` contiguous 512-byte blocks starting at `startblk` from `buf`.
    fn write_blocks(&mut self, startblk: u64, buf: &[u8], n: usize) -> Result<(), Self::Error>;

    /// Read `len` bytes of EXT_CSD starting at byte `offset`.
    fn read_ext_csd(&mut self, buf: &mut [u8], offset: usize, len: usize)
    -> Result<(), Self::Error>;

    /// Block until the card leaves programming state (flush point).
    fn sync(&mut self) -> Result<(), Self::Error>;

    /// Level query: is a card physically present?
    fn is_card_inserted(&self) -> bool;

    /// Level query: is the card's write-protect tab engaged?
    fn is_write_protected(&self) -> bool;
}

/// Sleep capability used for init-handshake backoff and nice transfer-state
/// polling. Platforms with a real scheduler should make this yield; bare
/// busy-wait is a conforming default.
pub trait Sleep {
    /// Suspend the calling thread for approximately `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);
}
