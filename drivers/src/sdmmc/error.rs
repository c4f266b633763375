//! Error taxonomy for the SD/MMC core.
//!
//! `SdmmcErrors` is the sticky bitset surfaced through
//! [`crate::sdmmc::Driver::get_and_clear_errors`]; `SdmmcError` is the
//! per-call failure reason that callers match on and that folds into the
//! bitset via [`SdmmcError::as_flag`].

use bitflags::bitflags;

bitflags! {
    /// Sticky error flags accumulated since the last `get_and_clear_errors`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SdmmcErrors: u32 {
        /// Requested block range exceeded capacity; no bus traffic occurred.
        const OVERFLOW      = 1 << 0;
        /// Command response failed CRC.
        const CRC            = 1 << 1;
        /// Command response carried one of the R1/R1_MMC error bits.
        const CMD_RESPONSE   = 1 << 2;
        /// OCR polling exceeded `INIT_RETRY`.
        const INIT_TIMEOUT   = 1 << 3;
        /// Card reported zero capacity during connect.
        const CAPACITY_ZERO  = 1 << 4;
        /// The card never reached `TRAN` (or reported an invalid state).
        const TRANSFER_WAIT  = 1 << 5;
        /// Any other failure signalled by the LLD.
        const LLD_TRANSPORT  = 1 << 6;
    }
}

/// A single operation's failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdmmcError {
    /// `startblk + n > capacity`.
    Overflow,
    /// Response CRC or R1 error bits.
    CrcOrResponse,
    /// Init handshake exceeded its retry budget.
    InitTimeout,
    /// Connect completed but capacity resolved to zero.
    CapacityZero,
    /// `wait_for_transfer_state` gave up.
    TransferWait,
    /// Opaque LLD-layer failure.
    Lld,
}

impl SdmmcError {
    /// The sticky flag this failure contributes to `errors`.
    pub const fn as_flag(self) -> SdmmcErrors {
        match self {
            SdmmcError::Overflow => SdmmcErrors::OVERFLOW,
            SdmmcError::CrcOrResponse => SdmmcErrors::CRC.union(SdmmcErrors::CMD_RESPONSE),
            SdmmcError::InitTimeout => SdmmcErrors::INIT_TIMEOUT,
            SdmmcError::CapacityZero => SdmmcErrors::CAPACITY_ZERO,
            SdmmcError::TransferWait => SdmmcErrors::TRANSFER_WAIT,
            SdmmcError::Lld => SdmmcErrors::LLD_TRANSPORT,
        }
    }
}
