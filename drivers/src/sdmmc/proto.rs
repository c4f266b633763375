//! Command numbers, R1 response decoding, and the transfer-state wait loop.

use super::error::SdmmcError;
use super::lld::{Lld, Sleep};

// ============================================================================
// Command numbers
// ============================================================================

pub const CMD0: u32 = 0; // GO_IDLE_STATE
pub const CMD1: u32 = 1; // SEND_OP_COND (MMC)
pub const CMD2: u32 = 2; // ALL_SEND_CID
pub const CMD3: u32 = 3; // SEND_RELATIVE_ADDR
pub const CMD6: u32 = 6; // SWITCH (MMC)
pub const CMD7: u32 = 7; // SEL_DESEL_CARD
pub const CMD8: u32 = 8; // SEND_IF_COND
pub const CMD9: u32 = 9; // SEND_CSD
pub const CMD13: u32 = 13; // SEND_STATUS
pub const CMD16: u32 = 16; // SET_BLOCKLEN
pub const CMD17: u32 = 17; // READ_SINGLE_BLOCK
pub const CMD18: u32 = 18; // READ_MULTIPLE_BLOCK
pub const CMD24: u32 = 24; // WRITE_BLOCK
pub const CMD25: u32 = 25; // WRITE_MULTIPLE_BLOCK
pub const CMD32: u32 = 32; // ERASE_WR_BLK_START
pub const CMD33: u32 = 33; // ERASE_WR_BLK_END
pub const CMD38: u32 = 38; // ERASE
pub const CMD55: u32 = 55; // APP_CMD
pub const ACMD6: u32 = 6; // SET_BUS_WIDTH
pub const ACMD41: u32 = 41; // SD_SEND_OP_COND

/// Reference pattern sent in CMD8's argument (voltage 2.7-3.6V, check
/// pattern 0xAA).
pub const CMD8_PATTERN: u32 = 0x0000_01AA;

/// OCR mask used by the SD v2.0 ACMD41 handshake (HCS bit set).
pub const OCR_SDV2_MASK: u32 = 0xC010_0000;
/// OCR mask used by the SD v1.1 ACMD41 handshake (no HCS bit).
pub const OCR_SDV1_MASK: u32 = 0x8010_0000;
/// OCR mask used by the MMC CMD1 handshake.
pub const OCR_MMC_MASK: u32 = 0x00FF_8000;

/// OCR bit 31: card has left the busy/init phase.
pub const OCR_READY: u32 = 1 << 31;
/// OCR bit 30: card reports itself high-capacity (HCS/CCS).
pub const OCR_HIGH_CAPACITY: u32 = 1 << 30;

/// MMC `SWITCH` argument selecting EXT_CSD BUS_WIDTH = 4-bit.
pub const MMC_SWITCH_BUS_WIDTH_4: u32 = 0x03B7_0100;
/// MMC `SWITCH` argument selecting EXT_CSD BUS_WIDTH = 8-bit.
pub const MMC_SWITCH_BUS_WIDTH_8: u32 = 0x03B7_0200;

/// ACMD6 argument selecting 4-bit bus width.
pub const ACMD6_BUS_WIDTH_4: u32 = 2;

// ============================================================================
// EXT_CSD offsets
// ============================================================================

pub const EXT_CSD_SEC_COUNT: usize = 212;
pub const EXT_CSD_REVISION: usize = 192;
pub const EXT_CSD_DEV_LIFETIME_EST_TYP_A: usize = 268;
pub const EXT_CSD_DEV_LIFETIME_EST_TYP_B: usize = 269;

// ============================================================================
// Bus width
// ============================================================================

/// Data bus width negotiated during connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusWidth {
    One,
    Four,
    Eight,
}

// ============================================================================
// R1 response decoding
// ============================================================================

const R1_OUT_OF_RANGE: u32 = 1 << 31;
const R1_ADDRESS_ERROR: u32 = 1 << 30;
const R1_BLOCK_LEN_ERROR: u32 = 1 << 29;
const R1_ERASE_SEQ_ERROR: u32 = 1 << 28;
const R1_ERASE_PARAM: u32 = 1 << 27;
const R1_WP_VIOLATION: u32 = 1 << 26;
const R1_LOCK_UNLOCK_FAILED: u32 = 1 << 24;
const R1_COM_CRC_ERROR: u32 = 1 << 23;
const R1_ILLEGAL_COMMAND: u32 = 1 << 22;
const R1_CARD_ECC_FAILED: u32 = 1 << 21;
const R1_CC_ERROR: u32 = 1 << 20;
const R1_ERROR_GENERIC: u32 = 1 << 19;
const R1_CID_CSD_OVERWRITE: u32 = 1 << 16;
const R1_CARD_ECC_DISABLED: u32 = 1 << 14;
const R1_ERASE_RESET: u32 = 1 << 13;
/// Informational on MMC: a failed `SWITCH` leaves this set but the card
/// otherwise stays usable.
const R1_SWITCH_ERROR: u32 = 1 << 7;

const R1_ERROR_MASK: u32 = R1_OUT_OF_RANGE
    | R1_ADDRESS_ERROR
    | R1_BLOCK_LEN_ERROR
    | R1_ERASE_SEQ_ERROR
    | R1_ERASE_PARAM
    | R1_WP_VIOLATION
    | R1_LOCK_UNLOCK_FAILED
    | R1_COM_CRC_ERROR
    | R1_ILLEGAL_COMMAND
    | R1_CARD_ECC_FAILED
    | R1_CC_ERROR
    | R1_ERROR_GENERIC
    | R1_CID_CSD_OVERWRITE
    | R1_CARD_ECC_DISABLED
    | R1_ERASE_RESET
    | R1_SWITCH_ERROR;

const R1_MMC_ERROR_MASK: u32 = R1_ERROR_MASK & !R1_SWITCH_ERROR;

/// The card's `CURRENT_STATE` field, bits 12:9 of an R1 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Ready,
    Ident,
    Stby,
    Tran,
    Data,
    Rcv,
    Prg,
    Dis,
    Other(u8),
}

impl From<u8> for CardState {
    fn from(v: u8) -> Self {
        match v {
            0 => CardState::Idle,
            1 => CardState::Ready,
            2 => CardState::Ident,
            3 => CardState::Stby,
            4 => CardState::Tran,
            5 => CardState::Data,
            6 => CardState::Rcv,
            7 => CardState::Prg,
            8 => CardState::Dis,
            other => CardState::Other(other),
        }
    }
}

/// A raw R1 response word with the SD/MMC status-bit accessors the core
/// needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct R1(pub u32);

impl R1 {
    /// Any of the SD-defined error bits are set.
    pub const fn is_error(self) -> bool {
        self.0 & R1_ERROR_MASK != 0
    }

    /// The MMC variant: a narrower subset (SWITCH_ERROR is informational
    /// on MMC, not fatal).
    pub const fn is_mmc_error(self) -> bool {
        self.0 & R1_MMC_ERROR_MASK != 0
    }

    /// The 4-bit `CURRENT_STATE` field.
    pub fn state(self) -> CardState {
        CardState::from(((self.0 >> 9) & 0xF) as u8)
    }
}

// ============================================================================
// wait_for_transfer_state
// ============================================================================

/// Poll `SEND_STATUS` until the card reports `TRAN`.
///
/// Mirrors `_sdc_wait_for_transfer_state` in the original driver: no
/// intrinsic timeout beyond the LLD's own command timeout. `DATA`/`RCV`/`PRG`
/// keep polling (optionally sleeping `nice_ms` per iteration when
/// `nice_waiting` is set); any other state, a CRC failure, or an R1 error
/// bit fails immediately.
pub fn wait_for_transfer_state<L: Lld, S: Sleep>(
    lld: &mut L,
    sleep: &S,
    rca: u16,
    rca_shift: u32,
    nice_waiting: bool,
) -> Result<(), SdmmcError> {
    loop {
        let arg = (rca as u32) << rca_shift;
        let resp = lld
            .send_cmd_short_crc(CMD13, arg)
            .map_err(|_| SdmmcError::Lld)?;
        let r1 = R1(resp);
        if r1.is_error() {
            return Err(SdmmcError::CrcOrResponse);
        }

        match r1.state() {
            CardState::Tran => return Ok(()),
            CardState::Data | CardState::Rcv | CardState::Prg => {
                if nice_waiting {
                    sleep.sleep_ms(1);
                }
            }
            _ => return Err(SdmmcError::TransferWait),
        }
    }
}
