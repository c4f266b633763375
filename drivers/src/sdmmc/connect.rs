//! The connection engine: drives a freshly powered card from reset into
//! `TRAN`, populating identity, addressing mode, and capacity.
//!
//! Entry precondition is enforced by the caller (`Driver::connect`): this
//! function assumes the identification clock has not yet been started and
//! leaves the card selected, block-length set, and the data clock raised on
//! success. On any failure it returns the epilogue's-worth of information
//! needed by the caller to stop the clock and fall back to `ACTIVE`; it
//! never leaves partial state in its own return value.

use crate::hal::block_device::{Cid, Csd};

use super::driver::SdmmcConfig;
use super::error::SdmmcError;
use super::lld::{Lld, Sleep};
use super::proto::{
    BusWidth, R1, ACMD41, ACMD6, ACMD6_BUS_WIDTH_4, CMD0, CMD1, CMD16, CMD2, CMD3, CMD55, CMD6,
    CMD7, CMD8, CMD8_PATTERN, CMD9, EXT_CSD_DEV_LIFETIME_EST_TYP_A, EXT_CSD_REVISION,
    EXT_CSD_SEC_COUNT, MMC_SWITCH_BUS_WIDTH_4, MMC_SWITCH_BUS_WIDTH_8, OCR_HIGH_CAPACITY,
    OCR_MMC_MASK, OCR_READY, OCR_SDV1_MASK, OCR_SDV2_MASK,
};

bitflags::bitflags! {
    /// Card family OR'd with the high-capacity flag, per §3's `cardmode`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CardMode: u8 {
        const SDV11         = 1 << 0;
        const SDV20         = 1 << 1;
        const MMC           = 1 << 2;
        const HIGH_CAPACITY = 1 << 3;
    }
}

/// Everything the connection engine learns about the card on success.
pub struct ConnectOutcome {
    pub cardmode: CardMode,
    pub rca: u16,
    pub cid: Cid,
    pub csd: Csd,
    pub capacity: u64,
    pub ext_csd_revision: u8,
    pub lifetime_est_a: u8,
    pub lifetime_est_b: u8,
}

fn long_response_to_be_bytes(r: [u32; 4]) -> [u8; 16] {
    let v: u128 = (r[0] as u128) | ((r[1] as u128) << 32) | ((r[2] as u128) << 64)
        | ((r[3] as u128) << 96);
    v.to_be_bytes()
}

/// Run the full 12-step handshake described in the component design.
///
/// `lld` must already be `start`ed; this function owns `start_clk` onward.
pub fn connect<L: Lld, S: Sleep>(
    lld: &mut L,
    sleep: &S,
    config: &SdmmcConfig,
) -> Result<ConnectOutcome, SdmmcError> {
    // Step 1: identification clock on.
    lld.start_clk().map_err(|_| SdmmcError::Lld)?;

    // Step 2: reset.
    lld.send_cmd_none(CMD0, 0).map_err(|_| SdmmcError::Lld)?;

    // Step 3: family detection.
    let mut cardmode = detect_family(lld, config.mmc_support)?;

    // Step 4: operating-conditions handshake.
    if cardmode.contains(CardMode::MMC) {
        op_cond_mmc(lld, sleep, config.init_retry, &mut cardmode)?;
    } else {
        let ocr_mask = if cardmode.contains(CardMode::SDV20) {
            OCR_SDV2_MASK
        } else {
            OCR_SDV1_MASK
        };
        op_cond_sd(lld, sleep, config.init_retry, ocr_mask, &mut cardmode)?;
    }
    lld.set_high_capacity(cardmode.contains(CardMode::HIGH_CAPACITY));

    // Step 5: CID read.
    let cid_resp = lld
        .send_cmd_long_crc(CMD2, 0)
        .map_err(|_| SdmmcError::Lld)?;
    let cid = Cid::parse(&long_response_to_be_bytes(cid_resp));

    // Step 6: RCA assignment.
    let rca = if cardmode.contains(CardMode::MMC) {
        // MMC: card reports its own RCA in response to CMD3(arg=0).
        let resp = lld
            .send_cmd_short_crc(CMD3, 0)
            .map_err(|_| SdmmcError::Lld)?;
        (resp >> 16) as u16
    } else {
        // SD: host assigns a non-zero RCA via the configured value.
        let rca = config.sd_rca;
        lld.send_cmd_short_crc(CMD3, (rca as u32) << 16)
            .map_err(|_| SdmmcError::Lld)?;
        rca
    };
    let rca_shift: u32 = if cardmode.contains(CardMode::MMC) { 0 } else { 16 };

    // Step 7: CSD read.
    let csd_resp = lld
        .send_cmd_long_crc(CMD9, (rca as u32) << rca_shift)
        .map_err(|_| SdmmcError::Lld)?;
    let csd = Csd::parse(&long_response_to_be_bytes(csd_resp)).map_err(|_| SdmmcError::Lld)?;
    let mut capacity = csd.block_count();

    // Step 8: card selection & block length.
    let arg = (rca as u32) << rca_shift;
    check_r1(lld.send_cmd_short_crc(CMD7, arg))?;
    check_r1(lld.send_cmd_short_crc(CMD16, 512))?;

    // Step 9: bus-width widening.
    match config.bus_width {
        BusWidth::Four if cardmode.contains(CardMode::MMC) => {
            switch_mmc_bus_width(lld, MMC_SWITCH_BUS_WIDTH_4)?;
            lld.set_bus_mode(BusWidth::Four).map_err(|_| SdmmcError::Lld)?;
        }
        BusWidth::Eight if cardmode.contains(CardMode::MMC) => {
            switch_mmc_bus_width(lld, MMC_SWITCH_BUS_WIDTH_8)?;
            lld.set_bus_mode(BusWidth::Eight).map_err(|_| SdmmcError::Lld)?;
        }
        BusWidth::Four => {
            lld.send_cmd_short_crc(CMD55, arg)
                .map_err(|_| SdmmcError::Lld)?;
            check_r1(lld.send_cmd_short(ACMD6, ACMD6_BUS_WIDTH_4))?;
            lld.set_bus_mode(BusWidth::Four).map_err(|_| SdmmcError::Lld)?;
        }
        BusWidth::Eight => {
            // 8-bit is MMC-only; nothing to widen for SD, leave at 1-bit.
        }
        BusWidth::One => {}
    }

    // Step 10: EXT_CSD phase (high-capacity MMC only).
    let mut ext_csd_revision = 0u8;
    let mut lifetime_est_a = 0u8;
    let mut lifetime_est_b = 0u8;
    if cardmode.contains(CardMode::MMC) && cardmode.contains(CardMode::HIGH_CAPACITY) {
        let mut sec_count = [0u8; 4];
        sleep.sleep_ms(1);
        lld.read_ext_csd(&mut sec_count, EXT_CSD_SEC_COUNT, 4)
            .map_err(|_| SdmmcError::Lld)?;
        capacity = u32::from_le_bytes(sec_count) as u64;

        // Best-effort auxiliary reads: failure leaves the field at zero.
        let mut rev = [0u8; 1];
        sleep.sleep_ms(1);
        match lld.read_ext_csd(&mut rev, EXT_CSD_REVISION, 1) {
            Ok(()) => ext_csd_revision = rev[0],
            Err(_) => log::warn!("sdmmc: best-effort EXT_CSD_REVISION read failed"),
        }

        let mut life = [0u8; 2];
        sleep.sleep_ms(1);
        match lld.read_ext_csd(&mut life, EXT_CSD_DEV_LIFETIME_EST_TYP_A, 2) {
            Ok(()) => {
                lifetime_est_a = life[0];
                lifetime_est_b = life[1];
            }
            Err(_) => log::warn!("sdmmc: best-effort EXT_CSD lifetime-estimate read failed"),
        }
    }

    // Step 11: capacity sanity.
    if capacity == 0 {
        return Err(SdmmcError::CapacityZero);
    }

    // Step 12: data clock, done.
    lld.set_data_clk().map_err(|_| SdmmcError::Lld)?;

    log::debug!(
        "sdmmc: connect succeeded, cardmode={:?} rca={:#06x} capacity={} blocks",
        cardmode,
        rca,
        capacity
    );

    Ok(ConnectOutcome {
        cardmode,
        rca,
        cid,
        csd,
        capacity,
        ext_csd_revision,
        lifetime_est_a,
        lifetime_est_b,
    })
}

fn check_r1<E>(resp: Result<u32, E>) -> Result<R1, SdmmcError> {
    let word = resp.map_err(|_| SdmmcError::Lld)?;
    let r1 = R1(word);
    if r1.is_error() {
        Err(SdmmcError::CrcOrResponse)
    } else {
        Ok(r1)
    }
}

fn detect_family<L: Lld>(lld: &mut L, mmc_support: bool) -> Result<CardMode, SdmmcError> {
    log::trace!("sdmmc: probing CMD8 (SEND_IF_COND)");
    match lld.send_cmd_short_crc(CMD8, CMD8_PATTERN) {
        Ok(resp) => {
            // CRC ok: SDv2.0-capable. Voltage nibble must independently read
            // back as 1, regardless of whether the echoed pattern matches.
            if (resp & 0xF00) >> 8 != 1 {
                return Err(SdmmcError::CrcOrResponse);
            }
            check_r1(lld.send_cmd_short_crc(CMD55, 0))?;
            Ok(CardMode::SDV20)
        }
        Err(_) => {
            if mmc_support {
                match lld.send_cmd_short_crc(CMD55, 0) {
                    Ok(resp) if !R1(resp).is_error() => Ok(CardMode::SDV11),
                    _ => Ok(CardMode::MMC),
                }
            } else {
                Ok(CardMode::SDV11)
            }
        }
    }
}

fn op_cond_sd<L: Lld, S: Sleep>(
    lld: &mut L,
    sleep: &S,
    init_retry: u32,
    ocr_mask: u32,
    cardmode: &mut CardMode,
) -> Result<(), SdmmcError> {
    for _ in 0..init_retry {
        lld.send_cmd_short_crc(CMD55, 0).map_err(|_| SdmmcError::Lld)?;
        let resp = lld
            .send_cmd_short(ACMD41, ocr_mask)
            .map_err(|_| SdmmcError::Lld)?;
        if resp & OCR_READY != 0 {
            if resp & OCR_HIGH_CAPACITY != 0 {
                *cardmode |= CardMode::HIGH_CAPACITY;
            }
            return Ok(());
        }
        sleep.sleep_ms(10);
    }
    Err(SdmmcError::InitTimeout)
}

fn op_cond_mmc<L: Lld, S: Sleep>(
    lld: &mut L,
    sleep: &S,
    init_retry: u32,
    cardmode: &mut CardMode,
) -> Result<(), SdmmcError> {
    for _ in 0..init_retry {
        let resp = lld
            .send_cmd_short(CMD1, OCR_MMC_MASK)
            .map_err(|_| SdmmcError::Lld)?;
        if resp & OCR_READY != 0 {
            if resp & OCR_HIGH_CAPACITY != 0 {
                *cardmode |= CardMode::HIGH_CAPACITY;
            }
            return Ok(());
        }
        sleep.sleep_ms(10);
    }
    Err(SdmmcError::InitTimeout)
}

fn switch_mmc_bus_width<L: Lld>(lld: &mut L, switch_arg: u32) -> Result<(), SdmmcError> {
    let resp = lld
        .send_cmd_short_crc(CMD6, switch_arg)
        .map_err(|_| SdmmcError::Lld)?;
    if R1(resp).is_mmc_error() {
        return Err(SdmmcError::CrcOrResponse);
    }
    Ok(())
}
