//! BCM2835 EMMC controller, wired in as an [`sdmmc::Lld`] implementor.
//!
//! Card-family detection, the init handshake, identity parsing, and the
//! lifecycle state machine all live in [`crate::sdmmc`]; this file only
//! talks to the controller's memory-mapped registers.

use core::ptr::{read_volatile, write_volatile};

use crate::sdmmc::{BusWidth, Lld, LongResponse};

/// EMMC base address
const EMMC_BASE: usize = 0x2030_0000;

/// Register offsets
const REG_ARG2: usize = 0x00;
const REG_BLKSIZECNT: usize = 0x04;
const REG_ARG1: usize = 0x08;
const REG_CMDTM: usize = 0x0C;
const REG_RESP0: usize = 0x10;
const REG_RESP1: usize = 0x14;
const REG_RESP2: usize = 0x18;
const REG_RESP3: usize = 0x1C;
const REG_DATA: usize = 0x20;
const REG_STATUS: usize = 0x24;
const REG_CONTROL0: usize = 0x28;
const REG_CONTROL1: usize = 0x2C;
const REG_INTERRUPT: usize = 0x30;
const REG_IRPT_MASK: usize = 0x34;

/// Status register bits
const STATUS_CMD_INHIBIT: u32 = 1 << 0;
const STATUS_DAT_INHIBIT: u32 = 1 << 1;
const STATUS_CARD_INSERTED: u32 = 1 << 16;

/// Interrupt register bits
const INT_CMD_DONE: u32 = 1 << 0;
const INT_DATA_DONE: u32 = 1 << 1;
const INT_WRITE_READY: u32 = 1 << 4;
const INT_READ_READY: u32 = 1 << 5;
const INT_ERROR: u32 = 1 << 15;
const INT_TIMEOUT: u32 = 1 << 16;
const INT_CRC: u32 = 1 << 17;
const INT_INDEX: u32 = 1 << 19;
const INT_DATA_TIMEOUT: u32 = 1 << 20;
const INT_DATA_CRC: u32 = 1 << 21;

/// Command register bits
const CMD_RESPONSE_NONE: u32 = 0 << 16;
const CMD_RESPONSE_136: u32 = 1 << 16;
const CMD_RESPONSE_48: u32 = 2 << 16;
const CMD_CRCCHK_EN: u32 = 1 << 19;
const CMD_IXCHK_EN: u32 = 1 << 20;
const CMD_ISDATA: u32 = 1 << 21;
const CMD_INDEX_SHIFT: u32 = 24;

/// Control0 register bits
const CONTROL0_DWIDTH_4BIT: u32 = 1 << 1;
const CONTROL0_EXT_DWIDTH_8BIT: u32 = 1 << 5;

/// Control1 register bits
const CLK_INTLEN: u32 = 1 << 0;
const CLK_STABLE: u32 = 1 << 1;
const CLK_EN: u32 = 1 << 2;
const CLK_GENSEL: u32 = 1 << 5;
const SRST_HC: u32 = 1 << 24;

/// Transfer-mode bits
const TM_DAT_DIR_READ: u32 = 1 << 4;

/// MMC SEND_EXT_CSD shares CMD8's index once a card is selected.
const CMD_SEND_EXT_CSD: u32 = 8;

const BLOCK_SIZE: usize = 512;

#[derive(Debug, Clone, Copy)]
pub enum EmmcError {
    NoCard,
    Timeout,
    CommandError,
    BufferTooSmall,
    ReadError,
    WriteError,
}

/// BCM2835 EMMC controller, register-level only.
pub struct Bcm2835Lld {
    base: usize,
    /// Whether the connected card addresses blocks directly; set by
    /// [`Lld::set_high_capacity`] once the connection engine knows.
    high_capacity: bool,
}

impl Bcm2835Lld {
    /// # Safety
    /// The caller must ensure only one `Bcm2835Lld` exists for this base
    /// address at a time.
    pub const unsafe fn new() -> Self {
        Self {
            base: EMMC_BASE,
            high_capacity: false,
        }
    }

    #[inline]
    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }

    fn wait_cmd_done(&self) -> Result<(), EmmcError> {
        for _ in 0..100_000 {
            let interrupt = self.read_reg(REG_INTERRUPT);

            if interrupt & INT_ERROR != 0 {
                if interrupt & INT_TIMEOUT != 0 {
                    self.write_reg(REG_INTERRUPT, INT_TIMEOUT);
                    return Err(EmmcError::Timeout);
                }
                if interrupt & INT_CRC != 0 {
                    self.write_reg(REG_INTERRUPT, INT_CRC);
                }
                if interrupt & INT_INDEX != 0 {
                    self.write_reg(REG_INTERRUPT, INT_INDEX);
                }
                self.write_reg(REG_INTERRUPT, INT_ERROR);
                return Err(EmmcError::CommandError);
            }

            if interrupt & INT_CMD_DONE != 0 {
                self.write_reg(REG_INTERRUPT, INT_CMD_DONE);
                return Ok(());
            }
            self.delay_us(10);
        }
        Err(EmmcError::Timeout)
    }

    fn send_raw(&self, cmd: u32, arg: u32, flags: u32) -> Result<(), EmmcError> {
        for _ in 0..100_000 {
            if self.read_reg(REG_STATUS) & STATUS_CMD_INHIBIT == 0 {
                break;
            }
            self.delay_us(1);
        }

        self.write_reg(REG_INTERRUPT, 0xFFFF_FFFF);
        self.write_reg(REG_ARG2, 0);
        self.write_reg(REG_ARG1, arg);
        self.write_reg(REG_CMDTM, (cmd << CMD_INDEX_SHIFT) | flags);
        self.wait_cmd_done()
    }

    fn get_response(&self, index: usize) -> u32 {
        match index {
            0 => self.read_reg(REG_RESP0),
            1 => self.read_reg(REG_RESP1),
            2 => self.read_reg(REG_RESP2),
            _ => self.read_reg(REG_RESP3),
        }
    }

    fn reset(&mut self) -> Result<(), EmmcError> {
        let mut ctrl1 = self.read_reg(REG_CONTROL1);
        ctrl1 |= SRST_HC;
        self.write_reg(REG_CONTROL1, ctrl1);

        for _ in 0..10_000 {
            if self.read_reg(REG_CONTROL1) & SRST_HC == 0 {
                self.delay_us(100);
                return Ok(());
            }
            self.delay_us(10);
        }
        Err(EmmcError::Timeout)
    }

    fn set_clock(&self, freq: u32) -> Result<(), EmmcError> {
        const BASE_CLOCK: u32 = 250_000_000;

        let mut ctrl1 = self.read_reg(REG_CONTROL1);
        ctrl1 &= !CLK_EN;
        self.write_reg(REG_CONTROL1, ctrl1);
        self.delay_us(10);

        let mut divisor = BASE_CLOCK / (2 * freq);
        if BASE_CLOCK % (2 * freq) != 0 {
            divisor += 1;
        }
        divisor = divisor.clamp(1, 1023);

        let divisor_ms = ((divisor >> 2) & 0xFF) << 8;
        let divisor_ls = (divisor & 0x3) << 6;

        ctrl1 = self.read_reg(REG_CONTROL1);
        ctrl1 &= !(0xFF << 8);
        ctrl1 &= !(0x3 << 6);
        ctrl1 |= divisor_ms | divisor_ls | CLK_GENSEL | CLK_INTLEN;
        self.write_reg(REG_CONTROL1, ctrl1);
        self.delay_us(10);

        for _ in 0..10_000 {
            ctrl1 = self.read_reg(REG_CONTROL1);
            if ctrl1 & CLK_STABLE != 0 {
                break;
            }
            self.delay_us(10);
        }
        if ctrl1 & CLK_STABLE == 0 {
            return Err(EmmcError::Timeout);
        }
        self.delay_us(10);

        ctrl1 |= CLK_EN;
        self.write_reg(REG_CONTROL1, ctrl1);
        self.delay_us(10);
        Ok(())
    }

    fn disable_clock(&self) {
        let ctrl1 = self.read_reg(REG_CONTROL1) & !CLK_EN;
        self.write_reg(REG_CONTROL1, ctrl1);
    }

    fn delay_us(&self, us: u32) {
        for _ in 0..us {
            core::hint::spin_loop();
        }
    }

    fn wait_data_ready(&self) -> Result<(), EmmcError> {
        for _ in 0..100_000 {
            let interrupt = self.read_reg(REG_INTERRUPT);
            if interrupt & INT_ERROR != 0 {
                if interrupt & INT_DATA_TIMEOUT != 0 {
                    self.write_reg(REG_INTERRUPT, INT_DATA_TIMEOUT);
                    return Err(EmmcError::Timeout);
                }
                self.write_reg(REG_INTERRUPT, INT_ERROR | INT_DATA_CRC);
                return Err(EmmcError::ReadError);
            }
            if interrupt & INT_READ_READY != 0 {
                self.write_reg(REG_INTERRUPT, INT_READ_READY);
                return Ok(());
            }
            self.delay_us(10);
        }
        Err(EmmcError::Timeout)
    }

    fn wait_write_ready(&self) -> Result<(), EmmcError> {
        for _ in 0..100_000 {
            let interrupt = self.read_reg(REG_INTERRUPT);
            if interrupt & INT_ERROR != 0 {
                self.write_reg(REG_INTERRUPT, INT_ERROR);
                return Err(EmmcError::WriteError);
            }
            if interrupt & INT_WRITE_READY != 0 {
                self.write_reg(REG_INTERRUPT, INT_WRITE_READY);
                return Ok(());
            }
            self.delay_us(10);
        }
        Err(EmmcError::Timeout)
    }

    fn wait_data_done(&self) -> Result<(), EmmcError> {
        for _ in 0..100_000 {
            let interrupt = self.read_reg(REG_INTERRUPT);
            if interrupt & INT_ERROR != 0 {
                self.write_reg(REG_INTERRUPT, INT_ERROR);
                return Err(EmmcError::WriteError);
            }
            if interrupt & INT_DATA_DONE != 0 {
                self.write_reg(REG_INTERRUPT, INT_DATA_DONE);
                return Ok(());
            }
            self.delay_us(10);
        }
        Err(EmmcError::Timeout)
    }

    fn block_address(&self, lba: u64) -> u32 {
        if self.high_capacity {
            lba as u32
        } else {
            (lba * BLOCK_SIZE as u64) as u32
        }
    }

    fn read_block(&self, lba: u64, buf: &mut [u8]) -> Result<(), EmmcError> {
        if buf.len() < BLOCK_SIZE {
            return Err(EmmcError::BufferTooSmall);
        }
        for _ in 0..100_000 {
            if self.read_reg(REG_STATUS) & STATUS_DAT_INHIBIT == 0 {
                break;
            }
            self.delay_us(10);
        }
        self.write_reg(REG_BLKSIZECNT, (1 << 16) | BLOCK_SIZE as u32);
        self.write_reg(REG_INTERRUPT, 0xFFFF_FFFF);

        let flags = CMD_RESPONSE_48 | CMD_CRCCHK_EN | CMD_IXCHK_EN | CMD_ISDATA | TM_DAT_DIR_READ;
        self.send_raw(17, self.block_address(lba), flags)?;
        self.wait_data_ready()?;
        for chunk in buf[..BLOCK_SIZE].chunks_mut(4) {
            let word = self.read_reg(REG_DATA);
            chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
        }
        self.wait_data_done()
    }

    fn write_block(&self, lba: u64, buf: &[u8]) -> Result<(), EmmcError> {
        if buf.len() < BLOCK_SIZE {
            return Err(EmmcError::BufferTooSmall);
        }
        for _ in 0..100_000 {
            if self.read_reg(REG_STATUS) & STATUS_DAT_INHIBIT == 0 {
                break;
            }
            self.delay_us(10);
        }
        self.write_reg(REG_BLKSIZECNT, (1 << 16) | BLOCK_SIZE as u32);
        self.write_reg(REG_INTERRUPT, 0xFFFF_FFFF);

        let flags = CMD_RESPONSE_48 | CMD_CRCCHK_EN | CMD_IXCHK_EN | CMD_ISDATA;
        self.send_raw(24, self.block_address(lba), flags)?;
        self.wait_write_ready()?;
        for chunk in buf[..BLOCK_SIZE].chunks(4) {
            let mut word = [0u8; 4];
            let len = chunk.len().min(4);
            word[..len].copy_from_slice(&chunk[..len]);
            self.write_reg(REG_DATA, u32::from_le_bytes(word));
        }
        self.wait_data_done()
    }
}

// SAFETY: register access is volatile MMIO; the caller of `new` guarantees
// exclusive ownership of the base address.
unsafe impl Send for Bcm2835Lld {}
unsafe impl Sync for Bcm2835Lld {}

impl Lld for Bcm2835Lld {
    type Error = EmmcError;

    fn start(&mut self) -> Result<(), EmmcError> {
        if self.read_reg(REG_STATUS) & STATUS_CARD_INSERTED == 0 {
            return Err(EmmcError::NoCard);
        }
        self.reset()?;
        self.write_reg(REG_IRPT_MASK, 0xFFFF_FFFF);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EmmcError> {
        self.disable_clock();
        Ok(())
    }

    fn start_clk(&mut self) -> Result<(), EmmcError> {
        self.set_clock(400_000)
    }

    fn stop_clk(&mut self) -> Result<(), EmmcError> {
        self.disable_clock();
        Ok(())
    }

    fn set_data_clk(&mut self) -> Result<(), EmmcError> {
        self.set_clock(25_000_000)
    }

    fn set_bus_mode(&mut self, width: BusWidth) -> Result<(), EmmcError> {
        let mut ctrl0 = self.read_reg(REG_CONTROL0);
        ctrl0 &= !(CONTROL0_DWIDTH_4BIT | CONTROL0_EXT_DWIDTH_8BIT);
        match width {
            BusWidth::One => {}
            BusWidth::Four => ctrl0 |= CONTROL0_DWIDTH_4BIT,
            BusWidth::Eight => ctrl0 |= CONTROL0_EXT_DWIDTH_8BIT,
        }
        self.write_reg(REG_CONTROL0, ctrl0);
        Ok(())
    }

    fn set_high_capacity(&mut self, high_capacity: bool) {
        self.high_capacity = high_capacity;
    }

    fn send_cmd_none(&mut self, cmd: u32, arg: u32) -> Result<(), EmmcError> {
        self.send_raw(cmd, arg, CMD_RESPONSE_NONE)
    }

    fn send_cmd_short(&mut self, cmd: u32, arg: u32) -> Result<u32, EmmcError> {
        self.send_raw(cmd, arg, CMD_RESPONSE_48)?;
        Ok(self.get_response(0))
    }

    fn send_cmd_short_crc(&mut self, cmd: u32, arg: u32) -> Result<u32, EmmcError> {
        self.send_raw(cmd, arg, CMD_RESPONSE_48 | CMD_CRCCHK_EN | CMD_IXCHK_EN)?;
        Ok(self.get_response(0))
    }

    fn send_cmd_long_crc(&mut self, cmd: u32, arg: u32) -> Result<LongResponse, EmmcError> {
        self.send_raw(cmd, arg, CMD_RESPONSE_136 | CMD_CRCCHK_EN)?;
        Ok([
            self.get_response(0),
            self.get_response(1),
            self.get_response(2),
            self.get_response(3),
        ])
    }

    fn read_blocks(&mut self, startblk: u64, buf: &mut [u8], n: usize) -> Result<(), EmmcError> {
        for i in 0..n {
            let chunk = &mut buf[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE];
            self.read_block(startblk + i as u64, chunk)?;
        }
        Ok(())
    }

    fn write_blocks(&mut self, startblk: u64, buf: &[u8], n: usize) -> Result<(), EmmcError> {
        for i in 0..n {
            let chunk = &buf[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE];
            self.write_block(startblk + i as u64, chunk)?;
        }
        Ok(())
    }

    fn read_ext_csd(&mut self, buf: &mut [u8], offset: usize, len: usize) -> Result<(), EmmcError> {
        if offset + len > BLOCK_SIZE {
            return Err(EmmcError::BufferTooSmall);
        }
        for _ in 0..100_000 {
            if self.read_reg(REG_STATUS) & STATUS_DAT_INHIBIT == 0 {
                break;
            }
            self.delay_us(10);
        }
        self.write_reg(REG_BLKSIZECNT, (1 << 16) | BLOCK_SIZE as u32);
        self.write_reg(REG_INTERRUPT, 0xFFFF_FFFF);

        let flags = CMD_RESPONSE_48 | CMD_CRCCHK_EN | CMD_IXCHK_EN | CMD_ISDATA | TM_DAT_DIR_READ;
        self.send_raw(CMD_SEND_EXT_CSD, 0, flags)?;
        self.wait_data_ready()?;

        let mut block = [0u8; BLOCK_SIZE];
        for chunk in block.chunks_mut(4) {
            let word = self.read_reg(REG_DATA);
            chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
        }
        self.wait_data_done()?;

        buf[..len].copy_from_slice(&block[offset..offset + len]);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), EmmcError> {
        for _ in 0..100_000 {
            if self.read_reg(REG_STATUS) & STATUS_DAT_INHIBIT == 0 {
                return Ok(());
            }
            self.delay_us(10);
        }
        Err(EmmcError::Timeout)
    }

    fn is_card_inserted(&self) -> bool {
        self.read_reg(REG_STATUS) & STATUS_CARD_INSERTED != 0
    }

    fn is_write_protected(&self) -> bool {
        // The BCM2835 controller's STATUS register carries no write-protect
        // level; this board doesn't wire the card's WP tab to a GPIO either.
        false
    }
}
