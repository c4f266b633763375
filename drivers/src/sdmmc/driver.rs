//! The public block-device facade: lifecycle state machine plus the I/O
//! operations upper layers call.

use common::sync::irq::IrqControl;
use common::sync::{IrqSpinLock, SpinLock};

use crate::hal::block_device::{
    BlockDevice, BlockDeviceError, BlockDeviceInfo, Cid, Csd, IdentifiableBlockDevice,
};

use super::connect::{self, CardMode};
use super::error::{SdmmcError, SdmmcErrors};
use super::lld::{Lld, Sleep};
use super::proto::{self, wait_for_transfer_state, BusWidth, R1};

/// Lifecycle states. Transient states (`Connecting`, `Reading`, `Writing`,
/// `Syncing`, `Erasing`, `Disconnecting`) are never observable once an
/// operation has returned; every operation restores `Ready`/`Active`/`Stop`
/// before handing control back, success or failure alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stop,
    Active,
    Connecting,
    Ready,
    Reading,
    Writing,
    Syncing,
    Erasing,
    Disconnecting,
}

/// Explicit configuration chosen at `start()`, replacing what the original
/// driver gated behind compile-time preprocessor switches.
#[derive(Debug, Clone, Copy)]
pub struct SdmmcConfig {
    /// Data bus width to negotiate; 8-bit is only honored for MMC.
    pub bus_width: BusWidth,
    /// If false, a card that fails the SDv2 probe is treated as SDv1.1
    /// rather than being probed further as MMC.
    pub mmc_support: bool,
    /// Maximum OCR-polling iterations during the operating-conditions
    /// handshake, each spaced 10 ms apart.
    pub init_retry: u32,
    /// When set, transfer-state polling sleeps 1 ms per iteration instead
    /// of busy-spinning.
    pub nice_waiting: bool,
    /// Non-zero RCA the host assigns to SD cards (ignored for MMC, which
    /// reports its own).
    pub sd_rca: u16,
}

impl SdmmcConfig {
    /// A reasonable default: 4-bit bus, MMC probing enabled, 1000 init
    /// retries (10 s worst case), nice waiting on.
    pub const fn new() -> Self {
        Self {
            bus_width: BusWidth::Four,
            mmc_support: true,
            init_retry: 1000,
            nice_waiting: true,
            sd_rca: 1,
        }
    }
}

impl Default for SdmmcConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn sdmmc_to_block_error(e: SdmmcError) -> BlockDeviceError {
    match e {
        SdmmcError::Overflow => BlockDeviceError::InvalidAddress,
        SdmmcError::CrcOrResponse => BlockDeviceError::DataError,
        SdmmcError::InitTimeout => BlockDeviceError::Timeout,
        SdmmcError::CapacityZero => BlockDeviceError::Other,
        SdmmcError::TransferWait => BlockDeviceError::Timeout,
        SdmmcError::Lld => BlockDeviceError::IoError,
    }
}

/// An SD/MMC block device, generic over its low-level bus driver and
/// interrupt-masking primitive.
///
/// One instance per physical controller. Not reentrant: the caller must
/// ensure at most one thread invokes operations on a given instance at a
/// time; distinct instances are independent.
pub struct Driver<L: Lld, S: Sleep, I: IrqControl> {
    lld: SpinLock<L>,
    sleep: S,
    state: IrqSpinLock<State, I>,
    errors: IrqSpinLock<SdmmcErrors, I>,
    config: Option<SdmmcConfig>,
    cardmode: CardMode,
    rca: u16,
    cid: Cid,
    csd: Csd,
    capacity: u64,
    ext_csd_revision: u8,
    lifetime_est_a: u8,
    lifetime_est_b: u8,
}

impl<L: Lld, S: Sleep, I: IrqControl> Driver<L, S, I> {
    /// Construct a driver in the `STOP` state. Allocation-free: safe to use
    /// as a `static` on embedded targets.
    pub const fn new(lld: L, sleep: S) -> Self {
        Self {
            lld: SpinLock::new(lld),
            sleep,
            state: IrqSpinLock::new(State::Stop),
            errors: IrqSpinLock::new(SdmmcErrors::empty()),
            config: None,
            cardmode: CardMode::empty(),
            rca: 0,
            cid: Cid::default(),
            csd: Csd::default(),
            capacity: 0,
            ext_csd_revision: 0,
            lifetime_est_a: 0,
            lifetime_est_b: 0,
        }
    }

    fn state(&self) -> State {
        *self.state.lock()
    }

    fn set_state(&self, s: State) {
        *self.state.lock() = s;
    }

    fn raise_error(&self, e: SdmmcError) {
        *self.errors.lock() |= e.as_flag();
    }

    /// Power/clock the peripheral on. Idempotent if already `ACTIVE`.
    pub fn start(&mut self, cfg: SdmmcConfig) -> Result<(), SdmmcError> {
        let cur = self.state();
        debug_assert!(
            matches!(cur, State::Stop | State::Active),
            "sdmmc: start() from illegal state {:?}",
            cur
        );
        if cur == State::Active {
            return Ok(());
        }
        self.lld.lock().start().map_err(|_| SdmmcError::Lld)?;
        self.config = Some(cfg);
        self.set_state(State::Active);
        Ok(())
    }

    /// Power the peripheral down. The caller must `disconnect` first;
    /// calling `stop` while `READY` is a contract violation.
    pub fn stop(&mut self) -> Result<(), SdmmcError> {
        let cur = self.state();
        debug_assert!(
            matches!(cur, State::Stop | State::Active),
            "sdmmc: stop() while {:?} is a contract violation",
            cur
        );
        if cur == State::Stop {
            return Ok(());
        }
        self.lld.lock().stop().map_err(|_| SdmmcError::Lld)?;
        self.set_state(State::Stop);
        Ok(())
    }

    /// Run the connection engine (see [`connect::connect`]). On failure the
    /// card clock is stopped and the driver falls back to `ACTIVE`.
    pub fn connect(&mut self) -> Result<(), SdmmcError> {
        let cur = self.state();
        debug_assert!(
            matches!(cur, State::Active | State::Ready),
            "sdmmc: connect() from illegal state {:?}",
            cur
        );
        self.set_state(State::Connecting);

        let config = self.config.unwrap_or_default();
        let mut lld = self.lld.lock();
        match connect::connect(&mut *lld, &self.sleep, &config) {
            Ok(outcome) => {
                drop(lld);
                self.cardmode = outcome.cardmode;
                self.rca = outcome.rca;
                self.cid = outcome.cid;
                self.csd = outcome.csd;
                self.capacity = outcome.capacity;
                self.ext_csd_revision = outcome.ext_csd_revision;
                self.lifetime_est_a = outcome.lifetime_est_a;
                self.lifetime_est_b = outcome.lifetime_est_b;
                self.set_state(State::Ready);
                Ok(())
            }
            Err(e) => {
                let _ = lld.stop_clk();
                drop(lld);
                self.raise_error(e);
                self.set_state(State::Active);
                Err(e)
            }
        }
    }

    /// `ACTIVE` returns immediately; `READY` waits for `TRAN`, stops the
    /// card clock, and falls back to `ACTIVE` regardless of whether the
    /// wait succeeded.
    pub fn disconnect(&mut self) -> Result<(), SdmmcError> {
        let cur = self.state();
        match cur {
            State::Active => Ok(()),
            State::Ready => {
                self.set_state(State::Disconnecting);
                let rca_shift = self.rca_shift();
                let nice_waiting = self.config.unwrap_or_default().nice_waiting;
                let mut lld = self.lld.lock();
                let wait_result =
                    wait_for_transfer_state(&mut *lld, &self.sleep, self.rca, rca_shift, nice_waiting);
                let _ = lld.stop_clk();
                drop(lld);
                self.set_state(State::Active);
                if let Err(e) = wait_result {
                    self.raise_error(e);
                    Err(e)
                } else {
                    Ok(())
                }
            }
            other => {
                debug_assert!(false, "sdmmc: disconnect() from illegal state {:?}", other);
                Ok(())
            }
        }
    }

    fn rca_shift(&self) -> u32 {
        if self.cardmode.contains(CardMode::MMC) {
            0
        } else {
            16
        }
    }

    /// Read `n` contiguous 512-byte blocks into `buf`. Range violations set
    /// `OVERFLOW` and fail without any bus traffic.
    pub fn read(&self, startblk: u64, buf: &mut [u8], n: usize) -> Result<(), SdmmcError> {
        let cur = self.state();
        debug_assert!(
            cur == State::Ready,
            "sdmmc: read() requires READY, got {:?}",
            cur
        );
        if n == 0 || startblk + n as u64 > self.capacity {
            self.raise_error(SdmmcError::Overflow);
            return Err(SdmmcError::Overflow);
        }
        self.set_state(State::Reading);
        let result = self
            .lld
            .lock()
            .read_blocks(startblk, buf, n)
            .map_err(|_| SdmmcError::Lld);
        self.set_state(State::Ready);
        if let Err(e) = result {
            self.raise_error(e);
        }
        result
    }

    /// Write `n` contiguous 512-byte blocks from `buf`. Range violations set
    /// `OVERFLOW` and fail without any bus traffic.
    pub fn write(&mut self, startblk: u64, buf: &[u8], n: usize) -> Result<(), SdmmcError> {
        let cur = self.state();
        debug_assert!(
            cur == State::Ready,
            "sdmmc: write() requires READY, got {:?}",
            cur
        );
        if n == 0 || startblk + n as u64 > self.capacity {
            self.raise_error(SdmmcError::Overflow);
            return Err(SdmmcError::Overflow);
        }
        self.set_state(State::Writing);
        let result = self
            .lld
            .lock()
            .write_blocks(startblk, buf, n)
            .map_err(|_| SdmmcError::Lld);
        self.set_state(State::Ready);
        if let Err(e) = result {
            self.raise_error(e);
        }
        result
    }

    /// Block until the card leaves programming state; the upper-layer
    /// flush point. Writes are durable only after this returns `Ok`.
    pub fn sync(&mut self) -> Result<(), SdmmcError> {
        let cur = self.state();
        debug_assert!(
            cur == State::Ready,
            "sdmmc: sync() requires READY, got {:?}",
            cur
        );
        self.set_state(State::Syncing);
        let result = self.lld.lock().sync().map_err(|_| SdmmcError::Lld);
        self.set_state(State::Ready);
        if let Err(e) = result {
            self.raise_error(e);
        }
        result
    }

    /// `{ blk_num = capacity, blk_size = 512 }`.
    pub fn get_info(&self) -> BlockDeviceInfo {
        let cur = self.state();
        debug_assert!(
            cur == State::Ready,
            "sdmmc: get_info() requires READY, got {:?}",
            cur
        );
        BlockDeviceInfo::new(self.capacity).removable()
    }

    /// Erase `[startblk, endblk]`. Non-high-capacity cards are addressed in
    /// bytes (scaled by 512); high-capacity cards use block addresses
    /// directly.
    pub fn erase(&mut self, startblk: u64, endblk: u64) -> Result<(), SdmmcError> {
        let cur = self.state();
        debug_assert!(
            cur == State::Ready,
            "sdmmc: erase() requires READY, got {:?}",
            cur
        );
        let rca_shift = self.rca_shift();
        let hc = self.cardmode.contains(CardMode::HIGH_CAPACITY);
        let nice_waiting = self.config.unwrap_or_default().nice_waiting;
        let (start_arg, end_arg) = if hc {
            (startblk, endblk)
        } else {
            (startblk * 512, endblk * 512)
        };

        self.set_state(State::Erasing);
        let mut lld = self.lld.lock();
        let result = (|| -> Result<(), SdmmcError> {
            wait_for_transfer_state(&mut *lld, &self.sleep, self.rca, rca_shift, nice_waiting)?;
            check_r1_word(
                lld.send_cmd_short_crc(proto::CMD32, start_arg as u32)
                    .map_err(|_| SdmmcError::Lld)?,
            )?;
            check_r1_word(
                lld.send_cmd_short_crc(proto::CMD33, end_arg as u32)
                    .map_err(|_| SdmmcError::Lld)?,
            )?;
            check_r1_word(
                lld.send_cmd_short_crc(proto::CMD38, 0)
                    .map_err(|_| SdmmcError::Lld)?,
            )?;
            wait_for_transfer_state(&mut *lld, &self.sleep, self.rca, rca_shift, nice_waiting)
        })();
        drop(lld);
        self.set_state(State::Ready);
        if let Err(e) = result {
            self.raise_error(e);
        }
        result
    }

    /// Atomically snapshot and clear the sticky error bitset.
    pub fn get_and_clear_errors(&self) -> SdmmcErrors {
        let cur = self.state();
        debug_assert!(
            cur == State::Ready,
            "sdmmc: get_and_clear_errors() requires READY, got {:?}",
            cur
        );
        let mut errors = self.errors.lock();
        let snapshot = *errors;
        *errors = SdmmcErrors::empty();
        snapshot
    }

    pub fn is_card_inserted(&self) -> bool {
        self.lld.lock().is_card_inserted()
    }

    pub fn is_write_protected(&self) -> bool {
        self.lld.lock().is_write_protected()
    }
}

#[cfg(test)]
impl<L: Lld, S: Sleep, I: IrqControl> Driver<L, S, I> {
    /// Test-only: the lifecycle state, including transient values. Not part
    /// of the public facade; production callers only ever observe `state()`
    /// indirectly through `is_ready()`.
    pub(crate) fn test_state(&self) -> State {
        self.state()
    }

    pub(crate) fn test_cardmode(&self) -> CardMode {
        self.cardmode
    }

    pub(crate) fn test_ext_csd_revision(&self) -> u8 {
        self.ext_csd_revision
    }

    pub(crate) fn test_lifetime_estimates(&self) -> (u8, u8) {
        (self.lifetime_est_a, self.lifetime_est_b)
    }
}

fn check_r1_word(word: u32) -> Result<(), SdmmcError> {
    if R1(word).is_error() {
        Err(SdmmcError::CrcOrResponse)
    } else {
        Ok(())
    }
}

impl<L: Lld + Send, S: Sleep + Send + Sync, I: IrqControl> BlockDevice for Driver<L, S, I> {
    fn info(&self) -> BlockDeviceInfo {
        self.get_info()
    }

    fn read_blocks(
        &self,
        start_block: u64,
        buffers: &mut [&mut [u8]],
    ) -> Result<(), BlockDeviceError> {
        for (i, buf) in buffers.iter_mut().enumerate() {
            self.read(start_block + i as u64, buf, 1)
                .map_err(sdmmc_to_block_error)?;
        }
        Ok(())
    }

    fn write_blocks(
        &mut self,
        start_block: u64,
        buffers: &[&[u8]],
    ) -> Result<(), BlockDeviceError> {
        for (i, buf) in buffers.iter().enumerate() {
            self.write(start_block + i as u64, buf, 1)
                .map_err(sdmmc_to_block_error)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BlockDeviceError> {
        self.sync().map_err(sdmmc_to_block_error)
    }

    fn is_ready(&self) -> bool {
        self.state() == State::Ready
    }
}

impl<L: Lld + Send, S: Sleep + Send + Sync, I: IrqControl> IdentifiableBlockDevice for Driver<L, S, I> {
    fn cid(&self) -> Option<&Cid> {
        Some(&self.cid)
    }

    fn csd(&self) -> Option<&Csd> {
        Some(&self.csd)
    }
}
