//! Scripted-LLD end-to-end tests for the connection engine and facade,
//! covering the scenarios from the component design: SDv2 HC, SDv1.1, MMC
//! HC, init timeout, range violation, and non-HC erase addressing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use common::sync::irq::IrqControl;

use crate::hal::block_device::Csd;

use super::connect::CardMode;
use super::driver::{Driver, SdmmcConfig, State};
use super::error::SdmmcError;
use super::lld::{Lld, LongResponse, Sleep};
use super::proto::{
    BusWidth, ACMD41, ACMD6, CMD1, CMD13, CMD2, CMD3, CMD32, CMD33, CMD38, CMD55, CMD6, CMD7,
    CMD8, CMD9, CMD16, OCR_SDV1_MASK, OCR_SDV2_MASK,
};

/// No-op interrupt control: the driver's critical sections are harmless
/// single-threaded no-ops under the test harness.
struct TestIrq;

impl IrqControl for TestIrq {
    type State = ();
    fn disable() -> Self::State {}
    fn restore(_state: Self::State) {}
}

/// Sleep capability that returns immediately; `INIT_RETRY` loops stay fast
/// under test rather than actually backing off.
struct NoSleep;

impl Sleep for NoSleep {
    fn sleep_ms(&self, _ms: u32) {}
}

const STATUS_TRAN: u32 = 4 << 9;

/// Converts the big-endian 16-byte register layout back into the four
/// 32-bit words an `Lld` hands back from a long-response command, the
/// inverse of `connect::long_response_to_be_bytes`.
fn raw_to_long(raw: [u8; 16]) -> LongResponse {
    let v = u128::from_be_bytes(raw);
    [v as u32, (v >> 32) as u32, (v >> 64) as u32, (v >> 96) as u32]
}

/// A CSD v2.0 (SDHC-style) register encoding a given `C_SIZE`.
fn csd_raw_v2(c_size: u32) -> [u8; 16] {
    let mut raw = [0u8; 16];
    raw[0] = 0b0100_0000; // CSD_STRUCTURE = 1 (version 2.0)
    raw[7] = ((c_size >> 16) & 0x3F) as u8;
    raw[8] = ((c_size >> 8) & 0xFF) as u8;
    raw[9] = (c_size & 0xFF) as u8;
    raw
}

fn arbitrary_cid() -> [u8; 16] {
    let mut raw = [0u8; 16];
    raw[0] = 0x03; // manufacturer id
    raw[1] = b'T';
    raw[2] = b'S';
    raw[3..8].copy_from_slice(b"CARD1");
    raw
}

#[derive(Default)]
struct CallLog {
    none: Vec<(u32, u32)>,
    short: Vec<(u32, u32)>,
    short_crc: Vec<(u32, u32)>,
    long_crc: Vec<(u32, u32)>,
    reads: Vec<(u64, usize)>,
    writes: Vec<(u64, usize)>,
}

/// Shared, interior-mutable script + call log. Kept behind an `Rc` so the
/// test can retain a handle after the `MockLld` wrapper is moved into the
/// `Driver`.
struct MockState {
    log: RefCell<CallLog>,

    cmd8_ok: bool,
    cmd8_response: u32,
    cmd55_ok: bool,
    is_mmc: bool,

    acmd41_ready_at: u32,
    acmd41_final_resp: u32,
    acmd41_attempt: Cell<u32>,

    cmd1_ready_at: u32,
    cmd1_final_resp: u32,
    cmd1_attempt: Cell<u32>,

    cid_raw: [u8; 16],
    csd_raw: [u8; 16],
    mmc_rca_resp: u32,
    mmc_switch_is_error: bool,

    ext_csd: RefCell<[u8; 512]>,

    high_capacity: Cell<bool>,
    bus_mode: Cell<Option<BusWidth>>,
    stop_clk_calls: Cell<u32>,
    card_inserted: bool,
    write_protected: bool,
}

impl MockState {
    fn sd(cmd8_ok: bool, cmd8_response: u32, cmd55_ok: bool) -> Self {
        Self {
            log: RefCell::new(CallLog::default()),
            cmd8_ok,
            cmd8_response,
            cmd55_ok,
            is_mmc: false,
            acmd41_ready_at: 1,
            acmd41_final_resp: 0,
            acmd41_attempt: Cell::new(0),
            cmd1_ready_at: 1,
            cmd1_final_resp: 0,
            cmd1_attempt: Cell::new(0),
            cid_raw: arbitrary_cid(),
            csd_raw: csd_raw_v2(128),
            mmc_rca_resp: 0,
            mmc_switch_is_error: false,
            ext_csd: RefCell::new([0u8; 512]),
            high_capacity: Cell::new(false),
            bus_mode: Cell::new(None),
            stop_clk_calls: Cell::new(0),
            card_inserted: true,
            write_protected: false,
        }
    }

    fn mmc() -> Self {
        let mut s = Self::sd(false, 0, false);
        s.is_mmc = true;
        s.mmc_rca_resp = 0x1234_0000;
        s
    }
}

struct MockLld(Rc<MockState>);

impl Lld for MockLld {
    type Error = ();

    fn start(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn start_clk(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn stop_clk(&mut self) -> Result<(), ()> {
        self.0.stop_clk_calls.set(self.0.stop_clk_calls.get() + 1);
        Ok(())
    }

    fn set_data_clk(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn set_bus_mode(&mut self, width: BusWidth) -> Result<(), ()> {
        self.0.bus_mode.set(Some(width));
        Ok(())
    }

    fn set_high_capacity(&mut self, high_capacity: bool) {
        self.0.high_capacity.set(high_capacity);
    }

    fn send_cmd_none(&mut self, cmd: u32, arg: u32) -> Result<(), ()> {
        self.0.log.borrow_mut().none.push((cmd, arg));
        Ok(())
    }

    fn send_cmd_short(&mut self, cmd: u32, arg: u32) -> Result<u32, ()> {
        self.0.log.borrow_mut().short.push((cmd, arg));
        match cmd {
            ACMD41 => {
                let n = self.0.acmd41_attempt.get() + 1;
                self.0.acmd41_attempt.set(n);
                if n >= self.0.acmd41_ready_at {
                    Ok(self.0.acmd41_final_resp)
                } else {
                    Ok(0x00FF_8000)
                }
            }
            CMD1 => {
                let n = self.0.cmd1_attempt.get() + 1;
                self.0.cmd1_attempt.set(n);
                if n >= self.0.cmd1_ready_at {
                    Ok(self.0.cmd1_final_resp)
                } else {
                    Ok(0x00FF_8000)
                }
            }
            ACMD6 => Ok(0),
            _ => Ok(0),
        }
    }

    fn send_cmd_short_crc(&mut self, cmd: u32, arg: u32) -> Result<u32, ()> {
        self.0.log.borrow_mut().short_crc.push((cmd, arg));
        match cmd {
            CMD8 => {
                if self.0.cmd8_ok {
                    Ok(self.0.cmd8_response)
                } else {
                    Err(())
                }
            }
            CMD55 => {
                if self.0.cmd55_ok {
                    Ok(0)
                } else {
                    Err(())
                }
            }
            CMD3 => {
                if self.0.is_mmc {
                    Ok(self.0.mmc_rca_resp)
                } else {
                    Ok(0)
                }
            }
            CMD7 | CMD16 => Ok(0),
            CMD6 => {
                if self.0.mmc_switch_is_error {
                    Ok(1 << 7) // SWITCH_ERROR bit, informational on MMC
                } else {
                    Ok(0)
                }
            }
            CMD13 => Ok(STATUS_TRAN),
            CMD32 | CMD33 | CMD38 => Ok(0),
            _ => Ok(0),
        }
    }

    fn send_cmd_long_crc(&mut self, cmd: u32, arg: u32) -> Result<LongResponse, ()> {
        self.0.log.borrow_mut().long_crc.push((cmd, arg));
        match cmd {
            CMD2 => Ok(raw_to_long(self.0.cid_raw)),
            CMD9 => Ok(raw_to_long(self.0.csd_raw)),
            _ => Ok([0; 4]),
        }
    }

    fn read_blocks(&mut self, startblk: u64, buf: &mut [u8], n: usize) -> Result<(), ()> {
        self.0.log.borrow_mut().reads.push((startblk, n));
        for b in buf.iter_mut() {
            *b = 0;
        }
        Ok(())
    }

    fn write_blocks(&mut self, startblk: u64, _buf: &[u8], n: usize) -> Result<(), ()> {
        self.0.log.borrow_mut().writes.push((startblk, n));
        Ok(())
    }

    fn read_ext_csd(&mut self, buf: &mut [u8], offset: usize, len: usize) -> Result<(), ()> {
        buf[..len].copy_from_slice(&self.0.ext_csd.borrow()[offset..offset + len]);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn is_card_inserted(&self) -> bool {
        self.0.card_inserted
    }

    fn is_write_protected(&self) -> bool {
        self.0.write_protected
    }
}

type TestDriver = Driver<MockLld, NoSleep, TestIrq>;

fn make_driver(state: &Rc<MockState>) -> TestDriver {
    Driver::new(MockLld(Rc::clone(state)), NoSleep)
}

fn started(state: &Rc<MockState>, cfg: SdmmcConfig) -> TestDriver {
    let mut d = make_driver(state);
    d.start(cfg).expect("start must succeed from STOP");
    d
}

// ============================================================================
// Scenario 1: SDv2 happy path (HC)
// ============================================================================

#[test]
fn sdv2_hc_happy_path_reaches_ready() {
    let mut state = MockState::sd(true, 0x1AA, true);
    state.csd_raw = csd_raw_v2(4095);
    state.acmd41_ready_at = 3;
    state.acmd41_final_resp = 0xC0FF_8000;
    let state = Rc::new(state);

    let mut d = started(&state, SdmmcConfig::new());
    d.connect().expect("connect should succeed");

    assert_eq!(
        d.test_cardmode(),
        CardMode::SDV20 | CardMode::HIGH_CAPACITY
    );
    assert_eq!(d.test_state(), State::Ready);
    assert_eq!(state.bus_mode.get(), Some(BusWidth::Four));

    let expected_capacity = Csd::parse(&csd_raw_v2(4095)).unwrap().block_count();
    assert_eq!(d.get_info().block_count, expected_capacity);
    assert_eq!(d.get_info().block_size, 512);

    // ACMD41 was probed with the SDv2 (HCS) mask, not the SDv1.1 mask.
    let acmd41_calls: Vec<_> = state
        .log
        .borrow()
        .short
        .iter()
        .filter(|(cmd, _)| *cmd == ACMD41)
        .cloned()
        .collect();
    assert_eq!(acmd41_calls.len(), 3);
    assert!(acmd41_calls.iter().all(|(_, arg)| *arg == OCR_SDV2_MASK));
}

#[test]
fn cmd8_voltage_nibble_mismatch_fails_connect() {
    // CRC succeeds, so the card is SDv2.0-capable, but the echoed voltage
    // nibble (bits 8-11) reads back as 2 instead of the required 1. This
    // must hard-fail connect(), not fall through to being reclassified as
    // MMC/SDv1.1.
    let state = Rc::new(MockState::sd(true, 0x02AA, true));

    let mut d = started(&state, SdmmcConfig::new());
    let err = d
        .connect()
        .expect_err("voltage nibble mismatch must fail connect");
    assert_eq!(err, SdmmcError::CrcOrResponse);
    assert_eq!(d.test_state(), State::Active);

    // No APP_CMD probe and no MMC/SD1.1 operating-conditions handshake was
    // ever attempted; the failure is detected before either path is taken.
    assert!(state.log.borrow().short_crc.iter().all(|(cmd, _)| *cmd != CMD55));
}

// ============================================================================
// Scenario 2: SDv1.1 happy path
// ============================================================================

#[test]
fn sdv11_happy_path_uses_byte_addressing() {
    let mut state = MockState::sd(false, 0, true);
    state.acmd41_ready_at = 1;
    state.acmd41_final_resp = 0x80FF_8000; // ready, HCS clear
    let state = Rc::new(state);

    let mut d = started(&state, SdmmcConfig::new());
    d.connect().expect("connect should succeed");

    assert_eq!(d.test_cardmode(), CardMode::SDV11);

    let acmd41_calls: Vec<_> = state
        .log
        .borrow()
        .short
        .iter()
        .filter(|(cmd, _)| *cmd == ACMD41)
        .cloned()
        .collect();
    assert!(acmd41_calls.iter().all(|(_, arg)| *arg == OCR_SDV1_MASK));
}

#[test]
fn erase_on_non_hc_card_scales_addresses_by_block_size() {
    let mut state = MockState::sd(false, 0, true);
    state.acmd41_final_resp = 0x80FF_8000;
    let state = Rc::new(state);

    let mut d = started(&state, SdmmcConfig::new());
    d.connect().expect("connect should succeed");
    assert!(!d.test_cardmode().contains(CardMode::HIGH_CAPACITY));

    state.log.borrow_mut().short_crc.clear();
    d.erase(2, 5).expect("erase should succeed");

    let crc_log = state.log.borrow();
    let start = crc_log.short_crc.iter().find(|(cmd, _)| *cmd == CMD32);
    let end = crc_log.short_crc.iter().find(|(cmd, _)| *cmd == CMD33);
    assert_eq!(start, Some(&(CMD32, 2 * 512)));
    assert_eq!(end, Some(&(CMD33, 5 * 512)));
    assert!(crc_log.short_crc.iter().any(|(cmd, _)| *cmd == CMD38));

    // Waited for TRAN both before ERASE_WR_BLK_START and after ERASE.
    let tran_waits = crc_log.short_crc.iter().filter(|(cmd, _)| *cmd == CMD13).count();
    assert_eq!(tran_waits, 2);

    assert_eq!(d.test_state(), State::Ready);
}

// ============================================================================
// Scenario 3: MMC HC path
// ============================================================================

#[test]
fn mmc_hc_path_reads_capacity_from_ext_csd() {
    let mut state = MockState::mmc();
    state.cmd1_ready_at = 1;
    state.cmd1_final_resp = 0xC0FF_8000; // ready, HCS set
    {
        let mut ext = state.ext_csd.borrow_mut();
        ext[212..216].copy_from_slice(&4_000_000u32.to_le_bytes()); // SEC_COUNT
        ext[192] = 7; // EXT_CSD_REVISION
        ext[268] = 3; // DEV_LIFETIME_EST_TYP_A
        ext[269] = 4; // DEV_LIFETIME_EST_TYP_B
    }
    let state = Rc::new(state);

    let mut cfg = SdmmcConfig::new();
    cfg.bus_width = BusWidth::Four;
    let mut d = started(&state, cfg);
    d.connect().expect("connect should succeed");

    assert_eq!(d.test_cardmode(), CardMode::MMC | CardMode::HIGH_CAPACITY);
    assert_eq!(d.get_info().block_count, 4_000_000);
    assert_eq!(d.get_info().block_size, 512);
    assert_eq!(d.test_ext_csd_revision(), 7);
    assert_eq!(d.test_lifetime_estimates(), (3, 4));

    let switch_call = state
        .log
        .borrow()
        .short_crc
        .iter()
        .find(|(cmd, _)| *cmd == CMD6)
        .cloned();
    assert_eq!(switch_call, Some((CMD6, 0x03B7_0100)));
    assert_eq!(state.bus_mode.get(), Some(BusWidth::Four));
}

#[test]
fn mmc_ext_csd_auxiliary_reads_are_best_effort() {
    // Even if the EXT_CSD buffer never carries a non-zero revision/lifetime
    // byte, a successful auxiliary read just yields zero; it is the *read
    // failing* that is best-effort, not the value. This case covers the
    // "buffer happens to be all zero" path to keep the happy path honest.
    let mut state = MockState::mmc();
    state.cmd1_final_resp = 0xC0FF_8000;
    state.ext_csd.borrow_mut()[212..216].copy_from_slice(&10u32.to_le_bytes());
    let state = Rc::new(state);

    let mut d = started(&state, SdmmcConfig::new());
    d.connect().expect("connect should succeed");
    assert_eq!(d.test_ext_csd_revision(), 0);
    assert_eq!(d.test_lifetime_estimates(), (0, 0));
}

// ============================================================================
// Scenario 4: init timeout
// ============================================================================

#[test]
fn init_timeout_falls_back_to_active_and_stops_clock_once() {
    let mut state = MockState::sd(false, 0, true);
    state.acmd41_ready_at = u32::MAX; // never reports ready
    let state = Rc::new(state);

    let mut cfg = SdmmcConfig::new();
    cfg.init_retry = 5;
    let mut d = started(&state, cfg);

    let err = d.connect().expect_err("connect should time out");
    assert_eq!(err, SdmmcError::InitTimeout);
    assert_eq!(d.test_state(), State::Active);
    assert_eq!(state.stop_clk_calls.get(), 1);
}

// ============================================================================
// Scenario 5: range violation
// ============================================================================

#[test]
fn read_past_capacity_fails_without_bus_traffic_and_sets_overflow() {
    let mut state = MockState::sd(false, 0, true);
    state.acmd41_final_resp = 0x80FF_8000;
    let state = Rc::new(state);

    let mut d = started(&state, SdmmcConfig::new());
    d.connect().expect("connect should succeed");

    let capacity = d.get_info().block_count;
    let reads_before = state.log.borrow().reads.len();

    let mut buf = [0u8; 512 * 10];
    let err = d
        .read(capacity - 5, &mut buf, 10)
        .expect_err("range violation must fail");
    assert_eq!(err, SdmmcError::Overflow);
    assert_eq!(state.log.borrow().reads.len(), reads_before);

    let errors = d.get_and_clear_errors();
    assert!(errors.contains(super::error::SdmmcErrors::OVERFLOW));

    // get_and_clear_errors is idempotent on an already-zero set.
    assert!(d.get_and_clear_errors().is_empty());
}

#[test]
fn write_past_capacity_fails_without_bus_traffic() {
    let mut state = MockState::sd(false, 0, true);
    state.acmd41_final_resp = 0x80FF_8000;
    let state = Rc::new(state);

    let mut d = started(&state, SdmmcConfig::new());
    d.connect().expect("connect should succeed");

    let capacity = d.get_info().block_count;
    let writes_before = state.log.borrow().writes.len();

    let buf = [0u8; 512 * 4];
    let err = d
        .write(capacity, &buf, 4)
        .expect_err("range violation must fail");
    assert_eq!(err, SdmmcError::Overflow);
    assert_eq!(state.log.borrow().writes.len(), writes_before);
}

// ============================================================================
// Lifecycle / lifecycle-adjacent properties
// ============================================================================

#[test]
fn connect_failure_restores_active_and_disconnect_from_active_is_a_noop() {
    // CMD8 succeeds (SDv2-capable), but the mandatory APP_CMD probe that
    // confirms SD responsiveness fails outright.
    let state = Rc::new(MockState::sd(true, 0x1AA, false));

    let mut d = started(&state, SdmmcConfig::new());
    let err = d.connect().expect_err("a failed APP_CMD probe must fail connect");
    assert_eq!(err, SdmmcError::Lld);
    assert_eq!(d.test_state(), State::Active);

    // disconnect() while ACTIVE succeeds immediately, no further clock stop.
    let stops_before = state.stop_clk_calls.get();
    d.disconnect().expect("disconnect from ACTIVE is a no-op");
    assert_eq!(state.stop_clk_calls.get(), stops_before);
}

#[test]
fn disconnect_from_ready_waits_for_tran_then_returns_active() {
    let mut state = MockState::sd(false, 0, true);
    state.acmd41_final_resp = 0x80FF_8000;
    let state = Rc::new(state);

    let mut d = started(&state, SdmmcConfig::new());
    d.connect().expect("connect should succeed");
    assert_eq!(d.test_state(), State::Ready);

    d.disconnect().expect("disconnect should succeed");
    assert_eq!(d.test_state(), State::Active);
    assert!(state.stop_clk_calls.get() >= 1);
}

#[test]
fn start_is_idempotent_when_already_active() {
    let state = Rc::new(MockState::sd(false, 0, true));
    let mut d = started(&state, SdmmcConfig::new());
    d.start(SdmmcConfig::new()).expect("second start is a no-op");
    assert_eq!(d.test_state(), State::Active);
}
