//! BCM2835 IRQ line numbers, as consumed by the interrupt controller and by
//! peripheral drivers that need to register a handler.

pub const IRQ_SYSTEM_TIMER_0: u32 = 0;
pub const IRQ_SYSTEM_TIMER_1: u32 = 1;
pub const IRQ_SYSTEM_TIMER_2: u32 = 2;
pub const IRQ_SYSTEM_TIMER_3: u32 = 3;

pub const IRQ_AUX: u32 = 29; // UART1 / SPI1
pub const IRQ_UART0: u32 = 57; // PL011
