//! Architecture-specific primitives, selected at compile time.
//!
//! Only ARM (the Raspberry Pi targets this workspace builds for) is
//! implemented; a host build (`cfg(test)`) still needs the module to exist
//! so `drivers`' unit tests can name `common::sync::irq::IrqControl`
//! implementors generically without pulling in inline ARM assembly.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm;
    } else {
        pub mod arm {
            //! Stand-in module when building off-target (e.g. `cargo test`
            //! on the host): the real `ArmIrq` uses inline ARM assembly and
            //! is only compiled for `target_arch = "arm"`.
            pub mod irq {}
            pub mod bcm2835 {
                pub mod irq {
                    pub const IRQ_SYSTEM_TIMER_0: u32 = 0;
                    pub const IRQ_SYSTEM_TIMER_1: u32 = 1;
                    pub const IRQ_SYSTEM_TIMER_2: u32 = 2;
                    pub const IRQ_SYSTEM_TIMER_3: u32 = 3;
                    pub const IRQ_AUX: u32 = 29;
                    pub const IRQ_UART0: u32 = 57;
                }
            }
        }
    }
}
