pub mod irq;
pub use irq::ArmIrq;

pub mod bcm2835;
