//! AVR core registers and interrupt masking.
//!
//! On AVR builds the global interrupt flag is switched with the `cli` and
//! `sei` instructions. Elsewhere the same operations act on a simulated
//! status register so driver code builds and runs on the host.

mod sreg;

pub use sreg::{GlobalInterrupt, StatusFlags};

cfg_if::cfg_if! {
    if #[cfg(target_arch = "avr")] {
        mod cpu;

        pub use cpu::{CpuInterrupt, cli, sei};

        crate::register! {
            /// CPU status register (I/O 0x3F, data space 0x5F).
            pub Sreg: u8 @ 0x5F;
        }

        /// Interrupt masking for this target.
        pub type AvrIrq = CpuInterrupt;
    } else {
        use core::sync::atomic::{Ordering, compiler_fence};

        use crate::reg::Bit;

        crate::register! {
            /// Stand-in for the CPU status register on non-AVR builds.
            pub Sreg: u8 = 0;
        }

        /// Interrupt masking for this target.
        pub type AvrIrq = GlobalInterrupt<Sreg>;

        /// Clear the simulated global interrupt flag.
        #[inline(always)]
        pub fn cli() {
            Bit::<Sreg, 7>::clear();
            compiler_fence(Ordering::SeqCst);
        }

        /// Set the simulated global interrupt flag.
        ///
        /// # Safety
        ///
        /// See [`crate::interrupt::enable`].
        #[inline(always)]
        pub unsafe fn sei() {
            compiler_fence(Ordering::SeqCst);
            Bit::<Sreg, 7>::set();
        }
    }
}
