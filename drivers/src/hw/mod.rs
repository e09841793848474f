//! Device register maps.
//!
//! Exactly one device is selected through Cargo features and re-exported as
//! [`device`]. Peripheral drivers are generic; this layer binds them to
//! concrete addresses.

cfg_if::cfg_if! {
    if #[cfg(feature = "atmega328p")] {
        pub mod m328p;
        pub use m328p as device;
    } else {
        compile_error!(
            "No device selected!\n\
            Use: cargo build --features atmega328p"
        );
    }
}
