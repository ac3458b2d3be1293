//! Logging shim
//!
//! Library code logs through the crate-internal `trace!` / `debug!` /
//! `info!` / `warning!` / `error!` macros, which route to:
//! - `defmt` when the `defmt` feature is enabled (hardware, RTT transport)
//! - `tracing` when the `tracing` feature is enabled (host builds and tests)
//! - nothing otherwise (arguments are still type-checked)
//!
//! Format strings must stay in the subset both backends understand: plain
//! `{}` placeholders over values implementing both `Display` and
//! `defmt::Format`.

macro_rules! __log {
    ($defmt:ident, $tracing:ident, $($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$defmt!($($arg)*);

        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        ::tracing::$tracing!($($arg)*);

        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    }};
}

macro_rules! trace {
    ($($arg:tt)*) => { $crate::log::__log!(trace, trace, $($arg)*) };
}

macro_rules! debug {
    ($($arg:tt)*) => { $crate::log::__log!(debug, debug, $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { $crate::log::__log!(info, info, $($arg)*) };
}

// Not `warn`: a macro of that name is ambiguous with the built-in attribute
// when re-exported.
macro_rules! warning {
    ($($arg:tt)*) => { $crate::log::__log!(warn, warn, $($arg)*) };
}

macro_rules! error {
    ($($arg:tt)*) => { $crate::log::__log!(error, error, $($arg)*) };
}

pub(crate) use {__log, debug, error, info, trace, warning};
