//! Logging shims
//!
//! On target these forward to `defmt`. Host builds compile them to nothing,
//! so drivers can log freely without pulling a logger into the tests.

#[cfg(feature = "embedded")]
macro_rules! dev_trace {
    ($($arg:tt)*) => {
        defmt::trace!($($arg)*)
    };
}

#[cfg(not(feature = "embedded"))]
macro_rules! dev_trace {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

#[cfg(feature = "embedded")]
macro_rules! dev_debug {
    ($($arg:tt)*) => {
        defmt::debug!($($arg)*)
    };
}

#[cfg(not(feature = "embedded"))]
macro_rules! dev_debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

#[cfg(feature = "embedded")]
macro_rules! dev_info {
    ($($arg:tt)*) => {
        defmt::info!($($arg)*)
    };
}

#[cfg(not(feature = "embedded"))]
macro_rules! dev_info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

#[cfg(feature = "embedded")]
macro_rules! dev_warn {
    ($($arg:tt)*) => {
        defmt::warn!($($arg)*)
    };
}

#[cfg(not(feature = "embedded"))]
macro_rules! dev_warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}
