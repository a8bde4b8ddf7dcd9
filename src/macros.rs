// Internal diagnostics, logged under the crate's own target.
#[macro_export]
#[doc(hidden)]
macro_rules! report_debug {
    ($($arg:tt)*) => {
        ::log::debug!(target: "severity_report", $($arg)*)
    };
}
