use std::fmt::Write as _;

/// Bounded formatted write. Returns the length of the *untruncated*
/// output (which may exceed `cap - 1`); `dst` receives at most
/// `cap.saturating_sub(1)` bytes of the formatted text.
///
/// There is no libc `vsnprintf` to delegate to here, so this builds the
/// full string with `std::fmt::Write` and then truncates — acceptable
/// for the header/command strings this is used for, which are well
/// under the relevant size limits in practice.
pub fn bounded_write(dst: &mut String, cap: usize, args: std::fmt::Arguments<'_>) -> usize {
    let mut full = String::new();
    // `write_fmt` only fails on an allocation failure, which we cannot
    // meaningfully recover from here either.
    let _ = full.write_fmt(args);
    let full_len = full.len();
    if cap == 0 {
        dst.clear();
        return full_len;
    }
    let limit = cap - 1;
    let mut take = full.len().min(limit);
    while take > 0 && !full.is_char_boundary(take) {
        take -= 1;
    }
    dst.clear();
    dst.push_str(&full[..take]);
    full_len
}

#[macro_export]
macro_rules! bounded_format {
    ($dst:expr, $cap:expr, $($arg:tt)*) => {
        $crate::fmt::bounded_write($dst, $cap, format_args!($($arg)*))
    };
}
