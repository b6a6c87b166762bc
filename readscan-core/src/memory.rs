//! Process memory sampling for the end-of-run report.

///
/// Peak resident set size of this process in MB, as reported by `getrusage`.
/// Returns 0 where the call isn't available.
///
#[cfg(unix)]
pub fn used_memory_mb() -> u64 {
    let usage = unsafe {
        let mut usage = std::mem::MaybeUninit::<libc::rusage>::uninit();
        if libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) != 0 {
            return 0;
        }
        usage.assume_init()
    };
    let max_rss = usage.ru_maxrss.max(0) as u64;

    // kilobytes on Linux, bytes on macOS
    if cfg!(target_os = "macos") {
        max_rss / (1024 * 1024)
    } else {
        max_rss / 1024
    }
}

#[cfg(not(unix))]
pub fn used_memory_mb() -> u64 {
    0
}
