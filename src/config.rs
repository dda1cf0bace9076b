/// Diagnostic switches for a status call. All default to off.
///
/// `disable_skip_dir` turns off the ignored-directory skip in the
/// untracked classifier; it must never change the result, only the
/// amount of work done, so flipping it is a useful bisection tool.
/// Diagnostics are written to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugOptions {
    /// Print per-phase wall-clock timings.
    pub profile_timings: bool,
    /// Print every path excluded by an ignore rule.
    pub log_ignored: bool,
    /// Print the slice handed to each worker.
    pub log_slicing: bool,
    /// Print skip-dir jumps as they happen.
    pub log_skip_dir: bool,
    /// Process ignored directories entry by entry instead of skipping.
    pub disable_skip_dir: bool,
}
