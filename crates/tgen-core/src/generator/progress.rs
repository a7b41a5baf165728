/// Observer for the progress of a generation run.
///
/// All methods default to doing nothing.
pub trait Progress {
    /// The number of admitted tests is known.
    fn planned(&self, _total: usize) {}

    /// Test number `index` (1-based) of `total` is about to be generated.
    fn started(&self, _index: usize, _total: usize, _group: &str, _test: &str) {}

    /// The generator warned about a test that still succeeded.
    fn warned(&self, _group: &str, _test: &str, _warnings: &[String]) {}

    /// A test was generated completely.
    fn finished(&self, _group: &str, _test: &str) {}
}

/// Ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
