use indicatif::{ProgressBar, ProgressStyle};
use tgen_core::generator::Progress;

const TEMPLATE: &str = "{spinner:.green} [{bar:40.green/white}] {pos}/{len} {wide_msg}";

/// Shows generation progress as a terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// A hidden bar when `silent` is set.
    pub fn new(silent: bool) -> Self {
        let bar = if silent {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl Progress for BarProgress {
    fn planned(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn started(&self, _index: usize, _total: usize, group: &str, test: &str) {
        self.bar.set_message(format!("{} > {}", group, test));
    }

    fn warned(&self, group: &str, test: &str, warnings: &[String]) {
        self.bar.println(format!(
            "{} > {}: {} generator warning(s)",
            group,
            test,
            warnings.len()
        ));
    }

    fn finished(&self, _group: &str, _test: &str) {
        self.bar.inc(1);
    }
}
