use indicatif::ProgressBar;
use std::time::Duration;

/// Spinner shown on interactive terminals while a fetch is in flight
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stderr().is_term() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
