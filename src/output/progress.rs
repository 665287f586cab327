use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{failure, ok, warning};

/// Spinner on stderr around one remote operation.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
            pb.set_style(style);
        }
        pb.set_message(warning(message.into()).to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self, message: impl Into<String>) {
        self.pb
            .finish_with_message(ok(format!("{} ✓", message.into())).to_string());
    }

    pub fn fail(self, message: impl Into<String>) {
        self.pb
            .abandon_with_message(failure(format!("{} ✗", message.into())).to_string());
    }
}
