//! Terminal progress presenter.
//!
//! A stateless view over [`ProgressSnapshot`]: file identity, human-readable
//! size, a proportional bar, and "N of M files processed" when counts are
//! present. All business logic stays in the orchestrator.

use indicatif::{ProgressBar, ProgressStyle};

use corpora_client::ProgressSnapshot;

#[derive(Clone)]
pub struct ProgressPresenter {
    bar: ProgressBar,
}

impl ProgressPresenter {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{msg:<48} {bar:40.green/blue} {pos:>3}%")?
            .progress_chars("██ ");
        bar.set_style(style);
        Ok(Self { bar })
    }

    pub fn render(&self, snapshot: &ProgressSnapshot) {
        self.bar.set_position(snapshot.percent.round() as u64);
        let counts = match (snapshot.completed, snapshot.total) {
            (Some(completed), Some(total)) => {
                format!(" ({} of {} files processed)", completed, total)
            }
            _ => String::new(),
        };
        self.bar.set_message(format!(
            "{} {}{}",
            snapshot.filename, snapshot.size_label, counts
        ));
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
