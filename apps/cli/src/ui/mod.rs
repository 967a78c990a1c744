use indicatif::MultiProgress;
use std::sync::OnceLock;

pub mod components;
pub mod theme;

pub use theme::{Icon, Theme};

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

pub fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(MultiProgress::new)
}

/// Prints above any active spinners; plain stdout when output is not a
/// terminal, where indicatif would drop the line.
pub fn println(message: impl AsRef<str>) {
    let progress = multi_progress();
    if progress.is_hidden() || progress.println(message.as_ref()).is_err() {
        println!("{}", message.as_ref());
    }
}
