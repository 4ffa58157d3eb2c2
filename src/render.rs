//! Terminal rendering of coordinator state.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::coordinator::Snapshot;

const BAR_WIDTH: usize = 30;
const STATUS: &str = "Generating your image...";

/// Render a fixed-width progress bar, e.g. `[#########---------]  50%`.
#[must_use]
pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!("[{}{}] {percent:>3}%", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// One status line for a snapshot; empty when idle.
#[must_use]
pub fn status_line(snapshot: &Snapshot) -> String {
    if snapshot.busy {
        format!("{} {STATUS}", progress_bar(snapshot.progress))
    } else {
        String::new()
    }
}

/// Redraw the status line on stderr until the coordinator goes away.
pub fn spawn_progress_view(mut rx: watch::Receiver<Snapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let blank = " ".repeat(BAR_WIDTH + STATUS.len() + 8);
        while rx.changed().await.is_ok() {
            let line = status_line(&rx.borrow_and_update());
            eprint!("\r{blank}\r{line}");
        }
        eprint!("\r{blank}\r");
    })
}
