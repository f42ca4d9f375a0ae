use colored::Colorize;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, warn};

/// What a Ctrl-C does at the moment it arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    /// Ask the running batch to stop after the current package.
    StopBatch,
    /// Leave right away.
    Exit,
}

/// Routes Ctrl-C to a resolver's interrupt flag while a batch runs.
///
/// The first Ctrl-C during the batch raises the flag; a second one, or any
/// Ctrl-C once [`InterruptWatcher::finish`] was called, ends the process.
pub struct InterruptWatcher {
    batch_running: Arc<AtomicBool>,
}

impl InterruptWatcher {
    pub fn install(interrupted: Arc<AtomicBool>) -> Self {
        let batch_running = Arc::new(AtomicBool::new(true));
        let watching = Arc::clone(&batch_running);

        let spawned = thread::Builder::new()
            .name("ctrl-c".to_string())
            .spawn(move || watch(&watching, &interrupted));

        if let Err(e) = spawned {
            warn!("Ctrl-C handling unavailable: {}", e);
        }

        Self { batch_running }
    }

    /// The batch is over; Ctrl-C goes back to ending the process.
    pub fn finish(&self) {
        self.batch_running.store(false, Ordering::SeqCst);
    }
}

fn watch(batch_running: &AtomicBool, interrupted: &AtomicBool) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!("Ctrl-C handling unavailable: {}", e);
            return;
        }
    };

    runtime.block_on(async {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                return;
            }

            match on_signal(batch_running, interrupted) {
                SignalAction::StopBatch => {
                    debug!("Interrupt requested");
                    println!(
                        "\n{}",
                        "Stopping after the current package (Ctrl-C again to quit now)".yellow()
                    );
                }
                SignalAction::Exit => {
                    println!("\n{}", "Upgrade interrupted.".red());
                    process::exit(130);
                }
            }
        }
    });
}

fn on_signal(batch_running: &AtomicBool, interrupted: &AtomicBool) -> SignalAction {
    if batch_running.load(Ordering::SeqCst) && !interrupted.swap(true, Ordering::SeqCst) {
        SignalAction::StopBatch
    } else {
        SignalAction::Exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_during_batch_raises_the_flag() {
        let running = AtomicBool::new(true);
        let interrupted = AtomicBool::new(false);

        assert_eq!(on_signal(&running, &interrupted), SignalAction::StopBatch);
        assert!(interrupted.load(Ordering::SeqCst));
    }

    #[test]
    fn second_signal_exits() {
        let running = AtomicBool::new(true);
        let interrupted = AtomicBool::new(false);

        on_signal(&running, &interrupted);
        assert_eq!(on_signal(&running, &interrupted), SignalAction::Exit);
    }

    #[test]
    fn signal_after_the_batch_exits() {
        let running = AtomicBool::new(false);
        let interrupted = AtomicBool::new(false);

        assert_eq!(on_signal(&running, &interrupted), SignalAction::Exit);
        assert!(!interrupted.load(Ordering::SeqCst));
    }

    #[test]
    fn finish_hands_ctrl_c_back() {
        let watcher = InterruptWatcher {
            batch_running: Arc::new(AtomicBool::new(true)),
        };
        watcher.finish();
        assert!(!watcher.batch_running.load(Ordering::SeqCst));
    }
}
