use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use tokio::runtime::RuntimeFlavor;
use vaultlift_services::{Confirm, ProgressSink};

/// Longest progress label shown next to the bar.
const LABEL_WIDTH: usize = 40;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Renders batch progress as a terminal bar. Hidden when stderr is not a tty.
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ProgressSink for BarProgress {
    fn begin(&self, phase: &str, total: usize) {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{prefix:>8} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {msg}")
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_prefix(phase.to_string());
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn item_done(&self, label: &str, success: bool) {
        self.with_bar(|bar| {
            if !success {
                bar.println(format!("failed: {}", label));
            }
            bar.set_message(truncate_string(label, LABEL_WIDTH));
            bar.inc(1);
        });
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

/// Run blocking terminal I/O without stalling other tasks on a multi-thread
/// runtime. Elsewhere `f` simply runs inline.
pub fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Asks on the terminal before anything is removed. Defaults to "no".
pub struct PromptConfirm {
    move_to_trash: bool,
}

impl PromptConfirm {
    pub fn new(move_to_trash: bool) -> Self {
        Self { move_to_trash }
    }

    fn prompt(&self, count: usize) -> String {
        let action = if self.move_to_trash {
            "Move"
        } else {
            "Permanently delete"
        };
        let target = if self.move_to_trash { " to trash" } else { "" };
        format!("{} {} unused remote object(s){}?", action, count, target)
    }
}

impl Confirm for PromptConfirm {
    fn confirm(&self, unused: &[String]) -> bool {
        eprintln!("Unused remote objects:");
        for key in unused {
            eprintln!("  {}", key);
        }
        let prompt = self.prompt(unused.len());
        run_blocking(|| {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .unwrap_or(false)
        })
    }
}

/// Confirms every cleanup (`--yes`).
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, unused: &[String]) -> bool {
        tracing::info!(count = unused.len(), "Cleanup confirmed by --yes");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_exact() {
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_characters() {
        assert_eq!(truncate_string("café-photo.png", 7), "café...");
        assert_eq!(truncate_string("日本語.png", 7), "日本語.png");
    }

    #[test]
    fn prompt_names_the_action() {
        assert_eq!(
            PromptConfirm::new(true).prompt(3),
            "Move 3 unused remote object(s) to trash?"
        );
        assert_eq!(
            PromptConfirm::new(false).prompt(1),
            "Permanently delete 1 unused remote object(s)?"
        );
    }

    #[test]
    fn run_blocking_outside_a_runtime() {
        assert_eq!(run_blocking(|| 7), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_blocking_keeps_other_tasks_running() {
        let (tx, rx) = std::sync::mpsc::channel();
        let sender = tokio::spawn(async move {
            tx.send("from another task").unwrap();
        });
        let received = run_blocking(move || rx.recv_timeout(std::time::Duration::from_secs(5)));
        assert_eq!(received.unwrap(), "from another task");
        sender.await.unwrap();
    }

    #[tokio::test]
    async fn run_blocking_on_current_thread_runs_inline() {
        assert!(run_blocking(|| true));
    }

    #[test]
    fn auto_confirm_always_agrees() {
        assert!(AutoConfirm.confirm(&["a.png".to_string()]));
    }

    #[test]
    fn bar_progress_tolerates_events_without_begin() {
        let progress = BarProgress::new();
        progress.item_done("a.png", true);
        progress.finish();
        progress.begin("upload", 2);
        progress.item_done("a.png", true);
        progress.item_done("b.png", false);
        progress.finish();
        assert!(progress.bar.lock().unwrap().is_none());
    }
}
