//! Line-oriented terminal renderer.

use std::collections::HashMap;
use std::io::Write;

use parking_lot::Mutex;

use noticeboard_client::{Feedback, FeedbackLevel, NoticeStatus, NoticeView, Renderer};
use noticeboard_types::models::Notice;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// `#rrggbb` to a 24-bit foreground escape. Anything else gets no colour.
fn fg(hex: &str) -> String {
    let rgb = hex
        .strip_prefix('#')
        .filter(|h| h.len() == 6)
        .and_then(|h| u32::from_str_radix(h, 16).ok());
    match rgb {
        Some(v) => format!("\x1b[38;2;{};{};{}m", v >> 16, (v >> 8) & 0xff, v & 0xff),
        None => String::new(),
    }
}

fn notice_line(notice: &Notice, color: &str, confirmed_own: bool) -> String {
    let mark = if confirmed_own { " ✔" } else { "" };
    format!(
        "{}~{}{}: {}  {}{}{}{}",
        fg(color),
        notice.author,
        RESET,
        notice.content,
        DIM,
        notice.timestamp,
        RESET,
        mark
    )
}

/// Prints the feed as it grows. A terminal cannot redraw earlier lines, so
/// confirmations and retractions are printed as follow-up lines.
pub struct TerminalRenderer<W> {
    out: Mutex<W>,
    /// Own notices still waiting for the server, with their colour.
    pending: Mutex<HashMap<String, (Notice, &'static str)>>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            pending: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn line(&self, text: &str) {
        let mut out = self.out.lock();
        writeln!(out, "{}", text).and_then(|_| out.flush()).ok();
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn add_notice(&self, view: NoticeView<'_>) {
        let confirmed = view.status == NoticeStatus::Confirmed;
        if view.own && !confirmed {
            self.pending
                .lock()
                .insert(view.notice.id.clone(), (view.notice.clone(), view.color));
            let line = notice_line(view.notice, view.color, false);
            self.line(&format!("{} {}(sending){}", line, DIM, RESET));
            return;
        }
        self.line(&notice_line(view.notice, view.color, view.own && confirmed));
    }

    fn mark_confirmed(&self, id: &str) {
        if let Some((notice, color)) = self.pending.lock().remove(id) {
            self.line(&notice_line(&notice, color, true));
        }
    }

    fn remove_notice(&self, id: &str) {
        if let Some((notice, _)) = self.pending.lock().remove(id) {
            self.line(&format!(
                "{}(not posted) ~{}: {}{}",
                DIM, notice.author, notice.content, RESET
            ));
        }
    }

    fn set_input(&self, content: &str) {
        if !content.is_empty() {
            self.line(&format!("{}draft:{} {}", DIM, RESET, content));
        }
    }

    fn show_message(&self, feedback: &Feedback) {
        let tag = match feedback.level {
            FeedbackLevel::Info => "info",
            FeedbackLevel::Warning => "warning",
            FeedbackLevel::Error => "error",
        };
        self.line(&format!("[{}] {}", tag, feedback.text));
    }
}
