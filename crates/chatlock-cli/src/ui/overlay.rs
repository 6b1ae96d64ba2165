//! Terminal rendition of the gate and folder overlays.

use chatlock_core::{EntryKind, FolderItem, GateState, OverlayFrame, OverlayHost};

use super::context::UiContext;
use super::format::{format_locked_at, truncate};
use super::render::{badge, kv, simple_table};
use super::theme::Badge;

/// Overlay host that prints each new frame to stdout.
pub struct TerminalHost {
    ctx: UiContext,
    quiet: bool,
    frames: usize,
}

impl TerminalHost {
    pub fn new(ctx: UiContext, quiet: bool) -> Self {
        Self {
            ctx,
            quiet,
            frames: 0,
        }
    }

    /// Number of frames drawn so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl OverlayHost for TerminalHost {
    fn render(&mut self, frame: &OverlayFrame) {
        self.frames += 1;
        if self.ctx.mode.is_json() {
            if let Ok(line) = serde_json::to_string(frame) {
                println!("{}", line);
            }
            return;
        }
        if self.quiet {
            return;
        }
        println!("{}", describe_frame(&self.ctx, frame));
    }

    fn notify(&mut self, message: &str) {
        if !self.quiet && !self.ctx.mode.is_json() {
            eprintln!("{}", badge(&self.ctx, Badge::Info, message));
        }
    }
}

/// Human text for one overlay frame.
pub fn describe_frame(ctx: &UiContext, frame: &OverlayFrame) -> String {
    match &frame.state {
        GateState::Hidden => badge(ctx, Badge::Ok, "No overlay"),
        GateState::Gated {
            lock_key,
            kind,
            title,
        } => {
            let what = match kind {
                EntryKind::Chat => "chat",
                EntryKind::Project => "project",
            };
            let message = format!("This {} is locked: {}", what, title);
            [
                badge(ctx, Badge::Locked, &message),
                format!("  {}", kv(ctx, "Lock key", lock_key)),
                format!("  {}", kv(ctx, "Unlock", "chatlock unlock --view <FILE>")),
            ]
            .join("\n")
        }
        GateState::FolderPin => badge(ctx, Badge::Locked, "Private folder: enter your PIN"),
        GateState::FolderList => {
            let mut out = badge(
                ctx,
                Badge::Info,
                &format!("Private folder ({} locked)", frame.folder.len()),
            );
            if !frame.folder.is_empty() {
                out.push('\n');
                out.push_str(&folder_table(ctx, &frame.folder));
            }
            out
        }
    }
}

/// Folder rows as a table.
pub fn folder_table(ctx: &UiContext, items: &[FolderItem]) -> String {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                item.lock_key.clone(),
                truncate(&item.title, 48),
                format_locked_at(item.locked_at.as_ref(), ctx.mode.is_pretty()),
            ]
        })
        .collect();
    simple_table(ctx, &["KEY", "TITLE", "LOCKED AT"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;

    fn plain_ctx() -> UiContext {
        UiContext {
            color: false,
            unicode: false,
            width: 80,
            mode: OutputMode::Plain,
        }
    }

    #[test]
    fn test_gated_frame_names_title_and_key() {
        let frame = OverlayFrame {
            state: GateState::Gated {
                lock_key: "abc".to_string(),
                kind: EntryKind::Chat,
                title: "Taxes".to_string(),
            },
            folder: Vec::new(),
            revision: 3,
        };
        let text = describe_frame(&plain_ctx(), &frame);
        assert!(text.contains("[LOCKED] This chat is locked: Taxes"));
        assert!(text.contains("lock_key=abc"));
    }

    #[test]
    fn test_folder_list_includes_rows() {
        let frame = OverlayFrame {
            state: GateState::FolderList,
            folder: vec![FolderItem {
                lock_key: "abc".to_string(),
                title: "Taxes".to_string(),
                locked_at: None,
            }],
            revision: 1,
        };
        let text = describe_frame(&plain_ctx(), &frame);
        assert!(text.contains("Private folder (1 locked)"));
        assert!(text.contains("abc\tTaxes\t-"));
    }

    #[test]
    fn test_host_counts_frames() {
        let mut host = TerminalHost::new(plain_ctx(), true);
        host.render(&OverlayFrame {
            state: GateState::Hidden,
            folder: Vec::new(),
            revision: 0,
        });
        assert_eq!(host.frames(), 1);
    }
}
