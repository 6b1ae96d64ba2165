//! Text building blocks shared by the commands.
//!
//! Every helper has a pretty rendition for terminals and a `key=value`
//! rendition for pipes. JSON mode prints nothing through these helpers.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};

use super::context::{OutputMode, UiContext};
use super::theme::{styled, styles, Badge};

/// "Chatlock · folder (2 locked)" on a terminal, "chatlock folder" otherwise.
pub fn header(ctx: &UiContext, command: &str, detail: Option<&str>) -> String {
    match ctx.mode {
        OutputMode::Json => String::new(),
        OutputMode::Plain => format!("chatlock {}", command),
        OutputMode::Pretty => {
            let brand = styled("Chatlock", styles::bold(), ctx.color);
            let detail = detail.map(|d| format!(" ({})", d)).unwrap_or_default();
            format!("{} \u{00B7} {}{}", brand, command, detail)
        }
    }
}

pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let mark = styled(kind.display(ctx.unicode), kind.style(), ctx.color);
    match message {
        "" => mark,
        _ => format!("{} {}", mark, message),
    }
}

fn plain_key(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

pub fn kv(ctx: &UiContext, label: &str, value: &str) -> String {
    if ctx.mode.is_pretty() {
        format!("{} {}", styled(&format!("{}:", label), styles::dim(), ctx.color), value)
    } else {
        format!("{}={}", plain_key(label), value)
    }
}

pub fn hint(ctx: &UiContext, text: &str) -> String {
    kv(ctx, "Hint", text)
}

/// Outcome of a finished action followed by its details.
pub fn receipt(ctx: &UiContext, title: &str, details: &[(&str, &str)]) -> String {
    let first = if ctx.mode.is_pretty() {
        badge(ctx, Badge::Ok, title)
    } else {
        "status=ok".to_string()
    };
    let indent = if ctx.mode.is_pretty() { "  " } else { "" };
    std::iter::once(first)
        .chain(
            details
                .iter()
                .map(|(label, value)| format!("{}{}", indent, kv(ctx, label, value))),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

/// Borderless table; pipes get tab-separated rows without the header.
pub fn simple_table(ctx: &UiContext, headers: &[&str], rows: &[Vec<String>]) -> String {
    if !ctx.mode.is_pretty() {
        return rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(u16::try_from(ctx.width).unwrap_or(u16::MAX))
        .set_header(headers.iter().map(|title| {
            let cell = Cell::new(title);
            if ctx.color {
                cell.add_attribute(Attribute::Dim)
            } else {
                cell
            }
        }));
    for column in table.column_iter_mut() {
        column.set_padding((0, 2));
    }
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

pub fn print(ctx: &UiContext, text: &str) {
    if !ctx.mode.is_json() && !text.is_empty() {
        println!("{}", text);
    }
}

/// Error line plus optional hint. Errors print even in JSON mode.
pub fn error_message(ctx: &UiContext, message: &str, error_hint: Option<&str>) -> String {
    let mut out = if ctx.mode.is_pretty() {
        badge(ctx, Badge::Err, message)
    } else {
        format!("error={}", message)
    };
    if let Some(text) = error_hint {
        out.push('\n');
        out.push_str(&if ctx.mode.is_pretty() {
            hint(ctx, text)
        } else {
            format!("hint={}", text)
        });
    }
    out
}

pub fn print_error(ctx: &UiContext, message: &str, error_hint: Option<&str>) {
    eprintln!("{}", error_message(ctx, message, error_hint));
}
