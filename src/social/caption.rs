//! Post text derived from a capture's modification time.

use std::io;
use std::path::Path;

use chrono::{DateTime, Local, Offset, TimeZone};

/// Longest post the platform accepts, in characters.
pub const MAX_POST_CHARS: usize = 140;

/// Caption for the file at `path`, from its modification time in local time.
pub fn caption_for(path: &Path) -> io::Result<String> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(format_caption(&DateTime::<Local>::from(modified)))
}

/// Render `time` as `Mon Oct 19 14:03:22 2026 UTC9`.
///
/// The offset is the one in effect at `time` (so a summer capture shows the
/// summer offset even when posted in winter), positive east of UTC. The
/// result is cut to [`MAX_POST_CHARS`].
pub fn format_caption<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let offset_secs = time.offset().fix().local_minus_utc();
    let text = format!(
        "{} UTC{}",
        time.format("%a %b %e %H:%M:%S %Y"),
        format_offset_hours(offset_secs)
    );
    truncate_chars(&text, MAX_POST_CHARS)
}

/// `9`, `-7`, `0` for whole hours; `5.5`, `-3.5` otherwise. Only negative
/// offsets carry a sign.
pub fn format_offset_hours(offset_secs: i32) -> String {
    if offset_secs % 3600 == 0 {
        (offset_secs / 3600).to_string()
    } else {
        (f64::from(offset_secs) / 3600.0).to_string()
    }
}

/// First `max` characters of `text` (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
