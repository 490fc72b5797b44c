//! Terminal rendering of `{{placeholder}}` segments.

use owo_colors::OwoColorize;
use rowrun_source::Segment;

/// Join segments, drawing highlighted ones bold on a yellow background
/// when `color` is set.
pub fn render_segments(segments: &[Segment], color: bool) -> String {
    segments
        .iter()
        .map(|seg| {
            if color && seg.is_highlight() {
                seg.text.bold().on_yellow().to_string()
            } else {
                seg.text.clone()
            }
        })
        .collect()
}
