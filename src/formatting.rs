//! Display text transforms applied to model output

/// Break bullets and sentences onto their own paragraphs.
///
/// This is a plain substitution, not a markdown parser: `". "` inside
/// abbreviations, decimals or URLs gets split too, and a sentence followed
/// by a bullet ends up with four newlines. Output is kept byte-for-byte
/// stable so existing transcripts render the same.
pub fn format_response(text: &str) -> String {
    text.replace("* ", "\n\n* ").replace(". ", ".\n\n")
}

/// Progressive display frames for an already-complete response.
///
/// Each frame is the running concatenation of whitespace-delimited tokens,
/// each followed by a single space. A response with no tokens yields one
/// empty frame so the client still draws a bubble.
pub fn progressive_frames(text: &str) -> Vec<String> {
    let mut frames = Vec::new();
    let mut shown = String::with_capacity(text.len() + 1);
    for token in text.split_whitespace() {
        shown.push_str(token);
        shown.push(' ');
        frames.push(shown.clone());
    }
    if frames.is_empty() {
        frames.push(String::new());
    }
    frames
}
