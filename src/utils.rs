use lazy_static::lazy_static;
use regex::Regex;

use crate::QueuerError;

lazy_static! {
    static ref WATCH_RE: Regex = Regex::new(r"watch\?v=([^&\s]*)").unwrap();
}

/// Pull a video id out of a copied `watch?v=` URL, dropping everything from
/// the first `&` on.
pub fn extract_video_id(text: &str) -> Result<String, QueuerError> {
    let video_id = WATCH_RE
        .captures(text.trim())
        .and_then(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .ok_or(QueuerError::InvalidClipboard)?;

    if video_id.is_empty() {
        return Err(QueuerError::InvalidClipboard);
    }
    Ok(video_id)
}

pub fn thumbnail_url(video_id: &str, thumbnail_idx: u8) -> String {
    format!(
        "https://img.youtube.com/vi/{}/{}.jpg",
        video_id, thumbnail_idx
    )
}
