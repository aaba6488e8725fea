//! YouTube video id extraction and thumbnail URLs.

use serde::Serialize;
use url::Url;

const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// Thumbnail URLs in every quality YouTube publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnails {
    pub default: String,
    pub medium: String,
    pub high: String,
    pub standard: String,
    pub maxres: String,
}

impl Thumbnails {
    pub fn for_video(video_id: &str) -> Self {
        let url = |name: &str| format!("{THUMBNAIL_BASE}/{video_id}/{name}.jpg");
        Self {
            default: url("default"),
            medium: url("mqdefault"),
            high: url("hqdefault"),
            standard: url("sddefault"),
            maxres: url("maxresdefault"),
        }
    }
}

/// Video id from a watch, short, embed or `/v/` link.
pub fn extract_video_id(input: &str) -> Option<String> {
    let url = Url::parse(input.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next()? {
                "watch" => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                "embed" | "v" | "shorts" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    is_valid_id(&candidate).then_some(candidate)
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
