use std::sync::LazyLock;

use regex::Regex;

/// Recognized URL shapes, tried in order
static VIDEO_ID_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})")
            .expect("watch/short-link pattern is valid"),
        Regex::new(r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})").expect("shorts pattern is valid"),
    ]
});

/// Extract the 11-character video id from a watch, youtu.be or shorts URL.
pub fn extract_video_id(url: &str) -> Option<&str> {
    VIDEO_ID_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn short_link() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn shorts_path() {
        assert_eq!(
            extract_video_id("https://youtube.com/shorts/abc_DEF-123"),
            Some("abc_DEF-123")
        );
    }

    #[test]
    fn only_first_eleven_characters_are_taken() {
        assert_eq!(extract_video_id("youtu.be/abcdefghijklmnop"), Some("abcdefghijk"));
    }

    #[test]
    fn watch_pattern_wins_over_shorts() {
        let url = "https://youtube.com/shorts/AAAAAAAAAAA?next=youtube.com/watch?v=BBBBBBBBBBB";
        assert_eq!(extract_video_id(url), Some("BBBBBBBBBBB"));
    }

    #[test]
    fn unrecognized_urls_yield_none() {
        for url in [
            "",
            "not a url",
            "https://vimeo.com/123456789",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/playlist?list=PL1234567890",
        ] {
            assert_eq!(extract_video_id(url), None, "{url}");
        }
    }
}
