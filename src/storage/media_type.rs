//! Accepted upload formats and content sniffing.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, PartialEq, Eq)]
pub struct AllowedMediaType {
    pub mime: &'static str,
    pub extension: &'static str,
    pub kind: MediaKind,
}

pub const ALLOWED_MEDIA_TYPES: &[AllowedMediaType] = &[
    AllowedMediaType { mime: "image/jpeg", extension: "jpg", kind: MediaKind::Image },
    AllowedMediaType { mime: "image/png", extension: "png", kind: MediaKind::Image },
    AllowedMediaType { mime: "image/webp", extension: "webp", kind: MediaKind::Image },
    AllowedMediaType { mime: "image/gif", extension: "gif", kind: MediaKind::Image },
    AllowedMediaType { mime: "video/mp4", extension: "mp4", kind: MediaKind::Video },
    AllowedMediaType { mime: "video/webm", extension: "webm", kind: MediaKind::Video },
    AllowedMediaType { mime: "video/quicktime", extension: "mov", kind: MediaKind::Video },
];

/// Look up a declared content type, ignoring parameters such as `; charset=`.
pub fn lookup(declared: &str) -> Option<&'static AllowedMediaType> {
    let essence = declared.parse::<mime::Mime>().ok()?;
    let essence = essence.essence_str().to_ascii_lowercase();
    ALLOWED_MEDIA_TYPES.iter().find(|allowed| allowed.mime == essence)
}

/// Guess the real format from the leading bytes.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("video/webm");
    }
    if bytes.len() >= 12 {
        match &bytes[4..8] {
            b"ftyp" if &bytes[8..12] == b"qt  " => return Some("video/quicktime"),
            b"ftyp" => return Some("video/mp4"),
            b"moov" | b"mdat" | b"wide" | b"free" => return Some("video/quicktime"),
            _ => {}
        }
    }
    None
}

/// Whether the sniffed content is acceptable for the declared type.
///
/// MP4 and QuickTime share the ISO base media container, so either
/// declaration accepts either signature.
pub fn content_matches(declared: &AllowedMediaType, bytes: &[u8]) -> bool {
    match sniff(bytes) {
        Some(actual) if actual == declared.mime => true,
        Some("video/mp4") | Some("video/quicktime") => {
            matches!(declared.mime, "video/mp4" | "video/quicktime")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const MP4: &[u8] = b"\0\0\0\x18ftypisom\0\0\0\0";
    const MOV: &[u8] = b"\0\0\0\x14ftypqt  \0\0\0\0";

    #[test]
    fn test_lookup_ignores_parameters_and_case() {
        assert_eq!(lookup("IMAGE/PNG").map(|t| t.extension), Some("png"));
        assert_eq!(lookup("video/mp4; codecs=avc1").map(|t| t.kind), Some(MediaKind::Video));
        assert!(lookup("application/pdf").is_none());
        assert!(lookup("not a mime").is_none());
    }

    #[test]
    fn test_sniffing() {
        assert_eq!(sniff(PNG), Some("image/png"));
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff(MP4), Some("video/mp4"));
        assert_eq!(sniff(MOV), Some("video/quicktime"));
        assert_eq!(sniff(b"%PDF-1.7"), None);
        assert_eq!(sniff(&[]), None);
    }

    #[test]
    fn test_declared_type_must_match_content() {
        let png = lookup("image/png").unwrap();
        let jpeg = lookup("image/jpeg").unwrap();
        let mp4 = lookup("video/mp4").unwrap();
        let mov = lookup("video/quicktime").unwrap();

        assert!(content_matches(png, PNG));
        assert!(!content_matches(jpeg, PNG));
        assert!(!content_matches(png, b"<script>alert(1)</script>"));
        assert!(content_matches(mp4, MOV));
        assert!(content_matches(mov, MP4));
    }
}
