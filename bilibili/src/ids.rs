/*
    REFERENCES
    ----------

    1. https://github.com/SocialSisterYi/bilibili-API-collect/tree/master/docs/misc/bvid_desc.md

*/

use crate::error::{Error, Result};
use regex::Regex;

const TABLE: &str = "fZodR9XQDSUm21yCkr6zBqiveYah8bt4xsWpHnJE7jL5VG3guMTKNPAwcF";
const SLOTS: [usize; 6] = [11, 10, 3, 8, 4, 6];
const XOR_CODE: i64 = 177451812;
const ADD_CODE: i64 = 8728348608;

const URL_PATTERN: &str =
    r"https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)";

/// Encodes a numeric av id into its public BV identifier.
///
/// The value is xor-scrambled, offset and split into six base 58 digits
/// placed at fixed scrambled slots of the `BV1..4.1.7..` template.
pub fn avid_to_bvid(avid: i64) -> String {
    let table = TABLE.as_bytes();
    let mut out = *b"BV1  4 1 7  ";
    let x = (avid ^ XOR_CODE) + ADD_CODE;
    let mut power = 1_i64;

    for &slot in &SLOTS {
        out[slot] = table[((x / power) % 58) as usize];
        power *= 58;
    }

    out.iter().map(|&b| char::from(b)).collect()
}

/// Decodes a public BV identifier back into its numeric av id.
///
/// Inverse of [`avid_to_bvid`]. Fails with [`Error::InvalidId`] when the
/// identifier is too short to index or carries characters outside the
/// encoding table.
pub fn bvid_to_avid(bvid: &str) -> Result<i64> {
    let chars = bvid.chars().collect::<Vec<_>>();
    let mut sum = 0_i64;
    let mut power = 1_i64;

    for &slot in &SLOTS {
        let c = *chars.get(slot).ok_or(Error::InvalidId)?;
        let digit = TABLE.chars().position(|t| t == c).ok_or(Error::InvalidId)? as i64;
        sum += digit * power;
        power *= 58;
    }

    Ok((sum - ADD_CODE) ^ XOR_CODE)
}

// Each pattern that matches replaces the working string with its whole
// match, so a full share url narrows down to the final token step by step.
fn narrow<'a>(raw: &'a str, patterns: &[&str]) -> &'a str {
    let mut id = raw;

    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();

        if let Some(m) = re.find(id) {
            id = m.as_str();
        }
    }

    id
}

/// Extracts a BV identifier from free form input.
///
/// A bare integer is treated as a numeric av id and encoded. Anything else
/// runs through the narrowing patterns (share url, `video/BV.../` path
/// segment, bare `BV...` token). The result must be at least 12 characters.
pub fn extract_video_id(raw: &str) -> Result<String> {
    if let Ok(avid) = raw.parse::<i64>() {
        return Ok(avid_to_bvid(avid));
    }

    let id = narrow(raw, &[URL_PATTERN, r"video/BV[0-9A-Za-z]+/", r"BV[0-9A-Za-z]+"]);

    if id.len() < 12 {
        return Err(Error::InvalidId);
    }

    Ok(id.to_owned())
}

/// Extracts the numeric season id from free form input.
///
/// A `play/ssNNN` url narrows down to the bare digits; a numeric input
/// passes through unchanged.
pub fn extract_season_id(raw: &str) -> String {
    narrow(raw, &[URL_PATTERN, r"play/ss[0-9]+", r"[0-9]+"]).to_owned()
}

/// Extracts the numeric episode id from free form input.
pub fn extract_episode_id(raw: &str) -> String {
    narrow(raw, &[URL_PATTERN, r"play/ep[0-9]+", r"[0-9]+"]).to_owned()
}

/// True when the input addresses a season (`play/ssNNN`).
pub fn is_season_id(raw: &str) -> bool {
    Regex::new(r"play/ss[0-9]+").unwrap().is_match(raw)
}

/// True when the input addresses a single episode (`play/epNNN`).
pub fn is_episode_id(raw: &str) -> bool {
    Regex::new(r"play/ep[0-9]+").unwrap().is_match(raw)
}

/// A resolved content identifier. Exactly one kind applies to any given
/// input and it never changes after resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContentId {
    /// Public BV identifier of a standalone video.
    Video(String),
    /// Numeric season id of a bangumi season.
    Season(String),
    /// Numeric episode id of a single bangumi episode.
    Episode(String),
}

impl ContentId {
    /// Resolves raw user input (id, bare identifier or share url) into a
    /// typed identifier without touching the network.
    pub fn parse(raw: &str) -> Result<Self> {
        if is_episode_id(raw) {
            Ok(Self::Episode(extract_episode_id(raw)))
        } else if is_season_id(raw) {
            Ok(Self::Season(extract_season_id(raw)))
        } else {
            Ok(Self::Video(extract_video_id(raw)?))
        }
    }

    /// The extracted identifier string.
    pub fn id(&self) -> &str {
        match self {
            Self::Video(id) | Self::Season(id) | Self::Episode(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_encodes() {
        assert_eq!(avid_to_bvid(4606803), "BV1gs411B7y4");
    }

    #[test]
    fn known_vector_decodes() {
        assert_eq!(bvid_to_avid("BV1gs411B7y4").unwrap(), 4606803);
    }

    #[test]
    fn codec_round_trips() {
        for avid in [1, 170001, 4606803, 170001000, 2147483647] {
            assert_eq!(bvid_to_avid(&avid_to_bvid(avid)).unwrap(), avid);
        }
    }

    #[test]
    fn decode_rejects_short_input() {
        assert!(matches!(bvid_to_avid("BV1gs"), Err(Error::InvalidId)));
    }

    #[test]
    fn decode_rejects_foreign_characters() {
        assert!(matches!(bvid_to_avid("BV1!s411B7y4"), Err(Error::InvalidId)));
    }

    #[test]
    fn extracts_from_share_url() {
        let id = extract_video_id(
            "https://www.bilibili.com/video/BV1sy4y197KP/?spm_id_from=333.337.search-card.all.click&vd_source=76326787bdfce30577382b0e7e18f35c",
        )
        .unwrap();
        assert_eq!(id, "BV1sy4y197KP");
    }

    #[test]
    fn extracts_from_url_without_trailing_slash() {
        let id = extract_video_id("https://www.bilibili.com/video/BV1kd4y1W7RG").unwrap();
        assert_eq!(id, "BV1kd4y1W7RG");
    }

    #[test]
    fn bare_identifier_passes_through() {
        assert_eq!(extract_video_id("BV1kd4y1W7RG").unwrap(), "BV1kd4y1W7RG");
    }

    #[test]
    fn numeric_input_encodes() {
        assert_eq!(extract_video_id("4606803").unwrap(), "BV1gs411B7y4");
    }

    #[test]
    fn short_input_is_rejected() {
        assert!(matches!(extract_video_id("BV1kd4"), Err(Error::InvalidId)));
        assert!(matches!(extract_video_id("garbage"), Err(Error::InvalidId)));
    }

    #[test]
    fn season_url_predicates() {
        let url = "https://www.bilibili.com/bangumi/play/ss33622?from_spmid=666.24.0.0";
        assert!(is_season_id(url));
        assert!(!is_episode_id(url));
        assert_eq!(extract_season_id(url), "33622");
    }

    #[test]
    fn episode_url_predicates() {
        let url = "https://www.bilibili.com/bangumi/play/ep729217?from_spmid=666.4.banner.1";
        assert!(is_episode_id(url));
        assert!(!is_season_id(url));
        assert_eq!(extract_episode_id(url), "729217");
    }

    #[test]
    fn numeric_season_id_passes_through() {
        assert_eq!(extract_season_id("33622"), "33622");
    }

    #[test]
    fn parses_typed_identifiers() {
        assert_eq!(
            ContentId::parse("https://www.bilibili.com/bangumi/play/ep729217").unwrap(),
            ContentId::Episode("729217".into())
        );
        assert_eq!(
            ContentId::parse("https://www.bilibili.com/bangumi/play/ss33622").unwrap(),
            ContentId::Season("33622".into())
        );
        assert_eq!(
            ContentId::parse("BV1kd4y1W7RG").unwrap(),
            ContentId::Video("BV1kd4y1W7RG".into())
        );
        assert!(ContentId::parse("xx").is_err());
    }
}
