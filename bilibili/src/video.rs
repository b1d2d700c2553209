use crate::{
    client::{API_BASE, Client},
    error::Result,
};
use serde::Deserialize;
use std::fmt;

/// Platform quality code. Video and audio tiers occupy disjoint ranges,
/// split at [`Qn::AUDIO_BOUNDARY`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Qn(pub i64);

impl Qn {
    pub const P240: Self = Self(6);
    pub const P360: Self = Self(16);
    pub const P480: Self = Self(32);
    pub const P720: Self = Self(64);
    pub const P720_60: Self = Self(74);
    pub const P1080: Self = Self(80);
    pub const P1080_PLUS: Self = Self(112);
    pub const P1080_60: Self = Self(116);
    pub const P4K: Self = Self(120);

    pub const AUDIO_64K: Self = Self(30216);
    pub const AUDIO_132K: Self = Self(30232);
    pub const AUDIO_DOLBY: Self = Self(30250);
    pub const AUDIO_HI_RES: Self = Self(30251);
    pub const AUDIO_192K: Self = Self(30280);

    /// No preference; a split-track listing ignores the requested tier and
    /// advertises everything anyway.
    pub const ANY: Self = Self(0);

    /// Codes above this line address audio tiers.
    pub const AUDIO_BOUNDARY: i64 = 2048;

    pub fn is_audio(self) -> bool {
        self.0 > Self::AUDIO_BOUNDARY
    }

    pub fn label(self) -> String {
        match self {
            Self::P240 => "240P".to_owned(),
            Self::P360 => "360P".to_owned(),
            Self::P480 => "480P".to_owned(),
            Self::P720 => "720P".to_owned(),
            Self::P720_60 => "720P60".to_owned(),
            Self::P1080 => "1080P".to_owned(),
            Self::P1080_PLUS => "1080P+".to_owned(),
            Self::P1080_60 => "1080P60".to_owned(),
            Self::P4K => "4K".to_owned(),
            Self::AUDIO_64K => "64K".to_owned(),
            Self::AUDIO_132K => "132K".to_owned(),
            Self::AUDIO_DOLBY => "Dolby".to_owned(),
            Self::AUDIO_HI_RES => "Hi-Res".to_owned(),
            Self::AUDIO_192K => "192K".to_owned(),
            other => other.0.to_string(),
        }
    }
}

impl fmt::Display for Qn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Stream delivery flag of the play url endpoints.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fnval(pub i64);

impl Fnval {
    /// Single progressive file.
    pub const MP4: Self = Self(1);
    /// Separate video and audio tracks.
    pub const DASH: Self = Self(16);
}

/// Raw metadata of a standalone video, one entry per page.
#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    pub bvid: String,
    pub aid: i64,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub pubdate: i64,
    pub ctime: i64,
    pub owner: Owner,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub struct Owner {
    pub mid: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub cid: i64,
    pub page: i32,
    pub part: String,
    pub duration: i64,
    #[serde(default)]
    pub dimension: Dimension,
}

/// Frame size as stored, before any rotation correction.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Dimension {
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub rotate: i64,
}

/// Stream listing for one page or episode. Progressive requests fill
/// `durl`, split-track requests fill `dash`.
#[derive(Debug, Deserialize)]
pub struct PlayInfo {
    #[serde(default)]
    pub quality: i64,
    #[serde(default)]
    pub durl: Option<Vec<Durl>>,
    #[serde(default)]
    pub dash: Option<DashInfo>,
}

#[derive(Debug, Deserialize)]
pub struct Durl {
    pub url: String,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashInfo {
    #[serde(default)]
    pub video: Vec<DashStream>,
    #[serde(default)]
    pub audio: Vec<DashStream>,
}

/// One track of a split listing; `id` is its quality code.
#[derive(Debug, Deserialize)]
pub struct DashStream {
    pub id: i64,
    pub base_url: String,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PlayInfoV2 {
    video_info: PlayInfo,
}

impl Client {
    /// Raw metadata for a video addressed by bvid.
    pub fn video_info(&self, bvid: &str) -> Result<VideoInfo> {
        self.get_json(
            &format!("{API_BASE}/x/web-interface/view?bvid={bvid}"),
            false,
        )
    }

    /// Stream listing for one page of a standalone video.
    pub fn play_url(&self, bvid: &str, cid: i64, qn: Qn, fnval: Fnval) -> Result<PlayInfo> {
        self.get_json(
            &format!(
                "{API_BASE}/x/player/playurl?bvid={bvid}&cid={cid}&qn={}&fourk=1&fnval={}",
                qn.0, fnval.0
            ),
            false,
        )
    }

    /// Stream listing for a season episode. This endpoint refuses requests
    /// without the site referer.
    pub fn play_url_episode(&self, ep_id: &str, qn: Qn, fnval: Fnval) -> Result<PlayInfo> {
        let url = format!(
            "{API_BASE}/pgc/player/web/v2/playurl?ep_id={ep_id}&qn={}&fnval={}\
             &fnver=0&fourk=1&support_multi_audio=true&gaia_source=&is_main_page=true\
             &need_fragment=true&isGaiaAvoided=false&voice_balance=1&drm_tech_type=2",
            qn.0, fnval.0
        );
        let v2: PlayInfoV2 = self.get_json(&url, true)?;
        Ok(v2.video_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_labels_match_the_player() {
        let table = [
            (Qn::P240, "240P"),
            (Qn::P360, "360P"),
            (Qn::P480, "480P"),
            (Qn::P720, "720P"),
            (Qn::P720_60, "720P60"),
            (Qn::P1080, "1080P"),
            (Qn::P1080_PLUS, "1080P+"),
            (Qn::P1080_60, "1080P60"),
            (Qn::P4K, "4K"),
            (Qn::AUDIO_64K, "64K"),
            (Qn::AUDIO_132K, "132K"),
            (Qn::AUDIO_192K, "192K"),
            (Qn::AUDIO_DOLBY, "Dolby"),
            (Qn::AUDIO_HI_RES, "Hi-Res"),
        ];
        for (qn, label) in table {
            assert_eq!(qn.label(), label);
        }
        assert_eq!(Qn(999).label(), "999");
    }

    #[test]
    fn audio_boundary_splits_the_ranges() {
        assert!(!Qn::P4K.is_audio());
        assert!(!Qn::P240.is_audio());
        assert!(Qn::AUDIO_64K.is_audio());
        assert!(Qn::AUDIO_HI_RES.is_audio());
    }

    #[test]
    fn play_info_tolerates_null_lists() {
        let progressive: PlayInfo = serde_json::from_str(
            r#"{"quality":80,"durl":[{"url":"https://cn.example/a.mp4","backup_url":null}],"dash":null}"#,
        )
        .unwrap();
        assert_eq!(progressive.quality, 80);
        assert_eq!(progressive.durl.unwrap().len(), 1);
        assert!(progressive.dash.is_none());

        let split: PlayInfo = serde_json::from_str(
            r#"{"quality":80,"durl":null,"dash":{"video":[{"id":80,"base_url":"https://cn.example/v.m4s"}],"audio":[{"id":30280,"base_url":"https://cn.example/a.m4s"}]}}"#,
        )
        .unwrap();
        assert!(split.durl.is_none());
        let dash = split.dash.unwrap();
        assert_eq!(dash.video[0].id, 80);
        assert_eq!(dash.audio[0].id, 30280);
    }
}
