use crate::{
    client::{API_BASE, Client},
    error::Result,
    video::Dimension,
};
use serde::Deserialize;

/// How to address a season: directly, or through one of its episodes. The
/// season endpoint takes exactly one of the two ids.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SeasonQuery {
    SeasonId(String),
    EpisodeId(String),
}

/// Raw metadata of a season and its episode listing.
#[derive(Debug, Deserialize)]
pub struct SeasonInfo {
    pub season_id: i64,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub evaluate: String,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Deserialize)]
pub struct Episode {
    /// Episode id, the number behind an `ep` prefixed link.
    pub id: i64,
    pub aid: i64,
    pub bvid: String,
    pub cid: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub long_title: String,
    pub duration: i64,
    #[serde(default)]
    pub dimension: Dimension,
}

impl Client {
    /// Raw season metadata, addressed by season id or episode id.
    pub fn season_info(&self, query: &SeasonQuery) -> Result<SeasonInfo> {
        let url = match query {
            SeasonQuery::SeasonId(id) => format!("{API_BASE}/pgc/view/web/season?season_id={id}"),
            SeasonQuery::EpisodeId(id) => format!("{API_BASE}/pgc/view/web/season?ep_id={id}"),
        };
        self.get_json(&url, false)
    }
}
