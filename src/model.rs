use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Catalog identifier. The backend sends either a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artist {
    pub name: String,
}

impl<'de> Deserialize<'de> for Artist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawArtist {
            Name(String),
            Object { name: String },
        }

        Ok(match RawArtist::deserialize(deserializer)? {
            RawArtist::Name(name) | RawArtist::Object { name } => Self { name },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub id: Option<TrackId>,
    pub title: String,
}

impl<'de> Deserialize<'de> for Album {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAlbum {
            Title(String),
            Object {
                #[serde(default)]
                id: Option<TrackId>,
                #[serde(alias = "name")]
                title: String,
            },
        }

        Ok(match RawAlbum::deserialize(deserializer)? {
            RawAlbum::Title(title) => Self { id: None, title },
            RawAlbum::Object { id, title } => Self { id, title },
        })
    }
}

/// A catalog entry. Immutable once fetched; the session only holds clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "artist", deserialize_with = "one_or_many")]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Option<Album>,
    #[serde(default)]
    pub source_platform: Option<String>,
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub album_art: Option<String>,
}

impl Track {
    pub fn artist_line(&self) -> String {
        if self.artists.is_empty() {
            return "Unknown Artist".to_string();
        }
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn album_title(&self) -> &str {
        self.album.as_ref().map_or("", |a| a.title.as_str())
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Artist>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Artist>),
        One(Artist),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(artists) => artists,
        OneOrMany::One(artist) => vec![artist],
        OneOrMany::Nothing(()) => Vec::new(),
    })
}
