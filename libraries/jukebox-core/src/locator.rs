//! Song locators
//!
//! A locator is the canonical, service-qualified identity of a track and is
//! the catalog's dedup key:
//!
//! - `yt:<video id>` for YouTube
//! - `sc:<artist>:<track>` for SoundCloud
//! - `bc:<artist>:<track>` for Bandcamp
//!
//! User input arrives as URLs; [`Locator::parse`] normalizes every URL shape
//! a service uses for the same track to one locator.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{JukeboxError, Result};

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.|m\.)?youtu(\.be/|be\.com/.+?[?&]v=)(?P<id>[a-zA-Z0-9_-]+)")
        .expect("valid regex")
});

static SOUNDCLOUD_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?soundcloud\.com/(?P<artist>[^/:]+)/(?P<track>[^/?#]+)")
        .expect("valid regex")
});

static BANDCAMP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(?P<artist>[^./:]+)\.bandcamp\.com/track/(?P<track>[^/?#]+)")
        .expect("valid regex")
});

static PLAYLIST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.youtube\.com/.*[?&]list=.+|(www\.)?soundcloud\.com/[^/]+/sets/.+|[^.:/]+\.bandcamp\.com/album/.+)$",
    )
    .expect("valid regex")
});

static CANONICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:yt:(?P<id>[a-zA-Z0-9_-]+)|(?P<service>sc|bc):(?P<artist>[^:/]+):(?P<track>[^/?#]+))$")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    YouTube { id: String },
    SoundCloud { artist: String, track: String },
    Bandcamp { artist: String, track: String },
}

impl Locator {
    /// Parse a song URL or an already canonical locator
    ///
    /// # Errors
    /// Returns `MalformedInput` when the input matches no supported shape
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if let Some(caps) = CANONICAL.captures(input) {
            if let Some(id) = caps.name("id") {
                return Ok(Self::YouTube {
                    id: id.as_str().to_string(),
                });
            }
            let artist = caps["artist"].to_string();
            let track = caps["track"].to_string();
            return Ok(if &caps["service"] == "sc" {
                Self::SoundCloud { artist, track }
            } else {
                Self::Bandcamp { artist, track }
            });
        }

        if let Some(caps) = YOUTUBE_URL.captures(input) {
            return Ok(Self::YouTube {
                id: caps["id"].to_string(),
            });
        }
        if let Some(caps) = SOUNDCLOUD_URL.captures(input) {
            return Ok(Self::SoundCloud {
                artist: caps["artist"].to_string(),
                track: caps["track"].to_string(),
            });
        }
        if let Some(caps) = BANDCAMP_URL.captures(input) {
            return Ok(Self::Bandcamp {
                artist: caps["artist"].to_string(),
                track: caps["track"].to_string(),
            });
        }

        Err(JukeboxError::MalformedInput(input.to_string()))
    }

    /// Canonical source URL for this track
    pub fn to_url(&self) -> String {
        match self {
            Self::YouTube { id } => format!("https://www.youtube.com/watch?v={}", id),
            Self::SoundCloud { artist, track } => {
                format!("https://soundcloud.com/{}/{}", artist, track)
            }
            Self::Bandcamp { artist, track } => {
                format!("https://{}.bandcamp.com/track/{}", artist, track)
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YouTube { id } => write!(f, "yt:{}", id),
            Self::SoundCloud { artist, track } => write!(f, "sc:{}:{}", artist, track),
            Self::Bandcamp { artist, track } => write!(f, "bc:{}:{}", artist, track),
        }
    }
}

impl FromStr for Locator {
    type Err = JukeboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locator {
    type Error = JukeboxError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

/// Whether the input is an album/playlist URL that expands to several songs
pub fn is_playlist_url(input: &str) -> bool {
    PLAYLIST_URL.is_match(input.trim())
}
