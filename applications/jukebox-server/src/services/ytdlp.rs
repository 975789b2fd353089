/// Media resolver backed by the `yt-dlp` command line tool
use async_trait::async_trait;
use jukebox_core::{Locator, MediaResolver, ResolvedMedia, ResolverError, SongMetadata};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    ytdlp_path: PathBuf,
}

/// Fields of a single-video info dump (`-j`)
#[derive(Debug, Deserialize)]
struct MediaInfo {
    title: Option<String>,
    duration: Option<f64>,
    url: Option<String>,
}

/// Flat playlist dump (`-J --flat-playlist`)
#[derive(Debug, Deserialize)]
struct PlaylistInfo {
    entries: Option<Vec<PlaylistEntry>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    id: Option<String>,
    url: Option<String>,
    ie_key: Option<String>,
}

impl PlaylistEntry {
    /// Flat YouTube entries may carry a bare video id instead of a URL
    fn into_url(self) -> Option<String> {
        match (self.ie_key.as_deref(), self.id) {
            (Some("Youtube"), Some(id)) => Some(format!("https://www.youtube.com/watch?v={id}")),
            (_, id) => self.url.or(id),
        }
    }
}

impl YtDlpResolver {
    pub fn new(ytdlp_path: PathBuf) -> Self {
        Self { ytdlp_path }
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ResolverError> {
        let output = Command::new(&self.ytdlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ResolverError::Service(format!("Failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolverError::Service(format!(
                "yt-dlp failed: {}",
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

fn invalid_output(err: serde_json::Error) -> ResolverError {
    ResolverError::Service(format!("Failed to parse yt-dlp output: {err}"))
}

fn metadata_of(info: &MediaInfo) -> Result<SongMetadata, ResolverError> {
    let title = info.title.clone().ok_or(ResolverError::MissingField("title"))?;
    let duration = info
        .duration
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .ok_or(ResolverError::MissingField("duration"))?;

    Ok(SongMetadata {
        title,
        duration: duration.round() as i64,
    })
}

fn parse_metadata(json: &[u8]) -> Result<SongMetadata, ResolverError> {
    let info: MediaInfo = serde_json::from_slice(json).map_err(invalid_output)?;
    metadata_of(&info)
}

fn parse_media(json: &[u8]) -> Result<ResolvedMedia, ResolverError> {
    let info: MediaInfo = serde_json::from_slice(json).map_err(invalid_output)?;

    let SongMetadata { title, duration } = metadata_of(&info)?;
    let url = info.url.ok_or(ResolverError::MissingField("url"))?;

    Ok(ResolvedMedia {
        title,
        duration,
        url,
    })
}

fn parse_playlist(json: &[u8], source: &str) -> Result<Vec<String>, ResolverError> {
    let info: PlaylistInfo = serde_json::from_slice(json).map_err(invalid_output)?;

    let entries = info
        .entries
        .ok_or_else(|| ResolverError::Unsupported(source.to_string()))?;

    Ok(entries
        .into_iter()
        .filter_map(PlaylistEntry::into_url)
        .collect())
}

fn parse_search(json: &[u8]) -> Result<String, ResolverError> {
    let info: PlaylistInfo = serde_json::from_slice(json).map_err(invalid_output)?;

    info.entries
        .unwrap_or_default()
        .into_iter()
        .find_map(PlaylistEntry::into_url)
        .ok_or(ResolverError::NoResults)
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, locator: &Locator) -> Result<ResolvedMedia, ResolverError> {
        let url = locator.to_url();
        tracing::debug!(%locator, "Resolving song with yt-dlp");

        let stdout = self
            .run(&["-j", "--no-playlist", "-f", "bestaudio/best", &url])
            .await?;
        parse_media(&stdout)
    }

    async fn describe(&self, locator: &Locator) -> Result<SongMetadata, ResolverError> {
        let url = locator.to_url();
        tracing::debug!(%locator, "Fetching song metadata with yt-dlp");

        // No stream is needed yet, so a track without playable formats is fine
        let stdout = self
            .run(&["-j", "--no-playlist", "--ignore-no-formats-error", &url])
            .await?;
        parse_metadata(&stdout)
    }

    async fn resolve_playlist(&self, url: &str) -> Result<Vec<String>, ResolverError> {
        tracing::debug!(url, "Expanding playlist with yt-dlp");

        let stdout = self.run(&["-J", "--flat-playlist", url]).await?;
        parse_playlist(&stdout, url)
    }

    async fn search(&self, query: &str) -> Result<String, ResolverError> {
        let search = format!("ytsearch1:{query}");

        let stdout = self.run(&["-J", "--flat-playlist", &search]).await?;
        parse_search(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_video() {
        let json = br#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "duration": 212.4,
            "url": "https://rr1.googlevideo.com/videoplayback?id=1"
        }"#;

        let media = parse_media(json).unwrap();
        assert_eq!(media.title, "Never Gonna Give You Up");
        assert_eq!(media.duration, 212);
        assert_eq!(media.url, "https://rr1.googlevideo.com/videoplayback?id=1");
    }

    #[test]
    fn missing_fields_are_reported() {
        let no_duration = br#"{"title": "Live stream", "url": "https://x"}"#;
        assert_eq!(
            parse_media(no_duration).unwrap_err(),
            ResolverError::MissingField("duration")
        );

        let no_title = br#"{"duration": 10, "url": "https://x"}"#;
        assert_eq!(
            parse_media(no_title).unwrap_err(),
            ResolverError::MissingField("title")
        );

        let no_url = br#"{"title": "t", "duration": 10}"#;
        assert_eq!(parse_media(no_url).unwrap_err(), ResolverError::MissingField("url"));
    }

    #[test]
    fn metadata_does_not_need_a_stream_url() {
        let json = br#"{"id": "abc123", "title": "Premiere", "duration": 3600}"#;

        let metadata = parse_metadata(json).unwrap();
        assert_eq!(metadata.title, "Premiere");
        assert_eq!(metadata.duration, 3600);

        // Playback still insists on one
        assert_eq!(parse_media(json).unwrap_err(), ResolverError::MissingField("url"));

        let no_title = br#"{"duration": 10}"#;
        assert_eq!(
            parse_metadata(no_title).unwrap_err(),
            ResolverError::MissingField("title")
        );
    }

    #[test]
    fn garbage_output_is_a_service_error() {
        assert!(matches!(
            parse_media(b"ERROR: not json"),
            Err(ResolverError::Service(_))
        ));
    }

    #[test]
    fn playlist_entries_become_urls() {
        let json = br#"{
            "_type": "playlist",
            "entries": [
                {"ie_key": "Youtube", "id": "abc123", "url": "abc123"},
                {"ie_key": "Soundcloud", "id": "42", "url": "https://soundcloud.com/artist/track"},
                {"ie_key": "Bandcamp"}
            ]
        }"#;

        let urls = parse_playlist(json, "https://www.youtube.com/playlist?list=PL1").unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=abc123".to_string(),
                "https://soundcloud.com/artist/track".to_string(),
            ]
        );
    }

    #[test]
    fn single_video_is_not_a_playlist() {
        let json = br#"{"_type": "video", "id": "abc123", "title": "t"}"#;
        let err = parse_playlist(json, "https://www.youtube.com/watch?v=abc123&list=x").unwrap_err();
        assert!(matches!(err, ResolverError::Unsupported(_)));
    }

    #[test]
    fn search_takes_first_entry() {
        let json = br#"{"entries": [{"ie_key": "Youtube", "id": "first"}, {"ie_key": "Youtube", "id": "second"}]}"#;
        assert_eq!(
            parse_search(json).unwrap(),
            "https://www.youtube.com/watch?v=first"
        );

        assert_eq!(
            parse_search(br#"{"entries": []}"#).unwrap_err(),
            ResolverError::NoResults
        );
    }
}
