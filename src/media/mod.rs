// Media resolver - turns a bare filename into somewhere we can actually
// load it from. Assets may live in a handful of directories depending on
// how the install was laid out, so each lookup walks a fixed candidate
// list instead of trusting a single path.

use std::path::Path;
#[cfg(feature = "discover")]
use std::time::Duration;

use tracing::debug;

use crate::config::MediaConfig;

#[cfg(feature = "discover")]
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Logical asset category. Scenes are the looping visuals, audio is the
/// playlist material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Scene,
    Audio,
}

#[derive(Debug, Clone)]
pub struct MediaResolver {
    audio_bases: Vec<String>,
    scene_bases: Vec<String>,
    #[cfg(feature = "discover")]
    client: reqwest::Client,
}

impl MediaResolver {
    pub fn new(media: &MediaConfig) -> Self {
        Self {
            audio_bases: media.audio_bases.clone(),
            scene_bases: media.scene_bases.clone(),
            #[cfg(feature = "discover")]
            client: reqwest::Client::new(),
        }
    }

    fn bases(&self, kind: AssetKind) -> &[String] {
        match kind {
            AssetKind::Scene => &self.scene_bases,
            AssetKind::Audio => &self.audio_bases,
        }
    }

    /// Ordered candidate locations for a filename: every configured base
    /// joined with the (escaped, for URLs) filename.
    pub fn candidates(&self, kind: AssetKind, filename: &str) -> Vec<String> {
        self.bases(kind)
            .iter()
            .map(|base| join_location(base, filename))
            .collect()
    }

    /// First candidate, unverified. Audio loads go through here; reachability
    /// is the playback controller's problem, its error path owns the fallout.
    pub fn resolve(&self, kind: AssetKind, filename: &str) -> String {
        let location = self
            .candidates(kind, filename)
            .into_iter()
            .next()
            .unwrap_or_else(|| filename.to_string());
        debug!("Resolved {:?} asset '{}' to {}", kind, filename, location);
        location
    }

    /// First candidate that actually exists, or None when every candidate is
    /// absent. Never errors: an unreachable probe is absence, not failure.
    pub async fn resolve_existing(&self, kind: AssetKind, filename: &str) -> Option<String> {
        for candidate in self.candidates(kind, filename) {
            if self.probe(&candidate).await {
                debug!("Found {:?} asset at {}", kind, candidate);
                return Some(candidate);
            }
        }
        debug!("No reachable candidate for {:?} asset '{}'", kind, filename);
        None
    }

    /// Lightweight existence check. Local paths are a metadata lookup; URLs
    /// are a HEAD request where any 2xx means present and everything else,
    /// transport errors included, means absent.
    pub async fn probe(&self, location: &str) -> bool {
        if is_url(location) {
            self.probe_url(location).await
        } else {
            Path::new(location).is_file()
        }
    }

    #[cfg(feature = "discover")]
    async fn probe_url(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!("Probe failed for {}: {}", url, err);
                false
            }
        }
    }

    #[cfg(not(feature = "discover"))]
    async fn probe_url(&self, url: &str) -> bool {
        debug!("Built without `discover`, treating {} as absent", url);
        false
    }
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn join_location(base: &str, filename: &str) -> String {
    if is_url(base) {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            urlencoding::encode(filename)
        )
    } else {
        Path::new(base).join(filename).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use std::fs;

    fn resolver_with_scene_bases(bases: Vec<String>) -> MediaResolver {
        let media = MediaConfig {
            scene_bases: bases,
            ..MediaConfig::default()
        };
        MediaResolver::new(&media)
    }

    #[test]
    fn candidates_follow_configured_base_order() {
        let media = MediaConfig::default();
        let resolver = MediaResolver::new(&media);
        let candidates = resolver.candidates(AssetKind::Audio, "CoolBreeze.mp3");
        assert_eq!(candidates.len(), media.audio_bases.len());
        assert!(candidates[0].ends_with("CoolBreeze.mp3"));
        assert!(candidates[0].starts_with(&media.audio_bases[0]));
    }

    #[test]
    fn url_bases_escape_the_filename() {
        let resolver =
            resolver_with_scene_bases(vec!["http://localhost:5173/art/".to_string()]);
        let candidates = resolver.candidates(AssetKind::Scene, "rainy day.mp4");
        assert_eq!(candidates[0], "http://localhost:5173/art/rainy%20day.mp4");
    }

    #[test]
    fn local_bases_keep_the_filename_verbatim() {
        let resolver = resolver_with_scene_bases(vec!["art".to_string()]);
        let candidates = resolver.candidates(AssetKind::Scene, "rainy day.mp4");
        assert_eq!(candidates[0], Path::new("art").join("rainy day.mp4").to_string_lossy());
    }

    #[tokio::test]
    async fn resolve_existing_skips_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let real = dir.path().join("scenes");
        fs::create_dir(&real).expect("create scene dir");
        fs::write(real.join("loop.mp4"), b"stub").expect("write fixture");

        let resolver = resolver_with_scene_bases(vec![
            dir.path().join("missing").to_string_lossy().into_owned(),
            real.to_string_lossy().into_owned(),
        ]);

        let found = resolver
            .resolve_existing(AssetKind::Scene, "loop.mp4")
            .await
            .expect("fixture should be found");
        assert!(found.starts_with(&real.to_string_lossy().into_owned()));
    }

    #[tokio::test]
    async fn resolve_existing_reports_absence_without_erroring() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = resolver_with_scene_bases(vec![dir
            .path()
            .join("nowhere")
            .to_string_lossy()
            .into_owned()]);
        assert!(resolver
            .resolve_existing(AssetKind::Scene, "loop.mp4")
            .await
            .is_none());
    }
}
