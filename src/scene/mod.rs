// Scene rotation - the looping visual that keeps the companion alive.
//
// Discovery works in layers: a dev-time listing service when one is
// reachable, otherwise a probe over the known scene files, and as a last
// resort a single hardcoded default that is never verified. Whatever comes
// out, the loop always has something to point at.

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::media::{AssetKind, MediaResolver};

/// Find every scene that can actually be loaded.
///
/// A reachable listing service supersedes the static probe entirely; the
/// probe list is the offline fallback. Nothing here errors out: with zero
/// reachable candidates the available set degenerates to the default.
pub async fn discover_scenes(
    media: &MediaConfig,
    resolver: &MediaResolver,
    offline: bool,
) -> Vec<String> {
    #[cfg(feature = "discover")]
    if !offline {
        if let Some(url) = &media.listing_url {
            match fetch_listing(url).await {
                Ok(names) if !names.is_empty() => {
                    info!("Listing service returned {} scenes", names.len());
                    return names
                        .iter()
                        .map(|name| resolver.resolve(AssetKind::Scene, name))
                        .collect();
                }
                Ok(_) => debug!("Listing service returned an empty list, probing instead"),
                Err(err) => debug!("No listing service ({err:#}), probing instead"),
            }
        }
    }
    #[cfg(not(feature = "discover"))]
    let _ = offline;

    let mut found = Vec::new();
    for name in &media.known_scenes {
        if let Some(location) = resolver.resolve_existing(AssetKind::Scene, name).await {
            found.push(location);
        }
    }

    if found.is_empty() {
        warn!(
            "No scenes reachable, falling back to default '{}'",
            media.default_scene
        );
        found.push(resolver.resolve(AssetKind::Scene, &media.default_scene));
    } else {
        info!("Found {} scenes by probing", found.len());
    }
    found
}

#[cfg(feature = "discover")]
async fn fetch_listing(url: &str) -> anyhow::Result<Vec<String>> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }
    Ok(response.json().await?)
}

/// Holds exactly one active scene and rotates through the available set
/// without ever immediately repeating itself.
#[derive(Debug, Clone)]
pub struct SceneLoop {
    available: Vec<String>,
    current: Option<String>,
    error: bool,
}

impl SceneLoop {
    pub fn new(available: Vec<String>) -> Self {
        let mut scene = Self {
            available,
            current: None,
            error: false,
        };
        scene.shuffle();
        scene
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Pick a random scene, avoiding the current one when more than one is
    /// available. Clears any error state.
    pub fn shuffle(&mut self) {
        self.error = false;
        let others: Vec<&String> = self
            .available
            .iter()
            .filter(|s| Some(s.as_str()) != self.current.as_deref())
            .collect();
        if let Some(pick) = others.choose(&mut rand::thread_rng()) {
            debug!("Scene is now {}", pick);
            self.current = Some((*pick).clone());
        }
        // With a single-entry pool the current scene simply stays.
    }

    /// Mark the active scene as failed. Returns true when an automatic retry
    /// with a different pick makes sense, which is only the case when there
    /// is something else to pick.
    pub fn mark_error(&mut self) -> bool {
        self.error = true;
        let retry = self.available.len() > 1;
        if retry {
            warn!("Scene failed to load, retrying with a different one");
        } else {
            warn!("Scene failed to load and no alternative is available");
        }
        retry
    }

    /// Replace the available set, for example after a fresh discovery pass.
    /// The rotation timer should be re-armed by the caller afterwards.
    pub fn set_available(&mut self, available: Vec<String>) {
        self.available = available;
        self.error = false;
        if self
            .current
            .as_ref()
            .map(|c| !self.available.contains(c))
            .unwrap_or(true)
        {
            self.current = None;
            self.shuffle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use std::fs;

    #[tokio::test]
    async fn discovery_falls_back_to_the_default_scene() {
        let dir = tempfile::tempdir().expect("tempdir");
        let media = MediaConfig {
            scene_bases: vec![dir.path().join("empty").to_string_lossy().into_owned()],
            listing_url: None,
            ..MediaConfig::default()
        };
        let resolver = MediaResolver::new(&media);

        let scenes = discover_scenes(&media, &resolver, true).await;
        assert_eq!(scenes.len(), 1);
        assert!(
            scenes[0].ends_with(&media.default_scene),
            "expected the unverified default, got {}",
            scenes[0]
        );
    }

    #[tokio::test]
    async fn unreachable_listing_service_degrades_to_the_probe() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("art");
        fs::create_dir(&base).expect("create art dir");
        fs::write(base.join("study_cat1.mp4"), b"stub").expect("write fixture");

        let media = MediaConfig {
            scene_bases: vec![base.to_string_lossy().into_owned()],
            // Port 1 is never listening, so the fetch fails immediately.
            listing_url: Some("http://127.0.0.1:1/api/videos".to_string()),
            ..MediaConfig::default()
        };
        let resolver = MediaResolver::new(&media);

        let scenes = discover_scenes(&media, &resolver, false).await;
        assert_eq!(scenes.len(), 1);
        assert!(
            scenes[0].ends_with("study_cat1.mp4"),
            "the probe should still find the local scene, got {}",
            scenes[0]
        );
    }

    #[tokio::test]
    async fn discovery_keeps_only_reachable_scenes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("art");
        fs::create_dir(&base).expect("create art dir");
        fs::write(base.join("RoofStudy.mp4"), b"stub").expect("write fixture");

        let media = MediaConfig {
            scene_bases: vec![base.to_string_lossy().into_owned()],
            listing_url: None,
            ..MediaConfig::default()
        };
        let resolver = MediaResolver::new(&media);

        let scenes = discover_scenes(&media, &resolver, true).await;
        assert_eq!(scenes.len(), 1);
        assert!(scenes[0].ends_with("RoofStudy.mp4"));
    }

    #[test]
    fn shuffle_never_repeats_with_alternatives_available() {
        let mut scene = SceneLoop::new(vec!["a.mp4".into(), "b.mp4".into(), "c.mp4".into()]);
        for _ in 0..50 {
            let before = scene.current().map(str::to_owned);
            scene.shuffle();
            assert_ne!(scene.current().map(str::to_owned), before);
        }
    }

    #[test]
    fn single_scene_pools_keep_their_scene() {
        let mut scene = SceneLoop::new(vec!["only.mp4".into()]);
        assert_eq!(scene.current(), Some("only.mp4"));
        scene.shuffle();
        assert_eq!(scene.current(), Some("only.mp4"));
    }

    #[test]
    fn errors_retry_only_when_an_alternative_exists() {
        let mut lonely = SceneLoop::new(vec!["only.mp4".into()]);
        assert!(!lonely.mark_error());
        assert!(lonely.has_error());

        let mut plural = SceneLoop::new(vec!["a.mp4".into(), "b.mp4".into()]);
        assert!(plural.mark_error());
        plural.shuffle();
        assert!(!plural.has_error(), "a fresh pick clears the error state");
    }

    #[test]
    fn replacing_the_available_set_repicks_when_needed() {
        let mut scene = SceneLoop::new(vec!["a.mp4".into()]);
        scene.set_available(vec!["x.mp4".into(), "y.mp4".into()]);
        let current = scene.current().expect("a scene should be picked");
        assert!(current == "x.mp4" || current == "y.mp4");
    }
}
