// Playlist engine - the rolling previous/current/next window
//
// The window never shows the same track twice: whatever is in it forms the
// exclusion set for the next random draw. Advancing and rewinding rotate the
// window and top it back up with a fresh draw from the catalog.

use std::collections::{HashSet, VecDeque};

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, Track};

/// How much history the window keeps behind the current track.
pub const PREVIOUS_LIMIT: usize = 2;
/// How far ahead the window queues. Refilled to this length on every rotation.
pub const NEXT_TARGET: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    #[error("catalog has no tracks")]
    EmptyCatalog,
    #[error("catalog exhausted: every track is already in the window")]
    CatalogExhausted,
    #[error("no earlier track to rewind to")]
    NoHistory,
}

/// The rolling slice of the playlist visible at any moment.
///
/// `previous` is oldest-first (at most [`PREVIOUS_LIMIT`]), `next` is
/// nearest-first (topped up to [`NEXT_TARGET`]), and `current` is always
/// present once the window exists.
#[derive(Debug, Clone)]
pub struct PlaylistWindow {
    previous: VecDeque<Track>,
    current: Track,
    next: VecDeque<Track>,
}

impl PlaylistWindow {
    /// Seed the window from a one-time shuffle of the catalog: two entries of
    /// history, one current, up to three queued. Catalogs smaller than the
    /// full window shape still get a current track, just less padding.
    pub fn shuffled(catalog: &Catalog) -> Result<Self, PlaylistError> {
        if catalog.is_empty() {
            return Err(PlaylistError::EmptyCatalog);
        }

        let mut pool: Vec<Track> = catalog.tracks().to_vec();
        pool.shuffle(&mut rand::thread_rng());

        // Keep one aside for current before padding out history.
        let history = pool.len().saturating_sub(1).min(PREVIOUS_LIMIT);
        let mut rest = pool.split_off(history);
        let previous: VecDeque<Track> = pool.into_iter().collect();
        let current = rest.remove(0);
        rest.truncate(NEXT_TARGET);
        let next: VecDeque<Track> = rest.into_iter().collect();

        debug!(
            "Seeded playlist window: {} previous, current '{}', {} next",
            previous.len(),
            current.title,
            next.len()
        );
        Ok(Self {
            previous,
            current,
            next,
        })
    }

    pub fn previous(&self) -> &VecDeque<Track> {
        &self.previous
    }

    pub fn current(&self) -> &Track {
        &self.current
    }

    pub fn next(&self) -> &VecDeque<Track> {
        &self.next
    }

    pub fn has_history(&self) -> bool {
        !self.previous.is_empty()
    }

    /// Everything visible, oldest to furthest queued, for rendering.
    pub fn entries(&self) -> impl Iterator<Item = &Track> {
        self.previous
            .iter()
            .chain(std::iter::once(&self.current))
            .chain(self.next.iter())
    }

    /// Index of the current track within [`entries`](Self::entries).
    pub fn current_index(&self) -> usize {
        self.previous.len()
    }

    /// Move forward: current joins history (dropping the oldest past the
    /// limit), the nearest queued track becomes current, and one fresh draw
    /// tops the queue back up. The draw excludes the whole window, so the
    /// track just vacated can never be re-offered immediately.
    pub fn advance(&mut self, catalog: &Catalog) -> Result<(), PlaylistError> {
        let upcoming = self.next.pop_front().ok_or(PlaylistError::CatalogExhausted)?;

        let outgoing = std::mem::replace(&mut self.current, upcoming);
        self.previous.push_back(outgoing);
        while self.previous.len() > PREVIOUS_LIMIT {
            self.previous.pop_front();
        }

        if let Some(fresh) = self.draw(catalog) {
            self.next.push_back(fresh);
        }

        debug!("Advanced to '{}'", self.current.title);
        Ok(())
    }

    /// Move backward: current returns to the front of the queue (dropping the
    /// furthest entry past the target), the most recent history entry becomes
    /// current, and one fresh draw is prepended to history.
    pub fn rewind(&mut self, catalog: &Catalog) -> Result<(), PlaylistError> {
        let recent = self.previous.pop_back().ok_or(PlaylistError::NoHistory)?;

        let outgoing = std::mem::replace(&mut self.current, recent);
        self.next.push_front(outgoing);
        while self.next.len() > NEXT_TARGET {
            self.next.pop_back();
        }

        if let Some(fresh) = self.draw(catalog) {
            self.previous.push_front(fresh);
        }

        debug!("Rewound to '{}'", self.current.title);
        Ok(())
    }

    /// Uniform draw from the catalog minus everything currently visible.
    /// None when the window already covers the whole catalog; the window then
    /// rotates without refilling instead of repeating a track.
    fn draw(&self, catalog: &Catalog) -> Option<Track> {
        let exclude: HashSet<&str> = self.entries().map(|t| t.filename.as_str()).collect();
        let pool: Vec<&Track> = catalog
            .tracks()
            .iter()
            .filter(|t| !exclude.contains(t.filename.as_str()))
            .collect();
        pool.choose(&mut rand::thread_rng()).map(|t| (*t).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> Catalog {
        let tracks = (0..n)
            .map(|i| Track::new(format!("Track {i}"), format!("track_{i}.mp3")))
            .collect();
        Catalog::from_tracks(tracks)
    }

    fn assert_no_repeats(window: &PlaylistWindow) {
        let names: Vec<&str> = window.entries().map(|t| t.filename.as_str()).collect();
        let unique: std::collections::HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len(), "window repeats a track: {names:?}");
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(
            PlaylistWindow::shuffled(&catalog(0)).unwrap_err(),
            PlaylistError::EmptyCatalog
        );
    }

    #[test]
    fn shuffled_window_has_the_expected_shape() {
        let catalog = catalog(20);
        let window = PlaylistWindow::shuffled(&catalog).unwrap();
        assert_eq!(window.previous().len(), 2);
        assert_eq!(window.next().len(), 3);
        assert_eq!(window.current_index(), 2);
        assert_no_repeats(&window);
    }

    #[test]
    fn tiny_catalog_still_yields_a_current_track() {
        let catalog = catalog(1);
        let window = PlaylistWindow::shuffled(&catalog).unwrap();
        assert_eq!(window.previous().len(), 0);
        assert_eq!(window.next().len(), 0);
        assert_eq!(window.current().filename, "track_0.mp3");
    }

    #[test]
    fn no_repeat_invariant_survives_mixed_advances_and_rewinds() {
        let catalog = catalog(10);
        let mut window = PlaylistWindow::shuffled(&catalog).unwrap();

        for step in 0..200 {
            if step % 3 == 2 && window.has_history() {
                window.rewind(&catalog).unwrap();
            } else {
                window.advance(&catalog).unwrap();
            }
            assert_no_repeats(&window);
            assert!(window.previous().len() <= PREVIOUS_LIMIT);
            assert!(window.next().len() <= NEXT_TARGET);
        }
    }

    #[test]
    fn window_sizes_hold_once_warmed_up() {
        let catalog = catalog(30);
        let mut window = PlaylistWindow::shuffled(&catalog).unwrap();
        for _ in 0..50 {
            window.advance(&catalog).unwrap();
            assert!(window.previous().len() <= PREVIOUS_LIMIT);
            assert_eq!(window.next().len(), NEXT_TARGET);
        }
    }

    #[test]
    fn advance_then_rewind_restores_the_current_track() {
        let catalog = catalog(12);
        let mut window = PlaylistWindow::shuffled(&catalog).unwrap();
        let before = window.current().filename.clone();

        window.advance(&catalog).unwrap();
        assert_ne!(window.current().filename, before);
        window.rewind(&catalog).unwrap();
        assert_eq!(window.current().filename, before);
    }

    #[test]
    fn rewind_then_advance_restores_the_current_track() {
        let catalog = catalog(12);
        let mut window = PlaylistWindow::shuffled(&catalog).unwrap();
        let before = window.current().filename.clone();

        window.rewind(&catalog).unwrap();
        window.advance(&catalog).unwrap();
        assert_eq!(window.current().filename, before);
    }

    #[test]
    fn rewind_without_history_is_a_defined_failure() {
        let catalog = catalog(1);
        let mut window = PlaylistWindow::shuffled(&catalog).unwrap();
        assert_eq!(window.rewind(&catalog).unwrap_err(), PlaylistError::NoHistory);
    }

    #[test]
    fn exhausted_catalog_is_a_defined_failure_not_a_repeat() {
        // Window shape covers up to 6 tracks; with only 4 the queue drains
        // rather than repeating, and advancing past it fails loudly.
        let catalog = catalog(4);
        let mut window = PlaylistWindow::shuffled(&catalog).unwrap();

        let mut result = Ok(());
        for _ in 0..10 {
            result = window.advance(&catalog);
            assert_no_repeats(&window);
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result.unwrap_err(), PlaylistError::CatalogExhausted);
    }

    // The worked 7-track scenario: init yields a 2/1/3 window, and from the
    // second advance onward history sits at exactly its limit.
    #[test]
    fn seven_track_scenario_keeps_history_full_after_second_advance() {
        let catalog = catalog(7);
        let mut window = PlaylistWindow::shuffled(&catalog).unwrap();
        assert_eq!(window.previous().len(), 2);
        assert_eq!(window.next().len(), 3);

        for call in 1..=3 {
            window.advance(&catalog).unwrap();
            assert_no_repeats(&window);
            if call >= 2 {
                assert_eq!(window.previous().len(), PREVIOUS_LIMIT);
            }
        }
    }
}
