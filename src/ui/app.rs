// App loop - wires the playlist window, the playback clock and the scene
// rotation together and paints them. All timers live here so that dropping
// the app tears every one of them down with it.

use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{AppEvent, EventHandler, TerminalManager};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::media::MediaResolver;
use crate::playback::{AudioOutput, PlaybackController, PlayerState, Tick};
use crate::playlist::{PlaylistError, PlaylistWindow};
use crate::scene::SceneLoop;

pub struct App<O: AudioOutput> {
    terminal: TerminalManager,
    events: EventHandler,
    catalog: Catalog,
    window: PlaylistWindow,
    player: PlaybackController<O>,
    scene: SceneLoop,
    resolver: MediaResolver,

    tick_period: Duration,
    rotate_every: Duration,
    scene_retry_delay: Duration,
    scene_retry_at: Option<Instant>,

    /// Where the progress bar was painted last frame, for click-to-seek.
    gauge_area: Option<Rect>,
    should_quit: bool,
}

impl<O: AudioOutput> App<O> {
    pub fn new(
        config: &Config,
        catalog: Catalog,
        window: PlaylistWindow,
        player: PlaybackController<O>,
        scene: SceneLoop,
        resolver: MediaResolver,
    ) -> Result<Self> {
        Ok(Self {
            terminal: TerminalManager::new()?,
            events: EventHandler::spawn(),
            catalog,
            window,
            player,
            scene,
            resolver,
            tick_period: Duration::from_millis(config.playback.tick_ms.max(10)),
            rotate_every: Duration::from_secs(config.scene.rotate_minutes.max(1) * 60),
            scene_retry_delay: Duration::from_millis(config.scene.retry_delay_ms),
            scene_retry_at: None,
            gauge_area: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // The current track is loaded up front but does not autoplay; sound
        // only starts when the user asks for it.
        self.player.load(self.window.current());
        self.verify_scene().await;

        let mut clock = tokio::time::interval(self.tick_period);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut rotation = tokio::time::interval_at(
            tokio::time::Instant::now() + self.rotate_every,
            self.rotate_every,
        );

        while !self.should_quit {
            self.draw()?;

            tokio::select! {
                _ = clock.tick() => {
                    match self.player.tick() {
                        Tick::EndOfTrack => {
                            debug!("Track ended, advancing");
                            self.advance_track();
                        }
                        Tick::SkipFailedTrack => {
                            info!("Skipping a track that would not load");
                            self.advance_track();
                        }
                        Tick::Playing | Tick::Idle => {}
                    }
                    if self.scene_retry_at.is_some_and(|at| Instant::now() >= at) {
                        self.scene_retry_at = None;
                        self.scene.shuffle();
                        self.verify_scene().await;
                    }
                }
                _ = rotation.tick() => {
                    info!("Rotating scene");
                    self.scene.shuffle();
                    self.verify_scene().await;
                }
                event = self.events.next_event() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => self.should_quit = true,
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.should_quit = true,
            AppEvent::TogglePlayPause => self.player.toggle(),
            AppEvent::NextTrack => self.advance_track(),
            AppEvent::PreviousTrack => self.rewind_track(),
            AppEvent::SeekForward => self.player.seek_by(5),
            AppEvent::SeekBackward => self.player.seek_by(-5),
            AppEvent::ReloadScene => {
                self.scene.shuffle();
                self.verify_scene().await;
            }
            AppEvent::Click { column, row } => self.seek_to_click(column, row),
        }
    }

    fn advance_track(&mut self) {
        match self.window.advance(&self.catalog) {
            Ok(()) => self.player.track_changed(self.window.current()),
            Err(err) => warn!("Cannot advance: {}", err),
        }
    }

    fn rewind_track(&mut self) {
        match self.window.rewind(&self.catalog) {
            Ok(()) => self.player.track_changed(self.window.current()),
            Err(PlaylistError::NoHistory) => debug!("Nothing to rewind to"),
            Err(err) => warn!("Cannot rewind: {}", err),
        }
    }

    /// Clicking inside the progress bar seeks proportionally.
    fn seek_to_click(&mut self, column: u16, row: u16) {
        let Some(area) = self.gauge_area else { return };
        if row < area.y || row >= area.y + area.height || column < area.x || area.width == 0 {
            return;
        }
        let Some(duration) = self.player.state().duration else {
            return;
        };
        let fraction = f64::from(column.saturating_sub(area.x)) / f64::from(area.width);
        self.player.seek(duration.mul_f64(fraction.clamp(0.0, 1.0)));
    }

    /// The terminal cannot render the loop itself, but it can notice when
    /// the active scene asset has gone missing: flag it and retry with a
    /// different pick after a short delay.
    async fn verify_scene(&mut self) {
        let Some(current) = self.scene.current().map(str::to_owned) else {
            return;
        };
        if self.resolver.probe(&current).await {
            return;
        }
        if self.scene.mark_error() {
            self.scene_retry_at = Some(Instant::now() + self.scene_retry_delay);
        }
    }

    fn draw(&mut self) -> Result<()> {
        let window = &self.window;
        let scene = &self.scene;
        let state = self.player.state().clone();
        let intends_playing = self.player.intends_playing();
        let mut gauge_area = None;

        self.terminal.draw(|f| {
            gauge_area = render(f, window, scene, &state, intends_playing);
        })?;

        self.gauge_area = gauge_area;
        Ok(())
    }
}

fn render(
    f: &mut Frame,
    window: &PlaylistWindow,
    scene: &SceneLoop,
    state: &PlayerState,
    intends_playing: bool,
) -> Option<Rect> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_scene(f, chunks[0], scene);
    render_playlist(f, chunks[1], window);
    render_progress(f, chunks[2], state, intends_playing);
    render_footer(f, chunks[3]);

    Some(chunks[2])
}

fn render_scene(f: &mut Frame, area: Rect, scene: &SceneLoop) {
    let name = scene
        .current()
        .map(scene_label)
        .unwrap_or_else(|| "no scene".to_string());

    let line = if scene.has_error() {
        Line::from(vec![
            Span::styled("failed to load ", Style::default().fg(Color::Red)),
            Span::raw(name),
            Span::styled("  [r] retry", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(vec![
            Span::styled("looping ", Style::default().fg(Color::DarkGray)),
            Span::styled(name, Style::default().fg(Color::White)),
        ])
    };

    let panel = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" scene "));
    f.render_widget(panel, area);
}

fn render_playlist(f: &mut Frame, area: Rect, window: &PlaylistWindow) {
    let current_index = window.current_index();
    let items: Vec<ListItem> = window
        .entries()
        .enumerate()
        .map(|(i, track)| {
            let style = if i == current_index {
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD)
            } else if i < current_index {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if i == current_index { "> " } else { "  " };
            ListItem::new(format!("{marker}{}", track.title)).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" playlist "));
    f.render_widget(list, area);
}

fn render_progress(f: &mut Frame, area: Rect, state: &PlayerState, intends_playing: bool) {
    let duration = state.duration.unwrap_or_default();
    let ratio = if duration.is_zero() {
        0.0
    } else {
        (state.position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
    };

    let label = if state.is_loading {
        "loading...".to_string()
    } else {
        let mode = if intends_playing { "playing" } else { "paused" };
        format!(
            "{} {} / {}",
            mode,
            format_time(state.position),
            format_time(duration)
        )
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio(ratio)
        .label(label);
    f.render_widget(gauge, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let hints = Paragraph::new(" space play/pause   n next   p previous   <- -> seek   r scene   q quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hints, area);
}

fn scene_label(location: &str) -> String {
    location
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(location)
        .to_string()
}

fn format_time(time: Duration) -> String {
    let total = time.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_formats_like_a_clock() {
        assert_eq!(format_time(Duration::from_secs(0)), "0:00");
        assert_eq!(format_time(Duration::from_secs(65)), "1:05");
        assert_eq!(format_time(Duration::from_secs(600)), "10:00");
    }

    #[test]
    fn scene_labels_drop_the_directory() {
        assert_eq!(scene_label("art/RoofStudy.mp4"), "RoofStudy.mp4");
        assert_eq!(scene_label("http://localhost/art/cat.mp4"), "cat.mp4");
        assert_eq!(scene_label("plain.mp4"), "plain.mp4");
    }
}
