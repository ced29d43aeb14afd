// nook library - the playback core behind the ambient study companion
// Modular design makes it easy to swap out components

pub mod catalog;   // the fixed track pool
pub mod config;    // settings and preferences
pub mod media;     // asset resolution and availability probing
pub mod playback;  // the single audio channel and its clock
pub mod playlist;  // rolling previous/current/next window
pub mod scene;     // looping visuals and their rotation
#[cfg(feature = "tui")]
pub mod ui;        // terminal interface

// Export the stuff other modules actually use
pub use catalog::{Catalog, Track};
pub use config::Config;
pub use media::{AssetKind, MediaResolver};
pub use playback::{AudioOutput, NullOutput, PlaybackController, PlaybackSettings, PlayerState, Tick};
pub use playlist::{PlaylistError, PlaylistWindow};
pub use scene::SceneLoop;
