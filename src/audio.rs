//! Background music playback.
//!
//! Any failure to open the output device or decode the configured file
//! degrades the player to a logged, silent no-op; the game never notices.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Plays one soundtrack with play/stop/loop control.
pub struct MusicPlayer {
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    sink: Option<Sink>,
    path: PathBuf,
    looping: bool,
    disabled: bool,
}

impl MusicPlayer {
    /// Set up the output device and probe the file once. Either failing
    /// disables playback for the session.
    pub fn new(path: &Path) -> Self {
        let mut player = Self {
            _stream: None,
            stream_handle: None,
            sink: None,
            path: path.to_path_buf(),
            looping: false,
            disabled: false,
        };

        let (stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("audio disabled: no output device: {}", e);
                player.disabled = true;
                return player;
            }
        };

        if let Err(e) = Self::open_decoder(path) {
            tracing::warn!("audio disabled: {}", e);
            player.disabled = true;
            return player;
        }

        player._stream = Some(stream);
        player.stream_handle = Some(handle);
        player
    }

    fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, String> {
        let file = File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
        Decoder::new(BufReader::new(file))
            .map_err(|e| format!("cannot decode {}: {}", path.display(), e))
    }

    /// Start playback from the beginning, honoring the loop flag.
    pub fn play(&mut self) {
        if self.disabled {
            return;
        }
        self.stop();

        let Some(handle) = &self.stream_handle else {
            return;
        };
        let Ok(decoder) = Self::open_decoder(&self.path) else {
            return;
        };
        let Ok(sink) = Sink::try_new(handle) else {
            return;
        };

        if self.looping {
            sink.append(decoder.repeat_infinite());
        } else {
            sink.append(decoder);
        }
        self.sink = Some(sink);
        tracing::debug!(path = %self.path.display(), looping = self.looping, "music started");
    }

    /// Stop playback immediately.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Toggle looping; takes effect on the next `play()`.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_disables_playback_quietly() {
        let mut player = MusicPlayer::new(Path::new("/nonexistent/soundtrack.mp3"));
        // Whether the device or the file fails first, the result is the
        // same: a disabled player.
        assert!(player.disabled);
        // All controls are safe no-ops.
        player.set_looping(true);
        player.play();
        player.stop();
        assert!(player.sink.is_none());
    }
}
