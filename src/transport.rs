//! Playback transport state machine.
//!
//! The transport serializes play/pause/stop requests into transitions between
//! a fixed set of states and applies the matching side effect on the loaded
//! audio source. The source reports its real status asynchronously; those
//! notifications are folded back into the canonical state by
//! [`Transport::on_source_status_changed`]. All calls happen on the event-loop
//! thread, so the state needs no locking.

use std::time::Duration;

/// Label shown on the play control while stopped.
pub const PLAY_LABEL: &str = "Play";
/// Label shown on the play control while playing.
pub const PAUSE_LABEL: &str = "Pause";
/// Label shown on the play control while paused.
pub const RESUME_LABEL: &str = "Resume";
/// Label shown on the stop control unless paused.
pub const STOP_LABEL: &str = "Stop";
/// Label shown on the stop control while paused.
pub const RETURN_TO_ZERO_LABEL: &str = "Return to Zero";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopping,
    Stopped,
    Starting,
    Playing,
    Pausing,
    Paused,
}

impl TransportState {
    /// Transient states only exist to sequence a side effect and settle on
    /// the next status notification from the source.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            TransportState::Starting | TransportState::Pausing | TransportState::Stopping
        )
    }
}

/// User requests that drive the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The play control; acts as pause while playing.
    Play,
    Stop,
}

/// Notification emitted by a source whenever its playing status may have
/// changed. Carries no payload: the receiver asks the source directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    StatusChanged,
}

/// A decodable, seekable, playable audio stream.
pub trait AudioSource {
    fn start(&mut self);
    fn stop(&mut self);
    fn set_position(&mut self, position: Duration);
    fn current_position(&self) -> Duration;
    fn is_playing(&self) -> bool;
    fn set_looping(&mut self, looping: bool);
}

/// What the UI shows for the transport controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub play_label: &'static str,
    pub stop_label: &'static str,
    pub play_enabled: bool,
    pub stop_enabled: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            play_label: PLAY_LABEL,
            stop_label: STOP_LABEL,
            play_enabled: false,
            stop_enabled: false,
        }
    }
}

pub struct Transport<S: AudioSource> {
    state: TransportState,
    source: Option<S>,
    looping: bool,
    controls: Controls,
}

impl<S: AudioSource> Default for Transport<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AudioSource> Transport<S> {
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            source: None,
            looping: false,
            controls: Controls::default(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Replace the loaded source.
    ///
    /// The outgoing source is stopped and handed back to the caller. The
    /// transport is forced to `Stopped` so the new source never inherits the
    /// previous playback state, and the current loop flag is carried over.
    pub fn load(&mut self, mut source: S) -> Option<S> {
        source.set_looping(self.looping);

        let mut previous = self.source.replace(source);
        if let Some(old) = previous.as_mut() {
            old.stop();
        }

        self.controls.play_enabled = true;
        if self.state != TransportState::Stopped {
            log::info!("Source replaced while {:?}, forcing Stopped", self.state);
        }
        self.change_state(TransportState::Stopped);

        previous
    }

    /// Request a transition from a user action.
    ///
    /// Returns `true` if the state changed. Requests without a loaded source
    /// and requests with no row in the transition table are ignored.
    pub fn request_transition(&mut self, trigger: Trigger) -> bool {
        if self.source.is_none() {
            log::debug!("Ignoring {trigger:?}: no source loaded");
            return false;
        }

        let target = match (trigger, self.state) {
            (Trigger::Play, TransportState::Stopped | TransportState::Paused) => {
                TransportState::Starting
            }
            (Trigger::Play, TransportState::Playing) => TransportState::Pausing,
            (Trigger::Play, _) => return false,
            (Trigger::Stop, TransportState::Paused) => TransportState::Stopped,
            (Trigger::Stop, _) => TransportState::Stopping,
        };

        self.change_state(target)
    }

    /// Reconcile the state with the source's reported status.
    pub fn on_source_status_changed(&mut self, is_playing: bool) {
        // The source is ground truth; the prior state only tells us why
        // playback stopped.
        if is_playing {
            self.change_state(TransportState::Playing);
        } else if matches!(
            self.state,
            TransportState::Stopping | TransportState::Playing
        ) {
            self.change_state(TransportState::Stopped);
        } else if self.state == TransportState::Pausing {
            self.change_state(TransportState::Paused);
        }
    }

    /// Handle a [`SourceEvent::StatusChanged`] by querying the loaded source.
    pub fn handle_status_change(&mut self) {
        if let Some(is_playing) = self.source.as_ref().map(S::is_playing) {
            self.on_source_status_changed(is_playing);
        }
    }

    /// Flip the loop flag on the loaded source. Without a source only the
    /// flag is remembered.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        if let Some(source) = self.source.as_mut() {
            source.set_looping(looping);
        }
    }

    fn change_state(&mut self, new_state: TransportState) -> bool {
        if self.state == new_state {
            return false;
        }

        log::debug!("Transport {:?} -> {:?}", self.state, new_state);
        self.state = new_state;

        match new_state {
            TransportState::Stopped => {
                self.controls.play_label = PLAY_LABEL;
                self.controls.stop_label = STOP_LABEL;
                self.controls.stop_enabled = false;
                if let Some(source) = self.source.as_mut() {
                    source.set_position(Duration::ZERO);
                }
            }
            TransportState::Starting => {
                if let Some(source) = self.source.as_mut() {
                    source.start();
                }
            }
            TransportState::Playing => {
                self.controls.play_label = PAUSE_LABEL;
                self.controls.stop_label = STOP_LABEL;
                self.controls.stop_enabled = true;
            }
            TransportState::Pausing | TransportState::Stopping => {
                if let Some(source) = self.source.as_mut() {
                    source.stop();
                }
            }
            TransportState::Paused => {
                self.controls.play_label = RESUME_LABEL;
                self.controls.stop_label = RETURN_TO_ZERO_LABEL;
            }
        }

        true
    }
}
