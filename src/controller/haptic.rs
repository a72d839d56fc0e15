//! HD haptics: raw PCM buffers played through the controller's audio actuators

use std::fmt;

use super::entity::{Component, ComponentId};
use crate::driver::error::DriverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    Signed,
    Unsigned,
    Float,
}

/// Layout of the samples in a [`HapticBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub encoding: SampleEncoding,
    pub big_endian: bool,
}

impl SampleFormat {
    /// Little endian signed 16-bit PCM
    pub fn pcm_s16(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: 16,
            encoding: SampleEncoding::Signed,
            big_endian: false,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }
}

/// Decoded haptic clip ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct HapticBuffer {
    pub audio: Vec<u8>,
    pub format: SampleFormat,
}

impl HapticBuffer {
    pub fn new(audio: Vec<u8>, format: SampleFormat) -> Self {
        Self { audio, format }
    }
}

pub type PlayHaptic = Box<dyn Fn(&HapticBuffer) -> Result<(), DriverError>>;

/// Entry point for playing haptic clips on a controller
///
/// Unlike the other components this one holds no snapshot. The driver that
/// owns the audio device registers a playback callback when it attaches the
/// component.
#[derive(Default)]
pub struct HdHapticComponent {
    play: Option<PlayHaptic>,
}

impl Component for HdHapticComponent {
    const ID: ComponentId = ComponentId::HdHaptic;
}

impl HdHapticComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_play_haptic(&mut self, play: PlayHaptic) {
        self.play = Some(play);
    }

    pub fn can_play(&self) -> bool {
        self.play.is_some()
    }

    /// Plays `buffer`; a no-op until a driver registered playback
    pub fn play_haptic(&self, buffer: &HapticBuffer) -> Result<(), DriverError> {
        match &self.play {
            Some(play) => play(buffer),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for HdHapticComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdHapticComponent")
            .field("can_play", &self.can_play())
            .finish()
    }
}
