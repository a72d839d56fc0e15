//! HD haptic playback through the DualSense audio interface
//!
//! Wired DualSense controllers expose a 4-channel USB audio device whose rear
//! channels drive the haptic actuators. [`HapticOutput`] owns the opened
//! device and a pool of converting audio streams bound to it, one per source
//! format that is currently playing.
//!
//! Pool rules:
//! - a buffer reuses an idle stream with the same format, rate and channels
//! - otherwise a new stream is created; at [`MAX_AUDIO_STREAMS`] the oldest
//!   stream is closed first (FIFO, not LRU)
//! - every tick each stream counts towards a timeout of
//!   [`AUDIO_STREAM_TIMEOUT_SECS`] at the configured tick rate; a stream idle
//!   for that long is closed and dropped

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use super::error::{DriverError, NativeError};
use super::native::{AudioDeviceId, AudioFormat, AudioSpec, AudioStreamId, AudioSubsystem, SharedAudio};
use crate::config::DriverSettings;
use crate::controller::haptic::{HapticBuffer, SampleEncoding, SampleFormat};

pub const MAX_AUDIO_STREAMS: usize = 16;

/// Idle time after which a pooled stream is closed
pub const AUDIO_STREAM_TIMEOUT_SECS: u32 = 5 * 60;

/// [`AUDIO_STREAM_TIMEOUT_SECS`] expressed in ticks of `tick_rate` hertz
pub fn stream_timeout_ticks(tick_rate: u32) -> i32 {
    i32::try_from(AUDIO_STREAM_TIMEOUT_SECS.saturating_mul(tick_rate)).unwrap_or(i32::MAX)
}

/// Native format matching a buffer's sample layout, if there is one
pub fn audio_format_for(format: &SampleFormat) -> Option<AudioFormat> {
    match (format.bits_per_sample, format.encoding, format.big_endian) {
        (8, SampleEncoding::Signed, _) => Some(AudioFormat::S8),
        (8, SampleEncoding::Unsigned, _) => Some(AudioFormat::U8),
        (16, SampleEncoding::Signed, false) => Some(AudioFormat::S16Le),
        (16, SampleEncoding::Signed, true) => Some(AudioFormat::S16Be),
        (32, SampleEncoding::Signed, false) => Some(AudioFormat::S32Le),
        (32, SampleEncoding::Signed, true) => Some(AudioFormat::S32Be),
        (32, SampleEncoding::Float, false) => Some(AudioFormat::F32Le),
        (32, SampleEncoding::Float, true) => Some(AudioFormat::F32Be),
        _ => None,
    }
}

/// Playback length of `byte_len` bytes of audio in driver ticks
///
/// Integer arithmetic, truncating at every step.
pub fn playback_ticks(byte_len: usize, spec: &AudioSpec, bytes_per_sample: usize, tick_rate: u32) -> i32 {
    let seconds = byte_len
        / spec.freq as usize
        / usize::from(spec.channels)
        / bytes_per_sample;
    i32::try_from(seconds.saturating_mul(tick_rate as usize)).unwrap_or(i32::MAX)
}

/// One converting stream bound to the haptic device
#[derive(Debug)]
pub struct AudioStreamHandle {
    stream: AudioStreamId,
    spec: AudioSpec,
    /// Negative while queued audio is still playing, then counts up every
    /// tick since playback ended
    last_played: i32,
}

impl AudioStreamHandle {
    /// Creates a stream, binds it to `device` and queues `audio` on it
    pub fn create_with_audio(
        audio: &mut dyn AudioSubsystem,
        device: AudioDeviceId,
        spec: AudioSpec,
        device_spec: &AudioSpec,
        data: &[u8],
        tick_length: i32,
    ) -> Result<Self, NativeError> {
        let mut handle = Self::with_initial_timeout(audio, device, spec, device_spec)?;
        if let Err(e) = handle.queue_audio(audio, data, tick_length) {
            handle.close(audio);
            return Err(e);
        }
        Ok(handle)
    }

    /// Creates a stream bound to `device` with nothing queued
    pub fn with_initial_timeout(
        audio: &mut dyn AudioSubsystem,
        device: AudioDeviceId,
        spec: AudioSpec,
        device_spec: &AudioSpec,
    ) -> Result<Self, NativeError> {
        let stream = audio.create_stream(&spec, device_spec)?;
        if let Err(e) = audio.bind_stream(device, stream) {
            audio.destroy_stream(stream);
            return Err(e);
        }

        debug!("Created haptic audio stream {:?} for {}", stream, spec);
        Ok(Self {
            stream,
            spec,
            last_played: 0,
        })
    }

    /// Queues more audio and extends the in-use window by `tick_length`
    ///
    /// A stream that is still playing keeps its remaining time and gets
    /// `tick_length` on top of it, so overlapping clips accumulate instead of
    /// resetting the window.
    pub fn queue_audio(
        &mut self,
        audio: &mut dyn AudioSubsystem,
        data: &[u8],
        tick_length: i32,
    ) -> Result<(), NativeError> {
        audio.put_stream_data(self.stream, data)?;

        self.last_played = self.last_played.min(0).saturating_sub(tick_length);
        Ok(())
    }

    pub fn stream(&self) -> AudioStreamId {
        self.stream
    }

    pub fn spec(&self) -> &AudioSpec {
        &self.spec
    }

    pub fn last_played(&self) -> i32 {
        self.last_played
    }

    pub fn is_in_use(&self) -> bool {
        self.last_played < 0
    }

    pub fn is_timed_out(&self, timeout_ticks: i32) -> bool {
        self.last_played >= timeout_ticks
    }

    pub fn tick(&mut self) {
        self.last_played = self.last_played.saturating_add(1);
    }

    pub fn close(&self, audio: &mut dyn AudioSubsystem) {
        debug!("Destroying haptic audio stream {:?}", self.stream);
        audio.destroy_stream(self.stream);
    }
}

/// Finds a playback device whose name matches the configured tokens and that
/// has the configured channel count
pub fn find_haptic_device(
    audio: &dyn AudioSubsystem,
    settings: &DriverSettings,
) -> Option<(AudioDeviceId, AudioSpec)> {
    for device in audio.playback_devices() {
        let Some(name) = audio.device_name(device) else {
            continue;
        };
        if !settings.matches_haptic_device(&name) {
            continue;
        }

        match audio.device_format(device) {
            Ok(spec) if spec.channels == settings.haptic_device_channels => {
                debug!("Found haptic audio device '{}' ({})", name, spec);
                return Some((device, spec));
            }
            Ok(spec) => {
                debug!(
                    "Skipping audio device '{}': {} channels, need {}",
                    name, spec.channels, settings.haptic_device_channels
                );
            }
            Err(e) => warn!("Could not query format of audio device '{}': {}", name, e),
        }
    }

    None
}

/// Opened haptic audio device plus its stream pool
pub struct HapticOutput {
    audio: SharedAudio,
    device: Option<AudioDeviceId>,
    device_spec: AudioSpec,
    streams: VecDeque<AudioStreamHandle>,
    tick_rate: u32,
    timeout_ticks: i32,
}

impl HapticOutput {
    /// Looks for the haptic audio device and opens it
    ///
    /// `None` when no device matches or opening fails; the controller then
    /// simply has no HD haptics.
    pub fn open(audio: SharedAudio, settings: &DriverSettings) -> Option<Self> {
        let opened = {
            let mut subsystem = match audio.try_borrow_mut() {
                Ok(subsystem) => subsystem,
                Err(e) => {
                    error!("Audio subsystem busy while opening haptic device: {}", e);
                    return None;
                }
            };

            let (device, spec) = find_haptic_device(&*subsystem, settings)?;
            let result = subsystem.open_device(device, &spec);
            match result {
                Ok(opened) => (opened, spec),
                Err(e) => {
                    error!("Could not open haptic audio device: {}", e);
                    return None;
                }
            }
        };

        info!("Opened haptic audio device {:?} ({})", opened.0, opened.1);
        Some(Self {
            audio,
            device: Some(opened.0),
            device_spec: opened.1,
            streams: VecDeque::new(),
            tick_rate: settings.tick_rate,
            timeout_ticks: stream_timeout_ticks(settings.tick_rate),
        })
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn device_spec(&self) -> &AudioSpec {
        &self.device_spec
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn streams(&self) -> impl Iterator<Item = &AudioStreamHandle> {
        self.streams.iter()
    }

    pub fn timeout_ticks(&self) -> i32 {
        self.timeout_ticks
    }

    /// Queues `buffer` on a matching idle stream or a new one
    ///
    /// A no-op once the output is closed.
    pub fn play(&mut self, buffer: &HapticBuffer) -> Result<(), DriverError> {
        let Some(device) = self.device else {
            return Ok(());
        };

        let format = audio_format_for(&buffer.format).ok_or_else(|| {
            DriverError::illegal_state(format!("Unsupported haptic format: {:?}", buffer.format))
        })?;
        if buffer.format.channels == 0 || buffer.format.sample_rate == 0 {
            return Err(DriverError::illegal_state(format!(
                "Unsupported haptic format: {:?}",
                buffer.format
            )));
        }

        let spec = AudioSpec {
            format,
            channels: buffer.format.channels,
            freq: buffer.format.sample_rate,
        };
        let length = playback_ticks(
            buffer.audio.len(),
            &spec,
            buffer.format.bytes_per_sample(),
            self.tick_rate,
        );

        let audio_rc = Rc::clone(&self.audio);
        let mut audio = audio_rc
            .try_borrow_mut()
            .map_err(|e| DriverError::illegal_state(format!("audio subsystem busy: {e}")))?;

        if let Some(handle) = self
            .streams
            .iter_mut()
            .find(|stream| *stream.spec() == spec && !stream.is_in_use())
        {
            debug!("Reusing haptic stream {:?} for {} ticks", handle.stream(), length);
            handle.queue_audio(&mut *audio, &buffer.audio, length)?;
            return Ok(());
        }

        if self.streams.len() >= MAX_AUDIO_STREAMS {
            if let Some(oldest) = self.streams.pop_front() {
                debug!("Haptic stream pool full, evicting {:?}", oldest.stream());
                oldest.close(&mut *audio);
            }
        }

        let handle = AudioStreamHandle::create_with_audio(
            &mut *audio,
            device,
            spec,
            &self.device_spec,
            &buffer.audio,
            length,
        )?;
        self.streams.push_back(handle);
        Ok(())
    }

    /// Advances every stream's idle counter and drops timed out streams
    pub fn tick(&mut self) -> Result<(), DriverError> {
        if self.streams.is_empty() {
            return Ok(());
        }

        let audio_rc = Rc::clone(&self.audio);
        let mut audio = audio_rc
            .try_borrow_mut()
            .map_err(|e| DriverError::illegal_state(format!("audio subsystem busy: {e}")))?;

        let timeout_ticks = self.timeout_ticks;
        self.streams.retain_mut(|stream| {
            if stream.is_timed_out(timeout_ticks) {
                debug!("Haptic stream {:?} timed out", stream.stream());
                stream.close(&mut *audio);
                false
            } else {
                stream.tick();
                true
            }
        });
        Ok(())
    }

    /// Closes the audio device and every pooled stream
    pub fn close(&mut self) -> Result<(), DriverError> {
        let Some(device) = self.device.take() else {
            return Ok(());
        };

        let audio_rc = Rc::clone(&self.audio);
        let mut audio = audio_rc
            .try_borrow_mut()
            .map_err(|e| DriverError::illegal_state(format!("audio subsystem busy: {e}")))?;
        audio.close_device(device);
        for stream in self.streams.drain(..) {
            stream.close(&mut *audio);
        }
        info!("Closed haptic audio device {:?}", device);
        Ok(())
    }
}

/// Handle shared between a driver and the play callback it registers
pub type SharedHapticOutput = Rc<RefCell<HapticOutput>>;
