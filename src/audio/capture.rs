//! Microphone capture using CPAL (Cross-Platform Audio Library).

use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::{LivesubError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// Suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers while
/// probing audio backends. The messages are harmless but confusing.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2.
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Device names preferred on PipeWire/PulseAudio desktops, where the sound
/// server handles format conversion and respects the user's input selection.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse"];

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES.iter().any(|pref| lower.contains(pref))
}

/// List the names of available audio input devices.
pub fn list_devices() -> Result<Vec<String>> {
    let devices = with_suppressed_stderr(|| {
        cpal::default_host()
            .input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect::<Vec<_>>())
    })
    .map_err(|e| LivesubError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;
    Ok(devices)
}

/// Find an input device by name, or the best default.
fn find_device(device_name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Some(name) = device_name {
            let devices = host
                .input_devices()
                .map_err(|e| LivesubError::AudioCapture {
                    message: format!("Failed to enumerate input devices: {}", e),
                })?;
            for device in devices {
                if device.name().is_ok_and(|n| n == name) {
                    return Ok(device);
                }
            }
            return Err(LivesubError::AudioDeviceNotFound {
                device: name.to_string(),
            });
        }

        // Prefer the sound server device over raw ALSA endpoints
        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if device.name().is_ok_and(|n| is_preferred_device(&n)) {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| LivesubError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only accessed through the Mutex in CpalAudioSource,
/// one thread at a time.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone capture at 16kHz mono i16, as the pipeline expects.
///
/// Tries an i16/16kHz/mono stream first (PipeWire and PulseAudio convert
/// transparently), then f32 at the same config, then the device's native
/// config with software downmix and resampling.
pub struct CpalAudioSource {
    device: cpal::Device,
    stream: Mutex<Option<SendableStream>>,
    captured: Arc<Mutex<Vec<i16>>>,
    sample_rate: u32,
}

impl CpalAudioSource {
    /// Open an input device. `None` selects the default device, preferring
    /// the PipeWire/PulseAudio endpoint when present.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = find_device(device_name)?;
        Ok(Self {
            device,
            stream: Mutex::new(None),
            captured: Arc::new(Mutex::new(Vec::new())),
            sample_rate: defaults::SAMPLE_RATE,
        })
    }

    fn build_stream(&self) -> Result<cpal::Stream> {
        let target_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            warn!("audio stream error: {}", err);
        };

        // i16 at the target config — zero-copy path
        let captured = Arc::clone(&self.captured);
        if let Ok(stream) = self.device.build_input_stream(
            &target_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = captured.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // f32 at the target config — devices that only expose float formats
        let captured = Arc::clone(&self.captured);
        if let Ok(stream) = self.device.build_input_stream(
            &target_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = captured.lock() {
                    buf.extend(data.iter().map(|&s| f32_to_i16(s)));
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        self.build_native_stream()
    }

    /// Capture at the device's native config and convert in software.
    fn build_native_stream(&self) -> Result<cpal::Stream> {
        let native_config =
            self.device
                .default_input_config()
                .map_err(|e| LivesubError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = native_config.sample_rate().0;
        let native_channels = native_config.channels() as usize;
        let target_rate = self.sample_rate;
        let stream_config: cpal::StreamConfig = native_config.clone().into();

        warn!(
            "using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            native_config.sample_format(),
        );

        let err_callback = |err| {
            warn!("audio stream error: {}", err);
        };
        let captured = Arc::clone(&self.captured);

        match native_config.sample_format() {
            cpal::SampleFormat::I16 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let converted =
                            downmix_and_resample(data, native_channels, native_rate, target_rate);
                        if let Ok(mut buf) = captured.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| LivesubError::AudioCapture {
                    message: format!("Failed to build native i16 stream: {}", e),
                }),
            cpal::SampleFormat::F32 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let as_i16: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                        let converted = downmix_and_resample(
                            &as_i16,
                            native_channels,
                            native_rate,
                            target_rate,
                        );
                        if let Ok(mut buf) = captured.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| LivesubError::AudioCapture {
                    message: format!("Failed to build native f32 stream: {}", e),
                }),
            fmt => Err(LivesubError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. Try another --device.",
                    fmt
                ),
            }),
        }
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn downmix_and_resample(
    samples: &[i16],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<i16> {
    let mono: Vec<i16> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    crate::audio::wav::resample(&mono, source_rate, target_rate)
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self) -> Result<()> {
        {
            let guard = self.stream.lock().map_err(|e| LivesubError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| LivesubError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        let mut guard = self.stream.lock().map_err(|e| LivesubError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut guard = self.stream.lock().map_err(|e| LivesubError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        if let Some(stream) = guard.take() {
            stream.0.pause().map_err(|e| LivesubError::AudioCapture {
                message: format!("Failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        let mut captured = self
            .captured
            .lock()
            .map_err(|e| LivesubError::AudioCapture {
                message: format!("Failed to lock capture buffer: {}", e),
            })?;
        Ok(std::mem::take(&mut *captured))
    }
}
