//! Decoding with symphonia and output on the default cpal device.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, info, warn};

use super::{Player, PlayerError};

/// A whole recording as interleaved f32 samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl Decoded {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Convert to the device layout: channels are duplicated or averaged,
    /// the rate is changed by linear interpolation.
    pub fn convert(&self, sample_rate: u32, channels: usize) -> Vec<f32> {
        let frames = self.frames();
        if frames == 0 || channels == 0 || sample_rate == 0 {
            return Vec::new();
        }

        let out_frames = (frames as u64 * sample_rate as u64 / self.sample_rate as u64) as usize;
        let step = self.sample_rate as f64 / sample_rate as f64;
        let mut out = Vec::with_capacity(out_frames * channels);

        for i in 0..out_frames {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(frames - 1);
            let next = (idx + 1).min(frames - 1);
            let frac = (pos - idx as f64) as f32;
            for ch in 0..channels {
                let a = self.sample(idx, ch, channels);
                let b = self.sample(next, ch, channels);
                out.push(a + (b - a) * frac);
            }
        }
        out
    }

    fn sample(&self, frame: usize, ch: usize, out_channels: usize) -> f32 {
        let base = frame * self.channels;
        if out_channels == 1 && self.channels > 1 {
            let sum: f32 = self.samples[base..base + self.channels].iter().sum();
            sum / self.channels as f32
        } else {
            self.samples[base + ch.min(self.channels - 1)]
        }
    }
}

/// Decode every packet of the default track.
pub fn decode_file(path: &Path) -> Result<Decoded, PlayerError> {
    let file = File::open(path).map_err(|source| PlayerError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_err = |source: SymphoniaError| PlayerError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_err)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PlayerError::NoAudio(path.to_path_buf()))?;
    let track_id = track.id;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_err)?;

    let mut samples = Vec::new();
    let mut layout = None;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(err) => {
                warn!("reading {}: {err}", path.display());
                break;
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(buf) => {
                let spec = *buf.spec();
                layout.get_or_insert((spec.rate, spec.channels.count()));
                let mut interleaved = SampleBuffer::<f32>::new(buf.capacity() as u64, spec);
                interleaved.copy_interleaved_ref(buf);
                samples.extend_from_slice(interleaved.samples());
            }
            Err(SymphoniaError::DecodeError(err)) => {
                warn!("skipping bad packet in {}: {err}", path.display());
            }
            Err(err) => return Err(decode_err(err)),
        }
    }

    match layout {
        Some((sample_rate, channels)) if !samples.is_empty() && channels > 0 => {
            debug!(
                "decoded {}: {} frames at {} Hz",
                path.display(),
                samples.len() / channels,
                sample_rate
            );
            Ok(Decoded {
                samples,
                sample_rate,
                channels,
            })
        }
        _ => Err(PlayerError::NoAudio(path.to_path_buf())),
    }
}

/// Plays decoded recordings on the default output device. Each recording
/// gets its own stream; dropping the stream stops it.
pub struct AudioPlayer {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    finished: Arc<AtomicBool>,
}

impl AudioPlayer {
    pub fn open() -> Result<Self, PlayerError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlayerError::NoOutputDevice)?;
        let supported = device.default_output_config()?;
        info!(
            "audio output {} at {} Hz, {} channels",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            supported.sample_rate().0,
            supported.channels()
        );

        Ok(Self {
            device,
            sample_format: supported.sample_format(),
            config: supported.into(),
            stream: None,
            finished: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn is_playing(&self) -> bool {
        self.stream.is_some() && !self.finished.load(Ordering::SeqCst)
    }

    fn build_stream<T>(
        &self,
        samples: Vec<f32>,
        convert: fn(f32) -> T,
        silence: T,
    ) -> Result<Stream, PlayerError>
    where
        T: SizedSample + Send + 'static,
    {
        let finished = Arc::clone(&self.finished);
        let mut pos = 0;
        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for out in data.iter_mut() {
                    *out = match samples.get(pos) {
                        Some(s) => convert(s.clamp(-1.0, 1.0)),
                        None => silence,
                    };
                    pos = (pos + 1).min(samples.len());
                }
                if pos >= samples.len() {
                    finished.store(true, Ordering::SeqCst);
                }
            },
            |err| error!("audio stream error: {err}"),
            None,
        )?;
        Ok(stream)
    }
}

impl Player for AudioPlayer {
    fn play(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.stop();
        let decoded = decode_file(path)?;
        let samples = decoded.convert(self.config.sample_rate.0, self.config.channels as usize);

        self.finished.store(false, Ordering::SeqCst);
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream(samples, |s| s, 0.0f32)?,
            SampleFormat::I16 => {
                self.build_stream(samples, |s| (s * i16::MAX as f32) as i16, 0i16)?
            }
            SampleFormat::U16 => {
                self.build_stream(samples, |s| ((s + 1.0) * 32767.5) as u16, 32768u16)?
            }
            other => return Err(PlayerError::UnsupportedSampleFormat(other)),
        };
        stream.play()?;
        debug!("playing {}", path.display());
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                debug!("pausing audio stream: {err}");
            }
        }
        self.finished.store(true, Ordering::SeqCst);
    }
}
