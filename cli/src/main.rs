mod wav;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tonemodem_core::{Decoder, Encoder, ModemConfig, StreamDecoder, StreamSnapshot};
use wav::{read_wav, write_wav, CliError};

#[derive(Parser)]
#[command(name = "tonemodem")]
#[command(about = "Acoustic FSK modem for short text messages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a text message to a WAV audio file
    Encode {
        /// Message text (joined with spaces)
        #[arg(value_name = "MESSAGE", default_value = "HELLO")]
        message: Vec<String>,

        /// Output WAV file
        #[arg(short, long, value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Output sample rate in Hz
        #[arg(long, default_value_t = tonemodem_core::SAMPLE_RATE)]
        sample_rate: u32,

        /// Omit preamble and postamble
        #[arg(long)]
        unframed: bool,

        #[command(flatten)]
        modem: ModemArgs,
    },

    /// Decode a complete WAV recording
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Recover alignment without frame markers
        #[arg(long)]
        unframed: bool,

        #[command(flatten)]
        modem: ModemArgs,
    },

    /// Replay a WAV recording through the streaming decoder
    Listen {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Capture block size in milliseconds
        #[arg(long, default_value_t = 100)]
        chunk_ms: u64,

        /// Pace blocks at their real duration
        #[arg(long)]
        realtime: bool,

        #[command(flatten)]
        modem: ModemArgs,
    },
}

/// Parameters sender and receiver must agree on
#[derive(Args, Clone)]
struct ModemArgs {
    /// Symbol tone duration in milliseconds
    #[arg(long, default_value_t = 200.0)]
    tone_ms: f32,

    /// Tone amplitude in (0, 1]
    #[arg(long, default_value_t = tonemodem_core::AMPLITUDE)]
    amplitude: f32,

    /// Linear fade at each tone edge in milliseconds
    #[arg(long, default_value_t = 0.0)]
    fade_ms: f32,

    /// Frequency match tolerance in Hz
    #[arg(long, default_value_t = tonemodem_core::DEFAULT_TOLERANCE_HZ)]
    tolerance: f32,

    /// Spectral entropy above which a symbol is flagged uncertain (bits)
    #[arg(long, default_value_t = tonemodem_core::DEFAULT_ENTROPY_THRESHOLD)]
    entropy_threshold: f32,
}

impl ModemArgs {
    fn config(&self, sample_rate: u32) -> ModemConfig {
        ModemConfig::default()
            .with_sample_rate(sample_rate)
            .with_tone_duration(self.tone_ms / 1000.0)
            .with_amplitude(self.amplitude)
            .with_fade_duration(self.fade_ms / 1000.0)
            .with_tolerance(self.tolerance)
            .with_entropy_threshold(self.entropy_threshold)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            message,
            output,
            sample_rate,
            unframed,
            modem,
        } => encode_command(&message.join(" "), &output, modem.config(sample_rate), unframed)?,
        Commands::Decode {
            input,
            unframed,
            modem,
        } => decode_command(&input, &modem, unframed)?,
        Commands::Listen {
            input,
            chunk_ms,
            realtime,
            modem,
        } => listen_command(&input, &modem, chunk_ms, realtime).await?,
    }

    Ok(())
}

fn encode_command(
    message: &str,
    output_path: &Path,
    config: ModemConfig,
    unframed: bool,
) -> Result<(), CliError> {
    let encoder = Encoder::new(&config)?;
    let frame = encoder.frame(message);
    if frame.message().chars().count() != message.chars().count() {
        log::warn!("Unsupported characters dropped, sending {:?}", frame.message());
    }

    let samples = if unframed {
        encoder.encode_unframed(message)
    } else {
        encoder.encode_frame(&frame)
    };
    println!(
        "Encoded {:?} to {} audio samples ({:.2} s)",
        frame.message(),
        samples.len(),
        samples.len() as f32 / config.sample_rate as f32
    );

    write_wav(output_path, &samples, config.sample_rate)?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

fn decode_command(input_path: &Path, modem: &ModemArgs, unframed: bool) -> Result<(), CliError> {
    let recording = read_wav(input_path)?;
    println!("Extracted {} samples", recording.samples.len());

    let mut decoder = Decoder::new(&modem.config(recording.sample_rate))?;
    let message = if unframed {
        decoder.decode_unframed(&recording.samples)
    } else {
        decoder.decode_message(&recording.samples)
    };

    if message.text.is_empty() {
        log::warn!("No message found in {}", input_path.display());
    }
    println!("Decoded message: '{}'", message);
    Ok(())
}

/// Simulated live capture: a producer task sends fixed-size blocks over a
/// bounded channel to a blocking consumer that owns the stream decoder.
/// Progress reaches this task as snapshots on a watch channel.
async fn listen_command(
    input_path: &Path,
    modem: &ModemArgs,
    chunk_ms: u64,
    realtime: bool,
) -> Result<(), CliError> {
    let recording = read_wav(input_path)?;
    let config = modem.config(recording.sample_rate);
    // Surface configuration errors before any task is started
    config.validate()?;

    let block_len = ((recording.sample_rate as u64 * chunk_ms.max(1)) / 1000).max(1) as usize;
    let block_duration = Duration::from_millis(chunk_ms.max(1));

    let (block_tx, mut block_rx) = mpsc::channel::<Vec<f32>>(32);
    let (snapshot_tx, mut snapshot_rx) = watch::channel(StreamSnapshot {
        message: String::new(),
        state: tonemodem_core::DecoderState::Unsynchronized,
        symbols: 0,
    });

    let samples = recording.samples;
    let producer = tokio::spawn(async move {
        for block in samples.chunks(block_len) {
            if block_tx.send(block.to_vec()).await.is_err() {
                // Decoder finished and hung up
                break;
            }
            if realtime {
                tokio::time::sleep(block_duration).await;
            }
        }
    });

    let consumer = tokio::task::spawn_blocking(move || -> Result<StreamSnapshot, CliError> {
        let mut decoder = StreamDecoder::new(&config)?;
        while let Some(block) = block_rx.blocking_recv() {
            decoder.feed(&block);
            let snapshot = decoder.snapshot();
            snapshot_tx.send_if_modified(|current| {
                if *current == snapshot {
                    false
                } else {
                    *current = snapshot.clone();
                    true
                }
            });
            if snapshot.is_complete() {
                break;
            }
        }
        Ok(decoder.snapshot())
    });

    let mut last_printed = String::new();
    while snapshot_rx.changed().await.is_ok() {
        let snapshot = snapshot_rx.borrow_and_update().clone();
        if !snapshot.is_complete() && snapshot.message != last_printed {
            println!("Partial: '{}'", snapshot.message);
            last_printed = snapshot.message;
        }
    }

    let final_snapshot = consumer.await??;
    producer.await?;

    if !final_snapshot.is_complete() {
        log::warn!(
            "Stream ended without postamble ({} symbols received)",
            final_snapshot.symbols
        );
    }
    println!("Decoded message: '{}'", final_snapshot.message);
    Ok(())
}
