use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Arg, ArgAction, Command};

use playcore::config::PlayerConfig;
use playcore::source::open_source;
use playcore::sync::ClockSyncEngine;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("input")
                .value_name("FILE|URI")
                .help("Media file path or stream URI to play.")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file overriding the defaults."),
        )
        .arg(
            Arg::new("hw")
                .long("hw")
                .action(ArgAction::SetTrue)
                .help("Request hardware accelerated decoding (software fallback)."),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .action(ArgAction::SetTrue)
                .help("Print codec information and the frame index summary, then exit."),
        )
        .arg(
            Arg::new("seek")
                .long("seek")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(f64))
                .help("Issue a seek to this position two seconds into playback."),
        )
        .get_matches();

    let input = matches.get_one::<String>("input").cloned().unwrap();
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => PlayerConfig::load(&PathBuf::from(path))?,
        None => PlayerConfig::default(),
    };
    if matches.get_flag("hw") {
        config.decoder.use_hw_accel = true;
    }

    let source = open_source(&input, &config.decoder)
        .map_err(|err| anyhow::anyhow!("could not load {input}: {err}"))?;

    let info = source.codec_info();
    println!("container:  {}", info.container_format);
    println!(
        "video:      {} {} @ {}",
        info.video_codec, info.video_resolution, info.video_bitrate
    );
    if info.has_audio {
        println!(
            "audio:      {} {} {} @ {}",
            info.audio_codec, info.audio_sample_rate, info.audio_channels, info.audio_bitrate
        );
    }
    println!("duration:   {:.2}s", source.duration());
    println!(
        "keyframes:  {} key / {} predicted",
        source.iframe_timestamps().len(),
        source.pframe_timestamps().len()
    );

    if matches.get_flag("info") {
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Release);
        })?;
    }

    let engine = Arc::new(ClockSyncEngine::new(config.sync.clone()));
    let video_queue = source.video_queue();
    let audio_queue = source.audio_queue();
    // Audio origin pts in microseconds, u64::MAX until the first frame lands.
    let first_audio_us = Arc::new(AtomicU64::new(u64::MAX));

    source.start();

    // Stand-in for the audio output callback: drains audio frames and drives
    // the reference clock.
    let audio_consumer = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        let first_audio_us = Arc::clone(&first_audio_us);
        thread::spawn(move || {
            let mut frames = 0u64;
            while !stop.load(Ordering::Acquire) {
                let Some(frame) = audio_queue.wait_pop(Duration::from_millis(100)) else {
                    continue;
                };
                first_audio_us
                    .fetch_min((frame.pts * 1_000_000.0) as u64, Ordering::Relaxed);
                engine.set_audio_clock(frame.pts);
                frames += 1;
            }
            frames
        })
    };

    // Stand-in for the render loop: drains video frames through the sync
    // engine and counts presentations.
    let video_consumer = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        let first_audio_us = Arc::clone(&first_audio_us);
        thread::spawn(move || {
            let mut presented = 0u64;
            let mut dropped = 0u64;
            while !stop.load(Ordering::Acquire) {
                let Some(frame) = video_queue.wait_pop(Duration::from_millis(100)) else {
                    continue;
                };
                if !engine.is_initialized() {
                    let origin = first_audio_us.load(Ordering::Relaxed);
                    if origin == u64::MAX {
                        // No audio origin yet: put the frame back and retry.
                        video_queue.push_front(frame);
                        thread::sleep(Duration::from_millis(5));
                        continue;
                    }
                    engine.initialize(frame.pts, origin as f64 / 1_000_000.0);
                }
                if engine.sync_video(&frame) {
                    presented += 1;
                } else {
                    dropped += 1;
                }
            }
            (presented, dropped)
        })
    };

    let seek_target = matches.get_one::<f64>("seek").copied();
    let started = Instant::now();
    let duration = source.duration();
    let mut seek_issued = false;
    while !stop.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(200));
        if let Some(target) = seek_target
            && !seek_issued
            && started.elapsed() >= Duration::from_secs(2)
        {
            if source.seek(target) {
                engine.reset();
                log::info!("seek to {:.2}s requested", target);
            }
            seek_issued = true;
        }
        // Exit once the source ran out and the consumers caught up.
        if duration > 0.0
            && started.elapsed().as_secs_f64() > duration + 1.0
            && source.video_queue().is_empty()
            && source.audio_queue().is_empty()
        {
            break;
        }
    }

    stop.store(true, Ordering::Release);
    source.stop();
    engine.reset();

    let audio_frames = audio_consumer.join().unwrap_or(0);
    let (presented, dropped) = video_consumer.join().unwrap_or((0, 0));
    println!(
        "played {:.2}s: {} video frames presented, {} dropped, {} audio frames",
        started.elapsed().as_secs_f64(),
        presented,
        dropped,
        audio_frames
    );

    Ok(())
}
