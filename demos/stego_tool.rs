// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Example: hide a file in a Y4M video, or recover it.
//!
//! ```text
//! stego_tool embed <cover.y4m> <payload-file> <stego.y4m> [step]
//! stego_tool extract <stego.y4m> <output-file> [step]
//! stego_tool capacity <cover.y4m>
//! ```
//!
//! Set `VCIPH_LOG=debug` for per-frame progress.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};

use tracing::Level;
use vciph_core::stego::capacity::{max_payload_len, stream_capacity_bits};
use vciph_core::video::FrameSource;
use vciph_core::{embed_stream, extract_stream, QimParams, Y4mReader, Y4mWriter};

fn usage() -> ! {
    eprintln!("Usage: stego_tool embed <cover.y4m> <payload-file> <stego.y4m> [step]");
    eprintln!("       stego_tool extract <stego.y4m> <output-file> [step]");
    eprintln!("       stego_tool capacity <cover.y4m>");
    std::process::exit(1);
}

fn init_logging() {
    let level = match std::env::var("VCIPH_LOG").as_deref() {
        Ok("trace") => Level::TRACE,
        Ok("debug") => Level::DEBUG,
        Ok("warn") => Level::WARN,
        Ok("error") => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Could not install log subscriber");
}

fn params_from(arg: Option<&String>) -> QimParams {
    match arg {
        Some(s) => QimParams::with_step(s.parse().expect("step must be a number")),
        None => QimParams::default(),
    }
}

fn open_y4m(path: &str) -> Y4mReader<BufReader<File>> {
    let file = File::open(path).expect("Could not open video");
    Y4mReader::new(BufReader::new(file)).expect("Not a valid Y4M stream")
}

fn main() {
    init_logging();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
    }

    match args[1].as_str() {
        "embed" if args.len() >= 5 => {
            let payload = fs::read(&args[3]).expect("Could not read payload");
            let reader = open_y4m(&args[2]);
            let out = File::create(&args[4]).expect("Could not create output");
            let mut writer = Y4mWriter::new(BufWriter::new(out), reader.header().clone())
                .expect("Could not write Y4M header");

            let report = embed_stream(reader, &mut writer, &payload, &params_from(args.get(5)))
                .expect("Embedding failed");
            match report.warning() {
                Some(w) => eprintln!("Warning: {w}"),
                None => println!(
                    "Embedded {} bytes ({} bits) in {} of {} frames",
                    payload.len(),
                    report.bits_embedded,
                    report.frames_modified,
                    report.frames_total
                ),
            }
            if report.adjusted_blocks > 0 || report.unverified_blocks > 0 {
                println!(
                    "Blocks re-targeted after rounding: {}, unverified: {}",
                    report.adjusted_blocks, report.unverified_blocks
                );
            }
        }
        "extract" if args.len() >= 4 => {
            let reader = open_y4m(&args[2]);
            match extract_stream(reader, &params_from(args.get(4))) {
                Ok(out) => {
                    fs::write(&args[3], &out.payload).expect("Could not write output");
                    println!(
                        "Recovered {} bytes from {} frames (min margin {:.3})",
                        out.payload.len(),
                        out.frames_scanned,
                        out.min_margin
                    );
                }
                Err(e) => {
                    eprintln!("Extraction failed: {e}");
                    std::process::exit(2);
                }
            }
        }
        "capacity" => {
            let mut reader = open_y4m(&args[2]);
            let (w, h) = (reader.header().width, reader.header().height);
            let mut frames = 0;
            while reader.next_frame().expect("Could not read frame").is_some() {
                frames += 1;
            }
            println!("{w}x{h}, {frames} frames");
            println!("Carrier bits: {}", stream_capacity_bits(w, h, frames));
            println!("Max payload:  {} bytes", max_payload_len(w, h, frames));
        }
        _ => usage(),
    }
}
