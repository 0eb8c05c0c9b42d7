//! Formats command - list the registry.

use ddsforge::format::CodecBackend;
use ddsforge::FormatRegistry;

/// Print every known format with its capabilities.
pub fn run() {
    println!("{:<28} {:>6} {:<8} {:<4} {:<6}", "FORMAT", "BPP", "CODEC", "CUBE", "VOLUME");
    for info in FormatRegistry::global().iter() {
        let bits = match info.block {
            Some(block) => format!("{}B/blk", block.bytes_per_block),
            None => info.bits_per_pixel.to_string(),
        };
        let codec = match info.codec_backend {
            CodecBackend::Copy => "copy",
            CodecBackend::BlockCompression => "bc",
            CodecBackend::Astc => "astc",
        };
        println!(
            "{:<28} {:>6} {:<8} {:<4} {:<6}",
            info.name,
            bits,
            codec,
            yes_no(info.supports_cubemap),
            yes_no(info.supports_volume)
        );
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
