//! Miscellaneous utility functions to use across modules

use alloc::string::String;
use core::fmt::Write;

/// Format a byte buffer like hexdump, 16 bytes per line
///
/// `offset` is the address of the first byte, used to label the lines.
pub fn format_multiline_buffer(buffer: &[u8], offset: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in buffer.chunks(16).enumerate() {
        let _ = write!(out, "{:08X}:", offset + i * 16);
        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                out.push(' ');
            }
            let _ = write!(out, " {:02X}", byte);
        }
        // Pad a short last line so the ASCII column lines up
        for j in chunk.len()..16 {
            if j == 8 {
                out.push(' ');
            }
            out.push_str("   ");
        }

        out.push_str("  ");
        for byte in chunk {
            out.push(if byte.is_ascii_graphic() || *byte == b' ' {
                *byte as char
            } else {
                '.'
            });
        }
        out.push('\n');
    }
    out
}

pub fn print_multiline_buffer(buffer: &[u8], offset: usize) {
    print!("{}", format_multiline_buffer(buffer, offset));
}
