//! CLI color helpers.
//!
//! Every helper respects `NO_COLOR`, `FORCE_COLOR`, and TTY detection through
//! `owo-colors`' `if_supports_color()`. `--no-color` sets an in-process flag
//! that bypasses owo-colors entirely.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;
use owo_colors::Stream::{Stderr, Stdout};

static NO_COLOR_FLAG: AtomicBool = AtomicBool::new(false);

/// Call once from main.rs when `--no-color` is passed.
pub fn set_no_color() {
    NO_COLOR_FLAG.store(true, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }
}

const SIGNAL: Rgb = Rgb::from_hex(0x6FA8DC); // Screens, senders
const DELIVERED: Rgb = Rgb::from_hex(0x7BAE6A); // Routed to a receiver
const DROPPED: Rgb = Rgb::from_hex(0xD1A054); // Dropped by routing
const FAILED: Rgb = Rgb::from_hex(0xC0645A); // Receiver or token failure
const MUTED: Rgb = Rgb::from_hex(0x6A7080); // Line numbers, hints

fn no_color() -> bool {
    NO_COLOR_FLAG.load(Ordering::Relaxed)
}

fn paint(text: &str, rgb: Rgb) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(Stdout, |t| t.truecolor(rgb.r, rgb.g, rgb.b))
        .to_string()
}

pub fn signal(text: &str) -> String {
    paint(text, SIGNAL)
}

pub fn delivered(text: &str) -> String {
    paint(text, DELIVERED)
}

pub fn dropped(text: &str) -> String {
    paint(text, DROPPED)
}

pub fn failed(text: &str) -> String {
    paint(text, FAILED)
}

pub fn muted(text: &str) -> String {
    paint(text, MUTED)
}

/// Apply error styling (for stderr messages).
pub fn error(text: &str) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(Stderr, |t| t.truecolor(FAILED.r, FAILED.g, FAILED.b))
        .to_string()
}

/// Apply warning styling (for stderr messages).
pub fn warning(text: &str) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(Stderr, |t| t.truecolor(DROPPED.r, DROPPED.g, DROPPED.b))
        .to_string()
}
