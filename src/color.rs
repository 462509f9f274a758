//! RGBA colors as used by the color converter and `ladder()`

use crate::converter::TokenCursor;
use crate::error::{Result, StyleError};
use crate::lexer::{format_number, TokenType};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses the digits of a hex color (without the leading `#`).
    pub fn from_hex(hex: &str) -> Result<Color> {
        let invalid = || StyleError::conversion("", format!("Invalid hex color: #{}", hex));
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map_err(|_| invalid());
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

        match hex.len() {
            // RGB -> RRGGBB
            3 => Ok(Color::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, 255)),
            // RGBA -> RRGGBBAA
            4 => Ok(Color::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, digit(3)? * 17)),
            6 => Ok(Color::new(pair(0)?, pair(2)?, pair(4)?, 255)),
            8 => Ok(Color::new(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => Err(invalid()),
        }
    }

    pub fn named(name: &str) -> Option<Color> {
        let rgb = match name.to_ascii_lowercase().as_str() {
            "black" => 0x000000,
            "white" => 0xffffff,
            "red" => 0xff0000,
            "green" => 0x008000,
            "lime" => 0x00ff00,
            "blue" => 0x0000ff,
            "yellow" => 0xffff00,
            "cyan" | "aqua" => 0x00ffff,
            "magenta" | "fuchsia" => 0xff00ff,
            "gray" | "grey" => 0x808080,
            "silver" => 0xc0c0c0,
            "maroon" => 0x800000,
            "olive" => 0x808000,
            "purple" => 0x800080,
            "teal" => 0x008080,
            "navy" => 0x000080,
            "orange" => 0xffa500,
            "transparent" => return Some(Color::TRANSPARENT),
            _ => return None,
        };
        Some(Color::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255))
    }

    /// HSB brightness in `[0, 1]`: the largest channel.
    pub fn brightness(&self) -> f64 {
        f64::from(self.r.max(self.g).max(self.b)) / 255.0
    }

    pub fn alpha(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.alpha() * 1000.0).round() / 1000.0;
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, format_number(alpha))
        }
    }
}

/// Parses a hex color, a named color or `rgb()`/`rgba()`.
pub fn parse_color(cursor: &mut TokenCursor<'_>) -> Result<Color> {
    let Some(token) = cursor.next_non_whitespace() else {
        return Err(StyleError::conversion("", "Color expected"));
    };

    match &token.token_type {
        TokenType::Hash(hex) => Color::from_hex(hex),
        TokenType::Ident(name) => Color::named(name)
            .ok_or_else(|| StyleError::conversion("", format!("Unknown color name: {}", name))),
        TokenType::Function(name)
            if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") =>
        {
            parse_rgb_arguments(cursor)
        }
        _ => Err(StyleError::conversion("", format!("Color expected, found '{}'", token))),
    }
}

fn parse_rgb_arguments(cursor: &mut TokenCursor<'_>) -> Result<Color> {
    let mut components = Vec::new();

    loop {
        let Some(token) = cursor.next_non_whitespace() else {
            return Err(StyleError::conversion("", "Unterminated rgb()"));
        };
        match &token.token_type {
            TokenType::Number(n) => components.push((*n, false)),
            TokenType::Percentage(n) => components.push((*n, true)),
            TokenType::Comma | TokenType::Delim('/') => {}
            TokenType::RightParen => break,
            _ => {
                return Err(StyleError::conversion(
                    "",
                    format!("Unexpected '{}' in rgb()", token),
                ))
            }
        }
    }

    if components.len() != 3 && components.len() != 4 {
        return Err(StyleError::conversion(
            "",
            format!("rgb() expects 3 or 4 components, found {}", components.len()),
        ));
    }

    let channel = |(value, percent): (f64, bool)| {
        let scaled = if percent { value * 2.55 } else { value };
        scaled.round().clamp(0.0, 255.0) as u8
    };
    let alpha = components.get(3).map_or(255, |&(value, percent)| {
        let fraction = if percent { value / 100.0 } else { value };
        (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
    });

    Ok(Color::new(
        channel(components[0]),
        channel(components[1]),
        channel(components[2]),
        alpha,
    ))
}
