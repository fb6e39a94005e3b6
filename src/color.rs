//! RGBA color values with forgiving parsing.
//!
//! Every color in a [`crate::config::GlitchConfig`] is normalized to a
//! 4-byte RGBA tuple regardless of how the document spelled it: a 6- or
//! 8-digit hex string (leading `#` optional), or a 3/4-element integer
//! sequence. Anything unparseable falls back to opaque white.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// Parse a hex color string. 6 digits yield alpha 255, 8 digits carry
    /// their own alpha. Returns `None` for any other shape.
    pub fn from_hex(input: &str) -> Option<Self> {
        let digits = input.trim().trim_start_matches('#');
        let byte_at = |index: usize| u8::from_str_radix(digits.get(index..index + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self([byte_at(0)?, byte_at(2)?, byte_at(4)?, 255])),
            8 => Some(Self([byte_at(0)?, byte_at(2)?, byte_at(4)?, byte_at(6)?])),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }

    fn from_components(components: &[i64]) -> Option<Self> {
        let clamp = |value: i64| value.clamp(0, 255) as u8;
        match components {
            [r, g, b] => Some(Self([clamp(*r), clamp(*g), clamp(*b), 255])),
            [r, g, b, a] => Some(Self([clamp(*r), clamp(*g), clamp(*b), clamp(*a)])),
            _ => None,
        }
    }

    pub fn skia(&self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl Default for Rgba {
    fn default() -> Self {
        WHITE
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        for channel in self.0 {
            tuple.serialize_element(&channel)?;
        }
        tuple.end()
    }
}

struct RgbaVisitor;

impl<'de> Visitor<'de> for RgbaVisitor {
    type Value = Rgba;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a hex color string or a 3/4-element integer sequence")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Rgba, E> {
        Ok(Rgba::from_hex(value).unwrap_or(WHITE))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Rgba, A::Error> {
        let mut components = Vec::with_capacity(4);
        while let Some(value) = seq.next_element::<i64>()? {
            components.push(value);
        }
        Ok(Rgba::from_components(&components).unwrap_or(WHITE))
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Rgba, D::Error> {
        deserializer.deserialize_any(RgbaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_digit_hex_gets_opaque_alpha() {
        let color = Rgba::from_hex("#4FE1B8").expect("should parse");
        assert_eq!(color, Rgba::new(0x4F, 0xE1, 0xB8, 255));
    }

    #[test]
    fn eight_digit_hex_carries_alpha() {
        let color = Rgba::from_hex("FF3232B4").expect("should parse");
        assert_eq!(color, Rgba::new(255, 50, 50, 180));
    }

    #[test]
    fn hex_round_trips_every_channel() {
        for sample in [
            Rgba::new(0, 0, 0, 0),
            Rgba::new(255, 255, 255, 255),
            Rgba::new(17, 34, 51, 68),
            Rgba::new(200, 1, 254, 9),
        ] {
            let decoded = Rgba::from_hex(&sample.to_hex()).expect("round trip should parse");
            assert_eq!(decoded, sample);
        }
    }

    #[test]
    fn unparseable_input_falls_back_to_white() {
        let color: Rgba = serde_json::from_str("\"#xyz\"").expect("deserialize should not fail");
        assert_eq!(color, WHITE);
        let color: Rgba = serde_json::from_str("[1, 2]").expect("deserialize should not fail");
        assert_eq!(color, WHITE);
    }

    #[test]
    fn sequence_form_round_trips_through_json() {
        let color = Rgba::new(255, 50, 50, 180);
        let json = serde_json::to_string(&color).expect("serialize");
        assert_eq!(json, "[255,50,50,180]");
        let back: Rgba = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, color);
    }
}
