//! RGB colours and the 24-bit id encoding used by colour-map picking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MindGraphError, MindGraphResult};

/// An opaque 8-bit-per-channel RGB colour.
///
/// Serialized as a `#rrggbb` string so style configs stay readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Color {
	pub const BLACK: Color = Color::rgb(0, 0, 0);
	pub const WHITE: Color = Color::rgb(255, 255, 255);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses `#rrggbb` (the leading `#` is optional, hex digits are case
	/// insensitive).
	pub fn from_hex(hex: &str) -> MindGraphResult<Self> {
		let digits = hex.trim().trim_start_matches('#');
		if digits.len() != 6 || !digits.is_ascii() {
			return Err(MindGraphError::InvalidColor(hex.to_string()));
		}
		let channel = |i: usize| {
			u8::from_str_radix(&digits[i..i + 2], 16)
				.map_err(|_| MindGraphError::InvalidColor(hex.to_string()))
		};
		Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
	}

	pub fn to_hex(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl FromStr for Color {
	type Err = MindGraphError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_hex(s)
	}
}

impl TryFrom<String> for Color {
	type Error = MindGraphError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::from_hex(&value)
	}
}

impl From<Color> for String {
	fn from(color: Color) -> Self {
		color.to_hex()
	}
}

/// Bijective mapping between integer keys and RGB colours.
///
/// Key 0 is reserved for "nothing drawn here" (the cleared background), which
/// leaves `1..=16_777_215` for nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorKey(u32);

impl ColorKey {
	pub const MAX: u32 = 0x00ff_ffff;

	pub fn new(key: u32) -> MindGraphResult<Self> {
		if key == 0 || key > Self::MAX {
			return Err(MindGraphError::ColorKeyOutOfRange(key));
		}
		Ok(Self(key))
	}

	pub fn get(self) -> u32 {
		self.0
	}

	pub fn to_color(self) -> Color {
		Color::rgb(
			(self.0 & 0xff) as u8,
			((self.0 & 0xff00) >> 8) as u8,
			((self.0 & 0xff_0000) >> 16) as u8,
		)
	}

	/// Inverse of [`ColorKey::to_color`]. Black decodes to `None`.
	pub fn from_color(color: Color) -> Option<Self> {
		let key = u32::from(color.r) | (u32::from(color.g) << 8) | (u32::from(color.b) << 16);
		(key != 0).then_some(Self(key))
	}
}
