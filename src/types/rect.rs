//! Pixel rectangles resolved from catalog coordinates.

use std::fmt;

use serde::Serialize;

use crate::error::{SlicerError, Result};

/// A crop region inside a converted container image.
///
/// `width` and `height` are always derived from a corner pair, never copied
/// from raw catalog columns. Either may be zero: catalogs use zero-size rows
/// as markers and those are kept rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalize a raw `(x1, y1, x2, y2)` quadruple.
    ///
    /// An axis whose second coordinate does not exceed the first has no extent.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }

    /// Parse the four raw coordinate tokens of a catalog row.
    ///
    /// Fails on the first token that is not a non-negative integer.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        if tokens.len() != 4 {
            return Err(SlicerError::Parse {
                message: format!("Expected 4 coordinates, found {}", tokens.len()),
                help: Some("Rows end with x1 y1 x2 y2".to_string()),
            });
        }

        let mut values = [0u32; 4];
        for (slot, token) in values.iter_mut().zip(tokens) {
            let token = token.as_ref();
            *slot = token.parse().map_err(|_| SlicerError::Parse {
                message: format!("Invalid coordinate '{}'", token),
                help: Some("Coordinates must be non-negative integers".to_string()),
            })?;
        }

        let [x1, y1, x2, y2] = values;
        Ok(Self::from_corners(x1, y1, x2, y2))
    }

    /// True when there is nothing to crop along at least one axis.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check the rectangle lies within an image of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        right <= width as u64 && bottom <= height as u64
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_positive_extent() {
        assert_eq!(Rect::from_corners(0, 0, 10, 10), Rect::new(0, 0, 10, 10));
        assert_eq!(Rect::from_corners(4, 6, 20, 7), Rect::new(4, 6, 16, 1));
    }

    #[test]
    fn test_from_corners_equal_clamps_to_zero() {
        assert_eq!(
            Rect::from_corners(100, 50, 100, 80),
            Rect::new(100, 50, 0, 30)
        );
    }

    #[test]
    fn test_from_corners_reversed_clamps_to_zero() {
        let rect = Rect::from_corners(30, 30, 10, 5);
        assert_eq!(rect, Rect::new(30, 30, 0, 0));
        assert!(rect.is_degenerate());
    }

    #[test]
    fn test_from_corners_clamp_is_per_axis() {
        for x2 in 0..=20u32 {
            for y2 in 0..=20u32 {
                let rect = Rect::from_corners(10, 10, x2, y2);
                let expected_w = if x2 > 10 { x2 - 10 } else { 0 };
                let expected_h = if y2 > 10 { y2 - 10 } else { 0 };
                assert_eq!((rect.width, rect.height), (expected_w, expected_h));
            }
        }
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(
            Rect::parse(&["5", "5", "5", "5"]).unwrap(),
            Rect::new(5, 5, 0, 0)
        );
        assert_eq!(
            Rect::parse(&["1", "2", "11", "22"]).unwrap(),
            Rect::new(1, 2, 10, 20)
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(Rect::parse(&["1", "two", "3", "4"]).is_err());
        assert!(Rect::parse(&["-1", "2", "3", "4"]).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_count() {
        assert!(Rect::parse(&["1", "2", "3"]).is_err());
        assert!(Rect::parse(&["1", "2", "3", "4", "5"]).is_err());
    }

    #[test]
    fn test_fits_within() {
        let rect = Rect::new(2, 2, 4, 4);
        assert!(rect.fits_within(6, 6));
        assert!(!rect.fits_within(5, 6));
        assert!(Rect::new(6, 6, 0, 0).fits_within(6, 6));
        assert!(!Rect::new(u32::MAX, 0, 2, 1).fits_within(10, 10));
    }

    #[test]
    fn test_display() {
        assert_eq!(Rect::new(1, 2, 3, 4).to_string(), "3x4+1+2");
    }
}
