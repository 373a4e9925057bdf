use std::str::FromStr;

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::ProcessingResult;
use crate::traits::{offload, TransformStep};

/// Rotation by quarter turns clockwise, optionally followed by a horizontal flip.
///
/// Every rotate/flip combination collapses to one of eight values: `0..=3`
/// are plain rotations, `4..=7` the same rotations plus a horizontal flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateFlip(u8);

const NAMES: &[(&str, u8)] = &[
    ("rotatenoneflipnone", 0),
    ("rotate90flipnone", 1),
    ("rotate180flipnone", 2),
    ("rotate270flipnone", 3),
    ("rotatenoneflipx", 4),
    ("rotate90flipx", 5),
    ("rotate180flipx", 6),
    ("rotate270flipx", 7),
    ("rotate180flipxy", 0),
    ("rotate270flipxy", 1),
    ("rotatenoneflipxy", 2),
    ("rotate90flipxy", 3),
    ("rotate180flipy", 4),
    ("rotate270flipy", 5),
    ("rotatenoneflipy", 6),
    ("rotate90flipy", 7),
];

impl RotateFlip {
    pub fn quarter_turns(&self) -> u8 {
        self.0 % 4
    }

    pub fn flips_horizontally(&self) -> bool {
        self.0 >= 4
    }

    pub fn is_identity(&self) -> bool {
        self.0 == 0
    }

    pub fn render(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let rotated = match self.quarter_turns() {
            1 => image.rotate90(),
            2 => image.rotate180(),
            3 => image.rotate270(),
            _ => image,
        };
        Ok(if self.flips_horizontally() {
            rotated.fliph()
        } else {
            rotated
        })
    }
}

impl FromStr for RotateFlip {
    type Err = ();

    /// Accepts the combination names case-insensitively or a number `0..=7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return if n < 8 { Ok(RotateFlip(n)) } else { Err(()) };
        }
        let key = s.to_ascii_lowercase();
        NAMES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, v)| RotateFlip(*v))
            .ok_or(())
    }
}

#[async_trait]
impl TransformStep for RotateFlip {
    fn name(&self) -> &'static str {
        "RotateFlip"
    }

    fn fragment(&self) -> String {
        format!("RotateFlip{}", self.0)
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = *self;
        offload(move || step.render(image)).await
    }
}
