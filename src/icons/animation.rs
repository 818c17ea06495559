use crate::icons::paths::PathPattern;
use crate::icons::IconError;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SPEED_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameRange {
    first: u32,
    last: u32,
}

impl FrameRange {
    pub fn new(first: u32, last: u32) -> Result<Self, IconError> {
        if first == 0 || first > last {
            return Err(IconError::InvalidFrameRange { first, last });
        }
        Ok(Self { first, last })
    }

    /// Compile-time checked range for built-in sequences.
    pub const fn fixed(first: u32, last: u32) -> Self {
        assert!(first >= 1 && first <= last, "frame range must be 1-based and ordered");
        Self { first, last }
    }

    pub const fn first(&self) -> u32 {
        self.first
    }

    pub const fn last(&self) -> u32 {
        self.last
    }

    pub const fn count(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<u32> {
        self.first..=self.last
    }
}

// Building a descriptor never touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationDescriptor {
    pub path_pattern: PathPattern,
    pub frames: FrameRange,
    /// Milliseconds per frame.
    pub speed: u64,
    pub reverse: bool,
    pub repeat: bool,
}

impl AnimationDescriptor {
    pub fn from_file_sequence(path_pattern: PathPattern, frames: FrameRange) -> Self {
        Self {
            path_pattern,
            frames,
            speed: DEFAULT_SPEED_MS,
            reverse: false,
            repeat: false,
        }
    }

    pub fn with_speed(mut self, speed: u64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.speed)
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.path_pattern.interpolate(index)
    }

    pub fn frame_paths(&self) -> Vec<PathBuf> {
        let mut indices: Vec<u32> = self.frames.indices().collect();
        if self.reverse {
            indices.reverse();
        }
        indices.into_iter().map(|i| self.frame_path(i)).collect()
    }
}
