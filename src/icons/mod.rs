mod animation;
mod paths;
mod provider;

use crate::theme::ThemeError;
use thiserror::Error;

pub use animation::{AnimationDescriptor, FrameRange};
pub use paths::IconPathTable;
pub use provider::{IconEvent, IconProvider, IconSet};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IconError {
    #[error("Pattern {pattern:?} must contain exactly one {{s}} placeholder, found {found}")]
    PlaceholderCount { pattern: String, found: usize },

    #[error("Invalid frame range {first}..={last}: frames are 1-based and first must not exceed last")]
    InvalidFrameRange { first: u32, last: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error(transparent)]
    Icons(#[from] IconError),

    #[error(transparent)]
    Theme(#[from] ThemeError),
}
