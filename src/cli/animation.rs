use crate::core::models::Theme;
use crate::core::settings::Settings;
use crate::icons::{AnimationDescriptor, FrameRange, IconSet};
use crate::theme::{appearance_for, AppearanceQuery, FixedAppearance};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnimationArg {
    Lock,
    Unlock,
    Spinner,
}

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub speed: Option<u64>,
    pub range: Option<String>,
}

pub fn run(
    animation: AnimationArg,
    theme: Option<Theme>,
    json: bool,
    frames: bool,
    overrides: &Overrides,
) -> Result<()> {
    let settings = Settings::load()?;

    let appearance: Rc<dyn AppearanceQuery> = match theme {
        Some(theme) => Rc::new(FixedAppearance(theme)),
        None => appearance_for(settings.theme.mode)
            .context("Failed to read desktop appearance")?,
    };

    let icons = IconSet::new(settings.icons, appearance).context("Invalid icon path table")?;
    let descriptor = apply_overrides(describe(&icons, animation), overrides)?;

    if json {
        if frames {
            println!("{}", serde_json::to_string_pretty(&descriptor.frame_paths())?);
        } else {
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
    } else {
        print_text_output(&descriptor, frames);
    }

    Ok(())
}

fn describe(icons: &IconSet, animation: AnimationArg) -> AnimationDescriptor {
    match animation {
        AnimationArg::Lock => icons.lock_animation(false),
        AnimationArg::Unlock => icons.unlock_animation(),
        AnimationArg::Spinner => icons.spinner_animation(),
    }
}

fn apply_overrides(
    mut descriptor: AnimationDescriptor,
    overrides: &Overrides,
) -> Result<AnimationDescriptor> {
    if let Some(range) = &overrides.range {
        descriptor.frames = parse_frame_range(range)?;
    }
    if let Some(speed) = overrides.speed {
        descriptor = descriptor.with_speed(speed);
    }
    Ok(descriptor)
}

/// Accepts `FIRST..LAST` or `FIRST..=LAST`; both ends are included.
fn parse_frame_range(text: &str) -> Result<FrameRange> {
    let Some((first, last)) = text.split_once("..") else {
        bail!("Frame range {text:?} must look like FIRST..LAST");
    };
    let last = last.strip_prefix('=').unwrap_or(last);

    let first: u32 = first
        .trim()
        .parse()
        .with_context(|| format!("Invalid first frame in {text:?}"))?;
    let last: u32 = last
        .trim()
        .parse()
        .with_context(|| format!("Invalid last frame in {text:?}"))?;

    Ok(FrameRange::new(first, last)?)
}

fn print_text_output(descriptor: &AnimationDescriptor, frames: bool) {
    if frames {
        for path in descriptor.frame_paths() {
            println!("{}", path.display());
        }
        return;
    }

    println!("pattern: {}", descriptor.path_pattern);
    println!(
        "frames:  {}-{} ({} frames)",
        descriptor.frames.first(),
        descriptor.frames.last(),
        descriptor.frames.count()
    );
    println!("speed:   {:?} per frame", descriptor.frame_duration());
    println!("reverse: {}", descriptor.reverse);
    println!("repeat:  {}", descriptor.repeat);
}
