//! Clip selectors
//!
//! A selector names one clip to export:
//!
//! ```text
//! [Rename=]Source[+F-L][!mode]
//! [Rename=][first,last]Name[+F-L][!mode]
//! ```
//!
//! `Source` is an authored action whose natural frame range is shifted by the
//! optional signed offsets `F` and `L`. A leading `[first,last]` instead
//! selects a literal, inclusive frame range of whatever is currently playing.
//! `mode` picks the root-motion reference (`local`, `global` or `first`,
//! default `local`). The command line takes a `;`-separated list.
//!
//! Examples: `Walk`, `Walk+1-2!first`, `Jog=Run`, `[100,150]Idle!global`.

use std::fmt;
use std::str::FromStr;

use crate::error::{ExportError, Result};

/// Reference frame the root bones are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootMotion {
    /// Armature space; the armature's own motion is dropped
    #[default]
    Local,
    /// World space as of the clip's first frame
    Global,
    /// Relative to where the armature was at the clip's first frame
    First,
}

impl RootMotion {
    pub fn as_str(self) -> &'static str {
        match self {
            RootMotion::Local => "local",
            RootMotion::Global => "global",
            RootMotion::First => "first",
        }
    }
}

impl FromStr for RootMotion {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(RootMotion::Local),
            "global" => Ok(RootMotion::Global),
            "first" => Ok(RootMotion::First),
            other => Err(ExportError::UnknownRootMotion(other.to_string())),
        }
    }
}

impl fmt::Display for RootMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a clip's frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipSource {
    /// An authored action, sampled over its natural frame range
    Action(String),
    /// A literal inclusive frame range
    Frames { first: i32, last: i32 },
}

/// One parsed selector, before any scene lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSelector {
    pub source: ClipSource,
    pub output_name: String,
    pub root_motion: RootMotion,
    pub offset_first: i32,
    pub offset_last: i32,
}

impl ClipSelector {
    pub fn is_literal(&self) -> bool {
        matches!(self.source, ClipSource::Frames { .. })
    }
}

/// Parse a single selector
pub fn parse_selector(selector: &str) -> Result<ClipSelector> {
    let (rest, root_motion) = match selector.rsplit_once('!') {
        Some((rest, mode)) => (rest, mode.parse()?),
        None => (selector, RootMotion::Local),
    };

    let (rest, offset_first, offset_last) = split_offsets(rest).ok_or_else(|| {
        ExportError::MalformedSelector {
            selector: selector.to_string(),
            reason: "frame offset does not fit in 32 bits".to_string(),
        }
    })?;

    let (rename, rest) = match rest.rsplit_once('=') {
        Some((rename, source)) => (Some(rename), source),
        None => (None, rest),
    };

    let (source, name) = match parse_literal_range(rest) {
        Some((first, last, suffix)) => {
            let bound = |text: &str| {
                text.parse::<i32>()
                    .map_err(|_| ExportError::MalformedSelector {
                        selector: selector.to_string(),
                        reason: format!("frame {} does not fit in 32 bits", text),
                    })
            };
            let source = ClipSource::Frames {
                first: bound(first)?,
                last: bound(last)?,
            };
            (source, suffix)
        }
        None => (ClipSource::Action(rest.to_string()), rest),
    };

    Ok(ClipSelector {
        source,
        output_name: rename.unwrap_or(name).to_string(),
        root_motion,
        offset_first,
        offset_last,
    })
}

/// Parse a `;`-separated selector list, rejecting empty entries
pub fn parse_selector_list(list: &str) -> Result<Vec<ClipSelector>> {
    list.split(';')
        .map(|entry| {
            if entry.is_empty() {
                return Err(ExportError::MalformedSelector {
                    selector: list.to_string(),
                    reason: "empty clip selector".to_string(),
                });
            }
            parse_selector(entry)
        })
        .collect()
}

/// Strip a trailing `[+-]F[+-]L` pair
///
/// Returns offsets `(0, 0)` when the pair is not there, `None` when it is
/// there but out of range.
fn split_offsets(s: &str) -> Option<(&str, i32, i32)> {
    let Some((head, last)) = split_signed_suffix(s) else {
        return Some((s, 0, 0));
    };
    let Some((head, first)) = split_signed_suffix(head) else {
        return Some((s, 0, 0));
    };
    Some((head, first.parse().ok()?, last.parse().ok()?))
}

/// Split a trailing `[+-]digits` off `s`, returning the head and the signed text
fn split_signed_suffix(s: &str) -> Option<(&str, &str)> {
    let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let sign = s.len().checked_sub(digits + 1)?;
    match s.as_bytes()[sign] {
        b'+' | b'-' => Some((&s[..sign], &s[sign..])),
        _ => None,
    }
}

/// Split `[first,last]suffix` into its unsigned decimal bounds and suffix
fn parse_literal_range(s: &str) -> Option<(&str, &str, &str)> {
    let (range, suffix) = s.strip_prefix('[')?.split_once(']')?;
    let (first, last) = range.split_once(',')?;
    let is_number = |t: &str| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit());
    if !is_number(first) || !is_number(last) {
        return None;
    }
    Some((first, last, suffix))
}

/// A selector resolved to concrete inclusive frame bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub source: ClipSource,
    pub output_name: String,
    pub root_motion: RootMotion,
    pub first_frame: i32,
    pub last_frame: i32,
}

impl ClipRequest {
    /// Name stored in the action record
    pub fn action_name(&self) -> String {
        format!("{}!{}", self.output_name, self.root_motion)
    }

    /// Inclusive frame count, 0 for a reversed range
    pub fn frame_count(&self) -> u64 {
        let span = i64::from(self.last_frame) - i64::from(self.first_frame) + 1;
        span.max(0) as u64
    }
}

/// Longest clip the 32-bit global frame counter can hold
pub const MAX_CLIP_FRAMES: u64 = u32::MAX as u64;

/// Resolve selectors into requests in emission order
///
/// Literal ranges come first, then authored actions, each group in selector
/// order. `action_range` returns an action's natural `(first, last)` range,
/// which is rounded to the nearest frame (ties to even) before offsetting.
pub fn resolve_requests(
    selectors: &[ClipSelector],
    action_range: impl Fn(&str) -> Option<(f32, f32)>,
) -> Result<Vec<ClipRequest>> {
    let literals = selectors.iter().filter(|s| s.is_literal());
    let actions = selectors.iter().filter(|s| !s.is_literal());

    literals
        .chain(actions)
        .map(|selector| -> Result<ClipRequest> {
            let (first, last) = match &selector.source {
                ClipSource::Frames { first, last } => (i64::from(*first), i64::from(*last)),
                ClipSource::Action(name) => {
                    let (first, last) = action_range(name)
                        .ok_or_else(|| ExportError::ActionNotFound(name.clone()))?;
                    (first.round_ties_even() as i64, last.round_ties_even() as i64)
                }
            };
            let out_of_range = || ExportError::MalformedSelector {
                selector: selector.output_name.clone(),
                reason: format!(
                    "frames [{}{:+}, {}{:+}] do not fit in 32 bits",
                    first, selector.offset_first, last, selector.offset_last
                ),
            };
            let first_frame = i32::try_from(first + i64::from(selector.offset_first))
                .map_err(|_| out_of_range())?;
            let last_frame = i32::try_from(last + i64::from(selector.offset_last))
                .map_err(|_| out_of_range())?;
            if first_frame > last_frame {
                return Err(ExportError::EmptyFrameRange {
                    name: selector.output_name.clone(),
                    first: first_frame,
                    last: last_frame,
                });
            }

            let request = ClipRequest {
                source: selector.source.clone(),
                output_name: selector.output_name.clone(),
                root_motion: selector.root_motion,
                first_frame,
                last_frame,
            };
            if request.frame_count() > MAX_CLIP_FRAMES {
                return Err(ExportError::MalformedSelector {
                    selector: selector.output_name.clone(),
                    reason: format!("{} frames exceed the frame counter", request.frame_count()),
                });
            }
            Ok(request)
        })
        .collect()
}
