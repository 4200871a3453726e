//! VoxReel Processing Core
//!
//! Turns clip records into an edit:
//! - **Synthesis:** ordered clips and cutaways to a gapless segment timeline
//! - **Captions:** one caption per clip, made pairwise disjoint
//! - **Layout:** caption wrapping and box geometry as draw instructions
//!
//! This crate is pure computation with no I/O.
//! All inputs are data; all outputs are data.

pub mod captions;
pub mod layout;
pub mod synthesis;

pub use captions::resolve_overlaps;
pub use layout::{layout, CaptionBlock, CaptionLayout};
pub use synthesis::{synthesize, CutawayTiming, SynthesisError, Timeline, TimelineSynthesizer};
