//! VoxReel Project Model
//!
//! Defines the data contracts shared by the VoxReel pipeline:
//! - **Composition:** clips, cutaways, and the composition file
//! - **Words:** aligned word timings
//! - **Segments:** the gapless output timeline
//! - **Captions:** caption entries and time-gated draw instructions
//! - **Render plan:** the hand-off to the external compositor
//!
//! All times are seconds as `f64`. Geometry is in output pixels.

pub mod caption;
pub mod composition;
pub mod frame;
pub mod plan;
pub mod segment;
pub mod word;

pub use caption::*;
pub use composition::*;
pub use frame::*;
pub use plan::*;
pub use segment::*;
pub use word::*;
