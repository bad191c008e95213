pub mod frame_codec;
pub mod resolution_reducer;

pub use frame_codec::FrameCodec;
pub use resolution_reducer::{ReducedFrame, ResolutionReducer};
