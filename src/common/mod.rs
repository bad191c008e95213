pub mod frame;

pub use frame::{DecodedFrame, EncodedFrame};
