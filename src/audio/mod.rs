pub mod buffer;
pub mod resampler;
pub mod wav;
