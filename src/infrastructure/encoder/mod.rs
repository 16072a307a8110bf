//! Native lossy encoder

mod ogg_opus;
mod opus_stream;

pub use ogg_opus::{OggOpusEncoder, OggOpusEncoderFactory, OGG_OPUS_MEDIA_TYPE};
pub use opus_stream::{EncodingError, OpusOggStream, FRAME_SIZE};
