//! Payload codecs
//!
//! Inbound content decoding and optional image transcoding.

pub mod decoder;
pub mod transcode;

pub use decoder::{decode, decode_inline};
pub use transcode::{CodecCapability, Transcoded, maybe_transcode};
