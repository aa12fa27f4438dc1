pub mod codec;

pub use codec::{decode, encode, encode_legacy, shape_checksum, Decoded, Format, FORMAT_VERSION, MAGIC};
