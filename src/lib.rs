#[macro_use]
extern crate log;
extern crate nom;

pub mod codecs;
pub mod error;
pub mod image;

pub use crate::codecs::ppm::{
    decode, decode_with_options, encode, encode_to_vec, read_ppm_file, read_ppm_file_with_options,
    write_ppm_file, DecoderOptions, PpmDecoder,
};
pub use crate::error::{FormatError, ImageError};
pub use crate::image::{Growth, Image, Pixel, Rgb};
