//! Binary (P6) Portable PixMap reading and writing.
//!
//! ```text
//! P6 <ws>
//! (# comment <lf>)*        interleaved with the header fields
//! width <ws> height <ws> max_color <ws>
//! (# comment <lf>)*
//! width * height RGB triples, one byte per channel, row-major
//! ```
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use crate::error::ImageError;
use crate::image::{Image, WriteImage};

mod decoder;
mod encoder;

pub use self::decoder::{DecoderOptions, PpmDecoder, MAGIC};
pub use self::encoder::validate;

pub fn decode<R: Read>(reader: R) -> Result<Image, ImageError> {
    decode_with_options(reader, DecoderOptions::default())
}

pub fn decode_with_options<R: Read>(mut reader: R, options: DecoderOptions) -> Result<Image, ImageError> {
    let mut data: Vec<u8> = Vec::new();
    reader.read_to_end(&mut data)?;

    PpmDecoder::new_with_options(options, &data).decode()
}

pub fn encode<W: Write>(image: &Image, writer: W) -> Result<(), ImageError> {
    image.write_image(writer)
}

pub fn encode_to_vec(image: &Image) -> Result<Vec<u8>, ImageError> {
    let mut out: Vec<u8> = Vec::new();
    image.write_image(&mut out)?;
    Ok(out)
}

pub fn read_ppm_file<P: AsRef<Path>>(path: P) -> Result<Image, ImageError> {
    read_ppm_file_with_options(path, DecoderOptions::default())
}

pub fn read_ppm_file_with_options<P: AsRef<Path>>(path: P, options: DecoderOptions) -> Result<Image, ImageError> {
    let path = path.as_ref();
    info!("reading {}", path.display());

    let file = File::open(path)?;
    decode_with_options(BufReader::new(file), options)
}

/// Write `image` to `path`. Nothing is created when the image fails validation;
/// on a write error the file content is undefined.
pub fn write_ppm_file<P: AsRef<Path>>(image: &Image, path: P) -> Result<(), ImageError> {
    let path = path.as_ref();
    validate(image)?;
    info!("writing {}", path.display());

    let file = File::create(path)?;
    encode(image, file)
}

#[cfg(test)]
fn sample_image() -> Image {
    let mut img = Image::new_growable();
    for y in 0..3 {
        for x in 0..4 {
            img.put_pixel(x, y, crate::image::Rgb::new(x as u8 * 10, y as u8 * 20, 7)).unwrap();
        }
    }
    img.add_comment("made by polms").unwrap();
    img.add_comment("").unwrap();
    img
}

#[test]
fn test_round_trip() {
    let img = sample_image();
    let data = encode_to_vec(&img).unwrap();
    let decoded = decode(&data[..]).unwrap();
    assert_eq!(decoded, img);
    assert_eq!(decoded.comments(), ["made by polms", ""]);
}

#[test]
fn test_round_trip_after_comment_removal() {
    let mut img = sample_image();
    img.remove_last_comment();
    let decoded = decode(&encode_to_vec(&img).unwrap()[..]).unwrap();
    assert_eq!(decoded.comments(), ["made by polms"]);

    img.remove_all_comments();
    let decoded = decode(&encode_to_vec(&img).unwrap()[..]).unwrap();
    assert!(decoded.comments().is_empty());
    assert_eq!(decoded, img);
}

#[test]
fn test_decode_io_error() {
    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "broken"))
        }
    }
    assert!(matches!(decode(Broken), Err(ImageError::IO(_))));
}

#[test]
fn test_encode_io_error() {
    struct Full;
    impl Write for Full {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    assert!(matches!(encode(&sample_image(), Full), Err(ImageError::IO(_))));
}
