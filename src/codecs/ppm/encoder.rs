use crate::image::*;
use crate::error::ImageError;
use std::io::Write;
use std::io::BufWriter;

/// Check that `image` can be written, before any byte goes out.
pub fn validate(image: &Image) -> Result<(), ImageError> {
    let len = image.pixels().len();
    if len == 0 {
        return Err(ImageError::validation("no pixel data assigned"));
    }

    match pixel_count(image.width(), image.height()) {
        Some(expected) if expected == len => Ok(()),
        _ => Err(ImageError::Validation(format!(
            "{} pixels assigned but a {}x{} image needs {}",
            len,
            image.width(),
            image.height(),
            u64::from(image.width()) * u64::from(image.height())
        ))),
    }
}

impl<W: Write> WriteImage<W> for Image {
    fn write_image(&self, writer: W) -> Result<(), ImageError> {
        validate(self)?;
        let mut buf = BufWriter::new(writer);

        write!(buf, "P6\n")?;
        for comment in self.comments() {
            write!(buf, "#{}\n", comment)?;
        }
        write!(buf, "{} {} {}\n", self.width(), self.height(), self.max_color())?;

        let mut data: Vec<u8> = Vec::with_capacity(self.pixels().len() * 3);
        for pixel in self.pixels() {
            let rgb = pixel.to_rgb();
            data.extend_from_slice(&[rgb.r, rgb.g, rgb.b]);
        }
        buf.write_all(&data)?;
        buf.flush()?;

        debug!("wrote {}x{} image, {} pixel bytes", self.width(), self.height(), data.len());
        Ok(())
    }
}

#[test]
fn test_encode_simple() {
    let mut img = Image::new_fixed(2, 2).unwrap();
    img.put_pixel(0, 0, Rgb::new(1, 2, 3)).unwrap();
    img.put_pixel(1, 0, Rgb::new(4, 5, 6)).unwrap();
    img.put_pixel(0, 1, Rgb::new(7, 8, 9)).unwrap();
    img.put_pixel(1, 1, Rgb::new(10, 11, 12)).unwrap();

    let mut out: Vec<u8> = Vec::new();
    img.write_image(&mut out).unwrap();

    let mut expected = b"P6\n2 2 255\n".to_vec();
    expected.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C]);
    assert_eq!(out, expected);
}

#[test]
fn test_encode_comments_and_max_color() {
    let mut img = Image::new_fixed(1, 1).unwrap();
    img.set_max_color(100).unwrap();
    img.add_comment("a").unwrap();
    img.add_comment(" b").unwrap();

    let mut out: Vec<u8> = Vec::new();
    img.write_image(&mut out).unwrap();
    assert_eq!(out, b"P6\n#a\n# b\n1 1 100\n\0\0\0".to_vec());
}

#[test]
fn test_encode_grayscale() {
    let mut img = Image::new_fixed(1, 1).unwrap();
    img.put_pixel(0, 0, Pixel::Grayscale { intensity: 42 }).unwrap();

    let mut out: Vec<u8> = Vec::new();
    img.write_image(&mut out).unwrap();
    assert_eq!(&out[out.len() - 3..], [42, 42, 42]);
}

#[test]
fn test_encode_no_pixels() {
    let img = Image::new_growable();
    let mut out: Vec<u8> = Vec::new();
    assert!(matches!(img.write_image(&mut out), Err(ImageError::Validation(ref s)) if s == "no pixel data assigned"));
    assert!(out.is_empty());
}

#[test]
fn test_encode_mismatched_pixels() {
    let mut img = Image::new_fixed(2, 2).unwrap();
    img.pixels_mut().pop();

    let mut out: Vec<u8> = Vec::new();
    let e = img.write_image(&mut out).unwrap_err();
    match e {
        ImageError::Validation(s) => assert_eq!(s, "3 pixels assigned but a 2x2 image needs 4"),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(out.is_empty());
}
