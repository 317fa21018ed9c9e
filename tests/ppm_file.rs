extern crate polms_ppm;

use std::fs;
use std::path::PathBuf;

use polms_ppm::{
    encode_to_vec, read_ppm_file, read_ppm_file_with_options, write_ppm_file, DecoderOptions, Image, ImageError,
    Pixel, PpmDecoder, Rgb,
};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("polms_ppm_{}_{}", std::process::id(), name));
    path
}

#[test]
fn test_write_then_read_file() {
    let path = temp_path("gradient.ppm");
    let mut image = Image::new_growable();
    for y in 0..16u32 {
        for x in 0..16u32 {
            image.put_pixel(x, y, Rgb::new(x as u8, y as u8, (x + y) as u8 + 40)).unwrap();
        }
    }
    image.add_comment("gradient").unwrap();

    write_ppm_file(&image, &path).unwrap();
    let decoded = read_ppm_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(decoded, image);
    assert_eq!((decoded.width(), decoded.height()), (16, 16));
}

#[test]
fn test_green_rectangle_on_existing_image() {
    let path = temp_path("rect.ppm");
    let mut image = Image::new_fixed(8, 8).unwrap();
    for y in 0..8 {
        for x in 0..8 {
            image.put_pixel(x, y, Rgb::new(10, 20, 30)).unwrap();
        }
    }
    write_ppm_file(&image, &path).unwrap();

    let mut image = read_ppm_file(&path).unwrap();
    for y in 0..4 {
        for x in 0..4 {
            image.put_pixel(x, y, Rgb::GREEN).unwrap();
        }
    }
    write_ppm_file(&image, &path).unwrap();
    let decoded = read_ppm_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(decoded.get_pixel(3, 3).unwrap(), Pixel::Rgb(Rgb::GREEN));
    assert_eq!(decoded.get_pixel(4, 3).unwrap(), Pixel::Rgb(Rgb::new(10, 20, 30)));
    assert!(matches!(decoded.get_pixel(8, 0), Err(ImageError::Bounds { .. })));
}

#[test]
fn test_no_pixel_assign_creates_no_file() {
    let path = temp_path("empty.ppm");
    let image = Image::new_growable();

    assert!(matches!(write_ppm_file(&image, &path), Err(ImageError::Validation(_))));
    assert!(!path.exists());
}

#[test]
fn test_missing_file() {
    let path = temp_path("does_not_exist.ppm");
    assert!(matches!(read_ppm_file(&path), Err(ImageError::IO(_))));
}

#[test]
fn test_legacy_sentinel_from_file() {
    let path = temp_path("sentinel.ppm");
    let mut image = Image::new_fixed(3, 1).unwrap();
    image.put_pixel(0, 0, Rgb::new(1, 2, 3)).unwrap();
    image.put_pixel(1, 0, Rgb::RED).unwrap();
    image.put_pixel(2, 0, Rgb::new(4, 5, 6)).unwrap();
    write_ppm_file(&image, &path).unwrap();

    let plain = read_ppm_file(&path).unwrap();
    let legacy = read_ppm_file_with_options(&path, DecoderOptions::default().set_legacy_red_sentinel(true)).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(plain, image);
    assert_eq!(legacy.pixels(), [Pixel::Rgb(Rgb::new(1, 2, 3)), Pixel::Rgb(Rgb::BLACK), Pixel::Rgb(Rgb::BLACK)]);
}

#[test]
fn test_decoder_headers_from_encoded_image() {
    let mut image = Image::new_fixed(5, 2).unwrap();
    image.add_comment("header only").unwrap();
    let data = encode_to_vec(&image).unwrap();

    let mut decoder = PpmDecoder::new(&data);
    decoder.read_headers().unwrap();
    assert_eq!(decoder.get_dimensions(), Some((5, 2)));
    assert_eq!(decoder.get_comments().unwrap(), ["header only"]);
    assert_eq!(decoder.decode().unwrap(), image);
}
