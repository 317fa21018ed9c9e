use std::cmp;
use std::convert::TryFrom;
use std::io::Read;
use std::io::Write;
use crate::error::ImageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }
}

/// Color of a single pixel.
///
/// Only `Rgb` has a representation in the P6 format. A `Grayscale` pixel is
/// written as three equal channels and always decodes back as `Rgb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    Rgb(Rgb),
    Grayscale { intensity: u8 },
}

impl Pixel {
    pub fn to_rgb(&self) -> Rgb {
        match *self {
            Pixel::Rgb(rgb) => rgb,
            Pixel::Grayscale { intensity } => Rgb::new(intensity, intensity, intensity),
        }
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Pixel::Rgb(Rgb::BLACK)
    }
}

impl From<Rgb> for Pixel {
    fn from(rgb: Rgb) -> Self {
        Pixel::Rgb(rgb)
    }
}

/// How `put_pixel` treats coordinates outside of the current grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// The grid is enlarged to cover the coordinate.
    Growable,
    /// The coordinate is rejected with `ImageError::Bounds`.
    Fixed,
}

pub const DEFAULT_MAX_COLOR: u8 = 255;

/// Row-major RGB pixel grid with the P6 header metadata.
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    max_color: u8,
    comments: Vec<String>,
    pixels: Vec<Pixel>,
    growth: Growth,
}

impl Image {
    /// An empty `0x0` image that grows as pixels are placed.
    pub fn new_growable() -> Image {
        Image {
            width: 0,
            height: 0,
            max_color: DEFAULT_MAX_COLOR,
            comments: Vec::new(),
            pixels: Vec::new(),
            growth: Growth::Growable,
        }
    }

    /// A black `width x height` image that rejects out of range pixels.
    pub fn new_fixed(width: u32, height: u32) -> Result<Image, ImageError> {
        let len = pixel_count(width, height)
            .ok_or_else(|| ImageError::validation("image dimensions overflow"))?;

        Ok(Image {
            width,
            height,
            max_color: DEFAULT_MAX_COLOR,
            comments: Vec::new(),
            pixels: vec![Pixel::default(); len],
            growth: Growth::Fixed,
        })
    }

    pub(crate) fn from_parts(width: u32, height: u32, max_color: u8, comments: Vec<String>, pixels: Vec<Pixel>) -> Image {
        Image {
            width,
            height,
            max_color,
            comments,
            pixels,
            growth: Growth::Fixed,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_color(&self) -> u8 {
        self.max_color
    }

    pub fn set_max_color(&mut self, max_color: u8) -> Result<(), ImageError> {
        if max_color == 0 {
            return Err(ImageError::validation("max color must be in [1, 255]"));
        }
        self.max_color = max_color;
        Ok(())
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Raw access to the pixel buffer. Nothing keeps its length in sync with
    /// the dimensions; `encode` rejects a buffer that is not `width * height`.
    pub fn pixels_mut(&mut self) -> &mut Vec<Pixel> {
        &mut self.pixels
    }

    /// True when the buffer holds exactly `width * height` pixels and is not empty.
    pub fn is_complete(&self) -> bool {
        match pixel_count(self.width, self.height) {
            Some(len) => len > 0 && len == self.pixels.len(),
            None => false,
        }
    }

    /// Buffer position of `(x, y)`, `None` on overflow.
    pub fn index_at(&self, x: u32, y: u32) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;

        width.checked_mul(y)?.checked_add(x)
    }

    pub fn put_pixel<P: Into<Pixel>>(&mut self, x: u32, y: u32, color: P) -> Result<(), ImageError> {
        if x >= self.width || y >= self.height {
            match self.growth {
                Growth::Fixed => return Err(self.bounds_error(x, y)),
                Growth::Growable => {
                    let width = x.checked_add(1).ok_or_else(|| self.bounds_error(x, y))?;
                    let height = y.checked_add(1).ok_or_else(|| self.bounds_error(x, y))?;
                    self.grow(cmp::max(self.width, width), cmp::max(self.height, height))
                        .ok_or_else(|| self.bounds_error(x, y))?;
                }
            }
        }

        let bounds = self.bounds_error(x, y);
        let i = self.index_at(x, y).ok_or(bounds)?;
        match self.pixels.get_mut(i) {
            Some(pixel) => {
                *pixel = color.into();
                Ok(())
            }
            None => Err(self.bounds_error(x, y)),
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Pixel, ImageError> {
        if x >= self.width || y >= self.height {
            return Err(self.bounds_error(x, y));
        }

        self.index_at(x, y)
            .and_then(|i| self.pixels.get(i))
            .copied()
            .ok_or_else(|| self.bounds_error(x, y))
    }

    pub fn add_comment(&mut self, comment: &str) -> Result<(), ImageError> {
        if comment.contains('\n') {
            return Err(ImageError::validation("comment must be a single line"));
        }
        self.comments.push(String::from(comment));
        Ok(())
    }

    pub fn remove_last_comment(&mut self) -> Option<String> {
        self.comments.pop()
    }

    pub fn remove_all_comments(&mut self) {
        self.comments.clear();
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    // Existing pixels keep their coordinates, new slots are black.
    fn grow(&mut self, width: u32, height: u32) -> Option<()> {
        let len = pixel_count(width, height)?;

        if width == self.width {
            self.pixels.resize(len, Pixel::default());
        } else {
            let old_width = usize::try_from(self.width).ok()?;
            let new_width = usize::try_from(width).ok()?;
            let mut pixels = vec![Pixel::default(); len];

            if old_width > 0 {
                for (row, line) in self.pixels.chunks(old_width).take(self.height as usize).enumerate() {
                    let start = new_width * row;
                    pixels[start..start + line.len()].copy_from_slice(line);
                }
            }
            self.pixels = pixels;
        }

        debug!("image grown from {}x{} to {}x{}", self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        Some(())
    }

    fn bounds_error(&self, x: u32, y: u32) -> ImageError {
        ImageError::Bounds { x, y, width: self.width, height: self.height }
    }
}

impl Default for Image {
    fn default() -> Self {
        Image::new_growable()
    }
}

// The growth mode is not part of an image's identity.
impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.max_color == other.max_color
            && self.pixels == other.pixels
            && self.comments == other.comments
    }
}

impl Eq for Image {}

pub(crate) fn pixel_count(width: u32, height: u32) -> Option<usize> {
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;

    width.checked_mul(height)
}

pub trait WriteImage<W: Write> {
    fn write_image(&self, writer: W) -> Result<(), ImageError>;
}

pub trait ReadImage<R: Read> {
    fn read_image(reader: R) -> Result<Self, ImageError> where Self: Sized;
}

#[test]
fn test_fixed_image_is_black() {
    let img = Image::new_fixed(3, 2).unwrap();
    assert_eq!(img.pixels().len(), 6);
    assert!(img.pixels().iter().all(|p| *p == Pixel::Rgb(Rgb::BLACK)));
    assert!(img.is_complete());
}

#[test]
fn test_fixed_bounds() {
    let mut img = Image::new_fixed(4, 2).unwrap();
    assert!(matches!(img.put_pixel(4, 0, Rgb::RED), Err(ImageError::Bounds { x: 4, y: 0, .. })));
    assert!(matches!(img.get_pixel(0, 2), Err(ImageError::Bounds { x: 0, y: 2, .. })));
    assert_eq!(img.width(), 4);
    assert_eq!(img.height(), 2);
}

#[test]
fn test_fixed_put_get() {
    let mut img = Image::new_fixed(4, 2).unwrap();
    img.put_pixel(3, 1, Rgb::new(1, 2, 3)).unwrap();
    assert_eq!(img.get_pixel(3, 1).unwrap(), Pixel::Rgb(Rgb::new(1, 2, 3)));
    assert_eq!(img.index_at(3, 1), Some(7));
    assert_eq!(img.pixels()[7], Pixel::Rgb(Rgb::new(1, 2, 3)));
}

#[test]
fn test_growable_expand() {
    let mut img = Image::new_growable();
    assert_eq!((img.width(), img.height()), (0, 0));
    img.put_pixel(3, 2, Rgb::RED).unwrap();
    assert!(img.width() >= 4);
    assert!(img.height() >= 3);
    assert_eq!(img.get_pixel(3, 2).unwrap(), Pixel::Rgb(Rgb::RED));
    assert_eq!(img.get_pixel(0, 0).unwrap(), Pixel::Rgb(Rgb::BLACK));
    assert!(img.is_complete());
}

#[test]
fn test_growable_keeps_coordinates() {
    let mut img = Image::new_growable();
    img.put_pixel(0, 0, Rgb::new(1, 1, 1)).unwrap();
    img.put_pixel(1, 1, Rgb::new(2, 2, 2)).unwrap();
    img.put_pixel(5, 0, Rgb::new(3, 3, 3)).unwrap();
    img.put_pixel(0, 3, Rgb::new(4, 4, 4)).unwrap();

    assert_eq!((img.width(), img.height()), (6, 4));
    assert_eq!(img.pixels().len(), 24);
    assert_eq!(img.get_pixel(0, 0).unwrap().to_rgb(), Rgb::new(1, 1, 1));
    assert_eq!(img.get_pixel(1, 1).unwrap().to_rgb(), Rgb::new(2, 2, 2));
    assert_eq!(img.get_pixel(5, 0).unwrap().to_rgb(), Rgb::new(3, 3, 3));
    assert_eq!(img.get_pixel(0, 3).unwrap().to_rgb(), Rgb::new(4, 4, 4));
    assert_eq!(img.get_pixel(5, 3).unwrap().to_rgb(), Rgb::BLACK);
}

#[test]
fn test_growable_row_by_row() {
    let mut img = Image::new_growable();
    for y in 0..3 {
        for x in 0..5 {
            img.put_pixel(x, y, Rgb::new(x as u8, y as u8, 0)).unwrap();
        }
    }
    assert_eq!((img.width(), img.height()), (5, 3));
    for y in 0..3 {
        for x in 0..5 {
            assert_eq!(img.get_pixel(x, y).unwrap().to_rgb(), Rgb::new(x as u8, y as u8, 0));
        }
    }
}

#[test]
fn test_growable_overflow() {
    let mut img = Image::new_growable();
    assert!(matches!(img.put_pixel(u32::MAX, 0, Rgb::RED), Err(ImageError::Bounds { .. })));
}

#[test]
fn test_comments() {
    let mut img = Image::new_growable();
    img.add_comment("a").unwrap();
    img.add_comment("b").unwrap();
    assert_eq!(img.comments(), ["a", "b"]);
    assert!(matches!(img.add_comment("c\nd"), Err(ImageError::Validation(_))));
    assert_eq!(img.remove_last_comment(), Some(String::from("b")));
    assert_eq!(img.comments(), ["a"]);
    img.remove_all_comments();
    assert!(img.comments().is_empty());
    assert_eq!(img.remove_last_comment(), None);
}

#[test]
fn test_max_color() {
    let mut img = Image::new_growable();
    assert_eq!(img.max_color(), 255);
    assert!(matches!(img.set_max_color(0), Err(ImageError::Validation(_))));
    img.set_max_color(15).unwrap();
    assert_eq!(img.max_color(), 15);
}

#[test]
fn test_grayscale_to_rgb() {
    let p = Pixel::Grayscale { intensity: 7 };
    assert_eq!(p.to_rgb(), Rgb::new(7, 7, 7));
}

#[test]
fn test_equality_ignores_growth() {
    let mut growable = Image::new_growable();
    growable.put_pixel(1, 1, Rgb::GREEN).unwrap();
    let mut fixed = Image::new_fixed(2, 2).unwrap();
    fixed.put_pixel(1, 1, Rgb::GREEN).unwrap();
    assert_eq!(growable, fixed);
}
