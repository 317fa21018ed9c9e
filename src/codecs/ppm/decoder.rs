use nom::bytes::complete::{tag, take_till};
use nom::character::complete::{digit1, multispace0};
use nom::combinator::opt;
use nom::sequence::tuple;
use nom::IResult;
use std::io::Read;

use crate::error::{FormatError, ImageError};
use crate::image::{pixel_count, Image, Pixel, ReadImage, Rgb};

pub const MAGIC: &[u8] = b"P6";
const COMMENT: u8 = b'#';
const HEADER_FIELDS: [&str; 3] = ["width", "height", "max color"];

/// Knobs for [`PpmDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    legacy_red_sentinel: bool,
    allow_truncated: bool,
    max_width: u32,
    max_height: u32,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            legacy_red_sentinel: false,
            allow_truncated: false,
            max_width: 1 << 14,
            max_height: 1 << 14,
        }
    }
}

impl DecoderOptions {
    /// Stop reading pixels at the first pure red `(255, 0, 0)` one and leave
    /// the rest of the grid black. Old writers of this library relied on it.
    pub fn set_legacy_red_sentinel(mut self, yes: bool) -> Self {
        self.legacy_red_sentinel = yes;
        self
    }

    /// Accept a pixel block shorter than `width * height` and zero fill the rest.
    pub fn set_allow_truncated(mut self, yes: bool) -> Self {
        self.allow_truncated = yes;
        self
    }

    pub fn set_max_width(mut self, width: u32) -> Self {
        self.max_width = width;
        self
    }

    pub fn set_max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    pub fn legacy_red_sentinel(&self) -> bool {
        self.legacy_red_sentinel
    }

    pub fn allow_truncated(&self) -> bool {
        self.allow_truncated
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    fn fills_missing_pixels(&self) -> bool {
        self.allow_truncated || self.legacy_red_sentinel
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Header {
    width: u32,
    height: u32,
    max_color: u8,
    comments: Vec<String>,
}

/// A P6 decoder over an in-memory byte stream.
pub struct PpmDecoder<'a> {
    data: &'a [u8],
    options: DecoderOptions,
    header: Option<Header>,
    pixel_data: &'a [u8],
}

impl<'a> PpmDecoder<'a> {
    pub fn new(data: &'a [u8]) -> PpmDecoder<'a> {
        PpmDecoder::new_with_options(DecoderOptions::default(), data)
    }

    pub fn new_with_options(options: DecoderOptions, data: &'a [u8]) -> PpmDecoder<'a> {
        PpmDecoder {
            data,
            options,
            header: None,
            pixel_data: &[],
        }
    }

    /// Parse everything up to the first pixel byte.
    pub fn read_headers(&mut self) -> Result<(), ImageError> {
        if self.header.is_some() {
            return Ok(());
        }

        let (r, mut header) = parse_header(self.data)?;
        debug!("header: {}x{} max color {}", header.width, header.height, header.max_color);

        // only the modes that fill missing pixels allocate more than the stream backs
        if self.options.fills_missing_pixels() && header.width > self.options.max_width {
            return Err(ImageError::Format(FormatError {
                str: format!("width {} greater than max width {}", header.width, self.options.max_width)
            }));
        }
        if self.options.fills_missing_pixels() && header.height > self.options.max_height {
            return Err(ImageError::Format(FormatError {
                str: format!("height {} greater than max height {}", header.height, self.options.max_height)
            }));
        }

        let needed = pixel_count(header.width, header.height)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| ImageError::format("image dimensions overflow"))?;

        // a `#` is only a comment while there are more bytes left than pixels need
        let mut r = r;
        while r.len() > needed && r.first() == Some(&COMMENT) {
            let (rest, text) = parse_comment(r)?;
            header.comments.push(String::from_utf8(text.to_vec())?);
            r = rest;
        }

        info!("PPM {}x{}, {} comment(s)", header.width, header.height, header.comments.len());
        self.pixel_data = r;
        self.header = Some(header);
        Ok(())
    }

    /// Width and height, `None` until the headers are read.
    pub fn get_dimensions(&self) -> Option<(u32, u32)> {
        self.header.as_ref().map(|h| (h.width, h.height))
    }

    pub fn get_comments(&self) -> Option<&[String]> {
        self.header.as_ref().map(|h| h.comments.as_slice())
    }

    pub fn decode(&mut self) -> Result<Image, ImageError> {
        self.read_headers()?;
        let header = match self.header.as_ref() {
            Some(h) => h,
            None => return Err(ImageError::format("missing header")),
        };

        let count = pixel_count(header.width, header.height)
            .ok_or_else(|| ImageError::format("image dimensions overflow"))?;
        let needed = count * 3;
        let data = self.pixel_data;

        if data.len() < needed && !self.options.fills_missing_pixels() {
            return Err(ImageError::format("truncated pixel data"));
        }

        let mut pixels = vec![Pixel::default(); count];
        let mut read = 0;
        let mut stopped = false;

        for (slot, b) in pixels.iter_mut().zip(data.chunks_exact(3)) {
            let color = Rgb::new(b[0], b[1], b[2]);
            if self.options.legacy_red_sentinel && color == Rgb::RED {
                debug!("red sentinel at pixel {}", read);
                stopped = true;
                break;
            }
            *slot = Pixel::Rgb(color);
            read += 1;
        }

        if !stopped && read < count {
            if !self.options.allow_truncated {
                return Err(ImageError::format("truncated pixel data"));
            }
            warn!("pixel data truncated: {} of {} pixels read", read, count);
        }
        if data.len() > needed {
            warn!("{} trailing bytes after pixel data ignored", data.len() - needed);
        }

        Ok(Image::from_parts(header.width, header.height, header.max_color, header.comments.clone(), pixels))
    }
}

impl<R: Read> ReadImage<R> for Image {
    fn read_image(mut reader: R) -> Result<Self, ImageError> {
        let mut data: Vec<u8> = Vec::new();
        reader.read_to_end(&mut data)?;

        PpmDecoder::new(&data).decode()
    }
}

fn parse_magic(i: &[u8]) -> IResult<&[u8], &[u8]> {
    tag(MAGIC)(i)
}

/// `#`, text, line end. Only the text is returned.
fn parse_comment(i: &[u8]) -> IResult<&[u8], &[u8]> {
    let (r, (_, text, _)) = tuple((tag("#"), take_till(|b: u8| b == b'\n'), opt(tag("\n"))))(i)?;
    Ok((r, text))
}

fn parse_field<'a>(i: &'a [u8], name: &str) -> Result<(&'a [u8], u32), ImageError> {
    let (r, digits) = digit1(i).map_err(|_: nom::Err<nom::error::Error<&[u8]>>| {
        ImageError::Format(FormatError { str: format!("{} is not a number", name) })
    })?;

    let value = String::from_utf8(digits.to_vec())?
        .parse::<u32>()
        .map_err(|e| ImageError::Format(FormatError { str: format!("{} out of range: {}", name, e) }))?;

    Ok((r, value))
}

// Magic, then width, height and max color with comments anywhere in between,
// then the single separator byte.
fn parse_header(input: &[u8]) -> Result<(&[u8], Header), ImageError> {
    let (mut r, _) = parse_magic(input)
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| ImageError::format("bad magic number"))?;

    match r.first() {
        Some(b) if b.is_ascii_whitespace() || *b == COMMENT => {}
        _ => return Err(ImageError::format("bad magic number")),
    }

    let mut fields: Vec<u32> = Vec::with_capacity(3);
    let mut comments: Vec<String> = Vec::new();

    while fields.len() < 3 {
        let (rest, _) = multispace0::<_, nom::error::Error<&[u8]>>(r)?;
        let name = HEADER_FIELDS[fields.len()];

        match rest.first() {
            None => {
                return Err(ImageError::Format(FormatError { str: format!("truncated header, missing {}", name) }));
            }
            Some(&COMMENT) => {
                let (rest, text) = parse_comment(rest)?;
                comments.push(String::from_utf8(text.to_vec())?);
                r = rest;
            }
            Some(_) => {
                let (rest, value) = parse_field(rest, name)?;
                fields.push(value);
                r = rest;
            }
        }
    }

    let (width, height, max_color) = (fields[0], fields[1], fields[2]);
    if width == 0 {
        return Err(ImageError::format("width must be greater than 0"));
    }
    if height == 0 {
        return Err(ImageError::format("height must be greater than 0"));
    }
    if max_color == 0 || max_color > 255 {
        return Err(ImageError::Format(FormatError { str: format!("max color {} not in [1, 255]", max_color) }));
    }

    let r = match r.split_first() {
        Some((b, rest)) if b.is_ascii_whitespace() => rest,
        Some((b, _)) => {
            return Err(ImageError::Format(FormatError {
                str: format!("expected whitespace after max color, found {:#04x}", b)
            }));
        }
        None => r,
    };

    let header = Header {
        width,
        height,
        max_color: max_color as u8,
        comments,
    };
    Ok((r, header))
}

#[cfg(test)]
fn format_message(e: ImageError) -> String {
    match e {
        ImageError::Format(f) => f.str,
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn test_decode_simple() {
    let mut data = b"P6\n2 2 255\n".to_vec();
    data.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    let img = PpmDecoder::new(&data).decode().unwrap();

    assert_eq!((img.width(), img.height(), img.max_color()), (2, 2, 255));
    assert!(img.comments().is_empty());
    assert_eq!(img.pixels(), [
        Pixel::Rgb(Rgb::new(1, 2, 3)),
        Pixel::Rgb(Rgb::new(4, 5, 6)),
        Pixel::Rgb(Rgb::new(7, 8, 9)),
        Pixel::Rgb(Rgb::new(10, 11, 12)),
    ]);
}

#[test]
fn test_decode_bad_magic() {
    let e = PpmDecoder::new(b"P3\n1 1 255\n\0\0\0").decode().unwrap_err();
    assert_eq!(format_message(e), "bad magic number");

    let e = PpmDecoder::new(b"P").decode().unwrap_err();
    assert_eq!(format_message(e), "bad magic number");

    let e = PpmDecoder::new(b"P61 1 255\n\0\0\0").decode().unwrap_err();
    assert_eq!(format_message(e), "bad magic number");
}

#[test]
fn test_decode_header_comments() {
    let mut data = b"P6\n# first\n1 # second\n1\n#third\n255\n".to_vec();
    data.extend_from_slice(&[9, 8, 7]);
    let img = PpmDecoder::new(&data).decode().unwrap();

    assert_eq!(img.comments(), [" first", " second", "third"]);
    assert_eq!(img.get_pixel(0, 0).unwrap(), Pixel::Rgb(Rgb::new(9, 8, 7)));
}

#[test]
fn test_decode_comments_before_pixels() {
    let mut data = b"P6\n1 1 255\n#before\n# pixels\n".to_vec();
    data.extend_from_slice(&[1, 2, 3]);
    let img = PpmDecoder::new(&data).decode().unwrap();

    assert_eq!(img.comments(), ["before", " pixels"]);
    assert_eq!(img.pixels(), [Pixel::Rgb(Rgb::new(1, 2, 3))]);
}

#[test]
fn test_decode_hash_as_first_pixel() {
    let mut data = b"P6\n1 1 255\n".to_vec();
    data.extend_from_slice(&[b'#', 0, 10]);
    let img = PpmDecoder::new(&data).decode().unwrap();

    assert!(img.comments().is_empty());
    assert_eq!(img.pixels(), [Pixel::Rgb(Rgb::new(b'#', 0, 10))]);
}

#[test]
fn test_decode_hash_first_pixel_with_trailing_newline() {
    // one byte more than the pixels need, so the `#` reads as a comment line
    let mut data = b"P6\n1 1 255\n".to_vec();
    data.extend_from_slice(&[b'#', 0, 10, b'\n']);
    let e = PpmDecoder::new(&data).decode().unwrap_err();
    assert_eq!(format_message(e), "truncated pixel data");
}

#[test]
fn test_decode_invalid_fields() {
    let e = PpmDecoder::new(b"P6\n0 1 255\n").decode().unwrap_err();
    assert_eq!(format_message(e), "width must be greater than 0");

    let e = PpmDecoder::new(b"P6\n1 0 255\n").decode().unwrap_err();
    assert_eq!(format_message(e), "height must be greater than 0");

    let e = PpmDecoder::new(b"P6\n1 1 256\n\0\0\0").decode().unwrap_err();
    assert_eq!(format_message(e), "max color 256 not in [1, 255]");

    let e = PpmDecoder::new(b"P6\n1 1 0\n\0\0\0").decode().unwrap_err();
    assert_eq!(format_message(e), "max color 0 not in [1, 255]");

    let e = PpmDecoder::new(b"P6\nab 1 255\n").decode().unwrap_err();
    assert_eq!(format_message(e), "width is not a number");

    let e = PpmDecoder::new(b"P6\n1 1").decode().unwrap_err();
    assert_eq!(format_message(e), "truncated header, missing max color");

    let e = PpmDecoder::new(b"P6\n99999999999 1 255\n").decode().unwrap_err();
    assert!(format_message(e).starts_with("width out of range"));
}

#[test]
fn test_decode_size_limits() {
    let options = DecoderOptions::default().set_max_width(4).set_allow_truncated(true);
    let e = PpmDecoder::new_with_options(options, b"P6\n5 1 255\n").decode().unwrap_err();
    assert_eq!(format_message(e), "width 5 greater than max width 4");

    let options = DecoderOptions::default().set_max_height(2).set_legacy_red_sentinel(true);
    let e = PpmDecoder::new_with_options(options, b"P6\n1 3 255\n").decode().unwrap_err();
    assert_eq!(format_message(e), "height 3 greater than max height 2");
}

#[test]
fn test_decode_wide_image_default_options() {
    let mut data = b"P6\n16385 1 255\n".to_vec();
    data.extend((0..16385 * 3).map(|i| (i % 251) as u8 + 1));
    let img = PpmDecoder::new(&data).decode().unwrap();

    assert_eq!((img.width(), img.height()), (16385, 1));
    assert_eq!(img.get_pixel(16384, 0).unwrap(), Pixel::Rgb(Rgb::new(
        (16384 * 3 % 251) as u8 + 1,
        ((16384 * 3 + 1) % 251) as u8 + 1,
        ((16384 * 3 + 2) % 251) as u8 + 1,
    )));
}

#[test]
fn test_decode_short_wide_stream_rejected_before_allocation() {
    let e = PpmDecoder::new(b"P6\n100000 1000 255\n\x01\x02\x03").decode().unwrap_err();
    assert_eq!(format_message(e), "truncated pixel data");
}

#[test]
fn test_decode_truncated() {
    let data = b"P6\n2 1 255\n\x01\x02\x03\x04";
    let e = PpmDecoder::new(data).decode().unwrap_err();
    assert_eq!(format_message(e), "truncated pixel data");

    let options = DecoderOptions::default().set_allow_truncated(true);
    let img = PpmDecoder::new_with_options(options, data).decode().unwrap();
    assert_eq!(img.pixels(), [Pixel::Rgb(Rgb::new(1, 2, 3)), Pixel::Rgb(Rgb::BLACK)]);
}

#[test]
fn test_decode_red_is_plain_pixel_by_default() {
    let data = b"P6\n2 1 255\n\xff\x00\x00\x01\x02\x03";
    let img = PpmDecoder::new(data).decode().unwrap();
    assert_eq!(img.pixels(), [Pixel::Rgb(Rgb::RED), Pixel::Rgb(Rgb::new(1, 2, 3))]);
}

#[test]
fn test_decode_legacy_red_sentinel() {
    let mut data = b"P6\n4 1 255\n".to_vec();
    data.extend_from_slice(&[1, 2, 3, 4, 5, 6, 255, 0, 0, 7, 8, 9]);
    let options = DecoderOptions::default().set_legacy_red_sentinel(true);
    let img = PpmDecoder::new_with_options(options, &data).decode().unwrap();

    assert_eq!(img.pixels(), [
        Pixel::Rgb(Rgb::new(1, 2, 3)),
        Pixel::Rgb(Rgb::new(4, 5, 6)),
        Pixel::Rgb(Rgb::BLACK),
        Pixel::Rgb(Rgb::BLACK),
    ]);
}

#[test]
fn test_decode_legacy_red_sentinel_short_stream() {
    // nothing after the sentinel is needed
    let data = b"P6\n3 1 255\n\x01\x01\x01\xff\x00\x00";
    let options = DecoderOptions::default().set_legacy_red_sentinel(true);
    let img = PpmDecoder::new_with_options(options, data).decode().unwrap();
    assert_eq!(img.pixels()[0], Pixel::Rgb(Rgb::new(1, 1, 1)));
    assert_eq!(img.pixels()[1..], [Pixel::Rgb(Rgb::BLACK), Pixel::Rgb(Rgb::BLACK)]);
}

#[test]
fn test_decode_trailing_bytes() {
    let data = b"P6\n1 1 255\n\x01\x02\x03\x04\x05";
    let img = PpmDecoder::new(data).decode().unwrap();
    assert_eq!(img.pixels(), [Pixel::Rgb(Rgb::new(1, 2, 3))]);
}

#[test]
fn test_read_headers_only() {
    let mut decoder = PpmDecoder::new(b"P6 #c\n7 3 15 ");
    assert_eq!(decoder.get_dimensions(), None);
    decoder.read_headers().unwrap();
    assert_eq!(decoder.get_dimensions(), Some((7, 3)));
    assert_eq!(decoder.get_comments().unwrap(), ["c"]);
}

#[test]
fn test_bad_separator() {
    let e = PpmDecoder::new(b"P6\n1 1 255x\x01\x02\x03").decode().unwrap_err();
    assert_eq!(format_message(e), "expected whitespace after max color, found 0x78");
}

#[test]
fn test_comment_not_utf8() {
    let e = PpmDecoder::new(b"P6\n#\xff\n1 1 255\n\x01\x02\x03").decode().unwrap_err();
    assert!(format_message(e).starts_with("from utf8 error"));
}

#[test]
fn test_read_image_trait() {
    let data: &[u8] = b"P6\n1 1 255\n\x05\x06\x07";
    let img = <Image as ReadImage<&[u8]>>::read_image(data).unwrap();
    assert_eq!(img.get_pixel(0, 0).unwrap(), Pixel::Rgb(Rgb::new(5, 6, 7)));
}
