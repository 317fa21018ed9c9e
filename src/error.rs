use std::fmt;
use std::fmt::Display;
use std::string::FromUtf8Error;

#[derive(Debug, Clone, PartialEq)]
pub struct FormatError {
    pub str: String,
}

impl FormatError {
    pub fn new(s: &str) -> Self {
        FormatError {
            str: String::from(s)
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Format Error: {}", self.str)
    }
}

impl std::error::Error for FormatError {

}

#[derive(Debug)]
pub enum ImageError {
    IO(std::io::Error),
    Format(FormatError),
    Validation(String),
    Bounds { x: u32, y: u32, width: u32, height: u32 },
}

impl ImageError {
    pub fn format(s: &str) -> Self {
        ImageError::Format(FormatError::new(s))
    }

    pub fn validation(s: &str) -> Self {
        ImageError::Validation(String::from(s))
    }
}

impl Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::IO(e) => write!(f, "IO Error: {}", e),
            ImageError::Format(e) => write!(f, "{}", e),
            ImageError::Validation(s) => write!(f, "Validation Error: {}", s),
            ImageError::Bounds { x, y, width, height } => {
                write!(f, "Bounds Error: ({}, {}) is outside of a {}x{} image", x, y, width, height)
            }
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageError::IO(e) => Some(e),
            ImageError::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        ImageError::IO(e)
    }
}

impl From<FormatError> for ImageError {
    fn from(e: FormatError) -> Self {
        ImageError::Format(e)
    }
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for ImageError {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        let str = match e {
            nom::Err::Incomplete(_) => String::from("unexpected end of header"),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                format!("nom error: {:?}, {} bytes left", e.code, e.input.len())
            }
        };
        ImageError::Format(FormatError { str })
    }
}

impl From<FromUtf8Error> for ImageError {
    fn from(e: FromUtf8Error) -> Self {
        ImageError::Format(FormatError {
            str: format!("from utf8 error: {}", e)
        })
    }
}

#[test]
fn test_display_bounds() {
    let e = ImageError::Bounds { x: 4, y: 0, width: 4, height: 2 };
    assert_eq!(e.to_string(), "Bounds Error: (4, 0) is outside of a 4x2 image");
}

#[test]
fn test_from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
    let e: ImageError = io.into();
    assert!(matches!(e, ImageError::IO(_)));
    assert!(std::error::Error::source(&e).is_some());
}

#[test]
fn test_from_utf8_error() {
    let bad = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
    let e: ImageError = bad.into();
    match e {
        ImageError::Format(f) => assert!(f.str.starts_with("from utf8 error")),
        other => panic!("unexpected error {:?}", other),
    }
}
