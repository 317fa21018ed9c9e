extern crate env_logger;
extern crate polms_ppm;

use std::env;
use std::process;

use polms_ppm::{read_ppm_file, write_ppm_file, Image, ImageError, Rgb};

fn usage() -> ! {
    eprintln!("usage:");
    eprintln!("  polms_ppm gen <out.ppm>");
    eprintln!("  polms_ppm rect <in.ppm> <out.ppm>");
    eprintln!("  polms_ppm info <in.ppm>");
    process::exit(2);
}

// 512x512 gradient
fn make_test_image() -> Result<Image, ImageError> {
    let mut image = Image::new_growable();
    for y in 0..512u32 {
        for x in 0..512u32 {
            let (r, g) = (x / 2, y / 2);
            image.put_pixel(x, y, Rgb::new(r as u8, g as u8, (r + g) as u8))?;
        }
    }
    image.add_comment("polms_ppm test image")?;
    Ok(image)
}

fn green_rectangle(image: &mut Image, width: u32, height: u32) -> Result<(), ImageError> {
    for y in 0..height.min(image.height()) {
        for x in 0..width.min(image.width()) {
            image.put_pixel(x, y, Rgb::GREEN)?;
        }
    }
    Ok(())
}

fn run(args: &[String]) -> Result<(), ImageError> {
    match args {
        [cmd, out] if cmd == "gen" => {
            let image = make_test_image()?;
            write_ppm_file(&image, out)
        }
        [cmd, input, out] if cmd == "rect" => {
            let mut image = read_ppm_file(input)?;
            green_rectangle(&mut image, 100, 100)?;
            write_ppm_file(&image, out)
        }
        [cmd, input] if cmd == "info" => {
            let image = read_ppm_file(input)?;
            println!("{}x{} max color {}", image.width(), image.height(), image.max_color());
            for comment in image.comments() {
                println!("#{}", comment);
            }
            Ok(())
        }
        _ => usage(),
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("[ERROR] {}", e);
        process::exit(1);
    }
}
