//! Headless capture: PNG screenshots of the rendered frame buffer.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::render::{FRAME_HEIGHT, FRAME_WIDTH, render_rgba};
use crate::spectrum::Spectrum;

/// Save the last completed frame as a PNG file.
pub fn save_screenshot(spectrum: &Spectrum, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut rgba = vec![0u8; FRAME_WIDTH * FRAME_HEIGHT * 4];
    render_rgba(
        spectrum.frame_buffer(),
        spectrum.bus().ula.flash_swap(),
        &mut rgba,
    );

    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, FRAME_WIDTH as u32, FRAME_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&rgba)?;
    Ok(())
}

/// Run `num_frames` frames, saving each as `dir/000001.png`,
/// `dir/000002.png`, …
pub fn save_frame_sequence(
    spectrum: &mut Spectrum,
    dir: &Path,
    num_frames: u32,
) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    for i in 1..=num_frames {
        spectrum.run_frame();
        let filename = dir.join(format!("{i:06}.png"));
        save_screenshot(spectrum, &filename)?;
    }
    Ok(())
}
