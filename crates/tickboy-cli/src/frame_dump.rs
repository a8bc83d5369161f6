use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use tickboy_core::display::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub fn frame_to_rgb(frame: &[u32]) -> Vec<u8> {
    let mut out = vec![0u8; frame.len() * 3];
    for (i, &px) in frame.iter().enumerate() {
        out[i * 3] = ((px >> 16) & 0xFF) as u8;
        out[i * 3 + 1] = ((px >> 8) & 0xFF) as u8;
        out[i * 3 + 2] = (px & 0xFF) as u8;
    }
    out
}

/// Writes a 160x144 0x00RRGGBB frame as an 8-bit RGB PNG.
pub fn write_png(path: &Path, frame: &[u32]) -> Result<(), png::EncodingError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame_to_rgb(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use tickboy_core::display::DMG_PALETTE;

    #[test]
    fn splits_channels() {
        assert_eq!(frame_to_rgb(&[0x00123456, 0x00FF0080]), [0x12, 0x34, 0x56, 0xFF, 0x00, 0x80]);
    }

    #[test]
    fn written_png_decodes_to_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots").join("frame.png");
        let mut frame = vec![DMG_PALETTE[0]; SCREEN_WIDTH * SCREEN_HEIGHT];
        frame[SCREEN_WIDTH + 1] = DMG_PALETTE[3];
        write_png(&path, &frame).unwrap();

        let decoder = png::Decoder::new(BufReader::new(File::open(&path).unwrap()));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size().unwrap()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (160, 144));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        let data = &buf[..info.buffer_size()];
        assert_eq!(data, frame_to_rgb(&frame).as_slice());
    }
}
