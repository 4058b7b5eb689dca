use image::{Rgb, RgbImage};
use rayon::prelude::*;

use crate::altitude_grid::AltitudeGrid;
use crate::colour::ColourScheme;
use crate::water::WaterMask;

/// Represents a 24-bit RGB bitmap that can be drawn on and then written
/// out as a PNG file.
#[derive(Debug)]
pub struct RgbBitmap {
    pub width: u32,
    pub height: u32,
    data: Box<[u8]>,
}

impl RgbBitmap {
    /// Creates a new black bitmap with the given width and height.
    pub fn new(width: u32, height: u32) -> RgbBitmap {
        RgbBitmap {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3]
                .into_boxed_slice(),
        }
    }

    /// Gets the colour of the pixel at the given coordinates.
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            panic!("Pixel coordinates out of bounds");
        }

        let index = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[index], self.data[index + 1], self.data[index + 2]]
    }

    /// Sets the pixel at the given coordinates to the given colour.
    pub fn set_pixel(&mut self, x: u32, y: u32, colour: [u8; 3]) {
        if x >= self.width || y >= self.height {
            panic!("Pixel coordinates out of bounds");
        }

        let index = (y as usize * self.width as usize + x as usize) * 3;
        self.data[index..index + 3].copy_from_slice(&colour);
    }

    /// Writes the bitmap to a PNG file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - The path to the output PNG file.
    pub fn write_to_png(
        &self,
        file_path: &str,
    ) -> Result<(), image::ImageError> {
        let mut img = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                img.put_pixel(x, y, Rgb(self.get_pixel(x, y)));
            }
        }
        img.save(file_path)
    }
}

/// Colours every cell of the grid into a bitmap. Grid row 0 is the
/// southern edge, so rows are flipped to put north at the top of the
/// image. Suspected water takes the scheme's water colour; everything
/// else goes through the altitude ramp scaled by the area's maximum.
pub fn render(
    grid: &AltitudeGrid,
    water: Option<&WaterMask>,
    scheme: &ColourScheme,
    max_altitude: f32,
) -> RgbBitmap {
    let width = grid.width;
    let height = grid.height;
    let mut data =
        vec![0u8; width as usize * height as usize * 3].into_boxed_slice();

    data.par_chunks_mut(width as usize * 3)
        .enumerate()
        .for_each(|(image_row, row)| {
            let grid_row = height - 1 - image_row as u32;
            for x in 0..width {
                let colour = match water {
                    Some(mask) if mask.is_water(x, grid_row) => {
                        scheme.water_colour()
                    }
                    _ => scheme.land_colour(
                        grid.altitude_at(x, grid_row),
                        max_altitude,
                    ),
                };
                let index = x as usize * 3;
                row[index..index + 3].copy_from_slice(&colour);
            }
        });

    RgbBitmap {
        width,
        height,
        data,
    }
}
