//! GeoTIFF reading and writing via the `tiff` crate
//!
//! Single-band rasters only. Floating point rasters are written as
//! 32-bit IEEE samples, integer rasters as 32-bit signed samples.
//! Georeferencing is carried through ModelPixelScaleTag and
//! ModelTiepointTag; full CRS metadata is out of scope.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, GrayI32};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoKeyDirectoryTag has no named variant in the tiff crate
const GEO_KEY_DIRECTORY: u16 = 34735;

/// Read a single-band GeoTIFF file into a `Raster<T>`.
///
/// Sample values are cast to `T`; values that do not fit become `T`'s
/// default no-data value.
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let image = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match image {
        DecodingResult::U8(buf) => cast_samples(&buf),
        DecodingResult::U16(buf) => cast_samples(&buf),
        DecodingResult::U32(buf) => cast_samples(&buf),
        DecodingResult::I8(buf) => cast_samples(&buf),
        DecodingResult::I16(buf) => cast_samples(&buf),
        DecodingResult::I32(buf) => cast_samples(&buf),
        DecodingResult::F32(buf) => cast_samples(&buf),
        DecodingResult::F64(buf) => cast_samples(&buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions { rows, cols });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    Ok(raster)
}

fn cast_samples<S, T>(buf: &[S]) -> Vec<T>
where
    S: Copy + num_traits::NumCast,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// Recover the affine transform from ModelPixelScaleTag + ModelTiepointTag
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    // The decoder keys its IFD by the named Tag variants, so the
    // lookups must use them rather than Tag::Unknown with the raw id.
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}

/// Write a `Raster<T>` to a single-band GeoTIFF file.
///
/// Floating point element types are stored as f32 samples, integer
/// element types as i32 samples.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let gt = *raster.transform();

    // Georeferencing tags shared by both sample formats.
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    // Minimal geokey directory: version 1.1.0, GTModelTypeGeoKey=Projected,
    // GTRasterTypeGeoKey=PixelIsArea.
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];

    macro_rules! encode {
        ($color:ty, $sample:ty, $fallback:expr) => {{
            let data: Vec<$sample> = raster
                .data()
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or($fallback))
                .collect();

            let mut image = encoder
                .new_image::<$color>(cols as u32, rows as u32)
                .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &scale[..])
                .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;
            image
                .encoder()
                .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
                .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;
            image
                .encoder()
                .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
                .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;
            image
                .write_data(&data)
                .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
        }};
    }

    if T::is_float() {
        encode!(Gray32Float, f32, f32::NAN);
    } else {
        encode!(GrayI32, i32, 0);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_f64() {
        let mut dem: Raster<f64> = Raster::new(4, 3);
        dem.set_transform(GeoTransform::new(500.0, 4000.0, 30.0, -30.0));
        for row in 0..4 {
            for col in 0..3 {
                dem[(row, col)] = (row * 3 + col) as f64 * 1.5;
            }
        }

        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&dem, tmp.path()).unwrap();

        let copy: Raster<f64> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(copy.shape(), (4, 3));
        assert_eq!(copy[(2, 1)], dem[(2, 1)]);

        let gt = copy.transform();
        assert!((gt.origin_x - 500.0).abs() < 1e-9);
        assert!((gt.origin_y - 4000.0).abs() < 1e-9);
        assert!((gt.pixel_width - 30.0).abs() < 1e-9);
        assert!((gt.pixel_height + 30.0).abs() < 1e-9);
    }

    #[test]
    fn roundtrip_i32_labels() {
        let mut labels: Raster<i32> = Raster::new(2, 2);
        labels[(0, 0)] = 1;
        labels[(1, 1)] = -7;

        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&labels, tmp.path()).unwrap();

        let copy: Raster<i32> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(copy[(0, 0)], 1);
        assert_eq!(copy[(0, 1)], 0);
        assert_eq!(copy[(1, 1)], -7);
    }

    #[test]
    fn u8_written_as_i32_reads_back() {
        let mut dirs: Raster<u8> = Raster::new(2, 2);
        dirs[(0, 1)] = 128;

        let tmp = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&dirs, tmp.path()).unwrap();

        let copy: Raster<u8> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(copy[(0, 1)], 128);
    }
}
