//! Cell value trait bounding what a `Raster<T>` can hold

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// A numeric type usable as a raster cell.
///
/// Integer types mark no-data with an explicit sentinel; float types
/// additionally treat NaN as no-data whether or not a sentinel is set.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Conventional no-data sentinel for this type
    fn default_nodata() -> Self;

    /// Does this value mean no-data, given the raster's sentinel?
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// True for f32/f64 cells
    fn is_float() -> bool;

    /// Lossy widening to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! int_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }

            fn is_float() -> bool {
                false
            }
        }
    )*};
}

macro_rules! float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                self.is_nan()
                    || match nodata {
                        Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                        None => false,
                    }
            }

            fn is_float() -> bool {
                true
            }
        }
    )*};
}

int_element!(i16, i32, i64, u8, u16, u32);
float_element!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_always_nodata_for_floats() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::NAN.is_nodata(Some(-9999.0)));
        assert!(!1.5f64.is_nodata(None));
        assert!((-9999.0f64).is_nodata(Some(-9999.0)));
    }

    #[test]
    fn ints_need_an_explicit_sentinel() {
        assert!(!0i32.is_nodata(None));
        assert!(0i32.is_nodata(Some(0)));
        assert!(!7u8.is_nodata(Some(0)));
    }
}
