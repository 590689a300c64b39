//! GeoJSON vector I/O
//!
//! Pour points come in as GeoJSON point features, clipping masks as a
//! polygon feature, and vectorized watershed/basin outputs go out as a
//! FeatureCollection of multipolygons carrying their raster value.

use crate::error::{Error, Result};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use std::fs;
use std::path::Path;

fn parse_file(path: &Path) -> Result<GeoJson> {
    let text = fs::read_to_string(path)?;
    text.parse::<GeoJson>()
        .map_err(|e| Error::Vector(format!("{}: {}", path.display(), e)))
}

/// Geometries of a GeoJSON document, in document order
fn geometries(gj: GeoJson) -> Vec<Geometry> {
    match gj {
        GeoJson::Geometry(g) => vec![g],
        GeoJson::Feature(f) => f.geometry.into_iter().collect(),
        GeoJson::FeatureCollection(fc) => {
            fc.features.into_iter().filter_map(|f| f.geometry).collect()
        }
    }
}

fn position_to_coord(pos: &[f64]) -> Result<Coord<f64>> {
    if pos.len() < 2 {
        return Err(Error::Vector("position with fewer than 2 ordinates".into()));
    }
    Ok(Coord {
        x: pos[0],
        y: pos[1],
    })
}

fn ring_to_linestring(ring: &[Vec<f64>]) -> Result<LineString<f64>> {
    let coords: Result<Vec<Coord<f64>>> =
        ring.iter().map(|pos| position_to_coord(pos)).collect();
    Ok(LineString::new(coords?))
}

fn rings_to_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let mut iter = rings.iter();
    let exterior = iter
        .next()
        .ok_or_else(|| Error::Vector("polygon with no rings".into()))?;
    let interiors: Result<Vec<LineString<f64>>> =
        iter.map(|ring| ring_to_linestring(ring)).collect();
    Ok(Polygon::new(ring_to_linestring(exterior)?, interiors?))
}

/// Read all point features from a GeoJSON file.
///
/// Point and MultiPoint geometries contribute; other geometry types in
/// the file are ignored.
pub fn read_points<P: AsRef<Path>>(path: P) -> Result<Vec<Point<f64>>> {
    let path = path.as_ref();
    let mut points = Vec::new();

    for geom in geometries(parse_file(path)?) {
        match geom.value {
            Value::Point(pos) => points.push(Point::from(position_to_coord(&pos)?)),
            Value::MultiPoint(positions) => {
                for pos in &positions {
                    points.push(Point::from(position_to_coord(pos)?));
                }
            }
            _ => {}
        }
    }

    if points.is_empty() {
        return Err(Error::Vector(format!(
            "{}: no point features found",
            path.display()
        )));
    }

    Ok(points)
}

/// Read the first polygon feature from a GeoJSON file.
///
/// For a MultiPolygon geometry the first member polygon is used.
pub fn read_mask_polygon<P: AsRef<Path>>(path: P) -> Result<Polygon<f64>> {
    let path = path.as_ref();

    for geom in geometries(parse_file(path)?) {
        match geom.value {
            Value::Polygon(rings) => return rings_to_polygon(&rings),
            Value::MultiPolygon(polys) => {
                if let Some(rings) = polys.first() {
                    return rings_to_polygon(rings);
                }
            }
            _ => {}
        }
    }

    Err(Error::Vector(format!(
        "{}: no polygon features found",
        path.display()
    )))
}

fn linestring_to_ring(ls: &LineString<f64>) -> Vec<Vec<f64>> {
    ls.coords().map(|c| vec![c.x, c.y]).collect()
}

fn multipolygon_to_value(mp: &MultiPolygon<f64>) -> Value {
    let polys = mp
        .iter()
        .map(|poly| {
            let mut rings = vec![linestring_to_ring(poly.exterior())];
            rings.extend(poly.interiors().iter().map(linestring_to_ring));
            rings
        })
        .collect();
    Value::MultiPolygon(polys)
}

/// Write labeled multipolygons as a GeoJSON FeatureCollection.
///
/// Each entry becomes one feature with its raster value stored under
/// `value_field`.
pub fn write_polygon_features<P: AsRef<Path>>(
    path: P,
    features: &[(i32, MultiPolygon<f64>)],
    value_field: &str,
) -> Result<()> {
    let features = features
        .iter()
        .map(|(value, mp)| {
            let mut properties = JsonObject::new();
            properties.insert(value_field.to_string(), JsonValue::from(*value));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(multipolygon_to_value(mp))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    fs::write(path, GeoJson::from(collection).to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_points_from_collection() {
        let tmp = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        fs::write(
            tmp.path(),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[55.0,45.0]}},
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[10.5,-3.25]}}
            ]}"#,
        )
        .unwrap();

        let points = read_points(tmp.path()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], Point::new(55.0, 45.0));
        assert_eq!(points[1], Point::new(10.5, -3.25));
    }

    #[test]
    fn read_points_rejects_empty() {
        let tmp = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        fs::write(tmp.path(), r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert!(read_points(tmp.path()).is_err());
    }

    #[test]
    fn read_mask_first_polygon() {
        let tmp = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        fs::write(
            tmp.path(),
            r#"{"type":"Feature","properties":{},"geometry":
                {"type":"Polygon","coordinates":[[[0,0],[10,0],[10,10],[0,10],[0,0]]]}}"#,
        )
        .unwrap();

        let poly = read_mask_polygon(tmp.path()).unwrap();
        assert_eq!(poly.exterior().0.len(), 5);
        assert_eq!(poly.interiors().len(), 0);
    }

    #[test]
    fn polygon_write_roundtrip() {
        use geo_types::polygon;

        let square: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 4.0),
            (x: 0.0, y: 0.0),
        ];
        let features = vec![(3, MultiPolygon::new(vec![square]))];

        let tmp = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        write_polygon_features(tmp.path(), &features, "gridcode").unwrap();

        let text = fs::read_to_string(tmp.path()).unwrap();
        let gj: GeoJson = text.parse().unwrap();
        match gj {
            GeoJson::FeatureCollection(fc) => {
                assert_eq!(fc.features.len(), 1);
                let feature = &fc.features[0];
                assert_eq!(
                    feature.properties.as_ref().unwrap().get("gridcode"),
                    Some(&JsonValue::from(3))
                );
                match &feature.geometry.as_ref().unwrap().value {
                    Value::MultiPolygon(polys) => assert_eq!(polys[0][0].len(), 5),
                    other => panic!("expected MultiPolygon, got {:?}", other),
                }
            }
            other => panic!("expected FeatureCollection, got {:?}", other),
        }
    }
}
