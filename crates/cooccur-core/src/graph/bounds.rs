use crate::entity::Coordinates;

use super::types::GeoBounds;

const PADDING_RATIO: f64 = 0.1;
const MIN_PADDING: f64 = 0.1;

fn padding(span: f64) -> f64 {
    let pad = span * PADDING_RATIO;
    if pad.abs() < f64::EPSILON {
        MIN_PADDING
    } else {
        pad
    }
}

/// Bounding box of `points`, each axis padded by a tenth of its span
/// (0.1 degrees for a zero span). `None` when there are no points.
#[must_use]
pub fn padded_bounds<'a>(points: impl IntoIterator<Item = &'a Coordinates>) -> Option<GeoBounds> {
    let mut points = points.into_iter();
    let first = points.next()?;

    let mut b = GeoBounds {
        north: first.lat,
        south: first.lat,
        east: first.lng,
        west: first.lng,
    };
    for p in points {
        b.north = b.north.max(p.lat);
        b.south = b.south.min(p.lat);
        b.east = b.east.max(p.lng);
        b.west = b.west.min(p.lng);
    }

    let lat_pad = padding(b.north - b.south);
    let lng_pad = padding(b.east - b.west);

    Some(GeoBounds {
        north: b.north + lat_pad,
        south: b.south - lat_pad,
        east: b.east + lng_pad,
        west: b.west - lng_pad,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_points() {
        assert!(padded_bounds(std::iter::empty()).is_none());
    }

    #[test]
    fn test_padding_ten_percent() {
        let points = [Coordinates::new(10.0, -5.0), Coordinates::new(20.0, 5.0)];
        let b = padded_bounds(&points).unwrap();

        assert!(close(b.north, 21.0));
        assert!(close(b.south, 9.0));
        assert!(close(b.east, 6.0));
        assert!(close(b.west, -6.0));
    }

    #[test]
    fn test_single_point_uses_min_padding() {
        let points = [Coordinates::new(12.5, 2.0)];
        let b = padded_bounds(&points).unwrap();

        assert!(close(b.north, 12.6));
        assert!(close(b.south, 12.4));
        assert!(close(b.east, 2.1));
        assert!(close(b.west, 1.9));
    }
}
