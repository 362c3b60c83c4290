//! Coordinate helpers shared by the loader, the spatial index and the
//! exporters. All geometry is planar; distances are Euclidean in the
//! input coordinate system.

use anyhow::{anyhow, Result};
use geo::{Coord, LineString};

/// Squared Euclidean distance between two coordinates.
pub fn distance_sq(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Parses a `LINESTRING (x y, x y, ...)` geometry value. The keyword and
/// parentheses are optional, so a bare `x y, x y` list is accepted too.
pub fn parse_linestring(text: &str) -> Result<LineString<f64>> {
    let trimmed = text.trim();
    let has_keyword = trimmed
        .get(..10)
        .map_or(false, |p| p.eq_ignore_ascii_case("linestring"));
    let body = if has_keyword {
        let rest = trimmed[10..].trim();
        rest.strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| anyhow!("Malformed LINESTRING literal: {}", text))?
    } else {
        trimmed
    };

    if body.trim().is_empty() {
        return Err(anyhow!("Empty geometry value"));
    }

    let mut coords = Vec::new();
    for pair in body.split(',') {
        let mut parts = pair.split_whitespace();
        let x = parts
            .next()
            .ok_or_else(|| anyhow!("Missing x ordinate in: {}", pair))?
            .parse::<f64>()?;
        let y = parts
            .next()
            .ok_or_else(|| anyhow!("Missing y ordinate in: {}", pair))?
            .parse::<f64>()?;
        if parts.next().is_some() {
            return Err(anyhow!("Expected 2 ordinates per point, got more in: {}", pair));
        }
        coords.push(Coord { x, y });
    }

    Ok(LineString::new(coords))
}

/// Renders a coordinate sequence as a WKT literal. A single coordinate
/// becomes a POINT, anything longer a LINESTRING; an empty sequence is an
/// empty string.
pub fn points_to_wkt(points: &[(f64, f64)]) -> String {
    match points {
        [] => String::new(),
        [(x, y)] => format!("POINT ({} {})", x, y),
        _ => {
            let body: Vec<String> = points.iter().map(|(x, y)| format!("{} {}", x, y)).collect();
            format!("LINESTRING ({})", body.join(", "))
        }
    }
}

/// The polyline with its coordinate order flipped, for the reverse edge of
/// a two-way record.
pub fn reversed(line: &LineString<f64>) -> LineString<f64> {
    LineString::new(line.0.iter().rev().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wkt_linestring() {
        let line = parse_linestring("LINESTRING (0 0, 1 2, 3.5 -4)").unwrap();
        assert_eq!(line.0.len(), 3);
        assert_eq!(line.0[2], Coord { x: 3.5, y: -4.0 });
    }

    #[test]
    fn parses_lowercase_and_bare_forms() {
        assert_eq!(parse_linestring("linestring (1 1, 2 2)").unwrap().0.len(), 2);
        assert_eq!(parse_linestring("1 1, 2 2").unwrap().0.len(), 2);
    }

    #[test]
    fn rejects_malformed_literals() {
        assert!(parse_linestring("LINESTRING 0 0, 1 1").is_err());
        assert!(parse_linestring("").is_err());
        assert!(parse_linestring("1 2 3, 4 5").is_err());
        assert!(parse_linestring("a b, 1 2").is_err());
    }

    #[test]
    fn wkt_output_matches_point_count() {
        assert_eq!(points_to_wkt(&[]), "");
        assert_eq!(points_to_wkt(&[(1.0, 2.0)]), "POINT (1 2)");
        assert_eq!(
            points_to_wkt(&[(0.0, 0.0), (1.0, 1.0)]),
            "LINESTRING (0 0, 1 1)"
        );
    }

    #[test]
    fn reversed_flips_order() {
        let line = parse_linestring("0 0, 1 0, 1 1").unwrap();
        let rev = reversed(&line);
        assert_eq!(rev.0.first(), line.0.last());
        assert_eq!(rev.0.last(), line.0.first());
    }
}
