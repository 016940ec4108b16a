use crate::entities::Coordinates;

/// Where a location falls along a route. Distances in kilometres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub nearest_index: Option<usize>,
    pub covered: f64,
    pub left: f64,
}

/// Index of the route vertex closest to `location` and its distance in km.
/// The first vertex wins on ties.
pub fn nearest_vertex(path: &[Coordinates], location: &Coordinates) -> Option<(usize, f64)> {
    let mut nearest: Option<(usize, f64)> = None;

    for (index, vertex) in path.iter().enumerate() {
        let distance = vertex.haversine_km(location);

        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((index, distance)),
        }
    }

    nearest
}

/// Distance in meters from `location` to the closest route vertex.
pub fn deviation_m(path: &[Coordinates], location: &Coordinates) -> Option<f64> {
    nearest_vertex(path, location).map(|(_, km)| km * 1000.0)
}

/// Snaps `location` to the nearest vertex of `path` and measures the
/// distance covered up to it. Covered never drops below `previous_covered`,
/// and left is `planned - covered` floored at zero.
pub fn match_progress(
    path: &[Coordinates],
    location: &Coordinates,
    planned: f64,
    previous_covered: f64,
) -> Progress {
    let nearest = nearest_vertex(path, location);

    if path.len() < 2 {
        return Progress {
            nearest_index: nearest.map(|(index, _)| index),
            covered: 0.0,
            left: planned.max(0.0),
        };
    }

    let index = nearest.map(|(index, _)| index).unwrap_or(0);
    let covered: f64 = path[..=index]
        .windows(2)
        .map(|w| w[0].haversine_km(&w[1]))
        .sum();
    let covered = covered.max(previous_covered);

    Progress {
        nearest_index: Some(index),
        covered,
        left: (planned - covered).max(0.0),
    }
}
