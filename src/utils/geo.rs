/// Assumed average door-to-door speed for ETA purposes, km/h
const AVERAGE_SPEED_KMH: f64 = 40.0;

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Best-effort ETA in whole minutes from a current position to a destination,
/// assuming straight-line distance at an average urban speed. Never zero for
/// distinct points; rounds up.
pub fn eta_minutes(from_lat: f64, from_lng: f64, to_lat: f64, to_lng: f64) -> i64 {
    let distance_km = haversine_distance(from_lat, from_lng, to_lat, to_lng);
    let minutes = distance_km / AVERAGE_SPEED_KMH * 60.0;
    minutes.ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_heathrow_central_london() {
        // Heathrow T2
        let heathrow = (51.4700, -0.4543);
        // Trafalgar Square
        let center = (51.5074, -0.1278);

        let distance = haversine_distance(heathrow.0, heathrow.1, center.0, center.1);
        // Should be approximately 20-30 km
        assert!(distance > 15.0 && distance < 35.0);
    }

    #[test]
    fn test_eta_scales_with_distance() {
        let heathrow = (51.4700, -0.4543);
        let center = (51.5074, -0.1278);
        let nearby = (51.4710, -0.4550);

        let far = eta_minutes(heathrow.0, heathrow.1, center.0, center.1);
        let near = eta_minutes(heathrow.0, heathrow.1, nearby.0, nearby.1);

        assert!(far > near);
        // ~23 km at 40 km/h is ~35 min
        assert!(far > 20 && far < 60, "eta was {}", far);
    }

    #[test]
    fn test_eta_zero_at_destination() {
        assert_eq!(eta_minutes(51.5, -0.1, 51.5, -0.1), 0);
    }
}
