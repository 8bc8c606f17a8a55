//! Pricing quoter: a pure function of route, vehicle category and extras.

use rust_decimal::Decimal;

use crate::domain::money::round_currency;
use crate::utils::geo::haversine_distance;

/// Flat fallback distance when either end of the route has no coordinates,
/// roughly an average airport-to-city run.
const DEFAULT_DISTANCE_KM: f64 = 30.0;

fn child_seat_fee() -> Decimal {
    Decimal::new(500, 2)
}

#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub vehicle_category: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub passengers: i32,
    pub child_seats: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub customer_price: Decimal,
    /// Payout offered to whoever executes the job
    pub driver_price: Decimal,
    pub distance_km: Option<i64>,
}

/// Per-category base fare and per-km rate, customer side. Unknown categories
/// price as a sedan.
fn category_rates(category: &str) -> (Decimal, Decimal) {
    let (base_cents, per_km_cents) = match category {
        "sedan" => (3500, 140),
        "estate" => (4000, 155),
        "minivan" => (5000, 190),
        "minibus" => (7000, 240),
        "luxury" => (9000, 310),
        _ => (3500, 140),
    };
    (Decimal::new(base_cents, 2), Decimal::new(per_km_cents, 2))
}

fn route_distance_km(req: &QuoteRequest) -> f64 {
    match (req.pickup_lat, req.pickup_lng, req.dropoff_lat, req.dropoff_lng) {
        (Some(plat), Some(plng), Some(dlat), Some(dlng)) => {
            haversine_distance(plat, plng, dlat, dlng)
        }
        _ => DEFAULT_DISTANCE_KM,
    }
}

/// Compute a customer quote and the matching driver payout. Stateless.
pub fn quote_price(req: &QuoteRequest) -> Quote {
    let (base, per_km) = category_rates(&req.vehicle_category);
    let distance = route_distance_km(req);
    let distance_dec = Decimal::from_f64_retain(distance).unwrap_or(Decimal::ZERO);

    let extras = child_seat_fee() * Decimal::from(req.child_seats.max(0));

    let customer_price = round_currency(base + per_km * distance_dec + extras);
    // Driver side runs at 65% of the customer fare, extras passed through
    let driver_price =
        round_currency((base + per_km * distance_dec) * Decimal::new(65, 2) + extras);

    let has_route = req.pickup_lat.is_some()
        && req.pickup_lng.is_some()
        && req.dropoff_lat.is_some()
        && req.dropoff_lng.is_some();

    Quote {
        customer_price,
        driver_price,
        distance_km: has_route.then(|| distance.round() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> QuoteRequest {
        QuoteRequest {
            vehicle_category: "sedan".to_string(),
            pickup_lat: None,
            pickup_lng: None,
            dropoff_lat: None,
            dropoff_lng: None,
            passengers: 2,
            child_seats: 0,
        }
    }

    #[test]
    fn quote_without_coordinates_uses_fallback_distance() {
        let quote = quote_price(&base_request());
        // 35.00 + 1.40 * 30
        assert_eq!(quote.customer_price, "77.00".parse().unwrap());
        assert_eq!(quote.distance_km, None);
    }

    #[test]
    fn quote_is_deterministic() {
        let req = base_request();
        assert_eq!(quote_price(&req), quote_price(&req));
    }

    #[test]
    fn child_seats_add_flat_fee() {
        let mut req = base_request();
        req.child_seats = 2;
        let with_seats = quote_price(&req);
        req.child_seats = 0;
        let without = quote_price(&req);

        assert_eq!(
            with_seats.customer_price - without.customer_price,
            "10.00".parse().unwrap()
        );
    }

    #[test]
    fn larger_categories_cost_more() {
        let mut req = base_request();
        let sedan = quote_price(&req);
        req.vehicle_category = "minibus".to_string();
        let minibus = quote_price(&req);

        assert!(minibus.customer_price > sedan.customer_price);
    }

    #[test]
    fn driver_price_below_customer_price() {
        let quote = quote_price(&base_request());
        assert!(quote.driver_price < quote.customer_price);
        assert!(quote.driver_price > Decimal::ZERO);
    }

    #[test]
    fn coordinates_drive_the_distance() {
        let mut req = base_request();
        // Heathrow -> central London, ~25 km
        req.pickup_lat = Some(51.4700);
        req.pickup_lng = Some(-0.4543);
        req.dropoff_lat = Some(51.5074);
        req.dropoff_lng = Some(-0.1278);

        let quote = quote_price(&req);
        let km = quote.distance_km.unwrap();
        assert!((20..=30).contains(&km), "unexpected distance {}", km);
    }
}
