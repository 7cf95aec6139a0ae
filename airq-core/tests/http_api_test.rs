//! Tests for the HTTP clients against a mock air-quality service and geocoder.

use airq_core::{
    AirQualityApi, ApiError, Geocoder, HttpAirQualityApi, Location, NominatimGeocoder, Pollutant,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn new_york() -> Location {
    Location::new(40.7, -74.0, "New York")
}

#[tokio::test]
async fn air_quality_reading_is_decoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air-quality"))
        .and(query_param("lat", "40.7"))
        .and(query_param("lon", "-74"))
        .and(query_param("pollutant", "NO2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "readings": [{
                "pollutant": "NO2",
                "value": 25.3,
                "unit": "ppb",
                "aqi": 42,
                "quality_level": "Good",
                "available": true,
                "timestamp": "2025-01-01T12:00:00Z"
            }],
            "location": { "data_source": "tempo_satellite" }
        })))
        .mount(&server)
        .await;

    let api = HttpAirQualityApi::new(server.uri());
    let current = api.air_quality(&new_york(), Pollutant::No2).await.expect("reading");

    let reading = current.reading.expect("available reading");
    assert_eq!(reading.aqi, 42);
    assert_eq!(reading.value, 25.3);
    assert_eq!(reading.unit, "ppb");
    assert_eq!(current.data_source, "tempo_satellite");
}

#[tokio::test]
async fn unavailable_reading_has_no_numbers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air-quality"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "readings": [{
                "pollutant": "NO2",
                "value": null,
                "unit": "ppb",
                "aqi": null,
                "quality_level": "Unknown",
                "available": false,
                "timestamp": "2025-01-01T12:00:00Z"
            }],
            "location": { "data_source": "unsupported" }
        })))
        .mount(&server)
        .await;

    let api = HttpAirQualityApi::new(server.uri());
    let current = api.air_quality(&new_york(), Pollutant::No2).await.expect("response");

    assert_eq!(current.reading, None);
    assert_eq!(current.data_source, "unsupported");
}

#[tokio::test]
async fn air_quality_error_carries_detail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air-quality"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "No TEMPO granules found" })),
        )
        .mount(&server)
        .await;

    let api = HttpAirQualityApi::new(server.uri());
    let err = api.air_quality(&new_york(), Pollutant::O3).await.unwrap_err();

    match err {
        ApiError::Status { status, detail, endpoint } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "No TEMPO granules found");
            assert_eq!(endpoint, "/air-quality");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/overall-aqi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "aqi": 12 })))
        .mount(&server)
        .await;

    let api = HttpAirQualityApi::new(server.uri());
    let err = api.overall_aqi(&new_york()).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
}

#[tokio::test]
async fn side_resources_are_decoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("hours", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "forecast": [
                { "timestamp": "2025-01-01T13:00:00Z", "aqi": 45, "primary_pollutant": "NO2" },
                { "timestamp": "2025-01-01T14:00:00Z", "aqi": 52, "primary_pollutant": "O3" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [{
                "level": "moderate",
                "message": "Ozone rising",
                "recommendation": "Limit outdoor exercise",
                "expires_at": "2025-01-01T18:00:00Z"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pollutants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pollutants": [{
                "name": "HCHO",
                "full_name": "Formaldehyde",
                "sources": ["Industry", "Wildfires"],
                "health_effects": "Eye and throat irritation"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/overall-aqi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "overall_aqi": 57 })))
        .mount(&server)
        .await;

    let api = HttpAirQualityApi::new(format!("{}/", server.uri()));
    let loc = new_york();

    let forecast = api.forecast(&loc, 24).await.expect("forecast");
    assert_eq!(forecast.len(), 2);
    assert_eq!(forecast[1].primary_pollutant, "O3");

    let alerts = api.alerts(&loc).await.expect("alerts");
    assert_eq!(alerts[0].message, "Ozone rising");

    let catalog = api.pollutants().await.expect("catalog");
    assert_eq!(catalog[0].sources, vec!["Industry", "Wildfires"]);

    assert_eq!(api.overall_aqi(&loc).await.expect("overall"), 57);
}

#[tokio::test]
async fn geocoder_search_and_reverse() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Par"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "lat": "48.8566", "lon": "2.3522", "display_name": "Paris, Île-de-France, France" },
            { "lat": "33.6609", "lon": "-95.5555", "display_name": "Paris, Lamar County, Texas, United States" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": { "town": "Hoboken", "country": "United States" }
        })))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(server.uri());

    let found = geocoder.search("Par", 5).await.expect("search");
    assert_eq!(found.len(), 2);
    assert_eq!(found[1].lon, -95.5555);

    let name = geocoder.reverse(40.74, -74.03).await.expect("reverse");
    assert_eq!(name.as_deref(), Some("Hoboken"));
}

#[tokio::test]
async fn geocoder_failure_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(server.uri());
    let err = geocoder.search("Paris", 5).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
}
