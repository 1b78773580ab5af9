use ipsonar::{BatchLookupIpResponse, BatchLookupRequestBody, IpGeolocation, LookupMyParams};
use pretty_assertions::assert_eq;


use test_helpers::sample_geolocation;

#[test]
fn test_geolocation_round_trip_keeps_every_field() {
    let geo = sample_geolocation();
    let json = serde_json::to_string(&geo).unwrap();
    let back: IpGeolocation = serde_json::from_str(&json).unwrap();

    assert_eq!(back, geo);
    assert_eq!(back.subdivision2_code, Some(String::new()));
    assert_eq!(back.latitude, Some(40.7128_f32));
    assert_eq!(back.accuracy_radius, Some(50));
}

#[test]
fn test_empty_string_is_distinct_from_absent() {
    let empty = IpGeolocation {
        postal_code: Some(String::new()),
        ..Default::default()
    };
    let absent = IpGeolocation::default();

    let empty_json = serde_json::to_value(&empty).unwrap();
    let absent_json = serde_json::to_value(&absent).unwrap();
    assert_eq!(empty_json, serde_json::json!({"postal_code": ""}));
    assert_eq!(absent_json, serde_json::json!({}));

    let decoded: IpGeolocation = serde_json::from_value(empty_json).unwrap();
    assert_eq!(decoded, empty);
    assert_ne!(decoded, absent);
}

#[test]
fn test_wire_field_names() {
    let json = r#"{
        "ip": "81.2.69.142",
        "country_code": "GB",
        "country_name": "United Kingdom",
        "city_name": "London",
        "continent_code": "EU",
        "continent_name": "Europe",
        "latitude": 51.5142,
        "longitude": -0.0931,
        "timezone": "Europe/London",
        "postal_code": "EC2V",
        "accuracy_radius": 10,
        "is_in_eu": false,
        "subdivision_1_code": "ENG",
        "subdivision_1_name": "England",
        "subdivision_2_code": "LND",
        "subdivision_2_name": "City of London"
    }"#;
    let geo: IpGeolocation = serde_json::from_str(json).unwrap();

    assert_eq!(geo.country_name.as_deref(), Some("United Kingdom"));
    assert_eq!(geo.continent_code.as_deref(), Some("EU"));
    assert!((geo.longitude.unwrap() + 0.0931).abs() < 1e-6);
    assert_eq!(geo.is_in_eu, Some(false));
    assert_eq!(geo.subdivision1_code.as_deref(), Some("ENG"));
    assert_eq!(geo.subdivision2_name.as_deref(), Some("City of London"));
}

#[test]
fn test_unknown_fields_are_ignored() {
    let geo: IpGeolocation = serde_json::from_str(r#"{"ip":"1.1.1.1","asn":13335}"#).unwrap();
    assert_eq!(geo.ip.as_deref(), Some("1.1.1.1"));
}

#[test]
fn test_batch_bodies() {
    let request = BatchLookupRequestBody::new(vec!["1.1.1.1".to_string(), "8.8.4.4".to_string()]);
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        serde_json::json!({"data": ["1.1.1.1", "8.8.4.4"]})
    );

    let response: BatchLookupIpResponse = serde_json::from_str(r#"{"data":[{"ip":"1.1.1.1"},{}]}"#).unwrap();
    assert_eq!(response.data.len(), 2);
    assert_eq!(response.data[1], IpGeolocation::default());
}

#[test]
fn test_params_query_pairs() {
    let params = LookupMyParams::new().with_locale_code("ja");
    assert_eq!(params.query_pairs(), vec![("locale_code", "ja")]);
}
