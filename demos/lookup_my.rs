use ipsonar::prelude::*;
use ipsonar::{ApiKeyEditor, API_KEY_ENV_VAR};

/// Look up the geolocation of the machine running this example
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut options = Vec::new();
    match std::env::var(API_KEY_ENV_VAR) {
        Ok(key) => options.push(with_request_editor_fn(ApiKeyEditor::new(key))),
        Err(_) => println!("Note: {} not set, sending the request without an API key.", API_KEY_ENV_VAR),
    }

    let client = ClientWithResponses::new(API_SERVER, options)?;

    let params = LookupMyParams::new().with_fields([
        "ip",
        "country_code",
        "country_name",
        "city_name",
        "latitude",
        "longitude",
    ]);
    let response = client.lookup_my_with_response(Some(&params)).await?;

    if response.status_code() != 200 {
        println!("Lookup failed: {}", response.status());
        if let Some(error) = response.json401.as_ref().or(response.json429.as_ref()) {
            println!("API said: {}", error.message);
        }
        return Ok(());
    }

    // Every field is optional, so only print what the API returned
    let Some(geo) = response.json200.as_ref() else {
        println!("Unexpected response body: {}", String::from_utf8_lossy(&response.body));
        return Ok(());
    };
    if let Some(ip) = &geo.ip {
        println!("IP: {}", ip);
    }
    if let Some(code) = &geo.country_code {
        println!("Country code: {}", code);
    }
    if let Some(name) = &geo.country_name {
        println!("Country name: {}", name);
    }
    if let Some(city) = &geo.city_name {
        println!("City name: {}", city);
    }
    if let (Some(lat), Some(lon)) = (geo.latitude, geo.longitude) {
        println!("Coordinates: {:.4}, {:.4}", lat, lon);
    }

    Ok(())
}
