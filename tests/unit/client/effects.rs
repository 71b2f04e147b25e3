use std::io::Cursor;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::*;

fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn client_for(server: &MockServer) -> EffectClient {
    let base = server.uri().parse::<Url>().unwrap();
    EffectClient::with_config(ClientConfig::with_base_url(base)).unwrap()
}

fn scenario_path() -> Vec<GridPoint> {
    [[100, 150], [150, 200], [200, 150], [250, 200]]
        .into_iter()
        .map(GridPoint::from)
        .collect()
}

#[test]
fn json_error_under_200_is_remote_error() {
    let err = classify_response(
        StatusCode::OK,
        Some("application/json"),
        br#"{"error":"invalid radius"}"#,
    )
    .unwrap_err();
    match err {
        BrushError::Remote(m) => assert_eq!(m, "invalid radius"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn json_message_field_is_used_when_error_is_absent() {
    let err = classify_response(
        StatusCode::BAD_REQUEST,
        Some("application/json; charset=utf-8"),
        br#"{"message":"path too short"}"#,
    )
    .unwrap_err();
    assert_eq!(err.message(), "path too short");
}

#[test]
fn json_without_message_falls_back_to_status() {
    let err = classify_response(StatusCode::OK, Some("application/json"), b"{}").unwrap_err();
    assert_eq!(err.message(), "Failed to apply effect: 200 OK");

    let garbled =
        classify_response(StatusCode::BAD_GATEWAY, Some("application/json"), b"<html>").unwrap_err();
    assert_eq!(garbled.message(), "Failed to apply effect: 502 Bad Gateway");
}

#[test]
fn non_json_failure_is_transport_error() {
    let err = classify_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        Some("text/plain"),
        b"oops",
    )
    .unwrap_err();
    assert!(matches!(err, BrushError::Remote(_)));
    assert_eq!(err.message(), "Failed to apply effect: 500 Internal Server Error");
}

#[test]
fn binary_success_is_returned_untouched() {
    let bytes = png_bytes([1, 2, 3, 4]);
    let out = classify_response(StatusCode::OK, Some("image/png"), &bytes).unwrap();
    assert_eq!(out.media_type(), "image/png");
    assert_eq!(out.as_bytes(), &bytes[..]);

    let sniffed = classify_response(StatusCode::OK, None, &bytes).unwrap();
    assert_eq!(sniffed.media_type(), "image/png");
}

#[test]
fn validate_rejects_non_images_and_empty_paths() {
    let params = EffectParameters::default();
    let png = EncodedImage::png(png_bytes([0, 0, 0, 255]));
    let text = EncodedImage::new("text/plain", b"hi".to_vec());
    let path = scenario_path();

    let not_image = StrokeRequest {
        image: &text,
        path: &path,
        clicks: &[],
        user_input: &params,
    };
    assert!(matches!(not_image.validate(), Err(BrushError::Validation(_))));

    let empty = StrokeRequest {
        image: &png,
        path: &[],
        clicks: &[],
        user_input: &params,
    };
    assert!(matches!(empty.validate(), Err(BrushError::Validation(_))));
}

#[tokio::test]
async fn get_effects_returns_service_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/effects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"effects": ["heisenbrush", "acrylic", "qdrop"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let effects = client_for(&server).get_effects().await.unwrap();
    assert_eq!(effects, vec!["heisenbrush", "acrylic", "qdrop"]);
}

#[tokio::test]
async fn get_effects_decode_failure_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/effects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nope": 1})))
        .mount(&server)
        .await;

    let err = client_for(&server).get_effects().await.unwrap_err();
    assert!(matches!(err, BrushError::Remote(_)));
}

#[tokio::test]
async fn get_effects_transport_failure_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/effects"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).get_effects().await.unwrap_err();
    assert!(err.message().contains("503"));
}

#[tokio::test]
async fn stroke_request_carries_path_and_parameters() {
    let server = MockServer::start().await;
    let result = png_bytes([255, 128, 0, 128]);
    Mock::given(method("POST"))
        .and(path("/render/heisenbrush/stroke"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(result.clone(), "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let base = EncodedImage::png(png_bytes([255, 255, 255, 255]));
    let path = scenario_path();
    let params = EffectParameters::default().with_radius(20.0).with_strength(0.8);
    let out = client_for(&server)
        .apply_stroke_effect(
            "heisenbrush",
            StrokeRequest {
                image: &base,
                path: &path,
                clicks: &path[..1],
                user_input: &params,
            },
        )
        .await
        .unwrap();
    assert_eq!(out.as_bytes(), &result[..]);

    let received: Vec<Request> = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["path"].as_array().unwrap().len(), 4);
    assert_eq!(body["path"][0], json!([100, 150]));
    assert_eq!(body["clicks"], json!([[100, 150]]));
    assert_eq!(body["userInput"]["Radius"].as_f64(), Some(20.0));
    assert_eq!(body["userInput"]["Strength"].as_f64(), Some(0.8));
    assert!(
        body["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
}

#[tokio::test]
async fn stroke_json_error_under_200_is_not_treated_as_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/render/heisenbrush/stroke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid radius"})))
        .mount(&server)
        .await;

    let base = EncodedImage::png(png_bytes([255, 255, 255, 255]));
    let path = scenario_path();
    let params = EffectParameters::default();
    let err = client_for(&server)
        .apply_stroke_effect(
            "heisenbrush",
            StrokeRequest {
                image: &base,
                path: &path,
                clicks: &[],
                user_input: &params,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrushError::Remote(ref m) if m == "invalid radius"));
}

#[tokio::test]
async fn invalid_stroke_payload_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let base = EncodedImage::png(png_bytes([255, 255, 255, 255]));
    let params = EffectParameters::default();
    let err = client_for(&server)
        .apply_stroke_effect(
            "heisenbrush",
            StrokeRequest {
                image: &base,
                path: &[],
                clicks: &[],
                user_input: &params,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrushError::Validation(_)));
}

#[tokio::test]
async fn whole_image_effect_uploads_multipart_image_field() {
    let server = MockServer::start().await;
    let result = png_bytes([0, 0, 255, 255]);
    Mock::given(method("POST"))
        .and(path("/render/acrylic"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(result.clone(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let input = EncodedImage::png(png_bytes([9, 9, 9, 255]));
    let out = client_for(&server)
        .apply_effect("acrylic", &input)
        .await
        .unwrap();
    assert_eq!(out.as_bytes(), &result[..]);

    let received = server.received_requests().await.unwrap();
    let content_type = received[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"image\""));
}

#[tokio::test]
async fn whole_image_effect_surfaces_json_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/render/acrylic"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "unsupported format"})),
        )
        .mount(&server)
        .await;

    let input = EncodedImage::png(png_bytes([9, 9, 9, 255]));
    let err = client_for(&server)
        .apply_effect("acrylic", &input)
        .await
        .unwrap_err();
    assert_eq!(err.message(), "unsupported format");
}
