use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::dto::Prediction;
use crate::config::ClassifierConfig;

/// Raw `(class, confidence)` pairs, confidence in `0.0..=1.0`.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &[u8]) -> anyhow::Result<Vec<(String, f64)>>;
}

/// Hosted Roboflow classification model.
pub struct RoboflowClassifier {
    http: Client,
    api_url: String,
    model_id: String,
    api_key: Option<String>,
}

impl RoboflowClassifier {
    pub fn new(cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build classifier http client")?;
        Ok(Self {
            http,
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            model_id: cfg.model_id.trim_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[async_trait]
impl Classifier for RoboflowClassifier {
    async fn classify(&self, image: &[u8]) -> anyhow::Result<Vec<(String, f64)>> {
        let api_key = self
            .api_key
            .as_deref()
            .context("ROBOFLOW_API_KEY is not configured")?;

        debug!(model = %self.model_id, bytes = image.len(), "calling classifier");
        let resp = self
            .http
            .post(format!("{}/{}", self.api_url, self.model_id))
            .query(&[("api_key", api_key)])
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(BASE64.encode(image))
            .send()
            .await
            .context("classifier request")?;

        let status = resp.status();
        let body: Value = resp.json().await.context("decode classifier response")?;
        if !status.is_success() {
            anyhow::bail!("classifier returned {}: {}", status, body);
        }
        Ok(parse_predictions(&body))
    }
}

/// Accepts both multi-label (`{"class": {"confidence": ..}}`) and
/// single-label (`[{"class": .., "confidence": ..}]`) shapes.
pub(crate) fn parse_predictions(body: &Value) -> Vec<(String, f64)> {
    match body.get("predictions") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(class, data)| {
                let conf = data.get("confidence").and_then(Value::as_f64)?;
                Some((class.clone(), conf))
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|p| {
                let class = p.get("class").and_then(Value::as_str)?;
                let conf = p.get("confidence").and_then(Value::as_f64)?;
                Some((class.to_string(), conf))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Two most confident classes, skipping those that round to 0.00.
pub fn top_predictions(raw: Vec<(String, f64)>) -> Vec<Prediction> {
    let mut kept: Vec<(String, f64)> = raw
        .into_iter()
        .filter(|(_, conf)| (conf * 100.0).round() / 100.0 > 0.0)
        .collect();
    kept.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    kept.truncate(2);
    kept.into_iter()
        .map(|(class, conf)| Prediction {
            class_name: clean_class_name(&class),
            confidence: format!("{}%", (conf * 100.0).round() as i64),
        })
        .collect()
}

fn clean_class_name(class: &str) -> String {
    lazy_static! {
        static ref TRAILING_RE: Regex = Regex::new(r"[\s\d.%]+$").unwrap();
    }
    TRAILING_RE.replace(class, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(api_url: String, api_key: Option<&str>) -> ClassifierConfig {
        ClassifierConfig {
            api_key: api_key.map(str::to_string),
            api_url,
            model_id: "clothes/1".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn keeps_top_two_and_formats_percent() {
        let preds = top_predictions(vec![
            ("Tshirt 2".into(), 0.31),
            ("Saree".into(), 0.874),
            ("Coat".into(), 0.004),
            ("Jeans 95%".into(), 0.6),
        ]);
        assert_eq!(
            preds,
            vec![
                Prediction { class_name: "Saree".into(), confidence: "87%".into() },
                Prediction { class_name: "Jeans".into(), confidence: "60%".into() },
            ]
        );
    }

    #[test]
    fn drops_classes_that_round_to_zero() {
        let preds = top_predictions(vec![("Coat".into(), 0.004), ("Skirt".into(), 0.0)]);
        assert!(preds.is_empty());
    }

    #[test]
    fn equal_confidence_keeps_response_order() {
        let preds = top_predictions(vec![
            ("A".into(), 0.5),
            ("B".into(), 0.5),
            ("C".into(), 0.5),
        ]);
        let names: Vec<_> = preds.iter().map(|p| p.class_name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn strips_trailing_digits_and_percent() {
        assert_eq!(clean_class_name("Kurta 12.5 %"), "Kurta");
        assert_eq!(clean_class_name("T-shirt"), "T-shirt");
        assert_eq!(clean_class_name("Top2"), "Top");
    }

    #[test]
    fn parses_both_prediction_shapes() {
        let multi = json!({"predictions": {"Shirt": {"confidence": 0.9}, "Dress": {"confidence": 0.1}}});
        let mut got = parse_predictions(&multi);
        got.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(got, vec![("Dress".into(), 0.1), ("Shirt".into(), 0.9)]);

        let single = json!({"predictions": [{"class": "Pants", "confidence": 0.7}]});
        assert_eq!(parse_predictions(&single), vec![("Pants".into(), 0.7)]);

        assert!(parse_predictions(&json!({"error": "nope"})).is_empty());
    }

    #[tokio::test]
    async fn posts_base64_image_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/clothes/1"))
            .and(query_param("api_key", "rf-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"class": "Jacket", "confidence": 0.82}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RoboflowClassifier::new(&cfg(server.uri(), Some("rf-key"))).unwrap();
        let got = client.classify(b"img").await.unwrap();
        assert_eq!(got, vec![("Jacket".into(), 0.82)]);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, BASE64.encode(b"img").into_bytes());
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "forbidden"})))
            .mount(&server)
            .await;
        let client = RoboflowClassifier::new(&cfg(server.uri(), Some("bad"))).unwrap();
        let err = client.classify(b"img").await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_calling_out() {
        let client = RoboflowClassifier::new(&cfg("http://127.0.0.1:9".into(), None)).unwrap();
        let err = client.classify(b"img").await.unwrap_err();
        assert!(err.to_string().contains("ROBOFLOW_API_KEY"));
    }
}
