use serde::Deserialize;

/// The generation endpoint's response body, parsed once into a tagged shape.
/// Either `error` is present (possibly alongside a 200 status) or `data`
/// carries the result items. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ImagesResponse {
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
    #[serde(default)]
    pub data: Option<Vec<ImageDatum>>,
    /// Some deployments attach a revision note at the top level when the
    /// result list is empty.
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

/// Structured error object, `{ "type": …, "message": … }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One generated-image descriptor. Exactly one of `url` / `b64_json` must be
/// present for the item to be decodable under the matching response format.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ImageDatum {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::ImagesResponse;

    #[test]
    fn parses_data_items_with_mixed_fields() {
        let body = r#"{
            "created": 1754000000,
            "data": [
                {"url": "https://img.example/a.png"},
                {"b64_json": "aGVsbG8=", "revised_prompt": "a safer cat"}
            ]
        }"#;
        let parsed: ImagesResponse = serde_json::from_str(body).expect("parse response");
        assert!(parsed.error.is_none());
        let items = parsed.data.expect("data present");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url.as_deref(), Some("https://img.example/a.png"));
        assert!(items[0].b64_json.is_none());
        assert_eq!(items[1].revised_prompt.as_deref(), Some("a safer cat"));
    }

    #[test]
    fn parses_error_object_with_missing_fields() {
        let parsed: ImagesResponse =
            serde_json::from_str(r#"{"error": {"message": "prompt too long"}}"#)
                .expect("parse response");
        let error = parsed.error.expect("error present");
        assert!(error.kind.is_none());
        assert_eq!(error.message.as_deref(), Some("prompt too long"));
    }

    #[test]
    fn parses_empty_data_with_top_level_revision_note() {
        let parsed: ImagesResponse =
            serde_json::from_str(r#"{"data": [], "revised_prompt": "toned down"}"#)
                .expect("parse response");
        assert_eq!(parsed.data.as_deref(), Some(&[][..]));
        assert_eq!(parsed.revised_prompt.as_deref(), Some("toned down"));
    }
}
