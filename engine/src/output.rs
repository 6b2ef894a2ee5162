//! Providers answer with a bare URL, an object with a `url`, a list of either, or (fal) an
//! object holding an `images` list. All of these flatten to a list of URLs here.

use serde_json::Value;

const URL_KEYS: [&str; 4] = ["url", "images", "image", "output"];

/// Every http(s) URL in `output`, in document order, without duplicates
pub fn image_urls(output: &Value) -> Vec<String> {
    let mut urls = vec![];
    collect(output, &mut urls);
    urls
}

fn collect(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let url = s.trim();
            let is_http = url.starts_with("http://") || url.starts_with("https://");
            if is_http && !out.iter().any(|known| known == url) {
                out.push(url.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, out);
            }
        }
        Value::Object(obj) => {
            for key in URL_KEYS {
                if let Some(v) = obj.get(key) {
                    collect(v, out);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn single_url_string() {
        let output = json!("https://replicate.delivery/a.png");
        assert_eq!(image_urls(&output), ["https://replicate.delivery/a.png"]);
    }

    #[test]
    fn list_of_urls_and_objects() {
        let output = json!([
            "https://replicate.delivery/a.png",
            {"url": "https://replicate.delivery/b.png"},
            "https://replicate.delivery/a.png",
        ]);
        assert_eq!(
            image_urls(&output),
            [
                "https://replicate.delivery/a.png",
                "https://replicate.delivery/b.png"
            ]
        );
    }

    #[test]
    fn fal_images_response() {
        let output = json!({
            "images": [
                {"url": "https://fal.media/1.jpg", "width": 1024, "content_type": "image/jpeg"},
                {"url": "https://fal.media/2.jpg"}
            ],
            "prompt": "a red fox",
            "seed": 42,
            "has_nsfw_concepts": [false, false]
        });
        assert_eq!(
            image_urls(&output),
            ["https://fal.media/1.jpg", "https://fal.media/2.jpg"]
        );
    }

    #[test]
    fn nothing_usable() {
        assert!(image_urls(&json!(null)).is_empty());
        assert!(image_urls(&json!("not a url")).is_empty());
        assert!(image_urls(&json!({"image": "data:image/png;base64,AAAA"})).is_empty());
        assert!(image_urls(&json!([])).is_empty());
    }
}
