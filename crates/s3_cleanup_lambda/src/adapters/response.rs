use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

/// Delivers the result document to the pre-signed `ResponseURL`.
pub trait ResponseSender {
    fn send_response(&self, response_url: &str, body: &[u8]) -> Result<(), String>;
}

pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ResponseSender for HttpResponseSender {
    fn send_response(&self, response_url: &str, body: &[u8]) -> Result<(), String> {
        let url = response_url.to_string();
        let body_bytes = body.to_vec();
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                // The pre-signed URL is signed without a content type.
                let response = client
                    .put(url)
                    .header(CONTENT_TYPE, "")
                    .header(CONTENT_LENGTH, body_bytes.len())
                    .body(body_bytes)
                    .send()
                    .await
                    .map_err(|error| format!("failed to upload response: {error}"))?;

                response
                    .error_for_status()
                    .map(|_| ())
                    .map_err(|error| format!("response upload was rejected: {error}"))
            })
        })
    }
}
