use crate::runtime::cfn_response::CfnResponseDocument;

pub trait ResponseSender {
    fn send(&self, response_url: &str, document: &CfnResponseDocument) -> Result<(), String>;
}

/// Uploads response documents to the pre-signed S3 URL CloudFormation
/// hands to directly invoked custom resources.
#[derive(Clone)]
pub struct HttpResponseSender {
    pub http_client: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpResponseSender {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSender for HttpResponseSender {
    fn send(&self, response_url: &str, document: &CfnResponseDocument) -> Result<(), String> {
        let body = serde_json::to_vec(document)
            .map_err(|error| format!("failed to serialize response document: {error}"))?;
        let client = self.http_client.clone();
        let url = response_url.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                // The pre-signed URL is signed without a content type.
                let response = client
                    .put(url)
                    .header(reqwest::header::CONTENT_TYPE, "")
                    .header(reqwest::header::CONTENT_LENGTH, body.len())
                    .body(body)
                    .send()
                    .await
                    .map_err(|error| format!("failed to upload response document: {error}"))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(format!("response upload rejected with status {status}"));
                }
                Ok(())
            })
        })
    }
}
