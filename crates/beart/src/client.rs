//! HTTP client for the BeArt face-swap API.
//!
//! A swap is two calls: `create-job` uploads both images as multipart and
//! returns a job id, then `get-job` is polled until the service reports a
//! result URL, a failure, or the attempt budget runs out.

use std::time::{Duration, Instant};

use {
    async_trait::async_trait,
    faceswap_config::BeArtConfig,
    faceswap_media::ImageBlob,
    reqwest::{
        Client, RequestBuilder, StatusCode,
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use faceswap_metrics::{counter, faceswap as job_metrics, histogram, labels};

use crate::{
    FaceSwapService,
    error::{Error, Result, Stage},
    types::{ApiEnvelope, CreateJobResult, JobResult},
};

const CREATE_JOB_PATH: &str = "/api/beart/face-swap/create-job";
const GET_JOB_PATH: &str = "/api/beart/face-swap/get-job";

/// Browser identity the service expects on every request.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "*/*"),
    ("accept-language", "zh-CN,zh;q=0.9"),
    ("origin", "https://beart.ai"),
    ("priority", "u=1, i"),
    ("referer", "https://beart.ai/"),
    (
        "sec-ch-ua",
        r#""Google Chrome";v="129", "Not=A?Brand";v="8", "Chromium";v="129""#,
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", r#""Windows""#),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-site"),
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    ),
];

const GET_JOB_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Upload name for one image.
///
/// The service only accepts `.jpg` names, whatever the real format is; the
/// part's content type carries the sniffed MIME instead.
fn random_upload_name() -> String {
    format!("n_v{:016x}.jpg", rand::random::<u64>())
}

/// BeArt face-swap client.
#[derive(Clone)]
pub struct BeArtClient {
    client: Client,
    base_url: String,
    product_code: String,
    product_serial: Secret<String>,
    create_timeout: Duration,
    poll_timeout: Duration,
    poll_max_attempts: u32,
    poll_interval: Duration,
}

impl std::fmt::Debug for BeArtClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeArtClient")
            .field("base_url", &self.base_url)
            .field("product_code", &self.product_code)
            .field("product_serial", &"[REDACTED]")
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Default for BeArtClient {
    fn default() -> Self {
        Self::new(&BeArtConfig::default())
    }
}

impl BeArtClient {
    #[must_use]
    pub fn new(config: &BeArtConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            product_code: config.product_code.clone(),
            product_serial: config.product_serial.clone(),
            create_timeout: config.create_timeout(),
            poll_timeout: config.poll_timeout(),
            poll_max_attempts: config.poll_max_attempts,
            poll_interval: config.poll_interval(),
        }
    }

    /// Point the client at a different host (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upper bound on time spent sleeping between polls.
    pub fn max_wait(&self) -> Duration {
        self.poll_interval.saturating_mul(self.poll_max_attempts)
    }

    fn with_identity(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in BROWSER_HEADERS {
            request = request.header(*name, *value);
        }
        request.header("product-code", &self.product_code)
    }

    /// Upload both images and return the remote job id.
    ///
    /// The `target_image` part carries the source bytes and `swap_image`
    /// carries the target bytes, each labelled with the other blob's MIME
    /// type. The service reads the fields with that mapping.
    pub async fn create_job(&self, source: &ImageBlob, target: &ImageBlob) -> Result<String> {
        let source_name = random_upload_name();
        let target_name = random_upload_name();

        let target_part = Part::bytes(source.data().to_vec())
            .file_name(target_name)
            .mime_str(target.mime_type())
            .map_err(|e| Error::external("failed to build target_image part", e))?;
        let swap_part = Part::bytes(target.data().to_vec())
            .file_name(source_name)
            .mime_str(source.mime_type())
            .map_err(|e| Error::external("failed to build swap_image part", e))?;

        let form = Form::new()
            .part("target_image", target_part)
            .part("swap_image", swap_part);

        info!(
            source_format = %source.format(),
            target_format = %target.format(),
            source_len = source.len(),
            target_len = target.len(),
            "uploading face-swap images"
        );

        let request = self
            .with_identity(self.client.post(format!("{}{CREATE_JOB_PATH}", self.base_url)))
            .header("product-serial", self.product_serial.expose_secret())
            .timeout(self.create_timeout)
            .multipart(form);

        let envelope: ApiEnvelope = send_json(request, Stage::CreateJob).await?;

        if !envelope.is_success() {
            let message = envelope.message_zh();
            warn!(code = envelope.code, message = %message, "create-job rejected by server");
            return Err(Error::CreateRejected {
                code: envelope.code,
                message,
            });
        }

        let job_id = envelope
            .parse_result::<CreateJobResult>()
            .map_err(|e| Error::invalid(Stage::CreateJob, e.to_string()))?
            .map(|r| r.job_id)
            .ok_or_else(|| Error::invalid(Stage::CreateJob, "missing result.job_id"))?;

        #[cfg(feature = "metrics")]
        counter!(job_metrics::JOBS_CREATED_TOTAL).increment(1);
        info!(job_id = %job_id, "face-swap job created");
        Ok(job_id)
    }

    /// Poll `get-job` until the job completes and return its first output URL.
    ///
    /// Only the "processing" code is retried. Any other outcome, including a
    /// transport error, ends the loop at once.
    pub async fn poll_job(&self, job_id: &str) -> Result<String> {
        let url = format!("{}{GET_JOB_PATH}/{job_id}", self.base_url);
        info!(
            job_id,
            max_attempts = self.poll_max_attempts,
            max_wait_secs = self.max_wait().as_secs(),
            "waiting for face-swap result"
        );

        for attempt in 1..=self.poll_max_attempts {
            #[cfg(feature = "metrics")]
            counter!(job_metrics::POLL_ATTEMPTS_TOTAL).increment(1);

            let request = self
                .with_identity(self.client.get(&url))
                .header("content-type", GET_JOB_CONTENT_TYPE)
                .timeout(self.poll_timeout);
            let envelope: ApiEnvelope = send_json(request, Stage::GetJob).await?;

            if envelope.is_success() {
                let output = envelope
                    .parse_result::<JobResult>()
                    .map_err(|e| Error::invalid(Stage::GetJob, e.to_string()))?
                    .and_then(|r| r.output.into_iter().next())
                    .ok_or_else(|| Error::invalid(Stage::GetJob, "completed job has no output"))?;
                info!(job_id, attempt, "face-swap job completed");
                return Ok(output);
            }

            if !envelope.is_processing() {
                warn!(job_id, attempt, code = envelope.code, "get-job rejected by server");
                return Err(Error::PollRejected {
                    code: envelope.code,
                });
            }

            debug!(
                job_id,
                attempt,
                max_attempts = self.poll_max_attempts,
                "job still processing"
            );
            if attempt < self.poll_max_attempts && !self.poll_interval.is_zero() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        warn!(job_id, attempts = self.poll_max_attempts, "gave up waiting for job");
        Err(Error::MaxRetriesExceeded {
            attempts: self.poll_max_attempts,
        })
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, stage: Stage) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|source| Error::Transport { stage, source })?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        warn!(%stage, status = status.as_u16(), body = %body, "unexpected HTTP status");
        return Err(Error::HttpStatus {
            stage,
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| Error::Transport { stage, source })?;
    serde_json::from_str(&body).map_err(|e| Error::invalid(stage, e.to_string()))
}

#[async_trait]
impl FaceSwapService for BeArtClient {
    async fn swap(&self, source: &ImageBlob, target: &ImageBlob) -> Result<String> {
        let started = Instant::now();
        let result = match self.create_job(source, target).await {
            Ok(job_id) => self.poll_job(&job_id).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(url) => {
                #[cfg(feature = "metrics")]
                {
                    counter!(job_metrics::JOBS_COMPLETED_TOTAL).increment(1);
                    histogram!(job_metrics::JOB_DURATION_SECONDS)
                        .record(started.elapsed().as_secs_f64());
                }
                debug!(url = %url, elapsed_ms = started.elapsed().as_millis() as u64, "swap finished");
            },
            Err(e) => {
                #[cfg(feature = "metrics")]
                counter!(
                    job_metrics::JOBS_FAILED_TOTAL,
                    labels::STAGE => e.stage().map_or("local", |s| match s {
                        Stage::CreateJob => "create_job",
                        Stage::GetJob => "get_job",
                    })
                )
                .increment(1);
                warn!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "swap failed");
            },
        }
        result
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{header, header_exists, method, path},
        },
    };

    fn jpeg() -> ImageBlob {
        ImageBlob::new(b"\xFF\xD8\xFF\xE0SOURCE-FACE".to_vec()).unwrap()
    }

    fn png() -> ImageBlob {
        ImageBlob::new(b"\x89PNG\r\n\x1a\nTARGET-FACE".to_vec()).unwrap()
    }

    fn client(server: &MockServer) -> BeArtClient {
        BeArtClient::new(&BeArtConfig::default())
            .with_base_url(server.uri())
            .with_poll_interval(Duration::ZERO)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn upload_names(body: &[u8]) -> Vec<String> {
        let text = String::from_utf8_lossy(body);
        text.split("filename=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn upload_names_are_random_jpg() {
        let a = random_upload_name();
        let b = random_upload_name();
        assert_ne!(a, b);
        for name in [a, b] {
            assert_eq!(name.len(), 3 + 16 + 4);
            assert!(name.starts_with("n_v"));
            assert!(name.ends_with(".jpg"));
            assert!(name[3..19].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn debug_redacts_serial() {
        let out = format!("{:?}", BeArtClient::default());
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("7ccd9ec0944184501659484ed36d6550"));
    }

    #[test]
    fn max_wait_saturates() {
        assert_eq!(BeArtClient::default().max_wait(), Duration::from_secs(60));

        let huge = BeArtClient::default().with_poll_interval(Duration::from_secs(u64::MAX / 4));
        assert_eq!(huge.max_wait(), Duration::MAX);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = BeArtClient::default().with_base_url("http://localhost:9/");
        assert_eq!(client.base_url(), "http://localhost:9");
    }

    #[tokio::test]
    async fn create_job_sends_identity_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .and(header("product-code", "067003"))
            .and(header("product-serial", "7ccd9ec0944184501659484ed36d6550"))
            .and(header("origin", "https://beart.ai"))
            .and(header("referer", "https://beart.ai/"))
            .and(header_exists("sec-ch-ua"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"code":100000,"message":{"zh":"成功"},"result":{"job_id":"abc"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let job_id = client(&server).create_job(&jpeg(), &png()).await.unwrap();
        assert_eq!(job_id, "abc");
    }

    #[tokio::test]
    async fn create_job_multipart_layout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":100000,"result":{"job_id":"abc"}}"#),
            )
            .mount(&server)
            .await;

        client(&server).create_job(&jpeg(), &png()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = &requests[0].body;

        let target_field = find(body, b"name=\"target_image\"").unwrap();
        let png_type = find(body, b"image/png").unwrap();
        let source_bytes = find(body, b"SOURCE-FACE").unwrap();
        let swap_field = find(body, b"name=\"swap_image\"").unwrap();
        let jpeg_type = find(body, b"image/jpeg").unwrap();
        let target_bytes = find(body, b"TARGET-FACE").unwrap();

        // target_image: source bytes labelled with the target's MIME type
        assert!(target_field < png_type && png_type < source_bytes);
        // swap_image: target bytes labelled with the source's MIME type
        assert!(source_bytes < swap_field);
        assert!(swap_field < jpeg_type && jpeg_type < target_bytes);

        let names = upload_names(body);
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with("n_v") && n.ends_with(".jpg")));
    }

    #[tokio::test]
    async fn create_job_http_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let err = client(&server).create_job(&jpeg(), &png()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::HttpStatus {
                stage: Stage::CreateJob,
                status: 500
            }
        ));
        assert!(err.is_job_failure());
    }

    #[tokio::test]
    async fn create_job_rejected_code_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"code":400002,"message":{"zh":"未检测到人脸","en":"no face"}}"#,
            ))
            .mount(&server)
            .await;

        let err = client(&server).create_job(&jpeg(), &png()).await.unwrap_err();
        match err {
            Error::CreateRejected { code, message } => {
                assert_eq!(code, 400002);
                assert_eq!(message, "未检测到人脸");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn create_job_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).create_job(&jpeg(), &png()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse {
                stage: Stage::CreateJob,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn create_job_success_without_job_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":100000}"#))
            .mount(&server)
            .await;

        let err = client(&server).create_job(&jpeg(), &png()).await.unwrap_err();
        assert!(err.to_string().contains("job_id"));
    }

    #[tokio::test]
    async fn create_job_transport_error() {
        let client = BeArtClient::default().with_base_url("http://127.0.0.1:1");
        let err = client.create_job(&jpeg(), &png()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport {
                stage: Stage::CreateJob,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn poll_returns_first_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .and(header("content-type", GET_JOB_CONTENT_TYPE))
            .and(header("product-code", "067003"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"code":100000,"result":{"output":["https://x/y.jpg","https://x/z.jpg"]}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server).poll_job("abc").await.unwrap();
        assert_eq!(url, "https://x/y.jpg");
    }

    #[tokio::test]
    async fn poll_succeeds_on_last_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":300001}"#))
            .up_to_n_times(29)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":100000,"result":{"output":["u"]}}"#),
            )
            .expect(1)
            .with_priority(2)
            .mount(&server)
            .await;

        let url = client(&server).poll_job("abc").await.unwrap();
        assert_eq!(url, "u");
        assert_eq!(server.received_requests().await.unwrap().len(), 30);
    }

    #[tokio::test]
    async fn poll_processing_ignores_result_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":300001,"result":{"output":null}}"#),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":100000,"result":{"output":["u"]}}"#),
            )
            .with_priority(2)
            .mount(&server)
            .await;

        let url = client(&server).poll_job("abc").await.unwrap();
        assert_eq!(url, "u");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn poll_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":300001}"#))
            .expect(30)
            .mount(&server)
            .await;

        let err = client(&server).poll_job("abc").await.unwrap_err();
        assert!(matches!(err, Error::MaxRetriesExceeded { attempts: 30 }));
    }

    #[tokio::test]
    async fn poll_other_code_aborts_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":500001}"#))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).poll_job("abc").await.unwrap_err();
        assert!(matches!(err, Error::PollRejected { code: 500001 }));
    }

    #[tokio::test]
    async fn poll_http_error_aborts_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).poll_job("abc").await.unwrap_err();
        assert!(matches!(
            err,
            Error::HttpStatus {
                stage: Stage::GetJob,
                status: 502
            }
        ));
    }

    #[tokio::test]
    async fn poll_empty_output_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/abc")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":100000,"result":{"output":[]}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).poll_job("abc").await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse {
                stage: Stage::GetJob,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn swap_runs_create_then_poll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":100000,"result":{"job_id":"j-1"}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{GET_JOB_PATH}/j-1")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":100000,"result":{"output":["https://cdn/r.jpg"]}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server).swap(&jpeg(), &png()).await.unwrap();
        assert_eq!(url, "https://cdn/r.jpg");
    }

    #[tokio::test]
    async fn swap_skips_poll_when_create_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_JOB_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server).swap(&jpeg(), &png()).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::CreateJob));
    }
}
