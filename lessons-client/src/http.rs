use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::{
    api::{
        self, Comment, CommentId, CommentPage, Endpoint, LessonId, NewContent, NewReaction,
        NodePath, Op, Reply, ThreadEcho,
    },
    FetchError, Remote,
};

#[derive(Clone, Debug)]
pub struct Config {
    /// Base url the resource paths are appended to, eg. `https://example.com/api`
    pub host: String,

    /// Bearer token of the logged-in user
    pub token: Option<String>,

    /// Retries for transient failures, with exponential backoff
    pub max_retries: u32,
}

pub struct HttpRemote {
    /// Retries transient failures, only used for reads
    retrying: ClientWithMiddleware,

    /// Sends each mutation exactly once: replaying a reaction toggle or a
    /// creation would apply it twice
    once: ClientWithMiddleware,

    config: Config,
}

impl HttpRemote {
    pub fn new(config: Config) -> HttpRemote {
        let client = reqwest::Client::new();
        let policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let retrying = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(policy))
            .build();
        let once = ClientBuilder::new(client).build();
        HttpRemote {
            retrying,
            once,
            config,
        }
    }

    fn client_for(&self, method: &Method) -> &ClientWithMiddleware {
        match *method == Method::GET {
            true => &self.retrying,
            false => &self.once,
        }
    }

    async fn call<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, FetchError>
    where
        B: serde::Serialize + Sync,
        R: for<'de> serde::Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.host.trim_end_matches('/'), path);
        tracing::debug!(%method, %url, "calling comments api");
        let mut req = self.client_for(&method).request(method, &url);
        if let Some(body) = body {
            let body = serde_json::to_vec(body)
                .map_err(|e| FetchError::Decode(format!("serializing request body: {e}")))?;
            req = req
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(FetchError::Api(api::Error::parse(&bytes).unwrap_or_else(
                |err| {
                    tracing::debug!(?err, %status, "error body is not in the api format");
                    match status {
                        StatusCode::UNAUTHORIZED => api::Error::NotAuthenticated,
                        StatusCode::FORBIDDEN => api::Error::PermissionDenied,
                        StatusCode::NOT_FOUND => api::Error::NotFound(String::from(path)),
                        _ => api::Error::Unknown(format!(
                            "{status}: {}",
                            String::from_utf8_lossy(&bytes)
                        )),
                    }
                },
            )));
        }
        // deletions may answer with an empty body rather than `{}`
        let bytes: &[u8] = match bytes.is_empty() {
            true => b"null",
            false => &bytes,
        };
        serde_json::from_slice(bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn call_endpoint<B, R>(
        &self,
        endpoint: Endpoint,
        body: Option<&B>,
    ) -> Result<R, FetchError>
    where
        B: serde::Serialize + Sync,
        R: for<'de> serde::Deserialize<'de>,
    {
        self.call(endpoint.method, &endpoint.path, body).await
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn fetch_comments(
        &self,
        lesson: &LessonId,
        page: u32,
        limit: u32,
    ) -> Result<CommentPage, FetchError> {
        let path = lesson.comments_page_path(page, limit)?;
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn create_comment(
        &self,
        lesson: &LessonId,
        body: &NewContent,
    ) -> Result<Comment, FetchError> {
        let path = lesson.comments_path()?;
        self.call(Method::POST, &path, Some(body)).await
    }

    async fn update_comment(
        &self,
        id: &CommentId,
        body: &NewContent,
    ) -> Result<Comment, FetchError> {
        let endpoint = NodePath::comment(id.clone()).endpoint(Op::Update)?;
        self.call_endpoint(endpoint, Some(body)).await
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), FetchError> {
        let endpoint = NodePath::comment(id.clone()).endpoint(Op::Delete)?;
        let _: serde_json::Value = self.call_endpoint::<(), _>(endpoint, None).await?;
        Ok(())
    }

    async fn react_comment(
        &self,
        id: &CommentId,
        body: &NewReaction,
    ) -> Result<Comment, FetchError> {
        let endpoint = NodePath::comment(id.clone()).endpoint(Op::React)?;
        self.call_endpoint(endpoint, Some(body)).await
    }

    async fn create_reply(
        &self,
        parent: &NodePath,
        body: &NewContent,
    ) -> Result<Comment, FetchError> {
        let endpoint = parent.endpoint(Op::Reply)?;
        let echo: ThreadEcho = self.call_endpoint(endpoint, Some(body)).await?;
        Ok(echo.comment)
    }

    async fn update_reply(&self, path: &NodePath, body: &NewContent) -> Result<Reply, FetchError> {
        let endpoint = path.endpoint(Op::Update)?;
        self.call_endpoint(endpoint, Some(body)).await
    }

    async fn delete_reply(&self, path: &NodePath) -> Result<Comment, FetchError> {
        let endpoint = path.endpoint(Op::Delete)?;
        let echo: ThreadEcho = self.call_endpoint::<(), _>(endpoint, None).await?;
        Ok(echo.comment)
    }

    async fn react_reply(&self, path: &NodePath, body: &NewReaction) -> Result<Reply, FetchError> {
        let endpoint = path.endpoint(Op::React)?;
        self.call_endpoint(endpoint, Some(body)).await
    }
}
