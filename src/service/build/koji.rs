//! Koji (Brew) implementation of the build client.
//!
//! Koji exposes an XML-RPC API on its hub. Only anonymous read calls are
//! used, so no session login is needed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{ArchiveInfo, BuildInfo, Res, RpmInfo},
};

use super::{
    BuildClient, GenericBuildClient,
    xmlrpc::{self, XmlRpcError},
};

// Extra methods on `BuildClient` applied by the koji implementation.

impl BuildClient {
    /// Creates a new Koji build client from the configuration.
    pub fn koji(config: &Config) -> Res<Self> {
        let client = KojiBuildClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<KojiBuildClient> for BuildClient {
    fn from(client: KojiBuildClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Errors.

/// Errors returned by the Koji hub client.
#[derive(Debug, thiserror::Error)]
pub enum KojiError {
    #[error("request to koji hub failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("koji hub returned HTTP {status}")]
    Http { status: u16 },
    #[error("koji call failed: {0}")]
    XmlRpc(#[from] XmlRpcError),
    #[error("unexpected koji response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

// Structs.

/// Koji hub client.
#[derive(Clone)]
pub struct KojiBuildClient {
    hub_url: String,
    http: reqwest::Client,
}

impl KojiBuildClient {
    /// Create a new Koji client, trusting the configured CA if there is one.
    #[instrument(name = "KojiBuildClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(path) = config.koji_server_ca_path() {
            let pem = std::fs::read(path).map_err(|e| anyhow::anyhow!("Failed to read Koji CA file `{}`: {}", path.display(), e))?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        Ok(Self::with_http_client(&config.koji_hub_url, builder.build()?))
    }

    /// Create a client against `hub_url` using an existing HTTP client.
    pub fn with_http_client(hub_url: &str, http: reqwest::Client) -> Self {
        Self {
            hub_url: hub_url.to_string(),
            http,
        }
    }

    /// Perform one XML-RPC call and deserialize the result.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> Result<T, KojiError> {
        let body = xmlrpc::encode_call(method, params);

        debug!("Calling koji `{}` ...", method);

        let response = self
            .http
            .post(&self.hub_url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KojiError::Http { status: status.as_u16() });
        }

        let text = response.text().await?;
        let value = xmlrpc::decode_response(&text)?;

        Ok(serde_json::from_value(value)?)
    }
}

/// Koji passes keyword arguments as a trailing struct flagged with `__starstar`.
fn kwargs(mut value: Value) -> Value {
    if let Value::Object(members) = &mut value {
        members.insert("__starstar".to_string(), Value::Bool(true));
    }
    value
}

#[async_trait]
impl GenericBuildClient for KojiBuildClient {
    #[instrument(skip(self))]
    async fn get_build(&self, nvr: &str) -> Res<BuildInfo> {
        let build = self.call("getBuild", &[json!(nvr), kwargs(json!({ "strict": true }))]).await?;
        Ok(build)
    }

    #[instrument(skip(self))]
    async fn list_archives(&self, build_id: i64) -> Res<Vec<ArchiveInfo>> {
        let archives = self.call("listArchives", &[json!(build_id)]).await?;
        Ok(archives)
    }

    #[instrument(skip(self))]
    async fn list_rpms(&self, archive_id: i64) -> Res<Vec<RpmInfo>> {
        let rpms = self.call("listRPMs", &[kwargs(json!({ "imageID": archive_id }))]).await?;
        Ok(rpms)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    fn client(server: &MockServer) -> KojiBuildClient {
        KojiBuildClient::with_http_client(&server.url("/brewhub"), reqwest::Client::new())
    }

    fn response(value: &str) -> String {
        format!(r#"<?xml version='1.0'?><methodResponse><params><param><value>{value}</value></param></params></methodResponse>"#)
    }

    #[test]
    fn test_kwargs_flag() {
        assert_eq!(kwargs(json!({ "imageID": 9 })), json!({ "imageID": 9, "__starstar": true }));
    }

    #[tokio::test]
    async fn test_get_build() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/brewhub")
                .header("content-type", "text/xml")
                .body_includes("<methodName>getBuild</methodName>")
                .body_includes("<string>myimage-1.2-3</string>")
                .body_includes("<name>strict</name>");
            then.status(200).body(response(
                r#"<struct>
                    <member><name>id</name><value><int>55</int></value></member>
                    <member><name>nvr</name><value><string>myimage-1.2-3</string></value></member>
                    <member><name>name</name><value><string>myimage</string></value></member>
                    <member><name>version</name><value><string>1.2</string></value></member>
                    <member><name>release</name><value><string>3</string></value></member>
                    <member><name>state</name><value><int>1</int></value></member>
                </struct>"#,
            ));
        });

        let build = client(&server).get_build("myimage-1.2-3").await.unwrap();

        mock.assert();
        assert_eq!(build.id, 55);
        assert_eq!(build.nvr, "myimage-1.2-3");
        assert_eq!(build.release, "3");
    }

    #[tokio::test]
    async fn test_list_archives_and_rpms() {
        let server = MockServer::start();
        let archives_mock = server.mock(|when, then| {
            when.method(POST).path("/brewhub").body_includes("<methodName>listArchives</methodName>").body_includes("<int>55</int>");
            then.status(200).body(response(
                r#"<array><data>
                    <value><struct>
                        <member><name>id</name><value><int>9</int></value></member>
                        <member><name>filename</name><value><string>image.tar.gz</string></value></member>
                        <member><name>type_name</name><value><string>tar</string></value></member>
                    </struct></value>
                </data></array>"#,
            ));
        });
        let rpms_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/brewhub")
                .body_includes("<methodName>listRPMs</methodName>")
                .body_includes("<name>imageID</name><value><int>9</int></value>");
            then.status(200).body(response(
                r#"<array><data>
                    <value><struct>
                        <member><name>id</name><value><int>1</int></value></member>
                        <member><name>name</name><value><string>bash</string></value></member>
                        <member><name>version</name><value><string>5.1</string></value></member>
                        <member><name>release</name><value><string>2</string></value></member>
                        <member><name>arch</name><value><string>x86_64</string></value></member>
                        <member><name>external_repo_id</name><value><int>0</int></value></member>
                    </struct></value>
                </data></array>"#,
            ));
        });

        let koji = client(&server);
        let archives = koji.list_archives(55).await.unwrap();
        let rpms = koji.list_rpms(archives[0].id).await.unwrap();

        archives_mock.assert();
        rpms_mock.assert();
        assert_eq!(archives[0].filename.as_deref(), Some("image.tar.gz"));
        assert_eq!(rpms.len(), 1);
        assert_eq!(rpms[0].nvra(), "bash-5.1-2.x86_64");
    }

    #[tokio::test]
    async fn test_fault_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/brewhub");
            then.status(200).body(
                r#"<?xml version='1.0'?><methodResponse><fault><value><struct>
                    <member><name>faultCode</name><value><int>1000</int></value></member>
                    <member><name>faultString</name><value><string>No such build: 'nope-1-1'</string></value></member>
                </struct></value></fault></methodResponse>"#,
            );
        });

        let err = client(&server).get_build("nope-1-1").await.unwrap_err();

        assert!(err.to_string().contains("No such build"));
        assert!(matches!(
            err.downcast_ref::<KojiError>(),
            Some(KojiError::XmlRpc(XmlRpcError::Fault { code: 1000, .. }))
        ));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/brewhub");
            then.status(503).body("unavailable");
        });

        let err = client(&server).list_archives(1).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<KojiError>(), Some(KojiError::Http { status: 503 })));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/brewhub");
            then.status(200).body(response("<nil/>"));
        });

        let err = client(&server).get_build("foo-1.0-1").await.unwrap_err();

        assert!(matches!(err.downcast_ref::<KojiError>(), Some(KojiError::Decode(_))));
    }
}
