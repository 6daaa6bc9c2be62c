//! Integration tests for dualserve.
//!
//! These exercise the full startup matrix: configuration errors, single- and
//! dual-protocol startup, partial failures, and error summary precedence.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use dualserve::{
    create_servers, HttpOptions, HttpSpec, HttpsOptions, HttpsSpec, ListenError, OptionsError,
    Port, ServerOptions, SharedHandler, StartupError, TlsError,
};

/// Directory holding the pre-generated CA and server certificate.
fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn handler() -> SharedHandler {
    Arc::new(|_request: Request<Incoming>| async {
        Response::new(Full::new(Bytes::from_static(b"hello")))
    })
}

/// Plaintext options bound to an ephemeral localhost port.
fn http_options() -> HttpSpec {
    HttpSpec::Options(HttpOptions {
        port: Some(Port::Number(0)),
        ip: Some("127.0.0.1".to_string()),
        handler: None,
    })
}

/// Secure options bound to an ephemeral localhost port, using `root` for
/// certificate material.
fn https_options(root: PathBuf) -> HttpsSpec {
    HttpsSpec::Options(HttpsOptions {
        port: Some(Port::Number(0)),
        ip: Some("127.0.0.1".to_string()),
        root,
        key: "server.key".to_string(),
        cert: "server.crt".to_string(),
        ca: None,
        handler: None,
    })
}

fn local(addr: SocketAddr) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], addr.port()))
}

/// Send one plaintext request and return the raw response.
async fn get(addr: SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("failed to write");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("failed to read");
    response
}

/// Send one request over TLS, trusting the fixture CA, and return the raw
/// response.
async fn get_tls(addr: SocketAddr) -> String {
    let ca = std::fs::read(fixtures().join("ca.crt")).expect("failed to read fixture CA");
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut ca.as_slice()) {
        roots.add(cert.expect("bad fixture CA")).unwrap();
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = tokio_rustls::TlsConnector::from(Arc::new(config));
    let server_name = rustls::pki_types::ServerName::try_from("localhost").unwrap();

    let stream = TcpStream::connect(addr).await.expect("failed to connect");
    let mut stream = connector
        .connect(server_name, stream)
        .await
        .expect("TLS handshake failed");

    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("failed to write");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("failed to read");
    response
}

#[tokio::test]
async fn test_no_protocols_is_a_config_error() {
    let options = ServerOptions {
        handler: Some(handler()),
        http: None,
        https: None,
    };

    let error = create_servers(options).await.unwrap_err();
    assert!(matches!(
        error,
        StartupError::Options(OptionsError::NoProtocols)
    ));
}

#[tokio::test]
async fn test_missing_handler_is_a_config_error() {
    let options = ServerOptions {
        handler: None,
        http: Some(http_options()),
        https: None,
    };

    let error = create_servers(options).await.unwrap_err();
    assert!(matches!(
        error,
        StartupError::Options(OptionsError::MissingHandler { .. })
    ));
}

#[tokio::test]
async fn test_http_only_serves_requests() {
    let options = ServerOptions {
        handler: Some(handler()),
        http: Some(http_options()),
        https: None,
    };

    let servers = create_servers(options).await.expect("startup failed");
    let http = servers.http.as_ref().expect("http server missing");
    assert!(servers.https.is_none());
    assert_ne!(http.local_addr().port(), 0);

    let response = get(local(http.local_addr())).await;
    assert!(response.contains("200 OK"));
    assert!(response.contains("hello"));

    servers.stop();
}

#[tokio::test]
async fn test_https_false_means_skipped() {
    let options = ServerOptions {
        handler: Some(handler()),
        http: Some(http_options()),
        https: Some(HttpsSpec::Enabled(false)),
    };

    let servers = create_servers(options).await.expect("startup failed");
    assert!(servers.http.is_some());
    assert!(servers.https.is_none());

    servers.stop();
}

#[tokio::test]
async fn test_port_string_shorthand() {
    let options = ServerOptions {
        handler: Some(handler()),
        http: Some(HttpSpec::Port(Port::Text("0".to_string()))),
        https: None,
    };

    let servers = create_servers(options).await.expect("startup failed");
    let http = servers.http.as_ref().expect("http server missing");

    let response = get(local(http.local_addr())).await;
    assert!(response.contains("200 OK"));

    servers.stop();
}

#[tokio::test]
async fn test_both_protocols_start_and_serve() {
    let options = ServerOptions {
        handler: Some(handler()),
        http: Some(http_options()),
        https: Some(https_options(fixtures())),
    };

    let servers = create_servers(options).await.expect("startup failed");
    let http = servers.http.as_ref().expect("http server missing");
    let https = servers.https.as_ref().expect("https server missing");

    let response = get(local(http.local_addr())).await;
    assert!(response.contains("hello"));

    let response = get_tls(local(https.local_addr())).await;
    assert!(response.contains("200 OK"));
    assert!(response.contains("hello"));

    servers.stop();
}

#[tokio::test]
async fn test_missing_key_file_fails_https() {
    let dir = tempfile::tempdir().unwrap();
    let options = ServerOptions {
        handler: Some(handler()),
        http: None,
        https: Some(HttpsSpec::Options(HttpsOptions {
            port: Some(Port::Number(0)),
            ip: Some("127.0.0.1".to_string()),
            root: dir.path().to_owned(),
            key: "missing.key".to_string(),
            cert: "a.crt".to_string(),
            ca: None,
            handler: None,
        })),
    };

    let error = create_servers(options).await.unwrap_err();
    let failure = match error {
        StartupError::Listen(failure) => failure,
        other => panic!("expected a listen failure, got {other}"),
    };

    assert!(failure.http.is_none());
    assert!(failure.servers.is_empty());
    match failure.https {
        Some(ListenError::Tls(TlsError::Read { ref path, ref source })) => {
            assert!(path.ends_with("missing.key"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        ref other => panic!("expected a TLS read error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_partial_success_keeps_started_http() {
    let dir = tempfile::tempdir().unwrap();
    let options = ServerOptions {
        handler: Some(handler()),
        http: Some(http_options()),
        https: Some(https_options(dir.path().to_owned())),
    };

    let error = create_servers(options).await.unwrap_err();
    let failure = match error {
        StartupError::Listen(failure) => failure,
        other => panic!("expected a listen failure, got {other}"),
    };

    assert!(failure.http.is_none());
    assert!(failure.https.is_some());

    // the plaintext server started and is usable despite the https failure
    let http = failure.servers.http.as_ref().expect("http server missing");
    let response = get(local(http.local_addr())).await;
    assert!(response.contains("hello"));

    failure.servers.stop();
}

#[tokio::test]
async fn test_summary_prefers_the_https_error() {
    // occupy two ports so both binds fail
    let taken_http = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let taken_https = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

    let options = ServerOptions {
        handler: Some(handler()),
        http: Some(HttpSpec::Options(HttpOptions {
            port: Some(Port::Number(taken_http.local_addr().unwrap().port())),
            ip: Some("127.0.0.1".to_string()),
            handler: None,
        })),
        https: Some(HttpsSpec::Options(HttpsOptions {
            port: Some(Port::Number(taken_https.local_addr().unwrap().port())),
            ip: Some("127.0.0.1".to_string()),
            root: fixtures(),
            key: "server.key".to_string(),
            cert: "server.crt".to_string(),
            ca: None,
            handler: None,
        })),
    };

    let error = create_servers(options).await.unwrap_err();
    let failure = match error {
        StartupError::Listen(failure) => failure,
        other => panic!("expected a listen failure, got {other}"),
    };

    let http_error = failure.http.as_ref().expect("http error missing");
    let https_error = failure.https.as_ref().expect("https error missing");
    assert!(failure.servers.is_empty());

    // both underlying errors are retrievable, the https one is the summary
    assert_eq!(failure.to_string(), https_error.to_string());
    assert_ne!(failure.to_string(), http_error.to_string());
}

#[tokio::test]
async fn test_invalid_bind_address_is_a_listen_error() {
    let options = ServerOptions {
        handler: Some(handler()),
        http: Some(HttpSpec::Options(HttpOptions {
            port: Some(Port::Number(0)),
            ip: Some("not-an-address".to_string()),
            handler: None,
        })),
        https: None,
    };

    let error = create_servers(options).await.unwrap_err();
    let failure = match error {
        StartupError::Listen(failure) => failure,
        other => panic!("expected a listen failure, got {other}"),
    };
    assert!(matches!(
        failure.http,
        Some(ListenError::InvalidAddress { .. })
    ));
}

#[tokio::test]
async fn test_client_ca_material_is_accepted() {
    let options = ServerOptions {
        handler: Some(handler()),
        http: None,
        https: Some(HttpsSpec::Options(HttpsOptions {
            port: Some(Port::Number(0)),
            ip: Some("127.0.0.1".to_string()),
            root: fixtures(),
            key: "server.key".to_string(),
            cert: "server.crt".to_string(),
            ca: Some(dualserve::CaFiles::One("ca.crt".to_string())),
            handler: None,
        })),
    };

    // client auth stays optional, so a CA-less client still connects
    let servers = create_servers(options).await.expect("startup failed");
    let https = servers.https.as_ref().expect("https server missing");

    let response = get_tls(local(https.local_addr())).await;
    assert!(response.contains("200 OK"));

    servers.stop();
}

#[tokio::test]
async fn test_per_protocol_handler_overrides_shared() {
    let shared: SharedHandler = Arc::new(|_request: Request<Incoming>| async {
        Response::new(Full::new(Bytes::from_static(b"shared")))
    });
    let own: SharedHandler = Arc::new(|_request: Request<Incoming>| async {
        Response::new(Full::new(Bytes::from_static(b"own")))
    });

    let options = ServerOptions {
        handler: Some(shared),
        http: Some(HttpSpec::Options(HttpOptions {
            port: Some(Port::Number(0)),
            ip: Some("127.0.0.1".to_string()),
            handler: Some(own),
        })),
        https: None,
    };

    let servers = create_servers(options).await.expect("startup failed");
    let http = servers.http.as_ref().expect("http server missing");

    let response = get(local(http.local_addr())).await;
    assert!(response.contains("own"));
    assert!(!response.contains("shared"));

    servers.stop();
}
