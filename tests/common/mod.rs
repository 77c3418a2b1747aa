//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use card_gate::audit::{AuditEntry, AuditTrail, MemoryWriter};
use card_gate::config::{shared, GateConfig};
use card_gate::domain::CardHolders;
use card_gate::http::{HttpServer, Services};
use card_gate::lifecycle::Shutdown;
use card_gate::security::CardPolicy;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A running gate bound to an ephemeral port, auditing into memory.
pub struct TestGate {
    pub addr: SocketAddr,
    pub audit: MemoryWriter,
    pub updates: mpsc::UnboundedSender<GateConfig>,
    trail: AuditTrail,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop serving, drain the audit trail and return what it recorded.
    pub async fn stop(mut self) -> Vec<AuditEntry> {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
        self.trail.stop().await;
        self.audit.entries()
    }
}

/// Start a gate with the default collaborators.
pub async fn start_gate(config: GateConfig) -> TestGate {
    start_gate_with_latency(config, Duration::ZERO).await
}

/// Start a gate whose card holder store sleeps `latency` before each commit.
pub async fn start_gate_with_latency(config: GateConfig, latency: Duration) -> TestGate {
    let audit = MemoryWriter::new();
    let mut trail = AuditTrail::new(config.audit.queue_capacity, audit.clone());
    trail.start();

    let config = shared(config);
    let policy = Arc::new(CardPolicy::new(config.clone()));
    let cardholders = Arc::new(CardHolders::new(policy, trail.sink()).with_latency(latency));
    let services = Services::with_cardholders(&config, cardholders, trail.sink());
    let server = HttpServer::with_services(config, services);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestGate {
        addr,
        audit,
        updates,
        trail,
        shutdown,
        handle,
    }
}

/// Client without connection pooling so shutdown is never held up by idle sockets.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
