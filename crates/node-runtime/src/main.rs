//! # Peer Mesh Node Runtime
//!
//! Runs a local mesh of nodes that announce themselves and verify each
//! other's encryption keys.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file from argv or `PM_CONFIG`, then env overrides)
//! 2. Initialize logging (`RUST_LOG` wins over `logging.level`)
//! 3. Join every node to the mesh and start verification
//! 4. Broadcast announcements
//! 5. Schedule unchallenged peers until the mesh settles or time runs out
//! 6. Report each node's view of its peers
//!
//! ## Flow
//!
//! ```text
//! alice ──META──→ bob            bob inserts alice (UNVERIFIED)
//! alice ←─META─── bob            alice inserts bob
//! alice ──V_TKN_ENC──→ bob       alice: bob PENDING
//! alice ←─V_TKN_RAW─── bob       alice: bob VERIFIED
//! ```

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::{MeshContainer, NodeConfig};
use pm_01_peer_verification::{VerificationConfig, VerificationState};
use shared_types::SessionKind;

/// Interval between sweeps for peers nobody has challenged yet.
const SWEEP_INTERVAL: Duration = Duration::from_millis(250);

/// Drives one local mesh from startup to a verification report.
pub struct NodeRuntime {
    container: MeshContainer,
}

impl NodeRuntime {
    /// Build every configured node.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let container = MeshContainer::new(config).context("failed to assemble local mesh")?;
        Ok(Self { container })
    }

    /// Announce, then sweep until every pair is verified or `settle` elapses.
    ///
    /// # Returns
    ///
    /// Whether the mesh settled fully verified.
    pub async fn run(&self) -> Result<bool> {
        info!("===========================================");
        info!("  Peer Mesh Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "  Session: {:?}, nodes: {}",
            self.container.config.mesh.session,
            self.container.nodes().len()
        );
        info!("===========================================");

        self.container
            .announce_all()
            .await
            .context("failed to announce metadata")?;

        let deadline = Instant::now() + self.container.config.mesh.settle;
        let mut sweep = interval(SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sweep.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted before the mesh settled");
                    return Ok(false);
                }
            }

            if self.container.fully_verified() {
                info!("Every peer verified");
                return Ok(true);
            }
            if Instant::now() >= deadline {
                warn!(
                    settle_ms = self.container.config.mesh.settle.as_millis() as u64,
                    "Mesh did not settle in time"
                );
                return Ok(false);
            }

            let scheduled = self.container.schedule_unchallenged();
            if scheduled > 0 {
                info!(scheduled, "Scheduled unchallenged peers");
            }
        }
    }

    /// Log each node's view of its peers.
    ///
    /// # Returns
    ///
    /// Number of entries that are not verified.
    pub fn report(&self) -> usize {
        let mut unverified = 0;
        for status in self.container.statuses() {
            let name = status.peer_name.as_deref().unwrap_or("<unnamed>");
            if status.state == VerificationState::Verified {
                info!(node = %status.node, peer = %name, state = status.state.as_str(), "Peer status");
            } else {
                unverified += 1;
                warn!(node = %status.node, peer = %name, state = status.state.as_str(), "Peer status");
            }
        }
        info!(
            alerts = self.container.alert_count(),
            unverified,
            "Verification report"
        );
        unverified
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log filter")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let runtime = NodeRuntime::new(config)?;
    let settled = runtime.run().await?;
    let unverified = runtime.report();

    if !settled || unverified > 0 {
        bail!("{unverified} peer entries left unverified");
    }
    Ok(())
}

/// Load configuration from a file and the environment.
///
/// The file comes from the first argument, else `PM_CONFIG`, else defaults
/// are used. `PM_SESSION` and `PM_TIMEOUT_MS` override the file.
fn load_config() -> Result<NodeConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PM_CONFIG").ok());

    let mut config = match path {
        Some(path) => NodeConfig::load(&path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => NodeConfig::default(),
    };

    if let Ok(session) = std::env::var("PM_SESSION") {
        config.mesh.session = session
            .parse::<SessionKind>()
            .context("PM_SESSION must be 'direct' or 'group'")?;
    }
    if let Ok(timeout) = std::env::var("PM_TIMEOUT_MS") {
        let millis: u64 = timeout
            .parse()
            .context("PM_TIMEOUT_MS must be a number of milliseconds")?;
        if millis == 0 {
            bail!("PM_TIMEOUT_MS must be greater than zero");
        }
        config.verification = VerificationConfig::with_timeout(Duration::from_millis(millis));
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}
