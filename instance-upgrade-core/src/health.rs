use time::ext::NumericalStdDuration as _;

use k8s::NodeExt as _;

use super::*;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("verify timeout of {timeout:?} exceeded after {elapsed:?}")]
    Timeout { timeout: Duration, elapsed: Duration },
}

/// Polling cadence and outer time box of the verifier
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifierConfig {
    pub check_interval: Duration,
    pub timeout: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            check_interval: 10.std_seconds(),
            timeout: 1.std_hours(),
        }
    }
}

impl VerifierConfig {
    /// Number of consecutive healthy checks that make up `window`, rounded
    /// down. A window shorter than one interval needs no check at all.
    ///
    pub fn attempt_budget(&self, window: Duration) -> u64 {
        let interval = self.check_interval.as_nanos();
        if interval == 0 {
            return u64::from(!window.is_zero());
        }
        u64::try_from(window.as_nanos() / interval).unwrap_or(u64::MAX)
    }
}

/// State of the verification countdown
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    /// this many consecutive healthy checks are still required
    Counting(u64),
    /// the last check failed, the full budget is required again
    Reset,
    TimedOut,
    Succeeded,
}

impl PollState {
    /// Advance by one check. `budget` is the full count a reset starts over from.
    ///
    pub fn next(self, budget: u64, healthy: bool) -> Self {
        match self {
            Self::TimedOut | Self::Succeeded => self,
            _ if !healthy => Self::Reset,
            Self::Reset => Self::countdown(budget.saturating_sub(1)),
            Self::Counting(remaining) => Self::countdown(remaining.saturating_sub(1)),
        }
    }

    pub fn remaining(&self, budget: u64) -> u64 {
        match self {
            Self::Counting(remaining) => *remaining,
            Self::Reset | Self::TimedOut => budget,
            Self::Succeeded => 0,
        }
    }

    fn countdown(remaining: u64) -> Self {
        if remaining == 0 {
            Self::Succeeded
        } else {
            Self::Counting(remaining)
        }
    }
}

/// Readiness of every node as seen by a single list call, in API order
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeHealthSnapshot {
    nodes: Vec<(String, bool)>,
}

impl NodeHealthSnapshot {
    pub fn new(nodes: &[corev1::Node]) -> Self {
        let nodes = nodes
            .iter()
            .map(|node| (node.name().to_string(), node.is_ready()))
            .collect();
        Self { nodes }
    }

    pub fn is_ready(&self) -> bool {
        self.nodes.iter().all(|(_, ready)| *ready)
    }

    pub fn not_ready(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|(_, ready)| !ready)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Waits until every cluster node has been ready for a number of
/// consecutive checks, or gives up once the configured timeout passes.
///
/// Failed list calls and not ready nodes start the count over; neither is
/// an error on its own.
///
#[derive(Debug)]
pub struct HealthVerifier<N, C = TokioClock> {
    nodes: N,
    clock: C,
    config: VerifierConfig,
}

impl<N> HealthVerifier<N>
where
    N: NodeLister,
{
    pub fn new(nodes: N, config: VerifierConfig) -> Self {
        Self::with_clock(nodes, TokioClock, config)
    }
}

impl<N, C> HealthVerifier<N, C>
where
    N: NodeLister,
    C: Clock,
{
    pub fn with_clock(nodes: N, clock: C, config: VerifierConfig) -> Self {
        Self {
            nodes,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn nodes(&self) -> &N {
        &self.nodes
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Require the cluster to stay healthy for `window`, checking every
    /// `check_interval`. Returns `HealthError::Timeout` once more than
    /// `timeout` has elapsed since the first check.
    ///
    pub async fn verify(&self, window: Duration) -> Result<(), HealthError> {
        let VerifierConfig {
            check_interval,
            timeout,
        } = self.config;
        let budget = self.config.attempt_budget(window);
        tracing::debug!(budget, ?check_interval, ?timeout, "Verifying cluster health");
        if budget == 0 {
            tracing::info!(?window, "Nothing to verify");
            return Ok(());
        }

        let start = self.clock.now();
        let mut state = PollState::Counting(budget);
        loop {
            let healthy = self.check().await;
            state = state.next(budget, healthy);

            let elapsed = self.clock.now().duration_since(start);
            if elapsed > timeout {
                state = PollState::TimedOut;
            }

            match state {
                PollState::TimedOut => return Err(HealthError::Timeout { timeout, elapsed }),
                PollState::Reset => {}
                PollState::Counting(_) | PollState::Succeeded => tracing::info!(
                    remaining = state.remaining(budget),
                    "Cluster is healthy, checking again in {check_interval:?}"
                ),
            }

            self.clock.sleep(check_interval).await;

            if state == PollState::Succeeded {
                return Ok(());
            }
        }
    }

    /// One health check: list the nodes and require each of them to be ready
    ///
    pub async fn check(&self) -> bool {
        match self.nodes.list_nodes().await {
            Ok(nodes) => {
                let snapshot = NodeHealthSnapshot::new(&nodes);
                if let Some(node) = snapshot.not_ready().next() {
                    tracing::warn!(node, "Node is not ready, resetting interval");
                }
                snapshot.is_ready()
            }
            Err(err) => {
                tracing::warn!(%err, "Failed to list nodes, retrying");
                false
            }
        }
    }
}
