use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

/// How long a login redirect stays valid.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// OAuth `state` values issued by the login route and not yet redeemed.
#[derive(Debug)]
pub struct PendingStates {
    ttl: Duration,
    states: Mutex<HashMap<String, Instant>>,
}

impl Default for PendingStates {
    fn default() -> Self {
        Self::new(STATE_TTL)
    }
}

impl PendingStates {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub async fn issue(&self) -> String {
        let state = Uuid::new_v4().to_string();
        let mut states = self.states.lock().await;
        states.retain(|_, issued| issued.elapsed() < self.ttl);
        states.insert(state.clone(), Instant::now());
        state
    }

    /// Redeem a state once. Unknown, reused or expired values are rejected.
    pub async fn consume(&self, state: &str) -> bool {
        let mut states = self.states.lock().await;
        match states.remove(state) {
            Some(issued) => issued.elapsed() < self.ttl,
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.states.lock().await.len()
    }
}
