//! Process-wide counters.
//! Reported by `/admin` and logged once on shutdown.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static BOXES_CREATED: AtomicU64 = AtomicU64::new(0);
static BOXES_REMOVED: AtomicU64 = AtomicU64::new(0);
static MACARONS_EATEN: AtomicU64 = AtomicU64::new(0);
static REQUESTS_GRANTED: AtomicU64 = AtomicU64::new(0);
static REQUESTS_DENIED: AtomicU64 = AtomicU64::new(0);
static SAVE_FAILURES: AtomicU64 = AtomicU64::new(0);
static TRANSPORT_ERRORS: AtomicU64 = AtomicU64::new(0);

static COMMAND_COUNTERS: OnceLock<Mutex<BTreeMap<String, u64>>> = OnceLock::new();

pub fn inc_boxes_created() {
    BOXES_CREATED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_boxes_removed() {
    BOXES_REMOVED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_macarons_eaten() {
    MACARONS_EATEN.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_requests_granted() {
    REQUESTS_GRANTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_requests_denied() {
    REQUESTS_DENIED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_save_failures() {
    SAVE_FAILURES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_transport_errors() {
    TRANSPORT_ERRORS.fetch_add(1, Ordering::Relaxed);
}

fn command_counter_lock() -> &'static Mutex<BTreeMap<String, u64>> {
    COMMAND_COUNTERS.get_or_init(|| Mutex::new(BTreeMap::new()))
}

/// Count one invocation of `command`; returns the new total for it.
pub fn record_command(command: &str) -> u64 {
    let mut guard = command_counter_lock()
        .lock()
        .expect("command counter mutex poisoned");
    let counter = guard.entry(command.to_string()).or_default();
    *counter = counter.saturating_add(1);
    *counter
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub boxes_created: u64,
    pub boxes_removed: u64,
    pub macarons_eaten: u64,
    pub requests_granted: u64,
    pub requests_denied: u64,
    pub save_failures: u64,
    pub transport_errors: u64,
    pub commands: BTreeMap<String, u64>,
}

impl Snapshot {
    /// Compact multi-line summary for chat and logs.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "boxes +{}/-{}, eaten {}, requests {} granted/{} denied, save failures {}, transport errors {}",
            self.boxes_created,
            self.boxes_removed,
            self.macarons_eaten,
            self.requests_granted,
            self.requests_denied,
            self.save_failures,
            self.transport_errors
        );
        if !self.commands.is_empty() {
            let per: Vec<String> = self.commands.iter().map(|(k, v)| format!("{k}={v}")).collect();
            out.push_str("\ncommands: ");
            out.push_str(&per.join(" "));
        }
        out
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        boxes_created: BOXES_CREATED.load(Ordering::Relaxed),
        boxes_removed: BOXES_REMOVED.load(Ordering::Relaxed),
        macarons_eaten: MACARONS_EATEN.load(Ordering::Relaxed),
        requests_granted: REQUESTS_GRANTED.load(Ordering::Relaxed),
        requests_denied: REQUESTS_DENIED.load(Ordering::Relaxed),
        save_failures: SAVE_FAILURES.load(Ordering::Relaxed),
        transport_errors: TRANSPORT_ERRORS.load(Ordering::Relaxed),
        commands: command_counter_lock()
            .lock()
            .expect("command counter mutex poisoned")
            .clone(),
    }
}
