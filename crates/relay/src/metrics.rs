use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, OnceLock,
    },
};

pub struct RelayMetrics {
    ws_rate_total: Mutex<HashMap<String, u64>>,
    ws_dropped_total: Mutex<HashMap<String, u64>>,
    connected_clients: AtomicU64,
    registered_identities: AtomicU64,
    voice_participants: AtomicU64,
    chat_history_depth: AtomicU64,
}

static GLOBAL_METRICS: OnceLock<Arc<RelayMetrics>> = OnceLock::new();

impl Default for RelayMetrics {
    fn default() -> Self {
        Self {
            ws_rate_total: Mutex::new(HashMap::new()),
            ws_dropped_total: Mutex::new(HashMap::new()),
            connected_clients: AtomicU64::new(0),
            registered_identities: AtomicU64::new(0),
            voice_participants: AtomicU64::new(0),
            chat_history_depth: AtomicU64::new(0),
        }
    }
}

pub fn set_global_metrics(metrics: Arc<RelayMetrics>) {
    let _ = GLOBAL_METRICS.set(metrics);
}

fn global_metrics() -> Option<&'static Arc<RelayMetrics>> {
    GLOBAL_METRICS.get()
}

pub fn record_ws_message(kind: &str) {
    if let Some(metrics) = global_metrics() {
        metrics.record_ws_message(kind);
    }
}

pub fn record_ws_dropped(reason: &str) {
    if let Some(metrics) = global_metrics() {
        metrics.record_ws_dropped(reason);
    }
}

pub fn set_connected_clients(value: u64) {
    if let Some(metrics) = global_metrics() {
        metrics.set_connected_clients(value);
    }
}

pub fn set_registered_identities(value: u64) {
    if let Some(metrics) = global_metrics() {
        metrics.set_registered_identities(value);
    }
}

pub fn set_voice_participants(value: u64) {
    if let Some(metrics) = global_metrics() {
        metrics.set_voice_participants(value);
    }
}

pub fn set_chat_history_depth(value: u64) {
    if let Some(metrics) = global_metrics() {
        metrics.set_chat_history_depth(value);
    }
}

impl RelayMetrics {
    pub fn record_ws_message(&self, kind: &str) {
        increment_label_counter(&self.ws_rate_total, &normalize_label(kind), 1);
    }

    pub fn record_ws_dropped(&self, reason: &str) {
        increment_label_counter(&self.ws_dropped_total, &normalize_label(reason), 1);
    }

    pub fn set_connected_clients(&self, value: u64) {
        self.connected_clients.store(value, Ordering::SeqCst);
    }

    pub fn set_registered_identities(&self, value: u64) {
        self.registered_identities.store(value, Ordering::SeqCst);
    }

    pub fn set_voice_participants(&self, value: u64) {
        self.voice_participants.store(value, Ordering::SeqCst);
    }

    pub fn set_chat_history_depth(&self, value: u64) {
        self.chat_history_depth.store(value, Ordering::SeqCst);
    }

    pub fn render_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP relay_ws_rate_total Total websocket messages handled by type.\n");
        output.push_str("# TYPE relay_ws_rate_total counter\n");
        append_label_counter_lines(&mut output, "relay_ws_rate_total", "type", &self.ws_rate_total);

        output.push_str(
            "# HELP relay_ws_dropped_total Total websocket frames dropped by reason.\n",
        );
        output.push_str("# TYPE relay_ws_dropped_total counter\n");
        append_label_counter_lines(
            &mut output,
            "relay_ws_dropped_total",
            "reason",
            &self.ws_dropped_total,
        );

        output.push_str("# HELP relay_connected_clients Currently open websocket connections.\n");
        output.push_str("# TYPE relay_connected_clients gauge\n");
        output.push_str(&format!(
            "relay_connected_clients {}\n",
            self.connected_clients.load(Ordering::SeqCst)
        ));

        output.push_str(
            "# HELP relay_registered_identities Connections that completed their hello.\n",
        );
        output.push_str("# TYPE relay_registered_identities gauge\n");
        output.push_str(&format!(
            "relay_registered_identities {}\n",
            self.registered_identities.load(Ordering::SeqCst)
        ));

        output.push_str("# HELP relay_voice_participants Users currently in the voice room.\n");
        output.push_str("# TYPE relay_voice_participants gauge\n");
        output.push_str(&format!(
            "relay_voice_participants {}\n",
            self.voice_participants.load(Ordering::SeqCst)
        ));

        output.push_str("# HELP relay_chat_history_depth Chat messages held for replay.\n");
        output.push_str("# TYPE relay_chat_history_depth gauge\n");
        output.push_str(&format!(
            "relay_chat_history_depth {}\n",
            self.chat_history_depth.load(Ordering::SeqCst)
        ));

        output
    }
}

fn normalize_label(label: &str) -> String {
    let normalized = label.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        "unknown".to_string()
    } else {
        normalized
    }
}

fn increment_label_counter(map: &Mutex<HashMap<String, u64>>, label: &str, delta: u64) {
    let mut guard = map.lock().expect("metrics map lock poisoned");
    let value = guard.entry(label.to_string()).or_insert(0);
    *value = value.saturating_add(delta);
}

fn append_label_counter_lines(
    output: &mut String,
    metric_name: &str,
    label_name: &str,
    map: &Mutex<HashMap<String, u64>>,
) {
    let guard = map.lock().expect("metrics map lock poisoned");
    if guard.is_empty() {
        return;
    }

    let mut entries: Vec<_> = guard.iter().collect();
    entries.sort_by(|(left, _), (right, _)| left.cmp(right));

    for (label, value) in entries {
        output.push_str(&format!(
            "{metric_name}{{{label_name}=\"{}\"}} {value}\n",
            escape_label_value(label),
        ));
    }
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n").replace('"', "\\\"")
}
