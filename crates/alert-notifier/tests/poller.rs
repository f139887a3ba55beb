//! Polling cycles against a scripted alert source and a recording channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alert_engine::{Alert, EngineError};
use alert_notifier::{AlertSource, AppState, Config, ConfigOverrides, Poller};
use async_trait::async_trait;
use notify::{ChannelError, Notifier, NotifyChannel};

#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<String>>,
}

impl RecordingChannel {
    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Replays queued responses, then keeps returning the last one.
#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<Alert>, String>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Vec<Alert>, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl AlertSource for ScriptedSource {
    async fn fetch(&self) -> anyhow::Result<Vec<Alert>> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        match next {
            Some(Ok(alerts)) => Ok(alerts),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(vec![]),
        }
    }
}

fn alert(id: &str) -> Alert {
    Alert::new(id, "disk")
        .with_label_json(r#"{"host":"db"}"#)
        .with_item_path(["disk", "free"])
        .with_last_value("0.01")
}

fn config(yaml: &str) -> Config {
    let base = format!("graphql_endpoint: https://alerts.example.com/graphql\n{yaml}");
    Config::from_yaml(&base, ConfigOverrides::default()).unwrap()
}

fn setup(config: Config, initial: Vec<Alert>) -> (Poller, Arc<RecordingChannel>, Arc<AppState>) {
    let channel = Arc::new(RecordingChannel::default());
    let notifier = Notifier::with_channels(vec![channel.clone() as Arc<dyn NotifyChannel>]);
    let state = Arc::new(AppState::new(config, None));
    let source = Arc::new(ScriptedSource::default()) as Arc<dyn AlertSource>;
    let poller = Poller::new(source, notifier, Arc::clone(&state), initial);
    (poller, channel, state)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[tokio::test]
async fn confirmed_then_long_lived_close() {
    let (mut poller, channel, _) = setup(config("telegram_chat_id: -100\nwait_duration: 10"), vec![]);

    let report = poller.process(vec![alert("a1")], secs(0)).await.unwrap();
    assert!(report.messages.is_empty());
    assert!(poller.debounce_state().unwrap().contains("a1"));

    let report = poller.process(vec![alert("a1")], secs(10)).await.unwrap();
    assert_eq!(report.messages.len(), 1);
    assert!(report.messages[0].starts_with('🔥'));
    assert!(report.messages[0].contains("`a1`"));
    assert_eq!(report.delivered, 1);

    let report = poller.process(vec![], secs(20)).await.unwrap();
    assert_eq!(report.messages.len(), 1);
    assert!(report.messages[0].starts_with('🌴'));

    assert_eq!(channel.sent().len(), 2);
    assert!(poller.current_alerts().is_empty());
}

#[tokio::test]
async fn short_lived_alert_is_announced_once_on_close() {
    let (mut poller, channel, _) = setup(config("telegram_chat_id: -100\nwait_duration: 10"), vec![]);

    poller.process(vec![alert("b1")], secs(0)).await.unwrap();
    let report = poller.process(vec![], secs(3)).await.unwrap();

    assert_eq!(report.messages.len(), 1);
    assert!(report.messages[0].starts_with("\u{267B}\u{FE0F}"));
    assert_eq!(channel.sent(), report.messages);
    assert!(poller.debounce_state().unwrap().is_empty());
}

#[tokio::test]
async fn initial_alerts_count_as_announced() {
    let (mut poller, channel, _) =
        setup(config("telegram_chat_id: -100\nwait_duration: 10"), vec![alert("c1")]);

    let report = poller.process(vec![alert("c1")], secs(100)).await.unwrap();
    assert!(report.messages.is_empty());

    let report = poller.process(vec![], secs(101)).await.unwrap();
    assert!(report.messages[0].starts_with('🌴'));
    assert_eq!(channel.sent().len(), 1);
}

#[tokio::test]
async fn engine_error_leaves_state_untouched() {
    let (mut poller, channel, state) =
        setup(config("telegram_chat_id: -100\nwait_duration: 10"), vec![]);

    poller.process(vec![alert("d1")], secs(0)).await.unwrap();
    let before = state.snapshot().await;

    let err = poller
        .process(vec![alert("d2"), alert("d2")], secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateAlertId { .. }));

    let ids: Vec<&str> = poller.current_alerts().iter().map(|a| a.alert_id.as_str()).collect();
    assert_eq!(ids, vec!["d1"]);
    assert!(poller.debounce_state().unwrap().contains("d1"));
    assert!(Arc::ptr_eq(&before, &state.snapshot().await));
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn missing_chat_id_skips_delivery() {
    let (mut poller, channel, state) = setup(config("wait_duration: 0"), vec![]);

    let report = poller.process(vec![alert("e1")], secs(0)).await.unwrap();
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.delivered, 0);
    assert!(channel.sent().is_empty());

    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.alerts.len(), 1);
    assert!(snapshot.updated_at.is_some());
}

#[tokio::test]
async fn ignored_messages_are_not_sent() {
    let (mut poller, _, _) = setup(config("telegram_chat_id: -100\nwait_duration: 0"), vec![]);
    let text = poller.process(vec![alert("f1")], secs(0)).await.unwrap().messages[0].clone();

    let yaml = format!(
        "telegram_chat_id: -100\nwait_duration: 0\nignored_messages:\n  - {}\n",
        serde_json::to_string(&text).unwrap()
    );
    let (mut poller, channel, _) = setup(config(&yaml), vec![]);
    let report = poller.process(vec![alert("f1")], secs(0)).await.unwrap();
    assert!(report.messages.is_empty());
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn run_retries_after_fetch_errors() {
    let config = config(
        "telegram_chat_id: -100\nwait_duration: 0\nsleep_interval: 0.01\nretry_delay: 0.01\nfetch_timeout: 1",
    );
    let channel = Arc::new(RecordingChannel::default());
    let notifier = Notifier::with_channels(vec![channel.clone() as Arc<dyn NotifyChannel>]);
    let state = Arc::new(AppState::new(config, None));
    let source = Arc::new(ScriptedSource::new(vec![
        Err("connection refused".to_string()),
        Ok(vec![alert("g1")]),
    ]));

    let poller = Poller::new(
        source.clone() as Arc<dyn AlertSource>,
        notifier,
        Arc::clone(&state),
        vec![],
    );
    let handle = tokio::spawn(poller.run());

    tokio::time::timeout(Duration::from_secs(5), async {
        while channel.sent().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    handle.abort();

    assert!(source.calls() >= 2);
    assert_eq!(channel.sent().len(), 1);
    assert!(channel.sent()[0].starts_with('🔥'));
    assert_eq!(state.snapshot().await.alerts.len(), 1);
}
