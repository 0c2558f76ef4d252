use super::*;
use crate::test_support::{inbound, self_message, MockAi, MockTransport, Sent, OWNER};
use sidekick_core::service::AiReply;
use std::sync::Mutex;

const ALICE: &str = "5511999999999@c.us";
const GROUP: &str = "120363000000000@g.us";

fn gateway(transport: MockTransport, ai: Option<MockAi>, config: Config) -> (Gateway, Arc<Mutex<Vec<Sent>>>) {
    let sent = transport.sent.clone();
    let ai = ai.map(|ai| Arc::new(ai) as Arc<dyn AiService>);
    let gw = Gateway::new(Arc::new(transport), ai, Store::new(), &config);
    (gw, sent)
}

fn plain() -> (Gateway, Arc<Mutex<Vec<Sent>>>) {
    gateway(MockTransport::new(), None, Config::default())
}

#[tokio::test]
async fn test_monitored_chat_notifies_owner_once() {
    let (gw, sent) = plain();
    gw.handle_message(self_message("@monitor 5511999999999")).await;
    sent.lock().unwrap().clear();

    let msg = inbound(ALICE, "are you free tonight?");
    gw.handle_message(msg.clone()).await;
    gw.handle_message(msg.clone()).await;

    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, OWNER);
    assert!(sent[0].message.text.contains("are you free tonight?"));

    let sub = gw.dispatcher.store.subscription(ALICE).await.unwrap();
    assert_eq!(sub.last_checked_message_id.as_deref(), Some(msg.id.as_str()));
}

#[tokio::test]
async fn test_unmonitored_chat_stays_quiet() {
    let (gw, sent) = plain();
    gw.handle_message(self_message("@monitor 5511999999999")).await;
    gw.handle_message(self_message("@unmonitor 5511999999999")).await;
    sent.lock().unwrap().clear();

    gw.handle_message(inbound(ALICE, "hello?")).await;
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_group_monitor_skips_owner_author() {
    let (gw, sent) = plain();
    gw.dispatcher.store.monitor(GROUP, OWNER).await;

    let mut own = inbound(GROUP, "my own group message");
    own.author = Some(OWNER.into());
    gw.handle_message(own).await;
    assert!(sent.lock().unwrap().is_empty());

    let mut other = inbound(GROUP, "someone else");
    other.author = Some(ALICE.into());
    other.sender_name = Some("Alice".into());
    gw.handle_message(other).await;
    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].message.text.contains("from Alice"));
}

#[tokio::test]
async fn test_last_incoming_recorded_after_dispatch() {
    let (gw, sent) = plain();

    // The first message can't quick-reply to itself.
    gw.handle_message(inbound(ALICE, "@busy")).await;
    assert!(sent.lock().unwrap()[0]
        .message
        .text
        .contains("No recent incoming message"));

    let last = gw.dispatcher.store.last_incoming().await.unwrap();
    assert_eq!(last.from, ALICE);
    assert_eq!(last.body, "@busy");
}

#[tokio::test]
async fn test_own_messages_do_not_update_last_incoming() {
    let (gw, _sent) = plain();
    gw.handle_message(self_message("just a thought")).await;
    gw.handle_message(self_message("@ping")).await;
    assert!(gw.dispatcher.store.last_incoming().await.is_none());
}

#[tokio::test]
async fn test_self_commands_respond_as_new_messages() {
    let (gw, sent) = plain();
    gw.handle_message(self_message("@ping")).await;
    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].via_reply);
    assert_eq!(sent[0].chat_id, OWNER);
}

#[tokio::test]
async fn test_own_plain_text_ignored_without_assistant() {
    let ai = MockAi::replying(AiReply::default());
    let requests = ai.requests.clone();
    let (gw, sent) = gateway(MockTransport::new(), Some(ai), Config::default());
    gw.handle_message(self_message("buy bread")).await;
    assert!(sent.lock().unwrap().is_empty());
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_self_chat_assistant_prompts_ai() {
    let mut config = Config::default();
    config.ai.self_chat_assistant = true;
    let ai = MockAi::replying(AiReply {
        response: Some("Sure.".into()),
        ..Default::default()
    });
    let requests = ai.requests.clone();
    let (gw, sent) = gateway(MockTransport::new(), Some(ai), config);

    gw.handle_message(self_message("plan my day")).await;

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt.as_deref(), Some("plan my day"));
    let texts: Vec<_> = sent
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.message.text.clone())
        .collect();
    assert_eq!(texts.last().map(String::as_str), Some("Sure."));
}

#[tokio::test]
async fn test_self_chat_assistant_ignores_other_chats() {
    let mut config = Config::default();
    config.ai.self_chat_assistant = true;
    let ai = MockAi::replying(AiReply::default());
    let requests = ai.requests.clone();
    let (gw, _sent) = gateway(MockTransport::new(), Some(ai), config);

    // Sent by the owner from their phone into a chat with Alice.
    let mut msg = self_message("see you at 8");
    msg.chat_id = ALICE.into();
    msg.to = ALICE.into();
    gw.handle_message(msg).await;
    assert!(requests.lock().unwrap().is_empty());
}

#[test]
fn test_assistant_needs_ai_service() {
    let mut config = Config::default();
    config.ai.self_chat_assistant = true;
    let (gw, _) = gateway(MockTransport::new(), None, config);
    assert!(!gw.self_chat_assistant);
}

async fn wait_idle(gw: &Gateway) {
    for _ in 0..400 {
        if gw.active_senders.lock().await.is_empty() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("sender queues never drained");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rapid_notes_keep_arrival_order() {
    for _ in 0..20 {
        let (gw, _sent) = plain();
        let gw = Arc::new(gw);
        for text in ["@note a", "@note b", "@note c"] {
            gw.clone().dispatch_message(inbound(ALICE, text)).await;
        }
        wait_idle(&gw).await;

        let notes: Vec<String> = gw
            .dispatcher
            .store
            .notes()
            .await
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(notes, ["a", "b", "c"]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_quick_reply_sees_previous_message_from_same_sender() {
    let (gw, sent) = plain();
    let gw = Arc::new(gw);
    gw.clone().dispatch_message(inbound(ALICE, "are you there?")).await;
    gw.clone().dispatch_message(inbound(ALICE, "@busy")).await;
    wait_idle(&gw).await;

    let sent = sent.lock().unwrap().clone();
    assert!(sent.iter().all(|s| !s.message.text.contains("No recent incoming message")));
    assert!(sent.iter().any(|s| s.chat_id == ALICE && !s.via_reply));
}

#[tokio::test]
async fn test_queued_sender_is_released_after_drain() {
    let (gw, _sent) = plain();
    let gw = Arc::new(gw);
    gw.clone().dispatch_message(inbound(ALICE, "@todo one")).await;
    gw.clone().dispatch_message(inbound(GROUP, "@todo two")).await;
    wait_idle(&gw).await;

    assert_eq!(gw.dispatcher.store.todos().await.len(), 2);
    assert!(gw.active_senders.lock().await.is_empty());
}
