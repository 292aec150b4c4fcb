use std::sync::{Arc, Mutex};
use std::time::Duration;

use gemchat_model::{
    CompletionProvider, CompletionRequest, CompletionResponse,
};
use gemchat_test_model::{PresetFailure, PresetReply, TestModelProvider};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::{
    ChatSessionBuilder, ERROR_REPLY, FALLBACK_REPLY, Message, Sender,
};

/// A provider whose requests panic instead of settling, unless the prompt
/// is empty.
struct PanickingProvider;

impl CompletionProvider for PanickingProvider {
    type Error = gemchat_test_model::Error;

    fn send_request(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, Self::Error>>
    + Send
    + 'static {
        let prompt = req.prompt.clone();
        async move {
            if prompt.is_empty() {
                return Ok(CompletionResponse::default());
            }
            panic!("provider went away while answering {prompt:?}")
        }
    }
}

fn texts(messages: &[Message]) -> Vec<(Sender, &str)> {
    messages
        .iter()
        .map(|msg| (msg.sender(), msg.text()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_simple_message() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_millis(100));
    provider.add_reply("Hello", PresetReply::output("Hello!"));

    let session = ChatSessionBuilder::with_provider(provider).build();
    let pending = session.send_message("  Hello \n").await.unwrap();

    let snapshot = session.snapshot().await;
    assert!(snapshot.typing);
    assert!(session.is_typing());
    assert_eq!(texts(&snapshot.messages), [(Sender::User, "Hello")]);

    let reply = pending.await.unwrap();
    assert_eq!(reply.sender(), Sender::Bot);
    assert_eq!(reply.text(), "Hello!");
    assert!(!session.is_typing());

    let snapshot = session.snapshot().await;
    assert!(!snapshot.typing);
    assert_eq!(
        texts(&snapshot.messages),
        [(Sender::User, "Hello"), (Sender::Bot, "Hello!")]
    );
    assert_eq!(snapshot.messages[1], reply);
}

#[tokio::test]
async fn test_blank_input_is_ignored() {
    let provider = TestModelProvider::default();
    let session = ChatSessionBuilder::with_provider(provider.clone()).build();

    assert!(session.send_message("").await.is_none());
    assert!(session.send_message("  \t\n ").await.is_none());

    let snapshot = session.snapshot().await;
    assert!(snapshot.messages.is_empty());
    assert!(!snapshot.typing);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_reply() {
    let mut provider = TestModelProvider::default();
    provider.add_reply("Hmm", PresetReply::empty());

    let session = ChatSessionBuilder::with_provider(provider).build();
    let reply = session.send_message("Hmm").await.unwrap().await.unwrap();
    assert_eq!(reply.text(), FALLBACK_REPLY);
    assert!(!session.is_typing());
}

#[tokio::test(start_paused = true)]
async fn test_error_reply() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_millis(100));
    provider.add_reply("Hi", PresetReply::failure(PresetFailure::Transport));

    let session = ChatSessionBuilder::with_provider(provider.clone()).build();
    let pending = session.send_message("Hi").await.unwrap();
    assert!(session.is_typing());

    let reply = pending.await.unwrap();
    assert_eq!(reply.sender(), Sender::Bot);
    assert_eq!(reply.text(), ERROR_REPLY);
    assert!(!session.is_typing());
    assert_eq!(provider.request_count(), 1);

    let snapshot = session.snapshot().await;
    assert_eq!(
        texts(&snapshot.messages),
        [(Sender::User, "Hi"), (Sender::Bot, ERROR_REPLY)]
    );
}

#[tokio::test]
async fn test_error_reply_when_task_panics() {
    let typing = Arc::new(Mutex::new(Vec::new()));
    let session = ChatSessionBuilder::with_provider(PanickingProvider)
        .on_typing_changed({
            let typing = Arc::clone(&typing);
            move |is_typing| typing.lock().unwrap().push(is_typing)
        })
        .build();

    let pending = session.send_message("Hi").await.unwrap();
    let reply = timeout(Duration::from_secs(5), pending)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.sender(), Sender::Bot);
    assert_eq!(reply.text(), ERROR_REPLY);

    timeout(Duration::from_secs(5), session.wait_idle())
        .await
        .unwrap();
    assert!(!session.is_typing());
    assert_eq!(*typing.lock().unwrap(), [true, false]);

    let snapshot = session.snapshot().await;
    assert_eq!(
        texts(&snapshot.messages),
        [(Sender::User, "Hi"), (Sender::Bot, ERROR_REPLY)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_replies_in_settlement_order() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(
        "slow",
        PresetReply::output("Slow reply")
            .with_delay(Duration::from_millis(200)),
    );
    provider.add_reply(
        "fast",
        PresetReply::output("Fast reply").with_delay(Duration::from_millis(10)),
    );

    let session = ChatSessionBuilder::with_provider(provider).build();
    let mut typing = session.typing_changes();

    let slow = session.send_message("slow").await.unwrap();
    let fast = session.send_message("fast").await.unwrap();
    assert!(*typing.borrow_and_update());

    assert_eq!(fast.await.unwrap().text(), "Fast reply");
    // The slow request is still in flight.
    assert!(session.is_typing());
    assert!(!typing.has_changed().unwrap());

    assert_eq!(slow.await.unwrap().text(), "Slow reply");
    assert!(!session.is_typing());

    let snapshot = session.snapshot().await;
    assert_eq!(
        texts(&snapshot.messages),
        [
            (Sender::User, "slow"),
            (Sender::User, "fast"),
            (Sender::Bot, "Fast reply"),
            (Sender::Bot, "Slow reply"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_callbacks() {
    let mut provider = TestModelProvider::default();
    provider.add_reply("Hi", PresetReply::output("Hello!"));
    provider.add_reply("Again", PresetReply::output("Hello again!"));

    let messages = Arc::new(Mutex::new(Vec::new()));
    let typing = Arc::new(Mutex::new(Vec::new()));
    let session = ChatSessionBuilder::with_provider(provider)
        .on_message({
            let messages = Arc::clone(&messages);
            move |msg| {
                let line = format!("{:?}: {}", msg.sender(), msg.text());
                messages.lock().unwrap().push(line);
            }
        })
        .on_typing_changed({
            let typing = Arc::clone(&typing);
            move |is_typing| typing.lock().unwrap().push(is_typing)
        })
        .build();

    session.send_message("Hi").await.unwrap().await.unwrap();
    session.send_message("Again").await.unwrap().await.unwrap();

    assert_eq!(
        *messages.lock().unwrap(),
        ["User: Hi", "Bot: Hello!", "User: Again", "Bot: Hello again!"]
    );
    assert_eq!(*typing.lock().unwrap(), [true, false, true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_unawaited_reply_is_appended() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_millis(50));
    provider.add_reply("Hi", PresetReply::output("Hello!"));

    let session = ChatSessionBuilder::with_provider(provider).build();
    drop(session.clone().send_message("Hi").await.unwrap());

    timeout(Duration::from_millis(500), session.wait_idle())
        .await
        .unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(
        texts(&snapshot.messages),
        [(Sender::User, "Hi"), (Sender::Bot, "Hello!")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reply_lands_after_handle_dropped() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_millis(50));
    provider.add_reply("Bye", PresetReply::output("See you!"));

    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let session = ChatSessionBuilder::with_provider(provider)
        .on_message(move |msg| {
            msg_tx.send(msg.clone()).ok();
        })
        .build();
    let pending = session.send_message("Bye").await.unwrap();
    drop(session);

    let user = msg_rx.recv().await.unwrap();
    assert_eq!(user.text(), "Bye");
    let reply = timeout(Duration::from_millis(500), pending)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.text(), "See you!");
    let bot = msg_rx.recv().await.unwrap();
    assert_eq!(bot, reply);

    // The session task quits once nothing is left in flight, which drops
    // the callback along with its sender.
    let closed = timeout(Duration::from_millis(500), msg_rx.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
}
