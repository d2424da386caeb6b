use gpilot_messaging::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Keeps responders alive without answering.
#[derive(Debug, Default)]
struct Parked(std::sync::Mutex<Vec<Responder>>);

impl Parked {
    fn keep(&self, responder: Responder) {
        self.0.lock().unwrap().push(responder);
    }
}

fn message(action: &str, payload: Value) -> Arc<Message> {
    Arc::new(Message {
        id: MessageId(1),
        action: action.to_owned(),
        payload,
        origin: Arc::from("test"),
    })
}

fn delivery(action: &str) -> (Delivery, oneshot::Receiver<Value>) {
    let (reply, rx) = ReplyChannel::new(MessageId(1));
    (Delivery { message: message(action, json!({})), reply }, rx)
}

fn serve(transport: &Transport, name: &str, router: &Router) {
    let (inbox, _) = transport.connect(name.to_owned());
    let router = router.clone();
    tokio::spawn(async move { router.serve(inbox).await });
}

#[tokio::test]
async fn test_unknown_action_is_ignored() {
    let router = Router::new("background");
    let (delivery, mut rx) = delivery("nobody_handles_this");

    assert_eq!(router.dispatch(delivery), Dispatched::Ignored);
    // The only reply-channel clone was dropped without an answer.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_synchronous_error_yields_exactly_one_failure_reply() {
    let router = Router::new("background");
    router.on("explode", |_msg, _responder| Err(HandlerError::new("boom", "handler exploded")));

    let (delivery, mut rx) = delivery("explode");
    assert_eq!(router.dispatch(delivery), Dispatched::Failed);

    let reply = rx.try_recv().expect("reply within the same turn");
    assert_eq!(reply["ok"], json!(false));
    assert_eq!(reply["error"], json!("handler exploded"));
    assert_eq!(reply["code"], json!("boom"));
}

#[tokio::test]
async fn test_synchronous_panic_yields_failure_reply() {
    let router = Router::new("background");
    router.on("panic", |_msg, _responder| panic!("unexpected payload"));

    let (delivery, mut rx) = delivery("panic");
    assert_eq!(router.dispatch(delivery), Dispatched::Failed);

    let reply = rx.try_recv().expect("reply within the same turn");
    assert!(is_failure(&reply));
    assert_eq!(reply["error"], json!("unexpected payload"));
    assert_eq!(reply["code"], json!(CODE_PANICKED));
}

#[tokio::test]
async fn test_panic_after_dropping_responder_keeps_the_panic_message() {
    let router = Router::new("background");
    router.on("drop_then_panic", |_msg, responder| {
        drop(responder);
        panic!("payload missing url")
    });

    let (delivery, mut rx) = delivery("drop_then_panic");
    assert_eq!(router.dispatch(delivery), Dispatched::Failed);

    let reply = rx.try_recv().expect("reply within the same turn");
    assert_eq!(reply["error"], json!("payload missing url"));
    assert_eq!(reply["code"], json!(CODE_PANICKED));
}

#[tokio::test]
async fn test_handler_claiming_reply_without_sending_fails_cleanly() {
    let router = Router::new("background");
    router.on("liar", |_msg, responder| {
        drop(responder);
        Ok(Disposition::Replied)
    });

    let (delivery, mut rx) = delivery("liar");
    assert_eq!(router.dispatch(delivery), Dispatched::Failed);
    assert_eq!(rx.try_recv().expect("reply")["code"], json!(CODE_NO_REPLY));
}

#[tokio::test]
async fn test_deferred_reply_arrives_later() {
    let router = Router::new("background");
    router.on("slow", |msg, responder| {
        let echo = msg.payload.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let _ = responder.ok(echo);
        });
        Ok(Disposition::Deferred)
    });

    let (reply, rx) = ReplyChannel::new(MessageId(4));
    let delivery = Delivery { message: message("slow", json!({"n": 4})), reply };
    assert_eq!(router.dispatch(delivery), Dispatched::Deferred);

    let reply = rx.await.expect("deferred reply");
    assert_eq!(reply, success(json!({"n": 4})));
}

#[tokio::test]
async fn test_deferred_responder_dropped_unanswered_sends_failure() {
    let router = Router::new("background");
    router.on("forgetful", |_msg, responder| {
        tokio::spawn(async move {
            let _keep = responder;
        });
        Ok(Disposition::Deferred)
    });

    let (delivery, rx) = delivery("forgetful");
    router.dispatch(delivery);

    let reply = rx.await.expect("failure reply");
    assert_eq!(reply["code"], json!(CODE_NO_REPLY));
}

#[tokio::test]
async fn test_async_handler_error_and_panic_are_replied() {
    let router = Router::new("background");
    router.on_async("fails", |_msg| async { Err::<Value, _>(HandlerError::new("bad_input", "nope")) });
    router.on_async("panics", |msg| async move {
        assert!(msg.payload.get("never").is_some(), "async boom");
        Ok(Value::Null)
    });

    let (fails, rx) = delivery("fails");
    assert_eq!(router.dispatch(fails), Dispatched::Spawned);
    assert_eq!(rx.await.expect("reply"), failure("bad_input", "nope"));

    let (delivery, rx) = delivery("panics");
    router.dispatch(delivery);
    let reply = rx.await.expect("reply");
    assert_eq!(reply["error"], json!("async boom"));
}

#[tokio::test]
async fn test_request_reply_over_transport() {
    let transport = Transport::new(TransportConfig::default());
    let router = Router::new("background");
    router.on_async("echo", |msg| async move { Ok(msg.payload.clone()) });
    serve(&transport, "background", &router);

    let page = transport.outbox("page");
    let data = page.call("echo", json!({"hello": "world"})).await.unwrap();
    assert_eq!(data, json!({"hello": "world"}));
}

#[tokio::test]
async fn test_failure_reply_surfaces_as_handler_failure() {
    let transport = Transport::new(TransportConfig::default());
    let router = Router::new("background");
    router.on("reject", |_msg, _r| Err(HandlerError::new("invalid_url", "not a url")));
    serve(&transport, "background", &router);

    let err = transport.outbox("page").call("reject", json!({})).await.unwrap_err();
    assert_eq!(err.code(), "handler_failure");
    assert!(err.to_string().contains("not a url"));
    assert!(err.to_string().contains("invalid_url"));
}

#[tokio::test]
async fn test_all_listeners_ignoring_yields_no_response() {
    let transport = Transport::new(TransportConfig::default());
    serve(&transport, "settings", &Router::new("settings"));

    let err = transport.outbox("page").request("unknown", json!(null)).await.unwrap_err();
    assert_eq!(err.code(), "no_response");

    let lonely = Transport::new(TransportConfig::default());
    let err = lonely.outbox("page").request("anything", json!(null)).await.unwrap_err();
    assert_eq!(err.code(), "no_response");
}

#[tokio::test]
async fn test_first_reply_wins_across_contexts() {
    let transport = Transport::new(TransportConfig::default());
    for name in ["background", "settings"] {
        let router = Router::new(name);
        router.on("who", move |_msg, responder| {
            let _ = responder.ok(json!(name));
            Ok(Disposition::Replied)
        });
        serve(&transport, name, &router);
    }

    let data = transport.outbox("page").call("who", json!({})).await.unwrap();
    assert!(data == json!("background") || data == json!("settings"));
}

#[tokio::test]
async fn test_sender_does_not_receive_its_own_messages() {
    let transport = Transport::new(TransportConfig::default());
    let (_inbox, outbox) = transport.connect("background");

    let err = outbox.request("ping", json!({})).await.unwrap_err();
    assert_eq!(err.code(), "no_response");
    assert_eq!(transport.listener_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_deferred_request_times_out() {
    let transport = Transport::new(TransportConfig {
        reply_timeout: Some(Duration::from_millis(500)),
        ..TransportConfig::default()
    });
    let parked = Arc::new(Parked::default());
    let router = Router::new("background");
    {
        let parked = Arc::clone(&parked);
        router.on("hang", move |_msg, responder| {
            parked.keep(responder);
            Ok(Disposition::Deferred)
        });
    }
    serve(&transport, "background", &router);

    let err = transport.outbox("page").request("hang", json!({})).await.unwrap_err();
    assert_eq!(err.code(), "timeout");
}

#[tokio::test]
async fn test_handlers_observe_send_order() {
    let transport = Transport::new(TransportConfig::default());
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let router = Router::new("background");
    {
        let seen = Arc::clone(&seen);
        router.on("record", move |msg, responder| {
            seen.lock().unwrap().push(msg.payload["n"].as_u64().unwrap());
            let _ = responder.ok(Value::Null);
            Ok(Disposition::Replied)
        });
    }
    serve(&transport, "background", &router);

    let page = transport.outbox("page");
    let pending: Vec<_> = {
        let mut pending = Vec::new();
        for n in 0..5 {
            pending.push(page.send("record", json!({ "n": n })).await);
        }
        pending
    };
    for reply in pending {
        reply.wait().await.unwrap();
    }
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}
