//! `signatureSubscribe` pubsub wait.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use solana_signature::Signature;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Commitment, LedgerError};

/// Request id used for the single subscription on each connection.
const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// One inbound pubsub frame.
#[derive(Debug, Deserialize)]
struct PubsubFrame {
    /// Request id on subscribe acknowledgements.
    #[serde(default)]
    id: Option<u64>,
    /// Notification method.
    #[serde(default)]
    method: Option<String>,
    /// Subscribe acknowledgement result (subscription id).
    #[serde(default)]
    result: Option<Value>,
    /// Error object on rejected subscriptions.
    #[serde(default)]
    error: Option<Value>,
}

/// What a decoded frame means for the wait.
#[derive(Debug, Eq, PartialEq)]
pub(super) enum FrameSignal {
    /// Subscription acknowledged.
    Subscribed,
    /// Terminal notification for the signature arrived.
    Notified,
    /// Subscription was rejected.
    Rejected(String),
    /// Frame is irrelevant to this wait.
    Ignored,
}

/// Builds the `signatureSubscribe` request body.
pub(super) fn subscribe_request(signature: &Signature, commitment: Commitment) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIBE_REQUEST_ID,
        "method": "signatureSubscribe",
        "params": [
            signature.to_string(),
            { "commitment": commitment.as_str() }
        ],
    })
    .to_string()
}

/// Classifies one text frame.
pub(super) fn classify_frame(text: &str) -> FrameSignal {
    let Ok(frame) = serde_json::from_str::<PubsubFrame>(text) else {
        return FrameSignal::Ignored;
    };
    if frame.method.as_deref() == Some("signatureNotification") {
        return FrameSignal::Notified;
    }
    if frame.id == Some(SUBSCRIBE_REQUEST_ID) {
        if let Some(error) = frame.error {
            return FrameSignal::Rejected(error.to_string());
        }
        if frame.result.is_some() {
            return FrameSignal::Subscribed;
        }
    }
    FrameSignal::Ignored
}

/// Opens a pubsub connection and resolves on the first `signatureNotification`.
///
/// A notification carrying an execution error still resolves: the transaction landed.
pub(super) async fn wait_for_signature(
    ws_url: &str,
    signature: &Signature,
    commitment: Commitment,
) -> Result<(), LedgerError> {
    let (mut stream, _response) =
        connect_async(ws_url)
            .await
            .map_err(|error| LedgerError::Subscription {
                message: format!("failed to connect websocket {ws_url}: {error}"),
            })?;
    stream
        .send(Message::Text(subscribe_request(signature, commitment).into()))
        .await
        .map_err(|error| LedgerError::Subscription {
            message: error.to_string(),
        })?;

    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match classify_frame(text.as_str()) {
                FrameSignal::Notified => return Ok(()),
                FrameSignal::Rejected(message) => {
                    return Err(LedgerError::Subscription { message });
                }
                FrameSignal::Subscribed => {
                    tracing::debug!(signature = %signature, "signature subscription active");
                }
                FrameSignal::Ignored => {}
            },
            Some(Ok(Message::Ping(payload))) => {
                if let Err(error) = stream.send(Message::Pong(payload)).await {
                    return Err(LedgerError::Subscription {
                        message: error.to_string(),
                    });
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(LedgerError::Subscription {
                    message: "websocket closed before notification".to_owned(),
                });
            }
            Some(Ok(_)) => {}
            Some(Err(error)) => {
                return Err(LedgerError::Subscription {
                    message: error.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_request_carries_signature_and_commitment() {
        let signature = Signature::from([5_u8; 64]);
        let request = subscribe_request(&signature, Commitment::Confirmed);
        let parsed: Result<Value, _> = serde_json::from_str(&request);
        assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            assert_eq!(parsed["method"], "signatureSubscribe");
            assert_eq!(parsed["params"][0], signature.to_string());
            assert_eq!(parsed["params"][1]["commitment"], "confirmed");
        }
    }

    #[test]
    fn frames_are_classified() {
        assert_eq!(
            classify_frame(r#"{"jsonrpc":"2.0","result":23784,"id":1}"#),
            FrameSignal::Subscribed
        );
        assert_eq!(
            classify_frame(
                r#"{"jsonrpc":"2.0","method":"signatureNotification","params":{"result":{"context":{"slot":5207624},"value":{"err":null}},"subscription":24006}}"#
            ),
            FrameSignal::Notified
        );
        assert!(matches!(
            classify_frame(
                r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params"},"id":1}"#
            ),
            FrameSignal::Rejected(_)
        ));
        assert_eq!(classify_frame("not json"), FrameSignal::Ignored);
    }
}
