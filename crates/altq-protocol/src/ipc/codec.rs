use thiserror::Error;

use crate::{Request, Response};

/// Errors from encoding/decoding channel messages.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload was empty.
    #[error("empty message payload")]
    Empty,
    /// Deserialization via rmp_serde failed.
    #[error(transparent)]
    Decode(#[from] rmp_serde::decode::Error),
    /// Serialization via rmp_serde failed.
    #[error(transparent)]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Encode a [`Request`] as a MessagePack payload.
pub fn encode_request(req: &Request) -> Result<Vec<u8>, Error> {
    Ok(rmp_serde::to_vec_named(req)?)
}

/// Decode a [`Request`] from a MessagePack payload.
///
/// # Errors
/// Returns an error if the payload is empty or is not a valid request.
pub fn decode_request(bytes: &[u8]) -> Result<Request, Error> {
    if bytes.is_empty() {
        return Err(Error::Empty);
    }
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Encode a [`Response`] as a MessagePack payload.
pub fn encode_response(resp: &Response) -> Result<Vec<u8>, Error> {
    Ok(rmp_serde::to_vec_named(resp)?)
}

/// Decode a [`Response`] from a MessagePack payload.
///
/// # Errors
/// Returns an error if the payload is empty or is not a valid response.
pub fn decode_response(bytes: &[u8]) -> Result<Response, Error> {
    if bytes.is_empty() {
        return Err(Error::Empty);
    }
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use altq_ids::{DocumentId, WindowId};

    use super::*;
    use crate::{DisplayItem, Snapshot, ViewResponse};

    #[test]
    fn requests_survive_the_wire() {
        let samples = [
            Request::GetView {
                window: Some(WindowId::new(4)),
            },
            Request::GetView { window: None },
            Request::Activate {
                document: DocumentId::new(9),
            },
        ];
        for req in samples {
            let bytes = encode_request(&req).expect("encode");
            assert_eq!(decode_request(&bytes).expect("decode"), req);
        }
    }

    #[test]
    fn view_response_keeps_order_and_snapshots() {
        let mut view = ViewResponse {
            ok: true,
            ordered_tabs: vec![
                DisplayItem::new(DocumentId::new(2), Some("b"), None, None, true),
                DisplayItem::new(DocumentId::new(1), None, Some("icon"), Some("u"), false),
            ],
            ..ViewResponse::default()
        };
        view.snapshots.insert(
            DocumentId::new(2),
            Snapshot {
                image: vec![0, 1, 255],
                captured_at_ms: 17,
            },
        );
        let resp = Response::View(view);
        let bytes = encode_response(&resp).expect("encode");
        assert_eq!(decode_response(&bytes).expect("decode"), resp);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode_request(&[]), Err(Error::Empty)));
        assert!(matches!(decode_response(&[0xc1]), Err(Error::Decode(_))));
        let ack = encode_response(&Response::Ack { ok: true }).expect("encode");
        assert!(decode_request(&ack).is_err());
    }
}
