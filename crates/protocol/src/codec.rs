//! Binary and JSON codecs for control messages.
//!
//! Bincode frames are used between processes; JSON lines are accepted from
//! scripted drivers and written for humans.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::{Request, Response};

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{trailing} trailing bytes after message")]
    Trailing { trailing: usize },
}

fn encode_binary<T: Serialize>(message: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(message, bincode::config::standard())?)
}

fn decode_binary<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    let (message, read) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    if read != data.len() {
        return Err(CodecError::Trailing {
            trailing: data.len() - read,
        });
    }
    Ok(message)
}

/// Encode a request to bytes.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, CodecError> {
    encode_binary(request)
}

/// Decode a request from bytes.
pub fn decode_request(data: &[u8]) -> Result<Request, CodecError> {
    decode_binary(data)
}

/// Encode a response to bytes.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, CodecError> {
    encode_binary(response)
}

/// Decode a response from bytes.
pub fn decode_response(data: &[u8]) -> Result<Response, CodecError> {
    decode_binary(data)
}

/// Parse one JSON request line.
pub fn request_from_json(line: &str) -> Result<Request, CodecError> {
    Ok(serde_json::from_str(line)?)
}

/// Serialize a response as a single JSON line.
pub fn response_to_json(response: &Response) -> Result<String, CodecError> {
    Ok(serde_json::to_string(response)?)
}
