//! Length-prefixed JSON framing: every message on the wire is a big-endian
//! 16-bit length prefix followed by that many bytes of UTF-8 JSON.
//!
//! Mirrors `s2n-codec`'s split between small composable primitives
//! (`put_field`/`get_uint16`) and buffer-oriented helpers, and
//! `netbench::multiplex::frame`'s use of `bytes::{Buf, BufMut}` for staging.
#![forbid(unsafe_code)]

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum payload length in bytes, per the wire contract.
pub const MAX_MESSAGE_LEN: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("message of {0} bytes exceeds the {MAX_MESSAGE_LEN} byte limit")]
    TooLong(usize),
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encodes a 16-bit big-endian length prefix for `len`.
///
/// `len` must fit in a `u16`; callers are expected to have already checked
/// against [`MAX_MESSAGE_LEN`].
pub fn put_field(len: u16) -> [u8; 2] {
    len.to_be_bytes()
}

/// Decodes a 16-bit big-endian length prefix.
pub fn get_uint16(buf: [u8; 2]) -> u16 {
    u16::from_be_bytes(buf)
}

/// Appends `put_field(payload.len()) ++ payload` to `out`.
pub fn encode(payload: &[u8], out: &mut BytesMut) -> Result<(), Error> {
    if payload.len() > MAX_MESSAGE_LEN || payload.len() > u16::MAX as usize {
        return Err(Error::TooLong(payload.len()));
    }
    out.put_slice(&put_field(payload.len() as u16));
    out.put_slice(payload);
    Ok(())
}

/// Writes one framed message to `writer`.
pub async fn write_framed<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), Error> {
    let mut buf = BytesMut::with_capacity(2 + payload.len());
    encode(payload, &mut buf)?;
    writer.write_all(&buf).await?;
    Ok(())
}

/// Reads one framed message from `reader`: a two-byte length prefix
/// followed by exactly that many bytes. Returns `Ok(None)` on a clean EOF
/// before any bytes of the next message have arrived; any other short read
/// is an error.
pub async fn read_framed<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Vec<u8>>, Error> {
    let mut len_buf = [0u8; 2];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = get_uint16(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(Error::TooLong(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Decodes one framed message out of an in-memory buffer, advancing `buf`
/// past the consumed bytes. Returns `Ok(None)` if `buf` does not yet hold a
/// complete message (used by the UDP datagram path, where a whole datagram
/// arrives at once but framing is kept uniform with the stream path).
pub fn decode(buf: &mut Bytes) -> Result<Option<Vec<u8>>, Error> {
    if buf.remaining() < 2 {
        return Ok(None);
    }
    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(Error::TooLong(len));
    }
    if buf.remaining() < 2 + len {
        return Ok(None);
    }
    buf.advance(2);
    let mut payload = vec![0u8; len];
    buf.copy_to_slice(&mut payload);
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_field_get_uint16_round_trip() {
        for len in [0u16, 1, 255, 1024, u16::MAX] {
            assert_eq!(get_uint16(put_field(len)), len);
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let payload = br#"{"type":1,"flow_id":42}"#;
        let mut buf = BytesMut::new();
        encode(payload, &mut buf).unwrap();
        let mut cursor = buf.freeze();
        let decoded = decode(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; MAX_MESSAGE_LEN + 1];
        let mut buf = BytesMut::new();
        assert!(matches!(encode(&payload, &mut buf), Err(Error::TooLong(_))));
    }

    #[tokio::test]
    async fn write_then_read_framed_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(256);
        let payload = br#"{"flow_id":42,"cwnd":37}"#;
        write_framed(&mut client, payload).await.unwrap();
        let got = read_framed(&mut server).await.unwrap().unwrap();
        assert_eq!(got, payload);
    }

    #[tokio::test]
    async fn clean_eof_before_any_bytes_is_none() {
        let (client, mut server) = tokio::io::duplex(256);
        drop(client);
        let got = read_framed(&mut server).await.unwrap();
        assert!(got.is_none());
    }
}
