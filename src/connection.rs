//! Framed connection over any async byte stream.
//!
//! A [`Connection`] owns the stream exclusively and moves whole frames:
//! reads accumulate in a [`FrameBuffer`], writes send prefix and body in a
//! single vectored write where the kernel allows it.

use std::io::IoSlice;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::WireCodec;
use crate::error::{Result, RpcError};
use crate::protocol::{encode_prefix, CallFrame, FrameBuffer, ReplyFrame, PREFIX_SIZE};

/// Read buffer size per socket read.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// An exclusively-owned, framed, bidirectional stream.
pub struct Connection<S> {
    stream: S,
    frames: FrameBuffer,
    read_buf: Vec<u8>,
    codec: WireCodec,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream, rejecting incoming frames above `max_frame_size`.
    pub fn new(stream: S, max_frame_size: u32) -> Self {
        Self {
            stream,
            frames: FrameBuffer::with_max_frame_size(max_frame_size),
            read_buf: vec![0u8; READ_CHUNK_SIZE],
            codec: WireCodec::default(),
        }
    }

    /// Encode call and reply frames with `codec` instead of MsgPack.
    pub fn with_codec(mut self, codec: WireCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Read the next frame body.
    ///
    /// Returns `Ok(None)` on a clean EOF between frames. EOF inside a frame
    /// is a protocol error.
    pub async fn read_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(body) = self.frames.try_extract_one()? {
                return Ok(Some(body));
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                if self.frames.is_mid_frame() {
                    return Err(RpcError::Protocol(format!(
                        "Connection closed mid-frame with {} bytes buffered",
                        self.frames.len()
                    )));
                }
                return Ok(None);
            }
            self.frames.extend(&self.read_buf[..n]);
        }
    }

    /// Read the next frame body, giving up after `timeout` if one is set.
    pub async fn read_frame_within(&mut self, timeout: Option<Duration>) -> Result<Option<Bytes>> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_frame())
                .await
                .map_err(|_| RpcError::Timeout(limit))?,
            None => self.read_frame().await,
        }
    }

    /// Write one frame (prefix + body) and flush.
    pub async fn write_frame(&mut self, body: &[u8]) -> Result<()> {
        let prefix = encode_prefix(body.len())?;
        write_all_vectored(&mut self.stream, &prefix, body).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read the next call frame; `Ok(None)` on clean EOF.
    pub async fn read_call(&mut self, timeout: Option<Duration>) -> Result<Option<CallFrame>> {
        match self.read_frame_within(timeout).await? {
            Some(body) => CallFrame::decode_with(self.codec, &body).map(Some),
            None => Ok(None),
        }
    }

    /// Read exactly one reply frame; EOF is [`RpcError::ConnectionClosed`].
    pub async fn read_reply(&mut self) -> Result<ReplyFrame> {
        match self.read_frame().await? {
            Some(body) => ReplyFrame::decode_with(self.codec, &body),
            None => Err(RpcError::ConnectionClosed),
        }
    }

    /// Encode and write a call frame.
    pub async fn write_call(&mut self, call: &CallFrame) -> Result<()> {
        let body = call.encode_with(self.codec)?;
        self.write_frame(&body).await
    }

    /// Encode and write a reply frame.
    pub async fn write_reply(&mut self, reply: &ReplyFrame) -> Result<()> {
        let body = reply.encode_with(self.codec)?;
        self.write_frame(&body).await
    }

    /// Shut down the write half of the stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Write `prefix` followed by `body`, continuing after partial writes.
async fn write_all_vectored<W>(writer: &mut W, prefix: &[u8; PREFIX_SIZE], body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total = PREFIX_SIZE + body.len();
    let mut written = 0;

    while written < total {
        let n = if written < PREFIX_SIZE {
            let slices = [IoSlice::new(&prefix[written..]), IoSlice::new(body)];
            writer.write_vectored(&slices).await?
        } else {
            writer.write(&body[written - PREFIX_SIZE..]).await?
        };

        if n == 0 {
            return Err(RpcError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write returned 0",
            )));
        }
        written += n;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_frame, RemoteError, DEFAULT_MAX_FRAME_SIZE};
    use std::io::Cursor;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_frame_roundtrip_over_duplex() {
        let (a, b) = duplex(64);
        let mut left = Connection::new(a, DEFAULT_MAX_FRAME_SIZE);
        let mut right = Connection::new(b, DEFAULT_MAX_FRAME_SIZE);

        // Larger than the duplex buffer, forces partial writes and reads
        let body = vec![0x5A; 1000];
        let writer = tokio::spawn(async move {
            left.write_frame(&body).await.unwrap();
            left
        });

        let received = right.read_frame().await.unwrap().unwrap();
        assert_eq!(received.len(), 1000);
        assert!(received.iter().all(|&b| b == 0x5A));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_call_and_reply_frames() {
        let (a, b) = duplex(4096);
        let mut client = Connection::new(a, DEFAULT_MAX_FRAME_SIZE);
        let mut server = Connection::new(b, DEFAULT_MAX_FRAME_SIZE);

        client
            .write_call(&CallFrame::new("Echo.Say", b"world".to_vec()))
            .await
            .unwrap();
        let call = server.read_call(None).await.unwrap().unwrap();
        assert_eq!(call.method, "Echo.Say");
        assert_eq!(call.body, b"world");

        server
            .write_reply(&ReplyFrame::err(RemoteError::handler("nope")))
            .await
            .unwrap();
        let reply = client.read_reply().await.unwrap();
        assert_eq!(reply.error.unwrap().message, "nope");
    }

    #[tokio::test]
    async fn test_clean_eof_returns_none() {
        let (a, b) = duplex(64);
        drop(a);
        let mut conn = Connection::new(b, DEFAULT_MAX_FRAME_SIZE);
        assert!(conn.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_protocol_error() {
        let (mut a, b) = duplex(64);
        a.write_all(&[0, 0, 0, 10, 1, 2, 3]).await.unwrap();
        drop(a);

        let mut conn = Connection::new(b, DEFAULT_MAX_FRAME_SIZE);
        let err = conn.read_frame().await.unwrap_err();
        assert!(matches!(err, RpcError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_read_reply_on_eof_is_connection_closed() {
        let (a, b) = duplex(64);
        drop(a);
        let mut conn = Connection::new(b, DEFAULT_MAX_FRAME_SIZE);
        assert!(matches!(
            conn.read_reply().await,
            Err(RpcError::ConnectionClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let (_a, b) = duplex(64);
        let mut conn = Connection::new(b, DEFAULT_MAX_FRAME_SIZE);
        let err = conn
            .read_frame_within(Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_write_all_vectored_matches_build_frame() {
        let mut out = Cursor::new(Vec::new());
        let prefix = encode_prefix(5).unwrap();
        write_all_vectored(&mut out, &prefix, b"hello").await.unwrap();
        assert_eq!(out.into_inner(), build_frame(b"hello").unwrap());
    }
}
