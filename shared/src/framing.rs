//! Length-prefixed message framing for stream transports.
//!
//! A frame is a 4-byte big-endian payload length followed by the payload.
//! One frame carries exactly one encoded `Message`, so the protocol layer
//! never sees partial records. `MAX_FRAME_SIZE` bounds the allocation a
//! corrupt or hostile length prefix can trigger; a snapshot of a few hundred
//! players is far below it.

use crate::error::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted payload (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Writes one frame and flushes.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let len = payload.len();
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(len));
    }
    writer.write_u32(len as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame. A stream that closes before or inside a frame yields an
/// `UnexpectedEof` I/O error.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio_test::block_on;

    #[test]
    fn frames_in_sequence() {
        block_on(async {
            let mut wire = Vec::new();
            for payload in [&b"first"[..], b"", b"third"] {
                write_frame(&mut wire, payload).await.unwrap();
            }
            assert_eq!(&wire[..4], &[0, 0, 0, 5]);

            let mut reader = &wire[..];
            assert_eq!(read_frame(&mut reader).await.unwrap(), b"first");
            assert_eq!(read_frame(&mut reader).await.unwrap(), b"");
            assert_eq!(read_frame(&mut reader).await.unwrap(), b"third");
        });
    }

    #[test]
    fn rejects_oversized_write() {
        block_on(async {
            let mut wire = Vec::new();
            let big = vec![0u8; MAX_FRAME_SIZE + 1];
            let err = write_frame(&mut wire, &big).await.unwrap_err();
            assert!(matches!(err, TransportError::FrameTooLarge(n) if n == MAX_FRAME_SIZE + 1));
            assert!(wire.is_empty());
        });
    }

    #[test]
    fn rejects_oversized_prefix() {
        block_on(async {
            let prefix = ((MAX_FRAME_SIZE + 1) as u32).to_be_bytes();
            let mut reader = &prefix[..];
            let err = read_frame(&mut reader).await.unwrap_err();
            assert!(matches!(err, TransportError::FrameTooLarge(_)));
        });
    }

    #[test]
    fn truncated_frame_is_eof() {
        block_on(async {
            let wire = [0u8, 0, 0, 9, b'a', b'b'];
            let mut reader = &wire[..];
            match read_frame(&mut reader).await {
                Err(TransportError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
                other => panic!("Unexpected result: {other:?}"),
            }
        });
    }
}
