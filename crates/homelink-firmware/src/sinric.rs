//! Sinric WebSocket client over embassy-net TCP.
//!
//! One logical connection to the cloud endpoint, text frames only. The
//! API key is presented exactly once, as a header on the HTTP upgrade
//! request; it is not re-sent per message. All failures collapse into
//! [`LinkError`]: the caller closes the client and retries on the fixed
//! reconnect interval, nothing here escalates.

use alloc::string::String;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use edge_ws::{FrameHeader, FrameType};
use embassy_net::Stack;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_time::{Duration, with_timeout};
use embedded_io_async::{Read, Write};
use heapless::Vec;
use log::{debug, warn};

use homelink_core::bridge::FrameSink;
use homelink_core::config::{CLOUD_HOST, CLOUD_PATH, CLOUD_PORT};
use homelink_core::link::LinkError;

use crate::wifi_secrets::SINRIC_API_KEY;

/// Largest frame payload we accept from the cloud.
const FRAME_BUF_LEN: usize = 1024;

/// Outbound frames queued between flushes. The contract is best-effort:
/// overflow drops the frame.
const OUTBOX_DEPTH: usize = 4;

/// Deadline on the whole connection setup (DNS, TCP, upgrade). A
/// blackholed endpoint must fail into the reconnect path instead of
/// parking the tick loop on the SYN retransmit schedule.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline on reading one frame once its first bytes have arrived. A
/// peer that goes quiet mid-frame costs the connection.
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SinricClient<'a> {
    socket: TcpSocket<'a>,
    mask: u32,
    outbox: Vec<String, OUTBOX_DEPTH>,
}

impl<'a> SinricClient<'a> {
    /// Open the TCP connection and perform the WebSocket upgrade,
    /// bounded by [`CONNECT_TIMEOUT`] so the caller's tick loop never
    /// stalls on an unreachable endpoint.
    ///
    /// `mask_seed` feeds the client-side frame mask generator; any
    /// hardware RNG word will do.
    pub async fn connect(
        stack: Stack<'a>,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
        mask_seed: u32,
    ) -> Result<SinricClient<'a>, LinkError> {
        match with_timeout(
            CONNECT_TIMEOUT,
            Self::open(stack, rx_buffer, tx_buffer, mask_seed),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LinkError::Connect),
        }
    }

    async fn open(
        stack: Stack<'a>,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
        mask_seed: u32,
    ) -> Result<SinricClient<'a>, LinkError> {
        let addrs = stack
            .dns_query(CLOUD_HOST, DnsQueryType::A)
            .await
            .map_err(|_| LinkError::Dns)?;
        let addr = *addrs.first().ok_or(LinkError::Dns)?;

        let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
        socket
            .connect((addr, CLOUD_PORT))
            .await
            .map_err(|_| LinkError::Connect)?;

        let mut client = Self {
            socket,
            // Avoid the xorshift fixed point at zero.
            mask: mask_seed | 1,
            outbox: Vec::new(),
        };
        client.upgrade().await?;
        Ok(client)
    }

    async fn upgrade(&mut self) -> Result<(), LinkError> {
        let key = self.websocket_key();
        let request = alloc::format!(
            "GET {path} HTTP/1.1\r\n\
             Host: {host}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: {key}\r\n\
             apikey: {api_key}\r\n\
             \r\n",
            path = CLOUD_PATH,
            host = CLOUD_HOST,
            key = key,
            api_key = SINRIC_API_KEY,
        );
        self.socket
            .write_all(request.as_bytes())
            .await
            .map_err(|_| LinkError::Connect)?;

        // Read response headers up to the blank line; only the status
        // line matters.
        let mut response = [0u8; 512];
        let mut len = 0;
        let headers_end = loop {
            if len == response.len() {
                return Err(LinkError::Handshake);
            }
            let n = self
                .socket
                .read(&mut response[len..])
                .await
                .map_err(|_| LinkError::Handshake)?;
            if n == 0 {
                return Err(LinkError::Closed);
            }
            len += n;
            if let Some(pos) = response[..len].windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        // Bytes pipelined behind the headers would be lost here and
        // desync the frame stream; force a clean retry instead.
        if len > headers_end {
            return Err(LinkError::Handshake);
        }
        if !response[..len].starts_with(b"HTTP/1.1 101") {
            warn!("handshake rejected by {CLOUD_HOST}");
            return Err(LinkError::Handshake);
        }
        debug!("websocket upgrade complete");
        Ok(())
    }

    /// Pump at most one inbound frame. Non-blocking when the receive
    /// buffer is empty, and bounded by [`FRAME_TIMEOUT`] once frame
    /// bytes have started arriving, so the caller's tick keeps running.
    /// `Err` means the link must be torn down.
    pub async fn recv(&mut self) -> Result<Option<String>, LinkError> {
        if !self.socket.can_recv() {
            return Ok(None);
        }
        match with_timeout(FRAME_TIMEOUT, self.recv_frame()).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::Closed),
        }
    }

    async fn recv_frame(&mut self) -> Result<Option<String>, LinkError> {
        let header = FrameHeader::recv(&mut self.socket)
            .await
            .map_err(|_| LinkError::Closed)?;
        if header.payload_len > FRAME_BUF_LEN as u64 {
            // Nothing in the protocol is this large; resynchronizing
            // mid-stream is not worth it, drop the connection instead.
            // Compared in u64: a usize cast first would truncate on the
            // 32-bit target and let huge lengths slip past the guard.
            return Err(LinkError::Closed);
        }
        let len = header.payload_len as usize;
        let mut buf = [0u8; FRAME_BUF_LEN];
        let payload = header
            .recv_payload(&mut self.socket, &mut buf[..len])
            .await
            .map_err(|_| LinkError::Closed)?;

        match header.frame_type {
            FrameType::Text(false) => Ok(core::str::from_utf8(payload).ok().map(String::from)),
            FrameType::Ping => {
                let mut echo = [0u8; FRAME_BUF_LEN];
                let n = payload.len();
                echo[..n].copy_from_slice(payload);
                self.send_frame(FrameType::Pong, &echo[..n]).await?;
                Ok(None)
            }
            FrameType::Close => Err(LinkError::Closed),
            // Fragmented and binary frames are not part of the protocol.
            _ => Ok(None),
        }
    }

    /// Send everything queued since the last pass.
    pub async fn flush(&mut self) -> Result<(), LinkError> {
        while !self.outbox.is_empty() {
            let frame = self.outbox.remove(0);
            debug!("sending frame: {frame}");
            self.send_frame(FrameType::Text(false), frame.as_bytes())
                .await?;
        }
        Ok(())
    }

    /// Close the link. Best effort; the reconnect timer owns recovery.
    pub async fn close(mut self) {
        let header = FrameHeader {
            frame_type: FrameType::Close,
            payload_len: 0,
            mask_key: Some(self.next_mask()),
        };
        let _ = header.send(&mut self.socket).await;
        self.socket.close();
    }

    async fn send_frame(
        &mut self,
        frame_type: FrameType,
        payload: &[u8],
    ) -> Result<(), LinkError> {
        let header = FrameHeader {
            frame_type,
            payload_len: payload.len() as u64,
            mask_key: Some(self.next_mask()),
        };
        header
            .send(&mut self.socket)
            .await
            .map_err(|_| LinkError::Closed)?;
        header
            .send_payload(&mut self.socket, payload)
            .await
            .map_err(|_| LinkError::Closed)?;
        self.socket.flush().await.map_err(|_| LinkError::Closed)
    }

    /// xorshift32; frame masks need variety, not cryptographic strength.
    fn next_mask(&mut self) -> u32 {
        let mut x = self.mask;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.mask = x;
        x
    }

    fn websocket_key(&mut self) -> String {
        let mut nonce = [0u8; 16];
        for chunk in nonce.chunks_exact_mut(4) {
            chunk.copy_from_slice(&self.next_mask().to_le_bytes());
        }
        BASE64.encode(nonce)
    }
}

impl FrameSink for SinricClient<'_> {
    fn send_text(&mut self, frame: &str) {
        if self.outbox.push(String::from(frame)).is_err() {
            warn!("outbox full, dropping frame");
        }
    }
}
