use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use super::types::TS_PACKET_SIZE;
use super::writer::TSWriter;
use crate::av::{AccessUnit, CodecConfig, Muxer};
use crate::config::Config;
use crate::error::Result;

/// Streams transport packets for one program into an async sink.
pub struct TSMuxer<W: AsyncWrite + Unpin + Send> {
    writer: TSWriter,
    stream_writer: BufWriter<W>,
    packets_written: usize,
}

impl<W: AsyncWrite + Unpin + Send> TSMuxer<W> {
    pub fn new(sink: W) -> Self {
        Self::with_writer(sink, TSWriter::new())
    }

    pub fn with_config(sink: W, config: Config) -> Self {
        Self::with_writer(sink, TSWriter::with_config(config))
    }

    pub fn with_writer(sink: W, writer: TSWriter) -> Self {
        Self {
            writer,
            stream_writer: BufWriter::new(sink),
            packets_written: 0,
        }
    }

    pub fn writer(&self) -> &TSWriter {
        &self.writer
    }

    /// 188-byte packets handed to the sink so far.
    pub fn packets_written(&self) -> usize {
        self.packets_written
    }

    /// Marks a timing discontinuity; see [`TSWriter::reset`].
    pub fn reset(&mut self) {
        self.writer.reset();
    }

    async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.stream_writer.write_all(data).await?;
        self.packets_written += data.len() / TS_PACKET_SIZE;
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub async fn into_inner(mut self) -> Result<W> {
        self.stream_writer.flush().await?;
        Ok(self.stream_writer.into_inner())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Muxer for TSMuxer<W> {
    /// Registers the codec configurations and writes PAT/PMT once the
    /// program is complete.
    async fn write_header(&mut self, streams: &[CodecConfig]) -> Result<()> {
        for config in streams {
            self.writer.set_config(config.clone());
        }
        if !self.writer.can_write() {
            log::debug!(
                "header deferred, expecting {:?}",
                self.writer.expected_media()
            );
            return Ok(());
        }
        let program = self.writer.write_program()?;
        self.write_bytes(&program).await
    }

    async fn write_packet(&mut self, packet: AccessUnit) -> Result<()> {
        let data = self.writer.write_sample(packet)?;
        self.write_bytes(&data).await
    }

    async fn write_trailer(&mut self) -> Result<()> {
        self.stream_writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AudioSpecificConfig;
    use crate::config::ExpectedMedia;
    use crate::format::ts::types::PID_PAT;
    use std::time::Duration;

    fn audio_only() -> Config {
        Config {
            expected_media: ExpectedMedia::Audio,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_muxer_writes_whole_packets() {
        let mut muxer = TSMuxer::with_config(Vec::new(), audio_only());
        muxer
            .write_header(&[CodecConfig::Audio(AudioSpecificConfig::default())])
            .await
            .unwrap();

        for i in 0..10u64 {
            let unit = AccessUnit::audio(vec![0x11; 200]).with_pts(Duration::from_millis(i * 23));
            muxer.write_packet(unit).await.unwrap();
        }
        muxer.write_trailer().await.unwrap();

        let written = muxer.packets_written();
        let out = muxer.into_inner().await.unwrap();
        assert_eq!(out.len(), written * TS_PACKET_SIZE);
        assert!(out.chunks(TS_PACKET_SIZE).all(|p| p[0] == 0x47));
        assert_eq!(out[1] & 0x1F, (PID_PAT >> 8) as u8);
    }

    #[tokio::test]
    async fn test_header_deferred_until_program_complete() {
        let mut muxer = TSMuxer::with_config(Vec::new(), Config::default());
        muxer
            .write_header(&[CodecConfig::Audio(AudioSpecificConfig::default())])
            .await
            .unwrap();
        assert_eq!(muxer.packets_written(), 0);

        muxer
            .write_packet(AccessUnit::audio(vec![0; 8]).with_pts(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(muxer.packets_written(), 0);
    }

    #[test]
    fn test_into_inner_flushes_buffered_packets() {
        tokio_test::block_on(async {
            let mut muxer = TSMuxer::with_config(Vec::new(), audio_only());
            muxer.writer.set_audio_config(AudioSpecificConfig::default());
            muxer
                .write_packet(AccessUnit::audio(vec![0; 16]).with_pts(Duration::ZERO))
                .await
                .unwrap();

            // no trailer: the buffer is flushed on hand-back
            let out = muxer.into_inner().await.unwrap();
            assert_eq!(out.len(), 3 * TS_PACKET_SIZE);
        });
    }
}
