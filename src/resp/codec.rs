//! Glues the decoder (C2) and encoder (C3) into a single
//! [`tokio_util::codec::Framed`]-compatible type.
//!
//! `spec.md` treats decoding and encoding as separate components, but a
//! `Framed` connection needs one type implementing both traits — exactly
//! how the teacher's `RespCommandFrame` bundled them in
//! `examples/yash-jain-1-muDB/src/resp/frame.rs`. `ClientCodec` is that
//! bundle; it does no work of its own beyond delegating to
//! [`super::decoder::RespDecoder`] and [`super::encoder::encode_command`].

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::decoder::RespDecoder;
use super::encoder::CommandEncoder;
use super::value::RespValue;
use super::ProtocolError;

#[derive(Default)]
pub struct ClientCodec {
    decoder: RespDecoder,
    encoder: CommandEncoder,
}

impl ClientCodec {
    pub fn new() -> Self {
        ClientCodec { decoder: RespDecoder::new(), encoder: CommandEncoder }
    }
}

impl Decoder for ClientCodec {
    type Item = RespValue;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RespValue>, ProtocolError> {
        self.decoder.decode(src)
    }
}

impl Encoder<Vec<Bytes>> for ClientCodec {
    type Error = ProtocolError;

    fn encode(&mut self, argv: Vec<Bytes>, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        self.encoder.encode(argv, dst)
    }
}
