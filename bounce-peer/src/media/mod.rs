pub mod codec;
pub mod producer;
pub mod pump;
pub mod receiver;
pub mod recorder;

pub use codec::{DecoderWorker, EncodedFrame, EncoderWorker, H264Decoder, H264Encoder};
pub use producer::{BallProducer, RelayProducer, RelaySender, VideoProducer, relay_channel};
pub use receiver::FrameHandler;
pub use recorder::{Blackhole, FrameSink, Mp4FileSink};
