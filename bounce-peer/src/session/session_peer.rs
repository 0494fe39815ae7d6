use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_H264, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtcp::packet::Packet as RtcpPacket;
use webrtc::rtcp::payload_feedbacks::picture_loss_indication::PictureLossIndication;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use bounce_core::{Frame, IceCandidate, SdpKind, SessionDescription, Signal};

use crate::config::{MediaConfig, TransportConfig};
use crate::error::Result;
use crate::media::codec::{DecoderWorker, EncoderWorker};
use crate::media::producer::VideoProducer;
use crate::media::pump::OutboundPump;
use crate::media::receiver::{self, FrameHandler};
use crate::session::data_channel::DataChannelHandle;
use crate::session::session_state::{
    LifecycleAction, LifecycleEvent, SessionLifecycle, SessionState,
};

type DataHandler = Arc<dyn Fn(String) -> futures::future::BoxFuture<'static, ()> + Send + Sync>;

/// One end of a WebRTC session: a peer connection plus the lifecycle,
/// candidate buffering and media tasks around it.
///
/// Locally gathered candidates and local descriptions are pushed onto the
/// outbound queue given to [`SessionPeer::new`]; whoever drains that queue
/// is responsible for delivering them to the remote.
#[derive(Clone)]
pub struct SessionPeer {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    name: String,
    pc: Arc<RTCPeerConnection>,
    media: MediaConfig,
    outbound: mpsc::UnboundedSender<Signal>,
    lifecycle: Mutex<SessionLifecycle>,
    state_tx: watch::Sender<SessionState>,
    /// Remote candidates that arrived before the remote description.
    pending_candidates: tokio::sync::Mutex<Vec<RTCIceCandidateInit>>,
    data_channel: Mutex<Option<DataChannelHandle>>,
    data_handler: Mutex<Option<DataHandler>>,
    track_handler: Mutex<Option<FrameHandler>>,
    media_tasks: Mutex<Vec<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    transport_closes: AtomicUsize,
}

impl SessionPeer {
    pub async fn new(
        name: impl Into<String>,
        transport: &TransportConfig,
        media: MediaConfig,
        outbound: mpsc::UnboundedSender<Signal>,
    ) -> Result<Self> {
        let name = name.into();
        media.clock()?;

        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if transport.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: transport.ice_servers.clone(),
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);
        let (state_tx, _) = watch::channel(SessionState::New);

        let inner = Arc::new(SessionInner {
            name,
            pc,
            media,
            outbound,
            lifecycle: Mutex::new(SessionLifecycle::default()),
            state_tx,
            pending_candidates: tokio::sync::Mutex::new(Vec::new()),
            data_channel: Mutex::new(None),
            data_handler: Mutex::new(None),
            track_handler: Mutex::new(None),
            media_tasks: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            transport_closes: AtomicUsize::new(0),
        });
        SessionInner::register_callbacks(&inner);

        Ok(Self { inner })
    }

    pub async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.inner.pc.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    pub async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.inner.pc.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    /// Queues the description for the remote, then applies it locally.
    ///
    /// Queueing first keeps it ahead of every candidate trickled from the
    /// gathering it starts.
    pub async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let _ = self
            .inner
            .outbound
            .send(Signal::Description(description.clone()));

        self.inner
            .pc
            .set_local_description(to_rtc(description)?)
            .await?;
        self.inner.apply(LifecycleEvent::DescriptionApplied);
        Ok(())
    }

    /// Applies the remote description and flushes buffered remote candidates.
    pub async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let mut pending = self.inner.pending_candidates.lock().await;

        self.inner
            .pc
            .set_remote_description(to_rtc(description)?)
            .await?;
        self.inner.apply(LifecycleEvent::DescriptionApplied);

        if !pending.is_empty() {
            debug!("[{}] Applying {} buffered candidates", self.inner.name, pending.len());
        }
        for candidate in pending.drain(..) {
            if let Err(e) = self.inner.pc.add_ice_candidate(candidate).await {
                warn!("[{}] Buffered candidate rejected: {}", self.inner.name, e);
            }
        }
        Ok(())
    }

    /// Adds a remote candidate, or buffers it until a remote description exists.
    pub async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            ..Default::default()
        };

        let mut pending = self.inner.pending_candidates.lock().await;
        if self.inner.pc.remote_description().await.is_none() {
            pending.push(init);
            return Ok(());
        }
        drop(pending);

        self.inner.pc.add_ice_candidate(init).await?;
        Ok(())
    }

    /// Adds an H.264 track fed by `producer`. Frames start flowing once the
    /// session is connected.
    pub async fn add_outbound_video_producer(
        &self,
        producer: Box<dyn VideoProducer>,
    ) -> Result<()> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_H264.to_owned(),
                clock_rate: self.inner.media.clock_rate,
                ..Default::default()
            },
            "video".to_owned(),
            format!("bounce-{}", self.inner.name),
        ));

        let sender = self
            .inner
            .pc
            .add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        let frame_interval = self.inner.media.clock()?.frame_interval();
        let keyframe_request = Arc::new(AtomicBool::new(false));
        self.inner
            .spawn(read_rtcp(sender, Arc::clone(&keyframe_request)));

        let media = self.inner.media.clone();
        let name = self.inner.name.clone();
        let mut state = self.inner.state_tx.subscribe();
        let pump = tokio::spawn(async move {
            let reached = state
                .wait_for(|s| *s == SessionState::Connected || s.is_terminal())
                .await
                .map(|s| *s);
            if !matches!(reached, Ok(SessionState::Connected)) {
                return;
            }

            let encoder = match EncoderWorker::spawn(&name).await {
                Ok(encoder) => encoder,
                Err(e) => {
                    error!("[{}] Cannot start video encoder: {}", name, e);
                    return;
                }
            };

            info!("[{}] Starting outbound video", name);
            let pump = OutboundPump {
                track,
                encoder,
                keyframe_interval: media.keyframe_interval,
                keyframe_request,
                frame_interval,
            };
            if let Err(e) = pump.run(producer).await {
                warn!("[{}] Outbound video stopped: {}", name, e);
            }
        });
        lock(&self.inner.media_tasks).push(pump);

        Ok(())
    }

    /// Creates a data channel on this side of the session.
    pub async fn add_outbound_data_channel(&self, label: &str) -> Result<DataChannelHandle> {
        let channel = self.inner.pc.create_data_channel(label, None).await?;
        Ok(self.inner.attach_data_channel(channel))
    }

    /// Installs the handler for decoded frames of every inbound video track.
    ///
    /// Tracks that arrive while no handler is installed are drained.
    pub fn on_inbound_track<F, Fut>(&self, handler: F)
    where
        F: Fn(Frame) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: FrameHandler = Arc::new(move |frame| handler(frame).boxed());
        *lock(&self.inner.track_handler) = Some(handler);
    }

    /// Installs the handler for text messages on the session's data channel.
    pub fn on_inbound_data<F, Fut>(&self, handler: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: DataHandler = Arc::new(move |text| handler(text).boxed());
        *lock(&self.inner.data_handler) = Some(handler);
    }

    /// The data channel, once one was created locally or announced by the remote.
    pub fn data_channel(&self) -> Option<DataChannelHandle> {
        lock(&self.inner.data_channel).clone()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Stops frames in both directions: outbound pumps, inbound decoders and
    /// the inbound frame handler. The session itself stays up.
    pub fn stop_media(&self) {
        lock(&self.inner.track_handler).take();
        for task in lock(&self.inner.media_tasks).drain(..) {
            task.abort();
        }
    }

    /// Closes the session. Only the first call (or the close triggered by a
    /// transport failure) touches the peer connection.
    pub async fn close(&self) -> Result<()> {
        let first = lock(&self.inner.lifecycle).begin_close();
        self.inner.publish();

        self.stop_media();
        for task in lock(&self.inner.tasks).drain(..) {
            task.abort();
        }
        // Handlers may hold clones of this session.
        lock(&self.inner.data_handler).take();

        if first {
            self.inner.close_transport().await?;
        }
        Ok(())
    }

    /// How many times the peer connection was actually closed.
    pub fn transport_closes(&self) -> usize {
        self.inner.transport_closes.load(Ordering::Acquire)
    }
}

impl SessionInner {
    fn register_callbacks(inner: &Arc<Self>) {
        let weak = Arc::downgrade(inner);
        inner.pc.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        let _ = inner.on_transport_state(s);
                    }
                })
            },
        ));

        let outbound = inner.outbound.clone();
        let name = inner.name.clone();
        inner
            .pc
            .on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
                let outbound = outbound.clone();
                let name = name.clone();
                Box::pin(async move {
                    let Some(candidate) = c else { return };
                    let Ok(init) = candidate.to_json() else {
                        return;
                    };
                    debug!("[{}] Local candidate {}", name, init.candidate);
                    let _ = outbound.send(Signal::Candidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_mline_index: init.sdp_mline_index,
                    }));
                })
            }));

        let weak = Arc::downgrade(inner);
        inner
            .pc
            .on_data_channel(Box::new(move |channel: Arc<RTCDataChannel>| {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        debug!("[{}] Remote opened data channel '{}'", inner.name, channel.label());
                        inner.attach_data_channel(channel);
                    }
                })
            }));

        let weak = Arc::downgrade(inner);
        inner.pc.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_track(track).await;
                    }
                })
            },
        ));
    }

    fn apply(self: &Arc<Self>, event: LifecycleEvent) -> LifecycleAction {
        let action = lock(&self.lifecycle).apply(event);
        self.publish();
        action
    }

    fn publish(&self) {
        let state = lock(&self.lifecycle).state();
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    /// Feeds a transport state into the lifecycle. On the first failure the
    /// connection is closed from a separate task, since the state callback
    /// runs inside the connection itself.
    fn on_transport_state(self: &Arc<Self>, s: RTCPeerConnectionState) -> Option<JoinHandle<()>> {
        info!("[{}] Peer connection state changed: {}", self.name, s);
        let event = LifecycleEvent::from_transport(s)?;

        match self.apply(event) {
            LifecycleAction::None => None,
            LifecycleAction::Close => {
                error!("[{}] Session failed, closing", self.name);
                let inner = Arc::clone(self);
                Some(tokio::spawn(async move {
                    for task in lock(&inner.media_tasks).drain(..) {
                        task.abort();
                    }
                    if let Err(e) = inner.close_transport().await {
                        warn!("[{}] Close after failure: {}", inner.name, e);
                    }
                }))
            }
        }
    }

    async fn close_transport(&self) -> Result<()> {
        self.transport_closes.fetch_add(1, Ordering::AcqRel);
        info!("[{}] Closing peer connection", self.name);
        self.pc.close().await?;
        Ok(())
    }

    fn attach_data_channel(self: &Arc<Self>, channel: Arc<RTCDataChannel>) -> DataChannelHandle {
        let name = self.name.clone();
        let label = channel.label().to_owned();
        channel.on_open(Box::new(move || {
            Box::pin(async move {
                info!("[{}] Data channel '{}' open", name, label);
            })
        }));

        let weak: Weak<Self> = Arc::downgrade(self);
        channel.on_message(Box::new(move |msg: DataChannelMessage| {
            let handler = weak
                .upgrade()
                .and_then(|inner| lock(&inner.data_handler).clone());
            Box::pin(async move {
                let Some(handler) = handler else { return };
                match String::from_utf8(msg.data.to_vec()) {
                    Ok(text) => handler(text).await,
                    Err(_) => warn!("Dropping non UTF-8 data channel message"),
                }
            })
        }));

        let handle = DataChannelHandle::new(channel);
        *lock(&self.data_channel) = Some(handle.clone());
        handle
    }

    async fn on_track(self: &Arc<Self>, track: Arc<TrackRemote>) {
        info!(
            "[{}] Inbound {} track, ssrc {}",
            self.name,
            track.kind(),
            track.ssrc()
        );

        let handler = lock(&self.track_handler).clone();
        let Some(handler) = handler.filter(|_| track.kind() == RTPCodecType::Video) else {
            self.spawn(receiver::drain(track));
            return;
        };

        let decoder = match DecoderWorker::spawn(&self.name).await {
            Ok(decoder) => decoder,
            Err(e) => {
                error!("[{}] Cannot start video decoder: {}", self.name, e);
                self.spawn(receiver::drain(track));
                return;
            }
        };

        // Ask for an IDR right away so decoding can start without waiting
        // for the next periodic keyframe.
        let pli = PictureLossIndication {
            sender_ssrc: 0,
            media_ssrc: track.ssrc(),
        };
        let packets: Vec<Box<dyn RtcpPacket + Send + Sync>> = vec![Box::new(pli)];
        if let Err(e) = self.pc.write_rtcp(&packets).await {
            debug!("[{}] Initial PLI not sent: {}", self.name, e);
        }

        let task = tokio::spawn(receiver::receive_video(track, decoder, handler));
        lock(&self.media_tasks).push(task);
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        lock(&self.tasks).push(tokio::spawn(task));
    }
}

/// Watches RTCP from the remote receiver for picture loss indications.
async fn read_rtcp(sender: Arc<RTCRtpSender>, keyframe_request: Arc<AtomicBool>) {
    let mut buf = vec![0u8; 1500];
    while let Ok((packets, _)) = sender.read(&mut buf).await {
        if packets
            .iter()
            .any(|p| p.as_any().downcast_ref::<PictureLossIndication>().is_some())
        {
            keyframe_request.store(true, Ordering::Release);
        }
    }
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
    };
    Ok(rtc)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
