//! Scripted capture backend and decoder for tests.
//!
//! A [`Probe`] shared by both halves lets a test refuse the next acquire,
//! make the decoder fail, push decode events, and count open handles.

use std::sync::{Arc, Mutex};

use scanpay_core::{BarcodeFormat, DecodeEvent};
use tokio::sync::mpsc;

use super::{
    CameraError, CaptureBackend, CaptureConstraints, CaptureHandle, Decoder, DecoderConfig,
    DecoderSession,
};

#[derive(Default)]
struct ProbeState {
    acquisitions: usize,
    live_handles: usize,
    refuse_next: Option<CameraError>,
    decoder_fails: bool,
    last_facing: Option<super::FacingMode>,
    feed: Option<mpsc::Sender<DecodeEvent>>,
}

#[derive(Clone, Default)]
pub struct Probe {
    state: Arc<Mutex<ProbeState>>,
}

impl Probe {
    pub fn refuse_next(&self, err: CameraError) {
        self.state.lock().unwrap().refuse_next = Some(err);
    }

    pub fn fail_decoder(&self, fail: bool) {
        self.state.lock().unwrap().decoder_fails = fail;
    }

    pub fn acquisitions(&self) -> usize {
        self.state.lock().unwrap().acquisitions
    }

    pub fn live_handles(&self) -> usize {
        self.state.lock().unwrap().live_handles
    }

    pub fn last_facing(&self) -> Option<super::FacingMode> {
        self.state.lock().unwrap().last_facing
    }

    /// Pushes a decode event through the most recent session's channel.
    /// Returns false when no session ever started or its receiver is gone.
    pub async fn emit(&self, code: &str, format: BarcodeFormat) -> bool {
        let feed = self.state.lock().unwrap().feed.clone();
        match feed {
            Some(tx) => tx.send(DecodeEvent::new(code, format)).await.is_ok(),
            None => false,
        }
    }

    /// Closes the decoder's side of the channel, as if the device went away.
    pub fn end_stream(&self) {
        self.state.lock().unwrap().feed = None;
    }
}

pub struct ScriptedBackend {
    probe: Probe,
}

pub struct ScriptedHandle {
    probe: Probe,
}

impl CaptureHandle for ScriptedHandle {
    fn label(&self) -> &str {
        "scripted"
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.probe.state.lock().unwrap().live_handles -= 1;
    }
}

impl CaptureBackend for ScriptedBackend {
    type Handle = ScriptedHandle;

    fn acquire(&mut self, constraints: &CaptureConstraints) -> Result<ScriptedHandle, CameraError> {
        let mut state = self.probe.state.lock().unwrap();
        state.last_facing = Some(constraints.facing);
        if let Some(err) = state.refuse_next.take() {
            return Err(err);
        }
        state.acquisitions += 1;
        state.live_handles += 1;
        drop(state);

        Ok(ScriptedHandle {
            probe: self.probe.clone(),
        })
    }
}

pub struct ScriptedDecoder {
    probe: Probe,
}

impl Decoder<ScriptedHandle> for ScriptedDecoder {
    fn start(
        &mut self,
        _handle: &mut ScriptedHandle,
        config: &DecoderConfig,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<DecoderSession, CameraError> {
        config.check()?;
        let mut state = self.probe.state.lock().unwrap();
        if state.decoder_fails {
            return Err(CameraError::DecoderInit("scripted failure".to_string()));
        }
        state.feed = Some(events);
        Ok(DecoderSession::detached())
    }
}

/// A connected backend, decoder and probe.
pub fn scripted() -> (ScriptedBackend, ScriptedDecoder, Probe) {
    let probe = Probe::default();
    (
        ScriptedBackend {
            probe: probe.clone(),
        },
        ScriptedDecoder {
            probe: probe.clone(),
        },
        probe,
    )
}
