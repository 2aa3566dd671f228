// Shared fakes for unit tests: a scriptable streaming engine and factory.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

use crate::engine::{EngineFactory, StreamingEngine};
use crate::error::PlaybackError;
use crate::events::EngineEvent;

#[derive(Default)]
struct FakeEngineInner {
    loaded: Option<Url>,
    playing: bool,
    muted: bool,
    position: f64,
    buffered_end: Option<f64>,
    seeks: Vec<f64>,
    play_calls: u32,
    start_load_calls: u32,
    recover_calls: u32,
    shutdown_calls: u32,
    fail_load: bool,
}

/// Observable state of one fake engine instance, shared with the test.
#[derive(Default)]
pub struct FakeEngineState {
    inner: Mutex<FakeEngineInner>,
}

impl FakeEngineState {
    pub fn set_position(&self, position: f64) {
        self.inner.lock().position = position;
    }

    pub fn set_buffered_end(&self, end: Option<f64>) {
        self.inner.lock().buffered_end = end;
    }

    pub fn fail_next_load(&self) {
        self.inner.lock().fail_load = true;
    }

    pub fn loaded_url(&self) -> Option<Url> {
        self.inner.lock().loaded.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    pub fn muted(&self) -> bool {
        self.inner.lock().muted
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.inner.lock().seeks.clone()
    }

    pub fn play_calls(&self) -> u32 {
        self.inner.lock().play_calls
    }

    pub fn start_load_calls(&self) -> u32 {
        self.inner.lock().start_load_calls
    }

    pub fn recover_calls(&self) -> u32 {
        self.inner.lock().recover_calls
    }

    pub fn shutdown_calls(&self) -> u32 {
        self.inner.lock().shutdown_calls
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shutdown_calls > 0
    }
}

pub struct FakeEngine {
    state: Arc<FakeEngineState>,
}

impl FakeEngine {
    /// Standalone engine plus its event receiver, for tests that drive the
    /// engine directly rather than through a factory.
    pub fn create_pair() -> (FakeEngine, mpsc::UnboundedReceiver<EngineEvent>) {
        let (_tx, rx) = mpsc::unbounded_channel();
        (
            FakeEngine {
                state: Arc::new(FakeEngineState::default()),
            },
            rx,
        )
    }

    pub fn state(&self) -> Arc<FakeEngineState> {
        Arc::clone(&self.state)
    }
}

impl StreamingEngine for FakeEngine {
    fn load(&mut self, url: &Url) -> Result<(), PlaybackError> {
        let mut inner = self.state.inner.lock();
        if inner.fail_load {
            return Err(PlaybackError::engine("scripted load failure"));
        }
        inner.loaded = Some(url.clone());
        Ok(())
    }

    fn play(&mut self) {
        let mut inner = self.state.inner.lock();
        inner.playing = true;
        inner.play_calls += 1;
    }

    fn pause(&mut self) {
        self.state.inner.lock().playing = false;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.inner.lock().muted = muted;
    }

    fn position(&self) -> f64 {
        self.state.inner.lock().position
    }

    fn buffered_end(&self) -> Option<f64> {
        self.state.inner.lock().buffered_end
    }

    fn is_paused(&self) -> bool {
        !self.state.inner.lock().playing
    }

    fn seek(&mut self, position: f64) {
        let mut inner = self.state.inner.lock();
        inner.seeks.push(position);
        inner.position = position;
    }

    fn start_load(&mut self) {
        self.state.inner.lock().start_load_calls += 1;
    }

    fn recover_media_error(&mut self) {
        self.state.inner.lock().recover_calls += 1;
    }

    fn shutdown(&mut self) {
        let mut inner = self.state.inner.lock();
        inner.shutdown_calls += 1;
        inner.playing = false;
        inner.loaded = None;
    }
}

/// Handle to one factory-created instance: its state plus the sender side of
/// its event channel, so tests can emit engine callbacks.
#[derive(Clone)]
pub struct FakeInstance {
    pub state: Arc<FakeEngineState>,
    pub events: mpsc::UnboundedSender<EngineEvent>,
}

impl FakeInstance {
    pub fn emit(&self, event: EngineEvent) {
        // The receiver is gone once the session loop exits; emitting into a
        // torn-down session is a test scripting error we surface loudly.
        self.events.send(event).expect("session event loop is gone");
    }
}

#[derive(Default)]
pub struct FakeFactory {
    instances: Mutex<Vec<FakeInstance>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.instances.lock().len()
    }

    /// Engines created and not yet shut down.
    pub fn live_instances(&self) -> usize {
        self.instances
            .lock()
            .iter()
            .filter(|i| !i.state.is_shut_down())
            .count()
    }

    pub fn instance(&self, index: usize) -> FakeInstance {
        self.instances.lock()[index].clone()
    }

    pub fn last(&self) -> FakeInstance {
        self.instances.lock().last().expect("no instances").clone()
    }

    pub fn all(&self) -> Vec<FakeInstance> {
        self.instances.lock().clone()
    }
}

impl EngineFactory for FakeFactory {
    fn create(&self) -> (Box<dyn StreamingEngine>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(FakeEngineState::default());
        self.instances.lock().push(FakeInstance {
            state: Arc::clone(&state),
            events: tx,
        });
        (Box::new(FakeEngine { state }), rx)
    }
}
