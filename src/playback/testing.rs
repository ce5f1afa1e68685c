// Scripted media element for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::element::{MediaElement, MediaEvent};
use super::errors::PlaybackError;

#[derive(Debug)]
struct State {
    current_time: f64,
    duration: f64,
    paused: bool,
    volume: f64,
    muted: bool,
    rate: f64,
    source: Option<String>,
    rejections_left: u32,
    play_calls: u32,
    load_calls: u32,
    /// Emitted synchronously by `load()`; `None` never becomes ready
    on_load: Option<MediaEvent>,
}

pub struct FakeElement {
    state: Mutex<State>,
    events: broadcast::Sender<MediaEvent>,
}

impl FakeElement {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(State {
                current_time: 0.0,
                duration: 300.0,
                paused: true,
                volume: 1.0,
                muted: false,
                rate: 1.0,
                source: None,
                rejections_left: 0,
                play_calls: 0,
                load_calls: 0,
                on_load: Some(MediaEvent::LoadedMetadata),
            }),
            events,
        }
    }

    /// Already playing at `seconds`
    pub fn playing_at(seconds: f64) -> Self {
        let element = Self::new();
        {
            let mut state = element.state.lock();
            state.current_time = seconds;
            state.paused = false;
        }
        element
    }

    /// Zero models metadata that has not arrived yet
    pub fn set_duration(&self, seconds: f64) {
        self.state.lock().duration = seconds;
    }

    pub fn reject_next_plays(&self, count: u32) {
        self.state.lock().rejections_left = count;
    }

    pub fn on_load(&self, event: Option<MediaEvent>) {
        self.state.lock().on_load = event;
    }

    pub fn play_calls(&self) -> u32 {
        self.state.lock().play_calls
    }

    pub fn load_calls(&self) -> u32 {
        self.state.lock().load_calls
    }

    /// Move the clock without an event, like playback advancing
    pub fn advance_to(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    /// User seek: move the clock and fire `Seeked`
    pub fn seek(&self, seconds: f64) {
        self.advance_to(seconds);
        self.emit(MediaEvent::Seeked);
    }

    /// Fire an arbitrary event
    pub fn emit(&self, event: MediaEvent) {
        if event == MediaEvent::Ended {
            self.state.lock().paused = true;
        }
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl MediaElement for FakeElement {
    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().volume = volume;
        self.emit(MediaEvent::VolumeChange);
    }

    fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
        self.emit(MediaEvent::VolumeChange);
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.lock().rate = rate;
        self.emit(MediaEvent::RateChange);
    }

    fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    fn set_source(&self, url: Option<&str>) {
        self.state.lock().source = url.map(str::to_string);
    }

    fn load(&self) {
        let ready = {
            let mut state = self.state.lock();
            state.load_calls += 1;
            state.current_time = 0.0;
            state.paused = true;
            state.on_load.clone()
        };
        if let Some(event) = ready {
            self.emit(event);
        }
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        {
            let mut state = self.state.lock();
            state.play_calls += 1;
            if state.rejections_left > 0 {
                state.rejections_left -= 1;
                return Err(PlaybackError::PlaybackRejected("NotAllowedError".to_string()));
            }
            state.paused = false;
        }
        self.emit(MediaEvent::Play);
        Ok(())
    }

    fn pause(&self) {
        let was_playing = {
            let mut state = self.state.lock();
            let was_playing = !state.paused;
            state.paused = true;
            was_playing
        };
        if was_playing {
            self.emit(MediaEvent::Pause);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}
