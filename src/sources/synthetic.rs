//! Synthetic motion source for development and load testing.
//!
//! Emits device-motion and orientation events shaped like a phone waved in a
//! slow figure: sinusoidal acceleration and rotation rate with a little
//! noise, orientation at a third of the motion rate, and an occasional
//! quaternion reading. Delivery is lossy by design: if the run loop falls
//! behind, events are dropped at the channel, never queued unboundedly.

use crate::sensors::{MotionEvent, OrientationEvent, RawAxes, RawRotationRate, SourceEvent};
use crate::sources::SourceError;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Threaded generator of synthetic sensor events.
pub struct SyntheticSource {
    rate_hz: f64,
    sender: Sender<SourceEvent>,
    receiver: Receiver<SourceEvent>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    /// Create a source emitting motion events at `rate_hz`.
    pub fn new(rate_hz: f64) -> Self {
        let (sender, receiver) = bounded(10_000);
        Self {
            rate_hz: rate_hz.max(1.0),
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start the generator thread.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let sender = self.sender.clone();
        let period = Duration::from_secs_f64(1.0 / self.rate_hz);

        self.handle = Some(thread::spawn(move || {
            let origin = Instant::now();
            let mut rng = rand::rng();
            let mut tick: u64 = 0;

            while running.load(Ordering::SeqCst) {
                let t = origin.elapsed().as_secs_f64();
                let mut noise = || rng.random_range(-0.05..0.05);

                let motion = MotionEvent {
                    acceleration: Some(RawAxes {
                        x: Some((t * 2.0).sin() + noise()),
                        y: Some((t * 2.0).cos() + noise()),
                        z: Some(0.3 * (t * 5.0).sin() + noise()),
                    }),
                    acceleration_including_gravity: None,
                    rotation_rate: Some(RawRotationRate {
                        alpha: Some(30.0 * (t * 1.5).sin() + noise()),
                        beta: Some(30.0 * (t * 1.5).cos() + noise()),
                        gamma: Some(10.0 * (t * 0.7).sin() + noise()),
                    }),
                };
                // try_send: drop on backpressure rather than block the generator
                let _ = sender.try_send(SourceEvent::Motion(motion));

                if tick % 3 == 0 {
                    let orientation = OrientationEvent {
                        alpha: Some((t * 20.0) % 360.0),
                        beta: Some(45.0 * (t * 0.5).sin()),
                        gamma: Some(30.0 * (t * 0.5).cos()),
                    };
                    let _ = sender.try_send(SourceEvent::Orientation(orientation));
                }

                if tick % 10 == 0 {
                    let half = (t * 0.25).sin() / 2.0;
                    let _ = sender.try_send(SourceEvent::Rotation {
                        quaternion: [half.sin(), 0.0, 0.0, half.cos()],
                    });
                }

                tick += 1;
                thread::sleep(period);
            }
            debug!("synthetic source stopped after {tick} ticks");
        }));

        Ok(())
    }

    /// Stop the generator thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for generated events.
    pub fn receiver(&self) -> &Receiver<SourceEvent> {
        &self.receiver
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.stop();
    }
}
