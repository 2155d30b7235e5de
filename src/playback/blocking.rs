//! Blocking speech: one-shot runs and interactive save mode.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::config::SpeechConfig;
use crate::pipeline::{Artifact, OneShot, PipelineError, ProcessPipeline};

use super::controller::{ControlError, PlaybackControl};
use super::events::{PlaybackEvent, Reporter};
use super::state::{IllegalTransition, PlaybackState, SessionOutcome, Transition};

/// Synthesises and plays (or saves) on the calling thread.
///
/// Also usable as a [`PlaybackControl`] for interactive save mode: every
/// line is written before the prompt returns, so there is never anything
/// to pause or stop.
pub struct BlockingSpeaker {
    pipeline: Arc<ProcessPipeline>,
    reporter: Reporter,
    last_text: Mutex<Option<String>>,
}

impl BlockingSpeaker {
    pub fn new(pipeline: Arc<ProcessPipeline>, reporter: Reporter) -> Self {
        Self {
            pipeline,
            reporter,
            last_text: Mutex::new(None),
        }
    }

    /// Speak `text` and return once playback has finished or the file has
    /// been written.  Failures are returned, not reported.
    pub fn speak(&self, text: &str, config: &SpeechConfig) -> Result<OneShot, PipelineError> {
        config.validate()?;
        if !config.is_save_mode() {
            self.pipeline.player()?;
        }

        (self.reporter)(&PlaybackEvent::Generating);
        let started = Instant::now();
        let artifact = self.pipeline.synthesize(text, config)?;
        let elapsed = started.elapsed();
        log::info!("synthesis finished in {elapsed:?}");

        match artifact {
            Artifact::Saved(path) => {
                (self.reporter)(&PlaybackEvent::Saved {
                    path: path.clone(),
                    elapsed,
                });
                Ok(OneShot::Saved(path))
            }
            temporary => {
                (self.reporter)(&PlaybackEvent::Generated(elapsed));
                (self.reporter)(&PlaybackEvent::Playing);
                self.pipeline.play_artifact(&temporary)?;
                (self.reporter)(&PlaybackEvent::Finished(SessionOutcome::Completed));
                Ok(OneShot::Played)
            }
        }
    }
}

fn idle(transition: Transition) -> ControlError {
    IllegalTransition {
        from: PlaybackState::Idle,
        transition,
    }
    .into()
}

impl PlaybackControl for BlockingSpeaker {
    fn play(&self, text: &str, config: &Arc<SpeechConfig>) -> Result<(), PipelineError> {
        *self.last_text.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_owned());
        self.speak(text, config).map(drop)
    }

    fn pause(&self) -> Result<(), ControlError> {
        Err(idle(Transition::Pause))
    }

    fn resume(&self) -> Result<(), ControlError> {
        Err(idle(Transition::Resume))
    }

    fn stop(&self) -> Result<(), ControlError> {
        Err(idle(Transition::Stop))
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::Idle
    }

    fn current_text(&self) -> Option<String> {
        self.last_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::testing::*;
    use crate::pipeline::EngineCommand;

    type Events = Arc<Mutex<Vec<PlaybackEvent>>>;

    fn speaker(fx: &Fixture, engine: EngineCommand) -> (BlockingSpeaker, Events) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let speaker = BlockingSpeaker::new(
            Arc::new(fx.pipeline(engine, player_ok())),
            Arc::new(move |event: &PlaybackEvent| sink.lock().unwrap().push(event.clone())),
        );
        (speaker, events)
    }

    #[test]
    fn play_mode_reports_progress_and_cleans_up() {
        let fx = Fixture::new();
        let (speaker, events) = speaker(&fx, engine_ok());

        let result = speaker.speak("hello", &fx.config).unwrap();

        assert_eq!(result, OneShot::Played);
        assert_eq!(fx.artifact_count(), 0);
        let events = events.lock().unwrap();
        assert_eq!(events[0], PlaybackEvent::Generating);
        assert!(matches!(events[1], PlaybackEvent::Generated(_)));
        assert_eq!(events[2], PlaybackEvent::Playing);
        assert_eq!(events[3], PlaybackEvent::Finished(SessionOutcome::Completed));
    }

    #[test]
    fn save_mode_writes_file_without_playing() {
        let fx = Fixture::new();
        let (speaker, events) = speaker(&fx, engine_echo());
        let out = fx.dir.path().join("out.wav");
        let mut config = fx.config.clone();
        config.output = Some(out.clone());

        let result = speaker.speak("saved text", &config).unwrap();

        assert_eq!(result, OneShot::Saved(out.clone()));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "saved text");
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], PlaybackEvent::Saved { path, .. } if *path == out));
    }

    #[test]
    fn synthesis_failure_is_returned() {
        let fx = Fixture::new();
        let (speaker, events) = speaker(&fx, engine_failing());

        let err = speaker.speak("hello", &fx.config).unwrap_err();

        assert!(matches!(err, PipelineError::Synthesis { exit: Some(1), .. }));
        assert_eq!(fx.artifact_count(), 0);
        assert_eq!(*events.lock().unwrap(), vec![PlaybackEvent::Generating]);
    }

    #[test]
    fn as_control_saves_each_line_and_stays_idle() {
        let fx = Fixture::new();
        let (speaker, _) = speaker(&fx, engine_echo());
        let out = fx.dir.path().join("line.wav");
        let mut config = fx.config.clone();
        config.output = Some(out.clone());
        let config = Arc::new(config);
        let control: &dyn PlaybackControl = &speaker;

        control.play("first", &config).unwrap();
        control.play("second", &config).unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "second");
        assert_eq!(control.current_text().as_deref(), Some("second"));
        assert_eq!(control.state(), PlaybackState::Idle);
        assert!(matches!(control.pause(), Err(ControlError::Illegal(_))));
        assert!(matches!(control.stop(), Err(ControlError::Illegal(_))));
    }
}
