//! Audio engine — owns the session, the scheduler, every sound generator
//! and the master bus, and turns all of it into blocks of samples.
//!
//! Time inside the engine is the audio clock: seconds derived from how many
//! samples have been rendered. The scheduler hands out step times slightly
//! ahead of that clock and the voices sit silent until the clock reaches
//! them, which is what keeps step timing sample-accurate regardless of
//! block size.

use crate::drums::{DrumChannel, DrumParam};
use crate::dsp::master::MasterBus;
use crate::error::StepwaveError;
use crate::pattern::PitchClass;
use crate::persist;
use crate::sequencer::StepScheduler;
use crate::session::{ChannelId, DrumChannelId, Session, SynthChannelId};
use crate::synth::{MelodicSynth, SynthParam, VoiceId};

/// Notes release slightly before the step grid so back-to-back notes on the
/// same channel re-articulate instead of merging.
const GATE_FRACTION: f64 = 0.95;

pub struct AudioEngine {
    sample_rate: f64,
    session: Session,
    scheduler: StepScheduler,
    drums: [DrumChannel; 6],
    synths: [MelodicSynth; 5],
    master: MasterBus,
    samples_rendered: u64,
}

impl AudioEngine {
    pub fn new(sample_rate: f64) -> Self {
        let session = Session::new();
        let scheduler = StepScheduler::new(session.bpm());
        AudioEngine {
            sample_rate,
            session,
            scheduler,
            drums: DrumChannelId::ALL.map(|ch| DrumChannel::new(ch.kind(), sample_rate)),
            synths: SynthChannelId::ALL.map(|ch| MelodicSynth::new(ch.synth_type(), sample_rate)),
            master: MasterBus::new(sample_rate),
            samples_rendered: 0,
        }
    }

    /// Current audio-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.samples_rendered as f64 / self.sample_rate
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn master(&mut self) -> &mut MasterBus {
        &mut self.master
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn current_step(&self) -> usize {
        self.scheduler.current_step()
    }

    /// Start playback from step 0.
    pub fn play(&mut self) {
        self.scheduler.set_bpm(self.session.bpm());
        let now = self.now();
        self.scheduler.start(now);
        log::info!("playback started at {:.0} BPM", self.session.bpm());
    }

    /// Stop playback; the next play restarts from step 0. Ringing tails
    /// keep sounding.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        log::info!("playback stopped");
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.session.set_bpm(bpm);
        self.scheduler.set_bpm(self.session.bpm());
    }

    /// How long after its trigger a note of the given step duration is
    /// released, at the current tempo.
    pub fn release_offset(&self, duration: u8) -> f64 {
        self.scheduler.step_duration() * duration as f64 * GATE_FRACTION
    }

    /// Play a note live on the active synth. Returns the handle for
    /// [`AudioEngine::key_up`].
    pub fn key_down(&mut self, pitch_class: PitchClass, octave: i8) -> VoiceId {
        let frequency = crate::pattern::note_frequency(pitch_class, octave);
        let now = self.now();
        self.synths[self.session.active_synth().index()].trigger_attack(frequency, now)
    }

    /// Release a live note.
    pub fn key_up(&mut self, id: VoiceId) {
        let now = self.now();
        self.synths[self.session.active_synth().index()].trigger_release(id, now);
    }

    /// Set a drum channel parameter by persisted names. Unknown channel or
    /// parameter names are logged and ignored.
    pub fn set_drum_param(&mut self, channel: &str, param: &str, value: f64) {
        let Some(ch) = DrumChannelId::ALL.into_iter().find(|c| c.id_str() == channel) else {
            log::warn!("ignoring unknown drum channel {channel:?}");
            return;
        };
        let Some(param) = DrumParam::from_str(param) else {
            log::warn!("ignoring unknown drum param {param:?}");
            return;
        };
        self.drums[ch.index()].set_param(param, value);
    }

    /// Set a synth channel parameter by persisted names. Unknown channel or
    /// parameter names are logged and ignored.
    pub fn set_synth_param(&mut self, channel: &str, param: &str, value: f64) {
        let Some(ch) = SynthChannelId::ALL.into_iter().find(|c| c.id_str() == channel) else {
            log::warn!("ignoring unknown synth channel {channel:?}");
            return;
        };
        let Some(param) = SynthParam::from_str(param) else {
            log::warn!("ignoring unknown synth param {param:?}");
            return;
        };
        self.synths[ch.index()].set_param(param, value);
    }

    /// Set a master-bus control from a normalized 0..1 knob value. Unknown
    /// names are logged and ignored.
    pub fn set_master_param(&mut self, name: &str, value: f64) {
        let v = value.clamp(0.0, 1.0);
        match name {
            "volume" => self.master.set_volume(v),
            "delay" => self.master.set_delay_wet(v),
            "delay_time" => self.master.set_delay_time(v),
            "delay_feedback" => self.master.set_delay_feedback(v),
            "chorus" => self.master.set_chorus_wet(v),
            "chorus_speed" => self.master.set_chorus_speed(v * 10.0),
            "flanger" => self.master.set_flanger_wet(v),
            "flanger_speed" => self.master.set_flanger_speed(v * 2.0),
            "flanger_feedback" => self.master.set_flanger_feedback(v * 0.9),
            "reverb" => self.master.set_reverb_wet(v),
            "tremolo_speed" => self.master.set_tremolo_speed(v * 20.0),
            "tremolo_depth" => self.master.set_tremolo_depth(v),
            "eq_low" => self.master.set_eq_low((v - 0.5) * 24.0),
            "eq_mid" => self.master.set_eq_mid((v - 0.5) * 24.0),
            "eq_high" => self.master.set_eq_high((v - 0.5) * 24.0),
            "crush" => self.master.set_bitcrush_mix(v),
            "drone" => self.master.set_drone_level(v),
            "drone_freq" => self.master.set_drone_frequency(v * 100.0 + 30.0),
            _ => log::warn!("ignoring unknown master param {name:?}"),
        }
    }

    pub fn save_drum_patterns(&self) -> Result<String, StepwaveError> {
        persist::save_drum_patterns(&self.session)
    }

    pub fn save_melodic_patterns(&self) -> Result<String, StepwaveError> {
        persist::save_melodic_patterns(&self.session)
    }

    pub fn load_drum_patterns(&mut self, json: &str) {
        persist::load_drum_patterns(&mut self.session, json);
    }

    pub fn load_melodic_patterns(&mut self, json: &str) {
        persist::load_melodic_patterns(&mut self.session, json);
    }

    /// Trigger everything the pattern row holds for one step.
    fn dispatch_step(&mut self, step: usize, time: f64) {
        for ch in DrumChannelId::ALL {
            if self.session.audible(ChannelId::Drum(ch)) && self.session.drum_pattern(ch).get(step)
            {
                self.drums[ch.index()].trigger(time);
            }
        }

        let step_dur = self.scheduler.step_duration();
        for ch in SynthChannelId::ALL {
            if !self.session.audible(ChannelId::Synth(ch)) {
                continue;
            }
            if let Some(note) = self.session.melodic_pattern(ch).get(step) {
                let synth = &mut self.synths[ch.index()];
                let id = synth.trigger_attack(note.frequency(), time);
                let release = time + step_dur * note.duration as f64 * GATE_FRACTION;
                synth.trigger_release(id, release);
            }
        }
    }

    /// Render one block of mono samples, advancing the audio clock.
    pub fn process_block(&mut self, out: &mut [f32]) {
        // Collect due steps before rendering so dispatch can borrow the
        // whole engine.
        let now = self.now();
        let mut due: Vec<(usize, f64)> = Vec::new();
        self.scheduler.tick(now, |step, time| due.push((step, time)));
        for (step, time) in due {
            self.dispatch_step(step, time);
        }

        for sample in out.iter_mut() {
            let t = self.samples_rendered as f64 / self.sample_rate;

            let mut melodic = 0.0;
            for synth in self.synths.iter_mut() {
                melodic += synth.process(t);
            }
            let mut drums = 0.0;
            for channel in self.drums.iter_mut() {
                drums += channel.next_sample(t);
            }

            *sample = self.master.process(melodic as f32, drums as f32);
            self.samples_rendered += 1;
        }

        let t = self.now();
        for synth in self.synths.iter_mut() {
            synth.cleanup(t);
        }
        for channel in self.drums.iter_mut() {
            channel.cleanup(t);
        }
    }

    /// Render the given number of seconds and return the mono samples.
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let total = (seconds * self.sample_rate) as usize;
        let mut out = vec![0.0; total];
        for chunk in out.chunks_mut(256) {
            self.process_block(chunk);
        }
        out
    }
}
