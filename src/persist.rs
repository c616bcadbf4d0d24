//! Pattern persistence — flat JSON records keyed by channel id.
//!
//! Two records mirror the original stored form: drum rows as arrays of 0/1
//! flags, melodic rows as arrays of optional note objects. Loading is
//! tolerant by design: malformed input is logged and ignored, unknown
//! channel ids are skipped, missing ids keep their defaults.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::StepwaveError;
use crate::pattern::{DrumPattern, MelodicPattern, Note, PATTERN_STEPS};
use crate::session::{DrumChannelId, Session, SynthChannelId};

/// Serialize the drum patterns to the flat record form.
pub fn save_drum_patterns(session: &Session) -> Result<String, StepwaveError> {
    let mut record: BTreeMap<&str, Vec<u8>> = BTreeMap::new();
    for ch in DrumChannelId::ALL {
        record.insert(ch.id_str(), session.drum_pattern(ch).to_flags());
    }
    Ok(serde_json::to_string(&record)?)
}

/// Serialize the melodic patterns to the flat record form.
pub fn save_melodic_patterns(session: &Session) -> Result<String, StepwaveError> {
    let mut record: BTreeMap<&str, Vec<Option<Note>>> = BTreeMap::new();
    for ch in SynthChannelId::ALL {
        record.insert(ch.id_str(), session.melodic_pattern(ch).to_row());
    }
    Ok(serde_json::to_string(&record)?)
}

/// Restore drum patterns from a persisted record.
///
/// Never fails: a decode error keeps all defaults, a bad row keeps that
/// channel's default.
pub fn load_drum_patterns(session: &mut Session, json: &str) {
    let record: HashMap<String, Vec<u8>> = match serde_json::from_str(json) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("drum pattern record unreadable, keeping defaults: {e}");
            return;
        }
    };
    for ch in DrumChannelId::ALL {
        if let Some(flags) = record.get(ch.id_str()) {
            match DrumPattern::from_flags(flags) {
                Some(p) => *session.drum_pattern_mut(ch) = p,
                None => log::warn!(
                    "drum row '{}' has {} steps, expected {PATTERN_STEPS}; ignored",
                    ch.id_str(),
                    flags.len()
                ),
            }
        }
    }
}

/// Restore melodic patterns from a persisted record. Same tolerance as
/// [`load_drum_patterns`]; note durations clamp into 1..=8.
pub fn load_melodic_patterns(session: &mut Session, json: &str) {
    let record: HashMap<String, Vec<Option<Note>>> = match serde_json::from_str(json) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("melodic pattern record unreadable, keeping defaults: {e}");
            return;
        }
    };
    for ch in SynthChannelId::ALL {
        if let Some(row) = record.get(ch.id_str()) {
            match MelodicPattern::from_row(row) {
                Some(p) => *session.melodic_pattern_mut(ch) = p,
                None => log::warn!(
                    "melodic row '{}' has {} steps, expected {PATTERN_STEPS}; ignored",
                    ch.id_str(),
                    row.len()
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PitchClass;

    fn edited_session() -> Session {
        let mut s = Session::new();
        s.toggle_drum_step(DrumChannelId::Kick, 0);
        s.toggle_drum_step(DrumChannelId::Kick, 8);
        s.toggle_drum_step(DrumChannelId::Hat, 2);
        s.set_melodic_step(SynthChannelId::Rhodes, 0, Note::new(PitchClass::C, 4, 2));
        s.set_melodic_step(SynthChannelId::Pad, 16, Note::new(PitchClass::Fs, 2, 8));
        s
    }

    #[test]
    fn round_trip_reproduces_patterns() {
        let original = edited_session();
        let drums = save_drum_patterns(&original).unwrap();
        let melodic = save_melodic_patterns(&original).unwrap();

        let mut restored = Session::new();
        load_drum_patterns(&mut restored, &drums);
        load_melodic_patterns(&mut restored, &melodic);

        for ch in DrumChannelId::ALL {
            assert_eq!(
                restored.drum_pattern(ch),
                original.drum_pattern(ch),
                "drum row {} should round-trip",
                ch.id_str()
            );
        }
        for ch in SynthChannelId::ALL {
            assert_eq!(
                restored.melodic_pattern(ch),
                original.melodic_pattern(ch),
                "melodic row {} should round-trip",
                ch.id_str()
            );
        }
    }

    #[test]
    fn note_serialized_form_matches_stored_shape() {
        let mut s = Session::new();
        s.set_melodic_step(SynthChannelId::Rhodes, 0, Note::new(PitchClass::Cs, 3, 4));
        let json = save_melodic_patterns(&s).unwrap();
        assert!(
            json.contains(r#""note":"C#""#),
            "pitch class should use the display spelling: {json}"
        );
        assert!(json.contains(r#""octave":3"#));
        assert!(json.contains(r#""duration":4"#));
    }

    #[test]
    fn malformed_json_keeps_defaults() {
        let mut s = Session::new();
        load_drum_patterns(&mut s, "{not json");
        load_melodic_patterns(&mut s, "[1,2,3");
        for ch in DrumChannelId::ALL {
            assert_eq!(*s.drum_pattern(ch), DrumPattern::default());
        }
    }

    #[test]
    fn unknown_channel_ids_ignored() {
        let mut s = Session::new();
        let json = format!(r#"{{"cowbell": {:?}}}"#, vec![1u8; PATTERN_STEPS]);
        load_drum_patterns(&mut s, &json);
        for ch in DrumChannelId::ALL {
            assert_eq!(*s.drum_pattern(ch), DrumPattern::default());
        }
    }

    #[test]
    fn wrong_length_row_ignored() {
        let mut s = Session::new();
        load_drum_patterns(&mut s, r#"{"kick": [1, 0, 1]}"#);
        assert_eq!(*s.drum_pattern(DrumChannelId::Kick), DrumPattern::default());
    }

    #[test]
    fn partial_record_keeps_missing_channels_default() {
        let original = edited_session();
        let full = save_drum_patterns(&original).unwrap();

        // Strip everything but the kick row.
        let parsed: HashMap<String, Vec<u8>> = serde_json::from_str(&full).unwrap();
        let partial =
            serde_json::to_string(&BTreeMap::from([("kick", parsed["kick"].clone())])).unwrap();

        let mut restored = Session::new();
        load_drum_patterns(&mut restored, &partial);
        assert_eq!(
            restored.drum_pattern(DrumChannelId::Kick),
            original.drum_pattern(DrumChannelId::Kick)
        );
        assert_eq!(
            *restored.drum_pattern(DrumChannelId::Hat),
            DrumPattern::default()
        );
    }

    #[test]
    fn oversized_duration_clamped_on_load() {
        let mut s = Session::new();
        let mut row: Vec<Option<Note>> = vec![None; PATTERN_STEPS];
        row[0] = Some(Note {
            pitch_class: PitchClass::A,
            octave: 2,
            duration: 2,
        });
        let mut json = serde_json::to_string(&BTreeMap::from([("lead", row)])).unwrap();
        json = json.replace(r#""duration":2"#, r#""duration":99"#);

        load_melodic_patterns(&mut s, &json);
        assert_eq!(
            s.melodic_pattern(SynthChannelId::Lead).get(0).unwrap().duration,
            crate::pattern::MAX_DURATION
        );
    }
}
