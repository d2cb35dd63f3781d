use rustfdtdsynth::synth::visual;
use rustfdtdsynth::synth::voice_config::VoiceConfig;
use rustfdtdsynth::synth::{PlayableVoice, StringVoice};

const SAMPLE_RATE: f32 = 48_000.0;

fn render(voice: &mut StringVoice, samples: usize) {
    let mut output = vec![vec![0.0; samples]];
    voice.render(&mut output, 0, samples);
}

fn prepared_voice() -> StringVoice {
    let mut voice = StringVoice::new(VoiceConfig::default());
    voice.prepare(SAMPLE_RATE).unwrap();
    voice
}

#[test]
fn test_snapshot_follows_note_lifecycle() {
    let mut voice = prepared_voice();
    assert!(voice.visualization_snapshot().is_empty());
    assert_eq!(voice.current_register(), None);

    voice.note_on(440.0, 1.0, 0);
    assert_eq!(voice.current_register(), Some(15));
    assert_eq!(voice.current_fret(), Some(4));

    render(&mut voice, 512);
    let points = voice.parameters().unwrap().points();
    assert_eq!(voice.visualization_snapshot().len(), points);

    voice.note_off(0.0, true);
    while voice.is_active() {
        render(&mut voice, 256);
    }
    assert!(voice.visualization_snapshot().is_empty());
    assert_eq!(voice.current_register(), None);
    assert_eq!(voice.current_fret(), None);
}

#[test]
fn test_observer_on_another_thread() {
    let mut voice = prepared_voice();
    let mut observer = voice.take_observer().unwrap();
    assert!(voice.take_observer().is_none());

    voice.note_on(220.0, 1.0, 0);
    render(&mut voice, 1_000);
    let points = voice.parameters().unwrap().points();

    let (observer, seen) = std::thread::spawn(move || {
        let seen = observer
            .snapshot()
            .map(|frame| (frame.register(), frame.fret(), frame.displacement().len()));
        (observer, seen)
    })
    .join()
    .unwrap();

    let (register, fret) = visual_position(220.0);
    assert_eq!(seen, Some((register, fret, points)));
    drop(observer);
}

fn visual_position(frequency: f32) -> (usize, i32) {
    rustfdtdsynth::synth::strings::select_register(frequency, 1)
}

#[test]
fn test_observer_sees_nothing_once_idle() {
    let mut voice = prepared_voice();
    let mut observer = voice.take_observer().unwrap();
    assert!(observer.snapshot().is_none());

    voice.note_on(330.0, 1.0, 0);
    render(&mut voice, 400);
    assert!(observer.snapshot().is_some());

    voice.note_off(0.0, true);
    while voice.is_active() {
        render(&mut voice, 256);
    }
    assert!(observer.snapshot().is_none());
}

#[test]
fn test_observer_drops_frames_of_previous_note() {
    let mut voice = prepared_voice();
    let mut observer = voice.take_observer().unwrap();

    voice.note_on(330.0, 1.0, 0);
    render(&mut voice, 400);
    assert!(observer.snapshot().is_some());

    // New note, nothing captured for it yet.
    voice.note_on(660.0, 1.0, 0);
    assert!(observer.snapshot().is_none());

    render(&mut voice, 1);
    let frame = observer.snapshot().unwrap();
    assert_eq!(frame.register(), visual_position(660.0).0);
}

#[test]
fn test_sampler_survives_unread_frames() {
    let mut voice = prepared_voice();
    let mut observer = voice.take_observer().unwrap();

    voice.note_on(261.6, 1.0, 0);
    // Far more captures than the frame pool holds.
    render(&mut voice, 20_000);
    assert!(voice.is_active());

    let frame = observer.snapshot().unwrap();
    assert_eq!(frame.displacement().len(), voice.parameters().unwrap().points());
}

#[test]
fn test_capture_interval() {
    let (mut sampler, mut observer) = visual::channel(200, 16);
    sampler.begin(2, 5);

    let shape = [0.0, 1.0, 2.0, 0.0];
    sampler.tick(&shape);
    assert_eq!(sampler.snapshot(), &shape);

    // Next capture is 200 samples later.
    let moved = [0.0, 3.0, 4.0, 0.0];
    for _ in 0..199 {
        sampler.tick(&moved);
    }
    assert_eq!(sampler.snapshot(), &shape);
    sampler.tick(&moved);
    assert_eq!(sampler.snapshot(), &moved);

    let frame = observer.snapshot().unwrap();
    assert_eq!(frame.displacement(), &moved);
    assert_eq!((frame.register(), frame.fret()), (2, 5));

    sampler.clear();
    assert!(sampler.snapshot().is_empty());
    assert!(observer.snapshot().is_none());
}

#[test]
fn test_snapshot_lines_up_with_output() {
    let mut voice = prepared_voice();
    voice.note_on(293.7, 1.0, 0);
    let read_index = voice.parameters().unwrap().read_index;

    // Captures land on samples 0 and 200.
    let mut output = vec![vec![0.0; 201]];
    voice.render(&mut output, 0, 201);

    let snapshot = voice.visualization_snapshot();
    assert_eq!(snapshot[read_index], output[0][200]);
    assert_ne!(output[0][200], 0.0);
}
