use tempo_envelope_core::{
    shared, BeatEnvelope, BeatEnvelopeBuilder, BeatModulator, Clock, EasingCurve, Subscriber,
};

const FPS: f64 = 60.0;

#[test]
fn clock_drives_envelopes_and_modulators_together() {
    let mut builder = BeatEnvelopeBuilder::new();
    builder.segment(0.0, 1.0, 0.0, 1.0).unwrap();
    builder.segment(1.0, 2.0, 1.0, 0.0).unwrap();
    let triangle = shared(builder.build(120.0, 2.0).unwrap());

    let mut modulator = BeatModulator::default();
    modulator
        .set(0, Some(BeatEnvelope::new(120.0, 2.0, |_| 1.0).unwrap()))
        .unwrap();
    modulator
        .push_transition([(0, 1.0)], 1.0, EasingCurve::Linear)
        .unwrap();
    let modulator = shared(modulator);

    let mut clock = Clock::new();
    let triangle_sub: Subscriber = triangle.clone();
    let modulator_sub: Subscriber = modulator.clone();
    clock.add([triangle_sub, modulator_sub]);

    for _ in 0..30 {
        clock.advance(1.0 / FPS);
    }

    // Half a second at 120 bpm is one beat: the top of the triangle.
    let phase = triangle.borrow().phase();
    assert!((phase - 1.0).abs() < 1e-9, "phase {phase}");
    let mixed = modulator.borrow_mut().sample(0.0);
    assert!((mixed - 0.5).abs() < 1e-9, "mixed {mixed}");

    for _ in 0..60 {
        clock.advance(1.0 / FPS);
    }
    assert_eq!(modulator.borrow_mut().sample(0.0), 1.0);
    assert_eq!(clock.frame_count(), 90);
}

#[test]
fn toggling_pauses_a_subscriber() {
    let envelope = shared(BeatEnvelope::new(60.0, 4.0, |phase| phase).unwrap());
    let subscriber: Subscriber = envelope.clone();
    let mut clock = Clock::new();
    clock.add([subscriber.clone()]);

    clock.advance(1.0);
    clock.toggle([subscriber.clone()]);
    clock.advance(1.0);
    assert_eq!(envelope.borrow().phase(), 1.0);

    clock.toggle([subscriber]);
    clock.advance(1.0);
    assert_eq!(envelope.borrow().phase(), 2.0);
}

#[test]
fn replacing_a_source_swaps_what_gets_ticked() {
    let first = shared(BeatEnvelope::new(60.0, 4.0, |phase| phase).unwrap());
    let second = shared(first.borrow().copy(Default::default()).unwrap());
    let first_sub: Subscriber = first.clone();
    let second_sub: Subscriber = second.clone();

    let mut clock = Clock::new();
    clock.add([first_sub.clone()]);
    assert!(clock.replace(&first_sub, second_sub));

    clock.advance(1.5);
    assert_eq!(first.borrow().phase(), 0.0);
    assert_eq!(second.borrow().phase(), 1.5);
}

#[test]
fn disabling_the_clock_pauses_every_subscriber() {
    let first = shared(BeatEnvelope::new(60.0, 4.0, |phase| phase).unwrap());
    let second = shared(BeatEnvelope::new(120.0, 4.0, |phase| phase).unwrap());
    let first_sub: Subscriber = first.clone();
    let second_sub: Subscriber = second.clone();
    let mut clock = Clock::new();
    clock.add([first_sub, second_sub]);

    clock.advance(0.5);
    clock.set_enabled(false);
    for _ in 0..10 {
        clock.advance(1.0);
    }
    assert_eq!(first.borrow().phase(), 0.5);
    assert_eq!(second.borrow().phase(), 1.0);
    assert_eq!(clock.frame_count(), 1);

    clock.set_enabled(true);
    clock.advance(0.5);
    assert_eq!(first.borrow().phase(), 1.0);
    assert_eq!(second.borrow().phase(), 2.0);
}
