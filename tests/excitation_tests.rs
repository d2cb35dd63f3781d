use rustfdtdsynth::synth::excitation::{fundamental_amplitude, synthesize, ExcitationShape};
use rustfdtdsynth::synth::strings::{map_frequency, MappingInput, PhysicalParameters};

const SHAPES: [ExcitationShape; 4] = [
    ExcitationShape::Ramp,
    ExcitationShape::RaisedCosine,
    ExcitationShape::Uniform,
    ExcitationShape::Projectile,
];

fn params_for(frequency: f32) -> PhysicalParameters {
    let input = MappingInput {
        sample_rate: 48_000.0,
        tension: 1.0,
        sustain: 1.0,
        playing_position: 1,
        pluck_position: 0.6,
        read_position: 0.8,
        stiffness: None,
        note_off_damping: 200.0,
    };
    map_frequency(frequency, &input).unwrap()
}

#[test]
fn test_fundamental_amplitude_matches_velocity() {
    for frequency in [110.0, 440.0, 880.0] {
        let params = params_for(frequency);
        for shape in SHAPES {
            for velocity in [0.25, 0.8, 1.0] {
                let mut profile = Vec::new();
                synthesize(shape, velocity, &params, &mut profile);
                let b_n = fundamental_amplitude(&profile, &params);
                assert!(
                    (b_n - velocity).abs() <= 1e-4 * velocity.max(1.0),
                    "{shape:?} at {frequency} Hz: b_n {b_n}, velocity {velocity}"
                );
            }
        }
    }
}

#[test]
fn test_profiles_have_fixed_ends() {
    let params = params_for(261.6);
    for shape in SHAPES {
        let mut profile = Vec::new();
        synthesize(shape, 0.7, &params, &mut profile);
        assert_eq!(profile.len(), params.points());
        assert_eq!(profile[0], 0.0, "{shape:?}");
        assert_eq!(profile[params.segments], 0.0, "{shape:?}");
        assert!(profile.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_raised_cosine_peaks_at_pluck_point() {
    let params = params_for(196.0);
    let mut profile = Vec::new();
    synthesize(ExcitationShape::RaisedCosine, 1.0, &params, &mut profile);

    let peak = profile
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, params.pluck_index);
}

#[test]
fn test_ramp_rises_toward_bridge() {
    let params = params_for(330.0);
    let mut profile = Vec::new();
    synthesize(ExcitationShape::Ramp, 1.0, &params, &mut profile);

    for x in 2..params.segments {
        assert!(profile[x] > profile[x - 1]);
    }
}

#[test]
fn test_zero_velocity_is_silent() {
    let params = params_for(440.0);
    let mut profile = vec![1.0; 3];
    synthesize(ExcitationShape::Projectile, 0.0, &params, &mut profile);
    assert_eq!(profile.len(), params.points());
    assert!(profile.iter().all(|v| *v == 0.0));
}

#[test]
fn test_velocity_changes_projectile_shape() {
    let params = params_for(440.0);
    let mut hard = Vec::new();
    let mut soft = Vec::new();
    synthesize(ExcitationShape::Projectile, 1.0, &params, &mut hard);
    synthesize(ExcitationShape::Projectile, 0.2, &params, &mut soft);

    // Same fundamental scale after normalization, different shapes.
    let soft_scaled: Vec<f32> = soft.iter().map(|v| v * 5.0).collect();
    let max_diff = hard
        .iter()
        .zip(&soft_scaled)
        .fold(0.0f32, |m, (a, b)| m.max((a - b).abs()));
    assert!(max_diff > 1e-3);
}

#[test]
fn test_shape_deserializes_from_snake_case() {
    let shape: ExcitationShape = serde_json::from_str("\"raised_cosine\"").unwrap();
    assert_eq!(shape, ExcitationShape::RaisedCosine);
    assert_eq!(ExcitationShape::default(), ExcitationShape::Projectile);
}

#[test]
fn test_degenerate_projection_keeps_velocity_scaling() {
    let mut params = params_for(440.0);
    // An infinite length projects to zero on the fundamental.
    params.length = f32::INFINITY;
    let mut profile = Vec::new();
    synthesize(ExcitationShape::Uniform, 0.4, &params, &mut profile);

    assert_eq!(fundamental_amplitude(&profile, &params), 0.0);
    assert!(profile.iter().all(|v| v.is_finite()));
    assert_eq!(profile[0], 0.0);
    assert_eq!(profile[params.segments], 0.0);
    for v in &profile[1..params.segments] {
        assert_eq!(*v, 0.4);
    }
}
