use rustfdtdsynth::synth::excitation::{synthesize, ExcitationShape};
use rustfdtdsynth::synth::string_model::StringModel;
use rustfdtdsynth::synth::strings::{
    map_frequency, MappingInput, PhysicalParameters, MAX_LOSS_PER_SAMPLE,
};

const SAMPLE_RATE: f32 = 48_000.0;

fn mapping_input(stiffness: Option<f32>) -> MappingInput {
    MappingInput {
        sample_rate: SAMPLE_RATE,
        tension: 1.0,
        sustain: 1.0,
        playing_position: 1,
        pluck_position: 0.6,
        read_position: 0.8,
        stiffness,
        note_off_damping: 200.0,
    }
}

fn excited_model(frequency: f32, stiffness: Option<f32>) -> (StringModel, PhysicalParameters) {
    let params = map_frequency(frequency, &mapping_input(stiffness)).unwrap();
    let mut profile = Vec::new();
    synthesize(ExcitationShape::Projectile, 1.0, &params, &mut profile);

    let mut model = StringModel::with_capacity(params.points());
    model.excite(&params, &profile);
    (model, params)
}

fn peak(values: &[f32]) -> f32 {
    values.iter().fold(0.0f32, |m, v| m.max(v.abs()))
}

#[test]
fn test_initial_state_is_velocity_times_dt() {
    let params = map_frequency(220.0, &mapping_input(None)).unwrap();
    let mut profile = Vec::new();
    synthesize(ExcitationShape::Uniform, 0.5, &params, &mut profile);

    let mut model = StringModel::with_capacity(params.points());
    model.excite(&params, &profile);

    assert_eq!(model.segments(), params.segments);
    for (u, v) in model.displacement().iter().zip(&profile) {
        assert_eq!(*u, v * params.dt);
    }
}

#[test]
fn test_endpoints_stay_fixed() {
    let (mut model, params) = excited_model(440.0, None);
    for _ in 0..10_000 {
        model.step();
        let u = model.displacement();
        assert_eq!(u.len(), params.points());
        assert_eq!(u[0], 0.0);
        assert_eq!(u[params.segments], 0.0);
    }
}

#[test]
fn test_step_taps_read_point_before_advancing() {
    let (mut model, params) = excited_model(330.0, None);
    for _ in 0..500 {
        let before = model.displacement()[params.read_index];
        assert_eq!(model.step(), before);
    }
}

#[test]
fn test_simulation_stays_bounded() {
    for frequency in [65.4, 146.8, 440.0, 1046.0] {
        let (mut model, _) = excited_model(frequency, None);
        for _ in 0..48_000 {
            assert!(model.step().is_finite());
        }
        assert!(peak(model.displacement()) < 10.0, "{frequency} Hz grew unbounded");
    }
}

#[test]
fn test_released_string_stays_bounded() {
    for frequency in [110.0, 440.0, 1046.0] {
        let (mut model, _) = excited_model(frequency, None);
        for _ in 0..1_000 {
            model.step();
        }
        model.scale_damping(200.0);
        let mut max_after = 0.0f32;
        for _ in 0..20_000 {
            max_after = max_after.max(model.step().abs());
        }
        assert!(max_after.is_finite() && max_after < 10.0, "{frequency} Hz");
        assert!(peak(model.displacement()) < 1e-3);
    }
}

#[test]
fn test_stiff_string_stays_bounded() {
    let (mut model, params) = excited_model(440.0, Some(1.0));
    assert!(params.stiffness.is_some());
    for _ in 0..20_000 {
        assert!(model.step().is_finite());
    }
    assert!(peak(model.displacement()) < 10.0);
    assert_eq!(model.displacement()[0], 0.0);
}

#[test]
fn test_scale_damping_is_capped() {
    let (mut model, params) = excited_model(440.0, None);
    let s0 = model.uniform_loss();
    assert_eq!(s0, params.uniform_loss);

    model.scale_damping(200.0);
    assert!((model.uniform_loss() - s0 * 200.0).abs() < 1e-2);

    model.scale_damping(1e9);
    assert!(model.uniform_loss() * params.dt <= MAX_LOSS_PER_SAMPLE + 1e-6);
}

#[test]
fn test_identical_runs_are_identical() {
    let (mut a, _) = excited_model(523.25, None);
    let (mut b, _) = excited_model(523.25, None);
    for _ in 0..5_000 {
        assert_eq!(a.step().to_bits(), b.step().to_bits());
    }
}
