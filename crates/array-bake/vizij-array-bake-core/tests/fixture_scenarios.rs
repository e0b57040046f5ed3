use approx::assert_relative_eq;
use nalgebra::Vector3;
use serde::Deserialize;
use vizij_array_bake_core::{
    decompose, export_baked_json, plan_bake, BakeConfig, BakeError, BakedTracks, BakingPipeline,
    FrameEvaluator, FrameRange, RotationPolicy, RotationValue, SampledEvaluator, SourceObject,
    TransformSample,
};
use vizij_test_fixtures::{bakes, sources};

#[derive(Debug, Deserialize)]
struct Scenario {
    config: BakeConfig,
    base: SampledEvaluator,
    offset: SampledEvaluator,
    /// Per-instance translation, identical on every frame.
    #[serde(default)]
    expected_translations: Option<Vec<[f64; 3]>>,
}

fn load(name: &str) -> Scenario {
    bakes::load(name).unwrap_or_else(|e| panic!("fixture {name}: {e:#}"))
}

fn run(scenario: &Scenario) -> Result<Vec<TransformSample>, BakeError> {
    let mut out = Vec::new();
    BakingPipeline::bake_config(&scenario.config, &scenario.base, &scenario.offset, &mut out)?;
    Ok(out)
}

#[test]
fn sampled_tables_cover_their_bake_range() {
    for name in bakes::keys() {
        let scenario = load(&name);
        let range = scenario.config.range();
        for (label, table) in [("base", &scenario.base), ("offset", &scenario.offset)] {
            table
                .require_coverage(label, range)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }
}

#[test]
fn static_translate_matches_expected_positions() {
    let scenario = load("static-translate");
    let out = run(&scenario).unwrap();
    let expected = scenario.expected_translations.as_ref().unwrap();
    let count = scenario.config.count as usize;
    assert_eq!(expected.len(), count);
    assert_eq!(out.len(), scenario.config.range().len() * count);

    for s in &out {
        let want = expected[s.instance];
        let got = s.transform.translation;
        assert_relative_eq!(got.x, want[0], epsilon = 1e-12);
        assert_relative_eq!(got.y, want[1], epsilon = 1e-12);
        assert_relative_eq!(got.z, want[2], epsilon = 1e-12);
    }
}

#[test]
fn spin_z_stays_continuous_for_every_instance() {
    let scenario = load("spin-z");
    let out = run(&scenario).unwrap();
    let count = scenario.config.count as usize;
    for instance in 0..count {
        let stream: Vec<_> = out.iter().filter(|s| s.instance == instance).collect();
        for pair in stream.windows(2) {
            let d = pair[0]
                .transform
                .rotation
                .coords
                .dot(&pair[1].transform.rotation.coords);
            assert!(d >= 0.0, "instance {instance} at frame {}", pair[1].frame);
        }
        for s in &stream {
            match s.rotation {
                RotationValue::Quat(q) => {
                    assert_eq!(q, s.transform.rotation_xyzw());
                }
                other => panic!("unexpected rotation value {other:?}"),
            }
        }
    }
}

#[test]
fn orbit_scaled_keeps_base_scale_on_every_instance() {
    let scenario = load("orbit-scaled");
    let out = run(&scenario).unwrap();
    // base and offset both carry S2, so the delta is rigid and scale stays 2
    for s in &out {
        assert_relative_eq!(s.transform.scale, Vector3::repeat(2.0), epsilon = 1e-9);
    }

    // instance 1 lands exactly on the offset object
    for s in out.iter().filter(|s| s.instance == 1) {
        let offset = decompose(&scenario.offset.evaluate(s.frame));
        assert_relative_eq!(s.transform.translation, offset.translation, epsilon = 1e-9);
        assert_relative_eq!(s.transform.scale, offset.scale, epsilon = 1e-9);
        assert!(s.transform.to_affine().max_abs_diff(&offset.to_affine()) < 1e-9);
    }
}

#[test]
fn degenerate_midrange_aborts_before_emitting() {
    let scenario = load("degenerate-midrange");
    let mut tracks = BakedTracks::new(scenario.config.rotation);
    let err = BakingPipeline::bake_config(
        &scenario.config,
        &scenario.base,
        &scenario.offset,
        &mut tracks,
    )
    .unwrap_err();
    assert!(matches!(err, BakeError::DegenerateTransform { frame: 3, .. }));
    assert_eq!(tracks.sample_count(), 0);
}

#[test]
fn euler_policy_exports_angle_tracks() {
    let mut scenario = load("spin-z");
    scenario.config.rotation = RotationPolicy::Euler;
    let mut tracks = BakedTracks::new(RotationPolicy::Euler);
    let summary = BakingPipeline::bake_config(
        &scenario.config,
        &scenario.base,
        &scenario.offset,
        &mut tracks,
    )
    .unwrap();
    assert_eq!(tracks.sample_count(), summary.samples_emitted);

    // instance 1 spins 30 degrees per frame; unwrapped Z must keep climbing
    let track = tracks.instance(1).unwrap();
    let z: Vec<f64> = track
        .rotation
        .iter()
        .map(|r| match r {
            RotationValue::Euler(e) => e[2],
            other => panic!("expected euler, got {other:?}"),
        })
        .collect();
    for pair in z.windows(2) {
        assert_relative_eq!(pair[1] - pair[0], 30f64.to_radians(), epsilon = 1e-9);
    }

    let json = export_baked_json(&tracks);
    assert_eq!(json["policy"], "euler");
    assert_eq!(json["instances"][1]["rotation"][0]["type"], "euler");
    assert_eq!(
        json["instances"].as_array().unwrap().len(),
        scenario.config.count as usize
    );
}

#[test]
fn source_fixtures_plan_or_fail_with_the_right_error() {
    let range = FrameRange::new(1, 250).unwrap();

    let cube: SourceObject = sources::load("cube-array").unwrap();
    let plan = plan_bake(Some(&cube), range).unwrap();
    assert_eq!(plan.source, "Cube");
    assert_eq!(plan.offset_object, "Empty");
    assert_eq!(plan.count, 4);

    let lonely: SourceObject = sources::load("cube-no-offset").unwrap();
    assert_eq!(
        plan_bake(Some(&lonely), range),
        Err(BakeError::MissingOffset {
            object: "Cube".into()
        })
    );
}
