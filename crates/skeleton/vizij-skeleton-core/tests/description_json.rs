use std::sync::Arc;

use approx::assert_abs_diff_eq;
use vizij_skeleton_core::{
    parse_keyframe_clip_json, parse_state_machine_json, AnimationClip, ChannelController,
    ClipLibrary, DescriptionError, JointId, StateMachineController, StateMotion, TransitionSource,
};

fn load_clips(names: &[String]) -> ClipLibrary {
    let mut lib = ClipLibrary::new();
    for name in names {
        let json = vizij_test_fixtures::clips::json(name).expect("load clip fixture");
        let clip = parse_keyframe_clip_json(&json).expect("parse clip fixture");
        lib.insert(clip).expect("unique clip names");
    }
    lib
}

fn greeter() -> (Arc<ClipLibrary>, StateMachineController) {
    let names = vizij_test_fixtures::state_machines::clip_names("greeter").expect("clip names");
    let clips = Arc::new(load_clips(&names));
    let json = vizij_test_fixtures::state_machines::json("greeter").expect("greeter fixture");
    let desc = parse_state_machine_json(&json, &clips).expect("parse greeter");
    let controller = StateMachineController::new(Arc::new(desc), clips.clone(), [JointId(0)])
        .expect("greeter controller");
    (clips, controller)
}

#[test]
fn clip_fixtures_parse_and_sample() {
    let json = vizij_test_fixtures::clips::json("wave").expect("wave fixture");
    let wave = parse_keyframe_clip_json(&json).expect("parse wave");
    assert_abs_diff_eq!(wave.duration(), 1.5, epsilon = 1e-6);
    let peak = wave.sample(JointId(2), 0.75);
    assert_abs_diff_eq!(peak.rotation[2], 0.382_683_43, epsilon = 1e-6);
    assert_abs_diff_eq!(wave.sample(JointId(3), 1.0).translation[0], 0.4, epsilon = 1e-6);
}

#[test]
fn greeter_description_resolves_states_and_edges() {
    let (clips, c) = greeter();
    let desc = c.description();
    assert_eq!(desc.states().count(), 4);
    assert_eq!(desc.transitions().len(), 7);
    assert_eq!(desc.default_state().map(|s| s.name.as_str()), Ok("idle"));

    let rest = desc.state_by_name("rest").expect("rest state");
    assert_eq!(rest.motion, StateMotion::Rest);
    let wave = desc.state_by_name("wave").expect("wave state");
    assert_eq!(wave.motion, StateMotion::Clip(clips.id_of("wave").expect("wave clip")));

    let nod = desc.resolve("nod").expect("nod");
    let into_nod = desc
        .transitions()
        .iter()
        .find(|t| t.target == nod)
        .expect("edge into nod");
    assert_eq!(into_nod.source, TransitionSource::Any);
    assert!(!into_nod.trigger_on_animation_end);
}

#[test]
fn greeter_runs_wave_then_returns_to_idle() {
    let (_clips, mut c) = greeter();
    assert_eq!(c.request_transition("wave"), Ok(true));
    assert_eq!(c.active_state().name, "wave");

    // wave is 1.5s with a 0.5s automatic hand-back to idle.
    for _ in 0..4 {
        c.update(0.25);
    }
    assert_eq!(c.active_state().name, "wave");
    c.update(0.25);
    assert_eq!(c.active_state().name, "idle");
    assert_abs_diff_eq!(c.channel().transition_time(), 0.5, epsilon = 1e-6);
}

#[test]
fn greeter_idle_loops_through_its_own_automatic_edge() {
    let (_clips, mut c) = greeter();
    for _ in 0..4 {
        c.update(0.5);
    }
    assert_eq!(c.active_state().name, "idle");
    assert!(c.channel().previous_layer().is_none());
    assert_abs_diff_eq!(c.channel().current_time(), 0.5, epsilon = 1e-6);
    assert_eq!(c.inter_channel_fade_intensity(), 1.0);
}

#[test]
fn head_only_machine_parks_in_still_after_one_nod() {
    let clips = Arc::new(load_clips(&["nod".to_string()]));
    let json = vizij_test_fixtures::state_machines::json("head-only").expect("head-only fixture");
    let desc = parse_state_machine_json(&json, &clips).expect("parse head-only");
    let mut c = StateMachineController::new(Arc::new(desc), clips, [JointId(0)])
        .expect("head-only controller");

    assert_eq!(c.active_state().name, "nodding");
    c.update(0.5);
    c.update(0.5);
    assert_eq!(c.active_state().name, "nodding");
    c.update(0.1);
    assert_eq!(c.active_state().name, "still");
    assert!(!c.channel().is_active());
    assert_eq!(c.request_transition("nodding"), Ok(true));
}

#[test]
fn missing_clip_reference_is_rejected() {
    let clips = load_clips(&["idle".to_string()]);
    let json = vizij_test_fixtures::state_machines::json("greeter").expect("greeter fixture");
    let err = parse_state_machine_json(&json, &clips).unwrap_err();
    assert!(matches!(err, DescriptionError::UnknownClip { .. }));
}
