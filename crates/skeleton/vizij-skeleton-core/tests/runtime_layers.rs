use std::sync::Arc;

use approx::assert_abs_diff_eq;
use vizij_skeleton_core::{
    ClipId, ClipLibrary, JointId, JointInfo, JointKey, JointTransform, KeyframeClip, Skeleton,
    SkeletonRuntime, StateMachineController, StateMachineDescription, StateMotion,
};

/// Clip holding joint 0 at `x` along +X for `duration` seconds.
fn hold(name: &str, duration: f32, x: f32) -> KeyframeClip {
    KeyframeClip::new(name, duration).with_track(
        JointId(0),
        vec![JointKey::new(0.0, JointTransform::from_translation([x, 0.0, 0.0]))],
    )
}

fn single_clip_machine(clip: ClipId) -> StateMachineDescription {
    StateMachineDescription::builder()
        .default_state("play", StateMotion::Clip(clip))
        .build()
        .expect("build")
}

fn overlay_machine(clip: ClipId) -> StateMachineDescription {
    StateMachineDescription::builder()
        .default_state("rest", StateMotion::Rest)
        .clip_state("gesture", clip)
        .transition(Some("rest"), "gesture", 1.0)
        .transition(Some("gesture"), "rest", 1.0)
        .build()
        .expect("build")
}

#[test]
fn overlay_fades_in_over_the_base_layer() {
    let mut lib = ClipLibrary::new();
    let base = lib.insert(hold("base", 10.0, 1.0)).expect("base");
    let gesture = lib.insert(hold("gesture", 10.0, 3.0)).expect("gesture");
    let clips = Arc::new(lib);

    let skel = Skeleton::from_parents(&[None, Some(0)]).expect("skeleton");
    let mut rt = SkeletonRuntime::new(skel);
    rt.add_controller(
        StateMachineController::new(
            Arc::new(single_clip_machine(base)),
            clips.clone(),
            [JointId(0)],
        )
        .expect("base controller"),
    );
    let overlay = rt.add_controller(
        StateMachineController::new(Arc::new(overlay_machine(gesture)), clips, [JointId(0)])
            .expect("overlay controller"),
    );

    rt.step(0.1).expect("step");
    let root = rt.joint_location(JointId(0)).expect("root");
    assert_abs_diff_eq!(root.translation[0], 1.0, epsilon = 1e-5);

    let c = rt.controller_mut(overlay).expect("overlay");
    assert_eq!(c.request_transition("gesture"), Ok(true));

    rt.step(0.5).expect("step");
    let root = rt.joint_location(JointId(0)).expect("root");
    assert_abs_diff_eq!(root.translation[0], 2.0, epsilon = 1e-5);

    rt.step(0.5).expect("step");
    let root = rt.joint_location(JointId(0)).expect("root");
    assert_abs_diff_eq!(root.translation[0], 3.0, epsilon = 1e-5);

    // Children follow whichever blend their parent ended up with.
    let child = rt.joint_location(JointId(1)).expect("child");
    assert_abs_diff_eq!(child.translation[0], 3.0, epsilon = 1e-5);
}

#[test]
fn controllers_over_disjoint_trees_do_not_interfere() {
    let mut lib = ClipLibrary::new();
    let body = lib.insert(hold("body", 5.0, 1.0)).expect("body");
    let prop = lib.insert(hold("prop", 5.0, -2.0)).expect("prop");
    let clips = Arc::new(lib);

    let skel = Skeleton::new(vec![
        JointInfo::new("hips", None),
        JointInfo::new("spine", Some(JointId(0))),
        JointInfo::new("prop", None)
            .with_bind_pose(JointTransform::from_translation([0.0, 0.0, 7.0])),
        JointInfo::new("prop_tip", Some(JointId(2))),
    ])
    .expect("skeleton");

    let mut rt = SkeletonRuntime::new(skel);
    rt.add_controller(
        StateMachineController::new(
            Arc::new(single_clip_machine(body)),
            clips.clone(),
            [JointId(0)],
        )
        .expect("body controller"),
    );
    rt.step(0.2).expect("step");
    // Only the body tree is driven; the prop stays at its bind pose.
    let prop_root = rt.joint_location(JointId(2)).expect("prop");
    assert_abs_diff_eq!(prop_root.translation[2], 7.0, epsilon = 1e-5);

    rt.add_controller(
        StateMachineController::new(Arc::new(single_clip_machine(prop)), clips, [JointId(2)])
            .expect("prop controller"),
    );
    rt.step(0.2).expect("step");
    let hips = rt.joint_location(JointId(0)).expect("hips");
    let prop_root = rt.joint_location(JointId(2)).expect("prop");
    assert_abs_diff_eq!(hips.translation[0], 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(prop_root.translation[0], -2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(prop_root.translation[2], 0.0, epsilon = 1e-5);
}

#[test]
fn fully_faded_stack_returns_to_bind_pose() {
    let mut lib = ClipLibrary::new();
    let gesture = lib.insert(hold("gesture", 10.0, 3.0)).expect("gesture");
    let clips = Arc::new(lib);

    let skel = Skeleton::new(vec![JointInfo::new("root", None)
        .with_bind_pose(JointTransform::from_translation([0.0, 5.0, 0.0]))])
    .expect("skeleton");
    let mut rt = SkeletonRuntime::new(skel);
    let idx = rt.add_controller(
        StateMachineController::new(Arc::new(overlay_machine(gesture)), clips, [JointId(0)])
            .expect("controller"),
    );
    rt.controller_mut(idx)
        .expect("controller")
        .force_state("gesture")
        .expect("force gesture");
    rt.step(0.1).expect("step");
    assert_abs_diff_eq!(
        rt.joint_location(JointId(0)).expect("root").translation[0],
        3.0,
        epsilon = 1e-5
    );

    rt.controller_mut(idx)
        .expect("controller")
        .request_transition("gesture")
        .expect("known state");
    let c = rt.controller_mut(idx).expect("controller");
    assert_eq!(c.request_transition("rest"), Ok(true));
    rt.step(0.5).expect("step");
    let mid = rt.joint_location(JointId(0)).expect("root");
    assert_abs_diff_eq!(mid.translation[0], 1.5, epsilon = 1e-5);
    assert_abs_diff_eq!(mid.translation[1], 2.5, epsilon = 1e-5);

    rt.step(0.6).expect("step");
    let end = rt.joint_location(JointId(0)).expect("root");
    assert_eq!(end.translation, [0.0, 5.0, 0.0]);
}
