use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::integer(30).is_ok());
}

#[test]
fn secs_to_frames_floor_is_stable_on_frame_boundaries() {
    let fps = Fps::integer(30).unwrap();
    for k in 0..300u64 {
        let secs = k as f64 / 30.0;
        assert_eq!(fps.secs_to_frames_floor(secs), k);
    }
    assert_eq!(fps.secs_to_frames_floor(f64::NAN), 0);
    assert_eq!(fps.secs_to_frames_floor(-1.0), 0);
}

#[test]
fn rational_fps_round_trips_frame_duration() {
    let fps = Fps::new(30_000, 1001).unwrap();
    assert!((fps.frames_to_secs(30_000) - 1001.0).abs() < 1e-9);
    assert!((fps.frame_duration_secs() * fps.as_f64() - 1.0).abs() < 1e-12);
}

#[test]
fn canvas_orientation() {
    assert!(Canvas { width: 720, height: 1280 }.is_portrait());
    assert!(!Canvas { width: 1280, height: 720 }.is_portrait());
}

#[test]
fn premultiply_half_alpha() {
    let c = Rgba8::rgba(0, 0, 0, 153).premultiplied();
    assert_eq!(c, [0, 0, 0, 153]);
    let w = Rgba8::rgba(255, 255, 255, 128).premultiplied();
    assert_eq!(w, [128, 128, 128, 128]);
}
