//! Tests for TimeManager

use adoption_simulator_core_rs::TimeManager;

#[test]
fn test_time_manager_new() {
    let time = TimeManager::new(10.0, 0.5);
    assert_eq!(time.current_tick(), 0);
    assert_eq!(time.current_time(), 10.0);
    assert_eq!(time.start_time(), 10.0);
    assert_eq!(time.tick_length(), 0.5);
}

#[test]
fn test_advance_tick() {
    let mut time = TimeManager::new(0.0, 1.0);

    time.advance_tick();
    assert_eq!(time.current_tick(), 1);
    assert_eq!(time.current_time(), 1.0);

    time.advance_tick();
    assert_eq!(time.current_tick(), 2);
    assert_eq!(time.current_time(), 2.0);
}

#[test]
fn test_time_of_tick_does_not_accumulate_error() {
    let mut time = TimeManager::new(0.0, 0.1);
    for _ in 0..1000 {
        time.advance_tick();
    }
    assert_eq!(time.current_time(), time.time_of_tick(1000));
    assert!((time.current_time() - 100.0).abs() < 1e-9);
}

#[test]
#[should_panic(expected = "tick_length must be positive")]
fn test_zero_tick_length_panics() {
    TimeManager::new(0.0, 0.0);
}
